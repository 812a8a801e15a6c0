pub mod cos;
pub mod object_store;
