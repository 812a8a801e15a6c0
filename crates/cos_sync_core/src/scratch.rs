use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Local copy of a remote object that is removed when the guard goes away.
///
/// Call [`ScratchFile::remove`] on the happy path to observe the cleanup
/// result; every other exit path removes the file on drop.
///
/// The guard owns whatever sits at its path, whether or not this process
/// created it: a directory already present there is removed recursively.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
    released: bool,
}

impl ScratchFile {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            released: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn remove(mut self) -> io::Result<()> {
        self.released = true;
        remove_path(&self.path)
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(error) = remove_path(&self.path) {
            tracing::warn!(
                component = "scratch",
                event = "scratch_cleanup_failed",
                path = %self.path.display(),
                error = %error,
            );
        }
    }
}

/// Removes a file, or a directory recursively. A missing path is not an error.
pub fn remove_path(path: &Path) -> io::Result<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(value) => value,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(error) => return Err(error),
    };

    if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}
