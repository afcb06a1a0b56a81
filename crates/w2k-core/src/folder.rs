use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Local sandbox folder in which a plugin places files before submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    path: PathBuf,
}

impl Folder {
    /// Wrap an existing directory.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create the directory (and parents) if needed.
    pub fn create(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        fs::create_dir_all(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return a subfolder, creating it on disk when `create` is set.
    pub fn get_subfolder(&self, name: impl AsRef<Path>, create: bool) -> io::Result<Folder> {
        let path = self.path.join(name);
        if create {
            fs::create_dir_all(&path)?;
        }
        Ok(Folder { path })
    }
}
