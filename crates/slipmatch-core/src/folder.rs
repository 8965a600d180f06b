use crate::error::SlipmatchError;
use std::fs;
use std::path::{Path, PathBuf};

/// The folder the virtual printer drops PDFs into.
///
/// Hidden entries (leading `.`) are never counted nor removed, so `.DS_Store`
/// and friends do not disturb the pairing count.
#[derive(Debug, Clone)]
pub struct WatchedFolder {
    path: PathBuf,
}

impl WatchedFolder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        WatchedFolder { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Empty the folder if it exists, create it otherwise.
    ///
    /// Returns `true` when the folder had to be created.
    pub fn prepare(&self) -> Result<bool, SlipmatchError> {
        if self.path.is_dir() {
            self.clear()?;
            Ok(false)
        } else {
            fs::create_dir_all(&self.path)?;
            Ok(true)
        }
    }

    /// Visible entries, sorted by path.
    pub fn files(&self) -> Result<Vec<PathBuf>, SlipmatchError> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.path)? {
            let entry = entry?;
            if !is_hidden(&entry.file_name().to_string_lossy()) {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }

    pub fn count(&self) -> Result<usize, SlipmatchError> {
        Ok(self.files()?.len())
    }

    /// Remove every visible entry. Returns how many were removed.
    pub fn clear(&self) -> Result<usize, SlipmatchError> {
        let files = self.files()?;
        for file in &files {
            remove_entry(file)?;
        }
        Ok(files.len())
    }

    /// Remove the given entries. Entries already gone are fine.
    pub fn remove(&self, paths: &[&Path]) -> Result<(), SlipmatchError> {
        for path in paths {
            remove_entry(path)?;
        }
        Ok(())
    }

    /// Remove every visible entry except `keep`. Returns the removed paths.
    pub fn clear_except(&self, keep: &Path) -> Result<Vec<PathBuf>, SlipmatchError> {
        let removed: Vec<PathBuf> = self
            .files()?
            .into_iter()
            .filter(|f| !same_file_name(f, keep))
            .collect();
        for file in &removed {
            remove_entry(file)?;
        }
        Ok(removed)
    }
}

pub(crate) fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

pub(crate) fn same_file_name(a: &Path, b: &Path) -> bool {
    a.file_name().is_some() && a.file_name() == b.file_name()
}

fn remove_entry(path: &Path) -> Result<(), SlipmatchError> {
    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match result {
        Ok(()) => Ok(()),
        // Already gone.
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Create `dir` if needed and make sure it is empty.
pub fn empty_or_make_new(dir: &Path) -> Result<(), SlipmatchError> {
    if dir.is_dir() {
        for entry in fs::read_dir(dir)? {
            remove_entry(&entry?.path())?;
        }
        tracing::debug!(dir = %dir.display(), "emptied folder");
    } else {
        fs::create_dir_all(dir)?;
        tracing::debug!(dir = %dir.display(), "created folder");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"%PDF-1.4").unwrap();
        path
    }

    #[test]
    fn test_count_ignores_hidden_files() {
        let tmp = tempfile::tempdir().unwrap();
        let folder = WatchedFolder::new(tmp.path());
        touch(tmp.path(), ".DS_Store");
        touch(tmp.path(), "a.pdf");
        assert_eq!(folder.count().unwrap(), 1);
    }

    #[test]
    fn test_clear_except_keeps_one() {
        let tmp = tempfile::tempdir().unwrap();
        let folder = WatchedFolder::new(tmp.path());
        let a = touch(tmp.path(), "a.pdf");
        let b = touch(tmp.path(), "b.pdf");

        let removed = folder.clear_except(&b).unwrap();
        assert_eq!(removed, vec![a.clone()]);
        assert!(!a.exists());
        assert!(b.exists());
    }

    #[test]
    fn test_remove_leaves_other_files() {
        let tmp = tempfile::tempdir().unwrap();
        let folder = WatchedFolder::new(tmp.path());
        let a = touch(tmp.path(), "a.pdf");
        let b = touch(tmp.path(), "b.pdf");
        let c = touch(tmp.path(), "c.pdf");

        folder.remove(&[a.as_path(), b.as_path()]).unwrap();
        folder.remove(&[a.as_path()]).unwrap();
        assert_eq!(folder.files().unwrap(), vec![c]);
    }

    #[test]
    fn test_prepare_creates_or_empties() {
        let tmp = tempfile::tempdir().unwrap();
        let folder = WatchedFolder::new(tmp.path().join("target"));
        assert!(folder.prepare().unwrap());
        touch(folder.path(), "left-over.pdf");
        assert!(!folder.prepare().unwrap());
        assert_eq!(folder.count().unwrap(), 0);
    }

    #[test]
    fn test_empty_or_make_new_removes_subfolders() {
        let tmp = tempfile::tempdir().unwrap();
        let work = tmp.path().join("work");
        fs::create_dir_all(work.join("sweep/dpi_150")).unwrap();
        touch(&work, "page-1.png");

        empty_or_make_new(&work).unwrap();
        assert!(work.is_dir());
        assert_eq!(fs::read_dir(&work).unwrap().count(), 0);
    }
}
