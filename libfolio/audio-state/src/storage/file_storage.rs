use std::{
    fs::{self, create_dir_all},
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tracing::debug;

use super::{Storage, StorageError};

static STORAGE_DIR: &str = "positions";

/// Stores each key as its own JSON file inside a directory.
#[derive(Clone, Debug)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn try_new() -> Result<Self, StorageError> {
        let proj_dirs =
            directories::ProjectDirs::from("", "", "folio").ok_or(StorageError::NoHomeDir)?;
        FileStorage::new_from_path(proj_dirs.data_dir().join(STORAGE_DIR))
    }

    pub fn new_from_path<P: AsRef<Path>>(dir: P) -> Result<Self, StorageError> {
        let dir_ref = dir.as_ref();
        let dir_string = dir_ref.to_string_lossy().to_string();
        if dir_ref.to_str().is_none() {
            return Err(StorageError::InvalidUnicode(dir_string));
        }

        if dir_ref.is_file() {
            return Err(StorageError::NotADirectory(dir_string));
        }

        create_dir_all(dir_ref).map_err(|e| StorageError::DirCreationFailed(dir_string, e))?;

        Ok(Self {
            dir: dir_ref.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn item_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", urlencoding::encode(key)))
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.item_path(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(path.to_string_lossy().to_string(), e)),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.item_path(key);
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, value)
            .map_err(|e| StorageError::Io(temp_path.to_string_lossy().to_string(), e))?;
        fs::rename(&temp_path, &path)
            .map_err(|e| StorageError::Io(path.to_string_lossy().to_string(), e))?;
        debug!("Wrote {key} to {path:?}");
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let path = self.item_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(path.to_string_lossy().to_string(), e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_set_get_remove() {
        let temp = TempDir::new().unwrap();
        let storage = FileStorage::new_from_path(temp.path().join("nested")).unwrap();
        let key = "playlist-position-/audio/intro.mp3";

        assert_eq!(None, storage.get_item(key).unwrap());
        storage.set_item(key, r#"{"currentTime":30}"#).unwrap();
        assert_eq!(
            Some(r#"{"currentTime":30}"#.to_owned()),
            storage.get_item(key).unwrap()
        );

        storage.remove_item(key).unwrap();
        assert_eq!(None, storage.get_item(key).unwrap());
        // removing twice is fine
        storage.remove_item(key).unwrap();
    }

    #[test]
    fn test_keys_are_single_files() {
        let temp = TempDir::new().unwrap();
        let storage = FileStorage::new_from_path(temp.path()).unwrap();
        storage.set_item("a/b?c", "1").unwrap();

        let names: Vec<_> = fs::read_dir(storage.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(vec!["a%2Fb%3Fc.json".to_owned()], names);
    }

    #[test]
    fn test_file_path_rejected() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file");
        fs::write(&file, "").unwrap();
        assert_matches!(
            FileStorage::new_from_path(&file),
            Err(StorageError::NotADirectory(_))
        );
    }
}
