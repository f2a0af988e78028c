//! Note storage.
//!
//! Notes are addressed by extension-less relative ids such as
//! `projects/garden`. A write states the text it expects to overwrite and
//! fails with [`StoreError::Conflict`] when the stored note differs.

pub use relative_path::{RelativePath, RelativePathBuf};
use std::fs;
use std::path::{Path, PathBuf};

/// Extension of note files when none is configured.
pub const DEFAULT_EXTENSION: &str = "nd";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Note {id} changed since it was read")]
    Conflict { id: RelativePathBuf },
    #[error("Invalid notes directory: {0}")]
    InvalidNotesDir(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub trait NoteStore {
    /// Text of the note, `None` if it does not exist.
    fn read(&self, id: &RelativePath) -> Result<Option<String>, StoreError>;

    /// Stores `text` if the note still holds `expected` (`None`: no note yet).
    fn write(&self, id: &RelativePath, text: &str, expected: Option<&str>)
    -> Result<(), StoreError>;

    /// Ids of every stored note, sorted.
    fn list(&self) -> Result<Vec<RelativePathBuf>, StoreError>;
}

/// Notes kept as files under a directory.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
    extension: String,
}

impl FsStore {
    /// Opens an existing notes directory.
    pub fn open(root: impl Into<PathBuf>, extension: &str) -> Result<Self, StoreError> {
        let root = root.into();
        validate_notes_dir(&root)?;
        Ok(Self {
            root,
            extension: extension.trim_start_matches('.').to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    fn file_of(&self, id: &RelativePath) -> RelativePathBuf {
        id.with_extension(&self.extension)
    }
}

impl NoteStore for FsStore {
    fn read(&self, id: &RelativePath) -> Result<Option<String>, StoreError> {
        match read_file(&self.file_of(id), &self.root) {
            Ok(text) => Ok(Some(text)),
            Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(
        &self,
        id: &RelativePath,
        text: &str,
        expected: Option<&str>,
    ) -> Result<(), StoreError> {
        let current = self.read(id)?;
        if current.as_deref() != expected {
            log::warn!("refusing to overwrite {id}: stored text changed");
            return Err(StoreError::Conflict { id: id.to_owned() });
        }
        write_file(&self.file_of(id), &self.root, text)?;
        log::debug!("wrote note {id}");
        Ok(())
    }

    fn list(&self) -> Result<Vec<RelativePathBuf>, StoreError> {
        let mut ids = vec![];
        for path in scan_note_files(&self.root, &self.extension)? {
            let Ok(relative) = path.strip_prefix(&self.root) else {
                continue;
            };
            match RelativePathBuf::from_path(relative.with_extension("")) {
                Ok(id) => ids.push(id),
                Err(e) => log::warn!("skipping {}: {e}", path.display()),
            }
        }
        ids.sort();
        Ok(ids)
    }
}

/// Read a note file and return its content
pub fn read_file(relative_path: &RelativePath, notes_root: &Path) -> Result<String, StoreError> {
    let absolute_path = relative_path.to_path(notes_root);
    fs::read_to_string(&absolute_path).map_err(StoreError::Io)
}

/// Write content to a note file
pub fn write_file(
    relative_path: &RelativePath,
    notes_root: &Path,
    content: &str,
) -> Result<(), StoreError> {
    let absolute_path = relative_path.to_path(notes_root);

    // Create parent directories if they don't exist
    if let Some(parent) = absolute_path.parent() {
        fs::create_dir_all(parent).map_err(StoreError::Io)?;
    }

    fs::write(&absolute_path, content).map_err(StoreError::Io)
}

/// Scan for note files with the given extension in the notes directory
pub fn scan_note_files(notes_root: &Path, extension: &str) -> Result<Vec<PathBuf>, StoreError> {
    if !notes_root.exists() {
        return Err(StoreError::InvalidNotesDir(
            "notes directory not found".to_string(),
        ));
    }

    let mut files = Vec::new();
    scan_directory_recursive(notes_root, extension, &mut files)?;
    files.sort();
    Ok(files)
}

fn scan_directory_recursive(
    dir: &Path,
    extension: &str,
    files: &mut Vec<PathBuf>,
) -> Result<(), StoreError> {
    let entries = fs::read_dir(dir).map_err(StoreError::Io)?;

    for entry in entries {
        let entry = entry.map_err(StoreError::Io)?;
        let path = entry.path();

        if path.is_dir() {
            scan_directory_recursive(&path, extension, files)?;
        } else if let Some(ext) = path.extension()
            && ext == extension
        {
            files.push(path);
        }
    }

    Ok(())
}

pub fn validate_notes_dir(path: &Path) -> Result<(), StoreError> {
    if !path.exists() || !path.is_dir() {
        return Err(StoreError::InvalidNotesDir(
            "Directory does not exist".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{create_test_file, create_test_notes_dir};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_list_finds_nested_notes_only() {
        // Given a notes directory with notes and other files
        let notes_dir = create_test_notes_dir();
        create_test_file(&notes_dir, "inbox.nd", "- First item");
        create_test_file(&notes_dir, "projects/garden.nd", "# Garden");
        create_test_file(&notes_dir, "readme.md", "# Not a note");

        // When listing notes
        let store = FsStore::open(notes_dir.path(), ".nd").unwrap();
        let ids = store.list().unwrap();

        // Then only note ids come back, without extension
        assert_eq!(
            ids,
            vec![
                RelativePathBuf::from("inbox"),
                RelativePathBuf::from("projects/garden"),
            ]
        );
    }

    #[test]
    fn test_read_missing_note_is_none() {
        let notes_dir = create_test_notes_dir();
        let store = FsStore::open(notes_dir.path(), DEFAULT_EXTENSION).unwrap();

        assert_eq!(store.read(RelativePath::new("nothing")).unwrap(), None);
    }

    #[test]
    fn test_write_with_matching_expectation() {
        // Given a stored note
        let notes_dir = create_test_notes_dir();
        create_test_file(&notes_dir, "todo.nd", "old");
        let store = FsStore::open(notes_dir.path(), DEFAULT_EXTENSION).unwrap();
        let id = RelativePath::new("todo");

        // When writing with the text we read
        store.write(id, "new", Some("old")).unwrap();

        // Then the note is replaced
        assert_eq!(store.read(id).unwrap().as_deref(), Some("new"));
    }

    #[test]
    fn test_write_creates_new_notes_and_directories() {
        let notes_dir = create_test_notes_dir();
        let store = FsStore::open(notes_dir.path(), DEFAULT_EXTENSION).unwrap();
        let id = RelativePath::new("journal/2024-01-01");

        store.write(id, "today", None).unwrap();

        assert!(notes_dir.path().join("journal/2024-01-01.nd").exists());
    }

    #[test]
    fn test_write_conflicts_when_note_changed() {
        // Given a note that changed after we read it
        let notes_dir = create_test_notes_dir();
        create_test_file(&notes_dir, "todo.nd", "edited elsewhere");
        let store = FsStore::open(notes_dir.path(), DEFAULT_EXTENSION).unwrap();
        let id = RelativePath::new("todo");

        // When writing with a stale expectation, or as if it were new
        let stale = store.write(id, "mine", Some("original"));
        let fresh = store.write(id, "mine", None);

        // Then both fail and the note is untouched
        assert!(matches!(stale, Err(StoreError::Conflict { .. })));
        assert!(matches!(fresh, Err(StoreError::Conflict { .. })));
        assert_eq!(
            store.read(id).unwrap().as_deref(),
            Some("edited elsewhere")
        );
    }

    #[test]
    fn test_open_rejects_missing_directory() {
        let result = FsStore::open("/this/path/does/not/exist", DEFAULT_EXTENSION);

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("notes directory"));
    }
}
