//! Flat-file note persistence.
//!
//! The whole collection lives in memory and is written back as one JSON
//! array on every [`NoteStore::save`]. Mutations (`add`, `delete`) touch
//! only the in-memory copy; the file and memory agree again after the next
//! successful save.
//!
//! Saving writes to a temporary file in the same directory and renames it
//! over the target, so a crash mid-write never leaves a half-written notes
//! file behind.

use crate::error::KiriError;
use crate::note::Note;
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default backing file, relative to the working directory.
pub const DEFAULT_NOTES_FILE: &str = "pdf_notes.json";

/// In-memory note collection bound to a backing file.
#[derive(Debug)]
pub struct NoteStore {
    path: PathBuf,
    notes: Vec<Note>,
}

impl NoteStore {
    /// An empty store bound to `path`. Nothing is read or written.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            notes: Vec::new(),
        }
    }

    /// Load the store from `path`.
    ///
    /// A missing file yields an empty store; a malformed one fails with
    /// [`KiriError::CorruptStore`].
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, KiriError> {
        let path = path.into();
        let notes = load(&path)?;
        Ok(Self { path, notes })
    }

    /// Load the store, falling back to an empty collection when the file is
    /// unreadable. The load error is handed back so the caller can show it.
    pub fn open_or_empty(path: impl Into<PathBuf>) -> (Self, Option<KiriError>) {
        let path = path.into();
        match load(&path) {
            Ok(notes) => (Self { path, notes }, None),
            Err(e) => {
                warn!("Starting with an empty note store: {}", e);
                (Self::empty(path), Some(e))
            }
        }
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All notes in insertion order.
    pub fn list(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.notes.iter().any(|n| n.id == id)
    }

    /// Look a note up by identifier.
    pub fn get(&self, id: &str) -> Result<&Note, KiriError> {
        self.notes
            .iter()
            .find(|n| n.id == id)
            .ok_or_else(|| KiriError::NoteNotFound { id: id.to_string() })
    }

    /// Append a note. Identifiers must be unique.
    pub fn add(&mut self, note: Note) -> Result<(), KiriError> {
        if self.contains(&note.id) {
            return Err(KiriError::DuplicateNote { id: note.id });
        }
        debug!("Adding note '{}' ({})", note.id, note.kind);
        self.notes.push(note);
        Ok(())
    }

    /// Remove a note and hand it back.
    pub fn delete(&mut self, id: &str) -> Result<Note, KiriError> {
        let idx = self
            .position(id)
            .ok_or_else(|| KiriError::NoteNotFound { id: id.to_string() })?;
        debug!("Deleting note '{}'", id);
        Ok(self.notes.remove(idx))
    }

    /// Position of the note with `id` in insertion order.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.notes.iter().position(|n| n.id == id)
    }

    /// Put a previously removed note back at `index`.
    pub(crate) fn restore(&mut self, index: usize, note: Note) {
        let index = index.min(self.notes.len());
        self.notes.insert(index, note);
    }

    /// Derive an identifier for `title` that is not yet used in this store.
    ///
    /// The slug of the title is used as-is when free; otherwise `-2`, `-3`, …
    /// is appended until the identifier is unique.
    pub fn unique_id(&self, title: &str) -> String {
        let base = slugify(title);
        if !self.contains(&base) {
            return base;
        }
        let mut n = 2usize;
        loop {
            let candidate = format!("{base}-{n}");
            if !self.contains(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Rewrite the backing file with the full collection.
    pub fn save(&self) -> Result<(), KiriError> {
        save(&self.path, &self.notes)?;
        info!("Saved {} notes to {}", self.notes.len(), self.path.display());
        Ok(())
    }
}

/// Read a note collection from `path`.
pub fn load(path: &Path) -> Result<Vec<Note>, KiriError> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No notes file at {}; starting empty", path.display());
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(KiriError::StoreIo {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    let notes: Vec<Note> =
        serde_json::from_slice(&bytes).map_err(|e| KiriError::CorruptStore {
            path: path.to_path_buf(),
            source: e,
        })?;
    Ok(dedup_ids(notes, path))
}

/// Keep the first note for each id. A hand-edited file can repeat an id,
/// and every lookup would only ever reach the first copy.
fn dedup_ids(notes: Vec<Note>, path: &Path) -> Vec<Note> {
    let mut seen = HashSet::with_capacity(notes.len());
    notes
        .into_iter()
        .filter(|n| {
            let first = seen.insert(n.id.clone());
            if !first {
                warn!(
                    "Dropping duplicate note '{}' from {}",
                    n.id,
                    path.display()
                );
            }
            first
        })
        .collect()
}

/// Replace the file at `path` with `notes`.
pub fn save(path: &Path, notes: &[Note]) -> Result<(), KiriError> {
    let io_err = |e: std::io::Error| KiriError::StoreIo {
        path: path.to_path_buf(),
        source: e,
    };

    let json = serde_json::to_vec_pretty(notes)
        .map_err(|e| KiriError::Internal(format!("Failed to serialise notes: {e}")))?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(io_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(io_err)?;
    tmp.write_all(&json).map_err(io_err)?;
    tmp.write_all(b"\n").map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

/// Lowercase ASCII slug; runs of anything else collapse to a single `-`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "note".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::NoteKind;

    fn note(id: &str) -> Note {
        Note::new(id, format!("{id}.pdf"), NoteKind::Summary, "body")
    }

    #[test]
    fn slugify_examples() {
        assert_eq!(slugify("Cell Biology.pdf"), "cell-biology-pdf");
        assert_eq!(slugify("  --Hello,   World!-- "), "hello-world");
        assert_eq!(slugify("???"), "note");
        assert_eq!(slugify(""), "note");
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = NoteStore::open(dir.path().join("absent.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn malformed_file_is_corrupt_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = NoteStore::open(&path).unwrap_err();
        assert!(matches!(err, KiriError::CorruptStore { .. }), "got {err:?}");
    }

    #[test]
    fn open_or_empty_reports_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();
        let (store, warning) = NoteStore::open_or_empty(&path);
        assert!(store.is_empty());
        assert!(matches!(warning, Some(KiriError::CorruptStore { .. })));
    }

    #[test]
    fn repeated_ids_in_file_keep_first_copy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.json");
        let mut second = note("cells");
        second.body = "second copy".into();
        let on_disk = vec![note("cells"), note("atp"), second];
        std::fs::write(&path, serde_json::to_vec(&on_disk).unwrap()).unwrap();

        let mut store = NoteStore::open(&path).unwrap();
        let ids: Vec<&str> = store.list().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["cells", "atp"]);
        assert_ne!(store.get("cells").unwrap().body, "second copy");

        store.delete("cells").unwrap();
        assert!(!store.contains("cells"));
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let mut store = NoteStore::empty("unused.json");
        store.add(note("a")).unwrap();
        let err = store.add(note("a")).unwrap_err();
        assert!(matches!(err, KiriError::DuplicateNote { ref id } if id == "a"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn delete_then_get_is_not_found() {
        let mut store = NoteStore::empty("unused.json");
        store.add(note("a")).unwrap();
        store.add(note("b")).unwrap();
        let removed = store.delete("a").unwrap();
        assert_eq!(removed.id, "a");
        assert!(matches!(store.get("a"), Err(KiriError::NoteNotFound { .. })));
        assert!(matches!(
            store.delete("a"),
            Err(KiriError::NoteNotFound { .. })
        ));
        assert_eq!(store.list()[0].id, "b");
    }

    #[test]
    fn unique_id_appends_suffix() {
        let mut store = NoteStore::empty("unused.json");
        assert_eq!(store.unique_id("Cells"), "cells");
        store.add(note("cells")).unwrap();
        assert_eq!(store.unique_id("Cells"), "cells-2");
        store.add(note("cells-2")).unwrap();
        assert_eq!(store.unique_id("cells"), "cells-3");
    }

    #[test]
    fn save_then_load_round_trips_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("notes.json");
        let mut store = NoteStore::empty(&path);
        for id in ["zeta", "alpha", "mid"] {
            store.add(note(id)).unwrap();
        }
        store.save().unwrap();

        let reloaded = NoteStore::open(&path).unwrap();
        assert_eq!(reloaded.list(), store.list());
        let ids: Vec<&str> = reloaded.list().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn mutations_are_not_flushed_until_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.json");
        let mut store = NoteStore::empty(&path);
        store.add(note("a")).unwrap();
        assert!(!path.exists());
        store.save().unwrap();
        store.delete("a").unwrap();
        assert_eq!(load(&path).unwrap().len(), 1);
        store.save().unwrap();
        assert!(load(&path).unwrap().is_empty());
    }
}
