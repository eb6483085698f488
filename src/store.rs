//! Workflow document persistence: one JSON file, atomically replaced.
//!
//! Saves write to a sibling temp path and rename over the target so a crash
//! mid-write never corrupts the previous valid document. Both load and save
//! run the full invariant check; a failing document is a hard stop.

use std::fs;
use std::path::{Path, PathBuf};

use crate::document::WorkflowDocument;
use crate::error::EngineFault;

pub struct DocumentStore {
    path: PathBuf,
}

impl DocumentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load and validate the persisted document.
    pub fn load(&self) -> Result<WorkflowDocument, EngineFault> {
        let contents = fs::read_to_string(&self.path)?;
        let doc: WorkflowDocument = serde_json::from_str(&contents)?;
        doc.validate()?;
        Ok(doc)
    }

    /// Validate and atomically persist the document.
    pub fn save(&self, doc: &WorkflowDocument) -> Result<(), EngineFault> {
        doc.validate()?;

        let mut buf = serde_json::to_string_pretty(doc)?;
        buf.push('\n');

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, buf)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{SCHEMA_VERSION, WorkflowDocument};
    use crate::state_machine::WorkflowState;
    use std::fs;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> DocumentStore {
        DocumentStore::new(dir.path().join("workflow.json"))
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let doc = WorkflowDocument::bootstrap("root", "Fix the frobnicator");

        store.save(&doc).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded, doc);
        assert!(loaded.invariant_errors().is_empty());
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::new(dir.path().join(".helmsman").join("workflow.json"));
        store
            .save(&WorkflowDocument::bootstrap("root", "Fix it"))
            .unwrap();
        assert!(store.exists());
    }

    #[test]
    fn save_leaves_no_temp_file_behind() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .save(&WorkflowDocument::bootstrap("root", "Fix it"))
            .unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["workflow.json"]);
    }

    #[test]
    fn save_rejects_invalid_document_and_keeps_previous() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let good = WorkflowDocument::bootstrap("root", "Fix it");
        store.save(&good).unwrap();

        let mut bad = good.clone();
        bad.active_task_id = "ghost".into();
        let err = store.save(&bad).unwrap_err();
        assert!(matches!(err, EngineFault::Invariants(_)));

        // The previous valid document is untouched.
        assert_eq!(store.load().unwrap(), good);
    }

    #[test]
    fn load_rejects_corrupt_json() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "{ not json").unwrap();
        assert!(matches!(store.load().unwrap_err(), EngineFault::Json(_)));
    }

    #[test]
    fn load_rejects_schema_version_mismatch() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let doc = WorkflowDocument::bootstrap("root", "Fix it");
        let mut value = serde_json::to_value(&doc).unwrap();
        value["schemaVersion"] = serde_json::json!(SCHEMA_VERSION + 1);
        fs::write(store.path(), serde_json::to_string(&value).unwrap()).unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, EngineFault::Invariants(_)));
        assert!(err.to_string().contains("schema version"));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(matches!(store.load().unwrap_err(), EngineFault::Io(_)));
    }

    #[test]
    fn load_rejects_invariant_violations() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let mut doc = WorkflowDocument::bootstrap("root", "Fix it");
        doc.state = WorkflowState::Implement; // depth mismatch for the root
        fs::write(store.path(), serde_json::to_string(&doc).unwrap()).unwrap();

        assert!(matches!(
            store.load().unwrap_err(),
            EngineFault::Invariants(_)
        ));
    }
}
