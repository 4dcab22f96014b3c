//! Unit tests for the notebook store

#[cfg(test)]
mod tests {
    use crate::notebook::NotebookStore;

    #[test]
    fn test_create_notebook() {
        let mut store = NotebookStore::new_without_persistence();
        store
            .create_notebook("physics", Some("Wave mechanics".to_string()))
            .unwrap();

        assert!(store.data.notebooks.contains_key("physics"));
        assert_eq!(
            store.data.notebooks["physics"].description.as_deref(),
            Some("Wave mechanics")
        );
    }

    #[test]
    fn test_duplicate_notebook_rejected() {
        let mut store = NotebookStore::new_without_persistence();
        store.create_notebook("physics", None).unwrap();

        let result = store.create_notebook("physics", None);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_notebook_name_rejected() {
        let mut store = NotebookStore::new_without_persistence();
        assert!(store.create_notebook("", None).is_err());
    }

    #[test]
    fn test_add_note_creates_notebook_on_the_fly() {
        let mut store = NotebookStore::new_without_persistence();
        let id = store.add_note("biology", "Cells", "All about cells").unwrap();

        assert_eq!(id, 1);
        assert!(store.data.notebooks.contains_key("biology"));
        assert_eq!(store.note_count(), 1);
    }

    #[test]
    fn test_note_ids_are_sequential() {
        let mut store = NotebookStore::new_without_persistence();
        let first = store.add_note("nb", "One", "1").unwrap();
        let second = store.add_note("nb", "Two", "2").unwrap();
        let third = store.add_note("other", "Three", "3").unwrap();

        assert_eq!((first, second, third), (1, 2, 3));
    }

    #[test]
    fn test_empty_note_title_rejected() {
        let mut store = NotebookStore::new_without_persistence();
        assert!(store.add_note("nb", "", "content").is_err());
    }

    #[test]
    fn test_find_note_searches_all_notebooks() {
        let mut store = NotebookStore::new_without_persistence();
        store.add_note("a", "First", "1").unwrap();
        let id = store.add_note("b", "Second", "2").unwrap();

        let (notebook, note) = store.find_note(id).unwrap();
        assert_eq!(notebook, "b");
        assert_eq!(note.title, "Second");

        assert!(store.find_note(999).is_none());
    }

    #[test]
    fn test_remove_note_by_id() {
        let mut store = NotebookStore::new_without_persistence();
        let id = store.add_note("nb", "Removable", "x").unwrap();

        let (notebook, note) = store.remove_note(id).unwrap();
        assert_eq!(notebook, "nb");
        assert_eq!(note.title, "Removable");
        assert_eq!(store.note_count(), 0);

        assert!(store.remove_note(id).is_err());
    }

    #[test]
    fn test_remove_notebook_reports_note_count() {
        let mut store = NotebookStore::new_without_persistence();
        store.add_note("nb", "One", "1").unwrap();
        store.add_note("nb", "Two", "2").unwrap();

        let count = store.remove_notebook("nb").unwrap();
        assert_eq!(count, 2);
        assert!(store.remove_notebook("nb").is_err());
    }

    #[test]
    fn test_export_import_round_trip() {
        let mut store = NotebookStore::new_without_persistence();
        store.add_note("physics", "Waves", "wave content").unwrap();
        store.add_note("biology", "Cells", "cell content").unwrap();

        let json = store.export_json().unwrap();

        let mut other = NotebookStore::new_without_persistence();
        let imported = other.import_json(&json).unwrap();

        assert_eq!(imported, 2);
        assert_eq!(other.note_count(), 2);
        assert!(other.find_note(1).is_some());
    }

    #[test]
    fn test_import_skips_existing_note_ids() {
        let mut store = NotebookStore::new_without_persistence();
        store.add_note("nb", "Original", "1").unwrap();

        let json = store.export_json().unwrap();
        let imported = store.import_json(&json).unwrap();

        // Same notebook, same note id: nothing new
        assert_eq!(imported, 0);
        assert_eq!(store.note_count(), 1);
    }

    #[test]
    fn test_import_bumps_next_note_id() {
        let mut source = NotebookStore::new_without_persistence();
        source.add_note("nb", "One", "1").unwrap();
        source.add_note("nb", "Two", "2").unwrap();
        let json = source.export_json().unwrap();

        let mut store = NotebookStore::new_without_persistence();
        store.import_json(&json).unwrap();

        // Next handed-out id must not collide with imported ones
        let id = store.add_note("nb", "Three", "3").unwrap();
        assert_eq!(id, 3);
    }

    #[test]
    fn test_import_invalid_json_rejected() {
        let mut store = NotebookStore::new_without_persistence();
        assert!(store.import_json("not json at all").is_err());
        assert!(store.import_json(r#"{"nb": 42}"#).is_err());
    }
}
