use crate::event::{Event, EventBus};
use anyhow::{anyhow, Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Note {
    pub id: u64,
    pub title: String,
    pub content: String,
    pub created_at: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Notebook {
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub notes: Vec<Note>,
}

fn default_next_note_id() -> u64 {
    1
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct NotebookData {
    #[serde(default)]
    pub notebooks: BTreeMap<String, Notebook>,

    /// Next note id to hand out. Ids are sequential and never reused.
    #[serde(default = "default_next_note_id")]
    pub next_note_id: u64,
}

impl Default for NotebookData {
    fn default() -> Self {
        NotebookData {
            notebooks: BTreeMap::new(),
            next_note_id: default_next_note_id(),
        }
    }
}

#[derive(Clone, Debug)]
pub enum NotebookAction {
    /// Creates a new empty notebook
    AddNotebook {
        name: String,
        description: Option<String>,
    },

    /// Removes a notebook and all its notes
    RmNotebook { name: String },

    /// Adds a note, creating the notebook if needed
    AddNote {
        notebook: String,
        title: String,
        content: String,
    },

    /// Removes a note by id from whichever notebook holds it
    RmNote { id: u64 },

    /// Lists notebooks and notes
    List,

    /// Writes all notebooks as JSON to a file
    Export { path: String },

    /// Merges notebooks from a JSON file into the store
    Import { path: String },
}

pub struct NotebookStore {
    path: Option<PathBuf>,
    pub data: NotebookData,
}

impl NotebookStore {
    /// Creates a store that never touches the filesystem (for tests)
    pub fn new_without_persistence() -> Self {
        NotebookStore {
            path: None,
            data: NotebookData::default(),
        }
    }

    pub async fn load_or_default(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_default(),
            Err(e) => {
                info!("Error while reading notebook state: {:?}", e);
                info!("Falling back to empty notebooks.");
                NotebookData::default()
            }
        };

        NotebookStore {
            path: Some(path),
            data,
        }
    }

    /// Persists state to disk using an atomic write (write to temp file,
    /// then rename) so a crash never leaves a partially written file.
    pub fn persist(&self) {
        let Some(path) = self.path.clone() else {
            return;
        };

        let json = match serde_json::to_string_pretty(&self.data) {
            Ok(json) => json,
            Err(e) => {
                error!("Error while serializing notebook state: {:?}", e);
                return;
            }
        };

        tokio::spawn(async move {
            let tmp_path = path.with_extension("json.tmp");

            if let Err(e) = tokio::fs::write(&tmp_path, &json).await {
                error!("Error while writing notebook state to temp file: {:?}", e);
                return;
            }

            if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
                // NotFound happens when a concurrent persist already
                // renamed the temp file away
                if e.kind() != std::io::ErrorKind::NotFound {
                    error!("Error while renaming notebook state file: {:?}", e);
                }
            }
        });
    }

    pub fn create_notebook(&mut self, name: &str, description: Option<String>) -> Result<()> {
        if name.is_empty() {
            return Err(anyhow!("Notebook name cannot be empty"));
        }
        if self.data.notebooks.contains_key(name) {
            return Err(anyhow!("A notebook named {name} already exists"));
        }

        self.data.notebooks.insert(
            name.to_string(),
            Notebook {
                description,
                notes: vec![],
            },
        );
        self.persist();
        Ok(())
    }

    /// Removes a notebook, returning how many notes went with it
    pub fn remove_notebook(&mut self, name: &str) -> Result<usize> {
        let notebook = self
            .data
            .notebooks
            .remove(name)
            .ok_or_else(|| anyhow!("No notebook named {name}"))?;

        self.persist();
        Ok(notebook.notes.len())
    }

    /// Adds a note, creating the notebook on the fly when missing
    pub fn add_note(&mut self, notebook: &str, title: &str, content: &str) -> Result<u64> {
        if title.is_empty() {
            return Err(anyhow!("Note title cannot be empty"));
        }

        let id = self.data.next_note_id;
        self.data.next_note_id += 1;

        let note = Note {
            id,
            title: title.to_string(),
            content: content.to_string(),
            created_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        };

        self.data
            .notebooks
            .entry(notebook.to_string())
            .or_default()
            .notes
            .push(note);

        self.persist();
        Ok(id)
    }

    /// Removes a note by id from whichever notebook holds it
    pub fn remove_note(&mut self, id: u64) -> Result<(String, Note)> {
        for (name, notebook) in self.data.notebooks.iter_mut() {
            if let Some(pos) = notebook.notes.iter().position(|note| note.id == id) {
                let note = notebook.notes.remove(pos);
                let name = name.clone();
                self.persist();
                return Ok((name, note));
            }
        }

        Err(anyhow!("No note with id {id}"))
    }

    pub fn find_note(&self, id: u64) -> Option<(&str, &Note)> {
        for (name, notebook) in self.data.notebooks.iter() {
            if let Some(note) = notebook.notes.iter().find(|note| note.id == id) {
                return Some((name.as_str(), note));
            }
        }
        None
    }

    pub fn note_count(&self) -> usize {
        self.data.notebooks.values().map(|nb| nb.notes.len()).sum()
    }

    pub fn export_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.data.notebooks)
            .context("Failed to serialize notebooks")
    }

    /// Merges notebooks from exported JSON into the store. Notes whose ids
    /// already exist in a same-named notebook are skipped; unknown
    /// notebooks are inserted wholesale. Returns how many notes were added.
    pub fn import_json(&mut self, json: &str) -> Result<usize> {
        let imported: BTreeMap<String, Notebook> =
            serde_json::from_str(json).context("File is not a valid notebook export")?;

        let mut imported_count = 0;
        let mut max_seen_id = 0;

        for (name, notebook) in imported {
            max_seen_id = max_seen_id.max(
                notebook
                    .notes
                    .iter()
                    .map(|note| note.id)
                    .max()
                    .unwrap_or(0),
            );

            match self.data.notebooks.get_mut(&name) {
                Some(existing) => {
                    let existing_ids: HashSet<u64> =
                        existing.notes.iter().map(|note| note.id).collect();
                    for note in notebook.notes {
                        if !existing_ids.contains(&note.id) {
                            existing.notes.push(note);
                            imported_count += 1;
                        }
                    }
                    if existing.description.is_none() {
                        existing.description = notebook.description;
                    }
                }
                None => {
                    imported_count += notebook.notes.len();
                    self.data.notebooks.insert(name, notebook);
                }
            }
        }

        // Keep handed-out ids collision-free with imported ones
        if max_seen_id >= self.data.next_note_id {
            self.data.next_note_id = max_seen_id + 1;
        }

        self.persist();
        Ok(imported_count)
    }
}

/// Type alias for the shared notebook store
pub type SharedStore = Arc<RwLock<NotebookStore>>;

pub async fn init(bus: &EventBus, notebooks_file: &str) -> SharedStore {
    let store = Arc::new(RwLock::new(
        NotebookStore::load_or_default(notebooks_file).await,
    ));

    handle_incoming_event_loop(bus.clone(), store.clone());

    store
}

fn handle_incoming_event_loop(bus: EventBus, store: SharedStore) {
    tokio::spawn(async move {
        let mut bus_rx = bus.subscribe();

        loop {
            let event = bus_rx.recv().await;

            if let Event::Notebook(action) = event {
                let bus = bus.clone();
                let store = store.clone();
                tokio::spawn(async move {
                    handle_incoming_event(bus, store, action).await;
                });
            }
        }
    });
}

pub async fn handle_incoming_event(bus: EventBus, store: SharedStore, action: NotebookAction) {
    match action {
        NotebookAction::AddNotebook { name, description } => {
            let result = store.write().await.create_notebook(&name, description);
            match result {
                Ok(()) => bus.notify_success(format!("Notebook {name} created")),
                Err(e) => bus.notify_error(e.to_string()),
            }
        }

        NotebookAction::RmNotebook { name } => {
            let result = store.write().await.remove_notebook(&name);
            match result {
                Ok(count) => {
                    bus.notify_success(format!("Notebook {name} deleted ({count} notes)"))
                }
                Err(e) => bus.notify_error(e.to_string()),
            }
        }

        NotebookAction::AddNote {
            notebook,
            title,
            content,
        } => {
            let result = store.write().await.add_note(&notebook, &title, &content);
            match result {
                Ok(id) => bus.notify_success(format!("Note {id} added to {notebook}")),
                Err(e) => bus.notify_error(e.to_string()),
            }
        }

        NotebookAction::RmNote { id } => {
            let result = store.write().await.remove_note(id);
            match result {
                Ok((notebook, note)) => {
                    bus.notify_success(format!("Removed note {} from {notebook}", note.title))
                }
                Err(e) => bus.notify_error(e.to_string()),
            }
        }

        NotebookAction::List => {
            let store = store.read().await;
            if store.data.notebooks.is_empty() {
                bus.notify_info("No notebooks yet, create one with: nb <name>");
                return;
            }

            for (name, notebook) in store.data.notebooks.iter() {
                let description = notebook
                    .description
                    .as_ref()
                    .map(|d| format!(" - {d}"))
                    .unwrap_or_default();
                bus.notify_info(format!(
                    "{name} ({} notes){description}",
                    notebook.notes.len()
                ));
                for note in &notebook.notes {
                    bus.notify_info(format!("  #{} {} [{}]", note.id, note.title, note.created_at));
                }
            }
        }

        NotebookAction::Export { path } => {
            let json = store.read().await.export_json();
            let result = match json {
                Ok(json) => tokio::fs::write(&path, json)
                    .await
                    .with_context(|| format!("Failed to write {path}")),
                Err(e) => Err(e),
            };

            match result {
                Ok(()) => bus.notify_success(format!("Notes exported to {path}")),
                Err(e) => bus.notify_error(format!("Error exporting notes: {e}")),
            }
        }

        NotebookAction::Import { path } => {
            let json = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {path}"));

            let result = match json {
                Ok(json) => store.write().await.import_json(&json),
                Err(e) => Err(e),
            };

            match result {
                Ok(count) => {
                    bus.notify_success(format!("Notes imported, {count} new notes added"))
                }
                Err(e) => bus.notify_error(format!("Error importing notes: {e}")),
            }
        }
    }
}
