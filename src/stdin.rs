//! Line-based command interface on stdin.

use crate::event::{Event, EventBus};
use crate::message::MessageAction;
use crate::notebook::NotebookAction;
use crate::player::PlayerAction;
use crate::studio::StudioAction;
use crate::tts;
use tokio::io::AsyncBufReadExt;

const HELP_TEXT: &str = r#"
===================================================================
Notebook commands:
  nb <name> [description]              Create a notebook
  rmnb <name>                          Delete a notebook
  note <notebook> <title> | <content>  Add a note
  rmnote <id>                          Delete a note
  ai <notebook> <prompt>               Generate a note with AI
  ls                                   List notebooks and notes
Audio commands:
  listen <id>                          Narrate a note over the stream
  speak <id>                           Speak a note via live synthesis
  pause / resume / stop                Control playback
  download <id>                        Save note narration as WAV
  podcast <id> [title]                 Generate a two-speaker podcast
  infographic <id>                     Generate an HTML infographic
Data commands:
  export <path>                        Write notebooks as JSON
  import <path>                        Merge notebooks from JSON
  voices                               List synthesis voices
==================================================================="#;

pub fn init(bus: &EventBus) {
    let bus = bus.clone();
    tokio::spawn(async move {
        let stdin = tokio::io::stdin();
        let mut lines = tokio::io::BufReader::new(stdin).lines();

        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if let Some(event) = line_to_event(&line) {
                        bus.send(event);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    error!("Error while reading stdin: {e}");
                    break;
                }
            }
        }
    });
}

fn usage(text: &str) -> Event {
    Event::Message(MessageAction::error(format!("Usage: {text}")))
}

/// Parses one input line into a bus event
pub fn line_to_event(line: &str) -> Option<Event> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let mut words = line.split_whitespace();
    let cmd = words.next()?;

    let event = match cmd {
        "help" => Event::Message(MessageAction::info(HELP_TEXT)),

        "ls" => Event::Notebook(NotebookAction::List),

        "nb" => match words.next() {
            Some(name) => {
                let description: Vec<&str> = words.collect();
                let description = if description.is_empty() {
                    None
                } else {
                    Some(description.join(" "))
                };
                Event::Notebook(NotebookAction::AddNotebook {
                    name: name.to_string(),
                    description,
                })
            }
            None => usage("nb <name> [description]"),
        },

        "rmnb" => match words.next() {
            Some(name) => Event::Notebook(NotebookAction::RmNotebook {
                name: name.to_string(),
            }),
            None => usage("rmnb <name>"),
        },

        "note" => {
            let rest = line.strip_prefix("note").unwrap_or_default().trim();
            match rest.split_once('|') {
                Some((head, content)) => {
                    let mut head_words = head.split_whitespace();
                    let notebook = head_words.next();
                    let title = head_words.collect::<Vec<&str>>().join(" ");

                    match notebook {
                        Some(notebook) if !title.is_empty() => {
                            Event::Notebook(NotebookAction::AddNote {
                                notebook: notebook.to_string(),
                                title,
                                content: content.trim().to_string(),
                            })
                        }
                        _ => usage("note <notebook> <title> | <content>"),
                    }
                }
                None => usage("note <notebook> <title> | <content>"),
            }
        }

        "rmnote" => match words.next().and_then(|id| id.parse().ok()) {
            Some(id) => Event::Notebook(NotebookAction::RmNote { id }),
            None => usage("rmnote <id>"),
        },

        "ai" => {
            let notebook = words.next();
            let prompt = words.collect::<Vec<&str>>().join(" ");
            match notebook {
                Some(notebook) if !prompt.is_empty() => Event::Studio(StudioAction::GenerateNote {
                    notebook: notebook.to_string(),
                    prompt,
                }),
                _ => usage("ai <notebook> <prompt>"),
            }
        }

        "listen" => match words.next().and_then(|id| id.parse().ok()) {
            Some(note_id) => Event::Studio(StudioAction::Listen { note_id }),
            None => usage("listen <id>"),
        },

        "speak" => match words.next().and_then(|id| id.parse().ok()) {
            Some(note_id) => Event::Studio(StudioAction::Speak { note_id }),
            None => usage("speak <id>"),
        },

        "download" => match words.next().and_then(|id| id.parse().ok()) {
            Some(note_id) => Event::Studio(StudioAction::Download { note_id }),
            None => usage("download <id>"),
        },

        "podcast" => match words.next().and_then(|id| id.parse().ok()) {
            Some(note_id) => {
                let title = words.collect::<Vec<&str>>().join(" ");
                let title = if title.is_empty() { None } else { Some(title) };
                Event::Studio(StudioAction::Podcast { note_id, title })
            }
            None => usage("podcast <id> [title]"),
        },

        "infographic" => match words.next().and_then(|id| id.parse().ok()) {
            Some(note_id) => Event::Studio(StudioAction::Infographic { note_id }),
            None => usage("infographic <id>"),
        },

        "pause" => Event::Player(PlayerAction::Pause),
        "resume" => Event::Player(PlayerAction::Resume),
        "stop" => Event::Player(PlayerAction::Stop),

        "export" => match words.next() {
            Some(path) => Event::Notebook(NotebookAction::Export {
                path: path.to_string(),
            }),
            None => usage("export <path>"),
        },

        "import" => match words.next() {
            Some(path) => Event::Notebook(NotebookAction::Import {
                path: path.to_string(),
            }),
            None => usage("import <path>"),
        },

        "voices" => {
            let voices: Vec<String> = tts::VOICES
                .iter()
                .map(|(name, style)| format!("{name} ({style})"))
                .collect();
            Event::Message(MessageAction::info(voices.join(", ")))
        }

        _ => Event::Message(MessageAction::error(format!(
            "Unknown command: {cmd} (type help)"
        ))),
    };

    Some(event)
}
