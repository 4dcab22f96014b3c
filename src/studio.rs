//! Studio pipelines: the command boundary where notes become AI-generated
//! audio and artifacts. Every failure is caught here and surfaced as a
//! user-facing notification.

use crate::artifact;
use crate::config::{Config, FallbackPolicy};
use crate::conversation;
use crate::event::{Event, EventBus};
use crate::llm::ChatClient;
use crate::notebook::{Note, SharedStore};
use crate::player::{PlayerError, SessionHandle, SharedPlayer};
use crate::tts::{SpeechClient, SynthesisError};
use crate::wav;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub enum StudioAction {
    /// Generates a note with the chat API and stores it
    GenerateNote { notebook: String, prompt: String },

    /// Narrates a note through the playback controller
    Listen { note_id: u64 },

    /// Speaks a note through the live synthesis backend directly
    Speak { note_id: u64 },

    /// Synthesizes a note and saves it as a WAV artifact
    Download { note_id: u64 },

    /// Turns a note into a two-speaker podcast WAV artifact
    Podcast { note_id: u64, title: Option<String> },

    /// Generates an HTML infographic artifact for a note
    Infographic { note_id: u64 },
}

pub struct Studio {
    bus: EventBus,
    config: Config,
    store: SharedStore,
    player: SharedPlayer,
    chat: ChatClient,
    speech: SpeechClient,
}

pub fn create(
    bus: &EventBus,
    config: Config,
    store: SharedStore,
    player: SharedPlayer,
) -> Arc<Studio> {
    let chat = ChatClient::new(config.llm.clone());
    let speech = SpeechClient::new(config.tts.clone());

    Arc::new(Studio {
        bus: bus.clone(),
        config,
        store,
        player,
        chat,
        speech,
    })
}

pub fn init(bus: &EventBus, config: Config, store: SharedStore, player: SharedPlayer) {
    let studio = create(bus, config, store, player);
    handle_incoming_event_loop(bus.clone(), studio);
}

fn handle_incoming_event_loop(bus: EventBus, studio: Arc<Studio>) {
    tokio::spawn(async move {
        let mut bus_rx = bus.subscribe();

        loop {
            let event = bus_rx.recv().await;

            if let Event::Studio(action) = event {
                let studio = studio.clone();
                tokio::spawn(async move {
                    handle_incoming_event(studio, action).await;
                });
            }
        }
    });
}

pub async fn handle_incoming_event(studio: Arc<Studio>, action: StudioAction) {
    match action {
        StudioAction::GenerateNote { notebook, prompt } => {
            studio.generate_note(notebook, prompt).await
        }
        StudioAction::Listen { note_id } => studio.listen(note_id).await,
        StudioAction::Speak { note_id } => studio.speak(note_id).await,
        StudioAction::Download { note_id } => studio.download(note_id).await,
        StudioAction::Podcast { note_id, title } => studio.podcast(note_id, title).await,
        StudioAction::Infographic { note_id } => studio.infographic(note_id).await,
    }
}

impl Studio {
    async fn find_note(&self, note_id: u64) -> Option<Note> {
        let store = self.store.read().await;
        store.find_note(note_id).map(|(_, note)| note.clone())
    }

    async fn generate_note(&self, notebook: String, prompt: String) {
        self.bus.notify_info(format!("Generating AI note: {prompt}"));

        let content = match self.chat.generate_note(&prompt).await {
            Ok(content) => content,
            Err(e) => {
                self.bus
                    .notify_error(format!("Failed to generate note: {e}"));
                return;
            }
        };

        let result =
            self.store
                .write()
                .await
                .add_note(&notebook, &format!("AI: {prompt}"), &content);

        match result {
            Ok(id) => self
                .bus
                .notify_success(format!("AI note {id} added to {notebook}")),
            Err(e) => self.bus.notify_error(e.to_string()),
        }
    }

    /// Narrates a note: the session enters Loading before the remote call,
    /// and a stop issued in the meantime discards the synthesis result.
    async fn listen(&self, note_id: u64) {
        let Some(note) = self.find_note(note_id).await else {
            self.bus.notify_error(format!("No note with id {note_id}"));
            return;
        };

        let handle = SessionHandle {
            note_id,
            title: note.title.clone(),
        };
        let token = self.player.write().await.start_buffer(handle);

        match self
            .speech
            .synthesize(&note.content, &self.config.tts.voice)
            .await
        {
            Ok(audio) => {
                let pcm = match wav::decode_base64(&audio.data) {
                    Ok(pcm) => pcm,
                    Err(e) => {
                        self.player.write().await.fail_loading(token);
                        self.bus.notify_error(format!("Failed to decode audio: {e}"));
                        return;
                    }
                };

                let samples = wav::samples_from_pcm16(&pcm, self.config.tts.wav.channels);

                match self.player.write().await.attach_audio(token, samples) {
                    Ok(()) => self
                        .bus
                        .notify_success(format!("Playing note: {}", note.title)),
                    Err(e) => debug!("Discarding synthesis result: {e}"),
                }
            }

            // Explicit fallback policy instead of exception-driven control
            // flow: only a missing credential routes to the live backend.
            Err(SynthesisError::MissingCredential)
                if self.config.tts.fallback == FallbackPolicy::Live =>
            {
                info!("Speech API unavailable, using live synthesis fallback");

                match self.player.write().await.promote_live(token, &note.content) {
                    Ok(()) => self
                        .bus
                        .notify_success(format!("Speaking note live: {}", note.title)),
                    Err(PlayerError::SessionSuperseded) => {
                        debug!("Live fallback superseded by a newer session")
                    }
                    Err(e) => self
                        .bus
                        .notify_error(format!("Live synthesis fallback failed: {e}")),
                }
            }

            Err(e) => {
                self.player.write().await.fail_loading(token);
                self.bus
                    .notify_error(format!("Failed to synthesize audio: {e}"));
            }
        }
    }

    async fn speak(&self, note_id: u64) {
        let Some(note) = self.find_note(note_id).await else {
            self.bus.notify_error(format!("No note with id {note_id}"));
            return;
        };

        let handle = SessionHandle {
            note_id,
            title: note.title.clone(),
        };

        let result = self.player.write().await.start_live(handle, &note.content);
        match result {
            Ok(()) => self
                .bus
                .notify_success(format!("Speaking note live: {}", note.title)),
            Err(e) => self.bus.notify_error(format!("Failed to speak note: {e}")),
        }
    }

    async fn download(&self, note_id: u64) {
        let Some(note) = self.find_note(note_id).await else {
            self.bus.notify_error(format!("No note with id {note_id}"));
            return;
        };

        self.bus
            .notify_info(format!("Generating audio file for: {}", note.title));

        let audio = match self
            .speech
            .synthesize(&note.content, &self.config.tts.voice)
            .await
        {
            Ok(audio) => audio,
            Err(e) => {
                self.bus
                    .notify_error(format!("Failed to synthesize audio: {e}"));
                return;
            }
        };

        let bytes = match wav::encode(&audio.data, &self.config.tts.wav) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.bus.notify_error(format!("Failed to encode audio: {e}"));
                return;
            }
        };

        let filename = artifact::suggested_filename(&note.title, "audio.wav");
        match artifact::save(&self.config.storage.artifacts_dir, &filename, &bytes).await {
            Ok(path) => self
                .bus
                .notify_success(format!("Audio saved to {}", path.display())),
            Err(e) => self.bus.notify_error(e.to_string()),
        }
    }

    async fn podcast(&self, note_id: u64, title: Option<String>) {
        let Some(note) = self.find_note(note_id).await else {
            self.bus.notify_error(format!("No note with id {note_id}"));
            return;
        };

        let title = title.unwrap_or_else(|| note.title.clone());
        self.bus
            .notify_info(format!("Generating podcast: {title}"));

        let conversation_text = match self.chat.generate_conversation(&note.content).await {
            Ok(text) => text,
            Err(e) => {
                self.bus
                    .notify_error(format!("Failed to generate conversation: {e}"));
                return;
            }
        };

        let turns = conversation::parse_strict(&conversation_text);
        if turns.is_empty() {
            self.bus
                .notify_error("Failed to parse conversation from AI response");
            return;
        }

        let turns = conversation::enhance(turns);
        debug!("Podcast dialogue:\n{}", conversation::to_transcript(&turns));

        let voices = vec![
            self.config.tts.speaker1_voice.clone(),
            self.config.tts.speaker2_voice.clone(),
        ];

        let audio = match self.speech.synthesize_dialogue(&turns, &voices).await {
            Ok(audio) => audio,
            Err(e) => {
                self.bus
                    .notify_error(format!("Failed to synthesize podcast: {e}"));
                return;
            }
        };

        let bytes = match wav::encode(&audio.data, &self.config.tts.wav) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.bus.notify_error(format!("Failed to encode audio: {e}"));
                return;
            }
        };

        let filename = artifact::suggested_filename(&title, "podcast.wav");
        match artifact::save(&self.config.storage.artifacts_dir, &filename, &bytes).await {
            Ok(path) => self
                .bus
                .notify_success(format!("Podcast {title} saved to {}", path.display())),
            Err(e) => self.bus.notify_error(e.to_string()),
        }
    }

    async fn infographic(&self, note_id: u64) {
        let Some(note) = self.find_note(note_id).await else {
            self.bus.notify_error(format!("No note with id {note_id}"));
            return;
        };

        self.bus
            .notify_info(format!("Generating infographic for: {}", note.title));

        let html = match self.chat.generate_infographic(&note.content).await {
            Ok(html) => html,
            Err(e) => {
                self.bus
                    .notify_error(format!("Failed to generate infographic: {e}"));
                return;
            }
        };

        let filename = artifact::suggested_filename(&note.title, "infographic.html");
        match artifact::save(&self.config.storage.artifacts_dir, &filename, html.as_bytes()).await
        {
            Ok(path) => self
                .bus
                .notify_success(format!("Infographic saved to {}", path.display())),
            Err(e) => self.bus.notify_error(e.to_string()),
        }
    }
}
