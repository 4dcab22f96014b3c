//! Playback controller enforcing the single-active-session policy.
//!
//! At most one audio session is non-idle at any instant. Starting a new
//! session forcibly stops the previous one before the new session enters
//! Loading, and a stop during Loading invalidates the in-flight synthesis
//! so its late response is discarded.

use crate::buffer::{PlaybackBuffer, Sample};
use crate::event::{Event, EventBus};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::RwLock;

/// Shared sample buffer drained by the audio streamer
pub type SharedBuffer = Arc<Mutex<PlaybackBuffer>>;

pub fn create_buffer() -> SharedBuffer {
    Arc::new(Mutex::new(PlaybackBuffer::new()))
}

/// Lifecycle of an audio session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Loading,
    Playing,
    Paused,
}

/// Where the session's audio comes from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    /// Decoded samples drained from the playback buffer
    BufferPlayback,

    /// A live speech backend producing audio on the host
    LiveSynthesis,
}

/// Identifies the note a session belongs to
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionHandle {
    pub note_id: u64,
    pub title: String,
}

#[derive(Clone, Debug)]
pub enum PlayerAction {
    /// Pauses the active session
    Pause,

    /// Resumes the paused session
    Resume,

    /// Stops whatever is active; no-op when idle
    Stop,

    /// The active audio reached its natural end
    Finished,

    /// Notification that playback has progressed
    PlaybackProgress { position: u64 },

    /// Notification that a session changed state
    StateChanged {
        handle: SessionHandle,
        from: SessionState,
        to: SessionState,
    },
}

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("cannot {op} while {state:?}")]
    InvalidState {
        op: &'static str,
        state: SessionState,
    },

    #[error("the live synthesis backend does not support pause/resume")]
    PauseUnsupported,

    #[error("no live synthesis backend is available")]
    NoLiveBackend,

    #[error("live synthesis failed: {0}")]
    LiveSynthesis(String),

    #[error("audio arrived for a superseded session")]
    SessionSuperseded,
}

/// A live speech backend driving audio on the host device.
///
/// `speak` returns once synthesis has started; natural completion is
/// signalled with [PlayerAction::Finished] on the bus. Implementations must
/// not signal completion after `stop()` has been called.
pub trait SpeechBackend: Send + Sync {
    fn speak(&mut self, text: &str) -> anyhow::Result<()>;

    /// Returns false when the backend has no native pause capability
    fn pause(&mut self) -> bool;

    /// Returns false when the backend has no native resume capability
    fn resume(&mut self) -> bool;

    fn stop(&mut self);
}

struct ActiveSession {
    handle: SessionHandle,
    backend: BackendKind,
    state: SessionState,
    generation: u64,
}

pub struct Player {
    bus: EventBus,
    buffer: SharedBuffer,
    live: Option<Box<dyn SpeechBackend>>,
    current: Option<ActiveSession>,
    generation: u64,
}

impl Player {
    pub fn new(bus: EventBus, buffer: SharedBuffer, live: Option<Box<dyn SpeechBackend>>) -> Self {
        Player {
            bus,
            buffer,
            live,
            current: None,
            generation: 0,
        }
    }

    /// State of the active session, or Idle when there is none
    pub fn state(&self) -> SessionState {
        self.current
            .as_ref()
            .map(|s| s.state)
            .unwrap_or(SessionState::Idle)
    }

    pub fn current_handle(&self) -> Option<SessionHandle> {
        self.current.as_ref().map(|s| s.handle.clone())
    }

    fn emit(&self, handle: &SessionHandle, from: SessionState, to: SessionState) {
        debug!("Session {:?}: {:?} -> {:?}", handle.note_id, from, to);
        self.bus.send(Event::Player(PlayerAction::StateChanged {
            handle: handle.clone(),
            from,
            to,
        }));
    }

    /// Forces the active session (if any) to Idle, stopping its backend and
    /// invalidating any in-flight synthesis for it.
    fn stop_current(&mut self) {
        if let Some(session) = self.current.take() {
            match session.backend {
                BackendKind::BufferPlayback => {
                    if let Ok(mut buf) = self.buffer.lock() {
                        buf.clear();
                    }
                }
                BackendKind::LiveSynthesis => {
                    if let Some(live) = self.live.as_mut() {
                        live.stop();
                    }
                }
            }
            self.emit(&session.handle, session.state, SessionState::Idle);
        }
        self.generation += 1;
    }

    /// Begins a buffer-backed session. Any active session is stopped first.
    /// Returns a token that the eventual `attach_audio` call must present;
    /// tokens from superseded sessions are rejected.
    pub fn start_buffer(&mut self, handle: SessionHandle) -> u64 {
        self.stop_current();

        let token = self.generation;
        self.emit(&handle, SessionState::Idle, SessionState::Loading);
        self.current = Some(ActiveSession {
            handle,
            backend: BackendKind::BufferPlayback,
            state: SessionState::Loading,
            generation: token,
        });

        token
    }

    /// Begins a live synthesis session. Any active session is stopped
    /// first. A failed start always ends in Idle.
    pub fn start_live(&mut self, handle: SessionHandle, text: &str) -> Result<(), PlayerError> {
        self.stop_current();

        if self.live.is_none() {
            return Err(PlayerError::NoLiveBackend);
        }

        let token = self.generation;
        self.emit(&handle, SessionState::Idle, SessionState::Loading);
        self.current = Some(ActiveSession {
            handle,
            backend: BackendKind::LiveSynthesis,
            state: SessionState::Loading,
            generation: token,
        });

        self.speak_live(token, text)
    }

    /// Switches a still-loading buffer session over to the live backend
    /// (the caller's explicit fallback when remote synthesis is
    /// unavailable). Rejected when the session has been superseded.
    pub fn promote_live(&mut self, token: u64, text: &str) -> Result<(), PlayerError> {
        let loading = matches!(
            self.current.as_ref(),
            Some(s) if s.generation == token && s.state == SessionState::Loading
        );
        if !loading {
            return Err(PlayerError::SessionSuperseded);
        }

        if self.live.is_none() {
            self.fail_loading(token);
            return Err(PlayerError::NoLiveBackend);
        }

        if let Some(session) = self.current.as_mut() {
            session.backend = BackendKind::LiveSynthesis;
        }
        self.speak_live(token, text)
    }

    fn speak_live(&mut self, token: u64, text: &str) -> Result<(), PlayerError> {
        let live = self.live.as_mut().expect("live backend checked by caller");

        match live.speak(text) {
            Ok(()) => {
                let session = self.current.as_mut().expect("session set by caller");
                session.state = SessionState::Playing;
                let handle = session.handle.clone();
                self.emit(&handle, SessionState::Loading, SessionState::Playing);
                Ok(())
            }
            Err(e) => {
                self.fail_loading(token);
                Err(PlayerError::LiveSynthesis(e.to_string()))
            }
        }
    }

    /// Completes a loading buffer session with its decoded samples and
    /// begins playback. Audio for a superseded session is rejected so a
    /// late synthesis response never revives a stopped session.
    pub fn attach_audio(&mut self, token: u64, samples: Vec<Sample>) -> Result<(), PlayerError> {
        match self.current.as_mut() {
            Some(s) if s.generation == token && s.state == SessionState::Loading => {
                if let Ok(mut buf) = self.buffer.lock() {
                    buf.clear();
                    buf.push_samples(samples);
                    buf.set_eof(true);
                }
                s.state = SessionState::Playing;
                let handle = s.handle.clone();
                self.emit(&handle, SessionState::Loading, SessionState::Playing);
                Ok(())
            }
            _ => Err(PlayerError::SessionSuperseded),
        }
    }

    /// Returns a failed loading session to Idle. Stale tokens are ignored.
    pub fn fail_loading(&mut self, token: u64) {
        if let Some(s) = self.current.as_ref() {
            if s.generation == token && s.state == SessionState::Loading {
                let session = self.current.take().expect("checked above");
                self.emit(&session.handle, SessionState::Loading, SessionState::Idle);
                self.generation += 1;
            }
        }
    }

    pub fn pause(&mut self) -> Result<(), PlayerError> {
        let state = self.state();
        let session = match self.current.as_mut() {
            Some(s) if s.state == SessionState::Playing => s,
            _ => return Err(PlayerError::InvalidState { op: "pause", state }),
        };

        match session.backend {
            BackendKind::BufferPlayback => {
                if let Ok(mut buf) = self.buffer.lock() {
                    buf.set_paused(true);
                }
            }
            BackendKind::LiveSynthesis => {
                let live = self.live.as_mut().ok_or(PlayerError::NoLiveBackend)?;
                if !live.pause() {
                    return Err(PlayerError::PauseUnsupported);
                }
            }
        }

        session.state = SessionState::Paused;
        let handle = session.handle.clone();
        self.emit(&handle, SessionState::Playing, SessionState::Paused);
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), PlayerError> {
        let state = self.state();
        let session = match self.current.as_mut() {
            Some(s) if s.state == SessionState::Paused => s,
            _ => return Err(PlayerError::InvalidState { op: "resume", state }),
        };

        match session.backend {
            BackendKind::BufferPlayback => {
                if let Ok(mut buf) = self.buffer.lock() {
                    buf.set_paused(false);
                }
            }
            BackendKind::LiveSynthesis => {
                let live = self.live.as_mut().ok_or(PlayerError::NoLiveBackend)?;
                if !live.resume() {
                    return Err(PlayerError::PauseUnsupported);
                }
            }
        }

        session.state = SessionState::Playing;
        let handle = session.handle.clone();
        self.emit(&handle, SessionState::Paused, SessionState::Playing);
        Ok(())
    }

    /// Stops the active session. A no-op when idle.
    pub fn stop(&mut self) {
        if self.current.is_some() {
            self.stop_current();
        }
    }

    /// Natural end of the active audio: releases the session without an
    /// explicit stop.
    pub fn finished(&mut self) {
        if let Some(s) = self.current.as_ref() {
            if s.state == SessionState::Playing {
                let session = self.current.take().expect("checked above");
                if session.backend == BackendKind::BufferPlayback {
                    if let Ok(mut buf) = self.buffer.lock() {
                        buf.clear();
                    }
                }
                self.emit(&session.handle, SessionState::Playing, SessionState::Idle);
                self.generation += 1;
            }
        }
    }
}

/// Type alias for the shared playback controller
pub type SharedPlayer = Arc<RwLock<Player>>;

pub fn init(
    bus: &EventBus,
    buffer: SharedBuffer,
    live: Option<Box<dyn SpeechBackend>>,
) -> SharedPlayer {
    let player = Arc::new(RwLock::new(Player::new(bus.clone(), buffer, live)));

    handle_incoming_event_loop(bus.clone(), player.clone());

    player
}

fn handle_incoming_event_loop(bus: EventBus, player: SharedPlayer) {
    tokio::spawn(async move {
        let mut bus_rx = bus.subscribe();

        loop {
            let event = bus_rx.recv().await;

            if let Event::Player(action) = event {
                let bus = bus.clone();
                let player = player.clone();
                tokio::spawn(async move {
                    handle_incoming_event(bus, player, action).await;
                });
            }
        }
    });
}

pub async fn handle_incoming_event(bus: EventBus, player: SharedPlayer, action: PlayerAction) {
    let mut player = player.write().await;

    match action {
        PlayerAction::Pause => {
            if let Err(e) = player.pause() {
                bus.notify_error(e.to_string());
            }
        }
        PlayerAction::Resume => {
            if let Err(e) = player.resume() {
                bus.notify_error(e.to_string());
            }
        }
        PlayerAction::Stop => player.stop(),
        PlayerAction::Finished => player.finished(),
        // Notifications emitted by the controller/streamer themselves
        PlayerAction::PlaybackProgress { .. } | PlayerAction::StateChanged { .. } => {}
    }
}
