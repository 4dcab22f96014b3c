//! Test infrastructure for notecast integration tests.
//!
//! Provides mock builders, event collectors, and helper functions for
//! testing the studio without external services.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast::error::TryRecvError;

// Re-export key types from the main crate
pub use notecast::config::{Config, FallbackPolicy, LlmConfig, TtsConfig};
pub use notecast::event::{Event, EventBus, Subscriber};
pub use notecast::message::{MessageAction, NotifyKind};
pub use notecast::notebook::{NotebookAction, NotebookStore};
pub use notecast::player::{
    create_buffer, Player, PlayerAction, SessionHandle, SessionState, SharedPlayer, SpeechBackend,
};
pub use notecast::studio::StudioAction;
pub use notecast::wav::WavParams;

/// Creates a test configuration with no credentials and local defaults.
pub fn test_config() -> Config {
    Config::default()
}

/// Creates a test configuration whose remote endpoints point at a mock
/// server.
pub fn test_config_with_endpoints(llm_endpoint: &str, tts_endpoint: &str) -> Config {
    let mut config = Config::default();
    config.llm.api_key = Some("test-key".to_string());
    config.llm.endpoint = llm_endpoint.to_string();
    config.llm.model = "test-model".to_string();
    config.tts.api_key = Some("test-key".to_string());
    config.tts.endpoint = tts_endpoint.to_string();
    config.tts.model = "test-tts".to_string();
    config
}

/// Creates a shared player without a live backend.
pub fn test_player(bus: &EventBus) -> SharedPlayer {
    Arc::new(tokio::sync::RwLock::new(Player::new(
        bus.clone(),
        create_buffer(),
        None,
    )))
}

/// Creates a shared player with the given live backend.
pub fn test_player_with_backend(
    bus: &EventBus,
    backend: Box<dyn SpeechBackend>,
) -> SharedPlayer {
    Arc::new(tokio::sync::RwLock::new(Player::new(
        bus.clone(),
        create_buffer(),
        Some(backend),
    )))
}

/// A scripted live synthesis backend recording what it was asked to speak.
pub struct MockSpeechBackend {
    pub pausable: bool,
    pub spoken: Arc<Mutex<Vec<String>>>,
}

impl MockSpeechBackend {
    pub fn new(pausable: bool) -> (Self, Arc<Mutex<Vec<String>>>) {
        let spoken = Arc::new(Mutex::new(Vec::new()));
        (
            MockSpeechBackend {
                pausable,
                spoken: spoken.clone(),
            },
            spoken,
        )
    }
}

impl SpeechBackend for MockSpeechBackend {
    fn speak(&mut self, text: &str) -> anyhow::Result<()> {
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn pause(&mut self) -> bool {
        self.pausable
    }

    fn resume(&mut self) -> bool {
        self.pausable
    }

    fn stop(&mut self) {}
}

/// Collects all events from a subscriber within a timeout period.
/// Returns events in the order they were received.
pub async fn collect_events(subscriber: &mut Subscriber, timeout: Duration) -> Vec<Event> {
    let mut events = Vec::new();
    let deadline = tokio::time::Instant::now() + timeout;

    loop {
        match subscriber.try_recv() {
            Ok(event) => events.push(event),
            Err(TryRecvError::Empty) => {
                if tokio::time::Instant::now() >= deadline {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            Err(TryRecvError::Lagged(n)) => {
                eprintln!("Warning: subscriber lagged, missed {n} events");
            }
            Err(TryRecvError::Closed) => break,
        }
    }

    events
}

/// Waits for a specific type of event within a timeout.
pub async fn wait_for_event<F>(
    subscriber: &mut Subscriber,
    timeout: Duration,
    matches: F,
) -> Option<Event>
where
    F: Fn(&Event) -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;

    loop {
        match subscriber.try_recv() {
            Ok(event) if matches(&event) => return Some(event),
            Ok(_) => continue,
            Err(TryRecvError::Empty) => {
                if tokio::time::Instant::now() >= deadline {
                    return None;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Closed) => return None,
        }
    }
}

/// Extracts state changes from a list of events.
pub fn filter_state_changes(events: &[Event]) -> Vec<(u64, SessionState, SessionState)> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Player(PlayerAction::StateChanged { handle, from, to }) => {
                Some((handle.note_id, *from, *to))
            }
            _ => None,
        })
        .collect()
}

/// Extracts notification texts of a given kind from a list of events.
pub fn filter_notifications(events: &[Event], wanted: NotifyKind) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Message(MessageAction::Notify { text, kind }) if *kind == wanted => {
                Some(text.clone())
            }
            _ => None,
        })
        .collect()
}

/// Checks if any notification in the list contains the given substring.
pub fn has_notification_containing(events: &[Event], substring: &str) -> bool {
    events.iter().any(|e| {
        matches!(e, Event::Message(MessageAction::Notify { text, .. }) if text.contains(substring))
    })
}

/// Asserts that a specific event type was received.
#[macro_export]
macro_rules! assert_event_received {
    ($events:expr, $pattern:pat) => {
        assert!(
            $events.iter().any(|e| matches!(e, $pattern)),
            "Expected event matching {} not found in {:?}",
            stringify!($pattern),
            $events
        );
    };
}

/// Asserts that a specific event type was NOT received.
#[macro_export]
macro_rules! assert_event_not_received {
    ($events:expr, $pattern:pat) => {
        assert!(
            !$events.iter().any(|e| matches!(e, $pattern)),
            "Unexpected event matching {} found in {:?}",
            stringify!($pattern),
            $events
        );
    };
}
