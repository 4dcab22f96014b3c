use crate::event::{Event, EventBus};

/// Severity of a user-facing notification
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotifyKind {
    Info,
    Success,
    Error,
}

/// User-facing message action
#[derive(Clone, Debug)]
pub enum MessageAction {
    /// Show a notification to the user
    Notify { text: String, kind: NotifyKind },
}

impl MessageAction {
    pub fn info(text: impl Into<String>) -> Self {
        MessageAction::Notify {
            text: text.into(),
            kind: NotifyKind::Info,
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        MessageAction::Notify {
            text: text.into(),
            kind: NotifyKind::Success,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        MessageAction::Notify {
            text: text.into(),
            kind: NotifyKind::Error,
        }
    }
}

/// Prints notifications to stdout. All subsystems report their outcomes
/// through this channel; errors never propagate past it.
pub fn init(bus: &EventBus) {
    let bus = bus.clone();
    tokio::spawn(async move {
        let mut subscriber = bus.subscribe();

        loop {
            let event = subscriber.recv().await;

            if let Event::Message(MessageAction::Notify { text, kind }) = event {
                match kind {
                    NotifyKind::Info => println!("[info] {text}"),
                    NotifyKind::Success => println!("[ok] {text}"),
                    NotifyKind::Error => {
                        warn!("User-facing error: {text}");
                        println!("[error] {text}");
                    }
                }
            }
        }
    });
}
