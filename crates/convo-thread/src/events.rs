//! Thread event types

use serde::{Deserialize, Serialize};

use crate::types::{Attachment, Message};

/// Events emitted as a thread's state changes.
///
/// Every store mutation broadcasts exactly one event, so a subscriber that
/// starts from a [`crate::store::ThreadStore::snapshot`] and applies events
/// in order stays consistent with the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ThreadEvent {
    /// Composer text replaced
    InputChanged { input: String },

    /// A file was staged for the next submission
    AttachmentAdded { attachment: Attachment },

    /// A staged file was removed
    AttachmentRemoved { id: String },

    /// All staged files were dropped
    AttachmentsCleared,

    /// A message was appended to the sequence
    MessageAppended { message: Message },

    /// An existing message was mutated in place
    MessageUpdated { message: Message },

    /// The thread-level in-flight flag changed
    StreamingChanged { streaming: bool },

    /// The thread was reset to its empty state
    Reset,
}

impl ThreadEvent {
    /// The message payload, for the two message-carrying variants
    pub fn message(&self) -> Option<&Message> {
        match self {
            ThreadEvent::MessageAppended { message } | ThreadEvent::MessageUpdated { message } => {
                Some(message)
            }
            _ => None,
        }
    }
}
