//! Thread state: message sequence, composer input, staged attachments.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_stream::{Stream, StreamExt, wrappers::BroadcastStream};

use crate::events::ThreadEvent;
use crate::types::{Attachment, Message};

/// Snapshot of one conversation's state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThreadState {
    /// Thread identifier
    pub id: String,
    /// Ordered message sequence; insertion order is conversation order
    pub messages: Vec<Message>,
    /// Current composer text
    pub input: String,
    /// Files staged for the next submission
    pub attachments: Vec<Attachment>,
    /// Whether a send is currently in flight.
    ///
    /// Independent from any message's own phase: this flags the request,
    /// a message's `StreamPhase` flags its content.
    pub is_streaming: bool,
}

/// Exclusive owner of one thread's mutable state.
///
/// All mutation goes through the fixed operation set below. Operations are
/// synchronous and total: unmatched ids are absorbed rather than raised, so
/// stale or duplicate adapter callbacks cannot poison the thread. Every
/// mutation broadcasts a [`ThreadEvent`]; slow subscribers lag, they never
/// block a mutation.
pub struct ThreadStore {
    state: Mutex<ThreadState>,
    event_tx: broadcast::Sender<ThreadEvent>,
    generation: AtomicU64,
}

impl ThreadStore {
    /// Create a store for the given thread id
    pub fn new(id: impl Into<String>) -> Arc<Self> {
        let (event_tx, _) = broadcast::channel(256);
        Arc::new(Self {
            state: Mutex::new(ThreadState {
                id: id.into(),
                ..ThreadState::default()
            }),
            event_tx,
            generation: AtomicU64::new(0),
        })
    }

    /// Subscribe to state-change events
    pub fn subscribe(&self) -> broadcast::Receiver<ThreadEvent> {
        self.event_tx.subscribe()
    }

    /// Subscribe as a `Stream`; lagged events are skipped, not errored.
    pub fn event_stream(&self) -> impl Stream<Item = ThreadEvent> + Send + use<> {
        BroadcastStream::new(self.subscribe()).filter_map(|event| event.ok())
    }

    // ---- Reads ----

    /// Clone the full current state
    pub fn snapshot(&self) -> ThreadState {
        self.state.lock().clone()
    }

    /// The thread id
    pub fn thread_id(&self) -> String {
        self.state.lock().id.clone()
    }

    /// The current message sequence
    pub fn messages(&self) -> Vec<Message> {
        self.state.lock().messages.clone()
    }

    /// Look up one message by id
    pub fn message(&self, id: &str) -> Option<Message> {
        self.state.lock().messages.iter().find(|m| m.id == id).cloned()
    }

    /// The current composer text
    pub fn input(&self) -> String {
        self.state.lock().input.clone()
    }

    /// The currently staged attachments
    pub fn attachments(&self) -> Vec<Attachment> {
        self.state.lock().attachments.clone()
    }

    /// Whether a send is in flight
    pub fn is_streaming(&self) -> bool {
        self.state.lock().is_streaming
    }

    // ---- Operations ----

    /// Replace the composer text. Any string is allowed, including empty.
    pub fn set_input(&self, input: impl Into<String>) {
        let input = input.into();
        self.state.lock().input = input.clone();
        self.emit(ThreadEvent::InputChanged { input });
    }

    /// Stage a file for the next submission. Duplicate names are allowed;
    /// entries are distinguished by id only.
    pub fn add_attachment(&self, attachment: Attachment) {
        self.state.lock().attachments.push(attachment.clone());
        self.emit(ThreadEvent::AttachmentAdded { attachment });
    }

    /// Remove a staged file by id. Unknown ids are a no-op.
    pub fn remove_attachment(&self, id: &str) {
        let removed = {
            let mut state = self.state.lock();
            let before = state.attachments.len();
            state.attachments.retain(|a| a.id != id);
            state.attachments.len() != before
        };
        if removed {
            self.emit(ThreadEvent::AttachmentRemoved { id: id.to_string() });
        } else {
            tracing::debug!(id, "remove_attachment: unknown id");
        }
    }

    /// Drop all staged files
    pub fn clear_attachments(&self) {
        self.state.lock().attachments.clear();
        self.emit(ThreadEvent::AttachmentsCleared);
    }

    /// Append a fully-formed message to the end of the sequence.
    /// The store never reorders or deduplicates.
    pub fn append_message(&self, message: Message) {
        self.state.lock().messages.push(message.clone());
        self.emit(ThreadEvent::MessageAppended { message });
    }

    /// Apply a transformation to the message with the given id.
    ///
    /// Unknown ids are a logged no-op: a slow retry firing after its
    /// message was finalized (or the thread reset) is absorbed here.
    pub fn update_message(&self, id: &str, update: impl FnOnce(&mut Message)) {
        let updated = {
            let mut state = self.state.lock();
            match state.messages.iter_mut().find(|m| m.id == id) {
                Some(message) => {
                    update(message);
                    Some(message.clone())
                }
                None => None,
            }
        };
        match updated {
            Some(message) => self.emit(ThreadEvent::MessageUpdated { message }),
            None => tracing::debug!(id, "update_message: unknown id"),
        }
    }

    /// Set the thread-level in-flight flag
    pub fn set_streaming(&self, streaming: bool) {
        self.state.lock().is_streaming = streaming;
        self.emit(ThreadEvent::StreamingChanged { streaming });
    }

    /// Reset to the empty state, keeping the thread id
    pub fn reset(&self) {
        {
            let mut state = self.state.lock();
            let id = std::mem::take(&mut state.id);
            *state = ThreadState {
                id,
                ..ThreadState::default()
            };
        }
        self.emit(ThreadEvent::Reset);
    }

    // ---- Invocation fencing ----

    /// Start a new send invocation; helper handles from older invocations
    /// become stale and their calls are dropped.
    pub fn begin_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// The generation of the most recently started invocation
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    fn emit(&self, event: ThreadEvent) {
        // Send fails only when nobody is subscribed, which is fine.
        let _ = self.event_tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Role, StreamPhase};

    #[test]
    fn test_set_input_replaces() {
        let store = ThreadStore::new("t");
        store.set_input("hel");
        store.set_input("hello");
        assert_eq!(store.input(), "hello");
        store.set_input("");
        assert_eq!(store.input(), "");
    }

    #[test]
    fn test_attachment_ops() {
        let store = ThreadStore::new("t");
        let a = Attachment::new("a.txt");
        let b = Attachment::new("a.txt"); // same name, distinct id
        let a_id = a.id.clone();
        store.add_attachment(a);
        store.add_attachment(b);
        assert_eq!(store.attachments().len(), 2);

        store.remove_attachment(&a_id);
        assert_eq!(store.attachments().len(), 1);

        // Unknown id is a no-op, not an error.
        store.remove_attachment("nope");
        assert_eq!(store.attachments().len(), 1);

        store.clear_attachments();
        assert!(store.attachments().is_empty());
    }

    #[test]
    fn test_append_preserves_order() {
        let store = ThreadStore::new("t");
        store.append_message(Message::user("one"));
        store.append_message(Message::assistant("two"));
        store.append_message(Message::user("three"));

        let contents: Vec<String> = store.messages().into_iter().map(|m| m.content).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_update_message_unknown_id_is_noop() {
        let store = ThreadStore::new("t");
        store.append_message(Message::user("hello"));
        let before = store.messages();

        store.update_message("nonexistent", |m| m.content.push_str("mutated"));

        assert_eq!(store.messages(), before);
    }

    #[test]
    fn test_update_message_applies() {
        let store = ThreadStore::new("t");
        let msg = Message::assistant_streaming("");
        let id = msg.id.clone();
        store.append_message(msg);

        store.update_message(&id, |m| {
            m.content.push_str("chunk");
        });

        let updated = store.message(&id).unwrap();
        assert_eq!(updated.content, "chunk");
        assert_eq!(updated.role, Role::Assistant);
        assert_eq!(updated.phase, StreamPhase::Streaming);
    }

    #[test]
    fn test_reset_keeps_id() {
        let store = ThreadStore::new("support");
        store.set_input("draft");
        store.add_attachment(Attachment::new("a.txt"));
        store.append_message(Message::user("hi"));
        store.set_streaming(true);

        store.reset();

        let state = store.snapshot();
        assert_eq!(state.id, "support");
        assert!(state.messages.is_empty());
        assert_eq!(state.input, "");
        assert!(state.attachments.is_empty());
        assert!(!state.is_streaming);
    }

    #[test]
    fn test_generation_increments() {
        let store = ThreadStore::new("t");
        assert_eq!(store.current_generation(), 0);
        let g1 = store.begin_generation();
        let g2 = store.begin_generation();
        assert_eq!(g1, 1);
        assert_eq!(g2, 2);
        assert_eq!(store.current_generation(), 2);
    }

    #[tokio::test]
    async fn test_events_are_broadcast() {
        let store = ThreadStore::new("t");
        let mut rx = store.subscribe();

        store.set_input("hi");
        store.append_message(Message::user("hi"));
        store.set_streaming(true);

        match rx.recv().await.unwrap() {
            ThreadEvent::InputChanged { input } => assert_eq!(input, "hi"),
            other => panic!("expected InputChanged, got {:?}", other),
        }
        match rx.recv().await.unwrap() {
            ThreadEvent::MessageAppended { message } => assert_eq!(message.content, "hi"),
            other => panic!("expected MessageAppended, got {:?}", other),
        }
        match rx.recv().await.unwrap() {
            ThreadEvent::StreamingChanged { streaming } => assert!(streaming),
            other => panic!("expected StreamingChanged, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_event_stream_yields_events() {
        use tokio_stream::StreamExt;

        let store = ThreadStore::new("t");
        let mut stream = Box::pin(store.event_stream());

        store.append_message(Message::user("hi"));

        match stream.next().await.unwrap() {
            ThreadEvent::MessageAppended { message } => assert_eq!(message.content, "hi"),
            other => panic!("expected MessageAppended, got {:?}", other),
        }
    }
}
