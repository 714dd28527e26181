//! Adapter contract: how a reply is produced, decoupled from how it renders.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::store::ThreadStore;
use crate::types::{
    AssistantExtras, Finalize, Message, MessageMeta, Role, SendInput, StreamPhase, ToolCall,
    new_id, now_millis,
};

/// Produces replies for submitted user turns.
///
/// The sole integration seam to any backend (REST/SSE, WebSocket, a local
/// model, or a mock). Implementations report incremental progress through
/// [`Helpers`] and record failures on the affected message via
/// [`Helpers::set_error`]; an `Err` return is treated as an unrecovered
/// fault and propagates out of the dispatching call unswallowed.
///
/// `cancel` is cancelled when the embedder aborts the send or a newer send
/// supersedes this one; implementations should stop issuing helper calls
/// once it fires. Late calls are dropped by invocation fencing regardless.
#[async_trait]
pub trait ChatAdapter: Send + Sync {
    /// Produce a reply for `input`, reporting progress through `helpers`.
    async fn send(
        &self,
        input: SendInput,
        helpers: Helpers,
        cancel: CancellationToken,
    ) -> crate::error::Result<()>;
}

/// Capability object bound to a single `send` invocation.
///
/// Cloneable and cheap; every call reads current store state at call time
/// rather than a snapshot. Calls from an invocation that is no longer the
/// thread's current one are dropped (see `Thread::send_message`).
#[derive(Clone)]
pub struct Helpers {
    store: Arc<ThreadStore>,
    generation: u64,
}

impl Helpers {
    pub(crate) fn new(store: Arc<ThreadStore>, generation: u64) -> Self {
        Self { store, generation }
    }

    /// Whether this invocation is still the thread's current one.
    fn live(&self) -> bool {
        let current = self.store.current_generation();
        if self.generation == current {
            true
        } else {
            tracing::warn!(
                generation = self.generation,
                current,
                "dropping helper call from superseded invocation"
            );
            false
        }
    }

    /// Create a new assistant message and return its id.
    ///
    /// Typically called once per invocation with empty content and
    /// `AssistantExtras::streaming()`; each call produces an independent
    /// message.
    pub fn append_assistant(&self, content: impl Into<String>, extras: AssistantExtras) -> String {
        let id = new_id();
        if !self.live() {
            // The id is still handed back; every call made with it will
            // land in the unknown-id no-op path.
            return id;
        }
        self.store.append_message(Message {
            id: id.clone(),
            role: Role::Assistant,
            content: content.into(),
            created_at: now_millis(),
            attachments: Vec::new(),
            tool_calls: extras.tool_calls,
            phase: if extras.streaming {
                StreamPhase::Streaming
            } else {
                StreamPhase::Complete
            },
            error: None,
            meta: extras.meta,
        });
        id
    }

    /// Append a chunk to the named message and mark it streaming.
    ///
    /// Content is append-only: chunks concatenate in call order. Once the
    /// message has reached a terminal phase this is a no-op.
    pub fn stream_assistant(&self, message_id: &str, chunk: &str) {
        if !self.live() {
            return;
        }
        self.store.update_message(message_id, |m| {
            if m.phase.is_terminal() {
                return;
            }
            m.content.push_str(chunk);
            m.phase = StreamPhase::Streaming;
        });
    }

    /// End the message's streaming lifecycle, optionally merging final
    /// metadata. Terminal: later stream chunks are dropped.
    pub fn finish_assistant(&self, message_id: &str, finalize: Option<Finalize>) {
        if !self.live() {
            return;
        }
        self.store.update_message(message_id, |m| {
            if m.phase.is_terminal() {
                return;
            }
            m.phase = StreamPhase::Finalized;
            if let Some(finalize) = finalize {
                if let Some(meta) = finalize.meta {
                    m.meta.merge(meta);
                }
            }
        });
    }

    /// Record a terminal error on the message. The message stays in the
    /// transcript and renders in a failed state.
    pub fn set_error(&self, message_id: &str, error: impl Into<String>) {
        if !self.live() {
            return;
        }
        let error = error.into();
        self.store.update_message(message_id, |m| {
            if m.phase.is_terminal() {
                return;
            }
            m.error = Some(error);
            m.phase = StreamPhase::Failed;
        });
    }

    /// Append a tool-call record.
    ///
    /// Append-only: reporting a call as pending and later reporting it
    /// with a result produces two entries sharing a call id. Allowed
    /// before, during, and after streaming.
    pub fn add_tool_call(&self, message_id: &str, call: ToolCall) {
        if !self.live() {
            return;
        }
        self.store.update_message(message_id, |m| m.tool_calls.push(call));
    }
}

/// Convenience: adapters often only need the meta of the input they were
/// handed plus a model name for finalize.
pub fn finalize_with_model(model: impl Into<String>) -> Finalize {
    Finalize::with_meta(MessageMeta {
        model: Some(model.into()),
        ..MessageMeta::default()
    })
}
