//! Core types for chat threads

use serde::{Deserialize, Serialize};

/// Generate a fresh opaque id (UUID v4).
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Current time as epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Message roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
    Tool,
}

impl Role {
    /// Get the role as a string
    pub fn name(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
            Role::Tool => "tool",
        }
    }
}

/// A file reference, staged in the composer or attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// MIME type, if the picker reported one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Optional preview/download URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Attachment {
    /// Create an attachment with a fresh id
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            size: None,
            kind: None,
            url: None,
        }
    }

    /// Set the size in bytes
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Set the MIME type
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Set the preview/download URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// One tool invocation attached to a message.
///
/// Accumulation on a message is append-only: a call reported without a
/// result and its later resolution are two entries sharing a call id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Argument map as reported by the backend
    pub args: serde_json::Value,
    /// Absent while the call is still pending
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}

impl ToolCall {
    /// Create a pending tool call (no result yet)
    pub fn pending(
        id: impl Into<String>,
        name: impl Into<String>,
        args: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            args,
            result: None,
        }
    }

    /// Create a resolved tool call
    pub fn resolved(
        id: impl Into<String>,
        name: impl Into<String>,
        args: serde_json::Value,
        result: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            args,
            result: Some(result),
        }
    }

    /// Check whether this entry is still awaiting a result
    pub fn is_pending(&self) -> bool {
        self.result.is_none()
    }
}

/// Streaming lifecycle of a message.
///
/// Transitions are monotonic: `Complete`/`Streaming` may advance to
/// `Finalized` or `Failed`, and neither terminal phase is ever left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamPhase {
    /// Created whole; not receiving chunks
    #[default]
    Complete,
    /// Still receiving content
    Streaming,
    /// Streaming finished
    Finalized,
    /// A terminal error was recorded
    Failed,
}

impl StreamPhase {
    /// Check if this phase is terminal (no further content mutations)
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamPhase::Finalized | StreamPhase::Failed)
    }
}

/// Auxiliary message metadata attached at creation or finalize.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageMeta {
    /// Model that produced the reply
    pub model: Option<String>,
    /// Backend run/request identifier
    pub run_id: Option<String>,
    /// Source citations
    pub citations: Vec<String>,
}

impl MessageMeta {
    /// Check whether no field is set
    pub fn is_empty(&self) -> bool {
        self.model.is_none() && self.run_id.is_none() && self.citations.is_empty()
    }

    /// Merge another meta into this one; set fields win over unset ones.
    pub fn merge(&mut self, other: MessageMeta) {
        if other.model.is_some() {
            self.model = other.model;
        }
        if other.run_id.is_some() {
            self.run_id = other.run_id;
        }
        if !other.citations.is_empty() {
            self.citations = other.citations;
        }
    }
}

/// One turn in a conversation.
///
/// `id` is assigned once and never reused within a thread. `content` is
/// append-only while the message streams; once the phase turns terminal
/// only `tool_calls` may still grow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    /// Creation time, epoch milliseconds
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default)]
    pub phase: StreamPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "MessageMeta::is_empty")]
    pub meta: MessageMeta,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            role,
            content: content.into(),
            created_at: now_millis(),
            attachments: Vec::new(),
            tool_calls: Vec::new(),
            phase: StreamPhase::Complete,
            error: None,
            meta: MessageMeta::default(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    /// Create a user message carrying attachments
    pub fn user_with_attachments(content: impl Into<String>, attachments: Vec<Attachment>) -> Self {
        Self {
            attachments,
            ..Self::with_role(Role::User, content)
        }
    }

    /// Create a completed assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Create an assistant message that is still receiving content
    pub fn assistant_streaming(content: impl Into<String>) -> Self {
        Self {
            phase: StreamPhase::Streaming,
            ..Self::with_role(Role::Assistant, content)
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    /// Whether this message is still receiving content
    pub fn is_streaming(&self) -> bool {
        self.phase == StreamPhase::Streaming
    }
}

/// Typed creation extras for a new assistant message.
#[derive(Debug, Clone, Default)]
pub struct AssistantExtras {
    /// Create the message in the `Streaming` phase
    pub streaming: bool,
    /// Tool calls known at creation time
    pub tool_calls: Vec<ToolCall>,
    /// Metadata known at creation time
    pub meta: MessageMeta,
}

impl AssistantExtras {
    /// Extras for the common case: an empty message about to stream
    pub fn streaming() -> Self {
        Self {
            streaming: true,
            ..Self::default()
        }
    }
}

/// Typed fields merged into a message when it is finalized.
#[derive(Debug, Clone, Default)]
pub struct Finalize {
    /// Final metadata (model name, run id, citations)
    pub meta: Option<MessageMeta>,
}

impl Finalize {
    /// Finalize with metadata
    pub fn with_meta(meta: MessageMeta) -> Self {
        Self { meta: Some(meta) }
    }
}

/// A submitted user turn.
///
/// A value, not a reference to store state: what the adapter receives is
/// decoupled from whatever the composer holds afterwards.
#[derive(Debug, Clone, Default)]
pub struct SendInput {
    pub content: String,
    pub attachments: Vec<Attachment>,
    pub meta: MessageMeta,
}

impl SendInput {
    /// A plain text submission
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }
}
