//! Rendering data contract: stable-keyed render units derived from the
//! message sequence. Visual styling is the embedder's concern.

use serde::Serialize;

use crate::types::{Attachment, Message, Role, StreamPhase, ToolCall};

/// Visual lifecycle of a rendered message.
///
/// `pending` and `streaming` show a transient thinking indicator;
/// `finalized` shows full content; `failed` shows the error inline.
/// Transitions are monotonic: a terminal phase is never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderPhase {
    /// Streaming with no visible content yet
    Pending,
    /// Streaming, content growing
    Streaming,
    /// Done; render full content
    Finalized,
    /// Terminal error; render it inline, keep the row in the transcript
    Failed,
}

/// Derive the render phase for one message. A recorded error wins over
/// any streaming state.
pub fn phase_of(message: &Message) -> RenderPhase {
    if message.error.is_some() {
        return RenderPhase::Failed;
    }
    match message.phase {
        StreamPhase::Streaming => {
            if message.content.is_empty() {
                RenderPhase::Pending
            } else {
                RenderPhase::Streaming
            }
        }
        StreamPhase::Failed => RenderPhase::Failed,
        StreamPhase::Complete | StreamPhase::Finalized => RenderPhase::Finalized,
    }
}

/// A tool-call row with its derived pending/resolved status
#[derive(Debug, Clone, Serialize)]
pub struct ToolCallView {
    pub id: String,
    pub name: String,
    pub args: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// True while no result has been attached
    pub pending: bool,
}

impl From<&ToolCall> for ToolCallView {
    fn from(call: &ToolCall) -> Self {
        Self {
            id: call.id.clone(),
            name: call.name.clone(),
            args: call.args.clone(),
            result: call.result.clone(),
            pending: call.is_pending(),
        }
    }
}

/// Everything a view needs for one message, keyed by the message id so
/// rows stay stable across re-renders.
#[derive(Debug, Clone, Serialize)]
pub struct RenderUnit {
    /// Stable row key (the message id)
    pub key: String,
    pub role: Role,
    pub phase: RenderPhase,
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: i64,
    /// Finalized turns tuck tool activity behind a collapsed disclosure;
    /// in-progress turns show it live.
    pub collapse_tool_calls: bool,
}

impl RenderUnit {
    fn from_message(message: &Message) -> Self {
        let phase = phase_of(message);
        Self {
            key: message.id.clone(),
            role: message.role,
            phase,
            content: message.content.clone(),
            attachments: message.attachments.clone(),
            tool_calls: message.tool_calls.iter().map(ToolCallView::from).collect(),
            error: message.error.clone(),
            created_at: message.created_at,
            collapse_tool_calls: phase == RenderPhase::Finalized && !message.tool_calls.is_empty(),
        }
    }
}

/// Map the ordered message sequence to render units, preserving order.
pub fn render_units(messages: &[Message]) -> Vec<RenderUnit> {
    messages.iter().map(RenderUnit::from_message).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_pending_then_streaming() {
        let mut msg = Message::assistant_streaming("");
        assert_eq!(phase_of(&msg), RenderPhase::Pending);

        msg.content.push_str("Hel");
        assert_eq!(phase_of(&msg), RenderPhase::Streaming);
    }

    #[test]
    fn test_phase_finalized() {
        let mut msg = Message::assistant_streaming("Hello");
        msg.phase = StreamPhase::Finalized;
        assert_eq!(phase_of(&msg), RenderPhase::Finalized);

        // Messages created whole render as finalized too.
        let whole = Message::assistant("Hello");
        assert_eq!(phase_of(&whole), RenderPhase::Finalized);
    }

    #[test]
    fn test_phase_error_wins() {
        let mut msg = Message::assistant_streaming("partial");
        msg.error = Some("backend unavailable".to_string());
        assert_eq!(phase_of(&msg), RenderPhase::Failed);
    }

    #[test]
    fn test_units_keyed_by_message_id_in_order() {
        let messages = vec![Message::user("a"), Message::assistant("b")];
        let units = render_units(&messages);
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].key, messages[0].id);
        assert_eq!(units[1].key, messages[1].id);
        assert_eq!(units[0].role, Role::User);
    }

    #[test]
    fn test_tool_call_view_status() {
        let mut msg = Message::assistant_streaming("");
        msg.tool_calls
            .push(ToolCall::pending("t1", "search", serde_json::json!({"q": "x"})));
        msg.tool_calls.push(ToolCall::resolved(
            "t1",
            "search",
            serde_json::json!({"q": "x"}),
            serde_json::json!(["hit"]),
        ));

        let unit = &render_units(std::slice::from_ref(&msg))[0];
        assert_eq!(unit.tool_calls.len(), 2);
        assert!(unit.tool_calls[0].pending);
        assert!(!unit.tool_calls[1].pending);
        // Still streaming: tool activity shows live, not collapsed.
        assert!(!unit.collapse_tool_calls);
    }

    #[test]
    fn test_collapse_disclosure_when_finalized() {
        let mut msg = Message::assistant("done");
        msg.tool_calls
            .push(ToolCall::pending("t1", "search", serde_json::json!({})));

        let unit = &render_units(std::slice::from_ref(&msg))[0];
        assert!(unit.collapse_tool_calls);
    }
}
