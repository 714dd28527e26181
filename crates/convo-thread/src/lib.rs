//! convo-thread: streaming chat-thread engine
//!
//! This crate provides the state model for an in-application chat surface:
//! a per-thread message store, an adapter contract for plugging in any
//! message-generation backend, the dispatch layer that turns submissions
//! into store mutations, and a rendering data contract for views.

pub mod adapter;
pub mod error;
pub mod events;
pub mod handle;
pub mod render;
pub mod store;
pub mod thread;
pub mod types;

pub use adapter::{ChatAdapter, Helpers};
pub use error::{Error, Result};
pub use events::ThreadEvent;
pub use handle::ThreadHandle;
pub use render::{RenderPhase, RenderUnit, render_units};
pub use store::{ThreadState, ThreadStore};
pub use thread::{EchoConfig, Thread, ThreadConfig};
pub use types::{
    AssistantExtras, Attachment, Finalize, Message, MessageMeta, Role, SendInput, StreamPhase,
    ToolCall,
};
