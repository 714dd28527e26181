//! Thread dispatch: turns submissions into store mutations and adapter calls.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::adapter::{ChatAdapter, Helpers};
use crate::error::Result;
use crate::handle::ThreadHandle;
use crate::store::ThreadStore;
use crate::types::{AssistantExtras, Message, Role, SendInput, StreamPhase, new_id, now_millis};

/// Echo fallback settings, used when no adapter is wired.
#[derive(Debug, Clone)]
pub struct EchoConfig {
    /// Prefix prepended to the echoed content
    pub prefix: String,
    /// Delay before each streamed token
    pub token_delay: Duration,
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self {
            prefix: "Echo:".to_string(),
            token_delay: Duration::from_millis(50),
        }
    }
}

/// Thread configuration
#[derive(Debug, Clone)]
pub struct ThreadConfig {
    /// Thread identifier; independent threads never share state
    pub thread_id: String,
    /// Echo fallback behavior
    pub echo: EchoConfig,
}

impl Default for ThreadConfig {
    fn default() -> Self {
        Self {
            thread_id: "local".to_string(),
            echo: EchoConfig::default(),
        }
    }
}

/// One conversation surface.
///
/// The single writer bridging user-initiated events and adapter-initiated
/// events into store mutations, and the only component that constructs
/// [`Helpers`].
pub struct Thread {
    store: Arc<ThreadStore>,
    adapter: Option<Arc<dyn ChatAdapter>>,
    config: ThreadConfig,
    handle: ThreadHandle,
}

impl Thread {
    /// Create a thread with no adapter; sends run the built-in echo
    /// fallback so the surface is exercisable without a backend.
    pub fn new(config: ThreadConfig) -> Self {
        let store = ThreadStore::new(config.thread_id.clone());
        Self {
            store,
            adapter: None,
            config,
            handle: ThreadHandle::new(),
        }
    }

    /// Create a thread backed by an adapter
    pub fn with_adapter(config: ThreadConfig, adapter: Arc<dyn ChatAdapter>) -> Self {
        let mut thread = Self::new(config);
        thread.adapter = Some(adapter);
        thread
    }

    /// Seed the store from a persisted transcript
    pub fn with_initial_messages(self, messages: Vec<Message>) -> Self {
        for message in messages {
            self.store.append_message(message);
        }
        self
    }

    /// The store owning this thread's state
    pub fn store(&self) -> Arc<ThreadStore> {
        Arc::clone(&self.store)
    }

    /// A cloneable handle for aborting from outside
    pub fn handle(&self) -> ThreadHandle {
        self.handle.clone()
    }

    /// Abort the in-flight send, if any
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// The thread configuration
    pub fn config(&self) -> &ThreadConfig {
        &self.config
    }

    /// Submit a user turn.
    ///
    /// The user message is committed and the composer cleared before the
    /// adapter runs, so a fast re-render can never drop the submission.
    /// Errors returned by the adapter are propagated unswallowed; the
    /// transcript keeps whatever partial state the adapter left behind.
    pub async fn send_message(&self, input: SendInput) -> Result<()> {
        let user_message = Message {
            id: new_id(),
            role: Role::User,
            content: input.content.clone(),
            created_at: now_millis(),
            attachments: input.attachments.clone(),
            tool_calls: Vec::new(),
            phase: StreamPhase::Complete,
            error: None,
            meta: input.meta.clone(),
        };

        // Order matters: commit, then clear the composer.
        self.store.append_message(user_message);
        self.store.set_input("");
        self.store.clear_attachments();

        let generation = self.store.begin_generation();
        let helpers = Helpers::new(Arc::clone(&self.store), generation);
        let cancel = self.handle.reset_cancel();

        self.store.set_streaming(true);
        let result = match &self.adapter {
            Some(adapter) => adapter.send(input, helpers, cancel).await,
            None => {
                self.echo_fallback(&input.content, &helpers, &cancel).await;
                Ok(())
            }
        };
        // Only the current invocation may clear the in-flight flag; a
        // superseded one finishing late must not mask the newer send.
        if self.store.current_generation() == generation {
            self.store.set_streaming(false);
        }
        result
    }

    /// Re-send the content and attachments of the most recent user
    /// message. A no-op on a thread with no user messages.
    pub async fn regenerate(&self) -> Result<()> {
        let last_user = self
            .store
            .messages()
            .into_iter()
            .rev()
            .find(|m| m.role == Role::User);
        match last_user {
            Some(message) => {
                self.send_message(SendInput {
                    content: message.content,
                    attachments: message.attachments,
                    meta: message.meta,
                })
                .await
            }
            None => Ok(()),
        }
    }

    /// Reference echo behavior: stream the submission back token by token.
    /// Not part of the production contract.
    async fn echo_fallback(&self, content: &str, helpers: &Helpers, cancel: &CancellationToken) {
        let message_id = helpers.append_assistant("", AssistantExtras::streaming());
        let reply = format!("{} {}", self.config.echo.prefix, content);
        for token in reply.split_whitespace() {
            if cancel.is_cancelled() {
                tracing::debug!("echo fallback cancelled");
                break;
            }
            tokio::time::sleep(self.config.echo.token_delay).await;
            helpers.stream_assistant(&message_id, &format!("{token} "));
        }
        helpers.finish_assistant(&message_id, None);
    }
}
