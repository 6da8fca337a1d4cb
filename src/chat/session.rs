use futures::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::context;
use crate::config::AppSettings;
use crate::llm::{ChatClient, ChatRequest, LlmError};
use crate::project::{Message, ERROR_HINT};
use crate::prompts::PromptManager;
use crate::storage::ProjectStore;

/// How a call to [`ChatSession::send`] ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Blank input; nothing was appended and no request was made.
    Ignored,
    /// Another send is still streaming.
    Busy,
    ProjectMissing,
    /// The reply streamed to the end and was persisted.
    Completed(Message),
    /// The caller cancelled mid-stream. Text received so far was kept.
    Cancelled(Option<Message>),
    /// The request failed; the error message appended to the conversation.
    Failed(Message),
}

/// Something the front end should re-render.
#[derive(Debug, Clone, Copy)]
pub enum SessionEvent<'a> {
    UserMessage(&'a Message),
    /// The in-flight reply with the cumulative text received so far.
    Streaming(&'a Message),
    Finished(&'a Message),
    Error(&'a Message),
}

/// Clears the in-flight flag however `send` exits.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Sends user turns to the completion API and folds the streamed reply back
/// into the project. The only component that talks to the provider.
pub struct ChatSession {
    client: Arc<dyn ChatClient>,
    prompts: PromptManager,
    in_flight: AtomicBool,
}

impl ChatSession {
    pub fn new(client: Arc<dyn ChatClient>, prompts: PromptManager) -> Self {
        Self {
            client,
            prompts,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Append `text` as a user turn, stream the assistant reply and persist
    /// the result.
    ///
    /// The user message is committed before the network call so it survives
    /// a failed request. The streaming placeholder is only shown through
    /// `on_event`; the store sees the reply once it is complete (or
    /// cancelled), or an error message in its place.
    pub async fn send(
        &self,
        store: &mut ProjectStore,
        project_id: &str,
        text: &str,
        settings: &AppSettings,
        cancel: &CancellationToken,
        mut on_event: impl FnMut(SessionEvent<'_>),
    ) -> SendOutcome {
        let user_text = text.trim();
        if user_text.is_empty() {
            return SendOutcome::Ignored;
        }
        if self.in_flight.swap(true, Ordering::SeqCst) {
            warn!("Send ignored: a reply is still streaming");
            return SendOutcome::Busy;
        }
        let _guard = InFlight(&self.in_flight);

        let user_message = Message::user(user_text);
        match store.modify(project_id, |p| p.messages.push(user_message.clone())) {
            Ok(Some(())) => {}
            Ok(None) => return SendOutcome::ProjectMissing,
            Err(e) => error!("Failed to persist user message: {}", e),
        }
        on_event(SessionEvent::UserMessage(&user_message));

        let Some(api_key) = settings.effective_api_key() else {
            return self.fail(store, project_id, LlmError::MissingApiKey, &mut on_event);
        };

        let Some(project) = store.get(project_id) else {
            return SendOutcome::ProjectMissing;
        };
        let materials = context::assemble(project.active_materials());
        let request = ChatRequest {
            model: settings.effective_model().to_string(),
            system_instruction: self.prompts.system_instruction(&materials.text),
            history: context::effective_history(&project.messages, user_text),
            message: user_text.to_string(),
            images: materials.images,
        };
        info!(
            "💬 Sending to {}: {} prior turns, {} images, {} context chars",
            request.model,
            request.history.len(),
            request.images.len(),
            materials.text.chars().count()
        );

        let mut reply = Message::model("");
        on_event(SessionEvent::Streaming(&reply));

        let mut stream = tokio::select! {
            biased;
            _ = cancel.cancelled() => return self.cancelled(store, project_id, reply),
            result = self.client.stream_chat(api_key, request) => match result {
                Ok(stream) => stream,
                Err(e) => return self.fail(store, project_id, e, &mut on_event),
            },
        };

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return self.cancelled(store, project_id, reply),
                chunk = stream.next() => match chunk {
                    Some(Ok(snapshot)) => {
                        reply.text = snapshot;
                        on_event(SessionEvent::Streaming(&reply));
                    }
                    Some(Err(e)) => return self.fail(store, project_id, e, &mut on_event),
                    None => break,
                },
            }
        }

        debug!("Reply complete: {} chars", reply.text.chars().count());
        if let Err(e) = store.modify(project_id, |p| p.messages.push(reply.clone())) {
            error!("Failed to persist reply: {}", e);
        }
        on_event(SessionEvent::Finished(&reply));
        SendOutcome::Completed(reply)
    }

    fn cancelled(&self, store: &mut ProjectStore, project_id: &str, reply: Message) -> SendOutcome {
        info!("⏹️ Send cancelled after {} chars", reply.text.chars().count());
        if reply.text.is_empty() {
            return SendOutcome::Cancelled(None);
        }
        if let Err(e) = store.modify(project_id, |p| p.messages.push(reply.clone())) {
            error!("Failed to persist partial reply: {}", e);
        }
        SendOutcome::Cancelled(Some(reply))
    }

    fn fail(
        &self,
        store: &mut ProjectStore,
        project_id: &str,
        err: LlmError,
        on_event: &mut impl FnMut(SessionEvent<'_>),
    ) -> SendOutcome {
        error!("Failed to generate response: {}", err);
        let message = Message::error(format!("Error: {}\n\n{}", err, ERROR_HINT));
        if let Err(e) = store.modify(project_id, |p| p.messages.push(message.clone())) {
            error!("Failed to persist error message: {}", e);
        }
        on_event(SessionEvent::Error(&message));
        SendOutcome::Failed(message)
    }
}
