//! The agent loop implementation.
//!
//! [`AgentLoop::run`] returns a lazy stream of [`LoopEvent`]s. Nothing runs
//! until the stream is polled, and each poll advances the loop to its next
//! emission: a model call, a tool call, a backoff sleep or the idle wait for
//! interactive input.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use futures::Stream;
use loopy_core::agent::{LoopSettings, ModelErrorPolicy};
use loopy_core::error::ProviderError;
use loopy_core::event::LoopEvent;
use loopy_core::message::{Conversation, Message};
use loopy_core::provider::{ModelProvider, ProviderRequest, ProviderResponse};
use loopy_core::queue::InteractiveQueue;
use loopy_core::tool::ToolRegistry;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// The event stream produced by [`AgentLoop::run`].
pub type LoopStream = Pin<Box<dyn Stream<Item = LoopEvent> + Send>>;

/// The core agent loop that orchestrates model calls and tool execution.
pub struct AgentLoop {
    provider: Arc<dyn ModelProvider>,
    tools: Arc<ToolRegistry>,
    settings: LoopSettings,

    /// Interactive input; without it the stream ends after the first turn
    queue: Option<Arc<InteractiveQueue>>,

    cancel: Option<CancellationToken>,
}

impl AgentLoop {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        tools: Arc<ToolRegistry>,
        settings: LoopSettings,
    ) -> Self {
        Self {
            provider,
            tools,
            settings,
            queue: None,
            cancel: None,
        }
    }

    /// Keep the session alive between turns, reading new input from `queue`.
    pub fn with_queue(mut self, queue: Arc<InteractiveQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    /// Stop the session when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Start a session with `prompt` as the first user message.
    pub fn run(self, prompt: impl Into<String>) -> LoopStream {
        let prompt = prompt.into();
        let Self {
            provider,
            tools,
            settings,
            queue,
            cancel,
        } = self;

        Box::pin(stream! {
            // A token nobody holds never fires.
            let cancel = cancel.unwrap_or_default();
            let definitions = tools.definitions();

            let mut conversation = Conversation::new();
            if let Some(system_prompt) = &settings.system_prompt {
                conversation.push(Message::system(system_prompt.as_str()));
            }
            conversation.push(Message::user(prompt));

            info!(
                conversation_id = %conversation.id,
                provider = provider.name(),
                model = %settings.model,
                tools = definitions.len(),
                max_iterations = settings.max_iterations,
                interactive = queue.is_some(),
                "Starting agent loop"
            );

            let mut iteration: u32 = 0;

            'session: loop {
                'turn: loop {
                    if iteration >= settings.max_iterations {
                        warn!(
                            conversation_id = %conversation.id,
                            iterations = iteration,
                            "Max iterations reached, halting"
                        );
                        yield LoopEvent::done(settings.max_iterations, true);
                        break 'session;
                    }

                    iteration += 1;
                    debug!(conversation_id = %conversation.id, iteration, "Agent loop iteration");
                    yield LoopEvent::thinking(iteration);

                    // Rate-limited calls are retried in place, so the
                    // iteration is not counted twice.
                    let response = loop {
                        let request = ProviderRequest {
                            model: settings.model.clone(),
                            messages: conversation.messages().to_vec(),
                            temperature: settings.temperature,
                            max_tokens: settings.max_tokens,
                            tools: definitions.clone(),
                        };

                        let result = tokio::select! {
                            biased;
                            _ = cancel.cancelled() => Err(ProviderError::Cancelled),
                            result = complete_within(provider.as_ref(), request, settings.request_timeout) => result,
                        };

                        match result {
                            Ok(response) => break Some(response),
                            Err(ProviderError::Cancelled) => {
                                info!(iteration, "Agent loop cancelled");
                                yield LoopEvent::error(ProviderError::Cancelled.to_string(), iteration, false);
                                break 'session;
                            }
                            Err(e) if e.is_rate_limited() => {
                                warn!(
                                    iteration,
                                    backoff_ms = settings.rate_limit_backoff.as_millis() as u64,
                                    error = %e,
                                    "Model call rate limited, retrying"
                                );
                                yield LoopEvent::error(e.to_string(), iteration, true);

                                let cancelled = tokio::select! {
                                    biased;
                                    _ = cancel.cancelled() => true,
                                    _ = tokio::time::sleep(settings.rate_limit_backoff) => false,
                                };
                                if cancelled {
                                    yield LoopEvent::error(ProviderError::Cancelled.to_string(), iteration, false);
                                    break 'session;
                                }
                            }
                            Err(e) => {
                                error!(iteration, error = %e, "Model call failed");
                                yield LoopEvent::error(e.to_string(), iteration, false);
                                break None;
                            }
                        }
                    };

                    let Some(response) = response else {
                        match (settings.on_model_error, queue.is_some()) {
                            (ModelErrorPolicy::EndTurn, true) => break 'turn,
                            _ => break 'session,
                        }
                    };

                    if let Some(text) = response.text() {
                        yield LoopEvent::text(text);
                    }

                    let calls = response.message.tool_calls.clone();
                    conversation.push(response.message);

                    if calls.is_empty() {
                        yield LoopEvent::done(iteration, false);
                        break 'turn;
                    }

                    debug!(tool_count = calls.len(), "Executing tool calls");

                    for call in &calls {
                        yield LoopEvent::tool_call(call);

                        let result = tokio::select! {
                            biased;
                            _ = cancel.cancelled() => None,
                            result = tools.execute(call) => Some(result),
                        };
                        let Some(result) = result else {
                            yield LoopEvent::error(ProviderError::Cancelled.to_string(), iteration, false);
                            break 'session;
                        };

                        yield LoopEvent::tool_result(&result);
                        conversation.push(Message::tool_result(
                            result.call_id.as_str(),
                            result.outcome.to_message_content(),
                        ));
                    }
                }

                let Some(queue) = queue.as_ref() else {
                    break 'session;
                };

                debug!(conversation_id = %conversation.id, "Idle, waiting for input");

                let input = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(ProviderError::Cancelled),
                    input = queue.next() => Ok(input),
                };

                match input {
                    Ok(Some(input)) => {
                        info!(conversation_id = %conversation.id, "Resuming with new input");
                        iteration = 0;
                        conversation.push(Message::user(input));
                    }
                    Ok(None) => {
                        info!(conversation_id = %conversation.id, "Input closed, ending session");
                        break 'session;
                    }
                    Err(e) => {
                        yield LoopEvent::error(e.to_string(), iteration, false);
                        break 'session;
                    }
                }
            }

            debug!(conversation_id = %conversation.id, messages = conversation.len(), "Agent loop finished");
        })
    }
}

/// Call the model, bounded by `timeout` when one is set.
async fn complete_within(
    provider: &dyn ModelProvider,
    request: ProviderRequest,
    timeout: Option<Duration>,
) -> Result<ProviderResponse, ProviderError> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, provider.complete(request))
            .await
            .map_err(|_| {
                ProviderError::Timeout(format!("model call exceeded {}ms", limit.as_millis()))
            })?,
        None => provider.complete(request).await,
    }
}

/// Send a single prompt without tools and return the reply text.
pub async fn simple_call(
    provider: &dyn ModelProvider,
    model: &str,
    prompt: &str,
    system_prompt: Option<&str>,
) -> Result<String, ProviderError> {
    let mut messages = Vec::with_capacity(2);
    if let Some(system_prompt) = system_prompt {
        messages.push(Message::system(system_prompt));
    }
    messages.push(Message::user(prompt));

    let defaults = LoopSettings::default();
    let response = provider
        .complete(ProviderRequest {
            model: model.to_string(),
            messages,
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
            tools: Vec::new(),
        })
        .await?;

    Ok(response.message.content)
}
