use anyhow::{Context, Result};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::{Config, ResponderConfig};
use crate::error::ApiError;
use crate::filter::filter_usernames;
use crate::hooks::{Gate, Hooks};
use crate::llm::{ChatMessage, CompletionBackend};
use crate::platform::{ChatChannel, Message};

/// Returned by [`ChatResponder::generate_reply`] when no reply could be produced.
pub const ERROR_SENTINEL: &str = "Error generating response.";

/// Used when the completion endpoint answers with an unexpected shape.
pub const FALLBACK_REPLY: &str = "I don't know.";

const USERNAME_DIRECTIVE: &str = "\nIMPORTANT: Never mention or repeat usernames in your \
     responses. Respond as if in a natural conversation without referring to specific usernames.";

const PREVIEW_CHARS: usize = 50;

/// In-memory progress of the loop. Lost on restart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoopState {
    pub last_message_id: Option<String>,
}

/// What a single iteration ended up doing.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Nothing fetched.
    Idle,
    /// Newest message was already handled.
    Unchanged,
    /// New message, deliberately not answered.
    Skipped(&'static str),
    GenerationFailed,
    Sent,
    SendFailed,
}

/// Pure author filter: never answer ourselves or an ignored author.
pub fn decide_respond(author_id: &str, self_id: &str, ignored_ids: &[String]) -> bool {
    author_id != self_id && !ignored_ids.iter().any(|id| id == author_id)
}

fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}

/// The polling / reply control loop for one channel.
pub struct ChatResponder<C, L> {
    channel: C,
    llm: L,
    self_id: String,
    ignored_ids: Vec<String>,
    persona: String,
    timing: ResponderConfig,
    hooks: Hooks,
    state: LoopState,
}

impl<C: ChatChannel, L: CompletionBackend> ChatResponder<C, L> {
    pub fn new(channel: C, llm: L, config: &Config) -> Self {
        Self {
            channel,
            llm,
            self_id: config.discord.bot_user_id.clone(),
            ignored_ids: config.discord.ignore_user_ids.clone(),
            persona: config.llm.system_prompt.clone(),
            timing: config.responder.clone(),
            hooks: Hooks::from_config(&config.extensions),
            state: LoopState::default(),
        }
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    /// Logs a status-level failure, sleeping out a rate limit.
    async fn absorb_http_failure(&self, err: ApiError, action: &str) {
        match err {
            ApiError::Unauthorized => {
                error!("Unauthorized (401) while trying to {} - check your Discord token", action);
            }
            ApiError::RateLimited { retry_after } => {
                let wait = retry_after.unwrap_or_else(|| self.timing.retry_backoff());
                warn!("Rate limited while trying to {}! Waiting {:?}...", action, wait);
                sleep(wait).await;
            }
            other => {
                error!("Failed to {}: {}", action, other);
            }
        }
    }

    /// Latest `limit` messages, newest first. Empty on any status-level failure;
    /// transport and decode failures are returned as errors.
    pub async fn fetch_recent(&self, limit: u32) -> Result<Vec<Message>> {
        match self.channel.fetch_recent(limit).await {
            Ok(messages) => Ok(messages),
            Err(err) if err.is_http_failure() => {
                self.absorb_http_failure(err, "fetch messages").await;
                Ok(Vec::new())
            }
            Err(err) => Err(err).context("Failed to fetch messages"),
        }
    }

    fn build_prompt(&self, newest: &Message) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(format!("{}{}", self.persona, USERNAME_DIRECTIVE)),
            ChatMessage::user(format!(
                "Recent message: {}\n\nRespond naturally without mentioning any usernames.",
                newest.content
            )),
        ]
    }

    /// Asks the completion endpoint for a reply to the newest message of the batch.
    /// Never fails: returns [`ERROR_SENTINEL`] or [`FALLBACK_REPLY`] instead.
    pub async fn generate_reply(&self, messages: &[Message]) -> String {
        let Some(newest) = messages.first() else {
            return ERROR_SENTINEL.to_string();
        };

        let prompt = self.build_prompt(newest);
        match self.llm.complete(&prompt).await {
            Ok(Some(text)) => text,
            Ok(None) => {
                warn!("Completion response had no usable choice, using fallback");
                FALLBACK_REPLY.to_string()
            }
            Err(ApiError::RateLimited { retry_after }) => {
                let wait = retry_after.unwrap_or_else(|| self.timing.retry_backoff());
                warn!("Completion endpoint rate limited! Waiting {:?}...", wait);
                sleep(wait).await;
                ERROR_SENTINEL.to_string()
            }
            Err(err) => {
                error!("Error generating response: {}", err);
                ERROR_SENTINEL.to_string()
            }
        }
    }

    /// Posts `content`, then holds the loop for the post-send cooldown.
    /// `Ok(false)` on a status-level failure; the reply is not retried.
    pub async fn send(&self, content: &str, reply_to: Option<&str>) -> Result<bool> {
        match self.channel.send(content, reply_to).await {
            Ok(()) => {
                info!("Message sent successfully");
                sleep(self.timing.message_cooldown()).await;
                Ok(true)
            }
            Err(err) if err.is_http_failure() => {
                self.absorb_http_failure(err, "send message").await;
                Ok(false)
            }
            Err(err) => Err(err).context("Failed to send message"),
        }
    }

    /// One poll / decide / generate / send pass.
    pub async fn run_iteration(&mut self) -> Result<Outcome> {
        let messages = self.fetch_recent(self.timing.max_messages).await?;
        let Some(newest) = messages.first() else {
            return Ok(Outcome::Idle);
        };

        if self.state.last_message_id.as_deref() == Some(newest.id.as_str()) {
            return Ok(Outcome::Unchanged);
        }
        self.state.last_message_id = Some(newest.id.clone());

        if self.hooks.already_seen(&newest.id) {
            return Ok(Outcome::Skipped("already processed"));
        }

        if !decide_respond(&newest.author.id, &self.self_id, &self.ignored_ids) {
            return Ok(Outcome::Skipped("own or ignored author"));
        }

        let now = chrono::Local::now().naive_local();
        let gate = self.hooks.gate(newest, now, &mut rand::thread_rng());
        let delay = match gate {
            Gate::Respond { delay } => delay,
            Gate::Skip(reason) => {
                debug!("Not answering message {}: {}", newest.id, reason);
                return Ok(Outcome::Skipped(reason));
            }
        };

        info!("New message: {}...", preview(&newest.content));

        if let Some(delay) = delay {
            debug!("Waiting {:?} before answering", delay);
            sleep(delay).await;
        }

        let reply = self.generate_reply(&messages).await;
        if reply == ERROR_SENTINEL {
            return Ok(Outcome::GenerationFailed);
        }

        let reply = self.hooks.redact(&filter_usernames(&reply, &messages));
        if reply.is_empty() {
            return Ok(Outcome::Skipped("empty reply after filtering"));
        }

        info!("Responding with: {}...", preview(&reply));

        let typing = self
            .hooks
            .typing_delay(reply.chars().count(), &mut rand::thread_rng());
        if let Some(typing) = typing {
            sleep(typing).await;
        }

        if self.send(&reply, Some(newest.id.as_str())).await? {
            Ok(Outcome::Sent)
        } else {
            Ok(Outcome::SendFailed)
        }
    }

    /// Runs forever. Errors from an iteration are logged and followed by a short
    /// backoff, or a longer pause once `max_consecutive_failures` is reached.
    pub async fn run(&mut self) {
        info!("shadowchat is now listening...");

        let mut failures: u32 = 0;
        loop {
            match self.run_iteration().await {
                Ok(outcome) => {
                    failures = 0;
                    debug!(
                        "Iteration finished: {:?} (last message {:?})",
                        outcome,
                        self.state().last_message_id
                    );
                    sleep(self.timing.poll_interval()).await;
                }
                Err(e) => {
                    failures += 1;
                    error!("Unexpected error: {:#}", e);
                    sleep(self.failure_backoff(&mut failures)).await;
                }
            }
        }
    }

    fn failure_backoff(&self, failures: &mut u32) -> Duration {
        let max = self.timing.max_consecutive_failures;
        if max > 0 && *failures >= max {
            warn!(
                "{} consecutive failures, pausing for {:?}",
                failures,
                self.timing.failure_pause()
            );
            *failures = 0;
            self.timing.failure_pause()
        } else {
            self.timing.error_backoff()
        }
    }
}
