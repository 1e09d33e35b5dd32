//! Inbound message handling
//!
//! Turns user text into replies and scratch map generations. Commands start
//! with `/`; anything else is read as a comma-separated country list.
//! Parsing and validation run concurrently for any number of requests; only
//! the generation itself waits on the request gate.

mod messages;
mod selection;

pub use messages::{MessageTemplates, MessagesError};
pub use selection::{is_country_list, parse_selection, ParsedSelection, LIST_SEPARATOR};

#[cfg(test)]
pub(crate) use messages::tests::sample_messages;

use std::fmt;
use std::future::Future;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::backend::RenderBackend;
use crate::country::CountryRegistry;
use crate::fetch::TileSource;
use crate::generator::ScratchMapGenerator;

/// A reply could not be delivered.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Failed to deliver message to {recipient}: {reason}")]
pub struct EndpointError {
    pub recipient: String,
    pub reason: String,
}

/// Transport that delivers replies to users.
pub trait MessagingEndpoint: Send + Sync {
    fn send_text(
        &self,
        recipient: &str,
        message: &str,
    ) -> impl Future<Output = Result<(), EndpointError>> + Send;

    fn send_image(
        &self,
        recipient: &str,
        path: &Path,
        caption: &str,
    ) -> impl Future<Output = Result<(), EndpointError>> + Send;
}

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
}

/// What the process does after a failed generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Report the failure and keep serving.
    #[default]
    Continue,
    /// Stop the process after any failed generation.
    Exit,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "continue" => Ok(Self::Continue),
            "exit" => Ok(Self::Exit),
            other => Err(format!("expected 'continue' or 'exit', got '{}'", other)),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continue => write!(f, "continue"),
            Self::Exit => write!(f, "exit"),
        }
    }
}

/// Whether the service should keep running after a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    Continue,
    Shutdown,
}

/// Handles user messages end to end.
pub struct RequestHandler<B: RenderBackend, S: TileSource, M: MessagingEndpoint> {
    generator: Arc<ScratchMapGenerator<B, S>>,
    endpoint: M,
    messages: Arc<MessageTemplates>,
    policy: FailurePolicy,
}

impl<B, S, M> RequestHandler<B, S, M>
where
    B: RenderBackend,
    S: TileSource,
    M: MessagingEndpoint,
{
    pub fn new(
        generator: Arc<ScratchMapGenerator<B, S>>,
        endpoint: M,
        messages: Arc<MessageTemplates>,
        policy: FailurePolicy,
    ) -> Self {
        Self {
            generator,
            endpoint,
            messages,
            policy,
        }
    }

    pub fn endpoint(&self) -> &M {
        &self.endpoint
    }

    fn registry(&self) -> &CountryRegistry {
        self.generator.registry()
    }

    /// Handles one message from `recipient`.
    pub async fn handle_message(
        &self,
        recipient: &str,
        text: &str,
    ) -> Result<HandlerOutcome, HandlerError> {
        info!(recipient, text, "Message received");

        if text.starts_with('/') {
            self.handle_command(recipient, text).await?;
            return Ok(HandlerOutcome::Continue);
        }
        self.select_countries(recipient, text).await
    }

    async fn handle_command(&self, recipient: &str, command: &str) -> Result<(), HandlerError> {
        let reply = match command {
            "/start" => &self.messages.welcome_message,
            "/info" => &self.messages.info_message,
            _ => &self.messages.unknown_command_message,
        };
        self.endpoint.send_text(recipient, reply).await?;
        Ok(())
    }

    async fn select_countries(
        &self,
        recipient: &str,
        text: &str,
    ) -> Result<HandlerOutcome, HandlerError> {
        let text = text.trim();
        if !is_country_list(text) {
            self.endpoint
                .send_text(recipient, &self.messages.invalid_input_message)
                .await?;
            return Ok(HandlerOutcome::Continue);
        }

        let parsed = parse_selection(self.registry(), text);
        if parsed.selection.is_empty() {
            self.endpoint
                .send_text(recipient, &self.messages.no_valid_inputs_message)
                .await?;
            return Ok(HandlerOutcome::Continue);
        }

        let reply = self.selection_reply(&parsed);
        self.endpoint.send_text(recipient, &reply).await?;
        self.endpoint
            .send_text(recipient, &self.messages.scratchmap_generation_message)
            .await?;

        let image = match self.generator.generate(&parsed.selection).await {
            Ok(image) => image,
            Err(e) => {
                error!(recipient, error = %e, "Scratch map generation failed");
                if let Some(message) = &self.messages.scratchmap_failed_message {
                    if let Err(send_err) = self.endpoint.send_text(recipient, message).await {
                        warn!(error = %send_err, "Failed to report generation failure");
                    }
                }
                if e.requires_shutdown() || self.policy == FailurePolicy::Exit {
                    return Ok(HandlerOutcome::Shutdown);
                }
                return Ok(HandlerOutcome::Continue);
            }
        };

        let sent = self
            .endpoint
            .send_image(recipient, image.path(), &self.messages.scratchmap_created_message)
            .await;
        if let Err(e) = image.discard().await {
            warn!(error = %e, "Failed to delete scratch map");
        }
        sent?;
        Ok(HandlerOutcome::Continue)
    }

    /// Header, one line per recognised country, then unrecognised inputs.
    fn selection_reply(&self, parsed: &ParsedSelection) -> String {
        let mut reply = self.messages.selected_countries_list_header.clone();
        for id in parsed.selection.iter() {
            let country = self.registry().get(id);
            reply.push_str(&format!("\n{}{}", country.emoji, country.name));
        }
        if !parsed.unrecognized.is_empty() {
            reply.push_str(&self.messages.unrecognized_inputs_list_header);
            for input in &parsed.unrecognized {
                reply.push_str(&format!("\n\\- {}", input));
            }
        }
        reply
    }
}
