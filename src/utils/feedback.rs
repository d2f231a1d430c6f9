use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::domain::error::{DomainError, ValidationError};
use crate::utils::markdown::escape_markdown;

/// Feedback types for different command outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackType {
    Success,
    Warning,
    Error,
    Info,
}

impl FeedbackType {
    fn emoji(self) -> &'static str {
        match self {
            FeedbackType::Success => "✅",
            FeedbackType::Warning => "⚠️",
            FeedbackType::Error => "❌",
            FeedbackType::Info => "ℹ️",
        }
    }

    /// Warnings for refused transitions, errors for everything else.
    pub fn for_error(err: &DomainError) -> Self {
        if err.is_warning() {
            FeedbackType::Warning
        } else {
            FeedbackType::Error
        }
    }
}

/// Text shown to a member for a failed operation. Storage details never
/// reach the chat.
pub fn describe_error(err: &DomainError) -> String {
    match err {
        DomainError::Validation(v) => describe_validation(v),
        DomainError::LocationNotFound => "Location not found.".to_string(),
        DomainError::EventNotFound => "Event not found. It may have been deleted.".to_string(),
        DomainError::UserNotFound => "Profile not found. Send /start to register.".to_string(),
        DomainError::RegistrationNotFound => "Registration not found.".to_string(),
        DomainError::EventFull => "No seats left for this event.".to_string(),
        DomainError::AlreadyRegistered => "You have already applied for this event.".to_string(),
        DomainError::AlreadyApproved => "This registration is already approved.".to_string(),
        DomainError::AlreadyRejected => "This registration is already rejected.".to_string(),
        DomainError::InvalidTransition { from, to } => {
            format!("A {from} registration cannot be {to}.")
        }
        DomainError::Storage(_) => "Something went wrong. Please try again later.".to_string(),
    }
}

fn describe_validation(err: &ValidationError) -> String {
    let mut text = err.to_string();
    if let Some(first) = text.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    text.push('.');
    text
}

/// Centralized feedback system for bot commands
pub struct CommandFeedback {
    bot: Bot,
    chat_id: ChatId,
}

impl CommandFeedback {
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self { bot, chat_id }
    }

    /// Send immediate feedback message
    pub async fn send(&self, feedback_type: FeedbackType, message: &str) -> ResponseResult<Message> {
        let formatted_message = format!("{} {}", feedback_type.emoji(), escape_markdown(message));

        self.bot
            .send_message(self.chat_id, formatted_message)
            .parse_mode(ParseMode::MarkdownV2)
            .await
    }

    /// Send success feedback
    pub async fn success(&self, message: &str) -> ResponseResult<Message> {
        self.send(FeedbackType::Success, message).await
    }

    /// Send error feedback
    pub async fn error(&self, message: &str) -> ResponseResult<Message> {
        self.send(FeedbackType::Error, message).await
    }

    /// Send info feedback
    pub async fn info(&self, message: &str) -> ResponseResult<Message> {
        self.send(FeedbackType::Info, message).await
    }

    /// Report a domain failure with the matching severity.
    pub async fn domain_error(&self, err: &DomainError) -> ResponseResult<Message> {
        self.send(FeedbackType::for_error(err), &describe_error(err)).await
    }

    /// Send validation error with helpful suggestion
    pub async fn validation_error(&self, error: &str, suggestion: &str) -> ResponseResult<Message> {
        let message = format!("{error}\n\n💡 Suggestion: {suggestion}");
        self.send(FeedbackType::Error, &message).await
    }
}
