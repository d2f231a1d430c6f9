pub mod callback;
pub mod message;

use teloxide::{dispatching::UpdateHandler, prelude::*, ApiError, RequestError};

use crate::bot::commands::Command;
use crate::bot::presentation::Screen;
use crate::bot::ClubServices;
use crate::domain::error::DomainError;
use crate::utils::logging::{log_command_error, log_command_warning, Actor};

pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;
pub type HandlerResult = Result<(), HandlerError>;

pub struct BotHandler {
    pub services: ClubServices,
}

impl BotHandler {
    pub fn new(services: ClubServices) -> Self {
        Self { services }
    }

    pub fn schema(&self) -> UpdateHandler<HandlerError> {
        use teloxide::dispatching::UpdateFilterExt;

        let commands = self.services.clone();
        let text = self.services.clone();
        let callbacks = self.services.clone();

        dptree::entry()
            .branch(
                Update::filter_message()
                    .filter_command::<Command>()
                    .endpoint(move |bot, msg, cmd| {
                        let services = commands.clone();
                        async move { message::command_handler(bot, msg, cmd, services).await }
                    }),
            )
            .branch(Update::filter_message().endpoint(move |bot, msg| {
                let services = text.clone();
                async move { message::text_handler(bot, msg, services).await }
            }))
            .branch(Update::filter_callback_query().endpoint(move |bot, q| {
                let services = callbacks.clone();
                async move { callback::callback_handler(bot, q, services).await }
            }))
    }
}

pub async fn send_screen(bot: &Bot, chat_id: ChatId, screen: Screen) -> ResponseResult<()> {
    bot.send_message(chat_id, screen.text)
        .reply_markup(screen.keyboard)
        .await?;
    Ok(())
}

/// Replaces the message in place; falls back to a new message when the
/// original can no longer be edited.
pub async fn edit_screen(bot: &Bot, message: &Message, screen: Screen) -> ResponseResult<()> {
    let edited = bot
        .edit_message_text(message.chat.id, message.id, screen.text.clone())
        .reply_markup(screen.keyboard.clone())
        .await;

    match edited {
        Ok(_) | Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
        Err(e) => {
            tracing::debug!("Editing message {} failed ({}), sending a new one", message.id.0, e);
            send_screen(bot, message.chat.id, screen).await
        }
    }
}

/// Storage failures are errors; refused operations and bad input only warn.
pub(crate) fn log_failure(command: &str, actor: &Actor, err: &DomainError) {
    if err.is_infrastructure() {
        log_command_error(command, actor, &err.to_string());
    } else {
        log_command_warning(command, actor, err.kind());
    }
}
