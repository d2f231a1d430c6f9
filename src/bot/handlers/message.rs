use chrono::Utc;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::bot::commands::events::{self, RegisterOutcome};
use crate::bot::commands::wizard_steps::{
    advance_event, advance_profile, EventStepOutcome, ProfileStepOutcome, StepConfig,
};
use crate::bot::commands::{admin, locations, Command};
use crate::bot::handlers::{log_failure, send_screen, HandlerResult};
use crate::bot::presentation::{self, Screen, PROMPT_LOCATION_INPUT, PROMPT_PROFILE_NAME};
use crate::bot::wizard::{EventDraft, ProfileDraft, WizardKey, WizardState};
use crate::bot::ClubServices;
use crate::domain::error::{DomainError, DomainResult};
use crate::utils::feedback::{describe_error, CommandFeedback};
use crate::utils::logging::{
    log_admin_denied, log_command_start, log_command_success, log_validation_error, Actor,
};
use crate::utils::validation::parse_location_input;

const LOCATION_FORMAT_HINT: &str = "Send Name|Address|MapURL|Description, or /cancel.";

pub async fn command_handler(
    bot: Bot,
    msg: Message,
    cmd: Command,
    services: ClubServices,
) -> HandlerResult {
    let actor = Actor::new(msg.from(), msg.chat.id);
    let key = WizardKey::new(msg.chat.id.0, actor.user_id);
    let feedback = CommandFeedback::new(bot.clone(), msg.chat.id);
    let name = command_name(&cmd);
    log_command_start(name, &actor, None);

    match cmd {
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
        }
        Command::Start => match services.users.exists(actor.user_id).await {
            Ok(true) => {
                let menu = presentation::main_menu(services.is_admin(actor.user_id));
                send_screen(&bot, msg.chat.id, menu).await?;
            }
            Ok(false) => {
                services
                    .wizards
                    .set(key, WizardState::RegisteringProfile(ProfileDraft::new(None)))
                    .await;
                bot.send_message(msg.chat.id, PROMPT_PROFILE_NAME).await?;
            }
            Err(e) => {
                log_failure(name, &actor, &e);
                feedback.domain_error(&e).await?;
                return Ok(());
            }
        },
        Command::Locations => {
            let result = locations::locations_screen(&services).await;
            return reply(&bot, &msg, &actor, name, result).await;
        }
        Command::Events => {
            let result = events::events_screen(&services).await;
            return reply(&bot, &msg, &actor, name, result).await;
        }
        Command::MyEvents => {
            let result = events::my_events_screen(&services, actor.user_id).await;
            return reply(&bot, &msg, &actor, name, result).await;
        }
        Command::Admin => {
            if !services.is_admin(actor.user_id) {
                log_admin_denied(name, &actor);
                feedback.error("This command is for admins only.").await?;
                return Ok(());
            }
            send_screen(&bot, msg.chat.id, presentation::admin_menu()).await?;
        }
        Command::NewLocation(args) => {
            if !services.is_admin(actor.user_id) {
                log_admin_denied(name, &actor);
                feedback.error("This command is for admins only.").await?;
                return Ok(());
            }
            if args.trim().is_empty() {
                services.wizards.set(key, WizardState::CreatingLocation).await;
                bot.send_message(msg.chat.id, PROMPT_LOCATION_INPUT).await?;
            } else {
                return create_location(&bot, &msg, &actor, key, &services, &args).await;
            }
        }
        Command::Cancel => {
            if services.wizards.remove(key).await.is_some() {
                feedback.success("Cancelled.").await?;
            } else {
                feedback.info("Nothing to cancel.").await?;
            }
        }
    }

    log_command_success(name, &actor, None);
    Ok(())
}

/// Plain text: the next answer of an open wizard, or an unknown command.
pub async fn text_handler(bot: Bot, msg: Message, services: ClubServices) -> HandlerResult {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let actor = Actor::new(msg.from(), msg.chat.id);
    let feedback = CommandFeedback::new(bot.clone(), msg.chat.id);

    if text.starts_with('/') {
        let command = text.split_whitespace().next().unwrap_or(text);
        feedback
            .validation_error(
                &format!("Unknown command: {command}"),
                "Use /help to see all available commands.",
            )
            .await?;
        return Ok(());
    }

    let key = WizardKey::new(msg.chat.id.0, actor.user_id);
    let Some(state) = services.wizards.get(key).await else {
        return Ok(());
    };

    match state {
        WizardState::CreatingLocation => {
            if !ensure_admin(&bot, &msg, &actor, key, &services, "location wizard").await? {
                return Ok(());
            }
            create_location(&bot, &msg, &actor, key, &services, text).await
        }
        WizardState::CreatingEvent(draft) => {
            if !ensure_admin(&bot, &msg, &actor, key, &services, "event wizard").await? {
                return Ok(());
            }
            event_step(&bot, &msg, &actor, key, &services, draft, text).await
        }
        WizardState::RegisteringProfile(draft) => {
            profile_step(&bot, &msg, &actor, key, &services, draft, text).await
        }
    }
}

fn command_name(cmd: &Command) -> &'static str {
    match cmd {
        Command::Start => "/start",
        Command::Help => "/help",
        Command::Locations => "/locations",
        Command::Events => "/events",
        Command::MyEvents => "/myevents",
        Command::Admin => "/admin",
        Command::NewLocation(_) => "/newlocation",
        Command::Cancel => "/cancel",
    }
}

async fn reply(
    bot: &Bot,
    msg: &Message,
    actor: &Actor,
    command: &str,
    result: DomainResult<Screen>,
) -> HandlerResult {
    match result {
        Ok(screen) => {
            send_screen(bot, msg.chat.id, screen).await?;
            log_command_success(command, actor, None);
        }
        Err(e) => {
            log_failure(command, actor, &e);
            CommandFeedback::new(bot.clone(), msg.chat.id)
                .domain_error(&e)
                .await?;
        }
    }
    Ok(())
}

/// Admin rights can be revoked while a wizard is open.
async fn ensure_admin(
    bot: &Bot,
    msg: &Message,
    actor: &Actor,
    key: WizardKey,
    services: &ClubServices,
    action: &str,
) -> Result<bool, teloxide::RequestError> {
    if services.is_admin(actor.user_id) {
        return Ok(true);
    }
    log_admin_denied(action, actor);
    services.wizards.remove(key).await;
    CommandFeedback::new(bot.clone(), msg.chat.id)
        .error("This action is for admins only.")
        .await?;
    Ok(false)
}

async fn create_location(
    bot: &Bot,
    msg: &Message,
    actor: &Actor,
    key: WizardKey,
    services: &ClubServices,
    text: &str,
) -> HandlerResult {
    let feedback = CommandFeedback::new(bot.clone(), msg.chat.id);
    let input = match parse_location_input(text) {
        Ok(input) => input,
        Err(e) => {
            log_validation_error("new location", "location", &e.to_string(), actor);
            services.wizards.set(key, WizardState::CreatingLocation).await;
            feedback
                .validation_error(&e.to_string(), LOCATION_FORMAT_HINT)
                .await?;
            return Ok(());
        }
    };

    match admin::create_location(services, input).await {
        Ok(screen) => {
            services.wizards.remove(key).await;
            send_screen(bot, msg.chat.id, screen).await?;
            log_command_success("new location", actor, None);
        }
        Err(e @ DomainError::Validation(_)) => {
            log_validation_error("new location", "location", &e.to_string(), actor);
            services.wizards.set(key, WizardState::CreatingLocation).await;
            feedback
                .validation_error(&describe_error(&e), LOCATION_FORMAT_HINT)
                .await?;
        }
        Err(e) => {
            log_failure("new location", actor, &e);
            services.wizards.remove(key).await;
            feedback.domain_error(&e).await?;
        }
    }
    Ok(())
}

async fn event_step(
    bot: &Bot,
    msg: &Message,
    actor: &Actor,
    key: WizardKey,
    services: &ClubServices,
    draft: EventDraft,
    text: &str,
) -> HandlerResult {
    let config = StepConfig {
        offset: services.config.offset(),
        collect_payment: services.config.event_payment_details,
    };
    let step = draft.step;

    match advance_event(draft, text, &config, Utc::now()) {
        EventStepOutcome::Next { draft, prompt } => {
            services.wizards.set(key, WizardState::CreatingEvent(draft)).await;
            bot.send_message(msg.chat.id, prompt).await?;
        }
        EventStepOutcome::Retry { draft, error } => {
            log_validation_error("new event", &format!("{step:?}"), &error, actor);
            services.wizards.set(key, WizardState::CreatingEvent(draft)).await;
            bot.send_message(msg.chat.id, format!("❌ {error}")).await?;
        }
        EventStepOutcome::Done(input) => {
            services.wizards.remove(key).await;
            match admin::create_event(services, input).await {
                Ok(screen) => {
                    send_screen(bot, msg.chat.id, screen).await?;
                    log_command_success("new event", actor, None);
                }
                Err(e) => {
                    log_failure("new event", actor, &e);
                    CommandFeedback::new(bot.clone(), msg.chat.id)
                        .domain_error(&e)
                        .await?;
                }
            }
        }
    }
    Ok(())
}

async fn profile_step(
    bot: &Bot,
    msg: &Message,
    actor: &Actor,
    key: WizardKey,
    services: &ClubServices,
    draft: ProfileDraft,
    text: &str,
) -> HandlerResult {
    let feedback = CommandFeedback::new(bot.clone(), msg.chat.id);

    let (name, surname, pending_event) = match advance_profile(draft, text) {
        ProfileStepOutcome::Next { draft, prompt } => {
            services
                .wizards
                .set(key, WizardState::RegisteringProfile(draft))
                .await;
            bot.send_message(msg.chat.id, prompt).await?;
            return Ok(());
        }
        ProfileStepOutcome::Retry { draft, error } => {
            log_validation_error("profile", "name", &error, actor);
            services
                .wizards
                .set(key, WizardState::RegisteringProfile(draft))
                .await;
            bot.send_message(msg.chat.id, error).await?;
            return Ok(());
        }
        ProfileStepOutcome::Done {
            name,
            surname,
            pending_event,
        } => (name, surname, pending_event),
    };

    services.wizards.remove(key).await;
    if let Err(e) = services.users.upsert(actor.user_id, &name, &surname).await {
        log_failure("profile", actor, &e);
        feedback.domain_error(&e).await?;
        return Ok(());
    }
    log_command_success("profile", actor, Some("profile saved"));

    let Some(event_id) = pending_event else {
        feedback.success("Profile saved!").await?;
        let menu = presentation::main_menu(services.is_admin(actor.user_id));
        send_screen(bot, msg.chat.id, menu).await?;
        return Ok(());
    };

    match events::register(services, &event_id, actor.user_id).await {
        Ok(RegisterOutcome::Requested(screen)) => {
            send_screen(bot, msg.chat.id, screen).await?;
            log_command_success("register", actor, Some(event_id.as_str()));
        }
        Ok(RegisterOutcome::NeedsProfile) => {
            feedback.success("Profile saved!").await?;
        }
        Err(e) => {
            log_failure("register", actor, &e);
            feedback.domain_error(&e).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_names_match_parser() {
        let commands = [
            Command::Start,
            Command::Help,
            Command::Locations,
            Command::Events,
            Command::MyEvents,
            Command::Admin,
            Command::NewLocation(String::new()),
            Command::Cancel,
        ];
        for cmd in commands {
            let parsed = Command::parse(command_name(&cmd), "club_bot").unwrap();
            assert_eq!(parsed, cmd);
        }
    }
}
