use teloxide::prelude::*;

use crate::bot::callback_data::CallbackAction;
use crate::bot::commands::admin::{self, Decision};
use crate::bot::commands::events::{self, RegisterOutcome};
use crate::bot::commands::locations;
use crate::bot::handlers::{edit_screen, log_failure, send_screen, HandlerResult};
use crate::bot::presentation::{self, Screen, PROMPT_LOCATION_INPUT, PROMPT_PROFILE_NAME};
use crate::bot::wizard::{ProfileDraft, WizardKey, WizardState};
use crate::bot::ClubServices;
use crate::domain::error::DomainResult;
use crate::utils::feedback::describe_error;
use crate::utils::logging::{log_admin_denied, log_command_start, log_command_success, Actor};

/// What a button press produced.
enum Outcome {
    /// Replace the pressed message.
    Show(Screen),
    /// Ask for text input in a new message.
    Prompt(&'static str),
    Decided(Decision),
}

pub async fn callback_handler(bot: Bot, q: CallbackQuery, services: ClubServices) -> HandlerResult {
    let chat_id = q
        .message
        .as_ref()
        .map_or(ChatId(q.from.id.0 as i64), |m| m.chat.id);
    let actor = Actor::new(Some(&q.from), chat_id);

    let Some(data) = q.data.clone() else {
        bot.answer_callback_query(q.id).text("Invalid button").await?;
        return Ok(());
    };
    log_command_start("callback", &actor, Some(&data));

    let action: CallbackAction = match data.parse() {
        Ok(action) => action,
        Err(e) => {
            tracing::warn!("Unparseable callback '{}' from {}: {}", data, actor, e);
            bot.answer_callback_query(q.id)
                .text("This button is no longer valid")
                .await?;
            return Ok(());
        }
    };

    if action.is_admin() && !services.is_admin(actor.user_id) {
        log_admin_denied(&data, &actor);
        bot.answer_callback_query(q.id)
            .text("⛔ Admins only")
            .show_alert(true)
            .await?;
        return Ok(());
    }

    let key = WizardKey::new(chat_id.0, actor.user_id);
    match dispatch(&services, &action, key, actor.user_id).await {
        Ok(Outcome::Show(screen)) => {
            bot.answer_callback_query(q.id).await?;
            show(&bot, q.message.as_ref(), chat_id, screen).await?;
        }
        Ok(Outcome::Prompt(prompt)) => {
            bot.answer_callback_query(q.id).await?;
            bot.send_message(chat_id, prompt).await?;
        }
        Ok(Outcome::Decided(decision)) => {
            bot.answer_callback_query(q.id).text("Done").await?;
            show(&bot, q.message.as_ref(), chat_id, decision.screen).await?;
            notify_member(&bot, decision.notice).await;
        }
        Err(e) => {
            log_failure(&data, &actor, &e);
            bot.answer_callback_query(q.id)
                .text(describe_error(&e))
                .show_alert(!e.is_warning())
                .await?;
            return Ok(());
        }
    }

    log_command_success("callback", &actor, Some(&data));
    Ok(())
}

async fn dispatch(
    services: &ClubServices,
    action: &CallbackAction,
    key: WizardKey,
    user_id: i64,
) -> DomainResult<Outcome> {
    use CallbackAction as A;

    let screen = match action {
        A::Menu => presentation::main_menu(services.is_admin(user_id)),
        A::Locations => locations::locations_screen(services).await?,
        A::Location(id) => locations::location_screen(services, id).await?,
        A::LocationEvents(id) => locations::location_events_screen(services, id).await?,
        A::Events => events::events_screen(services).await?,
        A::MyEvents => events::my_events_screen(services, user_id).await?,
        A::Event(id) => events::event_screen(services, id, user_id).await?,
        A::Register(id) => match events::register(services, id, user_id).await? {
            RegisterOutcome::Requested(screen) => screen,
            RegisterOutcome::NeedsProfile => {
                let draft = ProfileDraft::new(Some(id.clone()));
                services
                    .wizards
                    .set(key, WizardState::RegisteringProfile(draft))
                    .await;
                return Ok(Outcome::Prompt(PROMPT_PROFILE_NAME));
            }
        },
        A::Unregister(id) => events::unregister(services, id, user_id).await?,
        A::Participants(id) => events::participants_screen(services, id).await?,

        A::Admin => presentation::admin_menu(),
        A::AdminNewLocation => {
            services.wizards.set(key, WizardState::CreatingLocation).await;
            return Ok(Outcome::Prompt(PROMPT_LOCATION_INPUT));
        }
        A::AdminLocations => admin::admin_locations_screen(services).await?,
        A::AdminDeleteLocations => admin::delete_locations_screen(services).await?,
        A::AdminDeleteLocation(id) => admin::delete_location(services, id).await?,
        A::AdminEvents => presentation::admin_events_menu(),
        A::AdminEventsByType(event_type) => admin::events_screen(services, Some(*event_type)).await?,
        A::AdminAllEvents => admin::events_screen(services, None).await?,
        A::AdminModeration => admin::moderation_screen(services).await?,
        A::AdminEvent(id) => admin::event_screen(services, id).await?,
        A::AdminDeleteEvent(id) => admin::delete_event(services, id).await?,
        A::AdminEventModeration(id) => admin::event_moderation_screen(services, id).await?,
        A::AdminNewEvent => admin::new_event_locations_screen(services).await?,
        A::AdminNewEventLocation(id) => admin::new_event_types_screen(services, id).await?,
        A::AdminNewEventType(location_id, event_type) => {
            let prompt =
                admin::start_event_wizard(services, key, location_id, *event_type).await?;
            return Ok(Outcome::Prompt(prompt));
        }
        A::AdminRegistration(event_id, member) => {
            admin::registration_screen(services, event_id, *member).await?
        }
        A::AdminApprove(event_id, member) => {
            return Ok(Outcome::Decided(
                admin::decide(services, event_id, *member, true).await?,
            ));
        }
        A::AdminReject(event_id, member) => {
            return Ok(Outcome::Decided(
                admin::decide(services, event_id, *member, false).await?,
            ));
        }
    };

    Ok(Outcome::Show(screen))
}

async fn show(
    bot: &Bot,
    message: Option<&Message>,
    chat_id: ChatId,
    screen: Screen,
) -> HandlerResult {
    match message {
        Some(message) => edit_screen(bot, message, screen).await?,
        None => send_screen(bot, chat_id, screen).await?,
    }
    Ok(())
}

/// The decision is already stored; a member who blocked the bot only
/// costs a log line.
async fn notify_member(bot: &Bot, (user_id, text): (i64, String)) {
    if let Err(e) = bot.send_message(ChatId(user_id), text).await {
        tracing::warn!("Could not notify user {} about moderation decision: {}", user_id, e);
    }
}
