//! Text-step transitions of the event and profile wizards.
//!
//! Pure functions: each takes the current draft and one line of input and
//! says what to store and what to ask next. Handlers do the I/O.

use chrono::{DateTime, FixedOffset, Utc};

use crate::bot::presentation::{
    PROMPT_EVENT_DATE, PROMPT_EVENT_NAME, PROMPT_MAX_PLAYERS, PROMPT_PAYMENT_PHONE, PROMPT_PRICE,
    PROMPT_PROFILE_NAME, PROMPT_PROFILE_SURNAME, PROMPT_TRAINER,
};
use crate::bot::wizard::{EventDraft, EventStep, ProfileDraft, ProfileStep};
use crate::domain::event::{CreateEventInput, EventId};
use crate::utils::datetime::parse_event_datetime;
use crate::utils::validation::{parse_capacity, parse_price, validate_name, validate_phone};

/// Trainer input that leaves the field empty.
pub const SKIP_INPUT: &str = "-";

#[derive(Debug, Clone, Copy)]
pub struct StepConfig {
    pub offset: FixedOffset,
    /// Ask for payment phone and price after the trainer.
    pub collect_payment: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventStepOutcome {
    Next { draft: EventDraft, prompt: &'static str },
    /// Input rejected; the draft is unchanged and the step repeats.
    Retry { draft: EventDraft, error: String },
    Done(CreateEventInput),
}

pub fn prompt_for(step: EventStep) -> &'static str {
    match step {
        EventStep::MaxPlayers => PROMPT_MAX_PLAYERS,
        EventStep::Name => PROMPT_EVENT_NAME,
        EventStep::Date => PROMPT_EVENT_DATE,
        EventStep::Trainer => PROMPT_TRAINER,
        EventStep::PaymentPhone => PROMPT_PAYMENT_PHONE,
        EventStep::Price => PROMPT_PRICE,
    }
}

fn next(mut draft: EventDraft, step: EventStep) -> EventStepOutcome {
    draft.step = step;
    EventStepOutcome::Next {
        draft,
        prompt: prompt_for(step),
    }
}

fn retry(draft: EventDraft, error: impl ToString) -> EventStepOutcome {
    let error = format!("{}\n\n{}", error.to_string(), prompt_for(draft.step));
    EventStepOutcome::Retry { draft, error }
}

pub fn advance_event(
    mut draft: EventDraft,
    input: &str,
    config: &StepConfig,
    now: DateTime<Utc>,
) -> EventStepOutcome {
    let input = input.trim();
    match draft.step {
        EventStep::MaxPlayers => match parse_capacity(input) {
            Ok(capacity) => {
                draft.max_players = Some(capacity);
                next(draft, EventStep::Name)
            }
            Err(e) => retry(draft, e),
        },
        EventStep::Name => match validate_name("Event name", input) {
            Ok(name) => {
                draft.name = Some(name);
                next(draft, EventStep::Date)
            }
            Err(e) => retry(draft, e),
        },
        EventStep::Date => match parse_event_datetime(input, config.offset, now) {
            Ok(date) => {
                draft.date = Some(date);
                next(draft, EventStep::Trainer)
            }
            Err(e) => retry(draft, e),
        },
        EventStep::Trainer => {
            if input != SKIP_INPUT {
                match validate_name("Trainer name", input) {
                    Ok(trainer) => draft.trainer = Some(trainer),
                    Err(e) => return retry(draft, e),
                }
            }
            if config.collect_payment {
                next(draft, EventStep::PaymentPhone)
            } else {
                finish(draft, None)
            }
        }
        EventStep::PaymentPhone => match validate_phone(input) {
            Ok(phone) => {
                draft.payment_phone = Some(phone);
                next(draft, EventStep::Price)
            }
            Err(e) => retry(draft, e),
        },
        EventStep::Price => match parse_price(input) {
            Ok(price) => finish(draft, Some(price)),
            Err(e) => retry(draft, e),
        },
    }
}

fn finish(draft: EventDraft, price: Option<i64>) -> EventStepOutcome {
    let Some(max_players) = draft.max_players else {
        return next(draft, EventStep::MaxPlayers);
    };
    let Some(name) = draft.name.clone() else {
        return next(draft, EventStep::Name);
    };
    let Some(date) = draft.date else {
        return next(draft, EventStep::Date);
    };

    EventStepOutcome::Done(CreateEventInput {
        name,
        event_type: draft.event_type,
        date,
        max_players,
        location_id: draft.location_id,
        trainer: draft.trainer,
        description: None,
        payment_phone: draft.payment_phone,
        price,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileStepOutcome {
    Next { draft: ProfileDraft, prompt: &'static str },
    Retry { draft: ProfileDraft, error: String },
    Done {
        name: String,
        surname: String,
        pending_event: Option<EventId>,
    },
}

pub fn profile_prompt(step: ProfileStep) -> &'static str {
    match step {
        ProfileStep::Name => PROMPT_PROFILE_NAME,
        ProfileStep::Surname => PROMPT_PROFILE_SURNAME,
    }
}

pub fn advance_profile(mut draft: ProfileDraft, input: &str) -> ProfileStepOutcome {
    let field = match draft.step {
        ProfileStep::Name => "Name",
        ProfileStep::Surname => "Surname",
    };
    let value = match validate_name(field, input) {
        Ok(value) => value,
        Err(e) => {
            return ProfileStepOutcome::Retry {
                draft,
                error: format!("❌ {e}. Please try again:"),
            }
        }
    };

    match (draft.step, draft.name.take()) {
        (ProfileStep::Surname, Some(name)) => ProfileStepOutcome::Done {
            name,
            surname: value,
            pending_event: draft.pending_event,
        },
        _ => {
            draft.name = Some(value);
            draft.step = ProfileStep::Surname;
            ProfileStepOutcome::Next {
                draft,
                prompt: profile_prompt(ProfileStep::Surname),
            }
        }
    }
}
