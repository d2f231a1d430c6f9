//! Renders domain data into message text plus inline keyboard.
//!
//! Everything here is pure and sent without a parse mode, so user-supplied
//! names need no escaping.

use chrono::FixedOffset;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::bot::callback_data::CallbackAction;
use crate::domain::event::{Event, EventType, RegistrationStatus};
use crate::domain::location::{Location, LocationId};
use crate::domain::moderation::RegistrationWithUser;
use crate::domain::user::TelegramId;
use crate::utils::datetime::format_event_datetime;

pub const PROMPT_LOCATION_INPUT: &str =
    "📍 Send the new location as:\nName|Address|MapURL|Description\n\nOnly the name is required. Send /cancel to abort.";
pub const PROMPT_PROFILE_NAME: &str =
    "👋 Before registering we need your name.\n\nPlease enter your first name:";
pub const PROMPT_PROFILE_SURNAME: &str = "✅ Name saved.\n\nNow enter your surname:";
pub const PROMPT_MAX_PLAYERS: &str = "👥 How many players can take part? Enter a positive number:";
pub const PROMPT_EVENT_NAME: &str = "📝 Enter the event name:";
pub const PROMPT_EVENT_DATE: &str =
    "📅 Enter the date and time as DD.MM.YYYY HH:MM\n\nExample: 15.01.2026 18:00\nA date without time defaults to 18:00.";
pub const PROMPT_TRAINER: &str = "🏋 Enter the trainer's name, or - to skip:";
pub const PROMPT_PAYMENT_PHONE: &str = "📞 Enter the phone number for payment:";
pub const PROMPT_PRICE: &str = "💰 Enter the price in whole units (0 for free):";

/// A rendered message: text plus its inline keyboard.
#[derive(Debug, Clone)]
pub struct Screen {
    pub text: String,
    pub keyboard: InlineKeyboardMarkup,
}

impl Screen {
    fn new(text: String, rows: Vec<Vec<InlineKeyboardButton>>) -> Self {
        Self {
            text,
            keyboard: InlineKeyboardMarkup::new(rows),
        }
    }

    /// Callback payloads of every button, in row order. Used by tests.
    pub fn callback_payloads(&self) -> Vec<String> {
        use teloxide::types::InlineKeyboardButtonKind;

        self.keyboard
            .inline_keyboard
            .iter()
            .flatten()
            .filter_map(|b| match &b.kind {
                InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
                _ => None,
            })
            .collect()
    }
}

fn button(label: impl Into<String>, action: CallbackAction) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(label, action.encode())
}

fn back_row(action: CallbackAction) -> Vec<InlineKeyboardButton> {
    vec![button("⬅️ Back", action)]
}

pub fn event_type_label(event_type: EventType) -> &'static str {
    match event_type {
        EventType::Training => "🏋 Training",
        EventType::Competition => "🏆 Competition",
    }
}

pub fn status_label(status: RegistrationStatus) -> &'static str {
    match status {
        RegistrationStatus::Pending => "⏳ pending approval",
        RegistrationStatus::Approved => "✅ approved",
        RegistrationStatus::Rejected => "❌ rejected",
    }
}

fn seats_line(event: &Event) -> String {
    if event.is_full() {
        format!("👥 Seats: full ({} of {})", event.max_players, event.max_players)
    } else {
        format!("👥 Seats left: {} of {}", event.remaining, event.max_players)
    }
}

fn event_button_label(event: &Event, offset: FixedOffset) -> String {
    format!(
        "{} · {}",
        format_event_datetime(&event.date, offset),
        event.name
    )
}

pub fn main_menu(is_admin: bool) -> Screen {
    let mut rows = vec![
        vec![button("📍 Locations", CallbackAction::Locations)],
        vec![button("📅 Events", CallbackAction::Events)],
        vec![button("🎟 My registrations", CallbackAction::MyEvents)],
    ];
    if is_admin {
        rows.push(vec![button("🛠 Admin panel", CallbackAction::Admin)]);
    }
    Screen::new("🏟 Welcome to the club!\n\nChoose a section:".to_string(), rows)
}

pub fn locations(locations: &[Location]) -> Screen {
    if locations.is_empty() {
        return Screen::new(
            "📍 No locations yet.".to_string(),
            vec![back_row(CallbackAction::Menu)],
        );
    }

    let mut rows: Vec<Vec<InlineKeyboardButton>> = locations
        .iter()
        .map(|l| vec![button(format!("📍 {}", l.name), CallbackAction::Location(l.id.clone()))])
        .collect();
    rows.push(back_row(CallbackAction::Menu));
    Screen::new("📍 Choose a location:".to_string(), rows)
}

pub fn location(location: &Location) -> Screen {
    let mut text = format!("📍 {}\n", location.name);
    if let Some(address) = &location.address {
        text.push_str(&format!("\n🏠 {address}"));
    }
    if let Some(description) = &location.description {
        text.push_str(&format!("\n\n{description}"));
    }

    let mut rows = vec![vec![button(
        "📅 Events here",
        CallbackAction::LocationEvents(location.id.clone()),
    )]];
    if let Some(url) = location.map_url.as_deref().and_then(|u| url::Url::parse(u).ok()) {
        rows.push(vec![InlineKeyboardButton::url("🗺 Open map", url)]);
    }
    rows.push(back_row(CallbackAction::Locations));
    Screen::new(text, rows)
}

/// Event list for members. `back` is where the back button leads.
pub fn events(title: &str, events: &[Event], back: CallbackAction, offset: FixedOffset) -> Screen {
    if events.is_empty() {
        return Screen::new(format!("{title}\n\nNo upcoming events."), vec![back_row(back)]);
    }

    let mut rows: Vec<Vec<InlineKeyboardButton>> = events
        .iter()
        .map(|e| vec![button(event_button_label(e, offset), CallbackAction::Event(e.id.clone()))])
        .collect();
    rows.push(back_row(back));
    Screen::new(format!("{title}\n\nChoose an event:"), rows)
}

pub fn my_events(events: &[Event], user_id: TelegramId, offset: FixedOffset) -> Screen {
    if events.is_empty() {
        return Screen::new(
            "🎟 You have no registrations yet.".to_string(),
            vec![back_row(CallbackAction::Menu)],
        );
    }

    let mut text = "🎟 Your registrations:\n".to_string();
    let mut rows = Vec::new();
    for event in events {
        let status = event.status_of(user_id).map_or("", status_label);
        text.push_str(&format!(
            "\n• {} ({})\n  {}",
            event.name,
            format_event_datetime(&event.date, offset),
            status
        ));
        rows.push(vec![button(
            event_button_label(event, offset),
            CallbackAction::Event(event.id.clone()),
        )]);
    }
    rows.push(back_row(CallbackAction::Menu));
    Screen::new(text, rows)
}

fn event_body(event: &Event, location: Option<&Location>, offset: FixedOffset) -> String {
    let mut text = format!(
        "{}\n{}\n\n📅 {}\n",
        event.name,
        event_type_label(event.event_type),
        format_event_datetime(&event.date, offset)
    );
    if let Some(location) = location {
        text.push_str(&format!("📍 {}\n", location.name));
    }
    if let Some(trainer) = &event.trainer {
        text.push_str(&format!("🏋 Trainer: {trainer}\n"));
    }
    text.push_str(&seats_line(event));
    text.push('\n');
    if let Some(price) = event.price {
        if price == 0 {
            text.push_str("💰 Free\n");
        } else {
            text.push_str(&format!("💰 Price: {price}\n"));
        }
    }
    if let Some(phone) = &event.payment_phone {
        text.push_str(&format!("📞 Payment: {phone}\n"));
    }
    if let Some(description) = &event.description {
        text.push_str(&format!("\n{description}\n"));
    }
    text
}

/// Event card for a member, with the button matching their status.
pub fn event_details(
    event: &Event,
    location: Option<&Location>,
    user_id: TelegramId,
    offset: FixedOffset,
) -> Screen {
    let mut text = event_body(event, location, offset);
    let status = event.status_of(user_id);
    if let Some(status) = status {
        text.push_str(&format!("\nYour registration: {}", status_label(status)));
    }

    let mut rows = Vec::new();
    match status {
        None | Some(RegistrationStatus::Rejected) => {
            rows.push(vec![button("✍️ Register", CallbackAction::Register(event.id.clone()))]);
        }
        Some(RegistrationStatus::Pending | RegistrationStatus::Approved) => {
            rows.push(vec![button(
                "🚫 Cancel registration",
                CallbackAction::Unregister(event.id.clone()),
            )]);
        }
    }
    rows.push(vec![button(
        "👥 Participants",
        CallbackAction::Participants(event.id.clone()),
    )]);
    rows.push(back_row(CallbackAction::Events));
    Screen::new(text, rows)
}

/// Approved players as members see them.
pub fn participants(event: &Event, roster: &[RegistrationWithUser]) -> Screen {
    let approved: Vec<&RegistrationWithUser> = roster
        .iter()
        .filter(|r| r.registration.status == RegistrationStatus::Approved)
        .collect();
    let pending = roster
        .iter()
        .filter(|r| r.registration.status == RegistrationStatus::Pending)
        .count();

    let mut text = format!("👥 {}\n{}\n", event.name, seats_line(event));
    if approved.is_empty() {
        text.push_str("\nNo confirmed players yet.");
    } else {
        for (i, entry) in approved.iter().enumerate() {
            text.push_str(&format!("\n{}. {}", i + 1, entry.display_name()));
        }
    }
    if pending > 0 {
        text.push_str(&format!("\n\n⏳ Awaiting approval: {pending}"));
    }

    Screen::new(text, vec![back_row(CallbackAction::Event(event.id.clone()))])
}

pub fn admin_menu() -> Screen {
    Screen::new(
        "🛠 Admin panel".to_string(),
        vec![
            vec![button("➕ New event", CallbackAction::AdminNewEvent)],
            vec![button("📅 Events", CallbackAction::AdminEvents)],
            vec![button("📝 Moderation", CallbackAction::AdminModeration)],
            vec![
                button("➕ New location", CallbackAction::AdminNewLocation),
                button("📍 Locations", CallbackAction::AdminLocations),
            ],
            vec![button("🗑 Delete location", CallbackAction::AdminDeleteLocations)],
            back_row(CallbackAction::Menu),
        ],
    )
}

pub fn admin_events_menu() -> Screen {
    Screen::new(
        "📅 Which events?".to_string(),
        vec![
            vec![button(
                event_type_label(EventType::Training),
                CallbackAction::AdminEventsByType(EventType::Training),
            )],
            vec![button(
                event_type_label(EventType::Competition),
                CallbackAction::AdminEventsByType(EventType::Competition),
            )],
            vec![button("📋 All events", CallbackAction::AdminAllEvents)],
            back_row(CallbackAction::Admin),
        ],
    )
}

pub fn admin_events(title: &str, events: &[Event], offset: FixedOffset) -> Screen {
    if events.is_empty() {
        return Screen::new(
            format!("{title}\n\nNothing scheduled."),
            vec![back_row(CallbackAction::AdminEvents)],
        );
    }

    let mut rows: Vec<Vec<InlineKeyboardButton>> = events
        .iter()
        .map(|e| {
            let pending = e.pending_registrations().len();
            let mut label = event_button_label(e, offset);
            if pending > 0 {
                label.push_str(&format!(" (⏳{pending})"));
            }
            vec![button(label, CallbackAction::AdminEvent(e.id.clone()))]
        })
        .collect();
    rows.push(back_row(CallbackAction::AdminEvents));
    Screen::new(format!("{title}\n\nChoose an event:"), rows)
}

pub fn admin_event(event: &Event, location: Option<&Location>, offset: FixedOffset) -> Screen {
    let pending = event.pending_registrations().len();
    let mut text = event_body(event, location, offset);
    text.push_str(&format!("\n⏳ Pending requests: {pending}"));

    let rows = vec![
        vec![button(
            format!("📝 Moderate ({pending})"),
            CallbackAction::AdminEventModeration(event.id.clone()),
        )],
        vec![button(
            "👥 Participants",
            CallbackAction::Participants(event.id.clone()),
        )],
        vec![button("🗑 Delete event", CallbackAction::AdminDeleteEvent(event.id.clone()))],
        back_row(CallbackAction::AdminAllEvents),
    ];
    Screen::new(text, rows)
}

pub fn admin_locations(locations: &[Location]) -> Screen {
    let mut text = "📍 Locations:\n".to_string();
    if locations.is_empty() {
        text.push_str("\nNo locations yet.");
    }
    for location in locations {
        text.push_str(&format!("\n• {}", location.name));
        if let Some(address) = &location.address {
            text.push_str(&format!(" ({address})"));
        }
    }
    Screen::new(
        text,
        vec![
            vec![button("➕ New location", CallbackAction::AdminNewLocation)],
            back_row(CallbackAction::Admin),
        ],
    )
}

pub fn admin_delete_locations(locations: &[Location]) -> Screen {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = locations
        .iter()
        .map(|l| {
            vec![button(
                format!("🗑 {}", l.name),
                CallbackAction::AdminDeleteLocation(l.id.clone()),
            )]
        })
        .collect();
    rows.push(back_row(CallbackAction::Admin));
    let text = if locations.is_empty() {
        "📍 No locations to delete.".to_string()
    } else {
        "🗑 Choose a location to delete.\nIts events and registrations are removed too.".to_string()
    };
    Screen::new(text, rows)
}

pub fn location_created(location: &Location) -> Screen {
    let mut text = format!("✅ Location created: {}", location.name);
    if let Some(address) = &location.address {
        text.push_str(&format!("\n🏠 {address}"));
    }
    Screen::new(
        text,
        vec![
            vec![button("📍 Locations", CallbackAction::AdminLocations)],
            back_row(CallbackAction::Admin),
        ],
    )
}

pub fn new_event_locations(locations: &[Location]) -> Screen {
    if locations.is_empty() {
        return Screen::new(
            "📍 Create a location first.".to_string(),
            vec![
                vec![button("➕ New location", CallbackAction::AdminNewLocation)],
                back_row(CallbackAction::Admin),
            ],
        );
    }

    let mut rows: Vec<Vec<InlineKeyboardButton>> = locations
        .iter()
        .map(|l| vec![button(l.name.clone(), CallbackAction::AdminNewEventLocation(l.id.clone()))])
        .collect();
    rows.push(back_row(CallbackAction::Admin));
    Screen::new("➕ New event\n\nWhere will it take place?".to_string(), rows)
}

pub fn new_event_types(location_id: &LocationId) -> Screen {
    Screen::new(
        "➕ New event\n\nWhat kind of event?".to_string(),
        vec![
            vec![button(
                event_type_label(EventType::Training),
                CallbackAction::AdminNewEventType(location_id.clone(), EventType::Training),
            )],
            vec![button(
                event_type_label(EventType::Competition),
                CallbackAction::AdminNewEventType(location_id.clone(), EventType::Competition),
            )],
            back_row(CallbackAction::AdminNewEvent),
        ],
    )
}

pub fn event_created(event: &Event, offset: FixedOffset) -> Screen {
    Screen::new(
        format!(
            "✅ Event created!\n\n{}\n{}\n📅 {}\n{}",
            event.name,
            event_type_label(event.event_type),
            format_event_datetime(&event.date, offset),
            seats_line(event)
        ),
        vec![
            vec![button("📋 Open event", CallbackAction::AdminEvent(event.id.clone()))],
            back_row(CallbackAction::Admin),
        ],
    )
}

pub fn moderation_queue(queue: &[(Event, usize)], offset: FixedOffset) -> Screen {
    if queue.is_empty() {
        return Screen::new(
            "📝 No pending requests.".to_string(),
            vec![back_row(CallbackAction::Admin)],
        );
    }

    let mut rows: Vec<Vec<InlineKeyboardButton>> = queue
        .iter()
        .map(|(event, pending)| {
            vec![button(
                format!("{} (⏳{pending})", event_button_label(event, offset)),
                CallbackAction::AdminEventModeration(event.id.clone()),
            )]
        })
        .collect();
    rows.push(back_row(CallbackAction::Admin));
    Screen::new("📝 Events with pending requests:".to_string(), rows)
}

pub fn pending_registrations(event: &Event, pending: &[RegistrationWithUser]) -> Screen {
    let mut text = format!("📝 {}\n{}\n", event.name, seats_line(event));
    let mut rows = Vec::new();
    if pending.is_empty() {
        text.push_str("\nNo pending requests.");
    }
    for entry in pending {
        rows.push(vec![button(
            format!("👤 {}", entry.display_name()),
            CallbackAction::AdminRegistration(event.id.clone(), entry.registration.user_id),
        )]);
    }
    rows.push(back_row(CallbackAction::AdminModeration));
    Screen::new(text, rows)
}

pub fn registration_detail(event: &Event, entry: &RegistrationWithUser) -> Screen {
    let user_id = entry.registration.user_id;
    let text = format!(
        "📝 Request for {}\n\n👤 {}\n🆔 {}\nStatus: {}\n{}",
        event.name,
        entry.display_name(),
        user_id,
        status_label(entry.registration.status),
        seats_line(event)
    );

    let mut rows = Vec::new();
    match entry.registration.status {
        RegistrationStatus::Pending => rows.push(vec![
            button("✅ Approve", CallbackAction::AdminApprove(event.id.clone(), user_id)),
            button("❌ Reject", CallbackAction::AdminReject(event.id.clone(), user_id)),
        ]),
        RegistrationStatus::Approved => rows.push(vec![button(
            "❌ Reject",
            CallbackAction::AdminReject(event.id.clone(), user_id),
        )]),
        RegistrationStatus::Rejected => {}
    }
    rows.push(back_row(CallbackAction::AdminEventModeration(event.id.clone())));
    Screen::new(text, rows)
}

/// Text sent to a member after an admin decision.
pub fn decision_notice(event: &Event, status: RegistrationStatus, offset: FixedOffset) -> String {
    let date = format_event_datetime(&event.date, offset);
    match status {
        RegistrationStatus::Approved => {
            format!("✅ Your registration for {} ({date}) is approved. See you there!", event.name)
        }
        _ => format!("❌ Your registration for {} ({date}) was declined.", event.name),
    }
}
