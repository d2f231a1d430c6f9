/// Admin screens and actions
pub mod admin;
/// Event browsing and member registration
pub mod events;
/// Location browsing
pub mod locations;
/// Text-step logic of the event and profile wizards
pub mod wizard_steps;

use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Club bot commands:")]
pub enum Command {
    #[command(description = "Open the main menu")]
    Start,
    #[command(description = "Display this help message")]
    Help,
    #[command(description = "Browse club locations")]
    Locations,
    #[command(description = "Browse upcoming events")]
    Events,
    #[command(description = "Show your registrations")]
    MyEvents,
    #[command(description = "Open the admin panel")]
    Admin,
    #[command(description = "Create a location: Name|Address|MapURL|Description")]
    NewLocation(String),
    #[command(description = "Abort the current step-by-step input")]
    Cancel,
}
