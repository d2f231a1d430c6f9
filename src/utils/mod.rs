/// Club-local date parsing and formatting
pub mod datetime;
/// Chat feedback messages for command outcomes
pub mod feedback;
/// Tagged log helpers
pub mod logging;
/// MarkdownV2 escaping
pub mod markdown;
/// Input parsing for admin and wizard text
pub mod validation;
