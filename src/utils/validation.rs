use std::collections::HashSet;

use anyhow::{anyhow, Result};

use crate::domain::location::CreateLocationInput;

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_CAPACITY: u32 = 1000;

/// Event, location and person names: non-empty, single line, bounded.
pub fn validate_name(field: &str, value: &str) -> Result<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(anyhow!("{} cannot be empty", field));
    }

    if value.chars().count() > MAX_NAME_LEN {
        return Err(anyhow!(
            "{} cannot be longer than {} characters",
            field,
            MAX_NAME_LEN
        ));
    }

    if value.contains('\n') || value.contains('\r') {
        return Err(anyhow!("{} cannot contain line breaks", field));
    }

    Ok(value.to_string())
}

/// Parses `Name|Address|MapURL|Description`. Only the name is required;
/// missing or blank trailing parts become `None`.
pub fn parse_location_input(input: &str) -> Result<CreateLocationInput> {
    let input = input.trim();
    if input.is_empty() {
        return Err(anyhow!("Use the format: Name|Address|MapURL|Description"));
    }

    let parts: Vec<&str> = input.split('|').map(str::trim).collect();
    if parts.len() > 4 {
        return Err(anyhow!("Too many fields, expected at most 4 separated by '|'"));
    }

    let name = validate_name("Location name", parts[0])?;
    let optional = |index: usize| {
        parts
            .get(index)
            .filter(|p| !p.is_empty())
            .map(|p| (*p).to_string())
    };

    Ok(CreateLocationInput {
        name,
        address: optional(1),
        map_url: optional(2),
        description: optional(3),
    })
}

pub fn parse_capacity(input: &str) -> Result<u32> {
    let value: i64 = input
        .trim()
        .parse()
        .map_err(|_| anyhow!("Capacity must be a whole number"))?;

    if value <= 0 {
        return Err(anyhow!("Capacity must be greater than 0"));
    }
    if value > i64::from(MAX_CAPACITY) {
        return Err(anyhow!("Capacity cannot exceed {}", MAX_CAPACITY));
    }
    u32::try_from(value).map_err(|_| anyhow!("Capacity out of range"))
}

/// Whole currency units; `0` means free.
pub fn parse_price(input: &str) -> Result<i64> {
    let value: i64 = input
        .trim()
        .parse()
        .map_err(|_| anyhow!("Price must be a whole number"))?;

    if value < 0 {
        return Err(anyhow!("Price cannot be negative"));
    }
    Ok(value)
}

/// Loose phone check: digits with an optional leading `+`, spaces,
/// dashes and parentheses allowed.
pub fn validate_phone(input: &str) -> Result<String> {
    let phone = input.trim();
    let digits = phone.chars().filter(char::is_ascii_digit).count();

    let allowed = phone
        .char_indices()
        .all(|(i, c)| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')') || (c == '+' && i == 0));
    if !allowed || !(7..=15).contains(&digits) {
        return Err(anyhow!("Phone number must contain 7 to 15 digits"));
    }
    Ok(phone.to_string())
}

/// Parses a comma-separated admin list. Invalid entries are skipped and
/// returned separately so the caller can log them.
pub fn parse_admin_ids(input: &str) -> (HashSet<i64>, Vec<String>) {
    let mut ids = HashSet::new();
    let mut invalid = Vec::new();

    for entry in input.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        match entry.parse::<i64>() {
            Ok(id) if id > 0 => {
                ids.insert(id);
            }
            _ => invalid.push(entry.to_string()),
        }
    }

    (ids, invalid)
}

/// Ids echoed back in callback data: UUID-ish, no separators.
pub fn validate_entity_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(anyhow!("ID cannot be empty"));
    }

    if id.len() > 36 {
        return Err(anyhow!("ID cannot be longer than 36 characters"));
    }

    if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(anyhow!("ID can only contain letters, numbers, and hyphens"));
    }

    Ok(())
}
