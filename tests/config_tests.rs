use club_events_bot::config::Config;
use std::env;
use std::sync::Mutex;

// Config tests share process environment variables
static CONFIG_TEST_MUTEX: Mutex<()> = Mutex::new(());

const VARS: &[&str] = &[
    "TELEGRAM_BOT_TOKEN",
    "DATABASE_URL",
    "HTTP_PORT",
    "ADMIN_IDS",
    "WIZARD_TTL_MINUTES",
    "LOCATION_ADDRESS_REQUIRED",
    "EVENT_PAYMENT_DETAILS",
    "UTC_OFFSET_HOURS",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
fn test_config_from_env_with_all_vars() {
    let _guard = CONFIG_TEST_MUTEX.lock().unwrap();
    clear_env();

    env::set_var("TELEGRAM_BOT_TOKEN", "test_token_123");
    env::set_var("DATABASE_URL", "sqlite:test.db");
    env::set_var("HTTP_PORT", "8080");
    env::set_var("ADMIN_IDS", "111, 222");
    env::set_var("WIZARD_TTL_MINUTES", "15");
    env::set_var("LOCATION_ADDRESS_REQUIRED", "true");
    env::set_var("EVENT_PAYMENT_DETAILS", "yes");
    env::set_var("UTC_OFFSET_HOURS", "3");

    let config = Config::from_env().unwrap();

    assert_eq!(config.telegram_bot_token, "test_token_123");
    assert_eq!(config.database_url, "sqlite:test.db");
    assert_eq!(config.http_port, 8080);
    assert!(config.is_admin(111));
    assert!(config.is_admin(222));
    assert!(!config.is_admin(333));
    assert_eq!(config.wizard_ttl_minutes, 15);
    assert!(config.location_address_required);
    assert!(config.event_payment_details);
    assert_eq!(config.offset().local_minus_utc(), 3 * 3600);

    clear_env();
}

#[test]
fn test_config_from_env_with_defaults() {
    let _guard = CONFIG_TEST_MUTEX.lock().unwrap();
    clear_env();
    env::set_var("TELEGRAM_BOT_TOKEN", "required_token");

    let config = Config::from_env().unwrap();

    assert_eq!(config.database_url, "sqlite:./data/club.db");
    assert_eq!(config.http_port, 3000);
    assert!(config.admin_ids.is_empty());
    assert_eq!(config.wizard_ttl_minutes, 30);
    assert!(!config.location_address_required);
    assert!(!config.event_payment_details);
    assert_eq!(config.offset().local_minus_utc(), 0);

    clear_env();
}

#[test]
fn test_config_missing_required_token() {
    let _guard = CONFIG_TEST_MUTEX.lock().unwrap();
    clear_env();

    let error = Config::from_env().unwrap_err();
    assert!(error.to_string().contains("TELEGRAM_BOT_TOKEN"));

    env::set_var("TELEGRAM_BOT_TOKEN", "   ");
    assert!(Config::from_env().is_err());

    clear_env();
}

#[test]
fn test_invalid_admin_entries_are_skipped() {
    let _guard = CONFIG_TEST_MUTEX.lock().unwrap();
    clear_env();
    env::set_var("TELEGRAM_BOT_TOKEN", "token");
    env::set_var("ADMIN_IDS", "42,not-a-number,,-7");

    let config = Config::from_env().unwrap();
    assert_eq!(config.admin_ids.len(), 1);
    assert!(config.is_admin(42));

    clear_env();
}

#[test]
fn test_invalid_values_are_errors() {
    let _guard = CONFIG_TEST_MUTEX.lock().unwrap();
    let cases = [
        ("HTTP_PORT", "not_a_number"),
        ("WIZARD_TTL_MINUTES", "0"),
        ("WIZARD_TTL_MINUTES", "soon"),
        ("UTC_OFFSET_HOURS", "20"),
        ("EVENT_PAYMENT_DETAILS", "maybe"),
    ];

    for (var, value) in cases {
        clear_env();
        env::set_var("TELEGRAM_BOT_TOKEN", "token");
        env::set_var(var, value);
        assert!(Config::from_env().is_err(), "{var}={value} should be rejected");
    }

    clear_env();
}

#[test]
fn test_database_url_without_token() {
    let _guard = CONFIG_TEST_MUTEX.lock().unwrap();
    clear_env();

    assert_eq!(Config::database_url_from_env(), "sqlite:./data/club.db");
    env::set_var("DATABASE_URL", "sqlite:/tmp/other.db");
    assert_eq!(Config::database_url_from_env(), "sqlite:/tmp/other.db");

    clear_env();
}
