//! # Club Events Bot
//!
//! A Telegram bot for a sports club: members browse locations and events
//! and apply for seats, admins create events and approve or reject the
//! requests.
//!
//! ## Features
//! - Locations with address and map link
//! - Trainings and competitions with a fixed number of seats
//! - Pending, approved and rejected registrations; only approvals take seats
//! - Admin moderation queue with member notifications
//! - Persistent storage with SQLite

/// Bot command handlers and message processing
pub mod bot;
/// Configuration management and environment variables
pub mod config;
/// Database models, connections, and migrations
pub mod database;
/// Locations, members, events and the registration engine
pub mod domain;
/// Background services: health endpoint and wizard cleanup
pub mod services;
/// Utility functions for datetime, validation, and formatting
pub mod utils;
