/// Compact inline-button payload codec
pub mod callback_data;
/// Bot command enum and per-area screen builders
pub mod commands;
/// Update handlers and dispatcher schema
pub mod handlers;
/// Pure renderers from domain data to messages
pub mod presentation;
/// Per-chat multi-step input state
pub mod wizard;

use std::sync::Arc;

use crate::config::Config;
use crate::domain::engine::EventEngine;
use crate::domain::location::{LocationPolicy, LocationRegistry};
use crate::domain::moderation::ModerationWorkflow;
use crate::domain::repository::{EventRepository, LocationRepository, UserRepository};
use crate::domain::user::UserDirectory;
use crate::bot::wizard::WizardStore;

/// Everything a handler needs, cheap to clone into each update.
#[derive(Clone)]
pub struct ClubServices {
    pub locations: LocationRegistry,
    pub users: UserDirectory,
    pub engine: EventEngine,
    pub moderation: ModerationWorkflow,
    pub wizards: WizardStore,
    pub config: Arc<Config>,
}

impl ClubServices {
    pub fn new<R>(repo: Arc<R>, config: Config) -> Self
    where
        R: LocationRepository + EventRepository + UserRepository + 'static,
    {
        let location_repo: Arc<dyn LocationRepository> = repo.clone();
        let event_repo: Arc<dyn EventRepository> = repo.clone();
        let user_repo: Arc<dyn UserRepository> = repo;

        let locations = LocationRegistry::new(
            location_repo.clone(),
            LocationPolicy {
                require_address: config.location_address_required,
            },
        );
        let users = UserDirectory::new(user_repo);
        let engine = EventEngine::new(event_repo, location_repo);
        let moderation = ModerationWorkflow::new(engine.clone(), users.clone());
        let wizards = WizardStore::from_minutes(config.wizard_ttl_minutes);

        Self {
            locations,
            users,
            engine,
            moderation,
            wizards,
            config: Arc::new(config),
        }
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.config.is_admin(user_id)
    }
}
