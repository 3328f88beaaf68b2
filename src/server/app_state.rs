use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;

use crate::common::types::{ChannelId, GuildId};
use crate::configs::Config;
use crate::platform::{Messenger, Provisioner};
use crate::server::session_store::SessionStore;
use crate::server::settings::SettingsStore;

/// Top-level application state. Owned by the process, injected into every
/// handler; tests build a fresh one per case.
pub struct AppState {
    pub store: SessionStore,
    pub settings: SettingsStore,
    /// Per-guild game category cache (guild, game slug) -> category id.
    pub categories: DashMap<(GuildId, String), ChannelId>,
    pub provisioner: Arc<dyn Provisioner>,
    pub messenger: Arc<dyn Messenger>,
    pub config: Config,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        config: Config,
        provisioner: Arc<dyn Provisioner>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            store: SessionStore::new(),
            settings: SettingsStore::new(),
            categories: DashMap::new(),
            provisioner,
            messenger,
            config,
            start_time: Instant::now(),
        }
    }
}
