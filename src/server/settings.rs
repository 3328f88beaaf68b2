use dashmap::DashMap;

use crate::common::types::{ChannelId, GuildId};

#[derive(Debug, Clone, Default)]
pub struct GuildSettings {
    /// When set, session-creation requests are only accepted from this
    /// channel.
    pub lfg_channel: Option<ChannelId>,
}

/// Per-guild settings. Memory-only, like the session registry.
#[derive(Default)]
pub struct SettingsStore {
    inner: DashMap<GuildId, GuildSettings>,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_lfg_channel(&self, guild: GuildId, channel: ChannelId) {
        self.inner.entry(guild).or_default().lfg_channel = Some(channel);
    }

    pub fn lfg_channel(&self, guild: GuildId) -> Option<ChannelId> {
        self.inner.get(&guild).and_then(|s| s.lfg_channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_round_trips() {
        let settings = SettingsStore::new();
        let guild = GuildId(5);
        assert_eq!(settings.lfg_channel(guild), None);

        settings.set_lfg_channel(guild, ChannelId(99));
        assert_eq!(settings.lfg_channel(guild), Some(ChannelId(99)));

        settings.set_lfg_channel(guild, ChannelId(100));
        assert_eq!(settings.lfg_channel(guild), Some(ChannelId(100)));
    }
}
