use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};

use crate::common::types::{AnyResult, ChannelId, GuildId, MessageId, UserId};
use crate::platform::{Messenger, Provisioner, VoicePermissions};
use crate::protocol::StatusPayload;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Category,
    Voice,
}

#[derive(Debug, Clone)]
pub struct FakeChannel {
    pub guild: GuildId,
    pub name: String,
    pub kind: ChannelKind,
    pub parent: Option<ChannelId>,
}

/// In-memory implementation of both collaborator traits. Backs every test,
/// and the standalone binary when no gateway adapter is wired in.
#[derive(Default)]
pub struct InMemoryPlatform {
    next_id: AtomicU64,
    pub channels: DashMap<ChannelId, FakeChannel>,
    pub overwrites: DashMap<(ChannelId, UserId), VoicePermissions>,
    pub connections: DashSet<(ChannelId, UserId)>,
    pub messages: DashMap<MessageId, (ChannelId, StatusPayload)>,
    /// Users for which voice operations are made to fail, for exercising
    /// the best-effort error paths.
    failing_users: DashSet<UserId>,
}

impl InMemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1000
    }

    /// Simulates a user connecting to a voice channel.
    pub fn connect(&self, channel: ChannelId, user: UserId) {
        self.connections.insert((channel, user));
    }

    pub fn permission(&self, channel: ChannelId, user: UserId) -> Option<VoicePermissions> {
        self.overwrites.get(&(channel, user)).map(|p| *p)
    }

    pub fn channel_exists(&self, channel: ChannelId) -> bool {
        self.channels.contains_key(&channel)
    }

    pub fn last_payload_in(&self, channel: ChannelId) -> Option<StatusPayload> {
        self.messages
            .iter()
            .filter(|e| e.value().0 == channel)
            .max_by_key(|e| e.key().0)
            .map(|e| e.value().1.clone())
    }

    /// Makes every voice operation targeting `user` fail from now on.
    pub fn fail_ops_for(&self, user: UserId) {
        self.failing_users.insert(user);
    }

    fn check_failure(&self, user: UserId) -> AnyResult<()> {
        if self.failing_users.contains(&user) {
            return Err(format!("injected failure for user {}", user).into());
        }
        Ok(())
    }
}

#[async_trait]
impl Provisioner for InMemoryPlatform {
    async fn create_category(&self, guild: GuildId, name: &str) -> AnyResult<ChannelId> {
        let id = ChannelId(self.alloc_id());
        self.channels.insert(
            id,
            FakeChannel {
                guild,
                name: name.to_string(),
                kind: ChannelKind::Category,
                parent: None,
            },
        );
        Ok(id)
    }

    async fn create_voice_channel(
        &self,
        guild: GuildId,
        name: &str,
        parent: ChannelId,
        initial: &[(UserId, VoicePermissions)],
    ) -> AnyResult<ChannelId> {
        if !self.channels.contains_key(&parent) {
            return Err(format!("unknown parent category {}", parent).into());
        }
        let id = ChannelId(self.alloc_id());
        self.channels.insert(
            id,
            FakeChannel {
                guild,
                name: name.to_string(),
                kind: ChannelKind::Voice,
                parent: Some(parent),
            },
        );
        for (user, perms) in initial {
            self.overwrites.insert((id, *user), *perms);
        }
        Ok(id)
    }

    async fn delete_channel(&self, channel: ChannelId) -> AnyResult<()> {
        if self.channels.remove(&channel).is_none() {
            return Err(format!("channel {} already deleted", channel).into());
        }
        self.overwrites.retain(|(c, _), _| *c != channel);
        self.connections.retain(|(c, _)| *c != channel);
        Ok(())
    }

    async fn set_user_permission(
        &self,
        channel: ChannelId,
        user: UserId,
        perms: VoicePermissions,
    ) -> AnyResult<()> {
        self.check_failure(user)?;
        if !self.channels.contains_key(&channel) {
            return Err(format!("unknown channel {}", channel).into());
        }
        self.overwrites.insert((channel, user), perms);
        Ok(())
    }

    async fn remove_user_permission(&self, channel: ChannelId, user: UserId) -> AnyResult<()> {
        self.check_failure(user)?;
        self.overwrites.remove(&(channel, user));
        Ok(())
    }

    async fn disconnect_user(&self, channel: ChannelId, user: UserId) -> AnyResult<()> {
        self.check_failure(user)?;
        self.connections.remove(&(channel, user));
        Ok(())
    }

    async fn is_connected(&self, channel: ChannelId, user: UserId) -> bool {
        self.connections.contains(&(channel, user))
    }
}

#[async_trait]
impl Messenger for InMemoryPlatform {
    async fn post_status(
        &self,
        channel: ChannelId,
        payload: &StatusPayload,
    ) -> AnyResult<MessageId> {
        let id = MessageId(self.alloc_id());
        self.messages.insert(id, (channel, payload.clone()));
        Ok(id)
    }

    async fn edit_status(
        &self,
        channel: ChannelId,
        message: MessageId,
        payload: &StatusPayload,
    ) -> AnyResult<()> {
        match self.messages.get_mut(&message) {
            Some(mut entry) => {
                *entry.value_mut() = (channel, payload.clone());
                Ok(())
            }
            None => Err(format!("unknown message {}", message).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn grant_then_revoke_leaves_no_residual_permission() {
        let platform = InMemoryPlatform::new();
        let guild = GuildId(1);
        let creator = UserId(10);
        let parent = platform.create_category(guild, "Valorant").await.unwrap();
        let voice = platform
            .create_voice_channel(guild, "Valorant - creator", parent, &[])
            .await
            .unwrap();

        platform
            .set_user_permission(voice, creator, VoicePermissions::MEMBER)
            .await
            .unwrap();
        assert_eq!(
            platform.permission(voice, creator),
            Some(VoicePermissions::MEMBER)
        );

        platform.remove_user_permission(voice, creator).await.unwrap();
        assert_eq!(platform.permission(voice, creator), None);
    }

    #[tokio::test]
    async fn deleting_a_channel_clears_overwrites_and_connections() {
        let platform = InMemoryPlatform::new();
        let guild = GuildId(1);
        let user = UserId(7);
        let parent = platform.create_category(guild, "Fortnite").await.unwrap();
        let voice = platform
            .create_voice_channel(guild, "Fortnite - x", parent, &[(user, VoicePermissions::MEMBER)])
            .await
            .unwrap();
        platform.connect(voice, user);

        platform.delete_channel(voice).await.unwrap();
        assert!(!platform.channel_exists(voice));
        assert_eq!(platform.permission(voice, user), None);
        assert!(!platform.is_connected(voice, user).await);
        assert!(platform.delete_channel(voice).await.is_err());
    }
}
