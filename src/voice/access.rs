//! Grants and revokes per-user access to a session's voice channel. Every
//! operation here is best-effort: the roster is the authoritative state, a
//! failed voice call is logged and the transition proceeds, and the sweep
//! plus idempotent grant/revoke self-heal any divergence.

use tracing::{debug, warn};

use crate::common::types::{ChannelId, UserId};
use crate::platform::{Provisioner, VoicePermissions};

pub async fn grant(provisioner: &dyn Provisioner, channel: ChannelId, user: UserId) {
    if let Err(e) = provisioner
        .set_user_permission(channel, user, VoicePermissions::MEMBER)
        .await
    {
        warn!("Failed to grant voice access to {} on {}: {}", user, channel, e);
    }
}

/// Removes the user's permission overwrite and, if they are connected to
/// the channel, disconnects them.
pub async fn revoke(provisioner: &dyn Provisioner, channel: ChannelId, user: UserId) {
    if let Err(e) = provisioner.remove_user_permission(channel, user).await {
        warn!(
            "Failed to revoke voice access from {} on {}: {}",
            user, channel, e
        );
    }
    if provisioner.is_connected(channel, user).await {
        if let Err(e) = provisioner.disconnect_user(channel, user).await {
            warn!("Failed to disconnect {} from {}: {}", user, channel, e);
        }
    }
}

/// Revokes access from a batch of users. A failure for one user never
/// skips the rest; each call logs its own outcome.
pub async fn revoke_all(provisioner: &dyn Provisioner, channel: ChannelId, users: &[UserId]) {
    for user in users {
        revoke(provisioner, channel, *user).await;
    }
}

pub async fn delete_channel(provisioner: &dyn Provisioner, channel: ChannelId) {
    match provisioner.delete_channel(channel).await {
        Ok(()) => debug!("Deleted voice channel {}", channel),
        Err(e) => warn!("Failed to delete voice channel {}: {}", channel, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::GuildId;
    use crate::platform::InMemoryPlatform;

    #[tokio::test]
    async fn revoke_disconnects_a_connected_user() {
        let platform = InMemoryPlatform::new();
        let guild = GuildId(1);
        let user = UserId(3);
        let parent = platform.create_category(guild, "Overwatch").await.unwrap();
        let channel = platform
            .create_voice_channel(guild, "Overwatch - 3", parent, &[])
            .await
            .unwrap();

        grant(&platform, channel, user).await;
        platform.connect(channel, user);

        revoke(&platform, channel, user).await;
        assert_eq!(platform.permission(channel, user), None);
        assert!(!platform.is_connected(channel, user).await);
    }

    #[tokio::test]
    async fn batch_revoke_survives_a_failing_member() {
        let platform = InMemoryPlatform::new();
        let guild = GuildId(1);
        let parent = platform.create_category(guild, "Valorant").await.unwrap();
        let channel = platform
            .create_voice_channel(guild, "Valorant - 1", parent, &[])
            .await
            .unwrap();

        let users = [UserId(1), UserId(2), UserId(3)];
        for u in users {
            grant(&platform, channel, u).await;
        }
        platform.fail_ops_for(UserId(2));

        revoke_all(&platform, channel, &users).await;
        assert_eq!(platform.permission(channel, UserId(1)), None);
        // The failing user keeps its overwrite, but the batch moved on.
        assert!(platform.permission(channel, UserId(2)).is_some());
        assert_eq!(platform.permission(channel, UserId(3)), None);
    }
}
