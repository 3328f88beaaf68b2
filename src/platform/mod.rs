//! Contracts for the external collaborators: the channel/voice provisioning
//! layer and the status-message layer. The lifecycle engine only ever talks
//! to these traits; the concrete chat transport lives outside this crate.

pub mod memory;

use async_trait::async_trait;

use crate::common::types::{AnyResult, ChannelId, GuildId, MessageId, UserId};
use crate::protocol::StatusPayload;

pub use memory::InMemoryPlatform;

/// Per-user voice channel permission set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VoicePermissions {
    pub connect: bool,
    pub view: bool,
    pub speak: bool,
}

impl VoicePermissions {
    pub const MEMBER: Self = Self {
        connect: true,
        view: true,
        speak: true,
    };
}

/// Channel, category and voice operations. Implementations must be
/// idempotent for permission edits: setting the same overwrite twice or
/// removing a missing one is not an error.
#[async_trait]
pub trait Provisioner: Send + Sync {
    async fn create_category(&self, guild: GuildId, name: &str) -> AnyResult<ChannelId>;

    /// Creates a private voice channel under `parent`. The channel denies
    /// connect/view to everyone except the listed initial overwrites.
    async fn create_voice_channel(
        &self,
        guild: GuildId,
        name: &str,
        parent: ChannelId,
        initial: &[(UserId, VoicePermissions)],
    ) -> AnyResult<ChannelId>;

    async fn delete_channel(&self, channel: ChannelId) -> AnyResult<()>;

    async fn set_user_permission(
        &self,
        channel: ChannelId,
        user: UserId,
        perms: VoicePermissions,
    ) -> AnyResult<()>;

    async fn remove_user_permission(&self, channel: ChannelId, user: UserId) -> AnyResult<()>;

    async fn disconnect_user(&self, channel: ChannelId, user: UserId) -> AnyResult<()>;

    /// Whether the user is currently connected to the voice channel.
    async fn is_connected(&self, channel: ChannelId, user: UserId) -> bool;
}

/// Posting and editing the session status message in the origin channel.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn post_status(&self, channel: ChannelId, payload: &StatusPayload)
    -> AnyResult<MessageId>;

    async fn edit_status(
        &self,
        channel: ChannelId,
        message: MessageId,
        payload: &StatusPayload,
    ) -> AnyResult<()>;
}
