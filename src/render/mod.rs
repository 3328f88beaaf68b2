//! Builds the outbound status payloads for every session event. Pure
//! functions over session snapshots; nothing here touches state.

use crate::common::types::UserId;
use crate::protocol::{
    ActionKind, ButtonSpec, ButtonStyle, EmbedField, SessionAction, StatusPayload,
};
use crate::server::session::{Session, SessionStatus};

pub const COLOR_PRIMARY: u32 = 0x5865f2;
pub const COLOR_SUCCESS: u32 = 0x00ff00;
pub const COLOR_CANCELLED: u32 = 0xff6b6b;
pub const COLOR_NEUTRAL: u32 = 0x95a5a6;
pub const COLOR_EXPIRED: u32 = 0x2b2d31;

fn mention(user: UserId) -> String {
    format!("<@{}>", user)
}

fn roster_lines(session: &Session) -> String {
    session
        .roster
        .iter()
        .enumerate()
        .map(|(i, user)| {
            let marker = if i == 0 { "👑" } else { "⚔️" };
            format!("{} {}", marker, mention(*user))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn base_fields(session: &Session) -> Vec<EmbedField> {
    let mut fields = vec![
        EmbedField {
            name: "🎮 Game".to_string(),
            value: session.game.name.to_string(),
            inline: true,
        },
        EmbedField {
            name: "🎯 Mode".to_string(),
            value: session.mode.clone(),
            inline: true,
        },
        EmbedField {
            name: "👥 Players".to_string(),
            value: format!("{}/{}", session.roster.len(), session.capacity),
            inline: true,
        },
        EmbedField {
            name: "👤 Current Players".to_string(),
            value: roster_lines(session),
            inline: false,
        },
        EmbedField {
            name: "🔊 Voice Channel".to_string(),
            value: format!(
                "<#{}>\n*Private voice channel created for this team.\nAccess granted when you join!*",
                session.voice_channel
            ),
            inline: false,
        },
    ];
    if let Some(note) = &session.note {
        fields.push(EmbedField {
            name: "📝 Additional Info".to_string(),
            value: note.clone(),
            inline: false,
        });
    }
    fields
}

fn button(session: &Session, kind: ActionKind, label: &str, style: ButtonStyle, emoji: &str) -> ButtonSpec {
    ButtonSpec {
        action: SessionAction {
            kind,
            session_id: session.id.clone(),
        },
        label: label.to_string(),
        style,
        emoji: emoji.to_string(),
    }
}

/// Roster view for a session in `Waiting` or `Confirming`, with the
/// controls matching the phase.
pub fn session_status(session: &Session) -> StatusPayload {
    let confirming = session.status == SessionStatus::Confirming;
    let description = if confirming {
        "Team full! Waiting for confirmations...".to_string()
    } else {
        format!("Looking for {} more player(s)", session.missing_players())
    };
    let buttons = if confirming {
        vec![
            button(session, ActionKind::Confirm, "Confirm", ButtonStyle::Success, "✅"),
            button(session, ActionKind::Decline, "Decline", ButtonStyle::Danger, "❌"),
        ]
    } else {
        vec![button(session, ActionKind::Join, "Join LFG", ButtonStyle::Primary, "✅")]
    };

    StatusPayload {
        color: COLOR_PRIMARY,
        title: format!("🎮 LFG: {}", session.game.name),
        description,
        fields: base_fields(session),
        footer: Some(format!(
            "LFG #{} • Created by {}",
            session.id.short_code(),
            mention(session.creator)
        )),
        content: None,
        mentions: Vec::new(),
        buttons,
    }
}

/// The status view plus a ping asking every rostered player to confirm.
pub fn confirmation_started(session: &Session) -> StatusPayload {
    let pings = session
        .roster
        .iter()
        .map(|u| mention(*u))
        .collect::<Vec<_>>()
        .join(" ");
    StatusPayload {
        content: Some(format!("{} 🎯 **Confirm matchmaking!**", pings)),
        mentions: session.roster.clone(),
        ..session_status(session)
    }
}

/// Re-announcement after a player dropped out or failed to confirm.
pub fn reopened(session: &Session) -> StatusPayload {
    let pings = session
        .roster
        .iter()
        .map(|u| mention(*u))
        .collect::<Vec<_>>()
        .join(" ");
    StatusPayload {
        content: Some(format!(
            "{} **A player left your LFG session!**\n\nYour team is looking for **{} more player(s)** to complete the squad.",
            pings,
            session.missing_players()
        )),
        mentions: session.roster.clone(),
        ..session_status(session)
    }
}

pub fn match_ready(session: &Session) -> StatusPayload {
    StatusPayload {
        color: COLOR_SUCCESS,
        title: "🎉 Match Found!".to_string(),
        description: format!(
            "Your **{} {}** team is ready!",
            session.game.name, session.mode
        ),
        fields: vec![
            EmbedField {
                name: "🎮 Game".to_string(),
                value: session.game.name.to_string(),
                inline: true,
            },
            EmbedField {
                name: "🎯 Mode".to_string(),
                value: session.mode.clone(),
                inline: true,
            },
            EmbedField {
                name: "👥 Team Size".to_string(),
                value: format!("{} players", session.roster.len()),
                inline: true,
            },
            EmbedField {
                name: "👤 Your Team".to_string(),
                value: roster_lines(session),
                inline: false,
            },
            EmbedField {
                name: "🔊 Voice Channel".to_string(),
                value: format!(
                    "<#{}>\n*Click to join voice channel*\n*Private channel for your team only*",
                    session.voice_channel
                ),
                inline: false,
            },
            EmbedField {
                name: "🚀 Next Steps".to_string(),
                value: "• Join the voice channel above\n• Coordinate with your teammates\n• Have fun gaming together!"
                    .to_string(),
                inline: false,
            },
        ],
        footer: Some("Voice channel auto-deletes when empty or after 2 hours".to_string()),
        content: None,
        mentions: Vec::new(),
        buttons: Vec::new(),
    }
}

pub fn cancelled() -> StatusPayload {
    StatusPayload {
        color: COLOR_CANCELLED,
        title: "❌ LFG Session Cancelled".to_string(),
        description: "The session creator cancelled this LFG.".to_string(),
        fields: Vec::new(),
        footer: None,
        content: None,
        mentions: Vec::new(),
        buttons: Vec::new(),
    }
}

pub fn ended(creator: UserId) -> StatusPayload {
    StatusPayload {
        color: COLOR_NEUTRAL,
        title: "🔚 LFG Session Ended".to_string(),
        description: format!("{} ended their LFG session.", mention(creator)),
        fields: Vec::new(),
        footer: None,
        content: None,
        mentions: Vec::new(),
        buttons: Vec::new(),
    }
}

pub fn empty() -> StatusPayload {
    StatusPayload {
        color: COLOR_NEUTRAL,
        title: "💭 LFG Session Empty".to_string(),
        description: "All players have left this session.".to_string(),
        fields: Vec::new(),
        footer: None,
        content: None,
        mentions: Vec::new(),
        buttons: Vec::new(),
    }
}

/// Shown when a session expires with no joiners.
pub fn expired(session: &Session, minutes: u64) -> StatusPayload {
    StatusPayload {
        color: COLOR_EXPIRED,
        title: "LFG queue ended".to_string(),
        description: format!("no player was found in time ({} minutes)", minutes),
        fields: vec![EmbedField {
            name: "👤 Session Creator".to_string(),
            value: format!(
                "{}, your LFG session expired because no players joined within {} minutes.\n\nYou can create a new LFG session anytime using `/lfg`",
                mention(session.creator),
                minutes
            ),
            inline: false,
        }],
        footer: None,
        content: None,
        mentions: Vec::new(),
        buttons: Vec::new(),
    }
}

/// Shown when an active session reaches its TTL and is reaped.
pub fn closed() -> StatusPayload {
    StatusPayload {
        color: COLOR_NEUTRAL,
        title: "🔚 LFG Session Closed".to_string(),
        description: "This session's voice channel was cleaned up.".to_string(),
        fields: Vec::new(),
        footer: None,
        content: None,
        mentions: Vec::new(),
        buttons: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::common::types::{ChannelId, GuildId};

    fn sample_session() -> Session {
        Session::new(
            UserId(1),
            GuildId(9),
            ChannelId(100),
            ChannelId(200),
            ChannelId(300),
            catalog::find("valorant").unwrap(),
            "Competitive".to_string(),
            3,
            Some("chill games only".to_string()),
        )
    }

    #[test]
    fn waiting_view_offers_a_join_button() {
        let session = sample_session();
        let payload = session_status(&session);
        assert_eq!(payload.buttons.len(), 1);
        assert_eq!(payload.buttons[0].action.kind, ActionKind::Join);
        assert!(payload.description.contains("2 more player(s)"));
        assert!(payload.fields.iter().any(|f| f.name.contains("Additional Info")));
    }

    #[test]
    fn confirming_view_offers_confirm_and_decline() {
        let mut session = sample_session();
        session.roster.push(UserId(2));
        session.roster.push(UserId(3));
        session.status = SessionStatus::Confirming;
        session.confirmation_started_at = Some(session.created_at);

        let payload = confirmation_started(&session);
        let kinds: Vec<_> = payload.buttons.iter().map(|b| b.action.kind).collect();
        assert_eq!(kinds, vec![ActionKind::Confirm, ActionKind::Decline]);
        assert_eq!(payload.mentions.len(), 3);
        assert!(payload.content.unwrap().contains("Confirm matchmaking"));
    }

    #[test]
    fn roster_marks_creator_with_a_crown() {
        let mut session = sample_session();
        session.roster.push(UserId(2));
        let lines = roster_lines(&session);
        assert!(lines.starts_with("👑 <@1>"));
        assert!(lines.contains("⚔️ <@2>"));
    }
}
