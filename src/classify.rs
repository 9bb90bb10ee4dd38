// SPDX-License-Identifier: GPL-3.0-only

//! Room classification and name/member resolution.
//!
//! Every fetched conversation is assigned to exactly one [`RoomKind`] by a
//! fixed-priority decision table, or excluded from the export entirely when
//! no rule matches. Classification also resolves the display name the room
//! is exported under and, for direct messages, the member list.
//!
//! # Decision table
//!
//! Evaluated in this order; the first match wins:
//!
//! 1. 1:1 direct message → [`RoomKind::DirectMessage`], named after the
//!    counterpart user
//! 2. multi-person direct message → [`RoomKind::Mpim`], raw room name,
//!    members parsed out of the `mpdm-…-N` wrapper
//! 3. channel, not group, not private → [`RoomKind::Channel`]
//! 4. (not channel and not group) or (channel and private) →
//!    [`RoomKind::PrivateChannel`]
//! 5. anything else → unclassified, excluded from the export

use crate::types::{Channel, User};
use regex::Regex;
use std::sync::OnceLock;

/// The export category of a classified room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomKind {
    /// A public channel.
    Channel,

    /// A private channel or a conversation with no channel/group flags.
    PrivateChannel,

    /// A 1:1 direct message.
    DirectMessage,

    /// A multi-person direct message. Listed separately but exported under
    /// the same directory as 1:1 direct messages.
    Mpim,
}

impl RoomKind {
    /// The directory this category's rooms live under in the categorized
    /// layout.
    ///
    /// The mapping is a closed enumeration on purpose: a category can never
    /// produce a directory name that is not listed here.
    #[must_use]
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Channel => "channel",
            Self::PrivateChannel => "private_channel",
            Self::DirectMessage | Self::Mpim => "direct_message",
        }
    }
}

/// A room that passed classification, enriched with its resolved name and
/// member list.
#[derive(Debug, Clone)]
pub struct ClassifiedRoom {
    /// The export category.
    pub kind: RoomKind,

    /// The conversation, with `name` and `members` filled in.
    pub channel: Channel,
}

/// The `mpdm-<name>--<name>...-N` wrapper Slack puts around multi-person
/// direct message names.
fn mpdm_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^mpdm-(.+)-\d$").expect("static pattern"))
}

/// Classifies one conversation, resolving its export name and members.
///
/// Returns `None` for conversations no rule covers; those are excluded from
/// the export entirely.
///
/// A 1:1 direct message whose counterpart is missing from the user listing
/// keeps the raw counterpart id as its name, so the room still gets its own
/// directory.
#[must_use]
pub fn classify(channel: &Channel, users: &[User], requester_id: &str) -> Option<ClassifiedRoom> {
    let mut channel = channel.clone();

    let kind = if channel.is_im {
        channel.name = users
            .iter()
            .find(|user| user.id == channel.user)
            .map_or_else(|| channel.user.clone(), |user| user.name.clone());
        channel.members = vec![requester_id.to_owned(), channel.user.clone()];
        RoomKind::DirectMessage
    } else if channel.is_mpim {
        channel.members = mpdm_members(&channel.name, users);
        RoomKind::Mpim
    } else if channel.is_channel && !channel.is_group && !channel.is_private {
        RoomKind::Channel
    } else if (!channel.is_channel && !channel.is_group)
        || (channel.is_channel && channel.is_private)
    {
        RoomKind::PrivateChannel
    } else {
        return None;
    };

    Some(ClassifiedRoom { kind, channel })
}

/// Member resolution for multi-person direct messages.
///
/// Strips the `mpdm-…-N` wrapper from the room name, splits the remainder
/// on `--`, and resolves each fragment against the user listing by display
/// name. A fragment with no matching user is kept as-is.
fn mpdm_members(name: &str, users: &[User]) -> Vec<String> {
    let inner = mpdm_pattern().replace(name, "$1");
    inner
        .split("--")
        .map(|fragment| {
            users
                .iter()
                .find(|user| user.name == fragment)
                .map_or_else(|| fragment.to_owned(), |user| user.id.clone())
        })
        .collect()
}

/// Whether a resolved room name is selected by the room-name filter.
///
/// An empty filter selects every room; otherwise membership is an exact
/// string match.
#[must_use]
pub fn in_scope(filter: &[String], name: &str) -> bool {
    filter.is_empty() || filter.iter().any(|wanted| wanted == name)
}
