// SPDX-License-Identifier: GPL-3.0-only

//! Wire types for the Slack Web API objects that survive into the export.
//!
//! Only the fields the pipeline inspects are modeled. Everything else the
//! API returns is carried through a `#[serde(flatten)]` map on each struct,
//! so the exported JSON preserves whatever the workspace sent even when
//! this tool has no use for it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A conversation of any kind: public or private channel, legacy group,
/// multi-person direct message, or 1:1 direct message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Channel {
    /// Unique conversation id, e.g. `C024BE91L`.
    pub id: String,

    /// Display name. Empty for 1:1 direct messages until classification
    /// resolves the counterpart's name.
    pub name: String,

    /// `true` for public and private channels.
    pub is_channel: bool,

    /// `true` for legacy private groups.
    pub is_group: bool,

    /// `true` for 1:1 direct messages.
    pub is_im: bool,

    /// `true` for multi-person direct messages.
    pub is_mpim: bool,

    /// `true` when the conversation is private.
    pub is_private: bool,

    /// Counterpart user id. Present only on 1:1 direct messages.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub user: String,

    /// Member user ids, filled in during classification.
    pub members: Vec<String>,

    /// Fields not modeled here, preserved for the export.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A workspace user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    /// Unique user id, e.g. `U023BECGF`.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Fields not modeled here (profile, flags, …), preserved for the
    /// export's `users.json`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A reply summary attached to a thread's root message: who replied, and
/// when.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reply {
    /// The replying user's id.
    pub user: String,

    /// The reply's timestamp.
    pub ts: String,
}

/// A single message, top-level or thread reply.
///
/// The `ts` string doubles as the sort and day-sharding key: Slack
/// timestamps are fixed-width zero-padded decimal seconds with a fractional
/// suffix, unique enough within one room.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Message {
    /// Message type, normally `"message"`.
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub kind: String,

    /// The authoring user's id. Absent for some bot messages.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub user: String,

    /// The message text.
    pub text: String,

    /// Timestamp: fractional seconds since the Unix epoch, as a string.
    pub ts: String,

    /// The root timestamp of the thread this message belongs to, if any.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub thread_ts: String,

    /// Number of thread replies under this message.
    #[serde(skip_serializing_if = "is_zero")]
    pub reply_count: u64,

    /// Reply summaries, attached to thread roots during history fetch.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<Reply>,

    /// File attachments, carried opaquely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Value>,

    /// Upload marker, set on file-carrying messages in the flat
    /// (Mattermost) layout only.
    #[serde(skip_serializing_if = "is_false")]
    pub upload: bool,

    /// Fields not modeled here (reactions, attachments, edits, …),
    /// preserved for the export.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn is_zero(n: &u64) -> bool {
    *n == 0
}

fn is_false(b: &bool) -> bool {
    !*b
}
