// SPDX-License-Identifier: GPL-3.0-only

//! The export pipeline: fetch, order, shard, and write.
//!
//! [`run_export`] drives a full workspace dump into a working directory:
//! it lists conversations and users once, classifies every room, exports
//! each in-scope room's complete history as one JSON file per calendar
//! day, and finally persists the room and user metadata listings.
//!
//! Execution is fully sequential — one room is fetched, sorted, and
//! written before the next begins — and fail-fast: the first remote,
//! timestamp, or filesystem failure aborts the run. No partial export is
//! ever passed on to archiving.

use crate::api::{ApiError, Session};
use crate::classify::{self, ClassifiedRoom, RoomKind};
use crate::json::to_export_json;
use crate::paginate::{collect_pages, fetch_history};
use crate::timestamp::{self, TimestampError};
use crate::types::Message;
use serde::Serialize;
use snafu::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Error type for export failures. Every variant aborts the run.
#[derive(Debug, Snafu)]
pub enum ExportError {
    /// A paginated remote call failed.
    #[snafu(display("remote fetch failed: {source}"))]
    Fetch {
        /// The failed API call.
        source: ApiError,
    },

    /// A message carried a timestamp that day sharding cannot decode.
    #[snafu(display("cannot shard by day: {source}"))]
    Shard {
        /// The decoding failure.
        source: TimestampError,
    },

    /// A value could not be serialized into export JSON.
    #[snafu(display("failed to serialize {name}: {source}"))]
    Serialize {
        /// The file the value was destined for.
        name: String,
        /// The underlying serialization error.
        source: serde_json::Error,
    },

    /// A directory could not be created.
    #[snafu(display("failed to create {}: {source}", path.display()))]
    CreateDir {
        /// The directory that could not be created.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A file could not be written.
    #[snafu(display("failed to write {}: {source}", path.display()))]
    WriteFile {
        /// The file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// On-disk layout variant for room directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Room directories nested under their category directory
    /// (`channel/`, `private_channel/`, `direct_message/`), with the four
    /// per-kind metadata listings.
    Categorized,

    /// Room directories directly under the export root, one merged
    /// `channels.json`, and the `upload` marker set on file-carrying
    /// messages — the shape Mattermost's bulk import expects.
    Flat,
}

/// Orders messages by timestamp ascending.
///
/// Slack timestamps are fixed-width zero-padded decimal seconds with a
/// fractional suffix, so the lexicographic comparison is numeric. The sort
/// is stable: messages sharing a timestamp keep their relative order.
pub fn sort_chronologically(messages: &mut [Message]) {
    messages.sort_by(|a, b| a.ts.cmp(&b.ts));
}

/// Exports one room: full history with threads inlined, ordered, and
/// sharded into one file per calendar day.
///
/// A room with no messages writes nothing, not even its directory. A
/// message whose timestamp is empty has no calendar day and is skipped.
///
/// # Errors
///
/// Fails on the first remote fetch, timestamp, or filesystem failure.
pub fn export_room<S: Session>(
    session: &S,
    room: &ClassifiedRoom,
    export_root: &Path,
    layout: Layout,
) -> Result<(), ExportError> {
    let mut messages = fetch_history(session, &room.channel.id).context(FetchSnafu)?;
    if messages.is_empty() {
        return Ok(());
    }
    sort_chronologically(&mut messages);

    let room_dir = match layout {
        Layout::Flat => export_root.join(&room.channel.name),
        Layout::Categorized => export_root
            .join(room.kind.dir_name())
            .join(&room.channel.name),
    };

    let mut current_name: Option<String> = None;
    let mut bucket: Vec<Message> = Vec::new();
    for mut message in messages {
        let Some(date) = timestamp::parse_date(&message.ts).context(ShardSnafu)? else {
            continue;
        };
        let filename = timestamp::day_filename(date);

        if layout == Layout::Flat && message.files.is_some() {
            message.upload = true;
        }

        if current_name.as_deref() != Some(filename.as_str()) {
            flush_bucket(&room_dir, current_name.as_deref(), &bucket)?;
            bucket.clear();
            current_name = Some(filename);
        }
        bucket.push(message);
    }
    flush_bucket(&room_dir, current_name.as_deref(), &bucket)
}

/// Writes one day bucket, creating the room directory on first use.
fn flush_bucket(
    room_dir: &Path,
    filename: Option<&str>,
    bucket: &[Message],
) -> Result<(), ExportError> {
    let Some(filename) = filename else {
        return Ok(());
    };
    if bucket.is_empty() {
        return Ok(());
    }

    fs::create_dir_all(room_dir).context(CreateDirSnafu { path: room_dir })?;
    let path = room_dir.join(filename);
    let data = to_export_json(&bucket).context(SerializeSnafu { name: filename })?;
    fs::write(&path, data).context(WriteFileSnafu { path: &path })
}

/// Exports the whole workspace into `export_root`.
///
/// Conversations and users are fetched once up front. Each classified room
/// is exported in turn when `filter` selects it (empty filter = all rooms),
/// with its name printed as a progress line. The metadata listings are
/// written last and cover every classified room whether or not the filter
/// selected it; a category with no rooms produces no listing file.
///
/// # Errors
///
/// Fails on the first remote fetch, timestamp, or filesystem failure.
pub fn run_export<S: Session>(
    session: &S,
    requester_id: &str,
    export_root: &Path,
    filter: &[String],
    layout: Layout,
    quiet: bool,
) -> Result<(), ExportError> {
    let channels =
        collect_pages(|cursor| session.list_conversations(cursor)).context(FetchSnafu)?;
    let users = collect_pages(|cursor| session.list_users(cursor)).context(FetchSnafu)?;

    let mut public = Vec::new();
    let mut private = Vec::new();
    let mut dms = Vec::new();
    let mut mpims = Vec::new();

    for channel in &channels {
        let Some(room) = classify::classify(channel, &users, requester_id) else {
            continue;
        };

        if classify::in_scope(filter, &room.channel.name) {
            if !quiet {
                eprintln!("{}", room.channel.name);
            }
            export_room(session, &room, export_root, layout)?;
        }

        match room.kind {
            RoomKind::Channel => public.push(room.channel),
            RoomKind::PrivateChannel => private.push(room.channel),
            RoomKind::DirectMessage => dms.push(room.channel),
            RoomKind::Mpim => mpims.push(room.channel),
        }
    }

    match layout {
        Layout::Categorized => {
            write_listing(export_root, "channels.json", &public)?;
            write_listing(export_root, "dms.json", &dms)?;
            write_listing(export_root, "groups.json", &private)?;
            write_listing(export_root, "mpims.json", &mpims)?;
        }
        Layout::Flat => {
            let mut merged = public;
            merged.extend(private);
            merged.extend(dms);
            merged.extend(mpims);
            write_listing(export_root, "channels.json", &merged)?;
        }
    }

    write_json(export_root, "users.json", &users)
}

/// Writes a room metadata listing, skipping categories with no rooms.
fn write_listing<T: Serialize>(
    export_root: &Path,
    name: &str,
    rooms: &[T],
) -> Result<(), ExportError> {
    if rooms.is_empty() {
        return Ok(());
    }
    write_json(export_root, name, &rooms)
}

fn write_json<T: Serialize>(export_root: &Path, name: &str, value: &T) -> Result<(), ExportError> {
    fs::create_dir_all(export_root).context(CreateDirSnafu { path: export_root })?;
    let path = export_root.join(name);
    let data = to_export_json(value).context(SerializeSnafu { name })?;
    fs::write(&path, data).context(WriteFileSnafu { path: &path })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::AuthIdentity;
    use crate::paginate::Page;
    use crate::types::{Channel, User};
    use std::collections::HashMap;

    fn message(ts: &str) -> Message {
        Message {
            kind: "message".into(),
            user: "U1".into(),
            text: format!("at {ts}"),
            ts: ts.into(),
            ..Default::default()
        }
    }

    /// Seconds-of-day 43627 (12:07:07 UTC) keeps a handful of added seconds
    /// clear of every real UTC-offset midnight, so messages a few seconds
    /// apart share a local calendar date in any timezone.
    fn ts_on_day(day: i64, extra_seconds: i64) -> String {
        format!("{}.000000", day * 86_400 + 43_627 + extra_seconds)
    }

    fn day_file(ts: &str) -> String {
        timestamp::day_filename(timestamp::parse_date(ts).unwrap().unwrap())
    }

    /// Single-page in-memory session.
    struct FakeSession {
        channels: Vec<Channel>,
        users: Vec<User>,
        history: HashMap<String, Vec<Message>>,
    }

    impl Session for FakeSession {
        fn auth_test(&self) -> Result<AuthIdentity, ApiError> {
            Ok(AuthIdentity {
                user_id: "UREQ".into(),
            })
        }

        fn list_conversations(&self, _cursor: Option<&str>) -> Result<Page<Channel>, ApiError> {
            Ok(Page {
                items: self.channels.clone(),
                next_cursor: String::new(),
                has_more: false,
            })
        }

        fn conversation_history(
            &self,
            channel: &str,
            _cursor: Option<&str>,
        ) -> Result<Page<Message>, ApiError> {
            Ok(Page {
                items: self.history.get(channel).cloned().unwrap_or_default(),
                next_cursor: String::new(),
                has_more: false,
            })
        }

        fn conversation_replies(
            &self,
            _channel: &str,
            _thread_ts: &str,
            _cursor: Option<&str>,
        ) -> Result<Page<Message>, ApiError> {
            Ok(Page {
                items: Vec::new(),
                next_cursor: String::new(),
                has_more: false,
            })
        }

        fn list_users(&self, _cursor: Option<&str>) -> Result<Page<User>, ApiError> {
            Ok(Page {
                items: self.users.clone(),
                next_cursor: String::new(),
                has_more: false,
            })
        }
    }

    fn public_room(id: &str, name: &str) -> ClassifiedRoom {
        ClassifiedRoom {
            kind: RoomKind::Channel,
            channel: Channel {
                id: id.into(),
                name: name.into(),
                is_channel: true,
                ..Default::default()
            },
        }
    }

    #[test]
    fn sorting_is_idempotent() {
        let mut messages = vec![
            message("1000.000300"),
            message("1000.000100"),
            message("1000.000200"),
        ];
        sort_chronologically(&mut messages);
        let once = messages.clone();
        sort_chronologically(&mut messages);

        assert_eq!(messages, once);
        assert_eq!(messages[0].ts, "1000.000100");
        assert_eq!(messages[2].ts, "1000.000300");
    }

    #[test]
    fn sorting_is_stable_for_equal_timestamps() {
        let mut first = message("1000.000100");
        first.text = "first".into();
        let mut second = message("1000.000100");
        second.text = "second".into();

        let mut messages = vec![message("1000.000200"), first, second];
        sort_chronologically(&mut messages);

        assert_eq!(messages[0].text, "first");
        assert_eq!(messages[1].text, "second");
        assert_eq!(messages[2].ts, "1000.000200");
    }

    #[test]
    fn shards_one_file_per_day_with_all_messages() {
        let days = [
            ts_on_day(19_700, 0),
            ts_on_day(19_700, 3),
            ts_on_day(19_703, 0),
            ts_on_day(19_706, 0),
            ts_on_day(19_706, 7),
        ];
        let session = FakeSession {
            channels: Vec::new(),
            users: Vec::new(),
            history: HashMap::from([(
                "C1".to_owned(),
                days.iter().map(|ts| message(ts)).collect(),
            )]),
        };
        let dir = tempfile::tempdir().unwrap();

        export_room(
            &session,
            &public_room("C1", "general"),
            dir.path(),
            Layout::Categorized,
        )
        .unwrap();

        let room_dir = dir.path().join("channel/general");
        let mut files: Vec<String> = fs::read_dir(&room_dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        files.sort();

        // Three distinct days, three files.
        assert_eq!(files.len(), 3);
        assert_eq!(files[0], day_file(&days[0]));
        assert_eq!(files[2], day_file(&days[4]));

        // Counts sum to the message total; concatenation in filename order
        // reproduces the sorted sequence.
        let mut concatenated = Vec::new();
        for file in &files {
            let data = fs::read(room_dir.join(file)).unwrap();
            let batch: Vec<Message> = serde_json::from_slice(&data).unwrap();
            concatenated.extend(batch);
        }
        assert_eq!(concatenated.len(), days.len());
        let timestamps: Vec<&str> = concatenated.iter().map(|m| m.ts.as_str()).collect();
        assert_eq!(timestamps, days.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn empty_room_creates_nothing() {
        let session = FakeSession {
            channels: Vec::new(),
            users: Vec::new(),
            history: HashMap::from([("C1".to_owned(), Vec::new())]),
        };
        let dir = tempfile::tempdir().unwrap();

        export_room(
            &session,
            &public_room("C1", "general"),
            dir.path(),
            Layout::Categorized,
        )
        .unwrap();

        assert!(!dir.path().join("channel").exists());
    }

    #[test]
    fn message_without_timestamp_is_skipped() {
        let mut dated = message(&ts_on_day(19_700, 0));
        dated.text = "kept".into();
        let undated = Message {
            text: "dropped".into(),
            ..Default::default()
        };

        let session = FakeSession {
            channels: Vec::new(),
            users: Vec::new(),
            history: HashMap::from([("C1".to_owned(), vec![undated, dated])]),
        };
        let dir = tempfile::tempdir().unwrap();

        export_room(
            &session,
            &public_room("C1", "general"),
            dir.path(),
            Layout::Categorized,
        )
        .unwrap();

        let room_dir = dir.path().join("channel/general");
        let files: Vec<_> = fs::read_dir(&room_dir).unwrap().collect();
        assert_eq!(files.len(), 1);

        let data = fs::read(room_dir.join(day_file(&ts_on_day(19_700, 0)))).unwrap();
        let batch: Vec<Message> = serde_json::from_slice(&data).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].text, "kept");
    }

    #[test]
    fn malformed_timestamp_is_fatal() {
        let session = FakeSession {
            channels: Vec::new(),
            users: Vec::new(),
            history: HashMap::from([("C1".to_owned(), vec![message("not-a-timestamp")])]),
        };
        let dir = tempfile::tempdir().unwrap();

        let result = export_room(
            &session,
            &public_room("C1", "general"),
            dir.path(),
            Layout::Categorized,
        );

        assert!(matches!(result, Err(ExportError::Shard { .. })));
    }

    #[test]
    fn flat_layout_drops_category_and_marks_uploads() {
        let ts = ts_on_day(19_700, 0);
        let mut with_file = message(&ts);
        with_file.files = Some(serde_json::json!([{ "id": "F1", "name": "report.pdf" }]));

        let session = FakeSession {
            channels: Vec::new(),
            users: Vec::new(),
            history: HashMap::from([("C1".to_owned(), vec![with_file, message(&ts_on_day(19_700, 3))])]),
        };
        let dir = tempfile::tempdir().unwrap();

        export_room(&session, &public_room("C1", "general"), dir.path(), Layout::Flat).unwrap();

        let room_dir = dir.path().join("general");
        assert!(room_dir.exists());
        assert!(!dir.path().join("channel").exists());

        let data = fs::read(room_dir.join(day_file(&ts))).unwrap();
        let batch: Vec<Message> = serde_json::from_slice(&data).unwrap();
        assert!(batch[0].upload);
        assert!(!batch[1].upload);
    }

    #[test]
    fn categorized_export_writes_only_populated_listings() {
        let ts = ts_on_day(19_700, 0);
        let session = FakeSession {
            channels: vec![Channel {
                id: "C1".into(),
                name: "general".into(),
                is_channel: true,
                ..Default::default()
            }],
            users: vec![User {
                id: "U1".into(),
                name: "alice".into(),
                ..Default::default()
            }],
            history: HashMap::from([("C1".to_owned(), vec![message(&ts)])]),
        };
        let dir = tempfile::tempdir().unwrap();

        run_export(&session, "UREQ", dir.path(), &[], Layout::Categorized, true).unwrap();

        assert!(dir.path().join("channels.json").exists());
        assert!(dir.path().join("users.json").exists());
        // No direct messages, groups, or mpims in this workspace.
        assert!(!dir.path().join("dms.json").exists());
        assert!(!dir.path().join("groups.json").exists());
        assert!(!dir.path().join("mpims.json").exists());
    }

    #[test]
    fn flat_export_merges_listings() {
        let ts = ts_on_day(19_700, 0);
        let session = FakeSession {
            channels: vec![
                Channel {
                    id: "C1".into(),
                    name: "general".into(),
                    is_channel: true,
                    ..Default::default()
                },
                Channel {
                    id: "D1".into(),
                    is_im: true,
                    user: "U1".into(),
                    ..Default::default()
                },
            ],
            users: vec![User {
                id: "U1".into(),
                name: "alice".into(),
                ..Default::default()
            }],
            history: HashMap::from([("C1".to_owned(), vec![message(&ts)])]),
        };
        let dir = tempfile::tempdir().unwrap();

        run_export(&session, "UREQ", dir.path(), &[], Layout::Flat, true).unwrap();

        let data = fs::read(dir.path().join("channels.json")).unwrap();
        let merged: Vec<Channel> = serde_json::from_slice(&data).unwrap();
        assert_eq!(merged.len(), 2);
        assert!(!dir.path().join("dms.json").exists());
    }
}
