// SPDX-License-Identifier: GPL-3.0-only

//! Cursor-based pagination over the remote API.
//!
//! Slack's listing endpoints return one page at a time together with a
//! continuation cursor. [`collect_pages`] folds any such operation into a
//! single finished collection; [`fetch_history`] layers the thread-reply
//! resolution policy on top of it for message history.

use crate::api::{ApiError, Session};
use crate::types::{Message, Reply};

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// The items on this page, in the order the remote returned them.
    pub items: Vec<T>,

    /// Continuation cursor for the next page. Empty when exhausted.
    pub next_cursor: String,

    /// Whether the remote reports further pages.
    pub has_more: bool,
}

/// Folds a page-fetching operation into a single collection.
///
/// `fetch` is invoked with `None` first, then with each continuation
/// cursor, until the remote reports no more pages or hands back an empty
/// cursor. Page order and within-page order are preserved. The accumulator
/// is local to the fold: callers never observe a partially filled
/// collection.
///
/// # Errors
///
/// The first failed fetch aborts the fold and its error is returned as-is.
pub fn collect_pages<T, E>(
    mut fetch: impl FnMut(Option<&str>) -> Result<Page<T>, E>,
) -> Result<Vec<T>, E> {
    let mut items = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = fetch(cursor.as_deref())?;
        items.extend(page.items);
        if !page.has_more || page.next_cursor.is_empty() {
            return Ok(items);
        }
        cursor = Some(page.next_cursor);
    }
}

/// Fetches a conversation's complete message history with threads inlined.
///
/// A message with a nonzero reply count has its full thread resolved the
/// moment its history page is processed — before the message is considered
/// final for sorting and bucketing — so later stages never see a root whose
/// replies are still outstanding. Each non-root reply is recorded twice on
/// purpose: as a [`Reply`] summary on its root and as an independent
/// message in the returned collection, matching the export format.
///
/// # Errors
///
/// Any failed history page or thread fetch aborts the whole fetch.
pub fn fetch_history<S: Session>(
    session: &S,
    channel_id: &str,
) -> Result<Vec<Message>, ApiError> {
    let mut messages = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = session.conversation_history(channel_id, cursor.as_deref())?;
        for message in page.items {
            append_with_thread(session, channel_id, message, &mut messages)?;
        }
        if !page.has_more || page.next_cursor.is_empty() {
            return Ok(messages);
        }
        cursor = Some(page.next_cursor);
    }
}

/// Resolves a message's thread (if it has one) and appends the message and
/// its replies to `out`.
///
/// Non-root replies are identified by timestamp rather than position, so a
/// reply page that happens to repeat the root can never duplicate it.
fn append_with_thread<S: Session>(
    session: &S,
    channel_id: &str,
    mut root: Message,
    out: &mut Vec<Message>,
) -> Result<(), ApiError> {
    if root.reply_count == 0 {
        out.push(root);
        return Ok(());
    }

    let thread_ts = if root.thread_ts.is_empty() {
        root.ts.clone()
    } else {
        root.thread_ts.clone()
    };
    let thread = collect_pages(|cursor| {
        session.conversation_replies(channel_id, &thread_ts, cursor)
    })?;

    let replies: Vec<Message> = thread
        .into_iter()
        .filter(|message| message.ts != root.ts)
        .collect();
    root.replies = replies
        .iter()
        .map(|message| Reply {
            user: message.user.clone(),
            ts: message.ts.clone(),
        })
        .collect();

    out.push(root);
    out.extend(replies);
    Ok(())
}
