// SPDX-License-Identifier: GPL-3.0-only

//! The authenticated Slack Web API session.
//!
//! [`Session`] is the seam between the export pipeline and the network:
//! the pipeline only ever sees the five remote operations it consumes, and
//! tests drive it with an in-memory implementation. [`HttpSession`] is the
//! real thing — a blocking client for `https://slack.com/api`.
//!
//! Rate limiting and backoff are the HTTP layer's concern and are not
//! modeled here; any failed call is fatal to the run and never retried.

use crate::paginate::Page;
use crate::types::{Channel, Message, User};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use snafu::prelude::*;

/// Largest page size the conversation listing endpoints accept.
const PAGE_LIMIT: &str = "1000";

/// Error type for remote API failures. Every variant aborts the run.
#[derive(Debug, Snafu)]
pub enum ApiError {
    /// The HTTP request failed or the response body could not be decoded.
    #[snafu(display("{method} request failed: {source}"))]
    Http {
        /// The API method that was being called.
        method: &'static str,
        /// The underlying transport or decoding error.
        source: reqwest::Error,
    },

    /// Slack answered the call with `ok: false`.
    #[snafu(display("{method} returned an error: {error}"))]
    Slack {
        /// The API method that was being called.
        method: &'static str,
        /// The error token Slack reported, e.g. `invalid_auth`.
        error: String,
    },
}

/// The requester's identity, as reported by `auth.test`.
#[derive(Debug, Clone)]
pub struct AuthIdentity {
    /// The authenticated user's id.
    pub user_id: String,
}

/// The five remote operations the export pipeline consumes.
///
/// Paginated operations take the previous page's continuation cursor
/// (`None` for the first page) and return one [`Page`].
pub trait Session {
    /// Verifies the token and returns the requester's identity.
    ///
    /// # Errors
    /// Fails when the token is invalid or the call cannot be made.
    fn auth_test(&self) -> Result<AuthIdentity, ApiError>;

    /// One page of conversations, all kinds requested.
    ///
    /// # Errors
    /// Fails when the call cannot be made or Slack reports an error.
    fn list_conversations(&self, cursor: Option<&str>) -> Result<Page<Channel>, ApiError>;

    /// One page of a conversation's top-level message history.
    ///
    /// # Errors
    /// Fails when the call cannot be made or Slack reports an error.
    fn conversation_history(
        &self,
        channel: &str,
        cursor: Option<&str>,
    ) -> Result<Page<Message>, ApiError>;

    /// One page of a thread, root message included.
    ///
    /// # Errors
    /// Fails when the call cannot be made or Slack reports an error.
    fn conversation_replies(
        &self,
        channel: &str,
        thread_ts: &str,
        cursor: Option<&str>,
    ) -> Result<Page<Message>, ApiError>;

    /// One page of the workspace user listing.
    ///
    /// # Errors
    /// Fails when the call cannot be made or Slack reports an error.
    fn list_users(&self, cursor: Option<&str>) -> Result<Page<User>, ApiError>;
}

#[derive(Deserialize, Default)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: String,
}

#[derive(Deserialize)]
struct AuthEnvelope {
    ok: bool,
    #[serde(default)]
    error: String,
    #[serde(default)]
    user_id: String,
}

#[derive(Deserialize)]
struct ConversationsEnvelope {
    ok: bool,
    #[serde(default)]
    error: String,
    #[serde(default)]
    channels: Vec<Channel>,
    #[serde(default)]
    response_metadata: ResponseMetadata,
}

#[derive(Deserialize)]
struct MessagesEnvelope {
    ok: bool,
    #[serde(default)]
    error: String,
    #[serde(default)]
    messages: Vec<Message>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    response_metadata: ResponseMetadata,
}

#[derive(Deserialize)]
struct UsersEnvelope {
    ok: bool,
    #[serde(default)]
    error: String,
    #[serde(default)]
    members: Vec<User>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

/// A blocking HTTP session authenticated with a bearer token.
pub struct HttpSession {
    client: reqwest::blocking::Client,
    token: String,
    base_url: String,
}

impl HttpSession {
    /// Creates a session for `https://slack.com/api` with the given token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, "https://slack.com/api")
    }

    /// Creates a session against an alternate base URL.
    #[must_use]
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            token: token.into(),
            base_url: base_url.into(),
        }
    }

    fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        self.client
            .get(format!("{}/{method}", self.base_url))
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .and_then(|response| response.json::<T>())
            .context(HttpSnafu { method })
    }
}

impl Session for HttpSession {
    fn auth_test(&self) -> Result<AuthIdentity, ApiError> {
        let envelope: AuthEnvelope = self.call("auth.test", &[])?;
        ensure!(
            envelope.ok,
            SlackSnafu {
                method: "auth.test",
                error: envelope.error,
            }
        );
        Ok(AuthIdentity {
            user_id: envelope.user_id,
        })
    }

    fn list_conversations(&self, cursor: Option<&str>) -> Result<Page<Channel>, ApiError> {
        let mut query = vec![
            ("types", "public_channel,private_channel,mpim,im"),
            ("limit", PAGE_LIMIT),
        ];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor));
        }

        let envelope: ConversationsEnvelope = self.call("conversations.list", &query)?;
        ensure!(
            envelope.ok,
            SlackSnafu {
                method: "conversations.list",
                error: envelope.error,
            }
        );

        let next_cursor = envelope.response_metadata.next_cursor;
        Ok(Page {
            // conversations.list signals exhaustion through the cursor alone.
            has_more: !next_cursor.is_empty(),
            items: envelope.channels,
            next_cursor,
        })
    }

    fn conversation_history(
        &self,
        channel: &str,
        cursor: Option<&str>,
    ) -> Result<Page<Message>, ApiError> {
        let mut query = vec![("channel", channel), ("limit", PAGE_LIMIT)];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor));
        }

        let envelope: MessagesEnvelope = self.call("conversations.history", &query)?;
        ensure!(
            envelope.ok,
            SlackSnafu {
                method: "conversations.history",
                error: envelope.error,
            }
        );

        Ok(Page {
            items: envelope.messages,
            next_cursor: envelope.response_metadata.next_cursor,
            has_more: envelope.has_more,
        })
    }

    fn conversation_replies(
        &self,
        channel: &str,
        thread_ts: &str,
        cursor: Option<&str>,
    ) -> Result<Page<Message>, ApiError> {
        let mut query = vec![
            ("channel", channel),
            ("ts", thread_ts),
            ("limit", PAGE_LIMIT),
        ];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor));
        }

        let envelope: MessagesEnvelope = self.call("conversations.replies", &query)?;
        ensure!(
            envelope.ok,
            SlackSnafu {
                method: "conversations.replies",
                error: envelope.error,
            }
        );

        Ok(Page {
            items: envelope.messages,
            next_cursor: envelope.response_metadata.next_cursor,
            has_more: envelope.has_more,
        })
    }

    fn list_users(&self, cursor: Option<&str>) -> Result<Page<User>, ApiError> {
        let mut query = vec![("limit", PAGE_LIMIT)];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor));
        }

        let envelope: UsersEnvelope = self.call("users.list", &query)?;
        ensure!(
            envelope.ok,
            SlackSnafu {
                method: "users.list",
                error: envelope.error,
            }
        );

        let next_cursor = envelope
            .response_metadata
            .map(|metadata| metadata.next_cursor)
            .unwrap_or_default();
        Ok(Page {
            has_more: !next_cursor.is_empty(),
            items: envelope.members,
            next_cursor,
        })
    }
}
