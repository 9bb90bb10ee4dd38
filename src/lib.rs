// SPDX-License-Identifier: GPL-3.0-only

//! Export Slack workspace history to the Slack export format.
//!
//! This crate dumps the full message history of a Slack workspace — public
//! channels, private channels, group and multi-person direct messages, and
//! 1:1 direct messages — into the on-disk layout used by Slack's own export
//! feature, then packages the result as a single zip archive.
//!
//! # Pipeline
//!
//! 1. List every conversation and every user (cursor-paginated).
//! 2. Classify each conversation into an export category and resolve its
//!    display name and member list.
//! 3. For each in-scope room, fetch its complete history with thread
//!    replies inlined, order it chronologically, and shard it into one
//!    JSON file per calendar day.
//! 4. Write the room and user metadata listings.
//! 5. Zip the export tree into `slackdump-<timestamp>.zip`.
//!
//! Execution is fully sequential and fail-fast: any remote, timestamp, or
//! filesystem failure aborts the run rather than producing a partial or
//! corrupted export.
//!
//! # Modules
//!
//! - [`api`]: the authenticated session — a trait over the five Slack Web
//!   API calls the pipeline consumes, plus the blocking HTTP implementation
//! - [`archive`]: zip assembly for a finished export tree
//! - [`classify`]: room classification and name/member resolution
//! - [`export`]: history export, day sharding, and orchestration
//! - [`json`]: the export format's escaping-preserving JSON serialization
//! - [`paginate`]: cursor-based pagination and thread-reply resolution
//! - [`timestamp`]: calendar-date decoding for Slack message timestamps
//! - [`types`]: wire types for the Slack objects that survive into the export

#![deny(missing_docs)]

pub mod api;
pub mod archive;
pub mod classify;
pub mod export;
pub mod json;
pub mod paginate;
pub mod timestamp;
pub mod types;
