// SPDX-License-Identifier: GPL-3.0-only

//! Command-line interface for slackdump.
//!
//! This binary provides the `slackdump` command for exporting a Slack
//! workspace's message history into a timestamped zip archive.

use lexopt::prelude::*;
use slackdump::api::{self, HttpSession, Session};
use slackdump::archive::{self, ArchiveError};
use slackdump::export::{self, ExportError, Layout};
use snafu::{OptionExt, prelude::*};
use std::path::PathBuf;

struct Cli {
    token: Option<String>,
    output: PathBuf,
    rooms: Vec<String>,
    mattermost: bool,
    quiet: bool,
}

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to parse arguments: {source}"))]
    ParseArgs { source: lexopt::Error },

    #[snafu(display("an API token is required (use --token or SLACK_API_TOKEN)"))]
    MissingToken,

    #[snafu(display("could not verify the token: {source}"))]
    InvalidSession { source: api::ApiError },

    #[snafu(display("failed to create output directory: {source}"))]
    CreateOutputDir { source: std::io::Error },

    #[snafu(display("failed to create working directory: {source}"))]
    CreateWorkDir { source: std::io::Error },

    #[snafu(display("export failed: {source}"))]
    Export { source: ExportError },

    #[snafu(display("archiving failed: {source}"))]
    Archive { source: ArchiveError },
}

fn print_help() {
    println!(
        "\
{name} {version}
Export a Slack workspace's message history to a zip archive

Usage: {name} [OPTIONS] [ROOM]...

Arguments:
  [ROOM]...  Room names to export history for (default: all rooms)

Options:
  -t, --token <TOKEN>    Slack API token (default: SLACK_API_TOKEN env var)
  -o, --output <DIR>     Directory to write the archive into (default: .)
  -m, --mattermost       Lay out the export for Mattermost bulk import
  -q, --quiet            Suppress progress messages
  -h, --help             Print help
  -V, --version          Print version",
        name = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
    );
}

fn parse_args() -> Result<Cli, lexopt::Error> {
    let mut token = std::env::var("SLACK_API_TOKEN").ok();
    let mut output = PathBuf::from(".");
    let mut rooms = Vec::new();
    let mut mattermost = false;
    let mut quiet = false;

    let mut parser = lexopt::Parser::from_env();
    while let Some(arg) = parser.next()? {
        match arg {
            Short('t') | Long("token") => token = Some(parser.value()?.parse()?),
            Short('o') | Long("output") => output = parser.value()?.parse()?,
            Short('m') | Long("mattermost") => mattermost = true,
            Short('q') | Long("quiet") => quiet = true,
            Short('h') | Long("help") => {
                print_help();
                std::process::exit(0);
            }
            Short('V') | Long("version") => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            Value(val) => rooms.push(val.parse()?),
            _ => return Err(arg.unexpected()),
        }
    }

    Ok(Cli {
        token,
        output,
        rooms,
        mattermost,
        quiet,
    })
}

fn main() -> Result<(), Error> {
    let cli = parse_args().context(ParseArgsSnafu)?;
    let token = cli.token.context(MissingTokenSnafu)?;

    std::fs::create_dir_all(&cli.output).context(CreateOutputDirSnafu)?;

    let session = HttpSession::new(token);
    let identity = session.auth_test().context(InvalidSessionSnafu)?;

    // The export is assembled in a throwaway directory and only the
    // finished archive lands in the output directory.
    let work_dir = tempfile::tempdir().context(CreateWorkDirSnafu)?;

    let layout = if cli.mattermost {
        Layout::Flat
    } else {
        Layout::Categorized
    };
    export::run_export(
        &session,
        &identity.user_id,
        work_dir.path(),
        &cli.rooms,
        layout,
        cli.quiet,
    )
    .context(ExportSnafu)?;

    let archive_path =
        archive::create_archive(work_dir.path(), &cli.output).context(ArchiveSnafu)?;

    if !cli.quiet {
        eprintln!("Wrote {}", archive_path.display());
    }
    Ok(())
}
