//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Mirror Blackboard courses behind CAS sign-on into a local vault.
///
/// Each content section becomes a directory holding a `section.json`
/// description and the section's attachments.
#[derive(Parser, Debug)]
#[command(name = "bb-vault")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: <config dir>/bb-vault/config.toml)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Portal account name; overrides the config and the stored account
    #[arg(short, long, global = true)]
    pub username: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in through CAS and store the session
    Login,

    /// Drop the stored session and saved credentials
    Logout,

    /// List enrolled courses grouped by term
    Courses {
        /// Only show this term (e.g. 24fall); repeatable
        #[arg(short, long = "term", value_name = "TERM")]
        terms: Vec<String>,

        /// Include the latest announcement of each course
        #[arg(short, long)]
        announcements: bool,

        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },

    /// Crawl terms into the vault (all terms when none are given)
    Crawl {
        /// Term ids to crawl, e.g. 24fall 25spring
        #[arg(value_name = "TERM")]
        terms: Vec<String>,

        /// Vault root directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Maximum concurrent downloads (1-32)
        #[arg(short = 'c', long, value_parser = clap::value_parser!(u8).range(1..=32))]
        concurrency: Option<u8>,

        /// Download once per course instead of after every page
        #[arg(long)]
        per_course: bool,

        /// Remove each term directory before crawling it
        #[arg(long)]
        clean: bool,
    },
}
