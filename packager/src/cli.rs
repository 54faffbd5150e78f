//! CLI argument definitions for `jobpack`.
//!
//! Kept apart from the entrypoint so argument parsing can be tested without
//! running any pipeline step.

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use jobpack::Property;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "jobpack.toml";

/// Package, upload, and release versioned job bundles.
#[derive(Parser, Debug, Clone)]
#[command(name = "jobpack")]
#[command(version, about)]
#[command(long_about = concat!(
    "Package, upload, and release versioned job bundles.\n\n",
    "`package` installs the declared dependencies and zips them together with ",
    "the source and scripts trees. `upload` stores the bundle under a versioned ",
    "key and `release` copies that version to the stable release key.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Build the bundle for the project in the current directory:\n",
    "    $ jobpack package\n\n",
    "  Package and upload, overriding the bucket:\n",
    "    $ jobpack -D s3.bucket_name=my-jobs publish\n\n",
    "  Promote the current version to latest:\n",
    "    $ jobpack release\n\n",
    "Credentials are read from AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY and\n",
    "AWS_SESSION_TOKEN. Set JOBPACK_LOG to override the log filter.",
))]
pub struct Cli {
    /// Step to run.
    #[command(subcommand)]
    pub command: Command,

    /// Project configuration file.
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = DEFAULT_CONFIG_FILE,
        global = true
    )]
    pub config: Utf8PathBuf,

    /// Override a configuration value (repeatable).
    #[arg(short = 'D', long = "property", value_name = "KEY=VALUE", global = true)]
    pub properties: Vec<Property>,

    /// Increase log verbosity (repeatable: -v, -vv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet",
        global = true
    )]
    pub verbosity: u8,

    /// Only report errors.
    #[arg(short, long, conflicts_with = "verbosity", global = true)]
    pub quiet: bool,
}

/// Pipeline steps.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Install dependencies and assemble the bundle.
    Package,
    /// Upload a packaged bundle under its versioned keys.
    Upload,
    /// Package, then upload.
    Publish,
    /// Copy the uploaded version to the release keys.
    Release,
}

impl Command {
    /// Whether the step talks to the object store.
    #[must_use]
    pub fn needs_store(self) -> bool {
        !matches!(self, Self::Package)
    }
}

impl Cli {
    /// The configuration file path.
    #[must_use]
    pub fn config_path(&self) -> &Utf8Path {
        &self.config
    }

    /// The default log filter implied by `-v` and `-q`.
    #[must_use]
    pub fn log_level(&self) -> &'static str {
        match (self.quiet, self.verbosity) {
            (true, _) => "error",
            (false, 0) => "info",
            (false, 1) => "debug",
            (false, _) => "trace",
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
