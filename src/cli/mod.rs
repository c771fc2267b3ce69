//! CLI front end; each engine operation is exposed as a subcommand.

use clap::{CommandFactory, Parser, Subcommand};

use crate::logging::{LogFormat, LoggingConfig};
use crate::Result;

pub mod apply;
pub mod create;
pub mod diff;
pub mod inspect;
pub mod restore;
pub mod scan;
pub mod stream;
pub mod write_pages;

#[derive(Debug, Clone)]
pub enum Command {
    Diff(diff::DiffArgs),
    Create(create::CreateArgs),
    Apply(apply::ApplyArgs),
    WritePages(write_pages::WritePagesArgs),
    RestoreMissing(restore::RestoreMissingArgs),
    Scan(scan::ScanArgs),
    Inspect(inspect::InspectArgs),
    None,
}

#[derive(Debug, Clone)]
pub struct CliArgs {
    pub command: Command,
    pub logging: LoggingConfig,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            command: Command::None,
            logging: LoggingConfig::default(),
        }
    }
}

pub fn dispatch(args: CliArgs) -> Result<()> {
    match args.command {
        Command::Diff(d) => diff::execute(d),
        Command::Create(c) => create::execute(c),
        Command::Apply(a) => apply::execute(a),
        Command::WritePages(w) => write_pages::execute(w),
        Command::RestoreMissing(r) => restore::execute(r),
        Command::Scan(s) => scan::execute(s),
        Command::Inspect(i) => inspect::execute(i),
        Command::None => Ok(()),
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "pgincr",
    version,
    about = "Block-level incremental backup for PostgreSQL page files"
)]
struct Cli {
    /// Log output format.
    #[arg(long = "log-format", value_enum, default_value = "human", global = true)]
    log_format: LogFormat,

    /// Enable debug logging (ignored when RUST_LOG is set).
    #[arg(long = "debug", default_value_t = false, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Subcommands>,
}

#[derive(Subcommand, Debug)]
enum Subcommands {
    /// Build an increment of a page file containing pages newer than an LSN.
    Diff(diff::DiffArgs),
    /// Create a new page file from a single increment.
    Create(create::CreateArgs),
    /// Patch an existing page file in place with an increment.
    Apply(apply::ApplyArgs),
    /// Write increment pages only into blocks that are still zero-filled.
    WritePages(write_pages::WritePagesArgs),
    /// Fill zero-filled blocks of a page file from a full base copy.
    RestoreMissing(restore::RestoreMissingArgs),
    /// Report which files under a data directory are eligible for increments.
    Scan(scan::ScanArgs),
    /// Print the header and diff map of an increment.
    Inspect(inspect::InspectArgs),
}

/// Parse CLI arguments into internal representation.
pub fn parse_args<I, S>(args: I) -> Result<CliArgs>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let argv: Vec<String> = args.into_iter().map(Into::into).collect();
    let cli = Cli::parse_from(argv);
    let command = match cli.command {
        Some(Subcommands::Diff(args)) => Command::Diff(args),
        Some(Subcommands::Create(args)) => Command::Create(args),
        Some(Subcommands::Apply(args)) => Command::Apply(args),
        Some(Subcommands::WritePages(args)) => Command::WritePages(args),
        Some(Subcommands::RestoreMissing(args)) => Command::RestoreMissing(args),
        Some(Subcommands::Scan(args)) => Command::Scan(args),
        Some(Subcommands::Inspect(args)) => Command::Inspect(args),
        None => Command::None,
    };

    Ok(CliArgs {
        command,
        logging: LoggingConfig {
            format: cli.log_format,
            debug: cli.debug,
        },
    })
}

/// Build the underlying clap `Command` (useful for help/usage contract tests).
pub fn clap_command() -> clap::Command {
    Cli::command()
}
