use thiserror::Error;

pub mod cli;
pub mod increment;
pub mod logging;
pub mod page;

pub type Result<T> = anyhow::Result<T>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid increment file header")]
    InvalidIncrementHeader,
    #[error("unknown increment file header version: {0:#04x}")]
    UnknownIncrementVersion(u8),
    #[error("increment stream truncated: {context}")]
    TruncatedStream { context: String },
    #[error("increment stream has unexpected data after the last payload page")]
    UnexpectedTrailingData,
    #[error("corrupt diff map: {reason}")]
    CorruptDiffMap { reason: String },
    #[error("incremented file does not exist: {0}")]
    IncrementTargetMissing(String),
    #[error("invalid page header: {reason}")]
    InvalidPageHeader { reason: String },
    #[error("invalid lsn: {0}")]
    InvalidLsn(String),
    #[error("serialization error")]
    Serde(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("cli error: {0}")]
    Cli(String),
}

/// Entry point for the library, called by the CLI thin wrapper.
pub fn run<I, S>(args: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let cli_args = cli::parse_args(args.into_iter().map(Into::into))?;
    logging::init_logging(cli_args.logging)?;
    cli::dispatch(cli_args)
}
