use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Deserialize;

use tabstream_api::{DecodePolicy, RowCountPolicy, UnknownColumnTypePolicy};

use crate::error::DumpError;

#[derive(Parser)]
#[command(name = "tabstream-dump", about = "Decode a recorded v2 frame stream")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Decode a JSON array of frames and print the finished tables
    Decode(DecodeArgs),
}

#[derive(ValueEnum, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Header line followed by tab-separated rows
    #[default]
    Text,
    /// One JSON object per table per line
    Json,
}

#[derive(Args, Clone, Debug)]
pub struct DecodeArgs {
    /// Frames file, `-` for stdin
    #[arg(long, default_value = "-")]
    pub input: String,

    /// Path to a TOML config file
    #[arg(long, env = "TABSTREAM_DUMP_CONFIG")]
    pub config: Option<String>,

    /// Output format, overrides the config file
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Fail on column types outside the known vocabulary
    #[arg(long)]
    pub reject_unknown_types: bool,

    /// Fail when a reported row count disagrees with the rows received
    #[arg(long)]
    pub strict_row_count: bool,
}

// ---- TOML Config ----

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DumpConfig {
    pub policy: DecodePolicy,
    pub format: OutputFormat,
}

impl DumpConfig {
    pub fn load(path: &str) -> Result<Self, DumpError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DumpError::Config { context: "read", detail: format!("'{path}': {e}") })?;
        Self::parse(&content)
            .map_err(|e| DumpError::Config { context: "parse", detail: format!("'{path}': {e}") })
    }

    fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Settings after merging: config file < CLI flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Effective {
    pub policy: DecodePolicy,
    pub format: OutputFormat,
}

impl Effective {
    pub fn resolve(args: &DecodeArgs) -> Result<Self, DumpError> {
        let file = match &args.config {
            Some(path) => {
                let cfg = DumpConfig::load(path)?;
                tracing::info!(config = %path, "loaded config");
                cfg
            }
            None => DumpConfig::default(),
        };
        Ok(Self::merge(file, args))
    }

    fn merge(file: DumpConfig, args: &DecodeArgs) -> Self {
        let mut policy = file.policy;
        if args.reject_unknown_types {
            policy.unknown_column_types = UnknownColumnTypePolicy::Reject;
        }
        if args.strict_row_count {
            policy.row_count_mismatch = RowCountPolicy::Fail;
        }
        Self { policy, format: args.format.unwrap_or(file.format) }
    }
}
