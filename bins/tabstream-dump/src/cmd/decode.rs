use std::io::Write;

use futures::StreamExt;
use serde_json::Value as Json;
use tabstream_api::DecodeError;
use tabstream_engine::decode_stream;
use tokio::io::AsyncReadExt;

use super::render;
use crate::config::{DecodeArgs, Effective, OutputFormat};
use crate::error::DumpError;

/// How a dataset that decoded without structural errors ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Clean,
    /// The service reported errors in `DataSetCompletion`.
    DataSetErrors,
}

impl Outcome {
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Clean => 0,
            Outcome::DataSetErrors => 2,
        }
    }
}

pub async fn run(args: DecodeArgs) -> Result<Outcome, DumpError> {
    let effective = Effective::resolve(&args)?;
    let frames = read_frames(&args.input).await?;
    tracing::info!(input = %args.input, frames = frames.len(), "read frames");

    let mut stdout = std::io::stdout();
    dump(frames, effective, &mut stdout).await
}

async fn read_frames(input: &str) -> Result<Vec<Json>, DumpError> {
    let content = if input == "-" {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .map_err(|source| DumpError::Input { path: input.into(), source })?;
        buf
    } else {
        tokio::fs::read_to_string(input)
            .await
            .map_err(|source| DumpError::Input { path: input.into(), source })?
    };
    Ok(serde_json::from_str(&content)?)
}

/// Decode `frames` and write each table to `out` as soon as it finishes.
async fn dump<W: Write>(
    frames: Vec<Json>,
    effective: Effective,
    out: &mut W,
) -> Result<Outcome, DumpError> {
    let mut tables = decode_stream(futures::stream::iter(frames), effective.policy);

    while let Some(table) = tables.next().await {
        let table = table?;
        tracing::debug!(table = table.table.id, rows = table.table.row_count(), "printing table");
        match effective.format {
            OutputFormat::Text => render::text_table(out, &table)?,
            OutputFormat::Json => writeln!(out, "{}", render::json_table(&table))?,
        }
    }

    let sequencer = tables.sequencer();
    let completion = sequencer.completion().ok_or(DecodeError::TruncatedStream)?;
    let summary = render::Summary {
        completion,
        warnings: sequencer.warnings(),
        frames: sequencer.frames_seen(),
    };
    match effective.format {
        OutputFormat::Text => render::text_completion(out, &summary)?,
        OutputFormat::Json => writeln!(out, "{}", render::json_completion(&summary))?,
    }
    out.flush()?;

    if let Some(Err(e)) = sequencer.status() {
        tracing::warn!(error = %e, "dataset completed with errors");
        return Ok(Outcome::DataSetErrors);
    }
    if !completion.is_clean() {
        tracing::warn!("dataset was cancelled without reporting errors");
    }
    Ok(Outcome::Clean)
}
