use tabstream_api::DecodeError;

#[derive(Debug, thiserror::Error)]
pub enum DumpError {
    #[error("config ({context}): {detail}")]
    Config { context: &'static str, detail: String },

    #[error("input '{path}': {source}")]
    Input { path: String, source: std::io::Error },

    #[error("input is not a JSON array of frames: {0}")]
    Json(#[from] serde_json::Error),

    #[error("output: {0}")]
    Output(#[from] std::io::Error),

    #[error("decode: {0}")]
    Decode(#[from] DecodeError),
}
