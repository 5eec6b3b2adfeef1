use thiserror::Error;

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("failed to access policy artifact {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt policy artifact: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unsupported artifact format version {0}")]
    UnsupportedFormat(u32),
    #[error("artifact action encoding {found:?} does not match stay/up/down/left/right")]
    EncodingMismatch { found: Vec<String> },
    #[error("invalid policy: {0}")]
    InvalidPolicy(String),
    #[error("policy trained on a {got}-cell grid, expected {expected}")]
    GridMismatch { expected: i32, got: i32 },
}
