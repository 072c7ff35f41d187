/// Status-resolution errors.
///
/// These never escape the resolver — they only route a query to the
/// synthetic fallback.
#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    #[error("upstream request timed out")]
    Timeout,

    #[error("upstream returned HTTP {0}")]
    HttpStatus(u16),

    #[error("upstream returned an empty payload")]
    EmptyPayload,

    #[error("upstream payload malformed: {0}")]
    Malformed(String),

    #[error("upstream request failed: {0}")]
    Request(#[from] reqwest::Error),
}
