use thiserror::Error;

/// Request-fatal failures of the answer pipeline.
///
/// All three classes abort the request and surface as a generic server error
/// at the HTTP boundary. No retry or fallback happens here: malformed model
/// output is absorbed earlier by classifier normalization, a failed call is
/// fatal.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("query classification failed: {0:#}")]
    Classification(#[source] anyhow::Error),

    #[error("context retrieval failed: {0:#}")]
    Retrieval(#[source] anyhow::Error),

    #[error("answer generation failed: {0:#}")]
    Generation(#[source] anyhow::Error),
}
