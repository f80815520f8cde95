use thiserror::Error;

/// Failures raised by the pipeline's own components.
///
/// `Config` is fatal and aborts a run. The external-lookup variants are
/// caught per record (geocoding) or per page (extraction) and reduce to an
/// absent result.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned HTTP {status}")]
    Status {
        service: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("could not decode {service} response: {reason}")]
    Decode {
        service: &'static str,
        reason: String,
    },
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
