use thiserror::Error;

/// The rendered page never became usable.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Page still loading after settle budget: {url}")]
    StillLoading { url: String },

    #[error("Page rendered no text: {url}")]
    EmptyPage { url: String },

    #[error("Render failed for {url}: {message}")]
    Render { url: String, message: String },
}

/// Failure of a single model call.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Failed to generate content: {0}")]
    Generation(String),
}

/// Errors that escape a composition attempt. Decode failures are values, not errors.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{key} must be {expected}, got {value:?}")]
    Invalid {
        key: &'static str,
        expected: &'static str,
        value: String,
    },
}
