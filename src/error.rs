use thiserror::Error;

/// Errors returned by playback commands
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaybackError {
    /// The call was rejected and no state was changed
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("playback driver has stopped")]
    Stopped,
}

/// Errors found while turning payload records into a route
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
    #[error("record {index} is malformed: {reason}")]
    Malformed { index: usize, reason: String },
}
