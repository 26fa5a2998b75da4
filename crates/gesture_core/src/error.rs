use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LandmarkError {
    #[error("expected {expected} hand landmarks, got {actual}")]
    WrongCount { expected: usize, actual: usize },
    #[error("landmark needs 2 or 3 coordinates, got {0}")]
    BadArity(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("fist_threshold must be at least 1 frame")]
    ZeroFistThreshold,
    #[error("confirm_window must be at least 1 frame")]
    ZeroConfirmWindow,
    #[error("thumb reference landmark {0} is outside the 21-point hand model")]
    ThumbReferenceOutOfRange(usize),
}
