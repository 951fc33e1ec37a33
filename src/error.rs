// src/error.rs
// Central error handling for the umbra3d projector library
//
// Provides a unified ProjectorError enum with consistent categorization.

/// Centralized error type for all projector and scheduler operations
#[derive(thiserror::Error, Debug)]
pub enum ProjectorError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Collection error: {0}")]
    Collection(String),

    #[error("Pass error: {0}")]
    Pass(String),
}

impl ProjectorError {
    /// Convenience constructors for common error types
    pub fn config<T: ToString>(msg: T) -> Self {
        ProjectorError::Config(msg.to_string())
    }

    pub fn collection<T: ToString>(msg: T) -> Self {
        ProjectorError::Collection(msg.to_string())
    }

    pub fn pass<T: ToString>(msg: T) -> Self {
        ProjectorError::Pass(msg.to_string())
    }
}

/// Result type alias for projector operations
pub type ProjectorResult<T> = Result<T, ProjectorError>;
