use jni::JNIEnv;
use thiserror::Error;

/// Software sensor HAL error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HalError {
    #[error("Unknown sensor handle: {0}")]
    UnknownHandle(i32),

    #[error("Sensor handle {0} already registered")]
    DuplicateHandle(i32),

    #[error("Invalid dependency: {0}")]
    InvalidDependency(String),

    #[error("Invalid pollrate: {0} ns")]
    InvalidPollrate(i64),

    #[error("Sensor {0} is not enabled")]
    NotEnabled(i32),

    #[error("Event pipe full")]
    PipeFull,

    #[error("Event pipe closed")]
    PipeClosed,

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JNI error: {0}")]
    JniError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for HAL operations
pub type HResult<T> = Result<T, HalError>;

impl From<serde_json::Error> for HalError {
    fn from(err: serde_json::Error) -> Self {
        HalError::Config(err.to_string())
    }
}

/// Java exception class a HAL error is raised as
pub fn java_exception_class(error: &HalError) -> &'static str {
    match error {
        HalError::NotEnabled(_) | HalError::PipeClosed => "java/lang/IllegalStateException",
        HalError::UnknownHandle(_)
        | HalError::DuplicateHandle(_)
        | HalError::InvalidDependency(_)
        | HalError::InvalidPollrate(_)
        | HalError::InvalidParameters(_)
        | HalError::Config(_) => "java/lang/IllegalArgumentException",
        HalError::PipeFull => "java/io/IOException",
        HalError::JniError(_) | HalError::Internal(_) => "java/lang/RuntimeException",
    }
}

/// Throw Java exception from Rust error
pub fn throw_java_exception(env: &mut JNIEnv, error: &HalError) -> HResult<()> {
    let message = error.to_string();
    env.throw_new(java_exception_class(error), message)
        .map_err(|_| HalError::JniError("Failed to throw exception".to_string()))?;

    Ok(())
}
