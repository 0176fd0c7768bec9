use thiserror::Error;

/// Errors reported by the simulator's client API
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The simulator refused the handshake
    ///
    /// Usually means the simulator is not running or is still loading.
    #[error("Simulator refused the connection: {0}")]
    Refused(String),

    /// The connection was closed by either side
    ///
    /// Every call on a connection after the simulator quits, or after
    /// `close()`, fails with this error.
    #[error("Connection is closed")]
    Closed,

    /// A call on an open connection failed
    #[error("{operation} failed with code {code:#x}")]
    Call {
        /// Name of the API call that failed
        operation: &'static str,
        /// Native result code
        code: u32,
    },
}

impl ApiError {
    /// Create a call failure for the named operation
    pub fn call(operation: &'static str, code: u32) -> Self {
        Self::Call { operation, code }
    }
}

/// Type alias for results that can return an ApiError
pub type Result<T> = std::result::Result<T, ApiError>;
