pub type Result<T> = std::result::Result<T, WardenError>;

/// Struct to represent IO errors.
#[derive(Debug)]
pub struct IoErrorStruct {
    /// The type of IO error.
    error_type: String,

    /// The error message.
    msg: String,
}

/// Struct to represent a failure starting an interceptor.
#[derive(Debug)]
pub struct InterceptorErrorStruct {
    /// Which interceptor failed to start ("dns" or "stream").
    interceptor: &'static str,

    /// The error message.
    msg: String,
}

/// Enum to represent the different ways the `warden` driver can fail.
#[derive(Debug)]
pub enum WardenError {
    IoError(IoErrorStruct),
    InterceptorError(InterceptorErrorStruct),
}

impl WardenError {
    /// Wrap a DNS interceptor startup failure.
    pub fn dns_interceptor(msg: impl ToString) -> Self {
        WardenError::InterceptorError(InterceptorErrorStruct {
            interceptor: "dns",
            msg: msg.to_string(),
        })
    }

    /// Wrap a stream interceptor startup failure.
    pub fn stream_interceptor(msg: impl ToString) -> Self {
        WardenError::InterceptorError(InterceptorErrorStruct {
            interceptor: "stream",
            msg: msg.to_string(),
        })
    }
}

impl std::fmt::Display for WardenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WardenError::IoError(io_err) => {
                write!(f, "IO {} Error: {}", io_err.error_type, io_err.msg)
            }
            WardenError::InterceptorError(err) => {
                write!(f, "{} interceptor failed to start: {}", err.interceptor, err.msg)
            }
        }
    }
}

impl std::error::Error for WardenError {}

impl From<std::io::Error> for WardenError {
    fn from(error: std::io::Error) -> Self {
        WardenError::IoError(IoErrorStruct {
            error_type: error.kind().to_string(),
            msg: error.to_string(),
        })
    }
}
