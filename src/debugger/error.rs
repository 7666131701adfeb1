/// Errors surfaced to controllers. Every kind maps onto a stable wire code
/// carried by `error` events.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("frame {0} does not exist")]
    InvalidFrame(usize),
    #[error("unknown symbol `{0}`")]
    UnknownSymbol(String),
    #[error("debuggee is not paused")]
    NotPaused,
    #[error("debug session is over")]
    Terminated,
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::BadRequest(_) => "BadRequest",
            Error::InvalidFrame(_) => "InvalidFrame",
            Error::UnknownSymbol(_) => "UnknownSymbol",
            Error::NotPaused => "NotPaused",
            Error::Terminated => "Terminated",
            Error::Internal(_) => "Internal",
        }
    }

    /// Return a hint to an interface - continue the session after error or stop it.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::BadRequest(_)
            | Error::InvalidFrame(_)
            | Error::UnknownSymbol(_)
            | Error::NotPaused => false,
            Error::Terminated | Error::Internal(_) => true,
        }
    }
}

/// Transforms `Result` into `Option` and logs an error if it occurs.
#[macro_export]
macro_rules! weak_error {
    ($res: expr) => {
        match $res {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!(target: "debugger", "{:#}", e);
                None
            }
        }
    };
}
