use thiserror::Error;

/// Failure taxonomy for portal operations. Every error is terminal for the
/// triggering action; nothing here is fatal to the process.
#[derive(Debug, Error)]
pub enum PortalError {
    /// The backing store refused a read or write. Reads degrade to empty
    /// collections before this surfaces, so it is only seen on writes.
    #[error("error accessing saved data")]
    Store(#[source] anyhow::Error),

    #[error("{0}")]
    Validation(String),

    /// Login denial. Unknown username and wrong password are deliberately
    /// indistinguishable.
    #[error("invalid username or password")]
    Auth,

    #[error("{0} not found")]
    NotFound(String),
}

pub type PortalResult<T> = Result<T, PortalError>;
