//! Error type returned by the fallible parts of the public API.

/// Failure modes exposed at the world/body boundary.
///
/// The solver and narrow phase never produce these: degenerate numeric
/// configurations (zero effective mass, parallel vectors, a near-zero
/// vector that cannot be normalized) are handled internally by falling
/// back to a safe default and logging at `debug!`/`warn!`, never by
/// propagating an error out of a running step.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("invalid state: {0}")]
    InvalidState(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
