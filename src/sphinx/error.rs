//! Error kinds for the cryptographic core, one enum per fallible component,
//! following the teacher's `SphinxError`/`MixError` thiserror convention.

use thiserror::Error;

use super::codec::CodecError;

/// Errors from Lioness pi/pi^-1, surfaced when a key or block doesn't match
/// the parameters in force.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LionessError {
    #[error("Lioness key must be {expected} bytes, got {got}")]
    KeyMismatch { expected: usize, got: usize },
    #[error("Lioness block must be {expected} bytes, got {got}")]
    BlockSizeMismatch { expected: usize, got: usize },
}

/// Errors from [`crate::sphinx::node`]'s per-hop unwrap. Each is fatal for
/// the packet and never retried.
#[derive(Debug, Error)]
pub enum UnwrapError {
    #[error("payload length does not match the configured block size")]
    BodySizeMismatch,
    #[error("alpha is not a valid group element")]
    HeaderAlphaGroupMismatch,
    #[error("replay tag already seen by this node")]
    Replay,
    #[error("MAC over beta did not match gamma")]
    IncorrectMAC,
    #[error("process command missing the zero-prefix witness or inner client command")]
    InvalidProcessDestination,
    #[error("routing byte not in {{0x00, 0xFF, 1..127}}")]
    InvalidMessageType,
    #[error(transparent)]
    Lioness(#[from] LionessError),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Errors from [`crate::sphinx::builder`] constructing forward packets or
/// SURBs.
#[derive(Debug, Error)]
pub enum BuilderError {
    #[error("route must have between 1 and {max} hops, got {got}")]
    RouteTooLong { max: usize, got: usize },
    #[error("node id {0:?} missing from the consensus map")]
    UnknownNode(Vec<u8>),
    #[error("message of {got} bytes does not fit in a {max}-byte payload")]
    MessageTooLong { got: usize, max: usize },
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Lioness(#[from] LionessError),
}

/// Errors from the nym-server glue.
#[derive(Debug, Error)]
pub enum NymServerError {
    #[error("no SURB available for nym id {0:?}")]
    NoSurbsAvailable(String),
    #[error(transparent)]
    Builder(#[from] BuilderError),
    #[error(transparent)]
    Codec(#[from] CodecError),
}
