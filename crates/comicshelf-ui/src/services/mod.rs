//! Browser-backed implementations of the client seams.

pub(crate) mod storage;
pub(crate) mod transport;
