//! µTPM error taxonomy
//!
//! Mirrors `TpmError`'s shape (plain `Debug`/`Clone`/`Copy`/`PartialEq` enum,
//! no `std::error::Error`, because this crate stays `no_std`) with a
//! hand-written `Display` impl added on top.

use core::fmt;

/// Every operation returns a status; there is no cross-operation recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Null or structurally impossible inputs.
    BadParam,
    /// PCR index ≥ `PCR_COUNT`.
    PcrOutOfRange,
    /// RNG could not supply the requested number of bytes.
    InsufficientEntropy,
    /// Sealed blob has inconsistent length or a selection that cannot be
    /// satisfied by the PCR bank (e.g. `sizeOfSelect` beyond `PCR_COUNT`).
    Malformed,
    /// MAC check failed on unseal; no plaintext is exposed.
    IntegrityFailure,
    /// Unseal policy not satisfied by the current PCR state.
    PcrMismatch,
    /// Caller's output buffer is too small; carries the required size.
    OutputTooSmall { required: usize },
    /// Inconsistency detected after partial work. Should be unreachable.
    Internal,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BadParam => write!(f, "bad parameter"),
            Error::PcrOutOfRange => write!(f, "PCR index out of range"),
            Error::InsufficientEntropy => write!(f, "RNG short-returned requested entropy"),
            Error::Malformed => write!(f, "malformed structure"),
            Error::IntegrityFailure => write!(f, "HMAC integrity check failed"),
            Error::PcrMismatch => write!(f, "PCR release policy not satisfied"),
            Error::OutputTooSmall { required } => {
                write!(f, "output buffer too small, need {required} bytes")
            }
            Error::Internal => write!(f, "internal inconsistency"),
        }
    }
}

pub type Result<T> = core::result::Result<T, Error>;
