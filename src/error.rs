use num_bigint::BigUint;
use std::fmt;
use thiserror::Error;

/// Specialisation of `std::Result`.
pub type Result<T, E = BlindSignatureError> = std::result::Result<T, E>;
pub type Error = BlindSignatureError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
/// error variants.
pub enum BlindSignatureError {
    #[error("{value} has no inverse modulo {modulus}")]
    NoInverse { value: BigUint, modulus: BigUint },

    #[error("big integer encoding failed")]
    Encoding,

    #[error("invalid parameter: {0}")]
    InvalidParameter(#[from] InvalidParameter),

    #[error("parameter validation failed: {0}")]
    Validation(#[from] ValidationFailure),
}

/// The specific invariant a parameter violates.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidParameter {
    #[error("modulus mismatch")]
    ModulusMismatch,

    #[error("exponent not coprime with totient")]
    ExponentNotCoprime,

    #[error("d is not modular inverse of e")]
    NotModularInverse,

    #[error("blinding factor not coprime with modulus")]
    BlindingFactorNotCoprime,

    #[error("message not reduced")]
    MessageNotReduced,

    #[error("message not coprime with modulus")]
    MessageNotCoprime,

    #[error("modulus is zero")]
    ZeroModulus,

    #[error("modulus too small to sample from")]
    ModulusTooSmall,

    #[error("modulus must be odd")]
    EvenModulus,

    #[error("totient too small to hold an exponent")]
    TotientTooSmall,

    #[error("message failed the redundancy check")]
    RedundancyCheckFailed,
}

/// Which validation checkpoint rejected the parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    Signer,
    Provider,
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signer => write!(f, "signer"),
            Self::Provider => write!(f, "provider"),
        }
    }
}

/// Aggregate result of a failed validator run.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{checkpoint} parameters rejected: {reason}")]
pub struct ValidationFailure {
    pub checkpoint: Checkpoint,
    pub reason: InvalidParameter,
}

impl ValidationFailure {
    pub(crate) fn signer(reason: InvalidParameter) -> Self {
        Self {
            checkpoint: Checkpoint::Signer,
            reason,
        }
    }

    pub(crate) fn provider(reason: InvalidParameter) -> Self {
        Self {
            checkpoint: Checkpoint::Provider,
            reason,
        }
    }
}
