use crate::error::{InvalidParameter, ValidationFailure};
use crate::utils::{is_coprime, is_modular_inverse};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Prime size below which the signer checkpoint raises an advisory.
pub const DEFAULT_MIN_PRIME_BITS: u64 = 2000;

/// Tunables for the validation checkpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub min_prime_bits: u64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_prime_bits: DEFAULT_MIN_PRIME_BITS,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimeFactor {
    P,
    Q,
}

/// A non-fatal finding. Parameters that only raise advisories are still usable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Advisory {
    SmallPrime {
        factor: PrimeFactor,
        bits: u64,
        minimum: u64,
    },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SmallPrime {
                factor,
                bits,
                minimum,
            } => write!(
                f,
                "prime {:?} has {} bits, fewer than the recommended {}",
                factor, bits, minimum
            ),
        }
    }
}

/// Outcome of a checkpoint that passed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationReport {
    advisories: Vec<Advisory>,
}

impl ValidationReport {
    pub fn advisories(&self) -> &[Advisory] {
        &self.advisories
    }

    pub fn is_clean(&self) -> bool {
        self.advisories.is_empty()
    }
}

/// Signer checkpoint: structural checks over RSA key material.
///
/// Rejects `p * q != n`, `gcd(e, phi) != 1` and `e * d ≢ 1 (mod phi)`, in
/// that order. Primes shorter than `config.min_prime_bits` only produce an
/// [`Advisory`].
pub fn validate_signer_parameters(
    p: &BigUint,
    q: &BigUint,
    n: &BigUint,
    phi: &BigUint,
    e: &BigUint,
    d: &BigUint,
    config: &ValidationConfig,
) -> Result<ValidationReport, ValidationFailure> {
    if &(p * q) != n {
        return Err(ValidationFailure::signer(InvalidParameter::ModulusMismatch));
    }
    if !is_coprime(e, phi) {
        return Err(ValidationFailure::signer(
            InvalidParameter::ExponentNotCoprime,
        ));
    }
    if !is_modular_inverse(d, e, phi) {
        return Err(ValidationFailure::signer(
            InvalidParameter::NotModularInverse,
        ));
    }

    let mut report = ValidationReport::default();
    for (factor, prime) in [(PrimeFactor::P, p), (PrimeFactor::Q, q)].iter() {
        let bits = prime.bits();
        if bits < config.min_prime_bits {
            warn!(
                factor = ?factor,
                bits,
                minimum = config.min_prime_bits,
                "prime below recommended size"
            );
            let advisory = Advisory::SmallPrime {
                factor: *factor,
                bits,
                minimum: config.min_prime_bits,
            };
            report.advisories.push(advisory);
        }
    }

    Ok(report)
}

/// Provider checkpoint: the blinding factor and message must be usable under `n`.
pub fn validate_provider_parameters(
    r: &BigUint,
    msg: &BigUint,
    n: &BigUint,
) -> Result<ValidationReport, ValidationFailure> {
    if !is_coprime(r, n) {
        return Err(ValidationFailure::provider(
            InvalidParameter::BlindingFactorNotCoprime,
        ));
    }
    if msg >= n {
        return Err(ValidationFailure::provider(
            InvalidParameter::MessageNotReduced,
        ));
    }
    if !is_coprime(msg, n) {
        return Err(ValidationFailure::provider(
            InvalidParameter::MessageNotCoprime,
        ));
    }

    Ok(ValidationReport::default())
}
