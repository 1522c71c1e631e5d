mod blind_sigs;
pub mod dh;
mod error;
pub mod rsa;
mod utils;
mod validate;

pub use crate::blind_sigs::{
    AcceptAll, BlindedMessage, RedundancyCheck, SignedBlindedMessage, UnblindedSignature,
};
pub use crate::dh::{DhBlindSigner, DhParams, DhProvider, DhPublicParams};
pub use crate::error::{
    BlindSignatureError, Checkpoint, Error, InvalidParameter, Result, ValidationFailure,
};
pub use crate::rsa::{RsaBlindSigner, RsaProvider, RsaPublicKey, SignerKeyMaterial};
pub use crate::utils::{
    find_coprime_exponent, is_coprime, is_modular_inverse, mod_pow, mod_pow_secret,
    modulo_inverse, random_blinding_factor, random_exponent, PREFERRED_EXPONENTS,
};
pub use crate::validate::{
    validate_provider_parameters, validate_signer_parameters, Advisory, PrimeFactor,
    ValidationConfig, ValidationReport, DEFAULT_MIN_PRIME_BITS,
};
