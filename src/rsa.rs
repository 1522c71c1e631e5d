//! Chaum's blind signatures over RSA.
//!
//! The provider blinds `msg` as `msg * r^e mod n`. Signing with `d` turns
//! `r^e` into `r`, which the provider divides back out, leaving
//! `msg^d mod n` without the signer ever seeing `msg`.

use crate::blind_sigs::{
    AcceptAll, BlindedMessage, RedundancyCheck, SignedBlindedMessage, UnblindedSignature,
};
use crate::error::{InvalidParameter, Result, ValidationFailure};
use crate::utils::{
    find_coprime_exponent, is_coprime, mod_pow_secret, modulo_inverse, nonzero,
    random_blinding_factor,
};
use crate::validate::{
    validate_provider_parameters, validate_signer_parameters, Advisory, ValidationConfig,
    ValidationReport,
};
use num_bigint::BigUint;
use num_traits::One;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// `(msg * r^e) mod n`
pub fn blind(msg: &BigUint, r: &BigUint, e: &BigUint, n: &BigUint) -> Result<BigUint> {
    nonzero(n)?;
    Ok((msg * r.modpow(e, n)) % n)
}

/// `blinded^d mod n`, computed without branching on the bits of `d`.
pub fn sign(blinded: &BigUint, d: &BigUint, n: &BigUint) -> Result<BigUint> {
    mod_pow_secret(blinded, d, n)
}

/// `(signed * r^-1) mod n`
pub fn unblind(signed: &BigUint, r: &BigUint, n: &BigUint) -> Result<BigUint> {
    let r_inv = modulo_inverse(r, n)?;
    Ok((signed * r_inv) % n)
}

/// `candidate^e mod n`. The caller compares the result with the message.
pub fn verify(candidate: &BigUint, e: &BigUint, n: &BigUint) -> Result<BigUint> {
    nonzero(n)?;
    Ok(candidate.modpow(e, n))
}

/// The signer's RSA key. Only `n` and `e` ever leave it, through
/// [`SignerKeyMaterial::public_key`].
#[derive(Clone)]
pub struct SignerKeyMaterial {
    p: BigUint,
    q: BigUint,
    n: BigUint,
    phi: BigUint,
    e: BigUint,
    d: BigUint,
    report: ValidationReport,
}

impl SignerKeyMaterial {
    /// Accepts externally generated key material once it passes the
    /// signer checkpoint.
    pub fn from_parts(
        p: BigUint,
        q: BigUint,
        n: BigUint,
        phi: BigUint,
        e: BigUint,
        d: BigUint,
        config: &ValidationConfig,
    ) -> Result<Self> {
        let report = validate_signer_parameters(&p, &q, &n, &phi, &e, &d, config)?;
        info!(
            modulus_bits = n.bits(),
            advisories = report.advisories().len(),
            "signer key material accepted"
        );
        Ok(Self {
            p,
            q,
            n,
            phi,
            e,
            d,
            report,
        })
    }

    /// Derives `n`, `phi` and `d` from two primes and a chosen public exponent.
    pub fn with_exponent(
        p: BigUint,
        q: BigUint,
        e: BigUint,
        config: &ValidationConfig,
    ) -> Result<Self> {
        let phi = totient(&p, &q)?;
        if !is_coprime(&e, &phi) {
            return Err(ValidationFailure::signer(InvalidParameter::ExponentNotCoprime).into());
        }
        let d = modulo_inverse(&e, &phi)?;
        let n = &p * &q;
        Self::from_parts(p, q, n, phi, e, d, config)
    }

    /// Derives a full key from two primes, picking `e` with
    /// [`find_coprime_exponent`].
    pub fn from_primes<R: Rng + ?Sized>(
        p: BigUint,
        q: BigUint,
        rng: &mut R,
        config: &ValidationConfig,
    ) -> Result<Self> {
        let phi = totient(&p, &q)?;
        let e = find_coprime_exponent(&phi, rng)?;
        Self::with_exponent(p, q, e, config)
    }

    pub fn public_key(&self) -> RsaPublicKey {
        RsaPublicKey {
            n: self.n.clone(),
            e: self.e.clone(),
        }
    }

    pub fn advisories(&self) -> &[Advisory] {
        self.report.advisories()
    }

    /// Re-runs the signer checkpoint, e.g. under a stricter `config`.
    pub fn revalidate(
        &self,
        config: &ValidationConfig,
    ) -> Result<ValidationReport, ValidationFailure> {
        validate_signer_parameters(&self.p, &self.q, &self.n, &self.phi, &self.e, &self.d, config)
    }
}

fn totient(p: &BigUint, q: &BigUint) -> Result<BigUint> {
    let one = BigUint::one();
    if p <= &one || q <= &one {
        return Err(InvalidParameter::ModulusTooSmall.into());
    }
    Ok((p - 1u32) * (q - 1u32))
}

impl fmt::Debug for SignerKeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignerKeyMaterial")
            .field("n", &self.n)
            .field("e", &self.e)
            .finish_non_exhaustive()
    }
}

/// The signer's published verification key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsaPublicKey {
    n: BigUint,
    e: BigUint,
}

impl RsaPublicKey {
    pub fn new(n: BigUint, e: BigUint) -> Result<Self> {
        nonzero(&n)?;
        Ok(Self { n, e })
    }

    pub fn n(&self) -> &BigUint {
        &self.n
    }

    pub fn e(&self) -> &BigUint {
        &self.e
    }

    /// Applies the public exponent, recovering the signed message.
    pub fn recover(&self, sig: &UnblindedSignature) -> Result<BigUint> {
        verify(sig.value(), &self.e, &self.n)
    }

    pub fn verify(&self, sig: &UnblindedSignature, msg: &BigUint) -> Result<bool> {
        self.verify_with(sig, msg, &AcceptAll)
    }

    /// Checks `sig^e mod n == msg` and that the recovered message passes `check`.
    pub fn verify_with<C: RedundancyCheck + ?Sized>(
        &self,
        sig: &UnblindedSignature,
        msg: &BigUint,
        check: &C,
    ) -> Result<bool> {
        let recovered = self.recover(sig)?;
        debug!("verifying RSA signature");
        Ok(&recovered == msg && check.check(&recovered))
    }
}

/// Represents the party that signs blinded messages
/// without learning what is inside them.
#[derive(Debug)]
pub struct RsaBlindSigner {
    key: SignerKeyMaterial,
}

impl RsaBlindSigner {
    pub fn public_key(&self) -> RsaPublicKey {
        self.key.public_key()
    }

    pub fn sign_blinded(&self, blinded: &BlindedMessage) -> Result<SignedBlindedMessage> {
        debug!("signing blinded message");
        let signed = sign(blinded.value(), &self.key.d, &self.key.n)?;
        Ok(SignedBlindedMessage::from(signed))
    }

    /// Signs `msg` in the clear. Yields the same value the provider
    /// obtains by unblinding.
    pub fn sign_direct(&self, msg: &BigUint) -> Result<UnblindedSignature> {
        let signed = sign(msg, &self.key.d, &self.key.n)?;
        Ok(UnblindedSignature::from(signed))
    }
}

impl From<SignerKeyMaterial> for RsaBlindSigner {
    fn from(key: SignerKeyMaterial) -> Self {
        Self { key }
    }
}

/// Represents the party that owns the message and the blinding factor.
#[derive(Clone, Debug)]
pub struct RsaProvider<C = AcceptAll> {
    pk: RsaPublicKey,
    r: BigUint,
    check: C,
}

impl RsaProvider<AcceptAll> {
    pub fn new(pk: RsaPublicKey, r: BigUint) -> Result<Self> {
        if !is_coprime(&r, &pk.n) {
            return Err(
                ValidationFailure::provider(InvalidParameter::BlindingFactorNotCoprime).into(),
            );
        }
        Ok(Self {
            pk,
            r,
            check: AcceptAll,
        })
    }

    pub fn random<R: Rng + ?Sized>(pk: RsaPublicKey, rng: &mut R) -> Result<Self> {
        let r = random_blinding_factor(&pk.n, rng)?;
        Self::new(pk, r)
    }
}

impl<C: RedundancyCheck> RsaProvider<C> {
    pub fn with_redundancy_check<D: RedundancyCheck>(self, check: D) -> RsaProvider<D> {
        RsaProvider {
            pk: self.pk,
            r: self.r,
            check,
        }
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.pk
    }

    pub fn blinding_factor(&self) -> &BigUint {
        &self.r
    }

    /// Runs the provider checkpoint and the redundancy check, then blinds `msg`.
    pub fn blind(&self, msg: &BigUint) -> Result<BlindedMessage> {
        validate_provider_parameters(&self.r, msg, &self.pk.n)?;
        if !self.check.check(msg) {
            return Err(InvalidParameter::RedundancyCheckFailed.into());
        }
        debug!("blinding message");
        let blinded = blind(msg, &self.r, &self.pk.e, &self.pk.n)?;
        Ok(BlindedMessage::from(blinded))
    }

    pub fn unblind(&self, signed: &SignedBlindedMessage) -> Result<UnblindedSignature> {
        debug!("unblinding signature");
        let unblinded = unblind(signed.value(), &self.r, &self.pk.n)?;
        Ok(UnblindedSignature::from(unblinded))
    }

    pub fn verify(&self, sig: &UnblindedSignature, msg: &BigUint) -> Result<bool> {
        self.pk.verify_with(sig, msg, &self.check)
    }
}
