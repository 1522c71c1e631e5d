//! Wagner's blind signatures over a Diffie-Hellman group.
//!
//! A signature on `y` is `y^k mod p`. The provider blinds with `g^b`,
//! which the signer's exponentiation turns into `g^(kb)`; the provider
//! removes that with the public `g^k` alone.

use crate::blind_sigs::{
    AcceptAll, BlindedMessage, RedundancyCheck, SignedBlindedMessage, UnblindedSignature,
};
use crate::error::{InvalidParameter, Result};
use crate::utils::{mod_pow, mod_pow_secret, nonzero, random_exponent};
use num_bigint::{BigInt, BigUint};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use std::fmt;
use tracing::debug;

/// Encodes `x` as the group element `int("x:" + hex(sha3_256(x))) mod p`.
///
/// The digest suffix is redundancy: a value that does not decode to
/// this shape cannot verify.
pub fn encode_message(x: &str, p: &BigUint) -> Result<BigUint> {
    nonzero(p)?;
    let digest = hex::encode(Sha3_256::digest(x.as_bytes()));
    let formatted = format!("{}:{}", x, digest);
    Ok(BigUint::from_bytes_be(formatted.as_bytes()) % p)
}

/// `(y * g^b) mod p`. A negative `b` blinds with `(g^-1)^|b|`.
pub fn blind(y: &BigUint, b: &BigInt, g: &BigUint, p: &BigUint) -> Result<BigUint> {
    let factor = mod_pow(g, b, p)?;
    Ok((y * factor) % p)
}

/// `blinded^k mod p`, computed without branching on the bits of `k`.
pub fn sign(blinded: &BigUint, k: &BigUint, p: &BigUint) -> Result<BigUint> {
    mod_pow_secret(blinded, k, p)
}

/// `(signed * g_k^-b) mod p`, i.e. strips `g^(kb)`.
pub fn unblind(signed: &BigUint, b: &BigInt, g_k: &BigUint, p: &BigUint) -> Result<BigUint> {
    let factor = mod_pow(g_k, &-b, p)?;
    Ok((signed * factor) % p)
}

/// Re-encodes `x` and checks `sig == y^k mod p`.
pub fn verify(x: &str, sig: &BigUint, k: &BigUint, p: &BigUint) -> Result<bool> {
    let y = encode_message(x, p)?;
    Ok(sig == &sign(&y, k, p)?)
}

/// Group parameters together with the signer's secret exponent.
#[derive(Clone)]
pub struct DhParams {
    p: BigUint,
    g: BigUint,
    k: BigUint,
    g_k: BigUint,
}

impl DhParams {
    /// `p` must be an odd prime.
    pub fn new(p: BigUint, g: BigUint, k: BigUint) -> Result<Self> {
        let g_k = mod_pow_secret(&g, &k, &p)?;
        Ok(Self { p, g, k, g_k })
    }

    pub fn public_params(&self) -> DhPublicParams {
        DhPublicParams {
            p: self.p.clone(),
            g: self.g.clone(),
            g_k: self.g_k.clone(),
        }
    }
}

impl fmt::Debug for DhParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DhParams")
            .field("p", &self.p)
            .field("g", &self.g)
            .field("g_k", &self.g_k)
            .finish_non_exhaustive()
    }
}

/// What the signer publishes: the group and its public key `g^k mod p`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DhPublicParams {
    p: BigUint,
    g: BigUint,
    g_k: BigUint,
}

impl DhPublicParams {
    pub fn new(p: BigUint, g: BigUint, g_k: BigUint) -> Result<Self> {
        nonzero(&p)?;
        Ok(Self { p, g, g_k })
    }

    pub fn p(&self) -> &BigUint {
        &self.p
    }

    pub fn g(&self) -> &BigUint {
        &self.g
    }

    pub fn g_k(&self) -> &BigUint {
        &self.g_k
    }
}

/// The signing party. Verification needs `k` too, so it lives here.
#[derive(Debug)]
pub struct DhBlindSigner {
    params: DhParams,
}

impl DhBlindSigner {
    pub fn public_params(&self) -> DhPublicParams {
        self.params.public_params()
    }

    pub fn sign_blinded(&self, blinded: &BlindedMessage) -> Result<SignedBlindedMessage> {
        debug!("signing blinded group element");
        let signed = sign(blinded.value(), &self.params.k, &self.params.p)?;
        Ok(SignedBlindedMessage::from(signed))
    }

    pub fn sign_direct(&self, y: &BigUint) -> Result<UnblindedSignature> {
        let signed = sign(y, &self.params.k, &self.params.p)?;
        Ok(UnblindedSignature::from(signed))
    }

    pub fn verify(&self, x: &str, sig: &UnblindedSignature) -> Result<bool> {
        debug!("verifying DH signature");
        verify(x, sig.value(), &self.params.k, &self.params.p)
    }
}

impl From<DhParams> for DhBlindSigner {
    fn from(params: DhParams) -> Self {
        Self { params }
    }
}

/// The party holding the message and the blinding exponent `b`.
#[derive(Clone, Debug)]
pub struct DhProvider<C = AcceptAll> {
    public: DhPublicParams,
    b: BigInt,
    check: C,
}

impl DhProvider<AcceptAll> {
    pub fn new(public: DhPublicParams, b: BigInt) -> Self {
        Self {
            public,
            b,
            check: AcceptAll,
        }
    }

    pub fn random<R: Rng + ?Sized>(public: DhPublicParams, rng: &mut R) -> Result<Self> {
        let b = random_exponent(&public.p, rng)?;
        Ok(Self::new(public, BigInt::from(b)))
    }
}

impl<C: RedundancyCheck> DhProvider<C> {
    pub fn with_redundancy_check<D: RedundancyCheck>(self, check: D) -> DhProvider<D> {
        DhProvider {
            public: self.public,
            b: self.b,
            check,
        }
    }

    pub fn public_params(&self) -> &DhPublicParams {
        &self.public
    }

    pub fn blinding_exponent(&self) -> &BigInt {
        &self.b
    }

    /// Encodes a message string into the group.
    pub fn prepare(&self, x: &str) -> Result<BigUint> {
        encode_message(x, &self.public.p)
    }

    pub fn blind(&self, y: &BigUint) -> Result<BlindedMessage> {
        if !self.check.check(y) {
            return Err(InvalidParameter::RedundancyCheckFailed.into());
        }
        debug!("blinding group element");
        let blinded = blind(y, &self.b, &self.public.g, &self.public.p)?;
        Ok(BlindedMessage::from(blinded))
    }

    pub fn unblind(&self, signed: &SignedBlindedMessage) -> Result<UnblindedSignature> {
        debug!("unblinding signature");
        let unblinded = unblind(signed.value(), &self.b, &self.public.g_k, &self.public.p)?;
        Ok(UnblindedSignature::from(unblinded))
    }
}
