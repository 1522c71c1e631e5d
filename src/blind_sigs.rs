use num_bigint::BigUint;

/// A message disguised by the provider's blinding factor.
///
/// This is what crosses from the provider to the signer; the
/// signer learns nothing about the message inside.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlindedMessage {
    value: BigUint,
}

impl BlindedMessage {
    pub fn value(&self) -> &BigUint {
        &self.value
    }
}

impl From<BigUint> for BlindedMessage {
    fn from(value: BigUint) -> Self {
        Self { value }
    }
}

/// A blinded message carrying the signer's signature.
///
/// Because blinding commutes with signing, the provider can strip
/// the blinding factor and keep a signature on the original message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedBlindedMessage {
    value: BigUint,
}

impl SignedBlindedMessage {
    pub fn value(&self) -> &BigUint {
        &self.value
    }
}

impl From<BigUint> for SignedBlindedMessage {
    fn from(value: BigUint) -> Self {
        Self { value }
    }
}

/// The signature on the original message, recovered by the provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnblindedSignature {
    value: BigUint,
}

impl UnblindedSignature {
    pub fn value(&self) -> &BigUint {
        &self.value
    }

    pub fn into_inner(self) -> BigUint {
        self.value
    }
}

impl From<BigUint> for UnblindedSignature {
    fn from(value: BigUint) -> Self {
        Self { value }
    }
}

/// Format predicate applied to a message before it is blinded, and
/// again when a recovered message is verified.
///
/// Without redundancy a provider could multiply valid signatures
/// together and forge new ones.
pub trait RedundancyCheck {
    fn check(&self, msg: &BigUint) -> bool;
}

/// Accepts every message.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAll;

impl RedundancyCheck for AcceptAll {
    fn check(&self, _msg: &BigUint) -> bool {
        true
    }
}

impl<F> RedundancyCheck for F
where
    F: Fn(&BigUint) -> bool,
{
    fn check(&self, msg: &BigUint) -> bool {
        self(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_integer::Integer;

    #[test]
    fn accept_all_accepts() {
        assert!(AcceptAll.check(&BigUint::from(0u32)));
        assert!(AcceptAll.check(&BigUint::from(123_123u32)));
    }

    #[test]
    fn closures_are_checks() {
        let odd_only = |msg: &BigUint| msg.is_odd();
        assert!(odd_only.check(&BigUint::from(13u32)));
        assert!(!odd_only.check(&BigUint::from(14u32)));
    }
}
