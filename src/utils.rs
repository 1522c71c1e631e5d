use crate::error::{Error, InvalidParameter, Result};
use crypto_bigint::modular::{BoxedMontyForm, BoxedMontyParams};
use crypto_bigint::{BoxedUint, Odd};
use num_bigint::{BigInt, BigUint, RandBigInt, Sign};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::Rng;
use tracing::trace;

/// Public exponents tried, in order, before falling back to random search.
pub const PREFERRED_EXPONENTS: [u32; 7] = [65537, 17, 3, 5, 7, 13, 19];

pub(crate) fn nonzero(modulus: &BigUint) -> Result<()> {
    if modulus.is_zero() {
        return Err(InvalidParameter::ZeroModulus.into());
    }
    Ok(())
}

/// Returns `x^-1 mod m` in the range `[0, m)`.
///
/// Fails with [`Error::NoInverse`] when `gcd(x, m) != 1`.
pub fn modulo_inverse(x: &BigUint, m: &BigUint) -> Result<BigUint> {
    nonzero(m)?;

    let modulus = BigInt::from(m.clone());
    let egcd = BigInt::from(x.clone()).extended_gcd(&modulus);
    if !egcd.gcd.is_one() {
        return Err(Error::NoInverse {
            value: x.clone(),
            modulus: m.clone(),
        });
    }

    // mod_floor against a positive modulus is never negative
    let (_, inverse) = egcd.x.mod_floor(&modulus).into_parts();
    Ok(inverse)
}

pub fn is_coprime(a: &BigUint, b: &BigUint) -> bool {
    a.gcd(b).is_one()
}

/// Checks `e * d ≡ 1 (mod modulus)` without recomputing the inverse.
pub fn is_modular_inverse(d: &BigUint, e: &BigUint, modulus: &BigUint) -> bool {
    if modulus.is_zero() {
        return false;
    }
    ((e * d) % modulus).is_one()
}

/// `base^exponent mod modulus`, where a negative exponent inverts the base first.
pub fn mod_pow(base: &BigUint, exponent: &BigInt, modulus: &BigUint) -> Result<BigUint> {
    nonzero(modulus)?;

    match exponent.sign() {
        Sign::Minus => {
            let inverse = modulo_inverse(base, modulus)?;
            Ok(inverse.modpow(exponent.magnitude(), modulus))
        }
        _ => Ok(base.modpow(exponent.magnitude(), modulus)),
    }
}

// Limb-aligned precision able to hold `bits` bits.
fn precision(bits: u64) -> u32 {
    (((bits + 63) / 64) * 64) as u32
}

// Left-pads to the full precision so the slice length is limb-aligned.
fn to_boxed(value: &BigUint, bits_precision: u32) -> Result<BoxedUint> {
    let bytes = value.to_bytes_be();
    let width = bits_precision as usize / 8;
    if bytes.len() > width {
        return Err(Error::Encoding);
    }
    let mut padded = vec![0u8; width - bytes.len()];
    padded.extend_from_slice(&bytes);
    BoxedUint::from_be_slice(&padded, bits_precision).map_err(|_| Error::Encoding)
}

/// `base^exponent mod modulus` for secret exponents.
///
/// Runs in Montgomery form, so timing depends on operand precision only and
/// not on the bits of `exponent`. The modulus must be odd.
pub fn mod_pow_secret(base: &BigUint, exponent: &BigUint, modulus: &BigUint) -> Result<BigUint> {
    nonzero(modulus)?;
    if modulus.is_even() {
        return Err(InvalidParameter::EvenModulus.into());
    }
    if modulus.is_one() {
        return Ok(BigUint::zero());
    }

    let bits = precision(modulus.bits());
    let odd: Option<Odd<BoxedUint>> = Odd::new(to_boxed(modulus, bits)?).into();
    let odd = odd.ok_or(InvalidParameter::EvenModulus)?;
    let params = BoxedMontyParams::new(odd);

    let base = to_boxed(&(base % modulus), bits)?;
    let exponent = to_boxed(exponent, bits.max(precision(exponent.bits())))?;
    let result = BoxedMontyForm::new(base, params).pow(&exponent).retrieve();

    Ok(BigUint::from_bytes_be(&result.to_be_bytes()))
}

/// Picks a public exponent coprime with `phi`.
///
/// The first entry of [`PREFERRED_EXPONENTS`] with `1 < e < phi` and
/// `gcd(e, phi) = 1` wins. Otherwise candidates are drawn uniformly from
/// `[2, phi - 1]` until one is coprime, so that path depends on `rng`.
pub fn find_coprime_exponent<R: Rng + ?Sized>(phi: &BigUint, rng: &mut R) -> Result<BigUint> {
    let one = BigUint::one();
    for candidate in PREFERRED_EXPONENTS.iter().map(|&e| BigUint::from(e)) {
        if candidate > one && &candidate < phi && is_coprime(&candidate, phi) {
            return Ok(candidate);
        }
    }

    let low = BigUint::from(2u32);
    if phi <= &low {
        return Err(InvalidParameter::TotientTooSmall.into());
    }

    // phi - 1 is always coprime with phi, so this terminates
    loop {
        let candidate = rng.gen_biguint_range(&low, phi);
        if is_coprime(&candidate, phi) {
            return Ok(candidate);
        }
        trace!("sampled exponent shares a factor with phi, retrying");
    }
}

/// Draws an RSA blinding factor `r` in `[2, n - 1]` with `gcd(r, n) = 1`.
pub fn random_blinding_factor<R: Rng + ?Sized>(n: &BigUint, rng: &mut R) -> Result<BigUint> {
    let low = BigUint::from(2u32);
    if n <= &low {
        return Err(InvalidParameter::ModulusTooSmall.into());
    }

    loop {
        let candidate = rng.gen_biguint_range(&low, n);
        if is_coprime(&candidate, n) {
            return Ok(candidate);
        }
    }
}

/// Draws a DH blinding exponent in `[1, p - 1)`.
pub fn random_exponent<R: Rng + ?Sized>(p: &BigUint, rng: &mut R) -> Result<BigUint> {
    let low = BigUint::one();
    if p <= &BigUint::from(2u32) {
        return Err(InvalidParameter::ModulusTooSmall.into());
    }
    Ok(rng.gen_biguint_range(&low, &(p - 1u32)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn big(v: u64) -> BigUint {
        BigUint::from(v)
    }

    #[test]
    fn inverse_round_trips() -> Result<()> {
        let m = big(3120);
        for x in [17u64, 7, 11, 2753, 3119].iter() {
            let inv = modulo_inverse(&big(*x), &m)?;
            assert!(inv < m);
            assert_eq!((big(*x) * inv) % &m, big(1));
        }
        assert_eq!(modulo_inverse(&big(3), &big(40))?, big(27));
        Ok(())
    }

    #[test]
    fn inverse_reduces_large_input() -> Result<()> {
        // 43 ≡ 3 (mod 40)
        assert_eq!(modulo_inverse(&big(43), &big(40))?, big(27));
        Ok(())
    }

    #[test]
    fn no_inverse_when_not_coprime() {
        let result = modulo_inverse(&big(4), &big(8));
        assert_eq!(
            result,
            Err(Error::NoInverse {
                value: big(4),
                modulus: big(8),
            })
        );
    }

    #[test]
    fn inverse_rejects_zero_modulus() {
        assert_eq!(
            modulo_inverse(&big(3), &BigUint::zero()),
            Err(Error::InvalidParameter(InvalidParameter::ZeroModulus))
        );
    }

    #[test]
    fn coprimality() {
        assert!(is_coprime(&big(3), &big(40)));
        assert!(!is_coprime(&big(4), &big(40)));
        assert!(is_coprime(&big(1), &big(40)));
    }

    #[test]
    fn modular_inverse_check() {
        assert!(is_modular_inverse(&big(27), &big(3), &big(40)));
        assert!(!is_modular_inverse(&big(26), &big(3), &big(40)));
        assert!(!is_modular_inverse(&big(27), &big(3), &BigUint::zero()));
    }

    #[test]
    fn negative_exponent_inverts_base() -> Result<()> {
        let p = big(23);
        let g = big(5);
        let forward = mod_pow(&g, &BigInt::from(7), &p)?;
        let backward = mod_pow(&g, &BigInt::from(-7), &p)?;
        assert_eq!((forward * backward) % &p, big(1));
        assert_eq!(mod_pow(&g, &BigInt::from(0), &p)?, big(1));
        Ok(())
    }

    #[test]
    fn negative_exponent_needs_inverse() {
        let result = mod_pow(&big(6), &BigInt::from(-1), &big(9));
        assert!(matches!(result, Err(Error::NoInverse { .. })));
    }

    #[test]
    fn secret_exponentiation_matches_modpow() -> Result<()> {
        let mersenne = (big(1) << 127usize) - 1u32;
        let cases = [
            (big(7), big(27), big(55)),
            (big(13), big(27), big(55)),
            (big(2), big(123_142), big(7)),
            (big(0), big(5), big(23)),
            (big(5), big(0), big(23)),
            (big(3), big(0xdead_beef_cafe_babe), mersenne.clone()),
            // base and exponent wider than the modulus
            (&mersenne * 3u32, &mersenne * &mersenne, big(7907 * 7919)),
        ];
        for (base, exponent, modulus) in cases.iter() {
            assert_eq!(
                mod_pow_secret(base, exponent, modulus)?,
                base.modpow(exponent, modulus)
            );
        }
        assert_eq!(mod_pow_secret(&big(5), &big(3), &big(1))?, BigUint::zero());
        Ok(())
    }

    #[test]
    fn secret_exponentiation_needs_odd_modulus() {
        assert_eq!(
            mod_pow_secret(&big(3), &big(5), &big(40)),
            Err(Error::InvalidParameter(InvalidParameter::EvenModulus))
        );
        assert_eq!(
            mod_pow_secret(&big(3), &big(5), &BigUint::zero()),
            Err(Error::InvalidParameter(InvalidParameter::ZeroModulus))
        );
    }

    #[test]
    fn preferred_exponents_come_first() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(7);
        // 7906 * 7918 from two primes, 65537 is coprime
        assert_eq!(
            find_coprime_exponent(&big(7906 * 7918), &mut rng)?,
            big(65537)
        );
        // 65537 > 40, so 17 is next
        assert_eq!(find_coprime_exponent(&big(40), &mut rng)?, big(17));
        // 17 divides 2 * 3 * 17, and 3 does too, 5 does not
        assert_eq!(find_coprime_exponent(&big(102), &mut rng)?, big(5));
        Ok(())
    }

    #[test]
    fn fallback_samples_coprime_exponent() -> Result<()> {
        // none of the preferred exponents fits below 3, the only candidate is 2
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(find_coprime_exponent(&big(3), &mut rng)?, big(2));

        // every preferred exponent divides phi
        let phi = big(2 * 3 * 5 * 7 * 13 * 17 * 19 * 65537);
        let e = find_coprime_exponent(&phi, &mut rng)?;
        assert!(e >= big(2) && e < phi);
        assert!(is_coprime(&e, &phi));
        Ok(())
    }

    #[test]
    fn tiny_totient_has_no_exponent() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            find_coprime_exponent(&big(2), &mut rng),
            Err(Error::InvalidParameter(InvalidParameter::TotientTooSmall))
        );
    }

    #[test]
    fn blinding_factors_are_coprime() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(42);
        let n = big(55);
        for _ in 0..32 {
            let r = random_blinding_factor(&n, &mut rng)?;
            assert!(r >= big(2) && r < n);
            assert!(is_coprime(&r, &n));
        }
        assert!(random_blinding_factor(&big(2), &mut rng).is_err());
        Ok(())
    }

    #[test]
    fn exponents_stay_in_range() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(42);
        let p = big(23);
        for _ in 0..32 {
            let b = random_exponent(&p, &mut rng)?;
            assert!(b >= big(1) && b < big(22));
        }
        Ok(())
    }
}
