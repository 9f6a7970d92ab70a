//! Key material for the oracle's side of the protocol. The attack never
//! touches the private half; it exists for local servers and test fixtures.

use num_bigint::{BigUint, RandBigInt};
use num_traits::One;
use rand::Rng;

/// Public exponent used for generated keys.
pub const PUBLIC_EXPONENT: u32 = 65_537;

/// Miller-Rabin probabilistic primality test.
pub fn is_probably_prime<R: Rng + ?Sized>(n: &BigUint, rounds: u32, rng: &mut R) -> bool {
    let one = BigUint::one();
    let two = &one + &one;
    let three = &two + &one;

    if *n < two {
        return false;
    }
    if *n == two || *n == three {
        return true;
    }
    if !n.bit(0) {
        return false;
    }

    // Write n - 1 as 2^r * d with d odd.
    let n_minus_1 = n - &one;
    let mut d = n_minus_1.clone();
    let mut r: u32 = 0;
    while !d.bit(0) {
        d >>= 1;
        r += 1;
    }

    'witness: for _ in 0..rounds {
        let a = rng.gen_biguint_range(&two, &n_minus_1);
        let mut x = a.modpow(&d, n);
        if x == one || x == n_minus_1 {
            continue 'witness;
        }
        for _ in 0..r - 1 {
            x = x.modpow(&two, n);
            if x == n_minus_1 {
                continue 'witness;
            }
        }
        return false;
    }

    true
}

/// Random probable prime with exactly `bits` bits.
pub fn random_prime<R: Rng + ?Sized>(bits: u64, rng: &mut R) -> BigUint {
    assert!(bits >= 2, "a prime needs at least two bits");
    loop {
        let mut candidate = rng.gen_biguint(bits);
        candidate.set_bit(bits - 1, true);
        candidate.set_bit(0, true);
        if is_probably_prime(&candidate, 20, rng) {
            return candidate;
        }
    }
}

/// Keypair for the modular-exponentiation transform.
#[derive(Debug, Clone)]
pub struct KeyPair {
    modulus: BigUint,
    public_exponent: BigUint,
    private_exponent: BigUint,
}

impl KeyPair {
    /// Fresh keypair with e = 65537 and a modulus of `bits` bits.
    pub fn generate<R: Rng + ?Sized>(bits: u64, rng: &mut R) -> Self {
        let e = BigUint::from(PUBLIC_EXPONENT);
        loop {
            let p = random_prime(bits / 2, rng);
            let q = random_prime(bits - bits / 2, rng);
            if p == q {
                continue;
            }
            if let Some(key) = Self::from_primes(&p, &q, &e) {
                return key;
            }
        }
    }

    /// Keypair from known primes; None when e is not invertible mod phi(n).
    pub fn from_primes(p: &BigUint, q: &BigUint, e: &BigUint) -> Option<Self> {
        let totient = (p - 1u32) * (q - 1u32);
        let d = e.modinv(&totient)?;
        Some(Self {
            modulus: p * q,
            public_exponent: e.clone(),
            private_exponent: d,
        })
    }

    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    pub fn public_exponent(&self) -> &BigUint {
        &self.public_exponent
    }

    /// m^e mod n.
    pub fn encrypt(&self, m: &BigUint) -> BigUint {
        m.modpow(&self.public_exponent, &self.modulus)
    }

    /// c^d mod n.
    pub fn decrypt(&self, c: &BigUint) -> BigUint {
        c.modpow(&self.private_exponent, &self.modulus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn recognises_small_primes() {
        let mut rng = StdRng::seed_from_u64(0);
        for prime in [2u32, 3, 5, 97, 65_537, 524_287] {
            assert!(is_probably_prime(&BigUint::from(prime), 20, &mut rng));
        }
        // 561 is a Carmichael number; Miller-Rabin is not fooled.
        for composite in [1u32, 100, 561, 65_535] {
            assert!(!is_probably_prime(&BigUint::from(composite), 20, &mut rng));
        }
    }

    #[test]
    fn generated_primes_have_requested_size() {
        let mut rng = StdRng::seed_from_u64(1);
        let p = random_prime(48, &mut rng);
        assert_eq!(p.bits(), 48);
        assert!(is_probably_prime(&p, 20, &mut rng));
    }

    #[test]
    fn textbook_keypair_round_trips() {
        let key = KeyPair::from_primes(
            &BigUint::from(61u32),
            &BigUint::from(53u32),
            &BigUint::from(17u32),
        )
        .unwrap();
        assert_eq!(key.modulus(), &BigUint::from(3233u32));

        let m = BigUint::from(65u32);
        let c = key.encrypt(&m);
        assert_ne!(c, m);
        assert_eq!(key.decrypt(&c), m);
    }

    #[test]
    fn generated_keypair_round_trips() {
        let mut rng = StdRng::seed_from_u64(2);
        let key = KeyPair::generate(96, &mut rng);
        let m = BigUint::from(0xDEAD_BEEFu32);
        assert_eq!(key.decrypt(&key.encrypt(&m)), m);
    }
}
