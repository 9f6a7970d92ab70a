//! The oracle's own side of the protocol: a decryption-threshold predicate
//! over a planted secret, usable in-process or served over TCP. The attack
//! treats all of this as a remote black box; it lives here for local runs
//! and for the end-to-end tests.

use std::io;

use num_bigint::{BigUint, RandBigInt};
use rand::Rng;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::encode;
use crate::keys::KeyPair;
use crate::oracle::{Oracle, TransportError};
use crate::ring::PublicParams;

/// Hard cap on queries answered per session.
pub const MAX_REQUESTS: u64 = 1 << 13;

/// Smallest threshold the randomized policy will draw.
pub const THRESHOLD_MIN: u32 = 7;

/// The randomized policy draws thresholds up to modulus / 37.
pub const THRESHOLD_DIVISOR: u32 = 37;

/// How the oracle draws the threshold it compares decryptions against.
#[derive(Debug, Clone)]
pub enum ThresholdPolicy {
    /// The same threshold for every query. For operands below it the
    /// predicate degenerates into an exact comparison, which is what the
    /// deterministic tests want.
    Fixed(BigUint),
    /// A fresh uniform threshold in `[7, n/37]` per query.
    Uniform,
}

/// In-process decryption oracle: answers whether decrypt(c) undercuts the
/// current threshold, until the request cap runs out.
pub struct ThresholdOracle<R> {
    key: KeyPair,
    policy: ThresholdPolicy,
    rng: R,
    remaining: u64,
}

impl<R: Rng> ThresholdOracle<R> {
    pub fn new(key: KeyPair, policy: ThresholdPolicy, rng: R) -> Self {
        Self {
            key,
            policy,
            rng,
            remaining: MAX_REQUESTS,
        }
    }

    pub fn with_request_cap(mut self, cap: u64) -> Self {
        self.remaining = cap;
        self
    }

    fn threshold(&mut self) -> BigUint {
        match &self.policy {
            ThresholdPolicy::Fixed(value) => value.clone(),
            ThresholdPolicy::Uniform => {
                let upper = self.key.modulus() / THRESHOLD_DIVISOR + 1u32;
                self.rng
                    .gen_biguint_range(&BigUint::from(THRESHOLD_MIN), &upper)
            }
        }
    }

    /// The predicate itself; None once the request cap is spent.
    pub fn answer(&mut self, cipher: &BigUint) -> Option<bool> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let threshold = self.threshold();
        Some(self.key.decrypt(cipher) < threshold)
    }
}

impl<R: Rng> Oracle for ThresholdOracle<R> {
    async fn query(&mut self, value: &BigUint) -> Result<bool, TransportError> {
        self.answer(value).ok_or(TransportError::Closed)
    }
}

/// Serves the threshold predicate over TCP, one line per query, with the
/// public parameters as a banner. Mirrors the interactive service the
/// client side expects: a `Cipher: ` prompt interleaved with the replies.
pub struct OracleServer {
    key: KeyPair,
    params: PublicParams,
    policy: ThresholdPolicy,
    request_cap: u64,
}

impl OracleServer {
    /// Plants `secret` behind a fresh transform under `key`.
    pub fn new(key: KeyPair, secret: &[u8], policy: ThresholdPolicy) -> Self {
        let planted = encode::from_bytes(secret);
        assert!(
            &planted < key.modulus(),
            "secret must be smaller than the modulus"
        );
        let params = PublicParams {
            modulus: key.modulus().clone(),
            exponent: key.public_exponent().clone(),
            ciphertext: key.encrypt(&planted),
        };
        Self {
            key,
            params,
            policy,
            request_cap: MAX_REQUESTS,
        }
    }

    pub fn with_request_cap(mut self, cap: u64) -> Self {
        self.request_cap = cap;
        self
    }

    pub fn params(&self) -> &PublicParams {
        &self.params
    }

    /// Handles one full session on an accepted connection: fresh request
    /// budget, fresh threshold draws. Returns once the peer disconnects,
    /// sends a non-integer or spends the request cap.
    pub async fn serve<R: Rng>(&self, stream: TcpStream, rng: R) -> io::Result<()> {
        let (read, write) = stream.into_split();
        let mut reader = BufReader::new(read);
        let mut writer = write;
        let mut oracle = ThresholdOracle::new(self.key.clone(), self.policy.clone(), rng)
            .with_request_cap(self.request_cap);

        let banner = format!(
            "{}; {}; {}\n",
            self.params.modulus, self.params.exponent, self.params.ciphertext
        );
        writer.write_all(banner.as_bytes()).await?;

        let mut line = String::new();
        loop {
            writer.write_all(b"Cipher: ").await?;
            line.clear();
            if reader.read_line(&mut line).await? == 0 {
                return Ok(());
            }
            let Ok(cipher) = line.trim().parse::<BigUint>() else {
                writer.write_all(b"Invalid input\n").await?;
                return Ok(());
            };
            let Some(verdict) = oracle.answer(&cipher) else {
                return Ok(());
            };
            let reply = if verdict { "True" } else { "False" };
            writer
                .write_all(format!("Oracle Response: {reply}\n").as_bytes())
                .await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn toy_key() -> KeyPair {
        KeyPair::from_primes(
            &BigUint::from(61u32),
            &BigUint::from(53u32),
            &BigUint::from(17u32),
        )
        .unwrap()
    }

    #[test]
    fn answers_compare_decryption_against_fixed_threshold() {
        let key = toy_key();
        let mut oracle = ThresholdOracle::new(
            key.clone(),
            ThresholdPolicy::Fixed(BigUint::from(100u32)),
            StdRng::seed_from_u64(0),
        );

        let small = key.encrypt(&BigUint::from(99u32));
        let large = key.encrypt(&BigUint::from(100u32));
        assert_eq!(oracle.answer(&small), Some(true));
        assert_eq!(oracle.answer(&large), Some(false));
    }

    #[test]
    fn stops_answering_once_the_cap_is_spent() {
        let key = toy_key();
        let cipher = key.encrypt(&BigUint::from(5u32));
        let mut oracle = ThresholdOracle::new(
            key,
            ThresholdPolicy::Fixed(BigUint::from(100u32)),
            StdRng::seed_from_u64(0),
        )
        .with_request_cap(3);

        for _ in 0..3 {
            assert!(oracle.answer(&cipher).is_some());
        }
        assert_eq!(oracle.answer(&cipher), None);
    }

    #[test]
    fn randomized_thresholds_stay_in_range() {
        let key = toy_key();
        let bound = key.modulus() / THRESHOLD_DIVISOR;
        let mut oracle =
            ThresholdOracle::new(key, ThresholdPolicy::Uniform, StdRng::seed_from_u64(7));

        for _ in 0..200 {
            let t = oracle.threshold();
            assert!(t >= BigUint::from(THRESHOLD_MIN));
            assert!(t <= bound);
        }
    }

    #[test]
    fn server_banner_carries_the_public_params() {
        let server = OracleServer::new(
            toy_key(),
            b"*",
            ThresholdPolicy::Fixed(BigUint::from(100u32)),
        );
        let params = server.params();
        assert_eq!(params.modulus, BigUint::from(3233u32));
        // 42 is the planted byte '*'.
        assert_eq!(
            params.ciphertext,
            BigUint::from(42u32).modpow(&params.exponent, &params.modulus)
        );
    }
}
