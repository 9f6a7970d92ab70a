//! The attack itself.
//!
//! We look at random projections of the transform f(x) = ciphertext * x^e:
//! the hidden plaintexts of f(k) and f(l) are secret * k and secret * l, and
//! with decent probability those are coprime. The euclidean algorithm runs
//! beneath the transform (see [`crate::ring`]), so it hands us alpha, beta
//! with alpha * (secret * k) + beta * (secret * l) = 1, i.e.
//! secret * (alpha * k + beta * l) = 1. The bracketed sum is known, and
//! inverting it mod n is easy.

use std::sync::Arc;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::Rng;
use thiserror::Error;

use crate::domain::EuclideanElement;
use crate::encode;
use crate::oracle::{Oracle, Session, TransportError};
use crate::ring::{PublicParams, RingElement};

/// Default cap on oracle queries spent while sampling projections, leaving
/// the bulk of the remote's own request budget to the gcd computation.
pub const DEFAULT_SETUP_BUDGET: u64 = 1 << 11;

/// Tunables of a single attack session.
#[derive(Debug, Clone)]
pub struct AttackConfig {
    /// Oracle queries the sampling phase may spend before giving up.
    pub setup_budget: u64,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            setup_budget: DEFAULT_SETUP_BUDGET,
        }
    }
}

/// Ways a single session can end without the secret. All of them are
/// recovered at the session boundary: the driver simply starts over.
#[derive(Debug, Error)]
pub enum AttackError {
    #[error("sampling spent its budget of {0} oracle queries without two usable projections")]
    SetupBudgetExceeded(u64),

    #[error("oracle transport fault: {0}")]
    Transport(#[from] TransportError),

    #[error("projections were not coprime beneath the transform")]
    NonCoprimeProjections,

    #[error("recovered value does not decode to ascii text")]
    Decoding,
}

/// Runs one session against an oracle: sample two small projections, run the
/// extended euclidean algorithm through the oracle, validate the gcd and
/// invert the Bezout sum into the secret.
pub async fn run_attack<O: Oracle, R: Rng + ?Sized>(
    params: &Arc<PublicParams>,
    session: &mut Session<O>,
    config: &AttackConfig,
    rng: &mut R,
) -> Result<String, AttackError> {
    let k = sample_small_projection(params, session, config, rng).await?;
    let l = sample_small_projection(params, session, config, rng).await?;
    log::info!("setup took {} oracle queries", session.queries());

    let (gcd, alpha, beta) = k.gcd(&l, session).await?;
    log::info!(
        "euclidean algorithm finished; {} oracle queries so far",
        session.queries()
    );

    if !gcd.image().is_one() {
        return Err(AttackError::NonCoprimeProjections);
    }

    // alpha * k + beta * l multiplies the secret up to one, so the sum of
    // pre-images is the secret's inverse mod n.
    let sum = &alpha * BigInt::from(k.pre_image().clone())
        + &beta * BigInt::from(l.pre_image().clone());
    let modulus = BigInt::from(params.modulus.clone());
    let (_, residue) = sum.mod_floor(&modulus).into_parts();
    let secret = residue
        .modinv(&params.modulus)
        .ok_or(AttackError::Decoding)?;

    encode::to_ascii(&secret).ok_or(AttackError::Decoding)
}

/// Draws random candidates until one passes the is-this-small self test.
///
/// Comparing a candidate against zero asks the oracle whether its hidden
/// plaintext undercuts the random threshold; a large plaintext practically
/// never does. Acceptance is a heuristic, not a guarantee - a candidate can
/// get lucky against one threshold draw and still be too large for the gcd
/// phase, which then fails the session downstream.
async fn sample_small_projection<O: Oracle, R: Rng + ?Sized>(
    params: &Arc<PublicParams>,
    session: &mut Session<O>,
    config: &AttackConfig,
    rng: &mut R,
) -> Result<RingElement, AttackError> {
    let zero = RingElement::new(params.clone(), BigInt::zero());
    loop {
        if session.queries() >= config.setup_budget {
            return Err(AttackError::SetupBudgetExceeded(config.setup_budget));
        }
        let candidate = RingElement::random(params, rng);
        if candidate.at_least(&zero, session).await? {
            return Ok(candidate);
        }
    }
}
