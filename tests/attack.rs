//! End-to-end run over loopback TCP: a served oracle on one side, the full
//! client stack (connect, banner, sessions, retries) on the other.

use std::sync::Arc;

use hidden_gcd::attack::{run_attack, AttackConfig};
use hidden_gcd::keys::KeyPair;
use hidden_gcd::oracle::{RemoteOracle, Session};
use hidden_gcd::server::{OracleServer, ThresholdPolicy};
use num_bigint::BigUint;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::net::TcpListener;

const SECRET: &str = "flag{gcd}";

// 2^61 - 1 and 2^19 - 1, both prime: an 80-bit modulus keeps the euclidean
// chains short enough for a quick test.
fn fixture_key() -> KeyPair {
    KeyPair::from_primes(
        &BigUint::from(2_305_843_009_213_693_951u64),
        &BigUint::from(524_287u32),
        &BigUint::from(65_537u32),
    )
    .unwrap()
}

#[tokio::test]
async fn recovers_planted_secret_over_tcp() {
    let key = fixture_key();
    // Fixed threshold: the comparator is exact for accepted projections and
    // sessions only fail on non-coprime plaintexts.
    let threshold = key.modulus() / 37u32;
    let server = Arc::new(OracleServer::new(
        key,
        SECRET.as_bytes(),
        ThresholdPolicy::Fixed(threshold),
    ));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accept_loop = {
        let server = server.clone();
        tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                // A client may drop its half mid-session; that only ends the
                // session, not the server.
                let _ = server.serve(stream, StdRng::seed_from_u64(0)).await;
            }
        })
    };

    let mut rng = StdRng::seed_from_u64(0x5EED);
    let config = AttackConfig::default();
    let mut recovered = None;
    for _attempt in 0..20 {
        let (oracle, params) = RemoteOracle::connect(addr).await.unwrap();
        let mut session = Session::new(oracle);
        if let Ok(secret) = run_attack(&Arc::new(params), &mut session, &config, &mut rng).await {
            recovered = Some(secret);
            break;
        }
    }

    assert_eq!(recovered.as_deref(), Some(SECRET));
    accept_loop.abort();
}

#[tokio::test]
async fn banner_over_tcp_matches_served_params() {
    let server = Arc::new(OracleServer::new(
        fixture_key(),
        SECRET.as_bytes(),
        ThresholdPolicy::Uniform,
    ));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accept_loop = {
        let server = server.clone();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let _ = server.serve(stream, StdRng::seed_from_u64(0)).await;
        })
    };

    let (_oracle, params) = RemoteOracle::connect(addr).await.unwrap();
    assert_eq!(&params, server.params());
    accept_loop.abort();
}
