//! Local oracle server: generates a keypair, plants a secret behind the
//! transform and serves the threshold predicate to sequential connections.
//!
//! Options:
//!   --listen=HOST:PORT   Listen address (default: 127.0.0.1:1337)
//!   --bits=N             Modulus size in bits (default: 1024)
//!   --secret=TEXT        The planted secret

use std::io;

use hidden_gcd::keys::KeyPair;
use hidden_gcd::server::{OracleServer, ThresholdPolicy};
use tokio::net::TcpListener;

struct CliConfig {
    listen: String,
    bits: u64,
    secret: String,
}

fn usage(reason: &str) -> ! {
    eprintln!("{reason}");
    eprintln!("usage: server [--listen=HOST:PORT] [--bits=N] [--secret=TEXT]");
    std::process::exit(2);
}

fn parse_args() -> CliConfig {
    let mut config = CliConfig {
        listen: "127.0.0.1:1337".to_string(),
        bits: 1024,
        secret: "flag{local_test_secret}".to_string(),
    };

    for arg in std::env::args().skip(1) {
        if let Some(value) = arg.strip_prefix("--listen=") {
            config.listen = value.to_string();
        } else if let Some(value) = arg.strip_prefix("--bits=") {
            config.bits = value
                .parse()
                .unwrap_or_else(|_| usage("--bits expects an integer"));
        } else if let Some(value) = arg.strip_prefix("--secret=") {
            config.secret = value.to_string();
        } else {
            usage(&format!("unknown option: {arg}"));
        }
    }

    config
}

#[tokio::main]
async fn main() -> io::Result<()> {
    env_logger::init();
    let config = parse_args();

    log::info!("generating a {}-bit keypair", config.bits);
    let key = KeyPair::generate(config.bits, &mut rand::thread_rng());
    let server = OracleServer::new(key, config.secret.as_bytes(), ThresholdPolicy::Uniform);

    let listener = TcpListener::bind(&config.listen).await?;
    log::info!("oracle listening on {}", config.listen);

    loop {
        let (stream, peer) = listener.accept().await?;
        log::info!("session from {peer}");
        if let Err(err) = server.serve(stream, rand::thread_rng()).await {
            log::warn!("session ended with io error: {err}");
        }
    }
}
