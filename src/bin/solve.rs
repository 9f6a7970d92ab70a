//! Retry driver: runs attack sessions against a remote oracle until one of
//! them recovers the secret.
//!
//! Options:
//!   --addr=HOST:PORT     Oracle address (default: 127.0.0.1:1337)
//!   --setup-budget=N     Oracle queries the sampling phase may spend
//!   --max-attempts=N     Give up after N sessions (0 = keep trying)

use std::process::ExitCode;
use std::sync::Arc;

use hidden_gcd::attack::{run_attack, AttackConfig, AttackError};
use hidden_gcd::oracle::{RemoteOracle, Session};
use rand::Rng;

struct CliConfig {
    addr: String,
    max_attempts: u64,
    attack: AttackConfig,
}

fn usage(reason: &str) -> ! {
    eprintln!("{reason}");
    eprintln!("usage: solve [--addr=HOST:PORT] [--setup-budget=N] [--max-attempts=N]");
    std::process::exit(2);
}

fn parse_args() -> CliConfig {
    let mut config = CliConfig {
        addr: "127.0.0.1:1337".to_string(),
        max_attempts: 0,
        attack: AttackConfig::default(),
    };

    for arg in std::env::args().skip(1) {
        if let Some(value) = arg.strip_prefix("--addr=") {
            config.addr = value.to_string();
        } else if let Some(value) = arg.strip_prefix("--setup-budget=") {
            config.attack.setup_budget = value
                .parse()
                .unwrap_or_else(|_| usage("--setup-budget expects an integer"));
        } else if let Some(value) = arg.strip_prefix("--max-attempts=") {
            config.max_attempts = value
                .parse()
                .unwrap_or_else(|_| usage("--max-attempts expects an integer"));
        } else {
            usage(&format!("unknown option: {arg}"));
        }
    }

    config
}

async fn attempt_once(config: &CliConfig, rng: &mut impl Rng) -> Result<String, AttackError> {
    let (oracle, params) = RemoteOracle::connect(config.addr.as_str()).await?;
    let mut session = Session::new(oracle);
    run_attack(&Arc::new(params), &mut session, &config.attack, rng).await
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let config = parse_args();
    let mut rng = rand::thread_rng();

    let mut attempt: u64 = 0;
    loop {
        attempt += 1;
        if config.max_attempts != 0 && attempt > config.max_attempts {
            log::error!("giving up after {} attempts", config.max_attempts);
            return ExitCode::FAILURE;
        }

        log::info!("starting attempt #{attempt}");
        match attempt_once(&config, &mut rng).await {
            Ok(secret) => {
                log::info!("secret recovered on attempt #{attempt}");
                println!("{secret}");
                return ExitCode::SUCCESS;
            }
            Err(err) => log::warn!("attempt #{attempt} failed: {err}"),
        }
    }
}
