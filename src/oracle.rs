use std::io;

use num_bigint::BigUint;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::ring::PublicParams;

/// Failure of the oracle transport. The remote side enforces a hard cap on
/// queries per connection; running into it shows up here as [`Closed`].
///
/// [`Closed`]: TransportError::Closed
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("oracle closed the connection")]
    Closed,

    #[error("malformed session banner: {0:?}")]
    Banner(String),
}

/// The remote black-box predicate: one boolean answer per submitted value.
pub trait Oracle {
    /// One round trip. Every call consumes one unit of the remote budget.
    #[allow(async_fn_in_trait)]
    async fn query(&mut self, value: &BigUint) -> Result<bool, TransportError>;
}

/// Per-session comparison context: the oracle plus the running query count.
/// One session owns one connection; neither is reused across retries.
pub struct Session<O> {
    oracle: O,
    queries: u64,
}

impl<O: Oracle> Session<O> {
    pub fn new(oracle: O) -> Self {
        Self { oracle, queries: 0 }
    }

    /// Queries issued through this session so far.
    pub fn queries(&self) -> u64 {
        self.queries
    }

    /// Forwards one query to the oracle.
    pub async fn query(&mut self, value: &BigUint) -> Result<bool, TransportError> {
        self.queries += 1;
        self.oracle.query(value).await
    }
}

/// TCP client for the remote oracle. Speaks the line protocol: one decimal
/// value out, one reply line back.
pub struct RemoteOracle {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl RemoteOracle {
    /// Connects and reads the public parameters off the session banner.
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<(Self, PublicParams), TransportError> {
        let stream = TcpStream::connect(addr).await?;
        let (read, write) = stream.into_split();
        let mut reader = BufReader::new(read);

        let mut banner = String::new();
        if reader.read_line(&mut banner).await? == 0 {
            return Err(TransportError::Closed);
        }
        let params = parse_banner(&banner)?;

        Ok((
            Self {
                reader,
                writer: write,
            },
            params,
        ))
    }
}

impl Oracle for RemoteOracle {
    async fn query(&mut self, value: &BigUint) -> Result<bool, TransportError> {
        self.writer
            .write_all(format!("{value}\n").as_bytes())
            .await?;

        let mut reply = String::new();
        if self.reader.read_line(&mut reply).await? == 0 {
            return Err(TransportError::Closed);
        }
        // The interactive server interleaves a prompt with its replies, so
        // only the verdict token is significant.
        Ok(reply.contains("True"))
    }
}

/// Parses the one-line banner `modulus; exponent; ciphertext` (decimal).
pub fn parse_banner(line: &str) -> Result<PublicParams, TransportError> {
    let mut fields = line.trim().split(';').map(|v| v.trim().parse::<BigUint>());
    match (fields.next(), fields.next(), fields.next(), fields.next()) {
        (Some(Ok(modulus)), Some(Ok(exponent)), Some(Ok(ciphertext)), None) => Ok(PublicParams {
            modulus,
            exponent,
            ciphertext,
        }),
        _ => Err(TransportError::Banner(line.trim_end().to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Affirmative;

    impl Oracle for Affirmative {
        async fn query(&mut self, _value: &BigUint) -> Result<bool, TransportError> {
            Ok(true)
        }
    }

    #[test]
    fn banner_parses_documented_format() {
        let params = parse_banner("3233; 17; 855\n").unwrap();
        assert_eq!(params.modulus, BigUint::from(3233u32));
        assert_eq!(params.exponent, BigUint::from(17u32));
        assert_eq!(params.ciphertext, BigUint::from(855u32));
    }

    #[test]
    fn banner_rejects_garbage() {
        assert!(parse_banner("hello world\n").is_err());
        assert!(parse_banner("12; 34\n").is_err());
        assert!(parse_banner("12; 34; 56; 78\n").is_err());
        assert!(parse_banner("").is_err());
    }

    #[tokio::test]
    async fn session_counts_every_query() {
        let mut session = Session::new(Affirmative);
        for expected in 1u64..=5 {
            session.query(&BigUint::from(9u32)).await.unwrap();
            assert_eq!(session.queries(), expected);
        }
    }
}
