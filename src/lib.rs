//! Recovers a secret hidden behind a modular-exponentiation transform, given
//! nothing but a remote boolean oracle answering whether a submitted value
//! decrypts to something below a random threshold.
//!
//! The pieces: [`domain`] defines euclidean-domain elements whose only
//! ordering is a fallible, possibly noisy comparison, and derives division
//! with remainder and the extended euclidean algorithm from it. [`ring`]
//! instantiates that for hidden multiples of the secret, with the comparison
//! backed by one oracle round trip. [`attack`] samples projections, runs the
//! gcd beneath the transform and inverts the Bezout sum into the secret.
//! [`oracle`] is the wire side; [`keys`] and [`server`] are the oracle's own
//! half, kept around for local servers and the end-to-end tests.

pub mod attack;
pub mod domain;
pub mod encode;
pub mod keys;
pub mod oracle;
pub mod ring;
pub mod server;
