use std::sync::Arc;

use num_bigint::{BigInt, BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::Rng;

use crate::domain::EuclideanElement;
use crate::oracle::{Oracle, Session, TransportError};

/// Public parameters of one oracle session, read once from the banner and
/// immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicParams {
    /// Modulus n of the public transform.
    pub modulus: BigUint,
    /// Public exponent e.
    pub exponent: BigUint,
    /// The transformed secret: the value the whole exercise recovers.
    pub ciphertext: BigUint,
}

/// A hidden multiple of the secret, represented by the pre-image we chose
/// for it. For f(x) = ciphertext * x^e mod n, an element with pre-image x
/// stands for the plaintext of f(x), which is secret * x mod n - never
/// visible directly, only comparable through the oracle.
///
/// All arithmetic happens on pre-images, kept as canonical residues mod n.
#[derive(Debug, Clone)]
pub struct RingElement {
    pre_image: BigUint,
    params: Arc<PublicParams>,
}

impl RingElement {
    /// Element with the given pre-image, reduced into `[0, n)`.
    pub fn new(params: Arc<PublicParams>, pre_image: BigInt) -> Self {
        let modulus = BigInt::from(params.modulus.clone());
        let (_, reduced) = pre_image.mod_floor(&modulus).into_parts();
        Self {
            pre_image: reduced,
            params,
        }
    }

    /// Element with a pre-image drawn uniformly from `[1, n]`.
    pub fn random<R: Rng + ?Sized>(params: &Arc<PublicParams>, rng: &mut R) -> Self {
        let upper = &params.modulus + 1u32;
        let pre_image = rng.gen_biguint_range(&BigUint::one(), &upper) % &params.modulus;
        Self {
            pre_image,
            params: params.clone(),
        }
    }

    pub fn pre_image(&self) -> &BigUint {
        &self.pre_image
    }

    /// f(pre_image) = ciphertext * pre_image^e mod n. Diagnostic only - the
    /// attack itself never needs an image except to validate the gcd.
    pub fn image(&self) -> BigUint {
        let raised = self
            .pre_image
            .modpow(&self.params.exponent, &self.params.modulus);
        (&self.params.ciphertext * raised) % &self.params.modulus
    }

    pub fn zero(&self) -> Self {
        Self {
            pre_image: BigUint::zero(),
            params: self.params.clone(),
        }
    }

    /// Equality of images, i.e. of the hidden plaintexts.
    pub fn equals(&self, other: &Self) -> bool {
        self.image() == other.image()
    }

    pub fn add(&self, other: &Self) -> Self {
        Self {
            pre_image: (&self.pre_image + &other.pre_image) % &self.params.modulus,
            params: self.params.clone(),
        }
    }

    pub fn sub(&self, other: &Self) -> Self {
        self.add(&other.mul_scalar(&BigInt::from(-1)))
    }

    pub fn mul_element(&self, other: &Self) -> Self {
        Self {
            pre_image: (&self.pre_image * &other.pre_image) % &self.params.modulus,
            params: self.params.clone(),
        }
    }

    pub fn mul_scalar(&self, scalar: &BigInt) -> Self {
        Self::new(
            self.params.clone(),
            BigInt::from(self.pre_image.clone()) * scalar,
        )
    }
}

impl<O: Oracle> EuclideanElement<Session<O>> for RingElement {
    type Error = TransportError;

    fn zero(&self) -> Self {
        RingElement::zero(self)
    }

    fn equals(&self, other: &Self) -> bool {
        RingElement::equals(self, other)
    }

    fn add(&self, other: &Self) -> Self {
        RingElement::add(self, other)
    }

    fn mul_element(&self, other: &Self) -> Self {
        RingElement::mul_element(self, other)
    }

    fn mul_scalar(&self, scalar: &BigInt) -> Self {
        RingElement::mul_scalar(self, scalar)
    }

    /// One oracle round trip on the image of the difference. When both
    /// hidden plaintexts are small, `self >= other` leaves a small difference
    /// while `self < other` wraps around the modulus, so the oracle's
    /// "smaller than my random threshold" answer stands in for the order.
    async fn at_least(
        &self,
        other: &Self,
        session: &mut Session<O>,
    ) -> Result<bool, TransportError> {
        session.query(&self.sub(other).image()).await
    }
}
