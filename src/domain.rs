use num_bigint::BigInt;
use num_traits::{One, Zero};

/// Element of a euclidean domain embedded in the integers: euclidean with
/// respect to the standard integer norm, which supports comparisons.
///
/// A type only has to provide the identity, equality, addition, the two
/// multiplication variants and the `at_least` ordering primitive; subtraction,
/// division with remainder and the extended euclidean algorithm are derived
/// from those. The ordering primitive may be approximate, and it alone is
/// allowed to fail - every oracle-backed operation threads a comparison
/// context `C` through explicitly.
pub trait EuclideanElement<C>: Clone + Sized {
    /// Failure surfaced by the ordering primitive.
    type Error;

    /// Additive identity of this element's domain.
    fn zero(&self) -> Self;

    /// Exact equality. Termination of [`EuclideanElement::gcd`] rests on this
    /// being exact, never on the approximate ordering.
    fn equals(&self, other: &Self) -> bool;

    fn add(&self, other: &Self) -> Self;

    /// Multiplication by another element of the domain.
    fn mul_element(&self, other: &Self) -> Self;

    /// Multiplication by an integer scalar.
    fn mul_scalar(&self, scalar: &BigInt) -> Self;

    fn sub(&self, other: &Self) -> Self {
        self.add(&other.mul_scalar(&BigInt::from(-1)))
    }

    /// Whether `self >= other` under the domain's (possibly noisy) order.
    #[allow(async_fn_in_trait)]
    async fn at_least(&self, other: &Self, ctx: &mut C) -> Result<bool, Self::Error>;

    /// Division with remainder: `(quotient, remainder)` with
    /// `self == other * quotient + remainder`.
    ///
    /// The quotient is located with O(log quotient) comparisons: an
    /// exponential search for a power-of-two upper bound, then a binary
    /// search down to the boundary. Each comparison is one `at_least` call.
    /// The caller must keep `other` away from zero - the bound search does
    /// not terminate on a zero divisor.
    #[allow(async_fn_in_trait)]
    async fn divmod(&self, other: &Self, ctx: &mut C) -> Result<(BigInt, Self), Self::Error> {
        // Least power of two with other * bound >= self.
        let mut bound = BigInt::one();
        while !other.mul_scalar(&bound).at_least(self, ctx).await? {
            bound = &bound + &bound;
        }

        let mut floor = BigInt::zero();
        while &bound - &floor > BigInt::one() {
            let mid = (&floor + &bound) >> 1;
            if self.at_least(&other.mul_scalar(&mid), ctx).await? {
                floor = mid;
            } else {
                bound = mid;
            }
        }

        let quotient = if self.at_least(&other.mul_scalar(&bound), ctx).await? {
            bound
        } else {
            floor
        };
        let remainder = self.sub(&other.mul_scalar(&quotient));
        Ok((quotient, remainder))
    }

    /// Extended euclidean algorithm.
    ///
    /// Returns `(gcd, alpha, beta)` with `alpha * self + beta * other == gcd`.
    /// The loop ends only once a remainder `equals` the exact zero element;
    /// a comparator answering wrongly can therefore keep it running until the
    /// underlying transport gives out, which surfaces here as an error.
    #[allow(async_fn_in_trait)]
    async fn gcd(&self, other: &Self, ctx: &mut C) -> Result<(Self, BigInt, BigInt), Self::Error> {
        let zero = self.zero();

        let mut a = self.clone();
        let mut b = other.clone();
        let (mut alpha_a, mut beta_a) = (BigInt::one(), BigInt::zero());
        let (mut alpha_b, mut beta_b) = (BigInt::zero(), BigInt::one());

        let mut iteration: u64 = 1;
        while !b.equals(&zero) {
            log::debug!("euclidean algorithm iteration #{iteration}");
            let (quotient, remainder) = a.divmod(&b, ctx).await?;

            // a, b = b, a mod b; the coefficients of a are rewritten to match
            // the remainder, then swapped alongside.
            let alpha_next = &alpha_a - &quotient * &alpha_b;
            let beta_next = &beta_a - &quotient * &beta_b;
            a = b;
            b = remainder;
            alpha_a = alpha_b;
            beta_a = beta_b;
            alpha_b = alpha_next;
            beta_b = beta_next;

            iteration += 1;
        }

        Ok((a, alpha_a, beta_a))
    }
}
