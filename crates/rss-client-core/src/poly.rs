//! Polynomial kit
//!
//! Shamir-style polynomials over the scalar field of the selected curve:
//! generation with a fixed y-intercept, evaluation, Lagrange coefficients
//! for arbitrary targets, and dot products. `target = 0` recovers plain
//! Shamir reconstruction; a nonzero target yields the re-sharing
//! coefficients that translate a share at one index into a share at another.

use rand::{CryptoRng, RngCore};

use crate::curve::{Curve, CurveScalar};
use crate::error::{Error, Result};

/// Generate a random polynomial of the given degree
///
/// Coefficient 0 is the supplied y-intercept; when `None`, it is random as
/// well. Higher coefficients are always uniformly random.
pub fn generate_polynomial<C: Curve, R: RngCore + CryptoRng>(
    degree: usize,
    y_intercept: Option<C::Scalar>,
    rng: &mut R,
) -> Vec<C::Scalar> {
    let mut coefficients = Vec::with_capacity(degree + 1);
    coefficients.push(y_intercept.unwrap_or_else(|| C::Scalar::random(rng)));
    for _ in 0..degree {
        coefficients.push(C::Scalar::random(rng));
    }
    coefficients
}

/// Evaluate a polynomial at `x`
///
/// Each term is reduced mod the group order before it is accumulated.
pub fn eval_polynomial<C: Curve>(coefficients: &[C::Scalar], x: &C::Scalar) -> C::Scalar {
    let mut acc = C::Scalar::zero();
    let mut x_power = C::Scalar::one();
    for coefficient in coefficients {
        acc = acc + *coefficient * x_power;
        x_power = x_power * *x;
    }
    acc
}

/// Evaluate a polynomial at a small integer index
pub fn eval_polynomial_at<C: Curve>(coefficients: &[C::Scalar], x: u64) -> C::Scalar {
    eval_polynomial::<C>(coefficients, &C::Scalar::from_u64(x))
}

/// Lagrange coefficient `Π_{j≠my} (target − indices[j]) / (my_index − indices[j])`
///
/// Exactly one occurrence of `my_index` in `indices` is skipped; a second
/// occurrence is a caller bug and fails with `ZeroDenominator`.
pub fn lagrange_coefficient<C: Curve>(
    indices: &[u64],
    my_index: u64,
    target: u64,
) -> Result<C::Scalar> {
    let target_s = C::Scalar::from_u64(target);
    let my_s = C::Scalar::from_u64(my_index);
    let mut numerator = C::Scalar::one();
    let mut denominator = C::Scalar::one();
    let mut skipped_self = false;
    for &index in indices {
        if index == my_index {
            if skipped_self {
                return Err(Error::ZeroDenominator { index: my_index });
            }
            skipped_self = true;
            continue;
        }
        let index_s = C::Scalar::from_u64(index);
        numerator = numerator * (target_s - index_s);
        denominator = denominator * (my_s - index_s);
    }
    let inverse = denominator
        .invert()
        .ok_or(Error::ZeroDenominator { index: my_index })?;
    Ok(numerator * inverse)
}

/// Dot product of two equal-length scalar vectors
pub fn dot_product<C: Curve>(a: &[C::Scalar], b: &[C::Scalar]) -> Result<C::Scalar> {
    if a.len() != b.len() {
        return Err(Error::LengthMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(a.iter()
        .zip(b.iter())
        .fold(C::Scalar::zero(), |acc, (x, y)| acc + *x * *y))
}
