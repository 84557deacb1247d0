//! Feldman commitment handling
//!
//! Commitment vectors `{g·aᵢ}` are decoded from the wire, summed coefficient
//! by coefficient across co-dealers, evaluated in the exponent, and checked
//! against the two algebraic identities that bind an aggregated response to
//! the known TSS public key.

use crate::curve::{Curve, CurveScalar, HexPoint};
use crate::error::{Error, Result};
use crate::poly;

/// Decode a commitment vector, enforcing its expected length
pub fn parse_commitments<C: Curve>(
    hex_points: &[HexPoint],
    expected: usize,
    what: &str,
) -> Result<Vec<C::Point>> {
    if hex_points.len() != expected {
        return Err(Error::InvalidCommitShape {
            what: what.to_string(),
            expected,
            actual: hex_points.len(),
        });
    }
    hex_points.iter().map(C::from_hex_point).collect()
}

/// Sum commitment vectors coefficient-wise across co-dealers
///
/// All vectors must share the length of the first (enforced upstream by
/// [`parse_commitments`]).
pub fn sum_commitments<C: Curve>(vectors: &[Vec<C::Point>]) -> Vec<C::Point> {
    let len = vectors.first().map(Vec::len).unwrap_or(0);
    (0..len)
        .map(|k| {
            vectors
                .iter()
                .fold(C::identity(), |acc, vector| acc + vector[k])
        })
        .collect()
}

/// Evaluate a commitment vector in the exponent: `Σ xⁱ·Cᵢ == g·P(x)`
pub fn evaluate_commitments<C: Curve>(commitments: &[C::Point], x: u64) -> C::Point {
    let x = C::Scalar::from_u64(x);
    let mut acc = C::identity();
    let mut x_power = C::Scalar::one();
    for commitment in commitments {
        acc = acc + *commitment * x_power;
        x_power = x_power * x;
    }
    acc
}

/// Check the two identities an aggregated response must satisfy for `target`
///
/// 1. `L([1,t],1,0)·dkgNewPub + L([1,t],t,0)·mc[0] == tssPubKey` — the
///    aggregate constant term is the refreshed share at the target index.
/// 2. `mc[0] + mc[1] == sc[0]` — the server sub-sharing starts at the master
///    polynomial's value at x = 1.
pub fn verify_aggregate<C: Curve>(
    target: u64,
    master: &[C::Point],
    server: &[C::Point],
    dkg_new_pub: &C::Point,
    tss_pub: &C::Point,
) -> Result<()> {
    let eta1 = poly::lagrange_coefficient::<C>(&[1, target], 1, 0)?;
    let eta2 = poly::lagrange_coefficient::<C>(&[1, target], target, 0)?;
    if *dkg_new_pub * eta1 + master[0] * eta2 != *tss_pub {
        return Err(Error::TssPubKeyMismatch { target });
    }
    if master[0] + master[1] != server[0] {
        return Err(Error::ServerMasterCommitMismatch { target });
    }
    Ok(())
}
