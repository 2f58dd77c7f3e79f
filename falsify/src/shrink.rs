//! Reusable simplification helpers shared by primitive and composite strategies.
//!
//! Every helper yields candidates that are strictly simpler than the source
//! under a well-founded order, which is what keeps simplification acyclic.

use std::rc::Rc;

use num_traits::Float;

/// Magnitude term of a complexity score: `log2(1 + |distance|)`
pub fn magnitude<F: Float>(distance: F) -> F {
    (F::one() + distance.abs()).log2()
}

/// Sum of non-negative complexity terms, independent of their order
///
/// Terms are added smallest first, so shrinking one term or dropping one
/// never raises the total.
pub fn unordered_sum(terms: impl IntoIterator<Item = f64>) -> f64 {
    let mut terms: Vec<f64> = terms.into_iter().collect();
    terms.sort_by(f64::total_cmp);
    terms.into_iter().sum()
}

/// Candidates moving `value` toward `target`, largest jumps first
///
/// Yields `target`, then `value - d` for `d = diff/2, diff/4, ..., ±1` where
/// `diff = value - target`. Every candidate lies strictly between `target`
/// (inclusive) and `value` (exclusive).
pub fn approach(value: i128, target: i128) -> impl Iterator<Item = i128> {
    let diff = value - target;
    let first = (diff != 0).then_some(target);
    let steps = std::iter::successors((diff != 0).then_some(diff / 2), |d| {
        let next = d / 2;
        (next != 0).then_some(next)
    })
    .filter(|d| *d != 0)
    .map(move |d| value - d);
    first.into_iter().chain(steps)
}

/// Binary digits after the point needed to write `value` exactly
///
/// Zero for integral and non-finite values.
pub fn fractional_bits<F: Float>(value: F) -> u32 {
    if !value.is_finite() {
        return 0;
    }
    let (mantissa, exponent, _) = value.integer_decode();
    if mantissa == 0 {
        return 0;
    }
    let lowest = i32::from(exponent) + mantissa.trailing_zeros() as i32;
    (-lowest).max(0) as u32
}

/// Complexity of a float: magnitude, plus a sixteenth per fractional bit,
/// plus a half if the sign bit is set
///
/// Non-finite values sit above every finite one: infinities at `1100`
/// (plus the sign term), NaN at `1200`.
pub fn float_complexity<F: Float>(value: F) -> f64 {
    if value.is_nan() {
        return 1200.0;
    }
    let sign = if value.is_sign_negative() { 0.5 } else { 0.0 };
    if value.is_infinite() {
        return 1100.0 + sign;
    }
    let precision = f64::from(fractional_bits(value)) / 16.0;
    magnitude(value).to_f64().unwrap_or(1024.0) + precision + sign
}

/// `value` truncated toward zero to `bits` binary digits after the point
fn truncate_fraction<F: Float>(value: F, bits: u32) -> Option<F> {
    let two = F::one() + F::one();
    let scale = two.powi(i32::try_from(bits).ok()?);
    scale.is_finite().then(|| (value * scale).trunc() / scale)
}

/// Simpler floats, largest jumps first
///
/// No candidate has a larger magnitude, more fractional bits or a set sign
/// bit where the source had none, and each improves at least one of them.
/// Fractional values lose precision or whole units; integral values halve.
pub fn float_candidates<F: Float>(value: F) -> Vec<F> {
    let zero = F::zero();
    let mut candidates = Vec::new();
    if value.is_nan() {
        candidates.push(zero);
        return candidates;
    }
    if value.is_infinite() {
        candidates.push(zero);
        if value < zero {
            candidates.push(F::infinity());
        }
        return candidates;
    }
    // -0.0 simplifies to +0.0 as well
    if value != zero || value.is_sign_negative() {
        candidates.push(zero);
    }
    if value < zero {
        candidates.push(-value);
    }
    let two = F::one() + F::one();
    let bits = fractional_bits(value);
    if bits > 0 {
        let whole = value.trunc();
        candidates.push(whole);
        if whole != zero {
            candidates.push(value - whole);
            let half = (whole / two).trunc();
            if half != zero {
                candidates.push(value - half);
            }
        }
        let kept = std::iter::successors(Some(1u32), |keep| keep.checked_mul(2))
            .take_while(|keep| *keep < bits)
            .chain((bits > 1).then(|| bits - 1));
        candidates.extend(kept.filter_map(|keep| truncate_fraction(value, keep)));
    } else if value != zero {
        candidates.push((value / two).trunc());
    }
    candidates
}

/// Structural deletions of a collection in simplification order
///
/// Yields the empty collection, the two halves when there are at least four
/// items, then every single-item deletion from first to last. Candidates are
/// built on demand.
pub fn deletions<T: Clone>(items: Rc<Vec<T>>) -> impl Iterator<Item = Vec<T>> {
    let len = items.len();
    let empty = (len > 0).then(Vec::new);
    let halves = if len >= 4 {
        vec![(0, len / 2), (len / 2, len)]
    } else {
        Vec::new()
    };
    let source = Rc::clone(&items);
    let halves = halves
        .into_iter()
        .map(move |(start, end)| source[start..end].to_vec());
    let singles = (0..len).map(move |idx| {
        let mut shrunk = items.to_vec();
        shrunk.remove(idx);
        shrunk
    });
    empty.into_iter().chain(halves).chain(singles)
}
