//! Tolerance policy and error statistics.

use serde::Serialize;

/// Acceptance policy for a computed value against its reference.
///
/// A finite pair is accepted when ANY bound holds. Non-finite values must
/// match exactly (NaN matches NaN, infinities match by sign).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tolerance {
    /// Absolute error bound
    pub abs: f64,
    /// Relative error bound
    pub rel: f64,
    /// Distance bound in units in the last place
    pub ulp: u64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            abs: 1e-6,
            rel: 1e-15,
            ulp: 5,
        }
    }
}

impl Tolerance {
    /// Tolerance that accepts bit-identical values only
    pub const EXACT: Tolerance = Tolerance {
        abs: 0.0,
        rel: 0.0,
        ulp: 0,
    };

    /// Check a single value
    pub fn accepts(&self, expected: f64, actual: f64) -> bool {
        if !expected.is_finite() || !actual.is_finite() {
            return same_class(expected, actual);
        }
        let diff = (expected - actual).abs();
        diff <= self.abs
            || relative_error(expected, actual) <= self.rel
            || ulp_distance(expected, actual) <= self.ulp
    }

    /// Index of the first element not accepted, or a length mismatch as `Some(min_len)`
    pub fn first_violation(&self, expected: &[f64], actual: &[f64]) -> Option<usize> {
        if let Some(i) = expected
            .iter()
            .zip(actual)
            .position(|(&e, &a)| !self.accepts(e, a))
        {
            return Some(i);
        }
        (expected.len() != actual.len()).then(|| expected.len().min(actual.len()))
    }
}

/// Non-finite comparison: NaN with NaN, infinities by sign, finite never
fn same_class(expected: f64, actual: f64) -> bool {
    (expected.is_nan() && actual.is_nan()) || expected == actual
}

/// `|expected - actual| / |expected|`, zero when the reference is zero and the values agree
pub fn relative_error(expected: f64, actual: f64) -> f64 {
    let diff = (expected - actual).abs();
    if expected == 0.0 {
        if diff == 0.0 {
            0.0
        } else {
            f64::INFINITY
        }
    } else {
        diff / expected.abs()
    }
}

/// Map f64 bits onto integers ordered like the floats they encode.
///
/// `+0.0` and `-0.0` both map to zero.
fn ordered_bits(x: f64) -> i64 {
    let bits = x.to_bits() as i64;
    if bits < 0 {
        i64::MIN - bits
    } else {
        bits
    }
}

/// Number of representable doubles between `a` and `b`.
///
/// Two NaNs are zero apart; a NaN and a number are `u64::MAX` apart.
pub fn ulp_distance(a: f64, b: f64) -> u64 {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => 0,
        (true, false) | (false, true) => u64::MAX,
        (false, false) => {
            let d = i128::from(ordered_bits(a)) - i128::from(ordered_bits(b));
            u64::try_from(d.unsigned_abs()).unwrap_or(u64::MAX)
        }
    }
}

/// Error statistics of a computed buffer against its reference
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ErrorStats {
    /// Elements compared
    pub len: usize,
    /// Largest absolute error over finite pairs
    pub max_abs: f64,
    /// Mean absolute error over finite pairs
    pub mean_abs: f64,
    /// Largest relative error over finite pairs
    pub max_rel: f64,
    /// Largest ULP distance over finite pairs
    pub max_ulp: u64,
    /// Bit-identical elements
    pub exact: usize,
    /// Positions where the NaN/Inf classification differs
    pub mask_mismatches: usize,
}

impl ErrorStats {
    /// Compare `actual` against `expected`, element by element.
    ///
    /// Positions where either side is not finite are compared by
    /// classification only and do not contribute to the error maxima.
    /// Extra trailing elements on either side count as mask mismatches.
    pub fn compare(expected: &[f64], actual: &[f64]) -> Self {
        let mut stats = ErrorStats {
            len: expected.len().min(actual.len()),
            mask_mismatches: expected.len().abs_diff(actual.len()),
            ..Default::default()
        };
        let mut sum_abs = 0.0;
        let mut finite = 0usize;

        for (&e, &a) in expected.iter().zip(actual) {
            if e.to_bits() == a.to_bits() {
                stats.exact += 1;
            }
            if !e.is_finite() || !a.is_finite() {
                if !same_class(e, a) {
                    stats.mask_mismatches += 1;
                }
                continue;
            }

            let diff = (e - a).abs();
            sum_abs += diff;
            finite += 1;
            stats.max_abs = stats.max_abs.max(diff);
            stats.max_rel = stats.max_rel.max(relative_error(e, a));
            stats.max_ulp = stats.max_ulp.max(ulp_distance(e, a));
        }

        if finite > 0 {
            stats.mean_abs = sum_abs / finite as f64;
        }
        stats
    }

    /// Fraction of bit-identical elements, in percent
    pub fn match_rate(&self) -> f64 {
        if self.len == 0 {
            100.0
        } else {
            self.exact as f64 * 100.0 / self.len as f64
        }
    }

    /// Whether every element is bit-identical to the reference
    pub fn is_exact(&self) -> bool {
        self.mask_mismatches == 0 && self.exact == self.len
    }
}
