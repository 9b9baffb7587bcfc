//! Chunked iteration helpers shared by every kernel.
//!
//! Elementwise kernels split the index range into fixed-size chunks. With the
//! `parallel` feature, buffers of at least [`PAR_THRESHOLD`] elements are spread
//! across the rayon pool; smaller buffers always run on the calling thread.
//!
//! Reductions sum each chunk separately and then fold the partial sums in chunk
//! order, on both paths. The summation order therefore depends only on `n`, which
//! keeps results bit-identical between runs and between serial and parallel builds.

/// Elements per chunk.
pub const CHUNK: usize = 8 * 1024;

/// Minimum buffer length before work is handed to the thread pool.
pub const PAR_THRESHOLD: usize = 64 * 1024;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[cfg(feature = "parallel")]
#[inline]
fn should_split(n: usize) -> bool {
    n >= PAR_THRESHOLD
}

/// `out[i] = f(x[i])`
pub fn unary<F>(out: &mut [f64], x: &[f64], f: F)
where
    F: Fn(f64) -> f64 + Sync + Send,
{
    debug_assert_eq!(out.len(), x.len());

    #[cfg(feature = "parallel")]
    {
        if should_split(out.len()) {
            out.par_chunks_mut(CHUNK)
                .zip(x.par_chunks(CHUNK))
                .for_each(|(o, i)| unary_serial(o, i, &f));
            return;
        }
    }

    unary_serial(out, x, &f);
}

#[inline]
fn unary_serial<F: Fn(f64) -> f64>(out: &mut [f64], x: &[f64], f: &F) {
    for (o, &v) in out.iter_mut().zip(x) {
        *o = f(v);
    }
}

/// `out[i] = f(a[i], b[i])`
pub fn binary<F>(out: &mut [f64], a: &[f64], b: &[f64], f: F)
where
    F: Fn(f64, f64) -> f64 + Sync + Send,
{
    debug_assert_eq!(out.len(), a.len());
    debug_assert_eq!(a.len(), b.len());

    #[cfg(feature = "parallel")]
    {
        if should_split(out.len()) {
            out.par_chunks_mut(CHUNK)
                .zip(a.par_chunks(CHUNK))
                .zip(b.par_chunks(CHUNK))
                .for_each(|((o, a), b)| binary_serial(o, a, b, &f));
            return;
        }
    }

    binary_serial(out, a, b, &f);
}

#[inline]
fn binary_serial<F: Fn(f64, f64) -> f64>(out: &mut [f64], a: &[f64], b: &[f64], f: &F) {
    for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
        *o = f(x, y);
    }
}

/// Two outputs from two inputs: `(xo[i], yo[i]) = f(xi[i], yi[i])`
pub fn pairwise<F>(xo: &mut [f64], yo: &mut [f64], xi: &[f64], yi: &[f64], f: F)
where
    F: Fn(f64, f64) -> (f64, f64) + Sync + Send,
{
    debug_assert_eq!(xo.len(), yo.len());
    debug_assert_eq!(xi.len(), yi.len());

    #[cfg(feature = "parallel")]
    {
        if should_split(xo.len()) {
            xo.par_chunks_mut(CHUNK)
                .zip(yo.par_chunks_mut(CHUNK))
                .zip(xi.par_chunks(CHUNK))
                .zip(yi.par_chunks(CHUNK))
                .for_each(|(((xo, yo), xi), yi)| pairwise_serial(xo, yo, xi, yi, &f));
            return;
        }
    }

    pairwise_serial(xo, yo, xi, yi, &f);
}

#[inline]
fn pairwise_serial<F: Fn(f64, f64) -> (f64, f64)>(
    xo: &mut [f64],
    yo: &mut [f64],
    xi: &[f64],
    yi: &[f64],
    f: &F,
) {
    for (((ox, oy), &x), &y) in xo.iter_mut().zip(yo.iter_mut()).zip(xi).zip(yi) {
        let (rx, ry) = f(x, y);
        *ox = rx;
        *oy = ry;
    }
}

/// `Σ f(a[i], b[i])`, summed per chunk then folded in chunk order.
pub fn sum_pairs<F>(a: &[f64], b: &[f64], f: F) -> f64
where
    F: Fn(f64, f64) -> f64 + Sync + Send,
{
    debug_assert_eq!(a.len(), b.len());

    #[cfg(feature = "parallel")]
    {
        if should_split(a.len()) {
            let partials: Vec<f64> = a
                .par_chunks(CHUNK)
                .zip(b.par_chunks(CHUNK))
                .map(|(a, b)| sum_serial(a, b, &f))
                .collect();
            return partials.iter().fold(0.0, |acc, &p| acc + p);
        }
    }

    a.chunks(CHUNK)
        .zip(b.chunks(CHUNK))
        .map(|(a, b)| sum_serial(a, b, &f))
        .fold(0.0, |acc, p| acc + p)
}

#[inline]
fn sum_serial<F: Fn(f64, f64) -> f64>(a: &[f64], b: &[f64], f: &F) -> f64 {
    let mut acc = 0.0;
    for (&x, &y) in a.iter().zip(b) {
        acc += f(x, y);
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unary_large_matches_serial() {
        let n = PAR_THRESHOLD + CHUNK / 2 + 3;
        let x: Vec<f64> = (0..n).map(|i| i as f64 * 0.5).collect();
        let mut out = vec![0.0; n];
        unary(&mut out, &x, |v| v * 2.0);
        for (o, v) in out.iter().zip(&x) {
            assert_eq!(*o, v * 2.0);
        }
    }

    #[test]
    fn test_sum_pairs_order_is_stable() {
        let n = PAR_THRESHOLD * 2 + 17;
        let a: Vec<f64> = (0..n).map(|i| (i as f64).sin()).collect();
        let b: Vec<f64> = (0..n).map(|i| (i as f64).cos()).collect();

        let first = sum_pairs(&a, &b, |x, y| x * y);
        for _ in 0..10 {
            assert_eq!(sum_pairs(&a, &b, |x, y| x * y).to_bits(), first.to_bits());
        }

        // Same fold as the serial path, spelled out
        let expected = a
            .chunks(CHUNK)
            .zip(b.chunks(CHUNK))
            .map(|(a, b)| a.iter().zip(b).fold(0.0, |acc, (x, y)| acc + x * y))
            .fold(0.0, |acc, p| acc + p);
        assert_eq!(first.to_bits(), expected.to_bits());
    }

    #[test]
    fn test_empty() {
        let mut out: Vec<f64> = vec![];
        unary(&mut out, &[], |v| v);
        binary(&mut out, &[], &[], |a, b| a + b);
        assert_eq!(sum_pairs(&[], &[], |a, b| a * b), 0.0);
    }
}
