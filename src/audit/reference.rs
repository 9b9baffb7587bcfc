//! Scalar reference implementations.
//!
//! Plain in-order loops with no chunking, fusion or reassociation. Every audit
//! measures the loaded kernels against these.

pub fn poly(x: &[f64]) -> Vec<f64> {
    x.iter().map(|&v| v * v * v + v * v + v).collect()
}

pub fn sin(x: &[f64]) -> Vec<f64> {
    x.iter().map(|v| v.sin()).collect()
}

pub fn cos(x: &[f64]) -> Vec<f64> {
    x.iter().map(|v| v.cos()).collect()
}

pub fn tan(x: &[f64]) -> Vec<f64> {
    x.iter().map(|v| v.tan()).collect()
}

fn zip_with(a: &[f64], b: &[f64], f: impl Fn(f64, f64) -> f64) -> Vec<f64> {
    a.iter().zip(b).map(|(&x, &y)| f(x, y)).collect()
}

pub fn add(a: &[f64], b: &[f64]) -> Vec<f64> {
    zip_with(a, b, |x, y| x + y)
}

pub fn sub(a: &[f64], b: &[f64]) -> Vec<f64> {
    zip_with(a, b, |x, y| x - y)
}

pub fn mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    zip_with(a, b, |x, y| x * y)
}

pub fn div(a: &[f64], b: &[f64]) -> Vec<f64> {
    zip_with(a, b, |x, y| x / y)
}

/// Left-to-right sum of products
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    let mut acc = 0.0;
    for (&x, &y) in a.iter().zip(b) {
        acc += x * y;
    }
    acc
}

pub fn magnitude(x: &[f64]) -> f64 {
    dot(x, x).sqrt()
}

/// Zero vector stays zero
pub fn normalize(x: &[f64]) -> Vec<f64> {
    let mag = magnitude(x);
    if mag == 0.0 {
        vec![0.0; x.len()]
    } else {
        x.iter().map(|v| v / mag).collect()
    }
}

pub fn scale(x: &[f64], factor: f64) -> Vec<f64> {
    x.iter().map(|v| v * factor).collect()
}

pub fn rotate2d(x: &[f64], y: &[f64], angle: f64) -> (Vec<f64>, Vec<f64>) {
    let (s, c) = (angle.sin(), angle.cos());
    x.iter()
        .zip(y)
        .map(|(&px, &py)| (px * c - py * s, px * s + py * c))
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_values() {
        assert_eq!(poly(&[2.0]), vec![14.0]);
        assert_eq!(dot(&[1.0, 2.0], &[3.0, 4.0]), 11.0);
        assert_eq!(magnitude(&[3.0, 4.0]), 5.0);
        assert_eq!(normalize(&[0.0, 0.0]), vec![0.0, 0.0]);
        assert_eq!(scale(&[1.5], 2.0), vec![3.0]);
        assert_eq!(div(&[1.0], &[0.0]), vec![f64::INFINITY]);

        let (rx, ry) = rotate2d(&[1.0], &[0.0], 0.0);
        assert_eq!((rx[0], ry[0]), (1.0, 0.0));
    }

    #[test]
    fn test_empty() {
        assert!(poly(&[]).is_empty());
        assert_eq!(dot(&[], &[]), 0.0);
        assert!(normalize(&[]).is_empty());
    }
}
