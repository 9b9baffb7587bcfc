//! Property tests for the kernel contract.

use aranya_prime::audit::{reference, Tolerance};
use aranya_prime::{KernelError, Kernels};
use proptest::prelude::*;

fn finite_vec(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1e6f64..1e6, 0..max_len)
}

/// Two finite vectors of equal length
fn finite_pair(max_len: usize) -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    (0..max_len).prop_flat_map(|n| {
        (
            prop::collection::vec(-1e6f64..1e6, n),
            prop::collection::vec(-1e6f64..1e6, n),
        )
    })
}

proptest! {
    /// add is commutative and bit-identical to IEEE-754 addition.
    #[test]
    fn prop_add_commutative_and_exact((a, b) in finite_pair(256)) {
        let k = Kernels::builtin();
        let ab = k.add(&a, &b).unwrap();
        let ba = k.add(&b, &a).unwrap();
        for i in 0..a.len() {
            prop_assert_eq!(ab[i].to_bits(), ba[i].to_bits());
            prop_assert_eq!(ab[i].to_bits(), (a[i] + b[i]).to_bits());
        }
    }

    /// Rotation by any angle keeps every point at the same distance from the origin.
    #[test]
    fn prop_rotation_norm_invariant(
        (x, y) in finite_pair(256),
        angle in -100.0f64..100.0,
    ) {
        let k = Kernels::builtin();
        let (rx, ry) = k.rotate2d(&x, &y, angle).unwrap();
        for i in 0..x.len() {
            let before = x[i].hypot(y[i]);
            let after = rx[i].hypot(ry[i]);
            prop_assert!(
                (after - before).abs() <= 1e-12 * before.max(1.0),
                "point {} moved from {} to {}", i, before, after
            );
        }
    }

    /// poly agrees with the scalar reference for any finite input.
    #[test]
    fn prop_poly_matches_reference(x in finite_vec(512)) {
        let out = Kernels::builtin().poly(&x).unwrap();
        prop_assert_eq!(Tolerance::default().first_violation(&reference::poly(&x), &out), None);
    }

    /// Unequal lengths are always rejected before the kernel runs.
    #[test]
    fn prop_mismatch_rejected(a in finite_vec(64), b in finite_vec(64)) {
        prop_assume!(a.len() != b.len());
        let k = Kernels::builtin();
        let is_mismatch = |r: Result<Vec<f64>, KernelError>| {
            matches!(r, Err(KernelError::LengthMismatch { .. }))
        };
        prop_assert!(is_mismatch(k.add(&a, &b)));
        prop_assert!(is_mismatch(k.div(&a, &b)));
        prop_assert!(k.dot(&a, &b).is_err());
    }

    /// A normalized non-zero vector has unit length.
    #[test]
    fn prop_normalize_unit_length(x in finite_vec(128)) {
        let k = Kernels::builtin();
        let mag = k.magnitude(&x).unwrap();
        let unit = k.normalize(&x).unwrap();
        if mag == 0.0 {
            prop_assert!(unit.iter().all(|&v| v == 0.0));
        } else {
            prop_assert!((k.magnitude(&unit).unwrap() - 1.0).abs() < 1e-12);
        }
    }
}
