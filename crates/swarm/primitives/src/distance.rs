use core::cmp::Ordering;

use crate::OverlayAddress;

pub trait Distance {
    /// Returns true if self is closer to `a` than `y` is.
    fn closer(&self, a: &Self, y: &Self) -> bool;
}

impl Distance for OverlayAddress {
    fn closer(&self, a: &Self, y: &Self) -> bool {
        matches!(distance_cmp(a, self, y), Ordering::Greater)
    }
}

/// Compares `x` and `y` by their XOR distance to `a`.
///
/// Returns:
///   - `Ordering::Greater` if `x` is closer to `a` than `y`
///   - `Ordering::Equal` if `x` and `y` are equidistant from `a` (only when
///     `x == y`)
///   - `Ordering::Less` if `x` is farther from `a` than `y`
#[inline(always)]
pub fn distance_cmp(a: &OverlayAddress, x: &OverlayAddress, y: &OverlayAddress) -> Ordering {
    for ((ab, xb), yb) in a.iter().zip(x.iter()).zip(y.iter()) {
        let dx = xb ^ ab;
        let dy = yb ^ ab;

        if dx != dy {
            return dy.cmp(&dx);
        }
    }

    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;

    #[test]
    fn distance_closer() {
        let a = b256!("9100000000000000000000000000000000000000000000000000000000000000");
        let x = b256!("8200000000000000000000000000000000000000000000000000000000000000");
        let y = b256!("1200000000000000000000000000000000000000000000000000000000000000");

        assert!(x.closer(&a, &y));
        assert!(!y.closer(&a, &x));
    }

    macro_rules! distance_cmp_test {
        ($test_name:ident, $ordering:expr, $a:expr, $x:expr, $y:expr) => {
            #[test]
            fn $test_name() {
                assert_eq!(distance_cmp(&b256!($a), &b256!($x), &b256!($y)), $ordering);
            }
        };
    }

    distance_cmp_test!(
        distance_cmp_eq,
        Ordering::Equal,
        "9100000000000000000000000000000000000000000000000000000000000000",
        "1200000000000000000000000000000000000000000000000000000000000000",
        "1200000000000000000000000000000000000000000000000000000000000000"
    );

    distance_cmp_test!(
        distance_cmp_lt,
        Ordering::Less,
        "9100000000000000000000000000000000000000000000000000000000000000",
        "1200000000000000000000000000000000000000000000000000000000000000",
        "8200000000000000000000000000000000000000000000000000000000000000"
    );

    distance_cmp_test!(
        distance_cmp_gt,
        Ordering::Greater,
        "9100000000000000000000000000000000000000000000000000000000000000",
        "8200000000000000000000000000000000000000000000000000000000000000",
        "1200000000000000000000000000000000000000000000000000000000000000"
    );
}
