//! Amount splitting without residue loss.

use alloy::primitives::U256;

use crate::error::{CoreError, Result};

/// Split `total` into `count` chunks whose sum is exactly `total`.
///
/// `chunk = total / count`; the remainder `total % count` is spread one unit
/// at a time over the FIRST chunks, so `split_amount(1000, 3)` is
/// `[334, 333, 333]` and `max - min <= 1` always holds.
///
/// # Errors
/// `InvalidArgument` if `count == 0` or `total == 0`.
pub fn split_amount(total: U256, count: u32) -> Result<Vec<U256>> {
    if count == 0 {
        return Err(CoreError::invalid_argument("split count must be at least 1"));
    }
    if total.is_zero() {
        return Err(CoreError::invalid_argument("split total must be positive"));
    }

    let divisor = U256::from(count);
    let chunk = total / divisor;
    // remainder < count <= u32::MAX, so it lives in the low limb.
    let remainder = (total % divisor).as_limbs()[0] as usize;

    let chunks = (0..count as usize)
        .map(|i| if i < remainder { chunk + U256::from(1) } else { chunk })
        .collect();

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u(v: u64) -> U256 {
        U256::from(v)
    }

    fn sum(chunks: &[U256]) -> U256 {
        chunks.iter().fold(U256::ZERO, |acc, c| acc + *c)
    }

    #[test]
    fn test_remainder_goes_to_first_chunks() {
        assert_eq!(
            split_amount(u(1000), 3).unwrap(),
            vec![u(334), u(333), u(333)]
        );
        assert_eq!(
            split_amount(u(11), 4).unwrap(),
            vec![u(3), u(3), u(3), u(2)]
        );
    }

    #[test]
    fn test_exact_division() {
        assert_eq!(split_amount(u(900), 3).unwrap(), vec![u(300); 3]);
    }

    #[test]
    fn test_single_chunk() {
        assert_eq!(split_amount(u(42), 1).unwrap(), vec![u(42)]);
    }

    #[test]
    fn test_more_chunks_than_units() {
        let chunks = split_amount(u(2), 5).unwrap();
        assert_eq!(chunks, vec![u(1), u(1), u(0), u(0), u(0)]);
        assert_eq!(sum(&chunks), u(2));
    }

    #[test]
    fn test_conservation_and_spread() {
        for total in [1u64, 7, 999, 1_000_003, u64::MAX] {
            for count in [1u32, 2, 3, 7, 64, 1000] {
                let chunks = split_amount(u(total), count).unwrap();
                assert_eq!(chunks.len(), count as usize);
                assert_eq!(sum(&chunks), u(total));
                let max = chunks.iter().max().unwrap();
                let min = chunks.iter().min().unwrap();
                assert!(*max - *min <= u(1));
            }
        }
    }

    #[test]
    fn test_full_width_total() {
        let chunks = split_amount(U256::MAX, 3).unwrap();
        assert_eq!(sum(&chunks), U256::MAX);
    }

    #[test]
    fn test_zero_count_rejected() {
        assert!(matches!(
            split_amount(u(10), 0),
            Err(CoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_zero_total_rejected() {
        assert!(matches!(
            split_amount(U256::ZERO, 3),
            Err(CoreError::InvalidArgument(_))
        ));
    }
}
