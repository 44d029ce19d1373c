//! Byte-order conversion for multi-byte sample words
//!
//! The bank stores sample words big-endian; WAV and most PCM tooling expect
//! little-endian. Swapping is its own inverse, so one function serves both
//! directions.

/// Reverse the byte order within each consecutive `width`-byte word.
///
/// Widths 2, 3 and 4 swap; any other width returns the input unchanged
/// (8-bit audio needs no conversion). A trailing group shorter than `width`
/// is dropped, not passed through.
pub fn swap_word_order(data: &[u8], width: usize) -> Vec<u8> {
    if !(2..=4).contains(&width) {
        return data.to_vec();
    }

    let mut out = Vec::with_capacity(data.len() - data.len() % width);
    for word in data.chunks_exact(width) {
        out.extend(word.iter().rev());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_one_is_identity() {
        let data = [1u8, 2, 3];
        assert_eq!(swap_word_order(&data, 1), data);
    }

    #[test]
    fn test_swap_widths() {
        assert_eq!(swap_word_order(&[1, 2, 3, 4], 2), vec![2, 1, 4, 3]);
        assert_eq!(swap_word_order(&[1, 2, 3, 4, 5, 6], 3), vec![3, 2, 1, 6, 5, 4]);
        assert_eq!(swap_word_order(&[1, 2, 3, 4], 4), vec![4, 3, 2, 1]);
    }

    #[test]
    fn test_double_swap_is_identity() {
        let data: Vec<u8> = (0..48).collect();
        for width in 2..=4 {
            assert_eq!(swap_word_order(&swap_word_order(&data, width), width), data);
        }
    }

    #[test]
    fn test_trailing_partial_word_is_dropped() {
        // 7 bytes at width 2: the seventh byte has no partner and is cut.
        let data = [1u8, 2, 3, 4, 5, 6, 7];
        let once = swap_word_order(&data, 2);
        assert_eq!(once, vec![2, 1, 4, 3, 6, 5]);
        // Second application has nothing left to drop.
        assert_eq!(swap_word_order(&once, 2), vec![1, 2, 3, 4, 5, 6]);
    }
}
