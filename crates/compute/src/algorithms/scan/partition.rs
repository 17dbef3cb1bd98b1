use std::ops::Range;

/// Elements of block `lane` when `len` elements are split across `lanes`
/// blocks: `[lane * len / lanes, (lane + 1) * len / lanes)`.
///
/// Consecutive lanes tile `0..len` with no gaps or overlaps. When
/// `lanes > len` some ranges are empty.
pub fn block_range(lane: usize, len: usize, lanes: usize) -> Range<usize> {
    debug_assert!(lanes > 0 && lane < lanes);
    let bound = |k: usize| ((k as u128 * len as u128) / lanes as u128) as usize;
    bound(lane)..bound(lane + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_tiles(len: usize, lanes: usize) {
        let mut owner = vec![usize::MAX; len];
        let mut expected_start = 0;
        for lane in 0..lanes {
            let range = block_range(lane, len, lanes);
            assert_eq!(range.start, expected_start, "gap before lane {lane} ({len}/{lanes})");
            assert!(range.start <= range.end);
            for i in range.clone() {
                assert_eq!(owner[i], usize::MAX, "element {i} claimed twice ({len}/{lanes})");
                owner[i] = lane;
            }
            expected_start = range.end;
        }
        assert_eq!(expected_start, len);
        assert!(owner.iter().all(|&o| o != usize::MAX));
    }

    #[test]
    fn ranges_are_disjoint_and_cover() {
        for len in [0, 1, 2, 7, 8, 9, 63, 64, 100, 1000, 8001] {
            for lanes in [1, 2, 3, 7, 8, 13, 64] {
                assert_tiles(len, lanes);
            }
        }
    }

    #[test]
    fn balanced_split_sizes_differ_by_at_most_one() {
        let sizes: Vec<usize> = (0..8).map(|l| block_range(l, 8003, 8).len()).collect();
        let min = *sizes.iter().min().unwrap();
        let max = *sizes.iter().max().unwrap();
        assert!(max - min <= 1, "{sizes:?}");
        assert_eq!(sizes.iter().sum::<usize>(), 8003);
    }

    #[test]
    fn more_lanes_than_elements_gives_empty_blocks() {
        let ranges: Vec<_> = (0..8).map(|l| block_range(l, 3, 8)).collect();
        assert_eq!(ranges.iter().filter(|r| r.is_empty()).count(), 5);
        assert_eq!(ranges.iter().map(|r| r.len()).sum::<usize>(), 3);
        assert_tiles(3, 8);
    }

    #[test]
    fn no_overflow_near_usize_max() {
        let len = usize::MAX / 2;
        let range = block_range(3, len, 4);
        assert_eq!(range.end, len);
        assert!(range.start > len / 2);
    }
}
