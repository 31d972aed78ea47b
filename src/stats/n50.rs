/// N50 of a set of sequence lengths.
///
/// Lengths are sorted descending and accumulated; the result is the first
/// length at which the running sum reaches half the total. An empty input, or
/// one whose total is zero, yields 0.
#[must_use]
pub fn n50(lengths: &[u64]) -> u64 {
    let mut sorted = lengths.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));

    let total: u128 = sorted.iter().map(|&l| u128::from(l)).sum();
    if total == 0 {
        return 0;
    }

    let mut running: u128 = 0;
    for length in sorted {
        running += u128::from(length);
        if running * 2 >= total {
            return length;
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_n50_worked_example() {
        assert_eq!(n50(&[100, 90, 80, 70, 60]), 80);
        assert_eq!(n50(&[60, 80, 100, 70, 90]), 80);
    }

    #[test]
    fn test_n50_degenerate() {
        assert_eq!(n50(&[]), 0);
        assert_eq!(n50(&[0, 0]), 0);
        assert_eq!(n50(&[42]), 42);
    }

    #[test]
    fn test_n50_exact_half() {
        // 100 of 200 is reached exactly at the first contig
        assert_eq!(n50(&[100, 50, 50]), 100);
        assert_eq!(n50(&[10, 10, 10, 10]), 10);
    }

    #[test]
    fn test_n50_large_values_do_not_overflow() {
        assert_eq!(n50(&[u64::MAX, u64::MAX, 1]), u64::MAX);
    }
}
