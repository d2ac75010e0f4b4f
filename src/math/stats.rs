//! Order statistics used by the robust reweighting loop.

/// Upper median: sort a copy and take the element at index `len / 2`.
///
/// For even lengths this is the larger of the two middle values, not their
/// mean. Returns `None` for an empty slice.
pub fn upper_median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    Some(sorted[sorted.len() / 2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upper_median_of_odd_length_is_middle() {
        assert_eq!(upper_median(&[5.0, 1.0, 3.0]), Some(3.0));
    }

    #[test]
    fn upper_median_of_even_length_takes_upper_middle() {
        assert_eq!(upper_median(&[4.0, 1.0, 3.0, 2.0]), Some(3.0));
    }

    #[test]
    fn upper_median_of_empty_is_none() {
        assert_eq!(upper_median(&[]), None);
    }

    #[test]
    fn upper_median_does_not_reorder_input() {
        let values = [2.0, 0.5, 1.0];
        let _ = upper_median(&values);
        assert_eq!(values, [2.0, 0.5, 1.0]);
    }
}
