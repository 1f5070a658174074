//! Sorting and peak search over sampled curves.

/// Sort a sequence with a stable top-down merge sort.
///
/// Returns a new sorted vector and leaves the input untouched. Equal
/// elements keep their relative order.
pub fn merge_sort<T: PartialOrd + Clone>(seq: &[T]) -> Vec<T> {
    if seq.len() <= 1 {
        return seq.to_vec();
    }

    let middle = seq.len() / 2;
    let left = merge_sort(&seq[..middle]);
    let right = merge_sort(&seq[middle..]);

    let mut result = Vec::with_capacity(seq.len());
    let (mut i_left, mut i_right) = (0, 0);
    while i_left < left.len() && i_right < right.len() {
        if left[i_left] <= right[i_right] {
            result.push(left[i_left].clone());
            i_left += 1;
        } else {
            result.push(right[i_right].clone());
            i_right += 1;
        }
    }
    result.extend_from_slice(&left[i_left..]);
    result.extend_from_slice(&right[i_right..]);

    result
}

/// Index of the first occurrence of the largest element, or `None` if empty.
pub fn arg_max<T: PartialOrd>(seq: &[T]) -> Option<usize> {
    let mut max = seq.first()?;
    let mut i_max = 0;
    for (i, val) in seq.iter().enumerate().skip(1) {
        if val > max {
            max = val;
            i_max = i;
        }
    }
    Some(i_max)
}
