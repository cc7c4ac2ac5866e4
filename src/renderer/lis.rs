//! Longest strictly increasing subsequence.

/// Indices of one longest strictly increasing subsequence of `arr`, in
/// ascending order.
///
/// Entries equal to `0` mean "no old counterpart" in the keyed diff and are
/// never part of the result. Runs in O(n log n): `tails[k]` holds the index
/// of the smallest tail of an increasing run of length `k + 1`, and
/// `prev[i]` the predecessor of `i` in the run ending at `i`.
pub fn get_sequence(arr: &[usize]) -> Vec<usize> {
    let mut prev = vec![0usize; arr.len()];
    let mut tails: Vec<usize> = Vec::with_capacity(arr.len());

    for (i, &value) in arr.iter().enumerate() {
        if value == 0 {
            continue;
        }
        if let Some(&last) = tails.last() {
            if arr[last] < value {
                prev[i] = last;
                tails.push(i);
                continue;
            }
        }
        // First tail whose value is >= `value`.
        let pos = tails.partition_point(|&t| arr[t] < value);
        if pos > 0 {
            prev[i] = tails[pos - 1];
        }
        if pos < tails.len() {
            tails[pos] = i;
        } else {
            tails.push(i);
        }
    }

    let mut result = vec![0usize; tails.len()];
    let mut cursor = tails.last().copied();
    for slot in result.iter_mut().rev() {
        let Some(i) = cursor else {
            break;
        };
        *slot = i;
        cursor = Some(prev[i]);
    }
    result
}
