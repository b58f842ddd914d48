//! Slice algorithms shared by the registry layer.

/// Partitions a sorted slice so the first occurrence of each distinct value
/// is on the left, in order, and duplicates are pushed to the right (in
/// unspecified order). Returns the start of the right partition.
///
/// The analogue of C++'s `std::unique`: callers typically follow this with
/// a truncation to the returned boundary. The slice must be sorted (or at
/// least have equal elements adjacent) for the result to be the set of
/// distinct values.
pub fn distinct_prefix<T: PartialEq>(slice: &mut [T]) -> usize {
    if slice.is_empty() {
        return 0;
    }

    let mut boundary = 1;
    for i in 1..slice.len() {
        if slice[boundary - 1] != slice[i] {
            slice.swap(boundary, i);
            boundary += 1;
        }
    }

    boundary
}
