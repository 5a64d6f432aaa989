//! Uniform sampling without replacement over containers that can only be iterated.

use crate::rand::seq::index::sample as choose_range;
use crate::rand::Rng;

/// Sample multiple random elements uniformly without replacement from a container of known length.
/// If more samples are requested than are in the container, every element is returned.
///
/// We do not assume the container is randomly indexable, only that it can be iterated over. The
/// selected elements are returned in iteration order.
pub fn sample_multiple_from_known_length<I, R, T>(rng: &mut R, iter: I, requested: usize) -> Vec<T>
where
    R: Rng,
    I: IntoIterator<Item = T> + ExactSizeIterator<Item = T>,
{
    let length = iter.len();
    let requested = requested.min(length);
    if requested == 0 {
        return Vec::new();
    }

    let mut indexes = Vec::with_capacity(requested);
    indexes.extend(choose_range(rng, length, requested));
    indexes.sort_unstable();
    let mut index_iterator = indexes.into_iter();
    let mut next_idx = index_iterator.next();
    let mut selected = Vec::with_capacity(requested);

    for (idx, item) in iter.enumerate() {
        if Some(idx) == next_idx {
            selected.push(item);
            next_idx = index_iterator.next();
            if next_idx.is_none() {
                break;
            }
        }
    }

    selected
}
