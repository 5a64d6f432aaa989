//! Independent, seeded random number streams.
//!
//! Each concern that needs randomness declares its own stream with `define_rng!`. Streams are
//! created lazily and seeded from the base seed given to `init_random` offset by a hash of the
//! stream's name, so adding draws to one stream never perturbs another, and a fixed base seed
//! always reproduces the same run.
mod context_ext;
mod macros;
mod sampling_algorithms;

use std::any::{Any, TypeId};
use std::hash::Hasher;

pub use context_ext::ContextRandomExt;
pub use macros::define_rng;
pub use sampling_algorithms::sample_multiple_from_known_length;

use crate::rand::SeedableRng;
use crate::{define_data_plugin, HashMap};

pub trait RngId: Copy + Clone + 'static {
    type RngType: SeedableRng;
    fn get_name() -> &'static str;
}

/// A deterministic hash of a `&str`, used to derive per-stream seeds.
pub(crate) fn hash_str(data: &str) -> u64 {
    let mut hasher = rustc_hash::FxHasher::default();
    hasher.write(data.as_bytes());
    hasher.finish()
}

// This is a wrapper that allows for different types of random number
// generators (anything that implements SeedableRng is valid).
struct RngHolder {
    rng: Box<dyn Any>,
}

struct RngData {
    base_seed: Option<u64>,
    rng_holders: HashMap<TypeId, RngHolder>,
}

// Registers a data container which stores:
// * base_seed: A base seed for all rngs, `None` until `init_random` is called
// * rng_holders: A map of rngs, keyed by their RngId.
define_data_plugin!(
    RngPlugin,
    RngData,
    RngData {
        base_seed: None,
        rng_holders: HashMap::default(),
    }
);

#[cfg(test)]
mod tests {
    use super::hash_str;

    #[test]
    fn hash_str_is_stable() {
        assert_eq!(hash_str("ExposureRng"), hash_str("ExposureRng"));
        assert_ne!(hash_str("ExposureRng"), hash_str("OutcomeRng"));
    }
}
