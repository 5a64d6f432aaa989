use std::any::TypeId;

use log::trace;

use crate::rand::distr::uniform::{SampleRange, SampleUniform};
use crate::rand::{Rng, SeedableRng};
use crate::random::{hash_str, sample_multiple_from_known_length, RngHolder, RngId, RngPlugin};
use crate::Context;

/// Gets a mutable reference to the random number generator associated with the given
/// [`RngId`]. If the Rng has not been used before, one will be created with the base seed
/// you defined in `init_random`. Note that this will panic if `init_random` was not called yet.
fn get_rng<R: RngId>(context: &mut Context) -> &mut R::RngType {
    let data_container = context.get_data_container_mut(RngPlugin);
    let base_seed = data_container
        .base_seed
        .expect("random module is not initialized; call `init_random` first");

    data_container
        .rng_holders
        .entry(TypeId::of::<R>())
        // Create a new rng holder if it doesn't exist yet
        .or_insert_with(|| {
            trace!(
                "creating new RNG (seed={}) for stream {}",
                base_seed,
                R::get_name()
            );
            let seed_offset = hash_str(R::get_name());
            RngHolder {
                rng: Box::new(R::RngType::seed_from_u64(
                    base_seed.wrapping_add(seed_offset),
                )),
            }
        })
        .rng
        .downcast_mut::<R::RngType>()
        .unwrap() // Will never panic as the holder was created for this `RngId`
}

// This is a trait extension on Context for
// random number generation functionality.
pub trait ContextRandomExt {
    /// Initializes the `RngPlugin` data container to store rngs as well as a base
    /// seed. Note that rngs are created lazily when they are first sampled.
    fn init_random(&mut self, base_seed: u64);

    /// Whether `init_random` has been called, i.e. sampling will not panic.
    fn is_random_initialized(&self) -> bool;

    /// Gets a random sample from the random number generator associated with the given
    /// [`RngId`] by applying the specified sampler function.
    fn sample<R: RngId, T>(&mut self, rng_id: R, sampler: impl FnOnce(&mut R::RngType) -> T) -> T;

    /// Gets a random sample within the range provided by `range`
    /// using the generator associated with the given [`RngId`].
    fn sample_range<R: RngId, S, T>(&mut self, rng_id: R, range: S) -> T
    where
        R::RngType: Rng,
        S: SampleRange<T>,
        T: SampleUniform;

    /// Gets a continuous sample uniformly distributed in `[0, 1)`.
    fn sample_uniform<R: RngId>(&mut self, rng_id: R) -> f64
    where
        R::RngType: Rng;

    /// Gets a random boolean value which is true with probability `p`
    /// using the generator associated with the given [`RngId`].
    fn sample_bool<R: RngId>(&mut self, rng_id: R, p: f64) -> bool
    where
        R::RngType: Rng;

    /// Picks `requested` distinct values from `0..population` uniformly at random, returned in
    /// ascending order. Returns all of `0..population` if more are requested than exist.
    fn sample_without_replacement<R: RngId>(
        &mut self,
        rng_id: R,
        population: usize,
        requested: usize,
    ) -> Vec<usize>
    where
        R::RngType: Rng;
}

impl ContextRandomExt for Context {
    fn init_random(&mut self, base_seed: u64) {
        trace!("initializing random module");
        let data_container = self.get_data_container_mut(RngPlugin);
        data_container.base_seed = Some(base_seed);

        // Clear any existing Rngs to ensure they get re-seeded when `get_rng` is called
        data_container.rng_holders.clear();
    }

    fn is_random_initialized(&self) -> bool {
        self.get_data_container(RngPlugin)
            .is_some_and(|data_container| data_container.base_seed.is_some())
    }

    fn sample<R: RngId, T>(&mut self, _rng_id: R, sampler: impl FnOnce(&mut R::RngType) -> T) -> T {
        let rng = get_rng::<R>(self);
        sampler(rng)
    }

    fn sample_range<R: RngId, S, T>(&mut self, rng_id: R, range: S) -> T
    where
        R::RngType: Rng,
        S: SampleRange<T>,
        T: SampleUniform,
    {
        self.sample(rng_id, |rng| rng.random_range(range))
    }

    fn sample_uniform<R: RngId>(&mut self, rng_id: R) -> f64
    where
        R::RngType: Rng,
    {
        self.sample(rng_id, |rng| rng.random::<f64>())
    }

    fn sample_bool<R: RngId>(&mut self, rng_id: R, p: f64) -> bool
    where
        R::RngType: Rng,
    {
        self.sample(rng_id, |rng| rng.random_bool(p))
    }

    fn sample_without_replacement<R: RngId>(
        &mut self,
        rng_id: R,
        population: usize,
        requested: usize,
    ) -> Vec<usize>
    where
        R::RngType: Rng,
    {
        self.sample(rng_id, |rng| {
            sample_multiple_from_known_length(rng, 0..population, requested)
        })
    }
}
