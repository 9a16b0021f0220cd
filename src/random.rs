//! Deterministic random number streams.
//!
//! Every worker of the parallel scheduler owns exactly one [`RandomStream`], created once per
//! run from `(seed, worker_count, worker_index)`. The same triple always reproduces the same
//! sequence of draws. The stream identifier mixes in the worker count, so running the same
//! seed with a different number of workers changes the sequence of *every* stream. Results
//! are reproducible for a fixed worker count, not across worker counts.
//!
//! The contact engine does not depend on `RandomStream` directly but on the [`ContactDraws`]
//! trait, so that tests can script the exact draws it sees.
use log::trace;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::StrideError;

/// Converts an event rate into the probability that at least one event happens.
#[inline]
pub fn rate_to_probability(rate: f64) -> f64 {
    1.0 - (-rate).exp()
}

/// The draws the contact engine makes. Implementors only provide `next_double()`.
pub trait ContactDraws {
    /// A uniform double in `[0, 1)`.
    fn next_double(&mut self) -> f64;

    /// Whether two individuals make contact, given the contact rate of the first one.
    #[inline]
    fn has_contact(&mut self, contact_rate: f64) -> bool {
        self.next_double() < rate_to_probability(contact_rate)
    }

    /// Whether a contact transmits the disease.
    #[inline]
    fn has_transmission(&mut self, transmission_rate: f64) -> bool {
        self.next_double() < rate_to_probability(transmission_rate)
    }

    /// Contact and transmission combined into a single draw.
    #[inline]
    fn has_contact_and_transmission(&mut self, contact_rate: f64, transmission_rate: f64) -> bool {
        self.next_double() < rate_to_probability(transmission_rate * contact_rate)
    }
}

/// Serialized position of a stream. The word position is kept as a string because it is a
/// 128 bit counter.
#[derive(Serialize, Deserialize)]
struct StreamState {
    seed: [u8; 32],
    stream: u64,
    word_pos: String,
}

#[derive(Clone, Debug)]
pub struct RandomStream {
    rng: ChaCha8Rng,
}

fn stream_id(worker_count: usize, worker_index: usize) -> u64 {
    ((worker_count as u64) << 32) | worker_index as u64
}

impl RandomStream {
    /// Creates the substream `worker_index` of `worker_count` substreams of `seed`.
    pub fn new(seed: u64, worker_count: usize, worker_index: usize) -> RandomStream {
        assert!(worker_count > 0, "a random stream needs at least one worker");
        assert!(
            worker_index < worker_count,
            "worker index {worker_index} out of range for {worker_count} workers"
        );
        trace!(
            "creating random stream {} of {} (seed={})",
            worker_index,
            worker_count,
            seed
        );
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(stream_id(worker_count, worker_index));
        RandomStream { rng }
    }

    /// Creates one stream per worker.
    pub fn for_workers(seed: u64, worker_count: usize) -> Vec<RandomStream> {
        (0..worker_count)
            .map(|worker_index| RandomStream::new(seed, worker_count, worker_index))
            .collect()
    }

    /// A uniform unsigned integer in `[0, max)`. Panics if `max == 0`.
    pub fn next_below(&mut self, max: u32) -> u32 {
        self.rng.random_range(0..max)
    }

    /// A raw 32 bit value, used to derive seeds for other streams.
    pub fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    /// Exports the complete generator position as text.
    pub fn state(&self) -> String {
        let state = StreamState {
            seed: self.rng.get_seed(),
            stream: self.rng.get_stream(),
            word_pos: self.rng.get_word_pos().to_string(),
        };
        // Serializing plain integers and byte arrays cannot fail.
        serde_json::to_string(&state).unwrap_or_default()
    }

    /// Restores a position previously exported with [`RandomStream::state()`].
    pub fn set_state(&mut self, state: &str) -> Result<(), StrideError> {
        let state: StreamState = serde_json::from_str(state)?;
        let word_pos: u128 = state.word_pos.parse().map_err(|_| {
            StrideError::CheckpointError(format!(
                "invalid random stream word position '{}'",
                state.word_pos
            ))
        })?;
        let mut rng = ChaCha8Rng::from_seed(state.seed);
        rng.set_stream(state.stream);
        rng.set_word_pos(word_pos);
        self.rng = rng;
        Ok(())
    }
}

impl ContactDraws for RandomStream {
    #[inline]
    fn next_double(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn draw(stream: &mut RandomStream, n: usize) -> Vec<f64> {
        (0..n).map(|_| stream.next_double()).collect()
    }

    #[test]
    fn same_triple_reproduces_sequence() {
        let mut a = RandomStream::new(42, 4, 2);
        let mut b = RandomStream::new(42, 4, 2);
        assert_eq!(draw(&mut a, 100), draw(&mut b, 100));
    }

    #[test]
    fn workers_get_independent_streams() {
        let mut streams = RandomStream::for_workers(42, 3);
        let first = draw(&mut streams[0], 10);
        let second = draw(&mut streams[1], 10);
        let third = draw(&mut streams[2], 10);
        assert_ne!(first, second);
        assert_ne!(second, third);
    }

    #[test]
    fn worker_count_changes_every_stream() {
        let mut two = RandomStream::new(42, 2, 0);
        let mut three = RandomStream::new(42, 3, 0);
        assert_ne!(draw(&mut two, 10), draw(&mut three, 10));
    }

    #[test]
    fn different_seeds_differ() {
        let mut a = RandomStream::new(1, 1, 0);
        let mut b = RandomStream::new(2, 1, 0);
        assert_ne!(draw(&mut a, 10), draw(&mut b, 10));
    }

    #[test]
    fn doubles_are_in_unit_interval() {
        let mut stream = RandomStream::new(7, 1, 0);
        for value in draw(&mut stream, 10_000) {
            assert!((0.0..1.0).contains(&value));
        }
    }

    #[test]
    fn bounded_integers_stay_in_range() {
        let mut stream = RandomStream::new(7, 1, 0);
        for _ in 0..10_000 {
            assert!(stream.next_below(13) < 13);
        }
        assert_eq!(stream.next_below(1), 0);
    }

    #[test]
    fn state_round_trip_continues_identically() {
        let mut original = RandomStream::new(99, 2, 1);
        // Advance to a position that is not a block boundary.
        draw(&mut original, 37);
        let state = original.state();

        let mut restored = RandomStream::new(0, 1, 0);
        restored.set_state(&state).unwrap();

        assert_eq!(draw(&mut original, 250), draw(&mut restored, 250));
    }

    #[test]
    fn invalid_state_is_an_error() {
        let mut stream = RandomStream::new(0, 1, 0);
        assert!(stream.set_state("not a state").is_err());
        let bad_position = r#"{"seed":[0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0],"stream":0,"word_pos":"x"}"#;
        assert!(matches!(
            stream.set_state(bad_position),
            Err(StrideError::CheckpointError(_))
        ));
    }

    #[test]
    fn probability_conversion() {
        assert_approx_eq!(rate_to_probability(0.0), 0.0);
        assert_approx_eq!(rate_to_probability(1.0), 1.0 - (-1.0f64).exp());
        assert_approx_eq!(rate_to_probability(f64::INFINITY), 1.0);
    }

    #[test]
    fn degenerate_rates() {
        let mut stream = RandomStream::new(3, 1, 0);
        for _ in 0..1000 {
            assert!(!stream.has_contact(0.0));
            assert!(!stream.has_transmission(0.0));
            assert!(stream.has_contact_and_transmission(f64::INFINITY, f64::INFINITY));
        }
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn worker_index_must_be_in_range() {
        let _ = RandomStream::new(0, 2, 2);
    }
}
