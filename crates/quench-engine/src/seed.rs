//! Derivation of per-event and per-cycle seeds from the run seed.
//!
//! Every event gets its own seed, and every reuse cycle gets its own
//! seed, each a pure function of (run seed, index). Seeds are read from
//! a ChaCha8 keystream keyed by the run seed, with a separate stream per
//! domain, so event and cycle seeds never share keystream words.

use quench_core::{CycleIndex, EventIndex};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

const EVENT_STREAM: u64 = 0x6576_656e_7400_0001;
const CYCLE_STREAM: u64 = 0x6379_636c_6500_0002;

fn derive(run_seed: u64, stream: u64, index: u64) -> u64 {
    let mut rng = ChaCha8Rng::seed_from_u64(run_seed);
    rng.set_stream(stream);
    // Two 32-bit words per u64 output.
    rng.set_word_pos(u128::from(index) * 2);
    rng.next_u64()
}

/// Seed for downstream sampling on `event`.
pub fn event_seed(run_seed: u64, event: EventIndex) -> u64 {
    derive(run_seed, EVENT_STREAM, event.0)
}

/// Seed for upstream sampling throughout `cycle`.
pub fn cycle_seed(run_seed: u64, cycle: CycleIndex) -> u64 {
    derive(run_seed, CYCLE_STREAM, cycle.0)
}
