//! Random streams for the modules.
//!
//! Each module keys a ChaCha8 generator with the seed its context hands
//! it and selects its own stream, so two modules sharing a seed still
//! draw independent numbers.

use quench_core::TaskKind;
use quench_task::ExecContext;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Generator for a module of `kind` on the current event.
pub(crate) fn module_rng(ctx: &ExecContext<'_>, kind: TaskKind, stream: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(ctx.seed_for(kind));
    rng.set_stream(stream);
    rng
}

/// Standard normal sample using the Box-Muller transform.
pub(crate) fn gaussian(rng: &mut impl Rng) -> f64 {
    let u1: f64 = rng.random::<f64>().max(1e-300); // avoid ln(0)
    let u2: f64 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

/// Uniform sample in `(0, 1]`.
pub(crate) fn open_unit(rng: &mut impl Rng) -> f64 {
    1.0 - rng.random::<f64>()
}
