//! Particlization of the medium at freeze-out.

use std::f64::consts::TAU;

use quench_core::{ResourceKey, ResourceUse, TaskError, TaskKind};
use quench_resource::{Owner, Reader, RegistryError, ResourceRegistry};
use quench_task::{ExecContext, Task};
use rand::Rng;
use tracing::trace;

use crate::data::{Hadron, Medium};
use crate::keys;
use crate::rng::{module_rng, open_unit};

const STREAM: u64 = 0x736f_6674;
const PIONS: [i32; 3] = [211, -211, 111];

/// Samples thermal pions from a medium's freeze-out surface into
/// [`keys::SOFT_HADRONS`].
///
/// Multiplicity is the medium's total energy divided by the mean energy
/// per particle (`3 T_f`), capped at `max_hadrons`. Transverse momenta
/// follow a Boltzmann spectrum at the freeze-out temperature.
pub struct SurfaceSampler {
    medium: Reader<Medium>,
    hadrons: Owner<Vec<Hadron>>,
    max_hadrons: usize,
}

impl SurfaceSampler {
    /// Attach to `medium_key` and register [`keys::SOFT_HADRONS`].
    pub fn new(
        registry: &mut ResourceRegistry,
        medium_key: impl Into<ResourceKey>,
    ) -> Result<Self, RegistryError> {
        Ok(Self {
            medium: registry.reader(medium_key)?,
            hadrons: registry.register(keys::SOFT_HADRONS, Vec::new())?,
            max_hadrons: 5000,
        })
    }

    /// Upper bound on hadrons per event.
    pub fn max_hadrons(mut self, n: usize) -> Self {
        self.max_hadrons = n;
        self
    }
}

impl Task for SurfaceSampler {
    fn name(&self) -> &str {
        "surface_sampler"
    }

    fn resources(&self) -> Vec<ResourceUse> {
        vec![self.medium.usage(), self.hadrons.usage()]
    }

    fn exec(&mut self, ctx: &ExecContext<'_>) -> Result<(), TaskError> {
        let (energy, tf) = self
            .medium
            .read(|m| (m.total_energy, m.freeze_out_temperature))?;
        if tf.is_nan() || tf <= 0.0 {
            return Err(TaskError::failed(format!(
                "invalid freeze-out temperature {tf}"
            )));
        }

        let mut rng = module_rng(ctx, TaskKind::Downstream, STREAM);
        let mean = (energy.max(0.0) / (3.0 * tf)).min(self.max_hadrons as f64);
        // ±10 % multiplicity smearing.
        let n = (mean * rng.random_range(0.9..=1.1)).round() as usize;
        let n = n.min(self.max_hadrons);

        let hadrons: Vec<Hadron> = (0..n)
            .map(|_| {
                // Sum of two exponentials: p_T e^{-p_T/T} in 2D.
                let pt = -tf * (open_unit(&mut rng) * open_unit(&mut rng)).ln();
                Hadron {
                    pid: PIONS[rng.random_range(0..PIONS.len())],
                    pt,
                    eta: rng.random_range(-2.0..=2.0),
                    phi: rng.random::<f64>() * TAU,
                }
            })
            .collect();

        trace!(event = %ctx.event(), hadrons = hadrons.len(), "sampled freeze-out surface");
        self.hadrons.publish(ctx.event(), |h| *h = hadrons)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{plan, RUN};
    use quench_core::EventIndex;

    fn medium(total_energy: f64, freeze_out_temperature: f64) -> Medium {
        Medium {
            freeze_out_temperature,
            total_energy,
            ..Medium::default()
        }
    }

    #[test]
    fn multiplicity_tracks_medium_energy() {
        let mut reg = ResourceRegistry::new();
        let m = reg.register(keys::MEDIUM_2, Medium::default()).unwrap();
        let mut sampler = SurfaceSampler::new(&mut reg, keys::MEDIUM_2).unwrap();
        let out = reg.reader::<Vec<Hadron>>(keys::SOFT_HADRONS).unwrap();

        m.publish(EventIndex(0), |m| *m = medium(45.0, 0.15)).unwrap();
        let p = plan(0);
        sampler.exec(&ExecContext::new(&RUN, &p)).unwrap();

        // 45 / 0.45 = 100 hadrons, smeared by at most 10 %.
        let hadrons = out.read(Clone::clone).unwrap();
        assert!((90..=110).contains(&hadrons.len()));
        assert!(hadrons.iter().all(|h| h.pt > 0.0 && PIONS.contains(&h.pid)));
    }

    #[test]
    fn multiplicity_is_capped() {
        let mut reg = ResourceRegistry::new();
        let m = reg.register(keys::MEDIUM_2, Medium::default()).unwrap();
        let mut sampler = SurfaceSampler::new(&mut reg, keys::MEDIUM_2)
            .unwrap()
            .max_hadrons(10);
        let out = reg.reader::<Vec<Hadron>>(keys::SOFT_HADRONS).unwrap();

        m.publish(EventIndex(0), |m| *m = medium(1.0e6, 0.15)).unwrap();
        let p = plan(0);
        sampler.exec(&ExecContext::new(&RUN, &p)).unwrap();
        assert_eq!(out.read(Vec::len).unwrap(), 10);
    }

    #[test]
    fn unset_freeze_out_temperature_fails() {
        let mut reg = ResourceRegistry::new();
        let m = reg.register(keys::MEDIUM_2, Medium::default()).unwrap();
        let mut sampler = SurfaceSampler::new(&mut reg, keys::MEDIUM_2).unwrap();
        m.publish(EventIndex(0), |m| *m = medium(10.0, 0.0)).unwrap();
        let p = plan(0);
        match sampler.exec(&ExecContext::new(&RUN, &p)) {
            Err(TaskError::ExecutionFailed { reason }) => {
                assert!(reason.contains("freeze-out"));
            }
            other => panic!("expected ExecutionFailed, got {other:?}"),
        }
    }
}
