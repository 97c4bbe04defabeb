//! Hadronization of the final partons, plus a parton-level printer.

use quench_core::{ResourceUse, TaskError, TaskKind};
use quench_resource::{Owner, Reader, RegistryError, ResourceRegistry};
use quench_task::{ExecContext, FinishContext, Task};
use rand::Rng;
use tracing::{debug, info};

use crate::data::{wrap_phi, Hadron, Parton};
use crate::keys;
use crate::rng::{gaussian, module_rng};

const STREAM: u64 = 0x6861_6472;
const HADRON_SPECIES: [i32; 5] = [211, -211, 111, 321, -321];

// ── PartonPrinter ──────────────────────────────────────────────────

/// Logs a one-line summary of [`keys::FINAL_PARTONS`] per event.
pub struct PartonPrinter {
    partons: Reader<Vec<Parton>>,
    printed: u64,
}

impl PartonPrinter {
    /// Attach to [`keys::FINAL_PARTONS`].
    pub fn new(registry: &mut ResourceRegistry) -> Result<Self, RegistryError> {
        Ok(Self {
            partons: registry.reader(keys::FINAL_PARTONS)?,
            printed: 0,
        })
    }
}

impl Task for PartonPrinter {
    fn name(&self) -> &str {
        "parton_printer"
    }

    fn resources(&self) -> Vec<ResourceUse> {
        vec![self.partons.usage()]
    }

    fn exec(&mut self, ctx: &ExecContext<'_>) -> Result<(), TaskError> {
        let (count, total_pt, leading) = self.partons.read(|partons| {
            let total: f64 = partons.iter().map(|p| p.pt).sum();
            let leading = partons.iter().map(|p| p.pt).fold(0.0, f64::max);
            (partons.len(), total, leading)
        })?;
        debug!(
            event = %ctx.event(),
            partons = count,
            total_pt,
            leading_pt = leading,
            "final partons"
        );
        self.printed += 1;
        Ok(())
    }

    fn finish(&mut self, ctx: &FinishContext<'_>) -> Result<(), TaskError> {
        info!(
            events = self.printed,
            aborted = ctx.aborted(),
            "parton printer done"
        );
        Ok(())
    }
}

// ── ColorlessHadronization ─────────────────────────────────────────

/// Fragments every final parton independently into a chain of hadrons.
///
/// Each parton is cut into `1 + ⌊p_T / 2 GeV⌋` hadrons (at most
/// `max_per_parton`) with random momentum fractions that sum to one, so
/// the summed `p_T` of [`keys::HADRONS`] equals that of the input
/// partons.
pub struct ColorlessHadronization {
    partons: Reader<Vec<Parton>>,
    hadrons: Owner<Vec<Hadron>>,
    max_per_parton: usize,
}

impl ColorlessHadronization {
    /// Attach to [`keys::FINAL_PARTONS`] and register [`keys::HADRONS`].
    pub fn new(registry: &mut ResourceRegistry) -> Result<Self, RegistryError> {
        Ok(Self {
            partons: registry.reader(keys::FINAL_PARTONS)?,
            hadrons: registry.register(keys::HADRONS, Vec::new())?,
            max_per_parton: 8,
        })
    }

    fn fragment(&self, parton: &Parton, rng: &mut impl Rng, out: &mut Vec<Hadron>) {
        let n = (1 + (parton.pt / 2.0) as usize).clamp(1, self.max_per_parton.max(1));
        let weights: Vec<f64> = (0..n).map(|_| rng.random_range(0.1..1.0)).collect();
        let norm: f64 = weights.iter().sum();
        for w in weights {
            out.push(Hadron {
                pid: HADRON_SPECIES[rng.random_range(0..HADRON_SPECIES.len())],
                pt: parton.pt * w / norm,
                eta: parton.eta + 0.3 * gaussian(rng),
                phi: wrap_phi(parton.phi + 0.3 * gaussian(rng)),
            });
        }
    }
}

impl Task for ColorlessHadronization {
    fn name(&self) -> &str {
        "colorless"
    }

    fn resources(&self) -> Vec<ResourceUse> {
        vec![self.partons.usage(), self.hadrons.usage()]
    }

    fn exec(&mut self, ctx: &ExecContext<'_>) -> Result<(), TaskError> {
        let mut rng = module_rng(ctx, TaskKind::Downstream, STREAM);
        let partons = self.partons.read(Clone::clone)?;
        let mut hadrons = Vec::new();
        for parton in partons.iter().filter(|p| p.pt > 0.0) {
            self.fragment(parton, &mut rng, &mut hadrons);
        }
        debug!(
            event = %ctx.event(),
            partons = partons.len(),
            hadrons = hadrons.len(),
            "hadronized"
        );
        self.hadrons.publish(ctx.event(), |h| *h = hadrons)?;
        Ok(())
    }
}
