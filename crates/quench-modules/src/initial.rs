//! Initial state and pre-equilibrium dynamics.

use std::f64::consts::PI;

use quench_core::{ResourceUse, TaskError, TaskKind};
use quench_resource::{Owner, Reader, RegistryError, ResourceRegistry};
use quench_task::{ExecContext, Task};
use rand::Rng;
use tracing::trace;

use crate::data::{Grid, InitialState, PreEquilibrium};
use crate::keys;
use crate::rng::{gaussian, module_rng};

const TRENTO_STREAM: u64 = 0x7472_656e_746f;

// ── TrentoInitial ──────────────────────────────────────────────────

/// Samples an impact parameter and a fluctuating entropy profile for two
/// Gaussian nuclei, publishing it as [`keys::INITIAL_STATE`].
///
/// Upstream: drawn from the cycle seed, so every event of a reuse cycle
/// shares the same initial state.
pub struct TrentoInitial {
    state: Owner<InitialState>,
    grid_size: usize,
    grid_spacing: f64,
    nucleus_width: f64,
    max_impact_parameter: f64,
    fluctuation: f64,
    norm: f64,
}

impl TrentoInitial {
    /// Register [`keys::INITIAL_STATE`] and create the module with a
    /// 20 × 20 grid of 0.5 fm cells.
    pub fn new(registry: &mut ResourceRegistry) -> Result<Self, RegistryError> {
        Ok(Self {
            state: registry.register(keys::INITIAL_STATE, InitialState::default())?,
            grid_size: 20,
            grid_spacing: 0.5,
            nucleus_width: 2.5,
            max_impact_parameter: 8.0,
            fluctuation: 0.5,
            norm: 20.0,
        })
    }

    /// Grid shape.
    pub fn grid(mut self, size: usize, spacing: f64) -> Self {
        self.grid_size = size;
        self.grid_spacing = spacing;
        self
    }

    /// Upper bound of the impact-parameter distribution, in fm.
    pub fn max_impact_parameter(mut self, b: f64) -> Self {
        self.max_impact_parameter = b;
        self
    }

    fn thickness(&self, x: f64, y: f64) -> f64 {
        let w2 = self.nucleus_width * self.nucleus_width;
        (-(x * x + y * y) / (2.0 * w2)).exp() / (2.0 * PI * w2)
    }
}

impl Task for TrentoInitial {
    fn name(&self) -> &str {
        "trento"
    }

    fn kind(&self) -> TaskKind {
        TaskKind::Upstream
    }

    fn resources(&self) -> Vec<ResourceUse> {
        vec![self.state.usage()]
    }

    fn exec(&mut self, ctx: &ExecContext<'_>) -> Result<(), TaskError> {
        let mut rng = module_rng(ctx, TaskKind::Upstream, TRENTO_STREAM);
        // P(b) ∝ b on [0, b_max].
        let b = self.max_impact_parameter * rng.random::<f64>().sqrt();

        let mut entropy = Grid::new(self.grid_size, self.grid_spacing);
        let sigma = self.fluctuation;
        for iy in 0..self.grid_size {
            for ix in 0..self.grid_size {
                let (x, y) = (entropy.coord(ix), entropy.coord(iy));
                let ta = self.thickness(x - 0.5 * b, y);
                let tb = self.thickness(x + 0.5 * b, y);
                let weight = (sigma * gaussian(&mut rng) - 0.5 * sigma * sigma).exp();
                entropy.values[iy * self.grid_size + ix] = self.norm * (ta * tb).sqrt() * weight;
            }
        }

        trace!(
            event = %ctx.event(),
            impact_parameter = b,
            total_entropy = entropy.integral(),
            "sampled initial state"
        );
        self.state.publish(ctx.event(), |state| {
            *state = InitialState {
                impact_parameter: b,
                entropy,
            }
        })?;
        Ok(())
    }
}

// ── NullPreDynamics ────────────────────────────────────────────────

/// Free streaming is skipped: converts entropy to energy density with a
/// conformal equation of state (`e ∝ s^{4/3}`) and starts hydro at
/// `tau0`.
pub struct NullPreDynamics {
    initial: Reader<InitialState>,
    output: Owner<PreEquilibrium>,
    tau0: f64,
}

impl NullPreDynamics {
    /// Attach to [`keys::INITIAL_STATE`] and register
    /// [`keys::PREEQUILIBRIUM`]. `tau0` defaults to 0.6 fm/c.
    pub fn new(registry: &mut ResourceRegistry) -> Result<Self, RegistryError> {
        Ok(Self {
            initial: registry.reader(keys::INITIAL_STATE)?,
            output: registry.register(keys::PREEQUILIBRIUM, PreEquilibrium::default())?,
            tau0: 0.6,
        })
    }

    /// Hydro start time in fm/c.
    pub fn tau0(mut self, tau0: f64) -> Self {
        self.tau0 = tau0;
        self
    }
}

impl Task for NullPreDynamics {
    fn name(&self) -> &str {
        "pre_dynamics"
    }

    fn kind(&self) -> TaskKind {
        TaskKind::Upstream
    }

    fn resources(&self) -> Vec<ResourceUse> {
        vec![self.initial.usage(), self.output.usage()]
    }

    fn exec(&mut self, ctx: &ExecContext<'_>) -> Result<(), TaskError> {
        let tau0 = self.tau0;
        let energy_density = self
            .initial
            .read(|s| s.entropy.map(|s| s.max(0.0).powf(4.0 / 3.0) / tau0))?;
        self.output.publish(ctx.event(), |p| {
            *p = PreEquilibrium {
                tau0,
                energy_density,
            }
        })?;
        Ok(())
    }
}
