//! Toy ideal hydrodynamics with Bjorken cooling.

use quench_core::{ResourceKey, ResourceUse, TaskError, TaskKind};
use quench_resource::{Owner, Reader, RegistryError, ResourceRegistry};
use quench_task::{ExecContext, Task};
use tracing::{debug, trace};

use crate::data::{Liquefier, Medium, PreEquilibrium};
use crate::keys;

/// Evolves the pre-equilibrium energy density into a [`Medium`].
///
/// Temperature follows a conformal equation of state, `T = c · e^{1/4}`,
/// and the hottest cell cools as `T(τ) = T₀ (τ₀/τ)^{1/3}` until it
/// reaches the freeze-out temperature.
///
/// Without a liquefier the stage is [`TaskKind::Upstream`] and is reused
/// across a reuse cycle. With one attached it must absorb the jets of
/// every event, so it becomes [`TaskKind::Downstream`] and drains the
/// liquefier into the energy density before evolving.
pub struct MusicHydro {
    id: String,
    source: Reader<PreEquilibrium>,
    medium: Owner<Medium>,
    liquefier: Option<Owner<Liquefier>>,
    eos_coefficient: f64,
    freeze_out_temperature: f64,
}

impl MusicHydro {
    /// Attach to [`keys::PREEQUILIBRIUM`] and register the medium under
    /// `medium_key`.
    pub fn new(
        id: impl Into<String>,
        registry: &mut ResourceRegistry,
        medium_key: impl Into<ResourceKey>,
    ) -> Result<Self, RegistryError> {
        Ok(Self {
            id: id.into(),
            source: registry.reader(keys::PREEQUILIBRIUM)?,
            medium: registry.register(medium_key, Medium::default())?,
            liquefier: None,
            eos_coefficient: 0.3,
            freeze_out_temperature: 0.15,
        })
    }

    /// Take ownership of a liquefier. Jet deposits made earlier in the
    /// event are drained into this stage's medium.
    pub fn with_liquefier(mut self, liquefier: Owner<Liquefier>) -> Self {
        self.liquefier = Some(liquefier);
        self
    }

    /// Freeze-out temperature in GeV. Default: 0.15.
    pub fn freeze_out_temperature(mut self, t: f64) -> Self {
        self.freeze_out_temperature = t;
        self
    }
}

impl Task for MusicHydro {
    fn name(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> TaskKind {
        if self.liquefier.is_some() {
            TaskKind::Downstream
        } else {
            TaskKind::Upstream
        }
    }

    fn resources(&self) -> Vec<ResourceUse> {
        let mut uses = vec![self.source.usage(), self.medium.usage()];
        uses.extend(self.liquefier.as_ref().map(Owner::usage));
        uses
    }

    fn exec(&mut self, ctx: &ExecContext<'_>) -> Result<(), TaskError> {
        let (tau0, mut energy) = self
            .source
            .read(|p| (p.tau0, p.energy_density.clone()))?;

        let mut deposited = 0.0;
        if let Some(liquefier) = &self.liquefier {
            let droplets = liquefier.publish(ctx.event(), Liquefier::drain)?;
            let cell_volume = energy.spacing * energy.spacing * tau0;
            for d in &droplets {
                deposited += d.energy;
                if let Some(i) = energy.cell_at(d.x, d.y) {
                    energy.values[i] += d.energy / cell_volume;
                }
            }
            trace!(
                hydro = %self.id,
                droplets = droplets.len(),
                deposited,
                "absorbed liquefier deposits"
            );
        }

        let c = self.eos_coefficient;
        let temperature = energy.map(|e| c * e.max(0.0).powf(0.25));
        let t0 = temperature.max();
        let tf = self.freeze_out_temperature;
        let freeze_out_time = if t0 > tf {
            tau0 * (t0 / tf).powi(3)
        } else {
            tau0
        };
        let total_energy = energy.integral() * tau0;

        debug!(
            hydro = %self.id,
            event = %ctx.event(),
            initial_temperature = t0,
            freeze_out_time,
            "evolved medium"
        );
        self.medium.publish(ctx.event(), |m| {
            *m = Medium {
                temperature,
                initial_temperature: t0,
                tau0,
                freeze_out_time,
                freeze_out_temperature: tf,
                total_energy,
                deposited_energy: deposited,
            }
        })?;
        Ok(())
    }

    fn reuse(&mut self, ctx: &ExecContext<'_>) -> Result<(), TaskError> {
        let produced_at = self.medium.stamp()?;
        trace!(
            hydro = %self.id,
            event = %ctx.event(),
            produced_at = ?produced_at,
            "reusing medium"
        );
        Ok(())
    }
}
