//! Hard-scattering parton gun.

use std::f64::consts::{PI, TAU};

use quench_core::{ResourceUse, TaskError, TaskKind};
use quench_resource::{Owner, RegistryError, ResourceRegistry};
use quench_task::{ExecContext, Task};
use rand::Rng;
use tracing::trace;

use crate::data::{wrap_phi, Parton};
use crate::keys;
use crate::rng::{gaussian, module_rng, open_unit};

const STREAM: u64 = 0x7079_7468_6961;
const GLUON: i32 = 21;

/// Produces one back-to-back dijet per event and publishes it as
/// [`keys::HARD_PARTONS`].
///
/// The leading `p_T` follows `dσ/dp_T ∝ p_T^{-5}` above `pt_hat_min`;
/// the production point is Gaussian around the collision centre.
pub struct PythiaGun {
    partons: Owner<Vec<Parton>>,
    pt_hat_min: f64,
    eta_max: f64,
    vertex_width: f64,
}

impl PythiaGun {
    /// Register [`keys::HARD_PARTONS`]. `pt_hat_min` defaults to 10 GeV.
    pub fn new(registry: &mut ResourceRegistry) -> Result<Self, RegistryError> {
        Ok(Self {
            partons: registry.register(keys::HARD_PARTONS, Vec::new())?,
            pt_hat_min: 10.0,
            eta_max: 2.0,
            vertex_width: 2.0,
        })
    }

    /// Minimum `p̂_T` in GeV.
    pub fn pt_hat_min(mut self, pt: f64) -> Self {
        self.pt_hat_min = pt;
        self
    }

    fn flavour(rng: &mut impl Rng) -> i32 {
        if rng.random_bool(0.5) {
            GLUON
        } else {
            let q = rng.random_range(1..=3);
            if rng.random_bool(0.5) {
                q
            } else {
                -q
            }
        }
    }
}

impl Task for PythiaGun {
    fn name(&self) -> &str {
        "pythia_gun"
    }

    fn resources(&self) -> Vec<ResourceUse> {
        vec![self.partons.usage()]
    }

    fn exec(&mut self, ctx: &ExecContext<'_>) -> Result<(), TaskError> {
        let mut rng = module_rng(ctx, TaskKind::Downstream, STREAM);
        let pt = self.pt_hat_min * open_unit(&mut rng).powf(-0.25);
        let phi = rng.random::<f64>() * TAU;
        let x = self.vertex_width * gaussian(&mut rng);
        let y = self.vertex_width * gaussian(&mut rng);

        let mut dijet = Vec::with_capacity(2);
        for side in [0.0, PI] {
            dijet.push(Parton {
                pid: Self::flavour(&mut rng),
                pt,
                eta: rng.random_range(-self.eta_max..=self.eta_max),
                phi: wrap_phi(phi + side),
                virtuality: pt,
                x,
                y,
            });
        }

        trace!(event = %ctx.event(), pt_hat = pt, "generated dijet");
        self.partons.publish(ctx.event(), |p| *p = dijet)?;
        Ok(())
    }
}
