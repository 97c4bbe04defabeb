//! Jet energy loss: a virtuality-ordered shower (Matter) followed by
//! low-virtuality transport (Lbt).
//!
//! Matter sets the virtuality of every shower parton, which Lbt uses to
//! decide which partons it owns. The dependency is declared as the
//! [`VIRTUALITY`] capability, so a tree with Lbt but no Matter before it
//! is rejected before Init.

use quench_core::{Capability, ResourceKey, ResourceUse, TaskError, TaskKind};
use quench_resource::{Accumulator, Owner, Reader, RegistryError, ResourceRegistry};
use quench_task::{ExecContext, InitContext, Task};
use rand::Rng;
use tracing::trace;

use crate::data::{wrap_phi, Droplet, Liquefier, Medium, Parton};
use crate::keys;
use crate::rng::{gaussian, module_rng};

/// Shower partons carry a virtuality assigned by a virtuality-ordered
/// shower.
pub const VIRTUALITY: Capability = Capability::new("virtuality");

const MATTER_STREAM: u64 = 0x6d61_7474_6572;
const LBT_STREAM: u64 = 0x6c62_74;

fn deposit_all(
    liquefier: Option<&Accumulator<Liquefier>>,
    droplets: Vec<Droplet>,
) -> Result<(), TaskError> {
    if let Some(acc) = liquefier {
        acc.accumulate(|l| droplets.into_iter().for_each(|d| l.deposit(d)))?;
    }
    Ok(())
}

fn check_q0(q0: f64) -> Result<(), TaskError> {
    if !q0.is_finite() || q0 <= 0.0 {
        return Err(TaskError::failed(format!(
            "q0 must be positive and finite, got {q0}"
        )));
    }
    Ok(())
}

// ── Matter ─────────────────────────────────────────────────────────

/// Virtuality-ordered medium-modified shower.
///
/// Each hard parton starts at virtuality `p_T` and splits until its
/// virtuality falls below `q0` or it is too soft to split again. Every
/// splitting loses energy to the medium in proportion to its peak
/// temperature and lifetime; the lost energy goes to the liquefier when
/// one is attached.
pub struct Matter {
    hard: Reader<Vec<Parton>>,
    medium: Reader<Medium>,
    shower: Owner<Vec<Parton>>,
    liquefier: Option<Accumulator<Liquefier>>,
    q0: f64,
    alpha_s: f64,
}

impl Matter {
    /// Attach to [`keys::HARD_PARTONS`] and `medium_key`, and register
    /// [`keys::SHOWER`].
    pub fn new(
        registry: &mut ResourceRegistry,
        medium_key: impl Into<ResourceKey>,
    ) -> Result<Self, RegistryError> {
        Ok(Self {
            hard: registry.reader(keys::HARD_PARTONS)?,
            medium: registry.reader(medium_key)?,
            shower: registry.register(keys::SHOWER, Vec::new())?,
            liquefier: None,
            q0: 2.0,
            alpha_s: 0.25,
        })
    }

    /// Deposit lost energy into `liquefier`.
    pub fn with_liquefier(mut self, liquefier: Accumulator<Liquefier>) -> Self {
        self.liquefier = Some(liquefier);
        self
    }

    /// Virtuality below which partons are handed to transport, in GeV.
    pub fn q0(mut self, q0: f64) -> Self {
        self.q0 = q0;
        self
    }
}

impl Task for Matter {
    fn name(&self) -> &str {
        "matter"
    }

    fn provides(&self) -> Vec<Capability> {
        vec![VIRTUALITY]
    }

    fn resources(&self) -> Vec<ResourceUse> {
        let mut uses = vec![
            self.hard.usage(),
            self.medium.usage(),
            self.shower.usage(),
        ];
        uses.extend(self.liquefier.as_ref().map(Accumulator::usage));
        uses
    }

    fn init(&mut self, _ctx: &InitContext<'_>) -> Result<(), TaskError> {
        check_q0(self.q0)
    }

    fn exec(&mut self, ctx: &ExecContext<'_>) -> Result<(), TaskError> {
        // The splitting loop only terminates for a positive cutoff.
        check_q0(self.q0)?;
        let mut rng = module_rng(ctx, TaskKind::Downstream, MATTER_STREAM);
        let hard = self.hard.read(Clone::clone)?;
        let (temperature, lifetime) = self
            .medium
            .read(|m| (m.initial_temperature, m.lifetime()))?;
        let loss_per_split = self.alpha_s * temperature * lifetime.min(10.0);

        let mut shower = Vec::new();
        let mut droplets = Vec::new();
        let mut stack: Vec<Parton> = hard
            .into_iter()
            .map(|p| Parton {
                virtuality: p.pt,
                ..p
            })
            .collect();

        while let Some(mut parton) = stack.pop() {
            let t = parton.virtuality * rng.random::<f64>().sqrt();
            if t <= self.q0 || parton.pt < 2.0 * self.q0 {
                parton.virtuality = t;
                shower.push(parton);
                continue;
            }

            let loss = loss_per_split.min(0.1 * parton.pt);
            droplets.push(Droplet {
                x: parton.x,
                y: parton.y,
                energy: loss,
            });
            let pt = parton.pt - loss;
            let z = rng.random_range(0.2..0.8);
            let kick = 0.1 * gaussian(&mut rng);
            for (share, dphi) in [(z, kick), (1.0 - z, -kick)] {
                stack.push(Parton {
                    pt: pt * share,
                    phi: wrap_phi(parton.phi + dphi),
                    virtuality: t * share,
                    ..parton
                });
            }
        }

        trace!(
            event = %ctx.event(),
            partons = shower.len(),
            deposits = droplets.len(),
            "showered hard partons"
        );
        self.shower.publish(ctx.event(), |s| *s = shower)?;
        deposit_all(self.liquefier.as_ref(), droplets)
    }
}

// ── Lbt ────────────────────────────────────────────────────────────

/// Linear Boltzmann transport for low-virtuality partons.
///
/// Partons at or below `q0` lose `κ T² L` of their `p_T` (with a 20 %
/// Gaussian fluctuation, capped at half the parton's `p_T`), where `T` is
/// the local medium temperature at the parton's position and `L` the
/// medium lifetime. Harder partons pass through unchanged.
pub struct Lbt {
    shower: Reader<Vec<Parton>>,
    medium: Reader<Medium>,
    output: Owner<Vec<Parton>>,
    liquefier: Option<Accumulator<Liquefier>>,
    q0: f64,
    kappa: f64,
}

impl Lbt {
    /// Attach to [`keys::SHOWER`] and `medium_key`, and register
    /// [`keys::FINAL_PARTONS`].
    pub fn new(
        registry: &mut ResourceRegistry,
        medium_key: impl Into<ResourceKey>,
    ) -> Result<Self, RegistryError> {
        Ok(Self {
            shower: registry.reader(keys::SHOWER)?,
            medium: registry.reader(medium_key)?,
            output: registry.register(keys::FINAL_PARTONS, Vec::new())?,
            liquefier: None,
            q0: 2.0,
            kappa: 0.5,
        })
    }

    /// Deposit lost energy into `liquefier`.
    pub fn with_liquefier(mut self, liquefier: Accumulator<Liquefier>) -> Self {
        self.liquefier = Some(liquefier);
        self
    }

    /// Virtuality at or below which partons are transported, in GeV.
    pub fn q0(mut self, q0: f64) -> Self {
        self.q0 = q0;
        self
    }
}

impl Task for Lbt {
    fn name(&self) -> &str {
        "lbt"
    }

    fn requires(&self) -> Vec<Capability> {
        vec![VIRTUALITY]
    }

    fn resources(&self) -> Vec<ResourceUse> {
        let mut uses = vec![
            self.shower.usage(),
            self.medium.usage(),
            self.output.usage(),
        ];
        uses.extend(self.liquefier.as_ref().map(Accumulator::usage));
        uses
    }

    fn init(&mut self, _ctx: &InitContext<'_>) -> Result<(), TaskError> {
        check_q0(self.q0)
    }

    fn exec(&mut self, ctx: &ExecContext<'_>) -> Result<(), TaskError> {
        let mut rng = module_rng(ctx, TaskKind::Downstream, LBT_STREAM);
        let mut partons = self.shower.read(Clone::clone)?;
        let medium = self.medium.read(Clone::clone)?;
        let lifetime = medium.lifetime();

        let mut droplets = Vec::new();
        for parton in &mut partons {
            if !parton.virtuality.is_finite() {
                return Err(TaskError::failed(format!(
                    "parton with pt {} has no virtuality",
                    parton.pt
                )));
            }
            if parton.virtuality > self.q0 {
                continue;
            }
            let t = medium.temperature.value_at(parton.x, parton.y);
            let fluctuation = (1.0 + 0.2 * gaussian(&mut rng)).max(0.0);
            let loss = (self.kappa * t * t * lifetime * fluctuation).min(0.5 * parton.pt);
            parton.pt -= loss;
            droplets.push(Droplet {
                x: parton.x,
                y: parton.y,
                energy: loss,
            });
        }

        trace!(
            event = %ctx.event(),
            partons = partons.len(),
            transported = droplets.len(),
            "transported soft partons"
        );
        self.output.publish(ctx.event(), |out| *out = partons)?;
        deposit_all(self.liquefier.as_ref(), droplets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Grid;
    use crate::testing::{plan, RUN};
    use quench_core::EventIndex;

    struct Fixture {
        reg: ResourceRegistry,
        _hard: Owner<Vec<Parton>>,
        _medium: Owner<Medium>,
        liquefier: Owner<Liquefier>,
    }

    fn fixture() -> Fixture {
        let mut reg = ResourceRegistry::new();
        let hard = reg.register(keys::HARD_PARTONS, Vec::new()).unwrap();
        let medium = reg.register(keys::MEDIUM, Medium::default()).unwrap();
        let liquefier = reg.register(keys::LIQUEFIER, Liquefier::default()).unwrap();

        let mut temperature = Grid::new(10, 1.0);
        temperature.values.iter_mut().for_each(|t| *t = 0.4);
        medium
            .publish(EventIndex(0), |m| {
                *m = Medium {
                    temperature,
                    initial_temperature: 0.4,
                    tau0: 0.6,
                    freeze_out_time: 5.6,
                    freeze_out_temperature: 0.15,
                    total_energy: 100.0,
                    deposited_energy: 0.0,
                }
            })
            .unwrap();
        hard.publish(EventIndex(0), |h| {
            *h = vec![
                Parton {
                    pid: 21,
                    pt: 50.0,
                    ..Parton::default()
                },
                Parton {
                    pid: 1,
                    pt: 50.0,
                    phi: std::f64::consts::PI,
                    ..Parton::default()
                },
            ]
        })
        .unwrap();
        Fixture {
            reg,
            _hard: hard,
            _medium: medium,
            liquefier,
        }
    }

    #[test]
    fn matter_conserves_energy_into_the_liquefier() {
        let mut f = fixture();
        let acc = f.reg.accumulator::<Liquefier>(keys::LIQUEFIER).unwrap();
        let mut matter = Matter::new(&mut f.reg, keys::MEDIUM)
            .unwrap()
            .with_liquefier(acc);
        let shower = f.reg.reader::<Vec<Parton>>(keys::SHOWER).unwrap();

        let p = plan(0);
        matter.exec(&ExecContext::new(&RUN, &p)).unwrap();

        let partons = shower.read(Clone::clone).unwrap();
        assert!(partons.len() >= 2);
        let shower_pt: f64 = partons.iter().map(|p| p.pt).sum();
        let deposited = f.liquefier.read(Liquefier::pending_energy).unwrap();
        assert!((shower_pt + deposited - 100.0).abs() < 1e-9);
        assert!(partons.iter().all(|p| p.virtuality.is_finite()));
    }

    #[test]
    fn lbt_only_touches_low_virtuality_partons() {
        let mut f = fixture();
        let shower = f.reg.register(keys::SHOWER, Vec::new()).unwrap();
        let acc = f.reg.accumulator::<Liquefier>(keys::LIQUEFIER).unwrap();
        let mut lbt = Lbt::new(&mut f.reg, keys::MEDIUM)
            .unwrap()
            .with_liquefier(acc);
        let out = f.reg.reader::<Vec<Parton>>(keys::FINAL_PARTONS).unwrap();

        shower
            .publish(EventIndex(0), |s| {
                *s = vec![
                    Parton {
                        pt: 10.0,
                        virtuality: 1.0,
                        ..Parton::default()
                    },
                    Parton {
                        pt: 10.0,
                        virtuality: 8.0,
                        ..Parton::default()
                    },
                ]
            })
            .unwrap();
        let p = plan(0);
        lbt.exec(&ExecContext::new(&RUN, &p)).unwrap();

        let partons = out.read(Clone::clone).unwrap();
        assert!(partons[0].pt < 10.0 && partons[0].pt >= 5.0);
        assert_eq!(partons[1].pt, 10.0);
        let lost = 10.0 - partons[0].pt;
        let deposited = f.liquefier.read(Liquefier::pending_energy).unwrap();
        assert!((lost - deposited).abs() < 1e-12);
    }

    #[test]
    fn lbt_without_shower_reports_unpublished_input() {
        let mut f = fixture();
        let _shower = f.reg.register(keys::SHOWER, Vec::<Parton>::new()).unwrap();
        let mut lbt = Lbt::new(&mut f.reg, keys::MEDIUM).unwrap();
        let p = plan(0);
        assert!(matches!(
            lbt.exec(&ExecContext::new(&RUN, &p)),
            Err(TaskError::Resource(_))
        ));
    }

    #[test]
    fn non_positive_q0_is_rejected() {
        for q0 in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let mut f = fixture();
            let mut matter = Matter::new(&mut f.reg, keys::MEDIUM).unwrap().q0(q0);
            let mut lbt = Lbt::new(&mut f.reg, keys::MEDIUM).unwrap().q0(q0);
            for task in [&mut matter as &mut dyn Task, &mut lbt] {
                match task.init(&InitContext::new(&RUN)) {
                    Err(TaskError::ExecutionFailed { reason }) => {
                        assert!(reason.contains("q0"), "{reason}")
                    }
                    other => panic!("expected ExecutionFailed for q0={q0}, got {other:?}"),
                }
            }

            // Exec without Init still returns instead of splitting forever.
            let p = plan(0);
            assert!(matches!(
                matter.exec(&ExecContext::new(&RUN, &p)),
                Err(TaskError::ExecutionFailed { .. })
            ));
        }
    }

    #[test]
    fn default_q0_initializes() {
        let mut f = fixture();
        let mut matter = Matter::new(&mut f.reg, keys::MEDIUM).unwrap();
        let mut lbt = Lbt::new(&mut f.reg, keys::MEDIUM).unwrap();
        matter.init(&InitContext::new(&RUN)).unwrap();
        lbt.init(&InitContext::new(&RUN)).unwrap();
    }

    #[test]
    fn capabilities_declared() {
        let mut f = fixture();
        let matter = Matter::new(&mut f.reg, keys::MEDIUM).unwrap();
        let lbt = Lbt::new(&mut f.reg, keys::MEDIUM).unwrap();
        assert_eq!(matter.provides(), vec![VIRTUALITY]);
        assert_eq!(lbt.requires(), vec![VIRTUALITY]);
        assert!(matter.requires().is_empty());
    }
}
