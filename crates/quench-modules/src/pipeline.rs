//! Assembly of the two-stage hydro pipeline.

use std::io::Write;

use quench_resource::{RegistryError, ResourceRegistry};
use quench_task::{Task, TaskList};

use crate::data::{Hadron, Liquefier};
use crate::eloss::{Lbt, Matter};
use crate::hadronization::{ColorlessHadronization, PartonPrinter};
use crate::hard::PythiaGun;
use crate::hydro::MusicHydro;
use crate::initial::{NullPreDynamics, TrentoInitial};
use crate::keys;
use crate::soft::SurfaceSampler;
use crate::writer::AsciiWriter;

/// Build the two-stage hydro pipeline writing to `out`, registering every
/// resource it shares in `registry`.
///
/// The returned tasks go to the root in order:
///
/// ```text
/// trento            upstream
/// pre_dynamics      upstream
/// pythia_gun
/// music_1           upstream, owns medium
/// eloss_manager
///   eloss
///     matter        provides virtuality, deposits into the liquefier
///     lbt           requires virtuality, deposits into the liquefier
/// music_2           owns medium_2 and drains the liquefier
/// surface_sampler
/// parton_printer
/// hadronization_manager
///   hadronization
///     colorless
/// ascii_writer      sink: "hadrons" and "soft" streams
/// ```
///
/// With reuse enabled, the initial state, pre-equilibrium and first hydro
/// stage are computed once per reuse cycle; every event gets its own hard
/// scattering, jets, and a second hydro stage heated by that event's
/// jets.
///
/// # Errors
///
/// Returns [`RegistryError`] if `registry` already holds one of the
/// pipeline's keys.
///
/// # Examples
///
/// ```
/// use quench_engine::{Orchestrator, ReuseConfig, RunConfig};
/// use quench_modules::two_stage_hydro;
///
/// let config = RunConfig {
///     events: 4,
///     reuse: ReuseConfig::every(2),
///     seed: 7,
/// };
/// let mut orch = Orchestrator::new(config).unwrap();
/// let tasks = two_stage_hydro(orch.registry_mut(), Vec::new()).unwrap();
/// orch.extend(tasks);
/// let metrics = orch.run().unwrap();
/// assert_eq!(metrics.events_executed, 4);
/// assert_eq!(metrics.regenerating_events, 2);
/// ```
pub fn two_stage_hydro<W: Write + Send + 'static>(
    registry: &mut ResourceRegistry,
    out: W,
) -> Result<Vec<Box<dyn Task>>, RegistryError> {
    let trento = TrentoInitial::new(registry)?;
    let pre_dynamics = NullPreDynamics::new(registry)?;
    let gun = PythiaGun::new(registry)?;
    let music_1 = MusicHydro::new("music_1", registry, keys::MEDIUM)?;

    // Register the liquefier before handing out accumulators.
    let liquefier = registry.register(keys::LIQUEFIER, Liquefier::default())?;
    let matter =
        Matter::new(registry, keys::MEDIUM)?.with_liquefier(registry.accumulator(keys::LIQUEFIER)?);
    let lbt =
        Lbt::new(registry, keys::MEDIUM)?.with_liquefier(registry.accumulator(keys::LIQUEFIER)?);
    let eloss_manager = TaskList::new("eloss_manager")
        .with(TaskList::new("eloss").with(matter).with(lbt));

    let music_2 = MusicHydro::new("music_2", registry, keys::MEDIUM_2)?.with_liquefier(liquefier);
    let sampler = SurfaceSampler::new(registry, keys::MEDIUM_2)?;
    let printer = PartonPrinter::new(registry)?;
    let hadronization_manager = TaskList::new("hadronization_manager")
        .with(TaskList::new("hadronization").with(ColorlessHadronization::new(registry)?));

    let writer = AsciiWriter::new(out)
        .stream("hadrons", registry.reader::<Vec<Hadron>>(keys::HADRONS)?)
        .stream("soft", registry.reader::<Vec<Hadron>>(keys::SOFT_HADRONS)?);

    Ok(vec![
        Box::new(trento),
        Box::new(pre_dynamics),
        Box::new(gun),
        Box::new(music_1),
        Box::new(eloss_manager),
        Box::new(music_2),
        Box::new(sampler),
        Box::new(printer),
        Box::new(hadronization_manager),
        Box::new(writer),
    ])
}
