//! Shared resources through a full run: publish, reuse, accumulate, and
//! access during finish.

use std::sync::{Arc, Mutex};

use quench_core::{Access, ResourceUse, TaskError, TaskKind};
use quench_engine::{Orchestrator, ReuseConfig, RunConfig};
use quench_resource::{Accumulator, Owner, Reader};
use quench_task::{ExecContext, FinishContext, Task};

#[derive(Debug, Default)]
struct Medium {
    temperature: f64,
    cycle: u64,
}

/// Upstream owner: regenerates the medium once per cycle.
struct Hydro {
    medium: Owner<Medium>,
}

impl Task for Hydro {
    fn name(&self) -> &str {
        "hydro"
    }
    fn kind(&self) -> TaskKind {
        TaskKind::Upstream
    }
    fn resources(&self) -> Vec<ResourceUse> {
        vec![self.medium.usage()]
    }
    fn exec(&mut self, ctx: &ExecContext<'_>) -> Result<(), TaskError> {
        let cycle = ctx.cycle().0;
        self.medium.publish(ctx.event(), |m| {
            m.temperature = 0.5 + cycle as f64;
            m.cycle = cycle;
        })?;
        Ok(())
    }
}

/// Downstream reader: records which snapshot each event saw and
/// deposits energy into the liquefier.
struct Jets {
    medium: Reader<Medium>,
    liquefier: Accumulator<Vec<f64>>,
    seen: Arc<Mutex<Vec<(u64, u64, u64)>>>,
}

impl Task for Jets {
    fn name(&self) -> &str {
        "jets"
    }
    fn resources(&self) -> Vec<ResourceUse> {
        vec![self.medium.usage(), self.liquefier.usage()]
    }
    fn exec(&mut self, ctx: &ExecContext<'_>) -> Result<(), TaskError> {
        let cycle = self.medium.read(|m| m.cycle)?;
        let stamp = self.medium.stamp()?.map_or(u64::MAX, |e| e.0);
        self.seen
            .lock()
            .unwrap()
            .push((ctx.event().0, cycle, stamp));
        let event = ctx.event().0 as f64;
        self.liquefier.accumulate(|drops| drops.push(event))?;
        Ok(())
    }
}

/// Downstream owner of the liquefier: drains it every event and checks
/// the medium is still readable during finish.
struct SecondHydro {
    liquefier: Owner<Vec<f64>>,
    medium: Reader<Medium>,
    drained: Arc<Mutex<Vec<usize>>>,
    temperature_at_finish: Arc<Mutex<Option<f64>>>,
}

impl Task for SecondHydro {
    fn name(&self) -> &str {
        "hydro_2"
    }
    fn resources(&self) -> Vec<ResourceUse> {
        vec![self.liquefier.usage(), self.medium.usage()]
    }
    fn exec(&mut self, ctx: &ExecContext<'_>) -> Result<(), TaskError> {
        let drops = self
            .liquefier
            .publish(ctx.event(), std::mem::take)?;
        self.drained.lock().unwrap().push(drops.len());
        Ok(())
    }
    fn finish(&mut self, _ctx: &FinishContext<'_>) -> Result<(), TaskError> {
        let t = self.medium.read(|m| m.temperature)?;
        *self.temperature_at_finish.lock().unwrap() = Some(t);
        Ok(())
    }
}

#[test]
fn resources_flow_through_reused_events_and_finish() {
    let mut o = Orchestrator::new(RunConfig {
        events: 6,
        reuse: ReuseConfig::every(3),
        seed: 11,
    })
    .unwrap();

    let registry = o.registry_mut();
    let medium = registry.register("medium", Medium::default()).unwrap();
    let liquefier = registry.register("liquefier", Vec::<f64>::new()).unwrap();
    let jets_medium = registry.reader::<Medium>("medium").unwrap();
    let jets_liquefier = registry.accumulator::<Vec<f64>>("liquefier").unwrap();
    let hydro2_medium = registry.reader::<Medium>("medium").unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let drained = Arc::new(Mutex::new(Vec::new()));
    let temperature_at_finish = Arc::new(Mutex::new(None));

    o.add(Hydro { medium });
    o.add(Jets {
        medium: jets_medium,
        liquefier: jets_liquefier,
        seen: Arc::clone(&seen),
    });
    o.add(SecondHydro {
        liquefier,
        medium: hydro2_medium,
        drained: Arc::clone(&drained),
        temperature_at_finish: Arc::clone(&temperature_at_finish),
    });

    let metrics = o.run().unwrap();
    assert_eq!(metrics.events_executed, 6);

    // Reused events see the snapshot published on the cycle's first event.
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            (0, 0, 0),
            (1, 0, 0),
            (2, 0, 0),
            (3, 1, 3),
            (4, 1, 3),
            (5, 1, 3),
        ]
    );
    // One deposit per event, drained every event.
    assert_eq!(*drained.lock().unwrap(), vec![1; 6]);
    // The medium is still attached during finish.
    assert_eq!(*temperature_at_finish.lock().unwrap(), Some(1.5));
    assert_eq!(
        o.registry()
            .attachments(&"liquefier".into())
            .map(<[Access]>::len),
        Some(2)
    );
}

#[test]
fn handles_outliving_the_orchestrator_report_released() {
    let mut o = Orchestrator::new(RunConfig::default()).unwrap();
    let _owner = o.registry_mut().register("medium", Medium::default()).unwrap();
    let reader = o.registry_mut().reader::<Medium>("medium").unwrap();
    assert!(reader.is_attached());
    drop(o);
    assert!(!reader.is_attached());
    assert!(reader.read(|m| m.temperature).is_err());
}
