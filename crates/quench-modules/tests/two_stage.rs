//! The two-stage hydro pipeline driven by the orchestrator.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use quench_core::EventIndex;
use quench_engine::{ConfigError, Orchestrator, ReuseConfig, RunConfig, RunError};
use quench_modules::{
    keys, two_stage_hydro, Lbt, Medium, MusicHydro, NullPreDynamics, Parton, PythiaGun,
    TrentoInitial, VIRTUALITY,
};
use quench_task::TreeError;

/// A writer whose contents stay readable after the task that owns it is
/// dropped.
#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn pipeline(events: u64, reuse: ReuseConfig, seed: u64) -> (Orchestrator, SharedBuffer) {
    let buffer = SharedBuffer::default();
    let mut o = Orchestrator::new(RunConfig {
        events,
        reuse,
        seed,
    })
    .unwrap();
    let tasks = two_stage_hydro(o.registry_mut(), buffer.clone()).unwrap();
    o.extend(tasks);
    (o, buffer)
}

fn run_to_text(events: u64, reuse: ReuseConfig, seed: u64) -> String {
    let (mut o, buffer) = pipeline(events, reuse, seed);
    o.run().unwrap();
    buffer.text()
}

#[test]
fn six_events_with_reuse_every_three() {
    let (mut o, buffer) = pipeline(6, ReuseConfig::every(3), 11);
    let metrics = o.run().unwrap();
    assert_eq!(metrics.events_executed, 6);
    assert_eq!(metrics.regenerating_events, 2);
    assert_eq!(metrics.reusing_events, 4);

    let text = buffer.text();
    assert!(text.starts_with("# quench ascii v1 events=6 reuse_period=3 seed=11\n"));
    assert!(text.ends_with("# end events=6 aborted=false\n"));

    let blocks: Vec<&str> = text
        .lines()
        .filter(|l| l.starts_with("# event "))
        .collect();
    assert_eq!(blocks.len(), 6);
    assert_eq!(blocks[0], "# event 0 cycle 0 upstream=regenerated");
    assert_eq!(blocks[1], "# event 1 cycle 0 upstream=reused");
    assert_eq!(blocks[2], "# event 2 cycle 0 upstream=reused");
    assert_eq!(blocks[3], "# event 3 cycle 1 upstream=regenerated");
    assert_eq!(text.lines().filter(|l| l.starts_with("# hadrons ")).count(), 6);
    assert_eq!(text.lines().filter(|l| l.starts_with("# soft ")).count(), 6);
}

#[test]
fn reused_events_share_the_first_medium_only() {
    let (mut o, _buffer) = pipeline(4, ReuseConfig::every(2), 5);
    let medium = o.registry_mut().reader::<Medium>(keys::MEDIUM).unwrap();
    let medium_2 = o.registry_mut().reader::<Medium>(keys::MEDIUM_2).unwrap();
    o.init().unwrap();

    let mut first_temperatures = Vec::new();
    let mut liquefied = 0.0;
    while let Some(event) = o.step().unwrap() {
        let cycle_start = event.event - event.event % 2;
        assert_eq!(medium.stamp().unwrap(), Some(EventIndex(cycle_start)));
        assert_eq!(medium_2.stamp().unwrap(), Some(EventIndex(event.event)));
        if event.regenerated_upstream {
            assert_eq!(event.reused_tasks, 0);
        } else {
            assert_eq!(event.reused_tasks, 3);
        }
        first_temperatures.push(medium.read(|m| m.initial_temperature).unwrap());
        liquefied += medium_2.read(|m| m.deposited_energy).unwrap();
    }
    o.finish().unwrap();

    assert!(liquefied > 0.0);
    assert_eq!(first_temperatures[0], first_temperatures[1]);
    assert_eq!(first_temperatures[2], first_temperatures[3]);
    assert_ne!(first_temperatures[0], first_temperatures[2]);
}

#[test]
fn output_depends_only_on_seed() {
    let a = run_to_text(3, ReuseConfig::every(3), 42);
    let b = run_to_text(3, ReuseConfig::every(3), 42);
    let c = run_to_text(3, ReuseConfig::every(3), 43);
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn disabled_reuse_matches_period_one() {
    let a = run_to_text(3, ReuseConfig::disabled(), 8);
    let b = run_to_text(3, ReuseConfig::every(1), 8);
    assert_eq!(a, b);
}

#[test]
fn transport_without_shower_fails_validation() {
    let mut o = Orchestrator::new(RunConfig {
        events: 2,
        reuse: ReuseConfig::disabled(),
        seed: 1,
    })
    .unwrap();
    let reg = o.registry_mut();
    let trento = TrentoInitial::new(reg).unwrap();
    let pre = NullPreDynamics::new(reg).unwrap();
    let gun = PythiaGun::new(reg).unwrap();
    let music = MusicHydro::new("music_1", reg, keys::MEDIUM).unwrap();
    let _shower = reg.register(keys::SHOWER, Vec::<Parton>::new()).unwrap();
    let lbt = Lbt::new(reg, keys::MEDIUM).unwrap();
    o.add(trento);
    o.add(pre);
    o.add(gun);
    o.add(music);
    o.add(lbt);

    match o.init() {
        Err(RunError::Config(ConfigError::Tree(TreeError::MissingCapability {
            task,
            capability,
        }))) => {
            assert_eq!(task.to_string(), "lbt");
            assert_eq!(capability, VIRTUALITY);
        }
        other => panic!("expected MissingCapability, got {other:?}"),
    }
}
