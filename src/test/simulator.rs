use crate::sim::{Event, SimTime, Simulator, World};
use std::any::Any;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct DummyWorld {
    ticks: usize,
}

impl World for DummyWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn on_tick(&mut self, _sim: &mut Simulator) {
        self.ticks = self.ticks.saturating_add(1);
    }
}

struct Push {
    id: u32,
    log: Arc<Mutex<Vec<(u32, SimTime)>>>,
}

impl Event for Push {
    fn execute(self: Box<Self>, sim: &mut Simulator, _world: &mut dyn World) {
        let Push { id, log } = *self;
        log.lock().expect("log lock").push((id, sim.now()));
    }
}

struct PushThenScheduleIn {
    id: u32,
    next_id: u32,
    delay: SimTime,
    log: Arc<Mutex<Vec<(u32, SimTime)>>>,
}

impl Event for PushThenScheduleIn {
    fn execute(self: Box<Self>, sim: &mut Simulator, _world: &mut dyn World) {
        let PushThenScheduleIn {
            id,
            next_id,
            delay,
            log,
        } = *self;
        log.lock().expect("log lock").push((id, sim.now()));
        sim.schedule_in(delay, Push { id: next_id, log });
    }
}

fn ids(log: &Arc<Mutex<Vec<(u32, SimTime)>>>) -> Vec<u32> {
    log.lock().expect("log lock").iter().map(|(id, _)| *id).collect()
}

#[test]
fn scheduled_events_order_by_time_then_seq() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut sim = Simulator::default();
    for (at, id) in [(10, 1), (5, 2), (10, 3)] {
        sim.schedule(
            SimTime(at),
            Push {
                id,
                log: Arc::clone(&log),
            },
        );
    }

    let mut world = DummyWorld::default();
    sim.run(&mut world);

    assert_eq!(ids(&log), vec![2, 1, 3]);
    assert_eq!(world.ticks, 3);
    assert_eq!(sim.now(), SimTime(10));
    assert_eq!(sim.executed(), 3);
    assert_eq!(sim.pending(), 0);
}

#[test]
fn schedule_in_is_relative_to_now() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut sim = Simulator::default();
    sim.schedule(
        SimTime(7),
        PushThenScheduleIn {
            id: 1,
            next_id: 2,
            delay: SimTime(5),
            log: Arc::clone(&log),
        },
    );

    let mut world = DummyWorld::default();
    sim.run(&mut world);

    assert_eq!(
        &*log.lock().expect("log lock"),
        &[(1, SimTime(7)), (2, SimTime(12))]
    );
}

#[test]
fn events_scheduled_in_the_past_run_at_now() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut sim = Simulator::default();
    let mut world = DummyWorld::default();
    sim.run_until(SimTime(20), &mut world);

    sim.schedule(
        SimTime(3),
        Push {
            id: 1,
            log: Arc::clone(&log),
        },
    );
    sim.run(&mut world);

    assert_eq!(&*log.lock().expect("log lock"), &[(1, SimTime(20))]);
}

#[test]
fn run_until_skips_events_after_until_and_advances_time() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut sim = Simulator::default();
    sim.schedule(
        SimTime::ZERO,
        Push {
            id: 1,
            log: Arc::clone(&log),
        },
    );
    sim.schedule(
        SimTime(10),
        Push {
            id: 2,
            log: Arc::clone(&log),
        },
    );

    let mut world = DummyWorld::default();
    sim.run_until(SimTime(5), &mut world);

    assert_eq!(ids(&log), vec![1]);
    assert_eq!(world.ticks, 1);
    assert_eq!(sim.now(), SimTime(5));
    assert_eq!(sim.pending(), 1);

    sim.run(&mut world);
    assert_eq!(ids(&log), vec![1, 2]);
    assert_eq!(world.ticks, 2);
    assert_eq!(sim.now(), SimTime(10));
}

#[test]
fn run_for_advances_relative_to_now() {
    let mut sim = Simulator::default();
    let mut world = DummyWorld::default();

    sim.run_for(SimTime(7), &mut world);
    sim.run_for(SimTime(3), &mut world);
    assert_eq!(sim.now(), SimTime(10));
    assert_eq!(world.ticks, 0);
}

#[test]
fn events_are_labelled_by_type_name() {
    let ev = Push {
        id: 0,
        log: Arc::new(Mutex::new(Vec::new())),
    };
    assert_eq!(ev.label(), "Push");
}
