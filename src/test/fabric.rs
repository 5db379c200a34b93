use super::{input_ids, send_frame};
use crate::config::SimConfig;
use crate::error::Error;
use crate::net::{FabricWorld, MacAddr};
use crate::sim::{SimTime, Simulator};
use crate::topo::endpoint;
use crate::topo::ring::{RingOpts, build_switch_ring};
use crate::topo::routed::build_routed_pair;
use crate::topo::star::{StarOpts, build_star_lan};
use crate::topo::traffic::InjectFrames;
use crate::viz::{SharedLog, VizEventKind};

#[test]
fn routed_pair_delivers_to_the_router_interface() {
    let mut world = FabricWorld::new(SimConfig::default());
    let t = build_routed_pair(&mut world.fabric).expect("routed");
    let mut sim = Simulator::default();
    let report = world.fabric.start_run(&mut sim);
    assert_eq!(report.components.len(), 2);

    let (h0_port, h0_mac) = endpoint(&world.fabric, t.h0).expect("h0");
    let router = world.fabric.interface_node(t.router).expect("router");
    let gw = router.interfaces().first().cloned().expect("nic 0");

    let id = send_frame(&mut world, &mut sim, h0_port, h0_mac, gw.mac);
    sim.run(&mut world);

    assert_eq!(input_ids(&world, gw.port), vec![id]);
    // 另一个网段收不到
    let (h1_port, _) = endpoint(&world.fabric, t.h1).expect("h1");
    assert!(input_ids(&world, h1_port).is_empty());
}

#[test]
fn start_run_wakes_frames_queued_before_the_run() {
    let mut world = FabricWorld::new(SimConfig::default());
    let topo = build_star_lan(&mut world.fabric, &StarOpts::default()).expect("star");
    let mut sim = Simulator::default();
    let (a, a_mac) = endpoint(&world.fabric, topo.hosts[0]).expect("a");
    let (b, b_mac) = endpoint(&world.fabric, topo.hosts[1]).expect("b");

    let id = send_frame(&mut world, &mut sim, a, a_mac, b_mac);
    world.fabric.start_run(&mut sim);
    sim.run(&mut world);

    assert_eq!(input_ids(&world, b), vec![id]);
    assert_eq!(world.fabric.stats.delivered_frames, 3);
}

#[test]
fn start_run_wakes_switch_input_queued_before_the_run() {
    let mut world = FabricWorld::new(SimConfig::default());
    let topo = build_star_lan(&mut world.fabric, &StarOpts::default()).expect("star");
    let mut sim = Simulator::default();
    let (_, a_mac) = endpoint(&world.fabric, topo.hosts[0]).expect("a");
    let (b, b_mac) = endpoint(&world.fabric, topo.hosts[1]).expect("b");

    // 帧直接放进交换机入端口，尚未开始仿真
    let ingress = topo.switch_ports[0];
    let frame = world.fabric.make_frame(a_mac, b_mac, vec![0u8; 16]);
    let id = frame.id();
    world
        .fabric
        .enqueue_input(ingress, frame, &mut sim)
        .expect("enqueue");

    world.fabric.start_run(&mut sim);
    sim.run(&mut world);

    assert!(input_ids(&world, ingress).is_empty());
    assert_eq!(input_ids(&world, b), vec![id]);
    assert_eq!(sim.now(), SimTime::from_millis(50));
}

#[test]
fn restarting_counts_frames_in_flight_as_lost() {
    let mut world = FabricWorld::new(SimConfig::default());
    let topo = build_star_lan(&mut world.fabric, &StarOpts::default()).expect("star");
    let log = SharedLog::new();
    world.fabric.subscribe(Box::new(log.clone()));
    let mut sim = Simulator::default();
    let (a, a_mac) = endpoint(&world.fabric, topo.hosts[0]).expect("a");
    let (b, b_mac) = endpoint(&world.fabric, topo.hosts[1]).expect("b");

    world.fabric.start_run(&mut sim);
    let lost = send_frame(&mut world, &mut sim, a, a_mac, b_mac);
    sim.run_until(SimTime::from_millis(20), &mut world);
    world.fabric.start_run(&mut sim);
    sim.run(&mut world);

    assert!(input_ids(&world, b).is_empty());
    assert_eq!(world.fabric.stats.delivered_frames, 0);
    assert_eq!(world.fabric.stats.lost_frames, 1);
    let reported: Vec<u64> = log
        .events()
        .iter()
        .filter_map(|e| match e.kind {
            VizEventKind::FrameLost { frame_id, .. } => Some(frame_id),
            _ => None,
        })
        .collect();
    assert_eq!(reported, vec![lost]);

    // 新一轮照常投递
    let id = send_frame(&mut world, &mut sim, a, a_mac, b_mac);
    sim.run(&mut world);
    assert_eq!(input_ids(&world, b), vec![id]);
    assert_eq!(world.fabric.stats.lost_frames, 1);
}

#[test]
fn builders_reject_host_counts_that_overflow_the_subnet() {
    let mut world = FabricWorld::new(SimConfig::default());
    let err = build_star_lan(
        &mut world.fabric,
        &StarOpts {
            hosts: 300,
            switch_ports: 8,
        },
    )
    .expect_err("star too large");
    assert!(matches!(err, Error::Scenario(_)));

    let err = build_switch_ring(
        &mut world.fabric,
        &RingOpts {
            switches: 3,
            hosts_per_switch: 100,
        },
    )
    .expect_err("ring too large");
    assert!(matches!(err, Error::Scenario(_)));
    assert!(world.fabric.node_ids().is_empty());

    // 恰好用满 .10 ~ .254
    build_star_lan(
        &mut world.fabric,
        &StarOpts {
            hosts: 245,
            switch_ports: 8,
        },
    )
    .expect("largest star");
}

#[test]
fn config_change_applies_to_frames_sent_afterwards() {
    let mut world = FabricWorld::new(SimConfig::default());
    let topo = build_star_lan(
        &mut world.fabric,
        &StarOpts {
            hosts: 2,
            switch_ports: 2,
        },
    )
    .expect("star");
    let mut sim = Simulator::default();
    world.fabric.start_run(&mut sim);
    let (a, a_mac) = endpoint(&world.fabric, topo.hosts[0]).expect("a");
    let (b, b_mac) = endpoint(&world.fabric, topo.hosts[1]).expect("b");

    world
        .fabric
        .set_config(SimConfig::new(1, 2).expect("cfg"));
    let id = send_frame(&mut world, &mut sim, a, a_mac, b_mac);
    sim.run_until(SimTime::from_millis(199), &mut world);
    assert!(input_ids(&world, b).is_empty());
    sim.run(&mut world);
    assert_eq!(input_ids(&world, b), vec![id]);
    assert_eq!(sim.now(), SimTime::from_millis(200));
}

#[test]
fn injected_flow_sends_count_frames_with_gap() {
    let mut world = FabricWorld::new(SimConfig::default());
    let topo = build_star_lan(&mut world.fabric, &StarOpts::default()).expect("star");
    let mut sim = Simulator::default();
    world.fabric.start_run(&mut sim);
    let (a, a_mac) = endpoint(&world.fabric, topo.hosts[0]).expect("a");
    let (b, b_mac) = endpoint(&world.fabric, topo.hosts[1]).expect("b");

    sim.schedule(
        SimTime::ZERO,
        InjectFrames {
            port: a,
            src: a_mac,
            dst: b_mac,
            payload_bytes: 100,
            remaining: 4,
            gap: SimTime::from_millis(10),
        },
    );
    sim.run(&mut world);

    let ids = input_ids(&world, b);
    assert_eq!(ids.len(), 4);
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
    let port = world.fabric.port(b).expect("b");
    assert_eq!(port.input().bytes(), 400);
}

#[test]
fn cable_lookups_between_nodes() {
    let mut world = FabricWorld::new(SimConfig::default());
    let topo = build_star_lan(&mut world.fabric, &StarOpts::default()).expect("star");
    let f = &world.fabric;

    let cable = f
        .cable_between(topo.hosts[1], topo.switch)
        .expect("cable");
    assert_eq!(f.cable_between(topo.switch, topo.hosts[1]), Some(cable));
    assert_eq!(f.cable_between(topo.hosts[0], topo.hosts[1]), None);

    let (b, _) = endpoint(f, topo.hosts[1]).expect("b");
    assert_eq!(f.remote_port(b), Some(topo.switch_ports[1]));
    assert_eq!(f.remote_port(topo.switch_ports[1]), Some(b));
    assert_eq!(
        f.cable(cable).expect("cable").other_end(b),
        Some(topo.switch_ports[1])
    );
}

#[test]
fn broadcast_frames_reach_every_host_in_the_lan() {
    let mut world = FabricWorld::new(SimConfig::default());
    let topo = build_star_lan(
        &mut world.fabric,
        &StarOpts {
            hosts: 5,
            switch_ports: 8,
        },
    )
    .expect("star");
    let mut sim = Simulator::default();
    world.fabric.start_run(&mut sim);
    let (a, a_mac) = endpoint(&world.fabric, topo.hosts[0]).expect("a");
    let id = send_frame(&mut world, &mut sim, a, a_mac, MacAddr::BROADCAST);
    sim.run(&mut world);

    for &h in &topo.hosts[1..] {
        let (p, _) = endpoint(&world.fabric, h).expect("host");
        assert_eq!(input_ids(&world, p), vec![id]);
    }
}
