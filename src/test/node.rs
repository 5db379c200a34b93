use std::net::Ipv4Addr;

use crate::config::SimConfig;
use crate::error::Error;
use crate::net::{Fabric, MacAddr, NodeKind};
use crate::topo::prefix_mask;

#[test]
fn fixed_port_nodes_expose_their_ports_in_order() {
    let mut f = Fabric::new(SimConfig::default());
    let sw = f.add_switch("s0", 4);
    let hub = f.add_hub("hub", 2);

    let node = f.node(sw).expect("switch");
    assert_eq!(node.kind(), NodeKind::Switch);
    assert_eq!(node.port_count(), 4);
    let ports = node.port_list();
    assert_eq!(node.port_index(ports[2]), Some(2));
    assert!(node.owns_port(ports[3]));
    assert!(!f.node(hub).expect("hub").owns_port(ports[0]));
    assert_eq!(f.owner_of(ports[1]), Some(sw));
    assert_eq!(f.free_port(sw), Some(ports[0]));
}

#[test]
fn free_port_skips_connected_ports() {
    let mut f = Fabric::new(SimConfig::default());
    let s0 = f.add_switch("s0", 2);
    let s1 = f.add_switch("s1", 2);
    f.connect_nodes(s0, s1).expect("connect");

    let p0 = f.node_ports(s0);
    assert_eq!(f.free_port(s0), Some(p0[1]));
    assert_eq!(f.free_ports(s0), vec![p0[1]]);

    f.connect_nodes(s0, s1).expect("connect again");
    assert_eq!(f.free_port(s0), None);
    let err = f.connect_nodes(s0, s1).expect_err("full");
    assert!(matches!(err, Error::ConnectionFailed { .. }));
}

#[test]
fn interface_nodes_derive_ports_from_nics() {
    let mut f = Fabric::new(SimConfig::default());
    let r = f.add_router("r0");
    assert_eq!(f.node(r).expect("router").port_count(), 0);

    let p0 = f
        .add_interface(r, Ipv4Addr::new(10, 0, 0, 1), prefix_mask(24))
        .expect("nic 0");
    let mac = MacAddr([0x02, 0, 0, 0, 0xaa, 0x01]);
    let p1 = f
        .add_interface_with_mac(r, Ipv4Addr::new(10, 0, 1, 1), prefix_mask(24), mac)
        .expect("nic 1");

    let node = f.node(r).expect("router");
    assert_eq!(node.kind(), NodeKind::Router);
    assert!(node.kind().is_interface_based());
    assert_eq!(node.port_list(), vec![p0, p1]);
    assert_eq!(node.port_index(p1), Some(1));

    let rn = f.interface_node(r).expect("router");
    assert_eq!(rn.interface_by_port(p1).map(|n| n.mac), Some(mac));
    assert_eq!(
        rn.interface_by_ip(Ipv4Addr::new(10, 0, 0, 1)).map(|n| n.port),
        Some(p0)
    );

    let (owner, nic) = f.find_interface_by_mac(mac).expect("by mac");
    assert_eq!(owner, r);
    assert_eq!(nic.port, p1);
    let (owner, _) = f
        .find_interface_by_ip(Ipv4Addr::new(10, 0, 0, 1))
        .expect("by ip");
    assert_eq!(owner, r);
}

#[test]
fn generated_macs_are_unique() {
    let mut f = Fabric::new(SimConfig::default());
    let h = f.add_host("h");
    for i in 0..4u8 {
        f.add_interface(h, Ipv4Addr::new(10, 0, i, 1), prefix_mask(24))
            .expect("nic");
    }
    let mut macs: Vec<MacAddr> = f
        .interface_node(h)
        .expect("host")
        .interfaces()
        .iter()
        .map(|n| n.mac)
        .collect();
    macs.sort();
    macs.dedup();
    assert_eq!(macs.len(), 4);
}

#[test]
fn switches_cannot_hold_interfaces() {
    let mut f = Fabric::new(SimConfig::default());
    let sw = f.add_switch("s0", 2);
    let before = f.ports().len();
    let err = f
        .add_interface(sw, Ipv4Addr::new(10, 0, 0, 1), prefix_mask(24))
        .expect_err("switch");
    assert!(matches!(err, Error::NotInterfaceNode(id) if id == sw));
    assert_eq!(f.ports().len(), before);
}

#[test]
fn removing_an_interface_unplugs_its_cable() {
    let mut f = Fabric::new(SimConfig::default());
    let h = f.add_host("h");
    let sw = f.add_switch("s0", 2);
    let p = f
        .add_interface(h, Ipv4Addr::new(10, 0, 0, 1), prefix_mask(24))
        .expect("nic");
    let cable = f.connect_nodes(h, sw).expect("connect");

    let nic = f.remove_interface(h, p).expect("remove");
    assert_eq!(nic.ip, Ipv4Addr::new(10, 0, 0, 1));
    assert!(f.cable(cable).is_none());
    assert!(f.port(p).is_none());
    assert_eq!(f.free_ports(sw).len(), 2);
    assert!(f.node_ports(h).is_empty());
}

#[test]
fn readdressing_an_interface_changes_lookups() {
    let mut f = Fabric::new(SimConfig::default());
    let h = f.add_host("h");
    let p = f
        .add_interface(h, Ipv4Addr::new(10, 0, 0, 1), prefix_mask(24))
        .expect("nic");
    f.set_interface_address(h, p, Ipv4Addr::new(172, 16, 0, 1), prefix_mask(16))
        .expect("readdress");

    assert!(f.find_interface_by_ip(Ipv4Addr::new(10, 0, 0, 1)).is_none());
    let route = f
        .best_route(h, Ipv4Addr::new(172, 16, 9, 9))
        .expect("connected");
    assert_eq!(route.interface, Ipv4Addr::new(172, 16, 0, 1));
}

#[test]
fn removing_a_node_frees_its_peers() {
    let mut f = Fabric::new(SimConfig::default());
    let s0 = f.add_switch("s0", 2);
    let s1 = f.add_switch("s1", 2);
    f.connect_nodes(s0, s1).expect("connect");

    f.remove_node(s0).expect("remove");
    assert!(f.node(s0).is_none());
    assert!(f.cable_ids().is_empty());
    assert_eq!(f.free_ports(s1).len(), 2);
    assert_eq!(f.node_ids(), vec![s1]);
    assert!(matches!(f.remove_node(s0), Err(Error::UnknownNode(_))));

    // id 不复用
    let s2 = f.add_switch("s2", 1);
    assert_ne!(s2, s0);
    assert_eq!(f.node_by_name("s2"), Some(s2));
}

#[test]
fn mac_addresses_parse_and_display() {
    let mac: MacAddr = "02:00:5e:10:ab:FF".parse().expect("mac");
    assert_eq!(mac.octets(), [0x02, 0x00, 0x5e, 0x10, 0xab, 0xff]);
    assert_eq!(mac.to_string(), "02:00:5e:10:ab:ff");
    assert_eq!("02-00-5e-10-ab-ff".parse::<MacAddr>().expect("dash"), mac);

    for bad in ["02:00:5e:10:ab", "02:00:5e:10:ab:ff:00", "zz:00:00:00:00:00", "2:00:5e:10:ab:ff"] {
        assert!(matches!(bad.parse::<MacAddr>(), Err(Error::InvalidAddress(_))), "{bad}");
    }
    assert!(MacAddr::BROADCAST.is_broadcast());
    assert!(!MacAddr::local(1).is_broadcast());
}
