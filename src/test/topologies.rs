use crate::error::ExperimentError;
use crate::net::{NodeRole, Topology};
use crate::shaping::{BottleneckConfig, LinkShaper, ShapingDescriptor};
use crate::sim::SimTime;
use crate::topo::parking_lot::host_ip;
use crate::topo::{ParkingLot, ParkingLotOpts, build_parking_lot};
use std::collections::HashSet;
use std::net::Ipv4Addr;

fn bottlenecks(d0: &str, d1: &str) -> [ShapingDescriptor; 2] {
    LinkShaper::bottlenecks(&BottleneckConfig {
        bandwidth_mbps: 50.0,
        delays: [d0.into(), d1.into()],
        loss_percent: 0.0,
        queue_packets: 1000,
    })
    .expect("valid shaping")
}

fn build(n: i64) -> Result<ParkingLot, ExperimentError> {
    build_parking_lot(&ParkingLotOpts {
        n,
        bottlenecks: bottlenecks("0ms", "10ms"),
    })
}

#[test]
fn parking_lot_counts_for_many_n() {
    for n in 1..=12_i64 {
        let lot = build(n).expect("build");
        let topo = &lot.topology;
        assert_eq!(topo.hosts().count() as i64, 3 * n - 1, "n={n}");
        assert_eq!(topo.switches().count(), 3, "n={n}");
        assert_eq!(topo.bottlenecks().count(), 2, "n={n}");
        // 2 bottlenecks + one link per host
        assert_eq!(topo.links().len() as i64, 2 + 3 * n - 1, "n={n}");
    }
}

#[test]
fn parking_lot_partitions_hosts_contiguously() {
    for n in 1..=8_usize {
        let lot = build(n as i64).expect("build");
        let [s1, s2, s3] = lot.switches;
        for (h, &id) in lot.hosts.iter().enumerate() {
            let sw = lot.topology.attached_switch(id).expect("single-homed");
            let expected = if h < n {
                s1
            } else if h < 2 * n - 1 {
                s2
            } else {
                s3
            };
            assert_eq!(sw, expected, "n={n} h={h}");
        }
        let on = |sw| {
            lot.hosts
                .iter()
                .filter(|&&h| lot.topology.attached_switch(h) == Some(sw))
                .count()
        };
        assert_eq!(on(s1), n);
        assert_eq!(on(s2), n - 1);
        assert_eq!(on(s3), n);
    }
}

#[test]
fn parking_lot_n3_matches_reference_layout() {
    let lot = build(3).expect("build");
    let topo = &lot.topology;
    let names: Vec<&str> = topo.hosts().map(|h| h.name.as_str()).collect();
    assert_eq!(names, ["h1", "h2", "h3", "h4", "h5", "h6", "h7", "h8"]);

    let conns = topo.connections();
    let sw_of = |h: &str| {
        conns
            .iter()
            .find(|(host, _)| host == h)
            .map(|(_, s)| s.as_str())
    };
    assert_eq!(sw_of("h1"), Some("s1"));
    assert_eq!(sw_of("h3"), Some("s1"));
    assert_eq!(sw_of("h4"), Some("s2"));
    assert_eq!(sw_of("h5"), Some("s2"));
    assert_eq!(sw_of("h6"), Some("s3"));
    assert_eq!(sw_of("h8"), Some("s3"));

    assert_eq!(topo.node_by_name("h6").and_then(|n| n.ip), Some(Ipv4Addr::new(10, 0, 0, 6)));
    assert_eq!(lot.host(1), topo.node_by_name("h1").map(|n| n.id));
    assert_eq!(lot.host(0), None);
    assert_eq!(lot.host(9), None);
}

#[test]
fn parking_lot_bottlenecks_chain_distinct_switches() {
    let lot = build(2).expect("build");
    let topo = &lot.topology;
    let [s1, s2, s3] = lot.switches;
    let mut seen = HashSet::new();
    for l in topo.bottlenecks() {
        assert_ne!(l.a, l.b);
        assert_eq!(topo.node(l.a).map(|n| n.role), Some(NodeRole::Switch));
        assert_eq!(topo.node(l.b).map(|n| n.role), Some(NodeRole::Switch));
        assert!(seen.insert((l.a.min(l.b), l.a.max(l.b))), "duplicate bottleneck");
    }
    assert!(topo.link_between(s1, s2).is_some_and(|l| l.shaping_enabled()));
    assert!(topo.link_between(s2, s3).is_some_and(|l| l.shaping_enabled()));
    assert!(topo.link_between(s1, s3).is_none());
    // host links are unshaped
    for &h in &lot.hosts {
        assert!(topo.links_of(h).all(|l| !l.shaping_enabled()));
    }
}

#[test]
fn parking_lot_supports_asymmetric_delays() {
    let lot = build_parking_lot(&ParkingLotOpts {
        n: 3,
        bottlenecks: bottlenecks("0ms", "10ms"),
    })
    .expect("build");
    let [l12, l23] = lot.bottlenecks;
    let d12 = lot.topology.link(l12).and_then(|l| l.shaping.as_ref()).map(|s| s.delay.to_string());
    let d23 = lot.topology.link(l23).and_then(|l| l.shaping.as_ref()).map(|s| s.delay.to_string());
    assert_eq!(d12.as_deref(), Some("0ms"));
    assert_eq!(d23.as_deref(), Some("10ms"));
}

#[test]
fn parking_lot_rejects_non_positive_n() {
    assert!(matches!(build(0), Err(ExperimentError::Configuration(_))));
    assert!(matches!(build(-1), Err(ExperimentError::Configuration(_))));
    assert!(matches!(build(i64::MAX / 4), Err(ExperimentError::Configuration(_))));
}

#[test]
fn parking_lot_build_is_deterministic() {
    for n in [1, 3, 7] {
        assert_eq!(build(n).expect("first"), build(n).expect("second"));
    }
}

#[test]
fn parking_lot_n1_leaves_middle_switch_without_hosts() {
    let lot = build(1).expect("build");
    let [s1, s2, s3] = lot.switches;
    assert_eq!(lot.hosts.len(), 2);
    assert_eq!(lot.topology.attached_switch(lot.hosts[0]), Some(s1));
    assert_eq!(lot.topology.attached_switch(lot.hosts[1]), Some(s3));
    assert_eq!(lot.topology.neighbors(s2).len(), 2);
}

#[test]
fn base_rtt_doubles_sum_of_bottleneck_delays() {
    let lot = build_parking_lot(&ParkingLotOpts {
        n: 3,
        bottlenecks: bottlenecks("5ms", "10ms"),
    })
    .expect("build");
    let h = |k| lot.host(k).expect("host");
    // h1 (s1) -> h8 (s3): both bottlenecks
    assert_eq!(lot.topology.base_rtt(h(1), h(8)), Some(SimTime::from_millis(30)));
    // h4 (s2) -> h8 (s3): only s2-s3
    assert_eq!(lot.topology.base_rtt(h(4), h(8)), Some(SimTime::from_millis(20)));
    // h1 -> h2 share s1
    assert_eq!(lot.topology.base_rtt(h(1), h(2)), Some(SimTime::ZERO));

    let path = lot.topology.path(h(1), h(8)).expect("path");
    assert_eq!(path.len(), 5);
}

#[test]
fn topology_connect_rejects_duplicates_and_self_loops() {
    let mut topo = crate::net::Topology::default();
    let a = topo.add_switch("a");
    let b = topo.add_switch("b");
    assert!(topo.connect(a, b, None).is_ok());
    assert!(matches!(topo.connect(b, a, None), Err(ExperimentError::Configuration(_))));
    assert!(matches!(topo.connect(a, a, None), Err(ExperimentError::Configuration(_))));
    assert!(matches!(
        topo.connect(a, crate::net::NodeId(42), None),
        Err(ExperimentError::Configuration(_))
    ));
}

#[test]
fn host_ip_carries_into_higher_octets() {
    assert_eq!(host_ip(1), Ipv4Addr::new(10, 0, 0, 1));
    assert_eq!(host_ip(255), Ipv4Addr::new(10, 0, 0, 255));
    assert_eq!(host_ip(256), Ipv4Addr::new(10, 0, 1, 0));
}

#[test]
fn reachability_stops_at_disconnected_islands() {
    let mut topo = Topology::default();
    let s1 = topo.add_switch("s1");
    let s2 = topo.add_switch("s2");
    let h1 = topo.add_host("h1", host_ip(1));
    let h2 = topo.add_host("h2", host_ip(2));
    let h3 = topo.add_host("h3", host_ip(3));
    topo.connect(h1, s1, None).expect("h1-s1");
    topo.connect(h2, s1, None).expect("h2-s1");
    topo.connect(h3, s2, None).expect("h3-s2");

    let seen = topo.reachable_from(h1);
    assert!(seen[s1.0] && seen[h1.0] && seen[h2.0]);
    assert!(!seen[s2.0] && !seen[h3.0]);
    assert_eq!(topo.path(h1, h2), Some(vec![h1, s1, h2]));
    assert_eq!(topo.path(h1, h3), None);
    assert_eq!(topo.neighbors(s1), vec![h1, h2]);

    topo.connect(s1, s2, None).expect("s1-s2");
    assert_eq!(topo.path(h1, h3), Some(vec![h1, s1, s2, h3]));
    assert_eq!(topo.links_of(s1).count(), 3);
}
