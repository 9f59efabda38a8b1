use crate::error::ExperimentError;
use crate::scenario::{
    CongestionControl, FlowSpec, ProbeSpec, Role, ScenarioTimeline, ServerSpec,
};
use crate::sim::{Launch, SimTime};

fn flow(src: &str, dst: &str, offset: f64, duration: f64, label: &str) -> FlowSpec {
    FlowSpec::new(src, dst, CongestionControl::Cubic, offset, duration, label)
}

fn schedule(flows: Vec<FlowSpec>, grace: f64) -> Result<ScenarioTimeline, ExperimentError> {
    ScenarioTimeline::schedule(flows, Vec::new(), grace, None)
}

#[test]
fn scenario_duration_is_latest_end_plus_grace() {
    let tl = schedule(
        vec![
            flow("h8", "h1", 0.0, 100.0, "flow1"),
            flow("h8", "h4", 10.0, 90.0, "flow2"),
        ],
        3.0,
    )
    .expect("valid");
    assert_eq!(tl.scenario_duration_secs(), 103.0);
    assert_eq!(tl.scenario_duration(), SimTime::from_secs(103));
}

#[test]
fn fractional_flow_durations_count_as_whole_seconds() {
    let tl = schedule(vec![flow("h8", "h1", 0.0, 0.5, "half")], 0.0).expect("valid");
    assert_eq!(tl.flows()[0].run_secs(), 1);
    assert_eq!(tl.scenario_duration_secs(), 1.0);

    let tl = schedule(vec![flow("h8", "h1", 2.5, 9.2, "frac")], 0.25).expect("valid");
    assert_eq!(tl.scenario_duration_secs(), 12.75);
}

#[test]
fn scenario_duration_counts_the_latest_flow_not_the_last_declared() {
    let tl = schedule(
        vec![
            flow("h1", "h6", 0.0, 200.0, "a"),
            flow("h2", "h7", 50.0, 10.0, "b"),
        ],
        0.0,
    )
    .expect("valid");
    assert_eq!(tl.scenario_duration_secs(), 200.0);
}

#[test]
fn empty_timeline_lasts_only_the_grace_period() {
    let tl = schedule(Vec::new(), 5.0).expect("valid");
    assert_eq!(tl.scenario_duration_secs(), 5.0);
    assert!(tl.order().is_empty());
    assert!(tl.servers().is_empty());
}

#[test]
fn probes_extend_the_scenario() {
    let tl = ScenarioTimeline::schedule(
        vec![flow("h1", "h6", 0.0, 100.0, "a")],
        vec![ProbeSpec {
            source: "h3".into(),
            dest: "h8".into(),
            count: 150,
            interval_secs: 1.0,
            start_offset_secs: 5.0,
            output_label: "rtt".into(),
        }],
        2.0,
        None,
    )
    .expect("valid");
    assert_eq!(tl.scenario_duration_secs(), 157.0);
    assert_eq!(tl.sink_for(Launch::Probe(0)).map(|s| s.role), Some(Role::Probe));
}

#[test]
fn launch_order_is_by_offset_with_stable_ties() {
    let tl = schedule(
        vec![
            flow("h1", "h6", 20.0, 10.0, "late"),
            flow("h2", "h6", 0.0, 10.0, "first"),
            flow("h3", "h7", 20.0, 10.0, "late2"),
            flow("h4", "h7", 0.0, 10.0, "second"),
        ],
        0.0,
    )
    .expect("valid");
    let order: Vec<Launch> = tl.order().iter().map(|s| s.launch()).collect();
    assert_eq!(
        order,
        vec![Launch::Flow(1), Launch::Flow(3), Launch::Flow(0), Launch::Flow(2)]
    );
    let offsets: Vec<SimTime> = tl.order().iter().map(|s| s.at()).collect();
    assert_eq!(
        offsets,
        vec![
            SimTime::ZERO,
            SimTime::ZERO,
            SimTime::from_secs(20),
            SimTime::from_secs(20)
        ]
    );
}

#[test]
fn identical_server_declarations_share_one_server() {
    let tl = schedule(
        vec![
            flow("h1", "h6", 0.0, 10.0, "a"),
            flow("h2", "h6", 5.0, 10.0, "b"),
            flow("h3", "h7", 0.0, 10.0, "c"),
        ],
        0.0,
    )
    .expect("valid");
    let hosts: Vec<&str> = tl.servers().iter().map(|s| s.host.as_str()).collect();
    assert_eq!(hosts, ["h6", "h7"]);
    assert_eq!(tl.servers()[0].sink.file_name(), "h6_server_cubic");
}

#[test]
fn conflicting_server_declarations_fail() {
    let a = flow("h1", "h6", 0.0, 10.0, "a");
    let b = flow("h2", "h6", 0.0, 10.0, "b").with_server(ServerSpec {
        label: "other".into(),
        interval_secs: 2,
    });
    assert!(matches!(
        schedule(vec![a, b], 0.0),
        Err(ExperimentError::SchedulingConflict(_))
    ));
}

#[test]
fn invalid_flow_parameters_fail_with_scheduling_conflict() {
    let cases = vec![
        flow("h1", "h6", -1.0, 10.0, "neg-offset"),
        flow("h1", "h6", f64::NAN, 10.0, "nan-offset"),
        flow("h1", "h6", 0.0, 0.0, "zero-duration"),
        flow("h1", "h6", 0.0, -5.0, "neg-duration"),
        flow("h1", "h1", 0.0, 10.0, "self"),
    ];
    for f in cases {
        let label = f.output_label.clone();
        assert!(
            matches!(schedule(vec![f], 0.0), Err(ExperimentError::SchedulingConflict(_))),
            "expected conflict for {label}"
        );
    }
}

#[test]
fn invalid_probe_parameters_fail_with_scheduling_conflict() {
    let probe = ProbeSpec {
        source: "h3".into(),
        dest: "h8".into(),
        count: 0,
        interval_secs: 1.0,
        start_offset_secs: 0.0,
        output_label: "rtt".into(),
    };
    assert!(matches!(
        ScenarioTimeline::schedule(Vec::new(), vec![probe], 0.0, None),
        Err(ExperimentError::SchedulingConflict(_))
    ));
}

#[test]
fn duplicate_artifacts_fail() {
    // same source, label and congestion control => same client file
    let a = flow("h8", "h1", 0.0, 10.0, "flow");
    let b = flow("h8", "h4", 5.0, 10.0, "flow");
    assert!(matches!(
        schedule(vec![a, b], 0.0),
        Err(ExperimentError::SchedulingConflict(_))
    ));
}

#[test]
fn negative_grace_is_a_configuration_error() {
    assert!(matches!(
        schedule(vec![flow("h1", "h6", 0.0, 10.0, "a")], -1.0),
        Err(ExperimentError::Configuration(_))
    ));
}

#[test]
fn check_hosts_rejects_unknown_endpoints() {
    use crate::scenario::ExperimentConfig;
    use crate::topo::build_parking_lot;

    let cfg = ExperimentConfig::staggered();
    let lot = build_parking_lot(&cfg.topology_opts().expect("opts")).expect("build");

    let ok = cfg.timeline().expect("valid");
    assert!(ok.check_hosts(&lot.topology).is_ok());

    let bad = schedule(vec![flow("h1", "h99", 0.0, 10.0, "a")], 0.0).expect("valid");
    assert!(matches!(
        bad.check_hosts(&lot.topology),
        Err(ExperimentError::Configuration(_))
    ));
    // switches are not valid endpoints
    let sw = schedule(vec![flow("h1", "s2", 0.0, 10.0, "a")], 0.0).expect("valid");
    assert!(sw.check_hosts(&lot.topology).is_err());
}
