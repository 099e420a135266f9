//! Unit tests for epi-report.

use std::sync::Arc;

use epi_core::{GeoPoint, Suid};
use epi_human::HumanConfig;
use epi_node::{ConstantClimate, IdGenerators, Node, NodeConfig, StaticDemographics};

use crate::{ChannelReport, NullReport, Report};

fn small_node(count: usize, ids: &mut IdGenerators) -> Node {
    let mut node = Node::new(
        Suid(1),
        1,
        GeoPoint::new(0.0, 0.0),
        7,
        Arc::new(HumanConfig::default()),
        Arc::new(NodeConfig::default()),
        Arc::new(StaticDemographics::default()),
        Box::new(ConstantClimate::default()),
    );
    node.populate_from_demographics(count, ids);
    node
}

#[test]
fn null_report_is_a_noop() {
    let mut ids = IdGenerators::new(0, 1);
    let node = small_node(3, &mut ids);
    let mut report = NullReport;
    report.begin_timestep();
    report.log_node_data(&node);
    report.end_timestep(0.0, 1.0);
    assert!(!report.requires_individual_data());
    report.finalize().unwrap();
}

#[test]
fn channel_report_writes_one_row_per_timestep() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("channels.csv");

    let mut ids = IdGenerators::new(0, 1);
    let mut node = small_node(5, &mut ids);

    let mut report = ChannelReport::new(&path).unwrap();
    for day in 0..3 {
        report.begin_timestep();
        node.update(day as f32, 1.0, 2015.0, &mut ids, |_| {});
        report.log_node_data(&node);
        report.end_timestep(day as f32, 1.0);
    }
    report.finalize().unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.trim().lines().collect();
    assert_eq!(lines.len(), 4, "header + 3 timesteps");
    assert!(lines[0].starts_with("time,statistical_population,infected"));
    // Each data row reports the 5-person population.
    for line in &lines[1..] {
        let fields: Vec<&str> = line.split(',').collect();
        assert_eq!(fields[1], "5");
    }
}

#[test]
fn channels_sum_across_nodes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("channels.csv");

    let mut ids = IdGenerators::new(0, 1);
    let mut node_a = small_node(2, &mut ids);
    let mut node_b = small_node(3, &mut ids);

    let mut report = ChannelReport::new(&path).unwrap();
    report.begin_timestep();
    node_a.update(0.0, 1.0, 2015.0, &mut ids, |_| {});
    node_b.update(0.0, 1.0, 2015.0, &mut ids, |_| {});
    report.log_node_data(&node_a);
    report.log_node_data(&node_b);
    report.end_timestep(0.0, 1.0);
    report.finalize().unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let row = text.trim().lines().nth(1).unwrap();
    let fields: Vec<&str> = row.split(',').collect();
    assert_eq!(fields[1], "5", "2 + 3 across nodes");
}
