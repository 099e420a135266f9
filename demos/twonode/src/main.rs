//! `twonode` — a two-node epidemic with fixed-rate migration.
//!
//! Node 1 starts with an infected fraction; node 2 starts clean.  Local
//! migration couples the two, so the epidemic seeds node 2 once travelers
//! start carrying infections across.  The run writes its rate files on the
//! fly (exercising the binary rate-file loader end to end) and emits the
//! channel CSV to `output/`.
//!
//! Run with:
//!   cargo run -p twonode --release

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use epi_core::{GeoPoint, MigrationType, SimParams};
use epi_exchange::LocalTransport;
use epi_human::{HumanConfig, InfectionParams, RoundTripConfig};
use epi_migration::MigrationInfoFactory;
use epi_node::{NodeConfig, StaticDemographics};
use epi_report::ChannelReport;
use epi_sim::{NodeSeed, SimulationBuilder};

const ID_REFERENCE: &str = "twonode-demo";
const OUTPUT_DIR: &str = "output";

const NODE_1: u32 = 1;
const NODE_2: u32 = 2;
const POP_1: usize = 5_000;
const POP_2: usize = 5_000;
const SIM_DAYS: u32 = 365;

// ── Migration-file generation ─────────────────────────────────────────────────

/// Write a local-migration rate file pairing the two nodes symmetrically.
///
/// Layout per origin row: 8 u32 destination slots then 8 f64 rate slots,
/// zero-filled past the first entry.
fn write_migration_files(dir: &Path, rate: f64) -> Result<std::path::PathBuf> {
    const SLOTS: usize = 8;

    let mut bin = Vec::new();
    for (dest, r) in [(NODE_2, rate), (NODE_1, rate)] {
        for slot in 0..SLOTS {
            let id = if slot == 0 { dest } else { 0 };
            bin.extend_from_slice(&id.to_le_bytes());
        }
        for slot in 0..SLOTS {
            let value = if slot == 0 { r } else { 0.0 };
            bin.extend_from_slice(&value.to_le_bytes());
        }
    }

    let row = (SLOTS * 12) as u32;
    let offsets = format!("{:08x}{:08x}{:08x}{:08x}", NODE_1, 0, NODE_2, row);
    let metadata = serde_json::json!({
        "Metadata": {
            "IdReference": ID_REFERENCE,
            "NodeCount": 2,
            "DatavalueCount": SLOTS,
        },
        "NodeOffsets": offsets,
    });

    let bin_path = dir.join("local_migration.bin");
    fs::write(&bin_path, &bin).context("writing migration binary")?;
    fs::write(
        dir.join("local_migration.bin.json"),
        serde_json::to_string_pretty(&metadata)?,
    )
    .context("writing migration metadata")?;
    Ok(bin_path)
}

// ── Main ─────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let out = Path::new(OUTPUT_DIR);
    fs::create_dir_all(out).context("creating output directory")?;

    let bin_path = write_migration_files(out, 0.02)?;

    let mut factory = MigrationInfoFactory::new();
    factory.add_file(&bin_path, MigrationType::Local, ID_REFERENCE, 1.0)?;

    let demographics = StaticDemographics {
        id_reference:       ID_REFERENCE.to_string(),
        initial_prevalence: 0.01,
        ..StaticDemographics::default()
    };

    let human_config = HumanConfig {
        local_roundtrip: RoundTripConfig::with_mean_days(0.9, 5.0),
        infection: InfectionParams {
            mean_duration_days: 8.0,
            infectiousness:     0.25,
            case_fatality:      0.002,
        },
        ..HumanConfig::default()
    };

    let node_config = NodeConfig {
        enable_initial_prevalence: true,
        ..NodeConfig::default()
    };

    let params = SimParams {
        total_timesteps: SIM_DAYS,
        dt_days:         1.0,
        seed:            42,
        base_year:       2015.0,
    };

    let report = ChannelReport::new(&out.join("channels.csv"))?;

    let mut sim = SimulationBuilder::new(params, LocalTransport, Arc::new(demographics))
        .human_config(human_config)
        .node_config(node_config)
        .migration(factory)
        .nodes(vec![
            NodeSeed {
                external_id:        NODE_1,
                position:           GeoPoint::new(6.45, 3.39),
                initial_population: POP_1,
            },
            NodeSeed {
                external_id:        NODE_2,
                position:           GeoPoint::new(6.60, 3.35),
                initial_population: POP_2,
            },
        ])
        .report(Box::new(report))
        .build()?;

    sim.run()?;

    println!("simulated {SIM_DAYS} days over {} nodes", sim.nodes().count());
    for node in sim.nodes() {
        println!(
            "  node {:>2}: pop {:>7.0}  infected {:>7.0}  disease deaths {:>6.0}",
            node.external_id(),
            node.stat_pop(),
            node.infected(),
            node.disease_deaths(),
        );
    }
    println!("channels written to {OUTPUT_DIR}/channels.csv");
    Ok(())
}
