//! Run-wide time-series channels written to CSV.

use std::fs::File;
use std::path::Path;

use csv::Writer;

use epi_node::Node;

use crate::report::Report;
use crate::ReportResult;

/// Per-timestep totals accumulated across this rank's nodes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct ChannelRow {
    stat_pop:           f64,
    infected:           f64,
    new_infections:     f64,
    births:             f64,
    disease_deaths:     f64,
    non_disease_deaths: f64,
    contagion:          f64,
}

/// The standard aggregate report: one CSV row per timestep with the
/// population, infection, and vital-dynamics channels summed over every node
/// this rank owns.
///
/// Birth and death channels are cumulative (as the nodes count them); the
/// others are per-timestep snapshots.
pub struct ChannelReport {
    writer:   Writer<File>,
    current:  ChannelRow,
    finished: bool,
}

impl ChannelReport {
    /// Create (or truncate) `path` and write the header row.
    pub fn new(path: &Path) -> ReportResult<Self> {
        let mut writer = Writer::from_path(path)?;
        writer.write_record([
            "time",
            "statistical_population",
            "infected",
            "new_infections",
            "births",
            "disease_deaths",
            "non_disease_deaths",
            "contagion",
        ])?;
        Ok(Self {
            writer,
            current: ChannelRow::default(),
            finished: false,
        })
    }
}

impl Report for ChannelReport {
    fn log_node_data(&mut self, node: &Node) {
        self.current.stat_pop           += node.stat_pop() as f64;
        self.current.infected           += node.infected() as f64;
        self.current.new_infections     += node.new_infections() as f64;
        self.current.births             += node.births() as f64;
        self.current.disease_deaths     += node.disease_deaths() as f64;
        self.current.non_disease_deaths += node.non_disease_deaths() as f64;
        self.current.contagion          += node.infectivity() as f64;
    }

    fn end_timestep(&mut self, time: f32, _dt: f32) {
        let row = std::mem::take(&mut self.current);
        // Errors are surfaced at finalize; a report must not abort the run
        // mid-timestep.
        let _ = self.writer.write_record(&[
            format!("{time}"),
            format!("{}", row.stat_pop),
            format!("{}", row.infected),
            format!("{}", row.new_infections),
            format!("{}", row.births),
            format!("{}", row.disease_deaths),
            format!("{}", row.non_disease_deaths),
            format!("{}", row.contagion),
        ]);
    }

    fn finalize(&mut self) -> ReportResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.writer.flush()?;
        Ok(())
    }
}
