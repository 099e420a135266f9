//! The `Report` trait — callbacks at fixed points in the timestep.

use epi_human::IndividualHuman;
use epi_node::Node;

use crate::ReportResult;

/// Hooks the simulation invokes every timestep.
///
/// All methods default to no-ops so implementations only override what they
/// record.  Per-individual logging is gated on
/// [`requires_individual_data`](Self::requires_individual_data) so reports
/// that only need node aggregates don't pay the per-agent call.
pub trait Report: Send {
    /// Called before any node updates this timestep.
    fn begin_timestep(&mut self) {}

    /// `true` if [`log_individual_data`](Self::log_individual_data) should
    /// be called for every resident of every node.
    fn requires_individual_data(&self) -> bool {
        false
    }

    /// Called once per resident individual, after all residents of its node
    /// have updated.
    fn log_individual_data(&mut self, _individual: &IndividualHuman) {}

    /// Called once per node after its update completes.
    fn log_node_data(&mut self, _node: &Node) {}

    /// Called after migration resolution, at the end of the timestep.
    fn end_timestep(&mut self, _time: f32, _dt: f32) {}

    /// Called once after the final timestep.  Flush and close outputs here.
    fn finalize(&mut self) -> ReportResult<()> {
        Ok(())
    }
}

/// A [`Report`] that records nothing.
pub struct NullReport;

impl Report for NullReport {}
