//! Assembles one `MigrationInfo` per node from the loaded rate files.

use std::path::Path;

use rustc_hash::FxHashMap;
use tracing::warn;

use epi_core::{MigrationType, Suid};

use crate::{MigrationError, MigrationInfo, MigrationInfoFile, MigrationResult};

/// Builds per-node [`MigrationInfo`] objects from the set of enabled rate
/// files.
///
/// Each enabled migration type contributes its own file and a rate
/// multiplier (the `x_local_migration`-style scaling knobs); a node's
/// `MigrationInfo` is the concatenation of its rows across all enabled
/// files, with each file's rates scaled by its multiplier.
#[derive(Default)]
pub struct MigrationInfoFactory {
    files: Vec<(MigrationInfoFile, f32)>,
}

impl MigrationInfoFactory {
    /// A factory with no files: every node comes out migrationally isolated.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and enable one rate file.
    ///
    /// `x_modifier` scales every rate in the file (1.0 = as configured).
    /// The file's `IdReference` must equal `id_reference` or the load fails.
    pub fn add_file(
        &mut self,
        path: &Path,
        migration_type: MigrationType,
        id_reference: &str,
        x_modifier: f32,
    ) -> MigrationResult<()> {
        let file = MigrationInfoFile::open(path, migration_type, id_reference)?;
        self.files.push((file, x_modifier));
        Ok(())
    }

    /// Number of enabled rate files.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Build the `MigrationInfo` for the node with external ID
    /// `from_external_id`.
    ///
    /// `id_map` translates destination external IDs to suids; a destination
    /// absent from the map is a configuration error (the rate file references
    /// a node the demographics never defined).  A node present in no file is
    /// valid — it gets an empty `MigrationInfo` and a warning.
    pub fn create_migration_info(
        &self,
        from_external_id: u32,
        id_map: &FxHashMap<u32, Suid>,
    ) -> MigrationResult<MigrationInfo> {
        let mut rate_data = Vec::new();

        for (file, x_modifier) in &self.files {
            let Some(rates) = file.read_rates(from_external_id) else {
                continue;
            };
            for (dest_external_id, rate) in rates {
                let suid = *id_map.get(&dest_external_id).ok_or(
                    MigrationError::UnknownDestination {
                        from: from_external_id,
                        to:   dest_external_id,
                    },
                )?;
                rate_data.push((suid, file.migration_type(), rate as f32 * x_modifier));
            }
        }

        if rate_data.is_empty() {
            warn!(
                node = from_external_id,
                "node has no reachable migration destinations (migrationally isolated)"
            );
            return Ok(MigrationInfo::empty());
        }

        Ok(MigrationInfo::new(rate_data))
    }
}
