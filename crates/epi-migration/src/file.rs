//! Migration rate-file loading.
//!
//! # File format
//!
//! Each migration type is backed by a flat binary table plus a companion
//! JSON metadata file at `<name>.bin` / `<name>.bin.json`.
//!
//! The binary file holds one fixed-size row per origin node:
//!
//! ```text
//! [u32 × D destination external IDs (LE)] [f64 × D rates (LE)]
//! ```
//!
//! where `D` is `DatavalueCount` from the metadata (default per type: local
//! 8, air 60, regional 30, sea 5).  A destination ID of 0 marks an unused
//! slot.
//!
//! The metadata file:
//!
//! ```json
//! {
//!   "Metadata":    { "IdReference": "...", "NodeCount": 26, "DatavalueCount": 8 },
//!   "NodeOffsets": "0000000100000000 00000002 00000060 …"  (no spaces)
//! }
//! ```
//!
//! `NodeOffsets` is a hex string with 16 characters per origin node: 8 for
//! the node's external ID, 8 for the byte offset of its row in the binary
//! file.  `IdReference` must equal the demographics `IdReference` or the
//! load is rejected — rates keyed against a different node-ID universe would
//! silently route people to the wrong places.

use std::fs;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use serde::Deserialize;

use epi_core::MigrationType;

use crate::{MigrationError, MigrationResult};

// ── Metadata schema ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct MetadataFile {
    #[serde(rename = "Metadata")]
    metadata: MetadataSection,
    #[serde(rename = "NodeOffsets")]
    node_offsets: String,
}

#[derive(Deserialize)]
struct MetadataSection {
    #[serde(rename = "IdReference")]
    id_reference: String,
    #[serde(rename = "NodeCount")]
    node_count: u32,
    #[serde(rename = "DatavalueCount", default)]
    datavalue_count: Option<u32>,
}

/// Default destination-slot count per migration type.
pub fn default_destinations_per_node(migration_type: MigrationType) -> usize {
    match migration_type {
        MigrationType::Local    => 8,
        MigrationType::Air      => 60,
        MigrationType::Regional => 30,
        MigrationType::Sea      => 5,
        // Family and intervention trips are never file-backed.
        _ => 0,
    }
}

// ── MigrationInfoFile ────────────────────────────────────────────────────────

/// One loaded migration rate file (one migration type).
///
/// The binary table is read fully into memory at load time — even the
/// largest sane file (thousands of nodes × 60 air slots × 12 bytes) is well
/// under a megabyte, and holding it avoids per-node seeks during population.
#[derive(Debug)]
pub struct MigrationInfoFile {
    migration_type:        MigrationType,
    destinations_per_node: usize,
    offsets:               FxHashMap<u32, u64>,
    data:                  Vec<u8>,
}

impl MigrationInfoFile {
    /// Load `<path>` and `<path>.json`, validating the metadata against
    /// `expected_id_reference` and the binary size against the metadata.
    pub fn open(
        path: &Path,
        migration_type: MigrationType,
        expected_id_reference: &str,
    ) -> MigrationResult<Self> {
        if !path.exists() {
            return Err(MigrationError::FileNotFound { path: path.to_path_buf() });
        }

        let metadata_path = metadata_path_for(path);
        if !metadata_path.exists() {
            return Err(MigrationError::FileNotFound { path: metadata_path });
        }

        let metadata_text = fs::read_to_string(&metadata_path)?;
        let parsed: MetadataFile =
            serde_json::from_str(&metadata_text).map_err(|e| MigrationError::MetadataParse {
                path:    metadata_path.clone(),
                message: e.to_string(),
            })?;

        if parsed.metadata.id_reference != expected_id_reference {
            return Err(MigrationError::IdReferenceMismatch {
                path:     metadata_path,
                expected: expected_id_reference.to_string(),
                actual:   parsed.metadata.id_reference,
            });
        }

        let destinations_per_node = match parsed.metadata.datavalue_count {
            Some(n) => n as usize,
            None => default_destinations_per_node(migration_type),
        };
        if destinations_per_node == 0 {
            return Err(MigrationError::MetadataParse {
                path:    metadata_path,
                message: format!("no destination slot count for {migration_type} migration"),
            });
        }

        let offsets = parse_node_offsets(
            &parsed.node_offsets,
            parsed.metadata.node_count,
            &metadata_path,
        )?;

        // Validate binary size: NodeCount rows of fixed width.
        let row_size = destinations_per_node as u64 * (4 + 8);
        let expected_size = parsed.metadata.node_count as u64 * row_size;
        let actual_size = fs::metadata(path)?.len();
        if actual_size != expected_size {
            return Err(MigrationError::SizeMismatch {
                path:     path.to_path_buf(),
                expected: expected_size,
                actual:   actual_size,
            });
        }

        for (&node_id, &offset) in &offsets {
            if offset + row_size > expected_size {
                return Err(MigrationError::OffsetsMalformed {
                    path:    metadata_path,
                    message: format!("offset {offset:#x} for node {node_id} exceeds file size"),
                });
            }
        }

        let data = fs::read(path)?;

        Ok(Self { migration_type, destinations_per_node, offsets, data })
    }

    pub fn migration_type(&self) -> MigrationType {
        self.migration_type
    }

    /// `true` if this file has a row for `from_external_id`.
    pub fn has_node(&self, from_external_id: u32) -> bool {
        self.offsets.contains_key(&from_external_id)
    }

    /// The `(destination external ID, rate)` pairs for one origin node, with
    /// unused (zero-ID) slots filtered out.  `None` if the node has no row.
    pub fn read_rates(&self, from_external_id: u32) -> Option<Vec<(u32, f64)>> {
        let offset = *self.offsets.get(&from_external_id)? as usize;
        let d = self.destinations_per_node;

        let ids_bytes   = &self.data[offset..offset + 4 * d];
        let rates_bytes = &self.data[offset + 4 * d..offset + 4 * d + 8 * d];

        let mut out = Vec::new();
        for i in 0..d {
            let id = u32::from_le_bytes(ids_bytes[4 * i..4 * i + 4].try_into().unwrap());
            if id == 0 {
                continue;
            }
            let rate = f64::from_le_bytes(rates_bytes[8 * i..8 * i + 8].try_into().unwrap());
            out.push((id, rate));
        }
        Some(out)
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn metadata_path_for(bin_path: &Path) -> PathBuf {
    let mut name = bin_path.as_os_str().to_os_string();
    name.push(".json");
    PathBuf::from(name)
}

fn parse_node_offsets(
    hex: &str,
    node_count: u32,
    metadata_path: &Path,
) -> MigrationResult<FxHashMap<u32, u64>> {
    if hex.len() != node_count as usize * 16 {
        return Err(MigrationError::OffsetsMalformed {
            path:    metadata_path.to_path_buf(),
            message: format!(
                "NodeOffsets has {} chars, expected {} (16 per node for {} nodes)",
                hex.len(),
                node_count * 16,
                node_count
            ),
        });
    }

    let mut offsets = FxHashMap::default();
    for n in 0..node_count as usize {
        let entry = &hex[n * 16..n * 16 + 16];
        let node_id = u32::from_str_radix(&entry[..8], 16).map_err(|e| {
            MigrationError::OffsetsMalformed {
                path:    metadata_path.to_path_buf(),
                message: format!("bad node id hex '{}': {e}", &entry[..8]),
            }
        })?;
        let offset = u32::from_str_radix(&entry[8..], 16).map_err(|e| {
            MigrationError::OffsetsMalformed {
                path:    metadata_path.to_path_buf(),
                message: format!("bad offset hex '{}': {e}", &entry[8..]),
            }
        })?;
        offsets.insert(node_id, offset as u64);
    }
    Ok(offsets)
}
