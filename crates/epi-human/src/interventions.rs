//! The individual's intervention container.
//!
//! The effect logic of real campaigns (who gets what, when) lives outside
//! the core; what the core carries is the container contract: distribute,
//! update/expire, and aggregate effect channels.  Interventions are closed
//! data (effect multipliers plus expiry bookkeeping) rather than trait
//! objects so the whole container serializes with the individual across
//! rank boundaries.

use epi_core::PropertyBag;
use serde::{Deserialize, Serialize};

// ── HeldIntervention ─────────────────────────────────────────────────────────

/// One distributed intervention held by an individual.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HeldIntervention {
    pub name: String,

    /// Effect channels, multiplicative, 1.0 = no effect.
    pub acquire_modifier:   f32,
    pub transmit_modifier:  f32,
    pub mortality_modifier: f32,

    /// Days of effect left.  Non-positive means unlimited until disqualified.
    pub remaining_days: f32,
    pub expires:        bool,

    /// `(key, value)` pairs that, when matched by the holder's properties,
    /// refuse distribution or force early expiry.
    pub disqualifying_properties: Vec<(String, String)>,

    /// Property written back to the holder on first successful application.
    pub status_property: Option<(String, String)>,

    expired: bool,
}

impl HeldIntervention {
    /// A pure-effect intervention lasting `duration_days` (vaccine-style).
    pub fn with_effects(
        name: impl Into<String>,
        acquire_modifier: f32,
        transmit_modifier: f32,
        mortality_modifier: f32,
        duration_days: f32,
    ) -> Self {
        Self {
            name: name.into(),
            acquire_modifier,
            transmit_modifier,
            mortality_modifier,
            remaining_days: duration_days,
            expires: duration_days > 0.0,
            disqualifying_properties: Vec::new(),
            status_property: None,
            expired: false,
        }
    }

    pub fn expired(&self) -> bool {
        self.expired
    }
}

// ── InterventionsContainer ───────────────────────────────────────────────────

/// Every intervention an individual currently holds, with aggregate queries
/// over the live ones.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InterventionsContainer {
    interventions: Vec<HeldIntervention>,
}

impl InterventionsContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Distribute one intervention to the holder.
    ///
    /// Returns `false` (and drops the intervention) if the holder's
    /// properties already disqualify it.  On success the status property, if
    /// any, is written into `properties`.
    pub fn give_intervention(
        &mut self,
        intervention: HeldIntervention,
        properties: &mut PropertyBag,
    ) -> bool {
        if is_disqualified(&intervention, properties) {
            return false;
        }
        if let Some((key, value)) = &intervention.status_property {
            properties.set(key.clone(), value.clone());
        }
        self.interventions.push(intervention);
        true
    }

    /// Advance expiry timers and drop expired interventions.
    ///
    /// An intervention whose holder now carries one of its disqualifying
    /// property values expires immediately regardless of remaining time.
    pub fn update(&mut self, dt: f32, properties: &PropertyBag) {
        for iv in &mut self.interventions {
            if iv.expires {
                iv.remaining_days -= dt;
                if iv.remaining_days <= 0.0 {
                    iv.expired = true;
                }
            }
            if is_disqualified(iv, properties) {
                iv.expired = true;
            }
        }
        self.interventions.retain(|iv| !iv.expired);
    }

    pub fn len(&self) -> usize {
        self.interventions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interventions.is_empty()
    }

    /// Product of live acquire modifiers.
    pub fn acquire_modifier(&self) -> f32 {
        self.interventions.iter().map(|iv| iv.acquire_modifier).product()
    }

    /// Product of live transmit modifiers.
    pub fn transmit_modifier(&self) -> f32 {
        self.interventions.iter().map(|iv| iv.transmit_modifier).product()
    }

    /// Product of live mortality modifiers.
    pub fn mortality_modifier(&self) -> f32 {
        self.interventions.iter().map(|iv| iv.mortality_modifier).product()
    }
}

/// `true` when the holder's properties carry any of the intervention's
/// disqualifying values.
fn is_disqualified(intervention: &HeldIntervention, properties: &PropertyBag) -> bool {
    intervention
        .disqualifying_properties
        .iter()
        .any(|(key, value)| properties.get(key) == Some(value.as_str()))
}
