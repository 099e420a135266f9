//! Event trigger names flowing through the observer machinery.
//!
//! Triggers are open-ended strings rather than a closed enum: campaign
//! configurations define their own names, and the built-in ones below are
//! just well-known values.  `Cow` keeps the built-ins allocation-free while
//! still allowing user-defined names.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The name of an observable event, broadcast to observers on the individual
/// or node it happened to — and, via the cross-node event exchange, to
/// qualifying nodes on other ranks.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct EventTrigger(Cow<'static, str>);

impl EventTrigger {
    pub const EMIGRATING:     EventTrigger = EventTrigger(Cow::Borrowed("Emigrating"));
    pub const IMMIGRATING:    EventTrigger = EventTrigger(Cow::Borrowed("Immigrating"));
    pub const BIRTHS:         EventTrigger = EventTrigger(Cow::Borrowed("Births"));
    pub const NEW_INFECTION:  EventTrigger = EventTrigger(Cow::Borrowed("NewInfection"));
    pub const EVERY_UPDATE:   EventTrigger = EventTrigger(Cow::Borrowed("EveryUpdate"));
    pub const HAPPY_BIRTHDAY: EventTrigger = EventTrigger(Cow::Borrowed("HappyBirthday"));

    /// A user-defined trigger name (campaign-configured).
    pub fn custom(name: impl Into<String>) -> Self {
        EventTrigger(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
