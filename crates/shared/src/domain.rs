use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of addressable lights; ids run from 1 through this value.
pub const LIGHT_COUNT: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LightId(pub u8);

impl LightId {
    pub fn is_valid(self) -> bool {
        (1..=LIGHT_COUNT).contains(&self.0)
    }

    pub fn all() -> impl Iterator<Item = LightId> {
        (1..=LIGHT_COUNT).map(LightId)
    }
}

impl fmt::Display for LightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A committed toggle: which light, and the state it was switched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightCommand {
    pub light_id: LightId,
    pub new_on_state: bool,
}

impl LightCommand {
    pub fn new(light_id: LightId, new_on_state: bool) -> Self {
        Self {
            light_id,
            new_on_state,
        }
    }

    /// Button name understood by the RF bridge, e.g. `"3 ON"`.
    pub fn button_name(&self) -> String {
        let suffix = if self.new_on_state { "ON" } else { "OFF" };
        format!("{} {suffix}", self.light_id)
    }
}
