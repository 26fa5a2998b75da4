use shared::domain::{LightId, LIGHT_COUNT};

/// Last commanded ON/OFF state of every light, all OFF at startup.
///
/// This is the controller's belief, not the device's: a toggle stays
/// committed even if delivering it later fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LightRegistry {
    states: [bool; LIGHT_COUNT as usize],
}

impl LightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_on(&self, light: LightId) -> Option<bool> {
        light.is_valid().then(|| self.states[Self::slot(light)])
    }

    /// Flip `light` and return its new state. Ids outside 1..=5 are ignored.
    pub fn toggle(&mut self, light: LightId) -> Option<bool> {
        if !light.is_valid() {
            return None;
        }
        let slot = &mut self.states[Self::slot(light)];
        *slot = !*slot;
        Some(*slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = (LightId, bool)> + '_ {
        LightId::all().zip(self.states.iter().copied())
    }

    fn slot(light: LightId) -> usize {
        usize::from(light.0 - 1)
    }
}
