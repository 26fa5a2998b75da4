//! Hand-pose to light-command core.
//!
//! [`classifier`] turns one frame's hand landmarks into a [`FingerVector`] and
//! a [`GestureCount`]; [`automaton`] arbitrates across frames and decides when
//! a count is trusted enough to toggle a light. Nothing in this crate performs
//! I/O: frames come in as values and committed toggles go out as
//! [`shared::domain::LightCommand`]s.

pub mod automaton;
pub mod classifier;
pub mod error;
pub mod landmarks;
pub mod pipeline;
pub mod registry;

pub use automaton::{AutomatonConfig, AutomatonState, GestureAutomaton};
pub use classifier::{
    classify, Classification, ClassifierConfig, Finger, FingerClassifier, FingerVector,
    GestureCount,
};
pub use error::{ConfigError, LandmarkError};
pub use landmarks::{FrameMessage, HandLandmarks, Landmark};
pub use pipeline::{FrameReport, GesturePipeline};
pub use registry::LightRegistry;
