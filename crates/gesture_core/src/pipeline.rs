use std::time::Instant;

use serde::Serialize;
use shared::domain::LightCommand;

use crate::{
    automaton::{AutomatonConfig, AutomatonState, GestureAutomaton},
    classifier::{ClassifierConfig, FingerClassifier, FingerVector, GestureCount},
    error::ConfigError,
    landmarks::HandLandmarks,
};

/// Everything an observer may want to show about one processed frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameReport {
    pub fingers: FingerVector,
    #[serde(serialize_with = "serialize_count")]
    pub count: GestureCount,
    pub state: AutomatonState,
    pub emitted: Option<LightCommand>,
}

fn serialize_count<S: serde::Serializer>(count: &GestureCount, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_i8(count.as_i8())
}

/// Classifier and automaton wired together for the processing loop.
#[derive(Debug, Clone, Default)]
pub struct GesturePipeline {
    classifier: FingerClassifier,
    automaton: GestureAutomaton,
}

impl GesturePipeline {
    pub fn new(
        classifier: ClassifierConfig,
        automaton: AutomatonConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            classifier: FingerClassifier::new(classifier)?,
            automaton: GestureAutomaton::new(automaton)?,
        })
    }

    pub fn automaton(&self) -> &GestureAutomaton {
        &self.automaton
    }

    pub fn process(&mut self, hand: Option<&HandLandmarks>, now: Instant) -> FrameReport {
        let classification = self.classifier.classify(hand);
        let emitted = self.automaton.step(classification.count, now);
        FrameReport {
            fingers: classification.fingers,
            count: classification.count,
            state: self.automaton.state(),
            emitted,
        }
    }
}
