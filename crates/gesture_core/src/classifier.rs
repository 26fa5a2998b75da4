//! Per-frame finger classification.
//!
//! Every finger is judged by a single distance comparison in the image
//! plane, so the result depends only on the landmarks of the current frame.
//!
//! * **Thumb**: open iff the tip is farther from the palm anchor
//!   (pinky MCP by default) than the interphalangeal joint is.
//! * **Index / Middle / Ring / Pinky**: open iff the tip is farther from the
//!   wrist than the PIP joint is.
//!
//! The count ignores the thumb unless all four other fingers are open, in
//! which case an open thumb turns 4 into 5.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    error::ConfigError,
    landmarks::{
        HandLandmarks, INDEX_PIP, INDEX_TIP, LANDMARK_COUNT, MIDDLE_PIP, MIDDLE_TIP, PINKY_MCP,
        PINKY_PIP, PINKY_TIP, RING_PIP, RING_TIP, THUMB_IP, THUMB_TIP, WRIST,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];

    pub fn label(self) -> char {
        match self {
            Self::Thumb => 'T',
            Self::Index => 'I',
            Self::Middle => 'M',
            Self::Ring => 'R',
            Self::Pinky => 'P',
        }
    }

    /// (tip, pip) landmark indices; `None` for the thumb, which uses its own rule.
    fn tip_and_pip(self) -> Option<(usize, usize)> {
        match self {
            Self::Thumb => None,
            Self::Index => Some((INDEX_TIP, INDEX_PIP)),
            Self::Middle => Some((MIDDLE_TIP, MIDDLE_PIP)),
            Self::Ring => Some((RING_TIP, RING_PIP)),
            Self::Pinky => Some((PINKY_TIP, PINKY_PIP)),
        }
    }
}

/// Open/closed flags in [`Finger::ALL`] order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FingerVector(pub [bool; 5]);

impl FingerVector {
    pub fn is_open(&self, finger: Finger) -> bool {
        self.0[finger as usize]
    }

    pub fn non_thumb_open(&self) -> u8 {
        self.0[1..].iter().filter(|open| **open).count() as u8
    }
}

impl fmt::Display for FingerVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, finger) in Finger::ALL.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            let mark = if self.is_open(*finger) { 'O' } else { 'C' };
            write!(f, "{}:{mark}", finger.label())?;
        }
        Ok(())
    }
}

/// Gesture value of a single frame. `Fingers(0)` is a closed fist,
/// `Fingers(1..=5)` a command candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureCount {
    NoHand,
    Fingers(u8),
}

impl GestureCount {
    pub const FIST: GestureCount = GestureCount::Fingers(0);

    /// Smart-thumb rule: the thumb only upgrades a full four-finger count.
    pub fn from_fingers(fingers: &FingerVector) -> Self {
        let non_thumb = fingers.non_thumb_open();
        if non_thumb == 4 && fingers.is_open(Finger::Thumb) {
            Self::Fingers(5)
        } else {
            Self::Fingers(non_thumb)
        }
    }

    /// Inverse of [`GestureCount::as_i8`]; `None` outside `-1..=5`.
    pub fn from_raw(raw: i8) -> Option<Self> {
        match raw {
            -1 => Some(Self::NoHand),
            0..=5 => Some(Self::Fingers(raw as u8)),
            _ => None,
        }
    }

    pub fn as_i8(self) -> i8 {
        match self {
            Self::NoHand => -1,
            Self::Fingers(n) => n as i8,
        }
    }

    pub fn is_fist(self) -> bool {
        self == Self::FIST
    }

    /// The light this frame asks for, if it shows 1 to 5 fingers.
    pub fn command_value(self) -> Option<u8> {
        match self {
            Self::Fingers(n @ 1..=5) => Some(n),
            _ => None,
        }
    }
}

impl fmt::Display for GestureCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i8())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub fingers: FingerVector,
    pub count: GestureCount,
}

impl Classification {
    pub fn no_hand() -> Self {
        Self {
            fingers: FingerVector::default(),
            count: GestureCount::NoHand,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifierConfig {
    /// Palm anchor the thumb tip is measured against.
    pub thumb_reference: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            thumb_reference: PINKY_MCP,
        }
    }
}

impl ClassifierConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thumb_reference >= LANDMARK_COUNT {
            return Err(ConfigError::ThumbReferenceOutOfRange(self.thumb_reference));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct FingerClassifier {
    config: ClassifierConfig,
}

impl FingerClassifier {
    pub fn new(config: ClassifierConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn classify(&self, hand: Option<&HandLandmarks>) -> Classification {
        let Some(hand) = hand else {
            return Classification::no_hand();
        };
        let fingers = self.finger_vector(hand);
        Classification {
            fingers,
            count: GestureCount::from_fingers(&fingers),
        }
    }

    pub fn finger_vector(&self, hand: &HandLandmarks) -> FingerVector {
        let wrist = hand.point(WRIST);
        let anchor = hand.point(self.config.thumb_reference);

        let mut open = [false; 5];
        for finger in Finger::ALL {
            open[finger as usize] = match finger.tip_and_pip() {
                None => {
                    hand.point(THUMB_TIP).distance_2d(anchor)
                        > hand.point(THUMB_IP).distance_2d(anchor)
                }
                Some((tip, pip)) => {
                    hand.point(tip).distance_2d(wrist) > hand.point(pip).distance_2d(wrist)
                }
            };
        }
        FingerVector(open)
    }
}

/// Classify with the default thumb anchor.
pub fn classify(hand: Option<&HandLandmarks>) -> Classification {
    FingerClassifier::default().classify(hand)
}

#[cfg(test)]
#[path = "tests/classifier_tests.rs"]
mod tests;
