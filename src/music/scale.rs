//! Scale definitions and the scale-snapping quantizer.
//!
//! A [Scale] is an ordered list of pitch classes (semitone offsets from C, each in
//! `0..=11`). [Scale::quantize] keeps the octave of its input and replaces the pitch
//! class with the nearest offset of the scale. Distances are measured within the
//! octave only, so pitch class 11 against `{0, 9}` snaps to 9, not to the next C.
//!
//! Ties are broken in declaration order: an offset only replaces the current best
//! when it is *strictly* closer. Against `{0, 2}` pitch class 1 therefore snaps to 0,
//! while the same scale declared as `{2, 0}` snaps it to 2.

use serde::{Deserialize, Serialize};

use crate::error::ScaleError;

const PRESETS: &[(&str, &[u8])] = &[
    ("chromatic", &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]),
    ("major", &[0, 2, 4, 5, 7, 9, 11]),
    ("minor", &[0, 2, 3, 5, 7, 8, 10]),
    ("harmonic-minor", &[0, 2, 3, 5, 7, 8, 11]),
    ("dorian", &[0, 2, 3, 5, 7, 9, 10]),
    ("major-pentatonic", &[0, 2, 4, 7, 9]),
    ("minor-pentatonic", &[0, 3, 5, 7, 10]),
    ("blues", &[0, 3, 5, 6, 7, 10]),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ScaleRepr", into = "ScaleRepr")]
pub struct Scale {
    name: Option<String>,
    offsets: Vec<u8>,
}

/// Configuration files name a preset or list offsets directly.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ScaleRepr {
    Named(String),
    Offsets(Vec<u8>),
}

impl TryFrom<ScaleRepr> for Scale {
    type Error = ScaleError;

    fn try_from(repr: ScaleRepr) -> Result<Self, Self::Error> {
        match repr {
            ScaleRepr::Named(name) => Scale::by_name(&name),
            ScaleRepr::Offsets(offsets) => Scale::new(offsets),
        }
    }
}

impl From<Scale> for ScaleRepr {
    fn from(scale: Scale) -> Self {
        match scale.name {
            Some(name) => ScaleRepr::Named(name),
            None => ScaleRepr::Offsets(scale.offsets),
        }
    }
}

impl Scale {
    pub fn new(offsets: Vec<u8>) -> Result<Self, ScaleError> {
        if offsets.is_empty() {
            return Err(ScaleError::Empty);
        }
        if let Some(&offset) = offsets.iter().find(|&&o| o > 11) {
            return Err(ScaleError::OffsetOutOfRange(offset));
        }
        Ok(Scale {
            name: None,
            offsets,
        })
    }

    /// Look up one of the built-in scales, e.g. `"major"` or `"minor-pentatonic"`.
    pub fn by_name(name: &str) -> Result<Self, ScaleError> {
        let wanted = name.trim().to_ascii_lowercase().replace([' ', '_'], "-");
        PRESETS
            .iter()
            .find(|(preset, _)| *preset == wanted)
            .map(|(preset, offsets)| Scale {
                name: Some((*preset).to_string()),
                offsets: offsets.to_vec(),
            })
            .ok_or_else(|| ScaleError::UnknownName(name.to_string()))
    }

    pub fn preset_names() -> impl Iterator<Item = &'static str> {
        PRESETS.iter().map(|(name, _)| *name)
    }

    pub fn chromatic() -> Self {
        Scale {
            name: Some("chromatic".to_string()),
            offsets: (0..12).collect(),
        }
    }

    pub fn major() -> Self {
        Scale {
            name: Some("major".to_string()),
            offsets: vec![0, 2, 4, 5, 7, 9, 11],
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn offsets(&self) -> &[u8] {
        &self.offsets
    }

    pub fn contains(&self, pitch_class: u8) -> bool {
        self.offsets.contains(&pitch_class)
    }

    /// Snap `midi` to the nearest pitch class of this scale within the same octave.
    pub fn quantize(&self, midi: i32) -> i32 {
        let pitch_class = midi.rem_euclid(12);

        let mut best = i32::from(self.offsets[0]);
        let mut best_distance = (pitch_class - best).abs();
        for &offset in &self.offsets[1..] {
            let distance = (pitch_class - i32::from(offset)).abs();
            if distance < best_distance {
                best = i32::from(offset);
                best_distance = distance;
            }
        }

        (midi - pitch_class).saturating_add(best)
    }
}

impl Default for Scale {
    fn default() -> Self {
        Scale::chromatic()
    }
}
