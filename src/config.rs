use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::music::{Scale, ShiftOrder};

/// Everything a caller can tune between frames. Loaded from TOML or built in code;
/// every field has a default so partial files are fine:
///
/// ```toml
/// sensitivity = 0.02
/// octave_shift_semitones = -12
/// scale = "minor-pentatonic"   # or a list of offsets, e.g. [0, 3, 5, 7, 10]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Shift applied to every detected note, in semitones.
    #[serde(default)]
    pub octave_shift_semitones: i32,
    /// Minimum frame loudness (root mean square) for pitch detection.
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f64,
    #[serde(default = "default_autotune")]
    pub autotune: bool,
    #[serde(default)]
    pub scale: Scale,
    #[serde(default)]
    pub shift_order: ShiftOrder,
    /// Estimates below this clarity are treated as silence.
    #[serde(default = "default_clarity_threshold")]
    pub clarity_threshold: f64,
    /// Consecutive frames a new note must be seen before it sounds.
    #[serde(default = "default_stability_frames")]
    pub stability_frames: u32,
    /// Minimum time between two note-ons.
    #[serde(default = "default_min_retrigger_seconds")]
    pub min_retrigger_seconds: f64,
    #[serde(default)]
    pub synth: SynthConfig,
}

/// Output levels and smoothing constants for live monitoring and preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthConfig {
    #[serde(default = "default_output_gain")]
    pub output_gain: f32,
    /// Time constant for retuning and raising the level on note-on.
    #[serde(default = "default_glide_seconds")]
    pub glide_seconds: f32,
    /// Time constant for lowering the level on note-off.
    #[serde(default = "default_release_seconds")]
    pub release_seconds: f32,
    /// Hold length requested for live instrument voices; they are stopped explicitly
    /// on note-off, so this only bounds a voice that is never released.
    #[serde(default = "default_live_hold_seconds")]
    pub live_hold_seconds: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            octave_shift_semitones: 0,
            sensitivity: default_sensitivity(),
            autotune: default_autotune(),
            scale: Scale::default(),
            shift_order: ShiftOrder::default(),
            clarity_threshold: default_clarity_threshold(),
            stability_frames: default_stability_frames(),
            min_retrigger_seconds: default_min_retrigger_seconds(),
            synth: SynthConfig::default(),
        }
    }
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            output_gain: default_output_gain(),
            glide_seconds: default_glide_seconds(),
            release_seconds: default_release_seconds(),
            live_hold_seconds: default_live_hold_seconds(),
        }
    }
}

fn default_sensitivity() -> f64 { 0.015 }
fn default_autotune() -> bool { true }
fn default_clarity_threshold() -> f64 { crate::detector::DEFAULT_CLARITY_THRESHOLD }
fn default_stability_frames() -> u32 { 2 }
fn default_min_retrigger_seconds() -> f64 { 0.05 }
fn default_output_gain() -> f32 { 0.3 }
fn default_glide_seconds() -> f32 { 0.05 }
fn default_release_seconds() -> f32 { 0.1 }
fn default_live_hold_seconds() -> f64 { 30.0 }

impl EngineConfig {
    pub fn with_octave_shift(mut self, octaves: i32) -> Self {
        self.octave_shift_semitones = octaves * 12;
        self
    }

    pub fn with_scale(mut self, scale: Scale) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_autotune(mut self, autotune: bool) -> Self {
        self.autotune = autotune;
        self
    }

    pub fn with_sensitivity(mut self, sensitivity: f64) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    /// The scale notes are snapped to, if autotune is on.
    pub fn active_scale(&self) -> Option<&Scale> {
        self.autotune.then_some(&self.scale)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sensitivity > 0.0) {
            return Err(ConfigError::NonPositiveSensitivity(self.sensitivity));
        }
        if !(0.0..=1.0).contains(&self.clarity_threshold) {
            return Err(ConfigError::ClarityOutOfRange(self.clarity_threshold));
        }
        if self.stability_frames == 0 {
            return Err(ConfigError::ZeroStabilityFrames);
        }
        let timings = [
            ("min_retrigger_seconds", self.min_retrigger_seconds),
            ("glide_seconds", f64::from(self.synth.glide_seconds)),
            ("release_seconds", f64::from(self.synth.release_seconds)),
            ("live_hold_seconds", self.synth.live_hold_seconds),
        ];
        if let Some(&(name, value)) = timings.iter().find(|(_, v)| !(*v >= 0.0) || !v.is_finite()) {
            return Err(ConfigError::InvalidTiming { name, value });
        }
        Ok(())
    }
}

/// Parse and validate an [EngineConfig] from TOML text.
pub fn parse_config(content: &str) -> Result<EngineConfig, ConfigError> {
    let config: EngineConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    log::info!("Loaded engine config from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.stability_frames, 2);
        assert_eq!(config.min_retrigger_seconds, 0.05);
        assert_eq!(config.active_scale(), Some(&Scale::chromatic()));
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config = parse_config(
            r#"
            sensitivity = 0.02
            octave_shift_semitones = -12
            scale = "minor-pentatonic"
            shift_order = "after-quantize"

            [synth]
            output_gain = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(config.sensitivity, 0.02);
        assert_eq!(config.octave_shift_semitones, -12);
        assert_eq!(config.scale.offsets(), &[0, 3, 5, 7, 10]);
        assert_eq!(config.shift_order, ShiftOrder::AfterQuantize);
        assert!(config.autotune);
        assert_eq!(config.synth.output_gain, 0.5);
        assert_eq!(config.synth.release_seconds, 0.1);
    }

    #[test]
    fn scale_as_offsets() {
        let config = parse_config("scale = [0, 4, 7]").unwrap();
        assert_eq!(config.scale, Scale::new(vec![0, 4, 7]).unwrap());
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            parse_config("sensitivity = 0.0"),
            Err(ConfigError::NonPositiveSensitivity(_))
        ));
        assert!(matches!(
            parse_config("stability_frames = 0"),
            Err(ConfigError::ZeroStabilityFrames)
        ));
        assert!(matches!(
            parse_config("min_retrigger_seconds = -1.0"),
            Err(ConfigError::InvalidTiming { name: "min_retrigger_seconds", .. })
        ));
        assert!(matches!(parse_config("scale = []"), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn round_trips_through_toml() {
        let config = EngineConfig::default().with_octave_shift(1).with_scale(Scale::major());
        let text = toml::to_string(&config).unwrap();
        assert_eq!(parse_config(&text).unwrap(), config);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "autotune = false").unwrap();
        let config = load_config(file.path()).unwrap();
        assert!(!config.autotune);
        assert_eq!(config.active_scale(), None);

        assert!(matches!(
            load_config(Path::new("/nonexistent/pitch.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
