//! Simple TOML-subset config loader for PolishSim.
//! Supports [sections] with key = value pairs (strings, floats, ints).

use std::collections::HashMap;
use std::path::Path;

use polishsim_confetti::ConfettiParams;
use polishsim_wear::WearParams;

use crate::SessionParams;

/// Parsed configuration values, keyed by "section.key".
pub struct ConfigFile {
    values: HashMap<String, String>,
}

impl ConfigFile {
    /// Load from a TOML file. Missing file means all defaults — a config
    /// file is never required.
    pub fn load(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(_) => {
                log::warn!("no config file at {:?}, using defaults", path);
                return Self {
                    values: HashMap::new(),
                };
            }
        };
        log::info!("loaded config from {:?}", path);
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Self {
        let mut values = HashMap::new();
        let mut section = String::new();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if line.starts_with('[') && line.ends_with(']') {
                section = line[1..line.len() - 1].trim().to_string();
                continue;
            }
            if let Some(eq_pos) = line.find('=') {
                let key = line[..eq_pos].trim();
                let val = line[eq_pos + 1..].trim();
                // Strip inline comments and quotes
                let val = match val.find('#') {
                    Some(hash) => val[..hash].trim(),
                    None => val,
                };
                let val = val.trim_matches('"');
                let full_key = if section.is_empty() {
                    key.to_string()
                } else {
                    format!("{}.{}", section, key)
                };
                values.insert(full_key, val.to_string());
            }
        }

        Self { values }
    }

    pub fn get_f64(&self, key: &str, default: f64) -> f64 {
        self.values
            .get(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    pub fn get_u32(&self, key: &str, default: u32) -> u32 {
        self.values
            .get(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    pub fn get_u8(&self, key: &str, default: u8) -> u8 {
        self.values
            .get(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    pub fn get_usize(&self, key: &str, default: usize) -> usize {
        self.values
            .get(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }
}

/// All configurable parameters for one polishing session.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub wear: WearParams,
    pub confetti: ConfettiParams,
    pub session: SessionParams,
}

impl SessionConfig {
    pub fn from_file(path: &Path) -> Self {
        Self::from_config(&ConfigFile::load(path))
    }

    pub fn from_config(cfg: &ConfigFile) -> Self {
        let wear_defaults = WearParams::default();
        let confetti_defaults = ConfettiParams::default();
        let session_defaults = SessionParams::default();

        let wear = WearParams {
            width: cfg.get_u32("wear.width", wear_defaults.width),
            height: cfg.get_u32("wear.height", wear_defaults.height),
            base_value: cfg.get_u8("wear.base_value", wear_defaults.base_value),
            spot_count: cfg.get_u32("wear.spot_count", wear_defaults.spot_count),
            spot_radius_range: (
                cfg.get_f64("wear.spot_radius_min", wear_defaults.spot_radius_range.0),
                cfg.get_f64("wear.spot_radius_max", wear_defaults.spot_radius_range.1),
            ),
            spot_alpha: cfg.get_f64("wear.spot_alpha", wear_defaults.spot_alpha),
            paint_radius: cfg.get_f64("wear.paint_radius", wear_defaults.paint_radius),
            paint_target: cfg.get_u8("wear.paint_target", wear_defaults.paint_target),
            paint_alpha: cfg.get_f64("wear.paint_alpha", wear_defaults.paint_alpha),
            aniso: (
                cfg.get_f64("wear.aniso_u", wear_defaults.aniso.0),
                cfg.get_f64("wear.aniso_v", wear_defaults.aniso.1),
            ),
            polish_threshold: cfg.get_u8("wear.polish_threshold", wear_defaults.polish_threshold),
        };

        let confetti = ConfettiParams {
            count: cfg.get_usize("confetti.count", confetti_defaults.count),
            ground_y: cfg.get_f64("confetti.ground_y", confetti_defaults.ground_y),
        };

        let session = SessionParams {
            completion_threshold: cfg.get_f64(
                "session.completion_threshold",
                session_defaults.completion_threshold,
            ),
            measure_probability: cfg.get_f64(
                "session.measure_probability",
                session_defaults.measure_probability,
            ),
        };

        Self {
            wear,
            confetti,
            session,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_fall_back_to_defaults() {
        let cfg = ConfigFile::parse("");
        let sc = SessionConfig::from_config(&cfg);
        assert_eq!(sc.wear.width, 1024);
        assert_eq!(sc.confetti.count, 200);
        assert!((sc.session.completion_threshold - 0.85).abs() < 1e-12);
    }

    #[test]
    fn test_sections_and_inline_comments() {
        let text = r#"
# polishing setup
[wear]
width = 256
height = 256       # square map
paint_radius = 30.5
polish_threshold = 64

[confetti]
count = 50
ground_y = -3.0

[session]
completion_threshold = 0.9
"#;
        let sc = SessionConfig::from_config(&ConfigFile::parse(text));
        assert_eq!(sc.wear.width, 256);
        assert!((sc.wear.paint_radius - 30.5).abs() < 1e-12);
        assert_eq!(sc.wear.polish_threshold, 64);
        assert_eq!(sc.confetti.count, 50);
        assert!((sc.confetti.ground_y + 3.0).abs() < 1e-12);
        assert!((sc.session.completion_threshold - 0.9).abs() < 1e-12);
        // Unset keys keep defaults
        assert!((sc.session.measure_probability - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_malformed_values_keep_defaults() {
        let text = "[wear]\nwidth = lots\n[confetti]\ncount = -3\n";
        let sc = SessionConfig::from_config(&ConfigFile::parse(text));
        assert_eq!(sc.wear.width, 1024);
        assert_eq!(sc.confetti.count, 200);
    }
}
