//! Run configuration read from `key = value` files

use log::warn;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{DockError, Result};

/// Settings shared by every command
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Donor-acceptor distance cutoff in Angstroms
    pub hbond_distance: f64,

    /// Allowed deviation from a linear D-H...A angle, in degrees
    pub hbond_angle: f64,

    /// Solvent probe radius in Angstroms
    pub probe_radius: f64,

    /// Sample points per atom sphere for SASA
    pub sasa_points: usize,

    /// Poses farther than this from every pocket center stay unassigned
    pub max_pocket_distance: Option<f64>,

    /// PyMOL executable
    pub pymol: String,

    /// Directory searched for structure codes
    pub structure_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hbond_distance: 3.2,
            hbond_angle: 25.0,
            probe_radius: 1.4,
            sasa_points: 100,
            max_pocket_distance: None,
            pymol: "pymol".to_string(),
            structure_dir: None,
        }
    }
}

impl Config {
    /// Read a configuration file on top of the defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                DockError::NotFound(format!("config file {}", path.display()))
            }
            _ => DockError::Io(e),
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Parse configuration text; `origin` names the source in errors
    pub fn parse(content: &str, origin: &str) -> Result<Self> {
        let mut config = Config::default();

        for (number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = line.splitn(2, '=').collect();
            if parts.len() != 2 {
                return Err(DockError::parse(
                    origin,
                    format!("line {}: expected key = value", number + 1),
                ));
            }

            let key = parts[0].trim();
            let value = parts[1].trim();
            let bad_value = |expected: &str| {
                DockError::parse(
                    origin,
                    format!("line {}: {} must be {}, got '{}'", number + 1, key, expected, value),
                )
            };

            match key {
                "hbond_distance" => {
                    config.hbond_distance = value.parse().map_err(|_| bad_value("a number"))?
                }
                "hbond_angle" => {
                    config.hbond_angle = value.parse().map_err(|_| bad_value("a number"))?
                }
                "probe_radius" => {
                    config.probe_radius = value.parse().map_err(|_| bad_value("a number"))?
                }
                "sasa_points" => {
                    config.sasa_points = value
                        .parse()
                        .ok()
                        .filter(|&n: &usize| n > 0)
                        .ok_or_else(|| bad_value("a positive integer"))?
                }
                "max_pocket_distance" => {
                    config.max_pocket_distance =
                        Some(value.parse().map_err(|_| bad_value("a number"))?)
                }
                "pymol" => config.pymol = value.to_string(),
                "structure_dir" => config.structure_dir = Some(PathBuf::from(value)),
                _ => warn!("{}: ignoring unknown configuration key '{}'", origin, key),
            }
        }

        Ok(config)
    }

    /// Defaults, or the given file when present
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Apply command-line hydrogen-bond cutoffs
    pub fn with_hbond_cutoffs(mut self, distance: Option<f64>, angle: Option<f64>) -> Self {
        if let Some(distance) = distance {
            self.hbond_distance = distance;
        }
        if let Some(angle) = angle {
            self.hbond_angle = angle;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.hbond_distance, 3.2);
        assert_eq!(config.hbond_angle, 25.0);
        assert_eq!(config.sasa_points, 100);
        assert!(config.max_pocket_distance.is_none());
    }

    #[test]
    fn test_parse_overrides_and_comments() {
        let text = "# cutoffs\nhbond_distance = 3.5\n\nmax_pocket_distance=12\npymol = /opt/pymol/bin/pymol\n";
        let config = Config::parse(text, "test.cfg").unwrap();
        assert_eq!(config.hbond_distance, 3.5);
        assert_eq!(config.hbond_angle, 25.0);
        assert_eq!(config.max_pocket_distance, Some(12.0));
        assert_eq!(config.pymol, "/opt/pymol/bin/pymol");
    }

    #[test]
    fn test_unknown_key_is_ignored() {
        let config = Config::parse("colour = blue\n", "test.cfg").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_bad_value_is_parse_error() {
        let err = Config::parse("hbond_angle = wide\n", "test.cfg").unwrap_err();
        assert!(matches!(err, DockError::Parse { .. }));
        assert!(err.to_string().contains("line 1"));

        assert!(Config::parse("sasa_points = 0\n", "test.cfg").is_err());
        assert!(Config::parse("just a line\n", "test.cfg").is_err());
    }

    #[test]
    fn test_from_file_and_cli_overrides() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "hbond_distance = 3.0").unwrap();
        writeln!(file, "structure_dir = tests/test_data").unwrap();

        let config = Config::from_file(file.path())
            .unwrap()
            .with_hbond_cutoffs(None, Some(30.0));
        assert_eq!(config.hbond_distance, 3.0);
        assert_eq!(config.hbond_angle, 30.0);
        assert_eq!(config.structure_dir, Some(PathBuf::from("tests/test_data")));

        assert!(matches!(
            Config::from_file("/nonexistent/dock.cfg"),
            Err(DockError::NotFound(_))
        ));
    }
}
