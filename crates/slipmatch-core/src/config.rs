use crate::error::SlipmatchError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Folder the virtual printer saves PDFs into.
    pub watch_dir: PathBuf,
    /// Scratch space for rendered pages; emptied for every job.
    pub work_dir: PathBuf,
    /// How long the first PDF waits for its partner, in seconds.
    pub pair_timeout_secs: u64,
    /// Wait before clearing the folder when more than two files show up.
    pub anomaly_grace_ms: u64,
    /// Wait before dispatching a pair, so the second file finishes copying.
    pub settle_delay_ms: u64,
    /// Resolution used for the first pass over every page.
    pub base_dpi: u32,
    /// Size of the worker pool OCR-ing sweep levels.
    pub sweep_workers: usize,
    pub sweep: DpiSweep,
    pub tools: ToolsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            watch_dir: PathBuf::from("virtual_printer_target"),
            work_dir: PathBuf::from("slipmatch_work"),
            pair_timeout_secs: 30,
            anomaly_grace_ms: 1000,
            settle_delay_ms: 0,
            base_dpi: 200,
            sweep_workers: 4,
            sweep: DpiSweep::default(),
            tools: ToolsConfig::default(),
        }
    }
}

/// Resolutions `start, start + step, ..., end` (inclusive).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DpiSweep {
    pub start: u32,
    pub end: u32,
    pub step: u32,
}

impl Default for DpiSweep {
    fn default() -> Self {
        Self {
            start: 150,
            end: 600,
            step: 50,
        }
    }
}

impl DpiSweep {
    pub fn levels(&self) -> Vec<u32> {
        if self.step == 0 {
            return vec![self.start];
        }
        (self.start..=self.end).step_by(self.step as usize).collect()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub pdftoppm: String,
    pub tesseract: String,
    pub ocr_language: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            pdftoppm: "pdftoppm".to_string(),
            tesseract: "tesseract".to_string(),
            ocr_language: "eng".to_string(),
        }
    }
}

impl Config {
    pub fn pair_timeout(&self) -> Duration {
        Duration::from_secs(self.pair_timeout_secs)
    }

    pub fn anomaly_grace(&self) -> Duration {
        Duration::from_millis(self.anomaly_grace_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Serialize as TOML, e.g. to print a starting config file.
    pub fn to_toml(&self) -> Result<String, SlipmatchError> {
        toml::to_string_pretty(self).map_err(|e| SlipmatchError::Config {
            path: PathBuf::from("<default>"),
            reason: e.to_string(),
        })
    }
}

/// Load a config from a TOML file.
pub fn load_config(path: &Path) -> Result<Config, SlipmatchError> {
    let content = std::fs::read_to_string(path).map_err(|e| SlipmatchError::Config {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_config(&content, path)
}

/// Parse a config from a TOML string.
pub fn parse_config(toml_str: &str, source: &Path) -> Result<Config, SlipmatchError> {
    let config: Config = toml::from_str(toml_str).map_err(|e| SlipmatchError::Config {
        path: source.to_path_buf(),
        reason: e.to_string(),
    })?;
    validate_config(&config).map_err(|reason| SlipmatchError::Config {
        path: source.to_path_buf(),
        reason,
    })?;
    Ok(config)
}

fn validate_config(config: &Config) -> Result<(), String> {
    if config.base_dpi == 0 {
        return Err("base_dpi must be greater than 0".into());
    }
    if config.sweep.step == 0 {
        return Err("sweep.step must be greater than 0".into());
    }
    if config.sweep.start == 0 || config.sweep.start > config.sweep.end {
        return Err(format!(
            "invalid sweep range {}..={} (start must be > 0 and <= end)",
            config.sweep.start, config.sweep.end
        ));
    }
    if config.sweep_workers == 0 {
        return Err("sweep_workers must be at least 1".into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sweep_levels() {
        assert_eq!(
            DpiSweep::default().levels(),
            vec![150, 200, 250, 300, 350, 400, 450, 500, 550, 600]
        );
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml = r#"
            watch_dir = "/srv/printer"
            pair_timeout_secs = 45

            [sweep]
            start = 200
            end = 300
            step = 100
        "#;
        let config = parse_config(toml, Path::new("test.toml")).unwrap();
        assert_eq!(config.watch_dir, PathBuf::from("/srv/printer"));
        assert_eq!(config.pair_timeout(), Duration::from_secs(45));
        assert_eq!(config.sweep.levels(), vec![200, 300]);
        assert_eq!(config.base_dpi, 200);
        assert_eq!(config.tools.tesseract, "tesseract");
    }

    #[test]
    fn test_zero_step_rejected() {
        let toml = "[sweep]\nstart = 150\nend = 600\nstep = 0\n";
        assert!(parse_config(toml, Path::new("bad.toml")).is_err());
    }

    #[test]
    fn test_inverted_range_rejected() {
        let toml = "[sweep]\nstart = 600\nend = 150\nstep = 50\n";
        assert!(parse_config(toml, Path::new("bad.toml")).is_err());
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(parse_config("sweep_workers = 0", Path::new("bad.toml")).is_err());
    }

    #[test]
    fn test_default_roundtrips_through_toml() {
        let text = Config::default().to_toml().unwrap();
        let config = parse_config(&text, Path::new("default.toml")).unwrap();
        assert_eq!(config.sweep, DpiSweep::default());
        assert_eq!(config.pair_timeout_secs, 30);
    }
}
