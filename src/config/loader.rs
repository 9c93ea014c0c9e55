// src/config/loader.rs
//! Configuration loader with validation and hot reload

use crate::config::{constants::paths, schema_validator::{FieldViolation, SchemaValidator}, SystemConfig};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Configuration loader with hot reload capabilities
pub struct ConfigLoader {
    config_paths: Vec<PathBuf>,
    schema_validator: SchemaValidator,
    current_config: Arc<RwLock<SystemConfig>>,
    change_notifier: Option<mpsc::Sender<SystemConfig>>,
    _file_watcher: Option<notify::RecommendedWatcher>,
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Configuration validation errors: {}", format_violations(.0))]
    ValidationError(Vec<FieldViolation>),

    #[error("Configuration inconsistent: {}", .0.join("; "))]
    Inconsistent(Vec<String>),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("File watcher error: {0}")]
    WatcherError(String),
}

fn format_violations(errors: &[FieldViolation]) -> String {
    errors
        .iter()
        .map(|e| format!("\n  {}", e))
        .collect::<String>()
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl ConfigLoader {
    /// Create new configuration loader
    pub fn new() -> Self {
        Self::with_paths(Self::discover_config_paths())
    }

    /// Create loader with custom paths
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            config_paths: paths,
            schema_validator: SchemaValidator::new(),
            current_config: Arc::new(RwLock::new(SystemConfig::default())),
            change_notifier: None,
            _file_watcher: None,
        }
    }

    pub fn config_paths(&self) -> &[PathBuf] {
        &self.config_paths
    }

    /// Load system configuration with validation
    pub fn load_system_config(&mut self) -> Result<SystemConfig, ConfigError> {
        let config = self.load_and_merge_configs()?;
        *self.current_config.write() = config.clone();
        Ok(config)
    }

    /// Get current configuration
    pub fn get_current_config(&self) -> SystemConfig {
        self.current_config.read().clone()
    }

    /// Setup hot reload with change notifications
    pub fn enable_hot_reload(
        &mut self,
        callback: impl Fn(SystemConfig) + Send + 'static,
    ) -> Result<(), ConfigError> {
        let (tx, rx) = mpsc::channel();
        self.change_notifier = Some(tx.clone());

        let config_ref = self.current_config.clone();
        thread::spawn(move || {
            while let Ok(new_config) = rx.recv() {
                *config_ref.write() = new_config.clone();
                callback(new_config);
            }
        });

        self.setup_file_watcher(tx)?;
        Ok(())
    }

    /// Reload configuration manually
    pub fn reload(&mut self) -> Result<SystemConfig, ConfigError> {
        let config = self.load_and_merge_configs()?;
        *self.current_config.write() = config.clone();

        if let Some(ref notifier) = self.change_notifier {
            let _ = notifier.send(config.clone());
        }

        Ok(config)
    }

    /// Validate configuration without loading
    pub fn validate_config_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let toml_value: toml::Value = toml::from_str(&content)?;

        self.schema_validator
            .validate_config(&toml_value)
            .map_err(ConfigError::ValidationError)?;

        self.schema_validator
            .validate_dependencies(&toml_value)
            .map_err(ConfigError::ValidationError)?;

        Ok(())
    }

    /// Export current configuration to file
    pub fn export_config<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let config = self.get_current_config();
        let toml_content =
            toml::to_string_pretty(&config).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, toml_content)?;
        Ok(())
    }

    fn load_and_merge_configs(&self) -> Result<SystemConfig, ConfigError> {
        let mut merged_config = toml::Value::try_from(SystemConfig::default())
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        for config_path in &self.config_paths {
            match self.load_config_file(config_path) {
                Ok(file_config) => {
                    info!("Loaded configuration from {}", config_path.display());
                    merge_toml_values(&mut merged_config, file_config);
                }
                Err(ConfigError::FileNotFound(_)) => continue, // optional file
                Err(e) => return Err(e),
            }
        }

        apply_environment_overrides(&mut merged_config, std::env::vars());

        self.schema_validator
            .validate_config(&merged_config)
            .map_err(ConfigError::ValidationError)?;

        self.schema_validator
            .validate_dependencies(&merged_config)
            .map_err(ConfigError::ValidationError)?;

        let config: SystemConfig = merged_config.try_into().map_err(|e: toml::de::Error| {
            ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
        })?;

        config
            .validate_consistency()
            .map_err(ConfigError::Inconsistent)?;

        Ok(config)
    }

    fn load_config_file<P: AsRef<Path>>(&self, path: P) -> Result<toml::Value, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        let config: toml::Value = toml::from_str(&content)?;

        Ok(config)
    }

    fn setup_file_watcher(&mut self, tx: mpsc::Sender<SystemConfig>) -> Result<(), ConfigError> {
        use notify::{DebouncedEvent, RecursiveMode, Watcher};

        let (watch_tx, watch_rx) = mpsc::channel();
        let mut watcher = notify::watcher(watch_tx, Duration::from_millis(500))
            .map_err(|e| ConfigError::WatcherError(e.to_string()))?;

        let mut watched_paths = std::collections::HashSet::new();
        for path in &self.config_paths {
            if let Some(parent) = path.parent() {
                let parent = if parent.as_os_str().is_empty() { Path::new(".") } else { parent };
                if parent.exists() && watched_paths.insert(parent.to_path_buf()) {
                    if let Err(e) = watcher.watch(parent, RecursiveMode::NonRecursive) {
                        warn!("Cannot watch {}: {}", parent.display(), e);
                    }
                }
            }
        }

        let config_paths = self.config_paths.clone();
        let schema_validator = self.schema_validator.clone();

        thread::spawn(move || {
            while let Ok(event) = watch_rx.recv() {
                match event {
                    DebouncedEvent::Write(path) | DebouncedEvent::Create(path) => {
                        if is_watched(&config_paths, &path) {
                            let mut loader = ConfigLoader::with_paths(config_paths.clone());
                            loader.schema_validator = schema_validator.clone();

                            match loader.load_and_merge_configs() {
                                Ok(new_config) => {
                                    info!("Configuration reloaded after change to {}", path.display());
                                    let _ = tx.send(new_config);
                                }
                                Err(e) => {
                                    warn!("Failed to reload config: {}", e);
                                }
                            }
                        }
                    }
                    _ => {}
                }
            }
        });

        self._file_watcher = Some(watcher);
        Ok(())
    }

    fn discover_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // System-wide configuration
        paths.push(PathBuf::from(paths::SYSTEM_CONFIG_PATH));

        // User configuration
        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(paths::USER_CONFIG_DIR).join("config.toml"));
        }

        // Local configurations (in order of precedence)
        paths.push(PathBuf::from(paths::DEFAULT_CONFIG_FILE));
        paths.push(PathBuf::from(paths::LOCAL_CONFIG_FILE));
        paths.push(PathBuf::from("config/local.toml"));

        paths
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn is_watched(config_paths: &[PathBuf], changed: &Path) -> bool {
    config_paths.iter().any(|p| {
        p == changed
            || match (p.canonicalize(), changed.canonicalize()) {
                (Ok(a), Ok(b)) => a == b,
                _ => false,
            }
    })
}

fn merge_toml_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                if let Some(base_value) = base_table.get_mut(&key) {
                    merge_toml_values(base_value, value);
                } else {
                    base_table.insert(key, value);
                }
            }
        }
        (base_value, overlay_value) => {
            *base_value = overlay_value;
        }
    }
}

/// Apply `MOTION_<SECTION>_<KEY>` variables onto the merged table.
///
/// Key segments are matched greedily against existing table keys, so
/// `MOTION_TESTS_UP_AND_GO_DETECTOR_MOTION_THRESHOLD_M` lands on
/// `tests.up_and_go.detector.motion_threshold_m`.
fn apply_environment_overrides(
    config: &mut toml::Value,
    vars: impl IntoIterator<Item = (String, String)>,
) {
    for (key, value) in vars {
        let Some(stripped) = key.strip_prefix(paths::ENV_PREFIX) else {
            continue;
        };
        let segments: Vec<String> = stripped.to_lowercase().split('_').map(str::to_string).collect();

        match resolve_env_path(config, &segments) {
            Some(path) => {
                info!("Environment override {} -> {}", key, path.join("."));
                set_nested_value(config, &path, parse_env_value(&value));
            }
            None => warn!("Ignoring environment override {}: no matching setting", key),
        }
    }
}

fn resolve_env_path(config: &toml::Value, segments: &[String]) -> Option<Vec<String>> {
    if segments.is_empty() {
        return None;
    }
    let table = config.as_table()?;

    for end in (1..=segments.len()).rev() {
        let candidate = segments[..end].join("_");
        let Some(child) = table.get(&candidate) else {
            continue;
        };

        if end == segments.len() {
            return Some(vec![candidate]);
        }
        if child.is_table() {
            if let Some(mut rest) = resolve_env_path(child, &segments[end..]) {
                rest.insert(0, candidate);
                return Some(rest);
            }
        }
    }
    None
}

fn parse_env_value(value: &str) -> toml::Value {
    if let Ok(int_val) = value.parse::<i64>() {
        toml::Value::Integer(int_val)
    } else if let Ok(float_val) = value.parse::<f64>() {
        toml::Value::Float(float_val)
    } else if let Ok(bool_val) = value.parse::<bool>() {
        toml::Value::Boolean(bool_val)
    } else {
        toml::Value::String(value.to_string())
    }
}

fn set_nested_value(config: &mut toml::Value, path: &[String], value: toml::Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };

    let mut current = config;
    for part in parents {
        let toml::Value::Table(table) = current else {
            return;
        };
        current = table
            .entry(part.clone())
            .or_insert_with(|| toml::Value::Table(toml::value::Table::new()));
    }

    if let toml::Value::Table(table) = current {
        table.insert(last.clone(), value);
    }
}

// Cross-platform directory discovery
mod dirs {
    use std::path::PathBuf;

    pub fn home_dir() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            std::env::var_os("USERPROFILE").map(PathBuf::from)
        }
        #[cfg(not(target_os = "windows"))]
        {
            std::env::var_os("HOME").map(PathBuf::from)
        }
    }
}
