//! TOML-based application configuration.
//!
//! Stores:
//! - Full and reduced time budgets per task
//! - Feedback pauses between items
//! - CAPTCHA verification endpoint
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::penalty::PenaltyRule;
use crate::task::{FeedbackDelays, TaskKind};

/// Budgets for one task, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTiming {
    pub full_secs: u32,
    pub reduced_secs: u32,
}

impl From<PenaltyRule> for TaskTiming {
    fn from(rule: PenaltyRule) -> Self {
        Self {
            full_secs: rule.full_secs,
            reduced_secs: rule.reduced_secs,
        }
    }
}

/// Task table as written on disk; missing fields fall back to the task's rule.
#[derive(Deserialize)]
struct PartialTiming {
    #[serde(default)]
    full_secs: Option<u32>,
    #[serde(default)]
    reduced_secs: Option<u32>,
}

impl PartialTiming {
    fn or_rule(self, rule: PenaltyRule) -> TaskTiming {
        TaskTiming {
            full_secs: self.full_secs.unwrap_or(rule.full_secs),
            reduced_secs: self.reduced_secs.unwrap_or(rule.reduced_secs),
        }
    }
}

fn math_timing<'de, D: Deserializer<'de>>(d: D) -> Result<TaskTiming, D::Error> {
    PartialTiming::deserialize(d).map(|p| p.or_rule(PenaltyRule::MATH))
}
fn stroop_timing<'de, D: Deserializer<'de>>(d: D) -> Result<TaskTiming, D::Error> {
    PartialTiming::deserialize(d).map(|p| p.or_rule(PenaltyRule::STROOP))
}
fn captcha_timing<'de, D: Deserializer<'de>>(d: D) -> Result<TaskTiming, D::Error> {
    PartialTiming::deserialize(d).map(|p| p.or_rule(PenaltyRule::CAPTCHA))
}

impl From<TaskTiming> for PenaltyRule {
    fn from(timing: TaskTiming) -> Self {
        PenaltyRule::new(timing.full_secs, timing.reduced_secs)
    }
}

/// Pauses after an item resolves, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackConfig {
    #[serde(default = "default_correct_delay")]
    pub correct_delay_ms: u64,
    #[serde(default = "default_timeout_delay")]
    pub timeout_delay_ms: u64,
}

/// Remote CAPTCHA verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyConfig {
    /// Site-verify endpoint. Empty means verify locally.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub secret: String,
    /// Shortest token the local check accepts.
    #[serde(default = "default_min_token_len")]
    pub min_token_len: usize,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_math", deserialize_with = "math_timing")]
    pub math: TaskTiming,
    #[serde(default = "default_stroop", deserialize_with = "stroop_timing")]
    pub stroop: TaskTiming,
    #[serde(default = "default_captcha", deserialize_with = "captcha_timing")]
    pub captcha: TaskTiming,
    #[serde(default)]
    pub feedback: FeedbackConfig,
    #[serde(default)]
    pub verify: VerifyConfig,
}

// Default functions
fn default_math() -> TaskTiming {
    PenaltyRule::MATH.into()
}
fn default_stroop() -> TaskTiming {
    PenaltyRule::STROOP.into()
}
fn default_captcha() -> TaskTiming {
    PenaltyRule::CAPTCHA.into()
}
fn default_correct_delay() -> u64 {
    1000
}
fn default_timeout_delay() -> u64 {
    1500
}
fn default_min_token_len() -> usize {
    100
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            correct_delay_ms: default_correct_delay(),
            timeout_delay_ms: default_timeout_delay(),
        }
    }
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            secret: String::new(),
            min_token_len: default_min_token_len(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            math: default_math(),
            stroop: default_stroop(),
            captcha: default_captcha(),
            feedback: FeedbackConfig::default(),
            verify: VerifyConfig::default(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => value
                        .parse::<u64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|_| invalid(format!("cannot parse '{value}' as a whole number")))?,
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(invalid("set individual fields instead".into()));
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from the data directory, writing the default file if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing the default there if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or fails validation.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Every leaf key with its current value, sorted by key.
    pub fn entries(&self) -> Vec<(String, String)> {
        fn walk(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
            match value {
                serde_json::Value::Object(map) => {
                    for (k, v) in map {
                        let key = if prefix.is_empty() {
                            k.clone()
                        } else {
                            format!("{prefix}.{k}")
                        };
                        walk(&key, v, out);
                    }
                }
                serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
                other => out.push((prefix.to_string(), other.to_string())),
            }
        }

        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            walk("", &json, &mut out);
        }
        out
    }

    /// Update a value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the result fails validation. `self` is left untouched on error.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a value by key and save. Returns error if key is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Budgets must be positive and the reduced one no longer than the full.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the offending task.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for kind in TaskKind::ALL {
            let timing = self.timing(kind);
            if timing.full_secs == 0 || timing.reduced_secs == 0 {
                return Err(ConfigError::InvalidValue {
                    key: kind.to_string(),
                    message: "budgets must be at least one second".into(),
                });
            }
            if timing.reduced_secs > timing.full_secs {
                return Err(ConfigError::InvalidValue {
                    key: format!("{kind}.reduced_secs"),
                    message: format!(
                        "reduced budget {}s exceeds full budget {}s",
                        timing.reduced_secs, timing.full_secs
                    ),
                });
            }
        }
        Ok(())
    }

    pub fn timing(&self, kind: TaskKind) -> TaskTiming {
        match kind {
            TaskKind::Math => self.math,
            TaskKind::Stroop => self.stroop,
            TaskKind::Captcha => self.captcha,
        }
    }

    pub fn rule(&self, kind: TaskKind) -> PenaltyRule {
        self.timing(kind).into()
    }

    pub fn delays(&self) -> FeedbackDelays {
        FeedbackDelays {
            correct_ms: self.feedback.correct_delay_ms,
            timeout_ms: self.feedback.timeout_delay_ms,
        }
    }
}
