use crate::domain::models::FeedbackKind;
use crate::domain::time_math::{Point, DEFAULT_SNAP_GRID_MINUTES};
use crate::infrastructure::error::InfraError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const ENGINE_JSON: &str = "engine.json";
const SCHEMA_VERSION: u64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SavePolicy {
    EveryMutation,
    OnCommit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GestureSettings {
    pub chart_center: Point,
    pub chart_radius: f64,
    pub exit_threshold: f64,
    pub enter_threshold: f64,
    pub trash_anchor: Point,
    pub trash_radius: f64,
    pub snap_grid_minutes: u32,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            chart_center: Point::new(180.0, 180.0),
            chart_radius: 150.0,
            exit_threshold: 40.0,
            enter_threshold: 20.0,
            trash_anchor: Point::new(180.0, 420.0),
            trash_radius: 40.0,
            snap_grid_minutes: DEFAULT_SNAP_GRID_MINUTES,
        }
    }
}

impl GestureSettings {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.chart_radius > 0.0) {
            return Err("chartRadius must be > 0".to_string());
        }
        if !(self.trash_radius > 0.0) {
            return Err("trashRadius must be > 0".to_string());
        }
        if self.enter_threshold < 0.0 || self.enter_threshold >= self.exit_threshold {
            return Err("enterThreshold must be >= 0 and < exitThreshold".to_string());
        }
        if !(1..=60).contains(&self.snap_grid_minutes) {
            return Err("snapGridMinutes must be between 1 and 60".to_string());
        }
        Ok(())
    }

    pub fn exit_radius(&self) -> f64 {
        self.chart_radius + self.exit_threshold
    }

    pub fn enter_radius(&self) -> f64 {
        self.chart_radius + self.enter_threshold
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackDisplayMs {
    pub too_short: u64,
    pub collision: u64,
    pub success: u64,
    pub resizing: u64,
}

impl Default for FeedbackDisplayMs {
    fn default() -> Self {
        Self {
            too_short: 1500,
            collision: 1500,
            success: 1000,
            resizing: 300,
        }
    }
}

impl FeedbackDisplayMs {
    pub fn for_kind(&self, kind: FeedbackKind) -> u64 {
        match kind {
            FeedbackKind::TooShort => self.too_short,
            FeedbackKind::Collision => self.collision,
            FeedbackKind::Success => self.success,
            FeedbackKind::Resizing => self.resizing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    #[serde(flatten)]
    pub gesture: GestureSettings,
    pub new_block_minutes: u32,
    pub save_policy: SavePolicy,
    #[serde(default)]
    pub feedback_display_ms: FeedbackDisplayMs,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gesture: GestureSettings::default(),
            new_block_minutes: 20,
            save_policy: SavePolicy::EveryMutation,
            feedback_display_ms: FeedbackDisplayMs::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.gesture.validate()?;
        if self.new_block_minutes < 15 {
            return Err("newBlockMinutes must be >= 15".to_string());
        }
        Ok(())
    }
}

pub fn ensure_default_configs(config_dir: &Path) -> Result<(), InfraError> {
    let path = config_dir.join(ENGINE_JSON);
    if !path.exists() {
        write_engine_config(config_dir, &EngineConfig::default())?;
    }
    Ok(())
}

pub fn write_engine_config(config_dir: &Path, config: &EngineConfig) -> Result<(), InfraError> {
    let mut value = serde_json::to_value(config)?;
    let object = value.as_object_mut().ok_or_else(|| {
        InfraError::InvalidConfig("engine config must serialize to an object".to_string())
    })?;
    object.insert("schema".to_string(), serde_json::json!(SCHEMA_VERSION));
    let formatted = serde_json::to_string_pretty(&value)?;
    fs::write(config_dir.join(ENGINE_JSON), format!("{formatted}\n"))?;
    Ok(())
}

fn read_config(path: &Path) -> Result<serde_json::Value, InfraError> {
    let raw = fs::read_to_string(path)?;
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    let schema = parsed
        .get("schema")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| InfraError::InvalidConfig(format!("missing schema in {}", path.display())))?;
    if schema != SCHEMA_VERSION {
        return Err(InfraError::InvalidConfig(format!(
            "unsupported schema {} in {}",
            schema,
            path.display()
        )));
    }
    Ok(parsed)
}

pub fn load_engine_config(config_dir: &Path) -> Result<EngineConfig, InfraError> {
    let path = config_dir.join(ENGINE_JSON);
    let config: EngineConfig = serde_json::from_value(read_config(&path)?)?;
    config
        .validate()
        .map_err(|message| InfraError::InvalidConfig(format!("{message} in {}", path.display())))?;
    Ok(config)
}
