//! Pipeline configuration, read from TOML.
//!
//! ```toml
//! [movegen]
//! slot_budget = 16
//! promotions = "deferred"
//!
//! [transport]
//! queue_depth = 4
//! ```
//!
//! Every key is optional.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub movegen: MoveGenConfig,
    pub transport: TransportConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MoveGenConfig {
    /// Capacity of each color's piece list. Absent means unbounded.
    pub slot_budget: Option<usize>,
    pub promotions: PromotionPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransportConfig {
    /// Depth of the start strobe queue.
    pub queue_depth: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self { queue_depth: 4 }
    }
}

/// How a pawn move onto the last rank is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PromotionPolicy {
    /// Four moves, one per promotion piece, queen first.
    #[default]
    EachPiece,
    /// One move, the choice of piece left to the consumer.
    Deferred,
}

impl PipelineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }
}

#[test]
fn empty_config_is_default() {
    let cfg = PipelineConfig::from_toml_str("").unwrap();
    assert_eq!(cfg, PipelineConfig::default());
    assert_eq!(cfg.movegen.slot_budget, None);
    assert_eq!(cfg.movegen.promotions, PromotionPolicy::EachPiece);
    assert_eq!(cfg.transport.queue_depth, 4);
}

#[test]
fn reads_every_key() {
    let cfg = PipelineConfig::from_toml_str(
        r#"
        [movegen]
        slot_budget = 16
        promotions = "deferred"

        [transport]
        queue_depth = 1
        "#,
    )
    .unwrap();
    assert_eq!(cfg.movegen.slot_budget, Some(16));
    assert_eq!(cfg.movegen.promotions, PromotionPolicy::Deferred);
    assert_eq!(cfg.transport.queue_depth, 1);
}

#[test]
fn rejects_unknown_policy_and_keys() {
    assert!(matches!(
        PipelineConfig::from_toml_str("[movegen]\npromotions = \"queen-only\""),
        Err(ConfigError::Toml(_))
    ));
    assert!(PipelineConfig::from_toml_str("[movegen]\nslots = 3").is_err());
}

#[test]
fn missing_file_is_io_error() {
    assert!(matches!(
        PipelineConfig::load("/nonexistent/fenpipe.toml"),
        Err(ConfigError::Io(_))
    ));
}
