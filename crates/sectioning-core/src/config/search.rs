//! Resectioning search configuration.

use serde::{Deserialize, Serialize};

/// Weighting strategy applied to candidate enrollments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightingMode {
    /// Prefer candidates that keep the student's previous schedule.
    Stability,
    /// Every legal candidate weighs the same except for course preference.
    Uniform,
}

impl Default for WeightingMode {
    fn default() -> Self {
        Self::Stability
    }
}

/// Order in which resectioning candidates are processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueOrder {
    /// Student tier, request tier, alternative index, then wait-list time.
    Priority,
    /// Wait-list time first, then the priority keys.
    FirstComeFirstServed,
}

impl Default for QueueOrder {
    fn default() -> Self {
        Self::Priority
    }
}

/// Bonus weights used by the stability weighting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StabilityWeights {
    /// Penalty per position of the chosen course in the request's alternatives.
    #[serde(default = "default_choice_penalty")]
    pub choice_penalty: f64,
    /// Bonus for keeping the exact same section.
    #[serde(default = "default_same_section")]
    pub same_section: f64,
    /// Bonus for a section at the same time as the previous one.
    #[serde(default = "default_same_time")]
    pub same_time: f64,
    /// Bonus for a section in the same room as the previous one.
    #[serde(default = "default_same_room")]
    pub same_room: f64,
    /// Bonus for a section with the same name as the previous one.
    #[serde(default = "default_same_name")]
    pub same_name: f64,
    /// Bonus for staying in the previously enrolled course.
    #[serde(default = "default_same_choice")]
    pub same_choice: f64,
}

impl Default for StabilityWeights {
    fn default() -> Self {
        Self {
            choice_penalty: default_choice_penalty(),
            same_section: default_same_section(),
            same_time: default_same_time(),
            same_room: default_same_room(),
            same_name: default_same_name(),
            same_choice: default_same_choice(),
        }
    }
}

/// Resectioning search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Weighting strategy.
    #[serde(default)]
    pub weighting: WeightingMode,
    /// Stability bonuses.
    #[serde(default)]
    pub weights: StabilityWeights,
    /// Maximum number of complete candidates enumerated per request.
    #[serde(default = "default_max_combinations")]
    pub max_combinations: usize,
    /// Seed for the tie-breaking random source (random when unset).
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Candidate processing order.
    #[serde(default)]
    pub queue_order: QueueOrder,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            weighting: WeightingMode::default(),
            weights: StabilityWeights::default(),
            max_combinations: default_max_combinations(),
            random_seed: None,
            queue_order: QueueOrder::default(),
        }
    }
}

fn default_choice_penalty() -> f64 {
    100.0
}

fn default_same_section() -> f64 {
    10.0
}

fn default_same_time() -> f64 {
    5.0
}

fn default_same_room() -> f64 {
    2.0
}

fn default_same_name() -> f64 {
    1.0
}

fn default_same_choice() -> f64 {
    20.0
}

fn default_max_combinations() -> usize {
    100_000
}
