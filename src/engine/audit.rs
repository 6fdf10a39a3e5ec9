//! Write-once record of a grouping run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::pipeline::{GroupingInput, GroupingOutput};
use crate::GroupingConfig;

/// Why a run happened and who asked for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunTrigger {
    pub reason: String,
    pub actor: Option<String>,
}

impl RunTrigger {
    pub fn new(reason: &str, actor: Option<&str>) -> Self {
        Self {
            reason: reason.to_string(),
            actor: actor.map(String::from),
        }
    }
}

/// Snapshot of one run: inputs, configuration and outcome counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupingRun {
    pub trigger: RunTrigger,
    pub started_at: DateTime<Utc>,
    pub camper_count: usize,
    pub friend_group_count: usize,
    pub config: GroupingConfig,
    pub placed_count: usize,
    pub split_count: usize,
    pub violation_count: usize,
    pub hard_violation_count: usize,
    pub duration_ms: f64,
    pub preserved_manual_overrides: bool,
    pub success: bool,
}

impl GroupingRun {
    pub fn record(
        trigger: RunTrigger,
        started_at: DateTime<Utc>,
        input: &GroupingInput,
        output: &GroupingOutput,
    ) -> Self {
        Self {
            trigger,
            started_at,
            camper_count: input.campers.len(),
            friend_group_count: input.friend_groups.len(),
            config: input.config.clone(),
            placed_count: output.stats.placed_campers,
            split_count: output.stats.friend_groups_split,
            violation_count: output.violations.len(),
            hard_violation_count: output.stats.hard_violations,
            duration_ms: output.execution_time_ms,
            preserved_manual_overrides: input.preserve_manual_overrides,
            success: output.success,
        }
    }
}
