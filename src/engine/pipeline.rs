//! Full grouping run: inputs, outputs and the phase sequence.

use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

use log::info;
use serde::{Deserialize, Serialize};

use super::balancer::{balance_groups, target_size};
use super::placement::{place_friend_groups, place_solo_campers, preserve_overrides};
use super::state::PlacementState;
use super::validator::validate_groups;
use crate::{
    AssignmentType, CampGroup, Camper, CamperId, ConstraintViolation, FriendGroup, GroupNumber,
    GroupingConfig, GroupingError, Result, ViolationType, MAX_GRADE, MIN_GRADE,
};

/// Everything a full run needs.
#[derive(Debug, Clone)]
pub struct GroupingInput<'a> {
    pub campers: &'a [Camper],
    /// Friend groups from clustering, largest first
    pub friend_groups: &'a [FriendGroup],
    pub config: &'a GroupingConfig,
    pub preserve_manual_overrides: bool,
    /// Camper -> group placements to keep when preserving overrides
    pub existing_assignments: BTreeMap<CamperId, GroupNumber>,
}

impl<'a> GroupingInput<'a> {
    pub fn new(
        campers: &'a [Camper],
        friend_groups: &'a [FriendGroup],
        config: &'a GroupingConfig,
    ) -> Self {
        Self {
            campers,
            friend_groups,
            config,
            preserve_manual_overrides: false,
            existing_assignments: BTreeMap::new(),
        }
    }

    /// Preserve the given placements before any scoring happens.
    pub fn with_overrides(mut self, overrides: BTreeMap<CamperId, GroupNumber>) -> Self {
        self.preserve_manual_overrides = true;
        self.existing_assignments = overrides;
        self
    }
}

/// Manual and override placements currently recorded on `campers`.
pub fn manual_overrides(campers: &[Camper]) -> BTreeMap<CamperId, GroupNumber> {
    campers
        .iter()
        .filter_map(|c| {
            let assignment = c.assignment.as_ref()?;
            match assignment.assignment_type {
                AssignmentType::Manual | AssignmentType::Override => {
                    Some((c.athlete_id.clone(), assignment.group_id))
                }
                AssignmentType::Auto => None,
            }
        })
        .collect()
}

/// Audit entry for one camper's placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRecord {
    pub camper_id: CamperId,
    pub group_id: GroupNumber,
    /// Group from a previous run, if any
    pub previous_group_id: Option<GroupNumber>,
    pub assignment_type: AssignmentType,
    pub reason: String,
    /// Violation kinds this placement caused
    pub violations: Vec<ViolationType>,
}

/// Aggregate statistics for a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupingStats {
    pub total_campers: usize,
    pub placed_campers: usize,
    pub unplaced_campers: usize,
    pub friend_groups_total: usize,
    pub friend_groups_intact: usize,
    pub friend_groups_split: usize,
    pub hard_violations: usize,
    pub warnings: usize,
    pub late_registrations: usize,
    pub grade_discrepancies: usize,
    pub manual_placements: usize,
    pub balance_moves: usize,
    pub average_group_size: f64,
    pub group_size_variance: f64,
}

/// Result of a full run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupingOutput {
    /// True iff no hard violation remains
    pub success: bool,
    pub groups: Vec<CampGroup>,
    /// One record per placed camper, in roster order
    pub assignments: Vec<AssignmentRecord>,
    pub violations: Vec<ConstraintViolation>,
    pub warnings: Vec<String>,
    pub unplaced_camper_ids: Vec<CamperId>,
    pub stats: GroupingStats,
    pub execution_time_ms: f64,
}

impl GroupingOutput {
    pub fn hard_violations(&self) -> impl Iterator<Item = &ConstraintViolation> {
        self.violations.iter().filter(|v| v.is_hard())
    }

    /// Group holding `camper_id`, if placed.
    pub fn group_of(&self, camper_id: &str) -> Option<&CampGroup> {
        self.groups.iter().find(|g| g.contains(camper_id))
    }

    /// Serialize for the persistence sink.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Run the full placement.
///
/// Structural problems are rejected before any placement starts. Constraint
/// violations never fail the call; `success == false` signals them.
pub fn run(input: &GroupingInput) -> Result<GroupingOutput> {
    let started = Instant::now();
    check_preconditions(input)?;

    let config = input.config;
    info!(
        "[Grouping] Starting run: {} campers, {} friend groups, {} groups of up to {}",
        input.campers.len(),
        input.friend_groups.len(),
        config.num_groups,
        config.max_group_size
    );

    let mut state = PlacementState::new(input);
    state.record_grade_discrepancies();

    // Phase 1: manual overrides
    if input.preserve_manual_overrides {
        preserve_overrides(&mut state, &input.existing_assignments);
    }

    // Phase 2: friend groups
    place_friend_groups(&mut state, input.friend_groups)?;

    // Phase 3: solo campers
    place_solo_campers(&mut state);

    // Phase 4: balance
    let moves = balance_groups(&mut state.groups, &state.locked, config);
    state.apply_balance_moves(&moves);
    let target = target_size(&state.groups);
    for group in &state.groups {
        if group.camper_count() > target {
            state.warnings.push(format!(
                "Group {} remains above the target size ({}/{}): remaining campers are friend-grouped, manually placed, or have no eligible destination",
                group.number,
                group.camper_count(),
                target
            ));
        }
    }

    // Phase 5: validate
    let report = validate_groups(&mut state.groups, input.friend_groups, config);
    state.merge_validation(report);

    let output = state.finish(started.elapsed().as_secs_f64() * 1000.0);
    info!(
        "[Grouping] Finished in {:.2}ms: success={}, {} hard violations, {} warnings, {} balance moves",
        output.execution_time_ms,
        output.success,
        output.stats.hard_violations,
        output.stats.warnings,
        output.stats.balance_moves
    );
    Ok(output)
}

fn check_preconditions(input: &GroupingInput) -> Result<()> {
    input.config.validate()?;

    let mut seen: HashSet<&str> = HashSet::with_capacity(input.campers.len());
    for camper in input.campers {
        if !seen.insert(camper.athlete_id.as_str()) {
            return Err(GroupingError::DuplicateCamper {
                camper_id: camper.athlete_id.clone(),
            });
        }
        if !(MIN_GRADE..=MAX_GRADE).contains(&camper.grade) {
            return Err(GroupingError::GradeOutOfRange {
                camper_id: camper.athlete_id.clone(),
                grade: camper.grade,
            });
        }
    }

    let mut clustered: HashSet<&str> = HashSet::new();
    for group in input.friend_groups {
        for id in &group.member_ids {
            if !seen.contains(id.as_str()) {
                return Err(GroupingError::UnknownCamper {
                    camper_id: id.clone(),
                });
            }
            if !clustered.insert(id.as_str()) {
                return Err(GroupingError::DuplicateCamper {
                    camper_id: id.clone(),
                });
            }
        }
    }

    if input.preserve_manual_overrides {
        for (camper_id, group_id) in &input.existing_assignments {
            if !seen.contains(camper_id.as_str()) {
                return Err(GroupingError::UnknownCamper {
                    camper_id: camper_id.clone(),
                });
            }
            if *group_id == 0 || *group_id as usize > input.config.num_groups {
                return Err(GroupingError::UnknownGroup {
                    group_id: *group_id,
                    available: input.config.num_groups,
                });
            }
        }
    }

    Ok(())
}
