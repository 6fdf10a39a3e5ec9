//! # Placement Engine
//!
//! Places clustered campers into a fixed number of camp groups.
//!
//! ## Architecture
//!
//! A full run is a strict sequence of phases over one shared state:
//! 1. Preserve manual overrides (optional)
//! 2. Place friend groups, splitting those that cannot stay whole
//! 3. Place solo campers, lowest grade first
//! 4. Balance group sizes by moving unlocked campers
//! 5. Validate the final state and build the report
//!
//! Supporting modules:
//! - `scoring` - Placement score functions and penalty constants
//! - `balancer` - Best-effort size balancing
//! - `validator` - Re-checks any group state against the limits
//! - `incremental` - Late-registration insertion into final groups
//! - `manual` - Ad hoc director moves between groups
//! - `audit` - Write-once record of a run
//!
//! [`GroupingEngine`] ties these together for one camp.

pub mod audit;
pub mod balancer;
pub mod incremental;
pub mod manual;
pub mod pipeline;
mod placement;
pub mod scoring;
mod state;
pub mod validator;

pub use audit::{GroupingRun, RunTrigger};
pub use balancer::{balance_groups, BalanceMove};
pub use incremental::{insert_late, plan_late_insertion, LateInsertion};
pub use manual::{move_camper, ManualMove};
pub use pipeline::{
    manual_overrides, run, AssignmentRecord, GroupingInput, GroupingOutput, GroupingStats,
};
pub use validator::{validate_groups, ValidationReport};

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use log::{info, warn};

use crate::error::OptionExt;
use crate::matching::RosterEntry;
use crate::standardize::{standardize, standardize_roster};
use crate::{
    cluster, Assignment, AssignmentType, CampGroup, Camper, ConstraintViolation, FriendEdge,
    FriendGroup, GroupNumber, GroupingConfig, GroupingError, RawCamper, Result,
};

/// Grouping state for a single camp.
///
/// Holds the standardized roster, its friend groups, and the last committed
/// group state. Runs for the same camp must be serialized by the caller;
/// separate engines for separate camps share nothing.
#[derive(Debug, Default)]
pub struct GroupingEngine {
    config: GroupingConfig,
    camp_start: Option<NaiveDate>,
    campers: Vec<Camper>,
    friend_groups: Vec<FriendGroup>,
    edges: Vec<FriendEdge>,
    groups: Vec<CampGroup>,
    runs: Vec<GroupingRun>,
}

impl GroupingEngine {
    /// Create an engine with custom configuration.
    pub fn new(config: GroupingConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &GroupingConfig {
        &self.config
    }

    pub fn campers(&self) -> &[Camper] {
        &self.campers
    }

    pub fn camper(&self, camper_id: &str) -> Option<&Camper> {
        self.campers.iter().find(|c| c.athlete_id == camper_id)
    }

    pub fn friend_groups(&self) -> &[FriendGroup] {
        &self.friend_groups
    }

    pub fn friend_edges(&self) -> &[FriendEdge] {
        &self.edges
    }

    /// Committed groups from the last run (empty before the first run).
    pub fn groups(&self) -> &[CampGroup] {
        &self.groups
    }

    /// Audit records of every run, oldest first.
    pub fn runs(&self) -> &[GroupingRun] {
        &self.runs
    }

    // ========================================================================
    // Roster
    // ========================================================================

    /// Standardize and cluster a camp roster, replacing any previous roster.
    ///
    /// Returns standardization and clustering warnings.
    pub fn load_roster(&mut self, raws: &[RawCamper], camp_start: NaiveDate) -> Vec<String> {
        let (campers, mut warnings) = standardize_roster(raws, camp_start, &self.config);
        self.camp_start = Some(camp_start);
        self.campers = campers;
        self.groups.clear();
        warnings.extend(self.recluster());
        warnings
    }

    /// Replace the roster with already-standardized campers and re-cluster.
    ///
    /// `camp_start` is used to standardize later late registrants.
    pub fn load_campers(&mut self, campers: Vec<Camper>, camp_start: NaiveDate) -> Vec<String> {
        self.camp_start = Some(camp_start);
        self.campers = campers;
        self.groups.clear();
        self.recluster()
    }

    fn recluster(&mut self) -> Vec<String> {
        let result = cluster(&mut self.campers, &self.config);
        self.friend_groups = result.friend_groups;
        self.edges = result.edges;
        result.warnings
    }

    // ========================================================================
    // Full runs
    // ========================================================================

    /// Run the full placement and commit the result.
    ///
    /// With `preserve_manual_overrides`, campers whose current assignment is
    /// manual or an override keep their group.
    pub fn run(
        &mut self,
        trigger: RunTrigger,
        preserve_manual_overrides: bool,
    ) -> Result<GroupingOutput> {
        let started_at = Utc::now();
        let mut input = GroupingInput::new(&self.campers, &self.friend_groups, &self.config);
        if preserve_manual_overrides {
            input = input.with_overrides(manual_overrides(&self.campers));
        }

        let output = run(&input)?;
        let record = GroupingRun::record(trigger, started_at, &input, &output);

        let by_id: HashMap<&str, &AssignmentRecord> = output
            .assignments
            .iter()
            .map(|a| (a.camper_id.as_str(), a))
            .collect();
        for camper in &mut self.campers {
            if let Some(assignment) = by_id.get(camper.athlete_id.as_str()) {
                camper.assignment = Some(Assignment {
                    group_id: assignment.group_id,
                    assignment_type: assignment.assignment_type,
                    reason: assignment.reason.clone(),
                });
            }
        }

        self.groups = output.groups.clone();
        info!(
            "[Grouping] Run #{} committed: success={}, {} violations",
            self.runs.len() + 1,
            record.success,
            record.violation_count
        );
        self.runs.push(record);
        Ok(output)
    }

    // ========================================================================
    // Changes after a run
    // ========================================================================

    /// Standardize a late registrant and insert them into the committed groups.
    ///
    /// Existing placements are never revisited and the balancer does not run.
    pub fn insert_late(&mut self, raw: &RawCamper) -> Result<LateInsertion> {
        if self.groups.is_empty() {
            return Err(GroupingError::NoGroups);
        }
        if self.camper(&raw.athlete_id).is_some() {
            return Err(GroupingError::DuplicateCamper {
                camper_id: raw.athlete_id.clone(),
            });
        }
        // Committed groups imply a loaded roster, which always sets the camp start
        let camp_start = self.camp_start.ok_or(GroupingError::NoGroups)?;

        let mut roster: Vec<RosterEntry> =
            self.campers.iter().map(RosterEntry::from_camper).collect();
        roster.push(RosterEntry::from_raw(raw));
        let standardized = standardize(raw, camp_start, &roster, &self.config);
        for warning in &standardized.warnings {
            warn!("[LateInsert] {warning}");
        }

        let mut camper = standardized.camper;
        let insertion = insert_late(&camper, &mut self.groups, &self.config)?;
        camper.assignment = Some(insertion.assignment.clone());
        self.campers.push(camper);
        Ok(insertion)
    }

    /// Move a camper between committed groups as a director decision.
    pub fn move_camper(
        &mut self,
        camper_id: &str,
        to_group: GroupNumber,
        assignment_type: AssignmentType,
        reason: &str,
    ) -> Result<ManualMove> {
        let idx = self
            .campers
            .iter()
            .position(|c| c.athlete_id == camper_id)
            .ok_or_unknown_camper(camper_id)?;
        let result = move_camper(
            &mut self.groups,
            camper_id,
            to_group,
            assignment_type,
            reason,
            &self.config,
        )?;
        self.campers[idx].assignment = Some(result.assignment.clone());
        Ok(result)
    }

    /// Re-check the committed groups, refreshing their violation flags.
    pub fn revalidate(&mut self) -> Vec<ConstraintViolation> {
        validate_groups(&mut self.groups, &self.friend_groups, &self.config).violations
    }
}
