//! # Camp Groups
//!
//! Constrained camper-grouping engine for day camps.
//!
//! This library provides:
//! - Roster standardization (age, grade, discrepancy and lateness flags)
//! - Fuzzy friend-request matching against the camp roster
//! - Friendship clustering with Union-Find
//! - Grade-contiguous splitting of oversized friend groups
//! - Scored multi-phase placement into a fixed number of groups
//! - Best-effort rebalancing, validation and reporting
//! - Late-registration insertion that never disturbs existing groups
//!
//! The engine is a pure, synchronous computation over in-memory data.
//! Fetching rosters and persisting results is left to the caller.
//!
//! ## Features
//!
//! - **`parallel`** - Standardize large rosters in parallel with rayon
//! - **`synthetic`** - Seeded synthetic roster generator for stress tests and benchmarks
//! - **`cli`** - `campgroups-cli` debug tool
//!
//! ## Quick Start
//!
//! ```rust
//! use campgroups::{group_campers, Camper, GroupingConfig};
//!
//! // Ten campers, two per grade from Kindergarten to 4th
//! let mut campers: Vec<Camper> = (0..10)
//!     .map(|i| Camper::new(&format!("c{i}"), &format!("Kid{i}"), "Camper", i / 2))
//!     .collect();
//!
//! let output = group_campers(&mut campers, &GroupingConfig::default()).unwrap();
//! assert!(output.success);
//! assert!(output.groups.iter().all(|g| g.camper_count() == 2));
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{GroupingError, OptionExt, Result};

// Union-Find data structure for friendship clustering
pub mod union_find;
pub use union_find::UnionFind;

// Default group names and colors
pub mod palette;

// Raw registration fields -> standardized campers
pub mod standardize;
pub use standardize::{standardize, standardize_roster, StandardizedCamper};
#[cfg(feature = "parallel")]
pub use standardize::standardize_roster_parallel;

// Friend-request name matching
pub mod matching;
pub use matching::{match_friend_requests, MatchKind, RosterEntry};

// Friendship graph clustering
pub mod clustering;
pub use clustering::{cluster, ClusterResult, ClusterStats, FriendEdge, FriendGroup};

// Grade-contiguous splitting of friend groups
pub mod splitter;
pub use splitter::split_friend_group;

// Typed constraint violations
pub mod violation;
pub use violation::{
    ConstraintViolation, GradeSpreadSubject, Resolution, ResolutionKind, Severity, Violation,
    ViolationType,
};

// Placement engine, balancing, validation, late insertion
pub mod engine;
pub use engine::{
    insert_late, move_camper, plan_late_insertion, run, validate_groups, AssignmentRecord,
    GroupingEngine, GroupingInput, GroupingOutput, GroupingRun, GroupingStats, LateInsertion,
    RunTrigger,
};

// Synthetic rosters for stress testing and benchmarking
#[cfg(feature = "synthetic")]
pub mod synthetic;

// ============================================================================
// Core Types
// ============================================================================

/// Athlete id of a camper.
pub type CamperId = String;

/// 1-based number of a camp group.
pub type GroupNumber = u32;

/// Id of a friend group (connected component of the friendship graph).
pub type FriendGroupId = u32;

/// Lowest representable grade (Pre-K).
pub const MIN_GRADE: i32 = -1;

/// Highest representable grade.
pub const MAX_GRADE: i32 = 12;

/// How a camper ended up in their group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentType {
    /// Placed by the engine.
    Auto,
    /// Placed by a director and preserved across runs.
    Manual,
    /// Director override that knowingly breaks a constraint.
    Override,
}

impl AssignmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentType::Auto => "auto",
            AssignmentType::Manual => "manual",
            AssignmentType::Override => "override",
        }
    }
}

/// A camper's current group assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub group_id: GroupNumber,
    pub assignment_type: AssignmentType,
    /// Human-readable reason
    pub reason: String,
}

/// Friend requests as submitted: either free text or a pre-split list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FriendRequests {
    List(Vec<String>),
    Text(String),
}

impl Default for FriendRequests {
    fn default() -> Self {
        FriendRequests::List(Vec::new())
    }
}

/// A registration record as supplied by the roster source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawCamper {
    pub athlete_id: CamperId,
    pub registration_id: String,
    pub first_name: String,
    pub last_name: String,
    /// ISO date (YYYY-MM-DD); parsed leniently by the standardizer
    pub date_of_birth: Option<String>,
    /// Parent-reported grade, free text ("3rd", "K", "Pre-K", "fifth grade")
    pub reported_grade: Option<String>,
    pub friend_requests: FriendRequests,
    pub registered_at: Option<DateTime<Utc>>,
    pub medical_notes: Option<String>,
    pub allergies: Option<String>,
    pub special_considerations: Option<String>,
    /// Assignment from a previous run, if any
    pub current_assignment: Option<Assignment>,
}

/// A standardized camper, ready for clustering and placement.
///
/// Age and grade are derived once by the standardizer and treated as
/// immutable inputs afterwards. Medical, allergy and special-consideration
/// fields are carried through untouched and never read by placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Camper {
    pub athlete_id: CamperId,
    pub registration_id: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    /// Whole years of age at camp start
    pub age_years: Option<u32>,
    /// Whole months of age at camp start (total, not remainder)
    pub age_months: Option<u32>,
    pub reported_grade: Option<String>,
    /// Validated grade, always within -1..=12
    pub grade: i32,
    /// Grade computed from date of birth and the school-year cutoff
    pub dob_grade: Option<i32>,
    pub has_grade_discrepancy: bool,
    /// Normalized friend-request names, in submission order
    pub friend_requests: Vec<String>,
    /// Athlete ids resolved from `friend_requests`
    pub matched_friend_ids: Vec<CamperId>,
    /// Set by clustering; `None` for solo campers
    pub friend_group_id: Option<FriendGroupId>,
    pub is_late_registration: bool,
    pub medical_notes: Option<String>,
    pub allergies: Option<String>,
    pub special_considerations: Option<String>,
    pub assignment: Option<Assignment>,
}

impl Camper {
    /// Create an already-standardized camper with only a grade.
    pub fn new(athlete_id: &str, first_name: &str, last_name: &str, grade: i32) -> Self {
        Self {
            athlete_id: athlete_id.to_string(),
            registration_id: String::new(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            date_of_birth: None,
            age_years: None,
            age_months: None,
            reported_grade: None,
            grade: grade.clamp(MIN_GRADE, MAX_GRADE),
            dob_grade: None,
            has_grade_discrepancy: false,
            friend_requests: Vec::new(),
            matched_friend_ids: Vec::new(),
            friend_group_id: None,
            is_late_registration: false,
            medical_notes: None,
            allergies: None,
            special_considerations: None,
            assignment: None,
        }
    }

    /// Builder-style helper to attach resolved friend ids.
    pub fn with_friends(mut self, friend_ids: &[&str]) -> Self {
        self.matched_friend_ids = friend_ids.iter().map(|id| id.to_string()).collect();
        self
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Configuration for grouping.
///
/// All algorithm behavior is parameterized through this value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupingConfig {
    /// Maximum campers per group.
    /// Default: 12
    pub max_group_size: usize,

    /// Number of groups to fill.
    /// Default: 5
    pub num_groups: usize,

    /// Maximum allowed difference between the highest and lowest grade in a group.
    /// Default: 2
    pub max_grade_spread: i32,

    /// First month (1-12) of the school year used for grade-from-DOB.
    /// Default: 9 (September)
    pub cutoff_month: u32,

    /// Campers registering fewer than this many days before camp start are late.
    /// Default: 7
    pub late_registration_days: i64,

    /// Reported vs computed grade difference above which a discrepancy is flagged.
    /// Default: 1
    pub discrepancy_threshold: i32,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            max_group_size: 12,
            num_groups: 5,
            max_grade_spread: 2,
            cutoff_month: 9,
            late_registration_days: 7,
            discrepancy_threshold: 1,
        }
    }
}

impl GroupingConfig {
    /// Check structural validity.
    pub fn validate(&self) -> Result<()> {
        if self.num_groups == 0 {
            return Err(GroupingError::NoGroups);
        }
        if self.max_group_size == 0 {
            return Err(GroupingError::InvalidConfig {
                reason: "max group size must be at least 1".to_string(),
            });
        }
        if self.max_grade_spread < 0 {
            return Err(GroupingError::InvalidConfig {
                reason: format!("max grade spread {} is negative", self.max_grade_spread),
            });
        }
        if !(1..=12).contains(&self.cutoff_month) {
            return Err(GroupingError::InvalidConfig {
                reason: format!("cutoff month {} is not in 1..=12", self.cutoff_month),
            });
        }
        if self.discrepancy_threshold < 0 {
            return Err(GroupingError::InvalidConfig {
                reason: "discrepancy threshold must not be negative".to_string(),
            });
        }
        Ok(())
    }

    /// Total seats across all groups.
    pub fn capacity(&self) -> usize {
        self.max_group_size * self.num_groups
    }
}

/// A camper seated in a group, with the grade placement decisions use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    pub camper_id: CamperId,
    pub grade: i32,
}

/// A camp group (team).
///
/// Membership is the only source of truth: grade range and size are derived
/// on demand, and the violation flags are snapshots refreshed by validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampGroup {
    pub number: GroupNumber,
    pub name: String,
    pub color: String,
    members: Vec<GroupMember>,
    pub has_size_violation: bool,
    pub has_grade_violation: bool,
    pub has_friend_split: bool,
}

impl CampGroup {
    /// Create an empty group with the default palette name and color.
    pub fn new(number: GroupNumber) -> Self {
        Self {
            number,
            name: palette::group_name(number),
            color: palette::group_color(number).to_string(),
            members: Vec::new(),
            has_size_violation: false,
            has_grade_violation: false,
            has_friend_split: false,
        }
    }

    /// Create `config.num_groups` empty groups numbered from 1.
    pub fn empty_groups(config: &GroupingConfig) -> Vec<CampGroup> {
        (1..=config.num_groups as GroupNumber)
            .map(CampGroup::new)
            .collect()
    }

    pub fn members(&self) -> &[GroupMember] {
        &self.members
    }

    pub fn camper_ids(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|m| m.camper_id.as_str())
    }

    pub fn contains(&self, camper_id: &str) -> bool {
        self.members.iter().any(|m| m.camper_id == camper_id)
    }

    pub fn camper_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn min_grade(&self) -> Option<i32> {
        self.members.iter().map(|m| m.grade).min()
    }

    pub fn max_grade(&self) -> Option<i32> {
        self.members.iter().map(|m| m.grade).max()
    }

    /// Highest minus lowest grade; 0 when empty.
    pub fn grade_spread(&self) -> i32 {
        match (self.min_grade(), self.max_grade()) {
            (Some(min), Some(max)) => max - min,
            _ => 0,
        }
    }

    /// Spread the group would have after adding campers spanning `min..=max`.
    pub fn spread_with(&self, min: i32, max: i32) -> i32 {
        let new_min = self.min_grade().map_or(min, |g| g.min(min));
        let new_max = self.max_grade().map_or(max, |g| g.max(max));
        new_max - new_min
    }

    /// Midpoint of the current grade range, if any.
    pub fn grade_midpoint(&self) -> Option<f64> {
        match (self.min_grade(), self.max_grade()) {
            (Some(min), Some(max)) => Some((min + max) as f64 / 2.0),
            _ => None,
        }
    }

    pub fn is_over_capacity(&self, config: &GroupingConfig) -> bool {
        self.camper_count() > config.max_group_size
    }

    pub fn is_at_capacity(&self, config: &GroupingConfig) -> bool {
        self.camper_count() >= config.max_group_size
    }

    pub fn violates_grade_spread(&self, config: &GroupingConfig) -> bool {
        self.grade_spread() > config.max_grade_spread
    }

    /// Seat a camper. Seating the same id twice is ignored.
    pub fn add(&mut self, camper_id: &str, grade: i32) {
        if !self.contains(camper_id) {
            self.members.push(GroupMember {
                camper_id: camper_id.to_string(),
                grade,
            });
        }
    }

    /// Remove a camper, returning their seat if present.
    pub fn remove(&mut self, camper_id: &str) -> Option<GroupMember> {
        let idx = self.members.iter().position(|m| m.camper_id == camper_id)?;
        Some(self.members.remove(idx))
    }

    /// Recompute the size and grade flags from current membership.
    ///
    /// The friend-split flag depends on friend groups and is set by validation.
    pub fn refresh_flags(&mut self, config: &GroupingConfig) {
        self.has_size_violation = self.is_over_capacity(config);
        self.has_grade_violation = self.violates_grade_spread(config);
    }
}

/// Cluster `campers` by friendship and place them into groups.
///
/// Convenience wrapper for a full run without manual overrides.
pub fn group_campers(campers: &mut [Camper], config: &GroupingConfig) -> Result<GroupingOutput> {
    config.validate()?;
    let clusters = cluster(campers, config);
    let input = GroupingInput::new(campers, &clusters.friend_groups, config);
    run(&input)
}
