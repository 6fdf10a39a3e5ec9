//! Mutable state threaded through the phases of one run.

use std::collections::{HashMap, HashSet};

use log::debug;

use super::balancer::BalanceMove;
use super::pipeline::{AssignmentRecord, GroupingInput, GroupingOutput, GroupingStats};
use super::validator::ValidationReport;
use crate::violation::ViolationSubject;
use crate::{
    AssignmentType, CampGroup, Camper, CamperId, ConstraintViolation, GradeSpreadSubject,
    GroupNumber, GroupingConfig, Violation, ViolationType,
};

/// Violations recorded during a run, deduplicated by kind and subject.
#[derive(Debug, Default)]
pub(crate) struct ViolationLog {
    entries: Vec<ConstraintViolation>,
    seen: HashSet<(ViolationType, ViolationSubject)>,
}

impl ViolationLog {
    /// Record a violation. Returns `false` if the same fact was already recorded.
    pub fn push(&mut self, violation: Violation) -> bool {
        self.push_record(ConstraintViolation::new(violation))
    }

    pub fn push_record(&mut self, record: ConstraintViolation) -> bool {
        if self.seen.insert(record.dedup_key()) {
            self.entries.push(record);
            true
        } else {
            false
        }
    }

    pub fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&ConstraintViolation) -> bool,
    {
        self.entries.retain(keep);
        self.seen = self.entries.iter().map(|v| v.dedup_key()).collect();
    }

    pub fn into_vec(self) -> Vec<ConstraintViolation> {
        self.entries
    }
}

pub(crate) struct PlacementState<'a> {
    pub config: &'a GroupingConfig,
    pub campers: HashMap<&'a str, &'a Camper>,
    pub groups: Vec<CampGroup>,
    /// Campers the balancer must not move
    pub locked: HashSet<CamperId>,
    pub warnings: Vec<String>,
    roster: &'a [Camper],
    previous: HashMap<&'a str, GroupNumber>,
    unplaced: HashSet<&'a str>,
    records: HashMap<&'a str, AssignmentRecord>,
    log: ViolationLog,
    friend_groups_total: usize,
    friend_groups_intact: usize,
    friend_groups_split: usize,
    balance_moves: usize,
}

impl<'a> PlacementState<'a> {
    pub fn new(input: &GroupingInput<'a>) -> Self {
        let roster = input.campers;
        let campers: HashMap<&'a str, &'a Camper> =
            roster.iter().map(|c| (c.athlete_id.as_str(), c)).collect();

        let previous = roster
            .iter()
            .filter_map(|c| {
                let prior = c
                    .assignment
                    .as_ref()
                    .map(|a| a.group_id)
                    .or_else(|| input.existing_assignments.get(&c.athlete_id).copied())?;
                Some((c.athlete_id.as_str(), prior))
            })
            .collect();

        let locked = input
            .friend_groups
            .iter()
            .flat_map(|g| g.member_ids.iter().cloned())
            .collect();

        Self {
            config: input.config,
            campers,
            groups: CampGroup::empty_groups(input.config),
            locked,
            warnings: Vec::new(),
            roster,
            previous,
            unplaced: roster.iter().map(|c| c.athlete_id.as_str()).collect(),
            records: HashMap::with_capacity(roster.len()),
            log: ViolationLog::default(),
            friend_groups_total: input.friend_groups.len(),
            friend_groups_intact: 0,
            friend_groups_split: 0,
            balance_moves: 0,
        }
    }

    pub fn is_unplaced(&self, camper_id: &str) -> bool {
        self.unplaced.contains(camper_id)
    }

    pub fn grade_of(&self, camper_id: &str) -> Option<i32> {
        self.campers.get(camper_id).map(|c| c.grade)
    }

    /// Unplaced campers in roster order.
    pub fn unplaced_in_roster_order(&self) -> Vec<&'a str> {
        self.roster
            .iter()
            .map(|c| c.athlete_id.as_str())
            .filter(|id| self.unplaced.contains(id))
            .collect()
    }

    pub fn total_placed(&self) -> usize {
        self.groups.iter().map(|g| g.camper_count()).sum()
    }

    /// Index of a group by number.
    pub fn group_index(&self, number: GroupNumber) -> Option<usize> {
        self.groups.iter().position(|g| g.number == number)
    }

    /// Seat an unplaced camper in `groups[group_idx]` and open their audit record.
    pub fn place(
        &mut self,
        camper_id: &str,
        group_idx: usize,
        assignment_type: AssignmentType,
        reason: String,
    ) {
        let Some(camper) = self.campers.get(camper_id).copied() else {
            return;
        };
        let id = camper.athlete_id.as_str();
        if !self.unplaced.remove(id) {
            return;
        }

        let group = &mut self.groups[group_idx];
        group.add(id, camper.grade);
        debug!("[Grouping] {id} -> group {} ({reason})", group.number);

        let record = AssignmentRecord {
            camper_id: id.to_string(),
            group_id: group.number,
            previous_group_id: self.previous.get(id).copied(),
            assignment_type,
            reason,
            violations: Vec::new(),
        };
        self.records.insert(id, record);
    }

    /// Note that `camper_id`'s placement caused a violation of `kind`.
    pub fn tag(&mut self, camper_id: &str, kind: ViolationType) {
        if let Some(record) = self.records.get_mut(camper_id) {
            if !record.violations.contains(&kind) {
                record.violations.push(kind);
            }
        }
    }

    pub fn record_violation(&mut self, violation: Violation) -> bool {
        self.log.push(violation)
    }

    /// Record size or spread violations `groups[group_idx]` has right after
    /// seating `placed`, and tag those campers as their cause.
    pub fn check_after_placement(&mut self, group_idx: usize, placed: &[&str]) {
        let group = &self.groups[group_idx];
        let member_ids: Vec<CamperId> = group.camper_ids().map(String::from).collect();
        let mut caused = Vec::new();

        if group.is_over_capacity(self.config) {
            caused.push(Violation::SizeExceeded {
                group_id: group.number,
                camper_ids: member_ids.clone(),
                camper_count: group.camper_count(),
                max_group_size: self.config.max_group_size,
            });
        }
        if group.violates_grade_spread(self.config) {
            caused.push(Violation::GradeSpreadExceeded {
                subject: GradeSpreadSubject::Group(group.number),
                camper_ids: member_ids,
                grade_spread: group.grade_spread(),
                max_grade_spread: self.config.max_grade_spread,
            });
        }

        for violation in caused {
            let kind = violation.violation_type();
            self.record_violation(violation);
            for id in placed {
                self.tag(id, kind);
            }
        }
    }

    pub fn record_grade_discrepancies(&mut self) {
        for camper in self.roster {
            if !camper.has_grade_discrepancy {
                continue;
            }
            if let Some(computed) = camper.dob_grade {
                self.log.push(Violation::GradeDiscrepancy {
                    camper_id: camper.athlete_id.clone(),
                    reported_grade: camper.grade,
                    computed_grade: computed,
                });
            }
        }
    }

    pub fn apply_balance_moves(&mut self, moves: &[BalanceMove]) {
        for m in moves {
            if let Some(record) = self.records.get_mut(m.camper_id.as_str()) {
                record.group_id = m.to_group;
                record.reason = format!(
                    "{}; moved from group {} to balance group sizes",
                    record.reason, m.from_group
                );
            }
        }
        self.balance_moves += moves.len();
    }

    /// Fold a validation pass into the log.
    ///
    /// Group-level size and spread violations are replaced by the final-state
    /// versions; everything else is added only if not already recorded.
    /// Per-camper size and spread tags are rebuilt to match.
    pub fn merge_validation(&mut self, report: ValidationReport) {
        self.retag_group_violations(&report.violations);

        self.log.retain(|v| !is_group_level(&v.violation));

        for violation in report.violations {
            if violation.violation_type() == ViolationType::FriendGroupSplit {
                for id in violation.violation.camper_ids() {
                    self.tag(&id, ViolationType::FriendGroupSplit);
                }
            }
            self.log.push_record(violation);
        }

        self.friend_groups_intact = report.intact_friend_groups;
        self.friend_groups_split = report.split_friend_groups.len();
    }

    /// Keep a camper's size or spread tag only while their final group still
    /// has that violation. A final group violation nobody is tagged for is
    /// attributed to every member of that group.
    fn retag_group_violations(&mut self, final_violations: &[ConstraintViolation]) {
        let remaining: Vec<(ViolationType, GroupNumber)> = final_violations
            .iter()
            .filter(|v| is_group_level(&v.violation))
            .filter_map(|v| Some((v.violation_type(), v.violation.group_id()?)))
            .collect();

        for record in self.records.values_mut() {
            let group_id = record.group_id;
            record.violations.retain(|kind| {
                !matches!(
                    kind,
                    ViolationType::SizeExceeded | ViolationType::GradeSpreadExceeded
                ) || remaining.contains(&(*kind, group_id))
            });
        }

        for (kind, group_id) in remaining {
            let attributed = self
                .records
                .values()
                .any(|r| r.group_id == group_id && r.violations.contains(&kind));
            if attributed {
                continue;
            }
            for record in self.records.values_mut().filter(|r| r.group_id == group_id) {
                record.violations.push(kind);
            }
        }
    }

    pub fn finish(mut self, execution_time_ms: f64) -> GroupingOutput {
        let assignments: Vec<AssignmentRecord> = self
            .roster
            .iter()
            .filter_map(|c| self.records.remove(c.athlete_id.as_str()))
            .collect();
        let unplaced_camper_ids: Vec<CamperId> = self
            .unplaced_in_roster_order()
            .into_iter()
            .map(String::from)
            .collect();

        let violations = self.log.into_vec();
        let hard_violations = violations.iter().filter(|v| v.is_hard()).count();

        let sizes: Vec<f64> = self.groups.iter().map(|g| g.camper_count() as f64).collect();
        let average_group_size = if sizes.is_empty() {
            0.0
        } else {
            sizes.iter().sum::<f64>() / sizes.len() as f64
        };
        let group_size_variance = if sizes.is_empty() {
            0.0
        } else {
            sizes
                .iter()
                .map(|s| (s - average_group_size).powi(2))
                .sum::<f64>()
                / sizes.len() as f64
        };

        let stats = GroupingStats {
            total_campers: self.roster.len(),
            placed_campers: assignments.len(),
            unplaced_campers: unplaced_camper_ids.len(),
            friend_groups_total: self.friend_groups_total,
            friend_groups_intact: self.friend_groups_intact,
            friend_groups_split: self.friend_groups_split,
            hard_violations,
            warnings: violations.len() - hard_violations,
            late_registrations: self.roster.iter().filter(|c| c.is_late_registration).count(),
            grade_discrepancies: self
                .roster
                .iter()
                .filter(|c| c.has_grade_discrepancy)
                .count(),
            manual_placements: assignments
                .iter()
                .filter(|a| a.assignment_type != AssignmentType::Auto)
                .count(),
            balance_moves: self.balance_moves,
            average_group_size,
            group_size_variance,
        };

        GroupingOutput {
            success: hard_violations == 0,
            groups: self.groups,
            assignments,
            violations,
            warnings: self.warnings,
            unplaced_camper_ids,
            stats,
            execution_time_ms,
        }
    }
}

fn is_group_level(violation: &Violation) -> bool {
    matches!(
        violation,
        Violation::SizeExceeded { .. }
            | Violation::GradeSpreadExceeded {
                subject: GradeSpreadSubject::Group(_),
                ..
            }
    )
}
