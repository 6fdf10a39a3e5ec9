//! Tests for the placement engine: full runs and the stateful camp engine

use std::collections::{BTreeMap, HashSet};

use chrono::{NaiveDate, TimeZone, Utc};
use campgroups::{
    cluster, group_campers, run, AssignmentType, Camper, GradeSpreadSubject, GroupingConfig,
    GroupingEngine, GroupingError, GroupingInput, RawCamper, RunTrigger, Violation,
    ViolationType,
};

fn solo(id: &str, grade: i32) -> Camper {
    Camper::new(id, id, "Test", grade)
}

/// Ten solo campers, two per grade from K to 4th.
fn clean_roster() -> Vec<Camper> {
    (0..10).map(|i| solo(&format!("c{i}"), i / 2)).collect()
}

fn friend_chain(prefix: &str, grades: &[i32]) -> Vec<Camper> {
    grades
        .iter()
        .enumerate()
        .map(|(i, g)| {
            let id = format!("{prefix}{i:02}");
            let prev = format!("{prefix}{:02}", i.saturating_sub(1));
            Camper::new(&id, &id, "Friend", *g).with_friends(&[prev.as_str()])
        })
        .collect()
}

#[test]
fn test_clean_even_split() {
    let config = GroupingConfig::default();
    let mut campers = clean_roster();
    let output = group_campers(&mut campers, &config).unwrap();

    assert!(output.success);
    assert!(output.violations.is_empty(), "{:?}", output.violations);
    for group in &output.groups {
        assert_eq!(group.camper_count(), 2, "group {}", group.number);
        assert!(!group.has_size_violation && !group.has_grade_violation);
    }
    assert_eq!(output.assignments.len(), 10);
    assert_eq!(output.stats.average_group_size, 2.0);
    assert_eq!(output.stats.group_size_variance, 0.0);
}

#[test]
fn test_oversized_friend_group_forces_split() {
    let config = GroupingConfig::default();
    let mut campers = friend_chain("k", &[3; 15]);
    let output = group_campers(&mut campers, &config).unwrap();

    assert!(output.groups.iter().all(|g| g.camper_count() <= 12));
    let used: Vec<usize> = output
        .groups
        .iter()
        .map(|g| g.camper_count())
        .filter(|&n| n > 0)
        .collect();
    assert_eq!(used, vec![12, 3]);

    let split: Vec<_> = output
        .violations
        .iter()
        .filter(|v| v.violation_type() == ViolationType::FriendGroupSplit)
        .collect();
    assert_eq!(split.len(), 1, "reported once");
    let mut named = split[0].violation.camper_ids();
    named.sort();
    let mut all: Vec<String> = campers.iter().map(|c| c.athlete_id.clone()).collect();
    all.sort();
    assert_eq!(named, all);
    assert!(!split[0].is_hard());

    assert!(output
        .violations
        .iter()
        .any(|v| v.violation_type() == ViolationType::FriendGroupTooLarge));
    assert!(output.success, "split and too-large are warnings");
    assert_eq!(output.stats.friend_groups_split, 1);
}

#[test]
fn test_grade_spread_violation_surfaced() {
    let config = GroupingConfig::default();
    let mut campers = friend_chain("w", &[0, 0, 5]);
    let clusters = cluster(&mut campers, &config);
    assert!(!clusters.friend_groups[0].can_be_placed_intact());

    let input = GroupingInput::new(&campers, &clusters.friend_groups, &config);
    let output = run(&input).unwrap();

    let friend_level = output.violations.iter().find(|v| {
        matches!(
            v.violation,
            Violation::GradeSpreadExceeded {
                subject: GradeSpreadSubject::FriendGroup(_),
                ..
            }
        )
    });
    let friend_level = friend_level.expect("friend-group spread violation");
    assert_eq!(friend_level.violation.camper_ids(), vec!["w00", "w01", "w02"]);

    // Kept together, so the group holding them breaks the hard limit
    assert!(!output.success);
    let holder = output.group_of("w00").unwrap();
    assert!(holder.contains("w01") && holder.contains("w02"));
    assert!(holder.has_grade_violation);
}

#[test]
fn test_intact_friend_group_stays_together() {
    let config = GroupingConfig::default();
    let mut campers = friend_chain("f", &[2, 2, 3, 3]);
    campers.extend((0..12).map(|i| solo(&format!("s{i:02}"), i % 4)));

    let output = group_campers(&mut campers, &config).unwrap();
    let holder = output.group_of("f00").unwrap().number;
    for id in ["f01", "f02", "f03"] {
        assert_eq!(output.group_of(id).unwrap().number, holder);
    }
    assert_eq!(output.stats.friend_groups_intact, 1);
    assert_eq!(output.stats.friend_groups_split, 0);
}

#[test]
fn test_full_roster_goes_over_capacity_with_hard_violation() {
    let config = GroupingConfig {
        num_groups: 2,
        max_group_size: 3,
        ..GroupingConfig::default()
    };
    let mut campers: Vec<Camper> = (0..7).map(|i| solo(&format!("c{i}"), 1)).collect();
    let output = group_campers(&mut campers, &config).unwrap();

    let placed: usize = output.groups.iter().map(|g| g.camper_count()).sum();
    assert_eq!(placed, 7);
    assert!(output.unplaced_camper_ids.is_empty());
    assert!(!output.success);
    assert!(output
        .hard_violations()
        .any(|v| v.violation_type() == ViolationType::SizeExceeded));
}

#[test]
fn test_runs_are_deterministic() {
    let config = GroupingConfig::default();
    let mut base = friend_chain("f", &[1, 2, 2]);
    base.extend(friend_chain("g", &[4, 4, 5, 5, 4]));
    base.extend((0..20).map(|i| solo(&format!("s{i:02}"), (i * 7) % 6)));

    let mut first_campers = base.clone();
    let mut second_campers = base;
    let first = group_campers(&mut first_campers, &config).unwrap();
    let second = group_campers(&mut second_campers, &config).unwrap();

    assert_eq!(first.groups, second.groups);
    assert_eq!(first.assignments, second.assignments);
    assert_eq!(first.violations, second.violations);
    assert_eq!(first.stats, second.stats);
}

#[test]
fn test_preserved_overrides_placed_first() {
    let config = GroupingConfig::default();
    let campers = clean_roster();
    let overrides: BTreeMap<String, u32> = [("c9".to_string(), 1u32), ("c0".to_string(), 5u32)]
        .into_iter()
        .collect();
    let input = GroupingInput::new(&campers, &[], &config).with_overrides(overrides);
    let output = run(&input).unwrap();

    assert_eq!(output.group_of("c0").unwrap().number, 5);
    assert_eq!(output.group_of("c9").unwrap().number, 1);
    let record = output
        .assignments
        .iter()
        .find(|a| a.camper_id == "c0")
        .unwrap();
    assert_eq!(record.assignment_type, AssignmentType::Manual);
    assert_eq!(output.stats.manual_placements, 2);
}

#[test]
fn test_overrides_are_not_balanced_away() {
    let config = GroupingConfig::default();
    let campers = clean_roster();
    let overrides: BTreeMap<String, u32> = ["c0", "c1", "c2", "c3"]
        .into_iter()
        .map(|id| (id.to_string(), 1u32))
        .collect();
    let input = GroupingInput::new(&campers, &[], &config).with_overrides(overrides);
    let output = run(&input).unwrap();

    // Target is 2 per group, but the four pinned campers stay put
    for id in ["c0", "c1", "c2", "c3"] {
        assert_eq!(output.group_of(id).unwrap().number, 1, "{id} was moved");
        let record = output
            .assignments
            .iter()
            .find(|a| a.camper_id == id)
            .unwrap();
        assert_eq!(record.assignment_type, AssignmentType::Manual);
        assert!(!record.reason.contains("balance"));
    }
    assert!(output
        .warnings
        .iter()
        .any(|w| w.starts_with("Group 1 remains above the target size")));
    assert_eq!(output.stats.manual_placements, 4);
}

#[test]
fn test_intact_placement_records_its_violations() {
    let config = GroupingConfig {
        num_groups: 1,
        ..GroupingConfig::default()
    };
    let mut campers = friend_chain("a", &[0, 0]);
    campers.extend(friend_chain("b", &[3, 3]));
    let output = group_campers(&mut campers, &config).unwrap();

    assert!(!output.success);
    assert!(output
        .hard_violations()
        .any(|v| v.violation_type() == ViolationType::GradeSpreadExceeded));

    let tags = |id: &str| {
        output
            .assignments
            .iter()
            .find(|a| a.camper_id == id)
            .unwrap()
            .violations
            .clone()
    };
    // The second friend group widened the spread; the first did not
    assert!(tags("b00").contains(&ViolationType::GradeSpreadExceeded));
    assert!(tags("b01").contains(&ViolationType::GradeSpreadExceeded));
    assert!(tags("a00").is_empty());
    assert!(tags("a01").is_empty());
}

#[test]
fn test_record_tags_match_final_violations() {
    let config = GroupingConfig {
        num_groups: 2,
        max_group_size: 4,
        ..GroupingConfig::default()
    };
    let mut campers = friend_chain("f", &[1, 1, 2]);
    campers.extend(friend_chain("g", &[4, 4]));
    campers.extend((0..5).map(|i| solo(&format!("s{i}"), i % 5)));
    let output = group_campers(&mut campers, &config).unwrap();

    let final_group_violations: HashSet<(ViolationType, u32)> = output
        .violations
        .iter()
        .filter_map(|v| Some((v.violation_type(), v.violation.group_id()?)))
        .collect();
    for record in &output.assignments {
        for kind in &record.violations {
            if matches!(
                kind,
                ViolationType::SizeExceeded | ViolationType::GradeSpreadExceeded
            ) {
                assert!(
                    final_group_violations.contains(&(*kind, record.group_id)),
                    "{} tagged {kind:?} but group {} has no such violation",
                    record.camper_id,
                    record.group_id
                );
            }
        }
    }
}

#[test]
fn test_impossible_placement_is_a_tagged_warning() {
    let config = GroupingConfig::default();
    let mut campers = friend_chain("w", &[0, 0, 5]);
    let output = group_campers(&mut campers, &config).unwrap();

    let impossible = output
        .violations
        .iter()
        .find(|v| v.violation_type() == ViolationType::ImpossiblePlacement)
        .expect("impossible placement recorded");
    assert!(!impossible.is_hard());
    assert_eq!(impossible.violation.camper_ids(), vec!["w00", "w01", "w02"]);
    assert_eq!(impossible.violation.group_id(), Some(1));
    for record in &output.assignments {
        assert!(record.violations.contains(&ViolationType::ImpossiblePlacement));
    }
}

#[test]
fn test_discrepancies_and_late_registrations_reported() {
    let config = GroupingConfig::default();
    let mut mismatched = solo("mis", 3);
    mismatched.dob_grade = Some(5);
    mismatched.has_grade_discrepancy = true;
    let mut late = solo("late", 2);
    late.is_late_registration = true;
    let mut campers = vec![mismatched, late, solo("ok", 3)];

    let output = group_campers(&mut campers, &config).unwrap();

    let discrepancy = output
        .violations
        .iter()
        .find(|v| v.violation_type() == ViolationType::GradeDiscrepancy)
        .expect("discrepancy recorded");
    assert!(matches!(
        discrepancy.violation,
        Violation::GradeDiscrepancy {
            reported_grade: 3,
            computed_grade: 5,
            ..
        }
    ));
    assert_eq!(discrepancy.violation.camper_ids(), vec!["mis"]);
    assert!(!discrepancy.is_hard());
    assert!(output.success);
    assert_eq!(output.stats.grade_discrepancies, 1);
    assert_eq!(output.stats.late_registrations, 1);
    assert_eq!(output.stats.warnings, 1);
}

#[test]
fn test_structural_errors_fail_fast() {
    let config = GroupingConfig::default();

    let duplicated = vec![solo("a", 1), solo("a", 2)];
    let input = GroupingInput::new(&duplicated, &[], &config);
    assert!(matches!(
        run(&input),
        Err(GroupingError::DuplicateCamper { .. })
    ));

    let no_groups = GroupingConfig {
        num_groups: 0,
        ..GroupingConfig::default()
    };
    let campers = vec![solo("a", 1)];
    let input = GroupingInput::new(&campers, &[], &no_groups);
    assert!(matches!(run(&input), Err(GroupingError::NoGroups)));

    let overrides: BTreeMap<String, u32> = [("a".to_string(), 9u32)].into_iter().collect();
    let input = GroupingInput::new(&campers, &[], &config).with_overrides(overrides);
    assert!(matches!(
        run(&input),
        Err(GroupingError::UnknownGroup { group_id: 9, .. })
    ));

    let overrides: BTreeMap<String, u32> = [("ghost".to_string(), 1u32)].into_iter().collect();
    let input = GroupingInput::new(&campers, &[], &config).with_overrides(overrides);
    assert!(matches!(
        run(&input),
        Err(GroupingError::UnknownCamper { .. })
    ));
}

#[test]
fn test_empty_roster_runs_clean() {
    let config = GroupingConfig::default();
    let output = group_campers(&mut [], &config).unwrap();
    assert!(output.success);
    assert_eq!(output.groups.len(), 5);
    assert!(output.groups.iter().all(|g| g.is_empty()));
}

#[test]
fn test_output_serializes_for_sink() {
    let config = GroupingConfig::default();
    let mut campers = friend_chain("k", &[3; 15]);
    let output = group_campers(&mut campers, &config).unwrap();
    let json: serde_json::Value = serde_json::from_str(&output.to_json().unwrap()).unwrap();

    assert_eq!(json["success"], true);
    assert!(json["groups"][0]["camperCount"].is_null());
    assert_eq!(json["groups"][0]["members"].as_array().unwrap().len(), 12);
    let kinds: HashSet<&str> = json["violations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["type"].as_str().unwrap())
        .collect();
    assert!(kinds.contains("friend_group_split"));
}

// ============================================================================
// Stateful engine
// ============================================================================

fn engine_with_clean_roster() -> GroupingEngine {
    let mut engine = GroupingEngine::new(GroupingConfig::default());
    engine.load_campers(clean_roster(), NaiveDate::from_ymd_opt(2024, 6, 17).unwrap());
    engine
}

#[test]
fn test_engine_run_commits_assignments() {
    let mut engine = engine_with_clean_roster();
    let output = engine
        .run(RunTrigger::new("initial", Some("director")), false)
        .unwrap();

    assert_eq!(engine.groups(), output.groups.as_slice());
    assert!(engine.campers().iter().all(|c| c.assignment.is_some()));
    assert_eq!(engine.runs().len(), 1);
    let record = &engine.runs()[0];
    assert_eq!(record.camper_count, 10);
    assert!(record.success);
    assert!(!record.preserved_manual_overrides);
}

#[test]
fn test_engine_rerun_keeps_manual_moves() {
    let mut engine = engine_with_clean_roster();
    engine.run(RunTrigger::new("initial", None), false).unwrap();

    let moved = engine
        .move_camper("c0", 5, AssignmentType::Manual, "with sibling")
        .unwrap();
    assert_eq!(moved.to_group, 5);

    let output = engine.run(RunTrigger::new("rerun", None), true).unwrap();
    assert_eq!(output.group_of("c0").unwrap().number, 5);
    let record = output
        .assignments
        .iter()
        .find(|a| a.camper_id == "c0")
        .unwrap();
    assert_eq!(record.assignment_type, AssignmentType::Manual);
    assert_eq!(record.previous_group_id, Some(5));
    assert!(engine.runs()[1].preserved_manual_overrides);
}

#[test]
fn test_engine_insert_late_touches_one_group() {
    let mut engine = engine_with_clean_roster();
    engine.run(RunTrigger::new("initial", None), false).unwrap();
    let before = engine.groups().to_vec();

    let raw = RawCamper {
        athlete_id: "late".to_string(),
        first_name: "Lee".to_string(),
        last_name: "Late".to_string(),
        reported_grade: Some("2nd".to_string()),
        ..RawCamper::default()
    };
    let insertion = engine.insert_late(&raw).unwrap();
    assert!(insertion.violations.is_empty());

    let changed: Vec<u32> = engine
        .groups()
        .iter()
        .zip(&before)
        .filter(|(after, before)| after != before)
        .map(|(after, _)| after.number)
        .collect();
    assert_eq!(changed, vec![insertion.group_id]);
    assert_eq!(engine.campers().len(), 11);

    assert!(matches!(
        engine.insert_late(&raw),
        Err(GroupingError::DuplicateCamper { .. })
    ));
}

#[test]
fn test_engine_late_camper_dated_against_loaded_camp_start() {
    let mut engine = engine_with_clean_roster();
    engine.run(RunTrigger::new("initial", None), false).unwrap();

    let raw = RawCamper {
        athlete_id: "late".to_string(),
        first_name: "Lee".to_string(),
        last_name: "Late".to_string(),
        date_of_birth: Some("2014-03-02".to_string()),
        registered_at: Some(Utc.with_ymd_and_hms(2024, 6, 14, 12, 0, 0).unwrap()),
        ..RawCamper::default()
    };
    engine.insert_late(&raw).unwrap();

    let camper = engine.camper("late").unwrap();
    assert_eq!(camper.age_years, Some(10));
    assert_eq!(camper.age_months, Some(123));
    assert!(camper.is_late_registration, "three days before camp start");
}

#[test]
fn test_engine_requires_committed_groups() {
    let mut engine = engine_with_clean_roster();
    let raw = RawCamper {
        athlete_id: "late".to_string(),
        ..RawCamper::default()
    };
    assert!(matches!(engine.insert_late(&raw), Err(GroupingError::NoGroups)));
    assert!(matches!(
        engine.move_camper("ghost", 1, AssignmentType::Manual, "x"),
        Err(GroupingError::UnknownCamper { .. })
    ));
}
