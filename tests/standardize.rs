//! Tests for standardize module

use chrono::{NaiveDate, TimeZone, Utc};
use campgroups::standardize::{
    calculate_age, grade_from_dob, has_grade_discrepancy, is_late_registration, normalize_name,
    parse_friend_requests, parse_grade, school_year_start, FALLBACK_GRADE,
};
use campgroups::{
    standardize, standardize_roster, FriendRequests, GroupingConfig, RawCamper, RosterEntry,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn camp_start() -> NaiveDate {
    date(2024, 6, 17)
}

fn raw(id: &str, first: &str, last: &str) -> RawCamper {
    RawCamper {
        athlete_id: id.to_string(),
        first_name: first.to_string(),
        last_name: last.to_string(),
        ..RawCamper::default()
    }
}

#[test]
fn test_parse_grade_forms() {
    assert_eq!(parse_grade("Pre-K"), Some(-1));
    assert_eq!(parse_grade("pk"), Some(-1));
    assert_eq!(parse_grade("K"), Some(0));
    assert_eq!(parse_grade("Kindergarten"), Some(0));
    assert_eq!(parse_grade("1st"), Some(1));
    assert_eq!(parse_grade("3rd grade"), Some(3));
    assert_eq!(parse_grade("Grade 4"), Some(4));
    assert_eq!(parse_grade("fifth"), Some(5));
    assert_eq!(parse_grade(" 12th "), Some(12));
    assert_eq!(parse_grade("7"), Some(7));
}

#[test]
fn test_parse_grade_rejects_garbage() {
    assert_eq!(parse_grade(""), None);
    assert_eq!(parse_grade("13th"), None);
    assert_eq!(parse_grade("0"), None);
    assert_eq!(parse_grade("senior"), None);
    assert_eq!(parse_grade("3xyz"), None);
}

#[test]
fn test_calculate_age_counts_whole_months() {
    // Birthday not yet reached this month
    assert_eq!(calculate_age(date(2015, 6, 20), camp_start()), (8, 107));
    // Birthday already reached
    assert_eq!(calculate_age(date(2015, 6, 10), camp_start()), (9, 108));
}

#[test]
fn test_school_year_start_uses_cutoff() {
    // June camp belongs to the school year that started the previous September
    assert_eq!(school_year_start(camp_start(), 9), date(2023, 9, 1));
    assert_eq!(school_year_start(date(2024, 10, 1), 9), date(2024, 9, 1));
}

#[test]
fn test_grade_from_dob() {
    // Age 8 on 2023-09-01 -> 3rd grade
    assert_eq!(grade_from_dob(date(2015, 3, 1), camp_start(), 9), 3);
    // Turned 6 on 2023-09-01 exactly -> 1st grade
    assert_eq!(grade_from_dob(date(2017, 9, 1), camp_start(), 9), 1);
    // Born after the cutoff date -> still 5 at year start -> K
    assert_eq!(grade_from_dob(date(2017, 9, 2), camp_start(), 9), 0);
}

#[test]
fn test_discrepancy_threshold() {
    assert!(!has_grade_discrepancy(3, 4, 1));
    assert!(has_grade_discrepancy(3, 5, 1));
    assert!(has_grade_discrepancy(3, 4, 0));
}

#[test]
fn test_late_registration_window() {
    let late = Utc.with_ymd_and_hms(2024, 6, 12, 9, 0, 0).unwrap();
    let early = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
    assert!(is_late_registration(late, camp_start(), 7));
    assert!(!is_late_registration(early, camp_start(), 7));
}

#[test]
fn test_friend_requests_split_and_normalized() {
    let text = FriendRequests::Text("Mia  Lopez, jake o'neil;\n  ; Sam".to_string());
    assert_eq!(
        parse_friend_requests(&text),
        vec!["mia lopez", "jake oneil", "sam"]
    );

    let list = FriendRequests::List(vec!["  ANA  ".to_string(), String::new()]);
    assert_eq!(parse_friend_requests(&list), vec!["ana"]);
    assert_eq!(normalize_name("Zoë-Grace  O'Hara"), "zoëgrace ohara");
}

#[test]
fn test_standardize_full_record() {
    let config = GroupingConfig::default();
    let mut camper = raw("a1", "Mia", "Lopez");
    camper.date_of_birth = Some("2015-03-01".to_string());
    camper.reported_grade = Some("3rd".to_string());
    camper.friend_requests = FriendRequests::Text("Sam Park".to_string());
    camper.registered_at = Some(Utc.with_ymd_and_hms(2024, 6, 14, 8, 0, 0).unwrap());

    let roster = vec![
        RosterEntry::from_raw(&camper),
        RosterEntry::new("b2", "Sam", "Park"),
    ];
    let result = standardize(&camper, camp_start(), &roster, &config);
    let c = &result.camper;

    assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    assert_eq!(c.grade, 3);
    assert_eq!(c.dob_grade, Some(3));
    assert!(!c.has_grade_discrepancy);
    assert_eq!(c.age_years, Some(9));
    assert_eq!(c.matched_friend_ids, vec!["b2"]);
    assert!(c.is_late_registration);
}

#[test]
fn test_standardize_flags_discrepancy() {
    let config = GroupingConfig::default();
    let mut camper = raw("a1", "Mia", "Lopez");
    camper.date_of_birth = Some("2015-03-01".to_string()); // computed grade 3
    camper.reported_grade = Some("5th".to_string());

    let result = standardize(&camper, camp_start(), &[], &config);
    assert_eq!(result.camper.grade, 5, "reported grade wins");
    assert!(result.camper.has_grade_discrepancy);
}

#[test]
fn test_bad_input_becomes_warnings() {
    let config = GroupingConfig::default();
    let mut camper = raw("a1", "Mia", "Lopez");
    camper.date_of_birth = Some("not a date".to_string());
    camper.reported_grade = Some("sophomore-ish".to_string());
    camper.friend_requests = FriendRequests::Text("Nobody Here".to_string());

    let result = standardize(&camper, camp_start(), &[], &config);
    assert_eq!(result.camper.grade, FALLBACK_GRADE);
    assert!(result.camper.date_of_birth.is_none());
    assert!(result.camper.matched_friend_ids.is_empty());
    assert_eq!(result.warnings.len(), 4, "{:?}", result.warnings);
}

#[test]
fn test_dob_only_uses_computed_grade() {
    let config = GroupingConfig::default();
    let mut camper = raw("a1", "Mia", "Lopez");
    camper.date_of_birth = Some("03/01/2013".to_string());

    let result = standardize(&camper, camp_start(), &[], &config);
    assert_eq!(result.camper.grade, 5);
    assert!(result.warnings.is_empty());
}

#[test]
fn test_standardize_is_idempotent() {
    let config = GroupingConfig::default();
    let mut camper = raw("a1", "Mia", "Lopez");
    camper.date_of_birth = Some("2015-03-01".to_string());
    camper.reported_grade = Some("third".to_string());
    let roster = vec![RosterEntry::from_raw(&camper)];

    let first = standardize(&camper, camp_start(), &roster, &config);
    let second = standardize(&camper, camp_start(), &roster, &config);
    assert_eq!(first, second);
}

#[test]
fn test_standardize_roster_resolves_mutual_requests() {
    let config = GroupingConfig::default();
    let mut a = raw("a1", "Mia", "Lopez");
    a.friend_requests = FriendRequests::Text("Sam Park".to_string());
    a.reported_grade = Some("2".to_string());
    let mut b = raw("b2", "Sam", "Park");
    b.friend_requests = FriendRequests::Text("Mia".to_string());
    b.reported_grade = Some("2".to_string());

    let (campers, warnings) = standardize_roster(&[a, b], camp_start(), &config);
    assert_eq!(campers[0].matched_friend_ids, vec!["b2"]);
    assert_eq!(campers[1].matched_friend_ids, vec!["a1"]);
    // Missing dates of birth only
    assert_eq!(warnings.len(), 2);
}
