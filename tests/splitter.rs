//! Tests for splitter module

use std::collections::HashMap;

use campgroups::{split_friend_group, Camper, FriendGroup, GroupingConfig, GroupingError};

fn setup(grades: &[i32]) -> (Vec<Camper>, FriendGroup) {
    let config = GroupingConfig::default();
    let campers: Vec<Camper> = grades
        .iter()
        .enumerate()
        .map(|(i, g)| Camper::new(&format!("m{i:02}"), "M", "Test", *g))
        .collect();
    let ids = campers.iter().map(|c| c.athlete_id.clone()).collect();
    let group = FriendGroup::from_members(1, ids, grades, &config);
    (campers, group)
}

fn lookup(campers: &[Camper]) -> HashMap<&str, &Camper> {
    campers.iter().map(|c| (c.athlete_id.as_str(), c)).collect()
}

#[test]
fn test_small_group_unchanged() {
    let config = GroupingConfig::default();
    // Wide but small: splitting is for size only
    let (campers, group) = setup(&[0, 0, 5]);
    let parts = split_friend_group(&group, &lookup(&campers), &config).unwrap();
    assert_eq!(parts, vec![group.member_ids.clone()]);
}

#[test]
fn test_fifteen_same_grade_split_twelve_three() {
    let config = GroupingConfig::default();
    let (campers, group) = setup(&[3; 15]);
    let parts = split_friend_group(&group, &lookup(&campers), &config).unwrap();

    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0].len(), 12);
    assert_eq!(parts[1].len(), 3);
}

#[test]
fn test_split_is_grade_contiguous() {
    let config = GroupingConfig::default();
    let grades = [6, 0, 1, 2, 3, 4, 5, 6, 0, 1, 2, 3, 4, 5];
    let (campers, group) = setup(&grades);
    let by_id = lookup(&campers);
    let parts = split_friend_group(&group, &by_id, &config).unwrap();

    let mut total = 0;
    let mut last_max = i32::MIN;
    for part in &parts {
        let part_grades: Vec<i32> = part.iter().map(|id| by_id[id.as_str()].grade).collect();
        let min = *part_grades.iter().min().unwrap();
        let max = *part_grades.iter().max().unwrap();
        assert!(part.len() <= config.max_group_size);
        assert!(max - min <= config.max_grade_spread);
        assert!(min >= last_max, "parts overlap in grade");
        last_max = max;
        total += part.len();
    }
    assert_eq!(total, grades.len());
    // 0-2, 3-5, 6
    assert_eq!(parts.len(), 3);
}

#[test]
fn test_unknown_member_is_error() {
    let config = GroupingConfig::default();
    let (campers, group) = setup(&[3; 13]);
    let partial: HashMap<&str, &Camper> = campers[1..]
        .iter()
        .map(|c| (c.athlete_id.as_str(), c))
        .collect();
    let err = split_friend_group(&group, &partial, &config).unwrap_err();
    assert!(matches!(err, GroupingError::UnknownCamper { camper_id } if camper_id == "m00"));
}
