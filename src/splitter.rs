//! Splitting friend groups that cannot be placed whole.
//!
//! Members are bucketed by grade and walked in ascending grade order,
//! accumulating into a running sub-cluster. A new sub-cluster starts whenever
//! the next member would overflow the size limit or stretch the running
//! grade spread past the maximum.
//!
//! This is a greedy pass with no look-ahead. Sub-clusters are always
//! grade-contiguous and within limits, but there may be more of them than a
//! minimal split would produce.

use std::collections::{BTreeMap, HashMap};

use crate::error::OptionExt;
use crate::{Camper, CamperId, FriendGroup, GroupingConfig, Result};

/// Split `group` into size- and spread-bounded sub-clusters.
///
/// Groups that already fit the size limit are returned unchanged as a
/// single sub-cluster.
pub fn split_friend_group(
    group: &FriendGroup,
    campers: &HashMap<&str, &Camper>,
    config: &GroupingConfig,
) -> Result<Vec<Vec<CamperId>>> {
    if group.member_count() <= config.max_group_size {
        return Ok(vec![group.member_ids.clone()]);
    }

    let mut by_grade: BTreeMap<i32, Vec<&CamperId>> = BTreeMap::new();
    for id in &group.member_ids {
        let camper = campers.get(id.as_str()).ok_or_unknown_camper(id)?;
        by_grade.entry(camper.grade).or_default().push(id);
    }

    let mut subgroups: Vec<Vec<CamperId>> = Vec::new();
    let mut current: Vec<CamperId> = Vec::new();
    let mut current_min: Option<i32> = None;

    for (grade, ids) in by_grade {
        for id in ids {
            let too_big = current.len() + 1 > config.max_group_size;
            let too_wide = current_min.map_or(false, |min| grade - min > config.max_grade_spread);
            if !current.is_empty() && (too_big || too_wide) {
                subgroups.push(std::mem::take(&mut current));
                current_min = None;
            }
            if current_min.is_none() {
                current_min = Some(grade);
            }
            current.push(id.clone());
        }
    }
    if !current.is_empty() {
        subgroups.push(current);
    }

    Ok(subgroups)
}
