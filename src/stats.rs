use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::model;

/// Progress below this counts toward the low-progress bucket.
pub const LOW_PROGRESS_THRESHOLD: i64 = 40;

/// A group goes stale once its last update is strictly older than this.
pub const STALE_AFTER_DAYS: i64 = 7;

/// The slice of a group the dashboard needs.
#[derive(Debug, Clone)]
pub struct GroupSnapshot {
    pub teacher_name: String,
    pub progress: i64,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeacherStat {
    pub name: String,
    pub count: i64,
    pub avg_progress: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_groups: i64,
    pub avg_progress: i64,
    pub low_progress_groups: i64,
    pub stale_groups: i64,
    pub teacher_stats: Vec<TeacherStat>,
}

/// Mean rounded to the nearest integer; 0 for an empty set.
fn rounded_mean(sum: i64, count: usize) -> i64 {
    if count == 0 {
        return 0;
    }
    ((sum as f64) / (count as f64)).round() as i64
}

pub fn is_stale(last_updated: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    last_updated < now - Duration::days(STALE_AFTER_DAYS)
}

/// Full-collection rollup, recomputed from scratch on every call.
/// Every enumerated teacher appears in `teacher_stats`, zero groups included.
pub fn dashboard_stats(groups: &[GroupSnapshot], now: DateTime<Utc>) -> DashboardStats {
    let total_groups = groups.len() as i64;
    let progress_sum: i64 = groups.iter().map(|g| g.progress).sum();
    let low_progress_groups = groups
        .iter()
        .filter(|g| g.progress < LOW_PROGRESS_THRESHOLD)
        .count() as i64;
    let stale_groups = groups
        .iter()
        .filter(|g| is_stale(g.last_updated, now))
        .count() as i64;

    let teacher_stats = model::TEACHERS
        .iter()
        .map(|name| {
            let theirs: Vec<&GroupSnapshot> =
                groups.iter().filter(|g| g.teacher_name == *name).collect();
            let sum: i64 = theirs.iter().map(|g| g.progress).sum();
            TeacherStat {
                name: name.to_string(),
                count: theirs.len() as i64,
                avg_progress: rounded_mean(sum, theirs.len()),
            }
        })
        .collect();

    DashboardStats {
        total_groups,
        avg_progress: rounded_mean(progress_sum, groups.len()),
        low_progress_groups,
        stale_groups,
        teacher_stats,
    }
}
