use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::stats::{self, GroupSnapshot};
use chrono::{DateTime, Utc};
use rusqlite::Connection;

fn load_snapshots(conn: &Connection) -> Result<Vec<GroupSnapshot>, String> {
    let mut stmt = conn
        .prepare("SELECT teacher_name, progress, last_updated FROM groups")
        .map_err(|e| e.to_string())?;
    let rows = stmt
        .query_map([], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, i64>(1)?,
                r.get::<_, String>(2)?,
            ))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(|e| e.to_string())?;

    let mut snapshots = Vec::with_capacity(rows.len());
    for (teacher_name, progress, last_updated) in rows {
        let last_updated = DateTime::parse_from_rfc3339(&last_updated)
            .map_err(|e| format!("bad last_updated timestamp: {}", e))?
            .with_timezone(&Utc);
        snapshots.push(GroupSnapshot {
            teacher_name,
            progress,
            last_updated,
        });
    }
    Ok(snapshots)
}

fn handle_dashboard_stats(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let snapshots = match load_snapshots(conn) {
        Ok(v) => v,
        Err(message) => return err(&req.id, "db_query_failed", message, None),
    };
    let computed = stats::dashboard_stats(&snapshots, Utc::now());
    match serde_json::to_value(&computed) {
        Ok(v) => ok(&req.id, v),
        Err(e) => err(&req.id, "internal", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "dashboard.stats" => Some(handle_dashboard_stats(state, req)),
        _ => None,
    }
}
