use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::model;
use rusqlite::Connection;
use serde_json::json;

fn group_count(conn: &Connection, teacher: &str) -> Result<i64, rusqlite::Error> {
    conn.query_row(
        "SELECT COUNT(*) FROM groups WHERE teacher_name = ?",
        [teacher],
        |r| r.get(0),
    )
}

fn teacher_groups(conn: &Connection, teacher: &str) -> Result<Vec<serde_json::Value>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT id, group_number, branch, project_stack, project_idea,
                student1_name, student2_name, progress, notes, last_updated
         FROM groups WHERE teacher_name = ? ORDER BY group_number",
    )?;
    stmt.query_map([teacher], |r| {
        Ok(json!({
            "id": r.get::<_, String>(0)?,
            "groupNumber": r.get::<_, i64>(1)?,
            "branch": r.get::<_, String>(2)?,
            "projectStack": r.get::<_, String>(3)?,
            "projectIdea": r.get::<_, String>(4)?,
            "student1Name": r.get::<_, String>(5)?,
            "student2Name": r.get::<_, String>(6)?,
            "progress": r.get::<_, i64>(7)?,
            "notes": r.get::<_, String>(8)?,
            "lastUpdated": r.get::<_, String>(9)?,
        }))
    })
    .and_then(|it| it.collect::<Result<Vec<_>, _>>())
}

fn handle_teachers_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let mut out = Vec::with_capacity(model::TEACHERS.len());
    for name in model::TEACHERS {
        match group_count(conn, name) {
            Ok(count) => out.push(json!({ "name": name, "groupCount": count })),
            Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
        }
    }
    ok(&req.id, json!({ "teachers": out }))
}

fn handle_teachers_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(name) = req.params.get("name").and_then(|v| v.as_str()) else {
        return err(&req.id, "validation", "missing params.name", None);
    };
    if !model::is_known_teacher(name) {
        return err(&req.id, "not_found", "teacher not found", None);
    }
    match teacher_groups(conn, name) {
        Ok(groups) => ok(
            &req.id,
            json!({
                "teacher": { "name": name, "groupCount": groups.len() },
                "groups": groups,
            }),
        ),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "teachers.list" => Some(handle_teachers_list(state, req)),
        "teachers.get" => Some(handle_teachers_get(state, req)),
        _ => None,
    }
}
