use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::model;
use chrono::Utc;
use rusqlite::{params_from_iter, types::Value, Connection, OptionalExtension};
use serde_json::json;
use uuid::Uuid;

struct HandlerErr {
    code: &'static str,
    message: String,
    details: Option<serde_json::Value>,
}

impl HandlerErr {
    fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }

    fn validation(message: impl Into<String>) -> Self {
        HandlerErr {
            code: "validation",
            message: message.into(),
            details: None,
        }
    }

    fn db(code: &'static str, e: impl std::fmt::Display) -> Self {
        HandlerErr {
            code,
            message: e.to_string(),
            details: None,
        }
    }
}

fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    let s = params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .ok_or_else(|| HandlerErr::validation(format!("missing {}", key)))?;
    if s.is_empty() {
        return Err(HandlerErr::validation(format!("{} must not be empty", key)));
    }
    Ok(s)
}

fn get_required_int(params: &serde_json::Value, key: &str) -> Result<i64, HandlerErr> {
    let Some(v) = params.get(key).filter(|v| !v.is_null()) else {
        return Err(HandlerErr::validation(format!("missing {}", key)));
    };
    v.as_i64()
        .ok_or_else(|| HandlerErr::validation(format!("{} must be an integer", key)))
}

#[derive(Debug, Clone)]
struct GroupRow {
    id: String,
    teacher_name: String,
    group_number: i64,
    branch: String,
    project_stack: String,
    project_idea: String,
    student1_name: String,
    roll_no1: String,
    mobile1: String,
    student2_name: String,
    roll_no2: String,
    mobile2: String,
    progress: i64,
    notes: String,
    last_updated: String,
    created_at: String,
}

const GROUP_COLUMNS: &str = "id, teacher_name, group_number, branch, project_stack, project_idea,
     student1_name, roll_no1, mobile1, student2_name, roll_no2, mobile2,
     progress, notes, last_updated, created_at";

fn row_to_group(r: &rusqlite::Row<'_>) -> rusqlite::Result<GroupRow> {
    Ok(GroupRow {
        id: r.get(0)?,
        teacher_name: r.get(1)?,
        group_number: r.get(2)?,
        branch: r.get(3)?,
        project_stack: r.get(4)?,
        project_idea: r.get(5)?,
        student1_name: r.get(6)?,
        roll_no1: r.get(7)?,
        mobile1: r.get(8)?,
        student2_name: r.get(9)?,
        roll_no2: r.get(10)?,
        mobile2: r.get(11)?,
        progress: r.get(12)?,
        notes: r.get(13)?,
        last_updated: r.get(14)?,
        created_at: r.get(15)?,
    })
}

fn find_group(conn: &Connection, id: &str) -> Result<Option<GroupRow>, HandlerErr> {
    conn.query_row(
        &format!("SELECT {} FROM groups WHERE id = ?", GROUP_COLUMNS),
        [id],
        |r| row_to_group(r),
    )
    .optional()
    .map_err(|e| HandlerErr::db("db_query_failed", e))
}

fn load_history(conn: &Connection, group_id: &str) -> Result<Vec<serde_json::Value>, HandlerErr> {
    let mut stmt = conn
        .prepare(
            "SELECT progress, notes, updated_at FROM progress_history
             WHERE group_id = ? ORDER BY seq",
        )
        .map_err(|e| HandlerErr::db("db_query_failed", e))?;
    stmt.query_map([group_id], |r| {
        Ok(json!({
            "progress": r.get::<_, i64>(0)?,
            "notes": r.get::<_, String>(1)?,
            "updatedAt": r.get::<_, String>(2)?,
        }))
    })
    .and_then(|it| it.collect::<Result<Vec<_>, _>>())
    .map_err(|e| HandlerErr::db("db_query_failed", e))
}

fn group_json(conn: &Connection, g: &GroupRow) -> Result<serde_json::Value, HandlerErr> {
    let history = load_history(conn, &g.id)?;
    Ok(json!({
        "id": g.id,
        "teacherName": g.teacher_name,
        "groupNumber": g.group_number,
        "branch": g.branch,
        "projectStack": g.project_stack,
        "projectIdea": g.project_idea,
        "student1Name": g.student1_name,
        "rollNo1": g.roll_no1,
        "mobile1": g.mobile1,
        "student2Name": g.student2_name,
        "rollNo2": g.roll_no2,
        "mobile2": g.mobile2,
        "progress": g.progress,
        "notes": g.notes,
        "lastUpdated": g.last_updated,
        "createdAt": g.created_at,
        "progressHistory": history,
    }))
}

fn groups_list(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let mut clauses: Vec<String> = Vec::new();
    let mut binds: Vec<Value> = Vec::new();

    if let Some(teacher) = params.get("teacherName").and_then(|v| v.as_str()) {
        clauses.push("teacher_name = ?".to_string());
        binds.push(Value::Text(teacher.to_string()));
    }
    if let Some(branch) = params.get("branch").and_then(|v| v.as_str()) {
        clauses.push("branch = ?".to_string());
        binds.push(Value::Text(branch.to_string()));
    }
    if let Some(search) = params.get("search").and_then(|v| v.as_str()) {
        let needle = search.trim().to_lowercase();
        if !needle.is_empty() {
            // Escape LIKE metacharacters so a literal % or _ in the search
            // term does not widen the match.
            let escaped = needle.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
            let pattern = format!("%{}%", escaped);
            clauses.push(
                "(LOWER(student1_name) LIKE ? ESCAPE '\\' OR LOWER(student2_name) LIKE ? ESCAPE '\\')"
                    .to_string(),
            );
            binds.push(Value::Text(pattern.clone()));
            binds.push(Value::Text(pattern));
        }
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    let sql = format!(
        "SELECT {} FROM groups{} ORDER BY teacher_name, group_number",
        GROUP_COLUMNS, where_sql
    );

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| HandlerErr::db("db_query_failed", e))?;
    let rows = stmt
        .query_map(params_from_iter(binds.iter()), |r| row_to_group(r))
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(|e| HandlerErr::db("db_query_failed", e))?;

    let mut out = Vec::with_capacity(rows.len());
    for g in &rows {
        out.push(group_json(conn, g)?);
    }
    Ok(json!({ "groups": out }))
}

fn groups_get(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let id = get_required_str(params, "id")?;
    let Some(g) = find_group(conn, &id)? else {
        return Err(HandlerErr {
            code: "not_found",
            message: "group not found".to_string(),
            details: None,
        });
    };
    group_json(conn, &g).map(|g| json!({ "group": g }))
}

fn groups_create(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let teacher_name = get_required_str(params, "teacherName")?;
    let group_number = get_required_int(params, "groupNumber")?;
    let branch = get_required_str(params, "branch")?;
    let project_stack = get_required_str(params, "projectStack")?;
    let project_idea = get_required_str(params, "projectIdea")?;
    let student1_name = get_required_str(params, "student1Name")?;
    let roll_no1 = get_required_str(params, "rollNo1")?;
    let mobile1 = get_required_str(params, "mobile1")?;
    let student2_name = get_required_str(params, "student2Name")?;
    let roll_no2 = get_required_str(params, "rollNo2")?;
    let mobile2 = get_required_str(params, "mobile2")?;

    if !model::is_valid_mobile(&mobile1) || !model::is_valid_mobile(&mobile2) {
        return Err(HandlerErr::validation("Mobile numbers must be 10 digits"));
    }
    if !model::is_valid_roll_no(&roll_no1) || !model::is_valid_roll_no(&roll_no2) {
        return Err(HandlerErr::validation("Roll numbers must be 8 digits"));
    }
    if !model::is_known_teacher(&teacher_name) {
        return Err(HandlerErr::validation(format!(
            "unknown teacher: {}",
            teacher_name
        )));
    }
    if !model::is_known_branch(&branch) {
        return Err(HandlerErr::validation(format!("unknown branch: {}", branch)));
    }

    let duplicate = conn
        .query_row(
            "SELECT 1 FROM groups WHERE teacher_name = ? AND group_number = ?",
            (&teacher_name, &group_number),
            |r| r.get::<_, i64>(0),
        )
        .optional()
        .map_err(|e| HandlerErr::db("db_query_failed", e))?
        .is_some();
    if duplicate {
        return Err(HandlerErr {
            code: "conflict",
            message: format!("Group {} already exists for {}", group_number, teacher_name),
            details: None,
        });
    }

    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM groups WHERE teacher_name = ?",
            [&teacher_name],
            |r| r.get(0),
        )
        .map_err(|e| HandlerErr::db("db_query_failed", e))?;
    if count >= model::MAX_GROUPS_PER_TEACHER {
        return Err(HandlerErr {
            code: "capacity",
            message: format!(
                "{} already has maximum {} groups",
                teacher_name,
                model::MAX_GROUPS_PER_TEACHER
            ),
            details: None,
        });
    }

    // Range-checked last, mirroring the store-side schema validation this
    // replaces: a teacher already at capacity reports `capacity` even when
    // the requested number is outside 1..=6.
    if !model::is_valid_group_number(group_number) {
        return Err(HandlerErr::validation("groupNumber must be between 1 and 6"));
    }

    let id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();
    let insert = conn.execute(
        "INSERT INTO groups(
            id, teacher_name, group_number, branch, project_stack, project_idea,
            student1_name, roll_no1, mobile1, student2_name, roll_no2, mobile2,
            progress, notes, last_updated, created_at
         ) VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, 'Group created', ?, ?)",
        rusqlite::params![
            id,
            teacher_name,
            group_number,
            branch,
            project_stack,
            project_idea,
            student1_name,
            roll_no1,
            mobile1,
            student2_name,
            roll_no2,
            mobile2,
            now,
            now,
        ],
    );
    if let Err(e) = insert {
        // The UNIQUE(teacher_name, group_number) constraint backstops racing
        // creations; of two attempts for one slot exactly one lands here.
        if let rusqlite::Error::SqliteFailure(f, _) = &e {
            if f.code == rusqlite::ErrorCode::ConstraintViolation {
                return Err(HandlerErr {
                    code: "conflict",
                    message: format!(
                        "Group {} already exists for {}",
                        group_number, teacher_name
                    ),
                    details: None,
                });
            }
        }
        return Err(HandlerErr::db("db_insert_failed", e));
    }

    let Some(g) = find_group(conn, &id)? else {
        return Err(HandlerErr::db("db_query_failed", "created group vanished"));
    };
    group_json(conn, &g).map(|g| json!({ "group": g }))
}

fn groups_update(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let id = get_required_str(params, "id")?;

    let progress = match params.get("progress") {
        None | Some(serde_json::Value::Null) => None,
        Some(v) => {
            let p = v
                .as_i64()
                .ok_or_else(|| HandlerErr::validation("progress must be an integer"))?;
            if !model::is_valid_progress(p) {
                return Err(HandlerErr::validation("progress must be between 0 and 100"));
            }
            Some(p)
        }
    };
    let notes = params
        .get("notes")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .filter(|s| !s.trim().is_empty());

    let Some(group) = find_group(conn, &id)? else {
        return Err(HandlerErr {
            code: "not_found",
            message: "group not found".to_string(),
            details: None,
        });
    };

    let now = Utc::now().to_rfc3339();
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| HandlerErr::db("db_tx_failed", e))?;

    // History records only updates carrying both a progress value and notes.
    // A progress-only update moves the snapshot without leaving a trail; the
    // chart consumers depend on history staying a notes-bearing subsequence.
    if let (Some(p), Some(n)) = (progress, notes.as_deref()) {
        let next_seq: i64 = tx
            .query_row(
                "SELECT COALESCE(MAX(seq), -1) + 1 FROM progress_history WHERE group_id = ?",
                [&id],
                |r| r.get(0),
            )
            .map_err(|e| HandlerErr::db("db_query_failed", e))?;
        tx.execute(
            "INSERT INTO progress_history(id, group_id, seq, progress, notes, updated_at)
             VALUES(?, ?, ?, ?, ?, ?)",
            rusqlite::params![Uuid::new_v4().to_string(), id, next_seq, p, n, now],
        )
        .map_err(|e| HandlerErr::db("db_insert_failed", e))?;
    }

    let new_progress = progress.unwrap_or(group.progress);
    let new_notes = notes.unwrap_or(group.notes);
    tx.execute(
        "UPDATE groups SET progress = ?, notes = ?, last_updated = ? WHERE id = ?",
        rusqlite::params![new_progress, new_notes, now, id],
    )
    .map_err(|e| HandlerErr::db("db_update_failed", e))?;

    tx.commit()
        .map_err(|e| HandlerErr::db("db_commit_failed", e))?;

    let Some(g) = find_group(conn, &id)? else {
        return Err(HandlerErr::db("db_query_failed", "updated group vanished"));
    };
    group_json(conn, &g).map(|g| json!({ "group": g }))
}

fn groups_delete(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let id = get_required_str(params, "id")?;
    if find_group(conn, &id)?.is_none() {
        return Err(HandlerErr {
            code: "not_found",
            message: "group not found".to_string(),
            details: None,
        });
    }

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| HandlerErr::db("db_tx_failed", e))?;
    tx.execute("DELETE FROM progress_history WHERE group_id = ?", [&id])
        .map_err(|e| HandlerErr::db("db_delete_failed", e))?;
    tx.execute("DELETE FROM groups WHERE id = ?", [&id])
        .map_err(|e| HandlerErr::db("db_delete_failed", e))?;
    tx.commit()
        .map_err(|e| HandlerErr::db("db_commit_failed", e))?;

    Ok(json!({ "deleted": id }))
}

fn with_db(
    state: &mut AppState,
    req: &Request,
    f: impl FnOnce(&Connection, &serde_json::Value) -> Result<serde_json::Value, HandlerErr>,
) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match f(conn, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "groups.list" => Some(with_db(state, req, groups_list)),
        "groups.get" => Some(with_db(state, req, groups_get)),
        "groups.create" => Some(with_db(state, req, groups_create)),
        "groups.update" => Some(with_db(state, req, groups_update)),
        "groups.delete" => Some(with_db(state, req, groups_delete)),
        _ => None,
    }
}
