use chrono::Utc;
use rusqlite::Connection;
use std::path::Path;
use uuid::Uuid;

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("tracker.sqlite3");
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS groups(
            id TEXT PRIMARY KEY,
            teacher_name TEXT NOT NULL,
            group_number INTEGER NOT NULL,
            branch TEXT NOT NULL,
            project_stack TEXT NOT NULL,
            project_idea TEXT NOT NULL,
            student1_name TEXT NOT NULL,
            roll_no1 TEXT NOT NULL,
            mobile1 TEXT NOT NULL,
            student2_name TEXT NOT NULL,
            roll_no2 TEXT NOT NULL,
            mobile2 TEXT NOT NULL,
            progress INTEGER NOT NULL DEFAULT 0,
            notes TEXT NOT NULL DEFAULT '',
            last_updated TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE(teacher_name, group_number)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_groups_teacher ON groups(teacher_name)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_groups_branch ON groups(branch)",
        [],
    )?;

    // History rows keep a per-group sequence so insertion order survives
    // any vacuum/rowid churn.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS progress_history(
            id TEXT PRIMARY KEY,
            group_id TEXT NOT NULL,
            seq INTEGER NOT NULL,
            progress INTEGER NOT NULL,
            notes TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(group_id) REFERENCES groups(id),
            UNIQUE(group_id, seq)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_progress_history_group ON progress_history(group_id)",
        [],
    )?;

    Ok(conn)
}

struct SeedGroup {
    teacher_name: &'static str,
    group_number: i64,
    branch: &'static str,
    project_stack: &'static str,
    project_idea: &'static str,
    student1_name: &'static str,
    roll_no1: &'static str,
    mobile1: &'static str,
    student2_name: &'static str,
    roll_no2: &'static str,
    mobile2: &'static str,
    progress: i64,
    notes: &'static str,
}

const SEED_GROUPS: &[SeedGroup] = &[
    SeedGroup {
        teacher_name: "Tayyab Sir",
        group_number: 1,
        branch: "CSE-A",
        project_stack: "MERN Stack",
        project_idea: "E-commerce Platform with AI-powered recommendations",
        student1_name: "Rahul Sharma",
        roll_no1: "21010101",
        mobile1: "9876543210",
        student2_name: "Priya Patel",
        roll_no2: "21010102",
        mobile2: "9876543211",
        progress: 75,
        notes: "Backend APIs completed, working on frontend integration",
    },
    SeedGroup {
        teacher_name: "Tayyab Sir",
        group_number: 2,
        branch: "CSE-A",
        project_stack: "React Native",
        project_idea: "Mobile app for campus event management",
        student1_name: "Amit Kumar",
        roll_no1: "21010103",
        mobile1: "9876543212",
        student2_name: "Sneha Reddy",
        roll_no2: "21010104",
        mobile2: "9876543213",
        progress: 45,
        notes: "UI design completed, starting development",
    },
    SeedGroup {
        teacher_name: "Vinay Sir",
        group_number: 1,
        branch: "IT",
        project_stack: "Machine Learning",
        project_idea: "Student Performance Prediction System using ML",
        student1_name: "Vikram Singh",
        roll_no1: "21020101",
        mobile1: "9876543214",
        student2_name: "Anjali Verma",
        roll_no2: "21020102",
        mobile2: "9876543215",
        progress: 85,
        notes: "Model training completed with 92% accuracy",
    },
    SeedGroup {
        teacher_name: "Vinay Sir",
        group_number: 2,
        branch: "IT",
        project_stack: "Python + Flask",
        project_idea: "Automated Attendance System with Face Recognition",
        student1_name: "Arjun Mehta",
        roll_no1: "21020103",
        mobile1: "9876543216",
        student2_name: "Divya Shah",
        roll_no2: "21020104",
        mobile2: "9876543217",
        progress: 30,
        notes: "Face detection module in progress",
    },
    SeedGroup {
        teacher_name: "Chanchal Sir",
        group_number: 1,
        branch: "CSE-B",
        project_stack: "MERN Stack",
        project_idea: "Online Food Ordering System with Real-time Tracking",
        student1_name: "Sanjay Gupta",
        roll_no1: "21030101",
        mobile1: "9876543218",
        student2_name: "Neha Joshi",
        roll_no2: "21030102",
        mobile2: "9876543219",
        progress: 60,
        notes: "Payment gateway integration completed",
    },
    SeedGroup {
        teacher_name: "Chanchal Sir",
        group_number: 2,
        branch: "CSE-B",
        project_stack: "Django + React",
        project_idea: "Hospital Management System with appointment scheduling",
        student1_name: "Rohan Das",
        roll_no1: "21030103",
        mobile1: "9876543220",
        student2_name: "Kavya Nair",
        roll_no2: "21030104",
        mobile2: "9876543221",
        progress: 20,
        notes: "Database schema design completed",
    },
];

/// Demo seed: wipes all groups and loads the sample dataset.
pub fn seed_sample_data(conn: &Connection) -> anyhow::Result<usize> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM progress_history", [])?;
    tx.execute("DELETE FROM groups", [])?;

    let now = Utc::now().to_rfc3339();
    for g in SEED_GROUPS {
        tx.execute(
            "INSERT INTO groups(
                id, teacher_name, group_number, branch, project_stack, project_idea,
                student1_name, roll_no1, mobile1, student2_name, roll_no2, mobile2,
                progress, notes, last_updated, created_at
             ) VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            rusqlite::params![
                Uuid::new_v4().to_string(),
                g.teacher_name,
                g.group_number,
                g.branch,
                g.project_stack,
                g.project_idea,
                g.student1_name,
                g.roll_no1,
                g.mobile1,
                g.student2_name,
                g.roll_no2,
                g.mobile2,
                g.progress,
                g.notes,
                now,
                now,
            ],
        )?;
    }
    tx.commit()?;
    Ok(SEED_GROUPS.len())
}
