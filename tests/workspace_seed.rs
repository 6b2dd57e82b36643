use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_trackerd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn trackerd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

#[test]
fn seed_replaces_existing_data_with_the_sample_set() {
    let workspace = temp_dir("trackerd-seed");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "ws",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    // Pre-existing data gets wiped by the seed.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "pre",
        "groups.create",
        json!({
            "teacherName": "Chanchal Sir",
            "groupNumber": 6,
            "branch": "CSE-B",
            "projectStack": "PHP",
            "projectIdea": "Before seed",
            "student1Name": "Temp One",
            "rollNo1": "21030199",
            "mobile1": "9000000099",
            "student2Name": "Temp Two",
            "rollNo2": "21030198",
            "mobile2": "9000000098"
        }),
    );

    let seeded = request_ok(&mut stdin, &mut reader, "s1", "workspace.seed", json!({}));
    let count = seeded["seeded"].as_i64().expect("seeded count");
    assert_eq!(count, 6);

    let listed = request_ok(&mut stdin, &mut reader, "l1", "groups.list", json!({}));
    let groups = listed["groups"].as_array().expect("groups");
    assert_eq!(groups.len() as i64, count);
    assert!(groups.iter().all(|g| g["projectIdea"] != "Before seed"));

    // The sample dataset is fixed; pin it row by row (default list order).
    let expected = [
        ("Chanchal Sir", 1, "CSE-B", "Sanjay Gupta", "Neha Joshi", 60),
        ("Chanchal Sir", 2, "CSE-B", "Rohan Das", "Kavya Nair", 20),
        ("Tayyab Sir", 1, "CSE-A", "Rahul Sharma", "Priya Patel", 75),
        ("Tayyab Sir", 2, "CSE-A", "Amit Kumar", "Sneha Reddy", 45),
        ("Vinay Sir", 1, "IT", "Vikram Singh", "Anjali Verma", 85),
        ("Vinay Sir", 2, "IT", "Arjun Mehta", "Divya Shah", 30),
    ];
    for (g, (teacher, number, branch, student1, student2, progress)) in
        groups.iter().zip(expected)
    {
        assert_eq!(g["teacherName"], teacher);
        assert_eq!(g["groupNumber"], number);
        assert_eq!(g["branch"], branch);
        assert_eq!(g["student1Name"], student1);
        assert_eq!(g["student2Name"], student2);
        assert_eq!(g["progress"], progress);
        assert!(g["mobile1"].as_str().expect("mobile1").len() == 10);
        assert!(g["rollNo1"].as_str().expect("rollNo1").len() == 8);
    }
    let vinay_one = &groups[4];
    assert_eq!(vinay_one["notes"], "Model training completed with 92% accuracy");
    assert_eq!(vinay_one["projectStack"], "Machine Learning");

    // Seeding again lands in the same state.
    let reseeded = request_ok(&mut stdin, &mut reader, "s2", "workspace.seed", json!({}));
    assert_eq!(reseeded["seeded"], seeded["seeded"]);
    let listed = request_ok(&mut stdin, &mut reader, "l2", "groups.list", json!({}));
    assert_eq!(listed["groups"].as_array().expect("groups").len() as i64, count);

    let stats = request_ok(&mut stdin, &mut reader, "d", "dashboard.stats", json!({}));
    assert_eq!(stats["totalGroups"], count);

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
