mod support;

use predicates::str::contains;
use serde_json::Value;

use support::{tasker_cmd, TestDir};

fn json_output(dir: &TestDir, args: &[&str]) -> Result<Value, Box<dyn std::error::Error>> {
    let output = tasker_cmd(dir).arg("--json").args(args).output()?;
    assert!(
        output.status.success(),
        "command {args:?} failed: {}",
        String::from_utf8_lossy(&output.stdout)
    );
    Ok(serde_json::from_slice(&output.stdout)?)
}

#[test]
fn init_creates_data_files() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new()?;

    tasker_cmd(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(contains("initialized data directory"))
        .stdout(contains(format!("- dir: {}", dir.path().display())));

    assert_eq!(dir.read_file("data.json")?, "[]");
    assert_eq!(dir.read_file("auto_increment_tasks.txt")?, "0");
    assert!(dir.read_file("tasker.toml")?.contains("page_size = 6"));

    tasker_cmd(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(contains("nothing to do"));
    Ok(())
}

#[test]
fn add_then_show() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new()?;

    let created = json_output(
        &dir,
        &[
            "add",
            "Buy milk",
            "--category",
            "errands",
            "--deadline",
            "2030-01-01T09:00:00",
            "--priority",
            "low",
        ],
    )?;
    assert_eq!(created["schema_version"], "tasker.v1");
    assert_eq!(created["command"], "add");
    assert_eq!(created["data"]["id"], 1);
    assert_eq!(created["data"]["deadline"], "2030-01-01T09:00:00.000000");
    assert_eq!(created["data"]["priority"], "Low");
    assert_eq!(created["data"]["status"], false);

    let shown = json_output(&dir, &["show", "1"])?;
    assert_eq!(shown["data"]["title"], "Buy milk");
    assert_eq!(shown["data"]["category"], "errands");
    assert_eq!(shown["data"]["urgent"], false);

    tasker_cmd(&dir)
        .args(["show", "1"])
        .assert()
        .success()
        .stdout(contains("- Title: Buy milk"))
        .stdout(contains("- Priority: Low"));
    Ok(())
}

#[test]
fn add_with_short_due_is_flagged() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new()?;

    tasker_cmd(&dir)
        .args(["add", "Pay rent", "--due", "h2"])
        .assert()
        .success()
        .stdout(contains("SOS"));

    tasker_cmd(&dir)
        .args(["list"])
        .assert()
        .success()
        .stdout(contains("[open][High] 1 Pay rent (general, due "))
        .stdout(contains(" SOS"));

    tasker_cmd(&dir).args(["done", "1"]).assert().success();
    let listed = tasker_cmd(&dir).arg("list").output()?;
    assert!(!String::from_utf8(listed.stdout)?.contains("SOS"));
    Ok(())
}

#[test]
fn invalid_term_is_user_error() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new()?;

    tasker_cmd(&dir)
        .args(["add", "Later", "--due", "soon"])
        .assert()
        .code(2)
        .stderr(contains("invalid deadline term"));
    assert_eq!(dir.store().list_all()?.len(), 0);
    Ok(())
}

#[test]
fn list_pages_follow_config() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new()?;
    dir.write_config("page_size = 2\n")?;
    for title in ["a", "b", "c", "d", "e"] {
        tasker_cmd(&dir).args(["add", title]).assert().success();
    }

    let first = json_output(&dir, &["list"])?;
    assert_eq!(first["data"]["pages"], 3);
    assert_eq!(first["data"]["total"], 5);
    assert_eq!(first["data"]["tasks"].as_array().map(Vec::len), Some(2));
    assert_eq!(first["next_steps"][0], "tasker list --page 2");

    let last = json_output(&dir, &["list", "--page", "3"])?;
    assert_eq!(last["data"]["tasks"][0]["title"], "e");

    tasker_cmd(&dir)
        .args(["list", "--page", "4"])
        .assert()
        .code(2)
        .stderr(contains("page 4 is out of range"));
    Ok(())
}

#[test]
fn empty_list_has_one_page() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new()?;

    let listed = json_output(&dir, &["list"])?;
    assert_eq!(listed["data"]["page"], 1);
    assert_eq!(listed["data"]["pages"], 1);
    assert_eq!(listed["data"]["tasks"], Value::Array(Vec::new()));
    Ok(())
}

#[test]
fn list_filters() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new()?;
    tasker_cmd(&dir).args(["add", "one", "-c", "home"]).assert().success();
    tasker_cmd(&dir).args(["add", "two", "-c", "work"]).assert().success();
    tasker_cmd(&dir).args(["add", "three", "-c", "home"]).assert().success();
    tasker_cmd(&dir).args(["done", "3"]).assert().success();

    let incomplete = json_output(&dir, &["list", "--incomplete"])?;
    assert_eq!(incomplete["data"]["total"], 2);

    let home = json_output(&dir, &["list", "--category", "home"])?;
    let titles: Vec<_> = home["data"]["tasks"]
        .as_array()
        .expect("tasks")
        .iter()
        .map(|task| task["title"].clone())
        .collect();
    assert_eq!(titles, vec!["one", "three"]);
    Ok(())
}

#[test]
fn edit_changes_requested_fields() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new()?;
    tasker_cmd(&dir).args(["add", "Draft"]).assert().success();

    let edited = json_output(
        &dir,
        &[
            "edit",
            "1",
            "--title",
            "Final",
            "--priority",
            "Средний",
            "--deadline",
            "2031-06-01T12:30:00",
        ],
    )?;
    assert_eq!(edited["data"]["title"], "Final");
    assert_eq!(edited["data"]["priority"], "Средний");
    assert_eq!(edited["data"]["deadline"], "2031-06-01T12:30:00.000000");
    assert_eq!(edited["data"]["category"], "general");

    tasker_cmd(&dir)
        .args(["edit", "1"])
        .assert()
        .code(2)
        .stderr(contains("edit requires at least one"));

    tasker_cmd(&dir)
        .args(["edit", "9", "--title", "x"])
        .assert()
        .code(2)
        .stderr(contains("Task not found: 9"))
        .stderr(contains("hint: tasker list"));
    Ok(())
}

#[test]
fn done_and_reopen() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new()?;
    tasker_cmd(&dir).args(["add", "Laundry"]).assert().success();

    tasker_cmd(&dir)
        .args(["done", "1"])
        .assert()
        .success()
        .stdout(contains("Task completed"))
        .stdout(contains("- Status: done"));
    assert!(dir.store().get(1)?.status);

    let reopened = json_output(&dir, &["reopen", "1"])?;
    assert_eq!(reopened["command"], "reopen");
    assert_eq!(reopened["data"]["status"], false);
    Ok(())
}

#[test]
fn errands_through_the_cli() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new()?;
    tasker_cmd(&dir)
        .args(["add", "Buy milk", "--category", "errands"])
        .assert()
        .success();
    tasker_cmd(&dir)
        .args(["add", "Buy bread", "--category", "errands"])
        .assert()
        .success();

    tasker_cmd(&dir)
        .arg("categories")
        .assert()
        .success()
        .stdout(contains("errands (2 open / 2 total)"));

    let found = json_output(&dir, &["search", "buy"])?;
    assert_eq!(found["data"]["total"], 2);

    tasker_cmd(&dir)
        .args(["rm", "1"])
        .assert()
        .success()
        .stdout(contains("- Title: Buy milk"));

    let found = json_output(&dir, &["search", "BUY"])?;
    assert_eq!(found["data"]["total"], 1);
    assert_eq!(found["data"]["tasks"][0]["title"], "Buy bread");

    tasker_cmd(&dir).args(["rm", "1"]).assert().code(2);
    Ok(())
}

#[test]
fn json_errors_use_envelope() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new()?;

    let output = tasker_cmd(&dir).args(["--json", "show", "42"]).output()?;
    assert_eq!(output.status.code(), Some(2));
    let body: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(body["status"], "error");
    assert_eq!(body["command"], "show");
    assert_eq!(body["error"]["kind"], "user_error");
    assert_eq!(body["error"]["details"]["id"], 42);
    Ok(())
}

#[test]
fn corrupt_storage_fails_without_repair() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new()?;
    dir.write_file("data.json", "not json")?;

    tasker_cmd(&dir)
        .arg("list")
        .assert()
        .code(4)
        .stderr(contains("Storage file is corrupt"))
        .stderr(contains("fix or move"));
    assert_eq!(dir.read_file("data.json")?, "not json");
    Ok(())
}

#[test]
fn quiet_suppresses_human_output() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new()?;
    tasker_cmd(&dir)
        .args(["-q", "add", "silent"])
        .assert()
        .success()
        .stdout("");
    Ok(())
}

#[test]
fn data_dir_from_environment() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new()?;
    let mut cmd = assert_cmd::Command::cargo_bin("tasker")?;
    cmd.env("TASKER_DIR", dir.path())
        .env_remove("RUST_LOG")
        .args(["add", "from env"])
        .assert()
        .success();

    assert_eq!(dir.store().list_all()?[0].title, "from env");
    Ok(())
}
