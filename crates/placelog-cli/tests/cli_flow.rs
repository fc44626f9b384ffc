use std::path::PathBuf;
use std::process::{Command, Output};

use tempfile::TempDir;

fn bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_placelog"))
}

fn run(data_dir: &TempDir, args: &[&str]) -> Output {
    Command::new(bin())
        .args(args)
        .env("PLACELOG_DATA_DIR", data_dir.path())
        .output()
        .expect("run placelog")
}

fn run_ok(data_dir: &TempDir, args: &[&str]) -> String {
    let output = run(data_dir, args);
    assert!(
        output.status.success(),
        "placelog {:?} failed: stdout={}, stderr={}",
        args,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn json_array(stdout: &str) -> Vec<serde_json::Value> {
    let value: serde_json::Value = serde_json::from_str(stdout).expect("parse json output");
    value.as_array().expect("json array output").clone()
}

#[test]
fn test_cli_init_add_ls_show() {
    let dir = TempDir::new().expect("tempdir");

    let init = run_ok(&dir, &["init"]);
    assert!(init.contains("Initialized store"));

    run_ok(
        &dir,
        &[
            "place",
            "add",
            "Trattoria Da Mario",
            "--lat",
            "45.4642",
            "--lon",
            "9.19",
            "--rating",
            "4.5",
        ],
    );

    let listed = json_array(&run_ok(&dir, &["place", "ls", "--json"]));
    assert_eq!(listed.len(), 1);
    assert_eq!(
        listed[0].get("name").and_then(|v| v.as_str()),
        Some("Trattoria Da Mario")
    );
    assert_eq!(
        listed[0].get("overall_rating").and_then(|v| v.as_f64()),
        Some(4.5)
    );
    let place_id = listed[0]
        .get("id")
        .and_then(|v| v.as_str())
        .expect("place id")
        .to_string();

    let shown = run_ok(&dir, &["place", "show", &place_id]);
    assert!(shown.contains("Trattoria Da Mario"));
    assert!(shown.contains("45.4642"));
}

#[test]
fn test_cli_list_membership_flow() {
    let dir = TempDir::new().expect("tempdir");
    run_ok(&dir, &["init"]);

    run_ok(&dir, &["place", "add", "First", "--lat", "1", "--lon", "1"]);
    run_ok(&dir, &["place", "add", "Second", "--lat", "2", "--lon", "2"]);
    let places = json_array(&run_ok(&dir, &["place", "ls", "--json"]));
    let first_id = places[0].get("id").and_then(|v| v.as_str()).unwrap();
    let second_id = places[1].get("id").and_then(|v| v.as_str()).unwrap();

    run_ok(&dir, &["list", "new", "Milan", "--city", "Milan"]);
    let lists = json_array(&run_ok(&dir, &["list", "ls", "--json"]));
    let list_id = lists[0].get("id").and_then(|v| v.as_str()).unwrap();

    run_ok(&dir, &["list", "add", list_id, first_id]);
    run_ok(&dir, &["list", "add", list_id, second_id]);
    run_ok(&dir, &["list", "reorder", list_id, second_id, first_id]);

    let shown: serde_json::Value =
        serde_json::from_str(&run_ok(&dir, &["list", "show", list_id, "--json"]))
            .expect("parse list json");
    let members = shown
        .get("places")
        .and_then(|v| v.as_array())
        .expect("members array");
    assert_eq!(members.len(), 2);
    assert_eq!(
        members[0].get("place_id").and_then(|v| v.as_str()),
        Some(second_id)
    );

    run_ok(&dir, &["list", "rm", list_id]);
    let lists = json_array(&run_ok(&dir, &["list", "ls", "--json"]));
    assert!(lists.is_empty());
}

#[test]
fn test_cli_visit_and_dish_flow() {
    let dir = TempDir::new().expect("tempdir");
    run_ok(&dir, &["init"]);

    run_ok(&dir, &["place", "add", "Diner", "--lat", "0", "--lon", "0"]);
    let places = json_array(&run_ok(&dir, &["place", "ls", "--json"]));
    let place_id = places[0].get("id").and_then(|v| v.as_str()).unwrap();

    run_ok(&dir, &["visit", "log", place_id, "--notes", "Friday dinner"]);
    let visits = json_array(&run_ok(&dir, &["visit", "ls", place_id, "--json"]));
    assert_eq!(visits.len(), 1);
    let visit_id = visits[0].get("id").and_then(|v| v.as_str()).unwrap();

    run_ok(&dir, &["dish", "add", visit_id, "Carbonara", "--rating", "5"]);
    let dishes = json_array(&run_ok(&dir, &["dish", "ls", visit_id, "--json"]));
    assert_eq!(dishes.len(), 1);
    assert_eq!(dishes[0].get("rating").and_then(|v| v.as_i64()), Some(5));

    // Out-of-range ratings are rejected.
    let bad = run(&dir, &["dish", "add", visit_id, "Burnt", "--rating", "9"]);
    assert!(!bad.status.success());
    let stderr = String::from_utf8_lossy(&bad.stderr);
    assert!(stderr.contains("between 1 and 5"), "stderr: {}", stderr);
}

#[test]
fn test_cli_tag_duplicate_rejected() {
    let dir = TempDir::new().expect("tempdir");
    run_ok(&dir, &["init"]);

    run_ok(&dir, &["tag", "new", "Spicy"]);
    let duplicate = run(&dir, &["tag", "new", "spicy"]);
    assert!(!duplicate.status.success());
    let stderr = String::from_utf8_lossy(&duplicate.stderr);
    assert!(stderr.contains("already exists"), "stderr: {}", stderr);
}

#[test]
fn test_cli_category_ls_shows_defaults() {
    let dir = TempDir::new().expect("tempdir");
    run_ok(&dir, &["init"]);

    let categories = json_array(&run_ok(&dir, &["category", "ls", "--json"]));
    let names: Vec<&str> = categories
        .iter()
        .filter_map(|c| c.get("name").and_then(|v| v.as_str()))
        .collect();
    assert_eq!(
        names,
        vec!["Restaurant", "Café", "Bar", "Bakery", "Street Food", "Dessert"]
    );
}

#[test]
fn test_cli_quiet_suppresses_output() {
    let dir = TempDir::new().expect("tempdir");
    let output = run(&dir, &["--quiet", "init"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).trim().is_empty());
}

#[test]
fn test_cli_place_rm_is_idempotent_from_the_shell() {
    let dir = TempDir::new().expect("tempdir");
    run_ok(&dir, &["init"]);

    run_ok(&dir, &["place", "add", "Gone", "--lat", "0", "--lon", "0"]);
    let places = json_array(&run_ok(&dir, &["place", "ls", "--json"]));
    let place_id = places[0]
        .get("id")
        .and_then(|v| v.as_str())
        .unwrap()
        .to_string();

    run_ok(&dir, &["place", "rm", &place_id]);
    run_ok(&dir, &["place", "rm", &place_id]);
    let places = json_array(&run_ok(&dir, &["place", "ls", "--json"]));
    assert!(places.is_empty());
}
