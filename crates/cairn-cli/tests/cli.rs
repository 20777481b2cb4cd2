use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::{tempdir, TempDir};

const REVERSIBLE: &str = r#"
[[up]]
op = "set"
collection = "users"
id = "ada"
data = { name = "Ada" }

[[down]]
op = "delete"
collection = "users"
id = "ada"
"#;

const IRREVERSIBLE: &str = r#"{
    "execute": [
        { "op": "merge", "collection": "indexes", "id": "users", "data": { "email": 1 } }
    ]
}"#;

/// A `cairn` invocation isolated inside a temporary working directory
fn cairn(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("cairn").unwrap();
    cmd.current_dir(dir.path())
        .env("CAIRN_CONFIG", dir.path().join("config.toml"))
        .env_remove("CAIRN_DATABASE")
        .env_remove("CAIRN_BACKEND")
        .env_remove("RUST_LOG");
    cmd
}

fn write_migration(dir: &TempDir, name: &str, content: &str) {
    let migrations = dir.path().join("migrations");
    std::fs::create_dir_all(&migrations).unwrap();
    std::fs::write(migrations.join(name), content).unwrap();
}

fn migration_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_help() {
    Command::cargo_bin("cairn")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("revert"));
}

#[test]
fn test_generate_then_run_and_list() {
    let dir = tempdir().unwrap();

    cairn(&dir)
        .args(["generate", "add-users"])
        .assert()
        .success()
        .stdout(predicate::str::contains("New migration file created"));

    let names = migration_names(&dir.path().join("migrations"));
    assert_eq!(names.len(), 1);
    assert!(names[0].ends_with("-add-users.toml"), "{:?}", names);

    cairn(&dir)
        .arg("ls")
        .assert()
        .success()
        .stdout(predicate::str::contains("-add-users.toml"));

    cairn(&dir)
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Using: cairn.redb"))
        .stdout(predicate::str::contains("executed."))
        .stdout(predicate::str::contains("Executed 1 migration."));

    cairn(&dir)
        .arg("ls")
        .assert()
        .success()
        .stdout(predicate::str::contains("add-users").not());

    cairn(&dir)
        .args(["ls", "--executed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("-add-users.toml"));

    // Nothing left to do the second time
    cairn(&dir)
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Executed 0 migrations."));
}

#[test]
fn test_generate_json_irreversible() {
    let dir = tempdir().unwrap();

    cairn(&dir)
        .args(["generate", "reindex", "--irreversible", "--ext", "json", "--tabs", "2"])
        .assert()
        .success();

    let migrations = dir.path().join("migrations");
    let names = migration_names(&migrations);
    assert!(names[0].ends_with("-reindex.json"));
    let content = std::fs::read_to_string(migrations.join(&names[0])).unwrap();
    assert_eq!(content, "{\n  \"execute\": []\n}\n");
}

#[test]
fn test_generate_clone() {
    let dir = tempdir().unwrap();
    write_migration(&dir, "1000-addIndex.json", IRREVERSIBLE);

    cairn(&dir)
        .args(["generate", "addIndexAgain", "--clone", "addIndex"])
        .assert()
        .success()
        .stdout(predicate::str::contains("New migration clone created"));

    let migrations = dir.path().join("migrations");
    let names = migration_names(&migrations);
    assert_eq!(names.len(), 2);
    let clone = names.iter().find(|n| n.ends_with("-addIndexAgain.json")).unwrap();
    assert_eq!(std::fs::read_to_string(migrations.join(clone)).unwrap(), IRREVERSIBLE);

    cairn(&dir)
        .args(["generate", "other", "--clone", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Migration not found: missing"));
}

#[test]
fn test_irreversible_revert_fails() {
    let dir = tempdir().unwrap();
    write_migration(&dir, "1000-init.toml", REVERSIBLE);
    write_migration(&dir, "2000-addIndex.json", IRREVERSIBLE);

    cairn(&dir)
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Migration 1000-init.toml executed."))
        .stdout(predicate::str::contains("Migration 2000-addIndex.json executed."))
        .stdout(predicate::str::contains("Executed 2 migrations."));

    cairn(&dir)
        .args(["revert", "2000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("2000-addIndex.json"))
        .stderr(predicate::str::contains("irreversible"));

    // Both still executed
    cairn(&dir)
        .args(["ls", "-E"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1000-init.toml"))
        .stdout(predicate::str::contains("2000-addIndex.json"));

    cairn(&dir)
        .args(["revert", "1000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Migration 1000-init.toml reverted."))
        .stdout(predicate::str::contains("Reverted 1 migration."));

    cairn(&dir)
        .arg("ls")
        .assert()
        .success()
        .stdout(predicate::str::contains("1000-init.toml"))
        .stdout(predicate::str::contains("2000-addIndex.json").not());
}

#[test]
fn test_dry_run_changes_nothing() {
    let dir = tempdir().unwrap();
    write_migration(&dir, "1000-init.toml", REVERSIBLE);

    cairn(&dir)
        .args(["run", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Migration 1000-init.toml would be executed."))
        .stdout(predicate::str::contains("Dry run: Executed 1 migration."));

    cairn(&dir)
        .arg("ls")
        .assert()
        .success()
        .stdout(predicate::str::contains("1000-init.toml"));
}

#[test]
fn test_unknown_name_fails() {
    let dir = tempdir().unwrap();
    write_migration(&dir, "1000-init.toml", REVERSIBLE);

    cairn(&dir)
        .args(["run", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Migration not found: nope"));

    cairn(&dir)
        .args(["revert", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Migration not found: nope"));
}

#[test]
fn test_malformed_file_name_fails() {
    let dir = tempdir().unwrap();
    write_migration(&dir, "1000-init.toml", REVERSIBLE);
    write_migration(&dir, "2000-.toml", REVERSIBLE);

    cairn(&dir)
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Malformed migration file name: 2000-.toml"));
}

#[test]
fn test_unrelated_files_are_ignored() {
    let dir = tempdir().unwrap();
    write_migration(&dir, "1000-init.toml", REVERSIBLE);
    write_migration(&dir, "seed-data-v1-final.json", "{}");
    write_migration(&dir, "README.md", "notes");

    cairn(&dir)
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Executed 1 migration."));

    cairn(&dir)
        .args(["ls", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1000-init.toml"))
        .stdout(predicate::str::contains("seed-data").not());
}

#[test]
fn test_custom_collection_and_json_output() {
    let dir = tempdir().unwrap();
    write_migration(&dir, "1000-init.toml", REVERSIBLE);

    cairn(&dir)
        .args(["run", "--collection", "changelog", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"count\": 1"))
        .stdout(predicate::str::contains("\"type\": \"reversible\""));

    // The default collection has no record of it
    cairn(&dir)
        .arg("ls")
        .assert()
        .success()
        .stdout(predicate::str::contains("1000-init.toml"));

    cairn(&dir)
        .args(["ls", "--collection", "changelog", "--all", "--long"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1000-init.toml  reversible"));
}

#[test]
fn test_config_file_drives_defaults() {
    let dir = tempdir().unwrap();

    cairn(&dir)
        .args(["config", "set", "path", "db/migrations"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set path = db/migrations"));

    cairn(&dir)
        .args(["config", "get", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("db/migrations"));

    cairn(&dir)
        .args(["config", "set", "backend", "postgres"])
        .assert()
        .failure();

    cairn(&dir).args(["generate", "init"]).assert().success();
    assert_eq!(migration_names(&dir.path().join("db").join("migrations")).len(), 1);

    cairn(&dir)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn test_broken_config_can_be_replaced() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "path = [").unwrap();

    cairn(&dir)
        .arg("ls")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid config file"));

    cairn(&dir)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));

    cairn(&dir)
        .args(["config", "init", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config file"));

    cairn(&dir)
        .args(["config", "get", "collection"])
        .assert()
        .success()
        .stdout(predicate::str::contains("migrations"));

    cairn(&dir).arg("ls").assert().success();
}

#[test]
fn test_completions() {
    let dir = tempdir().unwrap();
    cairn(&dir)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cairn"));
}
