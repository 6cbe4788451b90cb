use assert_cmd::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_shows_usage() {
    cargo_bin_cmd!("playhead")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("listening position"));
}

#[test]
fn test_version_shows_version() {
    cargo_bin_cmd!("playhead")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("playhead"));
}

#[test]
fn test_commands_require_sign_in() {
    let home = tempfile::tempdir().expect("create temp home");

    for command in ["list", "save", "devices", "export"] {
        cargo_bin_cmd!("playhead")
            .env("PLAYHEAD_HOME", home.path())
            .env_remove("PLAYHEAD_CLIENT_ID")
            .env_remove("PLAYHEAD_CLIENT_SECRET")
            .arg(command)
            .assert()
            .failure()
            .stderr(predicate::str::contains("not signed in"));
    }
}

#[test]
fn test_login_without_credentials_fails_gracefully() {
    let home = tempfile::tempdir().expect("create temp home");

    cargo_bin_cmd!("playhead")
        .env("PLAYHEAD_HOME", home.path())
        .env_remove("PLAYHEAD_CLIENT_ID")
        .env_remove("PLAYHEAD_CLIENT_SECRET")
        .arg("login")
        .assert()
        .failure()
        .stderr(predicate::str::contains("credentials not configured"));
}

#[test]
fn test_restore_requires_a_slot_argument() {
    cargo_bin_cmd!("playhead")
        .arg("restore")
        .assert()
        .failure()
        .stderr(predicate::str::contains("SLOT"));
}
