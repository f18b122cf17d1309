use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn version_flag_reports_the_binary_version() {
    Command::cargo_bin("clearing_core_cli")
        .expect("binary exists")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("clearing_core_cli"));
}

#[test]
fn help_flag_lists_the_options() {
    Command::cargo_bin("clearing_core_cli")
        .expect("binary exists")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--base-url"))
        .stdout(predicate::str::contains("--script"));
}

#[test]
fn unknown_arguments_fail_with_a_hint() {
    Command::cargo_bin("clearing_core_cli")
        .expect("binary exists")
        .arg("--bogus")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown argument"));
}

#[test]
fn flags_needing_values_report_their_absence() {
    Command::cargo_bin("clearing_core_cli")
        .expect("binary exists")
        .arg("--base-url")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--base-url needs a value"));
}
