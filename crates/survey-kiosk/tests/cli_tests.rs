use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn kiosk() -> Command {
    let mut cmd = Command::cargo_bin("survey-kiosk").expect("binary is built");
    cmd.env_remove("SURVEY_ENDPOINT")
        .env_remove("SURVEY_CLIENT_ID")
        .env("RUST_LOG", "off");
    cmd
}

#[test]
fn catalog_lists_localized_choices_with_ids() {
    kiosk()
        .args(["catalog", "--locale", "en"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rental car"))
        .stdout(predicate::str::contains("transport_rental"))
        .stdout(predicate::str::contains("Gifu - Takayama City"))
        .stdout(predicate::str::contains("sns_wechat").not());
}

#[test]
fn chinese_catalog_includes_regional_platforms() {
    kiosk()
        .args(["catalog", "--locale", "zh", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sns_wechat"))
        .stdout(predicate::str::contains("rent_gifu_takayama"));
}

#[test]
fn unsupported_locale_is_an_error() {
    kiosk()
        .args(["catalog", "--locale", "fr"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("fr"));
}

#[test]
fn unsupported_default_locale_is_a_config_error() {
    kiosk()
        .args(["config", "--locale", "fr"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported locale 'fr'"));
}

#[test]
fn schema_describes_the_submission_record() {
    kiosk()
        .arg("schema")
        .assert()
        .success()
        .stdout(predicate::str::contains("timestamp_jst"))
        .stdout(predicate::str::contains("manners_ids"))
        .stdout(predicate::str::contains("user_agent"));
}

#[test]
fn config_merges_file_and_flags() {
    let temp = tempfile::TempDir::new().unwrap();
    let path = temp.path().join("kiosk.toml");
    fs::write(&path, "client_id = \"from-file\"\n[timing]\nidle_timeout_secs = 55\n").unwrap();

    kiosk()
        .args(["config", "--config"])
        .arg(&path)
        .args(["--endpoint", "https://sheets.example.test/x", "--locale", "ko"])
        .assert()
        .success()
        .stdout(predicate::str::contains("client_id = \"from-file\""))
        .stdout(predicate::str::contains("idle_timeout_secs = 55"))
        .stdout(predicate::str::contains("https://sheets.example.test/x"))
        .stdout(predicate::str::contains("default_locale = \"ko\""));
}

#[test]
fn run_turns_intents_into_snapshots() {
    let input = concat!(
        "{\"type\":\"select_locale\",\"locale\":\"en\"}\n",
        "{\"type\":\"set_free_text\",\"question\":\"nationality\",\"value\":\"Canada\"}\n",
        "{\"type\":\"go_next\"}\n",
    );
    let output = kiosk()
        .arg("run")
        .write_stdin(input)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let text = String::from_utf8(output).unwrap();
    let snapshots: Vec<serde_json::Value> = text
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line is a snapshot"))
        .collect();
    assert!(snapshots.len() >= 3);
    assert_eq!(snapshots[0]["step"], 0);
    let last = snapshots.last().unwrap();
    assert_eq!(last["step"], 2);
    assert_eq!(last["locale"], "en");
    assert_eq!(last["answers"]["nationality"], "Canada");
}
