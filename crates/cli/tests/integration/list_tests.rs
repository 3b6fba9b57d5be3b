use predicates::prelude::*;

use super::common::{TestEnv, stdout_json};

#[test]
fn list_text_shows_implementations() {
  let env = TestEnv::new();

  env
    .relaybuild_cmd()
    .arg("list")
    .assert()
    .success()
    .stdout(predicate::str::contains("reference"))
    .stdout(predicate::str::contains("quiche"))
    .stdout(predicate::str::contains("https://example.com/quiche.git"))
    .stdout(predicate::str::contains("relay, client"));
}

#[test]
fn list_json_output_is_valid() {
  let env = TestEnv::new();

  let output = env
    .relaybuild_cmd()
    .args(["list", "-o", "json"])
    .assert()
    .success()
    .get_output()
    .clone();

  let json = stdout_json(&output);
  let items = json.as_array().unwrap();
  assert_eq!(items.len(), 2);
  assert_eq!(items[0]["name"], "reference");
  assert_eq!(items[0]["source"], "embedded");
  assert!(items[0]["repository"].is_null());
  assert_eq!(items[1]["name"], "quiche");
  assert_eq!(items[1]["default_ref"], "master");
  assert_eq!(items[1]["targets"], serde_json::json!(["relay", "client"]));
}
