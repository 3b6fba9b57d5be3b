use predicates::prelude::*;

use super::common::{TestEnv, stdout_json};

fn build_lines(env: &TestEnv) -> Vec<String> {
  env.build_log().into_iter().filter(|l| l.starts_with("build ")).collect()
}

#[test]
fn embedded_build_prints_and_writes_provenance() {
  let env = TestEnv::new();

  let output = env
    .relaybuild_cmd()
    .args(["build", "reference"])
    .assert()
    .success()
    .stderr(predicate::str::contains("reference-relay:latest"))
    .get_output()
    .clone();

  let json = stdout_json(&output);
  assert_eq!(json["implementation"], "reference");
  assert_eq!(json["source"]["type"], "embedded");
  assert_eq!(json["source"]["ref"], "embedded");
  assert!(json["source"]["local_path"].is_null());
  assert_eq!(json["source"]["commit"], json["runner_commit"]);
  assert_eq!(
    json["images"],
    serde_json::json!([
      { "target": "relay", "image": "reference-relay:latest" },
      { "target": "client", "image": "reference-client:latest" }
    ])
  );

  let on_disk = std::fs::read(env.provenance_path("reference")).unwrap();
  assert_eq!(on_disk, output.stdout);

  let builds = build_lines(&env);
  assert_eq!(builds.len(), 2);
  assert!(builds[0].contains("--tag reference-relay:latest"));
  assert!(builds[1].contains("--tag reference-client:latest"));
}

#[test]
fn single_target_build() {
  let env = TestEnv::new();

  let output = env
    .relaybuild_cmd()
    .args(["build", "reference", "--target", "client"])
    .assert()
    .success()
    .get_output()
    .clone();

  let json = stdout_json(&output);
  assert_eq!(json["images"].as_array().unwrap().len(), 1);
  assert_eq!(json["images"][0]["target"], "client");
  assert_eq!(build_lines(&env).len(), 1);
}

#[test]
fn unknown_target_runs_no_build() {
  let env = TestEnv::new();

  env
    .relaybuild_cmd()
    .args(["build", "reference", "--target", "server"])
    .assert()
    .code(1)
    .stdout(predicate::str::is_empty())
    .stderr(predicate::str::contains("unknown target 'server'"));

  assert!(env.build_log().is_empty());
  assert!(!env.provenance_path("reference").exists());
}

#[test]
fn failed_build_keeps_previous_record() {
  let env = TestEnv::new();
  env.relaybuild_cmd().args(["build", "reference"]).assert().success();
  let previous = std::fs::read_to_string(env.provenance_path("reference")).unwrap();

  env
    .relaybuild_cmd()
    .args(["build", "reference"])
    .env("FAKE_BUILD_FAIL", "reference-client:latest")
    .assert()
    .code(1)
    .stdout(predicate::str::is_empty())
    .stderr(predicate::str::contains("Build of 'reference' failed"))
    .stderr(predicate::str::contains("'client'"));

  let current = std::fs::read_to_string(env.provenance_path("reference")).unwrap();
  assert_eq!(current, previous);
}

#[test]
fn failed_first_build_writes_nothing() {
  let env = TestEnv::new();

  env
    .relaybuild_cmd()
    .args(["build", "reference"])
    .env("FAKE_BUILD_FAIL", "reference-relay:latest")
    .assert()
    .code(1);

  assert!(!env.provenance_path("reference").exists());
  assert_eq!(build_lines(&env).len(), 1, "client must not be attempted");
}

#[test]
fn local_build_stages_entrypoint_temporarily() {
  let env = TestEnv::new();
  let checkout = env.outside_dir("quiche-checkout");
  std::fs::write(checkout.join("Cargo.toml"), "[package]\n").unwrap();

  let output = env
    .relaybuild_cmd()
    .args(["build", "quiche", "--local"])
    .arg(&checkout)
    .assert()
    .success()
    .get_output()
    .clone();

  let json = stdout_json(&output);
  assert_eq!(json["source"]["type"], "local");
  assert_eq!(json["source"]["ref"], "local");
  assert_eq!(json["source"]["local_path"], checkout.display().to_string());

  // Each build logs its arguments, then the context listing.
  let log = env.build_log();
  assert!(log[0].ends_with(&checkout.display().to_string()));
  assert!(log[1].contains("entrypoint.sh"));
  assert!(!log[3].contains("entrypoint.sh"));
  assert!(!checkout.join("entrypoint.sh").exists());
  assert!(!env.workspace().join("quiche").exists());
}

#[test]
fn missing_local_path_fails_before_building() {
  let env = TestEnv::new();
  let missing = env.temp.path().join("checkout");

  env
    .relaybuild_cmd()
    .args(["build", "quiche", "--local"])
    .arg(&missing)
    .assert()
    .code(1)
    .stderr(predicate::str::contains("local source not found"));

  assert!(env.build_log().is_empty());
  assert!(!env.provenance_path("quiche").exists());
}

#[test]
fn embedded_rejects_ref() {
  let env = TestEnv::new();

  env
    .relaybuild_cmd()
    .args(["build", "reference", "--ref", "v1"])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("--ref cannot be used with 'reference'"));

  assert!(env.build_log().is_empty());
}
