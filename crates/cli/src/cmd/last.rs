//! Implementation of the `relaybuild last` command.
//!
//! Shows the provenance record left by the most recent successful build.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;

use relaybuild_lib::provenance::{ProvenanceRecord, load_record};
use relaybuild_lib::source::SourceType;

use crate::output::{self, OutputFormat, print_info, print_json, print_stat, print_success, truncate_hash};

pub fn cmd_last(config_path: Option<&Path>, name: &str, output: OutputFormat) -> Result<()> {
  let config = super::load_config(config_path)?;
  let implementation = config.implementation(name)?;
  let record = load_record(&implementation.provenance_path())?;

  if output.is_json() {
    return print_json(&record);
  }

  match record {
    Some(record) => print_record(&record),
    None => print_info(&format!("No build recorded for '{}'. Run 'relaybuild build {}'.", name, name)),
  }

  Ok(())
}

fn print_record(record: &ProvenanceRecord) {
  print_success(&format!("Last build of {}", record.implementation()));
  print_stat("Built", &format_timestamp(record));
  print_stat("Runner commit", truncate_hash(record.runner_commit()));

  let source = record.source();
  print_stat("Source", source.kind.as_str());
  match source.kind {
    SourceType::Git => {
      print_stat("Repository", &source.repository);
      print_stat("Ref", &source.git_ref);
    }
    SourceType::Local => {
      if let Some(path) = &source.local_path {
        print_stat("Path", &path.display().to_string());
      }
    }
    SourceType::Embedded => {}
  }

  let commit = if source.dirty {
    format!("{} (dirty)", truncate_hash(&source.commit))
  } else {
    truncate_hash(&source.commit).to_string()
  };
  print_stat("Commit", &commit);

  println!();
  println!("Images:");
  for image in record.images() {
    println!("  {} {} {}", output::symbols::INFO, image.target, image.image);
  }
}

/// `2026-10-17T08:30:00Z (2h 5m ago)`, or the raw value if it does not parse.
fn format_timestamp(record: &ProvenanceRecord) -> String {
  let Some(built) = record.timestamp_utc() else {
    return record.timestamp().to_string();
  };
  match Utc::now().signed_duration_since(built).to_std() {
    Ok(age) => {
      // Minute granularity reads better than "2h 5m 13s".
      let age = Duration::from_secs(age.as_secs() / 60 * 60);
      if age.is_zero() {
        format!("{} (just now)", record.timestamp())
      } else {
        format!("{} ({} ago)", record.timestamp(), humantime::format_duration(age))
      }
    }
    Err(_) => record.timestamp().to_string(),
  }
}
