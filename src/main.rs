mod cli;
mod config;
mod error;
mod fleet_config;
mod folder;
mod inventory;
mod report;

use std::collections::HashSet;
use std::io::BufRead;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use config::{FleetConfig, VcenterEntry};
use folder::environment::EnvironmentKeyword;
use folder::{classify_bytes, classify_str, ClassificationResult, FallbackScope};
use report::ReportBuilder;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let verbose = matches!(&cli.command, Command::Inventory { verbose: true, .. });

    let default_level = if verbose {
        "vcinventory=info"
    } else {
        "vcinventory=warn"
    };
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(rust_log.as_deref(), default_level))
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Classify {
            paths,
            stdin,
            json,
            fallback,
        } => {
            let scope = match fallback {
                Some(s) => FallbackScope::from_str(&s)?,
                None => FallbackScope::default(),
            };
            let classified = if stdin {
                classify_lines(std::io::stdin().lock(), scope)
                    .context("reading paths from stdin")?
            } else {
                paths
                    .into_iter()
                    .map(|path| {
                        let result = classify_str(&path, scope);
                        ClassifiedPath { path, result }
                    })
                    .collect()
            };
            print_classified(&classified, json)?;
        }
        Command::Inventory {
            config,
            output,
            vcenters,
            fallback,
            rows,
            verbose: _,
        } => {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            let config_path = fleet_config::find_config(config.as_deref(), &cwd)?;
            let mut fleet = fleet_config::load_fleet_config(&config_path)
                .with_context(|| format!("loading {}", config_path.display()))?;

            // CLI > config file
            if let Some(s) = fallback {
                fleet.fallback = FallbackScope::from_str(&s)?;
            }

            let selected = select_vcenters(&fleet, &vcenters)?;
            run_inventory(&fleet, &selected, output.as_deref(), rows).await?;
        }
        Command::Keywords => {
            for keyword in EnvironmentKeyword::ALL {
                println!("{keyword}");
            }
        }
    }

    Ok(())
}

/// `RUST_LOG` wins when set and valid; otherwise the command's default level applies.
fn build_env_filter(rust_log: Option<&str>, default_level: &str) -> EnvFilter {
    match rust_log.filter(|s| !s.trim().is_empty()) {
        Some(directives) => EnvFilter::try_new(directives).unwrap_or_else(|e| {
            eprintln!("ignoring invalid RUST_LOG ({e}), using {default_level}");
            EnvFilter::new(default_level)
        }),
        None => EnvFilter::new(default_level),
    }
}

#[derive(Serialize)]
struct ClassifiedPath {
    path: String,
    #[serde(flatten)]
    result: ClassificationResult,
}

/// Classifies raw lines; undecodable lines classify as uncategorized.
fn classify_lines<R: BufRead>(
    reader: R,
    scope: FallbackScope,
) -> std::io::Result<Vec<ClassifiedPath>> {
    let mut classified = Vec::new();
    for line in reader.split(b'\n') {
        let mut line = line?;
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        classified.push(ClassifiedPath {
            path: String::from_utf8_lossy(&line).into_owned(),
            result: classify_bytes(&line, scope),
        });
    }
    Ok(classified)
}

fn print_classified(classified: &[ClassifiedPath], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(classified)?);
    } else {
        for c in classified {
            println!(
                "{}\t{}\t{}",
                c.path,
                c.result.folder_prefix(),
                c.result.environment()
            );
        }
    }
    Ok(())
}

/// Restrict the scan to the named vCenters, or all of them when none are named.
/// A name given more than once is scanned once.
fn select_vcenters(fleet: &FleetConfig, names: &[String]) -> Result<Vec<VcenterEntry>> {
    if names.is_empty() {
        return Ok(fleet.vcenters.clone());
    }
    let mut seen = HashSet::new();
    names
        .iter()
        .filter(|name| seen.insert(*name))
        .map(|name| {
            fleet
                .vcenter(name)
                .cloned()
                .with_context(|| format!("vCenter '{name}' is not in {}", fleet.source.display()))
        })
        .collect()
}

async fn run_inventory(
    fleet: &FleetConfig,
    vcenters: &[VcenterEntry],
    output: Option<&std::path::Path>,
    show_rows: bool,
) -> Result<()> {
    let progress = ProgressBar::new(vcenters.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("  Loading snapshots [{bar:30}] {pos}/{len} {msg}")
            .expect("invalid progress template"),
    );

    let mut loaded = inventory::snapshot::load_snapshots(vcenters, &progress).await?;
    progress.finish_and_clear();
    loaded.sort_by(|a, b| a.vcenter.cmp(&b.vcenter));

    tracing::info!("fallback scope: {}", fleet.fallback.as_str());
    let mut builder = ReportBuilder::new(fleet.fallback);
    for snapshot in loaded {
        match snapshot.result {
            Ok(source) => builder.add_source(&source),
            Err(e) => {
                tracing::warn!("skipping {}: {e}", snapshot.vcenter);
                builder.skip(&snapshot.vcenter, e.to_string());
            }
        }
    }
    let report = builder.finish();

    eprintln!();
    if show_rows {
        eprintln!("{}", report::render_rows(&report));
    }
    eprint!("{}", report::render_summary(&report));
    let skipped = report::render_skipped(&report);
    if !skipped.is_empty() {
        eprintln!();
        eprint!("{skipped}");
    }

    if let Some(path) = output {
        report
            .write_json(path)
            .with_context(|| format!("writing report to {}", path.display()))?;
        eprintln!("\nReport written to {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fleet() -> FleetConfig {
        let entry = |name: &str| VcenterEntry {
            name: name.to_string(),
            host: format!("{name}.example.com"),
            credential_ref: "VC_PASSWORD".to_string(),
            snapshot: PathBuf::from(format!("{name}.json")),
        };
        FleetConfig {
            source: PathBuf::from("vcinventory.toml"),
            vcenters: vec![entry("vc-east"), entry("vc-west")],
            fallback: FallbackScope::Outermost,
        }
    }

    #[test]
    fn select_all_when_no_names() {
        let selected = select_vcenters(&fleet(), &[]).unwrap();
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn select_named_vcenters() {
        let selected = select_vcenters(&fleet(), &["vc-west".to_string()]).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "vc-west");
    }

    #[test]
    fn select_unknown_vcenter_fails() {
        let err = select_vcenters(&fleet(), &["vc-north".to_string()]).unwrap_err();
        assert!(err.to_string().contains("vc-north"));
    }

    #[test]
    fn select_repeated_name_once() {
        let names = [
            "vc-east".to_string(),
            "vc-west".to_string(),
            "vc-east".to_string(),
        ];
        let selected = select_vcenters(&fleet(), &names).unwrap();
        let selected: Vec<&str> = selected.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(selected, vec!["vc-east", "vc-west"]);
    }

    #[test]
    fn rust_log_overrides_default_level() {
        let filter = build_env_filter(Some("vcinventory=debug"), "vcinventory=warn");
        let shown = filter.to_string();
        assert!(shown.contains("vcinventory=debug"), "{shown}");
        assert!(!shown.contains("warn"), "{shown}");
    }

    #[test]
    fn default_level_when_rust_log_unset_or_invalid() {
        assert_eq!(
            build_env_filter(None, "vcinventory=info").to_string(),
            "vcinventory=info"
        );
        assert_eq!(
            build_env_filter(Some("  "), "vcinventory=warn").to_string(),
            "vcinventory=warn"
        );
        assert_eq!(
            build_env_filter(Some("vcinventory=loudest"), "vcinventory=warn").to_string(),
            "vcinventory=warn"
        );
    }

    #[test]
    fn classified_path_flattens_result() {
        let c = ClassifiedPath {
            path: "Apps/Team2_QA".to_string(),
            result: classify_str("Apps/Team2_QA", FallbackScope::Outermost),
        };
        let value = serde_json::to_value(&c).unwrap();
        assert_eq!(value["path"], "Apps/Team2_QA");
        assert_eq!(value["folder_prefix"], "Team2");
        assert_eq!(value["environment"], "qa");
    }

    #[test]
    fn classify_lines_handles_crlf_and_bad_bytes() {
        let input: &[u8] = b"Apps/Team2_QA\r\n\xff\xfe_Prod\nProd";
        let classified = classify_lines(input, FallbackScope::Outermost).unwrap();
        assert_eq!(classified.len(), 3);
        assert_eq!(classified[0].path, "Apps/Team2_QA");
        assert_eq!(classified[0].result.folder_prefix(), "Team2");
        assert!(classified[1].result.is_uncategorized());
        assert_eq!(classified[2].result.environment(), "prod");
    }

    #[tokio::test]
    async fn inventory_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = dir.path().join("vc1.json");
        std::fs::write(
            &snapshot,
            r#"{
              "vcenter": "vc1",
              "connection_state": "connected",
              "entities": [
                {"id": "dc", "name": "DC1", "kind": "datacenter"},
                {"id": "root", "name": "vm", "kind": "folder", "parent": "dc"},
                {"id": "f1", "name": "Web_Prod", "kind": "folder", "parent": "root"},
                {"id": "vm-1", "name": "web01", "kind": "virtual_machine", "parent": "f1", "power_state": "poweredOn"}
              ]
            }"#,
        )
        .unwrap();

        let entries = vec![
            VcenterEntry {
                name: "vc1".to_string(),
                host: "vc1.local".to_string(),
                credential_ref: "VC1".to_string(),
                snapshot,
            },
            VcenterEntry {
                name: "vc2".to_string(),
                host: "vc2.local".to_string(),
                credential_ref: "VC2".to_string(),
                snapshot: dir.path().join("vc2.json"),
            },
        ];
        let fleet = FleetConfig {
            source: dir.path().join("vcinventory.toml"),
            vcenters: entries.clone(),
            fallback: FallbackScope::Outermost,
        };

        let output = dir.path().join("report.json");
        run_inventory(&fleet, &entries, Some(&output), false)
            .await
            .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(value["rows"][0]["vm"], "web01");
        assert_eq!(value["rows"][0]["folder_prefix"], "Web");
        assert_eq!(value["rows"][0]["environment"], "prod");
        assert_eq!(value["skipped"][0]["vcenter"], "vc2");
    }

    fn single_vm_snapshot(vcenter: &str, vm: &str) -> String {
        format!(
            r#"{{
              "vcenter": "{vcenter}",
              "connection_state": "connected",
              "entities": [
                {{"id": "dc", "name": "DC1", "kind": "datacenter"}},
                {{"id": "root", "name": "vm", "kind": "folder", "parent": "dc"}},
                {{"id": "f1", "name": "Db_Dev", "kind": "folder", "parent": "root"}},
                {{"id": "vm-1", "name": "{vm}", "kind": "virtual_machine", "parent": "f1"}}
              ]
            }}"#
        )
    }

    #[tokio::test]
    async fn inventory_rows_follow_vcenter_name_order() {
        let dir = tempfile::tempdir().unwrap();
        let entries: Vec<VcenterEntry> = [("vc-b", "b01"), ("vc-a", "a01")]
            .into_iter()
            .map(|(name, vm)| {
                let snapshot = dir.path().join(format!("{name}.json"));
                std::fs::write(&snapshot, single_vm_snapshot(name, vm)).unwrap();
                VcenterEntry {
                    name: name.to_string(),
                    host: format!("{name}.local"),
                    credential_ref: "VC".to_string(),
                    snapshot,
                }
            })
            .collect();
        let fleet = FleetConfig {
            source: dir.path().join("vcinventory.toml"),
            vcenters: entries.clone(),
            fallback: FallbackScope::Outermost,
        };

        let output = dir.path().join("report.json");
        run_inventory(&fleet, &entries, Some(&output), false)
            .await
            .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(value["rows"][0]["vcenter"], "vc-a");
        assert_eq!(value["rows"][0]["vm"], "a01");
        assert_eq!(value["rows"][1]["vcenter"], "vc-b");
        assert_eq!(value["rows"][0]["power_state"], "unknown");
    }
}
