mod render;

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::error::InventoryError;
use crate::folder::{classify, FallbackScope, FolderPath};
use crate::inventory::InventorySource;

pub use render::{render_rows, render_skipped, render_summary};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub vcenter: String,
    pub vm: String,
    pub power_state: String,
    pub folder_path: FolderPath,
    pub folder_prefix: String,
    pub environment: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub vcenter: String,
    pub folder_prefix: String,
    pub environment: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedVcenter {
    pub vcenter: String,
    pub reason: String,
}

#[derive(Debug, Default, Serialize)]
pub struct InventoryReport {
    pub rows: Vec<ReportRow>,
    pub summary: Vec<SummaryRow>,
    pub skipped: Vec<SkippedVcenter>,
}

impl InventoryReport {
    pub fn vm_count(&self) -> usize {
        self.rows.len()
    }

    pub fn write_json(&self, path: &Path) -> Result<(), InventoryError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), self)?;
        tracing::info!("wrote report to {}", path.display());
        Ok(())
    }
}

type TallyKey = (String, String, String);

/// Accumulates classified rows and per-(vCenter, prefix, environment) counts.
pub struct ReportBuilder {
    fallback: FallbackScope,
    rows: Vec<ReportRow>,
    tally: BTreeMap<TallyKey, usize>,
    skipped: Vec<SkippedVcenter>,
}

impl ReportBuilder {
    pub fn new(fallback: FallbackScope) -> Self {
        Self {
            fallback,
            rows: Vec::new(),
            tally: BTreeMap::new(),
            skipped: Vec::new(),
        }
    }

    pub fn add_source<S: InventorySource + ?Sized>(&mut self, source: &S) {
        let vcenter = source.vcenter();
        let state = source.connection_state();
        if !state.is_healthy() {
            tracing::warn!("skipping {vcenter}: connection state is {}", state.as_str());
            self.skip(vcenter, format!("connection state is {}", state.as_str()));
            return;
        }

        let records = source.records();
        tracing::info!("{vcenter}: classifying {} VMs", records.len());

        for record in records {
            let result = classify(&record.folder_path, self.fallback);
            if result.is_uncategorized() {
                tracing::debug!("{vcenter}: {} is uncategorized", record.name);
            }
            let key = (
                vcenter.to_string(),
                result.folder_prefix().to_string(),
                result.environment().to_string(),
            );
            *self.tally.entry(key).or_insert(0) += 1;

            self.rows.push(ReportRow {
                vcenter: vcenter.to_string(),
                vm: record.name,
                power_state: record
                    .power_state
                    .map(|s| s.as_str().to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
                folder_path: record.folder_path,
                folder_prefix: result.folder_prefix().to_string(),
                environment: result.environment().to_string(),
            });
        }
    }

    pub fn skip(&mut self, vcenter: &str, reason: impl Into<String>) {
        self.skipped.push(SkippedVcenter {
            vcenter: vcenter.to_string(),
            reason: reason.into(),
        });
    }

    pub fn finish(self) -> InventoryReport {
        let summary = self
            .tally
            .into_iter()
            .map(|((vcenter, folder_prefix, environment), count)| SummaryRow {
                vcenter,
                folder_prefix,
                environment,
                count,
            })
            .collect();

        InventoryReport {
            rows: self.rows,
            summary,
            skipped: self.skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::{ConnectionState, PowerState, VmRef};

    struct FakeSource {
        vcenter: &'static str,
        state: ConnectionState,
        vms: Vec<(&'static str, &'static str)>,
    }

    impl InventorySource for FakeSource {
        fn vcenter(&self) -> &str {
            self.vcenter
        }

        fn connection_state(&self) -> ConnectionState {
            self.state
        }

        fn list_vms(&self) -> Vec<VmRef> {
            self.vms
                .iter()
                .map(|(name, _)| VmRef {
                    id: name.to_string(),
                    name: name.to_string(),
                })
                .collect()
        }

        fn get_folder_path(&self, vm: &VmRef) -> FolderPath {
            self.vms
                .iter()
                .find(|(name, _)| *name == vm.name)
                .map(|(_, path)| FolderPath::parse(path))
                .unwrap_or_default()
        }

        fn power_state(&self, _vm: &VmRef) -> Option<PowerState> {
            Some(PowerState::PoweredOn)
        }
    }

    fn source(vcenter: &'static str, vms: Vec<(&'static str, &'static str)>) -> FakeSource {
        FakeSource {
            vcenter,
            state: ConnectionState::Connected,
            vms,
        }
    }

    #[test]
    fn rows_carry_classification() {
        let mut builder = ReportBuilder::new(FallbackScope::Outermost);
        builder.add_source(&source("vc1", vec![("web01", "Apps/Team2_QA")]));
        let report = builder.finish();

        assert_eq!(report.vm_count(), 1);
        let row = &report.rows[0];
        assert_eq!(row.vcenter, "vc1");
        assert_eq!(row.vm, "web01");
        assert_eq!(row.power_state, "poweredOn");
        assert_eq!(row.folder_path.to_string(), "Apps/Team2_QA");
        assert_eq!(row.folder_prefix, "Team2");
        assert_eq!(row.environment, "qa");
    }

    #[test]
    fn summary_is_sorted_and_counts_add_up() {
        let mut builder = ReportBuilder::new(FallbackScope::Outermost);
        builder.add_source(&source(
            "vc2",
            vec![("a", "Web_Prod"), ("b", "Web_Prod"), ("c", "")],
        ));
        builder.add_source(&source(
            "vc1",
            vec![("d", "Db_Dev"), ("e", "Apps/Web_Prod"), ("f", "Db_QA")],
        ));
        let report = builder.finish();

        let keys: Vec<(&str, &str, &str, usize)> = report
            .summary
            .iter()
            .map(|s| {
                (
                    s.vcenter.as_str(),
                    s.folder_prefix.as_str(),
                    s.environment.as_str(),
                    s.count,
                )
            })
            .collect();
        assert_eq!(
            keys,
            vec![
                ("vc1", "Db", "dev", 1),
                ("vc1", "Db", "qa", 1),
                ("vc1", "Web", "prod", 1),
                ("vc2", "", "", 1),
                ("vc2", "Web", "prod", 2),
            ]
        );

        let total: usize = report.summary.iter().map(|s| s.count).sum();
        assert_eq!(total, report.vm_count());
    }

    #[test]
    fn fallback_scope_is_applied() {
        let mut builder = ReportBuilder::new(FallbackScope::SkipRoot);
        builder.add_source(&source("vc1", vec![("a", "Datacenter/ProductionApps")]));
        let report = builder.finish();
        assert_eq!(report.rows[0].folder_prefix, "ProductionApps");
        assert_eq!(report.rows[0].environment, "prod");
    }

    #[test]
    fn unhealthy_source_is_skipped() {
        let mut builder = ReportBuilder::new(FallbackScope::Outermost);
        let mut down = source("vc-down", vec![("a", "Web_Prod")]);
        down.state = ConnectionState::NotResponding;
        builder.add_source(&down);
        builder.skip("vc-gone", "snapshot missing");
        let report = builder.finish();

        assert!(report.rows.is_empty());
        assert!(report.summary.is_empty());
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.skipped[0].vcenter, "vc-down");
        assert!(report.skipped[0].reason.contains("notResponding"));
        assert_eq!(report.skipped[1].reason, "snapshot missing");
    }

    #[test]
    fn write_json_round_trip_shape() {
        let dir = tempfile::tempdir().unwrap();
        let mut builder = ReportBuilder::new(FallbackScope::Outermost);
        builder.add_source(&source("vc1", vec![("a", "Team1_Sandbox")]));
        let report = builder.finish();

        let path = dir.path().join("out").join("report.json");
        report.write_json(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["rows"][0]["folder_path"], "Team1_Sandbox");
        assert_eq!(value["rows"][0]["folder_prefix"], "Team1");
        assert_eq!(value["rows"][0]["environment"], "");
        assert_eq!(value["summary"][0]["count"], 1);
        assert!(value["skipped"].as_array().unwrap().is_empty());
    }
}
