use std::fmt::Write;

use super::InventoryReport;

const UNCATEGORIZED: &str = "(uncategorized)";
const NO_ENVIRONMENT: &str = "-";

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.is_empty() {
        placeholder
    } else {
        value
    }
}

fn width<'a>(header: &str, values: impl Iterator<Item = &'a str>) -> usize {
    values
        .map(|v| v.chars().count())
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(0)
}

/// Summary table: one line per (vCenter, prefix, environment) with its VM count.
pub fn render_summary(report: &InventoryReport) -> String {
    let mut out = String::new();
    if report.summary.is_empty() {
        out.push_str("No VMs found\n");
        return out;
    }

    let vc_w = width("vCenter", report.summary.iter().map(|s| s.vcenter.as_str()));
    let prefix_w = width(
        "Prefix",
        report
            .summary
            .iter()
            .map(|s| or_placeholder(&s.folder_prefix, UNCATEGORIZED)),
    );
    let env_w = width(
        "Environment",
        report
            .summary
            .iter()
            .map(|s| or_placeholder(&s.environment, NO_ENVIRONMENT)),
    );

    let _ = writeln!(
        out,
        "{:<vc_w$}  {:<prefix_w$}  {:<env_w$}  {:>8}",
        "vCenter", "Prefix", "Environment", "VMs"
    );
    let _ = writeln!(out, "{}", "\u{2500}".repeat(vc_w + prefix_w + env_w + 14));
    for s in &report.summary {
        let _ = writeln!(
            out,
            "{:<vc_w$}  {:<prefix_w$}  {:<env_w$}  {:>8}",
            s.vcenter,
            or_placeholder(&s.folder_prefix, UNCATEGORIZED),
            or_placeholder(&s.environment, NO_ENVIRONMENT),
            format_number(s.count),
        );
    }
    let _ = writeln!(
        out,
        "\nTotal: {} VMs in {} groups",
        format_number(report.vm_count()),
        format_number(report.summary.len())
    );
    out
}

pub fn render_rows(report: &InventoryReport) -> String {
    let mut out = String::new();
    let vc_w = width("vCenter", report.rows.iter().map(|r| r.vcenter.as_str()));
    let vm_w = width("VM", report.rows.iter().map(|r| r.vm.as_str()));
    let state_w = width("Power", report.rows.iter().map(|r| r.power_state.as_str()));

    let _ = writeln!(
        out,
        "{:<vc_w$}  {:<vm_w$}  {:<state_w$}  Folder",
        "vCenter", "VM", "Power"
    );
    for r in &report.rows {
        let _ = writeln!(
            out,
            "{:<vc_w$}  {:<vm_w$}  {:<state_w$}  {} [{} / {}]",
            r.vcenter,
            r.vm,
            r.power_state,
            r.folder_path,
            or_placeholder(&r.folder_prefix, UNCATEGORIZED),
            or_placeholder(&r.environment, NO_ENVIRONMENT),
        );
    }
    out
}

pub fn render_skipped(report: &InventoryReport) -> String {
    let mut out = String::new();
    if report.skipped.is_empty() {
        return out;
    }
    out.push_str("Skipped vCenters:\n");
    for s in &report.skipped {
        let _ = writeln!(out, "  {}: {}", s.vcenter, s.reason);
    }
    out
}

/// VM counts with thousands separators, e.g. `12,480`.
fn format_number(n: usize) -> String {
    let digits = n.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
