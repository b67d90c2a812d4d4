//! Display formatting for CLI output
//!
//! SBIO pattern: Pure functions that format data for display

use crate::cluster::{running_count, Cluster, PodSpec, PodStatus, Service, Tier};
use crate::orchestrator::AccessInfo;

// ============================================================================
// Table formatting helpers
// ============================================================================

/// Column gap used by every table
const COLUMN_GAP: &str = "   ";

/// Render `rows` under `headers` with left-aligned, padded columns.
///
/// Returns `empty` when there are no rows. Cells beyond the header count are
/// appended unpadded, and trailing padding is trimmed from every line.
pub fn format_table(headers: &[&str], rows: &[Vec<String>], empty: &str) -> String {
    if rows.is_empty() {
        return format!("{}\n", empty);
    }

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .map(String::len)
                .fold(h.len(), usize::max)
        })
        .collect();

    let mut output = render_row(headers.iter(), &widths);
    for row in rows {
        output.push_str(&render_row(row.iter(), &widths));
    }
    output
}

fn render_row<S: AsRef<str>>(cells: impl Iterator<Item = S>, widths: &[usize]) -> String {
    let cells: Vec<String> = cells
        .enumerate()
        .map(|(i, cell)| match widths.get(i) {
            Some(width) => format!("{:<width$}", cell.as_ref(), width = *width),
            None => cell.as_ref().to_string(),
        })
        .collect();
    let mut line = cells.join(COLUMN_GAP).trim_end().to_string();
    line.push('\n');
    line
}

/// "running/desired" for a tier, or "-" when the tier is absent
fn tier_readiness(cluster: &Cluster, tier: Tier) -> String {
    match tier.spec(cluster) {
        Some(spec) => format!("{}/{}", running_count(tier.statuses(cluster)), spec.size),
        None => "-".to_string(),
    }
}

// ============================================================================
// Cluster display
// ============================================================================

/// Format cluster list for display
pub fn format_cluster_list(clusters: &[Cluster]) -> String {
    let headers = &["NAME", "PD", "TIKV", "TIDB", "TIDB SERVICE", "CREATED"];
    let rows: Vec<Vec<String>> = clusters
        .iter()
        .map(|c| {
            let service = &c.gateway_service;
            let endpoint = if service.is_published() {
                format!("{}:{}", service.node_ip.join(","), service.node_port)
            } else {
                "<pending>".to_string()
            };
            let created = c
                .created_at
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string());

            vec![
                c.name.clone(),
                tier_readiness(c, Tier::PlacementDriver),
                tier_readiness(c, Tier::Storage),
                tier_readiness(c, Tier::Gateway),
                endpoint,
                created,
            ]
        })
        .collect();

    format_table(headers, &rows, "No clusters found.")
}

fn push_spec(output: &mut String, label: &str, spec: Option<&PodSpec>) {
    let Some(spec) = spec else {
        return;
    };
    output.push_str(&format!("  {:<8} size={} version={}", label, spec.size, spec.version));
    if !spec.node_selector.is_empty() {
        let mut selector: Vec<String> = spec
            .node_selector
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        selector.sort();
        output.push_str(&format!(" node_selector={}", selector.join(",")));
    }
    output.push('\n');
}

fn push_service(output: &mut String, label: &str, service: &Service) {
    if service.is_empty() {
        return;
    }
    output.push_str(&format!("  {:<20}", label));
    if service.is_published() {
        output.push_str(&format!(" node {}:{}", service.node_ip.join(","), service.node_port));
    }
    if !service.cluster_ip.is_empty() {
        output.push_str(&format!(" cluster {}:{}", service.cluster_ip, service.cluster_port));
    }
    if !service.external_ip.is_empty() {
        output.push_str(&format!(" external {}:{}", service.external_ip, service.external_port));
    }
    output.push('\n');
}

fn push_pods(output: &mut String, label: &str, pods: &[PodStatus]) {
    for pod in pods {
        output.push_str(&format!(
            "  {:<8} {:<24} {:<10} pod={} node={}\n",
            label,
            pod.name,
            format!("{:?}", pod.status),
            pod.pod_ip,
            pod.node_ip
        ));
    }
}

/// Format a single cluster for detailed display
pub fn format_cluster_detail(cluster: &Cluster) -> String {
    let mut output = format!("---------------------- {} --------------------\n", cluster.name);

    if let Some(ts) = &cluster.created_at {
        output.push_str(&format!("Created:     {}\n", ts));
    }
    output.push_str(&format!("Initialized: {}\n", cluster.initialized));

    output.push_str("Spec:\n");
    push_spec(&mut output, "pd", cluster.placement_driver.as_ref());
    push_spec(&mut output, "tikv", cluster.storage.as_ref());
    push_spec(&mut output, "tidb", cluster.gateway.as_ref());
    push_spec(&mut output, "monitor", cluster.monitor.as_ref());

    output.push_str("Status:\n");
    push_service(&mut output, "tidb-service", &cluster.gateway_service);
    push_service(&mut output, "grafana-service", &cluster.grafana_service);
    push_service(&mut output, "prometheus-service", &cluster.prometheus_service);
    push_pods(&mut output, "pd", &cluster.placement_driver_status);
    push_pods(&mut output, "tikv", &cluster.storage_status);
    push_pods(&mut output, "tidb", &cluster.gateway_status);

    output
}

/// Format connection details of a ready cluster
pub fn format_access_info(info: &AccessInfo) -> String {
    let mut output = String::new();
    if let Some(port) = info.grafana_port {
        output.push_str(&format!("grafana: {}:{}\n", info.host, port));
    }
    output.push_str("TiDB\n");
    output.push_str(&format!("host: {}\n", info.host));
    output.push_str(&format!("port: {}\n", info.port));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::PodPhase;
    use std::collections::HashMap;

    fn demo_cluster() -> Cluster {
        let spec = |size| PodSpec {
            size,
            version: "v1.0.0".to_string(),
            node_selector: HashMap::from([("stability".to_string(), "allow".to_string())]),
            ..Default::default()
        };
        let mut cluster = Cluster {
            name: "demo".to_string(),
            placement_driver: Some(spec(1)),
            storage: Some(spec(3)),
            gateway: Some(spec(2)),
            storage_status: vec![PodStatus {
                name: "demo-tikv-0".to_string(),
                pod_ip: "172.16.0.2".to_string(),
                node_ip: "10.0.0.2".to_string(),
                status: PodPhase::Running,
            }],
            ..Default::default()
        };
        cluster.gateway_service.node_ip = vec!["10.0.0.1".to_string()];
        cluster.gateway_service.node_port = 30001;
        cluster
    }

    #[test]
    fn test_format_table_aligns_columns() {
        let rows = vec![
            vec!["alpha".to_string(), "1/3".to_string()],
            vec!["b".to_string(), "12/12".to_string(), "extra".to_string()],
        ];

        let output = format_table(&["NAME", "TIKV"], &rows, "nothing");
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "NAME    TIKV");
        assert_eq!(lines[1], "alpha   1/3");
        assert_eq!(lines[2], "b       12/12   extra");
    }

    #[test]
    fn test_format_table_empty_message() {
        assert_eq!(format_table(&["NAME"], &[], "nothing here"), "nothing here\n");
        assert_eq!(format_cluster_list(&[]), "No clusters found.\n");
    }

    #[test]
    fn test_format_cluster_list() {
        let mut pending = Cluster {
            name: "fresh".to_string(),
            ..Default::default()
        };
        pending.gateway = None;

        let output = format_cluster_list(&[demo_cluster(), pending]);
        assert!(output.contains("demo"));
        assert!(output.contains("1/3"));
        assert!(output.contains("0/2"));
        assert!(output.contains("10.0.0.1:30001"));
        assert!(output.contains("<pending>"));
    }

    #[test]
    fn test_format_cluster_detail() {
        let output = format_cluster_detail(&demo_cluster());
        assert!(output.contains("-- demo --"));
        assert!(output.contains("size=3"));
        assert!(output.contains("node_selector=stability=allow"));
        assert!(output.contains("tidb-service"));
        assert!(output.contains("demo-tikv-0"));
        assert!(!output.contains("monitor"));
    }

    #[test]
    fn test_format_access_info() {
        let info = AccessInfo {
            host: "10.0.0.4".to_string(),
            port: 30001,
            grafana_port: Some(30002),
        };
        let output = format_access_info(&info);
        assert!(output.contains("grafana: 10.0.0.4:30002"));
        assert!(output.contains("host: 10.0.0.4"));
        assert!(output.contains("port: 30001"));

        let output = format_access_info(&AccessInfo {
            grafana_port: None,
            ..info
        });
        assert!(!output.contains("grafana"));
    }
}
