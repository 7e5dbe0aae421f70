use std::path::Path;

use serde::Serialize;

use crate::config::PipelineConfig;
use crate::error::ReconError;
use crate::flow::build_flow_graph;
use crate::model::{FlowGraph, ReconInput, ReconciledRow, Record, RecordSet, Role};
use crate::reconcile::reconcile;
use crate::stats::{dataset_stats, DatasetStats};

/// Everything one pass over the loaded datasets produces.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub rows: Vec<ReconciledRow>,
    /// `None` when there were no accounts.
    pub graph: Option<FlowGraph>,
    pub stats: DatasetStats,
}

/// Reconcile, aggregate and summarize. Pure: same input, same output.
pub fn run(config: &PipelineConfig, input: &ReconInput) -> PipelineResult {
    let rows = reconcile(input);
    let graph = build_flow_graph(&rows, &config.flow);
    let stats = dataset_stats(input);

    PipelineResult { rows, graph, stats }
}

/// Parse one CSV into a [`RecordSet`].
///
/// The first row is the header. Rows may be shorter than the header (the
/// missing trailing columns are simply absent) or longer (extra cells are
/// dropped). Blank lines are skipped.
pub fn load_record_set(role: Role, csv_data: &str) -> Result<RecordSet, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes());

    let csv_err = |e: csv::Error| ReconError::Csv {
        role: role.to_string(),
        message: e.to_string(),
    };

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        let row: Record = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.as_str(), v))
            .collect();
        records.push(row);
    }

    log::debug!("loaded {} {} rows, {} columns", records.len(), role, headers.len());
    Ok(RecordSet::new(headers, records))
}

/// Read every configured dataset from disk. Paths resolve against
/// `base_dir`, normally the config file's directory.
pub fn load_input(config: &PipelineConfig, base_dir: &Path) -> Result<ReconInput, ReconError> {
    let mut input = ReconInput::default();
    for (role, path) in config.datasets.resolve(base_dir) {
        let csv_data = std::fs::read_to_string(&path)
            .map_err(|e| ReconError::Io(format!("cannot read {}: {e}", path.display())))?;
        input.set(role, load_record_set(role, &csv_data)?);
    }
    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_csv_basic() {
        let csv = "\
Company Name,Dials,Connects,Conversations,Meetings Set
Acme,10,4,3,2
Globex,5,1,1,0
";
        let set = load_record_set(Role::Calls, csv).unwrap();
        assert_eq!(set.columns, vec!["Company Name", "Dials", "Connects", "Conversations", "Meetings Set"]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.records[0].text("Company Name"), "Acme");
        assert_eq!(set.records[1].count("Dials"), 5);
    }

    #[test]
    fn load_csv_ragged_rows() {
        let csv = "\
Company Name,Industry,Lifecycle Stage
Acme,Construction
Globex,Staffing,SQL,extra
";
        let set = load_record_set(Role::Accounts, csv).unwrap();
        assert_eq!(set.records[0].text("Lifecycle Stage"), "");
        assert!(!set.records[0].fields().contains_key("Lifecycle Stage"));
        assert_eq!(set.records[1].text("Lifecycle Stage"), "SQL");
        assert_eq!(set.records[1].fields().len(), 3);
    }

    #[test]
    fn load_csv_skips_blank_lines() {
        let csv = "Company Name,Dials\nAcme,1\n\n,\nGlobex,2\n";
        let set = load_record_set(Role::Calls, csv).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn load_csv_quoted_cells() {
        let csv = "Company Name,Industry\n\"Acme, Inc.\",Construction\n";
        let set = load_record_set(Role::Accounts, csv).unwrap();
        assert_eq!(set.records[0].text("Company Name"), "Acme, Inc.");
    }

    #[test]
    fn decimal_counter_cells_truncate() {
        let calls = load_record_set(
            Role::Calls,
            "Company Name,Dials,Connects,Conversations,Meetings Set\nAcme,10.0,4.0,3,2\n",
        )
        .unwrap();
        let accounts = load_record_set(Role::Accounts, "Company Name,Industry\nAcme,Construction\n").unwrap();
        let input = ReconInput {
            accounts,
            calls: Some(calls),
            ..ReconInput::default()
        };
        let row = &crate::reconcile::reconcile(&input)[0];
        assert_eq!((row.dials, row.connects), (10, 4));
        assert_eq!(row.connect_rate, "40.0%");
    }

    #[test]
    fn run_end_to_end() {
        let config = PipelineConfig::from_toml(
            "name = \"t\"\n[datasets]\naccounts = \"a.csv\"\n",
        )
        .unwrap();
        let accounts = load_record_set(
            Role::Accounts,
            "Company Name,Industry,Lifecycle Stage,Application Status\nAcme,Construction,SQL,Approved\n",
        )
        .unwrap();
        let calls = load_record_set(
            Role::Calls,
            "Company Name,Dials,Connects,Conversations,Meetings Set\nAcme,10,4,3,2\n",
        )
        .unwrap();
        let input = ReconInput {
            accounts,
            calls: Some(calls),
            ..ReconInput::default()
        };
        let result = run(&config, &input);
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].connect_rate, "40.0%");
        let graph = result.graph.unwrap();
        assert_eq!(graph.totals.connects, 4);
        assert_eq!(result.stats.calls.unwrap().total_dials, 10);
    }

    #[test]
    fn run_without_accounts_has_no_graph() {
        let config = PipelineConfig::from_toml(
            "name = \"t\"\n[datasets]\naccounts = \"a.csv\"\n",
        )
        .unwrap();
        let result = run(&config, &ReconInput::default());
        assert!(result.rows.is_empty());
        assert!(result.graph.is_none());
        assert_eq!(result.stats.total_companies, 0);
    }
}
