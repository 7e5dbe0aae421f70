//! `pflow` commands: load a pipeline config, run the engine, write outputs.

use std::path::{Path, PathBuf};

use serde::Serialize;

use pipeflow_recon::export::write_reconciled_csv;
use pipeflow_recon::stats::DatasetStats;
use pipeflow_recon::{FlowGraph, PipelineConfig, PipelineResult, ReconError};

use crate::exit_codes::EXIT_ANOMALIES;
use crate::CliError;

/// Map engine errors onto the exit code registry.
fn engine_err(e: ReconError) -> CliError {
    match e {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => CliError::config(e.to_string()),
        ReconError::Csv { .. } | ReconError::Io(_) => CliError::input(e.to_string()),
        ReconError::Export(_) => CliError::output(e.to_string()),
    }
}

fn load_config(config_path: &Path) -> Result<PipelineConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| {
        CliError::config(format!("cannot read config {}: {e}", config_path.display()))
    })?;
    let config = PipelineConfig::from_toml(&config_str).map_err(engine_err)?;
    log::debug!("loaded config '{}' from {}", config.name, config_path.display());
    Ok(config)
}

/// Dataset and output paths resolve against the config file's directory.
fn base_dir(config_path: &Path) -> &Path {
    config_path.parent().unwrap_or_else(|| Path::new("."))
}

fn load_and_run(config_path: &Path) -> Result<(PipelineConfig, PipelineResult), CliError> {
    let config = load_config(config_path)?;
    let input = pipeflow_recon::load_input(&config, base_dir(config_path)).map_err(engine_err)?;
    let result = pipeflow_recon::run(&config, &input);
    Ok((config, result))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))
}

fn write_file(path: &Path, contents: &str) -> Result<(), CliError> {
    std::fs::write(path, contents)
        .map_err(|e| CliError::output(format!("cannot write {}: {e}", path.display())))?;
    eprintln!("wrote {}", path.display());
    Ok(())
}

fn write_csv_file(path: &Path, result: &PipelineResult, delimiter: u8) -> Result<(), CliError> {
    let file = std::fs::File::create(path)
        .map_err(|e| CliError::output(format!("cannot write {}: {e}", path.display())))?;
    write_reconciled_csv(file, &result.rows, delimiter).map_err(engine_err)?;
    eprintln!("wrote {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ReportMeta<'a> {
    config_name: &'a str,
    engine_version: &'static str,
    commit: &'static str,
    run_at: String,
}

#[derive(Serialize)]
struct ReportSummary {
    accounts: usize,
    reconciled: usize,
    aggregated: usize,
    excluded: usize,
    anomalies: usize,
}

#[derive(Serialize)]
struct Report<'a> {
    meta: ReportMeta<'a>,
    summary: ReportSummary,
    stats: &'a DatasetStats,
    graph: Option<&'a FlowGraph>,
}

impl<'a> Report<'a> {
    fn new(config: &'a PipelineConfig, result: &'a PipelineResult) -> Self {
        let graph = result.graph.as_ref();
        Self {
            meta: ReportMeta {
                config_name: &config.name,
                engine_version: env!("CARGO_PKG_VERSION"),
                commit: env!("PFLOW_COMMIT"),
                run_at: chrono::Utc::now().to_rfc3339(),
            },
            summary: ReportSummary {
                accounts: result.stats.total_companies,
                reconciled: result.rows.len(),
                aggregated: graph.map_or(0, |g| g.totals.rows),
                excluded: graph.map_or(0, |g| g.totals.excluded_rows),
                anomalies: graph.map_or(0, |g| g.anomalies.len()),
            },
            stats: &result.stats,
            graph,
        }
    }
}

pub fn cmd_run(config_path: PathBuf, json_output: bool, fail_on_anomaly: bool) -> Result<(), CliError> {
    let (config, result) = load_and_run(&config_path)?;
    let base = base_dir(&config_path);

    if let Some(ref file) = config.output.reconciled_csv {
        write_csv_file(&base.join(file), &result, config.output.delimiter_byte())?;
    }

    if let Some(ref file) = config.output.flow_json {
        match result.graph {
            Some(ref graph) => write_file(&base.join(file), &to_json(graph)?)?,
            None => log::warn!("no accounts loaded; skipping {file}"),
        }
    }

    if json_output {
        println!("{}", to_json(&Report::new(&config, &result))?);
    }

    // Human summary to stderr
    eprintln!("{}: {} accounts reconciled", config.name, result.rows.len());
    let anomalies = match result.graph {
        Some(ref graph) => {
            let t = &graph.totals;
            eprintln!(
                "flow: {} rows ({} excluded), {} connects, {} conversations, {} meetings, {} applications",
                t.rows, t.excluded_rows, t.connects, t.conversations, t.meetings, t.applications,
            );
            eprintln!(
                "outcomes: {} approved, {} rejected, {} not progressed",
                t.approved, t.rejected, t.not_progressed,
            );
            for anomaly in &graph.anomalies {
                let industry = anomaly.industry.map_or("all industries", |i| i.label());
                eprintln!("anomaly: {} for {} ({})", anomaly.kind, industry, anomaly.value);
            }
            graph.anomalies.len()
        }
        None => {
            eprintln!("flow: no accounts, nothing to chart");
            0
        }
    };

    if fail_on_anomaly && anomalies > 0 {
        return Err(CliError::new(EXIT_ANOMALIES, format!("{anomalies} flow anomalies found")));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// reconcile / flow
// ---------------------------------------------------------------------------

pub fn cmd_reconcile(config_path: PathBuf, output: Option<PathBuf>) -> Result<(), CliError> {
    let (config, result) = load_and_run(&config_path)?;
    let delimiter = config.output.delimiter_byte();

    match output {
        Some(path) => write_csv_file(&path, &result, delimiter),
        None => {
            let stdout = std::io::stdout();
            write_reconciled_csv(stdout.lock(), &result.rows, delimiter).map_err(engine_err)
        }
    }
}

pub fn cmd_flow(config_path: PathBuf, output: Option<PathBuf>, trace: bool) -> Result<(), CliError> {
    let (_config, result) = load_and_run(&config_path)?;

    let Some(graph) = result.graph else {
        eprintln!("no accounts loaded; no flow graph to write");
        return Ok(());
    };

    let json_str = if trace { to_json(&graph.sankey_trace())? } else { to_json(&graph)? };

    match output {
        Some(path) => write_file(&path, &json_str),
        None => {
            println!("{json_str}");
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// stats / validate
// ---------------------------------------------------------------------------

pub fn cmd_stats(config_path: PathBuf, json_output: bool) -> Result<(), CliError> {
    let (_config, result) = load_and_run(&config_path)?;
    let stats = &result.stats;

    if json_output {
        println!("{}", to_json(stats)?);
        return Ok(());
    }

    println!("companies: {}", stats.total_companies);
    match stats.calls {
        Some(ref c) => println!(
            "calls:     {} dials, {} connects, {} meetings, connect rate {}",
            c.total_dials, c.total_connects, c.total_meetings, c.avg_connect_rate,
        ),
        None => println!("calls:     not loaded"),
    }
    match stats.emails {
        Some(ref e) => println!(
            "emails:    {} sent, {} opens, {} clicks, open rate {}",
            e.total_sent, e.total_opens, e.total_clicks, e.avg_open_rate,
        ),
        None => println!("emails:    not loaded"),
    }
    match stats.companies_tracked {
        Some(n) => println!("visits:    {n} companies tracked"),
        None => println!("visits:    not loaded"),
    }
    Ok(())
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let datasets = config.datasets.resolve(base_dir(&config_path));
    eprintln!("ok: '{}' ({} datasets)", config.name, datasets.len());
    for (role, path) in &datasets {
        if !path.exists() {
            log::warn!("{role} file {} does not exist yet", path.display());
        }
    }
    Ok(())
}
