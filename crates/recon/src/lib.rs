//! `pipeflow-recon`: account-pipeline reconciliation and stage flow engine.
//!
//! Pure engine crate: receives pre-loaded datasets, returns reconciled rows
//! and the six-stage flow graph. The CSV loader and writer live here too so
//! the CLI and tests share one parser configuration.

pub mod config;
pub mod derived;
pub mod engine;
pub mod error;
pub mod export;
pub mod flow;
pub mod industry;
pub mod layout;
pub mod model;
pub mod reconcile;
pub mod stats;

pub use config::PipelineConfig;
pub use engine::{load_input, load_record_set, run, PipelineResult};
pub use error::ReconError;
pub use flow::build_flow_graph;
pub use industry::Industry;
pub use layout::{Stage, StageLayout};
pub use model::{FlowGraph, Record, RecordSet, ReconInput, ReconciledRow, Role};
pub use reconcile::reconcile;
