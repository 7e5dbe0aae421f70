use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::model::Role;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    pub datasets: DatasetsConfig,
    #[serde(default)]
    pub flow: FlowConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

// ---------------------------------------------------------------------------
// Datasets
// ---------------------------------------------------------------------------

/// CSV paths per role, relative to the config file's directory.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetsConfig {
    pub accounts: String,
    #[serde(default)]
    pub calls: Option<String>,
    #[serde(default)]
    pub emails: Option<String>,
    #[serde(default)]
    pub web_visits: Option<String>,
}

impl DatasetsConfig {
    pub fn file(&self, role: Role) -> Option<&str> {
        match role {
            Role::Accounts => Some(self.accounts.as_str()),
            Role::Calls => self.calls.as_deref(),
            Role::Emails => self.emails.as_deref(),
            Role::WebVisits => self.web_visits.as_deref(),
        }
    }

    /// Configured roles with their resolved paths, accounts first.
    pub fn resolve(&self, base_dir: &Path) -> Vec<(Role, PathBuf)> {
        Role::ALL
            .into_iter()
            .filter_map(|role| self.file(role).map(|f| (role, base_dir.join(f))))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Flow
// ---------------------------------------------------------------------------

/// Which rows the Approved / Rejected outcome counts range over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeScope {
    /// Only rows whose lifecycle stage qualifies as an application.
    #[default]
    Qualified,
    /// Every row of the industry. Statuses on non-qualifying rows can then
    /// push approved + rejected past applications.
    AllRows,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlowConfig {
    #[serde(default)]
    pub outcome_scope: OutcomeScope,
    #[serde(default = "default_qualifying_stages")]
    pub qualifying_stages: Vec<String>,
}

fn default_qualifying_stages() -> Vec<String> {
    vec!["SQL".into(), "Opportunity".into()]
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            outcome_scope: OutcomeScope::default(),
            qualifying_stages: default_qualifying_stages(),
        }
    }
}

impl FlowConfig {
    pub fn qualifies(&self, lifecycle_stage: &str) -> bool {
        self.qualifying_stages.iter().any(|s| s == lifecycle_stage)
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub reconciled_csv: Option<String>,
    #[serde(default)]
    pub flow_json: Option<String>,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

fn default_delimiter() -> char {
    ','
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            reconciled_csv: None,
            flow_json: None,
            delimiter: default_delimiter(),
        }
    }
}

impl OutputConfig {
    /// Delimiter as the single byte the CSV writer wants. Only valid after
    /// [`PipelineConfig::validate`].
    pub fn delimiter_byte(&self) -> u8 {
        u8::try_from(self.delimiter).unwrap_or(b',')
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl PipelineConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: PipelineConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.name.trim().is_empty() {
            return Err(ReconError::ConfigValidation("name must not be empty".into()));
        }

        if self.datasets.accounts.trim().is_empty() {
            return Err(ReconError::ConfigValidation(
                "datasets.accounts must name a file".into(),
            ));
        }

        for role in [Role::Calls, Role::Emails, Role::WebVisits] {
            if let Some(file) = self.datasets.file(role) {
                if file.trim().is_empty() {
                    return Err(ReconError::ConfigValidation(format!(
                        "datasets.{role} must name a file when present"
                    )));
                }
            }
        }

        if self.flow.qualifying_stages.is_empty() {
            return Err(ReconError::ConfigValidation(
                "flow.qualifying_stages must not be empty".into(),
            ));
        }

        let d = self.output.delimiter;
        if !d.is_ascii() || d == '"' || d == '\n' || d == '\r' {
            return Err(ReconError::ConfigValidation(format!(
                "output.delimiter must be a single ASCII character other than a quote or newline, got {d:?}"
            )));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
name = "Q3 outbound"

[datasets]
accounts = "master_list_hubspot.csv"
calls = "nooks.csv"
emails = "instantly.csv"
web_visits = "unify.csv"

[flow]
outcome_scope = "all_rows"
qualifying_stages = ["SQL"]

[output]
reconciled_csv = "out/reconciled.csv"
flow_json = "out/flow.json"
delimiter = ";"
"#;

    #[test]
    fn parse_full() {
        let config = PipelineConfig::from_toml(FULL).unwrap();
        assert_eq!(config.name, "Q3 outbound");
        assert_eq!(config.datasets.calls.as_deref(), Some("nooks.csv"));
        assert_eq!(config.flow.outcome_scope, OutcomeScope::AllRows);
        assert_eq!(config.flow.qualifying_stages, vec!["SQL"]);
        assert_eq!(config.output.delimiter_byte(), b';');
        assert_eq!(config.output.flow_json.as_deref(), Some("out/flow.json"));
    }

    #[test]
    fn parse_minimal_uses_defaults() {
        let config = PipelineConfig::from_toml(
            r#"
name = "Minimal"
[datasets]
accounts = "accounts.csv"
"#,
        )
        .unwrap();
        assert!(config.datasets.calls.is_none());
        assert_eq!(config.flow.outcome_scope, OutcomeScope::Qualified);
        assert!(config.flow.qualifies("SQL"));
        assert!(config.flow.qualifies("Opportunity"));
        assert!(!config.flow.qualifies("Lead"));
        assert_eq!(config.output.delimiter, ',');
        assert!(config.output.reconciled_csv.is_none());
    }

    #[test]
    fn resolve_paths_accounts_first() {
        let config = PipelineConfig::from_toml(FULL).unwrap();
        let resolved = config.datasets.resolve(Path::new("/data"));
        assert_eq!(resolved.len(), 4);
        assert_eq!(resolved[0], (Role::Accounts, PathBuf::from("/data/master_list_hubspot.csv")));
        assert_eq!(resolved[3].0, Role::WebVisits);
    }

    #[test]
    fn reject_unknown_outcome_scope() {
        let input = r#"
name = "Bad"
[datasets]
accounts = "a.csv"
[flow]
outcome_scope = "everything"
"#;
        let err = PipelineConfig::from_toml(input).unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn reject_missing_accounts() {
        let err = PipelineConfig::from_toml("name = \"x\"\n[datasets]\ncalls = \"c.csv\"\n").unwrap_err();
        assert!(err.to_string().contains("accounts"));
    }

    #[test]
    fn reject_empty_name() {
        let err = PipelineConfig::from_toml("name = \" \"\n[datasets]\naccounts = \"a.csv\"\n")
            .unwrap_err();
        assert!(err.to_string().contains("name must not be empty"));
    }

    #[test]
    fn reject_empty_qualifying_stages() {
        let input = r#"
name = "Bad"
[datasets]
accounts = "a.csv"
[flow]
qualifying_stages = []
"#;
        let err = PipelineConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("qualifying_stages"));
    }

    #[test]
    fn reject_bad_delimiter() {
        let input = r#"
name = "Bad"
[datasets]
accounts = "a.csv"
[output]
delimiter = "é"
"#;
        let err = PipelineConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("delimiter"));
    }

    #[test]
    fn reject_blank_secondary_path() {
        let input = r#"
name = "Bad"
[datasets]
accounts = "a.csv"
emails = ""
"#;
        let err = PipelineConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("datasets.emails"));
    }
}
