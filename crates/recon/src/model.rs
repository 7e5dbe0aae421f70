use std::collections::HashMap;

use serde::Serialize;

use crate::industry::Industry;
use crate::layout::Stage;

/// Column names read from the four input datasets.
pub mod col {
    pub const COMPANY_NAME: &str = "Company Name";

    pub const INDUSTRY: &str = "Industry";
    pub const COMPANY_SIZE: &str = "Company Size";
    pub const REVENUE_RANGE: &str = "Revenue Range";
    pub const LIFECYCLE_STAGE: &str = "Lifecycle Stage";
    pub const APPLICATION_STATUS: &str = "Application Status";

    pub const DIALS: &str = "Dials";
    pub const CONNECTS: &str = "Connects";
    pub const CONVERSATIONS: &str = "Conversations";
    pub const MEETINGS_SET: &str = "Meetings Set";

    pub const EMAILS_SENT: &str = "Emails Sent";
    pub const OPENS: &str = "Opens";
    pub const CLICKS: &str = "Clicks";

    pub const DATE_OF_LAST_VISIT: &str = "Date of Last Visit";
    pub const PAGES_VISITED: &str = "Pages Visited";
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One parsed CSV row: column name -> raw cell text.
///
/// Reads never fail. A missing column is the empty string, and counters that
/// don't parse as unsigned integers are 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: HashMap<String, String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for fixtures.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(column.into(), value.into());
    }

    pub fn text(&self, column: &str) -> &str {
        self.fields.get(column).map(String::as_str).unwrap_or("")
    }

    pub fn count(&self, column: &str) -> u64 {
        parse_count(self.text(column))
    }

    pub fn fields(&self) -> &HashMap<String, String> {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Unsigned counter coercion. Surrounding whitespace is ignored and the
/// leading run of digits is the value, so `"10.0"` reads as 10. Cells with
/// no leading digits (text, negatives, `".5"`) read as 0; overlong digit
/// runs saturate.
pub fn parse_count(cell: &str) -> u64 {
    let cell = cell.trim();
    let cell = cell.strip_prefix('+').unwrap_or(cell);
    let end = cell.find(|c: char| !c.is_ascii_digit()).unwrap_or(cell.len());
    if end == 0 {
        return 0;
    }
    cell[..end].parse().unwrap_or(u64::MAX)
}

/// Records from one CSV, plus its header in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl RecordSet {
    pub fn new(columns: Vec<String>, records: Vec<Record>) -> Self {
        Self { columns, records }
    }

    /// Build a set without a declared header; columns are collected from the
    /// records in first-seen order.
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in &records {
            let mut keys: Vec<&String> = record.fields().keys().collect();
            keys.sort();
            for key in keys {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
        Self { columns, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// The four dataset roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Accounts,
    Calls,
    Emails,
    WebVisits,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Accounts, Role::Calls, Role::Emails, Role::WebVisits];
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accounts => write!(f, "accounts"),
            Self::Calls => write!(f, "calls"),
            Self::Emails => write!(f, "emails"),
            Self::WebVisits => write!(f, "web_visits"),
        }
    }
}

/// Pre-loaded datasets. Only `accounts` is mandatory; a missing secondary
/// set behaves exactly like an empty one.
#[derive(Debug, Clone, Default)]
pub struct ReconInput {
    pub accounts: RecordSet,
    pub calls: Option<RecordSet>,
    pub emails: Option<RecordSet>,
    pub web_visits: Option<RecordSet>,
}

impl ReconInput {
    pub fn new(accounts: RecordSet) -> Self {
        Self {
            accounts,
            ..Self::default()
        }
    }

    pub fn get(&self, role: Role) -> Option<&RecordSet> {
        match role {
            Role::Accounts => Some(&self.accounts),
            Role::Calls => self.calls.as_ref(),
            Role::Emails => self.emails.as_ref(),
            Role::WebVisits => self.web_visits.as_ref(),
        }
    }

    pub fn set(&mut self, role: Role, set: RecordSet) {
        match role {
            Role::Accounts => self.accounts = set,
            Role::Calls => self.calls = Some(set),
            Role::Emails => self.emails = Some(set),
            Role::WebVisits => self.web_visits = Some(set),
        }
    }
}

// ---------------------------------------------------------------------------
// Reconciled table
// ---------------------------------------------------------------------------

/// Export header, in column order.
pub const RECONCILED_HEADERS: [&str; 17] = [
    "Company Name",
    "Industry",
    "Company Size",
    "Revenue Range",
    "Lifecycle Stage",
    "Application Status",
    "Dials",
    "Connects",
    "Connect Rate",
    "Conversations",
    "Meetings Set",
    "Meeting Rate",
    "Emails Sent",
    "Email Opens",
    "Email Clicks",
    "Last Website Visit",
    "Pages Visited",
];

/// One account joined with its call, email and web-visit activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciledRow {
    pub company_name: String,
    pub industry: String,
    pub company_size: String,
    pub revenue_range: String,
    pub lifecycle_stage: String,
    pub application_status: String,
    pub dials: u64,
    pub connects: u64,
    pub connect_rate: String,
    pub conversations: u64,
    pub meetings_set: u64,
    pub meeting_rate: String,
    pub emails_sent: u64,
    pub email_opens: u64,
    pub email_clicks: u64,
    pub last_website_visit: String,
    pub pages_visited: u64,
    /// The untouched account record, every column included.
    #[serde(skip)]
    pub account: Record,
}

impl ReconciledRow {
    /// Cells in [`RECONCILED_HEADERS`] order.
    pub fn cells(&self) -> [String; 17] {
        [
            self.company_name.clone(),
            self.industry.clone(),
            self.company_size.clone(),
            self.revenue_range.clone(),
            self.lifecycle_stage.clone(),
            self.application_status.clone(),
            self.dials.to_string(),
            self.connects.to_string(),
            self.connect_rate.clone(),
            self.conversations.to_string(),
            self.meetings_set.to_string(),
            self.meeting_rate.clone(),
            self.emails_sent.to_string(),
            self.email_opens.to_string(),
            self.email_clicks.to_string(),
            self.last_website_visit.clone(),
            self.pages_visited.to_string(),
        ]
    }

    /// Look up a value by export header, falling back to the original
    /// account columns for anything outside the fixed header.
    pub fn field(&self, column: &str) -> Option<String> {
        match RECONCILED_HEADERS.iter().position(|h| *h == column) {
            Some(i) => self.cells().into_iter().nth(i),
            None => self.account.fields().get(column).cloned(),
        }
    }
}

// ---------------------------------------------------------------------------
// Flow graph
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Approved,
    Rejected,
    NotProgressed,
}

impl Outcome {
    pub const ALL: [Outcome; 3] = [Outcome::Approved, Outcome::Rejected, Outcome::NotProgressed];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::NotProgressed => "Not Progressed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    IndustryConnects { industry: Industry },
    UnifiedConnects,
    IndustryStage { industry: Industry },
    DropOff,
    Outcome { outcome: Outcome },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub label: String,
    pub color: String,
    pub stage: Stage,
    #[serde(flatten)]
    pub kind: NodeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    Connects,
    Conversations,
    ConnectDropOff,
    Meetings,
    ConversationDropOff,
    Applications,
    MeetingDropOff,
    Approved,
    Rejected,
    NotProgressed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub source: usize,
    pub target: usize,
    pub value: u64,
    pub color: String,
    pub kind: LinkKind,
    /// `None` only for the aggregate unified -> drop-off link.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<Industry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// Conversations across all industries exceed connects.
    NegativeConnectDropOff,
    /// Meetings exceed conversations for an industry.
    NegativeConversationDropOff,
    /// Applications exceed meetings for an industry.
    NegativeMeetingDropOff,
    /// Approved + rejected exceed applications for an industry.
    NegativeRemaining,
}

impl std::fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NegativeConnectDropOff => write!(f, "negative_connect_drop_off"),
            Self::NegativeConversationDropOff => write!(f, "negative_conversation_drop_off"),
            Self::NegativeMeetingDropOff => write!(f, "negative_meeting_drop_off"),
            Self::NegativeRemaining => write!(f, "negative_remaining"),
        }
    }
}

/// A flow that computed negative and was clamped (not emitted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowAnomaly {
    pub kind: AnomalyKind,
    pub industry: Option<Industry>,
    /// Difference of two u64 sums, so it always fits.
    pub value: i128,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlowTotals {
    /// Rows that matched an industry category.
    pub rows: usize,
    /// Rows left out because their industry is not a known category.
    pub excluded_rows: usize,
    pub connects: u64,
    pub conversations: u64,
    pub meetings: u64,
    pub applications: u64,
    pub approved: u64,
    pub rejected: u64,
    pub not_progressed: u64,
    pub conversation_rate: String,
    pub meeting_rate: String,
    pub application_rate: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowGraph {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    pub totals: FlowTotals,
    pub anomalies: Vec<FlowAnomaly>,
}
