use serde::Serialize;

use crate::model::{col, ReconInput, RecordSet};
use crate::reconcile::format_rate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallStats {
    pub total_dials: u64,
    pub total_connects: u64,
    pub total_meetings: u64,
    pub avg_connect_rate: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailStats {
    pub total_sent: u64,
    pub total_opens: u64,
    pub total_clicks: u64,
    pub avg_open_rate: String,
}

/// Headline figures per dataset. Roles that were not loaded are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetStats {
    pub total_companies: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calls: Option<CallStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emails: Option<EmailStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub companies_tracked: Option<usize>,
}

fn total(set: &RecordSet, column: &str) -> u64 {
    set.records
        .iter()
        .fold(0u64, |acc, r| acc.saturating_add(r.count(column)))
}

pub fn call_stats(calls: &RecordSet) -> CallStats {
    let total_dials = total(calls, col::DIALS);
    let total_connects = total(calls, col::CONNECTS);
    CallStats {
        total_dials,
        total_connects,
        total_meetings: total(calls, col::MEETINGS_SET),
        avg_connect_rate: format_rate(total_connects, total_dials),
    }
}

pub fn email_stats(emails: &RecordSet) -> EmailStats {
    let total_sent = total(emails, col::EMAILS_SENT);
    let total_opens = total(emails, col::OPENS);
    EmailStats {
        total_sent,
        total_opens,
        total_clicks: total(emails, col::CLICKS),
        avg_open_rate: format_rate(total_opens, total_sent),
    }
}

pub fn dataset_stats(input: &ReconInput) -> DatasetStats {
    DatasetStats {
        total_companies: input.accounts.len(),
        calls: input.calls.as_ref().map(call_stats),
        emails: input.emails.as_ref().map(email_stats),
        companies_tracked: input.web_visits.as_ref().map(RecordSet::len),
    }
}
