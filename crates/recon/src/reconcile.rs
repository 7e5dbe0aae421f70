use std::collections::HashMap;

use crate::model::{col, ReconInput, ReconciledRow, Record, RecordSet};

/// Index a secondary dataset by company name. Later rows win.
pub fn index_by_company(set: Option<&RecordSet>) -> HashMap<&str, &Record> {
    let mut index: HashMap<&str, &Record> = HashMap::new();
    let Some(set) = set else {
        return index;
    };
    for record in &set.records {
        if index.insert(record.text(col::COMPANY_NAME), record).is_some() {
            log::debug!(
                "duplicate company name '{}', keeping the later row",
                record.text(col::COMPANY_NAME)
            );
        }
    }
    index
}

/// `numerator / denominator` as a percentage with one decimal, e.g. `"40.0%"`.
///
/// Rounds half-up in integer arithmetic. A zero denominator yields exactly
/// `"0%"`.
pub fn format_rate(numerator: u64, denominator: u64) -> String {
    if denominator == 0 {
        return "0%".to_string();
    }
    let num = u128::from(numerator) * 1000;
    let den = u128::from(denominator);
    let tenths = (num + den / 2) / den;
    format!("{}.{}%", tenths / 10, tenths % 10)
}

/// Join every account against the call, email and web-visit logs.
///
/// Output has one row per account, in account order. Unmatched accounts get
/// zeroed activity fields.
pub fn reconcile(input: &ReconInput) -> Vec<ReconciledRow> {
    let calls = index_by_company(input.calls.as_ref());
    let emails = index_by_company(input.emails.as_ref());
    let visits = index_by_company(input.web_visits.as_ref());
    let empty = Record::new();

    let rows: Vec<ReconciledRow> = input
        .accounts
        .records
        .iter()
        .map(|account| {
            let name = account.text(col::COMPANY_NAME);
            let call = calls.get(name).copied().unwrap_or(&empty);
            let email = emails.get(name).copied().unwrap_or(&empty);
            let visit = visits.get(name).copied().unwrap_or(&empty);
            reconcile_row(account, call, email, visit)
        })
        .collect();

    log::debug!(
        "reconciled {} accounts ({} call, {} email, {} web-visit keys)",
        rows.len(),
        calls.len(),
        emails.len(),
        visits.len()
    );
    rows
}

fn reconcile_row(account: &Record, call: &Record, email: &Record, visit: &Record) -> ReconciledRow {
    let dials = call.count(col::DIALS);
    let connects = call.count(col::CONNECTS);
    let meetings_set = call.count(col::MEETINGS_SET);

    ReconciledRow {
        company_name: account.text(col::COMPANY_NAME).to_string(),
        industry: account.text(col::INDUSTRY).to_string(),
        company_size: account.text(col::COMPANY_SIZE).to_string(),
        revenue_range: account.text(col::REVENUE_RANGE).to_string(),
        lifecycle_stage: account.text(col::LIFECYCLE_STAGE).to_string(),
        application_status: account.text(col::APPLICATION_STATUS).to_string(),
        dials,
        connects,
        connect_rate: format_rate(connects, dials),
        conversations: call.count(col::CONVERSATIONS),
        meetings_set,
        meeting_rate: format_rate(meetings_set, dials),
        emails_sent: email.count(col::EMAILS_SENT),
        email_opens: email.count(col::OPENS),
        email_clicks: email.count(col::CLICKS),
        last_website_visit: visit.text(col::DATE_OF_LAST_VISIT).to_string(),
        pages_visited: visit.count(col::PAGES_VISITED),
        account: account.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn account(name: &str, industry: &str) -> Record {
        Record::new()
            .with(col::COMPANY_NAME, name)
            .with(col::INDUSTRY, industry)
    }

    fn call(name: &str, dials: &str, connects: &str, convos: &str, meetings: &str) -> Record {
        Record::new()
            .with(col::COMPANY_NAME, name)
            .with(col::DIALS, dials)
            .with(col::CONNECTS, connects)
            .with(col::CONVERSATIONS, convos)
            .with(col::MEETINGS_SET, meetings)
    }

    #[test]
    fn rate_formatting() {
        assert_eq!(format_rate(4, 10), "40.0%");
        assert_eq!(format_rate(2, 10), "20.0%");
        assert_eq!(format_rate(1, 3), "33.3%");
        assert_eq!(format_rate(2, 3), "66.7%");
        assert_eq!(format_rate(10, 10), "100.0%");
        assert_eq!(format_rate(0, 7), "0.0%");
        assert_eq!(format_rate(5, 0), "0%");
        assert_eq!(format_rate(0, 0), "0%");
    }

    #[test]
    fn rate_rounds_half_up() {
        // 1/8 = 12.5% exactly, 1/16 = 6.25% -> 6.3%
        assert_eq!(format_rate(1, 8), "12.5%");
        assert_eq!(format_rate(1, 16), "6.3%");
        assert_eq!(format_rate(1, 400), "0.3%");
    }

    #[test]
    fn rate_not_capped_when_connects_exceed_dials() {
        assert_eq!(format_rate(15, 10), "150.0%");
    }

    #[test]
    fn acme_scenario() {
        let input = ReconInput {
            accounts: RecordSet::from_records(vec![account("Acme", "Construction")
                .with(col::LIFECYCLE_STAGE, "SQL")
                .with(col::APPLICATION_STATUS, "Approved")]),
            calls: Some(RecordSet::from_records(vec![call("Acme", "10", "4", "3", "2")])),
            ..ReconInput::default()
        };
        let rows = reconcile(&input);
        assert_eq!(rows.len(), 1);
        let r = &rows[0];
        assert_eq!(r.dials, 10);
        assert_eq!(r.connects, 4);
        assert_eq!(r.connect_rate, "40.0%");
        assert_eq!(r.conversations, 3);
        assert_eq!(r.meetings_set, 2);
        assert_eq!(r.meeting_rate, "20.0%");
        assert_eq!(r.lifecycle_stage, "SQL");
        assert_eq!(r.application_status, "Approved");
        assert_eq!(r.emails_sent, 0);
        assert_eq!(r.last_website_visit, "");
    }

    #[test]
    fn unmatched_account_gets_zeroes() {
        let input = ReconInput {
            accounts: RecordSet::from_records(vec![account("Lonely", "Staffing")]),
            calls: Some(RecordSet::from_records(vec![call("Other", "5", "1", "1", "0")])),
            ..ReconInput::default()
        };
        let r = &reconcile(&input)[0];
        assert_eq!(r.dials, 0);
        assert_eq!(r.connect_rate, "0%");
        assert_eq!(r.meeting_rate, "0%");
        assert_eq!(r.pages_visited, 0);
        assert_eq!(r.company_size, "");
    }

    #[test]
    fn duplicate_secondary_key_last_wins() {
        let input = ReconInput {
            accounts: RecordSet::from_records(vec![account("Acme", "Construction")]),
            calls: Some(RecordSet::from_records(vec![
                call("Acme", "10", "1", "0", "0"),
                call("Acme", "20", "5", "0", "0"),
            ])),
            ..ReconInput::default()
        };
        let r = &reconcile(&input)[0];
        assert_eq!(r.dials, 20);
        assert_eq!(r.connect_rate, "25.0%");
    }

    #[test]
    fn non_numeric_counters_coerce() {
        let input = ReconInput {
            accounts: RecordSet::from_records(vec![account("Acme", "Construction")]),
            calls: Some(RecordSet::from_records(vec![call("Acme", "ten", "4", "", "x")])),
            ..ReconInput::default()
        };
        let r = &reconcile(&input)[0];
        assert_eq!(r.dials, 0);
        assert_eq!(r.connects, 4);
        assert_eq!(r.connect_rate, "0%");
        assert_eq!(r.conversations, 0);
        assert_eq!(r.meetings_set, 0);
    }

    #[test]
    fn email_and_visit_fields() {
        let input = ReconInput {
            accounts: RecordSet::from_records(vec![account("Acme", "Construction")]),
            emails: Some(RecordSet::from_records(vec![Record::new()
                .with(col::COMPANY_NAME, "Acme")
                .with(col::EMAILS_SENT, "12")
                .with(col::OPENS, "6")
                .with(col::CLICKS, "2")])),
            web_visits: Some(RecordSet::from_records(vec![Record::new()
                .with(col::COMPANY_NAME, "Acme")
                .with(col::DATE_OF_LAST_VISIT, "2025-03-14")
                .with(col::PAGES_VISITED, "9")])),
            ..ReconInput::default()
        };
        let r = &reconcile(&input)[0];
        assert_eq!((r.emails_sent, r.email_opens, r.email_clicks), (12, 6, 2));
        assert_eq!(r.last_website_visit, "2025-03-14");
        assert_eq!(r.pages_visited, 9);
    }

    #[test]
    fn extra_account_columns_preserved() {
        let input = ReconInput::new(RecordSet::from_records(vec![
            account("Acme", "Construction").with("Owner", "Dana"),
        ]));
        let r = &reconcile(&input)[0];
        assert_eq!(r.field("Owner").as_deref(), Some("Dana"));
        assert_eq!(r.field("Connect Rate").as_deref(), Some("0%"));
    }

    #[test]
    fn empty_accounts_empty_output() {
        assert!(reconcile(&ReconInput::default()).is_empty());
    }

    proptest! {
        #[test]
        fn preserves_length_and_order(names in proptest::collection::vec("[A-Za-z]{1,8}", 0..40)) {
            let accounts = RecordSet::from_records(
                names.iter().map(|n| account(n, "Staffing")).collect(),
            );
            let calls = RecordSet::from_records(
                names.iter().step_by(2).map(|n| call(n, "3", "1", "1", "0")).collect(),
            );
            let input = ReconInput {
                accounts,
                calls: Some(calls),
                ..ReconInput::default()
            };
            let rows = reconcile(&input);
            prop_assert_eq!(rows.len(), names.len());
            for (row, name) in rows.iter().zip(&names) {
                prop_assert_eq!(&row.company_name, name);
            }
        }

        #[test]
        fn zero_dials_means_zero_rates(connects in 0u64..1000, meetings in 0u64..1000) {
            let input = ReconInput {
                accounts: RecordSet::from_records(vec![account("Acme", "Staffing")]),
                calls: Some(RecordSet::from_records(vec![call(
                    "Acme",
                    "0",
                    &connects.to_string(),
                    "0",
                    &meetings.to_string(),
                )])),
                ..ReconInput::default()
            };
            let r = &reconcile(&input)[0];
            prop_assert_eq!(r.connect_rate.as_str(), "0%");
            prop_assert_eq!(r.meeting_rate.as_str(), "0%");
        }

        #[test]
        fn rate_matches_rounded_ratio(connects in 0u64..5000, dials in 1u64..5000) {
            let expected = (connects as f64 * 1000.0 / dials as f64 + 0.5).floor() as u64;
            let rate = format_rate(connects, dials);
            let digits: String = rate.trim_end_matches('%').chars().filter(|c| *c != '.').collect();
            prop_assert!(rate.ends_with('%'));
            prop_assert_eq!(rate.split('.').nth(1).map(|s| s.len()), Some(2));
            // Float comparison is only exact away from .x5 ties.
            let frac = (connects as f64 * 1000.0 / dials as f64).fract();
            if (frac - 0.5).abs() > 1e-6 {
                prop_assert_eq!(digits.parse::<u64>().unwrap(), expected);
            }
        }
    }
}
