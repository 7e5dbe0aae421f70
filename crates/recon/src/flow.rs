//! Reconciled rows -> six-stage flow graph.
//!
//! Rows are grouped by industry category, each category's pipeline counts
//! become per-stage nodes, and every stage-to-stage transition becomes a
//! link. Whatever does not advance is routed to the next stage's drop-off
//! node. Links are only emitted for strictly positive values; a negative
//! value means the input contradicts itself and is reported as a
//! [`FlowAnomaly`] instead.

use std::cmp::Ordering;

use serde::Serialize;

use crate::config::{FlowConfig, OutcomeScope};
use crate::industry::{
    link_color, Industry, APPROVED_COLOR, NEUTRAL_COLOR, NEUTRAL_LINK_COLOR, REJECTED_COLOR,
    UNIFIED_COLOR,
};
use crate::layout::{DropOffStage, Stage, StageLayout};
use crate::model::{
    AnomalyKind, FlowAnomaly, FlowGraph, FlowTotals, Link, LinkKind, Node, NodeKind, Outcome,
    ReconciledRow,
};
use crate::reconcile::format_rate;

const APPROVED_STATUS: &str = "Approved";
const REJECTED_STATUS: &str = "Rejected";

/// Pipeline counts for one industry category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndustryTotals {
    pub connects: u64,
    pub conversations: u64,
    pub meetings: u64,
    pub applications: u64,
    pub approved: u64,
    pub rejected: u64,
}

impl IndustryTotals {
    /// Applications with no recorded outcome. Negative only when the
    /// outcome counts disagree with the application count.
    pub fn remaining(&self) -> i128 {
        i128::from(self.applications) - i128::from(self.approved) - i128::from(self.rejected)
    }

    fn stage_value(&self, stage: DropOffStage) -> u64 {
        match stage {
            DropOffStage::Conversations => self.conversations,
            DropOffStage::Meetings => self.meetings,
            DropOffStage::Applications => self.applications,
        }
    }
}

/// Per-industry aggregation result, in the order nodes are laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndustryAggregates {
    pub industries: Vec<(Industry, IndustryTotals)>,
    /// Rows that landed in a category.
    pub rows: usize,
    /// Rows whose industry was not one of the categories.
    pub excluded_rows: usize,
}

/// Sum pipeline counts per category. Rows whose industry matches none of
/// `categories` are counted in `excluded_rows` and otherwise ignored.
pub fn aggregate_by_industry(
    rows: &[ReconciledRow],
    categories: &[Industry],
    config: &FlowConfig,
) -> IndustryAggregates {
    let mut industries: Vec<(Industry, IndustryTotals)> = categories
        .iter()
        .map(|&i| (i, IndustryTotals::default()))
        .collect();
    let mut aggregated = 0;
    let mut excluded_rows = 0;

    for row in rows {
        let slot = Industry::from_label(&row.industry)
            .and_then(|ind| industries.iter_mut().find(|(i, _)| *i == ind));
        let Some((_, totals)) = slot else {
            excluded_rows += 1;
            continue;
        };
        aggregated += 1;

        totals.connects = totals.connects.saturating_add(row.connects);
        totals.conversations = totals.conversations.saturating_add(row.conversations);
        totals.meetings = totals.meetings.saturating_add(row.meetings_set);

        let qualifies = config.qualifies(&row.lifecycle_stage);
        if qualifies {
            totals.applications += 1;
        }

        let counts_outcome = match config.outcome_scope {
            OutcomeScope::Qualified => qualifies,
            OutcomeScope::AllRows => true,
        };
        if counts_outcome {
            match row.application_status.as_str() {
                APPROVED_STATUS => totals.approved += 1,
                REJECTED_STATUS => totals.rejected += 1,
                _ => {}
            }
        }
    }

    if excluded_rows > 0 {
        log::debug!("{excluded_rows} row(s) outside the industry categories left out of the flow");
    }

    IndustryAggregates {
        industries,
        rows: aggregated,
        excluded_rows,
    }
}

/// Build the flow graph over the six standard industry categories.
///
/// Returns `None` for an empty row set.
pub fn build_flow_graph(rows: &[ReconciledRow], config: &FlowConfig) -> Option<FlowGraph> {
    build_flow_graph_for(rows, &Industry::sorted(), config)
}

/// Build the flow graph over an explicit category list. Node positions are
/// derived from `categories.len()`.
pub fn build_flow_graph_for(
    rows: &[ReconciledRow],
    categories: &[Industry],
    config: &FlowConfig,
) -> Option<FlowGraph> {
    if rows.is_empty() {
        return None;
    }

    let aggregates = aggregate_by_industry(rows, categories, config);
    let layout = StageLayout::new(aggregates.industries.len());
    let totals = flow_totals(&aggregates);
    let nodes = build_nodes(&layout, &aggregates, &totals);
    debug_assert_eq!(nodes.len(), layout.node_count());

    let (links, anomalies) = candidate_edges(&layout, &aggregates, &totals)
        .into_iter()
        .fold((Vec::new(), Vec::new()), |(mut links, mut anomalies), edge| {
            match edge.value.cmp(&0) {
                Ordering::Greater => links.push(edge.into_link()),
                Ordering::Less => {
                    if let Some(anomaly) = edge.anomaly() {
                        log::debug!(
                            "clamped {} for {}: {}",
                            anomaly.kind,
                            anomaly.industry.map_or("all industries", |i| i.label()),
                            anomaly.value
                        );
                        anomalies.push(anomaly);
                    }
                }
                Ordering::Equal => {}
            }
            (links, anomalies)
        });

    log::debug!(
        "flow graph: {} nodes, {} links, {} anomalies",
        nodes.len(),
        links.len(),
        anomalies.len()
    );

    Some(FlowGraph {
        nodes,
        links,
        totals,
        anomalies,
    })
}

fn flow_totals(aggregates: &IndustryAggregates) -> FlowTotals {
    let sum = |f: fn(&IndustryTotals) -> u64| {
        aggregates
            .industries
            .iter()
            .fold(0u64, |acc, (_, t)| acc.saturating_add(f(t)))
    };
    let connects = sum(|t| t.connects);
    let conversations = sum(|t| t.conversations);
    let meetings = sum(|t| t.meetings);
    let applications = sum(|t| t.applications);
    let not_progressed = sum(|t| u64::try_from(t.remaining()).unwrap_or(0));

    FlowTotals {
        rows: aggregates.rows,
        excluded_rows: aggregates.excluded_rows,
        connects,
        conversations,
        meetings,
        applications,
        approved: sum(|t| t.approved),
        rejected: sum(|t| t.rejected),
        not_progressed,
        conversation_rate: format_rate(conversations, connects),
        meeting_rate: format_rate(meetings, conversations),
        application_rate: format_rate(applications, meetings),
    }
}

fn build_nodes(layout: &StageLayout, aggregates: &IndustryAggregates, totals: &FlowTotals) -> Vec<Node> {
    let mut nodes = Vec::with_capacity(layout.node_count());

    for (industry, t) in &aggregates.industries {
        nodes.push(Node {
            label: format!("{industry}\n{}", t.connects),
            color: industry.color().to_string(),
            stage: Stage::IndustryConnects,
            kind: NodeKind::IndustryConnects { industry: *industry },
        });
    }

    nodes.push(Node {
        label: format!("Connects\n{}", totals.connects),
        color: UNIFIED_COLOR.to_string(),
        stage: Stage::Connects,
        kind: NodeKind::UnifiedConnects,
    });

    for stage in DropOffStage::ALL {
        for (industry, t) in &aggregates.industries {
            nodes.push(Node {
                label: format!("{} - {industry}\n{}", stage.display_name(), t.stage_value(stage)),
                color: industry.color().to_string(),
                stage: stage.stage(),
                kind: NodeKind::IndustryStage { industry: *industry },
            });
        }
        nodes.push(Node {
            label: stage.drop_off_label().to_string(),
            color: NEUTRAL_COLOR.to_string(),
            stage: stage.stage(),
            kind: NodeKind::DropOff,
        });
    }

    for outcome in Outcome::ALL {
        let color = match outcome {
            Outcome::Approved => APPROVED_COLOR,
            Outcome::Rejected => REJECTED_COLOR,
            Outcome::NotProgressed => NEUTRAL_COLOR,
        };
        nodes.push(Node {
            label: outcome.label().to_string(),
            color: color.to_string(),
            stage: Stage::Outcome,
            kind: NodeKind::Outcome { outcome },
        });
    }

    nodes
}

/// A link before the positivity check.
struct Edge {
    source: usize,
    target: usize,
    value: i128,
    color: String,
    kind: LinkKind,
    industry: Option<Industry>,
}

impl Edge {
    fn into_link(self) -> Link {
        Link {
            source: self.source,
            target: self.target,
            value: u64::try_from(self.value).unwrap_or(u64::MAX),
            color: self.color,
            kind: self.kind,
            industry: self.industry,
        }
    }

    /// Only the difference-valued links can go negative.
    fn anomaly(&self) -> Option<FlowAnomaly> {
        let kind = match self.kind {
            LinkKind::ConnectDropOff => AnomalyKind::NegativeConnectDropOff,
            LinkKind::ConversationDropOff => AnomalyKind::NegativeConversationDropOff,
            LinkKind::MeetingDropOff => AnomalyKind::NegativeMeetingDropOff,
            LinkKind::NotProgressed => AnomalyKind::NegativeRemaining,
            _ => return None,
        };
        Some(FlowAnomaly {
            kind,
            industry: self.industry,
            value: self.value,
        })
    }
}

fn diff(a: u64, b: u64) -> i128 {
    i128::from(a) - i128::from(b)
}

/// Every candidate edge, per industry in layout order, then the aggregate
/// connect drop-off.
fn candidate_edges(layout: &StageLayout, aggregates: &IndustryAggregates, totals: &FlowTotals) -> Vec<Edge> {
    let unified = layout.unified_index();
    let conversation_drop = layout.drop_off_index(DropOffStage::Conversations);
    let meeting_drop = layout.drop_off_index(DropOffStage::Meetings);
    let application_drop = layout.drop_off_index(DropOffStage::Applications);
    let approved = layout.outcome_index(Outcome::Approved);
    let rejected = layout.outcome_index(Outcome::Rejected);
    let not_progressed = layout.outcome_index(Outcome::NotProgressed);
    let rejected_link = link_color(REJECTED_COLOR);

    let mut edges: Vec<Edge> = aggregates
        .industries
        .iter()
        .enumerate()
        .flat_map(|(i, (industry, t))| {
            let at = |stage: Stage| layout.stage_start(stage) + i;
            let connects = at(Stage::IndustryConnects);
            let conversations = at(Stage::Conversations);
            let meetings = at(Stage::Meetings);
            let applications = at(Stage::Applications);
            let tinted = industry.link_color();
            let edge = |source: usize, target: usize, value: i128, color: &str, kind: LinkKind| Edge {
                source,
                target,
                value,
                color: color.to_string(),
                kind,
                industry: Some(*industry),
            };

            [
                edge(connects, unified, t.connects.into(), &tinted, LinkKind::Connects),
                edge(unified, conversations, t.conversations.into(), &tinted, LinkKind::Conversations),
                edge(conversations, meetings, t.meetings.into(), &tinted, LinkKind::Meetings),
                edge(
                    conversations,
                    meeting_drop,
                    diff(t.conversations, t.meetings),
                    NEUTRAL_LINK_COLOR,
                    LinkKind::ConversationDropOff,
                ),
                edge(meetings, applications, t.applications.into(), &tinted, LinkKind::Applications),
                edge(
                    meetings,
                    application_drop,
                    diff(t.meetings, t.applications),
                    NEUTRAL_LINK_COLOR,
                    LinkKind::MeetingDropOff,
                ),
                edge(applications, approved, t.approved.into(), &tinted, LinkKind::Approved),
                edge(applications, rejected, t.rejected.into(), &rejected_link, LinkKind::Rejected),
                edge(
                    applications,
                    not_progressed,
                    t.remaining(),
                    NEUTRAL_LINK_COLOR,
                    LinkKind::NotProgressed,
                ),
            ]
        })
        .collect();

    edges.push(Edge {
        source: unified,
        target: conversation_drop,
        value: diff(totals.connects, totals.conversations),
        color: NEUTRAL_LINK_COLOR.to_string(),
        kind: LinkKind::ConnectDropOff,
        industry: None,
    });

    edges
}
