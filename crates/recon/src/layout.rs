//! Node index layout for the six-stage flow graph.
//!
//! Nodes are stored contiguously stage by stage. With `n` industries:
//!
//! | Stage | Indices |
//! |---|---|
//! | 0 industry connects | `[0, n)` |
//! | 1 unified connects | `n` |
//! | 2..=4 per-industry + drop-off | `n + 1 + (k-2)(n+1)`, then `n` industries, then the drop-off |
//! | 5 outcomes | the three slots after stage 4's drop-off |
//!
//! Every offset is derived from `n`; nothing here assumes six industries.

use serde::Serialize;

use crate::model::Outcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    IndustryConnects,
    Connects,
    Conversations,
    Meetings,
    Applications,
    Outcome,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::IndustryConnects,
        Stage::Connects,
        Stage::Conversations,
        Stage::Meetings,
        Stage::Applications,
        Stage::Outcome,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// The three stages that carry a per-industry column plus a drop-off node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropOffStage {
    Conversations,
    Meetings,
    Applications,
}

impl DropOffStage {
    pub const ALL: [DropOffStage; 3] = [
        DropOffStage::Conversations,
        DropOffStage::Meetings,
        DropOffStage::Applications,
    ];

    pub fn stage(&self) -> Stage {
        match self {
            Self::Conversations => Stage::Conversations,
            Self::Meetings => Stage::Meetings,
            Self::Applications => Stage::Applications,
        }
    }

    /// Column heading used in node labels.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Conversations => "Conversations",
            Self::Meetings => "Meetings",
            Self::Applications => "Apps",
        }
    }

    /// Drop-off labels differ by trailing dots so renderers that key nodes
    /// by label keep the three apart.
    pub fn drop_off_label(&self) -> &'static str {
        match self {
            Self::Conversations => "Not Interested",
            Self::Meetings => "Not Interested.",
            Self::Applications => "Not Interested..",
        }
    }

    /// Position among the drop-off stages, 0-based.
    fn ordinal(&self) -> usize {
        self.stage().index() - Stage::Conversations.index()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageLayout {
    industry_count: usize,
}

impl StageLayout {
    pub fn new(industry_count: usize) -> Self {
        Self { industry_count }
    }

    pub fn industry_count(&self) -> usize {
        self.industry_count
    }

    /// Width of a per-industry column including its drop-off node.
    fn column_width(&self) -> usize {
        self.industry_count + 1
    }

    /// First node index of `stage`.
    pub fn stage_start(&self, stage: Stage) -> usize {
        let n = self.industry_count;
        match stage {
            Stage::IndustryConnects => 0,
            Stage::Connects => n,
            Stage::Conversations => self.drop_off_start(DropOffStage::Conversations),
            Stage::Meetings => self.drop_off_start(DropOffStage::Meetings),
            Stage::Applications => self.drop_off_start(DropOffStage::Applications),
            Stage::Outcome => self.drop_off_index(DropOffStage::Applications) + 1,
        }
    }

    fn drop_off_start(&self, stage: DropOffStage) -> usize {
        self.industry_count + 1 + stage.ordinal() * self.column_width()
    }

    /// Drop-off node of a per-industry column: right after its industries.
    pub fn drop_off_index(&self, stage: DropOffStage) -> usize {
        self.drop_off_start(stage) + self.industry_count
    }

    /// The unified connects node.
    pub fn unified_index(&self) -> usize {
        self.stage_start(Stage::Connects)
    }

    /// Node of the `industry`-th category within a per-industry stage.
    /// Stages without per-industry nodes return `None`, as does an
    /// out-of-range industry position.
    pub fn industry_index(&self, stage: Stage, industry: usize) -> Option<usize> {
        if industry >= self.industry_count {
            return None;
        }
        match stage {
            Stage::IndustryConnects
            | Stage::Conversations
            | Stage::Meetings
            | Stage::Applications => Some(self.stage_start(stage) + industry),
            Stage::Connects | Stage::Outcome => None,
        }
    }

    pub fn outcome_index(&self, outcome: Outcome) -> usize {
        let offset = match outcome {
            Outcome::Approved => 0,
            Outcome::Rejected => 1,
            Outcome::NotProgressed => 2,
        };
        self.stage_start(Stage::Outcome) + offset
    }

    /// Total nodes: `n + 1 + 3(n + 1) + 3`.
    pub fn node_count(&self) -> usize {
        self.outcome_index(Outcome::NotProgressed) + 1
    }
}
