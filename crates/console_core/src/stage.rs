use std::fmt;

use serde::{Deserialize, Serialize};

/// One step of the fixed processing pipeline. Declaration order is the
/// navigation and cross-link order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum StageKey {
    #[default]
    Ingest,
    Ocr,
    OperatorA,
    OperatorB,
    Match,
    Review,
    Approve,
    Export,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageConfig {
    pub key: StageKey,
    pub title: &'static str,
    pub description: &'static str,
}

pub const STAGES: [StageConfig; 8] = [
    StageConfig {
        key: StageKey::Ingest,
        title: "Ingestion",
        description: "Register the uploaded file and refresh its classification metadata.",
    },
    StageConfig {
        key: StageKey::Ocr,
        title: "OCR",
        description: "Run text recognition and store the document transcript.",
    },
    StageConfig {
        key: StageKey::OperatorA,
        title: "Operator A",
        description: "Extract candidate rows with the rule-based operator.",
    },
    StageConfig {
        key: StageKey::OperatorB,
        title: "Operator B",
        description: "Extract candidate rows with the heuristic operator.",
    },
    StageConfig {
        key: StageKey::Match,
        title: "Match",
        description: "Compare both operators' rows and flag disputes.",
    },
    StageConfig {
        key: StageKey::Review,
        title: "Review",
        description: "Fetch comparison rows for manual review, optionally filtered by status.",
    },
    StageConfig {
        key: StageKey::Approve,
        title: "Approve",
        description: "Record the approver and mark the document as approved.",
    },
    StageConfig {
        key: StageKey::Export,
        title: "Export",
        description: "Generate the CSV bundle and QA report for approved documents.",
    },
];

impl StageKey {
    pub const ALL: [StageKey; 8] = [
        StageKey::Ingest,
        StageKey::Ocr,
        StageKey::OperatorA,
        StageKey::OperatorB,
        StageKey::Match,
        StageKey::Review,
        StageKey::Approve,
        StageKey::Export,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StageKey::Ingest => "ingest",
            StageKey::Ocr => "ocr",
            StageKey::OperatorA => "operator_a",
            StageKey::OperatorB => "operator_b",
            StageKey::Match => "match",
            StageKey::Review => "review",
            StageKey::Approve => "approve",
            StageKey::Export => "export",
        }
    }

    /// Registry lookup by wire key. Anything outside the fixed set is `None`.
    pub fn parse(raw: &str) -> Option<StageKey> {
        StageKey::ALL
            .into_iter()
            .find(|key| key.as_str() == raw)
    }

    pub fn config(self) -> &'static StageConfig {
        &STAGES[self.index()]
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for StageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered stage catalog.
pub fn stages() -> &'static [StageConfig] {
    &STAGES
}

pub fn lookup(raw: &str) -> Option<&'static StageConfig> {
    StageKey::parse(raw).map(StageKey::config)
}
