use std::collections::BTreeMap;

use thiserror::Error;

use crate::StageKey;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("{label} is required.")]
    MissingRequired { label: &'static str },
    #[error("{label}: unsupported value {value:?}.")]
    InvalidChoice { label: &'static str, value: String },
    #[error("Select a document first.")]
    NoDocument,
}

/// Field values entered by the operator, keyed by field name.
pub type FormFields = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    ShortText,
    MultiLineText,
    Choice(&'static [ChoiceOption]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChoiceOption {
    pub value: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

const REVIEW_STATUS_CHOICES: [ChoiceOption; 3] = [
    ChoiceOption {
        value: "",
        label: "All",
    },
    ChoiceOption {
        value: "dispute",
        label: "Dispute",
    },
    ChoiceOption {
        value: "agreement",
        label: "Agreement",
    },
];

const APPROVE_FIELDS: [FieldSpec; 2] = [
    FieldSpec {
        name: "approver_id",
        label: "Approver ID",
        kind: FieldKind::ShortText,
        required: true,
    },
    FieldSpec {
        name: "summary",
        label: "Summary",
        kind: FieldKind::MultiLineText,
        required: false,
    },
];

const REVIEW_FIELDS: [FieldSpec; 1] = [FieldSpec {
    name: "status",
    label: "Status filter",
    kind: FieldKind::Choice(&REVIEW_STATUS_CHOICES),
    required: false,
}];

const EXPORT_FIELDS: [FieldSpec; 1] = [FieldSpec {
    name: "output_dir",
    label: "Output directory",
    kind: FieldKind::ShortText,
    required: false,
}];

impl StageKey {
    /// Extra form fields submitted with this stage's action.
    pub fn extra_fields(self) -> &'static [FieldSpec] {
        match self {
            StageKey::Approve => &APPROVE_FIELDS,
            StageKey::Review => &REVIEW_FIELDS,
            StageKey::Export => &EXPORT_FIELDS,
            StageKey::Ingest
            | StageKey::Ocr
            | StageKey::OperatorA
            | StageKey::OperatorB
            | StageKey::Match => &[],
        }
    }
}

/// Builds the request body for `stage` out of the operator's raw field values.
///
/// Only fields declared for the stage survive; anything else (the document
/// selector included) is dropped. Values are kept verbatim.
pub fn build_payload(stage: StageKey, fields: &FormFields) -> Result<FormFields, FormError> {
    let mut payload = FormFields::new();
    for spec in stage.extra_fields() {
        let value = fields.get(spec.name);
        if spec.required && value.map_or(true, |v| v.trim().is_empty()) {
            return Err(FormError::MissingRequired { label: spec.label });
        }
        let Some(value) = value else {
            continue;
        };
        if let FieldKind::Choice(options) = spec.kind {
            if !options.iter().any(|option| option.value == value) {
                return Err(FormError::InvalidChoice {
                    label: spec.label,
                    value: value.clone(),
                });
            }
        }
        payload.insert(spec.name.to_string(), value.clone());
    }
    Ok(payload)
}
