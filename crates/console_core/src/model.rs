use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{FormFields, StageKey};

/// Document identifier. The backend sends integers, the picker works with
/// strings; comparisons are always done on the string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl<'de> Deserialize<'de> for DocumentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Int(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Int(value) => DocumentId(value.to_string()),
            RawId::Text(value) => DocumentId(value),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub id: DocumentId,
    pub file_name: String,
    #[serde(default)]
    pub detected_type: Option<String>,
    pub status: String,
    /// Styling token chosen by the backend; never interpreted here.
    #[serde(default)]
    pub status_state: String,
    #[serde(default)]
    pub completion: f64,
    #[serde(default, deserialize_with = "known_stages")]
    pub stages: BTreeMap<StageKey, StageDetail>,
}

/// Stage maps keyed by something outside the registry are trimmed instead of
/// failing the whole progress payload.
fn known_stages<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<StageKey, StageDetail>, D::Error> {
    let raw = Option::<BTreeMap<String, StageDetail>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, detail)| StageKey::parse(&key).map(|key| (key, detail)))
        .collect())
}

impl DocumentEntry {
    /// Completion as a whole percentage in `0..=100`.
    pub fn completion_percent(&self) -> u8 {
        completion_percent(self.completion)
    }

    pub fn stage(&self, key: StageKey) -> Option<&StageDetail> {
        self.stages.get(&key)
    }
}

pub fn completion_percent(completion: f64) -> u8 {
    if !completion.is_finite() {
        return 0;
    }
    (completion * 100.0).round().clamp(0.0, 100.0) as u8
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StageDetail {
    #[serde(default)]
    pub metrics: Vec<MetricCard>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricCard {
    pub label: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl MetricCard {
    pub fn display_value(&self) -> String {
        display_scalar(&self.value)
    }
}

pub(crate) fn display_scalar(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        other => other.to_string(),
    }
}

/// Stage action submitted to `POST /api/documents/{id}/stages/{stage}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageActionRequest {
    pub document_id: DocumentId,
    pub stage: StageKey,
    pub payload: FormFields,
}

impl StageActionRequest {
    pub fn path(&self) -> String {
        format!(
            "api/documents/{}/stages/{}",
            self.document_id,
            self.stage.as_str()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StageActionResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<StageDetail>,
}
