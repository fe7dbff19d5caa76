use crate::{DocumentId, FieldKind, StageKey};

pub const NO_DOCUMENTS_PLACEHOLDER: &str = "No documents available";
pub const NO_DATA_PLACEHOLDER: &str = "No data recorded for this stage yet.";
pub const LAST_UPDATED_LABEL: &str = "Last updated";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleViewModel {
    pub tabs: Vec<StageTabView>,
    pub progress: ProgressTableView,
    pub stage: StagePanelView,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageTabView {
    pub key: StageKey,
    pub title: &'static str,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressTableView {
    pub body: ProgressBody,
    pub loading: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressBody {
    Rows(Vec<ProgressRowView>),
    NoDocuments,
    /// Single row spanning the table; replaces the rows until the next good load.
    LoadFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRowView {
    pub id: DocumentId,
    pub file_name: String,
    pub detected_type: Option<String>,
    pub status: String,
    pub status_state: String,
    pub percent: u8,
    pub links: Vec<StageLinkView>,
}

/// Cross-link from a progress row into one stage of that document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageLinkView {
    pub stage: StageKey,
    pub title: &'static str,
    pub state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePanelView {
    pub stage: StageKey,
    pub header: StageHeaderView,
    pub picker: DocumentPickerView,
    pub fields: Vec<FieldView>,
    pub detail: DetailPanelView,
    pub output: Option<ActionOutputView>,
    pub submitting: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageHeaderView {
    pub title: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentPickerView {
    /// One disabled placeholder option; nothing can be selected.
    Empty { placeholder: &'static str },
    /// `selected` is `None` when the picked id is not in the snapshot.
    Options {
        options: Vec<PickerOptionView>,
        selected: Option<DocumentId>,
    },
}

impl DocumentPickerView {
    pub fn selected(&self) -> Option<&DocumentId> {
        match self {
            DocumentPickerView::Empty { .. } => None,
            DocumentPickerView::Options { selected, .. } => selected.as_ref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerOptionView {
    pub id: DocumentId,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldView {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailPanelView {
    NoData { placeholder: &'static str },
    Cards(Vec<DetailCardView>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailCardView {
    pub label: String,
    pub value: String,
    pub state: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutputView {
    Pending,
    Success(String),
    Failure(String),
}
