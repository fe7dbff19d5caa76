use crate::{
    DocumentEntry, DocumentId, FormFields, LoadTicket, StageActionRequest, StageActionResponse,
    StageKey,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Host finished loading the console; triggers the initial progress load.
    ConsoleOpened,
    /// User asked for a fresh progress snapshot.
    ReloadClicked,
    /// Gateway answered a progress load.
    ProgressLoaded {
        ticket: LoadTicket,
        result: Result<Vec<DocumentEntry>, String>,
    },
    /// User clicked a stage tab (raw key, validated against the registry).
    StageSelected(String),
    /// User changed the document picker.
    DocumentSelected(String),
    /// User followed a stage cross-link from a progress row.
    RowLinkClicked { stage: String, document_id: String },
    /// User edited one of the stage's extra fields.
    FieldChanged { name: String, value: String },
    /// User pressed the stage action button; stage, document and fields are
    /// read from the state at handling time.
    SubmitClicked,
    /// Explicit stage action for a given document.
    SubmitStageAction {
        stage: StageKey,
        document_id: DocumentId,
        fields: FormFields,
    },
    /// Gateway answered a stage action.
    StageActionFinished {
        request: StageActionRequest,
        result: Result<StageActionResponse, String>,
    },
    /// User asked to re-read the detail panel from the current snapshot.
    RefreshDetailsClicked,
}
