//! Console core: stage registry, progress store, pure renderer and the
//! navigation state machine.
mod effect;
mod form;
mod model;
mod msg;
mod render;
mod stage;
mod state;
mod store;
mod update;
mod view_model;

pub use effect::Effect;
pub use form::{build_payload, ChoiceOption, FieldKind, FieldSpec, FormError, FormFields};
pub use model::{
    completion_percent, DocumentEntry, DocumentId, MetricCard, StageActionRequest,
    StageActionResponse, StageDetail,
};
pub use msg::Msg;
pub use render::{
    format_timestamp, render_detail, render_fields, render_picker, render_progress, render_stage,
    render_tabs, resolve_selection,
};
pub use stage::{lookup, stages, StageConfig, StageKey, STAGES};
pub use state::{ConsoleState, Redraw};
pub use store::{LoadOutcome, LoadTicket, ProgressStore};
pub use update::update;
pub use view_model::{
    ActionOutputView, ConsoleViewModel, DetailCardView, DetailPanelView, DocumentPickerView,
    FieldView, PickerOptionView, ProgressBody, ProgressRowView, ProgressTableView,
    StageHeaderView, StageLinkView, StagePanelView, StageTabView, LAST_UPDATED_LABEL,
    NO_DATA_PLACEHOLDER, NO_DOCUMENTS_PLACEHOLDER,
};
