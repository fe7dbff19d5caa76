use crate::{LoadTicket, StageActionRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// `GET /api/documents/progress`, answered with `Msg::ProgressLoaded`.
    LoadProgress { ticket: LoadTicket },
    /// `POST` the stage action, answered with `Msg::StageActionFinished`.
    SubmitStage { request: StageActionRequest },
    /// Bring the stage panel into view after a cross-link jump.
    ScrollStageIntoView,
}
