use console_logging::{console_debug, console_info, console_warn};

use crate::view_model::ActionOutputView;
use crate::{
    build_payload, ConsoleState, DocumentId, Effect, FormError, FormFields, LoadOutcome, Msg,
    Redraw, StageActionRequest, StageKey,
};

const DEFAULT_SUCCESS_MESSAGE: &str = "Stage action completed.";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: ConsoleState, msg: Msg) -> (ConsoleState, Vec<Effect>) {
    let effects = match msg {
        Msg::ConsoleOpened | Msg::ReloadClicked => {
            let ticket = state.store_mut().begin_load();
            state.mark(Redraw::All);
            vec![Effect::LoadProgress { ticket }]
        }
        Msg::ProgressLoaded { ticket, result } => {
            match state.store_mut().complete_load(ticket, result) {
                LoadOutcome::Applied { .. } => {
                    state.clear_detail_override();
                    state.mark(Redraw::All);
                }
                LoadOutcome::Failed { .. } => state.mark(Redraw::All),
                LoadOutcome::Stale => {}
            }
            Vec::new()
        }
        Msg::StageSelected(raw) => {
            match StageKey::parse(&raw) {
                Some(stage) => state.select_stage(stage),
                None => console_warn!("Ignoring unknown stage key {:?}", raw),
            }
            Vec::new()
        }
        Msg::DocumentSelected(raw) => {
            let raw = raw.trim();
            if !raw.is_empty() {
                state.select_document(DocumentId::new(raw));
            }
            Vec::new()
        }
        Msg::RowLinkClicked { stage, document_id } => match StageKey::parse(&stage) {
            Some(stage) => {
                state.select_stage(stage);
                state.select_document(DocumentId::new(document_id.trim()));
                vec![Effect::ScrollStageIntoView]
            }
            None => {
                console_warn!("Ignoring cross-link to unknown stage {:?}", stage);
                Vec::new()
            }
        },
        Msg::FieldChanged { name, value } => {
            if !state.set_field(&name, value) {
                console_debug!(
                    "Field {:?} is not declared for stage {}",
                    name,
                    state.active_stage()
                );
            }
            Vec::new()
        }
        Msg::SubmitClicked => {
            let stage = state.active_stage();
            let document_id = state.current_document().map(|entry| entry.id.clone());
            match document_id {
                Some(document_id) => {
                    let fields = state.form().clone();
                    submit(&mut state, stage, document_id, &fields)
                }
                None => {
                    state.set_output(
                        stage,
                        ActionOutputView::Failure(FormError::NoDocument.to_string()),
                    );
                    Vec::new()
                }
            }
        }
        Msg::SubmitStageAction {
            stage,
            document_id,
            fields,
        } => submit(&mut state, stage, document_id, &fields),
        Msg::StageActionFinished { request, result } => {
            state.finish_submission(&request.document_id, request.stage);
            match result {
                Ok(response) => {
                    console_info!(
                        "Stage {} finished for document {}",
                        request.stage,
                        request.document_id
                    );
                    let message = response
                        .message
                        .unwrap_or_else(|| DEFAULT_SUCCESS_MESSAGE.to_string());
                    state.set_output(request.stage, ActionOutputView::Success(message));

                    let showing_same_document = state
                        .current_document()
                        .is_some_and(|entry| entry.id == request.document_id);
                    if let Some(details) = response.details {
                        if request.stage == state.active_stage() && showing_same_document {
                            state.show_details(request.document_id.clone(), details);
                        }
                    }

                    let ticket = state.store_mut().begin_load();
                    state.mark(Redraw::All);
                    vec![Effect::LoadProgress { ticket }]
                }
                Err(message) => {
                    console_warn!(
                        "Stage {} failed for document {}: {}",
                        request.stage,
                        request.document_id,
                        message
                    );
                    state.set_output(request.stage, ActionOutputView::Failure(message));
                    Vec::new()
                }
            }
        }
        Msg::RefreshDetailsClicked => {
            state.clear_detail_override();
            state.mark(Redraw::Detail);
            Vec::new()
        }
    };

    (state, effects)
}

fn submit(
    state: &mut ConsoleState,
    stage: StageKey,
    document_id: DocumentId,
    fields: &FormFields,
) -> Vec<Effect> {
    let payload = match build_payload(stage, fields) {
        Ok(payload) => payload,
        Err(err) => {
            state.set_output(stage, ActionOutputView::Failure(err.to_string()));
            return Vec::new();
        }
    };

    if !state.begin_submission(document_id.clone(), stage) {
        console_debug!(
            "Stage {} already running for document {}; submission ignored",
            stage,
            document_id
        );
        return Vec::new();
    }

    console_info!("Submitting stage {} for document {}", stage, document_id);
    state.set_output(stage, ActionOutputView::Pending);
    vec![Effect::SubmitStage {
        request: StageActionRequest {
            document_id,
            stage,
            payload,
        },
    }]
}
