use std::collections::BTreeSet;

use crate::render::{render_progress, render_stage, render_tabs, resolve_selection};
use crate::view_model::{ActionOutputView, ConsoleViewModel};
use crate::{
    render_detail, DocumentEntry, DocumentId, FormFields, ProgressStore, StageDetail, StageKey,
};

/// How much of the screen a state change invalidated. Ordered so that merging
/// two pending redraws keeps the larger one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Redraw {
    /// Only the detail panel of the stage view.
    Detail,
    /// The whole stage panel (picker, fields, output, detail).
    Stage,
    /// Stage panel, tabs and progress table.
    All,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConsoleState {
    store: ProgressStore,
    active_stage: StageKey,
    selected_document: Option<DocumentId>,
    form: FormFields,
    output: Option<ActionOutputView>,
    /// Details returned by the last stage action, shown until the reload lands.
    detail_override: Option<(DocumentId, StageDetail)>,
    in_flight: BTreeSet<(DocumentId, StageKey)>,
    redraw: Option<Redraw>,
}

impl ConsoleState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    pub fn active_stage(&self) -> StageKey {
        self.active_stage
    }

    /// Document explicitly picked by the operator, if any.
    pub fn selected_document(&self) -> Option<&DocumentId> {
        self.selected_document.as_ref()
    }

    /// Document the stage panel works on: the explicit pick when it is in the
    /// snapshot, otherwise the first entry while nothing was picked.
    pub fn current_document(&self) -> Option<&DocumentEntry> {
        resolve_selection(
            self.store.entries(),
            self.selected_document.as_ref().map(DocumentId::as_str),
        )
    }

    pub fn form(&self) -> &FormFields {
        &self.form
    }

    pub fn is_in_flight(&self, document_id: &DocumentId, stage: StageKey) -> bool {
        self.in_flight.contains(&(document_id.clone(), stage))
    }

    pub fn view(&self) -> ConsoleViewModel {
        let selected = self.selected_document.as_ref().map(DocumentId::as_str);
        let mut stage = render_stage(self.active_stage, &self.store, selected, &self.form);
        let current = self.current_document().map(|entry| &entry.id);

        if let (Some((document_id, detail)), Some(current)) = (&self.detail_override, current) {
            if document_id == current {
                stage.detail = render_detail(Some(detail));
            }
        }
        stage.output = self.output.clone();
        stage.submitting = current.is_some_and(|id| self.is_in_flight(id, self.active_stage));

        ConsoleViewModel {
            tabs: render_tabs(self.active_stage),
            progress: render_progress(&self.store),
            stage,
        }
    }

    /// Returns the pending redraw scope and clears it.
    pub fn consume_redraw(&mut self) -> Option<Redraw> {
        self.redraw.take()
    }

    pub(crate) fn mark(&mut self, redraw: Redraw) {
        self.redraw = Some(self.redraw.map_or(redraw, |pending| pending.max(redraw)));
    }

    pub(crate) fn store_mut(&mut self) -> &mut ProgressStore {
        &mut self.store
    }

    pub(crate) fn select_stage(&mut self, stage: StageKey) {
        self.active_stage = stage;
        self.form.clear();
        self.output = None;
        self.detail_override = None;
        self.mark(Redraw::Stage);
    }

    pub(crate) fn select_document(&mut self, document_id: DocumentId) {
        self.selected_document = Some(document_id);
        self.detail_override = None;
        self.mark(Redraw::Detail);
    }

    /// Stores a value for one of the active stage's declared fields.
    pub(crate) fn set_field(&mut self, name: &str, value: String) -> bool {
        let declared = self
            .active_stage
            .extra_fields()
            .iter()
            .any(|spec| spec.name == name);
        if declared {
            self.form.insert(name.to_string(), value);
        }
        declared
    }

    pub(crate) fn set_output(&mut self, stage: StageKey, output: ActionOutputView) {
        if stage == self.active_stage {
            self.output = Some(output);
            self.mark(Redraw::Stage);
        }
    }

    pub(crate) fn show_details(&mut self, document_id: DocumentId, detail: StageDetail) {
        self.detail_override = Some((document_id, detail));
        self.mark(Redraw::Detail);
    }

    pub(crate) fn clear_detail_override(&mut self) {
        self.detail_override = None;
    }

    /// Registers a pending submission. Returns `false` when the same
    /// document/stage pair is already in flight.
    pub(crate) fn begin_submission(&mut self, document_id: DocumentId, stage: StageKey) -> bool {
        self.in_flight.insert((document_id, stage))
    }

    pub(crate) fn finish_submission(&mut self, document_id: &DocumentId, stage: StageKey) {
        self.in_flight.remove(&(document_id.clone(), stage));
    }
}
