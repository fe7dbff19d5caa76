use console_core::{Effect, Msg};
use console_engine::{EngineEvent, EngineHandle};
use console_logging::{console_debug, console_info, console_warn};

pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    /// Hands effects to the engine. Returns `true` when one of them asked for
    /// the stage panel to be brought into view.
    pub fn enqueue(&self, effects: Vec<Effect>) -> bool {
        let mut scroll = false;
        for effect in effects {
            match effect {
                Effect::LoadProgress { ticket } => {
                    console_debug!("LoadProgress ticket={}", ticket.0);
                    self.engine.load_progress(ticket);
                }
                Effect::SubmitStage { request } => {
                    console_info!(
                        "SubmitStage document={} stage={}",
                        request.document_id,
                        request.stage
                    );
                    self.engine.submit_stage(request);
                }
                Effect::ScrollStageIntoView => scroll = true,
            }
        }
        scroll
    }

    /// Engine results that arrived since the last call, as messages.
    pub fn drain_events(&self) -> Vec<Msg> {
        let mut inbox = Vec::new();
        while let Some(event) = self.engine.try_recv() {
            inbox.push(event_to_msg(event));
        }
        inbox
    }
}

pub(crate) fn event_to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::ProgressLoaded { ticket, result } => Msg::ProgressLoaded {
            ticket,
            result: result.map_err(|err| {
                console_warn!("Progress load failed: {}", err);
                err.to_string()
            }),
        },
        EngineEvent::StageActionFinished { request, result } => {
            let result = result.map_err(|err| {
                console_warn!(
                    "Stage {} failed for document {}: {}",
                    request.stage,
                    request.document_id,
                    err
                );
                err.to_string()
            });
            Msg::StageActionFinished { request, result }
        }
    }
}
