use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use console_core::{LoadTicket, StageActionRequest};
use console_logging::console_error;

use crate::gateway::{ApiGateway, ReqwestGateway};
use crate::{EngineEvent, GatewayError, GatewaySettings};

enum EngineCommand {
    LoadProgress { ticket: LoadTicket },
    SubmitStage { request: StageActionRequest },
}

impl EngineCommand {
    /// The event answering this command when it could not be run at all.
    fn into_failure(self, error: GatewayError) -> EngineEvent {
        match self {
            EngineCommand::LoadProgress { ticket } => EngineEvent::ProgressLoaded {
                ticket,
                result: Err(error),
            },
            EngineCommand::SubmitStage { request } => EngineEvent::StageActionFinished {
                request,
                result: Err(error),
            },
        }
    }
}

/// Runs gateway calls on a background tokio runtime and reports results as
/// [`EngineEvent`]s. Commands never block the caller, and every command is
/// answered by exactly one event.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_tx: mpsc::Sender<EngineEvent>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: GatewaySettings) -> Result<Self, GatewayError> {
        let gateway = ReqwestGateway::new(settings)?;
        Self::with_gateway(Arc::new(gateway))
    }

    pub fn with_gateway(gateway: Arc<dyn ApiGateway>) -> Result<Self, GatewayError> {
        let runtime = tokio::runtime::Runtime::new()
            .map_err(|err| GatewayError::Runtime(err.to_string()))?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        let worker_events = event_tx.clone();
        thread::spawn(move || {
            while let Ok(command) = cmd_rx.recv() {
                let gateway = gateway.clone();
                let event_tx = worker_events.clone();
                runtime.spawn(async move {
                    handle_command(gateway.as_ref(), command, event_tx).await;
                });
            }
        });

        Ok(Self {
            cmd_tx,
            event_tx,
            event_rx,
        })
    }

    pub fn load_progress(&self, ticket: LoadTicket) {
        self.send(EngineCommand::LoadProgress { ticket });
    }

    pub fn submit_stage(&self, request: StageActionRequest) {
        self.send(EngineCommand::SubmitStage { request });
    }

    fn send(&self, command: EngineCommand) {
        if let Err(mpsc::SendError(command)) = self.cmd_tx.send(command) {
            console_error!("Engine worker has stopped; failing command");
            let error = GatewayError::Network("engine is not running".to_string());
            let _ = self.event_tx.send(command.into_failure(error));
        }
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

async fn handle_command(
    gateway: &dyn ApiGateway,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let event = match command {
        EngineCommand::LoadProgress { ticket } => EngineEvent::ProgressLoaded {
            ticket,
            result: gateway.fetch_progress().await,
        },
        EngineCommand::SubmitStage { request } => {
            let result = gateway.submit_stage(&request).await;
            EngineEvent::StageActionFinished { request, result }
        }
    };
    let _ = event_tx.send(event);
}
