use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, TryRecvError};
use std::thread;
use std::time::Duration;

use anyhow::Context;
use console_core::{update, ConsoleState, Msg, Redraw};
use console_engine::{EngineHandle, FetchDecision, Method, OfflineShell, ShellRequest};
use console_logging::{console_info, console_warn};

use super::config::{config_path, load_config, ConsoleConfig};
use super::effects::EffectRunner;
use super::ui::commands::{parse_command, Command, HELP_TEXT};
use super::ui::render::render;

const IDLE_SLEEP: Duration = Duration::from_millis(20);

pub fn run_app() -> anyhow::Result<()> {
    let path = config_path();
    let (config, config_problem) = match load_config(&path) {
        Ok(config) => (config, None),
        Err(err) => (ConsoleConfig::default(), Some(err)),
    };
    console_logging::initialize(config.log_destination, config.log_level);
    if let Some(err) = config_problem {
        console_warn!("Falling back to default configuration: {:#}", err);
    }

    let gateway = config
        .gateway_settings()
        .context("configured base_url is not usable")?;
    console_info!("Console backend: {}", gateway.base_url);
    let engine = EngineHandle::new(gateway.clone()).context("starting engine")?;

    let offline = if config.offline.enabled {
        match OfflineShell::register(&config.offline_settings(), &gateway) {
            Ok(shell) => Some(shell),
            Err(err) => {
                console_warn!("Offline shell not registered: {}", err);
                None
            }
        }
    } else {
        None
    };

    let input_rx = spawn_stdin_reader();
    let mut host = ConsoleHost::new(EffectRunner::new(engine), offline, io::stdout());
    host.dispatch(Msg::ConsoleOpened)?;
    host.run(&input_rx)?;
    host.shutdown();
    Ok(())
}

fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (line_tx, line_rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line_tx.send(line).is_err() {
                break;
            }
        }
    });
    line_rx
}

/// Owns the console state and feeds it operator commands and engine results.
struct ConsoleHost<W: Write> {
    state: ConsoleState,
    runner: EffectRunner,
    offline: Option<OfflineShell>,
    out: W,
}

impl<W: Write> ConsoleHost<W> {
    fn new(runner: EffectRunner, offline: Option<OfflineShell>, out: W) -> Self {
        Self {
            state: ConsoleState::new(),
            runner,
            offline,
            out,
        }
    }

    /// Runs until `quit` or end of input.
    fn run(&mut self, input_rx: &mpsc::Receiver<String>) -> io::Result<()> {
        loop {
            let mut busy = false;
            loop {
                match input_rx.try_recv() {
                    Ok(line) => {
                        busy = true;
                        if !self.handle_line(&line)? {
                            return Ok(());
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => return Ok(()),
                }
            }
            busy |= self.pump()?;
            if !busy {
                thread::sleep(IDLE_SLEEP);
            }
        }
    }

    /// Applies engine results received so far. Returns whether any arrived.
    fn pump(&mut self) -> io::Result<bool> {
        let inbox = self.runner.drain_events();
        let received = !inbox.is_empty();
        for msg in inbox {
            self.dispatch(msg)?;
        }
        Ok(received)
    }

    fn dispatch(&mut self, msg: Msg) -> io::Result<()> {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let scroll = self.runner.enqueue(effects);
        let mut scope = state.consume_redraw();
        if scroll {
            scope = Some(scope.map_or(Redraw::Stage, |pending| pending.max(Redraw::Stage)));
        }
        self.state = state;

        if let Some(scope) = scope {
            write!(self.out, "{}", render(&self.state.view(), scope))?;
            self.out.flush()?;
        }
        Ok(())
    }

    /// Returns `false` once the operator asked to quit.
    fn handle_line(&mut self, line: &str) -> io::Result<bool> {
        match parse_command(line) {
            None => {}
            Some(Command::Dispatch(msg)) => self.dispatch(msg)?,
            Some(Command::Shell { method, path }) => self.shell_fetch(method, path)?,
            Some(Command::Help) => writeln!(self.out, "{HELP_TEXT}")?,
            Some(Command::Quit) => return Ok(false),
            Some(Command::Invalid(reason)) => writeln!(self.out, "{reason}\n{HELP_TEXT}")?,
        }
        self.out.flush()?;
        Ok(true)
    }

    fn shell_fetch(&mut self, method: Method, path: String) -> io::Result<()> {
        let Some(shell) = &self.offline else {
            return writeln!(self.out, "offline shell is disabled");
        };
        let request = ShellRequest::new(method, path);
        match shell.fetch(&request) {
            Ok(FetchDecision::Passthrough) => writeln!(
                self.out,
                "{} {}: not intercepted (worker {:?})",
                request.method,
                request.path,
                shell.state()
            ),
            Ok(FetchDecision::Respond { source, response }) => writeln!(
                self.out,
                "{} {}: {} from {:?}, {} bytes ({})",
                request.method,
                request.path,
                response.status,
                source,
                response.body.len(),
                response.content_type.as_deref().unwrap_or("no content type")
            ),
            Err(err) => writeln!(self.out, "{} {}: {}", request.method, request.path, err),
        }
    }

    fn shutdown(&mut self) {
        if let Some(shell) = self.offline.take() {
            shell.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Instant;

    use super::*;
    use console_core::{DocumentEntry, StageActionRequest, StageActionResponse};
    use console_engine::{ApiGateway, GatewayError};

    struct FixedGateway;

    #[async_trait::async_trait]
    impl ApiGateway for FixedGateway {
        async fn fetch_progress(&self) -> Result<Vec<DocumentEntry>, GatewayError> {
            Ok(serde_json::from_str(
                r#"[{"id": 12, "file_name": "contract.pdf", "status": "UPLOADED", "completion": 0.25}]"#,
            )
            .unwrap())
        }

        async fn submit_stage(
            &self,
            request: &StageActionRequest,
        ) -> Result<StageActionResponse, GatewayError> {
            Ok(StageActionResponse {
                message: Some(format!("{} done", request.stage)),
                details: None,
            })
        }
    }

    fn host() -> ConsoleHost<Vec<u8>> {
        console_logging::initialize_for_tests();
        let engine = EngineHandle::with_gateway(Arc::new(FixedGateway)).unwrap();
        ConsoleHost::new(EffectRunner::new(engine), None, Vec::new())
    }

    fn pump_until_received(host: &mut ConsoleHost<Vec<u8>>) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !host.pump().unwrap() {
            assert!(Instant::now() < deadline, "engine never answered");
            thread::sleep(Duration::from_millis(5));
        }
    }

    fn take_output(host: &mut ConsoleHost<Vec<u8>>) -> String {
        String::from_utf8(std::mem::take(&mut host.out)).unwrap()
    }

    #[test]
    fn opening_renders_loaded_rows() {
        let mut host = host();
        host.dispatch(Msg::ConsoleOpened).unwrap();
        assert!(take_output(&mut host).contains("(loading...)"));

        pump_until_received(&mut host);
        let text = take_output(&mut host);
        assert!(text.contains("contract.pdf"));
        assert!(text.contains(" 25%"));
    }

    #[test]
    fn submit_reports_backend_message() {
        let mut host = host();
        host.dispatch(Msg::ConsoleOpened).unwrap();
        pump_until_received(&mut host);

        assert!(host.handle_line("stage ocr").unwrap());
        assert!(host.handle_line("submit").unwrap());
        pump_until_received(&mut host);

        let text = take_output(&mut host);
        assert!(text.contains("OK: ocr done"));
    }

    #[test]
    fn quit_stops_and_shell_needs_offline_worker() {
        let mut host = host();
        assert!(host.handle_line("shell GET /app/").unwrap());
        assert!(take_output(&mut host).contains("offline shell is disabled"));
        assert!(!host.handle_line("quit").unwrap());
    }
}
