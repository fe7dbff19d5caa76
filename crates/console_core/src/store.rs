use console_logging::{console_debug, console_info, console_warn};

use crate::{DocumentEntry, StageDetail, StageKey};

/// Sequence number handed out for every progress load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied { count: usize },
    Failed { message: String },
    /// A newer load already landed; the response was dropped untouched.
    Stale,
}

/// Latest full snapshot of document progress.
///
/// The snapshot is only ever replaced wholesale by a completed load. A failed
/// load records its message but keeps the previous entries; responses older
/// than the last one applied are discarded so overlapping loads cannot roll
/// the table back.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgressStore {
    entries: Vec<DocumentEntry>,
    last_error: Option<String>,
    issued: u64,
    settled: u64,
}

impl ProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_load(&mut self) -> LoadTicket {
        self.issued += 1;
        console_debug!("progress load #{} started", self.issued);
        LoadTicket(self.issued)
    }

    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<DocumentEntry>, String>,
    ) -> LoadOutcome {
        if ticket.0 <= self.settled {
            console_debug!(
                "progress load #{} discarded; #{} already settled",
                ticket.0,
                self.settled
            );
            return LoadOutcome::Stale;
        }
        self.settled = ticket.0;
        match result {
            Ok(entries) => {
                let count = entries.len();
                self.entries = entries;
                self.last_error = None;
                console_info!("progress load #{} applied ({} documents)", ticket.0, count);
                LoadOutcome::Applied { count }
            }
            Err(message) => {
                console_warn!("progress load #{} failed: {}", ticket.0, message);
                self.last_error = Some(message.clone());
                LoadOutcome::Failed { message }
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.issued > self.settled
    }

    pub fn entries(&self) -> &[DocumentEntry] {
        &self.entries
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn find(&self, document_id: &str) -> Option<&DocumentEntry> {
        self.entries
            .iter()
            .find(|entry| entry.id.as_str() == document_id)
    }

    pub fn stage_detail(&self, document_id: &str, stage: StageKey) -> Option<&StageDetail> {
        self.find(document_id).and_then(|entry| entry.stage(stage))
    }
}
