use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use crate::medals_fetch::MedalsSource;
use crate::state::{Delta, ProviderCommand};

/// Serve medals fetches on a background thread until either channel closes.
///
/// Commands queued while a fetch runs are coalesced into the next one, so at
/// most one request per dataset is ever in flight.
pub fn spawn_medals_provider(
    source: MedalsSource,
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        while let Ok(first) = cmd_rx.recv() {
            let mut retry = first == ProviderCommand::Retry;
            while let Ok(cmd) = cmd_rx.try_recv() {
                retry |= cmd == ProviderCommand::Retry;
            }
            let cmd = if retry {
                ProviderCommand::Retry
            } else {
                ProviderCommand::FetchMedals
            };
            if tx.send(handle_command(&source, cmd)).is_err() {
                break;
            }
        }
        tracing::debug!("medals provider stopped");
    })
}

/// Run one command against `source` and describe the outcome as a delta.
pub fn handle_command(source: &MedalsSource, cmd: ProviderCommand) -> Delta {
    if cmd == ProviderCommand::Retry {
        source.invalidate();
    }
    tracing::info!(source = source.kind().label(), ?cmd, "loading medals");
    match source.load() {
        Ok(records) => {
            tracing::info!(countries = records.len(), "medals loaded");
            Delta::SetMedals(records)
        }
        Err(err) => {
            tracing::error!("medals load failed: {err}");
            Delta::FetchFailed(err.to_string())
        }
    }
}
