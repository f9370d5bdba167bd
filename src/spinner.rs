//! A terminal in-flight indicator driven by the event bus.

use std::io::Write;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::events::{Event, EventBus};
use crate::submission::Phase;

/// Braille spinner frames.
const FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Frame interval.
const INTERVAL: Duration = Duration::from_millis(80);

/// Label shown after `event`, given the label currently shown.
fn next_label(current: Option<&'static str>, event: &Event) -> Option<&'static str> {
    match event {
        Event::PhaseChanged {
            phase: Phase::InFlight,
        } => Some("enviando"),
        Event::PhaseChanged { phase: Phase::Idle } => None,
        Event::PhaseChanged { .. } => current,
        Event::RefreshStarted => Some("actualizando clasificación"),
        Event::RefreshFinished { .. } => None,
    }
}

fn clear_line() {
    // \r moves to start of line, \x1b[2K clears the line
    eprint!("\x1b[2K\r");
    let _ = std::io::stderr().flush();
}

/// Spins on stderr while a submission or refresh is in flight.
///
/// Call [`Spinner::watch`] once, then [`Spinner::stop`] on shutdown.
pub struct Spinner {
    handle: JoinHandle<()>,
    cancel: tokio::sync::watch::Sender<bool>,
}

impl Spinner {
    pub fn watch(events: &EventBus) -> Self {
        let (cancel_tx, mut cancel_rx) = tokio::sync::watch::channel(false);
        let mut rx = events.subscribe();

        let handle = tokio::spawn(async move {
            let mut label: Option<&'static str> = None;
            let mut i = 0;
            loop {
                if let Some(message) = label {
                    let frame = FRAMES[i % FRAMES.len()];
                    eprint!("\x1b[2K\r{frame} {message}");
                    let _ = std::io::stderr().flush();
                }

                tokio::select! {
                    event = rx.recv() => match event {
                        Ok(event) => {
                            let next = next_label(label, &event);
                            if label.is_some() && next.is_none() {
                                clear_line();
                            }
                            label = next;
                        }
                        Err(RecvError::Lagged(_)) => {}
                        Err(RecvError::Closed) => break,
                    },
                    _ = tokio::time::sleep(INTERVAL), if label.is_some() => i += 1,
                    _ = cancel_rx.changed() => break,
                }
            }
            if label.is_some() {
                clear_line();
            }
        });

        Self {
            handle,
            cancel: cancel_tx,
        }
    }

    /// Stop the spinner and clear its line.
    pub async fn stop(self) {
        let _ = self.cancel.send(true);
        let _ = self.handle.await;
    }
}
