//! Headless stand-in for the window layer's key bindings: stdin lines
//! become playback commands.

use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::{self, Sender};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::events::ControlEvent;

/// Bridge blocking stdin reads onto the command channel. The reader thread
/// has no shutdown protocol; it ends with the process.
pub async fn run(to_controller: Sender<ControlEvent>, cancel: CancellationToken) -> Result<()> {
    let (line_tx, mut line_rx) = mpsc::channel::<String>(8);
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut line = String::new();
        loop {
            line.clear();
            match stdin.read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    if line_tx.blocking_send(line.trim().to_string()).is_err() {
                        break;
                    }
                }
            }
        }
    });

    loop {
        select! {
            _ = cancel.cancelled() => break,
            maybe_line = line_rx.recv() => {
                let Some(input) = maybe_line else { break };
                let event = match input.as_str() {
                    "n" | "next" => Some(ControlEvent::Next),
                    "p" | "prev" => Some(ControlEvent::Previous),
                    "" | "space" | "pause" => Some(ControlEvent::TogglePause),
                    "f" | "fullscreen" => Some(ControlEvent::ToggleFullscreen),
                    "q" | "quit" => {
                        cancel.cancel();
                        None
                    }
                    other => {
                        warn!(input = other, "unrecognized control input");
                        None
                    }
                };
                if let Some(event) = event {
                    if to_controller.send(event).await.is_err() {
                        break;
                    }
                }
            }
        }
    }
    Ok(())
}
