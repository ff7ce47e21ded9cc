use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::Receiver;
use tokio_util::sync::CancellationToken;

use crate::events::FrameReady;

/// Stand-in for the window layer: drains frames and prints one line per
/// display. Rendering proper lives outside this crate.
pub async fn run(mut from_controller: Receiver<FrameReady>, cancel: CancellationToken) -> Result<()> {
    loop {
        select! {
            _ = cancel.cancelled() => break,
            maybe_frame = from_controller.recv() => {
                let Some(frame) = maybe_frame else { break };
                let (w, h) = frame.size;
                let mode = if frame.fullscreen { ", fullscreen" } else { "" };
                println!("displaying: {} ({w}x{h}{mode})", frame.name);
            }
        }
    }
    Ok(())
}
