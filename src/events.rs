use std::sync::Arc;

use image::RgbaImage;

/// User-facing playback actions, delivered to the controller over a channel.
/// Timer ticks are internal to the controller and not represented here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    Next,
    Previous,
    TogglePause,
    ToggleFullscreen,
    /// The window layer reports a new drawable area.
    Resize(u32, u32),
}

/// A decoded, orientation-corrected image ready for display, with its
/// aspect-preserving fit already computed against the current viewport.
#[derive(Debug, Clone)]
pub struct FrameReady {
    pub index: usize,
    pub name: String,
    pub image: Arc<RgbaImage>,
    /// Scaled (width, height) the image should occupy on screen.
    pub size: (u32, u32),
    pub fullscreen: bool,
}
