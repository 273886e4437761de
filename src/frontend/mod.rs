pub mod renderer;
pub mod settings;

use crate::error::DotError;
use crate::video::Framebuffer;

/// What the event pump asked of the emulation loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PumpStatus {
    Continue,
    Shutdown,
}

/// The presentation port. The emulator owns the framebuffer; a frontend
/// borrows it for the duration of one paint and polls its own event
/// source without blocking.
pub trait Frontend {
    fn poll_events(&mut self) -> PumpStatus;
    fn present(&mut self, frame: &Framebuffer) -> Result<(), DotError>;
}
