use crate::error::DotError;
use crate::frontend::{Frontend, PumpStatus};
use crate::video::Framebuffer;
use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::pixels::PixelFormatEnum;
use log::info;
use sdl2::render::{Canvas, Texture, TextureAccess};
use sdl2::video::Window;
use sdl2::EventPump;

pub struct Renderer {
    canvas: Canvas<Window>,
    event_pump: EventPump,
    screen_texture: Texture,
}

impl Renderer {
    pub fn new() -> Result<Renderer, DotError> {
        let sdl_context = sdl2::init().map_err(Self::frontend_error)?;
        let video_subsystem = sdl_context.video().map_err(Self::frontend_error)?;

        let window = video_subsystem
            .window("dotboy", Framebuffer::WIDTH as u32, Framebuffer::HEIGHT as u32)
            .position_centered()
            .build()
            .map_err(Self::frontend_error)?;

        let canvas = window.into_canvas().build().map_err(Self::frontend_error)?;
        let event_pump = sdl_context.event_pump().map_err(Self::frontend_error)?;

        let screen_texture = canvas
            .create_texture(
                PixelFormatEnum::RGBA8888,
                TextureAccess::Streaming,
                Framebuffer::WIDTH as u32,
                Framebuffer::HEIGHT as u32,
            )
            .map_err(Self::frontend_error)?;

        Ok(Renderer {
            canvas,
            event_pump,
            screen_texture,
        })
    }

    fn frontend_error(error: impl std::fmt::Display) -> DotError {
        DotError::Frontend {
            message: error.to_string(),
        }
    }
}

impl Frontend for Renderer {
    /// Drains the event queue without blocking. Closing the window or
    /// pressing escape asks the emulation loop to stop; any input still
    /// queued behind a close request is discarded.
    fn poll_events(&mut self) -> PumpStatus {
        let mut status = PumpStatus::Continue;

        for event in self.event_pump.poll_iter() {
            if status == PumpStatus::Shutdown {
                continue;
            }

            match event {
                Event::Quit { .. } => {
                    info!("window closed");
                    status = PumpStatus::Shutdown;
                }
                Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                } => {
                    info!("escape pressed");
                    status = PumpStatus::Shutdown;
                }
                _ => {}
            }
        }

        status
    }

    fn present(&mut self, frame: &Framebuffer) -> Result<(), DotError> {
        // Fill the streaming texture under its lock, honouring the pitch
        // SDL hands back.
        self.screen_texture
            .with_lock(None, |buffer: &mut [u8], pitch: usize| {
                let pixels = frame.pixels();
                for y in 0..Framebuffer::HEIGHT {
                    let row = &pixels[y * Framebuffer::WIDTH..(y + 1) * Framebuffer::WIDTH];
                    for (x, pixel) in row.iter().enumerate() {
                        let offset = y * pitch + x * 4;
                        buffer[offset..offset + 4].copy_from_slice(&pixel.to_ne_bytes());
                    }
                }
            })
            .map_err(Self::frontend_error)?;

        self.canvas.copy(&self.screen_texture, None, None).map_err(Self::frontend_error)?;
        self.canvas.present();

        Ok(())
    }
}
