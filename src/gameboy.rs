use crate::error::DotError;
use crate::frontend::settings::Settings;
use crate::frontend::{Frontend, PumpStatus};
use crate::lr35902::cpu::Cpu;
use crate::lr35902::registers::Reg16;
use crate::memory::cartridge::Cartridge;
use crate::memory::mmu::Mmu;
use crate::video::ppu::Ppu;
use crate::video::Framebuffer;
use log::{error, info};
use std::time::{Duration, Instant};

/// Scanlines stepped between two frame pushes.
const FRAME_SYNC_INTERVAL: u64 = 8192;

const TARGET_FPS: f64 = 59.73;
const TARGET_FRAME_DURATION: Duration = Duration::from_nanos((1_000_000_000.0 / TARGET_FPS) as u64);

const CART_ENTRYPOINT: u16 = 0x0100;

/// Post-boot I/O register state, applied when execution starts at the
/// cartridge entry point.
const POWER_UP_IO: &[(u16, u8)] = &[
    (0xff05, 0x00),
    (0xff06, 0x00),
    (0xff07, 0x00),
    (0xff10, 0x80),
    (0xff11, 0xbf),
    (0xff12, 0xf3),
    (0xff14, 0xbf),
    (0xff16, 0x3f),
    (0xff17, 0x00),
    (0xff19, 0xbf),
    (0xff1a, 0x7f),
    (0xff1b, 0xff),
    (0xff1c, 0x9f),
    (0xff1e, 0xbf),
    (0xff20, 0xff),
    (0xff21, 0x00),
    (0xff22, 0x00),
    (0xff23, 0xbf),
    (0xff24, 0x77),
    (0xff25, 0xf3),
    (0xff26, 0xf1),
    (0xff40, 0x91),
    (0xff42, 0x00),
    (0xff43, 0x00),
    (0xff45, 0x00),
    (0xff47, 0xfc),
    (0xff48, 0xff),
    (0xff49, 0xff),
    (0xff4a, 0x00),
    (0xff4b, 0x00),
    (0xffff, 0x00),
];

pub struct GameBoy {
    pub cpu: Cpu,
    pub mmu: Mmu,
    pub ppu: Ppu,
    settings: Settings,
}

impl GameBoy {
    /// Builds a machine in its power-up state. With a boot ROM execution
    /// starts at `0x0000` under the overlay; without one it starts at the
    /// cartridge entry point with the post-boot register file.
    pub fn new(bootrom: Option<Vec<u8>>, cartridge: Cartridge, settings: Settings) -> GameBoy {
        let with_bootrom = bootrom.is_some();
        let mut mmu = Mmu::new(bootrom, cartridge);
        let mut cpu = Cpu::new();

        cpu.write_register16(Reg16::BC, 0x0013);
        cpu.write_register16(Reg16::DE, 0x00d8);
        cpu.write_register16(Reg16::HL, 0x014d);
        cpu.write_register16(Reg16::SP, 0xfffe);
        cpu.write_register16(Reg16::AF, 0x0000);
        cpu.write_register16(Reg16::PC, if with_bootrom { 0x0000 } else { CART_ENTRYPOINT });

        for (addr, value) in POWER_UP_IO {
            mmu.write(*addr, *value);
        }

        GameBoy {
            cpu,
            mmu,
            ppu: Ppu::new(),
            settings,
        }
    }

    /// Drives the machine until the frontend requests shutdown or the CPU
    /// hits an unknown opcode: dispatch pending interrupts, execute one
    /// instruction, advance the scanline counter, and periodically push a
    /// rasterized frame.
    pub fn run(&mut self, frontend: &mut impl Frontend) -> Result<(), DotError> {
        let mut frame = Framebuffer::new();
        let mut iterations: u64 = 0;

        info!("emulation started");

        loop {
            if frontend.poll_events() == PumpStatus::Shutdown {
                info!("shutdown requested");
                break;
            }

            self.cpu.dispatch_interrupts(&mut self.mmu);

            if !self.cpu.is_halted() {
                if let Err(err) = self.cpu.step(&mut self.mmu) {
                    error!("emulation stopped: {}", err);
                    error!("{}", self.cpu);
                    return Err(err);
                }
            }

            self.ppu.advance_scanline(&mut self.mmu);

            if iterations % FRAME_SYNC_INTERVAL == 0 {
                let throttle_timer = Instant::now();

                self.ppu.render(&self.mmu, &mut frame);
                frontend.present(&frame)?;

                if !self.settings.uncapped {
                    let elapsed = throttle_timer.elapsed();
                    if elapsed < TARGET_FRAME_DURATION {
                        spin_sleep::sleep(TARGET_FRAME_DURATION - elapsed);
                    }
                }
            }

            iterations += 1;
        }

        Ok(())
    }
}
