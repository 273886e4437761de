use crate::lr35902::cpu::Cpu;
use crate::lr35902::registers::Reg16;
use crate::memory::mmu::Mmu;
use crate::memory::registers::InterruptFlags;
use crate::memory::{INTERRUPT_ENABLE_REGISTER, INTERRUPT_FLAGS_REGISTER};
use log::trace;

/// Interrupt sources in priority order.
pub enum Vector {
    VBlank,
    Stat,
    Timer,
    Serial,
    Joypad,
}

impl Vector {
    /// Picks the highest-priority source out of a non-empty pending set.
    pub fn from_flags(flags: &InterruptFlags) -> Vector {
        if flags.contains(InterruptFlags::VBLANK) {
            Vector::VBlank
        } else if flags.contains(InterruptFlags::STAT) {
            Vector::Stat
        } else if flags.contains(InterruptFlags::TIMER) {
            Vector::Timer
        } else if flags.contains(InterruptFlags::SERIAL) {
            Vector::Serial
        } else {
            Vector::Joypad
        }
    }

    pub fn mask(&self) -> InterruptFlags {
        match self {
            Vector::VBlank => InterruptFlags::VBLANK,
            Vector::Stat => InterruptFlags::STAT,
            Vector::Timer => InterruptFlags::TIMER,
            Vector::Serial => InterruptFlags::SERIAL,
            Vector::Joypad => InterruptFlags::JOYPAD,
        }
    }

    pub fn to_address(&self) -> u16 {
        match self {
            Vector::VBlank => 0x0040,
            Vector::Stat => 0x0048,
            Vector::Timer => 0x0050,
            Vector::Serial => 0x0058,
            Vector::Joypad => 0x0060,
        }
    }
}

impl Cpu {
    /// Services at most one interrupt: the highest-priority bit set in both
    /// `IE` and `IF` while `IME` is up. Taking a vector acknowledges its
    /// `IF` bit, pushes `PC`, jumps to the vector, and wakes a halted CPU.
    /// `IME` drops while the service routine runs; `reti` raises it again.
    pub fn dispatch_interrupts(&mut self, mmu: &mut Mmu) -> Option<Vector> {
        if !self.interrupts_enabled() {
            return None;
        }

        let requested = mmu.read(INTERRUPT_FLAGS_REGISTER);
        let pending = InterruptFlags::from_bits_truncate(mmu.read(INTERRUPT_ENABLE_REGISTER) & requested);
        if pending.is_empty() {
            return None;
        }

        let vector = Vector::from_flags(&pending);
        mmu.write(INTERRUPT_FLAGS_REGISTER, requested & !vector.mask().bits());

        self.disable_interrupts();
        self.resume();

        let pc = self.read_register16(Reg16::PC);
        self.push_stack(mmu, pc);
        self.write_register16(Reg16::PC, vector.to_address());

        trace!("dispatched {} interrupt, ${:04x} -> ${:04x}", vector, pc, vector.to_address());

        Some(vector)
    }
}

impl std::fmt::Display for Vector {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Vector::VBlank => write!(f, "VBLANK"),
            Vector::Stat => write!(f, "STAT"),
            Vector::Timer => write!(f, "TIMER"),
            Vector::Serial => write!(f, "SERIAL"),
            Vector::Joypad => write!(f, "JOYPAD"),
        }
    }
}
