pub mod cartridge;
pub mod mmu;
pub mod registers;

pub const INTERRUPT_ENABLE_REGISTER: u16 = 0xffff;
pub const INTERRUPT_FLAGS_REGISTER: u16 = 0xff0f;
pub const BOOTROM_LOCK_REGISTER: u16 = 0xff50;

/// Everything from VRAM upward collapses into one 32 KiB buffer addressed
/// by `addr - 0x8000`.
pub const EFFECTIVE_RAM_START: u16 = 0x8000;
pub const EFFECTIVE_RAM_SIZE: usize = 0x8000;

pub const BOOTROM_END: u16 = 0x00ff;
pub const ROM_BANK_SIZE: usize = 0x4000;
pub const ROM_SLOT_1_START: u16 = 0x4000;
pub const ROM_SLOT_1_END: u16 = 0x7fff;
