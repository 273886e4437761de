use crate::memory::ROM_BANK_SIZE;
use log::{debug, info, warn};

const TITLE_RANGE: std::ops::Range<usize> = 0x0134..0x0144;
const CART_TYPE_OFFSET: usize = 0x0147;
const ROM_SIZE_OFFSET: usize = 0x0148;
const RAM_SIZE_OFFSET: usize = 0x0149;

/// Cartridge hardware class from header byte `0x0147`. Only ROM-only
/// cartridges have a functional write path; the MBC variants are dispatch
/// targets whose writes are dropped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CartridgeKind {
    RomOnly,
    Mbc1,
    Mbc1Ram,
    Mbc1RamBattery,
    Mbc2,
    Mbc2Battery,
    Unknown(u8),
}

impl From<u8> for CartridgeKind {
    fn from(byte: u8) -> CartridgeKind {
        match byte {
            0x00 => CartridgeKind::RomOnly,
            0x01 => CartridgeKind::Mbc1,
            0x02 => CartridgeKind::Mbc1Ram,
            0x03 => CartridgeKind::Mbc1RamBattery,
            0x05 => CartridgeKind::Mbc2,
            0x06 => CartridgeKind::Mbc2Battery,
            byte => CartridgeKind::Unknown(byte),
        }
    }
}

pub struct Cartridge {
    data: Vec<u8>,
    kind: CartridgeKind,
}

impl Cartridge {
    pub fn new(data: Vec<u8>) -> Cartridge {
        let kind = CartridgeKind::from(data.get(CART_TYPE_OFFSET).copied().unwrap_or(0));
        Cartridge { data, kind }
    }

    /// Header title, NUL-trimmed.
    pub fn title(&self) -> String {
        let bytes = self.data.get(TITLE_RANGE).unwrap_or(&[]);
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        String::from_utf8_lossy(&bytes[..end]).into_owned()
    }

    /// Reads wrap modulo the image length, so a malformed bank selection
    /// lands on a real byte instead of out of bounds. An empty image reads
    /// as open bus.
    pub fn read(&self, addr: u16) -> u8 {
        if self.data.is_empty() {
            return 0xff;
        }
        self.data[addr as usize % self.data.len()]
    }

    pub fn read_banked(&self, addr: u16, bank: u8) -> u8 {
        if self.data.is_empty() {
            return 0xff;
        }
        let offset = addr as usize + (bank as usize - 1) * ROM_BANK_SIZE;
        self.data[offset % self.data.len()]
    }

    /// Write dispatch by cartridge type. ROM-only images have no writable
    /// cartridge hardware; the MBC variants are not implemented, so every
    /// write below `0x8000` is dropped.
    pub fn write(&mut self, addr: u16, data: u8) {
        match self.kind {
            CartridgeKind::RomOnly => {
                debug!("dropped write of {:02x} to read-only cartridge at ${:04x}", data, addr);
            }
            kind => {
                warn!("dropped write of {:02x} to ${:04x}: {:?} mapper is not implemented", data, addr, kind);
            }
        }
    }

    pub fn log_header(&self) {
        info!("Rom Info");
        info!("  Title: {}", self.title());
        info!("  Cart Type: {:?}", self.kind);
        info!("  ROM Size: {:#04x}", self.data.get(ROM_SIZE_OFFSET).copied().unwrap_or(0));
        info!("  RAM Size: {:#04x}", self.data.get(RAM_SIZE_OFFSET).copied().unwrap_or(0));
    }
}
