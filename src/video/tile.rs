use crate::memory::mmu::Mmu;

/// An 8×8 tile decoded into 2-bit colour indices. Each row is stored as
/// two bytes in VRAM; the low bit of a pixel comes from the first byte,
/// the high bit from the second.
pub struct Tile {
    pub pixels: [[u8; 8]; 8],
}

impl Tile {
    pub fn from(mmu: &Mmu, address: u16) -> Tile {
        let mut pixels = [[0u8; 8]; 8];

        for y in 0..8u16 {
            let lsb = mmu.read(address + y * 2);
            let msb = mmu.read(address + y * 2 + 1);

            for x in 0..8 {
                let lsb_bit = (lsb >> (7 - x)) & 0b1;
                let msb_bit = (msb >> (7 - x)) & 0b1;
                pixels[y as usize][x as usize] = (msb_bit << 1) | lsb_bit;
            }
        }

        Tile { pixels }
    }
}
