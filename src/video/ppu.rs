use crate::memory::mmu::Mmu;
use crate::memory::registers::{InterruptFlags, LcdControl};
use crate::video::palette::Palette;
use crate::video::tile::Tile;
use crate::video::{
    Framebuffer, BACKGROUND_MAP_DIM, BG_PALETTE_REGISTER, LAST_SCANLINE, LCD_CONTROL_REGISTER, SCANLINE_Y_REGISTER,
    SCREEN_HEIGHT, SCREEN_WIDTH, SIGNED_TILESET_ORIGIN, TILEMAP_0_ADDRESS, TILEMAP_1_ADDRESS, TILESET_0_ADDRESS,
    TILESET_1_ADDRESS, VBLANK_SCANLINE,
};
use log::trace;

pub struct Ppu {}

impl Ppu {
    pub fn new() -> Ppu {
        Ppu {}
    }

    /// Advances LY by one scanline. Entering line 144 requests the VBlank
    /// interrupt; past line 153 the counter wraps to zero.
    pub fn advance_scanline(&mut self, mmu: &mut Mmu) {
        let mut ly = mmu.read_unchecked(SCANLINE_Y_REGISTER).wrapping_add(1);

        if ly == VBLANK_SCANLINE {
            trace!("entering vblank");
            mmu.request_interrupt(InterruptFlags::VBLANK);
        }
        if ly > LAST_SCANLINE {
            ly = 0;
        }

        mmu.write_unchecked(SCANLINE_Y_REGISTER, ly);
    }

    /// Rasterizes the 32×32 background tilemap into the framebuffer. Pure
    /// function of VRAM, LCDC (tile data and map selection) and BGP; no
    /// scrolling, window, or sprites.
    pub fn render(&self, mmu: &Mmu, frame: &mut Framebuffer) {
        let palette = Palette::from_bgp(mmu.read(BG_PALETTE_REGISTER));
        let control = LcdControl::from(mmu.read(LCD_CONTROL_REGISTER));

        let signed_indexing = !control.contains(LcdControl::BG_TILE_DATA);
        let tile_base = if signed_indexing {
            TILESET_1_ADDRESS
        } else {
            TILESET_0_ADDRESS
        };
        let map_base = if control.contains(LcdControl::BG_TILE_MAP) {
            TILEMAP_1_ADDRESS
        } else {
            TILEMAP_0_ADDRESS
        };

        for map_y in 0..BACKGROUND_MAP_DIM {
            for map_x in 0..BACKGROUND_MAP_DIM {
                let index = mmu.read(map_base + (map_y * BACKGROUND_MAP_DIM + map_x) as u16);

                let tile_address = if signed_indexing {
                    (SIGNED_TILESET_ORIGIN as i32 + (index as i8 as i32) * 16) as u16
                } else {
                    tile_base + index as u16 * 16
                };

                let tile = Tile::from(mmu, tile_address);

                for tile_y in 0..8 {
                    let y = map_y * 8 + tile_y;
                    if y >= SCREEN_HEIGHT {
                        continue;
                    }

                    for tile_x in 0..8 {
                        let x = map_x * 8 + tile_x;
                        if x >= SCREEN_WIDTH {
                            continue;
                        }

                        frame.fill_block(x, y, palette.color(tile.pixels[tile_y][tile_x]));
                    }
                }
            }
        }
    }
}

impl Default for Ppu {
    fn default() -> Ppu {
        Ppu::new()
    }
}
