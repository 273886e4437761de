use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct InterruptFlags: u8 {
        const VBLANK = 0b00001;
        const STAT   = 0b00010;
        const TIMER  = 0b00100;
        const SERIAL = 0b01000;
        const JOYPAD = 0b10000;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct LcdControl: u8 {
        const BG_DISPLAY      = 0b0000_0001;
        const OBJ_DISPLAY     = 0b0000_0010;
        const OBJ_SIZE        = 0b0000_0100;
        const BG_TILE_MAP     = 0b0000_1000;
        const BG_TILE_DATA    = 0b0001_0000;
        const WINDOW_DISPLAY  = 0b0010_0000;
        const WINDOW_TILE_MAP = 0b0100_0000;
        const LCD_DISPLAY     = 0b1000_0000;
    }
}

impl From<u8> for InterruptFlags {
    fn from(byte: u8) -> Self {
        Self::from_bits_truncate(byte)
    }
}

impl From<u8> for LcdControl {
    fn from(byte: u8) -> Self {
        Self::from_bits_truncate(byte)
    }
}
