use crate::lr35902::decode::Instruction;
use snafu::prelude::*;

/// Which opcode table a byte was decoded against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OpcodePage {
    Unprefixed,
    Prefixed,
}

impl std::fmt::Display for OpcodePage {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            OpcodePage::Unprefixed => write!(f, "base"),
            OpcodePage::Prefixed => write!(f, "cb"),
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum DotError {
    #[snafu(display("unknown opcode {:02x} ({} page) at ${:04x}", opcode, page, pc))]
    UnknownOpcode { page: OpcodePage, opcode: u8, pc: u16 },
    #[snafu(display("unknown register bits: {:08b}", data))]
    UnknownRegisterBits { data: u8 },
    #[snafu(display("unknown condition bits: {:08b}", data))]
    UnknownConditionBits { data: u8 },
    #[snafu(display("no valid handler for instruction: {}", instruction))]
    InvalidHandler { instruction: Instruction },
    #[snafu(display("failed to read ROM image {}: {}", path, source))]
    RomLoad { path: String, source: std::io::Error },
    #[snafu(display("failed to extract ROM archive {}: {}", path, source))]
    ZipExtract { path: String, source: zip::result::ZipError },
    #[snafu(display("ROM archive {} contains no usable entry", path))]
    EmptyArchive { path: String },
    #[snafu(display("failed to initialize the presentation layer: {}", message))]
    Frontend { message: String },
}
