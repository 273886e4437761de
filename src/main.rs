mod error;
mod frontend;
mod gameboy;
mod lr35902;
mod memory;
mod tests;
mod video;

use crate::error::DotError;
use crate::frontend::renderer::Renderer;
use crate::frontend::settings::Settings;
use crate::gameboy::GameBoy;
use crate::memory::cartridge::Cartridge;
use fern::Dispatch;
use log::{info, LevelFilter};
use snafu::prelude::*;
use std::fs::File;
use zip::ZipArchive;

/// Optional DMG boot ROM side file, looked up in the working directory.
const BOOTROM_PATH: &str = "DMG_ROM.bin";

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let log_to_file = args.iter().any(|arg| arg == "--log-to-file");

    setup_logging(log_to_file);

    let uncapped = args.iter().any(|arg| arg == "--uncapped");
    let Some(filepath) = args.get(1) else {
        eprintln!("Usage: dotboy <rom> [--uncapped] [--log-to-file]");
        std::process::exit(1);
    };

    if let Err(err) = run(filepath, Settings { uncapped }) {
        log::error!("{}", err);
        std::process::exit(1);
    }
}

fn run(filepath: &str, settings: Settings) -> Result<(), DotError> {
    let cartridge = Cartridge::new(load_rom(filepath)?);
    cartridge.log_header();

    let mut renderer = Renderer::new()?;
    let mut gameboy = GameBoy::new(load_bootrom(), cartridge, settings);

    gameboy.run(&mut renderer)
}

fn load_rom(filepath: &str) -> Result<Vec<u8>, DotError> {
    if filepath.ends_with(".zip") {
        let file = File::open(filepath).context(error::RomLoadSnafu { path: filepath })?;
        let unzipped_filepath = unzip_rom(file, filepath)?;
        info!("Unzipped {} to {}", filepath, unzipped_filepath);
        std::fs::read(&unzipped_filepath).context(error::RomLoadSnafu { path: unzipped_filepath.as_str() })
    } else {
        std::fs::read(filepath).context(error::RomLoadSnafu { path: filepath })
    }
}

fn unzip_rom(file: File, filepath: &str) -> Result<String, DotError> {
    let mut archive = ZipArchive::new(file).context(error::ZipExtractSnafu { path: filepath })?;
    let mut rom = archive.by_index(0).context(error::ZipExtractSnafu { path: filepath })?;

    let name = rom.enclosed_name().context(error::EmptyArchiveSnafu { path: filepath })?;
    let unpacked_path = std::env::temp_dir().join(name);

    let mut unpacked_file = File::create(&unpacked_path).context(error::RomLoadSnafu {
        path: unpacked_path.to_string_lossy().into_owned(),
    })?;
    std::io::copy(&mut rom, &mut unpacked_file).context(error::RomLoadSnafu {
        path: unpacked_path.to_string_lossy().into_owned(),
    })?;

    Ok(unpacked_path.to_string_lossy().into_owned())
}

fn load_bootrom() -> Option<Vec<u8>> {
    match std::fs::read(BOOTROM_PATH) {
        Ok(bootrom) if bootrom.len() >= 0x100 => {
            info!("boot ROM found at {}", BOOTROM_PATH);
            Some(bootrom)
        }
        Ok(_) => {
            info!("{} is too short, starting at the cartridge entry point", BOOTROM_PATH);
            None
        }
        Err(_) => {
            info!("no boot ROM, starting at the cartridge entry point");
            None
        }
    }
}

/// Console output carries lifecycle messages at `Info`. The trace file,
/// when enabled, exists for the per-instruction disassembly stream, so
/// its lines drop the level tag and carry the emitting module instead.
fn setup_logging(log_to_file: bool) {
    const TRACE_PATH: &str = "./dotboy_trace.log";

    let console = Dispatch::new()
        .level(LevelFilter::Info)
        .format(|out, message, record| out.finish(format_args!("[{}] {}", record.level(), message)))
        .chain(std::io::stdout());

    let mut root = Dispatch::new().level(LevelFilter::Trace).chain(console);

    if log_to_file {
        // a stale trace from the previous run would interleave with this
        // one, so start the file fresh
        std::fs::remove_file(TRACE_PATH).unwrap_or_default();

        root = root.chain(
            Dispatch::new()
                .level(LevelFilter::Trace)
                .format(|out, message, record| {
                    out.finish(format_args!("{:<16} {}", record.target(), message))
                })
                .chain(fern::log_file(TRACE_PATH).expect("failed to open trace log")),
        );
    }

    root.apply().expect("failed to install logger");
}
