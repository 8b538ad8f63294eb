use std::{
    collections::TryReserveError,
    fs::{self, File},
    io::{self, BufReader},
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::{CommandFactory, Parser};
use log::LevelFilter;
use minivm::{
    config::DEFAULT_SEGMENT_SIZE, ConsoleBus, Machine, MachineConfig, SegmentMemory,
    UnknownOpcode,
};
use thiserror::Error;

/// Runs a minivm program: an instruction image and a data image.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Arguments {
    /// Instruction image, or assembly source if it ends in `.s` or `.asm`
    rom_file: PathBuf,
    /// Data image, copied at the start of data memory
    ram_file: PathBuf,

    /// Size of instruction memory in bytes
    #[arg(long, default_value_t = DEFAULT_SEGMENT_SIZE, value_parser = segment_size)]
    rom_size: usize,
    /// Size of data memory in bytes
    #[arg(long, default_value_t = DEFAULT_SEGMENT_SIZE, value_parser = segment_size)]
    ram_size: usize,
    /// Treat unknown opcodes as `halt` instead of faulting
    #[arg(long)]
    lenient: bool,
    /// Print registers and the first BYTES of data memory once the program stops
    #[arg(
        long,
        value_name = "BYTES",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "256"
    )]
    dump: Option<usize>,
    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}
impl Arguments {
    fn config(&self) -> MachineConfig {
        MachineConfig {
            instruction_memory: self.rom_size,
            data_memory: self.ram_size,
            unknown_opcode: if self.lenient {
                UnknownOpcode::Halt
            } else {
                UnknownOpcode::Fault
            },
        }
    }

    fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// Largest accepted segment size, 4 GiB.
const MAX_SEGMENT_SIZE: u64 = 1 << 32;

fn segment_size(value: &str) -> Result<usize, String> {
    let size: u64 = value.parse().map_err(|e| format!("{e}"))?;
    if size > MAX_SEGMENT_SIZE {
        return Err(format!("at most {MAX_SEGMENT_SIZE} bytes"));
    }
    usize::try_from(size).map_err(|_| "does not fit in the address space".to_string())
}

/// Why the program could not be loaded.
#[derive(Debug, Error)]
enum LoadError {
    #[error("unable to allocate machine memory: {0}")]
    Allocation(#[from] TryReserveError),
    #[error("unable to read {}: {1}", .0.display())]
    Io(PathBuf, #[source] io::Error),
    #[error("unable to assemble {}: {1}", .0.display())]
    Assembly(PathBuf, #[source] miniasm::AssemblerError),
}

fn is_source(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|extension| extension.to_str()),
        Some("s" | "asm")
    )
}

/// Builds the machine and loads both images. Nothing is executed unless both
/// loaded successfully.
fn load(arguments: &Arguments) -> Result<Machine<Vec<u8>>, LoadError> {
    let mut machine = arguments.config().build()?;

    let rom = &arguments.rom_file;
    let loaded = if is_source(rom) {
        let source = fs::read_to_string(rom).map_err(|e| LoadError::Io(rom.clone(), e))?;
        let image =
            miniasm::assemble(&source).map_err(|e| LoadError::Assembly(rom.clone(), e))?;
        machine.instruction_memory_mut().load(&image[..])
    } else {
        File::open(rom).and_then(|file| machine.instruction_memory_mut().load(BufReader::new(file)))
    };
    let loaded = loaded.map_err(|e| LoadError::Io(rom.clone(), e))?;
    log::info!("loaded {loaded} bytes of instructions from {}", rom.display());

    let ram = &arguments.ram_file;
    let loaded = File::open(ram)
        .and_then(|file| machine.data_memory_mut().load(BufReader::new(file)))
        .map_err(|e| LoadError::Io(ram.clone(), e))?;
    log::info!("loaded {loaded} bytes of data from {}", ram.display());

    Ok(machine)
}

fn main() -> ExitCode {
    let arguments = Arguments::parse();
    env_logger::Builder::new()
        .filter_level(arguments.log_level())
        .parse_default_env()
        .init();

    let mut machine = match load(&arguments) {
        Ok(machine) => machine,
        Err(e) => {
            log::error!("{e}");
            eprintln!("{}", Arguments::command().render_usage());
            return ExitCode::from(1);
        }
    };

    let mut bus = ConsoleBus::stdout();
    let result = machine.run(&mut bus);

    if let Some(bytes) = arguments.dump {
        print!("{}", machine.dump(bytes));
    }

    match result {
        Ok(cycles) => {
            log::info!("program halted after {cycles} instructions");
            ExitCode::SUCCESS
        }
        Err(fault) => {
            log::error!("{fault}");
            ExitCode::from(3)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_positional_order() {
        let arguments = Arguments::try_parse_from(["minivm-cli", "prog.bin", "data.bin"]).unwrap();
        assert_eq!(arguments.rom_file, PathBuf::from("prog.bin"));
        assert_eq!(arguments.ram_file, PathBuf::from("data.bin"));
        assert_eq!(arguments.config(), MachineConfig::default());
        assert_eq!(arguments.dump, None);
        assert_eq!(arguments.log_level(), LevelFilter::Warn);
    }

    #[test]
    fn test_missing_argument() {
        assert!(Arguments::try_parse_from(["minivm-cli", "prog.bin"]).is_err());
        assert!(Arguments::try_parse_from(["minivm-cli", "a", "b", "c"]).is_err());
    }

    #[test]
    fn test_options() {
        let arguments = Arguments::try_parse_from([
            "minivm-cli",
            "--lenient",
            "--ram-size",
            "1024",
            "--dump",
            "-vv",
            "prog.s",
            "data.bin",
        ])
        .unwrap();
        let config = arguments.config();
        assert_eq!(config.data_memory, 1024);
        assert_eq!(config.unknown_opcode, UnknownOpcode::Halt);
        assert_eq!(arguments.dump, Some(256));
        assert_eq!(arguments.log_level(), LevelFilter::Debug);
        assert!(is_source(&arguments.rom_file));
        assert!(!is_source(&arguments.ram_file));
    }

    #[test]
    fn test_dump_size() {
        let arguments =
            Arguments::try_parse_from(["minivm-cli", "--dump=32", "prog.bin", "data.bin"]).unwrap();
        assert_eq!(arguments.dump, Some(32));

        // A bare `--dump` leaves the following positional alone
        let arguments =
            Arguments::try_parse_from(["minivm-cli", "--dump", "prog.bin", "data.bin"]).unwrap();
        assert_eq!(arguments.dump, Some(256));
        assert_eq!(arguments.rom_file, PathBuf::from("prog.bin"));
        assert_eq!(arguments.ram_file, PathBuf::from("data.bin"));
    }

    #[test]
    fn test_segment_size_limit() {
        assert_eq!(segment_size("4294967296"), Ok(1 << 32));
        assert!(segment_size("4294967297").is_err());
        assert!(segment_size("1000000000000000").is_err());
        assert!(segment_size("-1").is_err());
        assert!(Arguments::try_parse_from([
            "minivm-cli",
            "--ram-size",
            "1000000000000000",
            "prog.bin",
            "data.bin"
        ])
        .is_err());
    }
}
