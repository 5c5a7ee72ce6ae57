// SPDX-FileCopyrightText: 2025 armvm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

mod config;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};

use armvm_common::settings::{MemoryModel, RangeSetting, Settings};
use armvm_common::VAddr;
use armvm_core::HostVm;
use armvm_cpu::Interrupt;

/// armvm - ARMv4 user-mode virtual machine
#[derive(Parser, Debug)]
#[command(name = "armvm", version, about = "ARMv4 user-mode virtual machine")]
struct Args {
    /// Raw binary image, loaded at guest address 0
    image: PathBuf,

    /// Path to an INI config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Guest memory size in bytes (decimal or 0x hex)
    #[arg(long, value_parser = parse_size)]
    memory_size: Option<usize>,

    /// Use the protected memory model
    #[arg(long)]
    protected: bool,

    /// Access range `start,size,perm` for the protected model (repeatable)
    #[arg(long = "range", value_parser = parse_range)]
    ranges: Vec<RangeSetting>,

    /// Address whose byte is printed on every suspend
    #[arg(long, value_parser = parse_address)]
    uart: Option<VAddr>,

    /// Address whose store suspends the VM
    #[arg(long, value_parser = parse_address)]
    suspend_addr: Option<VAddr>,

    /// Instructions per run slice (0 = unbounded)
    #[arg(long)]
    max_iterations: Option<u32>,

    /// Run without the VFP coprocessor
    #[arg(long)]
    no_vfp: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Print the register file when the VM stops
    #[arg(long)]
    dump_registers: bool,
}

fn parse_size(s: &str) -> Result<usize, String> {
    config::parse_size(s).map_err(|e| e.to_string())
}

fn parse_address(s: &str) -> Result<VAddr, String> {
    config::parse_address(s).map_err(|e| e.to_string())
}

fn parse_range(s: &str) -> Result<RangeSetting, String> {
    RangeSetting::parse(s).ok_or_else(|| format!("invalid range '{s}' (expected start,size,perm)"))
}

impl Args {
    /// Command-line flags take precedence over the config file.
    fn apply(&self, settings: &mut Settings) {
        if let Some(size) = self.memory_size {
            settings.memory_size = size;
        }
        if self.protected {
            settings.memory_model = MemoryModel::Protected;
        }
        if !self.ranges.is_empty() {
            settings.access_ranges = self.ranges.clone();
        }
        if self.uart.is_some() {
            settings.uart_address = self.uart;
        }
        if self.suspend_addr.is_some() {
            settings.suspend_address = self.suspend_addr;
        }
        if let Some(max) = self.max_iterations {
            settings.max_iterations = max;
        }
        if self.no_vfp {
            settings.enable_vfp = false;
        }
        if self.verbose {
            settings.use_debug_logging = true;
        }
    }
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let mut settings = config::load_config(args.config.as_deref())?;
    args.apply(&mut settings);
    if settings.memory_size == 0 {
        anyhow::bail!("memory size must be non-zero");
    }

    // Initialize logging
    let log_level = if settings.use_debug_logging { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .init();

    info!(
        "memory: {:#X} bytes, model {:?}, vfp {}",
        settings.memory_size, settings.memory_model, settings.enable_vfp
    );

    let mut vm = HostVm::from_settings(&settings);
    vm.init(settings.memory_size);
    let size = vm
        .load(&args.image)
        .with_context(|| format!("Failed to load image {}", args.image.display()))?;
    info!("Loaded {size:#X} bytes from {}", args.image.display());

    let stdout = std::io::stdout();
    let status = run_host(&mut vm, &mut stdout.lock())?;

    if args.dump_registers {
        dump_registers(&vm);
    }
    Ok(ExitCode::from(status))
}

/// Drive the VM until it stops, printing the UART byte on every suspend.
/// Returns the process exit status: the low byte of r0 on Stop, 1 on failure.
fn run_host(vm: &mut HostVm, out: &mut impl Write) -> Result<u8> {
    loop {
        match vm.run_configured() {
            Ok(Interrupt::Resume) => {}
            Ok(Interrupt::Suspend) => match vm.uart_byte() {
                Some(byte) => {
                    out.write_all(&[byte])?;
                    out.flush()?;
                }
                None => warn!("suspend without a readable UART address"),
            },
            Ok(Interrupt::Stop) => {
                let status = (vm.registers()[0] & 0xFF) as u8;
                info!("guest stopped with status {status}");
                return Ok(status);
            }
            Ok(interrupt @ (Interrupt::Fatal | Interrupt::Undefined)) => {
                error!(
                    "guest raised {interrupt:?} at 0x{:08X} (SWI {:?})",
                    vm.state().pc(),
                    vm.interpreter().last_swi()
                );
                return Ok(1);
            }
            Err(err) => {
                error!("{err}");
                return Ok(1);
            }
        }
    }
}

fn dump_registers(vm: &HostVm) {
    for (i, chunk) in vm.registers().chunks(4).enumerate() {
        let line: Vec<String> = chunk
            .iter()
            .enumerate()
            .map(|(j, value)| format!("r{:<2} = 0x{value:08X}", i * 4 + j))
            .collect();
        eprintln!("{}", line.join("  "));
    }
    eprintln!("cpsr = 0x{:08X}", vm.cpsr());
}
