// SPDX-FileCopyrightText: 2025 armvm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::Path;

use log::debug;

use armvm_common::{Settings, VAddr, LOAD_ADDRESS, REGISTER_COUNT};
use armvm_cpu::coprocessor::CoprocessorImpl;
use armvm_cpu::{Coprocessor, CpuState, Interpreter, Interrupt, NoCoprocessor, Vfp};
use armvm_memory::{GuestMemory, MemoryBackend};

use crate::error::{VmError, VmResult};

/// A single ARMv4 virtual machine: register file, guest memory and an
/// interpreter with its coprocessor.
pub struct Vm<M, C: Coprocessor = NoCoprocessor> {
    state: CpuState,
    memory: M,
    interpreter: Interpreter<C>,
    /// Per-`run` budget used by [`Vm::run_configured`].
    max_iterations: u32,
    uart_address: Option<VAddr>,
    program_size: usize,
    initialized: bool,
}

/// VM with the memory model and coprocessor chosen from [`Settings`].
pub type HostVm = Vm<GuestMemory, CoprocessorImpl>;

impl HostVm {
    pub fn from_settings(settings: &Settings) -> Self {
        let coprocessor: CoprocessorImpl = if settings.enable_vfp {
            Box::new(Vfp::new())
        } else {
            Box::new(NoCoprocessor)
        };
        Vm::new(GuestMemory::from_settings(settings), coprocessor, settings)
    }
}

impl<M: MemoryBackend, C: Coprocessor> Vm<M, C> {
    pub fn new(memory: M, coprocessor: C, settings: &Settings) -> Self {
        Self {
            state: CpuState::new(),
            memory,
            interpreter: Interpreter::new(coprocessor).with_suspend_address(settings.suspend_address),
            max_iterations: settings.max_iterations,
            uart_address: settings.uart_address,
            program_size: 0,
            initialized: false,
        }
    }

    /// Allocate `memory_size` zero bytes of guest memory and reset the CPU.
    /// Returns the guest address images are loaded at.
    pub fn init(&mut self, memory_size: usize) -> VAddr {
        self.memory.allocate(memory_size);
        self.reset();
        self.program_size = 0;
        self.initialized = true;
        debug!("initialized {memory_size:#X} bytes of guest memory");
        LOAD_ADDRESS
    }

    /// Zero the register file and status registers and reset the coprocessor.
    /// Memory is left untouched.
    pub fn reset(&mut self) {
        self.state.reset();
        self.interpreter.reset();
    }

    /// Copy a raw binary image from `path` to guest address 0.
    ///
    /// On failure nothing is written and the program size is 0.
    pub fn load(&mut self, path: impl AsRef<Path>) -> VmResult<usize> {
        let path = path.as_ref();
        self.program_size = 0;
        if !self.initialized {
            return Err(VmError::NotInitialized);
        }
        let image = std::fs::read(path).map_err(|source| VmError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        let size = self.load_bytes(&image)?;
        debug!("loaded {size:#X} bytes from {}", path.display());
        Ok(size)
    }

    /// Copy `image` to guest address 0.
    pub fn load_bytes(&mut self, image: &[u8]) -> VmResult<usize> {
        self.program_size = 0;
        if !self.initialized {
            return Err(VmError::NotInitialized);
        }
        let capacity = self.memory.size();
        if image.len() > capacity {
            return Err(VmError::ImageTooLarge { size: image.len(), capacity });
        }
        let start = LOAD_ADDRESS as usize;
        self.memory.bytes_mut()[start..start + image.len()].copy_from_slice(image);
        self.program_size = image.len();
        Ok(image.len())
    }

    /// Execute up to `max_iterations` instructions (0 = no limit).
    pub fn run(&mut self, max_iterations: u32) -> VmResult<Interrupt> {
        if !self.initialized {
            return Err(VmError::NotInitialized);
        }
        let interrupt = self
            .interpreter
            .run(&mut self.state, &mut self.memory, max_iterations)?;
        debug!("run ended with {interrupt:?} at pc=0x{:08X}", self.state.pc());
        Ok(interrupt)
    }

    /// Execute with the iteration budget from [`Settings::max_iterations`].
    pub fn run_configured(&mut self) -> VmResult<Interrupt> {
        self.run(self.max_iterations)
    }

    pub fn registers(&self) -> &[u32; REGISTER_COUNT] {
        &self.state.r
    }

    pub fn cpsr(&self) -> u32 {
        self.state.cpsr
    }

    pub fn state(&self) -> &CpuState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut CpuState {
        &mut self.state
    }

    pub fn memory(&self) -> &M {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut M {
        &mut self.memory
    }

    pub fn interpreter(&self) -> &Interpreter<C> {
        &self.interpreter
    }

    pub fn interpreter_mut(&mut self) -> &mut Interpreter<C> {
        &mut self.interpreter
    }

    pub fn program_size(&self) -> usize {
        self.program_size
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn uart_address(&self) -> Option<VAddr> {
        self.uart_address
    }

    /// Byte at the UART address, read without permission checks.
    pub fn uart_byte(&self) -> Option<u8> {
        let addr = self.uart_address?;
        self.memory.bytes().get(addr as usize).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use armvm_memory::RawMemory;

    fn vm() -> Vm<RawMemory> {
        Vm::new(RawMemory::new(), NoCoprocessor, &Settings::default())
    }

    #[test]
    fn test_init_zeroes_state_and_memory() {
        let mut vm = vm();
        assert_eq!(vm.init(0x100), 0);
        vm.state_mut().set_reg(3, 9);
        vm.memory_mut().bytes_mut()[0] = 1;
        vm.init(0x200);
        assert_eq!(vm.registers(), &[0u32; REGISTER_COUNT]);
        assert_eq!(vm.cpsr(), 0);
        assert_eq!(vm.memory().size(), 0x200);
        assert!(vm.memory().bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_load_from_file() {
        let mut vm = vm();
        vm.init(0x100);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[1, 2, 3, 4, 5]).unwrap();
        assert_eq!(vm.load(file.path()).unwrap(), 5);
        assert_eq!(vm.program_size(), 5);
        assert_eq!(&vm.memory().bytes()[..6], &[1, 2, 3, 4, 5, 0]);
    }

    #[test]
    fn test_load_missing_file_writes_nothing() {
        let mut vm = vm();
        vm.init(0x100);
        vm.load_bytes(&[7; 4]).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let err = vm.load(dir.path().join("missing.bin")).unwrap_err();
        assert!(matches!(err, VmError::Load { .. }));
        assert_eq!(vm.program_size(), 0);
        assert_eq!(&vm.memory().bytes()[..4], &[7; 4]);
    }

    #[test]
    fn test_load_too_large() {
        let mut vm = vm();
        vm.init(4);
        let err = vm.load_bytes(&[0; 8]).unwrap_err();
        assert!(matches!(err, VmError::ImageTooLarge { size: 8, capacity: 4 }));
        assert_eq!(vm.program_size(), 0);
    }

    #[test]
    fn test_requires_init() {
        let mut vm = vm();
        assert!(matches!(vm.load_bytes(&[0]), Err(VmError::NotInitialized)));
        assert!(matches!(vm.run(1), Err(VmError::NotInitialized)));
    }

    #[test]
    fn test_vm_usable_after_failed_load() {
        let mut vm = vm();
        vm.init(0x100);
        assert!(vm.load("/nonexistent/armvm/image.bin").is_err());
        vm.load_bytes(&0xEF00_0001u32.to_le_bytes()).unwrap();
        assert_eq!(vm.run(0).unwrap(), Interrupt::Stop);
    }

    #[test]
    fn test_uart_byte() {
        let settings = Settings { uart_address: Some(0x10), ..Settings::default() };
        let mut vm: Vm<RawMemory> = Vm::new(RawMemory::new(), NoCoprocessor, &settings);
        vm.init(0x20);
        vm.memory_mut().bytes_mut()[0x10] = b'A';
        assert_eq!(vm.uart_byte(), Some(b'A'));
        assert_eq!(vm.uart_address(), Some(0x10));
    }

    #[test]
    fn test_run_configured_uses_budget() {
        let settings = Settings { max_iterations: 3, ..Settings::default() };
        let mut vm: Vm<RawMemory> = Vm::new(RawMemory::new(), NoCoprocessor, &settings);
        vm.init(0x20);
        vm.load_bytes(&0xEAFF_FFFEu32.to_le_bytes()).unwrap(); // b .
        assert_eq!(vm.run_configured().unwrap(), Interrupt::Resume);
        assert_eq!(vm.interpreter().executed(), 3);
    }
}
