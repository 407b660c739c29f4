// Intcode register machine with cooperative, composable I/O pipes.
//
// SPDX-License-Identifier: Apache-2.0
//
// Written in 2019-2025 by
//     Intcode VM contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use core::fmt::{self, Debug, Formatter};

use super::{Access, Fault, Memory, Word};
use crate::isa::{decode, Mode, Op, Operand, MAX_ARITY};

/// Default for [`CoreConfig::dense_lim`]: addresses below 1 Mi words are stored contiguously.
pub const DENSE_LIM_DEFAULT: usize = 1 << 20;

/// Configuration for [`Core`] and machine initialization.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct CoreConfig {
    /// Default number of instructions a single `run` call may execute before it fails with a
    /// budget error. `None` runs until the machine halts or suspends.
    pub step_lim: Option<u64>,
    /// Addresses below this value are kept in the contiguous memory buffer, higher addresses in
    /// the sparse map.
    pub dense_lim: usize,
}

impl Default for CoreConfig {
    /// Sets
    /// - [`CoreConfig::step_lim`] to `None`,
    /// - [`CoreConfig::dense_lim`] to [`DENSE_LIM_DEFAULT`].
    fn default() -> Self { CoreConfig { step_lim: None, dense_lim: DENSE_LIM_DEFAULT } }
}

/// Registers and memory of a single machine.
///
/// The core knows nothing about I/O: instruction handlers operate on it and report input and
/// output requests back to the machine as [`crate::isa::ExecStep`]s.
#[derive(Clone, Eq, PartialEq)]
pub struct Core {
    memory: Memory,

    /// Instruction pointer. Never negative.
    ip: Word,

    /// Relative base, added to the raw value of relative operands. May be negative.
    rb: Word,
}

impl Core {
    /// Initializes a core with the program loaded at address zero, using the default
    /// configuration.
    #[inline]
    pub fn new(program: &[Word]) -> Self { Core::with(program, default!()) }

    /// Initializes a core with the program loaded at address zero. Instruction pointer and
    /// relative base start at zero.
    pub fn with(program: &[Word], config: CoreConfig) -> Self {
        Core { memory: Memory::load(program, config.dense_lim), ip: 0, rb: 0 }
    }

    /// Instruction pointer.
    #[inline]
    pub fn ip(&self) -> Word { self.ip }

    /// Relative base.
    #[inline]
    pub fn rb(&self) -> Word { self.rb }

    /// Machine memory.
    #[inline]
    pub fn memory(&self) -> &Memory { &self.memory }

    /// Mutable access to the machine memory.
    #[inline]
    pub fn memory_mut(&mut self) -> &mut Memory { &mut self.memory }

    /// Decodes the instruction at the instruction pointer and fetches its operand words.
    pub fn fetch(&self) -> Result<Op, Fault> {
        let instr = decode(self.memory.read(self.ip)?)?;
        let mut args = [0; MAX_ARITY];
        for (offset, arg) in args.iter_mut().enumerate().take(instr.opcode.arity()) {
            let addr = self.ip.checked_add(offset as Word + 1).ok_or(Fault::Overflow)?;
            *arg = self.memory.read(addr)?;
        }
        Ok(Op::with(instr, args))
    }

    /// Resolves an operand into the value it denotes.
    pub fn load(&self, operand: Operand) -> Result<Word, Fault> {
        match operand.mode {
            Mode::Immediate => Ok(operand.raw),
            Mode::Position | Mode::Relative => self.memory.read(self.address(operand)?),
        }
    }

    /// Resolves an operand into the address it refers to.
    ///
    /// # Errors
    ///
    /// [`Fault::SegFault`] for immediate operands, which don't refer to memory, and for negative
    /// addresses.
    pub fn address(&self, operand: Operand) -> Result<Word, Fault> {
        let addr = match operand.mode {
            Mode::Position => operand.raw,
            Mode::Relative => self.rb.checked_add(operand.raw).ok_or(Fault::Overflow)?,
            Mode::Immediate => return Err(Access::Immediate.into()),
        };
        if addr < 0 {
            return Err(Access::Read(addr).into());
        }
        Ok(addr)
    }

    /// Resolves a destination operand into a non-negative address.
    pub fn target(&self, operand: Operand) -> Result<Word, Fault> {
        self.address(operand).map_err(|fault| match fault {
            Fault::SegFault(Access::Read(addr)) => Access::Write(addr).into(),
            fault => fault,
        })
    }

    /// Writes `value` to the cell a destination operand refers to.
    pub fn store(&mut self, operand: Operand, value: Word) -> Result<(), Fault> {
        let addr = self.target(operand)?;
        self.memory.write(addr, value)
    }

    /// Adds `delta` to the relative base. The base itself may become negative; only a relative
    /// access resolving to a negative address faults.
    pub fn adjust_rb(&mut self, delta: Word) -> Result<(), Fault> {
        self.rb = self.rb.checked_add(delta).ok_or(Fault::Overflow)?;
        Ok(())
    }

    /// Moves the instruction pointer past an instruction of `size` words.
    pub fn advance(&mut self, size: usize) -> Result<(), Fault> {
        self.ip = self.ip.checked_add(size as Word).ok_or(Fault::Overflow)?;
        Ok(())
    }

    /// Sets the instruction pointer to `target`.
    pub fn jump(&mut self, target: Word) -> Result<(), Fault> {
        if target < 0 {
            return Err(Access::Jump(target).into());
        }
        self.ip = target;
        Ok(())
    }
}

impl Debug for Core {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let (reg, val, reset) =
            if f.alternate() { ("\x1B[0;1m", "\x1B[0;32m", "\x1B[0m") } else { ("", "", "") };

        write!(f, "{reg}ip{reset} {val}{}{reset}, ", self.ip)?;
        write!(f, "{reg}rb{reset} {val}{}{reset}, ", self.rb)?;
        write!(f, "{reg}mem{reset} {val}{}{reset} words", self.memory.extent())
    }
}
