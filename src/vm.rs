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

//! Intcode virtual machine

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::Cell;

use crate::core::{Core, CoreConfig, Fault, Memory, Pipe, PipeError, Word};
use crate::isa::{exec, ExecStep, Opcode};
use crate::program::ProgramId;

/// Execution status of a machine.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display, Default)]
#[display(doc_comments)]
pub enum Status {
    /// ready
    #[default]
    Ready,

    /// suspended waiting for input
    Suspended,

    /// halted
    Halted,

    /// faulted: {0}
    Faulted(Fault),
}

impl Status {
    /// Detects whether the machine will never execute again.
    #[inline]
    pub fn is_terminal(self) -> bool { matches!(self, Status::Halted | Status::Faulted(_)) }
}

/// Outcome of a single [`IntCode::step`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display)]
#[display(doc_comments)]
pub enum Step {
    /// instruction executed
    Advanced,

    /// machine halted
    Halted,

    /// machine suspended on an empty input pipe
    Suspended,

    /// machine faulted: {0}
    Faulted(Fault),
}

/// Errors returned by [`IntCode::run`]. Both carry the name of the machine.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Display)]
#[cfg_attr(feature = "std", derive(Error))]
#[display(doc_comments)]
pub enum VmError {
    /// machine `{name}` faulted at {ip}: {fault}
    Fault { name: String, ip: Word, fault: Fault },

    /// machine `{name}` exceeded its budget of {limit} steps
    Budget { name: String, limit: u64 },
}

impl VmError {
    /// Name of the machine which has failed.
    pub fn name(&self) -> &str {
        match self {
            VmError::Fault { name, .. } | VmError::Budget { name, .. } => name,
        }
    }

    /// Fault which has stopped the machine, if any.
    pub fn fault(&self) -> Option<Fault> {
        match self {
            VmError::Fault { fault, .. } => Some(*fault),
            VmError::Budget { .. } => None,
        }
    }
}

/// Intcode virtual machine: a core with its input and output pipes.
///
/// The machine exclusively owns its memory; pipes may be shared with other machines (see
/// [`crate::chain`]). Machines are single-threaded, and pipes are not `Send`.
#[derive(Debug)]
pub struct IntCode {
    core: Core,
    input: Pipe,
    output: Pipe,
    status: Status,
    name: String,
    config: CoreConfig,

    /// Number of instructions executed over the machine lifetime.
    steps: u64,

    /// Number of forks taken from this machine; used to name the forks.
    forks: Cell<u32>,
}

impl IntCode {
    /// Constructs a machine with fresh empty pipes, named after the program id.
    #[inline]
    pub fn new(program: &[Word]) -> Self { IntCode::with(program, None, None, None) }

    /// Constructs a machine using provided pipes and name. Missing pipes are created empty;
    /// missing name is derived from the program id as `intcode-<short id>`.
    pub fn with(
        program: &[Word],
        input: Option<Pipe>,
        output: Option<Pipe>,
        name: Option<&str>,
    ) -> Self {
        let name = match name {
            Some(name) => name.to_string(),
            None => format!("intcode-{}", ProgramId::commit(program).short()),
        };
        IntCode {
            core: Core::new(program),
            input: input.unwrap_or_default(),
            output: output.unwrap_or_default(),
            status: Status::Ready,
            name,
            config: default!(),
            steps: 0,
            forks: Cell::new(0),
        }
    }

    /// Constructs a machine with a custom configuration.
    pub fn with_config(program: &[Word], config: CoreConfig) -> Self {
        let mut vm = IntCode::new(program);
        vm.core = Core::with(program, config);
        vm.config = config;
        vm
    }

    /// Renames the machine.
    pub fn named(mut self, name: impl ToString) -> Self {
        self.name = name.to_string();
        self
    }

    /// Replaces the input pipe.
    pub fn with_input(mut self, input: Pipe) -> Self {
        self.input = input;
        self
    }

    /// Replaces the output pipe.
    pub fn with_output(mut self, output: Pipe) -> Self {
        self.output = output;
        self
    }

    /// Replaces the input pipe, returning the previous one.
    pub fn set_input(&mut self, input: Pipe) -> Pipe { core::mem::replace(&mut self.input, input) }

    /// Replaces the output pipe, returning the previous one.
    pub fn set_output(&mut self, output: Pipe) -> Pipe {
        core::mem::replace(&mut self.output, output)
    }

    /// Machine memory.
    #[inline]
    pub fn memory(&self) -> &Memory { self.core.memory() }

    /// Mutable access to the machine memory, e.g. for patching a program before running it.
    #[inline]
    pub fn memory_mut(&mut self) -> &mut Memory { self.core.memory_mut() }

    /// Input pipe.
    #[inline]
    pub fn input(&self) -> &Pipe { &self.input }

    /// Output pipe.
    #[inline]
    pub fn output(&self) -> &Pipe { &self.output }

    /// Machine name used in diagnostics.
    #[inline]
    pub fn name(&self) -> &str { &self.name }

    /// Instruction pointer.
    #[inline]
    pub fn ip(&self) -> Word { self.core.ip() }

    /// Relative base.
    #[inline]
    pub fn relative_base(&self) -> Word { self.core.rb() }

    /// Core registers and memory.
    #[inline]
    pub fn core(&self) -> &Core { &self.core }

    /// Machine configuration.
    #[inline]
    pub fn config(&self) -> CoreConfig { self.config }

    #[inline]
    pub fn status(&self) -> Status { self.status }

    #[inline]
    pub fn is_halted(&self) -> bool { self.status == Status::Halted }

    /// Number of instructions executed since the machine was created.
    #[inline]
    pub fn steps(&self) -> u64 { self.steps }

    /// Executes a single instruction.
    ///
    /// A suspended machine retries the same `INPUT` instruction; a halted or faulted machine is
    /// left untouched and reports its terminal state again.
    pub fn step(&mut self) -> Step { self.exec(None) }

    /// Runs the machine until it halts or suspends, applying the default step budget from the
    /// configuration.
    ///
    /// Returns the values written to the output pipe during this call. The values are also
    /// left in the output pipe itself for the downstream reader.
    ///
    /// # Errors
    ///
    /// [`VmError::Fault`] if the machine faults, now or during an earlier run, and
    /// [`VmError::Budget`] if it exceeds the configured step limit. Exceeding the budget only
    /// interrupts the call: the machine stays ready and may be run again.
    pub fn run(&mut self) -> Result<Vec<Word>, VmError> { self.run_for(self.config.step_lim) }

    /// Runs the machine like [`IntCode::run`], executing at most `budget` instructions.
    pub fn run_limited(&mut self, budget: u64) -> Result<Vec<Word>, VmError> {
        self.run_for(Some(budget))
    }

    /// Creates an independent copy of the machine.
    ///
    /// The copy gets a deep copy of the memory and registers, and new pipes holding the values
    /// pending in the original pipes. It is named `<name>~<n>`, where `n` counts the forks taken
    /// from this machine.
    pub fn fork(&self) -> IntCode {
        let n = self.forks.get() + 1;
        self.forks.set(n);
        IntCode {
            core: self.core.clone(),
            input: self.input.fork(),
            output: self.output.fork(),
            status: self.status,
            name: format!("{}~{n}", self.name),
            config: self.config,
            steps: self.steps,
            forks: Cell::new(0),
        }
    }

    fn run_for(&mut self, limit: Option<u64>) -> Result<Vec<Word>, VmError> {
        let mut output = Vec::new();
        let mut count = 0u64;
        loop {
            if let Some(limit) = limit.filter(|limit| count >= *limit && !self.is_blocked()) {
                #[cfg(feature = "log")]
                eprintln!("{}: budget of {limit} steps exhausted", self.name);
                return Err(VmError::Budget { name: self.name.clone(), limit });
            }
            match self.exec(Some(&mut output)) {
                Step::Advanced => count += 1,
                Step::Halted | Step::Suspended => return Ok(output),
                Step::Faulted(fault) => {
                    return Err(VmError::Fault { name: self.name.clone(), ip: self.ip(), fault })
                }
            }
        }
    }

    /// Whether the next step can't execute an instruction: the machine has stopped, waits on an
    /// empty input pipe, or faults on fetching. Such steps are not charged to the budget.
    fn is_blocked(&self) -> bool {
        if self.status.is_terminal() {
            return true;
        }
        match self.core.fetch() {
            Ok(op) => op.opcode == Opcode::Input && self.input.is_empty(),
            Err(_) => true,
        }
    }

    fn exec(&mut self, sink: Option<&mut Vec<Word>>) -> Step {
        match self.status {
            Status::Halted => return Step::Halted,
            Status::Faulted(fault) => return Step::Faulted(fault),
            Status::Ready | Status::Suspended => {}
        }
        match self.exec_instr(sink) {
            Ok(step) => step,
            Err(fault) => {
                #[cfg(feature = "log")]
                eprintln!("\x1B[0;31mfault: {fault}\x1B[0m");
                self.status = Status::Faulted(fault);
                Step::Faulted(fault)
            }
        }
    }

    fn exec_instr(&mut self, sink: Option<&mut Vec<Word>>) -> Result<Step, Fault> {
        #[cfg(feature = "log")]
        let (m, w, d, g, r, y, z) = (
            "\x1B[0;35m",
            "\x1B[1;1m",
            "\x1B[0;37;2m",
            "\x1B[0;32m",
            "\x1B[0;31m",
            "\x1B[0;33m",
            "\x1B[0m",
        );

        #[cfg(feature = "log")]
        eprint!("{m}{}@{:06}:{z} ", self.name, self.core.ip());

        let op = self.core.fetch()?;

        #[cfg(feature = "log")]
        {
            eprint!("{: <24}; ", op.to_string());
            for operand in op.sources() {
                if let Ok(val) = self.core.load(operand) {
                    eprint!("{d}{operand} {z}{w}{val}{z}, ");
                }
            }
            eprint!("-> ");
        }

        let next = exec(&op, &mut self.core)?;
        match next {
            ExecStep::Next => {
                #[cfg(feature = "log")]
                {
                    match op.destination().map(|dst| (dst, self.core.load(dst))) {
                        Some((dst, Ok(val))) => eprintln!("{g}{dst} {y}{val}{z}"),
                        _ if op.opcode == Opcode::AdjustBase => {
                            eprintln!("{g}rb {y}{}{z}", self.core.rb())
                        }
                        _ => eprintln!("{d}next{z}"),
                    }
                }
                self.core.advance(op.size())?;
            }
            ExecStep::Jump(target) => {
                #[cfg(feature = "log")]
                eprintln!("{g}jump {y}{target}{z}");
                self.core.jump(target)?;
            }
            ExecStep::Read(addr) => match self.input.read() {
                Ok(value) => {
                    #[cfg(feature = "log")]
                    eprintln!("{g}[{addr}] {y}{value}{z} from input");
                    self.core.memory_mut().write(addr, value)?;
                    self.core.advance(op.size())?;
                }
                Err(PipeError::NoInput) => {
                    #[cfg(feature = "log")]
                    eprintln!("{r}waiting for input{z}");
                    self.status = Status::Suspended;
                    return Ok(Step::Suspended);
                }
                Err(PipeError::EndOfStream) => {
                    #[cfg(feature = "log")]
                    eprintln!("{r}end of input stream{z}; halting");
                    self.status = Status::Halted;
                    return Ok(Step::Halted);
                }
            },
            ExecStep::Write(value) => {
                #[cfg(feature = "log")]
                eprintln!("{g}output {y}{value}{z}");
                self.output.write(value);
                if let Some(sink) = sink {
                    sink.push(value);
                }
                self.core.advance(op.size())?;
            }
            ExecStep::Stop => {
                #[cfg(feature = "log")]
                eprintln!("{r}execution stopped{z}");
                self.steps += 1;
                self.status = Status::Halted;
                return Ok(Step::Halted);
            }
        }
        self.steps += 1;
        self.status = Status::Ready;
        Ok(Step::Advanced)
    }
}
