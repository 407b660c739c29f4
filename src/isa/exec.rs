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

use super::{Op, Opcode};
use crate::core::{Core, Fault, Word};

/// Machine movement requested by an executed instruction.
///
/// Handlers never touch pipes or the instruction pointer: the machine applies the step, and only
/// then moves past the instruction.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum ExecStep {
    /// Stop program execution
    Stop,

    /// Move to the next instruction
    Next,

    /// Jump to the absolute address
    Jump(Word),

    /// Take a word from the input pipe and store it at the address
    Read(Word),

    /// Put a word into the output pipe
    Write(Word),
}

/// Instruction handler.
pub type Handler = fn(&Op, &mut Core) -> Result<ExecStep, Fault>;

impl Opcode {
    /// Handler executing instructions with this opcode.
    pub const fn handler(self) -> Handler {
        match self {
            Opcode::Add => add,
            Opcode::Mul => mul,
            Opcode::Input => input,
            Opcode::Output => output,
            Opcode::JmpIfTrue => jnz,
            Opcode::JmpIfFalse => jz,
            Opcode::LessThan => lt,
            Opcode::Equals => eq,
            Opcode::AdjustBase => arb,
            Opcode::Halt => halt,
        }
    }
}

/// Executes a single fetched instruction over the core.
#[inline]
pub fn exec(op: &Op, core: &mut Core) -> Result<ExecStep, Fault> { (op.opcode.handler())(op, core) }

fn binary(
    op: &Op,
    core: &mut Core,
    f: impl FnOnce(Word, Word) -> Option<Word>,
) -> Result<ExecStep, Fault> {
    let a = core.load(op.operand(0))?;
    let b = core.load(op.operand(1))?;
    let res = f(a, b).ok_or(Fault::Overflow)?;
    core.store(op.operand(2), res)?;
    Ok(ExecStep::Next)
}

fn add(op: &Op, core: &mut Core) -> Result<ExecStep, Fault> { binary(op, core, Word::checked_add) }

fn mul(op: &Op, core: &mut Core) -> Result<ExecStep, Fault> { binary(op, core, Word::checked_mul) }

fn lt(op: &Op, core: &mut Core) -> Result<ExecStep, Fault> {
    binary(op, core, |a, b| Some((a < b) as Word))
}

fn eq(op: &Op, core: &mut Core) -> Result<ExecStep, Fault> {
    binary(op, core, |a, b| Some((a == b) as Word))
}

fn input(op: &Op, core: &mut Core) -> Result<ExecStep, Fault> {
    core.target(op.operand(0)).map(ExecStep::Read)
}

fn output(op: &Op, core: &mut Core) -> Result<ExecStep, Fault> {
    core.load(op.operand(0)).map(ExecStep::Write)
}

fn branch(op: &Op, core: &mut Core, when: bool) -> Result<ExecStep, Fault> {
    if (core.load(op.operand(0))? != 0) != when {
        return Ok(ExecStep::Next);
    }
    core.load(op.operand(1)).map(ExecStep::Jump)
}

fn jnz(op: &Op, core: &mut Core) -> Result<ExecStep, Fault> { branch(op, core, true) }

fn jz(op: &Op, core: &mut Core) -> Result<ExecStep, Fault> { branch(op, core, false) }

fn arb(op: &Op, core: &mut Core) -> Result<ExecStep, Fault> {
    let delta = core.load(op.operand(0))?;
    core.adjust_rb(delta)?;
    Ok(ExecStep::Next)
}

fn halt(_: &Op, _: &mut Core) -> Result<ExecStep, Fault> { Ok(ExecStep::Stop) }

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::Access;
    use crate::isa::Operand;

    fn run_one(code: &[Word]) -> (Result<ExecStep, Fault>, Core) {
        let mut core = Core::new(code);
        let op = core.fetch().unwrap();
        let step = exec(&op, &mut core);
        (step, core)
    }

    #[test]
    fn arithmetic() {
        let (step, core) = run_one(&[1, 0, 0, 0, 99]);
        assert_eq!(step, Ok(ExecStep::Next));
        assert_eq!(core.memory().snapshot(), [2, 0, 0, 0, 99]);
        assert_eq!(core.ip(), 0);

        let (step, core) = run_one(&[2, 3, 0, 3, 99]);
        assert_eq!(step, Ok(ExecStep::Next));
        assert_eq!(core.memory().read(3).unwrap(), 6);
    }

    #[test]
    fn overflow() {
        let (step, _) = run_one(&[1102, Word::MAX, 2, 0]);
        assert_eq!(step, Err(Fault::Overflow));
        let (step, core) = run_one(&[1101, Word::MAX, Word::MIN, 0]);
        assert_eq!(step, Ok(ExecStep::Next));
        assert_eq!(core.memory().read(0).unwrap(), -1);
    }

    #[test]
    fn comparisons() {
        let (_, core) = run_one(&[1107, 3, 8, 5, 99, 7]);
        assert_eq!(core.memory().read(5).unwrap(), 1);
        let (_, core) = run_one(&[1108, 3, 8, 5, 99, 7]);
        assert_eq!(core.memory().read(5).unwrap(), 0);
    }

    #[test]
    fn branches() {
        assert_eq!(run_one(&[1105, 1, 7]).0, Ok(ExecStep::Jump(7)));
        assert_eq!(run_one(&[1105, 0, 7]).0, Ok(ExecStep::Next));
        assert_eq!(run_one(&[1106, 0, 7]).0, Ok(ExecStep::Jump(7)));
        assert_eq!(run_one(&[1106, -4, 7]).0, Ok(ExecStep::Next));
        // the target is only loaded when the branch is taken
        assert_eq!(run_one(&[105, 0, -1]).0, Ok(ExecStep::Next));
    }

    #[test]
    fn io_requests() {
        assert_eq!(run_one(&[3, 5]).0, Ok(ExecStep::Read(5)));
        assert_eq!(run_one(&[203, -1]).0, Err(Fault::SegFault(Access::Write(-1))));
        assert_eq!(run_one(&[4, 0]).0, Ok(ExecStep::Write(4)));
        assert_eq!(run_one(&[104, -9]).0, Ok(ExecStep::Write(-9)));
    }

    #[test]
    fn relative_base() {
        let (step, core) = run_one(&[109, -19]);
        assert_eq!(step, Ok(ExecStep::Next));
        assert_eq!(core.rb(), -19);
        assert_eq!(core.load(Operand::rel(21)).unwrap(), 0);
    }

    #[test]
    fn halt_stops() {
        let (step, core) = run_one(&[99]);
        assert_eq!(step, Ok(ExecStep::Stop));
        assert_eq!(core.memory().snapshot(), [99]);
    }
}
