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

use alloc::vec::Vec;
use core::fmt::{self, Display, Formatter};

use super::opcodes::*;
use crate::core::Word;

/// Intcode operation codes.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
#[repr(u8)]
pub enum Opcode {
    /// Writes the sum of the first two operands to the third one.
    Add = OP_ADD as u8,

    /// Writes the product of the first two operands to the third one.
    Mul = OP_MUL as u8,

    /// Reads a word from the input pipe into the operand. Suspends the machine if the pipe is
    /// empty, halts it if the pipe is also closed.
    Input = OP_INPUT as u8,

    /// Writes the operand to the output pipe.
    Output = OP_OUTPUT as u8,

    /// Jumps to the second operand if the first one is non-zero.
    JmpIfTrue = OP_JNZ as u8,

    /// Jumps to the second operand if the first one is zero.
    JmpIfFalse = OP_JZ as u8,

    /// Writes 1 to the third operand if the first is less than the second, or 0 otherwise.
    LessThan = OP_LT as u8,

    /// Writes 1 to the third operand if the first two are equal, or 0 otherwise.
    Equals = OP_EQ as u8,

    /// Adds the operand to the relative base.
    AdjustBase = OP_ARB as u8,

    /// Halts the machine.
    Halt = OP_HALT as u8,
}

impl Opcode {
    /// All opcodes in code order.
    pub const ALL: [Opcode; 10] = [
        Opcode::Add,
        Opcode::Mul,
        Opcode::Input,
        Opcode::Output,
        Opcode::JmpIfTrue,
        Opcode::JmpIfFalse,
        Opcode::LessThan,
        Opcode::Equals,
        Opcode::AdjustBase,
        Opcode::Halt,
    ];

    /// Looks up the opcode with the given numeric code.
    pub fn from_code(code: Word) -> Option<Self> {
        Opcode::ALL.into_iter().find(|opcode| opcode.code() == code)
    }

    /// Numeric code of the opcode, as stored in the two lowest digits of an instruction word.
    #[inline]
    pub const fn code(self) -> Word { self as u8 as Word }

    /// Assembler mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Add => "add",
            Opcode::Mul => "mul",
            Opcode::Input => "in",
            Opcode::Output => "out",
            Opcode::JmpIfTrue => "jnz",
            Opcode::JmpIfFalse => "jz",
            Opcode::LessThan => "lt",
            Opcode::Equals => "eq",
            Opcode::AdjustBase => "arb",
            Opcode::Halt => "hlt",
        }
    }

    /// Number of operands.
    pub const fn arity(self) -> usize {
        match self {
            Opcode::Add | Opcode::Mul | Opcode::LessThan | Opcode::Equals => 3,
            Opcode::JmpIfTrue | Opcode::JmpIfFalse => 2,
            Opcode::Input | Opcode::Output | Opcode::AdjustBase => 1,
            Opcode::Halt => 0,
        }
    }

    /// Number of words taken by the instruction, which is also how far the instruction pointer
    /// advances past it.
    #[inline]
    pub const fn size(self) -> usize { self.arity() + 1 }

    /// Index of the operand the instruction writes to, if any.
    pub const fn write_operand(self) -> Option<usize> {
        match self {
            Opcode::Add | Opcode::Mul | Opcode::LessThan | Opcode::Equals => Some(2),
            Opcode::Input => Some(0),
            Opcode::Output
            | Opcode::JmpIfTrue
            | Opcode::JmpIfFalse
            | Opcode::AdjustBase
            | Opcode::Halt => None,
        }
    }
}

impl Display for Opcode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result { f.pad(self.mnemonic()) }
}

/// Operand addressing modes.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
#[repr(u8)]
pub enum Mode {
    /// The operand word is the address of the value.
    #[default]
    #[display("position")]
    Position = MODE_POSITION as u8,

    /// The operand word is the value itself. Never used for destinations.
    #[display("immediate")]
    Immediate = MODE_IMMEDIATE as u8,

    /// The operand word plus the relative base is the address of the value.
    #[display("relative")]
    Relative = MODE_RELATIVE as u8,
}

impl Mode {
    /// Looks up the mode for a decimal digit of an instruction word.
    pub fn from_digit(digit: Word) -> Option<Self> {
        match digit {
            MODE_POSITION => Some(Mode::Position),
            MODE_IMMEDIATE => Some(Mode::Immediate),
            MODE_RELATIVE => Some(Mode::Relative),
            _ => None,
        }
    }

    /// Decimal digit representing the mode in an instruction word.
    #[inline]
    pub const fn digit(self) -> Word { self as u8 as Word }
}

/// Decoded instruction word: an opcode with the addressing mode of each operand.
///
/// Modes past the opcode arity are always [`Mode::Position`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(crate = "serde_crate"))]
pub struct Instr {
    pub opcode: Opcode,
    pub modes: [Mode; MAX_ARITY],
}

impl Instr {
    /// Constructs an instruction with all operands in position mode.
    #[inline]
    pub fn new(opcode: Opcode) -> Self { Instr { opcode, modes: [Mode::Position; MAX_ARITY] } }

    /// Modes of the operands actually taken by the opcode.
    #[inline]
    pub fn modes(&self) -> &[Mode] { &self.modes[..self.opcode.arity()] }
}

/// Instruction operand: a raw operand word with its addressing mode.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(crate = "serde_crate"))]
pub struct Operand {
    pub mode: Mode,
    pub raw: Word,
}

impl Operand {
    /// Operand in position mode referring to `addr`.
    #[inline]
    pub const fn pos(addr: Word) -> Self { Operand { mode: Mode::Position, raw: addr } }

    /// Operand in immediate mode holding `value`.
    #[inline]
    pub const fn imm(value: Word) -> Self { Operand { mode: Mode::Immediate, raw: value } }

    /// Operand in relative mode referring to relative base plus `offset`.
    #[inline]
    pub const fn rel(offset: Word) -> Self { Operand { mode: Mode::Relative, raw: offset } }
}

impl Display for Operand {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.mode {
            Mode::Position => write!(f, "[{}]", self.raw),
            Mode::Immediate => write!(f, "{}", self.raw),
            Mode::Relative if self.raw < 0 => write!(f, "[rb{}]", self.raw),
            Mode::Relative => write!(f, "[rb+{}]", self.raw),
        }
    }
}

/// Errors constructing instructions for assembly.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display)]
#[cfg_attr(feature = "std", derive(Error))]
#[display(doc_comments)]
pub enum AsmError {
    /// `{0}` takes {1} operands, but {2} were given
    Arity(Opcode, usize, usize),

    /// `{0}` can't write to an immediate operand
    ImmediateWrite(Opcode),
}

/// Instruction together with its operand words, as fetched from memory or built for assembly.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Op {
    pub opcode: Opcode,
    operands: [Operand; MAX_ARITY],
}

impl Op {
    /// Builds an instruction from an opcode and its operands.
    ///
    /// # Errors
    ///
    /// If the number of operands doesn't match the opcode arity, or if the destination operand
    /// is immediate.
    pub fn new(opcode: Opcode, operands: &[Operand]) -> Result<Self, AsmError> {
        if operands.len() != opcode.arity() {
            return Err(AsmError::Arity(opcode, opcode.arity(), operands.len()));
        }
        if let Some(dst) = opcode.write_operand() {
            if operands[dst].mode == Mode::Immediate {
                return Err(AsmError::ImmediateWrite(opcode));
            }
        }
        let mut op = Op { opcode, operands: default!() };
        op.operands[..operands.len()].copy_from_slice(operands);
        Ok(op)
    }

    /// Combines a decoded instruction word with the operand words following it. Words past the
    /// opcode arity are ignored.
    pub fn with(instr: Instr, args: [Word; MAX_ARITY]) -> Self {
        let mut operands = [Operand::default(); MAX_ARITY];
        for (idx, operand) in operands.iter_mut().enumerate().take(instr.opcode.arity()) {
            *operand = Operand { mode: instr.modes[idx], raw: args[idx] };
        }
        Op { opcode: instr.opcode, operands }
    }

    /// Instruction word header of the operation.
    pub fn instr(&self) -> Instr {
        let mut instr = Instr::new(self.opcode);
        for (mode, operand) in instr.modes.iter_mut().zip(self.operands()) {
            *mode = operand.mode;
        }
        instr
    }

    /// Operands taken by the opcode.
    #[inline]
    pub fn operands(&self) -> &[Operand] { &self.operands[..self.opcode.arity()] }

    /// Operand with the given index.
    ///
    /// # Panics
    ///
    /// If `idx` is not less than [`MAX_ARITY`].
    #[inline]
    pub fn operand(&self, idx: usize) -> Operand { self.operands[idx] }

    /// Operands the instruction reads from, i.e. all operands except the destination.
    pub fn sources(&self) -> impl Iterator<Item = Operand> + '_ {
        let dst = self.opcode.write_operand();
        self.operands()
            .iter()
            .enumerate()
            .filter(move |(idx, _)| Some(*idx) != dst)
            .map(|(_, operand)| *operand)
    }

    /// Destination operand, if the instruction writes to memory.
    pub fn destination(&self) -> Option<Operand> {
        self.opcode.write_operand().map(|idx| self.operands[idx])
    }

    /// Number of words taken by the instruction.
    #[inline]
    pub fn size(&self) -> usize { self.opcode.size() }

    /// Appends the instruction word followed by the operand words to `code`.
    pub fn encode_into(&self, code: &mut Vec<Word>) {
        code.push(self.instr().encode());
        code.extend(self.operands().iter().map(|operand| operand.raw));
    }
}

impl Display for Op {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.opcode.arity() == 0 {
            return write!(f, "{}", self.opcode);
        }
        write!(f, "{:<4}", self.opcode)?;
        let mut sep = "";
        for operand in self.sources() {
            write!(f, "{sep}{operand}")?;
            sep = ", ";
        }
        if let Some(dst) = self.destination() {
            write!(f, "{}-> {dst}", if sep.is_empty() { "" } else { " " })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use alloc::string::ToString;
    use alloc::vec;

    use super::*;

    #[test]
    fn opcode_codes() {
        for opcode in Opcode::ALL {
            assert_eq!(Opcode::from_code(opcode.code()), Some(opcode));
        }
        assert_eq!(Opcode::from_code(0), None);
        assert_eq!(Opcode::from_code(10), None);
        assert_eq!(Opcode::Halt.code(), 99);
        assert_eq!(Opcode::Add.size(), 4);
        assert_eq!(Opcode::JmpIfFalse.size(), 3);
        assert_eq!(Opcode::AdjustBase.size(), 2);
        assert_eq!(Opcode::Halt.size(), 1);
    }

    #[test]
    fn op_arity() {
        assert_eq!(
            Op::new(Opcode::Add, &[Operand::pos(1)]),
            Err(AsmError::Arity(Opcode::Add, 3, 1))
        );
        assert_eq!(
            Op::new(Opcode::Input, &[Operand::imm(1)]),
            Err(AsmError::ImmediateWrite(Opcode::Input))
        );
        assert_eq!(
            AsmError::Arity(Opcode::Add, 3, 1).to_string(),
            "`add` takes 3 operands, but 1 were given"
        );
    }

    #[test]
    fn display() {
        let operands = [Operand::pos(9), Operand::imm(3), Operand::rel(2)];
        let op = Op::new(Opcode::Add, &operands).unwrap();
        assert_eq!(op.to_string(), "add [9], 3 -> [rb+2]");
        let op = Op::new(Opcode::Input, &[Operand::rel(-1)]).unwrap();
        assert_eq!(op.to_string(), "in  -> [rb-1]");
        let op = Op::new(Opcode::JmpIfTrue, &[Operand::imm(1), Operand::pos(0)]).unwrap();
        assert_eq!(op.to_string(), "jnz 1, [0]");
        assert_eq!(Op::new(Opcode::Halt, &[]).unwrap().to_string(), "hlt");
    }

    #[test]
    fn encode() {
        let operands = [Operand::pos(4), Operand::imm(3), Operand::pos(4)];
        let op = Op::new(Opcode::Mul, &operands).unwrap();
        let mut code = vec![];
        op.encode_into(&mut code);
        assert_eq!(code, vec![1002, 4, 3, 4]);
        assert_eq!(op.instr().modes(), &[Mode::Position, Mode::Immediate, Mode::Position]);
    }
}
