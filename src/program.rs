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

//! Intcode programs: textual form, identity and (dis)assembly.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt::{self, Display, Formatter};
use core::str::FromStr;

use amplify::Bytes32;
use sha2::{Digest, Sha256};

use crate::core::Word;
use crate::isa::{decode, Op, MAX_ARITY};

const PROGRAM_ID_TAG: &[u8] = b"urn:intcode:program#2019";

/// Errors parsing a program from its textual form.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Display)]
#[cfg_attr(feature = "std", derive(Error))]
#[display(doc_comments)]
pub enum ParseError {
    /// program text contains no words
    Empty,

    /// word #{pos} `{token}` is not a valid integer
    Word { pos: usize, token: String },
}

/// Unique program identifier: SHA-256 hash of the program words.
#[derive(Wrapper, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Default, Debug, From)]
#[wrapper(Deref)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct ProgramId(
    #[from]
    #[from([u8; 32])]
    Bytes32,
);

impl ProgramId {
    /// Computes the identifier of the program words.
    pub fn commit(code: &[Word]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(PROGRAM_ID_TAG);
        for word in code {
            hasher.update(word.to_le_bytes());
        }
        let hash: [u8; 32] = hasher.finalize().into();
        ProgramId::from(hash)
    }

    /// First four bytes of the identifier in hex, used to name anonymous machines.
    pub fn short(&self) -> String {
        let mut short = self.to_string();
        short.truncate(8);
        short
    }
}

impl Display for ProgramId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let bytes: &[u8] = self.0.as_ref();
        for byte in bytes {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Line of a disassembled program.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display)]
pub enum Line {
    /// Instruction
    #[display(inner)]
    Op(Op),

    /// Word which doesn't decode into an instruction: data, or a truncated instruction at the
    /// end of the program
    #[display("dat  {0}")]
    Data(Word),
}

/// Intcode program: a finite sequence of words loaded at address zero.
#[derive(Wrapper, WrapperMut, Clone, Eq, PartialEq, Hash, Default, Debug, From)]
#[wrapper(Deref)]
#[wrapper_mut(DerefMut)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct Program(#[from] Vec<Word>);

impl Program {
    /// Constructs a program from its words.
    #[inline]
    pub fn new(code: impl Into<Vec<Word>>) -> Self { Program(code.into()) }

    /// Encodes instructions one after another into a program.
    pub fn assemble<'op>(ops: impl IntoIterator<Item = &'op Op>) -> Self {
        let mut code = Vec::new();
        for op in ops {
            op.encode_into(&mut code);
        }
        Program(code)
    }

    /// Program identifier.
    #[inline]
    pub fn id(&self) -> ProgramId { ProgramId::commit(&self.0) }

    /// Linearly sweeps the program into instructions, starting from address zero.
    ///
    /// Since Intcode doesn't separate code from data, words following the last reachable
    /// instruction are decoded as instructions whenever possible; everything else is reported
    /// as [`Line::Data`].
    pub fn disassemble(&self) -> Vec<(usize, Line)> {
        let mut lines = Vec::new();
        let mut pos = 0usize;
        while pos < self.0.len() {
            let word = self.0[pos];
            match decode(word) {
                Ok(instr) if pos + instr.opcode.size() <= self.0.len() => {
                    let mut args = [0; MAX_ARITY];
                    let len = instr.opcode.arity();
                    args[..len].copy_from_slice(&self.0[pos + 1..pos + 1 + len]);
                    lines.push((pos, Line::Op(Op::with(instr, args))));
                    pos += instr.opcode.size();
                }
                _ => {
                    lines.push((pos, Line::Data(word)));
                    pos += 1;
                }
            }
        }
        lines
    }

    /// Disassembles the program and prints it to the writer, one instruction per line.
    #[cfg(feature = "std")]
    pub fn print_disassemble(
        &self,
        mut writer: impl std::io::Write,
    ) -> Result<(), std::io::Error> {
        for (pos, line) in self.disassemble() {
            writeln!(writer, "@{pos:06}: {line}")?;
        }
        Ok(())
    }
}

impl AsRef<[Word]> for Program {
    #[inline]
    fn as_ref(&self) -> &[Word] { &self.0 }
}

impl FromIterator<Word> for Program {
    fn from_iter<T: IntoIterator<Item = Word>>(iter: T) -> Self {
        Program(iter.into_iter().collect())
    }
}

impl FromStr for Program {
    type Err = ParseError;

    /// Parses comma-separated decimal words. Whitespace around words and a trailing newline are
    /// ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseError::Empty);
        }
        s.split(',')
            .enumerate()
            .map(|(pos, token)| {
                let token = token.trim();
                token.parse().map_err(|_| ParseError::Word { pos, token: token.to_string() })
            })
            .collect()
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        for word in &self.0 {
            write!(f, "{sep}{word}")?;
            sep = ",";
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use alloc::vec;

    use super::*;
    use crate::isa::{Opcode, Operand};

    #[test]
    fn parse() {
        let program = Program::from_str("1,9,10,3,\n2,3,11,0,99,30,40,50\n").unwrap();
        assert_eq!(AsRef::<[Word]>::as_ref(&program), &[1, 9, 10, 3, 2, 3, 11, 0, 99, 30, 40, 50]);
        assert_eq!(program.to_string(), "1,9,10,3,2,3,11,0,99,30,40,50");
        assert_eq!(Program::from_str("104,1125899906842624,99").unwrap()[1], 1125899906842624);
    }

    #[test]
    fn parse_errors() {
        assert_eq!(Program::from_str(" \n"), Err(ParseError::Empty));
        assert_eq!(
            Program::from_str("1,x,3"),
            Err(ParseError::Word { pos: 1, token: s!("x") })
        );
        assert_eq!(
            Program::from_str("1,,3").unwrap_err().to_string(),
            "word #1 `` is not a valid integer"
        );
    }

    #[test]
    fn id() {
        let a = Program::from(vec![1, 0, 0, 0, 99]);
        let b = Program::from(vec![1, 0, 0, 0, 99, 0]);
        assert_eq!(a.id(), a.clone().id());
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id().to_string().len(), 64);
        assert_eq!(a.id().short().len(), 8);
        assert!(a.id().to_string().starts_with(&a.id().short()));
    }

    #[test]
    fn assemble() {
        let ops = [
            Op::new(Opcode::Input, &[Operand::pos(9)]).unwrap(),
            Op::new(Opcode::Mul, &[Operand::pos(9), Operand::imm(3), Operand::rel(1)]).unwrap(),
            Op::new(Opcode::Output, &[Operand::rel(1)]).unwrap(),
            Op::new(Opcode::Halt, &[]).unwrap(),
        ];
        let program = Program::assemble(&ops);
        assert_eq!(AsRef::<[Word]>::as_ref(&program), &[3, 9, 21002, 9, 3, 1, 204, 1, 99]);

        let lines = program.disassemble();
        let expected = vec![
            (0, Line::Op(ops[0])),
            (2, Line::Op(ops[1])),
            (6, Line::Op(ops[2])),
            (8, Line::Op(ops[3])),
        ];
        assert_eq!(lines, expected);
    }

    #[test]
    fn disassemble_data() {
        let program = Program::from(vec![1002, 4, 3, 4, 33, 1101, 1]);
        let lines = program.disassemble();
        assert_eq!(lines[1], (4, Line::Data(33)));
        assert_eq!(lines[2], (5, Line::Data(1101)));
        assert_eq!(lines[3], (6, Line::Data(1)));
        assert_eq!(lines[0].1.to_string(), "mul [4], 3 -> [4]");
        assert_eq!(lines[1].1.to_string(), "dat  33");
    }

    #[test]
    #[cfg(feature = "std")]
    fn print() {
        let program = Program::from(vec![3, 0, 4, 0, 99]);
        let mut out = Vec::new();
        program.print_disassemble(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "@000000: in  -> [0]\n@000002: out [0]\n@000004: hlt\n"
        );
    }
}
