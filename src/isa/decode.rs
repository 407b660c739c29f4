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

use super::opcodes::{MODE_RADIX, OPCODE_RADIX};
use super::{Instr, Mode, Opcode};
use crate::core::{Access, Fault, Word};

/// Decodes an instruction word.
///
/// The two lowest decimal digits select the opcode, the following digits select the addressing
/// mode of each operand, starting with the first one. Missing mode digits stand for
/// [`Mode::Position`]; digits past the opcode arity are ignored.
///
/// # Errors
///
/// - [`Fault::BadOpcode`] for negative words and unknown opcodes;
/// - [`Fault::BadMode`] if a mode digit of an operand is not a known mode;
/// - [`Fault::SegFault`] if the destination operand of the instruction is in immediate mode.
pub fn decode(word: Word) -> Result<Instr, Fault> {
    if word < 0 {
        return Err(Fault::BadOpcode(word));
    }
    let code = word % OPCODE_RADIX;
    let opcode = Opcode::from_code(code).ok_or(Fault::BadOpcode(code))?;

    let mut instr = Instr::new(opcode);
    let mut digits = word / OPCODE_RADIX;
    for mode in instr.modes.iter_mut().take(opcode.arity()) {
        *mode = Mode::from_digit(digits % MODE_RADIX).ok_or(Fault::BadMode(word))?;
        digits /= MODE_RADIX;
    }

    if let Some(dst) = opcode.write_operand() {
        if instr.modes[dst] == Mode::Immediate {
            return Err(Access::Immediate.into());
        }
    }
    Ok(instr)
}

impl Instr {
    /// Encodes the instruction into its canonical instruction word, with mode digits for the
    /// operands taken by the opcode only.
    pub fn encode(&self) -> Word {
        let mut scale = OPCODE_RADIX;
        let mut word = self.opcode.code();
        for mode in self.modes.iter().take(self.opcode.arity()) {
            word += mode.digit() * scale;
            scale *= MODE_RADIX;
        }
        word
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn modes() {
        let instr = decode(1002).unwrap();
        assert_eq!(instr.opcode, Opcode::Mul);
        assert_eq!(instr.modes(), &[Mode::Position, Mode::Immediate, Mode::Position]);

        let instr = decode(1107).unwrap();
        assert_eq!(instr.opcode, Opcode::LessThan);
        assert_eq!(instr.modes(), &[Mode::Immediate, Mode::Immediate, Mode::Position]);

        let instr = decode(21101).unwrap();
        assert_eq!(instr.opcode, Opcode::Add);
        assert_eq!(instr.modes(), &[Mode::Immediate, Mode::Immediate, Mode::Relative]);

        let instr = decode(204).unwrap();
        assert_eq!(instr.opcode, Opcode::Output);
        assert_eq!(instr.modes(), &[Mode::Relative]);
    }

    #[test]
    fn halt() {
        let instr = decode(99).unwrap();
        assert_eq!(instr.opcode, Opcode::Halt);
        assert!(instr.modes().is_empty());
    }

    #[test]
    fn extra_digits_ignored() {
        // mode digits past the arity of `out` are not inspected
        assert_eq!(decode(90104).unwrap().modes(), &[Mode::Immediate]);
        assert_eq!(decode(1199).unwrap().opcode, Opcode::Halt);
    }

    #[test]
    fn bad_opcode() {
        assert_eq!(decode(0), Err(Fault::BadOpcode(0)));
        assert_eq!(decode(77), Err(Fault::BadOpcode(77)));
        assert_eq!(decode(1010), Err(Fault::BadOpcode(10)));
        assert_eq!(decode(-1), Err(Fault::BadOpcode(-1)));
    }

    #[test]
    fn bad_mode() {
        assert_eq!(decode(301), Err(Fault::BadMode(301)));
        assert_eq!(decode(10301), Err(Fault::BadMode(10301)));
    }

    #[test]
    fn immediate_destination() {
        assert_eq!(decode(11101), Err(Fault::SegFault(Access::Immediate)));
        assert_eq!(decode(103), Err(Fault::SegFault(Access::Immediate)));
        assert_eq!(decode(1108).unwrap().opcode, Opcode::Equals);
    }

    #[test]
    fn encode_inverse() {
        for word in [1, 2, 1002, 1107, 21101, 204, 109, 3, 203, 1105, 99] {
            assert_eq!(decode(word).unwrap().encode(), word);
        }
        assert_eq!(decode(90104).unwrap().encode(), 104);
    }
}
