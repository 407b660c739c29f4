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

#![allow(missing_docs)]

use crate::core::Word;

// Arithmetic instructions
pub const OP_ADD: Word = 1;
pub const OP_MUL: Word = 2;

// I/O instructions
pub const OP_INPUT: Word = 3;
pub const OP_OUTPUT: Word = 4;

// Control-flow instructions
pub const OP_JNZ: Word = 5;
pub const OP_JZ: Word = 6;

// Comparison instructions
pub const OP_LT: Word = 7;
pub const OP_EQ: Word = 8;

// Relative base adjustment
pub const OP_ARB: Word = 9;

pub const OP_HALT: Word = 99;

// Addressing mode digits
pub const MODE_POSITION: Word = 0;
pub const MODE_IMMEDIATE: Word = 1;
pub const MODE_RELATIVE: Word = 2;

/// The two lowest decimal digits of an instruction word hold the opcode.
pub const OPCODE_RADIX: Word = 100;

/// Each further decimal digit holds the mode of one operand.
pub const MODE_RADIX: Word = 10;

/// Maximal number of operands taken by an instruction.
pub const MAX_ARITY: usize = 3;
