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

//! Intcode register machine.
//!
//! The crate provides an interpreter for the Intcode instruction set together with the I/O
//! plumbing needed to run several machines cooperatively: every machine reads from an input
//! [`Pipe`] and writes to an output [`Pipe`], and pipes may be shared between machines to build
//! chains and rings of interpreters driven by a single-threaded round-robin [`Circuit`].
//!
//! ```
//! use intcode::{IntCode, Pipe};
//!
//! // Reads a number and outputs 1 if it equals 8, or 0 otherwise.
//! let code = [3, 9, 8, 9, 10, 9, 4, 9, 99, -1, 8];
//! let mut vm = IntCode::new(&code).with_input(Pipe::with([8]));
//! assert_eq!(vm.run().unwrap(), vec![1]);
//! assert!(vm.is_halted());
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

#[macro_use]
extern crate amplify;
#[cfg(feature = "serde")]
#[macro_use]
extern crate serde_crate as serde;

mod compose;
pub mod core;
pub mod isa;
mod program;
mod vm;

pub use self::compose::{chain, Circuit, CircuitError, Topology};
pub use self::core::{Access, Core, CoreConfig, Fault, Memory, Pipe, PipeError, Word};
pub use self::program::{Line, ParseError, Program, ProgramId};
pub use self::vm::{IntCode, Status, Step, VmError};
