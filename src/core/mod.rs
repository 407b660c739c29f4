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

//! Machine state: words, memory, pipes and core registers

#[allow(clippy::module_inception)]
mod core;
mod fault;
mod memory;
mod pipe;

pub use self::core::{Core, CoreConfig, DENSE_LIM_DEFAULT};
pub use self::fault::{Access, Fault};
pub use self::memory::Memory;
pub use self::pipe::{Pipe, PipeError};

/// Machine word.
///
/// Memory cells, pipe values, addresses and the relative base are all words.
pub type Word = i64;
