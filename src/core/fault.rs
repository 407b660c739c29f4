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

use super::Word;

/// Memory access which caused a segmentation fault.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display)]
#[display(doc_comments)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
pub enum Access {
    /// read at negative address {0}
    Read(Word),

    /// write at negative address {0}
    Write(Word),

    /// jump to negative address {0}
    Jump(Word),

    /// write through an immediate operand
    Immediate,
}

/// Fatal machine faults. A faulted machine never executes again.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display, From)]
#[cfg_attr(feature = "std", derive(Error))]
#[display(doc_comments)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
pub enum Fault {
    /// unknown opcode {0}
    BadOpcode(Word),

    /// instruction {0} uses an unknown addressing mode
    BadMode(Word),

    /// segmentation fault: {0}
    #[from]
    SegFault(Access),

    /// arithmetic overflow
    Overflow,
}
