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

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use super::{Access, Fault, Word, DENSE_LIM_DEFAULT};

/// Zero-extended word store without a fixed upper bound.
///
/// Cells below the dense limit are kept in a contiguous buffer, which grows with zero fill when
/// written past its end; cells at or above the limit are kept in a sparse map. Cells which were
/// never written read as zero. Negative addresses are invalid for both reads and writes.
///
/// Two memories are equal when every address reads the same value from both of them,
/// independently of how the cells are stored.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(crate = "serde_crate"))]
pub struct Memory {
    dense: Vec<Word>,
    sparse: BTreeMap<u64, Word>,
    dense_lim: usize,
}

impl Default for Memory {
    fn default() -> Self { Memory::with_limit(DENSE_LIM_DEFAULT) }
}

impl Memory {
    /// Constructs empty memory using [`DENSE_LIM_DEFAULT`].
    #[inline]
    pub fn new() -> Self { default!() }

    /// Constructs empty memory keeping addresses below `dense_lim` in the contiguous buffer.
    pub fn with_limit(dense_lim: usize) -> Self {
        Memory { dense: Vec::new(), sparse: BTreeMap::new(), dense_lim }
    }

    /// Constructs memory seeded with the program at address zero.
    ///
    /// The program is always stored densely, even if it is longer than `dense_lim`.
    pub fn load(program: &[Word], dense_lim: usize) -> Self {
        Memory {
            dense: program.to_vec(),
            sparse: BTreeMap::new(),
            dense_lim: dense_lim.max(program.len()),
        }
    }

    /// Reads the word at `addr`, returning zero for cells which were never written.
    ///
    /// # Errors
    ///
    /// [`Fault::SegFault`] if `addr` is negative.
    pub fn read(&self, addr: Word) -> Result<Word, Fault> {
        let idx = u64::try_from(addr).map_err(|_| Access::Read(addr))?;
        let value = match usize::try_from(idx) {
            Ok(idx) if idx < self.dense_lim => self.dense.get(idx).copied(),
            _ => self.sparse.get(&idx).copied(),
        };
        Ok(value.unwrap_or_default())
    }

    /// Writes `value` into the cell at `addr`.
    ///
    /// # Errors
    ///
    /// [`Fault::SegFault`] if `addr` is negative.
    pub fn write(&mut self, addr: Word, value: Word) -> Result<(), Fault> {
        let idx = u64::try_from(addr).map_err(|_| Access::Write(addr))?;
        match usize::try_from(idx) {
            Ok(idx) if idx < self.dense_lim => {
                if idx >= self.dense.len() {
                    self.dense.resize(idx + 1, 0);
                }
                self.dense[idx] = value;
            }
            _ => {
                self.sparse.insert(idx, value);
            }
        }
        Ok(())
    }

    /// Number of cells covered by [`Memory::snapshot`]: one past the highest written address, or
    /// the length of the loaded program, whichever is greater.
    pub fn extent(&self) -> u64 {
        match self.sparse.last_key_value() {
            Some((last, _)) => last + 1,
            None => self.dense.len() as u64,
        }
    }

    /// Dense copy of the memory up to [`Memory::extent`], with unwritten cells set to zero.
    ///
    /// Cells stored sparsely are expanded as well, so the snapshot of a memory written at very
    /// high addresses is correspondingly large. Use [`Memory::prefix`] to bound the copy.
    ///
    /// # Panics
    ///
    /// If the extent doesn't fit into the address space of the target, or the copy can't be
    /// allocated.
    pub fn snapshot(&self) -> Vec<Word> {
        let len = usize::try_from(self.extent()).expect("memory extent exceeds address space");
        self.prefix(len)
    }

    /// Dense copy of the first `len` cells, with unwritten cells set to zero.
    pub fn prefix(&self, len: usize) -> Vec<Word> {
        let mut prefix = self.dense[..len.min(self.dense.len())].to_vec();
        prefix.resize(len, 0);
        for (&idx, &value) in self.sparse.range(..len as u64) {
            prefix[idx as usize] = value;
        }
        prefix
    }

    /// Iterates over all stored cells in address order, including cells holding zero.
    pub fn cells(&self) -> impl Iterator<Item = (u64, Word)> + '_ {
        self.dense
            .iter()
            .enumerate()
            .map(|(idx, value)| (idx as u64, *value))
            .chain(self.sparse.iter().map(|(idx, value)| (*idx, *value)))
    }

    fn non_zero(&self) -> impl Iterator<Item = (u64, Word)> + '_ {
        self.cells().filter(|(_, value)| *value != 0)
    }
}

impl PartialEq for Memory {
    fn eq(&self, other: &Self) -> bool { self.non_zero().eq(other.non_zero()) }
}

impl Eq for Memory {}

impl From<Vec<Word>> for Memory {
    fn from(program: Vec<Word>) -> Self {
        Memory {
            dense_lim: DENSE_LIM_DEFAULT.max(program.len()),
            dense: program,
            sparse: BTreeMap::new(),
        }
    }
}
