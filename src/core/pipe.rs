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

use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt::{self, Debug, Formatter};

use super::Word;

/// Errors reading from an empty [`Pipe`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display)]
#[cfg_attr(feature = "std", derive(Error))]
#[display(doc_comments)]
pub enum PipeError {
    /// the pipe is empty; more values may be written later
    NoInput,

    /// the pipe is empty and closed
    EndOfStream,
}

#[derive(Default)]
struct Channel {
    queue: VecDeque<Word>,
    closed: bool,
}

/// Unbounded FIFO of words connecting machines.
///
/// Cloning a pipe produces one more handle to the same queue, which is how machines share their
/// I/O endpoints; use [`Pipe::fork`] to get an independent copy instead. Pipes compare by
/// identity: two handles are equal only if they refer to the same queue.
///
/// Pipes are not thread-safe. Machines sharing a pipe are driven cooperatively, so at any moment
/// at most one of them accesses it.
#[derive(Clone, Default)]
pub struct Pipe(Rc<RefCell<Channel>>);

impl Pipe {
    /// Constructs a new empty pipe.
    #[inline]
    pub fn new() -> Self { default!() }

    /// Constructs a new pipe holding `values` in the given order.
    pub fn with(values: impl IntoIterator<Item = Word>) -> Self {
        let pipe = Pipe::new();
        pipe.extend(values);
        pipe
    }

    /// Appends a value to the back of the queue. Writing never blocks and never fails, also for
    /// closed pipes.
    pub fn write(&self, value: Word) { self.0.borrow_mut().queue.push_back(value); }

    /// Appends all `values` in order.
    pub fn extend(&self, values: impl IntoIterator<Item = Word>) {
        self.0.borrow_mut().queue.extend(values);
    }

    /// Removes and returns the oldest value.
    ///
    /// # Errors
    ///
    /// [`PipeError::NoInput`] if the pipe is empty, or [`PipeError::EndOfStream`] if it is empty
    /// and closed.
    pub fn read(&self) -> Result<Word, PipeError> {
        let mut channel = self.0.borrow_mut();
        match channel.queue.pop_front() {
            Some(value) => Ok(value),
            None if channel.closed => Err(PipeError::EndOfStream),
            None => Err(PipeError::NoInput),
        }
    }

    /// Returns the oldest value without removing it.
    pub fn peek(&self) -> Option<Word> { self.0.borrow().queue.front().copied() }

    /// Removes and returns all queued values.
    pub fn dump(&self) -> Vec<Word> { self.0.borrow_mut().queue.drain(..).collect() }

    /// Copies all queued values, leaving the queue intact.
    pub fn contents(&self) -> Vec<Word> { self.0.borrow().queue.iter().copied().collect() }

    /// Marks the end of the stream. Values queued before closing remain readable.
    pub fn close(&self) { self.0.borrow_mut().closed = true; }

    /// Whether [`Pipe::close`] was called on any handle of this pipe.
    pub fn is_closed(&self) -> bool { self.0.borrow().closed }

    /// Number of queued values.
    pub fn len(&self) -> usize { self.0.borrow().queue.len() }

    /// Whether there are no queued values.
    pub fn is_empty(&self) -> bool { self.0.borrow().queue.is_empty() }

    /// Whether both handles refer to the same pipe.
    #[inline]
    pub fn is_same(&self, other: &Pipe) -> bool { Rc::ptr_eq(&self.0, &other.0) }

    /// Creates an independent pipe with a copy of the queued values and of the closed flag.
    pub fn fork(&self) -> Pipe {
        let channel = self.0.borrow();
        Pipe(Rc::new(RefCell::new(Channel {
            queue: channel.queue.clone(),
            closed: channel.closed,
        })))
    }

    /// Puts `values` in front of the queued ones, keeping their order.
    pub(crate) fn prepend(&self, values: Vec<Word>) {
        let mut channel = self.0.borrow_mut();
        for value in values.into_iter().rev() {
            channel.queue.push_front(value);
        }
    }
}

impl PartialEq for Pipe {
    #[inline]
    fn eq(&self, other: &Self) -> bool { self.is_same(other) }
}

impl Eq for Pipe {}

impl Debug for Pipe {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let channel = self.0.borrow();
        f.debug_struct("Pipe")
            .field("queue", &channel.queue)
            .field("closed", &channel.closed)
            .finish()
    }
}

impl FromIterator<Word> for Pipe {
    fn from_iter<T: IntoIterator<Item = Word>>(iter: T) -> Self { Pipe::with(iter) }
}

impl From<Vec<Word>> for Pipe {
    fn from(values: Vec<Word>) -> Self { Pipe::with(values) }
}

#[cfg(test)]
mod test {
    use alloc::vec;

    use super::*;

    #[test]
    fn fifo() {
        let pipe = Pipe::with([1, 2]);
        pipe.write(3);
        assert_eq!(pipe.peek(), Some(1));
        assert_eq!(pipe.read(), Ok(1));
        assert_eq!(pipe.read(), Ok(2));
        assert_eq!(pipe.read(), Ok(3));
        assert_eq!(pipe.read(), Err(PipeError::NoInput));
        assert_eq!(pipe.peek(), None);
    }

    #[test]
    fn end_of_stream() {
        let pipe = Pipe::with([5]);
        pipe.close();
        assert!(pipe.is_closed());
        assert_eq!(pipe.read(), Ok(5));
        assert_eq!(pipe.read(), Err(PipeError::EndOfStream));
        pipe.write(6);
        assert_eq!(pipe.read(), Ok(6));
    }

    #[test]
    fn dump_drains() {
        let pipe = Pipe::with([1, 2, 3]);
        assert_eq!(pipe.contents(), vec![1, 2, 3]);
        assert_eq!(pipe.len(), 3);
        assert_eq!(pipe.dump(), vec![1, 2, 3]);
        assert!(pipe.is_empty());
        assert_eq!(pipe.dump(), Vec::<Word>::new());
    }

    #[test]
    fn identity() {
        let pipe = Pipe::new();
        let handle = pipe.clone();
        let other = Pipe::new();
        assert_eq!(pipe, handle);
        assert_ne!(pipe, other);

        handle.write(9);
        assert_eq!(pipe.read(), Ok(9));
        handle.close();
        assert!(pipe.is_closed());
    }

    #[test]
    fn fork_is_independent() {
        let pipe = Pipe::with([1, 2]);
        let fork = pipe.fork();
        assert_ne!(pipe, fork);
        fork.write(3);
        assert_eq!(pipe.read(), Ok(1));
        assert_eq!(fork.contents(), vec![1, 2, 3]);
        assert_eq!(pipe.contents(), vec![2]);
    }

    #[test]
    fn prepend_keeps_order() {
        let pipe = Pipe::with([3, 4]);
        pipe.prepend(vec![1, 2]);
        assert_eq!(pipe.dump(), vec![1, 2, 3, 4]);
    }
}
