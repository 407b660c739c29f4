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

//! Composition of machines into chains and rings sharing pipes.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt::{self, Display, Formatter};

use crate::core::Pipe;
use crate::vm::{IntCode, Status, VmError};

/// Links machines so that the output pipe of each machine is the input pipe of the next one.
///
/// The input of the first machine and the output of the last one are left untouched, unless
/// `looped` is set, in which case the last machine writes into the input of the first one.
/// Values already queued in a replaced input pipe are moved in front of the shared pipe, so
/// phase settings may be written before or after linking. Linking is idempotent.
pub fn chain(vms: &mut [IntCode], looped: bool) {
    for to in 1..vms.len() {
        link(vms, to - 1, to);
    }
    if looped && !vms.is_empty() {
        link(vms, vms.len() - 1, 0);
    }
}

fn link(vms: &mut [IntCode], from: usize, to: usize) {
    let pipe = vms[from].output().clone();
    if pipe.is_same(vms[to].input()) {
        return;
    }
    let replaced = vms[to].set_input(pipe.clone());
    pipe.prepend(replaced.contents());
}

/// Shape of a circuit.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display)]
pub enum Topology {
    /// Linear chain: the circuit input feeds the first machine, the last machine feeds the
    /// circuit output.
    #[display("chain")]
    Chain,

    /// Closed loop: the last machine feeds the first one, and the same pipe serves as the
    /// circuit input and output.
    #[display("ring")]
    Ring,
}

/// Errors running a [`Circuit`].
#[derive(Clone, Eq, PartialEq, Debug, From)]
#[cfg_attr(feature = "std", derive(Error))]
pub enum CircuitError {
    /// A machine has faulted or exhausted its step budget.
    #[from]
    Vm(VmError),

    /// All machines which haven't halted wait for input which can never arrive. Lists the
    /// names of the waiting machines.
    Deadlock(Vec<String>),
}

impl Display for CircuitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CircuitError::Vm(err) => Display::fmt(err, f),
            CircuitError::Deadlock(names) => {
                write!(f, "deadlock: {} wait for input which will never arrive", names.join(", "))
            }
        }
    }
}

/// Set of machines linked into a chain or a ring and run by a round-robin scheduler.
#[derive(Debug)]
pub struct Circuit {
    vms: Vec<IntCode>,
    topology: Topology,
    input: Pipe,
    output: Pipe,
}

impl Circuit {
    /// Links machines into a linear chain.
    #[inline]
    pub fn chain(vms: impl IntoIterator<Item = IntCode>) -> Self {
        Circuit::with(vms, Topology::Chain)
    }

    /// Links machines into a ring.
    #[inline]
    pub fn ring(vms: impl IntoIterator<Item = IntCode>) -> Self {
        Circuit::with(vms, Topology::Ring)
    }

    /// Links machines using the given topology. An empty circuit passes its input straight to
    /// its output.
    pub fn with(vms: impl IntoIterator<Item = IntCode>, topology: Topology) -> Self {
        let mut vms = vms.into_iter().collect::<Vec<_>>();
        chain(&mut vms, topology == Topology::Ring);
        let (input, output) = match (vms.first(), vms.last()) {
            (Some(first), Some(last)) => (first.input().clone(), last.output().clone()),
            _ => {
                let pipe = Pipe::new();
                (pipe.clone(), pipe)
            }
        };
        Circuit { vms, topology, input, output }
    }

    #[inline]
    pub fn topology(&self) -> Topology { self.topology }

    /// Input pipe of the first machine.
    #[inline]
    pub fn input(&self) -> &Pipe { &self.input }

    /// Output pipe of the last machine. For rings this is the same pipe as [`Circuit::input`].
    #[inline]
    pub fn output(&self) -> &Pipe { &self.output }

    #[inline]
    pub fn len(&self) -> usize { self.vms.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.vms.is_empty() }

    #[inline]
    pub fn vms(&self) -> &[IntCode] { &self.vms }

    #[inline]
    pub fn vm(&self, idx: usize) -> Option<&IntCode> { self.vms.get(idx) }

    #[inline]
    pub fn into_vms(self) -> Vec<IntCode> { self.vms }

    /// Runs machines in a fixed round-robin order until all of them halt.
    ///
    /// A faulted machine stops the whole circuit for good: every call made after a fault, and
    /// every call on a circuit holding a machine faulted beforehand, fails with that fault
    /// without running any machine.
    ///
    /// Within a round, each machine which hasn't halted is run until it halts or suspends.
    /// When a whole round makes no progress, output pipes which are written only by halted
    /// machines are closed, letting the readers of these pipes halt on end of stream. The
    /// circuit input has no writer among the machines, so it must be closed by the caller if
    /// the first machine is expected to drain it.
    ///
    /// Returns the number of rounds performed.
    ///
    /// # Errors
    ///
    /// [`CircuitError::Vm`] as soon as any machine faults or exceeds its budget, and
    /// [`CircuitError::Deadlock`] if the machines can't make progress anymore.
    pub fn run(&mut self) -> Result<usize, CircuitError> {
        let mut rounds = 0usize;
        loop {
            if let Some(err) = self.fault() {
                return Err(err.into());
            }
            if self.vms.iter().all(IntCode::is_halted) {
                return Ok(rounds);
            }
            rounds += 1;
            #[cfg(feature = "log")]
            eprintln!("\x1B[0;35m{} round {rounds}\x1B[0m", self.topology);

            let mut progress = false;
            for vm in &mut self.vms {
                if vm.status().is_terminal() {
                    continue;
                }
                let before = (vm.steps(), vm.status());
                vm.run()?;
                progress |= (vm.steps(), vm.status()) != before;
            }

            if !progress && !self.close_drained() {
                let names = self
                    .vms
                    .iter()
                    .filter(|vm| vm.status() == Status::Suspended)
                    .map(|vm| vm.name().to_string())
                    .collect::<Vec<_>>();
                #[cfg(feature = "log")]
                eprintln!("\x1B[0;31mdeadlock\x1B[0m: {}", names.join(", "));
                return Err(CircuitError::Deadlock(names));
            }
        }
    }

    /// Fault of the first faulted machine, if any.
    fn fault(&self) -> Option<VmError> {
        self.vms.iter().find_map(|vm| match vm.status() {
            Status::Faulted(fault) => {
                Some(VmError::Fault { name: vm.name().to_string(), ip: vm.ip(), fault })
            }
            _ => None,
        })
    }

    /// Closes open pipes written only by machines which will never run again. Returns whether
    /// any pipe was closed.
    fn close_drained(&self) -> bool {
        let mut closed = false;
        for vm in self.vms.iter().filter(|vm| vm.status().is_terminal()) {
            let pipe = vm.output();
            let live_writer = self
                .vms
                .iter()
                .any(|other| !other.status().is_terminal() && other.output().is_same(pipe));
            if pipe.is_closed() || live_writer {
                continue;
            }
            #[cfg(feature = "log")]
            eprintln!("closing output of halted {}", vm.name());
            pipe.close();
            closed = true;
        }
        closed
    }
}

#[cfg(test)]
mod test {
    use alloc::vec;

    use super::*;
    use crate::core::Fault;

    // reads a value, outputs its double, repeats
    const DOUBLER: [i64; 11] = [3, 0, 1002, 0, 2, 0, 4, 0, 1105, 1, 0];

    fn doubler(name: &str) -> IntCode { IntCode::new(&DOUBLER).named(name) }

    #[test]
    fn chain_shares_pipes() {
        let mut vms = vec![doubler("a"), doubler("b"), doubler("c")];
        let input = vms[0].input().clone();
        chain(&mut vms, false);
        assert!(vms[0].output().is_same(vms[1].input()));
        assert!(vms[1].output().is_same(vms[2].input()));
        assert!(vms[0].input().is_same(&input));
        assert!(!vms[2].output().is_same(vms[0].input()));

        chain(&mut vms, true);
        assert!(vms[2].output().is_same(vms[0].input()));
        assert!(!vms[0].input().is_same(&input));
    }

    #[test]
    fn chain_keeps_pending_input() {
        let mut vms = vec![doubler("a"), doubler("b")];
        vms[1].input().write(5);
        vms[0].output().write(6);
        chain(&mut vms, false);
        assert_eq!(vms[1].input().contents(), vec![5, 6]);
        chain(&mut vms, false);
        assert_eq!(vms[1].input().contents(), vec![5, 6]);
    }

    #[test]
    fn chain_run() {
        let mut circuit = Circuit::chain([doubler("a"), doubler("b"), doubler("c")]);
        assert_eq!(circuit.topology(), Topology::Chain);
        circuit.input().extend([1, 5]);
        circuit.input().close();
        let rounds = circuit.run().unwrap();
        assert_eq!(circuit.output().dump(), vec![8, 40]);
        assert!(circuit.vms().iter().all(IntCode::is_halted));
        assert!(rounds >= 1);
    }

    #[test]
    fn empty() {
        let mut circuit = Circuit::ring(Vec::new());
        assert!(circuit.is_empty());
        assert!(circuit.input().is_same(circuit.output()));
        assert_eq!(circuit.run(), Ok(0));
    }

    #[test]
    fn waiting_for_open_input() {
        let mut circuit = Circuit::chain([doubler("a"), doubler("b")]);
        circuit.input().write(3);
        assert_eq!(
            circuit.run(),
            Err(CircuitError::Deadlock(vec![s!("a"), s!("b")]))
        );
        assert_eq!(circuit.output().dump(), vec![12]);
        assert_eq!(
            CircuitError::Deadlock(vec![s!("a"), s!("b")]).to_string(),
            "deadlock: a, b wait for input which will never arrive"
        );
    }

    #[test]
    fn fault_names_machine() {
        let bad = IntCode::new(&[3, 0, 4, 0, 77]).named("bad");
        let mut circuit = Circuit::chain([doubler("a"), bad]);
        circuit.input().write(1);
        let err = circuit.run().unwrap_err();
        assert_eq!(
            err,
            CircuitError::Vm(VmError::Fault { name: s!("bad"), ip: 4, fault: Fault::BadOpcode(77) })
        );
        assert_eq!(circuit.output().dump(), vec![2]);
    }

    #[test]
    fn faulted_before_run() {
        let mut bad = IntCode::new(&[77]).named("bad");
        bad.step();
        let mut circuit = Circuit::chain([bad, doubler("a")]);
        circuit.input().write(1);
        let fault = VmError::Fault { name: s!("bad"), ip: 0, fault: Fault::BadOpcode(77) };
        assert_eq!(circuit.run(), Err(CircuitError::Vm(fault)));
        assert_eq!(circuit.vm(1).map(IntCode::steps), Some(0));
        assert_eq!(circuit.vm(1).map(IntCode::status), Some(Status::Ready));
    }
}
