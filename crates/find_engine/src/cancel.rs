//! Cooperative cancellation and input pumping
//!
//! Long loops call [`Pacer::tick`] once per step. Every `interval` steps
//! the pacer runs the host's [`InputPump`], which may process a stop
//! request, and then polls the [`CancellationGate`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared abort flag, set by the host and polled by the engine
#[derive(Debug, Clone, Default)]
pub struct CancellationGate {
    abort_requested: Arc<AtomicBool>,
}

impl CancellationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the running operation to stop at its next poll
    pub fn request_abort(&self) {
        self.abort_requested.store(true, Ordering::SeqCst);
    }

    pub fn is_abort_requested(&self) -> bool {
        self.abort_requested.load(Ordering::SeqCst)
    }

    /// Clear a previous request so the gate can be reused
    pub fn reset(&self) {
        self.abort_requested.store(false, Ordering::SeqCst);
    }
}

/// Host hook that processes queued interaction events
pub trait InputPump {
    fn flush_pending_input(&self);
}

impl<F: Fn()> InputPump for F {
    fn flush_pending_input(&self) {
        self()
    }
}

/// Step counter that pumps input and polls the gate at a fixed interval
#[derive(Clone, Copy)]
pub struct Pacer<'a> {
    gate: Option<&'a CancellationGate>,
    pump: Option<&'a dyn InputPump>,
    interval: usize,
    steps: usize,
    aborted: bool,
}

impl<'a> Pacer<'a> {
    pub fn new(gate: Option<&'a CancellationGate>, pump: Option<&'a dyn InputPump>, interval: usize) -> Self {
        Self {
            gate,
            pump,
            interval: interval.max(1),
            steps: 0,
            aborted: false,
        }
    }

    /// A pacer that never pumps and never aborts
    pub fn idle() -> Self {
        Self::new(None, None, usize::MAX)
    }

    /// Count one step; returns `false` once an abort has been observed
    pub fn tick(&mut self) -> bool {
        if self.aborted {
            return false;
        }
        self.steps += 1;
        if self.steps % self.interval == 0 {
            self.pump_now();
        }
        !self.aborted
    }

    /// Pump input and poll the gate immediately
    pub fn pump_now(&mut self) -> bool {
        if let Some(pump) = self.pump {
            pump.flush_pending_input();
        }
        self.poll()
    }

    /// Poll the gate without pumping
    pub fn poll(&mut self) -> bool {
        if self.gate.is_some_and(CancellationGate::is_abort_requested) {
            self.aborted = true;
        }
        !self.aborted
    }

    pub fn was_aborted(&self) -> bool {
        self.aborted
    }

    pub fn steps(&self) -> usize {
        self.steps
    }
}

impl std::fmt::Debug for Pacer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pacer")
            .field("interval", &self.interval)
            .field("steps", &self.steps)
            .field("aborted", &self.aborted)
            .finish()
    }
}
