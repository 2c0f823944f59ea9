//! # Streaming Protocol
//!
//! Evaluation is pull-based over bounded crossbeam channels. A consumer
//! hands a node the send side of a tuple channel; the node spawns its
//! workers, returns a [`CancelHandle`] immediately, and the channel
//! disconnects exactly once when the last worker drops its sender clone.
//!
//! ## Cancellation
//!
//! Cancellation is cooperative. A handle/token pair shares an atomic flag
//! and a capacity-1 wake channel: `cancel` raises the flag, pushes a wake
//! token, and cascades into the child handles captured at stream time.
//! Every worker suspension point — waiting for an input tuple, waiting
//! for space in the output sink — selects on the wake channel, and a
//! woken worker re-broadcasts the token before exiting so all of its
//! siblings wake too. A consumer that simply drops the receive side makes
//! sends fail, which also exits the workers; neither path can deadlock.
//!
//! Cancelling is idempotent, and cancelling after the sink has closed is
//! a no-op.

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::trace;

use crate::tuple::Tuple;

/// Send side of a tuple stream
pub type TupleSink = Sender<Tuple>;

/// Receive side of a tuple stream
pub type TupleSource = Receiver<Tuple>;

struct CancelShared {
    cancelled: AtomicBool,
    wake_tx: Sender<()>,
    wake_rx: Receiver<()>,
    children: Mutex<Vec<CancelHandle>>,
}

/// Handle returned by `Relation::stream`; triggering it stops production.
#[derive(Clone)]
pub struct CancelHandle {
    shared: Arc<CancelShared>,
}

/// Worker-side view of a cancellation: checked at every suspension point.
#[derive(Clone)]
pub struct CancelToken {
    shared: Arc<CancelShared>,
}

/// Create a linked handle/token pair for one stream invocation.
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (wake_tx, wake_rx) = bounded(1);
    let shared = Arc::new(CancelShared {
        cancelled: AtomicBool::new(false),
        wake_tx,
        wake_rx,
        children: Mutex::new(Vec::new()),
    });
    (
        CancelHandle {
            shared: Arc::clone(&shared),
        },
        CancelToken { shared },
    )
}

impl CancelHandle {
    /// A handle tied to nothing: returned by error-latched nodes whose
    /// stream closes immediately.
    pub fn inert() -> CancelHandle {
        cancel_pair().0
    }

    /// Stop production: wake every worker of this node and cascade into
    /// all captured child streams. Idempotent.
    pub fn cancel(&self) {
        if self.shared.cancelled.swap(true, Ordering::Relaxed) {
            return;
        }
        trace!("cancellation triggered");
        let _ = self.shared.wake_tx.try_send(());
        let children = self.shared.children.lock();
        for child in children.iter() {
            child.cancel();
        }
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::Relaxed)
    }

    /// Capture a child stream's handle so cancellation cascades.
    ///
    /// If this handle was already cancelled the child is cancelled on the
    /// spot; streams that start child streams from a worker thread would
    /// otherwise race the cascade.
    pub(crate) fn adopt(&self, child: CancelHandle) {
        self.shared.children.lock().push(child.clone());
        if self.is_cancelled() {
            child.cancel();
        }
    }
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::Relaxed)
    }

    /// The wake channel for use in `select!` arms.
    pub(crate) fn wake_chan(&self) -> &Receiver<()> {
        &self.shared.wake_rx
    }

    /// Put the wake token back for sibling workers, then return.
    pub(crate) fn rebroadcast(&self) {
        let _ = self.shared.wake_tx.try_send(());
    }
}

/// Send one tuple, suspending on sink backpressure.
///
/// Returns `false` when the worker should exit: cancellation was
/// observed, or the consumer dropped the receive side.
pub(crate) fn emit(sink: &TupleSink, cancel: &CancelToken, tuple: Tuple) -> bool {
    if cancel.is_cancelled() {
        cancel.rebroadcast();
        return false;
    }
    crossbeam_channel::select! {
        send(sink, tuple) -> res => res.is_ok(),
        recv(cancel.wake_chan()) -> _ => {
            cancel.rebroadcast();
            false
        }
    }
}

/// Receive one tuple, suspending until input arrives.
///
/// Returns `None` at end of input or on cancellation.
pub(crate) fn next(input: &TupleSource, cancel: &CancelToken) -> Option<Tuple> {
    if cancel.is_cancelled() {
        cancel.rebroadcast();
        return None;
    }
    crossbeam_channel::select! {
        recv(input) -> msg => msg.ok(),
        recv(cancel.wake_chan()) -> _ => {
            cancel.rebroadcast();
            None
        }
    }
}

/// A tuple drawn from one of a binary operator's two inputs
pub(crate) enum SideTuple {
    Left(Tuple),
    Right(Tuple),
}

/// Competitive consumer over both inputs of a binary operator.
///
/// Each worker owns a clone; crossbeam receivers share the underlying
/// queue, so N workers drain both children cooperatively.
pub(crate) struct EitherInput {
    left: Option<TupleSource>,
    right: Option<TupleSource>,
}

impl Clone for EitherInput {
    fn clone(&self) -> Self {
        EitherInput {
            left: self.left.clone(),
            right: self.right.clone(),
        }
    }
}

impl EitherInput {
    pub(crate) fn new(left: TupleSource, right: TupleSource) -> Self {
        EitherInput {
            left: Some(left),
            right: Some(right),
        }
    }

    /// Next tuple from whichever side is ready; `None` once both sides
    /// are exhausted or cancellation fires.
    pub(crate) fn next(&mut self, cancel: &CancelToken) -> Option<SideTuple> {
        loop {
            if cancel.is_cancelled() {
                cancel.rebroadcast();
                return None;
            }
            // Receiver clones share the queue; owned locals keep the
            // select arms free to retire an exhausted side.
            match (self.left.clone(), self.right.clone()) {
                (Some(l), Some(r)) => {
                    crossbeam_channel::select! {
                        recv(l) -> msg => match msg {
                            Ok(t) => return Some(SideTuple::Left(t)),
                            Err(_) => self.left = None,
                        },
                        recv(r) -> msg => match msg {
                            Ok(t) => return Some(SideTuple::Right(t)),
                            Err(_) => self.right = None,
                        },
                        recv(cancel.wake_chan()) -> _ => {
                            cancel.rebroadcast();
                            return None;
                        }
                    }
                }
                (Some(l), None) => {
                    crossbeam_channel::select! {
                        recv(l) -> msg => match msg {
                            Ok(t) => return Some(SideTuple::Left(t)),
                            Err(_) => self.left = None,
                        },
                        recv(cancel.wake_chan()) -> _ => {
                            cancel.rebroadcast();
                            return None;
                        }
                    }
                }
                (None, Some(r)) => {
                    crossbeam_channel::select! {
                        recv(r) -> msg => match msg {
                            Ok(t) => return Some(SideTuple::Right(t)),
                            Err(_) => self.right = None,
                        },
                        recv(cancel.wake_chan()) -> _ => {
                            cancel.rebroadcast();
                            return None;
                        }
                    }
                }
                (None, None) => return None,
            }
        }
    }
}
