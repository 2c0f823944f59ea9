//! ∪ — stream both sides in parallel, deduplicating globally.
//!
//! N workers select over both child channels; a mutex-guarded seen-set
//! decides novelty. The lock covers only the insert, never a send.

use crate::expr::{Node, Op, Relation};
use crate::stream::{cancel_pair, emit, CancelHandle, EitherInput, SideTuple, TupleSink};
use crate::tuple::Tuple;
use crossbeam_channel::bounded;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use tracing::debug;

pub(crate) fn stream(rel: &Relation, sink: TupleSink) -> CancelHandle {
    let node: Arc<Node> = Arc::clone(&rel.node);
    let (handle, token) = cancel_pair();

    let Op::Union { left, right } = &node.op else {
        unreachable!("union stream on a non-union node")
    };
    let (left, right) = (left.clone(), right.clone());

    let cap = node.config.capacity();
    let (ltx, lrx) = bounded(cap);
    let (rtx, rrx) = bounded(cap);
    handle.adopt(left.stream(ltx));
    handle.adopt(right.stream(rtx));

    let workers = node.config.worker_count();
    debug!(workers, "streaming union");

    let seen: Arc<Mutex<HashSet<Tuple>>> = Arc::new(Mutex::new(HashSet::new()));
    let input = EitherInput::new(lrx, rrx);

    let mut worker_handles = Vec::with_capacity(workers);
    for _ in 0..workers {
        let mut input = input.clone();
        let tx = sink.clone();
        let token = token.clone();
        let seen = Arc::clone(&seen);
        worker_handles.push(thread::spawn(move || {
            while let Some(st) = input.next(&token) {
                let t = match st {
                    SideTuple::Left(t) | SideTuple::Right(t) => t,
                };
                if !seen.lock().insert(t.clone()) {
                    continue;
                }
                if !emit(&tx, &token, t) {
                    break;
                }
            }
        }));
    }
    drop(input);

    thread::spawn(move || {
        for w in worker_handles {
            let _ = w.join();
        }
        node.latch_child(&left);
        node.latch_child(&right);
        drop(sink);
    });

    handle
}
