//! − — set difference, left minus right.
//!
//! The only operator whose first output waits on fully consuming an
//! input: phase one drains the right side into a seen-set, phase two
//! streams the left side through a membership filter. An orchestrator
//! thread runs the phases so `stream` still returns immediately.

use crate::expr::{Node, Op, Relation};
use crate::stream::{cancel_pair, emit, next, CancelHandle, TupleSink};
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

    let Op::Diff { left, right } = &node.op else {
        unreachable!("diff stream on a non-diff node")
    };
    let (left, right) = (left.clone(), right.clone());
    let orchestrator_handle = handle.clone();

    thread::spawn(move || {
        let cap = node.config.capacity();
        let workers = node.config.worker_count();
        debug!(workers, "streaming difference");

        // Phase 1: drain the right side completely.
        let seen: Arc<Mutex<HashSet<Tuple>>> = Arc::new(Mutex::new(HashSet::new()));
        let (rtx, rrx) = bounded(cap);
        orchestrator_handle.adopt(right.stream(rtx));

        let drainers: Vec<_> = (0..workers)
            .map(|_| {
                let rx = rrx.clone();
                let token = token.clone();
                let seen = Arc::clone(&seen);
                thread::spawn(move || {
                    while let Some(t) = next(&rx, &token) {
                        seen.lock().insert(t);
                    }
                })
            })
            .collect();
        drop(rrx);
        for d in drainers {
            let _ = d.join();
        }

        if right.err().is_some() {
            node.latch_child(&right);
            drop(sink);
            return;
        }
        if token.is_cancelled() {
            drop(sink);
            return;
        }

        // Phase 2: stream the left side, gated on membership.
        let (ltx, lrx) = bounded(cap);
        orchestrator_handle.adopt(left.stream(ltx));

        let filters: Vec<_> = (0..workers)
            .map(|_| {
                let rx = lrx.clone();
                let tx = sink.clone();
                let token = token.clone();
                let seen = Arc::clone(&seen);
                thread::spawn(move || {
                    while let Some(t) = next(&rx, &token) {
                        if seen.lock().contains(&t) {
                            continue;
                        }
                        if !emit(&tx, &token, t) {
                            break;
                        }
                    }
                })
            })
            .collect();
        drop(lrx);
        for f in filters {
            let _ = f.join();
        }
        node.latch_child(&left);
        drop(sink);
    });

    handle
}
