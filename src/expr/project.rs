//! π — copy the projected attributes of each source tuple into the
//! target shape.
//!
//! When the target heading is assignable-identical to the source's, a
//! single worker forwards tuples untouched and source order is
//! preserved. Otherwise N workers share the input; a dedup set guards
//! the output only when no source candidate key survived the projection.

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

    let Op::Project {
        source,
        forward,
        needs_dedup,
        ..
    } = &node.op
    else {
        unreachable!("project stream on a non-project node")
    };
    let source = source.clone();
    let (child_tx, child_rx) = bounded(node.config.capacity());
    handle.adopt(source.stream(child_tx));

    let workers = if *forward { 1 } else { node.config.worker_count() };
    debug!(workers, forward, dedup = needs_dedup, "streaming projection");

    let seen: Option<Arc<Mutex<HashSet<Tuple>>>> = if *needs_dedup {
        Some(Arc::new(Mutex::new(HashSet::new())))
    } else {
        None
    };

    let mut worker_handles = Vec::with_capacity(workers);
    for _ in 0..workers {
        let node = Arc::clone(&node);
        let rx = child_rx.clone();
        let tx = sink.clone();
        let token = token.clone();
        let seen = seen.clone();
        worker_handles.push(thread::spawn(move || {
            let Op::Project {
                positions, forward, ..
            } = &node.op
            else {
                unreachable!()
            };
            while let Some(t) = next(&rx, &token) {
                let out = if *forward { t } else { t.select(positions) };
                if let Some(seen) = &seen {
                    if !seen.lock().insert(out.clone()) {
                        continue;
                    }
                }
                if !emit(&tx, &token, out) {
                    break;
                }
            }
        }));
    }
    drop(child_rx);

    thread::spawn(move || {
        for w in worker_handles {
            let _ = w.join();
        }
        node.latch_child(&source);
        drop(sink);
    });

    handle
}
