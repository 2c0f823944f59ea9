//! σ — pass the tuples the predicate tests true on.
//!
//! The predicate compiles once against the source heading; N workers
//! then share the input stream as competitive consumers.

use crate::expr::{Node, Op, Relation};
use crate::predicate::Predicate;
use crate::stream::{cancel_pair, emit, next, CancelHandle, TupleSink};
use crate::tuple::Tuple;
use crossbeam_channel::bounded;
use std::sync::Arc;
use std::thread;
use tracing::debug;

pub(crate) fn stream(rel: &Relation, sink: TupleSink) -> CancelHandle {
    let node: Arc<Node> = Arc::clone(&rel.node);
    let (handle, token) = cancel_pair();

    let Op::Restrict { source, predicate } = &node.op else {
        unreachable!("restrict stream on a non-restrict node")
    };
    let source = source.clone();

    // Type conflicts between predicate operands and the heading surface
    // here; the domain itself was checked at construction.
    let test: Arc<dyn Fn(&Tuple) -> bool + Send + Sync> =
        match predicate.eval(source.heading()) {
            Ok(f) => Arc::from(f),
            Err(e) => {
                node.latch(e);
                handle.cancel();
                drop(sink);
                return handle;
            }
        };

    let (child_tx, child_rx) = bounded(node.config.capacity());
    handle.adopt(source.stream(child_tx));

    let workers = node.config.worker_count();
    debug!(workers, predicate = %predicate, "streaming restriction");

    let mut worker_handles = Vec::with_capacity(workers);
    for _ in 0..workers {
        let rx = child_rx.clone();
        let tx = sink.clone();
        let token = token.clone();
        let test = Arc::clone(&test);
        worker_handles.push(thread::spawn(move || {
            while let Some(t) = next(&rx, &token) {
                if !test(&t) {
                    continue;
                }
                if !emit(&tx, &token, t) {
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
