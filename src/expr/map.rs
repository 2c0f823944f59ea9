//! Map — apply a user function tuple by tuple.
//!
//! Each worker projects the source tuple onto the declared input shape,
//! applies the function, and checks the output against the declared
//! output shape. Caller-declared keys mean the function is injective and
//! outputs stream directly; otherwise a shared dedup set admits only
//! novel outputs.

use crate::error::RelError;
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

    let Op::Map {
        source, distinct, ..
    } = &node.op
    else {
        unreachable!("map stream on a non-map node")
    };
    let source = source.clone();
    let (child_tx, child_rx) = bounded(node.config.capacity());
    handle.adopt(source.stream(child_tx));

    let workers = node.config.worker_count();
    debug!(workers, distinct, "streaming map");

    let seen: Option<Arc<Mutex<HashSet<Tuple>>>> = if *distinct {
        None
    } else {
        Some(Arc::new(Mutex::new(HashSet::new())))
    };

    let mut worker_handles = Vec::with_capacity(workers);
    for _ in 0..workers {
        let node = Arc::clone(&node);
        let rx = child_rx.clone();
        let tx = sink.clone();
        let token = token.clone();
        let handle = handle.clone();
        let seen = seen.clone();
        worker_handles.push(thread::spawn(move || {
            let Op::Map {
                input_positions,
                output,
                f,
                ..
            } = &node.op
            else {
                unreachable!()
            };
            while let Some(t) = next(&rx, &token) {
                let out = f(&t.select(input_positions));
                if output.check_tuple(&out).is_err() {
                    node.latch(RelError::ChannelShapeMismatch {
                        expected: output.to_string(),
                        actual: out.to_string(),
                    });
                    handle.cancel();
                    break;
                }
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
