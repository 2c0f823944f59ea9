//! ρ — positional rename.
//!
//! Tuples carry identical data reinterpreted under the target heading,
//! so a single forwarder moves them through untouched and source order
//! is preserved.

use crate::expr::{Node, Op, Relation};
use crate::stream::{cancel_pair, emit, next, CancelHandle, TupleSink};
use crossbeam_channel::bounded;
use std::sync::Arc;
use std::thread;

pub(crate) fn stream(rel: &Relation, sink: TupleSink) -> CancelHandle {
    let node: Arc<Node> = Arc::clone(&rel.node);
    let (handle, token) = cancel_pair();

    let Op::Rename { source } = &node.op else {
        unreachable!("rename stream on a non-rename node")
    };
    let source = source.clone();
    let (child_tx, child_rx) = bounded(node.config.capacity());
    handle.adopt(source.stream(child_tx));

    thread::spawn(move || {
        while let Some(t) = next(&child_rx, &token) {
            if !emit(&sink, &token, t) {
                break;
            }
        }
        node.latch_child(&source);
        drop(sink);
    });

    handle
}
