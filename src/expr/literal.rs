//! Source leaves: stream an in-memory sequence or set of tuples.

use crate::expr::{Node, Op, Relation};
use crate::stream::{cancel_pair, emit, CancelHandle, TupleSink};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use tracing::debug;

pub(crate) fn stream(rel: &Relation, sink: TupleSink) -> CancelHandle {
    let node: Arc<Node> = Arc::clone(&rel.node);
    let (handle, token) = cancel_pair();

    thread::spawn(move || match &node.op {
        Op::Values { tuples, distinct } => {
            debug!(tuples = tuples.len(), distinct, "streaming sequence literal");
            // Dedup is local: a single producer needs no lock.
            let mut seen = if *distinct { None } else { Some(HashSet::new()) };
            for t in tuples {
                if let Some(seen) = seen.as_mut() {
                    if !seen.insert(t.clone()) {
                        continue;
                    }
                }
                if !emit(&sink, &token, t.clone()) {
                    break;
                }
            }
        }
        Op::ValueSet { tuples } => {
            debug!(tuples = tuples.len(), "streaming set literal");
            for t in tuples {
                if !emit(&sink, &token, t.clone()) {
                    break;
                }
            }
        }
        _ => unreachable!("literal stream on a non-literal node"),
    });

    handle
}
