//! γ — group and aggregate.
//!
//! Distributor workers split each source tuple into a (group, value)
//! pair. The first tuple of a new group spawns an aggregator task owning
//! that group's channel; the user aggregate drains the channel and
//! returns one value tuple. When the input is exhausted the group
//! channels close, the aggregates return, and each result joins its
//! group key to form an output tuple. Groups only exist once a tuple
//! arrives, so an aggregate never sees an empty stream.

use crate::error::RelError;
use crate::expr::{GroupSrc, Node, Op, Relation};
use crate::stream::{cancel_pair, emit, next, CancelHandle, CancelToken, TupleSink};
use crate::tuple::Tuple;
use crate::value::Value;
use crossbeam_channel::{bounded, Sender};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use tracing::debug;

fn combine(out: &[GroupSrc], group: &Tuple, result: &Tuple) -> Tuple {
    let values: Vec<Value> = out
        .iter()
        .map(|src| match src {
            GroupSrc::Key(pos) => group.get(*pos).clone(),
            GroupSrc::Agg(pos) => result.get(*pos).clone(),
        })
        .collect();
    Tuple::new(values)
}

fn spawn_aggregator(
    node: Arc<Node>,
    group: Tuple,
    sink: TupleSink,
    token: CancelToken,
    handle: CancelHandle,
    capacity: usize,
) -> (Sender<Tuple>, thread::JoinHandle<()>) {
    let (gtx, grx) = bounded(capacity);
    let worker = thread::spawn(move || {
        let Op::GroupBy {
            plan, aggregate, ..
        } = &node.op
        else {
            unreachable!()
        };
        let result = aggregate(grx);
        if plan.value_heading.check_tuple(&result).is_err() {
            node.latch(RelError::ChannelShapeMismatch {
                expected: plan.value_heading.to_string(),
                actual: result.to_string(),
            });
            handle.cancel();
            return;
        }
        if token.is_cancelled() {
            return;
        }
        emit(&sink, &token, combine(&plan.out, &group, &result));
    });
    (gtx, worker)
}

pub(crate) fn stream(rel: &Relation, sink: TupleSink) -> CancelHandle {
    let node: Arc<Node> = Arc::clone(&rel.node);
    let (handle, token) = cancel_pair();

    let Op::GroupBy { source, .. } = &node.op else {
        unreachable!("group stream on a non-group node")
    };
    let source = source.clone();
    let cap = node.config.capacity();
    let (child_tx, child_rx) = bounded(cap);
    handle.adopt(source.stream(child_tx));

    let workers = node.config.worker_count();
    debug!(workers, "streaming group-by");

    let groups: Arc<Mutex<HashMap<Tuple, Sender<Tuple>>>> =
        Arc::new(Mutex::new(HashMap::new()));
    let aggregators: Arc<Mutex<Vec<thread::JoinHandle<()>>>> =
        Arc::new(Mutex::new(Vec::new()));

    let mut distributor_handles = Vec::with_capacity(workers);
    for _ in 0..workers {
        let node = Arc::clone(&node);
        let rx = child_rx.clone();
        let tx = sink.clone();
        let token = token.clone();
        let handle = handle.clone();
        let groups = Arc::clone(&groups);
        let aggregators = Arc::clone(&aggregators);
        distributor_handles.push(thread::spawn(move || {
            let Op::GroupBy { plan, .. } = &node.op else {
                unreachable!()
            };
            while let Some(t) = next(&rx, &token) {
                let g = t.select(&plan.group_positions);
                let v = t.select(&plan.value_positions);
                // Lock covers map access only; the channel send happens
                // outside it.
                let sender = {
                    let mut map = groups.lock();
                    match map.get(&g) {
                        Some(s) => s.clone(),
                        None => {
                            let (gtx, worker) = spawn_aggregator(
                                Arc::clone(&node),
                                g.clone(),
                                tx.clone(),
                                token.clone(),
                                handle.clone(),
                                cap,
                            );
                            map.insert(g, gtx.clone());
                            aggregators.lock().push(worker);
                            gtx
                        }
                    }
                };
                if !emit(&sender, &token, v) {
                    if token.is_cancelled() {
                        break;
                    }
                    // The aggregate dropped its input early; skip the
                    // rest of this group's tuples.
                    continue;
                }
            }
        }));
    }
    drop(child_rx);

    thread::spawn(move || {
        for d in distributor_handles {
            let _ = d.join();
        }
        // Closing every group channel ends the aggregates; their exits
        // release the sink clones.
        groups.lock().clear();
        let workers: Vec<_> = std::mem::take(&mut *aggregators.lock());
        for w in workers {
            let _ = w.join();
        }
        node.latch_child(&source);
        drop(sink);
    });

    handle
}
