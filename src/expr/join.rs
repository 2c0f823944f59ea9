//! ⋈ — symmetric hash join with a growing memory on each side.
//!
//! N workers drain both inputs. Each arriving tuple appends itself to
//! its side's memory and snapshots the opposite memory inside one
//! critical section on the shared lock, then probes the snapshot outside
//! any lock. This joins two lazy streams without either being
//! re-readable; memory grows with the sum of the input cardinalities.
//! Both input sides are sets, so match pairs are unique and the output
//! needs no dedup stage.

use crate::expr::{JoinPlan, JoinSrc, Node, Op, Relation};
use crate::stream::{cancel_pair, emit, CancelHandle, EitherInput, SideTuple, TupleSink};
use crate::tuple::Tuple;
use crate::value::Value;
use crossbeam_channel::bounded;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use tracing::debug;

#[derive(Default)]
struct JoinMemory {
    left: Vec<Tuple>,
    right: Vec<Tuple>,
}

fn combine(plan: &JoinPlan, left: &Tuple, right: &Tuple) -> Tuple {
    let values: Vec<Value> = plan
        .out
        .iter()
        .map(|src| match src {
            JoinSrc::Left(pos) => left.get(*pos).clone(),
            JoinSrc::Right(pos) => right.get(*pos).clone(),
        })
        .collect();
    Tuple::new(values)
}

pub(crate) fn stream(rel: &Relation, sink: TupleSink) -> CancelHandle {
    let node: Arc<Node> = Arc::clone(&rel.node);
    let (handle, token) = cancel_pair();

    let Op::Join { left, right, .. } = &node.op else {
        unreachable!("join stream on a non-join node")
    };
    let (left, right) = (left.clone(), right.clone());

    let cap = node.config.capacity();
    let (ltx, lrx) = bounded(cap);
    let (rtx, rrx) = bounded(cap);
    handle.adopt(left.stream(ltx));
    handle.adopt(right.stream(rtx));

    let workers = node.config.worker_count();
    debug!(workers, "streaming join");

    let memory = Arc::new(Mutex::new(JoinMemory::default()));
    let input = EitherInput::new(lrx, rrx);

    let mut worker_handles = Vec::with_capacity(workers);
    for _ in 0..workers {
        let node = Arc::clone(&node);
        let mut input = input.clone();
        let tx = sink.clone();
        let token = token.clone();
        let memory = Arc::clone(&memory);
        worker_handles.push(thread::spawn(move || {
            let Op::Join { plan, .. } = &node.op else {
                unreachable!()
            };
            'pull: while let Some(st) = input.next(&token) {
                match st {
                    SideTuple::Left(t) => {
                        let snapshot = {
                            let mut mem = memory.lock();
                            mem.left.push(t.clone());
                            mem.right.clone()
                        };
                        for r in &snapshot {
                            if !t.matches_on(r, &plan.common) {
                                continue;
                            }
                            if !emit(&tx, &token, combine(plan, &t, r)) {
                                break 'pull;
                            }
                        }
                    }
                    SideTuple::Right(t) => {
                        let snapshot = {
                            let mut mem = memory.lock();
                            mem.right.push(t.clone());
                            mem.left.clone()
                        };
                        for l in &snapshot {
                            if !l.matches_on(&t, &plan.common) {
                                continue;
                            }
                            if !emit(&tx, &token, combine(plan, l, &t)) {
                                break 'pull;
                            }
                        }
                    }
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
