//! # Relation Expressions
//!
//! A [`Relation`] is a handle on one node of a query tree. Leaves are
//! literal relations over in-memory tuples; interior nodes are operator
//! expressions over child relations. Construction is eager and applies
//! the algebraic rewrites; evaluation is lazy and starts only when a
//! caller asks for the tuple stream.
//!
//! ```text
//! Literal tuples
//!     ↓
//! [Builders]        → query tree (rewrites applied per node)
//!     ↓
//! [stream()]        → worker threads + bounded channels
//!     ↓
//! Result tuples     → consumer channel, cancel handle
//! ```
//!
//! Every node carries an error slot. Construction failures latch into the
//! slot immediately and every later builder call propagates the same
//! error instead of doing work; streaming failures latch after the node's
//! workers exit, before the output channel disconnects, so `err()` is
//! authoritative once the stream has drained.

mod diff;
mod groupby;
mod join;
mod literal;
mod map;
mod project;
mod rename;
mod restrict;
mod union;

use crate::config::EngineConfig;
use crate::error::{RelError, RelResult};
use crate::heading::Heading;
use crate::keys::CandidateKeys;
use crate::predicate::{check_domain, Pred};
use crate::stream::{CancelHandle, TupleSink, TupleSource};
use crate::tuple::Tuple;
use crossbeam_channel::bounded;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// A user map function: declared input shape in, declared output shape out.
pub type MapFn = Arc<dyn Fn(&Tuple) -> Tuple + Send + Sync>;

/// A user aggregate: drains one group's value tuples, returns one value
/// tuple.
pub type AggregateFn = Arc<dyn Fn(TupleSource) -> Tuple + Send + Sync>;

/// Where a join output attribute comes from
#[derive(Debug, Clone, Copy)]
pub(crate) enum JoinSrc {
    Left(usize),
    Right(usize),
}

/// Precomputed positional plumbing for a natural join
#[derive(Clone)]
pub(crate) struct JoinPlan {
    /// (left position, right position) of each common attribute
    pub(crate) common: Vec<(usize, usize)>,
    /// Source of each output position
    pub(crate) out: Vec<JoinSrc>,
}

/// Where a group-by output attribute comes from
#[derive(Debug, Clone, Copy)]
pub(crate) enum GroupSrc {
    /// Position within the group-key tuple
    Key(usize),
    /// Position within the aggregate's result tuple
    Agg(usize),
}

/// Precomputed positional plumbing for a group-by
#[derive(Clone)]
pub(crate) struct GroupPlan {
    /// Source positions of the grouping attributes
    pub(crate) group_positions: Vec<usize>,
    /// Source positions of the value attributes fed to the aggregate
    pub(crate) value_positions: Vec<usize>,
    /// Source of each output position
    pub(crate) out: Vec<GroupSrc>,
    /// Declared shape of the aggregate's input and output tuples
    pub(crate) value_heading: Heading,
}

/// The operator at one node of the query tree
#[derive(Clone)]
pub(crate) enum Op {
    /// Sequence literal; `distinct` is the caller's promise that the
    /// sequence holds no duplicates
    Values { tuples: Vec<Tuple>, distinct: bool },
    /// Set literal; iteration is distinct by construction
    ValueSet { tuples: HashSet<Tuple> },
    Project {
        source: Relation,
        positions: Vec<usize>,
        /// Target heading is assignable-identical to the source's
        forward: bool,
        /// No source key survived, so outputs must be deduplicated
        needs_dedup: bool,
    },
    Restrict { source: Relation, predicate: Pred },
    Rename { source: Relation },
    Union { left: Relation, right: Relation },
    Diff { left: Relation, right: Relation },
    Join {
        left: Relation,
        right: Relation,
        plan: JoinPlan,
    },
    GroupBy {
        source: Relation,
        plan: GroupPlan,
        aggregate: AggregateFn,
    },
    Map {
        source: Relation,
        input_positions: Vec<usize>,
        output: Heading,
        f: MapFn,
        /// Caller declared output keys, so outputs stream undeduplicated
        distinct: bool,
    },
    /// Placeholder op of an error-latched node
    Faulted,
}

pub(crate) struct Node {
    pub(crate) heading: Heading,
    pub(crate) keys: CandidateKeys,
    pub(crate) op: Op,
    pub(crate) err: Mutex<Option<RelError>>,
    pub(crate) config: Arc<EngineConfig>,
}

impl Node {
    /// Record the first error of this evaluation; later ones are dropped.
    pub(crate) fn latch(&self, err: RelError) {
        let mut slot = self.err.lock();
        if slot.is_none() {
            debug!(error = %err, "latched stream error");
            *slot = Some(err);
        }
    }

    /// Latch the child's latched error, wrapped for propagation.
    pub(crate) fn latch_child(&self, child: &Relation) {
        if let Some(e) = child.err() {
            self.latch(RelError::source(e));
        }
    }
}

/// A node of a relational query tree. Cheap to clone; clones share the
/// node.
#[derive(Clone)]
pub struct Relation {
    pub(crate) node: Arc<Node>,
}

impl Relation {
    // ------------------------------------------------------------------
    // Literal constructors
    // ------------------------------------------------------------------

    /// Build a relation from an ordered sequence of tuples.
    ///
    /// The sequence may contain duplicates; the stream deduplicates on
    /// the fly. Pass [`CandidateKeys::none`] to get the default key (the
    /// full heading).
    pub fn new(heading: Heading, tuples: Vec<Tuple>, keys: CandidateKeys) -> Relation {
        Self::sequence(heading, tuples, keys, false)
    }

    /// Build a relation from a sequence the caller declares duplicate-free.
    ///
    /// Tuples stream straight through with no dedup stage.
    pub fn new_distinct(heading: Heading, tuples: Vec<Tuple>, keys: CandidateKeys) -> Relation {
        Self::sequence(heading, tuples, keys, true)
    }

    fn sequence(
        heading: Heading,
        tuples: Vec<Tuple>,
        keys: CandidateKeys,
        distinct: bool,
    ) -> Relation {
        let config = Arc::new(EngineConfig::default());
        if let Err(e) = Self::check_literal(&heading, tuples.iter(), &keys) {
            return Self::faulted(heading, config, e);
        }
        let keys = Self::effective_keys(&heading, keys);
        Relation {
            node: Arc::new(Node {
                heading,
                keys,
                op: Op::Values { tuples, distinct },
                err: Mutex::new(None),
                config,
            }),
        }
    }

    /// Build a relation from a set of tuples. Iteration over the set is
    /// distinct by construction, so streaming never deduplicates.
    pub fn from_set(heading: Heading, tuples: HashSet<Tuple>, keys: CandidateKeys) -> Relation {
        let config = Arc::new(EngineConfig::default());
        if let Err(e) = Self::check_literal(&heading, tuples.iter(), &keys) {
            return Self::faulted(heading, config, e);
        }
        let keys = Self::effective_keys(&heading, keys);
        Relation {
            node: Arc::new(Node {
                heading,
                keys,
                op: Op::ValueSet { tuples },
                err: Mutex::new(None),
                config,
            }),
        }
    }

    /// *Dee*: the nullary relation with one (empty) tuple.
    pub fn dee() -> Relation {
        let mut body = HashSet::new();
        body.insert(Tuple::empty());
        Self::from_set(Heading::nullary(), body, CandidateKeys::none())
    }

    /// *Dum*: the nullary relation with no tuples.
    pub fn dum() -> Relation {
        Self::from_set(Heading::nullary(), HashSet::new(), CandidateKeys::none())
    }

    fn check_literal<'a>(
        heading: &Heading,
        tuples: impl Iterator<Item = &'a Tuple>,
        keys: &CandidateKeys,
    ) -> RelResult<()> {
        keys.validate(heading)?;
        for t in tuples {
            heading.check_tuple(t)?;
        }
        Ok(())
    }

    fn effective_keys(heading: &Heading, keys: CandidateKeys) -> CandidateKeys {
        if keys.is_empty() {
            CandidateKeys::default_for(heading)
        } else {
            keys
        }
    }

    fn faulted(heading: Heading, config: Arc<EngineConfig>, err: RelError) -> Relation {
        let keys = CandidateKeys::default_for(&heading);
        Relation {
            node: Arc::new(Node {
                heading,
                keys,
                op: Op::Faulted,
                err: Mutex::new(Some(err)),
                config,
            }),
        }
    }

    /// A node that carries `self`'s latched error forward unchanged, so
    /// `op(r).err() == r.err()` for every operator.
    fn carry(&self, heading: Heading, err: RelError) -> Relation {
        Self::faulted(heading, Arc::clone(&self.node.config), err)
    }

    /// Rebuild this node with a different engine configuration.
    ///
    /// Derived nodes inherit the configuration of the relation they are
    /// built on, so setting it on the leaves is usually enough.
    pub fn with_config(&self, config: EngineConfig) -> Relation {
        Relation {
            node: Arc::new(Node {
                heading: self.node.heading.clone(),
                keys: self.node.keys.clone(),
                op: self.node.op.clone(),
                err: Mutex::new(self.node.err.lock().clone()),
                config: Arc::new(config),
            }),
        }
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// The heading this node's tuples conform to
    pub fn heading(&self) -> &Heading {
        &self.node.heading
    }

    /// The zero tuple of the heading: shapes buffers, fills unpopulated
    /// attributes.
    pub fn zero(&self) -> Tuple {
        self.node.heading.zero_tuple()
    }

    /// Number of attributes
    pub fn degree(&self) -> usize {
        self.node.heading.degree()
    }

    /// The canonicalized candidate keys of this node
    pub fn keys(&self) -> CandidateKeys {
        self.node.keys.clone()
    }

    /// The first error latched during construction or the most recent
    /// evaluation. `None` after a drained stream means clean end-of-stream.
    pub fn err(&self) -> Option<RelError> {
        self.node.err.lock().clone()
    }

    // ------------------------------------------------------------------
    // Streaming
    // ------------------------------------------------------------------

    /// Begin producing this relation's body into `sink`.
    ///
    /// Returns immediately; production happens on worker threads. The
    /// sink disconnects exactly once, after every worker has exited and
    /// any stream error has latched. Triggering the returned handle stops
    /// production promptly and cascades into all child streams.
    pub fn stream(&self, sink: TupleSink) -> CancelHandle {
        if self.err().is_some() {
            drop(sink);
            return CancelHandle::inert();
        }
        match &self.node.op {
            Op::Values { .. } | Op::ValueSet { .. } => literal::stream(self, sink),
            Op::Project { .. } => project::stream(self, sink),
            Op::Restrict { .. } => restrict::stream(self, sink),
            Op::Rename { .. } => rename::stream(self, sink),
            Op::Union { .. } => union::stream(self, sink),
            Op::Diff { .. } => diff::stream(self, sink),
            Op::Join { .. } => join::stream(self, sink),
            Op::GroupBy { .. } => groupby::stream(self, sink),
            Op::Map { .. } => map::stream(self, sink),
            Op::Faulted => {
                drop(sink);
                CancelHandle::inert()
            }
        }
    }

    /// Drain the stream and count tuples. O(N).
    pub fn cardinality(&self) -> RelResult<usize> {
        let (tx, rx) = bounded(self.node.config.capacity());
        let _handle = self.stream(tx);
        let mut count = 0;
        while rx.recv().is_ok() {
            count += 1;
        }
        match self.err() {
            Some(e) => Err(e),
            None => Ok(count),
        }
    }

    /// Drain the stream into a vector.
    ///
    /// Tuple order is arbitrary for every operator except single-worker
    /// forwarding paths; sort before comparing.
    pub fn collect(&self) -> RelResult<Vec<Tuple>> {
        let (tx, rx) = bounded(self.node.config.capacity());
        let _handle = self.stream(tx);
        let tuples: Vec<Tuple> = rx.into_iter().collect();
        match self.err() {
            Some(e) => Err(e),
            None => Ok(tuples),
        }
    }

    // ------------------------------------------------------------------
    // Algebraic builders
    // ------------------------------------------------------------------

    /// π — project onto `target`, a sub-domain of this heading.
    ///
    /// Stacked projections collapse; a projection distributes into the
    /// branches of a union; projecting a restriction pushes the
    /// projection below the predicate when the predicate still has its
    /// domain there.
    pub fn project(&self, target: &Heading) -> Relation {
        if let Some(e) = self.err() {
            return self.carry(target.clone(), e);
        }
        if let Err(e) = target.positions_in(&self.node.heading) {
            return self.carry(target.clone(), e);
        }
        match &self.node.op {
            // π_B(π_A(R)) ⇒ π_B(R)
            Op::Project { source, .. } => source.project(target),
            // π_B(σ_p(R)) ⇒ σ_p(π_B(R)) when Domain(p) ⊆ B
            Op::Restrict { source, predicate }
                if check_domain(predicate, target).is_ok() =>
            {
                Self::restrict_node(&source.project(target), predicate.clone())
            }
            // π distributes into both branches of a union
            Op::Union { left, right } => left.project(target).union(&right.project(target)),
            _ => Self::project_node(self, target),
        }
    }

    fn project_node(source: &Relation, target: &Heading) -> Relation {
        let positions = match target.positions_in(&source.node.heading) {
            Ok(p) => p,
            Err(e) => return source.carry(target.clone(), e),
        };
        let forward = *target == source.node.heading;
        let survivors = source.node.keys.survivors(target);
        let (keys, needs_dedup) = if survivors.is_empty() {
            (CandidateKeys::default_for(target), !forward)
        } else {
            (survivors, false)
        };
        Relation {
            node: Arc::new(Node {
                heading: target.clone(),
                keys,
                op: Op::Project {
                    source: source.clone(),
                    positions,
                    forward,
                    needs_dedup,
                },
                err: Mutex::new(None),
                config: Arc::clone(&source.node.config),
            }),
        }
    }

    /// σ — keep the tuples the predicate tests true on.
    ///
    /// Heading and keys are unchanged. A restriction distributes into
    /// union and difference branches, passes below a projection, and
    /// slides under an existing restriction so the newest predicate runs
    /// closest to the source.
    pub fn restrict(&self, predicate: Pred) -> Relation {
        if let Some(e) = self.err() {
            return self.carry(self.node.heading.clone(), e);
        }
        if let Err(e) = check_domain(&predicate, &self.node.heading) {
            return self.carry(self.node.heading.clone(), e);
        }
        match &self.node.op {
            // σ_p(π_B(R)) ⇒ π_B(σ_p(R)); the domain check above
            // guarantees p only reads projected attributes
            Op::Project { source, .. } => {
                Self::project_node(&source.restrict(predicate), &self.node.heading)
            }
            // σ_q(σ_p(R)) ⇒ σ_p(σ_q(R)); the new predicate runs first
            Op::Restrict {
                source,
                predicate: existing,
            } => Self::restrict_node(&source.restrict(predicate), existing.clone()),
            Op::Union { left, right } => left
                .restrict(predicate.clone())
                .union(&right.restrict(predicate)),
            Op::Diff { left, right } => left
                .restrict(predicate.clone())
                .diff(&right.restrict(predicate)),
            _ => Self::restrict_node(self, predicate),
        }
    }

    fn restrict_node(source: &Relation, predicate: Pred) -> Relation {
        Relation {
            node: Arc::new(Node {
                heading: source.node.heading.clone(),
                keys: source.node.keys.clone(),
                op: Op::Restrict {
                    source: source.clone(),
                    predicate,
                },
                err: Mutex::new(None),
                config: Arc::clone(&source.node.config),
            }),
        }
    }

    /// ρ — positional rename: `target` must have this heading's degree
    /// and types, position by position. Stacked renames collapse to one.
    pub fn rename(&self, target: &Heading) -> Relation {
        if let Some(e) = self.err() {
            return self.carry(target.clone(), e);
        }
        if let Err(e) = Self::check_rename(&self.node.heading, target) {
            return self.carry(target.clone(), e);
        }
        match &self.node.op {
            // ρ_C(ρ_B(R)) ⇒ ρ_C(R)
            Op::Rename { source } => source.rename(target),
            _ => Self::rename_node(self, target),
        }
    }

    fn check_rename(from: &Heading, to: &Heading) -> RelResult<()> {
        if from.degree() != to.degree() {
            return Err(RelError::SchemaMismatch(format!(
                "rename of {} to {} changes degree",
                from, to
            )));
        }
        for (a, b) in from.iter().zip(to.iter()) {
            if !b.data_type.assignable_from(&a.data_type) {
                return Err(RelError::SchemaMismatch(format!(
                    "rename of '{}' ({}) to '{}' ({}) changes type",
                    a.name, a.data_type, b.name, b.data_type
                )));
            }
        }
        Ok(())
    }

    fn rename_node(source: &Relation, target: &Heading) -> Relation {
        let keys = source.node.keys.renamed(&source.node.heading, target);
        Relation {
            node: Arc::new(Node {
                heading: target.clone(),
                keys,
                op: Op::Rename {
                    source: source.clone(),
                },
                err: Mutex::new(None),
                config: Arc::clone(&source.node.config),
            }),
        }
    }

    /// ∪ — set union of two relations with identical headings.
    ///
    /// The result's keys are the canonical intersection of the sources'
    /// key sets, which is empty when either side is nullary.
    pub fn union(&self, other: &Relation) -> Relation {
        if let Some(e) = self.err() {
            return self.carry(self.node.heading.clone(), e);
        }
        if let Some(e) = other.err() {
            return self.carry(self.node.heading.clone(), e);
        }
        if self.node.heading != other.node.heading {
            return self.carry(
                self.node.heading.clone(),
                RelError::SchemaMismatch(format!(
                    "union of {} with {}",
                    self.node.heading, other.node.heading
                )),
            );
        }
        let keys = self.node.keys.intersection(&other.node.keys);
        Relation {
            node: Arc::new(Node {
                heading: self.node.heading.clone(),
                keys,
                op: Op::Union {
                    left: self.clone(),
                    right: other.clone(),
                },
                err: Mutex::new(None),
                config: Arc::clone(&self.node.config),
            }),
        }
    }

    /// − — set difference; both sides need identical headings. Heading
    /// and keys come from the left source.
    pub fn diff(&self, other: &Relation) -> Relation {
        if let Some(e) = self.err() {
            return self.carry(self.node.heading.clone(), e);
        }
        if let Some(e) = other.err() {
            return self.carry(self.node.heading.clone(), e);
        }
        if self.node.heading != other.node.heading {
            return self.carry(
                self.node.heading.clone(),
                RelError::SchemaMismatch(format!(
                    "difference of {} with {}",
                    self.node.heading, other.node.heading
                )),
            );
        }
        Relation {
            node: Arc::new(Node {
                heading: self.node.heading.clone(),
                keys: self.node.keys.clone(),
                op: Op::Diff {
                    left: self.clone(),
                    right: other.clone(),
                },
                err: Mutex::new(None),
                config: Arc::clone(&self.node.config),
            }),
        }
    }

    /// ⋈ — natural join, with the output attribute order taken from
    /// `target`, which must equal the set union of the two headings.
    /// Common-named attributes must agree on type.
    pub fn join(&self, other: &Relation, target: &Heading) -> Relation {
        if let Some(e) = self.err() {
            return self.carry(target.clone(), e);
        }
        if let Some(e) = other.err() {
            return self.carry(target.clone(), e);
        }
        let plan = match Self::plan_join(&self.node.heading, &other.node.heading, target) {
            Ok(plan) => plan,
            Err(e) => return self.carry(target.clone(), e),
        };
        // A joined pair is fixed by fixing a key on each side, so the
        // pairwise key unions are injective on the result. Conservative:
        // possibly non-minimal, never duplicate-admitting.
        let keys = self.node.keys.cross_union(&other.node.keys);
        let keys = if keys.is_empty() {
            CandidateKeys::default_for(target)
        } else {
            keys
        };
        Relation {
            node: Arc::new(Node {
                heading: target.clone(),
                keys,
                op: Op::Join {
                    left: self.clone(),
                    right: other.clone(),
                    plan,
                },
                err: Mutex::new(None),
                config: Arc::clone(&self.node.config),
            }),
        }
    }

    /// ⋈ with the default output order: this heading followed by the
    /// other side's own attributes.
    pub fn natural_join(&self, other: &Relation) -> Relation {
        let target = match self.node.heading.union_with(&other.node.heading) {
            Ok(h) => h,
            Err(e) => return self.carry(self.node.heading.clone(), e),
        };
        self.join(other, &target)
    }

    fn plan_join(left: &Heading, right: &Heading, target: &Heading) -> RelResult<JoinPlan> {
        let common = left.common_with(right)?;
        let expected = left.union_with(right)?;
        if !target.set_eq(&expected) {
            return Err(RelError::SchemaMismatch(format!(
                "join target {} must equal {} as a set",
                target, expected
            )));
        }
        let pairs = common
            .iter()
            .map(|a| {
                let l = left.index_of(&a.name).expect("common attribute in left");
                let r = right.index_of(&a.name).expect("common attribute in right");
                (l, r)
            })
            .collect();
        let out = target
            .iter()
            .map(|a| match left.index_of(&a.name) {
                Some(pos) => JoinSrc::Left(pos),
                None => JoinSrc::Right(
                    right
                        .index_of(&a.name)
                        .expect("target attribute in one side"),
                ),
            })
            .collect();
        Ok(JoinPlan { common: pairs, out })
    }

    /// γ — group and aggregate.
    ///
    /// `target` is the result shape; `value` is the shape of the tuples
    /// fed to (and returned by) the aggregate, and must be a sub-domain
    /// of both `target` and this heading. The grouping key G is
    /// `target` minus `value`; each distinct G-tuple owns a task running
    /// the aggregate over its value stream.
    pub fn group_by(&self, target: &Heading, value: &Heading, aggregate: AggregateFn) -> Relation {
        if let Some(e) = self.err() {
            return self.carry(target.clone(), e);
        }
        let plan = match Self::plan_group(&self.node.heading, target, value) {
            Ok(plan) => plan,
            Err(e) => return self.carry(target.clone(), e),
        };
        let group = target.minus(value);
        // Groups refine the input partition: a source key inside G still
        // identifies tuples. Otherwise G itself is the only key.
        let survivors = self.node.keys.survivors(&group);
        let keys = if !survivors.is_empty() {
            survivors
        } else if group.is_empty() {
            CandidateKeys::none()
        } else {
            CandidateKeys::new([group.names()])
        };
        Relation {
            node: Arc::new(Node {
                heading: target.clone(),
                keys,
                op: Op::GroupBy {
                    source: self.clone(),
                    plan,
                    aggregate,
                },
                err: Mutex::new(None),
                config: Arc::clone(&self.node.config),
            }),
        }
    }

    fn plan_group(source: &Heading, target: &Heading, value: &Heading) -> RelResult<GroupPlan> {
        if !value.is_sub_domain_of(target) {
            return Err(RelError::SchemaMismatch(format!(
                "group value shape {} is not part of result shape {}",
                value, target
            )));
        }
        let group = target.minus(value);
        let group_positions = group.positions_in(source)?;
        let value_positions = value.positions_in(source)?;
        let out = target
            .iter()
            .map(|a| match group.index_of(&a.name) {
                Some(pos) => GroupSrc::Key(pos),
                None => GroupSrc::Agg(
                    value
                        .index_of(&a.name)
                        .expect("target attribute in group or value"),
                ),
            })
            .collect();
        Ok(GroupPlan {
            group_positions,
            value_positions,
            out,
            value_heading: value.clone(),
        })
    }

    /// Map each tuple through a user function from a declared input shape
    /// to a declared output shape. The output heading is exactly
    /// `output`; it need not be a sub-domain of this heading.
    ///
    /// Supplying `keys` declares the function injective: outputs stream
    /// without deduplication and the keys are trusted. With no keys the
    /// engine deduplicates every output and the full output heading is
    /// the key. A map distributes into union branches, and into
    /// difference branches when declared injective.
    pub fn map(
        &self,
        input: &Heading,
        output: &Heading,
        f: MapFn,
        keys: Option<CandidateKeys>,
    ) -> Relation {
        if let Some(e) = self.err() {
            return self.carry(output.clone(), e);
        }
        match &self.node.op {
            Op::Union { left, right } => {
                return left
                    .map(input, output, Arc::clone(&f), keys.clone())
                    .union(&right.map(input, output, f, keys));
            }
            Op::Diff { left, right } if keys.is_some() => {
                return left
                    .map(input, output, Arc::clone(&f), keys.clone())
                    .diff(&right.map(input, output, f, keys));
            }
            _ => {}
        }
        Self::map_node(self, input, output, f, keys)
    }

    fn map_node(
        source: &Relation,
        input: &Heading,
        output: &Heading,
        f: MapFn,
        keys: Option<CandidateKeys>,
    ) -> Relation {
        let input_positions = match input.positions_in(&source.node.heading) {
            Ok(p) => p,
            Err(e) => return source.carry(output.clone(), e),
        };
        let (keys, distinct) = match keys {
            Some(user_keys) => {
                if let Err(e) = user_keys.validate(output) {
                    return source.carry(output.clone(), e);
                }
                (user_keys, true)
            }
            None => (CandidateKeys::default_for(output), false),
        };
        Relation {
            node: Arc::new(Node {
                heading: output.clone(),
                keys,
                op: Op::Map {
                    source: source.clone(),
                    input_positions,
                    output: output.clone(),
                    f,
                    distinct,
                },
                err: Mutex::new(None),
                config: Arc::clone(&source.node.config),
            }),
        }
    }
}
