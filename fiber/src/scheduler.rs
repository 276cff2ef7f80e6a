//! The cooperative work loop.
//!
//! A [`Scheduler`] owns one render session: the committed tree, the tree currently
//! being built, the deletion list and the host. Work proceeds one unit at a time and
//! only ever pauses between units. Once the last unit is processed the pass is
//! committed synchronously.

use std::mem;
use std::rc::Rc;

use undertow_core::{
    HostKind, HostTree, Hooks, NodeType, Props, RenderError, UpdateSignal, VirtualNode,
};

use crate::commit::{CommitReport, Committer};
use crate::config::SchedulerConfig;
use crate::deadline::{Deadline, Unbounded};
use crate::reconcile::reconcile_children;
use crate::tree::UnitTree;
use crate::unit::{Effect, UnitId, UnitKind, WorkUnit};

/// Outcome of one [`Scheduler::perform_work`] invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkStatus {
    /// Nothing was scheduled.
    Idle,
    /// The deadline expired with units left; call again from the next idle period.
    Yielded,
    /// The pass finished and was committed.
    Committed(CommitReport),
}

/// Outcome of one [`Scheduler::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Nothing was scheduled.
    Idle,
    /// One unit was processed; the pass is not finished yet.
    Pending,
    /// The pass had no units left and was committed.
    Committed(CommitReport),
}

/// Render session driving reconciliation against one host.
pub struct Scheduler<H: HostTree> {
    host: H,
    config: SchedulerConfig,
    tree: UnitTree<H::Node>,
    next_unit: Option<UnitId>,
    wip_root: Option<UnitId>,
    committed_root: Option<UnitId>,
    deletions: Vec<UnitId>,
    signal: UpdateSignal,
}

impl<H: HostTree> std::fmt::Debug for Scheduler<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("config", &self.config)
            .field("units", &self.tree.len())
            .field("next_unit", &self.next_unit)
            .field("wip_root", &self.wip_root)
            .field("committed_root", &self.committed_root)
            .field("deletions", &self.deletions.len())
            .finish_non_exhaustive()
    }
}

impl<H: HostTree> Scheduler<H> {
    /// Creates a session with the default configuration.
    pub fn new(host: H) -> Self {
        Self::with_config(host, SchedulerConfig::default())
    }

    /// Creates a session with the given configuration.
    pub fn with_config(host: H, config: SchedulerConfig) -> Self {
        Self {
            host,
            config,
            tree: UnitTree::new(),
            next_unit: None,
            wip_root: None,
            committed_root: None,
            deletions: Vec::new(),
            signal: UpdateSignal::new(),
        }
    }

    /// Schedules a render of `root` into `container`.
    ///
    /// Any pass in progress is abandoned. Nothing is reconciled until the loop runs.
    pub fn render(&mut self, root: VirtualNode, container: H::Node) {
        self.begin(container, Rc::new(Props::with_children(vec![root])));
    }

    /// Runs units of work until the deadline expires or the pass is committed.
    ///
    /// This is the body of the host's idle callback; the host requests another
    /// idle period after each call that did not return [`WorkStatus::Idle`].
    ///
    /// # Errors
    ///
    /// Returns the error that aborted the pass. The committed tree is left as it was
    /// unless the failure happened during commit.
    pub fn perform_work(&mut self, deadline: &impl Deadline) -> Result<WorkStatus, RenderError> {
        self.poll_updates();
        if self.wip_root.is_none() {
            return Ok(WorkStatus::Idle);
        }

        let _span = tracing::debug_span!(target: "undertow::scheduler", "render_pass").entered();
        let mut performed = 0_usize;
        while let Some(unit) = self.next_unit {
            if deadline.did_timeout() {
                tracing::trace!(target: "undertow::scheduler", performed, "deadline reached, yielding");
                return Ok(WorkStatus::Yielded);
            }
            self.next_unit = self.guard(|this| this.perform_unit(unit))?;
            performed += 1;
            self.poll_updates();
        }
        self.commit().map(WorkStatus::Committed)
    }

    /// Performs exactly one unit of work, or commits if none is left.
    ///
    /// # Errors
    ///
    /// Returns the error that aborted the pass.
    pub fn step(&mut self) -> Result<Step, RenderError> {
        self.poll_updates();
        if let Some(unit) = self.next_unit {
            self.next_unit = self.guard(|this| this.perform_unit(unit))?;
            return Ok(Step::Pending);
        }
        if self.wip_root.is_some() {
            return self.commit().map(Step::Committed);
        }
        Ok(Step::Idle)
    }

    /// Runs the scheduled pass to completion without yielding.
    ///
    /// Returns `None` when nothing was scheduled.
    ///
    /// # Errors
    ///
    /// Returns the error that aborted the pass.
    pub fn flush(&mut self) -> Result<Option<CommitReport>, RenderError> {
        match self.perform_work(&Unbounded)? {
            WorkStatus::Committed(report) => Ok(Some(report)),
            WorkStatus::Idle | WorkStatus::Yielded => Ok(None),
        }
    }

    /// Returns `true` if a pass is scheduled or an update was requested.
    #[must_use]
    pub fn has_pending_work(&self) -> bool {
        self.wip_root.is_some() || (self.committed_root.is_some() && self.signal.is_requested())
    }

    /// Returns the host.
    #[must_use]
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// Returns the host mutably, e.g. to dispatch events.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Returns the unit arena.
    #[must_use]
    pub const fn tree(&self) -> &UnitTree<H::Node> {
        &self.tree
    }

    /// Root of the last committed tree.
    #[must_use]
    pub const fn committed_root(&self) -> Option<UnitId> {
        self.committed_root
    }

    /// Root of the pass in progress.
    #[must_use]
    pub const fn wip_root(&self) -> Option<UnitId> {
        self.wip_root
    }

    /// Signal raised by state setters of components rendered by this session.
    #[must_use]
    pub const fn update_signal(&self) -> &UpdateSignal {
        &self.signal
    }

    /// Arms a new pass over `container`, reconciled against the committed tree when it
    /// rendered into the same container.
    fn begin(&mut self, container: H::Node, props: Rc<Props>) {
        if self.wip_root.is_some() {
            tracing::debug!(target: "undertow::scheduler", "abandoning render pass in progress");
            self.release_pass();
        }
        self.deletions.clear();

        let committed = self.committed_root;
        let previous = committed.filter(|id| self.tree[*id].host.as_ref() == Some(&container));
        if previous.is_none()
            && let Some(old_child) = committed.and_then(|id| self.tree[id].child)
        {
            tracing::debug!(target: "undertow::scheduler", "container changed, dropping previous tree");
            self.deletions.push(old_child);
        }

        let id = self.tree.insert(WorkUnit::root(container, props, previous));
        self.wip_root = Some(id);
        self.next_unit = Some(id);
    }

    /// Turns a pending state update into a new pass rooted at the last committed root.
    ///
    /// A pass in progress is abandoned, including one armed by [`Scheduler::render`]
    /// that has not committed yet.
    fn poll_updates(&mut self) {
        let Some(source) = self.committed_root else {
            return;
        };
        if !self.signal.take() {
            return;
        }
        let root = &self.tree[source];
        let Some(container) = root.host.clone() else {
            return;
        };
        let props = root.props.clone();
        tracing::debug!(target: "undertow::scheduler", "state update requested, restarting render pass");
        self.begin(container, props);
    }

    fn guard<T>(
        &mut self,
        work: impl FnOnce(&mut Self) -> Result<T, RenderError>,
    ) -> Result<T, RenderError> {
        work(self).inspect_err(|error| {
            tracing::error!(target: "undertow::scheduler", %error, "render pass aborted");
            self.release_pass();
            self.abort();
        })
    }

    /// Hands the host nodes created by the pass in progress back to the host.
    ///
    /// Only placed units own a node of their own; updated units share theirs with the
    /// committed tree.
    fn release_pass(&mut self) {
        let Some(root) = self.wip_root else {
            return;
        };
        let mut stack = vec![root];
        let mut released = 0_usize;
        while let Some(id) = stack.pop() {
            stack.extend(self.tree.children(id));
            let unit = &self.tree[id];
            if unit.effect == Effect::Place
                && let Some(node) = &unit.host
            {
                self.host.release_node(node);
                released += 1;
            }
        }
        tracing::trace!(target: "undertow::scheduler", released, "released host nodes of abandoned pass");
    }

    fn abort(&mut self) {
        self.next_unit = None;
        self.wip_root = None;
        self.deletions.clear();
    }

    /// Renders one unit and returns the next one in depth-first order.
    fn perform_unit(&mut self, id: UnitId) -> Result<Option<UnitId>, RenderError> {
        let unit = &self.tree[id];
        let props = unit.props.clone();
        let kind = unit.kind.clone();
        let previous = unit.previous;
        tracing::trace!(target: "undertow::scheduler", unit = unit.label(), effect = ?unit.effect, "performing unit");

        match kind {
            UnitKind::Root => self.reconcile(id, props.children()),
            UnitKind::Node(NodeType::Fragment) => self.reconcile(id, props.children()),
            UnitKind::Node(node_type @ NodeType::Host(_)) => {
                node_type.validate()?;
                self.ensure_host(id, &node_type);
                self.reconcile(id, props.children());
            }
            UnitKind::Node(node_type @ NodeType::Text) => {
                self.ensure_host(id, &node_type);
            }
            UnitKind::Node(NodeType::Function(component)) => {
                let slots = previous
                    .and_then(|previous| self.tree.get(previous))
                    .map(|previous| previous.hooks.clone());
                let mut hooks = Hooks::new(component.name().to_owned(), slots, self.signal.clone());
                let child = component.render(&mut hooks, &props);
                let (slots, violation) = hooks.finish();
                if let Some(violation) = violation {
                    if self.config.strict_hooks() {
                        return Err(RenderError::HookOrderViolation {
                            component: component.name().to_owned(),
                            violation,
                        });
                    }
                    tracing::warn!(
                        target: "undertow::hooks",
                        component = component.name(),
                        %violation,
                        "hook order violation, state re-initialized"
                    );
                }
                self.tree[id].hooks = slots;
                self.reconcile(id, &[child]);
            }
            UnitKind::Node(NodeType::Class(component)) => {
                let child = component.instantiate(props.clone()).render();
                self.reconcile(id, &[child]);
            }
        }
        Ok(self.next_after(id))
    }

    /// Creates the detached host node of a new unit. Its properties are set at commit.
    fn ensure_host(&mut self, id: UnitId, node_type: &NodeType) {
        if self.tree[id].host.is_some() {
            return;
        }
        let kind = match node_type {
            NodeType::Host(tag) => HostKind::Element(tag),
            _ => HostKind::Text,
        };
        self.tree[id].host = Some(self.host.create_node(kind));
    }

    fn reconcile(&mut self, id: UnitId, children: &[VirtualNode]) {
        reconcile_children(&mut self.tree, &mut self.deletions, id, children);
    }

    /// Child first, then the nearest sibling of the unit or one of its ancestors.
    fn next_after(&self, id: UnitId) -> Option<UnitId> {
        let unit = &self.tree[id];
        if unit.child.is_some() {
            return unit.child;
        }
        let mut current = Some(id);
        while let Some(candidate) = current {
            if Some(candidate) == self.wip_root {
                return None;
            }
            let unit = &self.tree[candidate];
            if unit.sibling.is_some() {
                return unit.sibling;
            }
            current = unit.parent;
        }
        None
    }

    fn commit(&mut self) -> Result<CommitReport, RenderError> {
        let Some(root) = self.wip_root.take() else {
            return Ok(CommitReport::default());
        };
        let _span = tracing::debug_span!(target: "undertow::commit", "commit").entered();
        let deletions = mem::take(&mut self.deletions);

        let mut committer = Committer::new(&mut self.host, &self.tree, self.config.record_commits());
        for id in deletions {
            committer.delete(id);
        }
        if let Err(error) = committer.walk(root) {
            tracing::error!(target: "undertow::commit", %error, "commit aborted");
            self.abort();
            return Err(error);
        }
        let report = committer.finish();

        self.committed_root = Some(root);
        let swept = self.tree.sweep(root);
        tracing::debug!(
            target: "undertow::commit",
            placed = report.placed(),
            updated = report.updated(),
            relocated = report.relocated(),
            deleted = report.deleted(),
            swept,
            "committed"
        );
        Ok(report)
    }
}
