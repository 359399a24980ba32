//! Renderer
//!
//! The [`Renderer`] owns everything a mounted tree needs: the host binding,
//! the fiber arena, the `current` and work-in-progress roots, the pending
//! deletions and the update queue shared with every state setter.
//!
//! # Lifecycle
//!
//! ```text
//! render()/setter ──► new WIP root ──► units of work ──► commit ──► current
//!                        ▲                 │ (yield)
//!                        └── replaced by a newer request
//! ```
//!
//! A newer render request always replaces an in-flight work-in-progress tree
//! outright. Requests are picked up at the start of each driver invocation.

use std::sync::Arc;

use tracing::{debug, error, trace};

use crate::commit::{commit_root, CommitStats};
use crate::config::RendererConfig;
use crate::element::{create_element, validate_type, Child, Component, Element, ElementType, Props};
use crate::error::RenderError;
use crate::fiber::{Fiber, FiberId, FiberKind, FiberTree};
use crate::hooks::{HookRecord, HookScope, HookSeed};
use crate::host::{HostBinding, HostNodeKind};
use crate::reconciler::reconcile_children;
use crate::scheduler::{Deadline, TimeBudget, Unbounded, UnitBudget, UpdateQueue, WorkStatus};

/// Drives reconciliation and commit for one mounted tree.
pub struct Renderer<H: HostBinding> {
    host: H,
    fibers: FiberTree<H::Node>,
    current: Option<FiberId>,
    wip_root: Option<FiberId>,
    next_unit_of_work: Option<FiberId>,
    deletions: Vec<FiberId>,
    /// Committed root being unmounted because the container changed.
    replaced_root: Option<FiberId>,
    queue: UpdateQueue,
    config: RendererConfig,
    last_commit: Option<CommitStats>,
    commits: u64,
}

impl<H: HostBinding> Renderer<H> {
    /// Create a renderer over `host` with the default configuration.
    pub fn new(host: H) -> Self {
        Self::with_config(host, RendererConfig::default())
    }

    /// Create a renderer over `host` with an explicit configuration.
    pub fn with_config(host: H, config: RendererConfig) -> Self {
        Self {
            host,
            fibers: FiberTree::new(),
            current: None,
            wip_root: None,
            next_unit_of_work: None,
            deletions: Vec::new(),
            replaced_root: None,
            queue: UpdateQueue::new(),
            config,
            last_commit: None,
            commits: 0,
        }
    }

    /// The host binding this renderer writes to.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable access to the host, for embedders that drive it directly.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// The fiber arena holding the current tree and any work in progress.
    pub fn fibers(&self) -> &FiberTree<H::Node> {
        &self.fibers
    }

    /// Shorthand for `fibers().get(id)`.
    pub fn fiber(&self, id: FiberId) -> Option<&Fiber<H::Node>> {
        self.fibers.get(id)
    }

    /// Root of the last committed tree.
    pub fn current_root(&self) -> Option<FiberId> {
        self.current
    }

    /// Root of the tree under construction, if a render is in flight.
    pub fn wip_root(&self) -> Option<FiberId> {
        self.wip_root
    }

    /// Handle for requesting renders from outside a component.
    pub fn update_queue(&self) -> UpdateQueue {
        self.queue.clone()
    }

    /// Number of commits performed so far.
    pub fn commit_count(&self) -> u64 {
        self.commits
    }

    /// Counts from the most recent commit.
    pub fn last_commit(&self) -> Option<CommitStats> {
        self.last_commit
    }

    /// Whether there is neither work in flight nor a pending request.
    pub fn is_idle(&self) -> bool {
        self.wip_root.is_none() && !self.queue.is_pending()
    }

    /// Schedule `element` to be rendered into `container`.
    ///
    /// No work happens until the renderer is driven with
    /// [`run_unit_of_work`](Self::run_unit_of_work) or
    /// [`flush_sync`](Self::flush_sync). Rendering into a different container
    /// than the mounted one unmounts the old tree.
    pub fn render(&mut self, element: Element, container: H::Node) {
        let mut props = Props::new();
        props.set_children(vec![element]);

        let mounted = self
            .current
            .and_then(|root| self.fibers.get(root).map(|f| (root, f.node.clone())));
        let (alternate, replaced) = match mounted {
            Some((root, node)) if node.as_ref() == Some(&container) => (Some(root), None),
            Some((root, _)) => (None, Some(root)),
            None => (None, None),
        };

        self.replaced_root = replaced;
        self.schedule_root(Arc::new(props), container, alternate);
        debug!(replaced = replaced.is_some(), "render scheduled");
    }

    /// Mount `component` into the host container with id `container_id`.
    pub fn init(&mut self, component: Component, container_id: &str) -> Result<(), RenderError> {
        let container = self
            .host
            .container_by_id(container_id)
            .ok_or_else(|| RenderError::ContainerNotFound(container_id.to_string()))?;
        self.render(
            create_element(component, Props::new(), Vec::<Child>::new()),
            container,
        );
        Ok(())
    }

    /// A deadline built from the configuration: a unit budget when
    /// `units_per_tick` is set, otherwise a frame-sized time budget.
    pub fn deadline(&self) -> Box<dyn Deadline + Send> {
        match self.config.units_per_tick {
            Some(units) => Box::new(UnitBudget::new(units)),
            None => Box::new(TimeBudget::new(self.config.frame_budget())),
        }
    }

    /// One driver invocation.
    ///
    /// Picks up pending render requests, performs units of work until the
    /// deadline asks to yield (at least one), and commits synchronously once
    /// the tree is exhausted. On error the work-in-progress tree is discarded
    /// and `current` is left as it was.
    pub fn run_unit_of_work(&mut self, deadline: &mut dyn Deadline) -> Result<WorkStatus, RenderError> {
        if self.queue.take() {
            self.restart_from_current();
        }

        let Some(root) = self.wip_root else {
            return Ok(self.status());
        };

        let mut next = self.next_unit_of_work;
        while let Some(fiber) = next {
            next = match self.perform_unit_of_work(fiber) {
                Ok(next) => next,
                Err(err) => {
                    error!(error = %err, "render failed, discarding work in progress");
                    self.abandon();
                    return Err(err);
                }
            };
            deadline.unit_done();
            if next.is_some() && deadline.should_yield() {
                self.next_unit_of_work = next;
                trace!("yielding with work remaining");
                return Ok(WorkStatus::Pending);
            }
        }
        self.next_unit_of_work = None;

        self.commit(root)?;
        Ok(self.status())
    }

    /// Drive until idle without yielding.
    pub fn flush_sync(&mut self) -> Result<(), RenderError> {
        while !self.run_unit_of_work(&mut Unbounded)?.is_idle() {}
        Ok(())
    }

    fn status(&self) -> WorkStatus {
        if self.is_idle() {
            WorkStatus::Idle
        } else {
            WorkStatus::Pending
        }
    }

    /// Replace any in-flight work with a fresh root.
    fn schedule_root(&mut self, props: Arc<Props>, container: H::Node, alternate: Option<FiberId>) {
        self.discard_wip();
        let mut root = Fiber::new(FiberKind::Root, None, props);
        root.node = Some(container);
        root.alternate = alternate;
        let id = self.fibers.insert(root);
        self.wip_root = Some(id);
        self.next_unit_of_work = Some(id);
        if let Some(old_root) = self.replaced_root {
            self.deletions.extend(self.fibers.children(old_root));
        }
    }

    /// Start a fresh pass for a state update, from the latest requested root.
    fn restart_from_current(&mut self) {
        let base = self.wip_root.or(self.current);
        let Some((props, node)) = base
            .and_then(|root| self.fibers.get(root))
            .map(|f| (Arc::clone(&f.props), f.node.clone()))
        else {
            trace!("update requested with nothing mounted");
            return;
        };
        let Some(container) = node else { return };
        let alternate = match self.replaced_root {
            Some(_) => None,
            None => self.current,
        };
        debug!(restarting = self.wip_root.is_some(), "state update scheduled a render");
        self.schedule_root(props, container, alternate);
    }

    /// Drop a failed render together with the request that started it.
    fn abandon(&mut self) {
        self.discard_wip();
        self.replaced_root = None;
    }

    fn discard_wip(&mut self) {
        if let Some(root) = self.wip_root.take() {
            let freed = self.fibers.free_subtree(root);
            trace!(freed, "discarded work in progress");
        }
        self.next_unit_of_work = None;
        self.deletions.clear();
    }

    /// Process one fiber and return the next one in depth-first order.
    pub(crate) fn perform_unit_of_work(&mut self, id: FiberId) -> Result<Option<FiberId>, RenderError> {
        let Some(root) = self.wip_root else {
            return Ok(None);
        };
        let kind = match self.fibers.get(id) {
            Some(fiber) => fiber.kind.clone(),
            None => return Ok(None),
        };
        trace!(fiber = kind.label(), "unit of work");

        match kind {
            FiberKind::Component(component) => self.update_function_component(id, &component)?,
            FiberKind::Root | FiberKind::Host(_) | FiberKind::Text | FiberKind::Fragment => {
                self.update_host_component(id)?
            }
        }
        Ok(self.fibers.next_in_preorder(id, root))
    }

    fn update_function_component(&mut self, id: FiberId, component: &Component) -> Result<(), RenderError> {
        let Some(fiber) = self.fibers.get(id) else {
            return Ok(());
        };
        let props = Arc::clone(&fiber.props);
        let alternate = fiber.alternate.and_then(|alt| self.fibers.get(alt));
        let previous: Vec<HookSeed> = alternate
            .map(|alt| alt.hooks.iter().map(HookRecord::seed).collect())
            .unwrap_or_default();

        let scope = HookScope::enter(
            id,
            component.name(),
            previous,
            alternate.is_some(),
            self.config.strict_hooks,
            self.queue.clone(),
        );
        let rendered = component.render(&props);
        let hooks = scope.finish();

        let element = rendered.map_err(|err| err.with_component(component.name()))?;
        let hooks = hooks?;
        if let Some(fiber) = self.fibers.get_mut(id) {
            fiber.hooks = hooks;
        }
        reconcile_children(&mut self.fibers, id, &[element], &mut self.deletions);
        Ok(())
    }

    fn update_host_component(&mut self, id: FiberId) -> Result<(), RenderError> {
        self.ensure_host_node(id)?;
        let children = match self.fibers.get(id) {
            Some(fiber) => fiber.props.children().to_vec(),
            None => return Ok(()),
        };
        reconcile_children(&mut self.fibers, id, &children, &mut self.deletions);
        Ok(())
    }

    /// Create the host node for a host or text fiber that has none yet.
    fn ensure_host_node(&mut self, id: FiberId) -> Result<(), RenderError> {
        let Some(fiber) = self.fibers.get(id) else {
            return Ok(());
        };
        if fiber.node.is_some() {
            return Ok(());
        }
        let kind = match &fiber.kind {
            FiberKind::Host(tag) => {
                if self.config.strict_elements {
                    validate_type(&ElementType::Host(Arc::clone(tag)))?;
                }
                HostNodeKind::Element(tag.as_ref())
            }
            FiberKind::Text => HostNodeKind::Text,
            _ => return Ok(()),
        };
        let node = self.host.create_node(kind)?;
        self.host.apply_props(&node, &Props::new(), &fiber.props)?;
        if let Some(fiber) = self.fibers.get_mut(id) {
            fiber.node = Some(node);
        }
        Ok(())
    }

    fn commit(&mut self, root: FiberId) -> Result<(), RenderError> {
        let stats = match commit_root(&mut self.fibers, &mut self.host, root, &self.deletions) {
            Ok(stats) => stats,
            Err(err) => {
                error!(error = %err, "commit aborted by host error");
                self.abandon();
                return Err(err.into());
            }
        };

        let previous = self.current.replace(root);
        self.wip_root = None;
        self.replaced_root = None;
        self.deletions.clear();
        if let Some(old_root) = previous {
            let freed = self.fibers.free_subtree(old_root);
            trace!(freed, "released previous tree");
        }
        for id in self.fibers.subtree(root) {
            if let Some(fiber) = self.fibers.get_mut(id) {
                fiber.alternate = None;
            }
        }

        self.commits += 1;
        self.last_commit = Some(stats);
        if self.queue.is_pending() {
            debug!("render requested during commit; another pass will follow");
        }
        Ok(())
    }
}
