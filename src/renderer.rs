//! A scheduler bound to one container.

use undertow_core::{HostTree, RenderError, VirtualNode};
use undertow_fiber::{CommitReport, Deadline, Scheduler, SchedulerConfig, TimeSlice, WorkStatus};

/// Renders descriptor trees into a fixed container.
///
/// `Renderer` plays the part of a host event loop: [`Renderer::tick`] is what an idle
/// callback would run, using the configured time slice as its deadline.
#[derive(Debug)]
pub struct Renderer<H: HostTree> {
    scheduler: Scheduler<H>,
    container: H::Node,
}

impl<H: HostTree> Renderer<H> {
    /// Creates a renderer with the default configuration.
    pub fn new(host: H, container: H::Node) -> Self {
        Self::with_config(host, container, SchedulerConfig::default())
    }

    /// Creates a renderer with the given configuration.
    pub fn with_config(host: H, container: H::Node, config: SchedulerConfig) -> Self {
        Self {
            scheduler: Scheduler::with_config(host, config),
            container,
        }
    }

    /// Schedules `root` for rendering into the container.
    pub fn mount(&mut self, root: VirtualNode) {
        self.scheduler.render(root, self.container.clone());
    }

    /// Runs one idle period of work bounded by the configured time slice.
    ///
    /// # Errors
    ///
    /// Returns the error that aborted the pass.
    pub fn tick(&mut self) -> Result<WorkStatus, RenderError> {
        let deadline = TimeSlice::new(self.scheduler.config().time_slice());
        self.tick_with(&deadline)
    }

    /// Runs one idle period of work bounded by `deadline`.
    ///
    /// # Errors
    ///
    /// Returns the error that aborted the pass.
    pub fn tick_with(&mut self, deadline: &impl Deadline) -> Result<WorkStatus, RenderError> {
        self.scheduler.perform_work(deadline)
    }

    /// Keeps ticking until no work is left, returning the reports of every commit.
    ///
    /// # Errors
    ///
    /// Returns the first error that aborted a pass.
    pub fn run_until_idle(&mut self) -> Result<Vec<CommitReport>, RenderError> {
        let mut reports = Vec::new();
        let mut ticks = 0_usize;
        loop {
            match self.tick()? {
                WorkStatus::Idle => break,
                WorkStatus::Yielded => ticks += 1,
                WorkStatus::Committed(report) => {
                    ticks += 1;
                    reports.push(report);
                }
            }
        }
        tracing::debug!(target: "undertow::scheduler", ticks, commits = reports.len(), "renderer idle");
        Ok(reports)
    }

    /// Returns the container handle.
    #[must_use]
    pub const fn container(&self) -> &H::Node {
        &self.container
    }

    /// Returns the host.
    #[must_use]
    pub const fn host(&self) -> &H {
        self.scheduler.host()
    }

    /// Returns the host mutably.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn host_mut(&mut self) -> &mut H {
        self.scheduler.host_mut()
    }

    /// Returns the underlying scheduler.
    #[must_use]
    pub const fn scheduler(&self) -> &Scheduler<H> {
        &self.scheduler
    }

    /// Returns the underlying scheduler mutably.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn scheduler_mut(&mut self) -> &mut Scheduler<H> {
        &mut self.scheduler
    }
}
