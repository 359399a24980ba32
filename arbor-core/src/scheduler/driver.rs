//! Async driver.
//!
//! Runs a [`Renderer`] cooperatively on a tokio runtime: one budgeted
//! invocation at a time, yielding to other tasks between invocations so a
//! long render never monopolises the executor thread.

use tracing::debug;

use super::Deadline;
use crate::error::RenderError;
use crate::host::HostBinding;
use crate::renderer::Renderer;

/// What a drive did before going idle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DriveReport {
    /// Driver invocations, including the final one.
    pub invocations: usize,
    /// Commits performed.
    pub commits: u64,
}

/// Drive `renderer` until idle, budgeting each invocation from its
/// [`RendererConfig`](crate::RendererConfig): `units_per_tick` fibers when
/// set, otherwise `frame_budget_ms` of wall time.
pub async fn run_until_idle<H: HostBinding>(
    renderer: &mut Renderer<H>,
) -> Result<DriveReport, RenderError> {
    drive(renderer, |r| r.deadline()).await
}

/// Drive `renderer` until idle with a fresh deadline per invocation.
pub async fn run_until_idle_with<H, D, F>(
    renderer: &mut Renderer<H>,
    mut deadline: F,
) -> Result<DriveReport, RenderError>
where
    H: HostBinding,
    D: Deadline,
    F: FnMut() -> D,
{
    drive(renderer, |_| deadline()).await
}

async fn drive<H, D, F>(
    renderer: &mut Renderer<H>,
    mut deadline: F,
) -> Result<DriveReport, RenderError>
where
    H: HostBinding,
    D: Deadline,
    F: FnMut(&Renderer<H>) -> D,
{
    let start = renderer.commit_count();
    let mut report = DriveReport::default();
    loop {
        let status = {
            let mut budget = deadline(&*renderer);
            renderer.run_unit_of_work(&mut budget)?
        };
        report.invocations += 1;
        if status.is_idle() {
            report.commits = renderer.commit_count() - start;
            debug!(?report, "renderer idle");
            return Ok(report);
        }
        tokio::task::yield_now().await;
    }
}
