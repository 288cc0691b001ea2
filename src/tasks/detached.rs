//! Detached Tasks
//!
//! Fire-and-forget work that must never block or fail the request that
//! started it. Failures are logged and then dropped.

use std::fmt::Display;
use std::future::Future;

use tokio::task::JoinHandle;
use tracing::debug;

/// Spawns `task` on the runtime without awaiting it.
///
/// The returned handle may be ignored; dropping it does not cancel the task.
///
/// # Arguments
/// * `label` - Short name used in the failure log line
/// * `task` - The work to run
///
/// # Example
/// ```ignore
/// spawn_detached("telemetry.capture", async move { client.post(url).send().await.map(|_| ()) });
/// ```
pub fn spawn_detached<F, E>(label: &'static str, task: F) -> JoinHandle<()>
where
    F: Future<Output = Result<(), E>> + Send + 'static,
    E: Display + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = task.await {
            debug!(task = label, error = %e, "detached task failed");
        }
    })
}
