//! Polling helpers.
//!
//! Every state in this crate is read fresh from the platform, so waiting for
//! a state means reading until it shows up. The helpers here do that with a
//! fixed interval and an overall deadline.

use std::future::Future;

use sparkdeck_api::types::{ClusterState, RunState};

use crate::cluster::{lifecycle, Cluster};
use crate::config::WaitOptions;
use crate::error::{Error, Family, Result};
use crate::job::Run;
use crate::library::{ClusterLibrary, LibraryStatus};

/// Call `poll` every `options.poll_interval` until it yields a value.
///
/// # Errors
///
/// Returns the first error `poll` reports, or [`Error::Timeout`] naming
/// `what` once `options.timeout` has passed.
pub async fn poll_until<T, F, Fut>(options: &WaitOptions, what: &str, mut poll: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let polling = async {
        loop {
            if let Some(value) = poll().await? {
                return Ok(value);
            }
            tokio::time::sleep(options.poll_interval).await;
        }
    };

    match tokio::time::timeout(options.timeout, polling).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(what, timeout = ?options.timeout, "Gave up waiting");
            Err(Error::Timeout {
                what: what.to_string(),
                waited: options.timeout,
            })
        }
    }
}

/// Wait until a cluster reaches `target` and return it as last read.
///
/// # Errors
///
/// Returns a cluster configuration error as soon as the cluster is in a
/// state from which `target` can no longer be reached, or a timeout.
/// `UNKNOWN` reads keep polling.
pub async fn wait_for_cluster_state(
    cluster: &Cluster,
    target: ClusterState,
    options: &WaitOptions,
) -> Result<Cluster> {
    let what = format!("cluster {} to be {target}", cluster.id());
    poll_until(options, &what, || async move {
        let current = cluster.refresh().await?;
        let state = current.snapshot_state();
        tracing::debug!(cluster_id = %cluster.id(), %state, %target, "Polled cluster");

        if state == target {
            Ok(Some(current))
        } else if state != ClusterState::Unknown && !lifecycle::can_reach(state, target) {
            Err(Error::config(
                Family::Cluster,
                format!(
                    "cluster {} is {state} while waiting for {target}",
                    cluster.id()
                ),
            ))
        } else {
            Ok(None)
        }
    })
    .await
}

/// Wait until a run's life cycle is over and return its final state.
///
/// # Errors
///
/// Returns a run configuration error if a read fails, or a timeout.
pub async fn wait_for_run(run: &Run, options: &WaitOptions) -> Result<RunState> {
    let what = format!("run {} to finish", run.id());
    poll_until(options, &what, || async move {
        let state = run.state().await?;
        Ok(state.life_cycle_state.is_terminal().then_some(state))
    })
    .await
}

/// Wait until a library install settles and return the final status.
///
/// # Errors
///
/// Returns a library configuration error if a read fails, or a timeout.
pub async fn wait_for_library(
    library: &ClusterLibrary,
    options: &WaitOptions,
) -> Result<LibraryStatus> {
    let what = format!(
        "library {} on cluster {} to settle",
        library.library().identifier(),
        library.cluster().id()
    );
    poll_until(options, &what, || async move {
        let status = library.status().await?;
        Ok(status.state.is_settled().then_some(status))
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn fast() -> WaitOptions {
        WaitOptions::new(Duration::from_millis(1), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn returns_first_value() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let value = poll_until(&fast(), "third call", || async move {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            Ok((n == 3).then_some(n))
        })
        .await
        .unwrap();

        assert_eq!(value, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn times_out() {
        let options = WaitOptions::new(Duration::from_millis(5), Duration::from_millis(30));
        let err = poll_until(&options, "nothing", || async { Ok(None::<()>) })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Timeout { ref what, .. } if what == "nothing"));
    }

    #[tokio::test]
    async fn errors_stop_polling() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let err = poll_until(&fast(), "failure", || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<Option<()>, _>(Error::config(Family::Run, "broken"))
        })
        .await
        .unwrap_err();

        assert_eq!(err.family(), Some(Family::Run));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
