//! Reload the logging configuration when its file changes
//!
//! Both the file and its parent directory are watched: a mounted ConfigMap is
//! updated by swapping a symlink in the directory, which never touches the
//! watched file itself.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::LogConfig;
use crate::error::{LoggingError, Result};
use crate::format::LogFormat;
use crate::subscriber::{LogHandle, Reconfigured};

/// Pause after a failed watch or reload
pub const NOTIFICATION_DELAY: Duration = Duration::from_secs(1);

/// Why [`watch_config`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchExit {
    Shutdown,
    /// The file asks for another output format; the caller should restart
    RestartRequired { from: LogFormat, to: LogFormat },
}

/// Apply every change of `path` to `handle` until `shutdown` resolves
pub async fn watch_config<F>(path: &Path, handle: &LogHandle, shutdown: F) -> Result<WatchExit>
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        let changed = tokio::select! {
            _ = &mut shutdown => return Ok(WatchExit::Shutdown),
            changed = wait_for_change(path) => changed,
        };

        let applied = changed
            .and_then(|()| LogConfig::load(path))
            .and_then(|config| handle.reconfigure(&config));

        match applied {
            Ok(Reconfigured::LevelUpdated(level)) => {
                info!(level = %level, "log level updated");
            }
            Ok(Reconfigured::RestartRequired { from, to }) => {
                info!(%from, %to, "log format changed, restart required");
                return Ok(WatchExit::RestartRequired { from, to });
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to reload log config");
                tokio::select! {
                    _ = &mut shutdown => return Ok(WatchExit::Shutdown),
                    _ = tokio::time::sleep(NOTIFICATION_DELAY) => {}
                }
            }
        }
    }
}

/// Resolve on the next non-access event for `path` or its directory
async fn wait_for_change(path: &Path) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut watcher = notify::recommended_watcher(move |event: notify::Result<Event>| {
        let _ = tx.send(event);
    })
    .map_err(|source| watch_error(path, source))?;

    watch(&mut watcher, path)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        watch(&mut watcher, parent)?;
    }

    while let Some(event) = rx.recv().await {
        match event {
            Ok(event) if event.kind.is_access() => continue,
            Ok(_) => return Ok(()),
            Err(source) => return Err(watch_error(path, source)),
        }
    }
    Err(LoggingError::WatcherClosed)
}

fn watch(watcher: &mut RecommendedWatcher, path: &Path) -> Result<()> {
    watcher
        .watch(path, RecursiveMode::NonRecursive)
        .map_err(|source| watch_error(path, source))
}

fn watch_error(path: &Path, source: notify::Error) -> LoggingError {
    LoggingError::Watch {
        path: path.to_path_buf(),
        source,
    }
}
