use crate::core::{RealmError, Result};
use crate::facade::RealmStore;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::runtime::Handle;
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{Level, event, info_span};

pub type SharedRealmStore = Arc<Mutex<RealmStore>>;

/// Background task flushing pending batches once per frame interval.
#[derive(Debug)]
pub struct FrameDriver {
    stop_tx: Option<oneshot::Sender<()>>,
    join_handle: Option<JoinHandle<()>>,
    frames: Arc<AtomicU64>,
}

impl FrameDriver {
    /// Frames driven so far.
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    /// Signals the driver to stop and waits for it to finish.
    pub async fn stop(mut self) -> Result<()> {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }

        if let Some(join_handle) = self.join_handle.take() {
            join_handle
                .await
                .map_err(|err| RealmError::Driver(format!("frame driver join: {}", err)))?;
        }
        Ok(())
    }
}

impl Drop for FrameDriver {
    fn drop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(join_handle) = self.join_handle.take() {
            join_handle.abort();
        }
    }
}

/// Spawns a driver ticking at the store's configured frame interval.
///
/// Fails with [`RealmError::Driver`] when polled outside a tokio runtime.
pub async fn spawn_frame_driver(store: SharedRealmStore) -> Result<FrameDriver> {
    let runtime = Handle::try_current()
        .map_err(|err| RealmError::Driver(format!("no tokio runtime: {}", err)))?;
    let frame_interval = store.lock().await.config().frame_interval;

    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
    let frames = Arc::new(AtomicU64::new(0));
    let frames_for_driver = frames.clone();

    let join_handle = runtime.spawn(async move {
        let mut ticker = interval(frame_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut stop_rx => {
                    break;
                }
                _ = ticker.tick() => {
                    let frame = frames_for_driver.fetch_add(1, Ordering::Relaxed) + 1;
                    let mut guard = store.lock().await;
                    let report = info_span!("realm.frame", frame).in_scope(|| guard.flush_frame());
                    drop(guard);

                    if report.applied > 0 || report.skipped > 0 {
                        event!(
                            Level::DEBUG,
                            applied = report.applied,
                            skipped = report.skipped,
                            "frame flushed"
                        );
                    }
                }
            }
        }
    });

    Ok(FrameDriver {
        stop_tx: Some(stop_tx),
        join_handle: Some(join_handle),
        frames,
    })
}
