use crate::disk_store::DiskTier;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use vision::CacheEntry;

/// Work for the disk worker. Jobs run one at a time in enqueue order.
#[derive(Debug)]
pub enum DiskJob {
    Write(Arc<CacheEntry>),
    /// Delete every record; replies with the number of files removed.
    Clear(oneshot::Sender<usize>),
    /// Replies once every job queued before it has run.
    Flush(oneshot::Sender<()>),
}

/// Handle to the background task that owns all disk mutations.
#[derive(Debug, Clone)]
pub struct DiskWriter {
    sender: mpsc::UnboundedSender<DiskJob>,
}

impl DiskWriter {
    /// Spawn the worker onto the current Tokio runtime.
    /// The worker exits once every `DiskWriter` clone is dropped.
    pub fn spawn(disk: Arc<DiskTier>) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_worker(disk, receiver));
        (Self { sender }, handle)
    }

    /// Queue a write without waiting for it
    pub fn enqueue_write(&self, entry: Arc<CacheEntry>) {
        if self.sender.send(DiskJob::Write(entry)).is_err() {
            warn!("Disk worker stopped; dropping cache write");
        }
    }

    pub async fn clear(&self) -> usize {
        let (ack, done) = oneshot::channel();
        if self.sender.send(DiskJob::Clear(ack)).is_err() {
            warn!("Disk worker stopped; cache directory not cleared");
            return 0;
        }
        done.await.unwrap_or_default()
    }

    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.sender.send(DiskJob::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }
}

async fn run_worker(disk: Arc<DiskTier>, mut receiver: mpsc::UnboundedReceiver<DiskJob>) {
    debug!("Disk worker started");

    while let Some(job) = receiver.recv().await {
        match job {
            DiskJob::Write(entry) => {
                if let Err(e) = disk.write(&entry).await {
                    warn!("Failed to persist recognition {}: {}", entry.fingerprint, e);
                }
            }
            DiskJob::Clear(ack) => {
                let removed = match disk.remove_all().await {
                    Ok(removed) => removed,
                    Err(e) => {
                        warn!("Failed to clear cache directory: {}", e);
                        0
                    }
                };
                info!("Removed {} cache record(s) from disk", removed);
                let _ = ack.send(removed);
            }
            DiskJob::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }

    debug!("Disk worker stopped");
}
