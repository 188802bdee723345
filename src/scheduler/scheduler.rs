//! Worker Scheduler: owns a fixed pool of worker tasks, drives them with
//! periodic Scan/Report ticks, restarts a crashed worker under the same id
//! after a short delay, and flushes a final report on shutdown.
//!
//! `JoinSet` plus one `mpsc` pair per worker, rather than one broadcast
//! channel to all workers, so the scheduler can address a single worker
//! directly — needed for Execute commands, which must land on exactly one
//! worker.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::interval;
use tracing::{info, warn};

use super::message::{WorkerCommand, WorkerOutcome, WorkerResponse};
use super::worker::{Worker, WorkerTasks};

const RESTART_DELAY: Duration = Duration::from_secs(1);
const COMMAND_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub worker_count: usize,
    pub scan_interval: Duration,
    pub report_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            scan_interval: Duration::from_secs(2),
            report_interval: Duration::from_secs(60),
        }
    }
}

pub struct Scheduler {
    config: SchedulerConfig,
    tasks: Arc<dyn WorkerTasks>,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig, tasks: Arc<dyn WorkerTasks>) -> Self {
        Self { config, tasks }
    }

    /// Runs the worker pool until `shutdown` fires, then sends `Terminate`
    /// to every worker, drains their final acknowledgements, and returns.
    pub async fn run(self, mut shutdown: tokio::sync::oneshot::Receiver<()>) {
        let (response_tx, mut response_rx) = mpsc::channel::<WorkerResponse>(256);
        let mut command_senders: HashMap<usize, mpsc::Sender<WorkerCommand>> = HashMap::new();
        let mut joins = JoinSet::new();

        for id in 0..self.config.worker_count {
            self.spawn_worker(id, &mut command_senders, &mut joins, response_tx.clone());
        }

        let mut scan_ticker = interval(self.config.scan_interval);
        let mut report_ticker = interval(self.config.report_interval);

        loop {
            tokio::select! {
                _ = scan_ticker.tick() => {
                    self.broadcast(&command_senders, WorkerCommand::Scan { issued_at: Utc::now() }).await;
                }
                _ = report_ticker.tick() => {
                    self.broadcast(&command_senders, WorkerCommand::Report { issued_at: Utc::now() }).await;
                }
                Some(response) = response_rx.recv() => {
                    let scan_completed = matches!(response.outcome, WorkerOutcome::ScanCompleted { .. });
                    self.handle_response(response);
                    if scan_completed {
                        self.dispatch_pending(&command_senders).await;
                    }
                }
                joined = joins.join_next(), if !joins.is_empty() => {
                    if let Some(Ok(id)) = joined {
                        // A worker exited its loop without us having sent
                        // Terminate (command_senders still holds its
                        // sender only if we haven't removed it below) —
                        // treat this as a crash and restart after a delay.
                        if command_senders.contains_key(&id) {
                            warn!(worker_id = id, "worker exited unexpectedly, scheduling restart");
                            command_senders.remove(&id);
                            tokio::time::sleep(RESTART_DELAY).await;
                            self.spawn_worker(id, &mut command_senders, &mut joins, response_tx.clone());
                        }
                    }
                }
                _ = &mut shutdown => {
                    info!("scheduler shutting down, terminating workers");
                    break;
                }
            }
        }

        self.broadcast(&command_senders, WorkerCommand::Terminate).await;
        command_senders.clear();

        // Drain acknowledgements with a bounded wait so a stuck worker
        // can't hang shutdown forever.
        let drain_deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(drain_deadline) => break,
                joined = joins.join_next() => {
                    if joined.is_none() {
                        break;
                    }
                }
            }
        }
    }

    fn spawn_worker(
        &self,
        id: usize,
        command_senders: &mut HashMap<usize, mpsc::Sender<WorkerCommand>>,
        joins: &mut JoinSet<usize>,
        response_tx: mpsc::Sender<WorkerResponse>,
    ) {
        let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        command_senders.insert(id, tx);
        let tasks = Arc::clone(&self.tasks);
        joins.spawn(async move {
            Worker::run(id, tasks, rx, response_tx).await;
            id
        });
    }

    /// Drains whatever opportunities the most recent scan accepted and
    /// hands each to one worker round-robin, tagged with an Execute
    /// command — unlike Scan/Report these are unicast, since an opportunity
    /// must only be attempted once.
    async fn dispatch_pending(&self, command_senders: &HashMap<usize, mpsc::Sender<WorkerCommand>>) {
        if command_senders.is_empty() {
            return;
        }
        let pending = self.tasks.take_pending().await;
        if pending.is_empty() {
            return;
        }
        let worker_ids: Vec<usize> = command_senders.keys().copied().collect();
        for (i, opportunity) in pending.into_iter().enumerate() {
            let worker_id = worker_ids[i % worker_ids.len()];
            if let Some(sender) = command_senders.get(&worker_id) {
                let command = WorkerCommand::Execute {
                    opportunity: Box::new(opportunity),
                    issued_at: Utc::now(),
                };
                let _ = sender.send(command).await;
            }
        }
    }

    async fn broadcast(
        &self,
        command_senders: &HashMap<usize, mpsc::Sender<WorkerCommand>>,
        command: WorkerCommand,
    ) {
        for sender in command_senders.values() {
            let _ = sender.send(command.clone()).await;
        }
    }

    fn handle_response(&self, response: WorkerResponse) {
        match response.outcome {
            WorkerOutcome::ScanCompleted { candidates_found } => {
                info!(
                    worker_id = response.worker_id,
                    candidates_found,
                    latency_ms = response.latency_ms,
                    "scan completed"
                );
            }
            WorkerOutcome::ExecuteCompleted { record } => {
                info!(
                    worker_id = response.worker_id,
                    success = record.success,
                    "execute completed"
                );
            }
            WorkerOutcome::ReportFlushed => {
                info!(worker_id = response.worker_id, "report flushed");
            }
            WorkerOutcome::Terminated => {
                info!(worker_id = response.worker_id, "worker acknowledged termination");
            }
        }
    }
}
