use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::domain::opportunity::Opportunity;
use crate::domain::trade::TradeRecord;

use super::message::{WorkerCommand, WorkerOutcome, WorkerResponse};

/// The actual scan/execute/report behavior, injected so the scheduler's
/// message loop stays independent of pathfinding/execution wiring.
#[async_trait]
pub trait WorkerTasks: Send + Sync {
    async fn scan(&self, worker_id: usize) -> usize;
    async fn execute(&self, worker_id: usize, opportunity: Opportunity) -> TradeRecord;
    async fn report(&self, worker_id: usize);

    /// Opportunities accepted by the most recent scan and ready for
    /// dispatch. Implementations should drain their pending set so each
    /// opportunity is handed to exactly one worker.
    async fn take_pending(&self) -> Vec<Opportunity> {
        Vec::new()
    }
}

pub struct Worker {
    pub id: usize,
}

impl Worker {
    /// Runs until a `Terminate` command arrives or the command channel
    /// closes, replying to every command with a `WorkerResponse` tagged
    /// with this worker's id, a completion timestamp, and latency.
    pub async fn run(
        id: usize,
        tasks: Arc<dyn WorkerTasks>,
        mut commands: mpsc::Receiver<WorkerCommand>,
        responses: mpsc::Sender<WorkerResponse>,
    ) {
        info!(worker_id = id, "worker starting");
        while let Some(command) = commands.recv().await {
            let started = Instant::now();
            let outcome = match command {
                WorkerCommand::Scan { .. } => {
                    let found = tasks.scan(id).await;
                    WorkerOutcome::ScanCompleted {
                        candidates_found: found,
                    }
                }
                WorkerCommand::Execute { opportunity, .. } => {
                    let record = tasks.execute(id, *opportunity).await;
                    WorkerOutcome::ExecuteCompleted {
                        record: Box::new(record),
                    }
                }
                WorkerCommand::Report { .. } => {
                    tasks.report(id).await;
                    WorkerOutcome::ReportFlushed
                }
                WorkerCommand::Terminate => {
                    let response = WorkerResponse {
                        worker_id: id,
                        completed_at: Utc::now(),
                        latency_ms: started.elapsed().as_millis() as u64,
                        outcome: WorkerOutcome::Terminated,
                    };
                    let _ = responses.send(response).await;
                    info!(worker_id = id, "worker terminating");
                    return;
                }
            };

            let response = WorkerResponse {
                worker_id: id,
                completed_at: Utc::now(),
                latency_ms: started.elapsed().as_millis() as u64,
                outcome,
            };
            if responses.send(response).await.is_err() {
                warn!(worker_id = id, "scheduler response channel closed, stopping");
                return;
            }
        }
    }
}
