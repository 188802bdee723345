use chrono::{DateTime, Utc};

use crate::domain::opportunity::Opportunity;
use crate::domain::trade::TradeRecord;

#[derive(Debug, Clone)]
pub enum WorkerCommand {
    Scan { issued_at: DateTime<Utc> },
    Execute { opportunity: Box<Opportunity>, issued_at: DateTime<Utc> },
    Report { issued_at: DateTime<Utc> },
    Terminate,
}

#[derive(Debug, Clone)]
pub enum WorkerOutcome {
    ScanCompleted { candidates_found: usize },
    ExecuteCompleted { record: Box<TradeRecord> },
    ReportFlushed,
    Terminated,
}

#[derive(Debug, Clone)]
pub struct WorkerResponse {
    pub worker_id: usize,
    pub completed_at: DateTime<Utc>,
    pub latency_ms: u64,
    pub outcome: WorkerOutcome,
}
