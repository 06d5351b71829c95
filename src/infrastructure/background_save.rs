use crate::domain::models::Schedule;
use crate::infrastructure::activity_log::ActivityLog;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::schedule_repository::SchedulePersistence;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration as TokioDuration};

const MAX_RECORDED_FAILURES: usize = 32;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u8,
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveFailure {
    pub failed_at: DateTime<Utc>,
    pub attempts: u8,
    pub message: String,
}

enum SaveCommand {
    Save(Schedule),
    Flush(oneshot::Sender<()>),
}

pub struct BackgroundSaver<S>
where
    S: SchedulePersistence + 'static,
{
    repository: Arc<S>,
    sender: mpsc::UnboundedSender<SaveCommand>,
    failures: Arc<Mutex<VecDeque<SaveFailure>>>,
    worker: JoinHandle<()>,
}

impl<S> BackgroundSaver<S>
where
    S: SchedulePersistence + 'static,
{
    pub fn spawn(
        runtime: &Handle,
        repository: Arc<S>,
        retry_policy: RetryPolicy,
        log: Arc<ActivityLog>,
    ) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let failures = Arc::new(Mutex::new(VecDeque::new()));
        let worker = runtime.spawn(run_worker(
            Arc::clone(&repository),
            receiver,
            retry_policy,
            FailureLog {
                recent: Arc::clone(&failures),
                log,
            },
        ));
        Self {
            repository,
            sender,
            failures,
            worker,
        }
    }

    pub async fn flush(&self) -> Result<(), InfraError> {
        let (done, wait) = oneshot::channel();
        self.sender
            .send(SaveCommand::Flush(done))
            .map_err(|_| InfraError::SaveQueueClosed)?;
        wait.await.map_err(|_| InfraError::SaveQueueClosed)
    }

    pub fn failures(&self) -> Vec<SaveFailure> {
        self.failures
            .lock()
            .map(|failures| failures.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn take_failures(&self) -> Vec<SaveFailure> {
        self.failures
            .lock()
            .map(|mut failures| failures.drain(..).collect())
            .unwrap_or_default()
    }

    pub async fn shutdown(self) -> Vec<SaveFailure> {
        let Self {
            sender,
            failures,
            worker,
            ..
        } = self;
        drop(sender);
        let _ = worker.await;
        failures
            .lock()
            .map(|failures| failures.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl<S> SchedulePersistence for BackgroundSaver<S>
where
    S: SchedulePersistence + 'static,
{
    fn load_schedule(&self) -> Result<Schedule, InfraError> {
        self.repository.load_schedule()
    }

    fn save_schedule(&self, schedule: &Schedule) -> Result<(), InfraError> {
        self.sender
            .send(SaveCommand::Save(schedule.clone()))
            .map_err(|_| InfraError::SaveQueueClosed)
    }

    fn saves_in_background(&self) -> bool {
        true
    }
}

async fn run_worker<S>(
    repository: Arc<S>,
    mut receiver: mpsc::UnboundedReceiver<SaveCommand>,
    retry_policy: RetryPolicy,
    failures: FailureLog,
) where
    S: SchedulePersistence + 'static,
{
    while let Some(command) = receiver.recv().await {
        let mut latest = None;
        let mut waiters = Vec::new();
        collect_command(command, &mut latest, &mut waiters);
        // coalesce a burst of snapshots down to the newest one
        while let Ok(command) = receiver.try_recv() {
            collect_command(command, &mut latest, &mut waiters);
        }

        if let Some(schedule) = latest {
            let result = save_with_retry(Arc::clone(&repository), schedule, &retry_policy).await;
            if let Err(failure) = result {
                failures.record(failure);
            }
        }
        for waiter in waiters {
            let _ = waiter.send(());
        }
    }
}

struct FailureLog {
    recent: Arc<Mutex<VecDeque<SaveFailure>>>,
    log: Arc<ActivityLog>,
}

impl FailureLog {
    fn record(&self, failure: SaveFailure) {
        self.log.error(
            "save_schedule",
            &format!(
                "background save gave up after {} attempts: {}",
                failure.attempts, failure.message
            ),
        );
        if let Ok(mut recent) = self.recent.lock() {
            if recent.len() == MAX_RECORDED_FAILURES {
                recent.pop_front();
            }
            recent.push_back(failure);
        }
    }
}

fn collect_command(
    command: SaveCommand,
    latest: &mut Option<Schedule>,
    waiters: &mut Vec<oneshot::Sender<()>>,
) {
    match command {
        SaveCommand::Save(schedule) => *latest = Some(schedule),
        SaveCommand::Flush(waiter) => waiters.push(waiter),
    }
}

async fn save_with_retry<S>(
    repository: Arc<S>,
    schedule: Schedule,
    retry_policy: &RetryPolicy,
) -> Result<(), SaveFailure>
where
    S: SchedulePersistence + 'static,
{
    let max_attempts = retry_policy.max_attempts.max(1);
    let schedule = Arc::new(schedule);
    let mut attempt: u8 = 1;
    loop {
        let repository = Arc::clone(&repository);
        let snapshot = Arc::clone(&schedule);
        let result = tokio::task::spawn_blocking(move || repository.save_schedule(&snapshot))
            .await
            .map_err(|error| format!("save task failed: {error}"))
            .and_then(|result| result.map_err(|error| error.to_string()));

        match result {
            Ok(()) => return Ok(()),
            Err(message) if attempt >= max_attempts => {
                return Err(SaveFailure {
                    failed_at: Utc::now(),
                    attempts: attempt,
                    message,
                });
            }
            Err(_) => {
                let backoff = retry_policy
                    .base_delay_ms
                    .saturating_mul(2u64.saturating_pow(u32::from(attempt - 1)));
                sleep(TokioDuration::from_millis(backoff)).await;
                attempt += 1;
            }
        }
    }
}
