use crate::domain::error::MutationError;
use crate::domain::models::{BlockEdge, BlockId, FeedbackKind, Schedule};
use crate::domain::presets::Preset;
use crate::domain::schedule_store::ScheduleStore;
use crate::domain::time_math::{to_clock_string, to_minutes};
use crate::infrastructure::activity_log::ActivityLog;
use crate::infrastructure::config::{EngineConfig, FeedbackDisplayMs, SavePolicy};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::schedule_repository::SchedulePersistence;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackEvent {
    pub kind: FeedbackKind,
    pub display_ms: u64,
}

pub trait FeedbackSink: Send + Sync {
    fn emit(&self, event: FeedbackEvent);
}

#[derive(Debug, Default)]
pub struct NoFeedback;

impl FeedbackSink for NoFeedback {
    fn emit(&self, _event: FeedbackEvent) {}
}

#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordedFeedback {
    events: std::sync::Mutex<Vec<FeedbackEvent>>,
}

#[cfg(test)]
impl RecordedFeedback {
    pub(crate) fn events(&self) -> Vec<FeedbackEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub(crate) fn kinds(&self) -> Vec<FeedbackKind> {
        self.events().into_iter().map(|event| event.kind).collect()
    }
}

#[cfg(test)]
impl FeedbackSink for RecordedFeedback {
    fn emit(&self, event: FeedbackEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

pub type ScheduleListener = Box<dyn Fn(&Schedule) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    Saved,
    // handed to a background writer, see BackgroundSaver::failures
    Queued,
    Deferred,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MutationSuccess {
    pub schedule: Schedule,
    pub save: SaveStatus,
}

pub type MutationResult = Result<MutationSuccess, MutationError>;

pub struct MutationApi<P, F>
where
    P: SchedulePersistence,
    F: FeedbackSink,
{
    store: ScheduleStore,
    persistence: Arc<P>,
    feedback: Arc<F>,
    log: Arc<ActivityLog>,
    display_ms: FeedbackDisplayMs,
    save_policy: SavePolicy,
    listeners: Vec<ScheduleListener>,
}

impl<P, F> MutationApi<P, F>
where
    P: SchedulePersistence,
    F: FeedbackSink,
{
    pub fn new(
        store: ScheduleStore,
        persistence: Arc<P>,
        feedback: Arc<F>,
        log: Arc<ActivityLog>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            store,
            persistence,
            feedback,
            log,
            display_ms: config.feedback_display_ms.clone(),
            save_policy: config.save_policy,
            listeners: Vec::new(),
        }
    }

    pub fn open(
        persistence: Arc<P>,
        feedback: Arc<F>,
        log: Arc<ActivityLog>,
        config: &EngineConfig,
    ) -> Result<Self, InfraError> {
        let schedule = persistence.load_schedule()?;
        let store = ScheduleStore::from_schedule(schedule).map_err(|error| {
            log.error("load_schedule", &error.to_string());
            InfraError::InvalidData(format!("stored schedule is invalid: {error}"))
        })?;
        log.info(
            "load_schedule",
            &format!("loaded {} blocks", store.len()),
        );
        Ok(Self::new(store, persistence, feedback, log, config))
    }

    pub fn store(&self) -> &ScheduleStore {
        &self.store
    }

    pub fn schedule(&self) -> Schedule {
        self.store.snapshot()
    }

    pub fn save_policy(&self) -> SavePolicy {
        self.save_policy
    }

    pub fn log(&self) -> &ActivityLog {
        &self.log
    }

    pub fn on_schedule_changed(&mut self, listener: impl Fn(&Schedule) + Send + Sync + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn add_block(&mut self, start: &str, duration_minutes: u32) -> MutationResult {
        let start_minute = to_minutes(start)
            .map_err(|error| self.reject("add_block", MutationError::from(error)))?;
        self.add_block_at(start_minute as i64, duration_minutes)
    }

    pub fn add_block_at(&mut self, start_minute: i64, duration_minutes: u32) -> MutationResult {
        let id = self
            .store
            .insert(start_minute, duration_minutes)
            .map_err(|error| self.reject("add_block", error.into()))?;
        let message = self.describe(id, "added");
        Ok(self.commit("add_block", &message))
    }

    pub fn edit_block(&mut self, id: BlockId, start: &str, duration_minutes: u32) -> MutationResult {
        let start_minute = to_minutes(start)
            .map_err(|error| self.reject("edit_block", MutationError::from(error)))?;
        self.edit_block_at(id, start_minute as i64, duration_minutes)
    }

    pub fn edit_block_at(
        &mut self,
        id: BlockId,
        start_minute: i64,
        duration_minutes: u32,
    ) -> MutationResult {
        self.store
            .update(id, start_minute, duration_minutes)
            .map(|_| ())
            .map_err(|error| self.reject("edit_block", error.into()))?;
        let message = self.describe(id, "moved");
        Ok(self.commit("edit_block", &message))
    }

    pub fn resize_block(&mut self, id: BlockId, edge: BlockEdge, minute: u32) -> MutationResult {
        self.store
            .resize(id, edge, minute)
            .map(|_| ())
            .map_err(|error| self.reject("resize_block", error.into()))?;
        let message = self.describe(id, "resized");
        Ok(self.commit("resize_block", &message))
    }

    pub fn delete_block(&mut self, id: BlockId) -> MutationResult {
        let Some(removed) = self.store.remove(id) else {
            return Err(self.reject("delete_block", MutationError::NotFound(id)));
        };
        let message = format!(
            "deleted {} ({} minutes)",
            removed.id(),
            removed.duration_minutes()
        );
        Ok(self.commit("delete_block", &message))
    }

    pub fn apply_preset(&mut self, preset: Preset) -> MutationResult {
        preset
            .populate(&mut self.store)
            .map_err(|error| self.reject("apply_preset", error.into()))?;
        let message = format!(
            "applied {} preset ({} blocks)",
            preset.as_str(),
            self.store.len()
        );
        Ok(self.commit("apply_preset", &message))
    }

    // listeners are notified, nothing is saved
    pub fn reload(&mut self, schedule: Schedule) -> Result<Schedule, MutationError> {
        self.store
            .replace(schedule)
            .map_err(|error| self.reject("reload", error.into()))?;
        let snapshot = self.store.snapshot();
        self.log.info(
            "reload",
            &format!("reloaded {} blocks", snapshot.blocks.len()),
        );
        self.notify(&snapshot);
        Ok(snapshot)
    }

    pub fn restore(&mut self, schedule: Schedule) -> MutationResult {
        self.store
            .replace(schedule)
            .map_err(|error| self.reject("restore", error.into()))?;
        let message = format!("restored {} blocks", self.store.len());
        let snapshot = self.store.snapshot();
        self.log.info("restore", &message);
        self.notify(&snapshot);
        let save = self.save_per_policy(&snapshot);
        Ok(MutationSuccess {
            schedule: snapshot,
            save,
        })
    }

    pub fn save_now(&self) -> SaveStatus {
        self.save(&self.store.snapshot())
    }

    pub fn emit_feedback(&self, kind: FeedbackKind) {
        self.feedback.emit(FeedbackEvent {
            kind,
            display_ms: self.display_ms.for_kind(kind),
        });
    }

    fn describe(&self, id: BlockId, verb: &str) -> String {
        match self.store.get(id) {
            Some(block) => format!(
                "{verb} {id} {}-{} ({} minutes)",
                block.start_clock(),
                block.end_clock(),
                block.duration_minutes()
            ),
            None => format!("{verb} {id}"),
        }
    }

    fn commit(&mut self, operation: &str, message: &str) -> MutationSuccess {
        let schedule = self.store.snapshot();
        self.log.info(operation, message);
        self.emit_feedback(FeedbackKind::Success);
        self.notify(&schedule);
        let save = self.save_per_policy(&schedule);
        MutationSuccess { schedule, save }
    }

    fn reject(&self, operation: &str, error: MutationError) -> MutationError {
        self.log.info(
            operation,
            &format!("rejected ({}): {error}", error.reason()),
        );
        match error {
            MutationError::TooShort | MutationError::TooLong => {
                self.emit_feedback(FeedbackKind::TooShort)
            }
            MutationError::Collision { .. } => self.emit_feedback(FeedbackKind::Collision),
            MutationError::NotFound(_)
            | MutationError::DuplicateId(_)
            | MutationError::InvalidFormat(_) => {}
        }
        error
    }

    fn notify(&self, schedule: &Schedule) {
        for listener in &self.listeners {
            listener(schedule);
        }
    }

    fn save_per_policy(&self, schedule: &Schedule) -> SaveStatus {
        match self.save_policy {
            SavePolicy::EveryMutation => self.save(schedule),
            SavePolicy::OnCommit => SaveStatus::Deferred,
        }
    }

    fn save(&self, schedule: &Schedule) -> SaveStatus {
        match self.persistence.save_schedule(schedule) {
            Ok(()) if self.persistence.saves_in_background() => SaveStatus::Queued,
            Ok(()) => SaveStatus::Saved,
            Err(error) => {
                let message = error.to_string();
                self.log.error(
                    "save_schedule",
                    &format!(
                        "{message} (total {} minutes, first block {})",
                        schedule.total_sleep_minutes(),
                        schedule
                            .blocks
                            .first()
                            .map(|block| to_clock_string(block.start_minute() as i64))
                            .unwrap_or_else(|| "none".to_string())
                    ),
                );
                SaveStatus::Failed(message)
            }
        }
    }
}
