use crate::application::drag_machine::{
    DragInteractionMachine, DragOutcome, DragUpdate, GestureError,
};
use crate::application::mutation_api::{
    FeedbackSink, MutationApi, MutationResult, SaveStatus,
};
use crate::domain::error::MutationError;
use crate::domain::models::{BlockEdge, BlockId, Schedule};
use crate::domain::time_math::Point;
use crate::infrastructure::config::EngineConfig;
use crate::infrastructure::schedule_repository::SchedulePersistence;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadStatus {
    Applied,
    Deferred,
}

#[derive(Debug)]
pub struct GestureEnd {
    pub outcome: DragOutcome,
    pub result: Option<MutationResult>,
    pub reloaded: bool,
}

pub struct EditingSession<P, F>
where
    P: SchedulePersistence,
    F: FeedbackSink,
{
    api: MutationApi<P, F>,
    machine: DragInteractionMachine,
    opened_with: Schedule,
    pending_reload: Option<Schedule>,
    new_block_minutes: u32,
}

impl<P, F> EditingSession<P, F>
where
    P: SchedulePersistence,
    F: FeedbackSink,
{
    pub fn new(api: MutationApi<P, F>, config: &EngineConfig) -> Self {
        let opened_with = api.schedule();
        Self {
            api,
            machine: DragInteractionMachine::new(config.gesture.clone()),
            opened_with,
            pending_reload: None,
            new_block_minutes: config.new_block_minutes,
        }
    }

    pub fn api(&self) -> &MutationApi<P, F> {
        &self.api
    }

    pub fn api_mut(&mut self) -> Option<&mut MutationApi<P, F>> {
        if self.machine.is_active() {
            return None;
        }
        Some(&mut self.api)
    }

    pub fn machine(&self) -> &DragInteractionMachine {
        &self.machine
    }

    pub fn is_dragging(&self) -> bool {
        self.machine.is_active()
    }

    pub fn has_pending_reload(&self) -> bool {
        self.pending_reload.is_some()
    }

    pub fn begin_move(&mut self, id: BlockId, pointer: Point) -> Result<DragUpdate, GestureError> {
        let update = self.machine.begin_move(self.api.store(), id, pointer)?;
        Ok(self.forward(update))
    }

    pub fn begin_resize(
        &mut self,
        id: BlockId,
        edge: BlockEdge,
        pointer: Point,
    ) -> Result<DragUpdate, GestureError> {
        let update = self
            .machine
            .begin_resize(self.api.store(), id, edge, pointer)?;
        Ok(self.forward(update))
    }

    pub fn begin_create(&mut self, pointer: Point) -> Result<DragUpdate, GestureError> {
        let update = self
            .machine
            .begin_create(self.api.store(), self.new_block_minutes, pointer)?;
        Ok(self.forward(update))
    }

    pub fn drag_to(&mut self, pointer: Point) -> Option<DragUpdate> {
        let update = self.machine.on_move(self.api.store(), pointer)?;
        Some(self.forward(update))
    }

    pub fn end_drag(&mut self) -> Option<GestureEnd> {
        let phase = self.machine.phase();
        let outcome = self.machine.on_end()?;
        let result = match outcome {
            DragOutcome::Insert(span) => Some(
                self.api
                    .add_block_at(span.start_minute() as i64, span.duration_minutes()),
            ),
            DragOutcome::Update { id, span } => Some(self.api.edit_block_at(
                id,
                span.start_minute() as i64,
                span.duration_minutes(),
            )),
            DragOutcome::Delete(id) => Some(self.api.delete_block(id)),
            DragOutcome::Discard => None,
        };
        self.api
            .log()
            .info(
                "end_drag",
                &format!("released from {} with {outcome:?}", phase.as_str()),
            );
        let reloaded = self.apply_pending_reload();
        Some(GestureEnd {
            outcome,
            result,
            reloaded,
        })
    }

    pub fn cancel_drag(&mut self) -> bool {
        if !self.machine.cancel() {
            return false;
        }
        self.api.log().info("cancel_drag", "gesture cancelled");
        self.apply_pending_reload();
        true
    }

    pub fn reload(&mut self, schedule: Schedule) -> Result<ReloadStatus, MutationError> {
        if self.machine.is_active() {
            self.api.log().info(
                "reload",
                &format!(
                    "deferred reload of {} blocks until gesture ends",
                    schedule.blocks.len()
                ),
            );
            self.pending_reload = Some(schedule);
            return Ok(ReloadStatus::Deferred);
        }
        self.api.reload(schedule)?;
        Ok(ReloadStatus::Applied)
    }

    pub fn commit(&mut self) -> SaveStatus {
        self.cancel_drag();
        let status = self.api.save_now();
        self.opened_with = self.api.schedule();
        self.api
            .log()
            .info("commit", &format!("session committed: {status:?}"));
        status
    }

    pub fn cancel(&mut self) -> MutationResult {
        if self.machine.cancel() {
            self.api.log().info("cancel_drag", "gesture cancelled");
        }
        let result = self.api.restore(self.opened_with.clone());
        self.apply_pending_reload();
        result
    }

    pub fn into_api(self) -> MutationApi<P, F> {
        self.api
    }

    fn forward(&self, update: DragUpdate) -> DragUpdate {
        if let Some(kind) = update.feedback {
            self.api.emit_feedback(kind);
        }
        update
    }

    fn apply_pending_reload(&mut self) -> bool {
        let Some(schedule) = self.pending_reload.take() else {
            return false;
        };
        match self.api.reload(schedule) {
            Ok(_) => true,
            Err(error) => {
                self.api.log().error(
                    "reload",
                    &format!("deferred reload rejected ({}): {error}", error.reason()),
                );
                false
            }
        }
    }
}
