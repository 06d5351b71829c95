use crate::domain::error::ValidationError;
use crate::domain::models::{BlockEdge, BlockId, FeedbackKind, TimeSpan};
use crate::domain::schedule_store::{resized_span, ScheduleStore};
use crate::domain::time_math::{
    angle_to_minutes, distance, minutes_to_angle, pointer_angle, snap_angle_to_grid, Point,
};
use crate::infrastructure::config::GestureSettings;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    Move,
    ResizeStart,
    ResizeEnd,
    CreateNew,
}

impl DragMode {
    fn resize_edge(self) -> Option<BlockEdge> {
        match self {
            Self::ResizeStart => Some(BlockEdge::Start),
            Self::ResizeEnd => Some(BlockEdge::End),
            Self::Move | Self::CreateNew => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    Inside,
    Floating,
    Trash,
    Resizing,
}

impl DragPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Inside => "inside",
            Self::Floating => "floating",
            Self::Trash => "trash",
            Self::Resizing => "resizing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GestureError {
    #[error("a gesture is already in progress")]
    AlreadyActive,
    #[error("sleep block not found: {0}")]
    UnknownBlock(BlockId),
    #[error("new block duration of {0} minutes is invalid")]
    InvalidDuration(u32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragUpdate {
    pub phase: DragPhase,
    pub preview: Option<TimeSpan>,
    pub floating_at: Option<Point>,
    pub feedback: Option<FeedbackKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOutcome {
    Insert(TimeSpan),
    Update { id: BlockId, span: TimeSpan },
    Delete(BlockId),
    Discard,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub block_id: Option<BlockId>,
    pub mode: DragMode,
    pub is_floating: bool,
    pub is_in_trash_zone: bool,
    phase: DragPhase,
    original: Option<TimeSpan>,
    duration_minutes: u32,
    grab_offset_degrees: f64,
    candidate: Option<TimeSpan>,
    candidate_valid: bool,
    rejection: Option<FeedbackKind>,
    pointer: Point,
}

impl DragSession {
    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    fn update(&self, feedback: Option<FeedbackKind>) -> DragUpdate {
        let detached = matches!(self.phase, DragPhase::Floating | DragPhase::Trash);
        DragUpdate {
            phase: self.phase,
            preview: if detached { None } else { self.candidate },
            floating_at: detached.then_some(self.pointer),
            feedback,
        }
    }

    fn set_phase(&mut self, phase: DragPhase) {
        self.phase = phase;
        self.is_floating = matches!(phase, DragPhase::Floating | DragPhase::Trash);
        self.is_in_trash_zone = phase == DragPhase::Trash;
    }

    fn apply_candidate(
        &mut self,
        result: Result<TimeSpan, ValidationError>,
    ) -> Option<FeedbackKind> {
        match result {
            Ok(span) => {
                let changed = self.candidate != Some(span);
                self.candidate = Some(span);
                self.candidate_valid = true;
                self.rejection = None;
                (changed && self.mode.resize_edge().is_some()).then_some(FeedbackKind::Resizing)
            }
            Err(error) => {
                let kind = match error {
                    ValidationError::TooShort { .. } | ValidationError::TooLong { .. } => {
                        FeedbackKind::TooShort
                    }
                    ValidationError::Collision { .. } | ValidationError::DuplicateId { .. } => {
                        FeedbackKind::Collision
                    }
                };
                self.candidate_valid = false;
                let fresh = self.rejection != Some(kind);
                self.rejection = Some(kind);
                fresh.then_some(kind)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct DragInteractionMachine {
    settings: GestureSettings,
    session: Option<DragSession>,
}

impl DragInteractionMachine {
    pub fn new(settings: GestureSettings) -> Self {
        Self {
            settings,
            session: None,
        }
    }

    pub fn settings(&self) -> &GestureSettings {
        &self.settings
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn phase(&self) -> DragPhase {
        self.session
            .as_ref()
            .map(DragSession::phase)
            .unwrap_or(DragPhase::Idle)
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn begin_move(
        &mut self,
        store: &ScheduleStore,
        id: BlockId,
        pointer: Point,
    ) -> Result<DragUpdate, GestureError> {
        self.ensure_idle()?;
        let span = store
            .get(id)
            .map(|block| block.span())
            .ok_or(GestureError::UnknownBlock(id))?;
        let grab_angle = pointer_angle(self.settings.chart_center, pointer);
        let session = DragSession {
            block_id: Some(id),
            mode: DragMode::Move,
            is_floating: false,
            is_in_trash_zone: false,
            phase: DragPhase::Inside,
            original: Some(span),
            duration_minutes: span.duration_minutes(),
            grab_offset_degrees: grab_angle - minutes_to_angle(span.start_minute()),
            candidate: Some(span),
            candidate_valid: true,
            rejection: None,
            pointer,
        };
        let update = session.update(None);
        self.session = Some(session);
        Ok(update)
    }

    pub fn begin_resize(
        &mut self,
        store: &ScheduleStore,
        id: BlockId,
        edge: BlockEdge,
        pointer: Point,
    ) -> Result<DragUpdate, GestureError> {
        self.ensure_idle()?;
        let span = store
            .get(id)
            .map(|block| block.span())
            .ok_or(GestureError::UnknownBlock(id))?;
        let session = DragSession {
            block_id: Some(id),
            mode: match edge {
                BlockEdge::Start => DragMode::ResizeStart,
                BlockEdge::End => DragMode::ResizeEnd,
            },
            is_floating: false,
            is_in_trash_zone: false,
            phase: DragPhase::Resizing,
            original: Some(span),
            duration_minutes: span.duration_minutes(),
            grab_offset_degrees: 0.0,
            candidate: Some(span),
            candidate_valid: true,
            rejection: None,
            pointer,
        };
        let update = session.update(Some(FeedbackKind::Resizing));
        self.session = Some(session);
        Ok(update)
    }

    pub fn begin_create(
        &mut self,
        store: &ScheduleStore,
        duration_minutes: u32,
        pointer: Point,
    ) -> Result<DragUpdate, GestureError> {
        self.ensure_idle()?;
        TimeSpan::new(0, duration_minutes)
            .map_err(|_| GestureError::InvalidDuration(duration_minutes))?;
        let mut session = DragSession {
            block_id: None,
            mode: DragMode::CreateNew,
            is_floating: true,
            is_in_trash_zone: false,
            phase: DragPhase::Floating,
            original: None,
            duration_minutes,
            grab_offset_degrees: minutes_to_angle(duration_minutes / 2),
            candidate: None,
            candidate_valid: false,
            rejection: None,
            pointer,
        };
        let update = self.evaluate(&mut session, store, pointer);
        self.session = Some(session);
        Ok(update)
    }

    pub fn on_move(&mut self, store: &ScheduleStore, pointer: Point) -> Option<DragUpdate> {
        let mut session = self.session.take()?;
        let update = self.evaluate(&mut session, store, pointer);
        self.session = Some(session);
        Some(update)
    }

    pub fn on_end(&mut self) -> Option<DragOutcome> {
        let session = self.session.take()?;
        let outcome = match (session.phase, session.mode, session.block_id) {
            (DragPhase::Trash, DragMode::Move, Some(id)) => DragOutcome::Delete(id),
            (DragPhase::Trash, _, _) => DragOutcome::Discard,
            _ if !session.candidate_valid => DragOutcome::Discard,
            (_, DragMode::CreateNew, _) => session
                .candidate
                .map(DragOutcome::Insert)
                .unwrap_or(DragOutcome::Discard),
            (_, _, Some(id)) => match session.candidate {
                Some(span) if Some(span) != session.original => DragOutcome::Update { id, span },
                _ => DragOutcome::Discard,
            },
            (_, _, None) => DragOutcome::Discard,
        };
        Some(outcome)
    }

    pub fn cancel(&mut self) -> bool {
        self.session.take().is_some()
    }

    fn ensure_idle(&self) -> Result<(), GestureError> {
        if self.session.is_some() {
            return Err(GestureError::AlreadyActive);
        }
        Ok(())
    }

    fn snapped_minute(&self, angle: f64) -> u32 {
        angle_to_minutes(snap_angle_to_grid(angle, self.settings.snap_grid_minutes))
    }

    fn evaluate(
        &self,
        session: &mut DragSession,
        store: &ScheduleStore,
        pointer: Point,
    ) -> DragUpdate {
        session.pointer = pointer;
        match session.mode.resize_edge() {
            Some(edge) => self.evaluate_resize(session, store, edge, pointer),
            None => self.evaluate_move(session, store, pointer),
        }
    }

    fn evaluate_resize(
        &self,
        session: &mut DragSession,
        store: &ScheduleStore,
        edge: BlockEdge,
        pointer: Point,
    ) -> DragUpdate {
        let Some(original) = session.original else {
            return session.update(None);
        };
        let minute = self.snapped_minute(pointer_angle(self.settings.chart_center, pointer));
        let (start, duration) = resized_span(original, edge, minute);
        let result = store.validate(start as i64, duration, session.block_id);
        let feedback = session.apply_candidate(result);
        session.update(feedback)
    }

    fn evaluate_move(
        &self,
        session: &mut DragSession,
        store: &ScheduleStore,
        pointer: Point,
    ) -> DragUpdate {
        let settings = &self.settings;
        let center_distance = distance(settings.chart_center, pointer);
        let detached = match session.phase {
            DragPhase::Floating | DragPhase::Trash => center_distance >= settings.enter_radius(),
            _ => center_distance > settings.exit_radius(),
        };

        if detached {
            let in_trash = distance(settings.trash_anchor, pointer) < settings.trash_radius;
            session.set_phase(if in_trash {
                DragPhase::Trash
            } else {
                DragPhase::Floating
            });
            return session.update(None);
        }

        session.set_phase(DragPhase::Inside);
        let angle = pointer_angle(settings.chart_center, pointer) - session.grab_offset_degrees;
        let start = self.snapped_minute(angle);
        let result = store.validate(start as i64, session.duration_minutes, session.block_id);
        let feedback = session.apply_candidate(result);
        session.update(feedback)
    }
}
