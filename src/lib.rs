pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::bootstrap::{bootstrap_workspace, BootstrapResult};
pub use application::drag_machine::{
    DragInteractionMachine, DragMode, DragOutcome, DragPhase, DragUpdate, GestureError,
};
pub use application::editing_session::{EditingSession, GestureEnd, ReloadStatus};
pub use application::mutation_api::{
    FeedbackEvent, FeedbackSink, MutationApi, MutationResult, MutationSuccess, SaveStatus,
};
pub use domain::error::{FormatError, MutationError, ValidationError};
pub use domain::models::{BlockEdge, BlockId, FeedbackKind, Schedule, SleepBlock, TimeSpan};
pub use domain::presets::Preset;
pub use domain::schedule_store::ScheduleStore;
pub use domain::time_math::Point;
pub use infrastructure::config::{EngineConfig, SavePolicy};
pub use infrastructure::error::InfraError;
