use crate::application::editing_session::EditingSession;
use crate::application::mutation_api::{FeedbackSink, MutationApi};
use crate::infrastructure::activity_log::ActivityLog;
use crate::infrastructure::background_save::{BackgroundSaver, RetryPolicy};
use crate::infrastructure::config::{ensure_default_configs, load_engine_config, EngineConfig};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::schedule_repository::SqliteScheduleRepository;
use crate::infrastructure::storage::initialize_database;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Handle;

#[derive(Debug)]
pub struct BootstrapResult {
    pub workspace_root: PathBuf,
    pub config_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub database_path: PathBuf,
    pub config: EngineConfig,
}

impl BootstrapResult {
    pub fn repository(&self) -> SqliteScheduleRepository {
        SqliteScheduleRepository::new(&self.database_path)
    }

    pub fn activity_log(&self) -> ActivityLog {
        ActivityLog::in_dir(&self.logs_dir)
    }

    pub fn open_session<F>(
        &self,
        feedback: Arc<F>,
    ) -> Result<EditingSession<SqliteScheduleRepository, F>, InfraError>
    where
        F: FeedbackSink,
    {
        let api = MutationApi::open(
            Arc::new(self.repository()),
            feedback,
            Arc::new(self.activity_log()),
            &self.config,
        )?;
        Ok(EditingSession::new(api, &self.config))
    }

    pub fn open_background_session<F>(
        &self,
        runtime: &Handle,
        feedback: Arc<F>,
        retry_policy: RetryPolicy,
    ) -> Result<
        (
            EditingSession<BackgroundSaver<SqliteScheduleRepository>, F>,
            Arc<BackgroundSaver<SqliteScheduleRepository>>,
        ),
        InfraError,
    >
    where
        F: FeedbackSink,
    {
        let saver = Arc::new(BackgroundSaver::spawn(
            runtime,
            Arc::new(self.repository()),
            retry_policy,
            Arc::new(self.activity_log()),
        ));
        let api = MutationApi::open(
            Arc::clone(&saver),
            feedback,
            Arc::new(self.activity_log()),
            &self.config,
        )?;
        Ok((EditingSession::new(api, &self.config), saver))
    }
}

pub fn bootstrap_workspace(workspace_root: &Path) -> Result<BootstrapResult, InfraError> {
    let config_dir = workspace_root.join("config");
    let state_dir = workspace_root.join("state");
    let logs_dir = workspace_root.join("logs");
    let database_path = state_dir.join("sleepwheel.sqlite");

    fs::create_dir_all(&config_dir)?;
    fs::create_dir_all(&state_dir)?;
    fs::create_dir_all(&logs_dir)?;

    ensure_default_configs(&config_dir)?;
    let config = load_engine_config(&config_dir)?;
    initialize_database(&database_path)?;

    ActivityLog::in_dir(&logs_dir).info(
        "bootstrap",
        &format!("workspace ready at {}", workspace_root.display()),
    );

    Ok(BootstrapResult {
        workspace_root: workspace_root.to_path_buf(),
        config_dir,
        logs_dir,
        database_path,
        config,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::mutation_api::{NoFeedback, SaveStatus};
    use crate::domain::models::BlockId;
    use crate::infrastructure::config::{write_engine_config, SavePolicy};
    use crate::infrastructure::schedule_repository::SchedulePersistence;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT_TEMP_WORKSPACE: AtomicUsize = AtomicUsize::new(0);

    struct TempWorkspace {
        path: PathBuf,
    }

    impl TempWorkspace {
        fn new() -> Self {
            let sequence = NEXT_TEMP_WORKSPACE.fetch_add(1, Ordering::Relaxed);
            let path = std::env::temp_dir().join(format!(
                "sleepwheel-bootstrap-tests-{}-{}",
                std::process::id(),
                sequence
            ));
            fs::create_dir_all(&path).expect("create temp workspace");
            Self { path }
        }
    }

    impl Drop for TempWorkspace {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.path);
        }
    }

    #[test]
    fn creates_directories_config_and_database() {
        let workspace = TempWorkspace::new();
        let result = bootstrap_workspace(&workspace.path).expect("bootstrap");

        assert!(result.config_dir.join("engine.json").exists());
        assert!(result.database_path.exists());
        assert!(result.logs_dir.join("activity.log").exists());
        assert_eq!(result.config, EngineConfig::default());
        assert!(
            result
                .repository()
                .load_schedule()
                .expect("load")
                .blocks
                .is_empty()
        );
    }

    #[test]
    fn keeps_existing_config() {
        let workspace = TempWorkspace::new();
        let config_dir = workspace.path.join("config");
        fs::create_dir_all(&config_dir).expect("config dir");
        let custom = EngineConfig {
            new_block_minutes: 30,
            save_policy: SavePolicy::OnCommit,
            ..EngineConfig::default()
        };
        write_engine_config(&config_dir, &custom).expect("write config");

        let result = bootstrap_workspace(&workspace.path).expect("bootstrap");
        assert_eq!(result.config, custom);
    }

    #[test]
    fn session_edits_survive_reopening() {
        let workspace = TempWorkspace::new();
        let result = bootstrap_workspace(&workspace.path).expect("bootstrap");

        let mut session = result.open_session(Arc::new(NoFeedback)).expect("open");
        let added = session
            .api_mut()
            .expect("idle")
            .add_block("23:00", 360)
            .expect("night");
        assert_eq!(added.save, SaveStatus::Saved);
        drop(session);

        let reopened = result.open_session(Arc::new(NoFeedback)).expect("reopen");
        let store = reopened.api().store();
        assert_eq!(store.len(), 1);
        assert_eq!(store.core_count(), 1);
        assert!(store.get(BlockId(1)).is_some());

        let log = fs::read_to_string(result.logs_dir.join("activity.log")).expect("log");
        assert!(log.contains("\"operation\":\"add_block\""));
    }

    #[tokio::test]
    async fn background_session_persists_after_flush() {
        let workspace = TempWorkspace::new();
        let result = bootstrap_workspace(&workspace.path).expect("bootstrap");

        let (mut session, saver) = result
            .open_background_session(&Handle::current(), Arc::new(NoFeedback), RetryPolicy::default())
            .expect("open");
        session
            .api_mut()
            .expect("idle")
            .add_block("23:00", 360)
            .expect("night");
        let nap = session
            .api_mut()
            .expect("idle")
            .add_block("14:00", 20)
            .expect("nap");
        assert_eq!(nap.save, SaveStatus::Queued);
        saver.flush().await.expect("flush");

        assert!(saver.failures().is_empty());
        let stored = result.repository().load_schedule().expect("load");
        assert_eq!(stored.total_sleep_minutes(), 380);
        assert_eq!(stored.id_watermark, 3);
    }
}
