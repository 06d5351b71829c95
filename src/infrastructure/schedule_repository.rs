use crate::domain::models::{BlockId, Schedule, SleepBlock, TimeSpan};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::storage::apply_schema;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub trait SchedulePersistence: Send + Sync {
    fn load_schedule(&self) -> Result<Schedule, InfraError>;
    fn save_schedule(&self, schedule: &Schedule) -> Result<(), InfraError>;

    // true when a successful save_schedule only means the write was queued
    fn saves_in_background(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone)]
pub struct SqliteScheduleRepository {
    db_path: PathBuf,
}

impl SqliteScheduleRepository {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    fn connect(&self) -> Result<Connection, InfraError> {
        let connection = Connection::open(&self.db_path)?;
        apply_schema(&connection)?;
        Ok(connection)
    }
}

impl SchedulePersistence for SqliteScheduleRepository {
    fn load_schedule(&self) -> Result<Schedule, InfraError> {
        let connection = self.connect()?;
        let mut statement = connection.prepare(
            "SELECT id, start_minute, duration_minutes FROM sleep_blocks ORDER BY start_minute",
        )?;
        let rows = statement
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let blocks = rows
            .into_iter()
            .map(|(id, start, duration)| decode_block(id, start, duration))
            .collect::<Result<Vec<_>, _>>()?;

        let id_watermark: Option<i64> = connection
            .query_row(
                "SELECT id_watermark FROM schedule_meta WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        Ok(Schedule {
            blocks,
            id_watermark: id_watermark.unwrap_or(0).max(0) as u64,
        })
    }

    fn save_schedule(&self, schedule: &Schedule) -> Result<(), InfraError> {
        let mut connection = self.connect()?;
        let transaction = connection.transaction()?;
        transaction.execute("DELETE FROM sleep_blocks", [])?;
        for block in &schedule.blocks {
            transaction.execute(
                "INSERT INTO sleep_blocks (id, start_minute, duration_minutes) VALUES (?1, ?2, ?3)",
                params![
                    block.id().0 as i64,
                    block.start_minute() as i64,
                    block.duration_minutes() as i64
                ],
            )?;
        }
        transaction.execute(
            "INSERT INTO schedule_meta (id, id_watermark, saved_at)
             VALUES (1, ?1, ?2)
             ON CONFLICT(id) DO UPDATE SET
               id_watermark = excluded.id_watermark,
               saved_at = excluded.saved_at",
            params![schedule.id_watermark as i64, Utc::now().to_rfc3339()],
        )?;
        transaction.commit()?;
        Ok(())
    }
}

fn decode_block(id: i64, start: i64, duration: i64) -> Result<SleepBlock, InfraError> {
    let (Ok(id), Ok(start), Ok(duration)) =
        (u64::try_from(id), u32::try_from(start), u32::try_from(duration))
    else {
        return Err(InfraError::InvalidData(format!(
            "sleep_blocks row out of range: id={id} start={start} duration={duration}"
        )));
    };
    let span = TimeSpan::new(start as i64, duration).map_err(|error| {
        InfraError::InvalidData(format!("sleep_blocks row id={id}: {error}"))
    })?;
    Ok(SleepBlock::new(BlockId(id), span))
}

#[derive(Debug, Default)]
pub struct InMemoryScheduleRepository {
    schedule: Mutex<Option<Schedule>>,
}

impl InMemoryScheduleRepository {
    pub fn with_schedule(schedule: Schedule) -> Self {
        Self {
            schedule: Mutex::new(Some(schedule)),
        }
    }

    pub fn stored(&self) -> Option<Schedule> {
        self.schedule.lock().ok().and_then(|schedule| schedule.clone())
    }
}

impl SchedulePersistence for InMemoryScheduleRepository {
    fn load_schedule(&self) -> Result<Schedule, InfraError> {
        let schedule = self
            .schedule
            .lock()
            .map_err(|error| InfraError::InvalidData(format!("schedule lock poisoned: {error}")))?;
        Ok(schedule.clone().unwrap_or_default())
    }

    fn save_schedule(&self, schedule: &Schedule) -> Result<(), InfraError> {
        let mut stored = self
            .schedule
            .lock()
            .map_err(|error| InfraError::InvalidData(format!("schedule lock poisoned: {error}")))?;
        *stored = Some(schedule.clone());
        Ok(())
    }
}
