use crate::domain::error::ValidationError;
use crate::domain::time_math::{end_minute, normalize_minutes, to_clock_string, MINUTES_PER_DAY};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MIN_BLOCK_MINUTES: u32 = 15;
pub const CORE_THRESHOLD_MINUTES: u32 = 45;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub u64);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blk-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockEdge {
    Start,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeedbackKind {
    TooShort,
    Collision,
    Success,
    Resizing,
}

impl FeedbackKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TooShort => "tooShort",
            Self::Collision => "collision",
            Self::Success => "success",
            Self::Resizing => "resizing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeSpan {
    start_minute: u32,
    duration_minutes: u32,
}

impl TimeSpan {
    pub fn new(start_minute: i64, duration_minutes: u32) -> Result<Self, ValidationError> {
        if duration_minutes < MIN_BLOCK_MINUTES {
            return Err(ValidationError::TooShort {
                duration: duration_minutes,
            });
        }
        if duration_minutes > MINUTES_PER_DAY {
            return Err(ValidationError::TooLong {
                duration: duration_minutes,
            });
        }
        let start_minute = if duration_minutes == MINUTES_PER_DAY {
            0
        } else {
            normalize_minutes(start_minute)
        };
        Ok(Self {
            start_minute,
            duration_minutes,
        })
    }

    pub fn start_minute(&self) -> u32 {
        self.start_minute
    }

    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    pub fn end_minute(&self) -> u32 {
        end_minute(self.start_minute, self.duration_minutes)
    }

    pub fn is_full_day(&self) -> bool {
        self.duration_minutes == MINUTES_PER_DAY
    }

    pub fn crosses_midnight(&self) -> bool {
        !self.is_full_day() && self.start_minute + self.duration_minutes > MINUTES_PER_DAY
    }

    pub fn contains_minute(&self, minute: u32) -> bool {
        let offset = normalize_minutes(minute as i64 - self.start_minute as i64);
        offset < self.duration_minutes
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SleepBlockRecord", into = "SleepBlockRecord")]
pub struct SleepBlock {
    id: BlockId,
    span: TimeSpan,
    is_core: bool,
}

impl SleepBlock {
    pub fn new(id: BlockId, span: TimeSpan) -> Self {
        Self {
            id,
            span,
            is_core: span.duration_minutes() > CORE_THRESHOLD_MINUTES,
        }
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn span(&self) -> TimeSpan {
        self.span
    }

    pub fn start_minute(&self) -> u32 {
        self.span.start_minute()
    }

    pub fn duration_minutes(&self) -> u32 {
        self.span.duration_minutes()
    }

    pub fn end_minute(&self) -> u32 {
        self.span.end_minute()
    }

    pub fn is_core(&self) -> bool {
        self.is_core
    }

    pub fn is_nap(&self) -> bool {
        !self.is_core
    }

    pub fn start_clock(&self) -> String {
        to_clock_string(self.start_minute() as i64)
    }

    pub fn end_clock(&self) -> String {
        to_clock_string(self.end_minute() as i64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SleepBlockRecord {
    id: BlockId,
    start_minute: u32,
    duration_minutes: u32,
    #[serde(default)]
    is_core: bool,
}

impl TryFrom<SleepBlockRecord> for SleepBlock {
    type Error = String;

    fn try_from(record: SleepBlockRecord) -> Result<Self, Self::Error> {
        if record.start_minute >= MINUTES_PER_DAY {
            return Err(format!(
                "block.start_minute must be < {MINUTES_PER_DAY}, got {}",
                record.start_minute
            ));
        }
        let span = TimeSpan::new(record.start_minute as i64, record.duration_minutes)
            .map_err(|error| format!("block {}: {error}", record.id))?;
        // is_core is derived, the stored flag is ignored
        Ok(Self::new(record.id, span))
    }
}

impl From<SleepBlock> for SleepBlockRecord {
    fn from(block: SleepBlock) -> Self {
        Self {
            id: block.id,
            start_minute: block.start_minute(),
            duration_minutes: block.duration_minutes(),
            is_core: block.is_core,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub blocks: Vec<SleepBlock>,
    #[serde(default)]
    pub id_watermark: u64,
}

impl Schedule {
    pub fn total_sleep_minutes(&self) -> u32 {
        self.blocks.iter().map(SleepBlock::duration_minutes).sum()
    }

    pub fn find(&self, id: BlockId) -> Option<&SleepBlock> {
        self.blocks.iter().find(|block| block.id() == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: i64, duration: u32) -> TimeSpan {
        TimeSpan::new(start, duration).expect("valid span")
    }

    #[test]
    fn span_rejects_short_and_overlong_durations() {
        assert_eq!(
            TimeSpan::new(0, 14),
            Err(ValidationError::TooShort { duration: 14 })
        );
        assert_eq!(
            TimeSpan::new(0, 1441),
            Err(ValidationError::TooLong { duration: 1441 })
        );
        assert!(TimeSpan::new(0, 15).is_ok());
    }

    #[test]
    fn span_normalizes_start_and_full_day() {
        assert_eq!(span(1500, 30).start_minute(), 60);
        assert_eq!(span(-60, 30).start_minute(), 1380);
        let full = span(600, 1440);
        assert_eq!(full.start_minute(), 0);
        assert!(full.is_full_day());
        assert!(!full.crosses_midnight());
    }

    #[test]
    fn span_detects_midnight_crossing_and_membership() {
        let night = span(1380, 360);
        assert!(night.crosses_midnight());
        assert_eq!(night.end_minute(), 300);
        assert!(night.contains_minute(1439));
        assert!(night.contains_minute(0));
        assert!(night.contains_minute(299));
        assert!(!night.contains_minute(300));
        assert!(!night.contains_minute(1379));
    }

    #[test]
    fn classification_threshold_is_strictly_above_45_minutes() {
        let nap = SleepBlock::new(BlockId(1), span(600, 45));
        let core = SleepBlock::new(BlockId(2), span(600, 46));
        assert!(nap.is_nap());
        assert!(!nap.is_core());
        assert!(core.is_core());
    }

    #[test]
    fn block_formats_clock_edges() {
        let block = SleepBlock::new(BlockId(7), span(1380, 360));
        assert_eq!(block.start_clock(), "23:00");
        assert_eq!(block.end_clock(), "05:00");
        assert_eq!(block.id().to_string(), "blk-7");
    }

    #[test]
    fn block_serde_recomputes_core_flag() {
        let raw = r#"{"id":3,"startMinute":600,"durationMinutes":20,"isCore":true}"#;
        let block: SleepBlock = serde_json::from_str(raw).expect("deserialize block");
        assert!(block.is_nap());

        let invalid = r#"{"id":3,"startMinute":1440,"durationMinutes":20}"#;
        assert!(serde_json::from_str::<SleepBlock>(invalid).is_err());
        let too_short = r#"{"id":3,"startMinute":10,"durationMinutes":5}"#;
        assert!(serde_json::from_str::<SleepBlock>(too_short).is_err());
    }

    #[test]
    fn schedule_supports_serde_roundtrip() {
        let schedule = Schedule {
            blocks: vec![
                SleepBlock::new(BlockId(1), span(1380, 360)),
                SleepBlock::new(BlockId(2), span(840, 20)),
            ],
            id_watermark: 3,
        };
        let encoded = serde_json::to_string(&schedule).expect("serialize schedule");
        let decoded: Schedule = serde_json::from_str(&encoded).expect("deserialize schedule");
        assert_eq!(decoded, schedule);
        assert_eq!(decoded.total_sleep_minutes(), 380);
        assert!(decoded.find(BlockId(2)).is_some());
    }
}
