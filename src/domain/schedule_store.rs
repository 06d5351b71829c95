use crate::domain::error::{MutationError, ValidationError};
use crate::domain::models::{BlockEdge, BlockId, Schedule, SleepBlock, TimeSpan};
use crate::domain::overlap::find_collision;
use crate::domain::time_math::{forward_distance, normalize_minutes, MINUTES_PER_DAY};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("sleep block not found: {0}")]
    NotFound(BlockId),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

impl From<StoreError> for MutationError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::Invalid(error) => error.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScheduleStore {
    blocks: Vec<SleepBlock>,
    next_id: u64,
}

impl ScheduleStore {
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            next_id: 1,
        }
    }

    pub fn from_schedule(schedule: Schedule) -> Result<Self, ValidationError> {
        let mut blocks = schedule.blocks;
        let mut seen = HashSet::with_capacity(blocks.len());
        if let Some(block) = blocks.iter().find(|block| !seen.insert(block.id())) {
            return Err(ValidationError::DuplicateId { id: block.id() });
        }
        blocks.sort_by_key(SleepBlock::start_minute);
        for (index, block) in blocks.iter().enumerate() {
            if let Some(with) = find_collision(&blocks[index + 1..], &block.span(), None) {
                return Err(ValidationError::Collision { with });
            }
        }
        let max_id = blocks.iter().map(|block| block.id().0).max().unwrap_or(0);
        Ok(Self {
            blocks,
            next_id: schedule.id_watermark.max(max_id + 1),
        })
    }

    pub fn snapshot(&self) -> Schedule {
        Schedule {
            blocks: self.blocks.clone(),
            id_watermark: self.next_id,
        }
    }

    pub fn blocks(&self) -> &[SleepBlock] {
        &self.blocks
    }

    pub fn get(&self, id: BlockId) -> Option<&SleepBlock> {
        self.blocks.iter().find(|block| block.id() == id)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn validate(
        &self,
        start_minute: i64,
        duration_minutes: u32,
        exclude: Option<BlockId>,
    ) -> Result<TimeSpan, ValidationError> {
        let span = TimeSpan::new(start_minute, duration_minutes)?;
        if let Some(with) = find_collision(&self.blocks, &span, exclude) {
            return Err(ValidationError::Collision { with });
        }
        Ok(span)
    }

    pub fn insert(
        &mut self,
        start_minute: i64,
        duration_minutes: u32,
    ) -> Result<BlockId, ValidationError> {
        let span = self.validate(start_minute, duration_minutes, None)?;
        let id = BlockId(self.next_id);
        self.next_id += 1;
        self.blocks.push(SleepBlock::new(id, span));
        self.sort();
        Ok(id)
    }

    pub fn update(
        &mut self,
        id: BlockId,
        start_minute: i64,
        duration_minutes: u32,
    ) -> Result<&SleepBlock, StoreError> {
        let index = self.index_of(id).ok_or(StoreError::NotFound(id))?;
        let span = self.validate(start_minute, duration_minutes, Some(id))?;
        self.blocks[index] = SleepBlock::new(id, span);
        self.sort();
        self.get(id).ok_or(StoreError::NotFound(id))
    }

    pub fn resize(
        &mut self,
        id: BlockId,
        edge: BlockEdge,
        minute: u32,
    ) -> Result<&SleepBlock, StoreError> {
        let block = self.get(id).ok_or(StoreError::NotFound(id))?;
        let (start, duration) = resized_span(block.span(), edge, minute);
        self.update(id, start as i64, duration)
    }

    pub fn remove(&mut self, id: BlockId) -> Option<SleepBlock> {
        let index = self.index_of(id)?;
        Some(self.blocks.remove(index))
    }

    pub fn replace(&mut self, schedule: Schedule) -> Result<(), ValidationError> {
        let mut replacement = Self::from_schedule(schedule)?;
        replacement.next_id = replacement.next_id.max(self.next_id);
        *self = replacement;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    pub fn total_sleep_minutes(&self) -> u32 {
        self.blocks.iter().map(SleepBlock::duration_minutes).sum()
    }

    pub fn core_minutes(&self) -> u32 {
        self.blocks
            .iter()
            .filter(|block| block.is_core())
            .map(SleepBlock::duration_minutes)
            .sum()
    }

    pub fn nap_minutes(&self) -> u32 {
        self.total_sleep_minutes() - self.core_minutes()
    }

    pub fn core_count(&self) -> usize {
        self.blocks.iter().filter(|block| block.is_core()).count()
    }

    pub fn nap_count(&self) -> usize {
        self.blocks.len() - self.core_count()
    }

    pub fn block_at(&self, minute: u32) -> Option<&SleepBlock> {
        let minute = minute % MINUTES_PER_DAY;
        self.blocks
            .iter()
            .find(|block| block.span().contains_minute(minute))
    }

    pub fn next_block_after(&self, minute: u32) -> Option<&SleepBlock> {
        self.blocks
            .iter()
            .min_by_key(|block| forward_distance(minute % MINUTES_PER_DAY, block.start_minute()))
    }

    pub fn awake_windows(&self) -> Vec<(u32, u32)> {
        if self.blocks.is_empty() {
            return vec![(0, MINUTES_PER_DAY)];
        }
        let count = self.blocks.len();
        self.blocks
            .iter()
            .enumerate()
            .filter_map(|(index, block)| {
                let next = &self.blocks[(index + 1) % count];
                let gap = forward_distance(block.end_minute(), next.start_minute());
                let gap = if count == 1 {
                    MINUTES_PER_DAY - block.duration_minutes()
                } else {
                    gap
                };
                (gap > 0).then_some((block.end_minute(), gap))
            })
            .collect()
    }

    fn index_of(&self, id: BlockId) -> Option<usize> {
        self.blocks.iter().position(|block| block.id() == id)
    }

    fn sort(&mut self) {
        self.blocks.sort_by_key(SleepBlock::start_minute);
    }
}

impl Default for ScheduleStore {
    fn default() -> Self {
        Self::new()
    }
}

pub fn resized_span(span: TimeSpan, edge: BlockEdge, minute: u32) -> (u32, u32) {
    let minute = normalize_minutes(minute as i64);
    let duration = span.duration_minutes() as i64;
    let resized = match edge {
        BlockEdge::Start => duration - edge_shift(span.start_minute(), minute),
        BlockEdge::End => duration + edge_shift(span.end_minute(), minute),
    };
    let start = match edge {
        BlockEdge::Start => minute,
        BlockEdge::End => span.start_minute(),
    };
    (start, resized.clamp(0, u32::MAX as i64) as u32)
}

// shortest signed move around the dial, within half a day either way
fn edge_shift(from: u32, to: u32) -> i64 {
    let forward = forward_distance(from, to) as i64;
    if forward > (MINUTES_PER_DAY / 2) as i64 {
        forward - MINUTES_PER_DAY as i64
    } else {
        forward
    }
}
