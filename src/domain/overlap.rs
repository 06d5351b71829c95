use crate::domain::models::{BlockId, SleepBlock, TimeSpan};
use crate::domain::time_math::MINUTES_PER_DAY;

type Segment = (u32, u32);

pub fn overlaps(a_start: u32, a_end: u32, b_start: u32, b_end: u32) -> bool {
    let a = segments(a_start, a_end);
    let b = segments(b_start, b_end);
    a.iter()
        .flatten()
        .any(|left| b.iter().flatten().any(|right| segments_intersect(*left, *right)))
}

pub fn spans_overlap(a: &TimeSpan, b: &TimeSpan) -> bool {
    if a.is_full_day() || b.is_full_day() {
        return true;
    }
    overlaps(
        a.start_minute(),
        a.end_minute(),
        b.start_minute(),
        b.end_minute(),
    )
}

pub fn find_collision(
    blocks: &[SleepBlock],
    candidate: &TimeSpan,
    exclude: Option<BlockId>,
) -> Option<BlockId> {
    blocks
        .iter()
        .filter(|block| Some(block.id()) != exclude)
        .find(|block| spans_overlap(&block.span(), candidate))
        .map(SleepBlock::id)
}

pub fn has_collision(blocks: &[SleepBlock], candidate: &TimeSpan, exclude: Option<BlockId>) -> bool {
    find_collision(blocks, candidate, exclude).is_some()
}

// a wrapping interval splits into [start, 1440) and [0, end)
fn segments(start: u32, end: u32) -> [Option<Segment>; 2] {
    let start = start % MINUTES_PER_DAY;
    let end = end % MINUTES_PER_DAY;
    if start < end {
        [Some((start, end)), None]
    } else {
        let tail = (end > 0).then_some((0, end));
        [Some((start, MINUTES_PER_DAY)), tail]
    }
}

fn segments_intersect(a: Segment, b: Segment) -> bool {
    a.0 < b.1 && a.1 > b.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::time_math::to_minutes;
    use proptest::prelude::*;

    fn clock(value: &str) -> u32 {
        to_minutes(value).expect("valid clock")
    }

    fn overlaps_clock(a: (&str, &str), b: (&str, &str)) -> bool {
        overlaps(clock(a.0), clock(a.1), clock(b.0), clock(b.1))
    }

    fn block(id: u64, start: i64, duration: u32) -> SleepBlock {
        SleepBlock::new(BlockId(id), TimeSpan::new(start, duration).expect("valid span"))
    }

    #[test]
    fn neither_interval_wraps() {
        assert!(overlaps_clock(("10:00", "11:00"), ("10:30", "12:00")));
        assert!(!overlaps_clock(("10:00", "11:00"), ("11:00", "12:00")));
        assert!(!overlaps_clock(("10:00", "11:00"), ("12:00", "13:00")));
    }

    #[test]
    fn one_interval_wraps() {
        assert!(overlaps_clock(("23:00", "02:00"), ("01:00", "01:30")));
        assert!(overlaps_clock(("23:00", "02:00"), ("23:30", "23:45")));
        assert!(!overlaps_clock(("22:00", "23:00"), ("23:30", "00:30")));
        assert!(!overlaps_clock(("23:00", "02:00"), ("02:00", "03:00")));
        assert!(overlaps_clock(("01:00", "01:30"), ("23:00", "02:00")));
    }

    #[test]
    fn both_intervals_wrap() {
        // both contain the midnight boundary, so they always share minute 0
        assert!(overlaps_clock(("23:00", "00:30"), ("23:50", "01:00")));
        assert!(overlaps_clock(("22:00", "00:10"), ("00:00", "00:05")));
        assert!(overlaps_clock(("20:00", "00:00"), ("23:59", "00:00")));
    }

    #[test]
    fn interval_ending_at_midnight_has_no_tail() {
        assert!(!overlaps_clock(("22:00", "00:00"), ("00:00", "01:00")));
        assert!(overlaps_clock(("22:00", "00:00"), ("23:00", "01:00")));
    }

    #[test]
    fn full_day_span_overlaps_everything() {
        let full = TimeSpan::new(0, 1440).expect("full day");
        let nap = TimeSpan::new(600, 20).expect("nap");
        assert!(spans_overlap(&full, &nap));
        assert!(spans_overlap(&nap, &full));
    }

    #[test]
    fn collision_search_skips_excluded_block() {
        let blocks = vec![block(1, 1380, 360), block(2, 840, 20)];
        let candidate = TimeSpan::new(0, 60).expect("candidate");

        assert_eq!(find_collision(&blocks, &candidate, None), Some(BlockId(1)));
        assert!(!has_collision(&blocks, &candidate, Some(BlockId(1))));

        let free = TimeSpan::new(600, 60).expect("free slot");
        assert!(!has_collision(&blocks, &free, None));
    }

    fn span_strategy() -> impl Strategy<Value = (u32, u32)> {
        (0u32..MINUTES_PER_DAY, 1u32..MINUTES_PER_DAY)
            .prop_map(|(start, duration)| (start, (start + duration) % MINUTES_PER_DAY))
    }

    proptest! {
        #[test]
        fn overlap_is_symmetric(a in span_strategy(), b in span_strategy()) {
            prop_assert_eq!(overlaps(a.0, a.1, b.0, b.1), overlaps(b.0, b.1, a.0, a.1));
        }

        #[test]
        fn overlap_matches_minute_by_minute_membership(
            a_start in 0u32..MINUTES_PER_DAY,
            a_duration in 15u32..MINUTES_PER_DAY,
            b_start in 0u32..MINUTES_PER_DAY,
            b_duration in 15u32..MINUTES_PER_DAY,
        ) {
            let a = TimeSpan::new(a_start as i64, a_duration).expect("span a");
            let b = TimeSpan::new(b_start as i64, b_duration).expect("span b");
            let brute_force = (0..MINUTES_PER_DAY)
                .any(|minute| a.contains_minute(minute) && b.contains_minute(minute));
            prop_assert_eq!(spans_overlap(&a, &b), brute_force);
        }
    }
}
