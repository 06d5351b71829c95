use crate::domain::error::FormatError;
use serde::{Deserialize, Serialize};

pub const MINUTES_PER_DAY: u32 = 1440;
pub const DEGREES_PER_MINUTE: f64 = 360.0 / MINUTES_PER_DAY as f64;
pub const DEFAULT_SNAP_GRID_MINUTES: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

pub fn to_minutes(value: &str) -> Result<u32, FormatError> {
    let mut split = value.trim().split(':');
    let (Some(hour_str), Some(minute_str), None) = (split.next(), split.next(), split.next())
    else {
        return Err(FormatError::new(value));
    };
    if !is_clock_field(hour_str, 1) || !is_clock_field(minute_str, 2) {
        return Err(FormatError::new(value));
    }

    let hour = hour_str
        .parse::<u32>()
        .map_err(|_| FormatError::new(value))?;
    let minute = minute_str
        .parse::<u32>()
        .map_err(|_| FormatError::new(value))?;
    if hour > 23 || minute > 59 {
        return Err(FormatError::new(value));
    }
    Ok(hour * 60 + minute)
}

pub fn to_minutes_or_midnight(value: &str) -> u32 {
    to_minutes(value).unwrap_or(0)
}

pub fn to_clock_string(minutes: i64) -> String {
    let minutes = normalize_minutes(minutes);
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

pub fn normalize_minutes(minutes: i64) -> u32 {
    minutes.rem_euclid(MINUTES_PER_DAY as i64) as u32
}

pub fn normalize_angle(angle_degrees: f64) -> f64 {
    let normalized = angle_degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if normalized >= 360.0 { 0.0 } else { normalized }
}

pub fn angle_to_minutes(angle_degrees: f64) -> u32 {
    let minutes = (normalize_angle(angle_degrees) / DEGREES_PER_MINUTE).round();
    normalize_minutes(minutes as i64)
}

pub fn minutes_to_angle(minutes: u32) -> f64 {
    (minutes % MINUTES_PER_DAY) as f64 * DEGREES_PER_MINUTE
}

pub fn snap_angle_to_grid(angle_degrees: f64, grid_minutes: u32) -> f64 {
    let angle = normalize_angle(angle_degrees);
    if grid_minutes == 0 {
        return angle;
    }
    let step = grid_minutes as f64 * DEGREES_PER_MINUTE;
    normalize_angle((angle / step).round() * step)
}

// screen y grows downwards, so straight up is 0 and clockwise is positive
pub fn pointer_angle(center: Point, point: Point) -> f64 {
    let radians = (point.y - center.y).atan2(point.x - center.x);
    normalize_angle(radians.to_degrees() + 90.0)
}

pub fn distance(a: Point, b: Point) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}

pub fn end_minute(start_minute: u32, duration_minutes: u32) -> u32 {
    (start_minute + duration_minutes) % MINUTES_PER_DAY
}

pub fn forward_distance(from: u32, to: u32) -> u32 {
    normalize_minutes(to as i64 - from as i64)
}

fn is_clock_field(value: &str, min_len: usize) -> bool {
    (min_len..=2).contains(&value.len()) && value.bytes().all(|byte| byte.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_and_formats_clock_strings() {
        assert_eq!(to_minutes("23:00"), Ok(1380));
        assert_eq!(to_minutes("00:00"), Ok(0));
        assert_eq!(to_minutes("7:05"), Ok(425));
        assert_eq!(to_clock_string(300), "05:00");
        assert_eq!(to_clock_string(1440 + 61), "01:01");
        assert_eq!(to_clock_string(-30), "23:30");
    }

    #[test]
    fn rejects_malformed_clock_strings() {
        for input in ["", "24:00", "12:60", "12", "12:5", "+1:30", "ab:cd", "1:2:3", "123:00"] {
            assert!(to_minutes(input).is_err(), "expected '{input}' to be rejected");
        }
        assert_eq!(to_minutes_or_midnight("garbage"), 0);
    }

    #[test]
    fn maps_angles_clockwise_from_the_top() {
        assert_eq!(angle_to_minutes(0.0), 0);
        assert_eq!(angle_to_minutes(90.0), 360);
        assert_eq!(angle_to_minutes(180.0), 720);
        assert_eq!(angle_to_minutes(-90.0), 1080);
        assert_eq!(angle_to_minutes(359.99), 0);
        assert_eq!(minutes_to_angle(1080), 270.0);
    }

    #[test]
    fn pointer_angle_uses_screen_coordinates() {
        let center = Point::new(100.0, 100.0);
        let top = pointer_angle(center, Point::new(100.0, 20.0));
        let right = pointer_angle(center, Point::new(180.0, 100.0));
        let bottom = pointer_angle(center, Point::new(100.0, 180.0));
        let left = pointer_angle(center, Point::new(20.0, 100.0));

        assert!(top.abs() < 1e-9);
        assert!((right - 90.0).abs() < 1e-9);
        assert!((bottom - 180.0).abs() < 1e-9);
        assert!((left - 270.0).abs() < 1e-9);
    }

    #[test]
    fn snaps_to_the_nearest_grid_step() {
        // 5 minute grid is 1.25°
        assert_eq!(snap_angle_to_grid(1.0, 5), 1.25);
        assert_eq!(snap_angle_to_grid(0.5, 5), 0.0);
        assert_eq!(snap_angle_to_grid(359.9, 5), 0.0);
        assert_eq!(snap_angle_to_grid(12.3, 0), 12.3);
    }

    #[test]
    fn measures_distances_and_spans() {
        assert_eq!(distance(Point::new(0.0, 0.0), Point::new(3.0, 4.0)), 5.0);
        assert_eq!(end_minute(1380, 360), 300);
        assert_eq!(forward_distance(1380, 300), 360);
        assert_eq!(forward_distance(300, 300), 0);
    }

    proptest! {
        #[test]
        fn clock_string_round_trips(minute in 0u32..MINUTES_PER_DAY) {
            prop_assert_eq!(to_minutes(&to_clock_string(minute as i64)), Ok(minute));
        }

        #[test]
        fn snapping_is_idempotent(angle in -720.0f64..720.0, grid in 1u32..=60) {
            let once = snap_angle_to_grid(angle, grid);
            prop_assert_eq!(snap_angle_to_grid(once, grid), once);
        }

        #[test]
        fn snapped_angles_land_on_whole_grid_minutes(angle in 0.0f64..360.0) {
            let minutes = angle_to_minutes(snap_angle_to_grid(angle, DEFAULT_SNAP_GRID_MINUTES));
            prop_assert_eq!(minutes % DEFAULT_SNAP_GRID_MINUTES, 0);
        }
    }
}
