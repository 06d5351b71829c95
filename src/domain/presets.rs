use crate::domain::error::ValidationError;
use crate::domain::schedule_store::ScheduleStore;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    Monophasic,
    Biphasic,
    Everyman,
    Dymaxion,
    Uberman,
}

impl Preset {
    pub const ALL: [Preset; 5] = [
        Preset::Monophasic,
        Preset::Biphasic,
        Preset::Everyman,
        Preset::Dymaxion,
        Preset::Uberman,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monophasic => "monophasic",
            Self::Biphasic => "biphasic",
            Self::Everyman => "everyman",
            Self::Dymaxion => "dymaxion",
            Self::Uberman => "uberman",
        }
    }

    pub fn blocks(self) -> &'static [(u32, u32)] {
        match self {
            Self::Monophasic => &[(23 * 60, 480)],
            Self::Biphasic => &[(23 * 60 + 30, 360), (14 * 60, 90)],
            Self::Everyman => &[
                (23 * 60, 210),
                (6 * 60 + 30, 20),
                (11 * 60 + 30, 20),
                (16 * 60 + 30, 20),
            ],
            Self::Dymaxion => &[(0, 30), (6 * 60, 30), (12 * 60, 30), (18 * 60, 30)],
            Self::Uberman => &[
                (0, 20),
                (4 * 60, 20),
                (8 * 60, 20),
                (12 * 60, 20),
                (16 * 60, 20),
                (20 * 60, 20),
            ],
        }
    }

    pub fn populate(self, store: &mut ScheduleStore) -> Result<(), ValidationError> {
        let mut staged = store.clone();
        staged.clear();
        for (start, duration) in self.blocks() {
            staged.insert(*start as i64, *duration)?;
        }
        *store = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_preset_builds_a_valid_schedule() {
        for preset in Preset::ALL {
            let mut store = ScheduleStore::new();
            preset.populate(&mut store).expect("preset is valid");
            assert_eq!(store.len(), preset.blocks().len(), "{}", preset.as_str());
            assert_eq!(
                serde_json::to_value(preset).expect("serialize"),
                serde_json::Value::from(preset.as_str())
            );
        }
    }

    #[test]
    fn preset_totals_and_classification() {
        let mut store = ScheduleStore::new();
        Preset::Everyman.populate(&mut store).expect("everyman");
        assert_eq!(store.total_sleep_minutes(), 270);
        assert_eq!((store.core_count(), store.nap_count()), (1, 3));

        Preset::Uberman.populate(&mut store).expect("uberman");
        assert_eq!(store.total_sleep_minutes(), 120);
        assert_eq!(store.core_count(), 0);
    }
}
