//! Expansion of the day/time configuration into discrete bookable slots.
//!
//! Slot length that does not evenly divide the working window is rounded down: the trailing
//! remainder of each day is dropped. Recess slots stay in the grid (so slot indices are stable
//! across days) but are flagged and never bookable.

use log::debug;
use serde::Serialize;
use std::collections::HashSet;
use std::ops::Range;

use crate::data::{ClockTime, DayName, TimetableConfig};
use crate::error::ConfigError;

/// Working windows of at least this many minutes get an automatic mid-day recess.
const AUTO_RECESS_MIN_WINDOW: u32 = 240;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub day: usize,
    pub index: usize,
    pub start: ClockTime,
    pub end: ClockTime,
    pub is_recess: bool,
}

/// `len` consecutive slots on one day starting at `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SlotRange {
    pub day: usize,
    pub start: usize,
    pub len: usize,
}

impl SlotRange {
    pub fn new(day: usize, start: usize, len: usize) -> Self {
        Self { day, start, len }
    }

    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn indices(&self) -> Range<usize> {
        self.start..self.end()
    }
}

/// Why a slot range is not bookable regardless of what is already placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeError {
    OutOfBounds,
    Recess,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    days: Vec<DayName>,
    slots_per_day: usize,
    // day-major
    slots: Vec<Slot>,
}

impl Grid {
    pub fn build(config: &TimetableConfig) -> Result<Grid, ConfigError> {
        if let Some(err) = check_config(config).into_iter().next() {
            return Err(err);
        }

        let days = config.working_days.clone();
        let start = config.day_start;
        let length = config.slot_length_minutes;
        let window = config.day_end.minutes() - start.minutes();
        let slots_per_day = (window / length) as usize;
        if window % length != 0 {
            debug!(
                "Slot length {} min leaves {} min unused at the end of each day.",
                length,
                window % length
            );
        }

        let auto_recess = (config.auto_recess && window >= AUTO_RECESS_MIN_WINDOW)
            .then(|| midday_slot(start, window, length, slots_per_day));

        let mut slots = Vec::with_capacity(days.len() * slots_per_day);
        for (day, day_name) in days.iter().enumerate() {
            for index in 0..slots_per_day {
                let slot_start = start.plus_minutes(index as u32 * length);
                let slot_end = slot_start.plus_minutes(length);
                let in_window = config.recesses.iter().any(|recess| {
                    recess.day.as_ref().is_none_or(|d| d == day_name)
                        && slot_start < recess.end
                        && recess.start < slot_end
                });
                slots.push(Slot {
                    day,
                    index,
                    start: slot_start,
                    end: slot_end,
                    is_recess: in_window || auto_recess == Some(index),
                });
            }
        }

        let grid = Grid {
            days,
            slots_per_day,
            slots,
        };
        debug!(
            "Built grid: {} day(s) x {} slot(s), {} bookable.",
            grid.day_count(),
            grid.slots_per_day,
            grid.bookable_count()
        );
        Ok(grid)
    }

    pub fn days(&self) -> &[DayName] {
        &self.days
    }

    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    pub fn day_index(&self, name: &str) -> Option<usize> {
        self.days.iter().position(|d| d == name)
    }

    pub fn slots_per_day(&self) -> usize {
        self.slots_per_day
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn day_slots(&self, day: usize) -> &[Slot] {
        let from = (day * self.slots_per_day).min(self.slots.len());
        let to = (from + self.slots_per_day).min(self.slots.len());
        &self.slots[from..to]
    }

    pub fn slot(&self, day: usize, index: usize) -> Option<&Slot> {
        if day >= self.days.len() || index >= self.slots_per_day {
            return None;
        }
        self.slots.get(day * self.slots_per_day + index)
    }

    pub fn bookable_count(&self) -> usize {
        self.slots.iter().filter(|s| !s.is_recess).count()
    }

    /// A range is bookable when it stays inside one day and touches no recess slot.
    pub fn check_range(&self, range: SlotRange) -> Result<(), RangeError> {
        if range.len == 0 || range.day >= self.days.len() || range.end() > self.slots_per_day {
            return Err(RangeError::OutOfBounds);
        }
        if self.day_slots(range.day)[range.indices()]
            .iter()
            .any(|s| s.is_recess)
        {
            return Err(RangeError::Recess);
        }
        Ok(())
    }

    /// Every bookable range of `len` slots, day by day, earliest start first.
    pub fn ranges(&self, len: usize) -> impl Iterator<Item = SlotRange> + '_ {
        let starts = (self.slots_per_day + 1).saturating_sub(len.max(1));
        (0..self.days.len())
            .flat_map(move |day| (0..starts).map(move |start| SlotRange::new(day, start, len)))
            .filter(move |range| self.check_range(*range).is_ok())
    }

    /// Longest run of consecutive non-recess slots on any day.
    pub fn longest_run(&self) -> usize {
        (0..self.days.len())
            .map(|day| {
                self.day_slots(day)
                    .split(|s| s.is_recess)
                    .map(<[Slot]>::len)
                    .max()
                    .unwrap_or(0)
            })
            .max()
            .unwrap_or(0)
    }
}

/// Every grid-level problem in `config`, in declaration order.
pub fn check_config(config: &TimetableConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    if config.working_days.is_empty() {
        errors.push(ConfigError::NoWorkingDays);
    }
    let mut seen = HashSet::new();
    for day in &config.working_days {
        if !seen.insert(day.as_str()) {
            errors.push(ConfigError::DuplicateDay(day.clone()));
        }
    }

    if config.day_end <= config.day_start {
        errors.push(ConfigError::InvalidTimeRange {
            start: config.day_start.to_string(),
            end: config.day_end.to_string(),
        });
    } else if config.slot_length_minutes == 0 {
        errors.push(ConfigError::ZeroSlotLength);
    } else {
        let window = config.day_end.minutes() - config.day_start.minutes();
        if config.slot_length_minutes > window {
            errors.push(ConfigError::SlotLengthExceedsDay {
                slot_minutes: config.slot_length_minutes,
                window_minutes: window,
            });
        }
    }

    for recess in &config.recesses {
        if recess.end <= recess.start {
            errors.push(ConfigError::InvalidRecess {
                start: recess.start.to_string(),
                end: recess.end.to_string(),
            });
        }
        if let Some(day) = &recess.day {
            if !config.working_days.contains(day) {
                errors.push(ConfigError::UnknownDay {
                    context: "recess window".to_string(),
                    day: day.clone(),
                });
            }
        }
    }

    errors
}

fn midday_slot(start: ClockTime, window: u32, length: u32, slots_per_day: usize) -> usize {
    let mid = start.minutes() + window / 2;
    (0..slots_per_day)
        .min_by_key(|&i| (start.minutes() + i as u32 * length).abs_diff(mid))
        .unwrap_or(0)
}
