//! Sleep logging and energy restoration.
//!
//! Sleep is the primary way base energy comes back. One entry exists per
//! owner per calendar day; re-logging a day updates the entry rather than
//! duplicating it. The restoration amount is derived once at creation time
//! from hours, quality, and the capacity ceiling, then frozen on the entry.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, Result, ValidationError};

/// Flat bonus granted for an optimal night (7-9 hours at quality >= 8).
const OPTIMAL_SLEEP_BONUS: f64 = 20.0;

/// Hours of sleep beyond which extra time restores nothing more.
const EFFECTIVE_HOURS_CAP: f64 = 8.0;

/// Subjective sleep quality on a 1-10 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SleepQuality(u8);

impl SleepQuality {
    /// Construct a quality score.
    ///
    /// # Errors
    /// A value outside 1-10 is an invariant violation, not recoverable
    /// input.
    pub fn new(value: u8) -> Result<Self> {
        if !(1..=10).contains(&value) {
            return Err(EngineError::Invariant(format!(
                "sleep quality must be within 1-10, got {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Restoration multiplier: linear from 0.5x at 0 up to 1.5x at 10.
    pub fn multiplier(&self) -> f64 {
        0.5 + self.0 as f64 / 10.0
    }

    /// Quality 8 and above counts as optimal.
    pub fn is_optimal(&self) -> bool {
        self.0 >= 8
    }
}

/// Coarse classification of a night's length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SleepCategory {
    Insufficient,
    Short,
    Optimal,
    Long,
}

impl SleepCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SleepCategory::Insufficient => "insufficient",
            SleepCategory::Short => "short",
            SleepCategory::Optimal => "optimal",
            SleepCategory::Long => "long",
        }
    }
}

/// Compute the energy restored by a night of sleep.
///
/// `base = min(hours, 8)`, scaled by the quality multiplier and floored,
/// then the optimal bonus is added *after* the floor (it is never
/// multiplied). The result is capped at the capacity ceiling.
///
/// # Errors
/// Fails with a validation error when `hours_slept` is outside `[0, 24]`
/// or non-finite.
pub fn calculate_restoration(
    hours_slept: f64,
    quality: SleepQuality,
    ceiling: f64,
) -> Result<f64, ValidationError> {
    if !hours_slept.is_finite() || !(0.0..=24.0).contains(&hours_slept) {
        return Err(ValidationError::invalid_value(
            "hours_slept",
            format!("must be within [0, 24], got {hours_slept}"),
        ));
    }

    let base = hours_slept.min(EFFECTIVE_HOURS_CAP);
    let raw = (base * quality.multiplier()).floor();
    let bonus = if (7.0..=9.0).contains(&hours_slept) && quality.is_optimal() {
        OPTIMAL_SLEEP_BONUS
    } else {
        0.0
    };

    Ok((raw + bonus).min(ceiling))
}

/// A logged night of sleep.
///
/// Upsert key is `(owner_id, date)`. `energy_restored` is frozen at
/// creation; editing a day's entry produces a whole new record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sleep {
    pub id: Uuid,
    pub owner_id: String,
    pub date: NaiveDate,
    pub hours_slept: f64,
    pub quality: SleepQuality,
    pub bed_time: Option<DateTime<Utc>>,
    pub wake_time: Option<DateTime<Utc>>,
    pub energy_restored: f64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating or re-logging a night of sleep.
#[derive(Debug, Clone)]
pub struct SleepEntry {
    pub date: NaiveDate,
    pub hours_slept: f64,
    pub quality: u8,
    pub bed_time: Option<DateTime<Utc>>,
    pub wake_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl Sleep {
    /// Build a sleep record, deriving the restoration amount from the
    /// inputs and the owner's current capacity ceiling.
    ///
    /// # Errors
    /// Validation errors for out-of-range hours or `wake <= bed`; an
    /// invariant violation for an out-of-range quality score.
    pub fn create(owner_id: &str, entry: &SleepEntry, ceiling: f64, now: DateTime<Utc>) -> Result<Self> {
        let quality = SleepQuality::new(entry.quality)?;

        if let (Some(bed), Some(wake)) = (entry.bed_time, entry.wake_time) {
            if wake <= bed {
                return Err(ValidationError::InvalidTimeRange { bed, wake }.into());
            }
        }

        let energy_restored = calculate_restoration(entry.hours_slept, quality, ceiling)?;

        Ok(Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            date: entry.date,
            hours_slept: entry.hours_slept,
            quality,
            bed_time: entry.bed_time,
            wake_time: entry.wake_time,
            energy_restored,
            notes: entry.notes.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Whether this night was optimal: 7-9 hours at quality >= 8.
    pub fn is_optimal(&self) -> bool {
        (7.0..=9.0).contains(&self.hours_slept) && self.quality.is_optimal()
    }

    pub fn category(&self) -> SleepCategory {
        if self.hours_slept < 6.0 {
            SleepCategory::Insufficient
        } else if self.hours_slept < 7.0 {
            SleepCategory::Short
        } else if self.hours_slept <= 9.0 {
            SleepCategory::Optimal
        } else {
            SleepCategory::Long
        }
    }

    /// Duration as "7h 30m".
    pub fn duration_formatted(&self) -> String {
        let hours = self.hours_slept.floor();
        let minutes = ((self.hours_slept - hours) * 60.0).round();
        format!("{}h {}m", hours as u32, minutes as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(hours: f64, quality: u8) -> SleepEntry {
        SleepEntry {
            date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            hours_slept: hours,
            quality,
            bed_time: None,
            wake_time: None,
            notes: None,
        }
    }

    #[test]
    fn quality_bounds() {
        assert!(SleepQuality::new(0).is_err());
        assert!(SleepQuality::new(11).is_err());
        assert_eq!(SleepQuality::new(1).unwrap().multiplier(), 0.6);
        assert_eq!(SleepQuality::new(10).unwrap().multiplier(), 1.5);
        assert!(SleepQuality::new(8).unwrap().is_optimal());
        assert!(!SleepQuality::new(7).unwrap().is_optimal());
    }

    #[test]
    fn restoration_optimal_night() {
        // base 8, multiplier 1.4, floor(11.2) = 11, +20 optimal bonus
        let quality = SleepQuality::new(9).unwrap();
        assert_eq!(calculate_restoration(8.0, quality, 100.0).unwrap(), 31.0);
    }

    #[test]
    fn restoration_long_night_misses_bonus() {
        // base capped at 8, multiplier 1.5, floor(12) = 12; 10h > 9h so no bonus
        let quality = SleepQuality::new(10).unwrap();
        assert_eq!(calculate_restoration(10.0, quality, 100.0).unwrap(), 12.0);
    }

    #[test]
    fn restoration_floor_precedes_bonus() {
        // 7.5h, quality 8: base 7.5 * 1.3 = 9.75 -> floor 9, +20 = 29
        let quality = SleepQuality::new(8).unwrap();
        assert_eq!(calculate_restoration(7.5, quality, 100.0).unwrap(), 29.0);
    }

    #[test]
    fn restoration_capped_at_ceiling() {
        let quality = SleepQuality::new(9).unwrap();
        assert_eq!(calculate_restoration(8.0, quality, 25.0).unwrap(), 25.0);
    }

    #[test]
    fn restoration_rejects_out_of_range_hours() {
        let quality = SleepQuality::new(5).unwrap();
        assert!(calculate_restoration(25.0, quality, 100.0).is_err());
        assert!(calculate_restoration(-0.5, quality, 100.0).is_err());
        assert!(calculate_restoration(f64::NAN, quality, 100.0).is_err());
    }

    #[test]
    fn create_validates_bed_and_wake_times() {
        let now = Utc::now();
        let mut e = entry(8.0, 7);
        e.bed_time = Some(now);
        e.wake_time = Some(now - Duration::hours(8));
        assert!(matches!(
            Sleep::create("owner-1", &e, 100.0, now),
            Err(EngineError::Validation(ValidationError::InvalidTimeRange { .. }))
        ));

        e.wake_time = Some(now + Duration::hours(8));
        assert!(Sleep::create("owner-1", &e, 100.0, now).is_ok());
    }

    #[test]
    fn frozen_restoration_on_entity() {
        let now = Utc::now();
        let sleep = Sleep::create("owner-1", &entry(8.0, 9), 100.0, now).unwrap();
        assert_eq!(sleep.energy_restored, 31.0);
        assert!(sleep.is_optimal());
        assert_eq!(sleep.category(), SleepCategory::Optimal);
    }

    #[test]
    fn categories() {
        let now = Utc::now();
        let cases = [
            (5.0, SleepCategory::Insufficient),
            (6.5, SleepCategory::Short),
            (8.0, SleepCategory::Optimal),
            (10.0, SleepCategory::Long),
        ];
        for (hours, expected) in cases {
            let sleep = Sleep::create("owner-1", &entry(hours, 5), 100.0, now).unwrap();
            assert_eq!(sleep.category(), expected);
        }
    }

    #[test]
    fn duration_formatting() {
        let now = Utc::now();
        let sleep = Sleep::create("owner-1", &entry(7.5, 5), 100.0, now).unwrap();
        assert_eq!(sleep.duration_formatted(), "7h 30m");
    }
}
