use chrono::{DateTime, SecondsFormat, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::errors::{ShareError, ShareResult};

/// Weekdays in the 0=Sunday numbering used by persisted provider settings.
const SUNDAY_FIRST: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

/// Converts a 0=Sunday, 6=Saturday index into a weekday.
pub fn weekday_from_index(index: i16) -> Option<Weekday> {
    usize::try_from(index)
        .ok()
        .and_then(|i| SUNDAY_FIRST.get(i).copied())
}

/// Converts a weekday into its 0=Sunday, 6=Saturday index.
pub fn weekday_index(day: Weekday) -> i16 {
    day.num_days_from_sunday() as i16
}

/// Parses an IANA timezone name such as `America/New_York`.
pub fn parse_timezone(name: &str) -> ShareResult<Tz> {
    name.parse::<Tz>()
        .map_err(|e| ShareError::InvalidConfiguration(format!("unknown timezone '{}': {}", name, e)))
}

/// A provider's bookable window.
///
/// Hours are interpreted in `timezone`. `end` is exclusive: no slot starts at
/// or after `end`:00. Days listed in `excluded_weekdays` get no slots at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingHours {
    pub start: u32,
    pub end: u32,
    pub slot_duration_minutes: u32,
    #[serde(default = "default_excluded_weekdays")]
    pub excluded_weekdays: Vec<Weekday>,
    #[serde(default = "default_timezone")]
    pub timezone: Tz,
}

fn default_excluded_weekdays() -> Vec<Weekday> {
    vec![Weekday::Sat, Weekday::Sun]
}

fn default_timezone() -> Tz {
    Tz::UTC
}

impl Default for WorkingHours {
    /// 09:00 to 17:00 in 30 minute steps, weekends off, UTC.
    fn default() -> Self {
        Self {
            start: 9,
            end: 17,
            slot_duration_minutes: 30,
            excluded_weekdays: default_excluded_weekdays(),
            timezone: default_timezone(),
        }
    }
}

impl WorkingHours {
    pub fn new(start: u32, end: u32, slot_duration_minutes: u32) -> Self {
        Self {
            start,
            end,
            slot_duration_minutes,
            ..Self::default()
        }
    }

    pub fn with_excluded_weekdays(mut self, days: impl IntoIterator<Item = Weekday>) -> Self {
        self.excluded_weekdays = days.into_iter().collect();
        self
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn excludes(&self, day: Weekday) -> bool {
        self.excluded_weekdays.contains(&day)
    }

    /// Number of slots a fully open working day yields.
    pub fn slots_per_day(&self) -> usize {
        let hours = self.end.saturating_sub(self.start) as usize;
        match self.slot_duration_minutes {
            0 => 0,
            step => hours * (60 / step as usize),
        }
    }

    /// Checks the hours form a non-empty window and the step tiles an hour.
    pub fn validate(&self) -> ShareResult<()> {
        if self.start > 23 || self.end > 23 {
            return Err(ShareError::InvalidConfiguration(format!(
                "working hours must be between 0 and 23, got {}-{}",
                self.start, self.end
            )));
        }
        if self.start >= self.end {
            return Err(ShareError::InvalidConfiguration(format!(
                "working hours start ({}) must be before end ({})",
                self.start, self.end
            )));
        }
        if self.slot_duration_minutes == 0 {
            return Err(ShareError::InvalidConfiguration(
                "slot duration must be positive".to_string(),
            ));
        }
        if 60 % self.slot_duration_minutes != 0 {
            return Err(ShareError::InvalidConfiguration(format!(
                "slot duration of {} minutes does not evenly divide an hour",
                self.slot_duration_minutes
            )));
        }
        Ok(())
    }
}

/// How existing bookings block candidate slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionMode {
    /// A slot is blocked only when its start equals a booked start.
    #[default]
    Exact,
    /// Each booking occupies `booking_minutes` and blocks every
    /// slot whose interval intersects it.
    Overlap { booking_minutes: u32 },
}

/// The start of an existing, non-cancelled appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BookedInstant {
    pub timestamp: DateTime<Utc>,
}

impl From<DateTime<Utc>> for BookedInstant {
    fn from(timestamp: DateTime<Utc>) -> Self {
        Self { timestamp }
    }
}

/// Everything a single availability computation needs.
#[derive(Debug, Clone)]
pub struct SlotQuery {
    pub range_start: DateTime<Utc>,
    pub range_end: DateTime<Utc>,
    pub working_hours: WorkingHours,
    pub booked: Vec<BookedInstant>,
    pub now: DateTime<Utc>,
    pub collision: CollisionMode,
}

impl SlotQuery {
    pub fn new(
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
        working_hours: WorkingHours,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            range_start,
            range_end,
            working_hours,
            booked: Vec::new(),
            now,
            collision: CollisionMode::Exact,
        }
    }

    pub fn with_booked(mut self, booked: impl IntoIterator<Item = BookedInstant>) -> Self {
        self.booked = booked.into_iter().collect();
        self
    }

    pub fn with_collision(mut self, collision: CollisionMode) -> Self {
        self.collision = collision;
        self
    }
}

/// A bookable appointment start time.
///
/// On the wire a slot is an ISO-8601 UTC string with millisecond precision,
/// e.g. `2024-06-03T09:00:00.000Z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot {
    pub timestamp: DateTime<Utc>,
}

impl Slot {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self { timestamp }
    }
}

impl Serialize for Slot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

impl<'de> Deserialize<'de> for Slot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        DateTime::<Utc>::deserialize(deserializer).map(Slot::new)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub provider_id: Uuid,
    pub provider_name: String,
    pub available_slots: Vec<Slot>,
    pub working_hours: WorkingHours,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkingHoursRequest {
    pub start: u32,
    pub end: u32,
    pub slot_duration_minutes: u32,
    pub excluded_weekdays: Option<Vec<Weekday>>,
    pub timezone: Option<String>,
}

impl UpdateWorkingHoursRequest {
    /// Builds validated working hours, defaulting omitted fields.
    pub fn into_working_hours(self) -> ShareResult<WorkingHours> {
        let mut hours = WorkingHours::new(self.start, self.end, self.slot_duration_minutes);
        if let Some(days) = self.excluded_weekdays {
            hours = hours.with_excluded_weekdays(days);
        }
        if let Some(name) = self.timezone.as_deref() {
            hours = hours.with_timezone(parse_timezone(name)?);
        }
        hours.validate()?;
        Ok(hours)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingHoursResponse {
    pub provider_id: Uuid,
    pub working_hours: WorkingHours,
    /// True when the provider has no stored settings and the default applies.
    pub is_default: bool,
}
