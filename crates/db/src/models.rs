use chrono::{DateTime, Utc};
use medshare_core::{
    errors::{ShareError, ShareResult},
    models::{
        appointment::Appointment,
        availability::{WorkingHours, parse_timezone, weekday_from_index, weekday_index},
    },
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbUser {
    pub id: Uuid,
    pub name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbWorkingHours {
    pub provider_id: Uuid,
    pub start_hour: i16,
    pub end_hour: i16,
    pub slot_duration_minutes: i16,
    /// 0=Sunday .. 6=Saturday
    pub excluded_weekdays: Vec<i16>,
    pub timezone: String,
    pub updated_at: DateTime<Utc>,
}

impl DbWorkingHours {
    /// Converts stored settings into validated working hours.
    pub fn to_working_hours(&self) -> ShareResult<WorkingHours> {
        let hour = |value: i16, field: &str| {
            u32::try_from(value).map_err(|_| {
                ShareError::InvalidConfiguration(format!("stored {} {} is negative", field, value))
            })
        };

        let excluded = self
            .excluded_weekdays
            .iter()
            .map(|&index| {
                weekday_from_index(index).ok_or_else(|| {
                    ShareError::InvalidConfiguration(format!("stored weekday {} is out of range", index))
                })
            })
            .collect::<ShareResult<Vec<_>>>()?;

        let hours = WorkingHours::new(
            hour(self.start_hour, "start hour")?,
            hour(self.end_hour, "end hour")?,
            hour(self.slot_duration_minutes, "slot duration")?,
        )
        .with_excluded_weekdays(excluded)
        .with_timezone(parse_timezone(&self.timezone)?);

        hours.validate()?;
        Ok(hours)
    }

    pub fn from_working_hours(provider_id: Uuid, hours: &WorkingHours) -> Self {
        Self {
            provider_id,
            start_hour: hours.start as i16,
            end_hour: hours.end as i16,
            slot_duration_minutes: hours.slot_duration_minutes as i16,
            excluded_weekdays: hours.excluded_weekdays.iter().map(|d| weekday_index(*d)).collect(),
            timezone: hours.timezone.name().to_string(),
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAppointment {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub patient_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub status: String,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl DbAppointment {
    pub fn to_appointment(&self) -> ShareResult<Appointment> {
        Ok(Appointment {
            id: self.id,
            provider_id: self.provider_id,
            patient_id: self.patient_id,
            start_time: self.start_time,
            duration_minutes: u32::try_from(self.duration_minutes).unwrap_or(0),
            status: self.status.parse()?,
            reason: self.reason.clone(),
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAppointment {
    pub provider_id: Uuid,
    pub patient_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAuditEntry {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub action: String,
    pub resource_type: String,
    pub resource_id: String,
    pub detail: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAuditEntry {
    pub actor_id: Uuid,
    pub action: String,
    pub resource_type: String,
    pub resource_id: String,
    pub detail: Option<serde_json::Value>,
}
