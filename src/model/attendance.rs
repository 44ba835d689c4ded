use std::cmp::Ordering;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::store::{Entity, Filter};

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    Present,
    Absent,
    HalfDay,
    Leave,
}

/// One row per (user, calendar date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Attendance {
    pub id: u64,
    pub user_id: u64,
    pub date: NaiveDate,
    pub punch_in: Option<NaiveDateTime>,
    pub punch_in_location: Option<String>,
    pub punch_in_latitude: Option<f64>,
    pub punch_in_longitude: Option<f64>,
    pub punch_out: Option<NaiveDateTime>,
    pub punch_out_location: Option<String>,
    pub punch_out_latitude: Option<f64>,
    pub punch_out_longitude: Option<f64>,
    /// Whole minutes between punch-in and punch-out, truncated.
    pub working_minutes: i64,
    pub status: AttendanceStatus,
    pub reason: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Attendance {
    /// Empty record for a day, before any punch or mark.
    pub fn blank(user_id: u64, date: NaiveDate, status: AttendanceStatus, now: NaiveDateTime) -> Self {
        Self {
            id: 0,
            user_id,
            date,
            punch_in: None,
            punch_in_location: None,
            punch_in_latitude: None,
            punch_in_longitude: None,
            punch_out: None,
            punch_out_location: None,
            punch_out_latitude: None,
            punch_out_longitude: None,
            working_minutes: 0,
            status,
            reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_complete_punches(&self) -> bool {
        self.punch_in.is_some() && self.punch_out.is_some()
    }

    /// Minutes worked when both punches exist, otherwise zero. Never negative.
    pub fn worked_minutes(&self) -> i64 {
        match (self.punch_in, self.punch_out) {
            (Some(start), Some(end)) => (end - start).num_minutes().max(0),
            _ => 0,
        }
    }

    pub fn working_hours(&self) -> f64 {
        minutes_to_hours(self.worked_minutes())
    }
}

pub fn minutes_to_hours(minutes: i64) -> f64 {
    minutes as f64 / 60.0
}

/// Where and from which coordinates a punch was made.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct PunchLocation {
    #[validate(length(max = 255))]
    #[schema(example = "Head office")]
    pub location: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    #[schema(example = 23.8103)]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    #[schema(example = 90.4125)]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct MarkAttendance {
    pub user_id: u64,
    #[schema(example = "2026-01-01")]
    pub date: NaiveDate,
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct AttendanceFilter {
    pub user_id: Option<u64>,
    /// Restrict to these users (e.g. a department's members)
    #[serde(skip)]
    pub user_ids: Option<Vec<u64>>,
    pub date: Option<NaiveDate>,
    /// Inclusive lower bound on date
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on date
    pub to: Option<NaiveDate>,
    pub status: Option<AttendanceStatus>,
}

impl Filter<Attendance> for AttendanceFilter {
    fn matches(&self, a: &Attendance) -> bool {
        self.user_id.is_none_or(|u| a.user_id == u)
            && self
                .user_ids
                .as_deref()
                .is_none_or(|ids| ids.contains(&a.user_id))
            && self.date.is_none_or(|d| a.date == d)
            && self.from.is_none_or(|d| a.date >= d)
            && self.to.is_none_or(|d| a.date <= d)
            && self.status.is_none_or(|s| a.status == s)
    }
}

impl Entity for Attendance {
    type Filter = AttendanceFilter;
    const NAME: &'static str = "attendance";

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![("user_date", format!("{}:{}", self.user_id, self.date))]
    }

    /// Newest date first.
    fn listing_order(a: &Self, b: &Self) -> Ordering {
        b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id))
    }
}
