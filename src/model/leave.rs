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
pub enum LeaveType {
    Annual,
    Sick,
    Casual,
    Unpaid,
    Maternity,
    Paternity,
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl LeaveStatus {
    /// Still blocks the calendar for overlapping requests.
    pub fn is_active(self) -> bool {
        matches!(self, LeaveStatus::Pending | LeaveStatus::Approved)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "user_id": 1000,
    "leave_type": "SICK",
    "start_date": "2026-01-01",
    "end_date": "2026-01-03",
    "reason": "Flu",
    "status": "PENDING",
    "approver_id": null,
    "rejection_reason": null,
    "created_at": "2026-01-01T00:00:00",
    "updated_at": "2026-01-01T00:00:00"
}))]
pub struct Leave {
    pub id: u64,
    pub user_id: u64,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    pub status: LeaveStatus,
    pub approver_id: Option<u64>,
    pub rejection_reason: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Leave {
    /// Calendar days covered, both ends inclusive.
    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "2026-01-01")]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03")]
    pub end_date: NaiveDate,
    #[schema(example = "SICK")]
    pub leave_type: LeaveType,
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RejectLeave {
    #[validate(length(min = 1, max = 500))]
    #[schema(example = "Project deadline")]
    pub reason: String,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    /// Filter by employee ID
    pub user_id: Option<u64>,
    /// Filter by leave status
    pub status: Option<LeaveStatus>,
    pub leave_type: Option<LeaveType>,
    pub approver_id: Option<u64>,
    /// Requests ending on or after this date
    pub from: Option<NaiveDate>,
    /// Requests starting on or before this date
    pub to: Option<NaiveDate>,
}

impl Filter<Leave> for LeaveFilter {
    fn matches(&self, l: &Leave) -> bool {
        self.user_id.is_none_or(|u| l.user_id == u)
            && self.status.is_none_or(|s| l.status == s)
            && self.leave_type.is_none_or(|t| l.leave_type == t)
            && self.approver_id.is_none_or(|a| l.approver_id == Some(a))
            && self.from.is_none_or(|d| l.end_date >= d)
            && self.to.is_none_or(|d| l.start_date <= d)
    }
}

impl Entity for Leave {
    type Filter = LeaveFilter;
    const NAME: &'static str = "leave";

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn listing_order(a: &Self, b: &Self) -> Ordering {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, day).unwrap()
    }

    fn leave(start: u32, end: u32) -> Leave {
        let now = d(1).and_hms_opt(0, 0, 0).unwrap();
        Leave {
            id: 1,
            user_id: 1,
            leave_type: LeaveType::Annual,
            start_date: d(start),
            end_date: d(end),
            reason: None,
            status: LeaveStatus::Pending,
            approver_id: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn days_are_inclusive() {
        assert_eq!(leave(5, 5).days(), 1);
        assert_eq!(leave(5, 9).days(), 5);
    }

    #[test]
    fn range_filter_selects_overlapping_requests() {
        let filter = LeaveFilter {
            from: Some(d(8)),
            to: Some(d(20)),
            ..Default::default()
        };
        assert!(filter.matches(&leave(5, 9)));
        assert!(filter.matches(&leave(20, 22)));
        assert!(!filter.matches(&leave(1, 7)));
    }
}
