use std::sync::Arc;

use chrono::NaiveDate;
use tracing::instrument;
use validator::Validate;

use super::{Guard, fetch, remove};
use crate::access::Caller;
use crate::clock::Clock;
use crate::error::{ServiceError, ServiceResult};
use crate::model::attendance::{
    Attendance, AttendanceFilter, AttendanceStatus, MarkAttendance, PunchLocation, minutes_to_hours,
};
use crate::model::user::{Department, User, UserFilter};
use crate::store::{Page, PageRequest, SharedStore, StoreError, find_page};

/// Daily punch lifecycle plus administrative marks.
///
/// Working time is kept in whole minutes (truncated) and reported in hours
/// as `minutes / 60`.
#[derive(Clone)]
pub struct AttendanceService {
    attendance: SharedStore<Attendance>,
    users: SharedStore<User>,
    guard: Guard,
    clock: Arc<dyn Clock>,
    half_day_threshold_minutes: i64,
}

impl AttendanceService {
    pub fn new(
        attendance: SharedStore<Attendance>,
        users: SharedStore<User>,
        guard: Guard,
        clock: Arc<dyn Clock>,
        half_day_threshold_minutes: i64,
    ) -> Self {
        Self {
            attendance,
            users,
            guard,
            clock,
            half_day_threshold_minutes,
        }
    }

    async fn record_for(&self, user_id: u64, date: NaiveDate) -> ServiceResult<Option<Attendance>> {
        let filter = AttendanceFilter {
            user_id: Some(user_id),
            date: Some(date),
            ..Default::default()
        };
        Ok(self.attendance.find_one(&filter).await?)
    }

    #[instrument(skip(self, punch))]
    pub async fn punch_in(&self, user_id: u64, punch: PunchLocation) -> ServiceResult<Attendance> {
        punch.validate()?;
        fetch(self.users.as_ref(), user_id).await?;

        let now = self.clock.now();
        let today = now.date();

        let mut record = match self.record_for(user_id, today).await? {
            Some(r) if r.punch_in.is_some() => return Err(ServiceError::AlreadyPunchedIn),
            Some(r) if matches!(r.status, AttendanceStatus::Absent | AttendanceStatus::Leave) => {
                return Err(ServiceError::RecordAlreadyFinalized(today));
            }
            // pre-marked half day keeps its status
            Some(r) => r,
            None => Attendance::blank(user_id, today, AttendanceStatus::Present, now),
        };

        record.punch_in = Some(now);
        record.punch_in_location = punch.location;
        record.punch_in_latitude = punch.latitude;
        record.punch_in_longitude = punch.longitude;
        record.updated_at = now;

        match self.attendance.save(record).await {
            Ok(saved) => {
                tracing::info!(user_id, date = %today, "Punched in");
                Ok(saved)
            }
            Err(StoreError::Duplicate(_)) => Err(ServiceError::AlreadyPunchedIn),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, punch))]
    pub async fn punch_out(&self, user_id: u64, punch: PunchLocation) -> ServiceResult<Attendance> {
        punch.validate()?;

        let now = self.clock.now();
        let today = now.date();

        let mut record = self
            .record_for(user_id, today)
            .await?
            .filter(|r| r.punch_in.is_some())
            .ok_or(ServiceError::NoPunchInFound)?;

        if record.punch_out.is_some() {
            return Err(ServiceError::AlreadyPunchedOut);
        }

        // a clock stepping backwards must not produce a negative span
        let out = record.punch_in.map_or(now, |start| now.max(start));
        record.punch_out = Some(out);
        record.punch_out_location = punch.location;
        record.punch_out_latitude = punch.latitude;
        record.punch_out_longitude = punch.longitude;
        record.working_minutes = record.worked_minutes();
        if record.status != AttendanceStatus::HalfDay {
            record.status = if record.working_minutes < self.half_day_threshold_minutes {
                AttendanceStatus::HalfDay
            } else {
                AttendanceStatus::Present
            };
        }
        record.updated_at = now;

        let saved = self.attendance.save(record).await?;
        tracing::info!(
            user_id,
            date = %today,
            minutes = saved.working_minutes,
            status = %saved.status,
            "Punched out"
        );
        Ok(saved)
    }

    pub async fn mark_absent(&self, user_id: u64, date: NaiveDate, reason: Option<String>) -> ServiceResult<Attendance> {
        self.mark(user_id, date, reason, AttendanceStatus::Absent).await
    }

    pub async fn mark_half_day(
        &self,
        user_id: u64,
        date: NaiveDate,
        reason: Option<String>,
    ) -> ServiceResult<Attendance> {
        self.mark(user_id, date, reason, AttendanceStatus::HalfDay).await
    }

    pub async fn mark_on_leave(
        &self,
        user_id: u64,
        date: NaiveDate,
        reason: Option<String>,
    ) -> ServiceResult<Attendance> {
        self.mark(user_id, date, reason, AttendanceStatus::Leave).await
    }

    #[instrument(skip(self, reason))]
    async fn mark(
        &self,
        user_id: u64,
        date: NaiveDate,
        reason: Option<String>,
        status: AttendanceStatus,
    ) -> ServiceResult<Attendance> {
        let mark = MarkAttendance { user_id, date, reason };
        mark.validate()?;
        let reason = mark.reason;
        fetch(self.users.as_ref(), user_id).await?;
        let now = self.clock.now();

        let record = match self.record_for(user_id, date).await? {
            Some(existing) if conflicts_with_mark(&existing, status) => {
                tracing::warn!(user_id, date = %date, %status, "Attendance already finalized");
                return Err(ServiceError::RecordAlreadyFinalized(date));
            }
            Some(mut existing) => {
                existing.status = status;
                existing.reason = reason;
                existing.updated_at = now;
                existing
            }
            None => {
                let mut record = Attendance::blank(user_id, date, status, now);
                record.reason = reason;
                record
            }
        };

        let saved = self.attendance.save(record).await?;
        tracing::info!(user_id, date = %date, %status, "Attendance marked");
        Ok(saved)
    }

    pub async fn has_punched_in(&self, user_id: u64, date: NaiveDate) -> ServiceResult<bool> {
        Ok(self
            .record_for(user_id, date)
            .await?
            .is_some_and(|r| r.punch_in.is_some()))
    }

    pub async fn has_punched_out(&self, user_id: u64, date: NaiveDate) -> ServiceResult<bool> {
        Ok(self
            .record_for(user_id, date)
            .await?
            .is_some_and(|r| r.punch_out.is_some()))
    }

    /// Hours worked on a day; 0 without a complete punch pair.
    pub async fn get_working_hours(&self, user_id: u64, date: NaiveDate) -> ServiceResult<f64> {
        Ok(self
            .record_for(user_id, date)
            .await?
            .map_or(0.0, |r| r.working_hours()))
    }

    /// Sum of daily working hours over `[start, end]`.
    pub async fn get_total_working_hours(
        &self,
        user_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ServiceResult<f64> {
        let records = self.records_in_range(user_id, start, end).await?;
        let minutes: i64 = records.iter().map(Attendance::worked_minutes).sum();
        Ok(minutes_to_hours(minutes))
    }

    pub(crate) async fn records_in_range(
        &self,
        user_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ServiceResult<Vec<Attendance>> {
        if start > end {
            return Err(ServiceError::InvalidDateRange { start, end });
        }
        let filter = AttendanceFilter {
            user_id: Some(user_id),
            from: Some(start),
            to: Some(end),
            ..Default::default()
        };
        Ok(self.attendance.find_all(&filter, None).await?)
    }

    pub async fn get_today(&self, user_id: u64) -> ServiceResult<Option<Attendance>> {
        self.record_for(user_id, self.clock.today()).await
    }

    pub async fn get_attendance(&self, id: u64) -> ServiceResult<Attendance> {
        fetch(self.attendance.as_ref(), id).await
    }

    pub async fn delete_attendance(&self, id: u64) -> ServiceResult<()> {
        remove(self.attendance.as_ref(), id).await?;
        tracing::info!(id, "Attendance deleted");
        Ok(())
    }

    pub async fn get_attendance_by_user(&self, user_id: u64, page: PageRequest) -> ServiceResult<Page<Attendance>> {
        let filter = AttendanceFilter {
            user_id: Some(user_id),
            ..Default::default()
        };
        Ok(find_page(self.attendance.as_ref(), &filter, page).await?)
    }

    pub async fn get_attendance_by_date(&self, date: NaiveDate) -> ServiceResult<Vec<Attendance>> {
        let filter = AttendanceFilter {
            date: Some(date),
            ..Default::default()
        };
        Ok(self.attendance.find_all(&filter, None).await?)
    }

    pub async fn get_attendance_by_department_and_date(
        &self,
        department: Department,
        date: NaiveDate,
    ) -> ServiceResult<Vec<Attendance>> {
        let members = self
            .users
            .find_all(
                &UserFilter {
                    department: Some(department),
                    ..Default::default()
                },
                None,
            )
            .await?;
        let filter = AttendanceFilter {
            user_ids: Some(members.iter().map(|u| u.id).collect()),
            date: Some(date),
            ..Default::default()
        };
        Ok(self.attendance.find_all(&filter, None).await?)
    }

    pub async fn get_attendance_by_status(
        &self,
        status: AttendanceStatus,
        date: Option<NaiveDate>,
    ) -> ServiceResult<Vec<Attendance>> {
        let filter = AttendanceFilter {
            status: Some(status),
            date,
            ..Default::default()
        };
        Ok(self.attendance.find_all(&filter, None).await?)
    }

    pub async fn search_attendance(
        &self,
        filter: &AttendanceFilter,
        page: PageRequest,
    ) -> ServiceResult<Page<Attendance>> {
        if let (Some(start), Some(end)) = (filter.from, filter.to) {
            if start > end {
                return Err(ServiceError::InvalidDateRange { start, end });
            }
        }
        Ok(find_page(self.attendance.as_ref(), filter, page).await?)
    }

    pub async fn is_owner(&self, id: u64, caller: &Caller) -> ServiceResult<bool> {
        let record = self.get_attendance(id).await?;
        self.guard.is_owner(caller, record.user_id).await
    }
}

/// Absent and leave marks cannot override a day that was punched; a half-day
/// mark cannot override a completed full day.
fn conflicts_with_mark(existing: &Attendance, status: AttendanceStatus) -> bool {
    match status {
        AttendanceStatus::HalfDay => {
            existing.has_complete_punches() && existing.status != AttendanceStatus::HalfDay
        }
        _ => existing.punch_in.is_some(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::model::role::Role;
    use crate::service::testing::{at, day, fixture};

    fn hq() -> PunchLocation {
        PunchLocation {
            location: Some("HQ".into()),
            latitude: Some(23.81),
            longitude: Some(90.41),
        }
    }

    #[actix_web::test]
    async fn full_day_is_eight_and_a_half_hours() {
        let fx = fixture();
        let user = fx.user("EMP-1", Role::Employee, Department::Engineering, None).await;
        let svc = &fx.services.attendance;
        let today = day(2025, 6, 2);

        fx.clock.set(at(today, 9, 0));
        let record = svc.punch_in(user.id, hq()).await.unwrap();
        assert_eq!(record.status, AttendanceStatus::Present);
        assert_eq!(record.punch_in_location.as_deref(), Some("HQ"));

        fx.clock.set(at(today, 17, 30));
        let record = svc.punch_out(user.id, PunchLocation::default()).await.unwrap();
        assert_eq!(record.working_minutes, 510);
        assert_eq!(record.status, AttendanceStatus::Present);

        assert_eq!(svc.get_working_hours(user.id, today).await.unwrap(), 8.5);
        assert!(svc.has_punched_in(user.id, today).await.unwrap());
        assert!(svc.has_punched_out(user.id, today).await.unwrap());
    }

    #[actix_web::test]
    async fn second_punch_in_fails() {
        let fx = fixture();
        let user = fx.user("EMP-1", Role::Employee, Department::Engineering, None).await;
        let svc = &fx.services.attendance;

        svc.punch_in(user.id, hq()).await.unwrap();
        fx.clock.advance(Duration::minutes(5));
        let err = svc.punch_in(user.id, hq()).await.unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyPunchedIn));
    }

    #[actix_web::test]
    async fn punch_out_requires_punch_in_and_happens_once() {
        let fx = fixture();
        let user = fx.user("EMP-1", Role::Employee, Department::Engineering, None).await;
        let svc = &fx.services.attendance;

        let err = svc.punch_out(user.id, hq()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NoPunchInFound));

        svc.punch_in(user.id, hq()).await.unwrap();
        fx.clock.advance(Duration::hours(8));
        svc.punch_out(user.id, hq()).await.unwrap();
        let err = svc.punch_out(user.id, hq()).await.unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyPunchedOut));
    }

    #[actix_web::test]
    async fn short_day_becomes_half_day() {
        let fx = fixture();
        let user = fx.user("EMP-1", Role::Employee, Department::Engineering, None).await;
        let svc = &fx.services.attendance;

        svc.punch_in(user.id, hq()).await.unwrap();
        fx.clock.advance(Duration::minutes(239));
        let record = svc.punch_out(user.id, hq()).await.unwrap();
        assert_eq!(record.status, AttendanceStatus::HalfDay);
        assert_eq!(record.working_minutes, 239);
    }

    #[actix_web::test]
    async fn working_hours_never_negative() {
        let fx = fixture();
        let user = fx.user("EMP-1", Role::Employee, Department::Engineering, None).await;
        let svc = &fx.services.attendance;
        let today = day(2025, 6, 2);

        fx.clock.set(at(today, 12, 0));
        svc.punch_in(user.id, hq()).await.unwrap();
        fx.clock.set(at(today, 11, 0));
        let record = svc.punch_out(user.id, hq()).await.unwrap();
        assert_eq!(record.working_minutes, 0);
        assert_eq!(svc.get_working_hours(user.id, today).await.unwrap(), 0.0);
    }

    #[actix_web::test]
    async fn total_hours_sum_daily_hours() {
        let fx = fixture();
        let user = fx.user("EMP-1", Role::Employee, Department::Engineering, None).await;
        let svc = &fx.services.attendance;

        let mut expected = 0.0;
        for (d, hours) in [(2u32, 8i64), (3, 6), (4, 9)] {
            let date = day(2025, 6, d);
            fx.clock.set(at(date, 9, 0));
            svc.punch_in(user.id, hq()).await.unwrap();
            fx.clock.set(at(date, 9, 0) + Duration::hours(hours) + Duration::minutes(15));
            svc.punch_out(user.id, hq()).await.unwrap();
            expected += svc.get_working_hours(user.id, date).await.unwrap();
        }

        let total = svc
            .get_total_working_hours(user.id, day(2025, 6, 1), day(2025, 6, 30))
            .await
            .unwrap();
        assert_eq!(total, expected);
        assert_eq!(total, 23.75);

        let none = svc
            .get_total_working_hours(user.id, day(2025, 7, 1), day(2025, 7, 31))
            .await
            .unwrap();
        assert_eq!(none, 0.0);

        let err = svc
            .get_total_working_hours(user.id, day(2025, 7, 2), day(2025, 7, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidDateRange { .. }));
    }

    #[actix_web::test]
    async fn absent_mark_conflicts_with_punches() {
        let fx = fixture();
        let user = fx.user("EMP-1", Role::Employee, Department::Engineering, None).await;
        let svc = &fx.services.attendance;
        let today = day(2025, 6, 2);

        svc.punch_in(user.id, hq()).await.unwrap();
        let err = svc.mark_absent(user.id, today, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::RecordAlreadyFinalized(d) if d == today));

        // an open day may still be turned into a half day
        let record = svc
            .mark_half_day(user.id, today, Some("doctor".into()))
            .await
            .unwrap();
        assert_eq!(record.status, AttendanceStatus::HalfDay);

        // and the mark survives the punch-out
        fx.clock.advance(Duration::hours(8));
        let record = svc.punch_out(user.id, hq()).await.unwrap();
        assert_eq!(record.status, AttendanceStatus::HalfDay);
    }

    #[actix_web::test]
    async fn half_day_mark_cannot_override_completed_day() {
        let fx = fixture();
        let user = fx.user("EMP-1", Role::Employee, Department::Engineering, None).await;
        let svc = &fx.services.attendance;
        let today = day(2025, 6, 2);

        svc.punch_in(user.id, hq()).await.unwrap();
        fx.clock.advance(Duration::hours(8));
        svc.punch_out(user.id, hq()).await.unwrap();

        let err = svc.mark_half_day(user.id, today, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::RecordAlreadyFinalized(_)));
    }

    #[actix_web::test]
    async fn marked_absent_day_rejects_punch_in() {
        let fx = fixture();
        let user = fx.user("EMP-1", Role::Employee, Department::Engineering, None).await;
        let svc = &fx.services.attendance;
        let today = day(2025, 6, 2);

        let record = svc
            .mark_absent(user.id, today, Some("no show".into()))
            .await
            .unwrap();
        assert_eq!(record.reason.as_deref(), Some("no show"));

        let err = svc.punch_in(user.id, hq()).await.unwrap_err();
        assert!(matches!(err, ServiceError::RecordAlreadyFinalized(_)));

        // re-marking overwrites instead of duplicating
        svc.mark_on_leave(user.id, today, None).await.unwrap();
        let day_records = svc.get_attendance_by_date(today).await.unwrap();
        assert_eq!(day_records.len(), 1);
        assert_eq!(day_records[0].status, AttendanceStatus::Leave);
    }

    #[actix_web::test]
    async fn mark_reason_is_length_checked() {
        let fx = fixture();
        let user = fx.user("EMP-1", Role::Employee, Department::Engineering, None).await;
        let svc = &fx.services.attendance;
        let today = day(2025, 6, 2);

        let err = svc
            .mark_absent(user.id, today, Some("x".repeat(501)))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref f) if f == &vec!["reason".to_string()]));
        assert!(svc.get_attendance_by_date(today).await.unwrap().is_empty());

        svc.mark_absent(user.id, today, Some("x".repeat(500))).await.unwrap();
    }

    #[actix_web::test]
    async fn unknown_user_cannot_punch() {
        let fx = fixture();
        let err = fx.services.attendance.punch_in(99, hq()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { entity: "user", .. }));
    }

    #[actix_web::test]
    async fn queries_by_department_status_and_user() {
        let fx = fixture();
        let eng = fx.user("EMP-1", Role::Employee, Department::Engineering, None).await;
        let sales = fx.user("EMP-2", Role::Employee, Department::Sales, None).await;
        let svc = &fx.services.attendance;
        let today = day(2025, 6, 2);

        svc.punch_in(eng.id, hq()).await.unwrap();
        svc.mark_absent(sales.id, today, None).await.unwrap();
        svc.mark_absent(eng.id, day(2025, 6, 1), None).await.unwrap();

        let engineering = svc
            .get_attendance_by_department_and_date(Department::Engineering, today)
            .await
            .unwrap();
        assert_eq!(engineering.len(), 1);
        assert_eq!(engineering[0].user_id, eng.id);

        let absent = svc
            .get_attendance_by_status(AttendanceStatus::Absent, Some(today))
            .await
            .unwrap();
        assert_eq!(absent.len(), 1);
        assert_eq!(absent[0].user_id, sales.id);

        let page = svc
            .get_attendance_by_user(eng.id, PageRequest::new(1, 10))
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.data[0].date, today);
        assert_eq!(svc.get_today(eng.id).await.unwrap().unwrap().id, page.data[0].id);
    }

    #[actix_web::test]
    async fn delete_missing_record_is_not_found() {
        let fx = fixture();
        let user = fx.user("EMP-1", Role::Employee, Department::Engineering, None).await;
        let svc = &fx.services.attendance;

        let record = svc.punch_in(user.id, hq()).await.unwrap();
        svc.delete_attendance(record.id).await.unwrap();
        let err = svc.delete_attendance(record.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[actix_web::test]
    async fn ownership_follows_reporting_line() {
        let fx = fixture();
        let boss = fx.user("MGR-1", Role::Manager, Department::Engineering, None).await;
        let report = fx.user("EMP-1", Role::Employee, Department::Engineering, Some(boss.id)).await;
        let other = fx.user("EMP-2", Role::Employee, Department::Engineering, None).await;
        let svc = &fx.services.attendance;

        let record = svc.punch_in(report.id, hq()).await.unwrap();
        assert!(svc.is_owner(record.id, &Caller::of(&report)).await.unwrap());
        assert!(svc.is_owner(record.id, &Caller::of(&boss)).await.unwrap());
        assert!(!svc.is_owner(record.id, &Caller::of(&other)).await.unwrap());
    }
}
