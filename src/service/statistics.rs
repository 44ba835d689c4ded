use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use strum::IntoEnumIterator;

use super::Stores;
use crate::clock::Clock;
use crate::error::{ServiceError, ServiceResult};
use crate::model::attendance::{Attendance, AttendanceFilter, AttendanceStatus, minutes_to_hours};
use crate::model::leave::{Leave, LeaveFilter, LeaveStatus, LeaveType};
use crate::model::payroll::{Payroll, PayrollFilter, PayrollStatus};
use crate::model::performance::{Performance, PerformanceFilter, PerformanceStatus};
use crate::model::statistics::{
    AttendanceStatistics, DepartmentAttendanceStatistics, LeaveStatistics, PayrollStatistics,
    PerformanceStatistics, UserAttendanceStatistics, rate,
};
use crate::model::user::{Department, User, UserFilter, UserStatus};
use crate::store::SharedStore;

/// Read-only aggregates computed on demand from the stores.
#[derive(Clone)]
pub struct StatisticsService {
    users: SharedStore<User>,
    attendance: SharedStore<Attendance>,
    leaves: SharedStore<Leave>,
    payrolls: SharedStore<Payroll>,
    performances: SharedStore<Performance>,
    clock: Arc<dyn Clock>,
}

impl StatisticsService {
    pub fn new(stores: &Stores, clock: Arc<dyn Clock>) -> Self {
        Self {
            users: stores.users.clone(),
            attendance: stores.attendance.clone(),
            leaves: stores.leaves.clone(),
            payrolls: stores.payrolls.clone(),
            performances: stores.performances.clone(),
            clock,
        }
    }

    /// Organisation-wide attendance for a day; `None` means today.
    pub async fn attendance_statistics(&self, date: Option<NaiveDate>) -> ServiceResult<AttendanceStatistics> {
        let date = date.unwrap_or_else(|| self.clock.today());
        let active = self.active_user_ids(None).await?;
        self.tally_day(date, active).await
    }

    pub async fn department_attendance_statistics(
        &self,
        department: Department,
        date: Option<NaiveDate>,
    ) -> ServiceResult<DepartmentAttendanceStatistics> {
        let date = date.unwrap_or_else(|| self.clock.today());
        let active = self.active_user_ids(Some(department)).await?;
        Ok(DepartmentAttendanceStatistics {
            department,
            attendance: self.tally_day(date, active).await?,
        })
    }

    pub async fn user_attendance_statistics(
        &self,
        user_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ServiceResult<UserAttendanceStatistics> {
        if start > end {
            return Err(ServiceError::InvalidDateRange { start, end });
        }
        let filter = AttendanceFilter {
            user_id: Some(user_id),
            from: Some(start),
            to: Some(end),
            ..Default::default()
        };
        let records = self.attendance.find_all(&filter, None).await?;

        let total_days = ((end - start).num_days() + 1) as u64;
        let present_days = count_status(&records, AttendanceStatus::Present);
        let half_days = count_status(&records, AttendanceStatus::HalfDay);

        let completed: Vec<&Attendance> = records.iter().filter(|r| r.has_complete_punches()).collect();
        let total_minutes: i64 = completed.iter().map(|r| r.worked_minutes()).sum();
        let total_working_hours = minutes_to_hours(total_minutes);
        let average_working_hours = if completed.is_empty() {
            0.0
        } else {
            total_working_hours / completed.len() as f64
        };

        Ok(UserAttendanceStatistics {
            user_id,
            start,
            end,
            total_days,
            present_days,
            half_days,
            absent_days: count_status(&records, AttendanceStatus::Absent),
            leave_days: count_status(&records, AttendanceStatus::Leave),
            total_working_hours,
            average_working_hours,
            attendance_rate: rate(present_days + half_days, total_days),
        })
    }

    /// Leave requests of one user or everyone, optionally limited to those
    /// touching a calendar year.
    pub async fn leave_statistics(&self, user_id: Option<u64>, year: Option<i32>) -> ServiceResult<LeaveStatistics> {
        let mut filter = LeaveFilter {
            user_id,
            ..Default::default()
        };
        if let Some(year) = year {
            filter.from = NaiveDate::from_ymd_opt(year, 1, 1);
            filter.to = NaiveDate::from_ymd_opt(year, 12, 31);
        }
        let leaves = self.leaves.find_all(&filter, None).await?;

        let count = |status: LeaveStatus| leaves.iter().filter(|l| l.status == status).count() as u64;
        let total = leaves.len() as u64;
        let approved = count(LeaveStatus::Approved);
        let rejected = count(LeaveStatus::Rejected);

        let by_type: BTreeMap<String, u64> = LeaveType::iter()
            .map(|t| {
                let n = leaves.iter().filter(|l| l.leave_type == t).count() as u64;
                (t.to_string(), n)
            })
            .collect();

        Ok(LeaveStatistics {
            total,
            pending: count(LeaveStatus::Pending),
            approved,
            rejected,
            cancelled: count(LeaveStatus::Cancelled),
            by_type,
            approved_days: leaves
                .iter()
                .filter(|l| l.status == LeaveStatus::Approved)
                .map(Leave::days)
                .sum(),
            approval_rate: rate(approved, total),
            rejection_rate: rate(rejected, total),
        })
    }

    pub async fn payroll_statistics(&self, month: u32, year: i32) -> ServiceResult<PayrollStatistics> {
        if !(1..=12).contains(&month) {
            return Err(ServiceError::invalid("month"));
        }
        let filter = PayrollFilter {
            month: Some(month),
            year: Some(year),
            ..Default::default()
        };
        let payrolls = self.payrolls.find_all(&filter, None).await?;

        let count = |status: PayrollStatus| payrolls.iter().filter(|p| p.status == status).count() as u64;
        let total = payrolls.len() as u64;
        let paid = count(PayrollStatus::Paid);
        let total_net: f64 = payrolls.iter().map(|p| p.net_salary).sum();

        Ok(PayrollStatistics {
            month,
            year,
            total,
            pending: count(PayrollStatus::Pending),
            processed: count(PayrollStatus::Processed),
            paid,
            total_gross: payrolls.iter().map(|p| p.gross_salary).sum(),
            total_deductions: payrolls.iter().map(|p| p.deductions).sum(),
            total_net,
            average_net: if total == 0 { 0.0 } else { total_net / total as f64 },
            paid_rate: rate(paid, total),
        })
    }

    pub async fn performance_statistics(&self, user_id: Option<u64>) -> ServiceResult<PerformanceStatistics> {
        let filter = PerformanceFilter {
            user_id,
            ..Default::default()
        };
        let reviews = self.performances.find_all(&filter, None).await?;

        let count =
            |status: PerformanceStatus| reviews.iter().filter(|p| p.status == status).count() as u64;
        let total = reviews.len() as u64;
        let completed = count(PerformanceStatus::Completed);

        let ratings: Vec<u8> = reviews.iter().filter_map(|p| p.rating).collect();
        let average_rating = if ratings.is_empty() {
            0.0
        } else {
            ratings.iter().map(|r| *r as f64).sum::<f64>() / ratings.len() as f64
        };

        Ok(PerformanceStatistics {
            total,
            pending: count(PerformanceStatus::Pending),
            under_review: count(PerformanceStatus::UnderReview),
            completed,
            rejected: count(PerformanceStatus::Rejected),
            average_rating,
            completion_rate: rate(completed, total),
        })
    }

    /// Month-to-date attendance ending at `date`.
    pub async fn month_to_date(&self, user_id: u64, date: NaiveDate) -> ServiceResult<UserAttendanceStatistics> {
        let start = date.with_day(1).unwrap_or(date);
        self.user_attendance_statistics(user_id, start, date).await
    }

    async fn active_user_ids(&self, department: Option<Department>) -> ServiceResult<Vec<u64>> {
        let filter = UserFilter {
            status: Some(UserStatus::Active),
            department,
            ..Default::default()
        };
        let users = self.users.find_all(&filter, None).await?;
        Ok(users.into_iter().map(|u| u.id).collect())
    }

    async fn tally_day(&self, date: NaiveDate, user_ids: Vec<u64>) -> ServiceResult<AttendanceStatistics> {
        let total_employees = user_ids.len() as u64;
        let filter = AttendanceFilter {
            user_ids: Some(user_ids),
            date: Some(date),
            ..Default::default()
        };
        let records = self.attendance.find_all(&filter, None).await?;

        let present = count_status(&records, AttendanceStatus::Present);
        let half_day = count_status(&records, AttendanceStatus::HalfDay);
        let absent = count_status(&records, AttendanceStatus::Absent);
        let on_leave = count_status(&records, AttendanceStatus::Leave);

        Ok(AttendanceStatistics {
            date,
            total_employees,
            present,
            half_day,
            absent,
            on_leave,
            not_marked: total_employees.saturating_sub(records.len() as u64),
            attendance_rate: rate(present + half_day, total_employees),
            absentee_rate: rate(absent, total_employees),
            leave_rate: rate(on_leave, total_employees),
        })
    }
}

fn count_status(records: &[Attendance], status: AttendanceStatus) -> u64 {
    records.iter().filter(|r| r.status == status).count() as u64
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::model::attendance::PunchLocation;
    use crate::model::leave::CreateLeave;
    use crate::model::payroll::CreatePayroll;
    use crate::model::performance::{ReviewPerformance, ReviewType, SubmitPerformance};
    use crate::model::role::Role;
    use crate::service::testing::{at, day, fixture};

    #[actix_web::test]
    async fn empty_organisation_has_zero_rates() {
        let fx = fixture();
        let stats = fx.services.statistics.attendance_statistics(None).await.unwrap();
        assert_eq!(stats.date, day(2025, 6, 2));
        assert_eq!(stats.total_employees, 0);
        assert_eq!(stats.attendance_rate, 0.0);
        assert_eq!(stats.absentee_rate, 0.0);
        assert_eq!(stats.leave_rate, 0.0);

        let leaves = fx.services.statistics.leave_statistics(None, None).await.unwrap();
        assert_eq!(leaves.approval_rate, 0.0);
        let payroll = fx.services.statistics.payroll_statistics(6, 2025).await.unwrap();
        assert_eq!(payroll.paid_rate, 0.0);
        assert_eq!(payroll.average_net, 0.0);
        let perf = fx.services.statistics.performance_statistics(None).await.unwrap();
        assert_eq!(perf.completion_rate, 0.0);
        assert_eq!(perf.average_rating, 0.0);
    }

    #[actix_web::test]
    async fn attendance_rates_are_ratios_of_headcount() {
        let fx = fixture();
        let a = fx.user("EMP-1", Role::Employee, Department::Engineering, None).await;
        let b = fx.user("EMP-2", Role::Employee, Department::Engineering, None).await;
        let c = fx.user("EMP-3", Role::Employee, Department::Sales, None).await;
        fx.user("EMP-4", Role::Employee, Department::Sales, None).await;
        let today = day(2025, 6, 2);
        let attendance = &fx.services.attendance;

        attendance.punch_in(a.id, PunchLocation::default()).await.unwrap();
        attendance.mark_absent(b.id, today, None).await.unwrap();
        attendance.mark_on_leave(c.id, today, None).await.unwrap();

        let stats = fx.services.statistics.attendance_statistics(Some(today)).await.unwrap();
        assert_eq!(stats.total_employees, 4);
        assert_eq!((stats.present, stats.absent, stats.on_leave, stats.not_marked), (1, 1, 1, 1));
        assert_eq!(stats.attendance_rate, 0.25);
        assert_eq!(stats.absentee_rate, 0.25);
        assert_eq!(stats.leave_rate, 0.25);

        let eng = fx
            .services
            .statistics
            .department_attendance_statistics(Department::Engineering, Some(today))
            .await
            .unwrap();
        assert_eq!(eng.attendance.total_employees, 2);
        assert_eq!(eng.attendance.attendance_rate, 0.5);
        assert_eq!(eng.attendance.absentee_rate, 0.5);
    }

    #[actix_web::test]
    async fn user_statistics_over_a_week() {
        let fx = fixture();
        let user = fx.user("EMP-1", Role::Employee, Department::Engineering, None).await;
        let attendance = &fx.services.attendance;

        for d in 2..=4 {
            let date = day(2025, 6, d);
            fx.clock.set(at(date, 9, 0));
            attendance.punch_in(user.id, PunchLocation::default()).await.unwrap();
            fx.clock.advance(Duration::hours(8));
            attendance.punch_out(user.id, PunchLocation::default()).await.unwrap();
        }
        attendance.mark_absent(user.id, day(2025, 6, 5), None).await.unwrap();

        let stats = fx
            .services
            .statistics
            .user_attendance_statistics(user.id, day(2025, 6, 2), day(2025, 6, 9))
            .await
            .unwrap();
        assert_eq!(stats.total_days, 8);
        assert_eq!(stats.present_days, 3);
        assert_eq!(stats.absent_days, 1);
        assert_eq!(stats.total_working_hours, 24.0);
        assert_eq!(stats.average_working_hours, 8.0);
        assert_eq!(stats.attendance_rate, 3.0 / 8.0);

        let err = fx
            .services
            .statistics
            .user_attendance_statistics(user.id, day(2025, 6, 9), day(2025, 6, 2))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidDateRange { .. }));
    }

    #[actix_web::test]
    async fn leave_and_payroll_breakdowns() {
        let fx = fixture();
        let hr = fx.user("HR-1", Role::Hr, Department::Hr, None).await;
        let user = fx.user("EMP-1", Role::Employee, Department::Engineering, None).await;
        let leaves = &fx.services.leaves;

        let first = leaves
            .apply_leave(
                user.id,
                CreateLeave {
                    start_date: day(2025, 6, 10),
                    end_date: day(2025, 6, 12),
                    leave_type: LeaveType::Annual,
                    reason: None,
                },
            )
            .await
            .unwrap();
        leaves
            .apply_leave(
                user.id,
                CreateLeave {
                    start_date: day(2025, 7, 1),
                    end_date: day(2025, 7, 1),
                    leave_type: LeaveType::Sick,
                    reason: None,
                },
            )
            .await
            .unwrap();
        let third = leaves
            .apply_leave(
                user.id,
                CreateLeave {
                    start_date: day(2025, 8, 4),
                    end_date: day(2025, 8, 5),
                    leave_type: LeaveType::Annual,
                    reason: None,
                },
            )
            .await
            .unwrap();
        leaves
            .approve_leave(first.id, &crate::access::Caller::of(&hr))
            .await
            .unwrap();
        leaves
            .reject_leave(third.id, &crate::access::Caller::of(&hr), "audit month".into())
            .await
            .unwrap();

        let stats = fx
            .services
            .statistics
            .leave_statistics(Some(user.id), Some(2025))
            .await
            .unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!((stats.approved, stats.pending, stats.rejected), (1, 1, 1));
        assert_eq!(stats.approved_days, 3);
        assert_eq!(stats.approval_rate, 1.0 / 3.0);
        assert_eq!(stats.rejection_rate, 1.0 / 3.0);
        assert_eq!(stats.by_type["ANNUAL"], 2);
        assert_eq!(stats.by_type["UNPAID"], 0);

        let payroll = &fx.services.payroll;
        let p = payroll
            .create_payroll(CreatePayroll {
                user_id: user.id,
                month: 6,
                year: 2025,
                base_salary: 1000.0,
                allowances: 100.0,
                deductions: 50.0,
            })
            .await
            .unwrap();
        payroll.process_payroll(p.id).await.unwrap();
        payroll.mark_as_paid(p.id).await.unwrap();
        payroll
            .create_payroll(CreatePayroll {
                user_id: hr.id,
                month: 6,
                year: 2025,
                base_salary: 2000.0,
                allowances: 0.0,
                deductions: 0.0,
            })
            .await
            .unwrap();

        let stats = fx.services.statistics.payroll_statistics(6, 2025).await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.paid, 1);
        assert_eq!(stats.total_gross, 3100.0);
        assert_eq!(stats.total_net, 3050.0);
        assert_eq!(stats.average_net, 1525.0);
        assert_eq!(stats.paid_rate, 0.5);

        let err = fx.services.statistics.payroll_statistics(13, 2025).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[actix_web::test]
    async fn performance_completion_and_average_rating() {
        let fx = fixture();
        let hr = fx.user("HR-1", Role::Hr, Department::Hr, None).await;
        let user = fx.user("EMP-1", Role::Employee, Department::Engineering, None).await;
        let other = fx.user("EMP-2", Role::Employee, Department::Engineering, None).await;
        let reviewer = crate::access::Caller::of(&hr);
        let perf = &fx.services.performance;

        let quarter = |q: u32| SubmitPerformance {
            review_type: ReviewType::Quarterly,
            period_start: day(2025, 3 * q - 2, 1),
            period_end: day(2025, 3 * q, 28),
            goals: None,
            self_assessment: None,
        };
        let review = |rating: u8| ReviewPerformance {
            rating,
            comments: "noted".into(),
        };

        let completed = perf.submit_performance(user.id, quarter(1)).await.unwrap();
        perf.review_performance(completed.id, &reviewer, review(5)).await.unwrap();
        perf.approve_performance(completed.id, &reviewer).await.unwrap();

        let rejected = perf.submit_performance(user.id, quarter(2)).await.unwrap();
        perf.review_performance(rejected.id, &reviewer, review(3)).await.unwrap();
        perf.reject_performance(rejected.id, &reviewer, "missing goals".into())
            .await
            .unwrap();

        let reviewing = perf.submit_performance(user.id, quarter(3)).await.unwrap();
        perf.review_performance(reviewing.id, &reviewer, review(4)).await.unwrap();

        perf.submit_performance(user.id, quarter(4)).await.unwrap();
        perf.submit_performance(other.id, quarter(1)).await.unwrap();

        let stats = fx
            .services
            .statistics
            .performance_statistics(Some(user.id))
            .await
            .unwrap();
        assert_eq!(stats.total, 4);
        assert_eq!(
            (stats.pending, stats.under_review, stats.completed, stats.rejected),
            (1, 1, 1, 1)
        );
        assert_eq!(stats.completion_rate, 0.25);
        assert_eq!(stats.average_rating, 4.0);

        let everyone = fx.services.statistics.performance_statistics(None).await.unwrap();
        assert_eq!(everyone.total, 5);
        assert_eq!(everyone.completion_rate, 0.2);
        assert_eq!(everyone.average_rating, 4.0);
    }
}
