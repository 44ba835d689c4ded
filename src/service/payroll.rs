use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use tracing::instrument;
use validator::Validate;

use super::{Guard, fetch};
use crate::access::Caller;
use crate::clock::Clock;
use crate::error::{ServiceError, ServiceResult};
use crate::model::attendance::{Attendance, AttendanceFilter, AttendanceStatus};
use crate::model::payroll::{
    CreatePayroll, GeneratePayroll, Payroll, PayrollBatchReport, PayrollFailure, PayrollFilter,
    PayrollStatus, UpdatePayroll,
};
use crate::model::user::{User, UserFilter, UserStatus};
use crate::store::{Entity, Page, PageRequest, SharedStore, find_page};

/// Monthly payroll: PENDING -> PROCESSED -> PAID.
#[derive(Clone)]
pub struct PayrollService {
    payrolls: SharedStore<Payroll>,
    users: SharedStore<User>,
    attendance: SharedStore<Attendance>,
    guard: Guard,
    clock: Arc<dyn Clock>,
}

impl PayrollService {
    pub fn new(
        payrolls: SharedStore<Payroll>,
        users: SharedStore<User>,
        attendance: SharedStore<Attendance>,
        guard: Guard,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            payrolls,
            users,
            attendance,
            guard,
            clock,
        }
    }

    #[instrument(skip(self, req), fields(user_id = req.user_id, month = req.month, year = req.year))]
    pub async fn create_payroll(&self, req: CreatePayroll) -> ServiceResult<Payroll> {
        req.validate()?;
        fetch(self.users.as_ref(), req.user_id).await?;

        let now = self.clock.now();
        let mut payroll = Payroll {
            id: 0,
            user_id: req.user_id,
            month: req.month,
            year: req.year,
            base_salary: req.base_salary,
            allowances: req.allowances,
            deductions: req.deductions,
            gross_salary: 0.0,
            net_salary: 0.0,
            status: PayrollStatus::Pending,
            processed_at: None,
            paid_at: None,
            created_at: now,
            updated_at: now,
        };
        payroll.recalculate();

        let payroll = self.payrolls.save(payroll).await?;
        tracing::info!(id = payroll.id, net = payroll.net_salary, "Payroll created");
        Ok(payroll)
    }

    pub async fn update_payroll(&self, id: u64, update: UpdatePayroll) -> ServiceResult<Payroll> {
        update.validate()?;
        let mut payroll = self.get_payroll(id).await?;
        if payroll.status != PayrollStatus::Pending {
            return Err(ServiceError::transition(Payroll::NAME, payroll.status, "update"));
        }

        if let Some(base) = update.base_salary {
            payroll.base_salary = base;
        }
        if let Some(allowances) = update.allowances {
            payroll.allowances = allowances;
        }
        if let Some(deductions) = update.deductions {
            payroll.deductions = deductions;
        }
        payroll.recalculate();
        payroll.updated_at = self.clock.now();

        Ok(self.payrolls.save(payroll).await?)
    }

    pub async fn process_payroll(&self, id: u64) -> ServiceResult<Payroll> {
        let mut payroll = self.get_payroll(id).await?;
        if payroll.status != PayrollStatus::Pending {
            return Err(ServiceError::transition(Payroll::NAME, payroll.status, "process"));
        }
        let now = self.clock.now();
        payroll.status = PayrollStatus::Processed;
        payroll.processed_at = Some(now);
        payroll.updated_at = now;

        let payroll = self.payrolls.save(payroll).await?;
        tracing::info!(id, "Payroll processed");
        Ok(payroll)
    }

    pub async fn mark_as_paid(&self, id: u64) -> ServiceResult<Payroll> {
        let mut payroll = self.get_payroll(id).await?;
        if payroll.status != PayrollStatus::Processed {
            return Err(ServiceError::transition(Payroll::NAME, payroll.status, "pay"));
        }
        let now = self.clock.now();
        payroll.status = PayrollStatus::Paid;
        payroll.paid_at = Some(now);
        payroll.updated_at = now;

        let payroll = self.payrolls.save(payroll).await?;
        tracing::info!(id, "Payroll paid");
        Ok(payroll)
    }

    /// One PENDING payroll per active employee. Employees that cannot be
    /// paid are listed in the report's failures instead of being skipped.
    #[instrument(skip(self))]
    pub async fn generate_payroll(&self, month: u32, year: i32) -> ServiceResult<PayrollBatchReport> {
        GeneratePayroll { month, year }.validate()?;

        let active = UserFilter {
            status: Some(UserStatus::Active),
            ..Default::default()
        };
        let users = self.users.find_all(&active, None).await?;

        let mut report = PayrollBatchReport {
            month,
            year,
            generated: Vec::new(),
            failures: Vec::new(),
        };

        for user in users {
            match self.generate_for(&user, month, year).await {
                Ok(payroll) => report.generated.push(payroll),
                Err(e) => {
                    tracing::warn!(user_id = user.id, error = %e, "Payroll generation failed");
                    report.failures.push(PayrollFailure {
                        user_id: user.id,
                        employee_id: user.employee_id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            generated = report.generated.len(),
            failed = report.failures.len(),
            "Payroll batch finished"
        );
        Ok(report)
    }

    async fn generate_for(&self, user: &User, month: u32, year: i32) -> ServiceResult<Payroll> {
        if user.base_salary <= 0.0 {
            return Err(ServiceError::invalid("base_salary"));
        }
        let (first, last) = month_bounds(month, year).ok_or_else(|| ServiceError::invalid("month"))?;

        let filter = AttendanceFilter {
            user_id: Some(user.id),
            from: Some(first),
            to: Some(last),
            ..Default::default()
        };
        let records = self.attendance.find_all(&filter, None).await?;
        let unpaid_days: f64 = records
            .iter()
            .map(|r| match r.status {
                AttendanceStatus::Absent => 1.0,
                AttendanceStatus::HalfDay => 0.5,
                _ => 0.0,
            })
            .sum();

        let daily_rate = user.base_salary / last.day() as f64;
        self.create_payroll(CreatePayroll {
            user_id: user.id,
            month,
            year,
            base_salary: user.base_salary,
            allowances: 0.0,
            deductions: round_money(unpaid_days * daily_rate),
        })
        .await
    }

    pub async fn get_payroll(&self, id: u64) -> ServiceResult<Payroll> {
        fetch(self.payrolls.as_ref(), id).await
    }

    pub async fn list_payrolls(&self, filter: &PayrollFilter, page: PageRequest) -> ServiceResult<Page<Payroll>> {
        Ok(find_page(self.payrolls.as_ref(), filter, page).await?)
    }

    pub async fn get_payrolls_by_user(&self, user_id: u64, page: PageRequest) -> ServiceResult<Page<Payroll>> {
        let filter = PayrollFilter {
            user_id: Some(user_id),
            ..Default::default()
        };
        self.list_payrolls(&filter, page).await
    }

    pub async fn delete_payroll(&self, id: u64) -> ServiceResult<()> {
        let payroll = self.get_payroll(id).await?;
        if payroll.status != PayrollStatus::Pending {
            return Err(ServiceError::transition(Payroll::NAME, payroll.status, "delete"));
        }
        self.payrolls.delete(id).await?;
        tracing::info!(id, "Payroll deleted");
        Ok(())
    }

    pub async fn is_owner(&self, id: u64, caller: &Caller) -> ServiceResult<bool> {
        let payroll = self.get_payroll(id).await?;
        self.guard.is_owner(caller, payroll.user_id).await
    }
}

/// First and last day of a month.
fn month_bounds(month: u32, year: i32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next.pred_opt()?))
}

fn round_money(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;
    use crate::model::user::Department;
    use crate::service::testing::{day, fixture};
    use crate::store::Store;

    fn request(user_id: u64) -> CreatePayroll {
        CreatePayroll {
            user_id,
            month: 6,
            year: 2025,
            base_salary: 3000.0,
            allowances: 200.0,
            deductions: 100.0,
        }
    }

    #[test]
    fn month_bounds_handle_february_and_december() {
        assert_eq!(month_bounds(2, 2024), Some((day(2024, 2, 1), day(2024, 2, 29))));
        assert_eq!(month_bounds(12, 2025), Some((day(2025, 12, 1), day(2025, 12, 31))));
        assert_eq!(month_bounds(13, 2025), None);
    }

    #[actix_web::test]
    async fn lifecycle_runs_in_order() {
        let fx = fixture();
        let user = fx.user("EMP-1", Role::Employee, Department::Engineering, None).await;
        let svc = &fx.services.payroll;

        let payroll = svc.create_payroll(request(user.id)).await.unwrap();
        assert_eq!(payroll.gross_salary, 3200.0);
        assert_eq!(payroll.net_salary, 3100.0);

        let err = svc.mark_as_paid(payroll.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidStateTransition { .. }));

        let payroll = svc
            .update_payroll(
                payroll.id,
                UpdatePayroll {
                    allowances: Some(500.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(payroll.net_salary, 3400.0);

        let processed = svc.process_payroll(payroll.id).await.unwrap();
        assert!(processed.processed_at.is_some());
        let err = svc.update_payroll(payroll.id, UpdatePayroll::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidStateTransition { .. }));

        let paid = svc.mark_as_paid(payroll.id).await.unwrap();
        assert_eq!(paid.status, PayrollStatus::Paid);
        for result in [
            svc.process_payroll(payroll.id).await,
            svc.mark_as_paid(payroll.id).await,
        ] {
            assert!(matches!(result, Err(ServiceError::InvalidStateTransition { .. })));
        }
        let err = svc.delete_payroll(payroll.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidStateTransition { .. }));
    }

    #[actix_web::test]
    async fn one_payroll_per_period() {
        let fx = fixture();
        let user = fx.user("EMP-1", Role::Employee, Department::Engineering, None).await;
        let svc = &fx.services.payroll;

        svc.create_payroll(request(user.id)).await.unwrap();
        let err = svc.create_payroll(request(user.id)).await.unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateKey(ref key) if key == "user_period"));
    }

    #[actix_web::test]
    async fn batch_deducts_unpaid_days_and_reports_failures() {
        let fx = fixture();
        let worker = fx.user("EMP-1", Role::Employee, Department::Engineering, None).await;
        let mut unsalaried = fx.user("EMP-2", Role::Employee, Department::Engineering, None).await;
        unsalaried.base_salary = 0.0;
        fx.stores.users.save(unsalaried.clone()).await.unwrap();
        let already = fx.user("EMP-3", Role::Employee, Department::Sales, None).await;

        let attendance = &fx.services.attendance;
        attendance.mark_absent(worker.id, day(2025, 6, 3), None).await.unwrap();
        attendance.mark_half_day(worker.id, day(2025, 6, 4), None).await.unwrap();

        let svc = &fx.services.payroll;
        svc.create_payroll(request(already.id)).await.unwrap();

        let report = svc.generate_payroll(6, 2025).await.unwrap();
        assert!(!report.is_complete());
        assert_eq!(report.generated.len(), 1);
        assert_eq!(report.failures.len(), 2);

        let generated = &report.generated[0];
        assert_eq!(generated.user_id, worker.id);
        // 1.5 unpaid days at 3000 / 30
        assert_eq!(generated.deductions, 150.0);
        assert_eq!(generated.net_salary, 2850.0);

        let mut failed: Vec<u64> = report.failures.iter().map(|f| f.user_id).collect();
        failed.sort();
        assert_eq!(failed, vec![unsalaried.id, already.id]);

        let err = svc.generate_payroll(0, 2025).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[actix_web::test]
    async fn listing_by_user() {
        let fx = fixture();
        let user = fx.user("EMP-1", Role::Employee, Department::Engineering, None).await;
        let svc = &fx.services.payroll;

        for month in [4, 5, 6] {
            svc.create_payroll(CreatePayroll {
                month,
                ..request(user.id)
            })
            .await
            .unwrap();
        }

        let page = svc.get_payrolls_by_user(user.id, PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.data.iter().map(|p| p.month).collect::<Vec<_>>(), vec![6, 5, 4]);
        assert!(svc.is_owner(page.data[0].id, &Caller::of(&user)).await.unwrap());

        svc.delete_payroll(page.data[0].id).await.unwrap();
        let err = svc.get_payroll(page.data[0].id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }
}
