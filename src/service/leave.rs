use std::sync::Arc;

use tracing::instrument;
use validator::Validate;

use super::{Guard, fetch};
use crate::access::{Action, Caller};
use crate::clock::Clock;
use crate::error::{ServiceError, ServiceResult};
use crate::model::leave::{CreateLeave, Leave, LeaveFilter, LeaveStatus, RejectLeave};
use crate::store::{Entity, Page, PageRequest, SharedStore, find_page};

/// Leave requests: PENDING -> APPROVED | REJECTED | CANCELLED.
#[derive(Clone)]
pub struct LeaveService {
    leaves: SharedStore<Leave>,
    guard: Guard,
    clock: Arc<dyn Clock>,
    allow_cancel_approved: bool,
}

impl LeaveService {
    pub fn new(leaves: SharedStore<Leave>, guard: Guard, clock: Arc<dyn Clock>, allow_cancel_approved: bool) -> Self {
        Self {
            leaves,
            guard,
            clock,
            allow_cancel_approved,
        }
    }

    #[instrument(skip(self, req))]
    pub async fn apply_leave(&self, user_id: u64, req: CreateLeave) -> ServiceResult<Leave> {
        req.validate()?;
        if req.start_date > req.end_date {
            return Err(ServiceError::InvalidDateRange {
                start: req.start_date,
                end: req.end_date,
            });
        }
        self.guard.owner(user_id).await?;

        let overlapping = LeaveFilter {
            user_id: Some(user_id),
            from: Some(req.start_date),
            to: Some(req.end_date),
            ..Default::default()
        };
        let clash = self
            .leaves
            .find_all(&overlapping, None)
            .await?
            .into_iter()
            .any(|l| l.status.is_active());
        if clash {
            return Err(ServiceError::Validation(vec![
                "start_date".to_string(),
                "end_date".to_string(),
            ]));
        }

        let now = self.clock.now();
        let leave = self
            .leaves
            .save(Leave {
                id: 0,
                user_id,
                leave_type: req.leave_type,
                start_date: req.start_date,
                end_date: req.end_date,
                reason: req.reason,
                status: LeaveStatus::Pending,
                approver_id: None,
                rejection_reason: None,
                created_at: now,
                updated_at: now,
            })
            .await?;

        tracing::info!(id = leave.id, user_id, days = leave.days(), "Leave requested");
        Ok(leave)
    }

    pub async fn approve_leave(&self, id: u64, approver: &Caller) -> ServiceResult<Leave> {
        let mut leave = self.decidable(id, approver).await?;
        leave.status = LeaveStatus::Approved;
        leave.approver_id = Some(approver.user_id);
        leave.updated_at = self.clock.now();

        let leave = self.leaves.save(leave).await?;
        tracing::info!(id, approver = approver.user_id, "Leave approved");
        Ok(leave)
    }

    pub async fn reject_leave(&self, id: u64, approver: &Caller, reason: String) -> ServiceResult<Leave> {
        let rejection = RejectLeave { reason };
        rejection.validate()?;
        let reason = rejection.reason;
        if reason.trim().is_empty() {
            return Err(ServiceError::invalid("reason"));
        }
        let mut leave = self.decidable(id, approver).await?;
        leave.status = LeaveStatus::Rejected;
        leave.approver_id = Some(approver.user_id);
        leave.rejection_reason = Some(reason);
        leave.updated_at = self.clock.now();

        let leave = self.leaves.save(leave).await?;
        tracing::info!(id, approver = approver.user_id, "Leave rejected");
        Ok(leave)
    }

    /// A pending request the approver may decide on.
    async fn decidable(&self, id: u64, approver: &Caller) -> ServiceResult<Leave> {
        let leave = self.get_leave(id).await?;
        self.guard.require(approver, leave.user_id, Action::Approve).await?;
        if leave.status != LeaveStatus::Pending {
            return Err(ServiceError::transition(Leave::NAME, leave.status, "decide"));
        }
        Ok(leave)
    }

    pub async fn cancel_leave(&self, id: u64, caller: &Caller) -> ServiceResult<Leave> {
        let mut leave = self.get_leave(id).await?;
        self.guard.require(caller, leave.user_id, Action::Mutate).await?;

        match leave.status {
            LeaveStatus::Pending => {}
            LeaveStatus::Approved if self.allow_cancel_approved => {}
            other => return Err(ServiceError::transition(Leave::NAME, other, "cancel")),
        }

        leave.status = LeaveStatus::Cancelled;
        leave.updated_at = self.clock.now();
        let leave = self.leaves.save(leave).await?;
        tracing::info!(id, caller = caller.user_id, "Leave cancelled");
        Ok(leave)
    }

    pub async fn get_leave(&self, id: u64) -> ServiceResult<Leave> {
        fetch(self.leaves.as_ref(), id).await
    }

    pub async fn list_leaves(&self, filter: &LeaveFilter, page: PageRequest) -> ServiceResult<Page<Leave>> {
        Ok(find_page(self.leaves.as_ref(), filter, page).await?)
    }

    pub async fn get_leaves_by_user(&self, user_id: u64, page: PageRequest) -> ServiceResult<Page<Leave>> {
        let filter = LeaveFilter {
            user_id: Some(user_id),
            ..Default::default()
        };
        self.list_leaves(&filter, page).await
    }

    pub async fn get_pending_leaves(&self, page: PageRequest) -> ServiceResult<Page<Leave>> {
        let filter = LeaveFilter {
            status: Some(LeaveStatus::Pending),
            ..Default::default()
        };
        self.list_leaves(&filter, page).await
    }

    pub async fn count_leaves(&self, filter: &LeaveFilter) -> ServiceResult<u64> {
        Ok(self.leaves.count(filter).await?)
    }

    /// Only undecided or withdrawn requests can be removed.
    pub async fn delete_leave(&self, id: u64) -> ServiceResult<()> {
        let leave = self.get_leave(id).await?;
        if !matches!(leave.status, LeaveStatus::Pending | LeaveStatus::Cancelled) {
            return Err(ServiceError::transition(Leave::NAME, leave.status, "delete"));
        }
        self.leaves.delete(id).await?;
        tracing::info!(id, "Leave deleted");
        Ok(())
    }

    pub async fn is_owner(&self, id: u64, caller: &Caller) -> ServiceResult<bool> {
        let leave = self.get_leave(id).await?;
        self.guard.is_owner(caller, leave.user_id).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::model::leave::LeaveType;
    use crate::model::role::Role;
    use crate::model::user::Department;
    use crate::service::testing::{day, fixture};

    fn request(start: NaiveDate, end: NaiveDate) -> CreateLeave {
        CreateLeave {
            start_date: start,
            end_date: end,
            leave_type: LeaveType::Annual,
            reason: Some("holiday".into()),
        }
    }

    #[actix_web::test]
    async fn manager_approves_report() {
        let fx = fixture();
        let boss = fx.user("MGR-1", Role::Manager, Department::Engineering, None).await;
        let user = fx.user("EMP-1", Role::Employee, Department::Engineering, Some(boss.id)).await;
        let svc = &fx.services.leaves;

        let leave = svc
            .apply_leave(user.id, request(day(2025, 6, 10), day(2025, 6, 12)))
            .await
            .unwrap();
        assert_eq!(leave.status, LeaveStatus::Pending);

        let leave = svc.approve_leave(leave.id, &Caller::of(&boss)).await.unwrap();
        assert_eq!(leave.status, LeaveStatus::Approved);
        assert_eq!(leave.approver_id, Some(boss.id));
    }

    #[actix_web::test]
    async fn nobody_but_admin_approves_own_request() {
        let fx = fixture();
        let hr = fx.user("HR-1", Role::Hr, Department::Hr, None).await;
        let admin = fx.user("ADM-1", Role::Admin, Department::Hr, None).await;
        let svc = &fx.services.leaves;

        let leave = svc
            .apply_leave(hr.id, request(day(2025, 6, 10), day(2025, 6, 10)))
            .await
            .unwrap();
        let err = svc.approve_leave(leave.id, &Caller::of(&hr)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotAuthorized(_)));

        let own = svc
            .apply_leave(admin.id, request(day(2025, 6, 20), day(2025, 6, 20)))
            .await
            .unwrap();
        svc.approve_leave(own.id, &Caller::of(&admin)).await.unwrap();
    }

    #[actix_web::test]
    async fn cancelled_leave_cannot_be_approved() {
        let fx = fixture();
        let hr = fx.user("HR-1", Role::Hr, Department::Hr, None).await;
        let user = fx.user("EMP-1", Role::Employee, Department::Engineering, None).await;
        let svc = &fx.services.leaves;

        let leave = svc
            .apply_leave(user.id, request(day(2025, 6, 10), day(2025, 6, 11)))
            .await
            .unwrap();
        svc.cancel_leave(leave.id, &Caller::of(&user)).await.unwrap();

        let err = svc.approve_leave(leave.id, &Caller::of(&hr)).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidStateTransition { .. }));
        let err = svc.cancel_leave(leave.id, &Caller::of(&user)).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidStateTransition { .. }));
    }

    #[actix_web::test]
    async fn rejected_leave_is_terminal() {
        let fx = fixture();
        let hr = fx.user("HR-1", Role::Hr, Department::Hr, None).await;
        let user = fx.user("EMP-1", Role::Employee, Department::Engineering, None).await;
        let svc = &fx.services.leaves;

        let leave = svc
            .apply_leave(user.id, request(day(2025, 6, 10), day(2025, 6, 11)))
            .await
            .unwrap();
        let leave = svc
            .reject_leave(leave.id, &Caller::of(&hr), "busy week".into())
            .await
            .unwrap();
        assert_eq!(leave.rejection_reason.as_deref(), Some("busy week"));

        for result in [
            svc.approve_leave(leave.id, &Caller::of(&hr)).await,
            svc.cancel_leave(leave.id, &Caller::of(&user)).await,
        ] {
            assert!(matches!(result, Err(ServiceError::InvalidStateTransition { .. })));
        }
        let err = svc.delete_leave(leave.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidStateTransition { .. }));
    }

    #[actix_web::test]
    async fn rejection_reason_is_length_checked() {
        let fx = fixture();
        let hr = fx.user("HR-1", Role::Hr, Department::Hr, None).await;
        let user = fx.user("EMP-1", Role::Employee, Department::Engineering, None).await;
        let svc = &fx.services.leaves;

        let leave = svc
            .apply_leave(user.id, request(day(2025, 6, 10), day(2025, 6, 11)))
            .await
            .unwrap();
        let err = svc
            .reject_leave(leave.id, &Caller::of(&hr), "x".repeat(501))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref f) if f == &vec!["reason".to_string()]));
        assert_eq!(svc.get_leave(leave.id).await.unwrap().status, LeaveStatus::Pending);
    }

    #[actix_web::test]
    async fn touching_ranges_overlap() {
        let fx = fixture();
        let user = fx.user("EMP-1", Role::Employee, Department::Engineering, None).await;
        let svc = &fx.services.leaves;

        svc.apply_leave(user.id, request(day(2025, 6, 10), day(2025, 6, 12)))
            .await
            .unwrap();
        let err = svc
            .apply_leave(user.id, request(day(2025, 6, 12), day(2025, 6, 14)))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        svc.apply_leave(user.id, request(day(2025, 6, 13), day(2025, 6, 14)))
            .await
            .unwrap();
    }

    #[actix_web::test]
    async fn approved_leave_cancel_follows_policy() {
        let fx = fixture();
        let hr = fx.user("HR-1", Role::Hr, Department::Hr, None).await;
        let user = fx.user("EMP-1", Role::Employee, Department::Engineering, None).await;
        let strict = LeaveService::new(
            fx.stores.leaves.clone(),
            Guard::new(fx.stores.users.clone(), Arc::new(crate::access::RoleBasedAccess)),
            fx.clock.clone(),
            false,
        );

        let leave = strict
            .apply_leave(user.id, request(day(2025, 6, 10), day(2025, 6, 11)))
            .await
            .unwrap();
        strict.approve_leave(leave.id, &Caller::of(&hr)).await.unwrap();
        let err = strict.cancel_leave(leave.id, &Caller::of(&user)).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidStateTransition { .. }));

        let cancelled = fx
            .services
            .leaves
            .cancel_leave(leave.id, &Caller::of(&user))
            .await
            .unwrap();
        assert_eq!(cancelled.status, LeaveStatus::Cancelled);
    }

    #[actix_web::test]
    async fn overlapping_active_requests_are_rejected() {
        let fx = fixture();
        let user = fx.user("EMP-1", Role::Employee, Department::Engineering, None).await;
        let svc = &fx.services.leaves;

        let first = svc
            .apply_leave(user.id, request(day(2025, 6, 10), day(2025, 6, 12)))
            .await
            .unwrap();
        let err = svc
            .apply_leave(user.id, request(day(2025, 6, 12), day(2025, 6, 14)))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref f) if f.contains(&"start_date".to_string())));

        svc.cancel_leave(first.id, &Caller::of(&user)).await.unwrap();
        svc.apply_leave(user.id, request(day(2025, 6, 12), day(2025, 6, 14)))
            .await
            .unwrap();

        let err = svc
            .apply_leave(user.id, request(day(2025, 6, 20), day(2025, 6, 19)))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidDateRange { .. }));
    }

    #[actix_web::test]
    async fn employee_cannot_cancel_someone_elses_leave() {
        let fx = fixture();
        let user = fx.user("EMP-1", Role::Employee, Department::Engineering, None).await;
        let other = fx.user("EMP-2", Role::Employee, Department::Engineering, None).await;
        let svc = &fx.services.leaves;

        let leave = svc
            .apply_leave(user.id, request(day(2025, 6, 10), day(2025, 6, 10)))
            .await
            .unwrap();
        let err = svc.cancel_leave(leave.id, &Caller::of(&other)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotAuthorized(_)));
        assert!(!svc.is_owner(leave.id, &Caller::of(&other)).await.unwrap());
        assert!(svc.is_owner(leave.id, &Caller::of(&user)).await.unwrap());
    }

    #[actix_web::test]
    async fn listing_and_counting() {
        let fx = fixture();
        let user = fx.user("EMP-1", Role::Employee, Department::Engineering, None).await;
        let svc = &fx.services.leaves;

        for start in [1u32, 5, 9] {
            svc.apply_leave(user.id, request(day(2025, 7, start), day(2025, 7, start + 1)))
                .await
                .unwrap();
        }
        let page = svc.get_pending_leaves(PageRequest::new(1, 2)).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.data.len(), 2);

        let filter = LeaveFilter {
            from: Some(day(2025, 7, 6)),
            ..Default::default()
        };
        assert_eq!(svc.count_leaves(&filter).await.unwrap(), 2);

        let mine = svc.get_leaves_by_user(user.id, PageRequest::default()).await.unwrap();
        svc.delete_leave(mine.data[0].id).await.unwrap();
        assert_eq!(svc.count_leaves(&LeaveFilter::default()).await.unwrap(), 2);

        let err = svc.get_leave(999).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { entity: "leave", .. }));
    }
}
