use std::sync::Arc;

use tracing::instrument;
use validator::Validate;

use super::{Guard, fetch, remove};
use crate::access::{Action, Caller};
use crate::clock::Clock;
use crate::error::{ServiceError, ServiceResult};
use crate::model::performance::{
    Performance, PerformanceFilter, PerformanceStatus, ReviewPerformance, SubmitPerformance,
    UpdatePerformance,
};
use crate::store::{Entity, Page, PageRequest, SharedStore, find_page};

/// Performance reviews: PENDING -> UNDER_REVIEW -> COMPLETED | REJECTED.
#[derive(Clone)]
pub struct PerformanceService {
    performances: SharedStore<Performance>,
    guard: Guard,
    clock: Arc<dyn Clock>,
}

impl PerformanceService {
    pub fn new(performances: SharedStore<Performance>, guard: Guard, clock: Arc<dyn Clock>) -> Self {
        Self {
            performances,
            guard,
            clock,
        }
    }

    #[instrument(skip(self, req))]
    pub async fn submit_performance(&self, user_id: u64, req: SubmitPerformance) -> ServiceResult<Performance> {
        req.validate()?;
        if req.period_start > req.period_end {
            return Err(ServiceError::InvalidDateRange {
                start: req.period_start,
                end: req.period_end,
            });
        }
        self.guard.owner(user_id).await?;

        let now = self.clock.now();
        let performance = self
            .performances
            .save(Performance {
                id: 0,
                user_id,
                reviewer_id: None,
                review_type: req.review_type,
                period_start: req.period_start,
                period_end: req.period_end,
                goals: req.goals,
                self_assessment: req.self_assessment,
                rating: None,
                comments: None,
                rejection_reason: None,
                status: PerformanceStatus::Pending,
                created_at: now,
                updated_at: now,
            })
            .await?;

        tracing::info!(id = performance.id, user_id, "Performance submitted");
        Ok(performance)
    }

    pub async fn update_performance(&self, id: u64, update: UpdatePerformance) -> ServiceResult<Performance> {
        update.validate()?;
        let mut performance = self.in_state(id, PerformanceStatus::Pending, "update").await?;

        if let Some(review_type) = update.review_type {
            performance.review_type = review_type;
        }
        if let Some(start) = update.period_start {
            performance.period_start = start;
        }
        if let Some(end) = update.period_end {
            performance.period_end = end;
        }
        if performance.period_start > performance.period_end {
            return Err(ServiceError::InvalidDateRange {
                start: performance.period_start,
                end: performance.period_end,
            });
        }
        if update.goals.is_some() {
            performance.goals = update.goals;
        }
        if update.self_assessment.is_some() {
            performance.self_assessment = update.self_assessment;
        }
        performance.updated_at = self.clock.now();

        Ok(self.performances.save(performance).await?)
    }

    pub async fn review_performance(
        &self,
        id: u64,
        reviewer: &Caller,
        review: ReviewPerformance,
    ) -> ServiceResult<Performance> {
        review.validate()?;
        let mut performance = self.in_state(id, PerformanceStatus::Pending, "review").await?;
        self.guard.require(reviewer, performance.user_id, Action::Approve).await?;

        performance.status = PerformanceStatus::UnderReview;
        performance.reviewer_id = Some(reviewer.user_id);
        performance.rating = Some(review.rating);
        performance.comments = Some(review.comments);
        performance.updated_at = self.clock.now();

        let performance = self.performances.save(performance).await?;
        tracing::info!(id, reviewer = reviewer.user_id, "Performance under review");
        Ok(performance)
    }

    pub async fn approve_performance(&self, id: u64, reviewer: &Caller) -> ServiceResult<Performance> {
        let mut performance = self.in_state(id, PerformanceStatus::UnderReview, "approve").await?;
        self.guard.require(reviewer, performance.user_id, Action::Approve).await?;

        performance.status = PerformanceStatus::Completed;
        performance.updated_at = self.clock.now();

        let performance = self.performances.save(performance).await?;
        tracing::info!(id, reviewer = reviewer.user_id, "Performance completed");
        Ok(performance)
    }

    pub async fn reject_performance(&self, id: u64, reviewer: &Caller, reason: String) -> ServiceResult<Performance> {
        if reason.trim().is_empty() {
            return Err(ServiceError::invalid("reason"));
        }
        let mut performance = self.in_state(id, PerformanceStatus::UnderReview, "reject").await?;
        self.guard.require(reviewer, performance.user_id, Action::Approve).await?;

        performance.status = PerformanceStatus::Rejected;
        performance.rejection_reason = Some(reason);
        performance.updated_at = self.clock.now();

        let performance = self.performances.save(performance).await?;
        tracing::info!(id, reviewer = reviewer.user_id, "Performance rejected");
        Ok(performance)
    }

    async fn in_state(
        &self,
        id: u64,
        expected: PerformanceStatus,
        action: &'static str,
    ) -> ServiceResult<Performance> {
        let performance = self.get_performance(id).await?;
        if performance.status != expected {
            return Err(ServiceError::transition(Performance::NAME, performance.status, action));
        }
        Ok(performance)
    }

    pub async fn get_performance(&self, id: u64) -> ServiceResult<Performance> {
        fetch(self.performances.as_ref(), id).await
    }

    pub async fn list_performances(
        &self,
        filter: &PerformanceFilter,
        page: PageRequest,
    ) -> ServiceResult<Page<Performance>> {
        Ok(find_page(self.performances.as_ref(), filter, page).await?)
    }

    pub async fn get_performances_by_user(&self, user_id: u64, page: PageRequest) -> ServiceResult<Page<Performance>> {
        let filter = PerformanceFilter {
            user_id: Some(user_id),
            ..Default::default()
        };
        self.list_performances(&filter, page).await
    }

    pub async fn delete_performance(&self, id: u64) -> ServiceResult<()> {
        remove(self.performances.as_ref(), id).await?;
        tracing::info!(id, "Performance deleted");
        Ok(())
    }

    pub async fn is_owner(&self, id: u64, caller: &Caller) -> ServiceResult<bool> {
        let performance = self.get_performance(id).await?;
        self.guard.is_owner(caller, performance.user_id).await
    }
}
