use std::sync::Arc;

use validator::Validate;

use super::{Guard, fetch, remove};
use crate::access::Caller;
use crate::clock::Clock;
use crate::error::{ServiceError, ServiceResult};
use crate::model::review::{NewReview, Review, ReviewFilter, ReviewUpdate};
use crate::store::{Page, PageRequest, SharedStore, find_page};

/// Free-form feedback between colleagues; unlike performance records it has
/// no approval workflow.
#[derive(Clone)]
pub struct ReviewService {
    reviews: SharedStore<Review>,
    guard: Guard,
    clock: Arc<dyn Clock>,
}

impl ReviewService {
    pub fn new(reviews: SharedStore<Review>, guard: Guard, clock: Arc<dyn Clock>) -> Self {
        Self { reviews, guard, clock }
    }

    pub async fn create_review(&self, reviewer_id: u64, req: NewReview) -> ServiceResult<Review> {
        req.validate()?;
        if req.employee_id == reviewer_id {
            return Err(ServiceError::invalid("employee_id"));
        }
        self.guard.owner(req.employee_id).await?;

        let now = self.clock.now();
        let review = self
            .reviews
            .save(Review {
                id: 0,
                employee_id: req.employee_id,
                reviewer_id,
                title: req.title,
                content: req.content,
                rating: req.rating,
                created_at: now,
                updated_at: now,
            })
            .await?;
        tracing::info!(id = review.id, employee_id = review.employee_id, reviewer_id, "Review created");
        Ok(review)
    }

    pub async fn get_review(&self, id: u64) -> ServiceResult<Review> {
        fetch(self.reviews.as_ref(), id).await
    }

    pub async fn update_review(&self, id: u64, update: ReviewUpdate) -> ServiceResult<Review> {
        update.validate()?;
        let mut review = self.get_review(id).await?;
        if let Some(title) = update.title {
            review.title = title;
        }
        if let Some(content) = update.content {
            review.content = content;
        }
        if let Some(rating) = update.rating {
            review.rating = rating;
        }
        review.updated_at = self.clock.now();
        Ok(self.reviews.save(review).await?)
    }

    pub async fn delete_review(&self, id: u64) -> ServiceResult<()> {
        remove(self.reviews.as_ref(), id).await?;
        tracing::info!(id, "Review deleted");
        Ok(())
    }

    pub async fn list_reviews(&self, filter: &ReviewFilter, page: PageRequest) -> ServiceResult<Page<Review>> {
        Ok(find_page(self.reviews.as_ref(), filter, page).await?)
    }

    pub async fn search_reviews(&self, term: &str, page: PageRequest) -> ServiceResult<Page<Review>> {
        let filter = ReviewFilter {
            search: Some(term.to_string()),
            ..Default::default()
        };
        self.list_reviews(&filter, page).await
    }

    pub async fn count_reviews(&self, filter: &ReviewFilter) -> ServiceResult<u64> {
        Ok(self.reviews.count(filter).await?)
    }

    /// Reviews are owned by whoever wrote them.
    pub async fn is_owner(&self, id: u64, caller: &Caller) -> ServiceResult<bool> {
        let review = self.get_review(id).await?;
        self.guard.is_owner(caller, review.reviewer_id).await
    }
}
