use sqlx::Row;
use sqlx::mysql::MySqlRow;

use super::{SqlEntity, SqlFilter, parse_column};
use crate::model::performance::{Performance, PerformanceFilter};
use crate::store::StoreResult;
use crate::store::sql::{SqlValue, SqlWhere};

impl SqlEntity for Performance {
    const TABLE: &'static str = "performances";
    const COLUMNS: &'static [&'static str] = &[
        "user_id",
        "reviewer_id",
        "review_type",
        "period_start",
        "period_end",
        "goals",
        "self_assessment",
        "rating",
        "comments",
        "rejection_reason",
        "status",
        "created_at",
        "updated_at",
    ];
    const ORDER_BY: &'static str = "period_end DESC, id DESC";

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.user_id.into(),
            self.reviewer_id.into(),
            self.review_type.to_string().into(),
            self.period_start.into(),
            self.period_end.into(),
            self.goals.clone().into(),
            self.self_assessment.clone().into(),
            self.rating.into(),
            self.comments.clone().into(),
            self.rejection_reason.clone().into(),
            self.status.to_string().into(),
            self.created_at.into(),
            self.updated_at.into(),
        ]
    }

    fn from_row(row: &MySqlRow) -> StoreResult<Self> {
        Ok(Performance {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            reviewer_id: row.try_get("reviewer_id")?,
            review_type: parse_column(row, "review_type")?,
            period_start: row.try_get("period_start")?,
            period_end: row.try_get("period_end")?,
            goals: row.try_get("goals")?,
            self_assessment: row.try_get("self_assessment")?,
            rating: row.try_get("rating")?,
            comments: row.try_get("comments")?,
            rejection_reason: row.try_get("rejection_reason")?,
            status: parse_column(row, "status")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl SqlFilter for PerformanceFilter {
    fn to_sql(&self) -> SqlWhere {
        let mut w = SqlWhere::new();
        w.eq("user_id", self.user_id)
            .eq("reviewer_id", self.reviewer_id)
            .eq("status", self.status.map(|s| s.to_string()))
            .eq("review_type", self.review_type.map(|t| t.to_string()));
        w
    }
}
