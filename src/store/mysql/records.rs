//! Documents, projects and reviews: plain records without a lifecycle.

use sqlx::Row;
use sqlx::mysql::MySqlRow;

use super::{SqlEntity, SqlFilter, parse_column};
use crate::model::document::{Document, DocumentFilter};
use crate::model::project::{Project, ProjectFilter};
use crate::model::review::{Review, ReviewFilter};
use crate::store::StoreResult;
use crate::store::sql::{SqlValue, SqlWhere};

impl SqlEntity for Document {
    const TABLE: &'static str = "documents";
    const COLUMNS: &'static [&'static str] = &[
        "owner_id",
        "title",
        "category",
        "description",
        "file_url",
        "created_at",
        "updated_at",
    ];
    const ORDER_BY: &'static str = "created_at DESC, id DESC";

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.owner_id.into(),
            self.title.clone().into(),
            self.category.clone().into(),
            self.description.clone().into(),
            self.file_url.clone().into(),
            self.created_at.into(),
            self.updated_at.into(),
        ]
    }

    fn from_row(row: &MySqlRow) -> StoreResult<Self> {
        Ok(Document {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            title: row.try_get("title")?,
            category: row.try_get("category")?,
            description: row.try_get("description")?,
            file_url: row.try_get("file_url")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl SqlFilter for DocumentFilter {
    fn to_sql(&self) -> SqlWhere {
        let mut w = SqlWhere::new();
        w.eq("owner_id", self.owner_id);
        if let Some(category) = &self.category {
            w.raw("LOWER(category) = ?", vec![category.to_lowercase().into()]);
        }
        w.search(&["title", "description"], self.search.as_deref());
        w
    }
}

impl SqlEntity for Project {
    const TABLE: &'static str = "projects";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "description",
        "owner_id",
        "assignee_id",
        "status",
        "start_date",
        "end_date",
        "created_at",
        "updated_at",
    ];
    const ORDER_BY: &'static str = "created_at DESC, id DESC";

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.name.clone().into(),
            self.description.clone().into(),
            self.owner_id.into(),
            self.assignee_id.into(),
            self.status.to_string().into(),
            self.start_date.into(),
            self.end_date.into(),
            self.created_at.into(),
            self.updated_at.into(),
        ]
    }

    fn from_row(row: &MySqlRow) -> StoreResult<Self> {
        Ok(Project {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            owner_id: row.try_get("owner_id")?,
            assignee_id: row.try_get("assignee_id")?,
            status: parse_column(row, "status")?,
            start_date: row.try_get("start_date")?,
            end_date: row.try_get("end_date")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl SqlFilter for ProjectFilter {
    fn to_sql(&self) -> SqlWhere {
        let mut w = SqlWhere::new();
        w.eq("owner_id", self.owner_id)
            .eq("assignee_id", self.assignee_id)
            .eq("status", self.status.map(|s| s.to_string()))
            .search(&["name"], self.search.as_deref());
        w
    }
}

impl SqlEntity for Review {
    const TABLE: &'static str = "reviews";
    const COLUMNS: &'static [&'static str] = &[
        "employee_id",
        "reviewer_id",
        "title",
        "content",
        "rating",
        "created_at",
        "updated_at",
    ];
    const ORDER_BY: &'static str = "created_at DESC, id DESC";

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.employee_id.into(),
            self.reviewer_id.into(),
            self.title.clone().into(),
            self.content.clone().into(),
            self.rating.into(),
            self.created_at.into(),
            self.updated_at.into(),
        ]
    }

    fn from_row(row: &MySqlRow) -> StoreResult<Self> {
        Ok(Review {
            id: row.try_get("id")?,
            employee_id: row.try_get("employee_id")?,
            reviewer_id: row.try_get("reviewer_id")?,
            title: row.try_get("title")?,
            content: row.try_get("content")?,
            rating: row.try_get("rating")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl SqlFilter for ReviewFilter {
    fn to_sql(&self) -> SqlWhere {
        let mut w = SqlWhere::new();
        w.eq("employee_id", self.employee_id)
            .eq("reviewer_id", self.reviewer_id)
            .search(&["title"], self.search.as_deref());
        w
    }
}
