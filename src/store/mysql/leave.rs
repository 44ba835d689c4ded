use sqlx::Row;
use sqlx::mysql::MySqlRow;

use super::{SqlEntity, SqlFilter, parse_column};
use crate::model::leave::{Leave, LeaveFilter};
use crate::store::StoreResult;
use crate::store::sql::{SqlValue, SqlWhere};

impl SqlEntity for Leave {
    const TABLE: &'static str = "leaves";
    const COLUMNS: &'static [&'static str] = &[
        "user_id",
        "leave_type",
        "start_date",
        "end_date",
        "reason",
        "status",
        "approver_id",
        "rejection_reason",
        "created_at",
        "updated_at",
    ];
    const ORDER_BY: &'static str = "created_at DESC, id DESC";

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.user_id.into(),
            self.leave_type.to_string().into(),
            self.start_date.into(),
            self.end_date.into(),
            self.reason.clone().into(),
            self.status.to_string().into(),
            self.approver_id.into(),
            self.rejection_reason.clone().into(),
            self.created_at.into(),
            self.updated_at.into(),
        ]
    }

    fn from_row(row: &MySqlRow) -> StoreResult<Self> {
        Ok(Leave {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            leave_type: parse_column(row, "leave_type")?,
            start_date: row.try_get("start_date")?,
            end_date: row.try_get("end_date")?,
            reason: row.try_get("reason")?,
            status: parse_column(row, "status")?,
            approver_id: row.try_get("approver_id")?,
            rejection_reason: row.try_get("rejection_reason")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl SqlFilter for LeaveFilter {
    fn to_sql(&self) -> SqlWhere {
        let mut w = SqlWhere::new();
        w.eq("user_id", self.user_id)
            .eq("status", self.status.map(|s| s.to_string()))
            .eq("leave_type", self.leave_type.map(|t| t.to_string()))
            .eq("approver_id", self.approver_id)
            // overlap with [from, to]
            .gte("end_date", self.from)
            .lte("start_date", self.to);
        w
    }
}
