use sqlx::Row;
use sqlx::mysql::MySqlRow;

use super::{SqlEntity, SqlFilter, parse_column};
use crate::model::payroll::{Payroll, PayrollFilter};
use crate::store::StoreResult;
use crate::store::sql::{SqlValue, SqlWhere};

impl SqlEntity for Payroll {
    const TABLE: &'static str = "payrolls";
    const COLUMNS: &'static [&'static str] = &[
        "user_id",
        "month",
        "year",
        "base_salary",
        "allowances",
        "deductions",
        "gross_salary",
        "net_salary",
        "status",
        "processed_at",
        "paid_at",
        "created_at",
        "updated_at",
    ];
    const ORDER_BY: &'static str = "year DESC, month DESC, id DESC";

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.user_id.into(),
            self.month.into(),
            self.year.into(),
            self.base_salary.into(),
            self.allowances.into(),
            self.deductions.into(),
            self.gross_salary.into(),
            self.net_salary.into(),
            self.status.to_string().into(),
            self.processed_at.into(),
            self.paid_at.into(),
            self.created_at.into(),
            self.updated_at.into(),
        ]
    }

    fn from_row(row: &MySqlRow) -> StoreResult<Self> {
        Ok(Payroll {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            month: row.try_get("month")?,
            year: row.try_get("year")?,
            base_salary: row.try_get("base_salary")?,
            allowances: row.try_get("allowances")?,
            deductions: row.try_get("deductions")?,
            gross_salary: row.try_get("gross_salary")?,
            net_salary: row.try_get("net_salary")?,
            status: parse_column(row, "status")?,
            processed_at: row.try_get("processed_at")?,
            paid_at: row.try_get("paid_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl SqlFilter for PayrollFilter {
    fn to_sql(&self) -> SqlWhere {
        let mut w = SqlWhere::new();
        w.eq("user_id", self.user_id)
            .eq("status", self.status.map(|s| s.to_string()))
            .eq("month", self.month)
            .eq("year", self.year);
        w
    }
}
