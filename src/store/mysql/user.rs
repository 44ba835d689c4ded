use sqlx::Row;
use sqlx::mysql::MySqlRow;

use super::{SqlEntity, SqlFilter, parse_column};
use crate::model::user::{User, UserFilter};
use crate::store::StoreResult;
use crate::store::sql::{SqlValue, SqlWhere};

impl SqlEntity for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] = &[
        "employee_id",
        "first_name",
        "last_name",
        "email",
        "password_hash",
        "phone",
        "role",
        "department",
        "status",
        "manager_id",
        "position",
        "base_salary",
        "hire_date",
        "created_at",
        "updated_at",
    ];
    const ORDER_BY: &'static str = "last_name, first_name, id";

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.employee_id.clone().into(),
            self.first_name.clone().into(),
            self.last_name.clone().into(),
            self.email.to_lowercase().into(),
            self.password_hash.clone().into(),
            self.phone.clone().into(),
            self.role.to_string().into(),
            self.department.to_string().into(),
            self.status.to_string().into(),
            self.manager_id.into(),
            self.position.clone().into(),
            self.base_salary.into(),
            self.hire_date.into(),
            self.created_at.into(),
            self.updated_at.into(),
        ]
    }

    fn from_row(row: &MySqlRow) -> StoreResult<Self> {
        Ok(User {
            id: row.try_get("id")?,
            employee_id: row.try_get("employee_id")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            phone: row.try_get("phone")?,
            role: parse_column(row, "role")?,
            department: parse_column(row, "department")?,
            status: parse_column(row, "status")?,
            manager_id: row.try_get("manager_id")?,
            position: row.try_get("position")?,
            base_salary: row.try_get("base_salary")?,
            hire_date: row.try_get("hire_date")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl SqlFilter for UserFilter {
    fn to_sql(&self) -> SqlWhere {
        let mut w = SqlWhere::new();
        w.eq("role", self.role.map(|r| r.to_string()))
            .eq("department", self.department.map(|d| d.to_string()))
            .eq("status", self.status.map(|s| s.to_string()))
            .eq("manager_id", self.manager_id)
            .eq("email", self.email.as_deref().map(str::to_lowercase))
            .eq("employee_id", self.employee_id.clone())
            .search(&["first_name", "last_name", "email"], self.search.as_deref());
        w
    }
}
