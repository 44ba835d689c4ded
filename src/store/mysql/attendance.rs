use sqlx::Row;
use sqlx::mysql::MySqlRow;

use super::{SqlEntity, SqlFilter, parse_column};
use crate::model::attendance::{Attendance, AttendanceFilter};
use crate::store::StoreResult;
use crate::store::sql::{SqlValue, SqlWhere};

impl SqlEntity for Attendance {
    const TABLE: &'static str = "attendance";
    const COLUMNS: &'static [&'static str] = &[
        "user_id",
        "date",
        "punch_in",
        "punch_in_location",
        "punch_in_latitude",
        "punch_in_longitude",
        "punch_out",
        "punch_out_location",
        "punch_out_latitude",
        "punch_out_longitude",
        "working_minutes",
        "status",
        "reason",
        "created_at",
        "updated_at",
    ];
    const ORDER_BY: &'static str = "date DESC, id DESC";

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.user_id.into(),
            self.date.into(),
            self.punch_in.into(),
            self.punch_in_location.clone().into(),
            self.punch_in_latitude.into(),
            self.punch_in_longitude.into(),
            self.punch_out.into(),
            self.punch_out_location.clone().into(),
            self.punch_out_latitude.into(),
            self.punch_out_longitude.into(),
            self.working_minutes.into(),
            self.status.to_string().into(),
            self.reason.clone().into(),
            self.created_at.into(),
            self.updated_at.into(),
        ]
    }

    fn from_row(row: &MySqlRow) -> StoreResult<Self> {
        Ok(Attendance {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            date: row.try_get("date")?,
            punch_in: row.try_get("punch_in")?,
            punch_in_location: row.try_get("punch_in_location")?,
            punch_in_latitude: row.try_get("punch_in_latitude")?,
            punch_in_longitude: row.try_get("punch_in_longitude")?,
            punch_out: row.try_get("punch_out")?,
            punch_out_location: row.try_get("punch_out_location")?,
            punch_out_latitude: row.try_get("punch_out_latitude")?,
            punch_out_longitude: row.try_get("punch_out_longitude")?,
            working_minutes: row.try_get("working_minutes")?,
            status: parse_column(row, "status")?,
            reason: row.try_get("reason")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl SqlFilter for AttendanceFilter {
    fn to_sql(&self) -> SqlWhere {
        let mut w = SqlWhere::new();
        w.eq("user_id", self.user_id)
            .in_list("user_id", self.user_ids.as_deref())
            .eq("date", self.date)
            .gte("date", self.from)
            .lte("date", self.to)
            .eq("status", self.status.map(|s| s.to_string()));
        w
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn date_range_and_members() {
        let from = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let filter = AttendanceFilter {
            user_ids: Some(vec![4, 5]),
            from: Some(from),
            ..Default::default()
        };
        let w = filter.to_sql();
        assert_eq!(w.clause(), " WHERE user_id IN (?, ?) AND date >= ?");
        assert_eq!(
            w.into_values(),
            vec![SqlValue::U64(4), SqlValue::U64(5), SqlValue::Date(from)]
        );
    }
}
