use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor, PgPool};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::routes::workplace::model::Table;
use crate::utils::validation::MAX_NOTE_LEN;

use super::planner::{ScheduleDraft, default_close_time, default_open_time};

/// 某诊室某一天的出诊安排
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomSchedule {
    pub id: i64,
    pub date: NaiveDate,
    pub room_id: i64,
    pub department_id: i64,
    pub is_open: bool,
    pub doctor_id: Option<i64>,
    pub nurse_id: Option<i64>,
    pub open_time: NaiveTime,
    pub close_time: NaiveTime,
    pub max_patients: i32,
    pub notes: Option<String>,
}

impl Table for RoomSchedule {
    const TABLE: &'static str = "room_schedules";
    const LABEL: &'static str = "room schedule";
    const COLUMNS: &'static str = "id, date, room_id, department_id, is_open, doctor_id, nurse_id, \
                                   open_time, close_time, max_patients, notes";
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RoomScheduleRequest {
    /// upsert 时有 id 表示更新
    pub id: Option<i64>,
    #[validate(required(message = "date is required"))]
    pub date: Option<NaiveDate>,
    #[validate(required(message = "roomId is required"))]
    pub room_id: Option<i64>,
    #[validate(required(message = "departmentId is required"))]
    pub department_id: Option<i64>,
    #[serde(default)]
    pub is_open: bool,
    pub doctor_id: Option<i64>,
    pub nurse_id: Option<i64>,
    #[serde(default = "default_open_time")]
    pub open_time: NaiveTime,
    #[serde(default = "default_close_time")]
    pub close_time: NaiveTime,
    #[serde(default)]
    #[validate(range(min = 0, message = "maxPatients must not be negative"))]
    pub max_patients: i32,
    #[validate(length(max = MAX_NOTE_LEN, message = "notes are too long"))]
    pub notes: Option<String>,
}

impl RoomScheduleRequest {
    /// 必须先通过 `validate()`
    pub fn into_draft(self) -> AppResult<ScheduleDraft> {
        let (Some(date), Some(room_id), Some(department_id)) =
            (self.date, self.room_id, self.department_id)
        else {
            return Err(AppError::field("date", "date, roomId and departmentId are required"));
        };

        if self.open_time >= self.close_time {
            return Err(AppError::field("closeTime", "closeTime must be after openTime"));
        }

        Ok(ScheduleDraft {
            date,
            room_id,
            department_id,
            is_open: self.is_open,
            doctor_id: self.doctor_id,
            nurse_id: self.nurse_id,
            open_time: self.open_time,
            close_time: self.close_time,
            max_patients: self.max_patients,
            notes: self.notes,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct BulkScheduleRequest {
    #[validate(length(min = 1, message = "schedules must not be empty"), nested)]
    pub schedules: Vec<RoomScheduleRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleOpenRequest {
    pub is_open: bool,
}

impl RoomSchedule {
    pub async fn find_all(
        pool: &PgPool,
        date: Option<NaiveDate>,
        department_id: Option<i64>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, RoomSchedule>(
            r#"
            SELECT id, date, room_id, department_id, is_open, doctor_id, nurse_id,
                   open_time, close_time, max_patients, notes
            FROM room_schedules
            WHERE ($1::DATE IS NULL OR date = $1)
              AND ($2::BIGINT IS NULL OR department_id = $2)
            ORDER BY date, room_id
            "#,
        )
        .bind(date)
        .bind(department_id)
        .fetch_all(pool)
        .await
    }

    pub async fn insert<'e, E: PgExecutor<'e>>(
        executor: E,
        draft: &ScheduleDraft,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, RoomSchedule>(
            r#"
            INSERT INTO room_schedules (
                date, room_id, department_id, is_open, doctor_id, nurse_id,
                open_time, close_time, max_patients, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, date, room_id, department_id, is_open, doctor_id, nurse_id,
                      open_time, close_time, max_patients, notes
            "#,
        )
        .bind(draft.date)
        .bind(draft.room_id)
        .bind(draft.department_id)
        .bind(draft.is_open)
        .bind(draft.doctor_id)
        .bind(draft.nurse_id)
        .bind(draft.open_time)
        .bind(draft.close_time)
        .bind(draft.max_patients)
        .bind(&draft.notes)
        .fetch_one(executor)
        .await
    }

    /// 默认排班插入，并发生成时以先写入者为准
    pub async fn insert_default<'e, E: PgExecutor<'e>>(
        executor: E,
        draft: &ScheduleDraft,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO room_schedules (
                date, room_id, department_id, is_open, open_time, close_time, max_patients
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (date, room_id) DO NOTHING
            "#,
        )
        .bind(draft.date)
        .bind(draft.room_id)
        .bind(draft.department_id)
        .bind(draft.is_open)
        .bind(draft.open_time)
        .bind(draft.close_time)
        .bind(draft.max_patients)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn update(pool: &PgPool, id: i64, draft: &ScheduleDraft) -> AppResult<Self> {
        sqlx::query_as::<_, RoomSchedule>(
            r#"
            UPDATE room_schedules
            SET date = $2, room_id = $3, department_id = $4, is_open = $5, doctor_id = $6,
                nurse_id = $7, open_time = $8, close_time = $9, max_patients = $10, notes = $11
            WHERE id = $1
            RETURNING id, date, room_id, department_id, is_open, doctor_id, nurse_id,
                      open_time, close_time, max_patients, notes
            "#,
        )
        .bind(id)
        .bind(draft.date)
        .bind(draft.room_id)
        .bind(draft.department_id)
        .bind(draft.is_open)
        .bind(draft.doctor_id)
        .bind(draft.nurse_id)
        .bind(draft.open_time)
        .bind(draft.close_time)
        .bind(draft.max_patients)
        .bind(&draft.notes)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found(format!("room schedule {}", id)))
    }

    pub async fn set_open(pool: &PgPool, id: i64, is_open: bool) -> AppResult<Self> {
        sqlx::query_as::<_, RoomSchedule>(
            r#"
            UPDATE room_schedules SET is_open = $2
            WHERE id = $1
            RETURNING id, date, room_id, department_id, is_open, doctor_id, nurse_id,
                      open_time, close_time, max_patients, notes
            "#,
        )
        .bind(id)
        .bind(is_open)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found(format!("room schedule {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_accepts_short_times_and_defaults() {
        let req: RoomScheduleRequest = serde_json::from_str(
            r#"{"date": "2024-03-01", "roomId": 1, "departmentId": 2, "isOpen": true,
                "openTime": "09:30", "closeTime": "12:00", "maxPatients": 15}"#,
        )
        .unwrap();
        assert!(req.validate().is_ok());
        let draft = req.into_draft().unwrap();
        assert_eq!(draft.open_time, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert!(draft.is_open);
        assert_eq!(draft.max_patients, 15);
    }

    #[test]
    fn close_before_open_is_rejected() {
        let req: RoomScheduleRequest = serde_json::from_str(
            r#"{"date": "2024-03-01", "roomId": 1, "departmentId": 2,
                "openTime": "16:00", "closeTime": "08:00"}"#,
        )
        .unwrap();
        match req.into_draft() {
            Err(AppError::Validation(fields)) => assert!(fields.contains_key("closeTime")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn missing_room_is_a_field_error() {
        let req: RoomScheduleRequest =
            serde_json::from_str(r#"{"date": "2024-03-01", "departmentId": 2}"#).unwrap();
        assert!(req.validate().unwrap_err().field_errors().contains_key("room_id"));
    }

    #[test]
    fn empty_bulk_is_rejected() {
        let req: BulkScheduleRequest = serde_json::from_str(r#"{"schedules": []}"#).unwrap();
        assert!(req.validate().is_err());
    }
}
