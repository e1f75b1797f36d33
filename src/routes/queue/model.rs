use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use validator::Validate;

use crate::error::{AppError, AppResult};

use super::board::{format_queue_no, triage_label};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Waiting,
    InProgress,
    Completed,
    Cancelled,
}

impl QueueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Waiting => "waiting",
            QueueStatus::InProgress => "in_progress",
            QueueStatus::Completed => "completed",
            QueueStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, PartialEq, thiserror::Error)]
#[error("unknown queue status {0}")]
pub struct UnknownQueueStatus(pub String);

impl TryFrom<String> for QueueStatus {
    type Error = UnknownQueueStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "waiting" => Ok(QueueStatus::Waiting),
            "in_progress" => Ok(QueueStatus::InProgress),
            "completed" => Ok(QueueStatus::Completed),
            "cancelled" => Ok(QueueStatus::Cancelled),
            _ => Err(UnknownQueueStatus(value)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QueueItem {
    pub id: i64,
    pub queue_no: String,
    pub patient_id: i64,
    pub room_schedule_id: Option<i64>,
    pub department_id: i64,
    pub triage_level: i16,
    #[sqlx(try_from = "String")]
    pub status: QueueStatus,
    pub created_at: DateTime<Utc>,
    pub called_at: Option<DateTime<Utc>>,
}

/// 看板使用的队列记录，诊室、科室、患者信息一次查询带出
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ActiveQueue {
    pub id: i64,
    pub queue_no: String,
    pub patient_id: i64,
    pub hn: String,
    pub patient_name: String,
    pub room_schedule_id: Option<i64>,
    pub room_id: Option<i64>,
    pub room_name: Option<String>,
    pub department_id: i64,
    pub department_name: String,
    pub department_short_name: Option<String>,
    pub thai_code: Option<String>,
    pub bg_color: Option<String>,
    pub triage_level: i16,
    #[sqlx(try_from = "String")]
    pub status: QueueStatus,
    pub created_at: DateTime<Utc>,
    pub called_at: Option<DateTime<Utc>>,
    #[sqlx(skip)]
    #[serde(default)]
    pub triage_label: String,
}

fn default_triage() -> i16 {
    5
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IssueQueueRequest {
    #[validate(required(message = "patientId is required"))]
    pub patient_id: Option<i64>,
    #[validate(required(message = "departmentId is required"))]
    pub department_id: Option<i64>,
    pub room_schedule_id: Option<i64>,
    #[serde(default = "default_triage")]
    #[validate(range(min = 1, max = 5, message = "triageLevel must be between 1 and 5"))]
    pub triage_level: i16,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: QueueStatus,
}

const QUEUE_COLUMNS: &str =
    "id, queue_no, patient_id, room_schedule_id, department_id, triage_level, status, created_at, called_at";

impl ActiveQueue {
    pub async fn find_active(pool: &PgPool, department_id: Option<i64>) -> AppResult<Vec<Self>> {
        let mut items = sqlx::query_as::<_, ActiveQueue>(
            r#"
            SELECT q.id, q.queue_no, q.patient_id, p.hn,
                   p.first_name || ' ' || p.last_name AS patient_name,
                   q.room_schedule_id, r.id AS room_id, r.name AS room_name,
                   q.department_id, d.name AS department_name,
                   d.short_name AS department_short_name, d.thai_code, d.bg_color,
                   q.triage_level, q.status, q.created_at, q.called_at
            FROM queues q
            JOIN patients p ON p.id = q.patient_id
            JOIN departments d ON d.id = q.department_id
            LEFT JOIN room_schedules s ON s.id = q.room_schedule_id
            LEFT JOIN rooms r ON r.id = s.room_id
            WHERE q.status IN ('waiting', 'in_progress')
              AND ($1::BIGINT IS NULL OR q.department_id = $1)
            ORDER BY q.triage_level, q.created_at
            "#,
        )
        .bind(department_id)
        .fetch_all(pool)
        .await?;

        for item in &mut items {
            item.triage_label = triage_label(item.triage_level).to_string();
        }
        Ok(items)
    }
}

impl QueueItem {
    /// 取号；同科室的取号通过事务级咨询锁串行，序号按科室按天递增
    pub async fn issue(pool: &PgPool, req: IssueQueueRequest) -> AppResult<Self> {
        let (Some(patient_id), Some(department_id)) = (req.patient_id, req.department_id) else {
            return Err(AppError::field("patientId", "patientId and departmentId are required"));
        };

        let mut tx = pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(department_id)
            .execute(&mut *tx)
            .await?;

        let short_name: Option<Option<String>> =
            sqlx::query_scalar("SELECT short_name FROM departments WHERE id = $1")
                .bind(department_id)
                .fetch_optional(&mut *tx)
                .await?;
        let short_name =
            short_name.ok_or_else(|| AppError::not_found(format!("department {}", department_id)))?;

        let issued_today: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM queues
            WHERE department_id = $1 AND created_at::DATE = CURRENT_DATE
            "#,
        )
        .bind(department_id)
        .fetch_one(&mut *tx)
        .await?;

        let queue_no = format_queue_no(short_name.as_deref(), department_id, issued_today + 1);

        let sql = format!(
            r#"
            INSERT INTO queues (queue_no, patient_id, room_schedule_id, department_id, triage_level, status)
            VALUES ($1, $2, $3, $4, $5, 'waiting')
            RETURNING {}
            "#,
            QUEUE_COLUMNS
        );
        let item = sqlx::query_as::<_, QueueItem>(&sql)
            .bind(&queue_no)
            .bind(patient_id)
            .bind(req.room_schedule_id)
            .bind(department_id)
            .bind(req.triage_level)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(item)
    }

    pub async fn update_status(pool: &PgPool, id: i64, next: QueueStatus) -> AppResult<Self> {
        let sql = format!("SELECT {} FROM queues WHERE id = $1", QUEUE_COLUMNS);
        let current = sqlx::query_as::<_, QueueItem>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::not_found(format!("queue {}", id)))?;

        if !current.status.can_transition_to(next) {
            return Err(AppError::conflict(format!(
                "queue {} cannot move from {} to {}",
                current.queue_no,
                current.status.as_str(),
                next.as_str()
            )));
        }

        // 状态作为条件，并发修改时后到者得到冲突
        let sql = format!(
            r#"
            UPDATE queues
            SET status = $3,
                called_at = CASE WHEN $3 = 'in_progress' THEN NOW() ELSE called_at END
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            QUEUE_COLUMNS
        );
        sqlx::query_as::<_, QueueItem>(&sql)
            .bind(id)
            .bind(current.status.as_str())
            .bind(next.as_str())
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::conflict(format!("queue {} was changed concurrently", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_uses_snake_case_on_the_wire() {
        assert_eq!(
            serde_json::to_string(&QueueStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        let req: UpdateStatusRequest = serde_json::from_str(r#"{"status": "cancelled"}"#).unwrap();
        assert_eq!(req.status, QueueStatus::Cancelled);
    }

    #[test]
    fn database_status_strings_round_trip() {
        for status in [
            QueueStatus::Waiting,
            QueueStatus::InProgress,
            QueueStatus::Completed,
            QueueStatus::Cancelled,
        ] {
            assert_eq!(QueueStatus::try_from(status.as_str().to_string()), Ok(status));
        }
        assert!(QueueStatus::try_from("served".to_string()).is_err());
    }

    #[test]
    fn triage_level_is_bounded() {
        let req: IssueQueueRequest =
            serde_json::from_str(r#"{"patientId": 1, "departmentId": 2, "triageLevel": 6}"#).unwrap();
        assert!(req.validate().unwrap_err().field_errors().contains_key("triage_level"));

        let req: IssueQueueRequest =
            serde_json::from_str(r#"{"patientId": 1, "departmentId": 2}"#).unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.triage_level, 5);
    }
}
