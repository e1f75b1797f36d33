use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::utils::validation::{MAX_NAME_LEN, MAX_NOTE_LEN, non_blank};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: i64,
    /// 医院病历号
    pub hn: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: Option<i64>,
    pub nurse_id: Option<i64>,
    pub department_id: Option<i64>,
    pub visit_date: NaiveDate,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientDetail {
    #[serde(flatten)]
    pub patient: Patient,
    pub visits: Vec<Visit>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PatientRequest {
    #[serde(default)]
    #[validate(custom(function = "non_blank"), length(max = 32, message = "hn is too long"))]
    pub hn: String,
    #[serde(default)]
    #[validate(
        custom(function = "non_blank"),
        length(max = MAX_NAME_LEN, message = "firstName is too long")
    )]
    pub first_name: String,
    #[serde(default)]
    #[validate(
        custom(function = "non_blank"),
        length(max = MAX_NAME_LEN, message = "lastName is too long")
    )]
    pub last_name: String,
    pub gender: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VisitRequest {
    pub doctor_id: Option<i64>,
    pub nurse_id: Option<i64>,
    pub department_id: Option<i64>,
    #[validate(required(message = "visitDate is required"))]
    pub visit_date: Option<NaiveDate>,
    #[validate(length(max = MAX_NOTE_LEN, message = "diagnosis is too long"))]
    pub diagnosis: Option<String>,
    #[validate(length(max = MAX_NOTE_LEN, message = "treatment is too long"))]
    pub treatment: Option<String>,
}

/// `%`、`_` 按字面匹配（ILIKE 默认转义符为 `\`）
fn like_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

const PATIENT_COLUMNS: &str = "id, hn, first_name, last_name, gender, birth_date, phone, created_at";

impl Patient {
    /// 按 HN 或姓名模糊查找
    pub async fn find_all(pool: &PgPool, search: Option<&str>) -> AppResult<Vec<Self>> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern);

        let sql = format!(
            r#"
            SELECT {} FROM patients
            WHERE ($1::TEXT IS NULL
                   OR hn ILIKE $1
                   OR (first_name || ' ' || last_name) ILIKE $1)
            ORDER BY id
            "#,
            PATIENT_COLUMNS
        );
        let patients = sqlx::query_as::<_, Patient>(&sql)
            .bind(pattern)
            .fetch_all(pool)
            .await?;
        Ok(patients)
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> AppResult<Self> {
        let sql = format!("SELECT {} FROM patients WHERE id = $1", PATIENT_COLUMNS);
        sqlx::query_as::<_, Patient>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::not_found(format!("patient {}", id)))
    }

    pub async fn create(pool: &PgPool, req: PatientRequest) -> AppResult<Self> {
        let sql = format!(
            r#"
            INSERT INTO patients (hn, first_name, last_name, gender, birth_date, phone)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            PATIENT_COLUMNS
        );
        let patient = sqlx::query_as::<_, Patient>(&sql)
            .bind(req.hn.trim())
            .bind(req.first_name.trim())
            .bind(req.last_name.trim())
            .bind(req.gender)
            .bind(req.birth_date)
            .bind(req.phone)
            .fetch_one(pool)
            .await?;
        Ok(patient)
    }

    pub async fn update(pool: &PgPool, id: i64, req: PatientRequest) -> AppResult<Self> {
        let sql = format!(
            r#"
            UPDATE patients
            SET hn = $2, first_name = $3, last_name = $4, gender = $5, birth_date = $6, phone = $7
            WHERE id = $1
            RETURNING {}
            "#,
            PATIENT_COLUMNS
        );
        sqlx::query_as::<_, Patient>(&sql)
            .bind(id)
            .bind(req.hn.trim())
            .bind(req.first_name.trim())
            .bind(req.last_name.trim())
            .bind(req.gender)
            .bind(req.birth_date)
            .bind(req.phone)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::not_found(format!("patient {}", id)))
    }
}

impl Visit {
    pub async fn find_by_patient(pool: &PgPool, patient_id: i64) -> AppResult<Vec<Self>> {
        let visits = sqlx::query_as::<_, Visit>(
            r#"
            SELECT id, patient_id, doctor_id, nurse_id, department_id, visit_date,
                   diagnosis, treatment, created_at
            FROM visits
            WHERE patient_id = $1
            ORDER BY visit_date DESC, id DESC
            "#,
        )
        .bind(patient_id)
        .fetch_all(pool)
        .await?;
        Ok(visits)
    }

    pub async fn create(pool: &PgPool, patient_id: i64, req: VisitRequest) -> AppResult<Self> {
        let visit_date = req
            .visit_date
            .ok_or_else(|| AppError::field("visitDate", "visitDate is required"))?;

        let visit = sqlx::query_as::<_, Visit>(
            r#"
            INSERT INTO visits (patient_id, doctor_id, nurse_id, department_id, visit_date,
                                diagnosis, treatment)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, patient_id, doctor_id, nurse_id, department_id, visit_date,
                      diagnosis, treatment, created_at
            "#,
        )
        .bind(patient_id)
        .bind(req.doctor_id)
        .bind(req.nurse_id)
        .bind(req.department_id)
        .bind(visit_date)
        .bind(req.diagnosis)
        .bind(req.treatment)
        .fetch_one(pool)
        .await?;
        Ok(visit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hn_is_required() {
        let req: PatientRequest =
            serde_json::from_str(r#"{"firstName": "สมชาย", "lastName": "ใจดี"}"#).unwrap();
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("hn"));
        assert!(!fields.contains_key("first_name"));
    }

    #[test]
    fn search_wildcards_match_literally() {
        assert_eq!(like_pattern("HN001"), "%HN001%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn visit_needs_a_date() {
        let req: VisitRequest = serde_json::from_str(r#"{"diagnosis": "ไข้หวัด"}"#).unwrap();
        assert!(req.validate().unwrap_err().field_errors().contains_key("visit_date"));
    }
}
