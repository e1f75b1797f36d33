use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::error::AppResult;
use crate::utils::DateRange;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Document {
    pub id: i64,
    pub title: String,
    pub doc_type: String,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub doc_type: Option<String>,
}

impl DocumentQuery {
    pub fn range(&self) -> AppResult<DateRange> {
        DateRange::from_dates(self.start_date, self.end_date)
    }

    pub fn doc_type(&self) -> Option<&str> {
        self.doc_type.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

impl Document {
    pub async fn find_in_range(
        pool: &PgPool,
        range: &DateRange,
        doc_type: Option<&str>,
    ) -> AppResult<Vec<Self>> {
        let documents = sqlx::query_as::<_, Document>(
            r#"
            SELECT id, title, doc_type, created_by, created_at
            FROM documents
            WHERE ($1::TIMESTAMPTZ IS NULL OR created_at >= $1)
              AND ($2::TIMESTAMPTZ IS NULL OR created_at <= $2)
              AND ($3::TEXT IS NULL OR doc_type = $3)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .bind(doc_type)
        .fetch_all(pool)
        .await?;
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn query_uses_camel_case_dates() {
        let query: DocumentQuery = serde_json::from_str(
            r#"{"startDate": "2024-01-10", "endDate": "2024-01-15", "docType": " "}"#,
        )
        .unwrap();
        let range = query.range().unwrap();
        let inside = DateTime::parse_from_rfc3339("2024-01-15T23:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let outside = DateTime::parse_from_rfc3339("2024-01-16T00:00:01Z")
            .unwrap()
            .with_timezone(&Utc);
        assert!(range.contains(inside));
        assert!(!range.contains(outside));
        assert_eq!(query.doc_type(), None);
    }

    #[test]
    fn reversed_dates_are_rejected() {
        let query = DocumentQuery {
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            end_date: NaiveDate::from_ymd_opt(2024, 2, 1),
            doc_type: None,
        };
        assert!(matches!(query.range(), Err(AppError::Validation(_))));
    }
}
