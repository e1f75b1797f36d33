use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::error::AppResult;
use crate::routes::workplace::model::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmployeeType {
    Doctor,
    Nurse,
    Staff,
}

impl EmployeeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeType::Doctor => "doctor",
            EmployeeType::Nurse => "nurse",
            EmployeeType::Staff => "staff",
        }
    }
}

#[derive(Debug, PartialEq, thiserror::Error)]
#[error("unknown employee type {0}")]
pub struct UnknownEmployeeType(pub String);

impl TryFrom<String> for EmployeeType {
    type Error = UnknownEmployeeType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "doctor" => Ok(EmployeeType::Doctor),
            "nurse" => Ok(EmployeeType::Nurse),
            "staff" => Ok(EmployeeType::Staff),
            _ => Err(UnknownEmployeeType(value)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: i64,
    #[sqlx(try_from = "String")]
    pub employee_type: EmployeeType,
    pub first_name: String,
    pub last_name: String,
    pub department_id: Option<i64>,
    pub status: String,
    pub working_days: Vec<String>,
}

impl Table for Employee {
    const TABLE: &'static str = "employees";
    const LABEL: &'static str = "employee";
    const COLUMNS: &'static str =
        "id, employee_type, first_name, last_name, department_id, status, working_days";
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeFilter {
    pub employee_type: Option<EmployeeType>,
    pub department_id: Option<i64>,
    pub status: Option<String>,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub async fn find_all(pool: &PgPool, filter: &EmployeeFilter) -> AppResult<Vec<Self>> {
        let employees = sqlx::query_as::<_, Employee>(
            r#"
            SELECT id, employee_type, first_name, last_name, department_id, status, working_days
            FROM employees
            WHERE ($1::TEXT IS NULL OR employee_type = $1)
              AND ($2::BIGINT IS NULL OR department_id = $2)
              AND ($3::TEXT IS NULL OR status = $3)
            ORDER BY employee_type, id
            "#,
        )
        .bind(filter.employee_type.map(|t| t.as_str()))
        .bind(filter.department_id)
        .bind(&filter.status)
        .fetch_all(pool)
        .await?;
        Ok(employees)
    }

    /// 可排班的医生和护士
    pub async fn find_schedulable(pool: &PgPool) -> AppResult<Vec<Self>> {
        let employees = sqlx::query_as::<_, Employee>(
            r#"
            SELECT id, employee_type, first_name, last_name, department_id, status, working_days
            FROM employees
            WHERE employee_type IN ('doctor', 'nurse') AND status = 'active'
            ORDER BY employee_type, id
            "#,
        )
        .fetch_all(pool)
        .await?;
        Ok(employees)
    }
}
