use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::routes::patient::model::Visit;
use crate::routes::room_schedule::RoomSchedule;
use crate::routes::worker::EmployeeType;
use crate::utils::DateRange;

use super::export::{Cell, ReportColumn, ReportRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Doctors,
    Nurses,
    Patients,
}

impl ReportKind {
    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::Doctors => "รายงานแพทย์",
            ReportKind::Nurses => "รายงานพยาบาล",
            ReportKind::Patients => "รายงานการรักษาผู้ป่วย",
        }
    }

    pub fn file_stem(&self) -> &'static str {
        match self {
            ReportKind::Doctors => "doctors",
            ReportKind::Nurses => "nurses",
            ReportKind::Patients => "patients",
        }
    }
}

#[derive(Debug, Default, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl RangeQuery {
    pub fn range(&self) -> AppResult<DateRange> {
        DateRange::from_dates(self.start_date, self.end_date)
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    #[validate(length(min = 1, message = "select at least one column"))]
    pub columns: Vec<String>,
    /// 用户勾选的行，缺省表示全部
    pub ids: Option<Vec<i64>>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ExportRequest {
    pub fn range(&self) -> AppResult<DateRange> {
        DateRange::from_dates(self.start_date, self.end_date)
    }

    pub fn keep<R: ReportRow>(&self, rows: Vec<R>) -> Vec<R> {
        match &self.ids {
            Some(ids) => rows.into_iter().filter(|r| ids.contains(&r.row_id())).collect(),
            None => rows,
        }
    }
}

// ========== 医护报表 ==========

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StaffReportRow {
    pub id: i64,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub employee_type: EmployeeType,
    pub department_name: Option<String>,
    pub status: String,
    /// 区间内出诊（开放诊室）的天数
    pub duty_days: i64,
    /// 区间内经手的就诊次数
    pub visit_count: i64,
}

impl ReportRow for StaffReportRow {
    const COLUMNS: &'static [ReportColumn] = &[
        ReportColumn { key: "id", header: "รหัส" },
        ReportColumn { key: "name", header: "ชื่อ-สกุล" },
        ReportColumn { key: "departmentName", header: "แผนก" },
        ReportColumn { key: "status", header: "สถานะ" },
        ReportColumn { key: "dutyDays", header: "วันปฏิบัติงาน" },
        ReportColumn { key: "visitCount", header: "จำนวนผู้ป่วย" },
    ];

    fn row_id(&self) -> i64 {
        self.id
    }

    fn cell(&self, key: &str) -> Cell {
        match key {
            "id" => self.id.into(),
            "name" => self.name.clone().into(),
            "departmentName" => self.department_name.clone().into(),
            "status" => self.status.clone().into(),
            "dutyDays" => self.duty_days.into(),
            "visitCount" => self.visit_count.into(),
            _ => Cell::Empty,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffReportDetail {
    #[serde(flatten)]
    pub summary: StaffReportRow,
    pub schedules: Vec<RoomSchedule>,
    pub visits: Vec<Visit>,
}

impl StaffReportRow {
    pub async fn find_all(
        pool: &PgPool,
        employee_type: EmployeeType,
        range: &DateRange,
        employee_id: Option<i64>,
    ) -> AppResult<Vec<Self>> {
        let rows = sqlx::query_as::<_, StaffReportRow>(
            r#"
            SELECT e.id,
                   e.first_name || ' ' || e.last_name AS name,
                   e.employee_type,
                   d.name AS department_name,
                   e.status,
                   (SELECT COUNT(DISTINCT s.date) FROM room_schedules s
                     WHERE s.is_open AND (s.doctor_id = e.id OR s.nurse_id = e.id)
                       AND ($2::DATE IS NULL OR s.date >= $2)
                       AND ($3::DATE IS NULL OR s.date <= $3)) AS duty_days,
                   (SELECT COUNT(*) FROM visits v
                     WHERE (v.doctor_id = e.id OR v.nurse_id = e.id)
                       AND ($2::DATE IS NULL OR v.visit_date >= $2)
                       AND ($3::DATE IS NULL OR v.visit_date <= $3)) AS visit_count
            FROM employees e
            LEFT JOIN departments d ON d.id = e.department_id
            WHERE e.employee_type = $1
              AND ($4::BIGINT IS NULL OR e.id = $4)
            ORDER BY e.id
            "#,
        )
        .bind(employee_type.as_str())
        .bind(range.start_date())
        .bind(range.end_date())
        .bind(employee_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_detail(
        pool: &PgPool,
        employee_type: EmployeeType,
        id: i64,
        range: &DateRange,
    ) -> AppResult<StaffReportDetail> {
        let summary = Self::find_all(pool, employee_type, range, Some(id))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::not_found(format!("{} {}", employee_type.as_str(), id)))?;

        let (schedules, visits) = futures_util::try_join!(
            async {
                sqlx::query_as::<_, RoomSchedule>(
                    r#"
                    SELECT id, date, room_id, department_id, is_open, doctor_id, nurse_id,
                           open_time, close_time, max_patients, notes
                    FROM room_schedules
                    WHERE (doctor_id = $1 OR nurse_id = $1)
                      AND ($2::DATE IS NULL OR date >= $2)
                      AND ($3::DATE IS NULL OR date <= $3)
                    ORDER BY date, room_id
                    "#,
                )
                .bind(id)
                .bind(range.start_date())
                .bind(range.end_date())
                .fetch_all(pool)
                .await
            },
            async {
                sqlx::query_as::<_, Visit>(
                    r#"
                    SELECT id, patient_id, doctor_id, nurse_id, department_id, visit_date,
                           diagnosis, treatment, created_at
                    FROM visits
                    WHERE (doctor_id = $1 OR nurse_id = $1)
                      AND ($2::DATE IS NULL OR visit_date >= $2)
                      AND ($3::DATE IS NULL OR visit_date <= $3)
                    ORDER BY visit_date, id
                    "#,
                )
                .bind(id)
                .bind(range.start_date())
                .bind(range.end_date())
                .fetch_all(pool)
                .await
            },
        )?;

        Ok(StaffReportDetail {
            summary,
            schedules,
            visits,
        })
    }
}

// ========== 患者治疗报表 ==========

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PatientReportRow {
    pub id: i64,
    pub hn: String,
    pub name: String,
    pub gender: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub visit_count: i64,
    pub last_visit: Option<NaiveDate>,
}

impl ReportRow for PatientReportRow {
    const COLUMNS: &'static [ReportColumn] = &[
        ReportColumn { key: "hn", header: "HN" },
        ReportColumn { key: "name", header: "ชื่อ-สกุล" },
        ReportColumn { key: "gender", header: "เพศ" },
        ReportColumn { key: "birthDate", header: "วันเกิด" },
        ReportColumn { key: "visitCount", header: "จำนวนครั้งที่รักษา" },
        ReportColumn { key: "lastVisit", header: "รักษาล่าสุด" },
    ];

    fn row_id(&self) -> i64 {
        self.id
    }

    fn cell(&self, key: &str) -> Cell {
        match key {
            "hn" => self.hn.clone().into(),
            "name" => self.name.clone().into(),
            "gender" => self.gender.clone().into(),
            "birthDate" => self.birth_date.map(|d| d.to_string()).into(),
            "visitCount" => self.visit_count.into(),
            "lastVisit" => self.last_visit.map(|d| d.to_string()).into(),
            _ => Cell::Empty,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientReportDetail {
    #[serde(flatten)]
    pub summary: PatientReportRow,
    pub visits: Vec<Visit>,
}

impl PatientReportRow {
    pub async fn find_all(
        pool: &PgPool,
        range: &DateRange,
        patient_id: Option<i64>,
    ) -> AppResult<Vec<Self>> {
        let rows = sqlx::query_as::<_, PatientReportRow>(
            r#"
            SELECT p.id, p.hn,
                   p.first_name || ' ' || p.last_name AS name,
                   p.gender, p.birth_date,
                   COUNT(v.id) AS visit_count,
                   MAX(v.visit_date) AS last_visit
            FROM patients p
            LEFT JOIN visits v ON v.patient_id = p.id
                 AND ($1::DATE IS NULL OR v.visit_date >= $1)
                 AND ($2::DATE IS NULL OR v.visit_date <= $2)
            WHERE ($3::BIGINT IS NULL OR p.id = $3)
            GROUP BY p.id
            ORDER BY p.id
            "#,
        )
        .bind(range.start_date())
        .bind(range.end_date())
        .bind(patient_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_detail(
        pool: &PgPool,
        id: i64,
        range: &DateRange,
    ) -> AppResult<PatientReportDetail> {
        let summary = Self::find_all(pool, range, Some(id))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::not_found(format!("patient {}", id)))?;

        let visits = Visit::find_by_patient(pool, id)
            .await?
            .into_iter()
            .filter(|v| range.contains_date(v.visit_date))
            .collect();

        Ok(PatientReportDetail { summary, visits })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staff(id: i64) -> StaffReportRow {
        StaffReportRow {
            id,
            name: format!("นพ. ทดสอบ {}", id),
            employee_type: EmployeeType::Doctor,
            department_name: None,
            status: "active".into(),
            duty_days: 4,
            visit_count: 12,
        }
    }

    #[test]
    fn staff_cells_follow_column_keys() {
        let row = staff(3);
        let filled = StaffReportRow::COLUMNS
            .iter()
            .filter(|c| row.cell(c.key) != Cell::Empty)
            .count();
        // 只有科室为空
        assert_eq!(filled, StaffReportRow::COLUMNS.len() - 1);
        assert_eq!(row.cell("dutyDays"), Cell::Number(4.0));
        assert_eq!(row.cell("departmentName"), Cell::Empty);
    }

    #[test]
    fn export_keeps_only_selected_ids() {
        let req: ExportRequest =
            serde_json::from_str(r#"{"columns": ["name"], "ids": [2, 3]}"#).unwrap();
        let kept = req.keep(vec![staff(1), staff(2), staff(3)]);
        let ids: Vec<i64> = kept.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 3]);

        let req: ExportRequest = serde_json::from_str(r#"{"columns": ["name"]}"#).unwrap();
        assert_eq!(req.keep(vec![staff(1), staff(2)]).len(), 2);
    }

    #[test]
    fn report_kind_comes_from_path_segment() {
        let kind: ReportKind = serde_json::from_str("\"nurses\"").unwrap();
        assert_eq!(kind, ReportKind::Nurses);
        assert_eq!(kind.file_stem(), "nurses");
        assert!(serde_json::from_str::<ReportKind>("\"janitors\"").is_err());
    }
}
