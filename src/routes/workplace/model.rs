use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, postgres::PgRow};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::utils::validation::{MAX_NAME_LEN, hex_color, non_blank};

/// 简单按 id 读写的表
pub trait Table: for<'r> FromRow<'r, PgRow> + Send + Unpin {
    const TABLE: &'static str;
    const LABEL: &'static str;
    const COLUMNS: &'static str;
}

pub async fn find_by_id<T: Table>(pool: &PgPool, id: i64) -> AppResult<T> {
    let sql = format!("SELECT {} FROM {} WHERE id = $1", T::COLUMNS, T::TABLE);
    sqlx::query_as::<_, T>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found(format!("{} {}", T::LABEL, id)))
}

pub async fn delete_by_id<T: Table>(pool: &PgPool, id: i64) -> AppResult<()> {
    let sql = format!("DELETE FROM {} WHERE id = $1", T::TABLE);
    let result = sqlx::query(&sql).bind(id).execute(pool).await?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found(format!("{} {}", T::LABEL, id)));
    }
    Ok(())
}

fn default_color() -> String {
    "#1976d2".to_string()
}

fn default_true() -> bool {
    true
}

fn default_room_type() -> String {
    "examination".to_string()
}

// ========== 科室 ==========

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: i64,
    pub name: String,
    pub color: String,
    /// 叫号屏上的简称
    pub short_name: Option<String>,
    pub thai_code: Option<String>,
    pub bg_color: Option<String>,
    pub is_active: bool,
}

impl Table for Department {
    const TABLE: &'static str = "departments";
    const LABEL: &'static str = "department";
    const COLUMNS: &'static str = "id, name, color, short_name, thai_code, bg_color, is_active";
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentRequest {
    #[serde(default)]
    #[validate(
        custom(function = "non_blank"),
        length(max = MAX_NAME_LEN, message = "name is too long")
    )]
    pub name: String,
    #[serde(default = "default_color")]
    #[validate(custom(function = "hex_color"))]
    pub color: String,
    pub short_name: Option<String>,
    pub thai_code: Option<String>,
    pub bg_color: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Department {
    pub async fn find_all(pool: &PgPool, active_only: bool) -> AppResult<Vec<Self>> {
        let departments = sqlx::query_as::<_, Department>(
            r#"
            SELECT id, name, color, short_name, thai_code, bg_color, is_active
            FROM departments
            WHERE ($1 = FALSE OR is_active)
            ORDER BY id
            "#,
        )
        .bind(active_only)
        .fetch_all(pool)
        .await?;
        Ok(departments)
    }

    pub async fn create(pool: &PgPool, req: DepartmentRequest) -> AppResult<Self> {
        let department = sqlx::query_as::<_, Department>(
            r#"
            INSERT INTO departments (name, color, short_name, thai_code, bg_color, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, color, short_name, thai_code, bg_color, is_active
            "#,
        )
        .bind(req.name.trim())
        .bind(req.color)
        .bind(req.short_name)
        .bind(req.thai_code)
        .bind(req.bg_color)
        .bind(req.is_active)
        .fetch_one(pool)
        .await?;
        Ok(department)
    }

    pub async fn update(pool: &PgPool, id: i64, req: DepartmentRequest) -> AppResult<Self> {
        sqlx::query_as::<_, Department>(
            r#"
            UPDATE departments
            SET name = $2, color = $3, short_name = $4, thai_code = $5, bg_color = $6,
                is_active = $7
            WHERE id = $1
            RETURNING id, name, color, short_name, thai_code, bg_color, is_active
            "#,
        )
        .bind(id)
        .bind(req.name.trim())
        .bind(req.color)
        .bind(req.short_name)
        .bind(req.thai_code)
        .bind(req.bg_color)
        .bind(req.is_active)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found(format!("department {}", id)))
    }
}

// ========== 楼宇 ==========

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub is_active: bool,
}

impl Table for Building {
    const TABLE: &'static str = "buildings";
    const LABEL: &'static str = "building";
    const COLUMNS: &'static str = "id, name, address, is_active";
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BuildingRequest {
    #[serde(default)]
    #[validate(
        custom(function = "non_blank"),
        length(max = MAX_NAME_LEN, message = "name is too long")
    )]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Building {
    pub async fn find_all(pool: &PgPool) -> AppResult<Vec<Self>> {
        let buildings = sqlx::query_as::<_, Building>(
            "SELECT id, name, address, is_active FROM buildings ORDER BY id",
        )
        .fetch_all(pool)
        .await?;
        Ok(buildings)
    }

    pub async fn create(pool: &PgPool, req: BuildingRequest) -> AppResult<Self> {
        let building = sqlx::query_as::<_, Building>(
            r#"
            INSERT INTO buildings (name, address, is_active)
            VALUES ($1, $2, $3)
            RETURNING id, name, address, is_active
            "#,
        )
        .bind(req.name.trim())
        .bind(req.address)
        .bind(req.is_active)
        .fetch_one(pool)
        .await?;
        Ok(building)
    }

    pub async fn update(pool: &PgPool, id: i64, req: BuildingRequest) -> AppResult<Self> {
        sqlx::query_as::<_, Building>(
            r#"
            UPDATE buildings SET name = $2, address = $3, is_active = $4
            WHERE id = $1
            RETURNING id, name, address, is_active
            "#,
        )
        .bind(id)
        .bind(req.name.trim())
        .bind(req.address)
        .bind(req.is_active)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found(format!("building {}", id)))
    }
}

// ========== 楼层 ==========

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Floor {
    pub id: i64,
    pub building_id: i64,
    pub number: i32,
    pub name: String,
    pub is_active: bool,
}

impl Table for Floor {
    const TABLE: &'static str = "floors";
    const LABEL: &'static str = "floor";
    const COLUMNS: &'static str = "id, building_id, number, name, is_active";
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FloorRequest {
    #[validate(required(message = "buildingId is required"))]
    pub building_id: Option<i64>,
    #[validate(required(message = "number is required"))]
    pub number: Option<i32>,
    #[serde(default)]
    #[validate(length(max = MAX_NAME_LEN, message = "name is too long"))]
    pub name: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Floor {
    pub async fn find_all(pool: &PgPool, building_id: Option<i64>) -> AppResult<Vec<Self>> {
        let floors = sqlx::query_as::<_, Floor>(
            r#"
            SELECT id, building_id, number, name, is_active
            FROM floors
            WHERE ($1::BIGINT IS NULL OR building_id = $1)
            ORDER BY building_id, number
            "#,
        )
        .bind(building_id)
        .fetch_all(pool)
        .await?;
        Ok(floors)
    }

    pub async fn create(pool: &PgPool, req: FloorRequest) -> AppResult<Self> {
        let floor = sqlx::query_as::<_, Floor>(
            r#"
            INSERT INTO floors (building_id, number, name, is_active)
            VALUES ($1, $2, $3, $4)
            RETURNING id, building_id, number, name, is_active
            "#,
        )
        .bind(req.building_id)
        .bind(req.number)
        .bind(req.name)
        .bind(req.is_active)
        .fetch_one(pool)
        .await?;
        Ok(floor)
    }

    pub async fn update(pool: &PgPool, id: i64, req: FloorRequest) -> AppResult<Self> {
        sqlx::query_as::<_, Floor>(
            r#"
            UPDATE floors SET building_id = $2, number = $3, name = $4, is_active = $5
            WHERE id = $1
            RETURNING id, building_id, number, name, is_active
            "#,
        )
        .bind(id)
        .bind(req.building_id)
        .bind(req.number)
        .bind(req.name)
        .bind(req.is_active)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found(format!("floor {}", id)))
    }
}

// ========== 诊室 ==========

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: i64,
    pub floor_id: i64,
    pub department_id: i64,
    pub name: String,
    pub capacity: i32,
    #[serde(rename = "room_type")]
    pub room_type: String,
    pub is_active: bool,
}

impl Table for Room {
    const TABLE: &'static str = "rooms";
    const LABEL: &'static str = "room";
    const COLUMNS: &'static str = "id, floor_id, department_id, name, capacity, room_type, is_active";
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RoomRequest {
    #[validate(required(message = "floorId is required"))]
    pub floor_id: Option<i64>,
    #[validate(required(message = "departmentId is required"))]
    pub department_id: Option<i64>,
    #[serde(default)]
    #[validate(
        custom(function = "non_blank"),
        length(max = MAX_NAME_LEN, message = "name is too long")
    )]
    pub name: String,
    #[validate(range(min = 1, message = "capacity must be at least 1"))]
    pub capacity: Option<i32>,
    #[serde(rename = "room_type", default = "default_room_type")]
    pub room_type: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomFilter {
    pub floor_id: Option<i64>,
    pub department_id: Option<i64>,
}

impl Room {
    pub async fn find_all(pool: &PgPool, filter: &RoomFilter) -> AppResult<Vec<Self>> {
        let rooms = sqlx::query_as::<_, Room>(
            r#"
            SELECT id, floor_id, department_id, name, capacity, room_type, is_active
            FROM rooms
            WHERE ($1::BIGINT IS NULL OR floor_id = $1)
              AND ($2::BIGINT IS NULL OR department_id = $2)
            ORDER BY id
            "#,
        )
        .bind(filter.floor_id)
        .bind(filter.department_id)
        .fetch_all(pool)
        .await?;
        Ok(rooms)
    }

    /// 科室下启用的诊室，按 id 排序，排班默认值依赖这个顺序
    pub async fn find_active_by_department(
        pool: &PgPool,
        department_id: i64,
    ) -> AppResult<Vec<Self>> {
        let rooms = sqlx::query_as::<_, Room>(
            r#"
            SELECT id, floor_id, department_id, name, capacity, room_type, is_active
            FROM rooms
            WHERE department_id = $1 AND is_active
            ORDER BY id
            "#,
        )
        .bind(department_id)
        .fetch_all(pool)
        .await?;
        Ok(rooms)
    }

    pub async fn create(pool: &PgPool, req: RoomRequest) -> AppResult<Self> {
        let room = sqlx::query_as::<_, Room>(
            r#"
            INSERT INTO rooms (floor_id, department_id, name, capacity, room_type, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, floor_id, department_id, name, capacity, room_type, is_active
            "#,
        )
        .bind(req.floor_id)
        .bind(req.department_id)
        .bind(req.name.trim())
        .bind(req.capacity.unwrap_or(1))
        .bind(req.room_type)
        .bind(req.is_active)
        .fetch_one(pool)
        .await?;
        Ok(room)
    }

    pub async fn update(pool: &PgPool, id: i64, req: RoomRequest) -> AppResult<Self> {
        sqlx::query_as::<_, Room>(
            r#"
            UPDATE rooms
            SET floor_id = $2, department_id = $3, name = $4, capacity = $5, room_type = $6,
                is_active = $7
            WHERE id = $1
            RETURNING id, floor_id, department_id, name, capacity, room_type, is_active
            "#,
        )
        .bind(id)
        .bind(req.floor_id)
        .bind(req.department_id)
        .bind(req.name.trim())
        .bind(req.capacity.unwrap_or(1))
        .bind(req.room_type)
        .bind(req.is_active)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found(format!("room {}", id)))
    }
}
