//! 排班规则：默认排班生成与医护重复排班检查
//!
//! 这里只做内存计算，读写数据库在 `model` 中完成。
//! 重复排班检查是“先读后写”，两个并发请求仍可能同时通过。

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use crate::error::{AppError, FieldErrors};
use crate::routes::worker::{Employee, EmployeeType};
use crate::routes::workplace::Room;

use super::model::RoomSchedule;

pub fn default_open_time() -> NaiveTime {
    NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN)
}

pub fn default_close_time() -> NaiveTime {
    NaiveTime::from_hms_opt(16, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// 已校验的排班内容，字段都已确定
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleDraft {
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

impl ScheduleDraft {
    fn staff(&self) -> impl Iterator<Item = (StaffRole, i64)> {
        staff_of(self.doctor_id, self.nurse_id)
    }
}

impl From<&RoomSchedule> for ScheduleDraft {
    fn from(s: &RoomSchedule) -> Self {
        Self {
            date: s.date,
            room_id: s.room_id,
            department_id: s.department_id,
            is_open: s.is_open,
            doctor_id: s.doctor_id,
            nurse_id: s.nurse_id,
            open_time: s.open_time,
            close_time: s.close_time,
            max_patients: s.max_patients,
            notes: s.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffRole {
    Doctor,
    Nurse,
}

fn staff_of(doctor_id: Option<i64>, nurse_id: Option<i64>) -> impl Iterator<Item = (StaffRole, i64)> {
    doctor_id
        .map(|id| (StaffRole::Doctor, id))
        .into_iter()
        .chain(nurse_id.map(|id| (StaffRole::Nurse, id)))
}

/// 同一天已被安排到开放诊室的医护
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoubleBooking {
    pub role: StaffRole,
    pub employee_id: i64,
    pub schedule_id: i64,
    pub room_id: i64,
}

impl std::fmt::Display for DoubleBooking {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let role = match self.role {
            StaffRole::Doctor => "doctor",
            StaffRole::Nurse => "nurse",
        };
        write!(
            f,
            "{} {} is already assigned to open room {} on this date",
            role, self.employee_id, self.room_id
        )
    }
}

/// 生成默认排班：按诊室 id 顺序，前 `open_rooms` 间开放，其余关闭
pub fn default_drafts(
    date: NaiveDate,
    department_id: i64,
    rooms: &[Room],
    open_rooms: usize,
) -> Vec<ScheduleDraft> {
    let mut rooms: Vec<&Room> = rooms.iter().collect();
    rooms.sort_by_key(|r| r.id);

    rooms
        .into_iter()
        .enumerate()
        .map(|(index, room)| ScheduleDraft {
            date,
            room_id: room.id,
            department_id,
            is_open: index < open_rooms,
            doctor_id: None,
            nurse_id: None,
            open_time: default_open_time(),
            close_time: default_close_time(),
            max_patients: room.capacity,
            notes: None,
        })
        .collect()
}

/// 员工 id -> 所在开放排班，`exclude` 为正在编辑的排班
pub fn busy_staff(
    schedules: &[RoomSchedule],
    date: NaiveDate,
    exclude: Option<i64>,
) -> HashMap<i64, &RoomSchedule> {
    schedules
        .iter()
        .filter(|s| s.date == date && s.is_open && Some(s.id) != exclude)
        .flat_map(|s| staff_of(s.doctor_id, s.nurse_id).map(move |(_, id)| (id, s)))
        .collect()
}

/// 关闭的诊室不占用医护
pub fn find_double_booking(
    schedules: &[RoomSchedule],
    draft: &ScheduleDraft,
    exclude: Option<i64>,
) -> Option<DoubleBooking> {
    if !draft.is_open {
        return None;
    }
    let busy = busy_staff(schedules, draft.date, exclude);

    draft.staff().find_map(|(role, employee_id)| {
        busy.get(&employee_id).map(|s| DoubleBooking {
            role,
            employee_id,
            schedule_id: s.id,
            room_id: s.room_id,
        })
    })
}

/// 批量创建时同批次之间也要检查
pub fn find_double_booking_in_batch(
    existing: &[RoomSchedule],
    drafts: &[ScheduleDraft],
) -> Option<DoubleBooking> {
    let mut claimed: HashMap<(NaiveDate, i64), i64> = HashMap::new();

    for draft in drafts {
        if let Some(conflict) = find_double_booking(existing, draft, None) {
            return Some(conflict);
        }
        if !draft.is_open {
            continue;
        }
        for (role, employee_id) in draft.staff() {
            if let Some(room_id) = claimed.insert((draft.date, employee_id), draft.room_id) {
                return Some(DoubleBooking {
                    role,
                    employee_id,
                    schedule_id: 0,
                    room_id,
                });
            }
        }
    }
    None
}

/// 诊室必须属于排班科室，医生位只放医生，护士位只放护士
pub fn check_assignment(
    draft: &ScheduleDraft,
    room: &Room,
    doctor: Option<&Employee>,
    nurse: Option<&Employee>,
) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();

    if room.department_id != draft.department_id {
        errors.entry("roomId".to_string()).or_default().push(format!(
            "room {} belongs to department {}, not {}",
            room.id, room.department_id, draft.department_id
        ));
    }
    if let Some(e) = doctor.filter(|e| e.employee_type != EmployeeType::Doctor) {
        errors
            .entry("doctorId".to_string())
            .or_default()
            .push(format!("employee {} is not a doctor", e.id));
    }
    if let Some(e) = nurse.filter(|e| e.employee_type != EmployeeType::Nurse) {
        errors
            .entry("nurseId".to_string())
            .or_default()
            .push(format!("employee {} is not a nurse", e.id));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn room(id: i64, capacity: i32) -> Room {
        Room {
            id,
            floor_id: 1,
            department_id: 10,
            name: format!("ห้อง {}", id),
            capacity,
            room_type: "examination".into(),
            is_active: true,
        }
    }

    fn schedule(id: i64, room_id: i64, is_open: bool, doctor: Option<i64>, nurse: Option<i64>) -> RoomSchedule {
        RoomSchedule {
            id,
            date: date(),
            room_id,
            department_id: 10,
            is_open,
            doctor_id: doctor,
            nurse_id: nurse,
            open_time: default_open_time(),
            close_time: default_close_time(),
            max_patients: 20,
            notes: None,
        }
    }

    fn draft(room_id: i64, is_open: bool, doctor: Option<i64>, nurse: Option<i64>) -> ScheduleDraft {
        ScheduleDraft::from(&schedule(0, room_id, is_open, doctor, nurse))
    }

    #[test]
    fn defaults_open_first_two_rooms_by_id() {
        let rooms = vec![room(7, 5), room(3, 2), room(5, 9)];
        let drafts = default_drafts(date(), 10, &rooms, 2);

        let summary: Vec<(i64, bool, i32)> = drafts
            .iter()
            .map(|d| (d.room_id, d.is_open, d.max_patients))
            .collect();
        assert_eq!(summary, vec![(3, true, 2), (5, true, 9), (7, false, 5)]);
        assert!(drafts.iter().all(|d| d.doctor_id.is_none() && d.nurse_id.is_none()));
        assert_eq!(drafts[0].open_time, default_open_time());
        assert_eq!(drafts[0].close_time, default_close_time());
    }

    #[test]
    fn defaults_with_fewer_rooms_than_open_count() {
        let drafts = default_drafts(date(), 10, &[room(1, 1)], 2);
        assert_eq!(drafts.len(), 1);
        assert!(drafts[0].is_open);
        assert!(default_drafts(date(), 10, &[], 2).is_empty());
    }

    #[test]
    fn doctor_in_another_open_room_is_double_booked() {
        let existing = vec![schedule(1, 100, true, Some(42), None)];
        let conflict = find_double_booking(&existing, &draft(101, true, Some(42), None), None).unwrap();
        assert_eq!(conflict.role, StaffRole::Doctor);
        assert_eq!(conflict.room_id, 100);
        assert_eq!(conflict.schedule_id, 1);
    }

    #[test]
    fn closed_rooms_do_not_hold_staff() {
        let existing = vec![schedule(1, 100, false, Some(42), Some(7))];
        assert!(find_double_booking(&existing, &draft(101, true, Some(42), Some(7)), None).is_none());
        // 关闭的诊室本身也不占人
        let existing = vec![schedule(1, 100, true, Some(42), None)];
        assert!(find_double_booking(&existing, &draft(101, false, Some(42), None), None).is_none());
    }

    #[test]
    fn editing_the_same_schedule_is_not_a_conflict() {
        let existing = vec![schedule(1, 100, true, Some(42), Some(7))];
        let mut edit = draft(100, true, Some(42), Some(7));
        edit.max_patients = 30;
        assert!(find_double_booking(&existing, &edit, Some(1)).is_none());
    }

    #[test]
    fn nurse_conflicts_are_detected_too() {
        let existing = vec![schedule(1, 100, true, None, Some(7))];
        let conflict = find_double_booking(&existing, &draft(101, true, None, Some(7)), None).unwrap();
        assert_eq!(conflict.role, StaffRole::Nurse);
        assert_eq!(conflict.employee_id, 7);
    }

    #[test]
    fn other_dates_are_ignored() {
        let mut other_day = schedule(1, 100, true, Some(42), None);
        other_day.date = date().succ_opt().unwrap();
        assert!(find_double_booking(&[other_day], &draft(101, true, Some(42), None), None).is_none());
    }

    #[test]
    fn batch_conflicts_within_itself() {
        let drafts = vec![
            draft(100, true, Some(42), None),
            draft(101, true, Some(42), None),
        ];
        let conflict = find_double_booking_in_batch(&[], &drafts).unwrap();
        assert_eq!(conflict.employee_id, 42);
        assert_eq!(conflict.room_id, 100);

        let drafts = vec![
            draft(100, true, Some(42), None),
            draft(101, false, Some(42), None),
        ];
        assert!(find_double_booking_in_batch(&[], &drafts).is_none());
    }

    #[test]
    fn busy_staff_maps_employee_to_room() {
        let existing = vec![
            schedule(1, 100, true, Some(42), Some(7)),
            schedule(2, 101, false, Some(43), None),
        ];
        let busy = busy_staff(&existing, date(), None);
        assert_eq!(busy.get(&42).map(|s| s.room_id), Some(100));
        assert_eq!(busy.get(&7).map(|s| s.room_id), Some(100));
        assert!(!busy.contains_key(&43));
        assert!(busy_staff(&existing, date(), Some(1)).is_empty());
    }

    fn employee(id: i64, employee_type: EmployeeType) -> Employee {
        Employee {
            id,
            employee_type,
            first_name: "ทดสอบ".into(),
            last_name: format!("{}", id),
            department_id: Some(10),
            status: "active".into(),
            working_days: Vec::new(),
        }
    }

    #[test]
    fn matching_assignment_passes() {
        let d = draft(100, true, Some(1), Some(2));
        let doctor = employee(1, EmployeeType::Doctor);
        let nurse = employee(2, EmployeeType::Nurse);
        assert!(check_assignment(&d, &room(100, 5), Some(&doctor), Some(&nurse)).is_ok());
        assert!(check_assignment(&d, &room(100, 5), None, None).is_ok());
    }

    #[test]
    fn doctor_in_nurse_slot_is_a_field_error() {
        let d = draft(100, true, None, Some(1));
        let doctor = employee(1, EmployeeType::Doctor);
        match check_assignment(&d, &room(100, 5), None, Some(&doctor)) {
            Err(AppError::Validation(fields)) => {
                assert!(fields.contains_key("nurseId"));
                assert_eq!(fields.len(), 1);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn room_from_another_department_is_rejected() {
        let mut d = draft(100, true, None, None);
        d.department_id = 11;
        let staff = employee(5, EmployeeType::Staff);
        match check_assignment(&d, &room(100, 5), Some(&staff), None) {
            Err(AppError::Validation(fields)) => {
                assert!(fields.contains_key("roomId"));
                assert!(fields.contains_key("doctorId"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
