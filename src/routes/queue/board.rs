//! 叫号看板：分级标签、状态流转与按科室汇总

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::model::{ActiveQueue, QueueStatus};

/// 每个科室“下一位”最多显示的号数
pub const NEXT_UP_LIMIT: usize = 5;

/// 分级 1 最紧急
pub fn triage_label(level: i16) -> &'static str {
    match level {
        1 => "วิกฤต",
        2 => "ฉุกเฉิน",
        3 => "เร่งด่วน",
        4 => "กึ่งเร่งด่วน",
        5 => "ปกติ",
        _ => "ไม่ระบุ",
    }
}

impl QueueStatus {
    pub fn can_transition_to(self, next: QueueStatus) -> bool {
        use QueueStatus::*;
        matches!(
            (self, next),
            (Waiting, InProgress) | (InProgress, Completed) | (Waiting | InProgress, Cancelled)
        )
    }
}

/// 号码格式：有简称用简称，否则 `D<科室id>-`，序号三位补零
pub fn format_queue_no(short_name: Option<&str>, department_id: i64, seq: i64) -> String {
    match short_name.map(str::trim).filter(|s| !s.is_empty()) {
        Some(prefix) => format!("{}{:03}", prefix, seq),
        None => format!("D{}-{:03}", department_id, seq),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BoardEntry {
    pub queue_no: String,
    pub room_name: Option<String>,
    pub triage_level: i16,
    pub triage_label: String,
}

impl From<&ActiveQueue> for BoardEntry {
    fn from(q: &ActiveQueue) -> Self {
        Self {
            queue_no: q.queue_no.clone(),
            room_name: q.room_name.clone(),
            triage_level: q.triage_level,
            triage_label: triage_label(q.triage_level).to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentBoard {
    pub department_id: i64,
    pub department_name: String,
    pub short_name: Option<String>,
    pub thai_code: Option<String>,
    pub bg_color: Option<String>,
    pub now_serving: Vec<BoardEntry>,
    pub next_up: Vec<BoardEntry>,
    pub waiting_count: usize,
}

/// 按科室汇总；正在就诊按叫号时间，等待按分级再按取号时间
pub fn build_board(items: &[ActiveQueue], next_up_limit: usize) -> Vec<DepartmentBoard> {
    let mut by_department: BTreeMap<i64, Vec<&ActiveQueue>> = BTreeMap::new();
    for item in items {
        by_department.entry(item.department_id).or_default().push(item);
    }

    by_department
        .into_values()
        .filter_map(|queues| {
            let first = *queues.first()?;

            let mut serving: Vec<&ActiveQueue> = queues
                .iter()
                .copied()
                .filter(|q| q.status == QueueStatus::InProgress)
                .collect();
            serving.sort_by_key(|q| (q.called_at, q.created_at));

            let mut waiting: Vec<&ActiveQueue> = queues
                .iter()
                .copied()
                .filter(|q| q.status == QueueStatus::Waiting)
                .collect();
            waiting.sort_by_key(|q| (q.triage_level, q.created_at));

            Some(DepartmentBoard {
                department_id: first.department_id,
                department_name: first.department_name.clone(),
                short_name: first.department_short_name.clone(),
                thai_code: first.thai_code.clone(),
                bg_color: first.bg_color.clone(),
                now_serving: serving.into_iter().map(BoardEntry::from).collect(),
                waiting_count: waiting.len(),
                next_up: waiting
                    .into_iter()
                    .take(next_up_limit)
                    .map(BoardEntry::from)
                    .collect(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};

    use super::*;

    fn base() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-03-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn queue(id: i64, department_id: i64, status: QueueStatus, triage: i16, minute: i64) -> ActiveQueue {
        ActiveQueue {
            id,
            queue_no: format!("A{:03}", id),
            patient_id: id,
            hn: format!("HN{}", id),
            patient_name: "สมชาย ใจดี".into(),
            room_schedule_id: Some(1),
            room_id: Some(1),
            room_name: Some("ห้องตรวจ 1".into()),
            department_id,
            department_name: format!("แผนก {}", department_id),
            department_short_name: Some("A".into()),
            thai_code: None,
            bg_color: Some("#e3f2fd".into()),
            triage_level: triage,
            status,
            created_at: base() + Duration::minutes(minute),
            called_at: (status == QueueStatus::InProgress).then(|| base() + Duration::minutes(minute + 30)),
            triage_label: String::new(),
        }
    }

    #[test]
    fn triage_labels_follow_fixed_table() {
        assert_eq!(triage_label(1), "วิกฤต");
        assert_eq!(triage_label(5), "ปกติ");
        assert_eq!(triage_label(0), "ไม่ระบุ");
        assert_eq!(triage_label(9), "ไม่ระบุ");
    }

    #[test]
    fn status_transitions() {
        use QueueStatus::*;
        assert!(Waiting.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
        assert!(Waiting.can_transition_to(Cancelled));
        assert!(!Waiting.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Waiting));
        assert!(!Cancelled.can_transition_to(InProgress));
    }

    #[test]
    fn queue_numbers_use_short_name_or_department() {
        assert_eq!(format_queue_no(Some("A"), 3, 7), "A007");
        assert_eq!(format_queue_no(Some("  "), 3, 12), "D3-012");
        assert_eq!(format_queue_no(None, 3, 1234), "D3-1234");
    }

    #[test]
    fn waiting_queues_are_ordered_by_urgency_then_arrival() {
        let items = vec![
            queue(1, 10, QueueStatus::Waiting, 5, 0),
            queue(2, 10, QueueStatus::Waiting, 2, 10),
            queue(3, 10, QueueStatus::Waiting, 2, 5),
            queue(4, 10, QueueStatus::InProgress, 5, 0),
        ];
        let board = build_board(&items, NEXT_UP_LIMIT);
        assert_eq!(board.len(), 1);

        let next: Vec<&str> = board[0].next_up.iter().map(|e| e.queue_no.as_str()).collect();
        assert_eq!(next, vec!["A003", "A002", "A001"]);
        assert_eq!(board[0].now_serving.len(), 1);
        assert_eq!(board[0].now_serving[0].queue_no, "A004");
        assert_eq!(board[0].next_up[0].triage_label, "ฉุกเฉิน");
    }

    #[test]
    fn departments_are_grouped_and_next_up_is_limited() {
        let mut items: Vec<ActiveQueue> = (1..=8)
            .map(|i| queue(i, 10, QueueStatus::Waiting, 5, i))
            .collect();
        items.push(queue(20, 11, QueueStatus::InProgress, 3, 0));

        let board = build_board(&items, 3);
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].department_id, 10);
        assert_eq!(board[0].next_up.len(), 3);
        assert_eq!(board[0].waiting_count, 8);
        assert_eq!(board[1].department_id, 11);
        assert!(board[1].next_up.is_empty());
        assert_eq!(board[1].bg_color.as_deref(), Some("#e3f2fd"));
    }

    #[test]
    fn board_json_is_camel_case_throughout() {
        let board = build_board(&[queue(1, 10, QueueStatus::Waiting, 3, 0)], NEXT_UP_LIMIT);
        let json = serde_json::to_value(&board).unwrap();
        let entry = &json[0]["nextUp"][0];
        assert_eq!(entry["queueNo"], "A001");
        assert_eq!(entry["triageLevel"], 3);
        assert!(entry.get("queue_no").is_none());
        assert_eq!(json[0]["waitingCount"], 1);
    }

    #[test]
    fn empty_input_gives_empty_board() {
        assert!(build_board(&[], NEXT_UP_LIMIT).is_empty());
    }
}
