//! 积分历史规范化
//!
//! 将平台返回的原始事件页转换为客户端使用的交易列表。

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::gateway::LoyaltyEvent;

/// 交易时间的展示格式，如 "1 Apr 2025 10:30"
pub const TIMESTAMP_FORMAT: &str = "%-d %b %Y %H:%M";

/// 规范化后的积分交易
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    #[serde(rename = "type")]
    pub transaction_type: String,
    pub points: i64,
    pub timestamp: String,
}

impl From<LoyaltyEvent> for Transaction {
    fn from(event: LoyaltyEvent) -> Self {
        let points = event
            .accumulate_points
            .as_ref()
            .and_then(|a| a.points)
            .unwrap_or(0);

        Self {
            timestamp: format_timestamp(&event.created_at),
            id: event.id,
            transaction_type: event.event_type,
            points,
        }
    }
}

/// 一页积分历史
///
/// `cursor` 为空字符串表示没有下一页。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryPage {
    pub transactions: Vec<Transaction>,
    pub cursor: String,
}

impl HistoryPage {
    pub fn has_more(&self) -> bool {
        !self.cursor.is_empty()
    }
}

/// 格式化 RFC 3339 时间戳，解析失败时原样返回
///
/// 保留源时间戳携带的时区偏移，不做时区转换。
pub fn format_timestamp(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => ts.format(TIMESTAMP_FORMAT).to_string(),
        Err(_) => raw.to_string(),
    }
}

/// 规范化事件页
///
/// 空事件被丢弃，其余保持平台返回的顺序。
pub fn normalize_page(events: Vec<Option<LoyaltyEvent>>, cursor: Option<String>) -> HistoryPage {
    HistoryPage {
        transactions: events.into_iter().flatten().map(Transaction::from).collect(),
        cursor: cursor.unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::LoyaltyEventAccumulatePoints;

    fn event(id: &str, event_type: &str, created_at: &str, points: Option<i64>) -> LoyaltyEvent {
        LoyaltyEvent {
            id: id.to_string(),
            event_type: event_type.to_string(),
            created_at: created_at.to_string(),
            loyalty_account_id: Some("acc-1".to_string()),
            accumulate_points: points.map(|p| LoyaltyEventAccumulatePoints {
                points: Some(p),
                order_id: None,
                loyalty_program_id: None,
            }),
            redeem_reward: None,
        }
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp("2025-04-01T10:30:00Z"), "1 Apr 2025 10:30");
        assert_eq!(format_timestamp("2024-12-25T23:05:59Z"), "25 Dec 2024 23:05");
    }

    #[test]
    fn test_format_timestamp_keeps_offset() {
        assert_eq!(
            format_timestamp("2025-04-01T10:30:00+08:00"),
            "1 Apr 2025 10:30"
        );
    }

    #[test]
    fn test_format_timestamp_unparseable_passthrough() {
        assert_eq!(format_timestamp("not-a-date"), "not-a-date");
        assert_eq!(format_timestamp(""), "");
    }

    #[test]
    fn test_normalize_page() {
        let events = vec![
            Some(event("e2", "REDEEM_REWARD", "2025-04-02T08:00:00Z", None)),
            None,
            Some(event("e1", "ACCUMULATE_POINTS", "2025-04-01T10:30:00Z", Some(12))),
        ];

        let page = normalize_page(events, Some("next-page".to_string()));

        assert_eq!(page.transactions.len(), 2);
        assert_eq!(page.transactions[0].id, "e2");
        assert_eq!(page.transactions[0].transaction_type, "REDEEM_REWARD");
        assert_eq!(page.transactions[0].points, 0);
        assert_eq!(page.transactions[1].points, 12);
        assert_eq!(page.transactions[1].timestamp, "1 Apr 2025 10:30");
        assert_eq!(page.cursor, "next-page");
        assert!(page.has_more());
    }

    #[test]
    fn test_normalize_empty_page() {
        let page = normalize_page(Vec::new(), None);
        assert!(page.transactions.is_empty());
        assert_eq!(page.cursor, "");
        assert!(!page.has_more());
    }

    #[test]
    fn test_normalize_bad_timestamp() {
        let page = normalize_page(
            vec![Some(event("e1", "ACCUMULATE_POINTS", "not-a-date", Some(3)))],
            None,
        );
        assert_eq!(page.transactions[0].timestamp, "not-a-date");
    }

    #[test]
    fn test_page_with_null_timestamp_still_normalizes() {
        let raw: crate::gateway::SearchEventsResponse = serde_json::from_str(
            r#"{
                "events": [
                    {"id": "e2", "type": "ACCUMULATE_POINTS", "created_at": null,
                     "accumulate_points": {"points": 4}},
                    {"id": "e1", "type": "ACCUMULATE_POINTS", "created_at": "2025-04-01T10:30:00Z",
                     "accumulate_points": {"points": 7}}
                ],
                "cursor": "c2"
            }"#,
        )
        .unwrap();

        let page = normalize_page(raw.events, raw.cursor);

        assert_eq!(page.transactions.len(), 2);
        assert_eq!(page.transactions[0].timestamp, "");
        assert_eq!(page.transactions[0].points, 4);
        assert_eq!(page.transactions[1].timestamp, "1 Apr 2025 10:30");
        assert_eq!(page.cursor, "c2");
    }

    #[test]
    fn test_transaction_serializes_type_field() {
        let tx = Transaction::from(event("e1", "ACCUMULATE_POINTS", "x", Some(1)));
        let value = serde_json::to_value(&tx).unwrap();
        assert_eq!(value["type"], "ACCUMULATE_POINTS");
        assert!(value.get("transaction_type").is_none());
    }
}
