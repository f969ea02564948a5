//! NotificationComposer: ドメインイベント + アサインメント情報 → 通知文面
//!
//! 副作用のない純粋関数。未知のイベント・アサインメント種別でもフォールバックの
//! 文面を返し、決してパニックしない。

use chrono::{NaiveDate, NaiveTime};

use super::notification::{
    AssignmentSummary, AssignmentType, Checkpoint, EventType, NotificationContent, TripLeg,
};

/// チャット通知の本文に含める最大文字数
pub const CHAT_PREVIEW_MAX_CHARS: usize = 120;

const DATE_FORMAT: &str = "%m/%d/%Y";
const TIME_FORMAT: &str = "%I:%M %p";
const MISSING_ADDRESS: &str = "N/A";

/// 通知文面の組み立て
pub struct NotificationComposer;

impl NotificationComposer {
    /// イベントとアサインメント情報から (title, body) を組み立てる
    pub fn compose(event_type: &EventType, summary: &AssignmentSummary) -> NotificationContent {
        NotificationContent {
            title: format!("{} (#{})", Self::title(event_type), summary.assignment_id),
            body: Self::body(summary),
        }
    }

    /// チャットメッセージのプッシュ通知文面
    pub fn compose_chat(sender_display_name: &str, content: &str) -> NotificationContent {
        let sender = sender_display_name.trim();
        let title = if sender.is_empty() {
            "New Message".to_string()
        } else {
            format!("New message from {}", sender)
        };

        NotificationContent {
            title,
            body: truncate_chars(content.trim(), CHAT_PREVIEW_MAX_CHARS),
        }
    }

    fn title(event_type: &EventType) -> &'static str {
        match event_type {
            EventType::AssignmentRequested => "New Assignment Request",
            EventType::AssignmentAccepted => "Assignment Accepted",
            EventType::AssignmentCancelled => "Assignment Cancelled",
            EventType::AssignmentReminder => "Upcoming Assignment",
            EventType::CheckpointReached(checkpoint) => match checkpoint {
                Checkpoint::EnRoute => "Driver En Route",
                Checkpoint::ArrivedAtPickup => "Driver Arrived at Pickup",
                Checkpoint::PassengerOnBoard => "Passenger Picked Up",
                Checkpoint::ArrivedAtDropoff => "Arrived at Drop-off",
                Checkpoint::Completed => "Trip Completed",
                Checkpoint::Other(_) => "Trip Update",
            },
            EventType::ChatMessage => "New Message",
            EventType::Unknown(_) => "Assignment Update",
        }
    }

    fn body(summary: &AssignmentSummary) -> String {
        let (service, first_label, second_label) = match &summary.assignment_type {
            AssignmentType::Transportation => (
                format!("Transportation{}", leg_suffix(summary.trip_leg)),
                "Pickup",
                "Drop-off",
            ),
            AssignmentType::Interpretation => (
                "Interpretation".to_string(),
                "Claimant address",
                "Appointment address",
            ),
            AssignmentType::PhoneInterpretation => (
                "Phone Interpretation".to_string(),
                "Claimant address",
                "Provider address",
            ),
            AssignmentType::TransportationInterpretation => (
                format!(
                    "Transportation & Interpretation{}",
                    leg_suffix(summary.trip_leg)
                ),
                "Pickup",
                "Drop-off",
            ),
            AssignmentType::Other(code) if !code.trim().is_empty() => {
                (format!("Assignment ({})", code.trim()), "From", "To")
            }
            AssignmentType::Other(_) => ("Assignment".to_string(), "From", "To"),
        };

        format!(
            "{} on {} at {}\n{}: {}\n{}: {}",
            service,
            format_date(summary.scheduled_date),
            format_time(summary.scheduled_time),
            first_label,
            address_or_missing(summary.pickup_address.as_deref()),
            second_label,
            address_or_missing(summary.dropoff_address.as_deref()),
        )
    }
}

fn leg_suffix(trip_leg: TripLeg) -> &'static str {
    match trip_leg {
        TripLeg::Outbound => " (outbound trip)",
        TripLeg::Return => " (return trip)",
        TripLeg::Unspecified => "",
    }
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| "date TBD".to_string())
}

fn format_time(time: Option<NaiveTime>) -> String {
    time.map(|t| t.format(TIME_FORMAT).to_string())
        .unwrap_or_else(|| "time TBD".to_string())
}

fn address_or_missing(address: Option<&str>) -> &str {
    match address.map(str::trim) {
        Some(address) if !address.is_empty() => address,
        _ => MISSING_ADDRESS,
    }
}

/// 文字境界を壊さずに切り詰める
fn truncate_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}…", &value[..byte_index]),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::AssignmentId;

    fn summary(assignment_type: AssignmentType) -> AssignmentSummary {
        AssignmentSummary {
            assignment_id: AssignmentId::new(42),
            assignment_type,
            trip_leg: TripLeg::Outbound,
            scheduled_date: NaiveDate::from_ymd_opt(2026, 3, 14),
            scheduled_time: NaiveTime::from_hms_opt(9, 30, 0),
            pickup_address: Some("1 Main St".to_string()),
            dropoff_address: Some("200 Clinic Ave".to_string()),
        }
    }

    #[test]
    fn test_compose_transportation_body() {
        // テスト項目: 送迎の文面に日付・時刻・両方の住所が含まれる
        // when (操作):
        let content = NotificationComposer::compose(
            &EventType::AssignmentAccepted,
            &summary(AssignmentType::Transportation),
        );

        // then (期待する結果):
        assert_eq!(content.title, "Assignment Accepted (#42)");
        assert_eq!(
            content.body,
            "Transportation (outbound trip) on 03/14/2026 at 09:30 AM\nPickup: 1 Main St\nDrop-off: 200 Clinic Ave"
        );
    }

    #[test]
    fn test_compose_is_total_over_assignment_types() {
        // テスト項目: 全ての既知の種別と未知の種別で、空でない title / body が返る
        let types = [
            AssignmentType::Transportation,
            AssignmentType::Interpretation,
            AssignmentType::PhoneInterpretation,
            AssignmentType::TransportationInterpretation,
            AssignmentType::Other("sign_language".to_string()),
            AssignmentType::Other(String::new()),
        ];
        let events = [
            EventType::AssignmentRequested,
            EventType::AssignmentCancelled,
            EventType::CheckpointReached(Checkpoint::Other("??".to_string())),
            EventType::Unknown("mystery".to_string()),
        ];

        for assignment_type in types {
            for event_type in &events {
                let content =
                    NotificationComposer::compose(event_type, &summary(assignment_type.clone()));
                assert!(!content.title.is_empty());
                assert!(!content.body.is_empty());
                assert!(content.body.contains("03/14/2026"));
                assert!(content.body.contains("1 Main St"));
                assert!(content.body.contains("200 Clinic Ave"));
            }
        }
    }

    #[test]
    fn test_compose_is_deterministic() {
        // テスト項目: 同じ入力から常に同じ文面が得られる
        let input = summary(AssignmentType::Interpretation);
        let first = NotificationComposer::compose(&EventType::AssignmentReminder, &input);
        let second = NotificationComposer::compose(&EventType::AssignmentReminder, &input);
        assert_eq!(first, second);
    }

    #[test]
    fn test_compose_with_missing_schedule_and_addresses() {
        // テスト項目: 日時・住所が欠けていてもプレースホルダーで埋まる
        // given (前提条件):
        let mut input = summary(AssignmentType::PhoneInterpretation);
        input.scheduled_date = None;
        input.scheduled_time = None;
        input.pickup_address = Some("   ".to_string());
        input.dropoff_address = None;

        // when (操作):
        let content = NotificationComposer::compose(
            &EventType::CheckpointReached(Checkpoint::ArrivedAtPickup),
            &input,
        );

        // then (期待する結果):
        assert_eq!(content.title, "Driver Arrived at Pickup (#42)");
        assert_eq!(
            content.body,
            "Phone Interpretation on date TBD at time TBD\nClaimant address: N/A\nProvider address: N/A"
        );
    }

    #[test]
    fn test_compose_unknown_assignment_type_fallback() {
        // テスト項目: 未知の種別はフォールバックテンプレートになる
        let content = NotificationComposer::compose(
            &EventType::AssignmentRequested,
            &summary(AssignmentType::Other("sign_language".to_string())),
        );
        assert!(content.body.starts_with("Assignment (sign_language) on 03/14/2026"));
        assert!(content.body.contains("From: 1 Main St"));
    }

    #[test]
    fn test_compose_chat_truncates_on_char_boundary() {
        // テスト項目: チャット本文は文字単位で切り詰められる
        // given (前提条件):
        let long = "あ".repeat(CHAT_PREVIEW_MAX_CHARS + 10);

        // when (操作):
        let content = NotificationComposer::compose_chat("Dispatch", &long);

        // then (期待する結果):
        assert_eq!(content.title, "New message from Dispatch");
        assert_eq!(content.body.chars().count(), CHAT_PREVIEW_MAX_CHARS + 1);
        assert!(content.body.ends_with('…'));
    }

    #[test]
    fn test_compose_chat_without_sender_name() {
        // テスト項目: 表示名が空でもタイトルは空にならない
        let content = NotificationComposer::compose_chat("  ", "hello");
        assert_eq!(content.title, "New Message");
        assert_eq!(content.body, "hello");
    }
}
