//! 通知まわりのドメイン型
//!
//! 業務レイヤーから届くイベントコード・アサインメント種別・ドライバーの進捗
//! （いわゆる「ボタンステータス」）は文字列で届くため、ここで列挙型に変換する。
//! 未知のコードは必ず `Other` / `Unknown` に落とし、パースで失敗させない。

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::value_object::{AssignmentId, UserKey};

/// ドライバーが到達したチェックポイント
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Checkpoint {
    EnRoute,
    ArrivedAtPickup,
    PassengerOnBoard,
    ArrivedAtDropoff,
    Completed,
    Other(String),
}

impl Checkpoint {
    pub fn from_code(code: &str) -> Self {
        match code {
            "en_route" => Checkpoint::EnRoute,
            "arrived_at_pickup" => Checkpoint::ArrivedAtPickup,
            "passenger_on_board" => Checkpoint::PassengerOnBoard,
            "arrived_at_dropoff" => Checkpoint::ArrivedAtDropoff,
            "completed" => Checkpoint::Completed,
            other => Checkpoint::Other(other.to_string()),
        }
    }

    pub fn as_code(&self) -> &str {
        match self {
            Checkpoint::EnRoute => "en_route",
            Checkpoint::ArrivedAtPickup => "arrived_at_pickup",
            Checkpoint::PassengerOnBoard => "passenger_on_board",
            Checkpoint::ArrivedAtDropoff => "arrived_at_dropoff",
            Checkpoint::Completed => "completed",
            Checkpoint::Other(code) => code,
        }
    }
}

const CHECKPOINT_PREFIX: &str = "checkpoint:";

/// 通知のトリガーとなるドメインイベント種別
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    AssignmentRequested,
    AssignmentAccepted,
    AssignmentCancelled,
    AssignmentReminder,
    CheckpointReached(Checkpoint),
    ChatMessage,
    Unknown(String),
}

impl EventType {
    /// ワイヤー上のコードから変換する（未知のコードは `Unknown`）
    ///
    /// チェックポイントは `checkpoint:<code>` 形式。
    pub fn from_code(code: &str) -> Self {
        let code = code.trim();
        if let Some(checkpoint) = code.strip_prefix(CHECKPOINT_PREFIX) {
            return EventType::CheckpointReached(Checkpoint::from_code(checkpoint));
        }
        match code {
            "assignment_requested" => EventType::AssignmentRequested,
            "assignment_accepted" => EventType::AssignmentAccepted,
            "assignment_cancelled" => EventType::AssignmentCancelled,
            "assignment_reminder" => EventType::AssignmentReminder,
            "chat_message" => EventType::ChatMessage,
            other => EventType::Unknown(other.to_string()),
        }
    }

    /// 通知ログの `notification_type` として記録するコード
    pub fn as_code(&self) -> String {
        match self {
            EventType::AssignmentRequested => "assignment_requested".to_string(),
            EventType::AssignmentAccepted => "assignment_accepted".to_string(),
            EventType::AssignmentCancelled => "assignment_cancelled".to_string(),
            EventType::AssignmentReminder => "assignment_reminder".to_string(),
            EventType::CheckpointReached(checkpoint) => {
                format!("{}{}", CHECKPOINT_PREFIX, checkpoint.as_code())
            }
            EventType::ChatMessage => "chat_message".to_string(),
            EventType::Unknown(code) => code.clone(),
        }
    }
}

impl From<String> for EventType {
    fn from(value: String) -> Self {
        EventType::from_code(&value)
    }
}

impl From<EventType> for String {
    fn from(value: EventType) -> Self {
        value.as_code()
    }
}

/// アサインメント（予約）の種別
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AssignmentType {
    Transportation,
    Interpretation,
    PhoneInterpretation,
    TransportationInterpretation,
    Other(String),
}

impl AssignmentType {
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "transportation" | "transport" => AssignmentType::Transportation,
            "interpretation" => AssignmentType::Interpretation,
            "phone_interpretation" | "phone" => AssignmentType::PhoneInterpretation,
            "transportation_interpretation" | "transport_interpretation" => {
                AssignmentType::TransportationInterpretation
            }
            _ => AssignmentType::Other(code.to_string()),
        }
    }

    pub fn as_code(&self) -> &str {
        match self {
            AssignmentType::Transportation => "transportation",
            AssignmentType::Interpretation => "interpretation",
            AssignmentType::PhoneInterpretation => "phone_interpretation",
            AssignmentType::TransportationInterpretation => "transportation_interpretation",
            AssignmentType::Other(code) => code,
        }
    }
}

impl From<String> for AssignmentType {
    fn from(value: String) -> Self {
        AssignmentType::from_code(&value)
    }
}

impl From<AssignmentType> for String {
    fn from(value: AssignmentType) -> Self {
        value.as_code().to_string()
    }
}

/// 送迎の往路 / 復路
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripLeg {
    Outbound,
    Return,
    #[default]
    #[serde(other)]
    Unspecified,
}

/// 通知の配信チャネル（端末アプリ / ブラウザ）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    App,
    Web,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::App => "app",
            Channel::Web => "web",
        }
    }
}

/// 通知の受信者種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientType {
    Contractor,
    Claimant,
    Dispatcher,
    #[default]
    #[serde(other)]
    Unknown,
}

/// 通知文面の組み立てに必要なアサインメント情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentSummary {
    pub assignment_id: AssignmentId,
    pub assignment_type: AssignmentType,
    #[serde(default)]
    pub trip_leg: TripLeg,
    pub scheduled_date: Option<NaiveDate>,
    pub scheduled_time: Option<NaiveTime>,
    pub pickup_address: Option<String>,
    pub dropoff_address: Option<String>,
}

/// 通知先（ユーザー × チャネル × プッシュトークン）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushTarget {
    pub user_key: UserKey,
    pub channel: Channel,
    /// 業務レイヤーが保持する FCM / WebPush トークン（未登録なら `None`）
    pub token: Option<String>,
}

impl PushTarget {
    /// 空文字でないトークンを返す
    pub fn usable_token(&self) -> Option<&str> {
        self.token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}

/// 組み立て済みの通知文面
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
}

/// 1 回のディスパッチ実行の結果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// 受け取ったイベント数
    pub events: usize,
    /// アサインメント不在・宛先 0 件などで処理しなかったイベント数
    pub skipped_events: usize,
    /// 書き込んだ通知ログ数
    pub logged: usize,
    pub log_failures: usize,
    /// セッション内（WebSocket）で配信できた接続数
    pub live_deliveries: usize,
    /// 外部プッシュの成功数
    pub pushed: usize,
    /// 外部プッシュの失敗数（タイムアウトを含む）
    pub push_failures: usize,
    /// 同一実行内の重複としてスキップした宛先数
    pub duplicates_skipped: usize,
}
