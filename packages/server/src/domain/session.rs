//! Hub セッションのライフサイクル（状態遷移）
//!
//! ```text
//! Connecting ──handshake(user_key あり)──▶ Connected
//!     │
//!     └──────handshake(user_key なし)──▶ ConnectedUntracked
//!
//! Connected / ConnectedUntracked / Connecting ──close──▶ Disconnected（終端）
//! ```
//!
//! `ConnectedUntracked` はユーザー宛のプッシュを受け取れないが、
//! 匿名で使える操作（座標のブロードキャストなど）はそのまま利用できる。

use std::{fmt, sync::Arc};

use thiserror::Error;
use tokio::sync::watch;

use super::value_object::{ConnectionId, Timestamp, UserKey};

/// セッションの状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Connected { user_key: UserKey },
    ConnectedUntracked,
    Disconnected,
}

/// 不正な状態遷移
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid session transition: {event} while {from}")]
pub struct SessionTransitionError {
    pub from: &'static str,
    pub event: &'static str,
}

impl SessionState {
    /// ハンドシェイク完了
    pub fn on_handshake(&self, user_key: Option<UserKey>) -> Result<Self, SessionTransitionError> {
        match self {
            SessionState::Connecting => Ok(match user_key {
                Some(user_key) => SessionState::Connected { user_key },
                None => SessionState::ConnectedUntracked,
            }),
            other => Err(SessionTransitionError {
                from: other.name(),
                event: "handshake",
            }),
        }
    }

    /// 切断（どの状態からでも Disconnected に遷移する）
    pub fn on_close(&self) -> Self {
        SessionState::Disconnected
    }

    pub fn user_key(&self) -> Option<&UserKey> {
        match self {
            SessionState::Connected { user_key } => Some(user_key),
            _ => None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(
            self,
            SessionState::Connected { .. } | SessionState::ConnectedUntracked
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Connecting => "connecting",
            SessionState::Connected { .. } => "connected",
            SessionState::ConnectedUntracked => "connected-untracked",
            SessionState::Disconnected => "disconnected",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 1 本のトランスポート接続に対応するセッション
///
/// clone したセッションは状態を共有する。受信タスク側のコピーも `close()` を観測できる。
#[derive(Debug, Clone)]
pub struct HubSession {
    pub connection_id: ConnectionId,
    pub connected_at: Timestamp,
    state: Arc<watch::Sender<SessionState>>,
}

impl HubSession {
    pub fn new(connection_id: ConnectionId, connected_at: Timestamp) -> Self {
        Self {
            connection_id,
            connected_at,
            state: Arc::new(watch::Sender::new(SessionState::Connecting)),
        }
    }

    /// 現在の状態のスナップショット
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn user_key(&self) -> Option<UserKey> {
        self.state.borrow().user_key().cloned()
    }

    pub fn is_open(&self) -> bool {
        self.state.borrow().is_open()
    }

    pub fn handshake(&self, user_key: Option<UserKey>) -> Result<(), SessionTransitionError> {
        let mut result = Ok(());
        self.state.send_if_modified(|state| match state.on_handshake(user_key) {
            Ok(next) => {
                *state = next;
                true
            }
            Err(e) => {
                result = Err(e);
                false
            }
        });
        result
    }

    /// 切断状態にする
    ///
    /// # Returns
    ///
    /// 直前の状態（既に切断済みなら `None`）
    pub fn close(&self) -> Option<SessionState> {
        let mut previous = None;
        self.state.send_if_modified(|state| {
            if *state == SessionState::Disconnected {
                return false;
            }
            previous = Some(std::mem::replace(state, SessionState::Disconnected));
            true
        });
        previous
    }
}

/// 切断の理由
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// クライアントが Close フレームを送った
    ClientClosed,
    /// トランスポートのエラー
    TransportError(String),
    /// 送信ループが終了した（ソケットへの書き込み失敗など）
    SendLoopEnded,
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisconnectReason::ClientClosed => f.write_str("client closed"),
            DisconnectReason::TransportError(e) => write!(f, "transport error: {}", e),
            DisconnectReason::SendLoopEnded => f.write_str("send loop ended"),
        }
    }
}
