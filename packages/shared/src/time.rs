//! Time-related utilities with clock abstraction for testability.
//!
//! コア処理の中では `Utc::now()` を直接呼ばず、必ず `Clock` 経由で現在時刻を取得する。
//! タイムゾーンはサーバー設定（UTC オフセット）で切り替えられる。

use chrono::{DateTime, FixedOffset, Offset, Utc};

/// Clock trait for dependency injection and testing
pub trait Clock: Send + Sync {
    /// 設定されたタイムゾーンでの現在時刻
    fn now(&self) -> DateTime<FixedOffset>;

    /// Unix timestamp (milliseconds)
    fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// System clock implementation (uses actual system time)
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    /// 指定した UTC オフセットで時刻を返す SystemClock を作成
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// UTC の SystemClock
    pub fn utc() -> Self {
        Self::new(utc_offset())
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }
}

/// Fixed clock implementation for testing (returns a fixed time)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    fixed_time: i64,
    offset: FixedOffset,
}

impl FixedClock {
    /// Create a new fixed clock (UTC) with the given timestamp
    pub fn new(fixed_time_millis: i64) -> Self {
        Self::with_offset(fixed_time_millis, utc_offset())
    }

    /// Create a new fixed clock with the given timestamp and UTC offset
    pub fn with_offset(fixed_time_millis: i64, offset: FixedOffset) -> Self {
        Self {
            fixed_time: fixed_time_millis,
            offset,
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        DateTime::from_timestamp_millis(self.fixed_time)
            .unwrap_or_default()
            .with_timezone(&self.offset)
    }
}

/// UTC を表す FixedOffset
pub fn utc_offset() -> FixedOffset {
    Utc.fix()
}

/// Parse a UTC offset such as `+09:00`, `-0800` or `Z`.
///
/// # Errors
///
/// Returns a human readable message when the string is not a valid offset
/// (used directly as a clap `value_parser`).
pub fn parse_utc_offset(value: &str) -> Result<FixedOffset, String> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
        return Ok(utc_offset());
    }

    let (sign, rest) = match value.split_at_checked(1) {
        Some(("+", rest)) => (1, rest),
        Some(("-", rest)) => (-1, rest),
        _ => return Err(format!("offset must start with '+' or '-': '{}'", value)),
    };

    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("offset must look like +HH:MM: '{}'", value));
    }

    let hours: i32 = digits[..2]
        .parse()
        .map_err(|_| format!("invalid hours in offset '{}'", value))?;
    let minutes: i32 = digits[2..]
        .parse()
        .map_err(|_| format!("invalid minutes in offset '{}'", value))?;
    if minutes >= 60 {
        return Err(format!("invalid minutes in offset '{}'", value));
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .ok_or_else(|| format!("offset out of range: '{}'", value))
}

/// Convert Unix timestamp (milliseconds) to RFC 3339 in the given offset
pub fn timestamp_to_rfc3339(timestamp_millis: i64, offset: &FixedOffset) -> String {
    DateTime::from_timestamp_millis(timestamp_millis)
        .unwrap_or_default()
        .with_timezone(offset)
        .to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    #[test]
    fn test_system_clock_returns_non_zero_timestamp() {
        // テスト項目: SystemClock が 0 以外のタイムスタンプを返す
        // given (前提条件):
        let clock = SystemClock::utc();

        // when (操作):
        let timestamp = clock.now_millis();

        // then (期待する結果):
        assert!(timestamp > 0);
    }

    #[test]
    fn test_system_clock_uses_configured_offset() {
        // テスト項目: SystemClock が設定したオフセットで時刻を返す
        // given (前提条件):
        let clock = SystemClock::new(jst());

        // when (操作):
        let now = clock.now();

        // then (期待する結果):
        assert_eq!(now.offset().local_minus_utc(), 9 * 3600);
    }

    #[test]
    fn test_system_clock_returns_increasing_timestamps() {
        // テスト項目: SystemClock が呼び出すたびに増加するタイムスタンプを返す
        // given (前提条件):
        let clock = SystemClock::utc();

        // when (操作):
        let timestamp1 = clock.now_millis();
        std::thread::sleep(std::time::Duration::from_millis(10));
        let timestamp2 = clock.now_millis();

        // then (期待する結果):
        assert!(timestamp2 >= timestamp1);
    }

    #[test]
    fn test_fixed_clock_returns_consistent_timestamp() {
        // テスト項目: FixedClock が複数回呼び出しても同じタイムスタンプを返す
        // given (前提条件):
        let fixed_time = 1_234_567_890_123;
        let clock = FixedClock::new(fixed_time);

        // when (操作):
        let timestamp1 = clock.now_millis();
        let timestamp2 = clock.now_millis();

        // then (期待する結果):
        assert_eq!(timestamp1, fixed_time);
        assert_eq!(timestamp2, fixed_time);
    }

    #[test]
    fn test_fixed_clock_with_offset_keeps_instant() {
        // テスト項目: オフセットを変えても同じ瞬間を指す
        // given (前提条件):
        // 2023-01-01 00:00:00 JST in milliseconds
        let clock = FixedClock::with_offset(1_672_498_800_000, jst());

        // when (操作):
        let now = clock.now();

        // then (期待する結果):
        assert_eq!(now.timestamp_millis(), 1_672_498_800_000);
        assert!(now.to_rfc3339().starts_with("2023-01-01T00:00:00"));
    }

    #[test]
    fn test_timestamp_to_rfc3339_format() {
        // テスト項目: タイムスタンプが正しく RFC 3339 形式に変換される
        // given (前提条件):
        let timestamp = 1_672_498_800_123;

        // when (操作):
        let result = timestamp_to_rfc3339(timestamp, &jst());

        // then (期待する結果):
        assert!(result.starts_with("2023-01-01T00:00:00"));
        assert!(result.contains("+09:00"));
    }

    #[test]
    fn test_parse_utc_offset_variants() {
        // テスト項目: 代表的なオフセット表記をパースできる
        // when / then:
        assert_eq!(parse_utc_offset("+09:00"), Ok(jst()));
        assert_eq!(parse_utc_offset("+0900"), Ok(jst()));
        assert_eq!(
            parse_utc_offset("-08:00"),
            Ok(FixedOffset::west_opt(8 * 3600).unwrap())
        );
        assert_eq!(parse_utc_offset("Z"), Ok(utc_offset()));
    }

    #[test]
    fn test_parse_utc_offset_rejects_garbage() {
        // テスト項目: 不正なオフセット表記はエラーになる
        // when / then:
        assert!(parse_utc_offset("09:00").is_err());
        assert!(parse_utc_offset("+9").is_err());
        assert!(parse_utc_offset("+09:75").is_err());
        assert!(parse_utc_offset("+ab:cd").is_err());
    }
}
