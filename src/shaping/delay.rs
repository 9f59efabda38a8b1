//! 单向时延
//!
//! 形如 `10ms` / `500us` / `1.5s` / `1e-3s` 的时延字符串，与 netem 的写法一致。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::SimTime;

/// 链路上附加的单向时延。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Delay(SimTime);

impl Delay {
    pub const ZERO: Delay = Delay(SimTime::ZERO);

    pub fn from_millis(ms: u64) -> Self {
        Delay(SimTime::from_millis(ms))
    }

    pub fn as_sim_time(self) -> SimTime {
        self.0
    }
}

/// 时延字符串解析错误。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DelayParseError {
    #[error("empty delay")]
    Empty,
    #[error("delay {0:?} is negative")]
    Negative(String),
    #[error("delay {0:?} has no unit (expected s, ms or us)")]
    MissingUnit(String),
    #[error("delay {0:?} is not a number")]
    InvalidNumber(String),
}

impl FromStr for Delay {
    type Err = DelayParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        if raw.is_empty() {
            return Err(DelayParseError::Empty);
        }
        if raw.starts_with('-') {
            return Err(DelayParseError::Negative(raw.to_string()));
        }
        // 单位是末尾的字母串，数值部分可以带指数（`1e-3s`）
        let split = raw.trim_end_matches(|c: char| c.is_ascii_alphabetic()).len();
        if split == raw.len() {
            return Err(DelayParseError::MissingUnit(raw.to_string()));
        }
        let (num, unit) = raw.split_at(split);
        let value: f64 = num
            .trim()
            .parse()
            .map_err(|_| DelayParseError::InvalidNumber(raw.to_string()))?;
        if !value.is_finite() {
            return Err(DelayParseError::InvalidNumber(raw.to_string()));
        }
        let nanos_per_unit = match unit {
            "s" => 1e9,
            "ms" => 1e6,
            "us" => 1e3,
            _ => return Err(DelayParseError::MissingUnit(raw.to_string())),
        };
        Ok(Delay(SimTime::from_secs_f64(value * nanos_per_unit / 1e9)))
    }
}

impl TryFrom<String> for Delay {
    type Error = DelayParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Delay> for String {
    fn from(d: Delay) -> Self {
        d.to_string()
    }
}

impl fmt::Display for Delay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ns = self.0.0;
        if ns % 1_000_000 == 0 {
            write!(f, "{}ms", ns / 1_000_000)
        } else if ns % 1_000 == 0 {
            write!(f, "{}us", ns / 1_000)
        } else {
            write!(f, "{}ms", ns as f64 / 1e6)
        }
    }
}
