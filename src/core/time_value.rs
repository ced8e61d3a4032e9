use crate::core::coerce::as_number;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

const NAIVE_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Largest representable instant, ±100,000,000 days around the epoch.
pub const MAX_EPOCH_MS: f64 = 8.64e15;

pub trait Clock: Send + Sync {
    fn now_ms(&self) -> f64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        Utc::now().timestamp_millis() as f64
    }
}

/// 固定時間，用於測試
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now_ms: f64,
}

impl FixedClock {
    pub fn from_millis(now_ms: i64) -> Self {
        Self {
            now_ms: now_ms as f64,
        }
    }
}

impl Clock for FixedClock {
    fn now_ms(&self) -> f64 {
        self.now_ms
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpochUnit {
    Millis,
    Seconds,
}

/// Whichever reading lands closer to `now` wins; an exact tie reads as seconds.
pub fn detect_epoch_unit(raw: f64, now_ms: f64) -> EpochUnit {
    if (now_ms - raw).abs() >= (now_ms - raw * 1000.0).abs() {
        EpochUnit::Seconds
    } else {
        EpochUnit::Millis
    }
}

/// 轉為 epoch 毫秒；無法解讀時回傳 `NaN`
pub fn normalize(raw: &Value, utc: bool, clock: &dyn Clock) -> f64 {
    if let Some(number) = as_number(raw) {
        let millis = match detect_epoch_unit(number, clock.now_ms()) {
            EpochUnit::Seconds => number * 1000.0,
            EpochUnit::Millis => number,
        };
        if millis.abs() > MAX_EPOCH_MS {
            tracing::warn!("Time value out of range: {}", raw);
            return f64::NAN;
        }
        return millis.trunc();
    }

    let parsed = match raw {
        Value::String(s) => parse_datetime(s, utc),
        _ => None,
    };

    match parsed {
        Some(millis) => millis as f64,
        None => {
            tracing::warn!("Unparseable time value: {}", raw);
            f64::NAN
        }
    }
}

/// 解析日期字串；沒有時區資訊時依 `utc` 決定以 UTC 或本地時區解讀
pub fn parse_datetime(input: &str, utc: bool) -> Option<i64> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.timestamp_millis());
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(input, format) {
            return Some(dt.timestamp_millis());
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return naive_to_millis(naive, utc);
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .and_then(|naive| naive_to_millis(naive, utc))
}

fn naive_to_millis(naive: NaiveDateTime, utc: bool) -> Option<i64> {
    if utc {
        Some(naive.and_utc().timestamp_millis())
    } else {
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.timestamp_millis())
    }
}
