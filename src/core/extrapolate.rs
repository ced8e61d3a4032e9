use crate::domain::model::Datapoint;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

pub const MINIMUM_DATAPOINTS: usize = 10;
pub const START_BOUNDARY: f64 = 0.0;
const TREND_FACTOR: f64 = 0.1;

/// 查詢視窗（epoch 秒）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtrapolationWindow {
    pub from_secs: i64,
    pub to_secs: i64,
    pub till_now: bool,
}

/// Stretches the first and/or last datapoint of a series whose boundary bucket
/// was only partially sampled. Only those two elements are ever touched.
///
/// The series is returned unchanged when it has fewer than
/// [`MINIMUM_DATAPOINTS`] points, or when the window does not end at "now" and
/// the first value is not [`START_BOUNDARY`].
pub fn extrapolate(mut datapoints: Vec<Datapoint>, window: &ExtrapolationWindow) -> Vec<Datapoint> {
    let len = datapoints.len();
    if len < MINIMUM_DATAPOINTS {
        return datapoints;
    }

    let starts_at_boundary = datapoints[0].value.as_f64() == Some(START_BOUNDARY);
    if !window.till_now && !starts_at_boundary {
        return datapoints;
    }

    let first_ts = datapoints[0].timestamp_ms;
    let last_ts = datapoints[len - 1].timestamp_ms;

    let duration_to_start = first_ts / 1000.0 - window.from_secs as f64;
    let duration_to_end = window.to_secs as f64 - last_ts / 1000.0;
    let average_spacing = (last_ts - first_ts) / 1000.0 / (len - 1) as f64;
    let threshold = average_spacing / 2.0;

    if duration_to_start < threshold && starts_at_boundary {
        if let Some(value) = trend_value(&datapoints[1].value, &datapoints[2].value) {
            datapoints[0].value = value;
        }
    }

    // 最後一點是空值標記時不補值
    if duration_to_end < threshold && !datapoints[len - 1].is_gap() {
        if let Some(value) = trend_value(&datapoints[len - 2].value, &datapoints[len - 3].value) {
            datapoints[len - 1].value = value;
        }
    }

    datapoints
}

/// `near * (1 + frac((near - far) / near * 0.1))`, where a NaN fraction counts as zero.
fn trend_value(near: &Value, far: &Value) -> Option<Value> {
    let near = near.as_f64()?;
    let far = far.as_f64()?;

    let diff = (near - far) / near * TREND_FACTOR;
    let fraction = diff % 1.0;
    let fraction = if fraction.is_nan() { 0.0 } else { fraction };

    Number::from_f64(near * (1.0 + fraction)).map(Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FROM: i64 = 1_700_000_000;

    fn series(values: &[Value]) -> Vec<Datapoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Datapoint::new(v.clone(), ((FROM + 60 * i as i64) * 1000) as f64))
            .collect()
    }

    fn values(points: &[Datapoint]) -> Vec<f64> {
        points.iter().map(|p| p.value.as_f64().unwrap()).collect()
    }

    fn window(till_now: bool) -> ExtrapolationWindow {
        ExtrapolationWindow {
            from_secs: FROM,
            to_secs: FROM + 550,
            till_now,
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "{} != {}", actual, expected);
    }

    #[test]
    fn test_short_series_unchanged() {
        let points = series(&[json!(0), json!(5), json!(4), json!(3)]);
        assert_eq!(extrapolate(points.clone(), &window(true)), points);
    }

    #[test]
    fn test_not_till_now_and_non_zero_start_unchanged() {
        let points = series(&[
            json!(7), json!(100), json!(90), json!(50), json!(50),
            json!(50), json!(50), json!(40), json!(80), json!(10),
        ]);
        assert_eq!(extrapolate(points.clone(), &window(false)), points);
    }

    // characterization: exact output of the boundary heuristic
    #[test]
    fn test_both_boundaries_adjusted() {
        let points = series(&[
            json!(0), json!(100), json!(90), json!(50), json!(50),
            json!(50), json!(50), json!(40), json!(80), json!(10),
        ]);
        let out = values(&extrapolate(points, &window(true)));

        // (100 - 90) / 100 * 0.1 = 0.01
        assert_close(out[0], 101.0);
        // (80 - 40) / 80 * 0.1 = 0.05
        assert_close(out[9], 84.0);
        assert_eq!(&out[1..9], &[100.0, 90.0, 50.0, 50.0, 50.0, 50.0, 40.0, 80.0]);
    }

    #[test]
    fn test_fraction_wraps_modulo_one() {
        let points = series(&[
            json!(0), json!(1), json!(-20), json!(5), json!(5),
            json!(5), json!(5), json!(5), json!(5), json!(5),
        ]);
        let out = values(&extrapolate(points, &window(false)));

        // (1 + 20) / 1 * 0.1 = 2.1 -> 0.1
        assert_close(out[0], 1.1);
        // (5 - 5) / 5 * 0.1 = 0
        assert_close(out[9], 5.0);
    }

    #[test]
    fn test_zero_neighbour_keeps_neighbour_value() {
        let points = series(&[
            json!(0), json!(0), json!(3), json!(5), json!(5),
            json!(5), json!(5), json!(5), json!(5), json!(5),
        ]);
        let out = values(&extrapolate(points, &window(true)));
        assert_close(out[0], 0.0);
    }

    #[test]
    fn test_far_from_window_edges_unchanged() {
        let points = series(&[
            json!(0), json!(100), json!(90), json!(50), json!(50),
            json!(50), json!(50), json!(40), json!(80), json!(10),
        ]);
        let wide = ExtrapolationWindow {
            from_secs: FROM - 600,
            to_secs: FROM + 540 + 600,
            till_now: true,
        };
        assert_eq!(extrapolate(points.clone(), &wide), points);
    }

    #[test]
    fn test_trailing_gap_is_kept() {
        let mut points = series(&[
            json!(0), json!(100), json!(90), json!(50), json!(50),
            json!(50), json!(50), json!(40), json!(80), json!(10),
        ]);
        points[9].value = Value::Null;
        let out = extrapolate(points, &window(true));
        assert!(out[9].is_gap());
    }

    // characterization: a non-numeric neighbour leaves that boundary alone
    #[test]
    fn test_non_numeric_neighbour_skips_boundary() {
        let points = series(&[
            json!(0), Value::Null, json!(90), json!(50), json!(50),
            json!(50), json!(50), json!(40), json!(80), json!(10),
        ]);
        let out = extrapolate(points, &window(true));

        assert_eq!(out[0].value, json!(0));
        assert!(out[1].is_gap());
        // (80 - 40) / 80 * 0.1 = 0.05
        assert_close(out[9].value.as_f64().unwrap(), 84.0);

        let tail = series(&[
            json!(0), json!(100), json!(90), json!(50), json!(50),
            json!(50), json!(50), json!(40), json!("n/a"), json!(10),
        ]);
        let out = extrapolate(tail, &window(true));
        assert_close(out[0].value.as_f64().unwrap(), 101.0);
        assert_eq!(out[9].value, json!(10));
    }
}
