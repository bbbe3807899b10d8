//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;
use serde_json::{Number, Value};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Clamp a value between `min` and `max`.
///
/// Unlike `f64::clamp` this will not panic if `min > max`, in which case `max` wins.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: Float
{
    let mut ret = *value;

    if ret < *min {
        ret = *min
    }
    if ret > *max {
        ret = *max
    }

    ret
}

/// Wrap an angle in radians into the canonical range `(-pi, pi]`.
///
/// Angles already in range are returned unchanged. Non-finite angles are
/// returned as they are.
pub fn wrap_pi<T>(angle: T) -> T
where
    T: Float
{
    let pi_t: T = T::from(std::f64::consts::PI).unwrap_or_else(T::zero);
    let tau_t: T = pi_t + pi_t;

    if !angle.is_finite() || (angle > -pi_t && angle <= pi_t) {
        return angle
    }

    let wrapped = rem_euclid(angle + pi_t, tau_t) - pi_t;

    // rem_euclid gives [-pi, pi), so map the lower bound onto pi
    if wrapped <= -pi_t {
        wrapped + tau_t
    }
    else {
        wrapped
    }
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()` if `lhs` is much smaller than `rhs.abs()` in
/// magnitude and `lhs < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

/// Round a floating point value to the given number of decimal places.
pub fn round_dp(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    let scaled = value * scale;

    // Values too large to carry a fractional part are already "rounded"
    if !scaled.is_finite() || scaled.abs() >= 2f64.powi(52) {
        return value
    }

    scaled.round() / scale
}

/// Recursively round every floating point leaf of a JSON structure.
///
/// Integers, strings, booleans and nulls are left as they are. Non-finite
/// floats cannot be represented in JSON and become `null`.
pub fn recursive_round(value: Value, decimals: u32) -> Value {
    match value {
        Value::Number(n) => {
            if n.is_f64() {
                n.as_f64()
                    .and_then(|f| Number::from_f64(round_dp(f, decimals)))
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
            else {
                Value::Number(n)
            }
        },
        Value::Array(a) => Value::Array(
            a.into_iter().map(|v| recursive_round(v, decimals)).collect()
        ),
        Value::Object(o) => Value::Object(
            o.into_iter().map(|(k, v)| (k, recursive_round(v, decimals))).collect()
        ),
        v => v
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;
    use std::f64::consts::PI;

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(&2.0, &-1.0, &1.0), 1.0);
        assert_eq!(clamp(&-2.0, &-1.0, &1.0), -1.0);
        assert_eq!(clamp(&0.25, &-1.0, &1.0), 0.25);
    }

    #[test]
    fn test_wrap_pi() {
        assert_eq!(wrap_pi(0.5f64), 0.5);
        assert_eq!(wrap_pi(PI), PI);
        assert_eq!(wrap_pi(-PI), PI);
        assert!((wrap_pi(3.0 * PI) - PI).abs() < 1e-12);
        assert!((wrap_pi(2.0 * PI + 0.1) - 0.1).abs() < 1e-12);
        assert!((wrap_pi(-2.0 * PI - 0.1) + 0.1).abs() < 1e-12);
        assert!((wrap_pi(1.5 * PI) + 0.5 * PI).abs() < 1e-12);
    }

    #[test]
    fn test_wrap_pi_range_and_antisymmetry() {
        let angles = [
            -25.0, -7.1, -PI - 0.3, -PI, -1.0, -0.01, 0.0, 0.3, 1.0, PI - 1e-9, PI, 4.0, 9.9,
            31.4,
        ];

        for a in angles.iter() {
            for b in angles.iter() {
                let ab = wrap_pi(a - b);
                let ba = wrap_pi(b - a);

                assert!(ab > -PI && ab <= PI, "wrap({} - {}) = {} out of range", a, b, ab);

                // The antisymmetry does not hold at the +/-pi boundary
                if (ab.abs() - PI).abs() > 1e-9 {
                    assert!(
                        (ab + ba).abs() < 1e-9,
                        "wrap({0} - {1}) = {2}, wrap({1} - {0}) = {3}", a, b, ab, ba
                    );
                }
            }
        }
    }

    #[test]
    fn test_recursive_round() {
        let v = json!({
            "state": {"x": 1.234_567, "y": -0.000_04, "n": 3, "name": "veh"},
            "list": [0.123_45, [2.718_281_8], null, true]
        });

        let r = recursive_round(v, 4);

        assert_eq!(r["state"]["x"], json!(1.2346));
        assert_eq!(r["state"]["y"], json!(-0.0));
        assert_eq!(r["state"]["n"], json!(3));
        assert_eq!(r["state"]["name"], json!("veh"));
        assert_eq!(r["list"][1][0], json!(2.7183));
        assert_eq!(r["list"][2], Value::Null);
        assert_eq!(r["list"][3], json!(true));
    }

    #[test]
    fn test_recursive_round_idempotent() {
        let v = json!({
            "a": [1.000_049_9, 123.456_789, -9.999_95, 0.1, 1e-7, 12_345_678.123_456],
            "b": {"c": 3.141_592_653_589_793}
        });

        let once = recursive_round(v, 4);
        let twice = recursive_round(once.clone(), 4);

        assert_eq!(once, twice);
    }
}
