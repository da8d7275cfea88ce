//! Decimal round-half-up used for every stored and compared value.

/// Round `x` half-up to `decimals` places, on its shortest decimal form.
///
/// Working on the decimal text rather than on `x * 10^d` means values such
/// as `0.0005` (stored as `0.000499999...`) still round to `0.001`. Ties
/// round away from zero. NaN and infinities pass through unchanged.
#[must_use]
pub fn round_half_up(x: f64, decimals: u32) -> f64 {
    if !x.is_finite() {
        return x;
    }
    let negative = x.is_sign_negative();
    // `{:e}` gives the shortest round-tripping digits, e.g. "1.2345e-3".
    let text = format!("{:e}", x.abs());
    let Some((mantissa, exponent)) = text.split_once('e') else {
        return x;
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return x;
    };
    let digits: Vec<u8> = mantissa
        .bytes()
        .filter(u8::is_ascii_digit)
        .map(|b| b - b'0')
        .collect();

    // Position of the decimal point relative to `digits`: value is
    // 0.d0 d1 d2 ... * 10^(exponent + 1).
    let point = exponent + 1;
    let keep = point + decimals as i32;
    if keep < 0 {
        return if negative { -0.0 } else { 0.0 };
    }
    let keep = keep as usize;

    let mut scaled: u128 = 0;
    for i in 0..keep {
        let d = digits.get(i).copied().unwrap_or(0);
        scaled = scaled.saturating_mul(10).saturating_add(u128::from(d));
    }
    if digits.get(keep).copied().unwrap_or(0) >= 5 {
        scaled = scaled.saturating_add(1);
    }

    let value = scaled as f64 / 10f64.powi(decimals as i32);
    if negative { -value } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_up() {
        assert_eq!(round_half_up(0.0005, 3), 0.001);
        assert_eq!(round_half_up(0.0004, 3), 0.0);
        assert_eq!(round_half_up(0.125, 2), 0.13);
        assert_eq!(round_half_up(2.5, 0), 3.0);
        assert_eq!(round_half_up(0.66666, 4), 0.6667);
    }

    #[test]
    fn keeps_exact_values() {
        assert_eq!(round_half_up(1.0, 3), 1.0);
        assert_eq!(round_half_up(0.0, 4), 0.0);
        assert_eq!(round_half_up(0.25, 4), 0.25);
        assert_eq!(round_half_up(123.456, 3), 123.456);
    }

    #[test]
    fn carries_into_integer_part() {
        assert_eq!(round_half_up(0.9996, 3), 1.0);
        assert_eq!(round_half_up(9.99999, 2), 10.0);
    }

    #[test]
    fn tiny_values_round_to_zero() {
        assert_eq!(round_half_up(1e-9, 4), 0.0);
        assert_eq!(round_half_up(4e-5, 4), 0.0);
        assert_eq!(round_half_up(5e-5, 4), 0.0001);
    }

    #[test]
    fn negative_values_round_away_from_zero() {
        assert_eq!(round_half_up(-0.125, 2), -0.13);
        assert_eq!(round_half_up(-1.5, 0), -2.0);
    }

    #[test]
    fn non_finite_passes_through() {
        assert!(round_half_up(f64::NAN, 3).is_nan());
        assert_eq!(round_half_up(f64::INFINITY, 3), f64::INFINITY);
    }
}
