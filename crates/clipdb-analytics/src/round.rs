fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    (value * factor).round() / factor
}

/// Two decimals, half-up. Used for engagement rates.
#[must_use]
pub fn round_rate(value: f64) -> f64 {
    round_to(value, 2)
}

/// One decimal, half-up. Used for viral scores and watch times.
#[must_use]
pub fn round_score(value: f64) -> f64 {
    round_to(value, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_up() {
        assert!((round_rate(16.125) - 16.13).abs() < 1e-9);
        assert!((round_rate(15.864) - 15.86).abs() < 1e-9);
        assert!((round_score(45.55) - 45.6).abs() < 1e-9);
        assert!((round_score(28.34) - 28.3).abs() < 1e-9);
    }
}
