/// Native scale an upstream reports its score on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingScale {
    /// 0–5 stars
    FivePoint,
    /// 0–10, already canonical
    TenPoint,
    /// 0–100 percentage
    Percent,
}

impl RatingScale {
    fn max(&self) -> f32 {
        match self {
            RatingScale::FivePoint => 5.0,
            RatingScale::TenPoint => 10.0,
            RatingScale::Percent => 100.0,
        }
    }
}

/// Convert a native score to the canonical 0–10 scale
///
/// Non-finite values are dropped, out-of-range values clamped, and the
/// result rounded to two decimals.
pub fn normalize_rating(value: f32, scale: RatingScale) -> Option<f32> {
    if !value.is_finite() {
        return None;
    }
    let scaled = (value / scale.max() * 10.0).clamp(0.0, 10.0);
    Some((scaled * 100.0).round() / 100.0)
}
