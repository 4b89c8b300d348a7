//! Speed-weighted scoring.
//!
//! An instant solve is worth `base × (1 + bonus)`, degrading linearly to
//! exactly `base` at the time limit. Elapsed time is clamped to the limit,
//! so a late-judged move never scores below base.

/// Reference bonus multiplier: up to double points for an instant solve.
pub const DEFAULT_BONUS_MULTIPLIER: f64 = 1.0;

/// Round to two decimal places for scores surfaced to clients.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Points awarded for completing a line worth `base` points within
/// `timer_secs`, `elapsed_secs` after launch.
pub fn award_points(base: f64, timer_secs: u32, elapsed_secs: f64, bonus_multiplier: f64) -> f64 {
    let limit = f64::from(timer_secs);
    let elapsed = elapsed_secs.clamp(0.0, limit);
    let unused = if limit > 0.0 { 1.0 - elapsed / limit } else { 0.0 };
    round2(base * (1.0 + bonus_multiplier * unused))
}
