pub const BASE_POINTS: u32 = 100;
pub const BONUS_PER_SECOND: u32 = 5;

/// Points for a correct answer given with `time_remaining` seconds left.
/// Saturates instead of overflowing on absurd countdowns.
pub fn points(time_remaining: u32) -> u32 {
    time_remaining
        .saturating_mul(BONUS_PER_SECOND)
        .saturating_add(BASE_POINTS)
}
