use rand::Rng;
use std::time::Duration;

const MIN_TYPING_SECS: f64 = 1.5;
const MAX_TYPING_SECS: f64 = 15.0;

/// Human-looking time to type `chars` characters: 200–300 chars per minute,
/// ±30% jitter, clamped to 1.5–15 seconds.
pub fn typing_delay<R: Rng + ?Sized>(chars: usize, rng: &mut R) -> Duration {
    let chars_per_minute: u32 = rng.gen_range(200..=300);
    let seconds_per_char = 60.0 / f64::from(chars_per_minute);

    let base = chars as f64 * seconds_per_char;
    let variance = base * 0.3;
    let jitter = rng.gen_range(-variance..=variance);

    Duration::from_secs_f64((base + jitter).clamp(MIN_TYPING_SECS, MAX_TYPING_SECS))
}
