//! Time-bucketed pseudo-randomness
//!
//! Gives a value that holds steady for a whole period and jumps to an
//! unrelated value at each period boundary. Stateless, so path cost queries
//! and behavior variation can call it any number of times per tick.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::types::Seconds;

/// Index of the period `now` falls in
pub fn time_bucket(now: Seconds, period: Seconds) -> i64 {
    if period <= 0.0 {
        return 0;
    }
    (now / period).floor() as i64
}

/// Value in `[0, 1)` stable for `period` seconds for a given (id, salt)
pub fn transient_random(id: u32, salt: u32, now: Seconds, period: Seconds) -> f32 {
    let bucket = time_bucket(now, period) as u64;
    let seed = mix(((id as u64) << 32) | salt as u64) ^ mix(bucket.wrapping_add(0x9E37_79B9));
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.gen::<f32>()
}

/// Value in `[min, max)` stable for `period` seconds
pub fn transient_range(
    id: u32,
    salt: u32,
    now: Seconds,
    period: Seconds,
    min: f32,
    max: f32,
) -> f32 {
    min + (max - min) * transient_random(id, salt, now, period)
}

// splitmix64 finalizer
fn mix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
