//! Logistic-map pixel permutation.
//!
//! The password seeds a logistic map `x = r·x·(1−x)` with `r = 3.99`; the
//! resulting sequence, stable-sorted, gives the order in which pixels carry
//! payload bits. Everything here is plain IEEE-754 `f64` arithmetic, so the
//! sequence is bit-for-bit reproducible for a given seed.

/// Logistic map parameter, deep in the chaotic regime.
pub const LOGISTIC_R: f64 = 3.99;

/// Modulus applied to the seed hash before normalizing.
const SEED_MODULUS: u32 = 10_000;

/// Additive hash of the seed's UTF-16 code units, normalized to `[0, 1)`.
pub fn seed_to_unit(seed: &str) -> f64 {
    let sum = seed
        .encode_utf16()
        .fold(0u32, |acc, unit| (acc + u32::from(unit)) % SEED_MODULUS);
    f64::from(sum) / f64::from(SEED_MODULUS)
}

/// Iterates the logistic map `length` times from the seed's starting point,
/// collecting every iterate.
pub fn chaos_sequence(seed: &str, length: usize) -> Vec<f64> {
    let mut x = seed_to_unit(seed);
    let mut sequence = Vec::with_capacity(length);
    for _ in 0..length {
        x = LOGISTIC_R * x * (1.0 - x);
        sequence.push(x);
    }
    sequence
}

/// Pixel indices ordered by ascending chaotic value (ties keep index order).
pub fn pixel_permutation(seed: &str, pixel_count: usize) -> Vec<usize> {
    let sequence = chaos_sequence(seed, pixel_count);
    let mut order: Vec<usize> = (0..pixel_count).collect();
    // sort_by is stable
    order.sort_by(|&a, &b| sequence[a].total_cmp(&sequence[b]));
    order
}
