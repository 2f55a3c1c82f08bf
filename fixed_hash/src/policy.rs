//! Bucket-count growth policy.

/// Ascending primes used as bucket counts when a table is allowed to grow.
/// Consecutive entries differ by roughly eight percent.
const PRIMES: [u32; 255] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89,
    97, 103, 109, 113, 127, 137, 139, 149, 157, 167, 179, 193, 211, 227, 241, 257, 277, 293,
    313, 337, 359, 383, 409, 439, 467, 503, 541, 577, 619, 661, 709, 761, 823, 887, 953, 1_031,
    1_109, 1_193, 1_289, 1_381, 1_493, 1_613, 1_741, 1_879, 2_029, 2_179, 2_357, 2_549, 2_753,
    2_971, 3_209, 3_469, 3_739, 4_027, 4_349, 4_703, 5_087, 5_503, 5_953, 6_427, 6_949, 7_517,
    8_123, 8_783, 9_497, 10_273, 11_113, 12_011, 12_983, 14_033, 15_173, 16_411, 17_749, 19_183,
    20_753, 22_447, 24_281, 26_267, 28_411, 30_727, 33_223, 35_933, 38_873, 42_043, 45_481,
    49_201, 53_201, 57_557, 62_233, 67_307, 72_817, 78_779, 85_229, 92_203, 99_733, 107_897,
    116_731, 126_271, 136_607, 147_793, 159_871, 172_933, 187_091, 202_409, 218_971, 236_897,
    256_279, 277_261, 299_951, 324_503, 351_061, 379_787, 410_857, 444_487, 480_881, 520_241,
    562_841, 608_903, 658_753, 712_697, 771_049, 834_181, 902_483, 976_369, 1_056_323,
    1_142_821, 1_236_397, 1_337_629, 1_447_153, 1_565_659, 1_693_859, 1_832_561, 1_982_627,
    2_144_977, 2_320_627, 2_510_653, 2_716_249, 2_938_679, 3_179_303, 3_439_651, 3_721_303,
    4_026_031, 4_355_707, 4_712_381, 5_098_259, 5_515_729, 5_967_347, 6_456_007, 6_984_629,
    7_556_579, 8_175_383, 8_844_859, 9_569_143, 10_352_717, 11_200_489, 12_117_689, 13_109_983,
    14_183_539, 15_345_007, 16_601_593, 17_961_079, 19_431_899, 21_023_161, 22_744_717,
    24_607_243, 26_622_317, 28_802_401, 31_160_981, 33_712_729, 36_473_443, 39_460_231,
    42_691_603, 46_187_573, 49_969_847, 54_061_849, 58_488_943, 63_278_561, 68_460_391,
    74_066_549, 80_131_819, 86_693_767, 93_793_069, 101_473_717, 109_783_337, 118_773_397,
    128_499_677, 139_022_417, 150_406_843, 162_723_577, 176_048_909, 190_465_427, 206_062_531,
    222_936_881, 241_193_053, 260_944_219, 282_312_799, 305_431_229, 330_442_829, 357_502_601,
    386_778_277, 418_451_333, 452_718_089, 489_790_921, 529_899_637, 573_292_817, 620_239_453,
    671_030_513, 725_980_837, 785_430_967, 849_749_479, 919_334_987, 994_618_837, 1_076_067_617,
    1_164_186_217, 1_259_520_799, 1_362_662_261, 1_474_249_943, 1_594_975_441, 1_725_587_117,
    1_866_894_511, 2_019_773_507, 2_185_171_673, 2_364_114_217, 2_557_710_269, 2_767_159_799,
    2_993_761_039, 3_238_918_481, 3_504_151_727, 3_791_104_843, 4_101_556_399, 4_294_967_291,
];

/// Load factor a fixed table is pinned to when it may not overflow. No
/// element count reachable within the inline capacity comes near it.
pub const PINNED_MAX_LOAD_FACTOR: f32 = 10_000.0;

/// Returns the smallest tabulated prime that is at least `min`, or the
/// largest one if `min` exceeds the table.
#[must_use]
pub fn next_bucket_count(min: usize) -> usize {
    let index = PRIMES.partition_point(|&p| (p as usize) < min);
    PRIMES[index.min(PRIMES.len() - 1)] as usize
}

/// Decides when, and to how many buckets, a table should grow.
///
/// The policy tracks the element count at which the current bucket count
/// stops satisfying `max_load_factor`. Crossing it asks for at least
/// `growth_factor` times as many buckets, rounded up to the next prime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrimeRehashPolicy {
    max_load_factor: f32,
    growth_factor: f32,
    next_resize: usize,
}

impl PrimeRehashPolicy {
    pub const DEFAULT_MAX_LOAD_FACTOR: f32 = 1.0;
    pub const DEFAULT_GROWTH_FACTOR: f32 = 2.0;

    #[must_use]
    pub fn new(max_load_factor: f32, bucket_count: usize) -> Self {
        let mut policy = Self {
            max_load_factor: if usable_load_factor(max_load_factor) {
                max_load_factor
            } else {
                Self::DEFAULT_MAX_LOAD_FACTOR
            },
            growth_factor: Self::DEFAULT_GROWTH_FACTOR,
            next_resize: 0,
        };
        policy.reset(bucket_count);
        policy
    }

    /// Policy for a table that never rehashes.
    #[must_use]
    pub fn pinned(bucket_count: usize) -> Self {
        Self::new(PINNED_MAX_LOAD_FACTOR, bucket_count)
    }

    #[must_use]
    pub fn max_load_factor(&self) -> f32 {
        self.max_load_factor
    }

    /// Sets the load factor and recomputes the resize threshold for
    /// `bucket_count`. Returns `false` and keeps the current factor when
    /// `max_load_factor` is not a finite positive number.
    pub fn set_max_load_factor(&mut self, max_load_factor: f32, bucket_count: usize) -> bool {
        if !usable_load_factor(max_load_factor) {
            return false;
        }
        self.max_load_factor = max_load_factor;
        self.reset(bucket_count);
        true
    }

    /// Element count above which the current bucket count is too small.
    #[must_use]
    pub fn next_resize(&self) -> usize {
        self.next_resize
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn reset(&mut self, bucket_count: usize) {
        self.next_resize = (bucket_count as f32 * self.max_load_factor) as usize;
    }

    /// Returns the new bucket count if adding `additional` elements to a table
    /// holding `elements` in `bucket_count` buckets needs a rehash, updating
    /// the threshold either way.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn rehash_required(
        &mut self,
        bucket_count: usize,
        elements: usize,
        additional: usize,
    ) -> Option<usize> {
        let wanted = elements + additional;
        if wanted <= self.next_resize {
            return None;
        }

        let min_buckets = wanted as f32 / self.max_load_factor;
        if min_buckets > bucket_count as f32 {
            let min_buckets = min_buckets.max(self.growth_factor * bucket_count as f32);
            let grown = next_bucket_count((min_buckets as usize).saturating_add(1));
            if grown > bucket_count {
                self.reset(grown);
                return Some(grown);
            }
        }

        self.reset(bucket_count);
        None
    }
}

fn usable_load_factor(max_load_factor: f32) -> bool {
    max_load_factor.is_finite() && max_load_factor > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_prime(n: u32) -> bool {
        n >= 2 && (2..).take_while(|d| d * d <= n).all(|d| n % d != 0)
    }

    #[test]
    fn test_table_is_ascending_primes() {
        assert!(PRIMES.windows(2).all(|w| w[0] < w[1]));
        assert!(PRIMES
            .iter()
            .take_while(|&&p| p < 100_000)
            .all(|&p| is_prime(p)));
    }

    #[test]
    fn test_next_bucket_count() {
        assert_eq!(next_bucket_count(0), 2);
        assert_eq!(next_bucket_count(6), 7);
        assert_eq!(next_bucket_count(7), 7);
        assert_eq!(next_bucket_count(20), 23);
        assert_eq!(next_bucket_count(usize::MAX), 4_294_967_291);
    }

    #[test]
    fn test_pinned_policy_never_rehashes() {
        let mut policy = PrimeRehashPolicy::pinned(5);
        for elements in 0..1_000 {
            assert_eq!(policy.rehash_required(5, elements, 1), None);
        }
    }

    #[test]
    fn test_growth_at_least_doubles() {
        let mut policy = PrimeRehashPolicy::new(1.0, 3);
        assert_eq!(policy.next_resize(), 3);
        assert_eq!(policy.rehash_required(3, 2, 1), None);
        assert_eq!(policy.rehash_required(3, 3, 1), Some(7));
        assert_eq!(policy.next_resize(), 7);
    }

    #[test]
    fn test_load_factor_changes_threshold() {
        let mut policy = PrimeRehashPolicy::new(1.0, 11);
        policy.set_max_load_factor(0.5, 11);
        assert_eq!(policy.next_resize(), 5);
        assert_eq!(policy.rehash_required(11, 5, 1), Some(23));
    }

    #[test]
    fn test_unusable_load_factor_is_ignored() {
        let mut policy = PrimeRehashPolicy::new(1.0, 11);
        for bad in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            assert!(!policy.set_max_load_factor(bad, 11));
            assert_eq!(policy.max_load_factor(), 1.0);
            assert_eq!(policy.next_resize(), 11);
        }
        assert_eq!(PrimeRehashPolicy::new(0.0, 5).max_load_factor(), 1.0);
    }

    #[test]
    fn test_tiny_load_factor_saturates() {
        let mut policy = PrimeRehashPolicy::new(f32::MIN_POSITIVE, 2);
        assert_eq!(policy.rehash_required(2, 1, 1), Some(4_294_967_291));
    }
}
