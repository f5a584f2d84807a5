//! Tunables for timeline durations and generated sort input.

use rand::Rng;

/// Duration hints, in milliseconds, attached to emitted step events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StepDurations {
    /// One visited candidate during a search scan
    pub visit: u64,
    /// Each half of a heap swap (highlight, then exchange)
    pub swap_half: u64,
    /// One bubble-sort comparison at speed 1
    pub compare: u64,
    /// Push/pop/enqueue/dequeue slide
    pub slide: u64,
    /// Lifetime of a transient notice
    pub notice: u64,
}

impl Default for StepDurations {
    fn default() -> Self {
        Self {
            visit: 700,
            swap_half: 350,
            compare: 300,
            slide: 250,
            notice: 1800,
        }
    }
}

impl StepDurations {
    /// Comparison delay for a caller-chosen speed factor.
    ///
    /// Non-positive or non-finite factors fall back to speed 1.
    pub fn compare_at(&self, speed: f64) -> u64 {
        if !speed.is_finite() || speed <= 0.0 {
            return self.compare;
        }
        (self.compare as f64 / speed) as u64
    }
}

/// Shape of a randomly generated sort input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RandomArray {
    pub len: usize,
    pub min: i64,
    /// Inclusive upper bound
    pub max: i64,
}

impl Default for RandomArray {
    fn default() -> Self {
        Self {
            len: 20,
            min: 40,
            max: 439,
        }
    }
}

impl RandomArray {
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<i64> {
        let (lo, hi) = if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        };
        (0..self.len).map(|_| rng.gen_range(lo..=hi)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn speed_scales_compare_delay() {
        let d = StepDurations::default();
        assert_eq!(d.compare_at(1.0), 300);
        assert_eq!(d.compare_at(2.0), 150);
        assert_eq!(d.compare_at(0.5), 600);
        assert_eq!(d.compare_at(0.0), 300);
        assert_eq!(d.compare_at(f64::NAN), 300);
    }

    #[test]
    fn random_array_respects_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let shape = RandomArray::default();
        let values = shape.generate(&mut rng);
        assert_eq!(values.len(), 20);
        assert!(values.iter().all(|v| (40..=439).contains(v)));
    }
}
