// Seeded jitter source so projections and sparklines are reproducible

/// 64-bit linear congruential generator.
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        let val = (self.next_u64() >> 11) as f64;
        val / ((1u64 << 53) as f64)
    }

    /// Uniform in `[min, max)`.
    pub fn uniform(&mut self, min: f64, max: f64) -> f64 {
        let width = max - min;
        if width <= f64::EPSILON {
            return min;
        }
        min + self.next_f64() * width
    }
}
