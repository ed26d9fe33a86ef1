/// Seeded uniform noise in `[-amplitude, amplitude)` (xorshift64).
#[derive(Debug, Clone)]
pub(crate) struct Jitter {
    state: u64,
    amplitude: f64,
}

impl Jitter {
    pub(crate) fn new(seed: u64, amplitude: f64) -> Self {
        Self {
            state: if seed == 0 { 0x9e37_79b9_7f4a_7c15 } else { seed },
            amplitude: if amplitude.is_finite() { amplitude.abs() } else { 0.0 },
        }
    }

    pub(crate) fn sample(&mut self) -> f64 {
        if self.amplitude == 0.0 {
            return 0.0;
        }
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;

        let unit = (x >> 11) as f64 / (1u64 << 53) as f64;
        (unit * 2.0 - 1.0) * self.amplitude
    }
}
