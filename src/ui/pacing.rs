use std::time::Duration;

use rand::Rng;

/// Random "thinking" pauses before Inky speaks. Presentation only; the
/// conversation state never waits on these.
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    min_ms: u64,
    max_ms: u64,
}

impl Pacer {
    pub fn new((min_ms, max_ms): (u64, u64)) -> Self {
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms: min_ms.max(max_ms),
        }
    }

    pub fn next_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rng.gen_range(self.min_ms..=self.max_ms))
    }

    pub async fn pause<R: Rng + ?Sized>(&self, rng: &mut R) {
        let delay = self.next_delay(rng);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
