// Impulse chain integration: velocity contribution, decay and expiry.

use super::model::{Impulse, ImpulseChain, NEGLIGIBLE, Vector};

impl Impulse {
    /// Decays `direction` over `elapsed` seconds.
    ///
    /// Exponential decay composes: decaying for `a` then `b` matches decaying once for `a + b`.
    pub fn decay(&mut self, elapsed: f64) {
        if self.damping == 1.0 {
            return;
        }
        if self.damping <= NEGLIGIBLE {
            self.direction = Vector::ZERO;
            return;
        }
        self.direction = self.direction * self.damping.powf(elapsed);
    }
}

/// Applies every impulse in `chain` to `velocity` for `elapsed` seconds, decays
/// them and unlinks the ones that became negligible.
///
/// Returns the number of impulses removed. Non-positive `elapsed` is a no-op.
pub fn apply_impulses(chain: &mut ImpulseChain, velocity: &mut Vector, elapsed: f64) -> usize {
    if elapsed.is_nan() || elapsed <= 0.0 {
        return 0;
    }

    let mut expired = 0;
    // Rebuild the chain from its detached nodes, relinking only the survivors.
    let mut rest = chain.head.take();
    let mut tail = &mut chain.head;
    while let Some(mut node) = rest {
        rest = node.next.take();

        *velocity += node.direction * elapsed;
        node.decay(elapsed);

        if node.direction.is_negligible() {
            expired += 1;
            continue;
        }
        tail = &mut tail.insert(node).next;
    }
    expired
}
