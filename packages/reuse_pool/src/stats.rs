/// Counters describing how a [`Pool`][crate::Pool] has been used since it was created.
///
/// Obtained via [`Pool::stats()`][crate::Pool::stats]. The snapshot is a plain copy and does not
/// update after it has been taken.
///
/// # Examples
///
/// ```
/// use reuse_pool::{Pool, boxed_default};
///
/// let mut pool = Pool::new(4, boxed_default::<u64>, drop)?;
///
/// let value = pool.get()?;
/// pool.release(value);
/// let value = pool.get()?;
///
/// let stats = pool.stats();
/// assert_eq!(stats.constructed, 1);
/// assert_eq!(stats.reused, 1);
/// assert_eq!(stats.recycled, 1);
/// # pool.release(value);
/// # Ok::<(), reuse_pool::Error>(())
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub struct PoolStats {
    /// Elements produced by the constructor because the free list was empty.
    pub constructed: u64,

    /// Elements handed out from the free list instead of being constructed.
    pub reused: u64,

    /// Released elements that were retained on the free list.
    pub recycled: u64,

    /// Released elements that were destroyed immediately instead of being retained.
    pub discarded: u64,
}

impl PoolStats {
    /// The share of successful `get()` calls that were served from the free list,
    /// from 0.0 to 1.0. Zero if nothing has been obtained from the pool yet.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "a ratio does not need full integer precision"
    )]
    pub fn hit_rate(&self) -> f64 {
        let total = self.reused.saturating_add(self.constructed);

        if total == 0 {
            0.0
        } else {
            self.reused as f64 / total as f64
        }
    }

    pub(crate) fn record_constructed(&mut self) {
        self.constructed = self.constructed.wrapping_add(1);
    }

    pub(crate) fn record_reused(&mut self) {
        self.reused = self.reused.wrapping_add(1);
    }

    pub(crate) fn record_recycled(&mut self) {
        self.recycled = self.recycled.wrapping_add(1);
    }

    pub(crate) fn record_discarded(&mut self) {
        self.discarded = self.discarded.wrapping_add(1);
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn hit_rate_of_unused_pool_is_zero() {
        assert!(PoolStats::default().hit_rate().abs() < f64::EPSILON);
    }

    #[test]
    fn hit_rate_counts_reuse_against_all_gets() {
        let mut stats = PoolStats::default();

        stats.record_constructed();
        for _ in 0..3 {
            stats.record_reused();
        }

        assert!((stats.hit_rate() - 0.75).abs() < 0.001);
    }

    #[test]
    fn release_counters_are_independent() {
        let mut stats = PoolStats::default();

        stats.record_recycled();
        stats.record_recycled();
        stats.record_discarded();

        assert_eq!(stats.recycled, 2);
        assert_eq!(stats.discarded, 1);
        assert_eq!(stats.constructed, 0);
        assert_eq!(stats.reused, 0);
    }
}
