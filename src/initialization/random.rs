use std::{cell::RefCell, rc::Rc};

use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};

use super::{ParamGen, Result};

/// Draws initial variable values from a probability distribution.
///
/// The reference scenario never uses this, but models wired through
/// [`ParamGen`](super::ParamGen) can start from random parameters instead of
/// literals without changing anything else.
pub struct RandParamGen<R: Rng, D: Distribution<f32>> {
    rng: Rc<RefCell<R>>,
    distribution: D,
    remaining: usize,
}

impl<R: Rng, D: Distribution<f32>> RandParamGen<R, D> {
    /// Creates a generator drawing from `distribution`, at most `limit` times.
    pub fn new(rng: Rc<RefCell<R>>, distribution: D, limit: usize) -> Self {
        Self {
            rng,
            distribution,
            remaining: limit,
        }
    }
}

impl<R: Rng> RandParamGen<R, Uniform<f32>> {
    /// Creates a generator over `[low, high)`.
    ///
    /// # Errors
    /// Fails when the range is invalid (`low > high`).
    pub fn uniform(rng: Rc<RefCell<R>>, limit: usize, low: f32, high: f32) -> Result<Self> {
        Ok(Self::new(rng, Uniform::new(low, high)?, limit))
    }
}

impl<R: Rng> RandParamGen<R, Normal<f32>> {
    /// Creates a generator over a normal distribution.
    ///
    /// # Errors
    /// Fails when `std_dev` is not finite.
    pub fn normal(rng: Rc<RefCell<R>>, limit: usize, mean: f32, std_dev: f32) -> Result<Self> {
        Ok(Self::new(rng, Normal::new(mean, std_dev)?, limit))
    }
}

impl<R: Rng, D: Distribution<f32>> ParamGen for RandParamGen<R, D> {
    fn sample(&mut self, n: usize) -> Option<Vec<f32>> {
        if self.remaining == 0 {
            return None;
        }

        let n = n.min(self.remaining);
        self.remaining -= n;

        let mut rng = self.rng.borrow_mut();
        Some((0..n).map(|_| self.distribution.sample(&mut *rng)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn seeded_rng() -> Rc<RefCell<StdRng>> {
        Rc::new(RefCell::new(StdRng::seed_from_u64(7)))
    }

    #[test]
    fn uniform_stays_in_range() {
        let mut param_gen = RandParamGen::uniform(seeded_rng(), 32, -0.5, 0.5).unwrap();

        let sample = param_gen.sample(32).unwrap();
        assert_eq!(sample.len(), 32);
        assert!(sample.iter().all(|v| (-0.5..0.5).contains(v)));
        assert!(param_gen.sample(1).is_none());
    }

    #[test]
    fn invalid_uniform_range_is_an_error() {
        assert!(RandParamGen::uniform(seeded_rng(), 2, 0.5, -0.5).is_err());
    }

    #[test]
    fn invalid_normal_std_dev_is_an_error() {
        assert!(RandParamGen::normal(seeded_rng(), 2, 0., f32::NAN).is_err());
    }

    #[test]
    fn seeded_draws_are_reproducible() {
        let mut first = RandParamGen::normal(seeded_rng(), 2, 0., 1.).unwrap();
        let mut second = RandParamGen::normal(seeded_rng(), 2, 0., 1.).unwrap();

        assert_eq!(first.sample(2), second.sample(2));
    }
}
