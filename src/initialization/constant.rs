use super::ParamGen;

/// Initializes every variable to the same fixed value, up to a limit.
///
/// The reference scenario pins its two parameters to literal values, so this
/// generator is mostly useful for wiring models whose parameter count is
/// decided elsewhere.
pub struct ConstParamGen {
    value: f32,
    remaining: usize,
}

impl ConstParamGen {
    /// Creates a generator that yields `value` at most `limit` times.
    pub fn new(value: f32, limit: usize) -> Self {
        Self {
            value,
            remaining: limit,
        }
    }
}

impl ParamGen for ConstParamGen {
    fn sample(&mut self, n: usize) -> Option<Vec<f32>> {
        if self.remaining == 0 {
            return None;
        }

        let n = n.min(self.remaining);
        self.remaining -= n;
        Some(vec![self.value; n])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_limit_is_exhausted_immediately() {
        let mut param_gen = ConstParamGen::new(0.3, 0);
        assert!(param_gen.sample(2).is_none());
    }

    #[test]
    fn draws_up_to_the_limit() {
        let mut param_gen = ConstParamGen::new(0.3, 2);

        assert_eq!(param_gen.sample(2).unwrap(), vec![0.3, 0.3]);
        assert!(param_gen.sample(1).is_none());
    }

    #[test]
    fn last_draw_is_truncated() {
        let mut param_gen = ConstParamGen::new(-0.3, 3);

        assert_eq!(param_gen.sample(2).unwrap(), vec![-0.3, -0.3]);
        assert_eq!(param_gen.sample(2).unwrap(), vec![-0.3]);
        assert!(param_gen.sample(2).is_none());
    }
}
