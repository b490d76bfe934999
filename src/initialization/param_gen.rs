/// A source of initial values for the graph's trainable variables.
pub trait ParamGen {
    /// Draws at most `n` initial values.
    ///
    /// Returns fewer than `n` values when the generator is close to its
    /// limit, and `None` once it is exhausted.
    fn sample(&mut self, n: usize) -> Option<Vec<f32>>;
}
