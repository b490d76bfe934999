use crate::error::Result;

/// An update rule turning a gradient into new parameter values.
pub trait Optimizer {
    /// Updates `params` in place from `grad`.
    ///
    /// # Errors
    /// `DimensionMismatch` when the slices disagree in length; `params` is
    /// left untouched in that case.
    fn update_params(&mut self, grad: &[f32], params: &mut [f32]) -> Result<()>;
}
