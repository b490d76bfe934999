use std::num::NonZeroUsize;

use log::debug;

use crate::{
    error::{FlowError, Result},
    graph::NodeId,
    optimization::Optimizer,
    session::{Feed, Session},
};

/// Runs a fixed number of training steps over one unchanging batch.
///
/// Every step evaluates the loss, differentiates it with respect to every
/// variable the session owns, and applies the optimizer's update rule. The
/// batch is never shuffled or split, so two runs from the same initial state
/// produce the same parameters.
pub struct Trainer<O: Optimizer> {
    optimizer: O,
    steps: NonZeroUsize,
}

impl<O: Optimizer> Trainer<O> {
    /// Creates a new `Trainer`.
    ///
    /// # Arguments
    /// * `optimizer` - The update rule applied after each gradient computation.
    /// * `steps` - The exact number of steps `fit` will run.
    pub fn new(optimizer: O, steps: NonZeroUsize) -> Self {
        Self { optimizer, steps }
    }

    /// Trains the session's variables against `loss` and returns the loss
    /// observed at the start of every step, in order.
    pub fn fit(
        &mut self,
        session: &mut Session<'_>,
        loss: NodeId,
        feed: &Feed,
    ) -> Result<Vec<f32>> {
        let mut losses = Vec::with_capacity(self.steps.get());

        for step in 0..self.steps.get() {
            let loss_value = self.step(session, loss, feed)?;
            losses.push(loss_value);

            if (step + 1) % 100 == 0 {
                debug!(step = step + 1, loss = loss_value as f64; "training step");
            }
        }

        Ok(losses)
    }

    /// One gradient-descent step. Returns the loss before the update.
    pub fn step(&mut self, session: &mut Session<'_>, loss: NodeId, feed: &Feed) -> Result<f32> {
        let loss_value = session.run(loss, feed)?;
        if loss_value.len() != 1 {
            return Err(FlowError::DimensionMismatch {
                what: "loss",
                got: loss_value.len(),
                expected: 1,
            });
        }

        let (ids, mut params): (Vec<NodeId>, Vec<f32>) =
            session.variables().iter().copied().unzip();

        let grad = session.gradients(loss, &ids, feed)?;
        self.optimizer.update_params(&grad, &mut params)?;

        for (id, value) in ids.into_iter().zip(params) {
            session.set_variable(id, value);
        }

        Ok(loss_value[0])
    }
}
