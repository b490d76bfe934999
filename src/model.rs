use crate::{
    error::{FlowError, Result},
    graph::{Graph, NodeId},
    initialization::ParamGen,
    session::{Feed, Session, Value},
};

/// The one-variable affine model `prediction = weight * x + bias` with a
/// sum-of-squared-errors loss, wired into a graph.
///
/// Node declaration order matches the construction order below, so the
/// prediction node is auto-named `add` and the loss chain is
/// `sub -> square -> sum`.
pub struct LinearModel {
    pub weight: NodeId,
    pub bias: NodeId,
    pub x: NodeId,
    pub y: NodeId,
    pub prediction: NodeId,
    pub loss: NodeId,
}

impl LinearModel {
    /// Wires the model into `graph` with fixed initial parameter values.
    pub fn build(graph: &mut Graph, weight_init: f32, bias_init: f32) -> Self {
        let weight = graph.variable("weight", weight_init);
        let bias = graph.variable("bias", bias_init);
        let x = graph.placeholder("x");

        let wx = graph.mul(weight, x);
        let prediction = graph.add(wx, bias);

        let y = graph.placeholder("y");
        let diff = graph.sub(prediction, y);
        let sq = graph.square(diff);
        let loss = graph.sum(sq);

        Self {
            weight,
            bias,
            x,
            y,
            prediction,
            loss,
        }
    }

    /// Wires the model, drawing both initial parameter values from `param_gen`.
    /// Returns `None` if the generator cannot produce two values.
    pub fn build_with(graph: &mut Graph, param_gen: &mut impl ParamGen) -> Option<Self> {
        let sample = param_gen.sample(2)?;
        let &[weight_init, bias_init] = sample.as_slice() else {
            return None;
        };

        Some(Self::build(graph, weight_init, bias_init))
    }

    /// Evaluates the model on a batch of inputs. A single-element slice
    /// evaluates one held-out input.
    pub fn predict(&self, session: &Session<'_>, inputs: &[f32]) -> Result<Value> {
        session.run(self.prediction, &Feed::new().with(self.x, inputs))
    }

    /// The sum of squared differences between predictions and labels.
    ///
    /// # Errors
    /// `DimensionMismatch` when `inputs` and `labels` differ in length;
    /// nothing is computed in that case.
    pub fn batch_loss(&self, session: &Session<'_>, inputs: &[f32], labels: &[f32]) -> Result<f32> {
        if inputs.len() != labels.len() {
            return Err(FlowError::DimensionMismatch {
                what: "labels",
                got: labels.len(),
                expected: inputs.len(),
            });
        }

        let loss = session.run(self.loss, &self.feed(inputs, labels))?;
        Ok(loss[0])
    }

    /// The training feed for a batch of `(input, label)` pairs.
    pub fn feed(&self, inputs: &[f32], labels: &[f32]) -> Feed {
        Feed::new().with(self.x, inputs).with(self.y, labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::initialization::ConstParamGen;

    #[test]
    fn declares_nodes_in_reference_order() {
        let mut graph = Graph::new();
        LinearModel::build(&mut graph, 0.3, -0.3);

        let names: Vec<_> = graph.node_names().collect();
        assert_eq!(
            names,
            ["weight", "bias", "x", "mul", "add", "y", "sub", "square", "sum"]
        );
    }

    #[test]
    fn initial_loss_matches_hand_computation() {
        let mut graph = Graph::new();
        let model = LinearModel::build(&mut graph, 0.3, -0.3);
        let session = Session::new(&graph);

        // predictions: [0.0, 0.3, 0.6, 0.9], residuals: [0.0, 1.3, 2.6, 3.9]
        let loss = model
            .batch_loss(&session, &[1., 2., 3., 4.], &[0., -1., -2., -3.])
            .unwrap();

        assert!((loss - 23.66).abs() < 1e-4, "got {loss}");
    }

    #[test]
    fn mismatched_labels_fail_before_evaluating() {
        let mut graph = Graph::new();
        let model = LinearModel::build(&mut graph, 0.3, -0.3);
        let session = Session::new(&graph);

        let err = model
            .batch_loss(&session, &[1., 2., 3., 4.], &[0.])
            .unwrap_err();

        assert!(matches!(
            err,
            FlowError::DimensionMismatch {
                got: 1,
                expected: 4,
                ..
            }
        ));
    }

    #[test]
    fn build_with_draws_two_parameters() {
        let mut graph = Graph::new();
        let mut param_gen = ConstParamGen::new(0.25, 2);
        let model = LinearModel::build_with(&mut graph, &mut param_gen).unwrap();

        let session = Session::new(&graph);
        assert_eq!(session.variable_value(model.weight), Some(0.25));
        assert_eq!(session.variable_value(model.bias), Some(0.25));
    }

    #[test]
    fn build_with_exhausted_generator_is_none() {
        let mut graph = Graph::new();
        let mut param_gen = ConstParamGen::new(0.25, 1);

        assert!(LinearModel::build_with(&mut graph, &mut param_gen).is_none());
    }
}
