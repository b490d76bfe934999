use ndarray::Array1;

use crate::{
    error::{FlowError, Result},
    graph::{Graph, NodeId, Op},
};

/// Runtime values flowing through the graph. A scalar is a length-1 array
/// and broadcasts against any batch-length operand.
pub type Value = Array1<f32>;

/// Placeholder values for a single run.
#[derive(Debug, Default)]
pub struct Feed {
    entries: Vec<(NodeId, Value)>,
}

impl Feed {
    /// Creates a new, empty `Feed`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the feed extended with values for one placeholder.
    pub fn with(mut self, id: NodeId, values: &[f32]) -> Self {
        self.entries.push((id, Array1::from_vec(values.to_vec())));
        self
    }

    fn get(&self, id: NodeId) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(fed, _)| *fed == id)
            .map(|(_, value)| value)
    }
}

/// Owns the mutable state of a graph's variables and evaluates the graph.
///
/// A `Session` is constructed explicitly from a graph, initializes every
/// variable from its declared init value, and releases all state when
/// dropped. It is the only place where variables are mutated.
pub struct Session<'g> {
    graph: &'g Graph,
    variables: Vec<(NodeId, f32)>,
}

impl<'g> Session<'g> {
    /// Creates a new `Session`, initializing every variable in `graph`.
    pub fn new(graph: &'g Graph) -> Self {
        let variables = graph
            .nodes()
            .iter()
            .enumerate()
            .filter_map(|(i, node)| match node.op() {
                Op::Variable { init } => Some((NodeId(i), *init)),
                _ => None,
            })
            .collect();

        Self { graph, variables }
    }

    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    /// The current variable values, in declaration order.
    pub fn variables(&self) -> &[(NodeId, f32)] {
        &self.variables
    }

    /// The current value of one variable, if `id` names a variable.
    pub fn variable_value(&self, id: NodeId) -> Option<f32> {
        self.variables
            .iter()
            .find(|(vid, _)| *vid == id)
            .map(|(_, value)| *value)
    }

    pub(crate) fn set_variable(&mut self, id: NodeId, value: f32) {
        if let Some(slot) = self.variables.iter_mut().find(|(vid, _)| *vid == id) {
            slot.1 = value;
        }
    }

    /// Evaluates the subgraph reachable from `fetch` and returns its value.
    ///
    /// # Errors
    /// - `MissingFeed` if a reachable placeholder has no entry in `feed`.
    /// - `DimensionMismatch` if elementwise operands cannot broadcast.
    pub fn run(&self, fetch: NodeId, feed: &Feed) -> Result<Value> {
        let values = self.forward(fetch, feed)?;
        Ok(take_value(values, fetch))
    }

    /// Computes `d target / d wrt_i` for every node in `wrt` by reverse-mode
    /// differentiation. `target` must evaluate to a scalar, and every `wrt`
    /// node must hold a scalar (variables always do). Nodes that do not
    /// influence `target` get a zero gradient.
    pub fn gradients(&self, target: NodeId, wrt: &[NodeId], feed: &Feed) -> Result<Vec<f32>> {
        let values = self.forward(target, feed)?;

        let target_len = operand(&values, target).len();
        if target_len != 1 {
            return Err(FlowError::DimensionMismatch {
                what: "gradient target",
                got: target_len,
                expected: 1,
            });
        }

        let mut adjoints: Vec<Option<Value>> = vec![None; self.graph.len()];
        adjoints[target.index()] = Some(Array1::ones(1));

        for i in (0..self.graph.len()).rev() {
            let Some(dz) = adjoints[i].clone() else {
                continue;
            };

            match *self.graph.node(NodeId(i)).op() {
                Op::Placeholder | Op::Variable { .. } | Op::Const { .. } => {}
                Op::Add { lhs, rhs } => {
                    accumulate(&mut adjoints, &values, lhs, dz.clone())?;
                    accumulate(&mut adjoints, &values, rhs, dz)?;
                }
                Op::Sub { lhs, rhs } => {
                    accumulate(&mut adjoints, &values, lhs, dz.clone())?;
                    accumulate(&mut adjoints, &values, rhs, dz.mapv(|v| -v))?;
                }
                Op::Mul { lhs, rhs } => {
                    let a = operand(&values, lhs);
                    let b = operand(&values, rhs);
                    let d_lhs = broadcast("mul", &dz, b, |d, v| d * v)?;
                    let d_rhs = broadcast("mul", &dz, a, |d, v| d * v)?;
                    accumulate(&mut adjoints, &values, lhs, d_lhs)?;
                    accumulate(&mut adjoints, &values, rhs, d_rhs)?;
                }
                Op::Square { input } => {
                    let x = operand(&values, input);
                    let contrib = broadcast("square", &dz, x, |d, v| d * 2. * v)?;
                    accumulate(&mut adjoints, &values, input, contrib)?;
                }
                Op::Sum { input } => {
                    let len = operand(&values, input).len();
                    accumulate(&mut adjoints, &values, input, Array1::from_elem(len, dz[0]))?;
                }
            }
        }

        wrt.iter()
            .map(|id| match adjoints[id.index()].take() {
                None => Ok(0.),
                Some(grad) if grad.len() == 1 => Ok(grad[0]),
                Some(grad) => Err(FlowError::DimensionMismatch {
                    what: "gradient",
                    got: grad.len(),
                    expected: 1,
                }),
            })
            .collect()
    }

    /// One in-order pass over the nodes reachable from `fetch`.
    fn forward(&self, fetch: NodeId, feed: &Feed) -> Result<Vec<Option<Value>>> {
        debug_assert!(fetch.index() < self.graph.len());

        let needed = self.graph.reachable(&[fetch]);
        let mut values: Vec<Option<Value>> = vec![None; self.graph.len()];

        for (i, node) in self.graph.nodes().iter().enumerate() {
            if !needed[i] {
                continue;
            }

            let value = match node.op() {
                Op::Placeholder => {
                    feed.get(NodeId(i))
                        .cloned()
                        .ok_or_else(|| FlowError::MissingFeed {
                            name: node.name().to_string(),
                        })?
                }
                Op::Variable { init } => {
                    let value = self.variable_value(NodeId(i)).unwrap_or(*init);
                    Array1::from_elem(1, value)
                }
                Op::Const { values } => Array1::from_vec(values.clone()),
                Op::Add { lhs, rhs } => binary(&values, *lhs, *rhs, "add", |a, b| a + b)?,
                Op::Sub { lhs, rhs } => binary(&values, *lhs, *rhs, "sub", |a, b| a - b)?,
                Op::Mul { lhs, rhs } => binary(&values, *lhs, *rhs, "mul", |a, b| a * b)?,
                Op::Square { input } => operand(&values, *input).mapv(|v| v * v),
                Op::Sum { input } => Array1::from_elem(1, operand(&values, *input).sum()),
            };

            values[i] = Some(value);
        }

        Ok(values)
    }
}

fn operand(values: &[Option<Value>], id: NodeId) -> &Value {
    // Operands always precede their users, so the in-order pass has filled
    // this slot already.
    values[id.index()].as_ref().unwrap()
}

fn take_value(mut values: Vec<Option<Value>>, id: NodeId) -> Value {
    values[id.index()].take().unwrap()
}

fn binary(
    values: &[Option<Value>],
    lhs: NodeId,
    rhs: NodeId,
    what: &'static str,
    f: impl Fn(f32, f32) -> f32,
) -> Result<Value> {
    broadcast(what, operand(values, lhs), operand(values, rhs), f)
}

/// Applies `f` elementwise, broadcasting a length-1 operand against the
/// other side's length.
fn broadcast(
    what: &'static str,
    a: &Value,
    b: &Value,
    f: impl Fn(f32, f32) -> f32,
) -> Result<Value> {
    match (a.len(), b.len()) {
        (n, m) if n == m => Ok(Array1::from_iter(
            a.iter().zip(b.iter()).map(|(x, y)| f(*x, *y)),
        )),
        (1, _) => {
            let scalar = a[0];
            Ok(b.mapv(|y| f(scalar, y)))
        }
        (_, 1) => {
            let scalar = b[0];
            Ok(a.mapv(|x| f(x, scalar)))
        }
        (n, m) => Err(FlowError::DimensionMismatch {
            what,
            got: m,
            expected: n,
        }),
    }
}

/// Adds `contrib` into the adjoint slot of `id`, reducing broadcast
/// dimensions by summation so a scalar node receives a scalar gradient.
fn accumulate(
    adjoints: &mut [Option<Value>],
    values: &[Option<Value>],
    id: NodeId,
    contrib: Value,
) -> Result<()> {
    let forward_len = operand(values, id).len();

    let contrib = if contrib.len() == forward_len {
        contrib
    } else if forward_len == 1 {
        Array1::from_elem(1, contrib.sum())
    } else {
        return Err(FlowError::DimensionMismatch {
            what: "adjoint",
            got: contrib.len(),
            expected: forward_len,
        });
    };

    match &mut adjoints[id.index()] {
        slot @ None => *slot = Some(contrib),
        Some(acc) => *acc += &contrib,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn affine() -> (Graph, NodeId, NodeId, NodeId, NodeId, NodeId) {
        let mut graph = Graph::new();
        let w = graph.variable("weight", 0.5);
        let b = graph.variable("bias", 0.5);
        let x = graph.placeholder("x");
        let wx = graph.mul(w, x);
        let pred = graph.add(wx, b);
        (graph, w, b, x, wx, pred)
    }

    #[test]
    fn forward_broadcasts_scalar_parameters() {
        let (graph, _, _, x, _, pred) = affine();
        let session = Session::new(&graph);

        let out = session
            .run(pred, &Feed::new().with(x, &[1., 2., 3., 4.]))
            .unwrap();

        assert_eq!(out, Array1::from_vec(vec![1., 1.5, 2., 2.5]));
    }

    #[test]
    fn unfed_placeholder_is_an_error() {
        let (graph, _, _, _, _, pred) = affine();
        let session = Session::new(&graph);

        let err = session.run(pred, &Feed::new()).unwrap_err();
        assert!(matches!(err, FlowError::MissingFeed { name } if name == "x"));
    }

    #[test]
    fn unrelated_placeholders_need_no_feed() {
        let (mut graph, _, _, x, wx, _) = affine();
        graph.placeholder("unused");
        let session = Session::new(&graph);

        assert!(session.run(wx, &Feed::new().with(x, &[2.])).is_ok());
    }

    #[test]
    fn mismatched_batch_lengths_are_an_error() {
        let mut graph = Graph::new();
        let a = graph.placeholder("a");
        let b = graph.placeholder("b");
        let diff = graph.sub(a, b);
        let session = Session::new(&graph);

        let feed = Feed::new().with(a, &[1., 2., 3., 4.]).with(b, &[1., 2., 3.]);
        let err = session.run(diff, &feed).unwrap_err();

        assert!(matches!(
            err,
            FlowError::DimensionMismatch {
                got: 3,
                expected: 4,
                ..
            }
        ));
    }

    #[test]
    fn gradients_of_sum_of_squares() {
        // loss = sum((w * x + b - y)^2) with w = b = 0.5.
        let (mut graph, w, b, x, _, pred) = affine();
        let y = graph.placeholder("y");
        let diff = graph.sub(pred, y);
        let sq = graph.square(diff);
        let loss = graph.sum(sq);

        let session = Session::new(&graph);
        let feed = Feed::new().with(x, &[1., 2.]).with(y, &[0., 0.]);

        // residuals are [1.0, 1.5]: dL/dw = sum(2 r x) = 8, dL/db = sum(2 r) = 5.
        let grads = session.gradients(loss, &[w, b], &feed).unwrap();
        assert_eq!(grads, vec![8., 5.]);
    }

    #[test]
    fn gradient_of_unrelated_variable_is_zero() {
        let mut graph = Graph::new();
        let w = graph.variable("weight", 1.);
        let other = graph.variable("other", 1.);
        let x = graph.placeholder("x");
        let wx = graph.mul(w, x);
        let loss = graph.sum(wx);

        let session = Session::new(&graph);
        let feed = Feed::new().with(x, &[1., 2., 3.]);

        let grads = session.gradients(loss, &[w, other], &feed).unwrap();
        assert_eq!(grads, vec![6., 0.]);
    }

    #[test]
    fn gradient_target_must_be_scalar() {
        let (graph, w, _, x, _, pred) = affine();
        let session = Session::new(&graph);
        let feed = Feed::new().with(x, &[1., 2.]);

        let err = session.gradients(pred, &[w], &feed).unwrap_err();
        assert!(matches!(
            err,
            FlowError::DimensionMismatch {
                what: "gradient target",
                ..
            }
        ));
    }
}
