use crate::{
    error::{FlowError, Result},
    graph::{Graph, NodeId, Op},
    session::Session,
};

/// Produces a new graph in which every variable reachable from
/// `output_names` is replaced by a constant holding its current trained
/// value.
///
/// Only the subgraph reachable from the named outputs is kept; node names
/// and their relative declaration order are preserved. The input graph and
/// session are left untouched, and freezing an already frozen graph returns
/// an equal graph.
///
/// # Errors
/// `NodeNotFound` when a name in `output_names` does not exist in the
/// graph. Nothing is built in that case.
pub fn freeze(session: &Session<'_>, output_names: &[&str]) -> Result<Graph> {
    let graph = session.graph();

    let mut roots = Vec::with_capacity(output_names.len());
    for name in output_names {
        let id = graph.find(name).ok_or_else(|| FlowError::NodeNotFound {
            name: (*name).to_string(),
        })?;
        roots.push(id);
    }

    let reachable = graph.reachable(&roots);
    let mut frozen = Graph::new();
    let mut remap: Vec<Option<NodeId>> = vec![None; graph.len()];

    for (i, node) in graph.nodes().iter().enumerate() {
        if !reachable[i] {
            continue;
        }

        let op = match *node.op() {
            Op::Placeholder => Op::Placeholder,
            Op::Variable { init } => {
                let value = session.variable_value(NodeId(i)).unwrap_or(init);
                Op::Const {
                    values: vec![value],
                }
            }
            Op::Const { ref values } => Op::Const {
                values: values.clone(),
            },
            Op::Add { lhs, rhs } => Op::Add {
                lhs: remapped(&remap, lhs),
                rhs: remapped(&remap, rhs),
            },
            Op::Sub { lhs, rhs } => Op::Sub {
                lhs: remapped(&remap, lhs),
                rhs: remapped(&remap, rhs),
            },
            Op::Mul { lhs, rhs } => Op::Mul {
                lhs: remapped(&remap, lhs),
                rhs: remapped(&remap, rhs),
            },
            Op::Square { input } => Op::Square {
                input: remapped(&remap, input),
            },
            Op::Sum { input } => Op::Sum {
                input: remapped(&remap, input),
            },
        };

        remap[i] = Some(frozen.push_named(node.name().to_string(), op));
    }

    Ok(frozen)
}

fn remapped(remap: &[Option<NodeId>], id: NodeId) -> NodeId {
    // Operands of a reachable node are reachable and precede it, so they
    // were remapped in an earlier iteration.
    remap[id.index()].unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{model::LinearModel, session::Feed};

    #[test]
    fn variables_become_trained_constants() {
        let mut graph = Graph::new();
        LinearModel::build(&mut graph, 0.3, -0.3);
        let session = Session::new(&graph);

        let frozen = freeze(&session, &["add"]).unwrap();

        let weight = frozen.find("weight").unwrap();
        assert_eq!(frozen.node(weight).op(), &Op::Const { values: vec![0.3] });

        let bias = frozen.find("bias").unwrap();
        assert_eq!(frozen.node(bias).op(), &Op::Const { values: vec![-0.3] });
    }

    #[test]
    fn prunes_nodes_the_output_does_not_depend_on() {
        let mut graph = Graph::new();
        LinearModel::build(&mut graph, 0.3, -0.3);
        let session = Session::new(&graph);

        let frozen = freeze(&session, &["add"]).unwrap();

        // The loss chain (y, sub, square, sum) hangs off the prediction.
        let names: Vec<_> = frozen.node_names().collect();
        assert_eq!(names, ["weight", "bias", "x", "mul", "add"]);
    }

    #[test]
    fn unknown_output_name_is_an_error() {
        let mut graph = Graph::new();
        LinearModel::build(&mut graph, 0.3, -0.3);
        let session = Session::new(&graph);

        let err = freeze(&session, &["add", "missing"]).unwrap_err();
        assert!(matches!(err, FlowError::NodeNotFound { name } if name == "missing"));
    }

    #[test]
    fn freezing_twice_is_idempotent() {
        let mut graph = Graph::new();
        LinearModel::build(&mut graph, 0.3, -0.3);
        let session = Session::new(&graph);

        let once = freeze(&session, &["add"]).unwrap();
        let twice = freeze(&Session::new(&once), &["add"]).unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn frozen_graph_evaluates_like_the_trained_one() {
        let mut graph = Graph::new();
        let model = LinearModel::build(&mut graph, 0.5, 1.5);
        let session = Session::new(&graph);

        let frozen = freeze(&session, &["add"]).unwrap();
        let frozen_session = Session::new(&frozen);

        let x = frozen.find("x").unwrap();
        let add = frozen.find("add").unwrap();
        let out = frozen_session
            .run(add, &Feed::new().with(x, &[2.]))
            .unwrap();

        let original = model.predict(&session, &[2.]).unwrap();
        assert_eq!(out, original);
    }
}
