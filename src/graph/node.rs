use serde::{Deserialize, Serialize};

/// Identifies a node inside the graph that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

/// The operation performed by a node.
///
/// Operands always refer to nodes declared before the node that uses them,
/// so the graph's declaration order doubles as a topological order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Op {
    /// An input fed at run time.
    Placeholder,
    /// A trainable scalar, mutable through a `Session`.
    Variable { init: f32 },
    /// A fixed sequence of values baked into the graph.
    Const { values: Vec<f32> },
    Add { lhs: NodeId, rhs: NodeId },
    Sub { lhs: NodeId, rhs: NodeId },
    Mul { lhs: NodeId, rhs: NodeId },
    Square { input: NodeId },
    Sum { input: NodeId },
}

impl Op {
    /// The base name used when the builder has to invent one.
    pub(crate) fn auto_name(&self) -> &'static str {
        match self {
            Op::Placeholder => "placeholder",
            Op::Variable { .. } => "variable",
            Op::Const { .. } => "const",
            Op::Add { .. } => "add",
            Op::Sub { .. } => "sub",
            Op::Mul { .. } => "mul",
            Op::Square { .. } => "square",
            Op::Sum { .. } => "sum",
        }
    }

    pub(crate) fn operands(&self) -> impl Iterator<Item = NodeId> + '_ {
        let ids = match *self {
            Op::Placeholder | Op::Variable { .. } | Op::Const { .. } => [None, None],
            Op::Add { lhs, rhs } | Op::Sub { lhs, rhs } | Op::Mul { lhs, rhs } => {
                [Some(lhs), Some(rhs)]
            }
            Op::Square { input } | Op::Sum { input } => [Some(input), None],
        };

        ids.into_iter().flatten()
    }
}

/// A named node and its operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
    pub(crate) name: String,
    pub(crate) op: Op,
}

impl NodeDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn op(&self) -> &Op {
        &self.op
    }
}
