use std::io;

use crate::graph::{Graph, NodeId, Op};

use super::{
    KIND_ADD, KIND_CONST, KIND_MUL, KIND_PLACEHOLDER, KIND_SQUARE, KIND_SUB, KIND_SUM,
    KIND_VARIABLE, MAGIC, VERSION,
};

/// Decodes a graph from its binary encoding.
///
/// # Errors
/// `InvalidData` on a bad magic/version, an unknown kind byte, truncated or
/// trailing input, or operand references that break declaration order.
pub fn read_graph(mut src: &[u8]) -> io::Result<Graph> {
    let src = &mut src;

    if take(src, MAGIC.len())? != MAGIC {
        return invalid_data("not a serialized graph (bad magic)");
    }

    let version = take_u16(src)?;
    if version != VERSION {
        return invalid_data(format!("unsupported graph format version {version}"));
    }

    let count = take_u32(src)? as usize;
    let mut graph = Graph::new();

    for _ in 0..count {
        let name = take_name(src)?;

        let op = match take_u8(src)? {
            KIND_PLACEHOLDER => Op::Placeholder,
            KIND_VARIABLE => Op::Variable {
                init: take_f32(src)?,
            },
            KIND_CONST => {
                let len = take_u32(src)? as usize;
                let bytes = take(src, len * size_of::<f32>())?;
                let values = bytes
                    .chunks_exact(size_of::<f32>())
                    .map(bytemuck::pod_read_unaligned)
                    .collect();
                Op::Const { values }
            }
            KIND_ADD => {
                let (lhs, rhs) = (take_id(src)?, take_id(src)?);
                Op::Add { lhs, rhs }
            }
            KIND_SUB => {
                let (lhs, rhs) = (take_id(src)?, take_id(src)?);
                Op::Sub { lhs, rhs }
            }
            KIND_MUL => {
                let (lhs, rhs) = (take_id(src)?, take_id(src)?);
                Op::Mul { lhs, rhs }
            }
            KIND_SQUARE => Op::Square {
                input: take_id(src)?,
            },
            KIND_SUM => Op::Sum {
                input: take_id(src)?,
            },
            byte => return invalid_kind_byte(byte),
        };

        graph.push_named(name, op);
    }

    if !src.is_empty() {
        return invalid_data(format!("{} trailing bytes after graph", src.len()));
    }

    validate(&graph)?;
    Ok(graph)
}

/// Decodes a graph from its text (JSON) encoding.
pub fn read_graph_text(src: &[u8]) -> io::Result<Graph> {
    let graph: Graph = serde_json::from_slice(src)?;
    validate(&graph)?;
    Ok(graph)
}

/// Decoded graphs come from outside the builder, so re-check the ordering
/// invariant the evaluator relies on.
fn validate(graph: &Graph) -> io::Result<()> {
    for (i, node) in graph.nodes().iter().enumerate() {
        for operand in node.op().operands() {
            if operand.index() >= i {
                return invalid_data(format!(
                    "node {} references operand {} out of declaration order",
                    node.name(),
                    operand.index()
                ));
            }
        }
    }

    Ok(())
}

fn take<'a>(src: &mut &'a [u8], n: usize) -> io::Result<&'a [u8]> {
    if src.len() < n {
        return invalid_data("unexpected end of graph data");
    }

    let (head, rest) = src.split_at(n);
    *src = rest;
    Ok(head)
}

fn take_u8(src: &mut &[u8]) -> io::Result<u8> {
    Ok(take(src, 1)?[0])
}

fn take_u16(src: &mut &[u8]) -> io::Result<u16> {
    // `take` returned exactly two bytes.
    Ok(u16::from_be_bytes(take(src, 2)?.try_into().unwrap()))
}

fn take_u32(src: &mut &[u8]) -> io::Result<u32> {
    Ok(u32::from_be_bytes(take(src, 4)?.try_into().unwrap()))
}

fn take_f32(src: &mut &[u8]) -> io::Result<f32> {
    Ok(bytemuck::pod_read_unaligned(take(src, 4)?))
}

fn take_id(src: &mut &[u8]) -> io::Result<NodeId> {
    Ok(NodeId(take_u32(src)? as usize))
}

fn take_name(src: &mut &[u8]) -> io::Result<String> {
    let len = take_u16(src)? as usize;
    let bytes = take(src, len)?;

    String::from_utf8(bytes.to_vec())
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}

fn invalid_data<T>(msg: impl Into<String>) -> io::Result<T> {
    Err(io::Error::new(io::ErrorKind::InvalidData, msg.into()))
}

fn invalid_kind_byte<T>(byte: u8) -> io::Result<T> {
    invalid_data(format!("unknown node kind byte {byte}"))
}
