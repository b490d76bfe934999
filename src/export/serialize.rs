use std::io::{self, Write};

use crate::graph::{Graph, NodeId, Op};

use super::{
    KIND_ADD, KIND_CONST, KIND_MUL, KIND_PLACEHOLDER, KIND_SQUARE, KIND_SUB, KIND_SUM,
    KIND_VARIABLE, MAGIC, VERSION,
};

/// Writes the compact binary encoding of `graph` into `sink`.
///
/// Layout: magic, version and node count, then one record per node in
/// declaration order. Integer headers are big-endian; float payloads are
/// raw `f32` bytes.
pub fn write_graph<W: Write>(graph: &Graph, sink: &mut W) -> io::Result<()> {
    let mut buf = Vec::new();
    encode_graph(graph, &mut buf)?;
    sink.write_all(&buf)
}

/// Writes the text encoding of `graph` into `sink`: pretty-printed JSON
/// over the same structure the binary format captures.
pub fn write_graph_text<W: Write>(graph: &Graph, sink: &mut W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *sink, graph)?;
    sink.write_all(b"\n")
}

fn encode_graph(graph: &Graph, buf: &mut Vec<u8>) -> io::Result<()> {
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&VERSION.to_be_bytes());
    buf.extend_from_slice(&(graph.len() as u32).to_be_bytes());

    for node in graph.nodes() {
        encode_name(node.name(), buf)?;

        match node.op() {
            Op::Placeholder => buf.push(KIND_PLACEHOLDER),
            Op::Variable { init } => {
                buf.push(KIND_VARIABLE);
                buf.extend_from_slice(bytemuck::bytes_of(init));
            }
            Op::Const { values } => {
                buf.push(KIND_CONST);
                buf.extend_from_slice(&(values.len() as u32).to_be_bytes());
                buf.extend_from_slice(bytemuck::cast_slice(values));
            }
            Op::Add { lhs, rhs } => encode_binary(KIND_ADD, *lhs, *rhs, buf),
            Op::Sub { lhs, rhs } => encode_binary(KIND_SUB, *lhs, *rhs, buf),
            Op::Mul { lhs, rhs } => encode_binary(KIND_MUL, *lhs, *rhs, buf),
            Op::Square { input } => encode_unary(KIND_SQUARE, *input, buf),
            Op::Sum { input } => encode_unary(KIND_SUM, *input, buf),
        }
    }

    Ok(())
}

fn encode_name(name: &str, buf: &mut Vec<u8>) -> io::Result<()> {
    let Ok(len) = u16::try_from(name.len()) else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("node name exceeds {} bytes: {name:.32}...", u16::MAX),
        ));
    };

    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(name.as_bytes());
    Ok(())
}

fn encode_binary(kind: u8, lhs: NodeId, rhs: NodeId, buf: &mut Vec<u8>) {
    buf.push(kind);
    encode_id(lhs, buf);
    encode_id(rhs, buf);
}

fn encode_unary(kind: u8, input: NodeId, buf: &mut Vec<u8>) {
    buf.push(kind);
    encode_id(input, buf);
}

fn encode_id(id: NodeId, buf: &mut Vec<u8>) {
    buf.extend_from_slice(&(id.index() as u32).to_be_bytes());
}
