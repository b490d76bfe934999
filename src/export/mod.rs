//! Serialization of frozen graphs: a compact binary record format and a
//! human-readable text encoding of the identical structure.

mod deserialize;
mod serialize;

pub use deserialize::{read_graph, read_graph_text};
pub use serialize::{write_graph, write_graph_text};

use std::{fs::File, path::Path};

use log::debug;

use crate::{
    error::Result,
    graph::{Graph, freeze},
    session::Session,
};

pub(crate) const MAGIC: &[u8; 4] = b"flow";
pub(crate) const VERSION: u16 = 1;

pub(crate) const KIND_PLACEHOLDER: u8 = 0;
pub(crate) const KIND_VARIABLE: u8 = 1;
pub(crate) const KIND_CONST: u8 = 2;
pub(crate) const KIND_ADD: u8 = 3;
pub(crate) const KIND_SUB: u8 = 4;
pub(crate) const KIND_MUL: u8 = 5;
pub(crate) const KIND_SQUARE: u8 = 6;
pub(crate) const KIND_SUM: u8 = 7;

/// Freezes the session's graph at `output_names` and writes it twice into
/// `output_dir`: once binary, once text.
///
/// Validation happens before any file is created, so a `NodeNotFound`
/// failure writes nothing. Both files decode back to the returned graph.
pub fn freeze_and_export(
    session: &Session<'_>,
    output_names: &[&str],
    output_dir: &Path,
    binary_name: &str,
    text_name: &str,
) -> Result<Graph> {
    let frozen = freeze(session, output_names)?;
    debug!(nodes = frozen.len(); "writing frozen graph");

    let mut sink = File::create(output_dir.join(binary_name))?;
    write_graph(&frozen, &mut sink)?;

    let mut sink = File::create(output_dir.join(text_name))?;
    write_graph_text(&frozen, &mut sink)?;

    Ok(frozen)
}
