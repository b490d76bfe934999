//! An explicit computation graph for scalar/batch arithmetic with
//! reverse-mode gradients, gradient-descent training, and export of frozen
//! graphs (variables folded into constants) in binary and text form.

pub mod error;
pub mod export;
pub mod graph;
pub mod initialization;
pub mod model;
pub mod optimization;
pub mod session;
pub mod training;

pub use error::{FlowError, Result};
pub use graph::{Graph, NodeId, freeze};
pub use session::{Feed, Session};
