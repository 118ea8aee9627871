use thiserror::Error;

use crate::graph::NodeId;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// This enum covers all failure conditions that can occur while building, mutating, and
/// analyzing program graphs. Each variant provides specific context about the failure mode
/// to enable appropriate error handling.
///
/// # Error Categories
///
/// ## Structural Errors
/// - [`Error::GraphError`] - Malformed graph operations (absent endpoints, invalid ids)
/// - [`Error::Malformed`] - Internal invariant violations with source location
///
/// ## Analysis Errors
/// - [`Error::Disconnected`] - Nodes unreachable from the entry or unable to reach the exit
/// - [`Error::Irreducible`] - Loop structure without a single dominating header
/// - [`Error::Cancelled`] - A cancellation token stopped a long-running traversal
///
/// ## Store Errors
/// - [`Error::StaleElement`] - The backing store rejected a sandbox delta element
///
/// # Examples
///
/// ```rust,ignore
/// use flowscope::{analysis, Error};
///
/// match analysis::normalize(graph) {
///     Ok(normalized) => { /* run dominance, loops, ... */ }
///     Err(Error::Disconnected { nodes }) => {
///         eprintln!("{} nodes are cut off from the entry/exit", nodes.len());
///     }
///     Err(e) => eprintln!("analysis failed: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// A graph operation was malformed.
    ///
    /// This error occurs when an operation references a node or edge that is not
    /// present in the graph, such as adding an edge with an absent endpoint or
    /// removing an element twice.
    #[error("{0}")]
    GraphError(String),

    /// Internal invariant violation.
    ///
    /// Indicates a state that should be impossible for well-formed inputs, such as
    /// the dominance fixpoint exceeding its convergence safety bound. The error
    /// includes the source location where the violation was detected.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of the violated invariant
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// Nodes are disconnected from the entry or exit of a rooted graph.
    ///
    /// Dominance and normalization require every node to be reachable from the
    /// entry and to reach the exit. Offending nodes are reported explicitly rather
    /// than silently assigned a dominator.
    #[error("{} node(s) disconnected from the entry/exit", nodes.len())]
    Disconnected {
        /// The nodes that are not connected
        nodes: Vec<NodeId>,
    },

    /// The control flow is irreducible.
    ///
    /// A cycle exists whose nodes are not governed by a single dominating header,
    /// so no correct natural-loop nesting forest can be produced. The offending
    /// nodes (loop re-entry points) are reported for diagnosis.
    #[error("irreducible control flow involving {} node(s)", nodes.len())]
    Irreducible {
        /// Nodes that are entered from outside their cycle without passing a header
        nodes: Vec<NodeId>,
    },

    /// The backing store rejected a sandbox element during flush.
    ///
    /// Carries the address of the rejected element. Flush conflicts are reported
    /// per element inside a [`crate::sandbox::FlushReport`]; the rejected element
    /// stays in the sandbox delta for retry.
    #[error("stale element: {0}")]
    StaleElement(String),

    /// A cancellation token stopped the computation.
    ///
    /// Long-running traversals (dominance fixpoint, SCC, path enumeration) poll
    /// an explicit [`crate::graph::algorithms::CancellationToken`]; when it trips,
    /// the computation returns this error instead of a partial result.
    #[error("operation was cancelled")]
    Cancelled,
}
