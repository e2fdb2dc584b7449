//! Source positions and the backtracking reader both the engine and the
//! optimizer tests depend on.

mod location;
mod reader;

pub use location::{SourceLocation, SourceRange};
pub use reader::SourceReader;
