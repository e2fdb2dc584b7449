pub use crate::config::EngineConfig;
pub use crate::diagnostics::{
    to_error_source, GrammarError, MatchDiagnostic, MatchError, MatchErrorKind, ReaderError,
};
pub use crate::matcher::{CharPredicate, Matcher, MatcherInterner, MatcherRef};
pub use crate::optimizer::{optimize, Optimizer};
pub use crate::rules::{NodeFactory, Rule, RuleTable, RuleTableBuilder};
pub use crate::runtime::{execute, execute_str, Executor, MarkerSink, MatchResult, NullMarkerSink};
pub use crate::source::{SourceLocation, SourceRange, SourceReader};

pub mod config;
pub mod diagnostics;
pub mod matcher;
pub mod optimizer;
pub mod rules;
pub mod runtime;
pub mod source;
