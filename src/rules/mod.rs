//! # Rule Tables
//!
//! A [`RuleTable`] maps rule names to matcher trees. It is assembled once
//! through [`RuleTableBuilder`], validated as a whole before anyone can run
//! it, and read-only from then on, so independent executions may share it
//! freely.
//!
//! Each rule body is stored wrapped in `RuleWrapper(name, body)`; executing
//! a rule therefore always passes through the wrapper, which is where node
//! factories and rule tracing hook in.
//!
//! A rule may carry a [`NodeFactory`] that shapes its matched fragments, and
//! the nodes built by rules nested inside it, into a domain value of type `T`.

mod validate;

use std::fmt;
use std::sync::Arc;

use im::HashMap;
use tracing::debug;

use crate::config::EngineConfig;
use crate::diagnostics::GrammarError;
use crate::matcher::{Matcher, MatcherRef};
use crate::optimizer::Optimizer;

/// Builds a domain value from a rule's name, its fragments, and the nodes
/// produced by the rules it invoked.
pub type NodeFactory<T> = Arc<dyn Fn(&str, &[String], Vec<T>) -> T + Send + Sync>;

// ============================================================================
// RULES
// ============================================================================

pub struct Rule<T> {
    name: String,
    body: MatcherRef,
    factory: Option<NodeFactory<T>>,
}

impl<T> Rule<T> {
    fn new(name: String, definition: MatcherRef, factory: Option<NodeFactory<T>>) -> Self {
        let body = Arc::new(Matcher::RuleWrapper {
            name: name.clone(),
            inner: definition,
        });
        Self {
            name,
            body,
            factory,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The executable body: `RuleWrapper(name, definition)`.
    pub fn body(&self) -> &MatcherRef {
        &self.body
    }

    /// The matcher the rule was defined with.
    pub fn definition(&self) -> &MatcherRef {
        match &*self.body {
            Matcher::RuleWrapper { inner, .. } => inner,
            _ => &self.body,
        }
    }

    pub fn factory(&self) -> Option<&NodeFactory<T>> {
        self.factory.as_ref()
    }
}

impl<T> Clone for Rule<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            body: self.body.clone(),
            factory: self.factory.clone(),
        }
    }
}

impl<T> fmt::Debug for Rule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("definition", &self.definition().to_string())
            .field("factory", &self.factory.is_some())
            .finish()
    }
}

// ============================================================================
// RULE TABLE
// ============================================================================

/// A validated, immutable set of named rules.
pub struct RuleTable<T = ()> {
    rules: Vec<Rule<T>>,
    index: HashMap<String, usize>,
    nullable: HashMap<String, bool>,
    root: Option<String>,
    config: EngineConfig,
}

impl<T> RuleTable<T> {
    pub fn builder() -> RuleTableBuilder<T> {
        RuleTableBuilder::new()
    }

    /// A table without rules, for running matchers that reference none.
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            index: HashMap::new(),
            nullable: HashMap::new(),
            root: None,
            config: EngineConfig::default(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Rule<T>> {
        self.index.get(name).and_then(|&i| self.rules.get(i))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn root_name(&self) -> Option<&str> {
        self.root.as_deref()
    }

    pub fn root(&self) -> Option<&Rule<T>> {
        self.root.as_deref().and_then(|name| self.get(name))
    }

    /// Rules in declaration order.
    pub fn rules(&self) -> impl Iterator<Item = &Rule<T>> {
        self.rules.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.name())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Whether `matcher` can succeed without consuming input, given the
    /// rules of this table.
    pub fn is_nullable(&self, matcher: &Matcher) -> bool {
        validate::is_nullable(matcher, &self.nullable)
    }

    /// Checks a matcher that is not part of the table against it: every
    /// reference must resolve and every node must be well formed.
    pub fn check(&self, matcher: &Matcher) -> Result<(), GrammarError> {
        validate::check_references(matcher, self, None)?;
        validate::check_well_formed(matcher, &self.nullable)
    }

    /// A copy of this table with every rule body optimized.
    pub fn optimized(&self) -> Self {
        let mut optimizer = Optimizer::new();
        let rules = self
            .rules
            .iter()
            .map(|rule| {
                Rule::new(
                    rule.name.clone(),
                    optimizer.optimize_ref(rule.definition()),
                    rule.factory.clone(),
                )
            })
            .collect();
        Self {
            rules,
            index: self.index.clone(),
            nullable: self.nullable.clone(),
            root: self.root.clone(),
            config: self.config.clone().with_optimize(true),
        }
    }
}

impl<T> Clone for RuleTable<T> {
    fn clone(&self) -> Self {
        Self {
            rules: self.rules.clone(),
            index: self.index.clone(),
            nullable: self.nullable.clone(),
            root: self.root.clone(),
            config: self.config.clone(),
        }
    }
}

impl<T> Default for RuleTable<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> fmt::Debug for RuleTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleTable")
            .field("root", &self.root)
            .field("rules", &self.rules)
            .field("config", &self.config)
            .finish()
    }
}

// ============================================================================
// BUILDER
// ============================================================================

pub struct RuleTableBuilder<T = ()> {
    root: Option<String>,
    rules: Vec<Rule<T>>,
    config: EngineConfig,
}

impl<T> RuleTableBuilder<T> {
    pub fn new() -> Self {
        Self {
            root: None,
            rules: Vec::new(),
            config: EngineConfig::default(),
        }
    }

    pub fn root(mut self, name: impl Into<String>) -> Self {
        self.root = Some(name.into());
        self
    }

    pub fn rule(mut self, name: impl Into<String>, body: impl Into<MatcherRef>) -> Self {
        self.rules.push(Rule::new(name.into(), body.into(), None));
        self
    }

    pub fn rule_with_factory(
        mut self,
        name: impl Into<String>,
        body: impl Into<MatcherRef>,
        factory: impl Fn(&str, &[String], Vec<T>) -> T + Send + Sync + 'static,
    ) -> Self {
        self.rules
            .push(Rule::new(name.into(), body.into(), Some(Arc::new(factory))));
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Validates the rules and freezes them into a table.
    ///
    /// Checks, in order: duplicate names, the root, undefined references,
    /// node well-formedness (including loops over empty matches), and left
    /// recursion. The first problem found is returned.
    pub fn build(self) -> Result<RuleTable<T>, GrammarError> {
        let mut index = HashMap::new();
        for (i, rule) in self.rules.iter().enumerate() {
            if rule.name.is_empty() {
                return Err(GrammarError::malformed("rule name must not be empty"));
            }
            if index.insert(rule.name.clone(), i).is_some() {
                return Err(GrammarError::DuplicateRule {
                    name: rule.name.clone(),
                });
            }
        }

        if let Some(root) = &self.root {
            if !index.contains_key(root) {
                return Err(GrammarError::MissingRoot { name: root.clone() });
            }
        }

        let mut table = RuleTable {
            rules: self.rules,
            index,
            nullable: HashMap::new(),
            root: self.root,
            config: self.config,
        };
        validate::validate_table(&mut table)?;

        if table.config.optimize {
            table = table.optimized();
        }

        debug!(
            rules = table.len(),
            root = table.root.as_deref().unwrap_or("<none>"),
            optimized = table.config.optimize,
            "built rule table"
        );
        Ok(table)
    }
}

impl<T> Default for RuleTableBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}
