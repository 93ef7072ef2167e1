//! `anyOf`, `oneOf`, `allOf`, `not` and `if`/`then`/`else`
//!
//! Each combinator evaluates every child against the same instance and path
//! and folds the child outcomes into the parent under its own rule. When the
//! instance is an object, sibling branches also share the property names
//! they declare, so a branch with `additionalProperties: false` does not
//! reject a key that a neighbouring branch (or the parent) declares.
//!
//! Branches that lose an `anyOf` / `oneOf` stop lending their names to the
//! combinators evaluated after them.

use crate::engine::{KnownNames, ValidationEngine};
use crate::result::{ErrorKind, ValidationError, ValidationResult};
use jsv_ir::{InstancePath, Value};
use jsv_schema::SchemaNode;
use std::sync::Arc;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Group {
    AllOf,
    AnyOf,
    OneOf,
}

struct Branch<'s> {
    group: Group,
    index: usize,
    node: &'s SchemaNode,
    live: bool,
}

/// Names visible to the branches of one node
struct NameScope<'s> {
    tracks_names: bool,
    base: KnownNames<'s>,
    branches: Vec<Branch<'s>>,
}

impl<'s> NameScope<'s> {
    fn new(node: &'s SchemaNode, instance: &Value, inherited: &KnownNames<'s>) -> Self {
        let tracks_names = matches!(instance, Value::Object(_));
        if !tracks_names {
            return Self {
                tracks_names,
                base: KnownNames::new(),
                branches: Vec::new(),
            };
        }

        let mut base = inherited.clone();
        base.extend(node.properties.keys().map(String::as_str));

        let mut branches = Vec::new();
        for (group, list) in [
            (Group::AllOf, &node.all_of),
            (Group::AnyOf, &node.any_of),
            (Group::OneOf, &node.one_of),
        ] {
            for (index, branch) in list.iter().flatten().enumerate() {
                branches.push(Branch {
                    group,
                    index,
                    node: branch.as_ref(),
                    live: true,
                });
            }
        }

        Self {
            tracks_names,
            base,
            branches,
        }
    }

    /// Known names for one branch: the scope's base plus every live
    /// branch's declarations. A `oneOf` branch does not see its own
    /// siblings, since at most one of them may apply.
    fn known_for(&self, group: Option<Group>, index: usize) -> KnownNames<'s> {
        if !self.tracks_names {
            return KnownNames::new();
        }
        let mut known = self.base.clone();
        for branch in &self.branches {
            let sibling_of_one_of =
                group == Some(Group::OneOf) && branch.group == Group::OneOf && branch.index != index;
            if branch.live && !sibling_of_one_of {
                known.extend(branch.node.declared_names.iter().map(String::as_str));
            }
        }
        known
    }

    /// Keep only the listed branches of `group` live
    fn retain(&mut self, group: Group, kept: &[usize]) {
        for branch in self.branches.iter_mut().filter(|b| b.group == group) {
            branch.live = kept.contains(&branch.index);
        }
    }
}

/// Index of the highest-scoring failed outcome; ties go to the earliest
pub(crate) fn best_failure(outcomes: &[ValidationResult]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (idx, outcome) in outcomes.iter().enumerate() {
        if outcome.is_valid() {
            continue;
        }
        if best.is_none_or(|b| outcome.score() > outcomes[b].score()) {
            best = Some(idx);
        }
    }
    best
}

fn evaluate_group<'s>(
    engine: &ValidationEngine,
    scope: &NameScope<'s>,
    group: Group,
    branches: &'s [Arc<SchemaNode>],
    instance: &Value,
    path: &InstancePath,
) -> Vec<ValidationResult> {
    branches
        .iter()
        .enumerate()
        .map(|(index, branch)| {
            engine.validate_node(branch, instance, path, &scope.known_for(Some(group), index))
        })
        .collect()
}

fn summary(kind: ErrorKind, path: &InstancePath, message: &str) -> ValidationError {
    ValidationError::new(kind, path.clone(), message)
}

/// Run every combinator on `node` in order: `anyOf`, `oneOf`, `allOf`,
/// `not`, then `if`/`then`/`else`. Earns the combinator step's +1.
pub(crate) fn validate_combinators<'s>(
    engine: &ValidationEngine,
    node: &'s SchemaNode,
    instance: &Value,
    path: &InstancePath,
    known: &KnownNames<'s>,
    result: &mut ValidationResult,
) {
    if node.has_combinators() {
        let mut scope = NameScope::new(node, instance, known);

        if let Some(branches) = &node.any_of {
            validate_any_of(engine, &mut scope, branches, instance, path, result);
        }
        if let Some(branches) = &node.one_of {
            validate_one_of(engine, &mut scope, branches, instance, path, result);
        }
        if let Some(branches) = &node.all_of {
            validate_all_of(engine, &scope, branches, instance, path, result);
        }

        if let Some(not) = &node.not {
            let outcome = engine.validate_node(not, instance, path, &scope.known_for(None, 0));
            if outcome.is_valid() {
                result.add_error(summary(
                    ErrorKind::NotViolation,
                    path,
                    "Must not validate the schema (not)",
                ));
            }
        }

        if let Some(conditional) = &node.conditional {
            let known = scope.known_for(None, 0);
            let condition = engine.validate_node(&conditional.condition, instance, path, &known);
            let (branch, message) = if condition.is_valid() {
                (&conditional.then_branch, "Must validate \"then\" as \"if\" was valid")
            } else {
                (&conditional.else_branch, "Must validate \"else\" as \"if\" was not valid")
            };
            if let Some(branch) = branch {
                let outcome = engine.validate_node(branch, instance, path, &known);
                if !outcome.is_valid() {
                    result.add_error(summary(ErrorKind::ConditionalViolation, path, message));
                    result.merge(outcome);
                }
            }
        }
    }

    result.increment_score();
}

fn validate_any_of<'s>(
    engine: &ValidationEngine,
    scope: &mut NameScope<'s>,
    branches: &'s [Arc<SchemaNode>],
    instance: &Value,
    path: &InstancePath,
    result: &mut ValidationResult,
) {
    let mut outcomes = evaluate_group(engine, scope, Group::AnyOf, branches, instance, path);
    let passed: Vec<usize> = (0..outcomes.len())
        .filter(|&idx| outcomes[idx].is_valid())
        .collect();
    trace!(path = %path, branches = outcomes.len(), passed = passed.len(), "anyOf");

    if !passed.is_empty() {
        scope.retain(Group::AnyOf, &passed);
        return;
    }

    result.add_error(summary(
        ErrorKind::AnyOfViolation,
        path,
        "Must validate at least one schema (anyOf)",
    ));
    match best_failure(&outcomes) {
        Some(best) => {
            scope.retain(Group::AnyOf, &[best]);
            result.merge(outcomes.swap_remove(best));
        }
        None => scope.retain(Group::AnyOf, &[]),
    }
}

fn validate_one_of<'s>(
    engine: &ValidationEngine,
    scope: &mut NameScope<'s>,
    branches: &'s [Arc<SchemaNode>],
    instance: &Value,
    path: &InstancePath,
    result: &mut ValidationResult,
) {
    let mut outcomes = evaluate_group(engine, scope, Group::OneOf, branches, instance, path);
    let passed: Vec<usize> = (0..outcomes.len())
        .filter(|&idx| outcomes[idx].is_valid())
        .collect();
    trace!(path = %path, branches = outcomes.len(), passed = passed.len(), "oneOf");

    if passed.len() == 1 {
        scope.retain(Group::OneOf, &passed);
        return;
    }

    result.add_error(summary(
        ErrorKind::OneOfViolation,
        path,
        "Must validate one and only one schema (oneOf)",
    ));
    if !passed.is_empty() {
        scope.retain(Group::OneOf, &passed);
        return;
    }
    match best_failure(&outcomes) {
        Some(best) => {
            scope.retain(Group::OneOf, &[best]);
            result.merge(outcomes.swap_remove(best));
        }
        None => scope.retain(Group::OneOf, &[]),
    }
}

fn validate_all_of<'s>(
    engine: &ValidationEngine,
    scope: &NameScope<'s>,
    branches: &'s [Arc<SchemaNode>],
    instance: &Value,
    path: &InstancePath,
    result: &mut ValidationResult,
) {
    let outcomes = evaluate_group(engine, scope, Group::AllOf, branches, instance, path);
    let mut failed = false;
    for outcome in outcomes {
        failed |= !outcome.is_valid();
        result.merge(outcome);
    }
    if failed {
        result.add_error(summary(
            ErrorKind::AllOfViolation,
            path,
            "Must validate all the schemas (allOf)",
        ));
    }
}
