//! Collects per-name facts the generator needs before it emits anything.
//!
//! Rust forces declaration decisions (`let` vs `let mut`, numeric type,
//! borrow vs move) at the binding site, while Python reveals them through
//! later use. These scans walk the whole body first so every binding can
//! be emitted correctly on first sight.

use crate::ast::*;
use crate::context::{self, ReturnKind};
use crate::meta::StrategyMetadata;
use std::collections::HashSet;

const MUTATING_METHODS: &[&str] = &["append", "pop", "clear", "extend"];
const STRING_METHODS: &[&str] = &["lower", "upper"];

/// Facts about the locals of one strategy body.
#[derive(Debug, Default, Clone)]
pub struct LocalUsage {
    /// Names that are reassigned or mutated through a method call.
    pub mutable: HashSet<String>,
    /// Names that live as plain integers rather than decimals, inferred
    /// from comparisons against integer-typed parameters.
    pub int_typed: HashSet<String>,
    /// Names holding owned strings; call arguments borrow these.
    pub strings: HashSet<String>,
}

impl LocalUsage {
    pub fn is_mutable(&self, name: &str) -> bool {
        self.mutable.contains(name)
    }

    pub fn is_int(&self, name: &str) -> bool {
        self.int_typed.contains(name)
    }

    pub fn is_string(&self, name: &str) -> bool {
        self.strings.contains(name)
    }
}

pub fn analyze_locals(block: &Block, meta: &StrategyMetadata) -> LocalUsage {
    let int_params: HashSet<&str> = meta
        .parameters
        .iter()
        .filter(|(_, value)| value.is_int())
        .map(|(name, _)| name.as_str())
        .collect();

    let mut usage = LocalUsage::default();
    let mut seen = HashSet::new();
    scan_block(block, &int_params, &mut usage, &mut seen);
    usage
}

fn scan_block(
    block: &Block,
    int_params: &HashSet<&str>,
    usage: &mut LocalUsage,
    seen: &mut HashSet<String>,
) {
    for stmt in block {
        match stmt {
            Stmt::Assign(assign) => {
                if seen.contains(&assign.name) {
                    usage.mutable.insert(assign.name.clone());
                } else {
                    seen.insert(assign.name.clone());
                }
                if is_string_value(&assign.value, usage) {
                    usage.strings.insert(assign.name.clone());
                }
            }
            Stmt::Unwrap(unwrap) => {
                if seen.contains(&unwrap.name) {
                    usage.mutable.insert(unwrap.name.clone());
                } else {
                    seen.insert(unwrap.name.clone());
                }
            }
            Stmt::AugAssign(aug) => {
                usage.mutable.insert(aug.name.clone());
            }
            Stmt::If(if_stmt) => {
                note_int_comparison(&if_stmt.test, int_params, usage);
                scan_block(&if_stmt.body, int_params, usage, seen);
                scan_block(&if_stmt.orelse, int_params, usage, seen);
            }
            Stmt::For(for_stmt) => {
                scan_block(&for_stmt.body, int_params, usage, seen);
            }
            Stmt::Expr(expr_stmt) => {
                note_int_comparison(&expr_stmt.value, int_params, usage);
                if let Expr::Call(call) = &expr_stmt.value {
                    note_mutating_call(call, usage);
                }
            }
            _ => {}
        }
    }
}

/// `signals.append(...)` and friends make the receiver mutable.
fn note_mutating_call(call: &ExprCall, usage: &mut LocalUsage) {
    if let Expr::Attribute(attr) = call.func.as_ref() {
        if MUTATING_METHODS.contains(&attr.attr.as_str()) {
            if let Some(receiver) = attr.value.as_name() {
                usage.mutable.insert(receiver.to_string());
            }
        }
    }
}

/// A name compared against an integer parameter is itself an integer.
fn note_int_comparison(expr: &Expr, int_params: &HashSet<&str>, usage: &mut LocalUsage) {
    let Expr::Compare(cmp) = expr else {
        return;
    };
    if let (Some(left), Some(right)) = (cmp.left.as_name(), cmp.right.as_name()) {
        if int_params.contains(right) {
            usage.int_typed.insert(left.to_string());
        }
        if int_params.contains(left) {
            usage.int_typed.insert(right.to_string());
        }
    }
}

fn is_string_value(value: &Expr, usage: &LocalUsage) -> bool {
    match value {
        Expr::Constant(Constant::Str(_)) => true,
        Expr::Name(name) => usage.strings.contains(name),
        Expr::Attribute(attr) => {
            matches!(context::lookup(&attr.attr), Some(spec) if spec.returns == ReturnKind::Text)
        }
        Expr::Call(call) => match call.func.as_ref() {
            Expr::Attribute(attr) => STRING_METHODS.contains(&attr.attr.as_str()),
            _ => false,
        },
        _ => false,
    }
}
