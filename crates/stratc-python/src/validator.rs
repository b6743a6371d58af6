//! DSL conformance checks over the raw Python module.
//!
//! The validator walks the parsed statements before any lowering so it can
//! see constructs exactly as the author wrote them. Errors block strict
//! compilation; warnings ride along with the generated artifact. Every
//! finding carries a line number and, where there is a sensible rewrite,
//! a hint phrased in terms of the DSL.

use itertools::Itertools;
use rustpython_parser::ast::Ranged;

use stratc_core::diagnostics::Diagnostic;

use crate::frontend::{LineIndex, ParsedStrategy, PyExpr, PyStmt};

/// Builtins that have no translation. Strategy code runs against decimals
/// and explicit loops; the aggregate and iteration helpers do not map.
const UNSUPPORTED_BUILTINS: &[&str] = &[
    "min", "max", "abs", "sum", "len", "range", "enumerate", "zip", "map", "filter", "sorted",
    "reversed", "list", "dict", "set", "print", "input", "open", "eval", "exec",
];

/// Modules whose imports survive transpilation.
const ALLOWED_IMPORTS: &[&str] = &["decimal", "datetime", "stratkit"];

/// DSL submodules as they appear in relative from-imports.
const DSL_SUBMODULES: &[&str] = &["dsl", "signal", "context"];

pub fn validate(parsed: &ParsedStrategy) -> Vec<Diagnostic> {
    let mut walker = Walker {
        diagnostics: Vec::new(),
        lines: parsed.lines(),
        in_function: false,
    };
    walker.walk_block(parsed.suite());
    walker.diagnostics
}

struct Walker<'a> {
    diagnostics: Vec<Diagnostic>,
    lines: &'a LineIndex,
    in_function: bool,
}

impl Walker<'_> {
    fn error(&mut self, stmt_line: u32, message: String, hint: Option<&str>) {
        let mut diag = Diagnostic::error(message).with_line(stmt_line);
        if let Some(hint) = hint {
            diag = diag.with_hint(hint);
        }
        self.diagnostics.push(diag);
    }

    fn warning(&mut self, stmt_line: u32, message: String) {
        self.diagnostics
            .push(Diagnostic::warning(message).with_line(stmt_line));
    }

    fn walk_block(&mut self, stmts: &[PyStmt]) {
        for stmt in stmts {
            self.walk_stmt(stmt);
        }
    }

    fn walk_stmt(&mut self, stmt: &PyStmt) {
        let line = self.lines.line_of(stmt.start());
        match stmt {
            PyStmt::FunctionDef(def) => {
                if self.in_function {
                    self.error(
                        line,
                        format!("Nested function '{}' is not supported", def.name),
                        Some("Inline the helper logic into the strategy body"),
                    );
                    return;
                }
                self.in_function = true;
                self.walk_block(&def.body);
                self.in_function = false;
            }
            PyStmt::AsyncFunctionDef(def) => {
                self.error(
                    line,
                    format!("Async function '{}' is not supported", def.name),
                    Some("Strategies are synchronous; drop the async qualifier"),
                );
            }
            PyStmt::ClassDef(def) => {
                self.error(
                    line,
                    format!("Class definition '{}' is not supported", def.name),
                    Some("Strategies are single functions; keep data in locals and params"),
                );
            }
            PyStmt::Global(global) => {
                let names = global.names.iter().map(|n| n.as_str()).join(", ");
                self.error(
                    line,
                    format!("Global state is not supported: {names}"),
                    Some("Persistent state does not translate; mark the strategy transpilable=False"),
                );
            }
            PyStmt::Nonlocal(nonlocal) => {
                let names = nonlocal.names.iter().map(|n| n.as_str()).join(", ");
                self.error(
                    line,
                    format!("Nonlocal state is not supported: {names}"),
                    Some("Persistent state does not translate; mark the strategy transpilable=False"),
                );
            }
            PyStmt::Import(import) => {
                for alias in &import.names {
                    self.check_import(line, alias.name.as_str(), false);
                }
            }
            PyStmt::ImportFrom(import) => {
                if let Some(module) = &import.module {
                    self.check_import(line, module.as_str(), true);
                }
            }
            PyStmt::With(_) | PyStmt::AsyncWith(_) => {
                self.error(
                    line,
                    "with blocks are not supported".to_string(),
                    Some("Strategies hold no resources; remove the context manager"),
                );
            }
            PyStmt::Try(_) | PyStmt::TryStar(_) => {
                self.error(
                    line,
                    "try/except is not supported".to_string(),
                    Some("Guard with explicit condition checks instead of exceptions"),
                );
            }
            PyStmt::Raise(_) => {
                self.error(
                    line,
                    "raise is not supported".to_string(),
                    Some("Return Shutdown(reason=...) to stop the engine deliberately"),
                );
            }
            PyStmt::Match(_) => {
                self.error(
                    line,
                    "match statements are not supported".to_string(),
                    Some("Use if/elif chains"),
                );
            }
            PyStmt::Assert(assert_stmt) => {
                self.warning(
                    line,
                    "Assert statements are ignored in generated code".to_string(),
                );
                self.walk_expr(&assert_stmt.test);
            }
            PyStmt::Assign(assign) => {
                for target in &assign.targets {
                    self.walk_expr(target);
                }
                self.walk_expr(&assign.value);
            }
            PyStmt::AnnAssign(ann) => {
                self.walk_expr(&ann.target);
                if let Some(value) = &ann.value {
                    self.walk_expr(value);
                }
            }
            PyStmt::AugAssign(aug) => {
                self.walk_expr(&aug.target);
                self.walk_expr(&aug.value);
            }
            PyStmt::If(if_stmt) => {
                self.walk_expr(&if_stmt.test);
                self.walk_block(&if_stmt.body);
                self.walk_block(&if_stmt.orelse);
            }
            PyStmt::While(while_stmt) => {
                self.walk_expr(&while_stmt.test);
                self.walk_block(&while_stmt.body);
                self.walk_block(&while_stmt.orelse);
            }
            PyStmt::For(for_stmt) => {
                self.walk_expr(&for_stmt.iter);
                self.walk_block(&for_stmt.body);
                self.walk_block(&for_stmt.orelse);
            }
            PyStmt::Return(ret) => {
                if let Some(value) = &ret.value {
                    self.walk_expr(value);
                }
            }
            PyStmt::Expr(expr_stmt) => self.walk_expr(&expr_stmt.value),
            _ => {}
        }
    }

    fn check_import(&mut self, line: u32, module: &str, from_import: bool) {
        let root = module.split('.').next().unwrap_or(module);
        let allowed = ALLOWED_IMPORTS.contains(&root)
            || (from_import && DSL_SUBMODULES.contains(&root));
        if !allowed {
            self.diagnostics.push(
                Diagnostic::warning(format!(
                    "Import of '{module}' may not be available in generated code"
                ))
                .with_line(line)
                .with_hint("Only 'decimal', 'datetime', and 'stratkit' imports are fully supported"),
            );
        }
    }

    fn walk_expr(&mut self, expr: &PyExpr) {
        let line = self.lines.line_of(expr.start());
        match expr {
            PyExpr::Call(call) => {
                if let PyExpr::Name(func) = call.func.as_ref() {
                    let name = func.id.as_str();
                    if UNSUPPORTED_BUILTINS.contains(&name) {
                        self.error(
                            line,
                            format!("Built-in function '{name}()' is not supported"),
                            Some(builtin_hint(name)),
                        );
                    }
                }
                for arg in &call.args {
                    if is_comprehension(arg) {
                        self.error(
                            line,
                            "Comprehensions as call arguments are not supported".to_string(),
                            Some("Materialize the list with a for loop and append first"),
                        );
                    }
                }
                self.walk_expr(&call.func);
                for arg in &call.args {
                    self.walk_expr(arg);
                }
                for keyword in &call.keywords {
                    self.walk_expr(&keyword.value);
                }
            }
            PyExpr::ListComp(_) => {
                self.error(
                    line,
                    "List comprehensions are not supported".to_string(),
                    Some("Build the list with an explicit for loop and append"),
                );
            }
            PyExpr::SetComp(_) | PyExpr::DictComp(_) => {
                self.error(
                    line,
                    "Set and dict comprehensions are not supported".to_string(),
                    Some("Build the collection with an explicit for loop"),
                );
            }
            PyExpr::GeneratorExp(_) => {
                self.error(
                    line,
                    "Generator expressions are not supported".to_string(),
                    Some("Build the list with an explicit for loop and append"),
                );
            }
            PyExpr::Lambda(_) => {
                self.error(
                    line,
                    "Lambda expressions are not supported".to_string(),
                    Some("Compute the value with a named local before use"),
                );
            }
            PyExpr::Yield(_) | PyExpr::YieldFrom(_) => {
                self.error(
                    line,
                    "Generators are not supported".to_string(),
                    Some("Collect signals into a list and return it"),
                );
            }
            PyExpr::Await(_) => {
                self.error(
                    line,
                    "await is not supported".to_string(),
                    Some("Strategies are synchronous"),
                );
            }
            PyExpr::BoolOp(bool_op) => {
                for value in &bool_op.values {
                    self.walk_expr(value);
                }
            }
            PyExpr::BinOp(bin) => {
                self.walk_expr(&bin.left);
                self.walk_expr(&bin.right);
            }
            PyExpr::UnaryOp(unary) => self.walk_expr(&unary.operand),
            PyExpr::Compare(compare) => {
                self.walk_expr(&compare.left);
                for comparator in &compare.comparators {
                    self.walk_expr(comparator);
                }
            }
            PyExpr::Attribute(attr) => self.walk_expr(&attr.value),
            PyExpr::Subscript(sub) => {
                self.walk_expr(&sub.value);
                self.walk_expr(&sub.slice);
            }
            PyExpr::List(list) => {
                for item in &list.elts {
                    self.walk_expr(item);
                }
            }
            PyExpr::Tuple(tuple) => {
                for item in &tuple.elts {
                    self.walk_expr(item);
                }
            }
            PyExpr::Dict(dict) => {
                for key in dict.keys.iter().flatten() {
                    self.walk_expr(key);
                }
                for value in &dict.values {
                    self.walk_expr(value);
                }
            }
            PyExpr::IfExp(if_exp) => {
                self.walk_expr(&if_exp.test);
                self.walk_expr(&if_exp.body);
                self.walk_expr(&if_exp.orelse);
            }
            PyExpr::NamedExpr(named) => {
                self.walk_expr(&named.target);
                self.walk_expr(&named.value);
            }
            PyExpr::Starred(starred) => self.walk_expr(&starred.value),
            _ => {}
        }
    }
}

fn is_comprehension(expr: &PyExpr) -> bool {
    matches!(
        expr,
        PyExpr::ListComp(_) | PyExpr::SetComp(_) | PyExpr::DictComp(_) | PyExpr::GeneratorExp(_)
    )
}

fn builtin_hint(name: &str) -> &'static str {
    match name {
        "min" => "Use an explicit comparison: a if a < b else b",
        "max" => "Use an explicit comparison: a if a > b else b",
        "abs" => "Use a conditional: x if x >= Decimal(\"0\") else -x",
        "sum" => "Accumulate in a for loop: total = total + item",
        "len" => "Track a count manually while building the list",
        "range" => "Iterate over the data directly instead of by index",
        "print" => "Remove debug output; the engine logs emitted signals",
        "sorted" => "Restructure to avoid ordering, or pre-sort outside the strategy",
        _ => "This builtin is not available in strategy code",
    }
}
