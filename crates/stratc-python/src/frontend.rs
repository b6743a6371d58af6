//! Python frontend backed by rustpython-parser.
//!
//! Parsing produces a [`ParsedStrategy`]: the raw module for the validator
//! to inspect, the decorator metadata already evaluated, and a lowering
//! into the restricted tree for the later passes. Lowering is total; any
//! construct outside the DSL becomes an `Unsupported` node and is left for
//! the validator to reject or the generator to stub out.

use std::collections::HashMap;
use std::path::Path;

use rust_decimal::Decimal;
use rustpython_parser::ast as py_ast;
use rustpython_parser::ast::Ranged;
use rustpython_parser::text_size::{TextRange, TextSize};
use rustpython_parser::Parse;

use stratc_core::ast::*;
use stratc_core::meta::{ParamValue, StrategyMetadata};
use stratc_core::{Error, Result};

use indexmap::IndexMap;

pub(crate) type PyStmt = py_ast::Stmt<TextRange>;
pub(crate) type PyExpr = py_ast::Expr<TextRange>;

pub(crate) type PyConstant = py_ast::Constant;

pub(crate) type PyOperator = py_ast::Operator;
pub(crate) type PyBoolOp = py_ast::BoolOp;
pub(crate) type PyUnaryOp = py_ast::UnaryOp;
pub(crate) type PyCmpOp = py_ast::CmpOp;

/// Maps parser byte offsets to 1-based line numbers for diagnostics.
#[derive(Debug)]
pub struct LineIndex {
    line_starts: Vec<u32>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (index, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(index as u32 + 1);
            }
        }
        Self { line_starts }
    }

    pub fn line_of(&self, offset: TextSize) -> u32 {
        let offset = u32::from(offset);
        self.line_starts
            .partition_point(|&start| start <= offset) as u32
    }
}

/// A parsed strategy module: raw statements plus evaluated metadata.
#[derive(Debug)]
pub struct ParsedStrategy {
    meta: StrategyMetadata,
    suite: Vec<PyStmt>,
    strategy_index: usize,
    lines: LineIndex,
}

impl ParsedStrategy {
    pub fn metadata(&self) -> &StrategyMetadata {
        &self.meta
    }

    pub(crate) fn suite(&self) -> &[PyStmt] {
        &self.suite
    }

    pub(crate) fn lines(&self) -> &LineIndex {
        &self.lines
    }

    /// Lowers the strategy function body into the restricted tree.
    pub fn lower(&self) -> Block {
        match &self.suite[self.strategy_index] {
            PyStmt::FunctionDef(def) => lower_block(&def.body, &self.lines),
            _ => Vec::new(),
        }
    }
}

pub struct PythonFrontend;

impl PythonFrontend {
    /// Parses one strategy source file. Syntax errors and a missing or
    /// malformed decorator surface here; DSL violations do not, those are
    /// the validator's business.
    pub fn parse(source: &str, path: Option<&Path>) -> Result<ParsedStrategy> {
        let source_path = path.and_then(|p| p.to_str()).unwrap_or("<strategy>");
        let suite: py_ast::Suite = py_ast::Suite::parse(source, source_path)
            .map_err(|err| Error::Parse(err.to_string()))?;
        let lines = LineIndex::new(source);
        let (strategy_index, meta) = extract_metadata(&suite)?;
        Ok(ParsedStrategy {
            meta,
            suite,
            strategy_index,
            lines,
        })
    }
}

fn extract_metadata(suite: &[PyStmt]) -> Result<(usize, StrategyMetadata)> {
    let env = module_constants(suite);
    for (index, stmt) in suite.iter().enumerate() {
        let PyStmt::FunctionDef(def) = stmt else {
            continue;
        };
        for decorator in &def.decorator_list {
            let PyExpr::Call(call) = decorator else {
                continue;
            };
            if !is_strategy_decorator(&call.func) {
                continue;
            }
            let meta = metadata_from_decorator(call, &env)?;
            return Ok((index, meta));
        }
    }
    Err(Error::Metadata(
        "no @strategy-decorated function found".to_string(),
    ))
}

fn is_strategy_decorator(func: &PyExpr) -> bool {
    match func {
        PyExpr::Name(name) => name.id.as_str() == "strategy",
        PyExpr::Attribute(attr) => attr.attr.as_str() == "strategy",
        _ => false,
    }
}

/// Module-level `NAME = <literal>` bindings, in order. The decorator may
/// reference these instead of inlining every value.
fn module_constants(suite: &[PyStmt]) -> HashMap<String, ParamValue> {
    let mut env = HashMap::new();
    for stmt in suite {
        let PyStmt::Assign(assign) = stmt else {
            continue;
        };
        let [PyExpr::Name(target)] = assign.targets.as_slice() else {
            continue;
        };
        if let Some(value) = eval_literal(&assign.value, &env) {
            env.insert(target.id.as_str().to_string(), value);
        }
    }
    env
}

fn metadata_from_decorator(
    call: &py_ast::ExprCall<TextRange>,
    env: &HashMap<String, ParamValue>,
) -> Result<StrategyMetadata> {
    let mut name = None;
    let mut subscriptions = Vec::new();
    let mut tick_interval_ms = None;
    let mut parameters = IndexMap::new();
    let mut transpilable = true;

    for (position, arg) in call.args.iter().enumerate() {
        match position {
            0 => name = Some(expect_str(arg, env, "name")?),
            1 => subscriptions = expect_token_list(arg, env)?,
            2 => tick_interval_ms = Some(expect_interval(arg, env)?),
            _ => {
                return Err(Error::Metadata(
                    "too many positional arguments in @strategy".to_string(),
                ))
            }
        }
    }

    for keyword in &call.keywords {
        let Some(key) = keyword.arg.as_ref() else {
            return Err(Error::Metadata(
                "**kwargs is not supported in @strategy".to_string(),
            ));
        };
        match key.as_str() {
            "name" => name = Some(expect_str(&keyword.value, env, "name")?),
            "tokens" => subscriptions = expect_token_list(&keyword.value, env)?,
            "tick_interval_ms" => {
                tick_interval_ms = Some(expect_interval(&keyword.value, env)?)
            }
            "params" => parameters = expect_params(&keyword.value, env)?,
            "transpilable" => {
                let Some(ParamValue::Bool(flag)) = eval_literal(&keyword.value, env) else {
                    return Err(Error::Metadata(
                        "'transpilable' must be a boolean literal".to_string(),
                    ));
                };
                transpilable = flag;
            }
            other => {
                return Err(Error::Metadata(format!(
                    "unknown @strategy argument '{other}'"
                )))
            }
        }
    }

    let name = name.ok_or_else(|| {
        Error::Metadata("@strategy requires a 'name' argument".to_string())
    })?;

    Ok(StrategyMetadata {
        name,
        subscriptions,
        tick_interval_ms,
        parameters,
        transpilable,
    })
}

fn expect_str(
    expr: &PyExpr,
    env: &HashMap<String, ParamValue>,
    what: &str,
) -> Result<String> {
    match eval_literal(expr, env) {
        Some(ParamValue::Str(value)) => Ok(value),
        _ => Err(Error::Metadata(format!(
            "'{what}' must be a string literal"
        ))),
    }
}

fn expect_token_list(expr: &PyExpr, env: &HashMap<String, ParamValue>) -> Result<Vec<String>> {
    let Some(ParamValue::List(items)) = eval_literal(expr, env) else {
        return Err(Error::Metadata(
            "'tokens' must be a list of string literals".to_string(),
        ));
    };
    items
        .into_iter()
        .map(|item| match item {
            ParamValue::Str(token) => Ok(token),
            _ => Err(Error::Metadata(
                "'tokens' must be a list of string literals".to_string(),
            )),
        })
        .collect()
}

fn expect_interval(expr: &PyExpr, env: &HashMap<String, ParamValue>) -> Result<u64> {
    match eval_literal(expr, env) {
        Some(ParamValue::Int(ms)) if ms >= 0 => Ok(ms as u64),
        _ => Err(Error::Metadata(
            "'tick_interval_ms' must be a non-negative integer".to_string(),
        )),
    }
}

fn expect_params(
    expr: &PyExpr,
    env: &HashMap<String, ParamValue>,
) -> Result<IndexMap<String, ParamValue>> {
    let PyExpr::Dict(dict) = expr else {
        return Err(Error::Metadata(
            "'params' must be a dict literal".to_string(),
        ));
    };
    let mut parameters = IndexMap::new();
    for (key, value) in dict.keys.iter().zip(&dict.values) {
        let Some(PyExpr::Constant(constant)) = key.as_ref() else {
            return Err(Error::Metadata(
                "param names must be string literals".to_string(),
            ));
        };
        let PyConstant::Str(param_name) = &constant.value else {
            return Err(Error::Metadata(
                "param names must be string literals".to_string(),
            ));
        };
        let Some(param_value) = eval_literal(value, env) else {
            return Err(Error::Metadata(format!(
                "param '{param_name}' has a non-literal value"
            )));
        };
        parameters.insert(param_name.to_string(), param_value);
    }
    Ok(parameters)
}

/// Evaluates the literal subset that may appear in decorator arguments:
/// constants, `Decimal("...")` calls, negation, lists of the above, and
/// names bound to such literals at module level.
fn eval_literal(expr: &PyExpr, env: &HashMap<String, ParamValue>) -> Option<ParamValue> {
    match expr {
        PyExpr::Constant(constant) => match &constant.value {
            PyConstant::Bool(value) => Some(ParamValue::Bool(*value)),
            PyConstant::Int(value) => value.to_string().parse::<i64>().ok().map(ParamValue::Int),
            PyConstant::Float(value) => Some(ParamValue::Float(*value)),
            PyConstant::Str(value) => Some(ParamValue::Str(value.to_string())),
            _ => None,
        },
        PyExpr::Name(name) => env.get(name.id.as_str()).cloned(),
        PyExpr::Call(call) => {
            let PyExpr::Name(func) = call.func.as_ref() else {
                return None;
            };
            if func.id.as_str() != "Decimal" || call.args.len() != 1 {
                return None;
            }
            let PyExpr::Constant(arg) = &call.args[0] else {
                return None;
            };
            match &arg.value {
                PyConstant::Str(text) => {
                    Decimal::from_str_exact(text).ok().map(ParamValue::Decimal)
                }
                PyConstant::Int(value) => value
                    .to_string()
                    .parse::<i64>()
                    .ok()
                    .map(|i| ParamValue::Decimal(Decimal::from(i))),
                _ => None,
            }
        }
        PyExpr::UnaryOp(unary) if matches!(unary.op, PyUnaryOp::USub) => {
            match eval_literal(&unary.operand, env)? {
                ParamValue::Int(i) => Some(ParamValue::Int(-i)),
                ParamValue::Float(f) => Some(ParamValue::Float(-f)),
                ParamValue::Decimal(d) => Some(ParamValue::Decimal(-d)),
                _ => None,
            }
        }
        PyExpr::List(list) => list
            .elts
            .iter()
            .map(|item| eval_literal(item, env))
            .collect::<Option<Vec<_>>>()
            .map(ParamValue::List),
        _ => None,
    }
}

fn lower_block(stmts: &[PyStmt], lines: &LineIndex) -> Block {
    stmts.iter().map(|stmt| lower_stmt(stmt, lines)).collect()
}

fn lower_stmt(stmt: &PyStmt, lines: &LineIndex) -> Stmt {
    let line = lines.line_of(stmt.start());
    match stmt {
        PyStmt::Assign(assign) => {
            let [PyExpr::Name(target)] = assign.targets.as_slice() else {
                return Stmt::Unsupported {
                    summary: "assignment target pattern".to_string(),
                    line,
                };
            };
            Stmt::Assign(StmtAssign {
                name: target.id.as_str().to_string(),
                value: lower_expr(&assign.value),
                line,
            })
        }
        PyStmt::AnnAssign(ann) => {
            let PyExpr::Name(target) = ann.target.as_ref() else {
                return Stmt::Unsupported {
                    summary: "annotated assignment target".to_string(),
                    line,
                };
            };
            match &ann.value {
                Some(value) => Stmt::Assign(StmtAssign {
                    name: target.id.as_str().to_string(),
                    value: lower_expr(value),
                    line,
                }),
                None => Stmt::Unsupported {
                    summary: "declaration without initializer".to_string(),
                    line,
                },
            }
        }
        PyStmt::AugAssign(aug) => {
            let PyExpr::Name(target) = aug.target.as_ref() else {
                return Stmt::Unsupported {
                    summary: "augmented assignment target".to_string(),
                    line,
                };
            };
            match lower_operator(&aug.op) {
                Some(op) => Stmt::AugAssign(StmtAugAssign {
                    name: target.id.as_str().to_string(),
                    op,
                    value: lower_expr(&aug.value),
                    line,
                }),
                None => Stmt::Unsupported {
                    summary: format!("augmented operator {:?}", aug.op),
                    line,
                },
            }
        }
        PyStmt::If(if_stmt) => Stmt::If(StmtIf {
            test: lower_expr(&if_stmt.test),
            body: lower_block(&if_stmt.body, lines),
            orelse: lower_block(&if_stmt.orelse, lines),
            line,
        }),
        PyStmt::For(for_stmt) => {
            if !for_stmt.orelse.is_empty() {
                return Stmt::Unsupported {
                    summary: "for-else".to_string(),
                    line,
                };
            }
            let target = match for_stmt.target.as_ref() {
                PyExpr::Name(name) => ForTarget::Name(name.id.as_str().to_string()),
                PyExpr::Tuple(tuple) => match tuple.elts.as_slice() {
                    [PyExpr::Name(key), PyExpr::Name(value)] => ForTarget::KeyValue(
                        key.id.as_str().to_string(),
                        value.id.as_str().to_string(),
                    ),
                    _ => {
                        return Stmt::Unsupported {
                            summary: "loop target pattern".to_string(),
                            line,
                        }
                    }
                },
                _ => {
                    return Stmt::Unsupported {
                        summary: "loop target pattern".to_string(),
                        line,
                    }
                }
            };
            Stmt::For(StmtFor {
                target,
                iter: lower_expr(&for_stmt.iter),
                body: lower_block(&for_stmt.body, lines),
                line,
            })
        }
        PyStmt::Return(ret) => Stmt::Return(StmtReturn {
            value: match &ret.value {
                Some(value) => Some(lower_expr(value)),
                None => None,
            },
            line,
        }),
        PyStmt::Break(_) => Stmt::Break { line },
        PyStmt::Continue(_) => Stmt::Continue { line },
        PyStmt::Expr(expr_stmt) => Stmt::Expr(StmtExpr {
            value: lower_expr(&expr_stmt.value),
            line,
        }),
        other => Stmt::Unsupported {
            summary: stmt_summary(other).to_string(),
            line,
        },
    }
}

fn stmt_summary(stmt: &PyStmt) -> &'static str {
    match stmt {
        PyStmt::While(_) => "while loop",
        PyStmt::With(_) | PyStmt::AsyncWith(_) => "with block",
        PyStmt::Try(_) | PyStmt::TryStar(_) => "try block",
        PyStmt::Raise(_) => "raise",
        PyStmt::FunctionDef(_) | PyStmt::AsyncFunctionDef(_) => "function definition",
        PyStmt::ClassDef(_) => "class definition",
        PyStmt::Import(_) | PyStmt::ImportFrom(_) => "import",
        PyStmt::Global(_) => "global declaration",
        PyStmt::Nonlocal(_) => "nonlocal declaration",
        PyStmt::Delete(_) => "del statement",
        PyStmt::Assert(_) => "assert",
        PyStmt::Match(_) => "match statement",
        PyStmt::AsyncFor(_) => "async for",
        PyStmt::Pass(_) => "pass statement",
        _ => "statement",
    }
}

fn lower_expr(expr: &PyExpr) -> Expr {
    match expr {
        PyExpr::Name(name) => Expr::Name(name.id.as_str().to_string()),
        PyExpr::Constant(constant) => lower_constant(&constant.value),
        PyExpr::Attribute(attr) => Expr::Attribute(ExprAttribute {
            value: Box::new(lower_expr(&attr.value)),
            attr: attr.attr.as_str().to_string(),
        }),
        PyExpr::Subscript(sub) => Expr::Subscript(ExprSubscript {
            value: Box::new(lower_expr(&sub.value)),
            index: Box::new(lower_expr(&sub.slice)),
        }),
        PyExpr::Call(call) => lower_call(call),
        PyExpr::Compare(compare) => lower_compare(compare),
        PyExpr::BoolOp(bool_op) => Expr::BoolOp(ExprBoolOp {
            op: match bool_op.op {
                PyBoolOp::And => BoolOpKind::And,
                PyBoolOp::Or => BoolOpKind::Or,
            },
            values: bool_op.values.iter().map(lower_expr).collect(),
        }),
        PyExpr::BinOp(bin) => match lower_operator(&bin.op) {
            Some(op) => Expr::Binary(ExprBinary {
                left: Box::new(lower_expr(&bin.left)),
                op,
                right: Box::new(lower_expr(&bin.right)),
            }),
            None => Expr::Unsupported {
                summary: format!("operator {:?}", bin.op),
            },
        },
        PyExpr::UnaryOp(unary) => match unary.op {
            PyUnaryOp::Not => Expr::Unary(ExprUnary {
                op: UnaryOpKind::Not,
                operand: Box::new(lower_expr(&unary.operand)),
            }),
            PyUnaryOp::USub => Expr::Unary(ExprUnary {
                op: UnaryOpKind::Neg,
                operand: Box::new(lower_expr(&unary.operand)),
            }),
            PyUnaryOp::UAdd => lower_expr(&unary.operand),
            PyUnaryOp::Invert => Expr::Unsupported {
                summary: "bitwise not".to_string(),
            },
        },
        PyExpr::List(list) => Expr::List(list.elts.iter().map(lower_expr).collect()),
        PyExpr::IfExp(if_exp) => Expr::IfExp(ExprIfExp {
            test: Box::new(lower_expr(&if_exp.test)),
            body: Box::new(lower_expr(&if_exp.body)),
            orelse: Box::new(lower_expr(&if_exp.orelse)),
        }),
        other => Expr::Unsupported {
            summary: expr_summary(other).to_string(),
        },
    }
}

fn expr_summary(expr: &PyExpr) -> &'static str {
    match expr {
        PyExpr::Tuple(_) => "tuple literal",
        PyExpr::Dict(_) => "dict literal",
        PyExpr::Set(_) => "set literal",
        PyExpr::JoinedStr(_) => "f-string",
        PyExpr::Lambda(_) => "lambda",
        PyExpr::ListComp(_) | PyExpr::SetComp(_) | PyExpr::DictComp(_)
        | PyExpr::GeneratorExp(_) => "comprehension",
        PyExpr::Yield(_) | PyExpr::YieldFrom(_) => "yield",
        PyExpr::NamedExpr(_) => "walrus assignment",
        PyExpr::Starred(_) => "starred expression",
        PyExpr::Slice(_) => "slice",
        PyExpr::Await(_) => "await",
        _ => "expression",
    }
}

fn lower_constant(constant: &PyConstant) -> Expr {
    match constant {
        PyConstant::None => Expr::Constant(Constant::None),
        PyConstant::Bool(value) => Expr::Constant(Constant::Bool(*value)),
        PyConstant::Str(value) => Expr::Constant(Constant::Str(value.to_string())),
        PyConstant::Int(value) => match value.to_string().parse::<i64>() {
            Ok(i) => Expr::Constant(Constant::Int(i)),
            Err(_) => Expr::Unsupported {
                summary: "integer literal out of range".to_string(),
            },
        },
        PyConstant::Float(value) => Expr::Constant(Constant::Float(*value)),
        _ => Expr::Unsupported {
            summary: "constant literal".to_string(),
        },
    }
}

fn lower_call(call: &py_ast::ExprCall<TextRange>) -> Expr {
    let mut keywords = Vec::new();
    for keyword in &call.keywords {
        match keyword.arg.as_ref() {
            Some(name) => keywords.push(Keyword {
                name: name.as_str().to_string(),
                value: lower_expr(&keyword.value),
            }),
            None => {
                return Expr::Unsupported {
                    summary: "keyword splat argument".to_string(),
                }
            }
        }
    }
    Expr::Call(ExprCall {
        func: Box::new(lower_expr(&call.func)),
        args: call.args.iter().map(lower_expr).collect(),
        keywords,
    })
}

fn lower_compare(compare: &py_ast::ExprCompare<TextRange>) -> Expr {
    if compare.ops.len() != 1 || compare.comparators.len() != 1 {
        return Expr::Unsupported {
            summary: "chained comparison".to_string(),
        };
    }
    let op = match &compare.ops[0] {
        PyCmpOp::Eq => CmpOp::Eq,
        PyCmpOp::NotEq => CmpOp::NotEq,
        PyCmpOp::Lt => CmpOp::Lt,
        PyCmpOp::LtE => CmpOp::LtE,
        PyCmpOp::Gt => CmpOp::Gt,
        PyCmpOp::GtE => CmpOp::GtE,
        PyCmpOp::Is => CmpOp::Is,
        PyCmpOp::IsNot => CmpOp::IsNot,
        PyCmpOp::In => CmpOp::In,
        PyCmpOp::NotIn => CmpOp::NotIn,
    };
    Expr::Compare(ExprCompare {
        left: Box::new(lower_expr(&compare.left)),
        op,
        right: Box::new(lower_expr(&compare.comparators[0])),
    })
}

fn lower_operator(op: &PyOperator) -> Option<BinOp> {
    match op {
        PyOperator::Add => Some(BinOp::Add),
        PyOperator::Sub => Some(BinOp::Sub),
        PyOperator::Mult => Some(BinOp::Mul),
        PyOperator::Div => Some(BinOp::Div),
        PyOperator::Mod => Some(BinOp::Mod),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    const SOURCE: &str = r#"
from decimal import Decimal
from stratkit import strategy, Buy, Hold, Urgency

MIN_EDGE = Decimal("0.05")


@strategy(
    name="edge_taker",
    tokens=["123456"],
    tick_interval_ms=500,
    params={
        "MIN_EDGE": MIN_EDGE,
        "ORDER_SIZE": Decimal("50"),
        "MAX_TOKENS": 10,
        "AGGRESSIVE": False,
    },
)
def on_tick(ctx):
    signals = []
    book = ctx.book("123456")
    if book is None:
        return signals
    return signals
"#;

    #[test]
    fn test_metadata_extraction() {
        let parsed = PythonFrontend::parse(SOURCE, None).unwrap();
        let meta = parsed.metadata();

        assert_eq!(meta.name, "edge_taker");
        assert_eq!(meta.subscriptions, vec!["123456".to_string()]);
        assert_eq!(meta.tick_interval_ms, Some(500));
        assert!(meta.transpilable);
        assert_eq!(meta.struct_name(), "EdgeTaker");

        let params: Vec<&String> = meta.parameters.keys().collect();
        assert_eq!(params, vec!["MIN_EDGE", "ORDER_SIZE", "MAX_TOKENS", "AGGRESSIVE"]);
        assert_eq!(
            meta.parameters["MIN_EDGE"],
            ParamValue::Decimal(dec!(0.05))
        );
        assert_eq!(meta.parameters["MAX_TOKENS"], ParamValue::Int(10));
        assert_eq!(meta.parameters["AGGRESSIVE"], ParamValue::Bool(false));
    }

    #[test]
    fn test_missing_decorator_is_metadata_error() {
        let err = PythonFrontend::parse("def on_tick(ctx):\n    return []\n", None).unwrap_err();
        assert!(matches!(err, Error::Metadata(_)));
    }

    #[test]
    fn test_syntax_error_is_parse_error() {
        let err = PythonFrontend::parse("def on_tick(ctx:\n", None).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_transpilable_flag() {
        let source = r#"
@strategy(name="manual", tokens=[], transpilable=False)
def on_tick(ctx):
    return []
"#;
        let parsed = PythonFrontend::parse(source, None).unwrap();
        assert!(!parsed.metadata().transpilable);
        assert!(parsed.metadata().is_dynamic_discovery());
    }

    #[test]
    fn test_lowered_body_shapes_and_lines() {
        let parsed = PythonFrontend::parse(SOURCE, None).unwrap();
        let body = parsed.lower();

        assert_eq!(body.len(), 4);
        assert!(matches!(&body[0], Stmt::Assign(a) if a.name == "signals"));
        assert!(matches!(&body[1], Stmt::Assign(a) if a.name == "book"));
        assert!(matches!(&body[2], Stmt::If(_)));
        assert!(matches!(&body[3], Stmt::Return(_)));
        // `signals = []` sits on line 20 of the source above
        assert_eq!(body[0].line(), 20);
    }

    #[test]
    fn test_markets_loop_lowering() {
        let source = r#"
@strategy(name="scan", tokens=[])
def on_tick(ctx):
    for token_id, market in ctx.markets.items():
        continue
    return []
"#;
        let parsed = PythonFrontend::parse(source, None).unwrap();
        let body = parsed.lower();
        let Stmt::For(for_stmt) = &body[0] else {
            panic!("expected for loop");
        };
        assert_eq!(
            for_stmt.target,
            ForTarget::KeyValue("token_id".to_string(), "market".to_string())
        );
        assert!(matches!(&for_stmt.body[0], Stmt::Continue { .. }));
    }

    #[test]
    fn test_unsupported_constructs_lower_to_placeholders() {
        let source = r#"
@strategy(name="odd", tokens=[])
def on_tick(ctx):
    while True:
        pass
    x = 1 if 0 < 1 < 2 else 2
    y = a // b
    return []
"#;
        let parsed = PythonFrontend::parse(source, None).unwrap();
        let body = parsed.lower();

        assert!(matches!(&body[0], Stmt::Unsupported { summary, .. } if summary == "while loop"));
        let Stmt::Assign(x) = &body[1] else {
            panic!("expected assignment");
        };
        let Expr::IfExp(if_exp) = &x.value else {
            panic!("expected conditional expression");
        };
        assert!(matches!(
            if_exp.test.as_ref(),
            Expr::Unsupported { summary } if summary == "chained comparison"
        ));
        let Stmt::Assign(y) = &body[2] else {
            panic!("expected assignment");
        };
        assert!(matches!(&y.value, Expr::Unsupported { .. }));
    }

    #[test]
    fn test_negative_and_listed_params() {
        let source = r#"
@strategy(name="skewed", tokens=["1"], params={"SKEW": -3, "BANDS": [Decimal("0.1"), Decimal("0.2")]})
def on_tick(ctx):
    return []
"#;
        let parsed = PythonFrontend::parse(source, None).unwrap();
        let meta = parsed.metadata();
        assert_eq!(meta.parameters["SKEW"], ParamValue::Int(-3));
        assert_eq!(
            meta.parameters["BANDS"],
            ParamValue::List(vec![
                ParamValue::Decimal(dec!(0.1)),
                ParamValue::Decimal(dec!(0.2)),
            ])
        );
    }
}
