//! Emits the Rust strategy module for one lowered strategy body.
//!
//! The generator is a plain tree walk that builds source text. It assumes
//! the guard folding pass has already run and that local usage facts are
//! precomputed; its own only state is the set of names already declared,
//! which decides `let` versus plain assignment.

use itertools::Itertools;
use std::collections::HashSet;

use stratc_core::ast::*;
use stratc_core::context::{self, ReturnKind};
use stratc_core::meta::{to_pascal_case, StrategyMetadata};
use stratc_core::passes::LocalUsage;

use crate::params;

pub struct RustGenerator<'a> {
    meta: &'a StrategyMetadata,
    usage: &'a LocalUsage,
    declared: HashSet<String>,
    indent: usize,
}

impl<'a> RustGenerator<'a> {
    pub fn new(meta: &'a StrategyMetadata, usage: &'a LocalUsage) -> Self {
        Self {
            meta,
            usage,
            declared: HashSet::new(),
            indent: 0,
        }
    }

    /// Renders the complete strategy module around the tick body.
    pub fn generate(mut self, body: &Block) -> String {
        let struct_name = self.meta.struct_name();
        let name = &self.meta.name;

        let tokens = if self.meta.subscriptions.is_empty() {
            "vec![]".to_string()
        } else {
            format!(
                "vec![{}]",
                self.meta
                    .subscriptions
                    .iter()
                    .map(|token| format!("\"{token}\".to_string()"))
                    .join(", ")
            )
        };

        let mut out = String::new();
        out.push_str(&format!(
            "//! Auto-generated from Python strategy: {name}\n//! DO NOT EDIT - regenerate with `stratc compile`\n\n"
        ));
        out.push_str(
            "use crate::strategy::{Signal, Strategy, StrategyContext, Urgency};\n\
             use crate::position::Fill;\n\
             #[allow(unused_imports)]\n\
             use rust_decimal::Decimal;\n\
             use rust_decimal_macros::dec;\n\n",
        );
        out.push_str(&self.constants());
        out.push_str(&format!(
            "pub struct {struct_name} {{\n    id: String,\n    tokens: Vec<String>,\n}}\n\n"
        ));
        out.push_str(&format!(
            "impl {struct_name} {{\n    pub fn new() -> Self {{\n        Self {{\n            id: \"{name}\".to_string(),\n            tokens: {tokens},\n        }}\n    }}\n}}\n\n"
        ));
        out.push_str(&format!(
            "impl Default for {struct_name} {{\n    fn default() -> Self {{\n        Self::new()\n    }}\n}}\n\n"
        ));
        out.push_str(&format!("impl Strategy for {struct_name} {{\n"));
        out.push_str("    fn id(&self) -> &str {\n        &self.id\n    }\n\n");
        out.push_str(
            "    fn subscriptions(&self) -> Vec<String> {\n        self.tokens.clone()\n    }\n\n",
        );
        out.push_str("    fn on_tick(&mut self, ctx: &StrategyContext) -> Vec<Signal> {\n");
        self.indent = 2;
        out.push_str(&self.block(body));
        out.push_str("    }\n\n");
        out.push_str("    fn on_fill(&mut self, _fill: &Fill) {}\n\n");
        out.push_str("    fn on_shutdown(&mut self) {}\n}\n");
        out
    }

    fn constants(&self) -> String {
        if self.meta.parameters.is_empty() {
            return String::new();
        }
        let mut out = String::from("// Strategy parameters (generated from Python params)\n");
        for (name, value) in &self.meta.parameters {
            let (ty, literal) = params::param_to_rust(value);
            out.push_str(&format!("const {name}: {ty} = {literal};\n"));
        }
        out.push('\n');
        out
    }

    fn pad(&self) -> String {
        "    ".repeat(self.indent)
    }

    fn block(&mut self, stmts: &Block) -> String {
        let mut out = String::new();
        for stmt in stmts {
            // docstrings and other bare literals have no Rust counterpart
            if let Stmt::Expr(expr_stmt) = stmt {
                if matches!(expr_stmt.value, Expr::Constant(_)) {
                    continue;
                }
            }
            out.push_str(&self.stmt(stmt));
            out.push('\n');
        }
        out
    }

    fn stmt(&mut self, stmt: &Stmt) -> String {
        match stmt {
            Stmt::Assign(assign) => self.assign(assign),
            Stmt::AugAssign(aug) => self.aug_assign(aug),
            Stmt::Unwrap(unwrap) => self.unwrap_stmt(unwrap),
            Stmt::If(if_stmt) => self.if_stmt(if_stmt),
            Stmt::For(for_stmt) => self.for_stmt(for_stmt),
            Stmt::Return(ret) => self.return_stmt(ret),
            Stmt::Break { .. } => format!("{}break;", self.pad()),
            Stmt::Continue { .. } => format!("{}continue;", self.pad()),
            Stmt::Expr(expr_stmt) => format!("{}{};", self.pad(), self.expr(&expr_stmt.value)),
            Stmt::Unsupported { summary, .. } => {
                format!("{}// TODO: unsupported statement: {}", self.pad(), summary)
            }
        }
    }

    fn assign(&mut self, assign: &StmtAssign) -> String {
        let value = if self.usage.is_int(&assign.name) {
            self.int_expr(&assign.value)
        } else {
            self.expr(&assign.value)
        };
        if self.declared.contains(&assign.name) {
            format!("{}{} = {};", self.pad(), assign.name, value)
        } else {
            self.declared.insert(assign.name.clone());
            let mutability = if self.usage.is_mutable(&assign.name) {
                "mut "
            } else {
                ""
            };
            format!("{}let {}{} = {};", self.pad(), mutability, assign.name, value)
        }
    }

    fn aug_assign(&mut self, aug: &StmtAugAssign) -> String {
        let value = if self.usage.is_int(&aug.name) {
            self.int_expr(&aug.value)
        } else {
            self.expr(&aug.value)
        };
        format!("{}{} {}= {};", self.pad(), aug.name, aug.op, value)
    }

    fn unwrap_stmt(&mut self, unwrap: &ConditionalUnwrap) -> String {
        let source = self.expr(&unwrap.source);
        let binding = match projection_for(&unwrap.source) {
            Some(field) => format!("v.{field}"),
            None => "v".to_string(),
        };
        let escape = match &unwrap.exit {
            UnwrapExit::Return(Some(value)) => format!("return {}", self.expr(value)),
            UnwrapExit::Return(None) => "return vec![]".to_string(),
            UnwrapExit::Continue => "continue".to_string(),
        };
        self.declared.insert(unwrap.name.clone());
        let mutability = if self.usage.is_mutable(&unwrap.name) {
            "mut "
        } else {
            ""
        };
        let pad = self.pad();
        format!(
            "{pad}let {mutability}{} = match {source} {{\n{pad}    Some(v) => {binding},\n{pad}    None => {escape},\n{pad}}};",
            unwrap.name
        )
    }

    fn if_stmt(&mut self, if_stmt: &StmtIf) -> String {
        if let Some(rendered) = self.try_if_let_some(if_stmt) {
            return rendered;
        }
        let test = self.expr(&if_stmt.test);
        let pad = self.pad();
        let mut out = format!("{pad}if {test} {{\n");
        self.indent += 1;
        out.push_str(&self.block(&if_stmt.body));
        self.indent -= 1;
        if !if_stmt.orelse.is_empty() {
            out.push_str(&format!("{pad}}} else {{\n"));
            self.indent += 1;
            out.push_str(&self.block(&if_stmt.orelse));
            self.indent -= 1;
        }
        out.push_str(&format!("{pad}}}"));
        out
    }

    /// `if x is not None:` over a plain name binds through `if let` so the
    /// body can use the name unwrapped.
    fn try_if_let_some(&mut self, if_stmt: &StmtIf) -> Option<String> {
        let Expr::Compare(cmp) = &if_stmt.test else {
            return None;
        };
        if cmp.op != CmpOp::IsNot || !cmp.right.is_none_literal() {
            return None;
        }
        let name = cmp.left.as_name()?.to_string();
        let pad = self.pad();
        let mut out = format!("{pad}if let Some({name}) = {name} {{\n");
        self.indent += 1;
        out.push_str(&self.block(&if_stmt.body));
        self.indent -= 1;
        if !if_stmt.orelse.is_empty() {
            out.push_str(&format!("{pad}}} else {{\n"));
            self.indent += 1;
            out.push_str(&self.block(&if_stmt.orelse));
            self.indent -= 1;
        }
        out.push_str(&format!("{pad}}}"));
        Some(out)
    }

    fn for_stmt(&mut self, for_stmt: &StmtFor) -> String {
        if let Some((key, value)) = markets_binding(for_stmt) {
            let pad = self.pad();
            let mut out = format!("{pad}for ({key}, {value}) in ctx.markets.iter() {{\n");
            self.indent += 1;
            out.push_str(&self.block(&for_stmt.body));
            self.indent -= 1;
            out.push_str(&format!("{pad}}}"));
            return out;
        }
        let target = match &for_stmt.target {
            ForTarget::Name(name) => name.clone(),
            ForTarget::KeyValue(key, value) => format!("({key}, {value})"),
        };
        let iter = self.expr(&for_stmt.iter);
        let pad = self.pad();
        let mut out = format!("{pad}for {target} in {iter} {{\n");
        self.indent += 1;
        out.push_str(&self.block(&for_stmt.body));
        self.indent -= 1;
        out.push_str(&format!("{pad}}}"));
        out
    }

    fn return_stmt(&mut self, ret: &StmtReturn) -> String {
        match &ret.value {
            Some(value) => format!("{}return {};", self.pad(), self.expr(value)),
            None => format!("{}return vec![];", self.pad()),
        }
    }

    fn expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Name(name) => name.clone(),
            Expr::Constant(constant) => self.constant(constant),
            Expr::Attribute(attr) => self.attribute(attr),
            Expr::Subscript(sub) => {
                format!("{}.get(&{})", self.expr(&sub.value), self.expr(&sub.index))
            }
            Expr::Call(call) => self.call(call),
            Expr::Compare(cmp) => self.compare(cmp),
            Expr::BoolOp(bool_op) => self.bool_op(bool_op),
            Expr::Binary(bin) => self.binary(bin),
            Expr::Unary(unary) => self.unary(unary),
            Expr::List(items) => format!(
                "vec![{}]",
                items.iter().map(|item| self.expr(item)).join(", ")
            ),
            Expr::IfExp(if_exp) => self.if_exp(if_exp),
            Expr::Unsupported { summary } => format!("/* TODO: {summary} */"),
        }
    }

    /// Integer-typed positions render bare instead of as decimals.
    fn int_expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Constant(Constant::Int(i)) => i.to_string(),
            Expr::Binary(bin) => format!(
                "{} {} {}",
                self.int_expr(&bin.left),
                bin.op,
                self.int_expr(&bin.right)
            ),
            _ => self.expr(expr),
        }
    }

    fn constant(&self, constant: &Constant) -> String {
        match constant {
            Constant::None => "None".to_string(),
            Constant::Bool(b) => b.to_string(),
            Constant::Int(i) => format!("dec!({i})"),
            Constant::Float(f) => params::float_literal(*f),
            Constant::Str(s) => format!("\"{s}\".to_string()"),
        }
    }

    fn attribute(&self, attr: &ExprAttribute) -> String {
        if let Some(receiver) = attr.value.as_name() {
            if receiver == "Urgency" {
                return format!("Urgency::{}", to_pascal_case(&attr.attr.to_lowercase()));
            }
            if receiver == "ctx" {
                return self.ctx_attribute(&attr.attr);
            }
        }
        let value = self.expr(&attr.value);
        match context::lookup(&attr.attr) {
            Some(spec) if spec.is_method() => format!("{}.{}()", value, attr.attr),
            Some(spec) if spec.returns == ReturnKind::Text => {
                format!("{}.{}.clone()", value, attr.attr)
            }
            _ => format!("{}.{}", value, attr.attr),
        }
    }

    /// Context fields the engine exposes under different names.
    fn ctx_attribute(&self, attr: &str) -> String {
        match attr {
            "total_pnl" => "(ctx.realized_pnl + ctx.unrealized_pnl)".to_string(),
            "total_realized_pnl" => "ctx.realized_pnl".to_string(),
            "total_unrealized_pnl" => "ctx.unrealized_pnl".to_string(),
            other => format!("ctx.{other}"),
        }
    }

    fn compare(&self, cmp: &ExprCompare) -> String {
        let left = self.expr(&cmp.left);
        if cmp.right.is_none_literal() {
            match cmp.op {
                CmpOp::Is | CmpOp::Eq => return format!("{left}.is_none()"),
                CmpOp::IsNot | CmpOp::NotEq => return format!("{left}.is_some()"),
                _ => {}
            }
        }
        let right = self.expr(&cmp.right);
        match cmp.op {
            CmpOp::In => format!("{right}.contains({left})"),
            CmpOp::NotIn => format!("!{right}.contains({left})"),
            CmpOp::Eq => format!("{left} == {right}"),
            CmpOp::NotEq => format!("{left} != {right}"),
            CmpOp::Lt => format!("{left} < {right}"),
            CmpOp::LtE => format!("{left} <= {right}"),
            CmpOp::Gt => format!("{left} > {right}"),
            CmpOp::GtE => format!("{left} >= {right}"),
            CmpOp::Is => format!("{left} == {right}"),
            CmpOp::IsNot => format!("{left} != {right}"),
        }
    }

    fn bool_op(&self, bool_op: &ExprBoolOp) -> String {
        let joiner = match bool_op.op {
            BoolOpKind::And => " && ",
            BoolOpKind::Or => " || ",
        };
        let joined = bool_op
            .values
            .iter()
            .map(|value| self.expr(value))
            .join(joiner);
        format!("({joined})")
    }

    fn binary(&self, bin: &ExprBinary) -> String {
        format!(
            "{} {} {}",
            self.binary_operand(&bin.left),
            bin.op,
            self.binary_operand(&bin.right)
        )
    }

    /// Nested arithmetic keeps its own parentheses; Python's tree already
    /// encodes the precedence the author wrote.
    fn binary_operand(&self, expr: &Expr) -> String {
        let rendered = self.expr(expr);
        if matches!(expr, Expr::Binary(_)) {
            format!("({rendered})")
        } else {
            rendered
        }
    }

    fn unary(&self, unary: &ExprUnary) -> String {
        match unary.op {
            UnaryOpKind::Not => format!("!{}", self.expr(&unary.operand)),
            UnaryOpKind::Neg => format!("-{}", self.expr(&unary.operand)),
        }
    }

    fn if_exp(&self, if_exp: &ExprIfExp) -> String {
        // `xs if xs else fallback`: truthiness on a list means non-empty
        if let (Some(test), Some(body)) = (if_exp.test.as_name(), if_exp.body.as_name()) {
            if test == body {
                return format!(
                    "if !{test}.is_empty() {{ {body} }} else {{ {} }}",
                    self.expr(&if_exp.orelse)
                );
            }
        }
        format!(
            "if {} {{ {} }} else {{ {} }}",
            self.expr(&if_exp.test),
            self.expr(&if_exp.body),
            self.expr(&if_exp.orelse)
        )
    }

    fn call(&self, call: &ExprCall) -> String {
        if let Some(func) = call.func.as_name() {
            match func {
                "Buy" | "Sell" => return self.order_signal(func, call),
                "Cancel" => return self.cancel_signal(call),
                "Hold" => return "Signal::Hold".to_string(),
                "Shutdown" => return self.shutdown_signal(call),
                "Decimal" => return self.decimal_call(call),
                "list" => return "vec![]".to_string(),
                _ => {}
            }
        }
        if let Expr::Attribute(attr) = call.func.as_ref() {
            if let Some("ctx") = attr.value.as_name() {
                if let Some(rendered) = self.ctx_call(&attr.attr, call) {
                    return rendered;
                }
            }
            let receiver = self.expr(&attr.value);
            let args = call.args.iter().map(|arg| self.expr(arg)).join(", ");
            let method = match attr.attr.as_str() {
                "append" => "push",
                "lower" => "to_lowercase",
                "upper" => "to_uppercase",
                other => other,
            };
            return format!("{receiver}.{method}({args})");
        }
        let func = self.expr(&call.func);
        let args = call.args.iter().map(|arg| self.expr(arg)).join(", ");
        format!("{func}({args})")
    }

    /// Context helpers become map lookups against the engine state.
    fn ctx_call(&self, method: &str, call: &ExprCall) -> Option<String> {
        match method {
            "book" => Some(format!(
                "ctx.order_books.get({})",
                self.borrowed_args(call)
            )),
            "position" => Some(format!("ctx.positions.get({})", self.borrowed_args(call))),
            "mid" => Some(format!(
                "ctx.order_books.get({}).and_then(|b| b.mid_price())",
                self.borrowed_args(call)
            )),
            _ => None,
        }
    }

    /// Owned string locals are borrowed at lookup sites; string literals
    /// pass as bare `&str`.
    fn borrowed_args(&self, call: &ExprCall) -> String {
        call.args
            .iter()
            .map(|arg| match arg {
                Expr::Name(name) if self.usage.is_string(name) => format!("&{name}"),
                Expr::Constant(Constant::Str(s)) => format!("\"{s}\""),
                _ => self.expr(arg),
            })
            .join(", ")
    }

    fn order_signal(&self, kind: &str, call: &ExprCall) -> String {
        let mut token_id = "\"\".to_string()".to_string();
        let mut price = "dec!(0)".to_string();
        let mut size = "dec!(0)".to_string();
        let mut urgency = "Urgency::Medium".to_string();
        for keyword in &call.keywords {
            match keyword.name.as_str() {
                "token_id" => token_id = self.token_argument(&keyword.value),
                "price" => price = self.expr(&keyword.value),
                "size" => size = self.expr(&keyword.value),
                "urgency" => urgency = self.expr(&keyword.value),
                _ => {}
            }
        }
        format!(
            "Signal::{kind} {{ token_id: {token_id}, price: {price}, size: {size}, urgency: {urgency} }}"
        )
    }

    fn cancel_signal(&self, call: &ExprCall) -> String {
        let mut token_id = "\"\".to_string()".to_string();
        for keyword in &call.keywords {
            if keyword.name == "token_id" {
                token_id = self.token_argument(&keyword.value);
            }
        }
        format!("Signal::Cancel {{ token_id: {token_id} }}")
    }

    fn shutdown_signal(&self, call: &ExprCall) -> String {
        let mut reason = "\"\".to_string()".to_string();
        for keyword in &call.keywords {
            if keyword.name == "reason" {
                reason = self.token_argument(&keyword.value);
            }
        }
        format!("Signal::Shutdown {{ reason: {reason} }}")
    }

    /// Signal fields own their strings. Rendered string constants already
    /// end in `.to_string()`; everything else gets the call appended.
    fn token_argument(&self, value: &Expr) -> String {
        let rendered = self.expr(value);
        if rendered.starts_with('"') {
            rendered
        } else {
            format!("{rendered}.to_string()")
        }
    }

    fn decimal_call(&self, call: &ExprCall) -> String {
        match call.args.as_slice() {
            [Expr::Constant(Constant::Str(text))] => format!("dec!({text})"),
            [Expr::Constant(Constant::Int(i))] => format!("dec!({i})"),
            [Expr::Constant(Constant::Float(f))] => {
                format!("dec!({})", params::float_literal(*f))
            }
            _ => {
                let args = call.args.iter().map(|arg| self.expr(arg)).join(", ");
                format!("Decimal::from_str_exact(&{args}).unwrap()")
            }
        }
    }
}

fn projection_for(source: &Expr) -> Option<&'static str> {
    let Expr::Attribute(attr) = source else {
        return None;
    };
    context::lookup(&attr.attr).and_then(|spec| spec.projection)
}

/// `for key, value in ctx.markets.items():` is the discovery loop shape.
fn markets_binding(for_stmt: &StmtFor) -> Option<(&str, &str)> {
    let ForTarget::KeyValue(key, value) = &for_stmt.target else {
        return None;
    };
    let Expr::Call(call) = &for_stmt.iter else {
        return None;
    };
    if !call.args.is_empty() || !call.keywords.is_empty() {
        return None;
    }
    let Expr::Attribute(items) = call.func.as_ref() else {
        return None;
    };
    if items.attr != "items" {
        return None;
    }
    match items.value.as_name_attribute() {
        Some(("ctx", "markets")) => Some((key, value)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use stratc_core::passes::{analyze_locals, fold_option_guards};
    use stratc_python::PythonFrontend;

    fn compile(source: &str) -> String {
        let parsed = PythonFrontend::parse(source, None).unwrap();
        let meta = parsed.metadata().clone();
        let (tree, _) = fold_option_guards(parsed.lower());
        let usage = analyze_locals(&tree, &meta);
        RustGenerator::new(&meta, &usage).generate(&tree)
    }

    #[test]
    fn test_module_skeleton() {
        let source = r#"
@strategy(name="spread_watcher", tokens=["415"])
def on_tick(ctx):
    return []
"#;
        let out = compile(source);
        assert!(out.starts_with("//! Auto-generated from Python strategy: spread_watcher\n"));
        assert!(out.contains("//! DO NOT EDIT - regenerate with `stratc compile`"));
        assert!(out.contains("pub struct SpreadWatcher {\n    id: String,\n    tokens: Vec<String>,\n}"));
        assert!(out.contains("id: \"spread_watcher\".to_string(),"));
        assert!(out.contains("tokens: vec![\"415\".to_string()],"));
        assert!(out.contains("impl Default for SpreadWatcher"));
        assert!(out.contains("fn on_tick(&mut self, ctx: &StrategyContext) -> Vec<Signal> {\n        return vec![];\n    }"));
        assert!(out.contains("fn on_fill(&mut self, _fill: &Fill) {}"));
        assert!(out.contains("fn on_shutdown(&mut self) {}"));
    }

    #[test]
    fn test_minimal_discovery_module() {
        let source = r#"
@strategy(name="noop", tokens=[])
def on_tick(ctx):
    return []
"#;
        let out = compile(source);
        assert!(out.contains("id: \"noop\".to_string(),"));
        assert!(out.contains("tokens: vec![],"));
        assert!(out.contains("fn on_tick(&mut self, ctx: &StrategyContext) -> Vec<Signal> {"));
        // no parameters, no constant block
        assert!(!out.contains("// Strategy parameters"));
        assert!(!out.contains("const "));
    }

    #[test]
    fn test_constants_block_is_typed() {
        let source = r#"
@strategy(name="t", tokens=["1"], params={"SPREAD_BPS": Decimal("20"), "MAX_TOKENS": 5, "HOURS": 48.0, "LIVE": True})
def on_tick(ctx):
    return []
"#;
        let out = compile(source);
        assert!(out.contains("// Strategy parameters (generated from Python params)\n"));
        assert!(out.contains("const SPREAD_BPS: Decimal = dec!(20);\n"));
        assert!(out.contains("const MAX_TOKENS: i64 = 5;\n"));
        assert!(out.contains("const HOURS: f64 = 48.0;\n"));
        assert!(out.contains("const LIVE: bool = true;\n"));
    }

    #[test]
    fn test_guard_fold_renders_match_with_projection() {
        let source = r#"
@strategy(name="t", tokens=["1"])
def on_tick(ctx):
    signals = []
    token = "1"
    book = ctx.book(token)
    if book is None:
        return signals
    bid = book.best_bid
    if bid is None:
        return signals
    return signals
"#;
        let out = compile(source);
        assert!(out.contains(
            "        let book = match ctx.order_books.get(&token) {\n            Some(v) => v,\n            None => return signals,\n        };\n"
        ));
        assert!(out.contains(
            "        let bid = match book.best_bid() {\n            Some(v) => v.price,\n            None => return signals,\n        };\n"
        ));
    }

    #[test]
    fn test_markets_loop_with_guards() {
        let source = r#"
@strategy(name="t", tokens=[])
def on_tick(ctx):
    signals = []
    for token_id, market in ctx.markets.items():
        liquidity = market.liquidity
        if liquidity is None:
            continue
        if market.end_date is None:
            continue
        book = ctx.book(token_id)
        if book is None:
            continue
        signals.append(Cancel(token_id=token_id))
    return signals
"#;
        let out = compile(source);
        assert!(out.contains("        for (token_id, market) in ctx.markets.iter() {\n"));
        assert!(out.contains(
            "            let liquidity = match market.liquidity {\n                Some(v) => v,\n                None => continue,\n            };\n"
        ));
        // market options never fold through the deferred form
        assert!(out.contains("            if market.end_date.is_none() {\n                continue;\n            }\n"));
        assert!(out.contains(
            "            let book = match ctx.order_books.get(token_id) {\n                Some(v) => v,\n                None => continue,\n            };\n"
        ));
        assert!(out.contains(
            "            signals.push(Signal::Cancel { token_id: token_id.to_string() });\n"
        ));
    }

    #[test]
    fn test_integer_locals_render_bare() {
        let source = r#"
@strategy(name="t", tokens=[], params={"MAX_TOKENS": 10})
def on_tick(ctx):
    tokens_quoted = 0
    if tokens_quoted >= MAX_TOKENS:
        tokens_quoted = tokens_quoted + 1
    return []
"#;
        let out = compile(source);
        assert!(out.contains("        let mut tokens_quoted = 0;\n"));
        assert!(out.contains("        if tokens_quoted >= MAX_TOKENS {\n"));
        assert!(out.contains("            tokens_quoted = tokens_quoted + 1;\n"));
    }

    #[test]
    fn test_if_let_some_for_is_not_none() {
        let source = r#"
@strategy(name="t", tokens=[])
def on_tick(ctx):
    position = ctx.position("1")
    position_size = Decimal("0")
    if position is not None:
        position_size = position.size
    return []
"#;
        let out = compile(source);
        assert!(out.contains("        let position = ctx.positions.get(\"1\");\n"));
        assert!(out.contains("        let mut position_size = dec!(0);\n"));
        assert!(out.contains(
            "        if let Some(position) = position {\n            position_size = position.size;\n        }\n"
        ));
    }

    #[test]
    fn test_signal_defaults_and_urgency() {
        let source = r#"
@strategy(name="t", tokens=["1"])
def on_tick(ctx):
    signals = []
    signals.append(Buy(token_id="1", price=Decimal("0.5")))
    signals.append(Sell(token_id="1", price=Decimal("0.6"), size=Decimal("10"), urgency=Urgency.IMMEDIATE))
    signals.append(Shutdown(reason="drawdown limit"))
    return signals
"#;
        let out = compile(source);
        assert!(out.contains(
            "Signal::Buy { token_id: \"1\".to_string(), price: dec!(0.5), size: dec!(0), urgency: Urgency::Medium }"
        ));
        assert!(out.contains(
            "Signal::Sell { token_id: \"1\".to_string(), price: dec!(0.6), size: dec!(10), urgency: Urgency::Immediate }"
        ));
        assert!(out.contains("Signal::Shutdown { reason: \"drawdown limit\".to_string() }"));
    }

    #[test]
    fn test_string_methods_and_membership() {
        let source = r#"
@strategy(name="t", tokens=[])
def on_tick(ctx):
    for token_id, market in ctx.markets.items():
        q_lower = market.question.lower()
        for keyword in EXCLUDE_KEYWORDS:
            if keyword in q_lower:
                continue
    return []
"#;
        let out = compile(source);
        assert!(out.contains("let q_lower = market.question.clone().to_lowercase();\n"));
        assert!(out.contains("for keyword in EXCLUDE_KEYWORDS {\n"));
        assert!(out.contains("if q_lower.contains(keyword) {\n"));
    }

    #[test]
    fn test_arithmetic_parentheses_and_mid() {
        let source = r#"
@strategy(name="t", tokens=[])
def on_tick(ctx):
    bid = Decimal("0.4")
    ask = Decimal("0.6")
    mid = (bid + ask) / Decimal("2")
    edge = (Decimal("1.00") - ask) / ask
    return []
"#;
        let out = compile(source);
        assert!(out.contains("let mid = (bid + ask) / dec!(2);\n"));
        assert!(out.contains("let edge = (dec!(1.00) - ask) / ask;\n"));
    }

    #[test]
    fn test_tail_conditional_return() {
        let source = r#"
@strategy(name="t", tokens=[])
def on_tick(ctx):
    signals = []
    return signals if signals else [Hold()]
"#;
        let out = compile(source);
        assert!(out.contains(
            "        return if !signals.is_empty() { signals } else { vec![Signal::Hold] };\n"
        ));
    }

    #[test]
    fn test_unsupported_statement_placeholder() {
        let source = r#"
@strategy(name="t", tokens=[])
def on_tick(ctx):
    while True:
        pass
    return []
"#;
        let out = compile(source);
        assert!(out.contains("        // TODO: unsupported statement: while loop\n"));
    }

    #[test]
    fn test_boolean_conditions_parenthesize() {
        let source = r#"
@strategy(name="t", tokens=[], params={"MIN_PRICE": Decimal("0.15"), "MAX_PRICE": Decimal("0.85")})
def on_tick(ctx):
    bid = Decimal("0.5")
    in_range = bid > MIN_PRICE and bid < MAX_PRICE
    return []
"#;
        let out = compile(source);
        assert!(out.contains("let in_range = (bid > MIN_PRICE && bid < MAX_PRICE);\n"));
    }
}
