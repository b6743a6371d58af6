//! Folds Python's optional-access guard idioms into unwrap nodes.
//!
//! Two source shapes fold. The local form binds a value and immediately
//! bails when it is missing:
//!
//! ```python
//! bid = book.best_bid
//! if bid is None:
//!     continue
//! ```
//!
//! The deferred form checks an order book attribute first and copies it
//! into a local some statements later:
//!
//! ```python
//! if book.best_bid is None:
//!     continue
//! ...
//! bid = book.best_bid
//! ```
//!
//! Both become a single [`ConditionalUnwrap`] so the generator can emit
//! one `match` with an escape arm instead of a check plus a re-read.

use crate::ast::*;
use crate::context;
use crate::diagnostics::Diagnostic;
use indexmap::IndexMap;
use tracing::debug;

struct PendingCheck {
    guard: StmtIf,
    exit: UnwrapExit,
    result_index: usize,
}

/// Rewrites a function body, recursing into nested blocks. Each block keeps
/// its own table of deferred checks; a check recorded inside a loop cannot
/// be consumed outside it.
pub fn fold_option_guards(block: Block) -> (Block, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();
    let folded = fold_block(block, &mut diagnostics);
    (folded, diagnostics)
}

fn fold_block(block: Block, diagnostics: &mut Vec<Diagnostic>) -> Block {
    let mut result: Vec<Stmt> = Vec::new();
    let mut pending: IndexMap<(String, String), PendingCheck> = IndexMap::new();
    let mut stmts = block.into_iter().peekable();

    while let Some(stmt) = stmts.next() {
        match stmt {
            Stmt::Assign(assign) => {
                // The local form wins over a recorded check on the same value.
                if let Some(exit) = stmts.peek().and_then(|next| none_guard_exit(next, &assign.name))
                {
                    stmts.next();
                    debug!(name = %assign.name, "folding assignment guard into unwrap");
                    result.push(Stmt::Unwrap(ConditionalUnwrap {
                        name: assign.name,
                        source: assign.value,
                        exit,
                        line: assign.line,
                    }));
                    continue;
                }
                if let Some((obj, attr)) = assign.value.as_name_attribute() {
                    let key = (obj.to_string(), attr.to_string());
                    if let Some(check) = pending.shift_remove(&key) {
                        debug!(name = %assign.name, attr = %key.1, "folding deferred check into unwrap");
                        result.push(Stmt::Unwrap(ConditionalUnwrap {
                            name: assign.name,
                            source: assign.value,
                            exit: check.exit,
                            line: assign.line,
                        }));
                        continue;
                    }
                }
                result.push(Stmt::Assign(assign));
            }
            Stmt::If(guard) => {
                if let Some((key, exit)) = deferred_attr_check(&guard) {
                    if let Some(stale) = pending.shift_remove(&key) {
                        // A second check on the same attribute supersedes the
                        // first; the first stays in the output as a plain if.
                        diagnostics.push(unconsumed_check_warning(&key, stale.guard.line));
                        result.push(Stmt::If(stale.guard));
                    }
                    pending.insert(
                        key,
                        PendingCheck {
                            guard,
                            exit,
                            result_index: result.len(),
                        },
                    );
                    continue;
                }
                let folded = StmtIf {
                    test: guard.test,
                    body: fold_block(guard.body, diagnostics),
                    orelse: fold_block(guard.orelse, diagnostics),
                    line: guard.line,
                };
                result.push(Stmt::If(folded));
            }
            Stmt::For(for_stmt) => {
                let folded = StmtFor {
                    body: fold_block(for_stmt.body, diagnostics),
                    ..for_stmt
                };
                result.push(Stmt::For(folded));
            }
            other => result.push(other),
        }
    }

    // Checks that never met a matching assignment go back where they stood.
    // Later entries always recorded larger indices, so inserting in table
    // order with a running offset restores the original statement order.
    let mut inserted = 0;
    for (key, check) in pending {
        diagnostics.push(unconsumed_check_warning(&key, check.guard.line));
        result.insert(check.result_index + inserted, Stmt::If(check.guard));
        inserted += 1;
    }

    result
}

fn unconsumed_check_warning(key: &(String, String), line: u32) -> Diagnostic {
    Diagnostic::warning(format!(
        "Check on '{}.{}' is never followed by an assignment of that attribute; keeping it as a plain if",
        key.0, key.1
    ))
    .with_line(line)
    .with_hint("Assign the attribute to a local after the check so both collapse into one unwrap")
}

/// `if NAME is None:` (or `== None`) with a lone return/continue body and no
/// else branch. Returns how the guard leaves the enclosing scope.
fn none_guard_exit(stmt: &Stmt, name: &str) -> Option<UnwrapExit> {
    let Stmt::If(guard) = stmt else {
        return None;
    };
    if !guard.orelse.is_empty() || guard.body.len() != 1 {
        return None;
    }
    let subject = none_test(&guard.test)?;
    if subject.as_name() != Some(name) {
        return None;
    }
    exit_of(&guard.body[0])
}

/// Same shape as [`none_guard_exit`] but on `obj.attr`, and only for order
/// book attributes that fold. Market options keep their explicit checks.
fn deferred_attr_check(guard: &StmtIf) -> Option<((String, String), UnwrapExit)> {
    if !guard.orelse.is_empty() || guard.body.len() != 1 {
        return None;
    }
    let subject = none_test(&guard.test)?;
    let (obj, attr) = subject.as_name_attribute()?;
    let spec = context::lookup(attr)?;
    if !spec.foldable() {
        return None;
    }
    let exit = exit_of(&guard.body[0])?;
    Some(((obj.to_string(), attr.to_string()), exit))
}

/// The expression compared against `None` with `is` or `==`, if any.
fn none_test(test: &Expr) -> Option<&Expr> {
    match test {
        Expr::Compare(cmp)
            if matches!(cmp.op, CmpOp::Is | CmpOp::Eq) && cmp.right.is_none_literal() =>
        {
            Some(&cmp.left)
        }
        _ => None,
    }
}

fn exit_of(stmt: &Stmt) -> Option<UnwrapExit> {
    match stmt {
        Stmt::Return(ret) => Some(UnwrapExit::Return(ret.value.clone())),
        Stmt::Continue { .. } => Some(UnwrapExit::Continue),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn assign(name: &str, value: Expr) -> Stmt {
        Stmt::Assign(StmtAssign {
            name: name.to_string(),
            value,
            line: 1,
        })
    }

    fn attribute(obj: &str, attr: &str) -> Expr {
        Expr::Attribute(ExprAttribute {
            value: Box::new(Expr::name(obj)),
            attr: attr.to_string(),
        })
    }

    fn none_check(subject: Expr, body: Vec<Stmt>) -> Stmt {
        Stmt::If(StmtIf {
            test: Expr::Compare(ExprCompare {
                left: Box::new(subject),
                op: CmpOp::Is,
                right: Box::new(Expr::Constant(Constant::None)),
            }),
            body,
            orelse: vec![],
            line: 2,
        })
    }

    #[test]
    fn test_assign_guard_folds_to_unwrap() {
        let block = vec![
            assign("bid", attribute("book", "best_bid")),
            none_check(
                Expr::name("bid"),
                vec![Stmt::Return(StmtReturn {
                    value: Some(Expr::name("signals")),
                    line: 3,
                })],
            ),
        ];

        let (folded, diags) = fold_option_guards(block);
        assert!(diags.is_empty());
        assert_eq!(
            folded,
            vec![Stmt::Unwrap(ConditionalUnwrap {
                name: "bid".to_string(),
                source: attribute("book", "best_bid"),
                exit: UnwrapExit::Return(Some(Expr::name("signals"))),
                line: 1,
            })]
        );
    }

    #[test]
    fn test_guard_with_else_branch_survives() {
        let block = vec![
            assign("bid", attribute("book", "best_bid")),
            Stmt::If(StmtIf {
                test: Expr::Compare(ExprCompare {
                    left: Box::new(Expr::name("bid")),
                    op: CmpOp::Is,
                    right: Box::new(Expr::Constant(Constant::None)),
                }),
                body: vec![Stmt::Continue { line: 3 }],
                orelse: vec![Stmt::Break { line: 5 }],
                line: 2,
            }),
        ];

        let (folded, diags) = fold_option_guards(block.clone());
        assert!(diags.is_empty());
        assert_eq!(folded, block);
    }

    #[test]
    fn test_guard_with_extra_statement_survives() {
        let guard_body = vec![
            assign("noted", Expr::Constant(Constant::Bool(true))),
            Stmt::Continue { line: 4 },
        ];
        let block = vec![
            assign("bid", attribute("book", "best_bid")),
            none_check(Expr::name("bid"), guard_body),
        ];

        let (folded, diags) = fold_option_guards(block.clone());
        assert!(diags.is_empty());
        assert_eq!(folded, block);
    }

    #[test]
    fn test_deferred_check_folds_at_assignment() {
        let block = vec![
            none_check(
                attribute("book", "best_bid"),
                vec![Stmt::Continue { line: 2 }],
            ),
            assign("bid", attribute("book", "best_bid")),
        ];

        let (folded, diags) = fold_option_guards(block);
        assert!(diags.is_empty());
        assert_eq!(
            folded,
            vec![Stmt::Unwrap(ConditionalUnwrap {
                name: "bid".to_string(),
                source: attribute("book", "best_bid"),
                exit: UnwrapExit::Continue,
                line: 1,
            })]
        );
    }

    #[test]
    fn test_market_attr_check_is_not_deferred() {
        let block = vec![
            none_check(
                attribute("market", "end_date"),
                vec![Stmt::Continue { line: 2 }],
            ),
            assign("when", attribute("market", "end_date")),
        ];

        let (folded, diags) = fold_option_guards(block.clone());
        assert!(diags.is_empty());
        assert_eq!(folded, block);
    }

    #[test]
    fn test_unconsumed_check_is_restored_with_warning() {
        let check = none_check(
            attribute("book", "best_ask"),
            vec![Stmt::Continue { line: 2 }],
        );
        let block = vec![check.clone(), assign("other", Expr::name("y"))];

        let (folded, diags) = fold_option_guards(block);
        assert_eq!(folded, vec![check, assign("other", Expr::name("y"))]);
        assert_eq!(diags.len(), 1);
        assert!(!diags[0].is_error());
        assert_eq!(diags[0].line, Some(2));
    }

    #[test]
    fn test_local_guard_wins_over_pending_check() {
        // The recorded check stays unconsumed because the assignment pairs
        // with its own guard first.
        let block = vec![
            none_check(
                attribute("book", "best_bid"),
                vec![Stmt::Continue { line: 2 }],
            ),
            assign("bid", attribute("book", "best_bid")),
            none_check(Expr::name("bid"), vec![Stmt::Continue { line: 4 }]),
        ];

        let (folded, diags) = fold_option_guards(block);
        assert_eq!(diags.len(), 1);
        assert_eq!(folded.len(), 2);
        assert!(matches!(&folded[0], Stmt::If(_)));
        assert!(matches!(&folded[1], Stmt::Unwrap(u) if u.name == "bid"));
    }

    #[test]
    fn test_pending_checks_do_not_cross_loop_scopes() {
        let body = vec![
            none_check(
                attribute("book", "mid_price"),
                vec![Stmt::Continue { line: 3 }],
            ),
            assign("mid", attribute("book", "mid_price")),
        ];
        let block = vec![Stmt::For(StmtFor {
            target: ForTarget::KeyValue("token_id".to_string(), "market".to_string()),
            iter: Expr::name("markets"),
            body,
            line: 1,
        })];

        let (folded, diags) = fold_option_guards(block);
        assert!(diags.is_empty());
        let Stmt::For(for_stmt) = &folded[0] else {
            panic!("expected for loop");
        };
        assert_eq!(for_stmt.body.len(), 1);
        assert!(matches!(&for_stmt.body[0], Stmt::Unwrap(u) if u.name == "mid"));
    }
}
