//! Pseudo-C rendering of ctrees
//!
//! Used for diagnostics and by the CLI. Output is deliberately close to what a
//! decompiler view shows, but it is not meant to be re-parsed.

use std::fmt::Write;

use super::ctree::{CItem, CTree, ExprKind, InsnKind, NodeId};
use super::lvars::LVars;
use crate::cfunc::CFunc;

const INDENT: &str = "  ";

/// Render a single expression on one line
pub fn print_expr(tree: &CTree, lvars: &LVars, id: NodeId) -> String {
    let mut out = String::new();
    write_expr(tree, lvars, id, &mut out);
    out
}

/// Render a statement (and everything below it)
pub fn print_insn(tree: &CTree, lvars: &LVars, id: NodeId) -> String {
    let mut out = String::new();
    write_insn(tree, lvars, id, 0, &mut out);
    out
}

/// Render a whole function with its visible variable declarations
pub fn print_function(cfunc: &CFunc) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "// function at {:#x}", cfunc.entry_ea);
    out.push_str("{\n");

    let mut declared = false;
    for lvar in cfunc.lvars.iter().filter(|v| v.used) {
        let _ = write!(
            out,
            "{}int{} {}; // {}",
            INDENT,
            u64::from(lvar.width) * 8,
            lvar.name,
            lvar.location
        );
        if !lvar.comment.is_empty() {
            let _ = write!(out, " {}", lvar.comment);
        }
        out.push('\n');
        declared = true;
    }
    if declared {
        out.push('\n');
    }

    let body = &cfunc.body;
    for stmt in body.block_stmts(body.root()) {
        write_insn(body, &cfunc.lvars, *stmt, 1, &mut out);
    }
    out.push_str("}\n");
    out
}

fn needs_parens(tree: &CTree, id: NodeId) -> bool {
    matches!(
        tree.expr(id).map(|e| &e.kind),
        Some(ExprKind::Binary { .. }) | Some(ExprKind::Asg { .. })
    )
}

fn write_operand(tree: &CTree, lvars: &LVars, id: NodeId, out: &mut String) {
    if needs_parens(tree, id) {
        out.push('(');
        write_expr(tree, lvars, id, out);
        out.push(')');
    } else {
        write_expr(tree, lvars, id, out);
    }
}

fn write_expr(tree: &CTree, lvars: &LVars, id: NodeId, out: &mut String) {
    let Some(expr) = tree.expr(id) else {
        let _ = write!(out, "<bad expr {}>", id);
        return;
    };
    match &expr.kind {
        ExprKind::Var { idx } => out.push_str(&lvars.name_of(*idx)),
        ExprKind::Num { value } if *value < 10 => {
            let _ = write!(out, "{}", value);
        }
        ExprKind::Num { value } => {
            let _ = write!(out, "{:#x}", value);
        }
        ExprKind::Obj { ea } => {
            let _ = write!(out, "sub_{:X}", ea);
        }
        ExprKind::Helper { name } => out.push_str(name),
        ExprKind::Asg { x, y } => {
            write_expr(tree, lvars, *x, out);
            out.push_str(" = ");
            write_expr(tree, lvars, *y, out);
        }
        ExprKind::Binary { kind, x, y } => {
            write_operand(tree, lvars, *x, out);
            let _ = write!(out, " {} ", kind.symbol());
            write_operand(tree, lvars, *y, out);
        }
        ExprKind::Unary { kind, x } => {
            out.push_str(kind.symbol());
            write_operand(tree, lvars, *x, out);
        }
        ExprKind::Call { callee, args } => {
            write_operand(tree, lvars, *callee, out);
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(tree, lvars, *arg, out);
            }
            out.push(')');
        }
    }
}

fn write_indent(level: usize, out: &mut String) {
    for _ in 0..level {
        out.push_str(INDENT);
    }
}

/// Write a branch body: blocks are unwrapped into braces, single statements are
/// indented one level deeper.
fn write_body(tree: &CTree, lvars: &LVars, id: NodeId, level: usize, out: &mut String) {
    out.push_str(" {\n");
    match tree.insn(id).map(|i| &i.kind) {
        Some(InsnKind::Block { stmts }) => {
            for stmt in stmts {
                write_insn(tree, lvars, *stmt, level + 1, out);
            }
        }
        _ => write_insn(tree, lvars, id, level + 1, out),
    }
    write_indent(level, out);
    out.push('}');
}

fn write_insn(tree: &CTree, lvars: &LVars, id: NodeId, level: usize, out: &mut String) {
    let insn = match tree.get(id) {
        Some(CItem::Insn(insn)) => insn,
        _ => {
            write_indent(level, out);
            let _ = writeln!(out, "<bad insn {}>", id);
            return;
        }
    };
    write_indent(level, out);
    match &insn.kind {
        InsnKind::Empty => out.push_str(";\n"),
        InsnKind::Block { stmts } => {
            out.push_str("{\n");
            for stmt in stmts {
                write_insn(tree, lvars, *stmt, level + 1, out);
            }
            write_indent(level, out);
            out.push_str("}\n");
        }
        InsnKind::Expr { expr } => {
            write_expr(tree, lvars, *expr, out);
            out.push_str(";\n");
        }
        InsnKind::If {
            cond,
            then_branch,
            else_branch,
        } => {
            out.push_str("if (");
            write_expr(tree, lvars, *cond, out);
            out.push(')');
            write_body(tree, lvars, *then_branch, level, out);
            if let Some(else_branch) = else_branch {
                out.push_str(" else");
                write_body(tree, lvars, *else_branch, level, out);
            }
            out.push('\n');
        }
        InsnKind::While { cond, body } => {
            out.push_str("while (");
            write_expr(tree, lvars, *cond, out);
            out.push(')');
            write_body(tree, lvars, *body, level, out);
            out.push('\n');
        }
        InsnKind::Return { expr: Some(expr) } => {
            out.push_str("return ");
            write_expr(tree, lvars, *expr, out);
            out.push_str(";\n");
        }
        InsnKind::Return { expr: None } => out.push_str("return;\n"),
        InsnKind::Break => out.push_str("break;\n"),
        InsnKind::Continue => out.push_str("continue;\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builder::CTreeBuilder;
    use crate::ast::lvars::{LVar, VarLocation};

    fn lvars() -> LVars {
        let mut lvars = LVars::new();
        for (i, name) in ["a1", "v1", "v2"].iter().enumerate() {
            lvars.push(LVar::new(
                *name,
                VarLocation::Register { reg: i as u32 },
                0x1000,
                4,
            ));
        }
        lvars
    }

    #[test]
    fn test_print_call_with_address_of() {
        let mut b = CTreeBuilder::new();
        let f = b.obj(0x4010);
        let v = b.var(2);
        let r = b.addr_of(v);
        let call = b.call(f, vec![r]);
        assert_eq!(print_expr(b.tree(), &lvars(), call), "sub_4010(&v2)");
    }

    #[test]
    fn test_print_nested_binary_gets_parens() {
        let mut b = CTreeBuilder::new();
        let x = b.var(1);
        let one = b.num(1);
        let sum = b.add(x, one);
        let big = b.num(0x40);
        let prod = b.binary(crate::ast::ctree::BinaryOp::Mul, sum, big);
        assert_eq!(print_expr(b.tree(), &lvars(), prod), "(v1 + 1) * 0x40");
    }

    #[test]
    fn test_print_function_with_huge_width() {
        let mut lvars = LVars::new();
        lvars.push(LVar::new(
            "blob",
            VarLocation::Stack { offset: -0x40 },
            0x1000,
            u32::MAX,
        ));
        let cfunc = CFunc::new(0x1000, CTreeBuilder::new().finish(), lvars);
        assert!(print_function(&cfunc).contains("  int34359738360 blob;"));
    }

    #[test]
    fn test_print_if_else() {
        let mut b = CTreeBuilder::new();
        let cond = b.var(0);
        let x = b.var(1);
        let ret = b.ret(0x10, Some(x));
        let then_block = b.block(0x10, vec![ret]);
        let brk = b.insn(0x14, InsnKind::Break);
        let stmt = b.if_stmt(0x08, cond, then_block, Some(brk));
        assert_eq!(
            print_insn(b.tree(), &lvars(), stmt),
            "if (a1) {\n  return v1;\n} else {\n  break;\n}\n"
        );
    }
}
