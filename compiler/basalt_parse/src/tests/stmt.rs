//! Statement parsing tests. Function bodies are retained so the suites
//! can look inside blocks.

use basalt_ir::{
    AsmExprKind, AsmInstrKind, ExprKind, GotoTarget, IfCondition, ScopeGuardKind, StmtKind,
    TokenKind,
};

use super::{expr, first_body_stmts, parse_retained};

#[test]
fn foreach_over_range() {
    let (output, _interner) = parse_retained("void f() { foreach (int i; 0 .. 10) {} }");
    assert!(!output.has_errors());

    let stmts = first_body_stmts(&output);
    let StmtKind::Foreach(foreach) = &output.arena.get(stmts[0]).kind else {
        panic!("expected foreach")
    };
    assert!(!foreach.reverse);
    assert_eq!(foreach.vars.len(), 1);
    let var = &foreach.vars[0];
    let ty = output.arena.get(var.ty.expect("typed loop variable"));
    assert!(matches!(
        ty.kind,
        basalt_ir::TypeKind::Builtin(TokenKind::Int)
    ));
    let ExprKind::IntLit { text, .. } = expr(&output, foreach.low).kind else {
        panic!("expected integer low bound")
    };
    assert_eq!(_interner.lookup(text), "0");
    let high = foreach.high.expect("range form");
    let ExprKind::IntLit { text, .. } = expr(&output, high).kind else {
        panic!("expected integer high bound")
    };
    assert_eq!(_interner.lookup(text), "10");
}

#[test]
fn foreach_range_rejects_multiple_variables() {
    let (output, _interner) = parse_retained("void f() { foreach (a, b; 0 .. 2) {} }");
    assert!(output.has_errors());
}

#[test]
fn foreach_list_form_allows_multiple_variables() {
    let (output, _interner) = parse_retained("void f() { foreach (k, v; aa) {} }");
    assert!(!output.has_errors());
    let stmts = first_body_stmts(&output);
    let StmtKind::Foreach(foreach) = &output.arena.get(stmts[0]).kind else {
        panic!("expected foreach")
    };
    assert_eq!(foreach.vars.len(), 2);
    assert!(foreach.high.is_none());

    let (output, _interner) = parse_retained("void f() { foreach_reverse (x; arr) {} }");
    assert!(!output.has_errors());
    let stmts = first_body_stmts(&output);
    let StmtKind::Foreach(foreach) = &output.arena.get(stmts[0]).kind else {
        panic!("expected foreach_reverse")
    };
    assert!(foreach.reverse);
}

#[test]
fn if_with_declaring_conditions() {
    let (output, _interner) = parse_retained("void f() { if (auto x = g()) {} }");
    assert!(!output.has_errors());
    let stmts = first_body_stmts(&output);
    let StmtKind::If(stmt) = &output.arena.get(stmts[0]).kind else {
        panic!("expected if")
    };
    assert!(matches!(stmt.condition, IfCondition::Auto { .. }));

    let (output, _interner) = parse_retained("void f() { if (Foo x = make()) {} else {} }");
    assert!(!output.has_errors());
    let stmts = first_body_stmts(&output);
    let StmtKind::If(stmt) = &output.arena.get(stmts[0]).kind else {
        panic!("expected if")
    };
    assert!(matches!(stmt.condition, IfCondition::Typed { .. }));
    assert!(stmt.else_branch.is_some());

    let (output, _interner) = parse_retained("void f() { if (x > 1) {} }");
    assert!(!output.has_errors());
    let stmts = first_body_stmts(&output);
    let StmtKind::If(stmt) = &output.arena.get(stmts[0]).kind else {
        panic!("expected if")
    };
    assert!(matches!(stmt.condition, IfCondition::Expr(_)));
}

#[test]
fn for_with_omitted_clauses() {
    let (output, _interner) = parse_retained("void f() { for (;;) {} }");
    assert!(!output.has_errors());
    let stmts = first_body_stmts(&output);
    let StmtKind::For(stmt) = &output.arena.get(stmts[0]).kind else {
        panic!("expected for")
    };
    assert!(stmt.init.is_none() && stmt.cond.is_none() && stmt.increment.is_none());

    let (output, _interner) = parse_retained("void f() { for (int i = 0; i < 9; i++) {} }");
    assert!(!output.has_errors());
    let stmts = first_body_stmts(&output);
    let StmtKind::For(stmt) = &output.arena.get(stmts[0]).kind else {
        panic!("expected for")
    };
    assert!(stmt.init.is_some() && stmt.cond.is_some() && stmt.increment.is_some());
}

#[test]
fn try_catch_forms() {
    let (output, _interner) = parse_retained(
        "void f() { try { g(); } catch (Exception e) {} catch {} finally {} }",
    );
    assert!(!output.has_errors());
    let stmts = first_body_stmts(&output);
    let StmtKind::Try(stmt) = &output.arena.get(stmts[0]).kind else {
        panic!("expected try")
    };
    assert_eq!(stmt.catches.len(), 1);
    assert!(stmt.last_catch.is_some());
    assert!(stmt.finally_block.is_some());
}

#[test]
fn try_without_catch_or_finally_is_an_error() {
    let (output, _interner) = parse_retained("void f() { try { g(); } h(); }");
    assert!(output.has_errors());
}

#[test]
fn switch_case_and_case_range() {
    let (output, _interner) = parse_retained(
        "void f() { switch (x) { case 1, 2: g(); break; case 3: .. case 9: h(); break; default: break; } }",
    );
    assert!(!output.has_errors());
    let stmts = first_body_stmts(&output);
    let StmtKind::Switch { body, is_final, .. } = &output.arena.get(stmts[0]).kind else {
        panic!("expected switch")
    };
    assert!(!is_final);
    let StmtKind::Block { stmts: cases } = &output.arena.get(*body).kind else {
        panic!("expected switch body block")
    };
    assert!(matches!(
        output.arena.get(cases[0]).kind,
        StmtKind::Case { .. }
    ));
    assert!(matches!(
        output.arena.get(cases[1]).kind,
        StmtKind::CaseRange { .. }
    ));
    assert!(matches!(
        output.arena.get(cases[2]).kind,
        StmtKind::Default { .. }
    ));

    let (output, _interner) = parse_retained("void f() { final switch (x) { default: break; } }");
    assert!(!output.has_errors());
    let stmts = first_body_stmts(&output);
    assert!(matches!(
        output.arena.get(stmts[0]).kind,
        StmtKind::Switch { is_final: true, .. }
    ));
}

#[test]
fn goto_targets() {
    let (output, _interner) =
        parse_retained("void f() { goto done; goto default; goto case; goto case 3; done: ; }");
    assert!(!output.has_errors());
    let stmts = first_body_stmts(&output);
    assert!(matches!(
        output.arena.get(stmts[0]).kind,
        StmtKind::Goto {
            target: GotoTarget::Label(_)
        }
    ));
    assert!(matches!(
        output.arena.get(stmts[1]).kind,
        StmtKind::Goto {
            target: GotoTarget::Default
        }
    ));
    assert!(matches!(
        output.arena.get(stmts[2]).kind,
        StmtKind::Goto {
            target: GotoTarget::Case(None)
        }
    ));
    assert!(matches!(
        output.arena.get(stmts[3]).kind,
        StmtKind::Goto {
            target: GotoTarget::Case(Some(_))
        }
    ));
    assert!(matches!(
        output.arena.get(stmts[4]).kind,
        StmtKind::Labeled { .. }
    ));
}

#[test]
fn scope_guards() {
    let (output, _interner) =
        parse_retained("void f() { scope(exit) g(); scope(success) h(); scope(failure) i(); }");
    assert!(!output.has_errors());
    let stmts = first_body_stmts(&output);
    for (idx, kind) in [
        ScopeGuardKind::Exit,
        ScopeGuardKind::Success,
        ScopeGuardKind::Failure,
    ]
    .into_iter()
    .enumerate()
    {
        let StmtKind::ScopeGuard { kind: found, .. } = output.arena.get(stmts[idx]).kind else {
            panic!("expected scope guard at {idx}")
        };
        assert_eq!(found, kind);
    }
}

#[test]
fn with_synchronized_throw() {
    let (output, _interner) = parse_retained(
        "void f() { with (obj) {} synchronized {} synchronized (lock) {} throw new E(); }",
    );
    assert!(!output.has_errors());
    let stmts = first_body_stmts(&output);
    assert!(matches!(
        output.arena.get(stmts[0]).kind,
        StmtKind::With { .. }
    ));
    assert!(matches!(
        output.arena.get(stmts[1]).kind,
        StmtKind::Synchronized { subject: None, .. }
    ));
    assert!(matches!(
        output.arena.get(stmts[2]).kind,
        StmtKind::Synchronized {
            subject: Some(_),
            ..
        }
    ));
    assert!(matches!(
        output.arena.get(stmts[3]).kind,
        StmtKind::Throw { .. }
    ));
}

#[test]
fn do_while_and_while() {
    let (output, _interner) = parse_retained("void f() { do { g(); } while (x); while (y) {} }");
    assert!(!output.has_errors());
    let stmts = first_body_stmts(&output);
    assert!(matches!(
        output.arena.get(stmts[0]).kind,
        StmtKind::DoWhile { .. }
    ));
    assert!(matches!(
        output.arena.get(stmts[1]).kind,
        StmtKind::While { .. }
    ));
}

#[test]
fn static_conditionals_in_statement_position() {
    let (output, _interner) = parse_retained(
        "void f() { static if (X) { g(); } else { h(); } version (Posix) { p(); } debug { d(); } }",
    );
    assert!(!output.has_errors());
    let stmts = first_body_stmts(&output);
    assert!(matches!(
        output.arena.get(stmts[0]).kind,
        StmtKind::Conditional(_)
    ));
    assert!(matches!(
        output.arena.get(stmts[1]).kind,
        StmtKind::Conditional(_)
    ));
    assert!(matches!(
        output.arena.get(stmts[2]).kind,
        StmtKind::Conditional(_)
    ));

    let (output, _interner) =
        parse_retained("void f() { static assert(x > 0, \"msg\"); static foreach (i; 0 .. 3) {} }");
    assert!(!output.has_errors());
    let stmts = first_body_stmts(&output);
    assert!(matches!(
        output.arena.get(stmts[0]).kind,
        StmtKind::StaticAssert { .. }
    ));
    assert!(matches!(
        output.arena.get(stmts[1]).kind,
        StmtKind::StaticForeach(_)
    ));
}

#[test]
fn declaration_statement_dispatch() {
    let (output, _interner) = parse_retained("void f() { int x = 1; x = 2; g(x); }");
    assert!(!output.has_errors());
    let stmts = first_body_stmts(&output);
    assert!(matches!(
        output.arena.get(stmts[0]).kind,
        StmtKind::Decl { .. }
    ));
    assert!(matches!(
        output.arena.get(stmts[1]).kind,
        StmtKind::Expr { .. }
    ));
    assert!(matches!(
        output.arena.get(stmts[2]).kind,
        StmtKind::Expr { .. }
    ));
}

#[test]
fn asm_block_instructions() {
    let (output, interner) = parse_retained(
        "void f() { asm { mov EAX, 1; L1: jmp L1; align 4; ret; } }",
    );
    assert!(!output.has_errors());
    let stmts = first_body_stmts(&output);
    let StmtKind::Asm(block) = &output.arena.get(stmts[0]).kind else {
        panic!("expected asm block")
    };
    assert_eq!(block.instructions.len(), 4);

    let AsmInstrKind::Op { opcode, operands } = &block.instructions[0].kind else {
        panic!("expected mov instruction")
    };
    assert_eq!(interner.lookup(*opcode), "mov");
    assert_eq!(operands.len(), 2);
    let AsmExprKind::Register { name, .. } = &output.arena.get(operands[0]).kind else {
        panic!("expected register operand")
    };
    assert_eq!(interner.lookup(*name), "EAX");
    assert!(matches!(
        output.arena.get(operands[1]).kind,
        AsmExprKind::Literal { .. }
    ));

    let jmp = &block.instructions[1];
    assert_eq!(interner.lookup(jmp.label), "L1");
    assert!(matches!(jmp.kind, AsmInstrKind::Op { .. }));

    assert!(matches!(
        block.instructions[2].kind,
        AsmInstrKind::Align { .. }
    ));
    assert!(matches!(
        block.instructions[3].kind,
        AsmInstrKind::Bare { .. }
    ));
}

#[test]
fn asm_addressing_modes() {
    let (output, _interner) =
        parse_retained("void f() { asm { mov EAX, dword ptr [EBX + 4]; fld real ptr [ECX]; } }");
    assert!(!output.has_errors());
    let stmts = first_body_stmts(&output);
    let StmtKind::Asm(block) = &output.arena.get(stmts[0]).kind else {
        panic!("expected asm block")
    };
    let AsmInstrKind::Op { operands, .. } = &block.instructions[0].kind else {
        panic!("expected mov")
    };
    assert!(matches!(
        output.arena.get(operands[1]).kind,
        AsmExprKind::TypePrefix {
            has_ptr: true,
            ..
        }
    ));
}

#[test]
fn labeled_statement_without_body() {
    let (output, _interner) = parse_retained("void f() { empty: }");
    assert!(!output.has_errors());
    let stmts = first_body_stmts(&output);
    assert!(matches!(
        output.arena.get(stmts[0]).kind,
        StmtKind::Labeled { stmt: None, .. }
    ));
}
