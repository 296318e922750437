//! AST to bytecode lowering: local-slot allocation, constant-pool dedup,
//! jump back-patching, loop-frame stack, name resolution.
//!
//! Grounded operation-for-operation on `original_source/src/compile.c`'s
//! `codeblock_builder`. One deliberate correction: the original's
//! `STORE_GLOBAL_VARIABLE` compound-assignment path (`a += b` where `a` is
//! a global) computes the combined value into a scratch local but then
//! stores the *uncombined* right-hand side to the global — a latent bug,
//! visible only by comparing it against the otherwise-identical local-variable
//! and index-assignment paths in the same file, both of which store the
//! combined result. This implementation stores the combined result in all
//! three cases, matching `SPEC_FULL.md` §4.4's "single logical expression
//! that produces the new value" description (an Open Question, resolved in
//! `DESIGN.md`).

use crate::ast::{BinaryOp, Declaration, Expr, FunctionDecl, Program, ShortCircuitOp, Stmt, UnaryOp};
use crate::error::CompileError;
use fen_core::{CodeBlock, Function, Globals, Instruction, Value};
use std::rc::Rc;

const RETURN_LOCAL: u32 = 0;
const SCRATCH_LOCAL: u32 = 0;

struct LoopFrame {
    condition_start: u32,
    break_sites: Vec<usize>,
}

/// Builds one function's `CodeBlock`. Reads (never mutates) the globals
/// table for name resolution; the enclosing compiler mutates it only
/// between function builds (to declare/assign the function itself).
struct FunctionBuilder<'g> {
    filename: String,
    globals: &'g Globals,
    locals: Vec<(String, u32)>,
    number_of_locals: u32,
    constants: Vec<Value>,
    code: Vec<Instruction>,
    loops: Vec<LoopFrame>,
}

impl<'g> FunctionBuilder<'g> {
    fn new(filename: String, globals: &'g Globals) -> Self {
        FunctionBuilder {
            filename,
            globals,
            locals: Vec::new(),
            number_of_locals: 1, // slot 0 is the return/scratch local
            constants: Vec::new(),
            code: Vec::new(),
            loops: Vec::new(),
        }
    }

    fn error(&self, line: u32, message: impl Into<String>) -> CompileError {
        CompileError::Semantic { file: self.filename.clone(), line, message: message.into() }
    }

    fn next_local(&mut self) -> u32 {
        let index = self.number_of_locals;
        self.number_of_locals += 1;
        index
    }

    fn declare_local(&mut self, name: &str) -> u32 {
        if let Some((_, index)) = self.locals.iter().find(|(n, _)| n == name) {
            return *index;
        }
        let index = self.next_local();
        self.locals.push((name.to_string(), index));
        index
    }

    fn lookup_local(&self, name: &str) -> Option<u32> {
        self.locals.iter().find(|(n, _)| n == name).map(|(_, i)| *i)
    }

    fn load_constant(&mut self, value: Value, dst: u32) {
        let index = match self.constants.iter().position(|c| *c == value) {
            Some(index) => index as u32,
            None => {
                self.constants.push(value);
                (self.constants.len() - 1) as u32
            }
        };
        self.code.push(Instruction::LoadConstant { index, dst });
    }

    fn defer_jump(&mut self) -> usize {
        let position = self.code.len();
        self.code.push(Instruction::Jump { target: u32::MAX });
        position
    }

    fn patch_jump(&mut self, site: usize, target: u32) {
        match &mut self.code[site] {
            Instruction::Jump { target: t }
            | Instruction::JumpIfTrue { target: t, .. }
            | Instruction::JumpIfFalse { target: t, .. } => *t = target,
            other => unreachable!("patch_jump called on non-jump instruction {other:?}"),
        }
    }

    fn here(&self) -> u32 {
        self.code.len() as u32
    }

    fn binary_opcode(op: BinaryOp, lhs: u32, rhs: u32, dst: u32) -> Instruction {
        match op {
            BinaryOp::Add => Instruction::Add { lhs, rhs, dst },
            BinaryOp::Subtract => Instruction::Subtract { lhs, rhs, dst },
            BinaryOp::Multiply => Instruction::Multiply { lhs, rhs, dst },
            BinaryOp::Divide => Instruction::Divide { lhs, rhs, dst },
            BinaryOp::Modulo => Instruction::Modulo { lhs, rhs, dst },
            BinaryOp::Equal => Instruction::Equal { lhs, rhs, dst },
            BinaryOp::NotEqual => Instruction::NotEqual { lhs, rhs, dst },
            BinaryOp::LessThan => Instruction::LessThan { lhs, rhs, dst },
            BinaryOp::LessThanOrEqual => Instruction::LessThanOrEqual { lhs, rhs, dst },
            BinaryOp::GreaterThan => Instruction::GreaterThan { lhs, rhs, dst },
            BinaryOp::GreaterThanOrEqual => Instruction::GreaterThanOrEqual { lhs, rhs, dst },
        }
    }

    fn compile_expr(&mut self, expr: &Expr, dst: u32) -> Result<(), CompileError> {
        match expr {
            Expr::Literal(value) => {
                self.load_constant(value.clone(), dst);
                Ok(())
            }

            Expr::Variable { name, line } => {
                if let Some(local) = self.lookup_local(name) {
                    self.code.push(Instruction::Move { src: local, dst });
                    return Ok(());
                }
                match self.globals.lookup(name) {
                    Some(index) => {
                        self.code.push(Instruction::LoadGlobal { index, dst });
                        Ok(())
                    }
                    None => Err(self.error(*line, format!("undeclared variable '{name}'"))),
                }
            }

            Expr::Unary { op, operand, .. } => {
                self.compile_expr(operand, dst)?;
                let instr = match op {
                    UnaryOp::Negate => Instruction::Negate { src: dst, dst },
                    UnaryOp::Not => Instruction::Not { src: dst, dst },
                };
                self.code.push(instr);
                Ok(())
            }

            Expr::Binary { op, lhs, rhs, .. } => {
                let lhs_local = self.next_local();
                self.compile_expr(lhs, lhs_local)?;
                self.compile_expr(rhs, dst)?;
                self.code.push(Self::binary_opcode(*op, lhs_local, dst, dst));
                Ok(())
            }

            Expr::ShortCircuit { op, lhs, rhs, .. } => {
                self.compile_expr(lhs, dst)?;
                let jump_instr = match op {
                    ShortCircuitOp::Or => Instruction::JumpIfTrue { cond: dst, target: u32::MAX },
                    ShortCircuitOp::And => Instruction::JumpIfFalse { cond: dst, target: u32::MAX },
                };
                let site = self.code.len();
                self.code.push(jump_instr);
                self.compile_expr(rhs, dst)?;
                let end = self.here();
                self.patch_jump(site, end);
                Ok(())
            }

            Expr::ArrayLiteral { elements, .. } => {
                let mut element_locals = Vec::with_capacity(elements.len());
                for element in elements {
                    let local = self.next_local();
                    self.compile_expr(element, local)?;
                    element_locals.push(local);
                }
                self.code.push(Instruction::ArrayLiteral { elements: element_locals, dst });
                Ok(())
            }

            Expr::Index { source, index, .. } => {
                let source_local = self.next_local();
                self.compile_expr(source, source_local)?;
                self.compile_expr(index, dst)?;
                self.code.push(Instruction::Index { src: source_local, index: dst, dst });
                Ok(())
            }

            Expr::Call { callee, arguments, .. } => {
                let callee_local = self.next_local();
                self.compile_expr(callee, callee_local)?;
                let mut arg_locals = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    let local = self.next_local();
                    self.compile_expr(arg, local)?;
                    arg_locals.push(local);
                }
                self.code.push(Instruction::Call { callee: callee_local, args: arg_locals, dst });
                Ok(())
            }

            Expr::Assign { name, op, value, line } => {
                self.compile_expr(value, dst)?;

                if let Some(local) = self.lookup_local(name) {
                    if let Some(binop) = op {
                        self.code.push(Self::binary_opcode(*binop, local, dst, dst));
                    }
                    self.code.push(Instruction::Move { src: dst, dst: local });
                    return Ok(());
                }

                match self.globals.lookup(name) {
                    Some(global_index) => {
                        if let Some(binop) = op {
                            let old_local = self.next_local();
                            self.code.push(Instruction::LoadGlobal { index: global_index, dst: old_local });
                            self.code.push(Self::binary_opcode(*binop, old_local, dst, dst));
                        }
                        self.code.push(Instruction::StoreGlobal { index: global_index, src: dst, dst });
                        Ok(())
                    }
                    None => Err(self.error(*line, format!("unknown variable '{name}'; declare it first"))),
                }
            }

            Expr::IndexAssign { source, index, op, value, line: _ } => {
                let source_local = self.next_local();
                let index_local = self.next_local();
                self.compile_expr(source, source_local)?;
                self.compile_expr(index, index_local)?;
                self.compile_expr(value, dst)?;

                if let Some(binop) = op {
                    let old_value_local = self.next_local();
                    self.code.push(Instruction::Index { src: source_local, index: index_local, dst: old_value_local });
                    self.code.push(Self::binary_opcode(*binop, old_value_local, dst, dst));
                }

                self.code.push(Instruction::IndexAssign { src: source_local, index: index_local, val: dst, dst });
                Ok(())
            }
        }
    }

    fn compile_stmt(&mut self, stmt: &Stmt) -> Result<(), CompileError> {
        match stmt {
            Stmt::Local { name, initializer } => {
                let local = self.declare_local(name);
                match initializer {
                    Some(expr) => self.compile_expr(expr, local)?,
                    None => self.load_constant(Value::Null, local),
                }
                Ok(())
            }

            Stmt::Return { value } => {
                match value {
                    Some(expr) => self.compile_expr(expr, RETURN_LOCAL)?,
                    None => self.load_constant(Value::Null, RETURN_LOCAL),
                }
                self.code.push(Instruction::Return);
                Ok(())
            }

            Stmt::If { condition, then_block, else_block } => {
                self.compile_expr(condition, SCRATCH_LOCAL)?;
                let false_site = self.code.len();
                self.code.push(Instruction::JumpIfFalse { cond: SCRATCH_LOCAL, target: u32::MAX });

                for stmt in then_block {
                    self.compile_stmt(stmt)?;
                }

                match else_block {
                    None => {
                        let end = self.here();
                        self.patch_jump(false_site, end);
                    }
                    Some(else_stmts) => {
                        let end_site = self.code.len();
                        self.code.push(Instruction::Jump { target: u32::MAX });
                        let else_start = self.here();
                        self.patch_jump(false_site, else_start);

                        for stmt in else_stmts {
                            self.compile_stmt(stmt)?;
                        }

                        let end = self.here();
                        self.patch_jump(end_site, end);
                    }
                }
                Ok(())
            }

            Stmt::While { condition, body } => {
                let condition_start = self.here();
                self.compile_expr(condition, SCRATCH_LOCAL)?;
                let exit_site = self.code.len();
                self.code.push(Instruction::JumpIfFalse { cond: SCRATCH_LOCAL, target: u32::MAX });

                self.loops.push(LoopFrame { condition_start, break_sites: Vec::new() });
                for stmt in body {
                    self.compile_stmt(stmt)?;
                }

                self.code.push(Instruction::Jump { target: condition_start });
                let end = self.here();
                self.patch_jump(exit_site, end);

                let frame = self.loops.pop().expect("loop frame pushed above");
                for site in frame.break_sites {
                    self.patch_jump(site, end);
                }
                Ok(())
            }

            Stmt::Break { line } => {
                if self.loops.is_empty() {
                    return Err(self.error(*line, "cannot break when not within a loop"));
                }
                let site = self.defer_jump();
                self.loops.last_mut().unwrap().break_sites.push(site);
                Ok(())
            }

            Stmt::Continue { line } => {
                let Some(frame) = self.loops.last() else {
                    return Err(self.error(*line, "cannot continue when not within a loop"));
                };
                let target = frame.condition_start;
                self.code.push(Instruction::Jump { target });
                Ok(())
            }

            Stmt::Expression(expr) => self.compile_expr(expr, SCRATCH_LOCAL),
        }
    }

    fn build(mut self, decl: &FunctionDecl) -> Result<CodeBlock, CompileError> {
        for name in &decl.argument_names {
            self.declare_local(name);
        }

        for stmt in &decl.body {
            self.compile_stmt(stmt)?;
        }

        // Every function implicitly returns `null` if control falls off the end.
        self.load_constant(Value::Null, RETURN_LOCAL);
        self.code.push(Instruction::Return);

        Ok(CodeBlock::new(self.number_of_locals, self.code, self.constants))
    }
}

pub(crate) fn compile_function(globals: &mut Globals, filename: &str, decl: &FunctionDecl) -> Result<(), CompileError> {
    // Declared before the body is built, so direct recursion resolves.
    let global_index = globals.declare(&decl.name);

    let builder = FunctionBuilder::new(filename.to_string(), globals);
    let body = builder.build(decl)?;

    let function = Function {
        name: decl.name.clone(),
        body,
        argument_names: decl.argument_names.clone(),
        source_filename: Rc::from(filename),
        source_line: decl.line,
    };

    if globals.fetch(global_index) != Value::Null {
        return Err(CompileError::Semantic {
            file: filename.to_string(),
            line: decl.line,
            message: format!("function {} redefined", decl.name),
        });
    }

    globals.assign(global_index, Value::Function(Rc::new(function)));
    Ok(())
}

/// Compile one already-parsed program's declarations against a shared
/// globals table, ignoring any `import` directives it contains.
///
/// `crate::import` does not call this: it walks a program's declarations
/// itself, interleaving import resolution at each `Import`'s position in
/// the stream so that an import's functions become visible to whatever
/// follows it in the same file (matching `compile.c`'s single top-to-bottom
/// pass). This entry point exists for compiling declarations known in
/// advance to be import-free, such as this module's own unit tests.
pub fn compile_declarations(globals: &mut Globals, filename: &str, program: &Program) -> Result<(), CompileError> {
    for declaration in &program.declarations {
        match declaration {
            Declaration::Function(decl) => compile_function(globals, filename, decl)?,
            Declaration::Global { name } => {
                globals.declare(name);
            }
            Declaration::Import { .. } => {
                // Handled by `crate::import`, which re-enters the compiler
                // on the imported file before/after this one as appropriate.
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn compile_source(globals: &mut Globals, src: &str) -> Result<(), CompileError> {
        let tokens = Lexer::new("<test>", src.as_bytes()).tokenize().unwrap();
        let program = Parser::new("<test>", tokens).parse_program().unwrap();
        compile_declarations(globals, "<test>", &program)
    }

    #[test]
    fn recursive_function_resolves_its_own_name() {
        let mut globals = Globals::new();
        compile_source(
            &mut globals,
            "function fact(n) { if n <= 1 { return 1; } return n * fact(n - 1); }",
        )
        .unwrap();
        assert!(globals.lookup("fact").is_some());
    }

    #[test]
    fn redefining_a_function_is_an_error() {
        let mut globals = Globals::new();
        compile_source(&mut globals, "function f() { return 1; } function f() { return 2; }").unwrap_err();
    }

    #[test]
    fn break_outside_loop_is_compile_error() {
        let mut globals = Globals::new();
        compile_source(&mut globals, "function f() { break; }").unwrap_err();
    }

    #[test]
    fn continue_outside_loop_is_compile_error() {
        let mut globals = Globals::new();
        compile_source(&mut globals, "function f() { continue; }").unwrap_err();
    }

    #[test]
    fn undeclared_variable_is_compile_error() {
        let mut globals = Globals::new();
        compile_source(&mut globals, "function f() { return x; }").unwrap_err();
    }

    #[test]
    fn constant_pool_dedups_repeated_literals() {
        let mut globals = Globals::new();
        compile_source(&mut globals, "function f() { local a = 5; local b = 5; return a + b; }").unwrap();
        let index = globals.lookup("f").unwrap();
        let Value::Function(func) = globals.fetch(index) else { panic!("expected function") };
        // one `5` constant shared by both locals, plus the trailing implicit `null`.
        assert_eq!(func.body.constants.len(), 2);
    }

    #[test]
    fn redeclaring_a_local_reuses_its_slot() {
        let mut globals = Globals::new();
        compile_source(&mut globals, "function f() { local a = 1; local a = 2; return a; }").unwrap();
        let index = globals.lookup("f").unwrap();
        let Value::Function(func) = globals.fetch(index) else { panic!("expected function") };
        // args(0) + one `a` slot + return slot => 2 locals total.
        assert_eq!(func.body.local_count, 2);
    }
}
