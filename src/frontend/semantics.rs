// semantics analysis
//
// The syntax tree is reduced bottom-up in source order. Each rule binds and
// type checks its construct against the scope table and synthesizes its
// three-address code from the code of its children.
use crate::{
	backend::{
		ir::{Code, Generator, Instruction},
		translation::{self, LoopLabels},
	},
	error, malformed, mismatch,
};

use super::{
	ast::{
		DeclarationNode, ExprKind, ExprNode, FunctionNode, Item, Jump, Place, PrimitiveType,
		SimpleType, Statement, StatementKind, TranslationUnitNode,
	},
	declarator::{Declared, DeclaratorBuilder, FunctionShape, ObjectShape},
	diagnostic::{Diagnostic, ErrorKind},
	lexer::Token,
	scope::{mangle, Dimension, Entry, FuncEntry, Owner, ScopeError, ScopeId, ScopeTable, VarEntry},
	syntax::{
		self, ArrayBound, BinaryOperatorExpression, CallExpression, Constant, Declarator,
		DerivedDeclarator, Expression, ExternalDeclaration, ForInitializer, ForStatement,
		FunctionDefinition, Identifier, IfStatement, IndexExpression, InitDeclarator, Initializer,
		ParameterDeclaration, TranslationUnit, UnaryOperator, UnaryOperatorExpression,
		WhileStatement,
	},
};

pub type Analysis<T> = Result<T, Diagnostic>;

struct LoopFrame {
	labels: LoopLabels,
	counted: bool, // for loop: `continue` goes to the update, not the test
}

enum Introduced {
	Object(ExprNode),
	Prototype(String),
}

// per-compilation state, nothing is shared between compilations
pub struct CompilationContext<'a> {
	tokens: &'a [Token<'a>],
	scopes: ScopeTable,
	generator: Generator,
	diagnostics: Vec<Diagnostic>,
	loops: Vec<LoopFrame>,
	function: Option<SimpleType>, // return type of the function being analyzed
}

fn statement(kind: StatementKind, code: Code) -> Statement { Statement { kind, code } }

fn empty_statement() -> Statement { statement(StatementKind::Expression(None), Vec::new()) }

fn concat<'n>(codes: impl IntoIterator<Item = &'n Code>) -> Code {
	codes.into_iter().flat_map(|c| c.iter().cloned()).collect()
}

fn apply(f: &FuncEntry, args: Vec<ExprNode>, place: Place, code: Code) -> ExprNode {
	ExprNode {
		kind: ExprKind::FunctionCall { callee: f.signature(), args, builtin: f.builtin },
		ty: f.return_type,
		dimensions: Vec::new(),
		place,
		code,
	}
}

// write `src` into a place that was checked to be assignable
fn store(target: &Place, src: String) -> Instruction {
	match target {
		Place::Element { base, index } => {
			Instruction::SetIndex { base: base.clone(), index: index.clone(), src }
		}
		Place::Deref(ptr) => Instruction::StorePtr { ptr: ptr.clone(), src },
		place => Instruction::Copy { dst: place.to_string(), src },
	}
}

fn scope_error(e: &ScopeError) -> ErrorKind {
	match e {
		ScopeError::UndeclaredDimension(name) => ErrorKind::UndeclaredIdentifier(name.clone()),
		ScopeError::NonIntegerDimension(_) => ErrorKind::MalformedDeclarator(e.to_string()),
		ScopeError::VariableLengthArray(_) => ErrorKind::Unsupported(e.to_string()),
		ScopeError::TooLarge(_) => ErrorKind::MalformedDeclarator(e.to_string()),
	}
}

fn identifier_node(name: &str, ty: SimpleType, dimensions: Vec<usize>) -> ExprNode {
	ExprNode {
		kind: ExprKind::Identifier { name: name.to_owned() },
		ty,
		dimensions,
		place: Place::Named(name.to_owned()),
		code: Vec::new(),
	}
}

impl<'a> CompilationContext<'a> {
	pub fn new(tokens: &'a [Token<'a>]) -> Self {
		CompilationContext {
			tokens,
			scopes: ScopeTable::new(),
			generator: Generator::new(),
			diagnostics: Vec::new(),
			loops: Vec::new(),
			function: None,
		}
	}

	pub fn finish(self) -> (ScopeTable, Vec<Diagnostic>) { (self.scopes, self.diagnostics) }

	pub fn error(&self, at: usize, kind: ErrorKind) -> Diagnostic {
		let line = self.tokens.get(at).or_else(|| self.tokens.last()).map_or(1, |t| t.line);
		Diagnostic::new(line, kind)
	}

	// a fresh temporary holding a value of type `ty`, recorded in the current scope
	fn temporary(&mut self, ty: SimpleType) -> String {
		let name = self.generator.temporary();
		self.scopes.insert_temporary(name.clone(), ty);
		name
	}

	fn recover<T>(&mut self, analysis: Analysis<T>) -> Option<T> {
		match analysis {
			Ok(t) => Some(t),
			Err(d) => {
				log::debug!("{}", d);
				self.diagnostics.push(d);
				None
			}
		}
	}

	// C11 6.9 External definitions
	pub fn translation_unit(&mut self, tu: &TranslationUnit<'_>) -> TranslationUnitNode {
		use ExternalDeclaration::*;

		let TranslationUnit(eds) = tu;
		let mut items = Vec::with_capacity(eds.len());
		for ed in eds {
			let item = match ed {
				FunctionDefinitionDecl(f) => {
					let f = self.function_definition(f);
					self.recover(f).map(Item::Function)
				}
				Decl(d) => self.declaration(d).map(Item::Declaration),
				Stmt(s) => self.statement(s).map(Item::Statement),
			};
			items.extend(item);
		}
		let code = concat(items.iter().map(Item::code));
		log::debug!("translation unit: {} items, {} instructions", items.len(), code.len());
		TranslationUnitNode { items, code }
	}

	fn function_definition(&mut self, f: &FunctionDefinition<'_>) -> Analysis<FunctionNode> {
		let FunctionDefinition { specifier, declarator, body, at } = f;

		let shape = match self.declarator(declarator, PrimitiveType::from(*specifier))? {
			Declared::Function(shape) => shape,
			Declared::Object(o) => error!(self, *at, malformed!("'{}' has a body but is not a function", o.name)),
		};
		if shape.params.iter().any(|p| p.name.is_empty()) {
			error!(self, declarator.at, malformed!("unnamed parameter in definition of '{}'", shape.name))
		}
		let entry = FuncEntry {
			name: shape.name.clone(),
			return_type: shape.return_type,
			parameter_types: shape.parameter_types(),
			local_scope: None,
			defined: true,
			builtin: false,
		};
		let signature = entry.signature();
		match self.scopes.insert(Entry::Function(entry)) {
			Ok((true, _)) => {}
			// definition of an earlier prototype
			Ok((false, Entry::Function(existing)))
				if !existing.defined && existing.return_type == shape.return_type =>
			{
				self.scopes.mark_defined(&signature)
			}
			_ => error!(self, declarator.at, ErrorKind::DuplicateDeclaration(signature)),
		}
		log::debug!("analyzing function {}", signature);

		// parameters are bound in the scope opened by the body's brace
		let scope = self.scopes.push_scope(Owner::Function(shape.name.clone()));
		self.scopes.link_local_scope(&signature, scope);
		let mut params = Vec::with_capacity(shape.params.len());
		for p in &shape.params {
			match self.scopes.insert(Entry::Variable(VarEntry::new(p.name.clone(), p.ty, Vec::new()))) {
				Ok((true, _)) => params.push(identifier_node(&p.name, p.ty, Vec::new())),
				_ => {
					let d = self.error(declarator.at, ErrorKind::DuplicateDeclaration(p.name.clone()));
					self.recover::<()>(Err(d));
				}
			}
		}

		self.function = Some(shape.return_type);
		let body: Vec<Statement> = body.iter().filter_map(|s| self.statement(s)).collect();
		self.function = None;
		self.scopes.pop_scope();

		let names: Vec<String> = params.iter().map(|p| p.place.to_string()).collect();
		let code = translation::function(&signature, &names, concat(body.iter().map(|s| &s.code)));
		Ok(FunctionNode {
			name: shape.name,
			signature,
			return_type: shape.return_type,
			params,
			body,
			scope,
			code,
		})
	}

	// Each declarator is analyzed on its own; a failing one is reported and
	// the rest of the declaration still binds.
	fn declaration(&mut self, d: &syntax::Declaration<'_>) -> Option<DeclarationNode> {
		let syntax::Declaration { specifier, declarators, .. } = d;
		let base = PrimitiveType::from(*specifier);

		let mut node = DeclarationNode { declared: Vec::new(), prototypes: Vec::new(), code: Vec::new() };
		let mut failed = false;
		for d in declarators {
			let introduced = self.init_declarator(base, d);
			match self.recover(introduced) {
				Some(Introduced::Object(o)) => {
					node.code.extend(o.code.iter().cloned());
					node.declared.push(o);
				}
				Some(Introduced::Prototype(signature)) => node.prototypes.push(signature),
				None => failed = true,
			}
		}
		if failed { None } else { Some(node) }
	}

	fn init_declarator(&mut self, base: PrimitiveType, d: &InitDeclarator<'_>) -> Analysis<Introduced> {
		let InitDeclarator { declarator, initializer } = d;
		match self.declarator(declarator, base)? {
			Declared::Function(shape) => {
				if initializer.is_some() {
					error!(self, declarator.at, malformed!("function '{}' has an initializer", shape.name))
				}
				self.prototype(shape, declarator.at).map(Introduced::Prototype)
			}
			Declared::Object(shape) => {
				self.object(shape, initializer.as_ref(), declarator.at).map(Introduced::Object)
			}
		}
	}

	// C11 6.7.6 Declarators
	fn declarator(&self, d: &Declarator<'_>, base: PrimitiveType) -> Analysis<Declared> {
		let Declarator { ident: Identifier(name), pointers, derived, at } = d;

		let mut builder = DeclaratorBuilder::new(name);
		for _ in 0..*pointers {
			builder.pointer();
		}
		for suffix in derived {
			let shaped = match suffix {
				DerivedDeclarator::Array(bound) => {
					let dimension = match bound {
						ArrayBound::Fixed(n) if *n > 0 => Some(Dimension::Fixed(*n as usize)),
						ArrayBound::Fixed(n) => {
							error!(self, *at, malformed!("array '{}' has non-positive size {}", name, n))
						}
						ArrayBound::Named(Identifier(n)) => Some(Dimension::Named((*n).to_owned())),
						ArrayBound::Unspecified => None,
					};
					builder.array(dimension)
				}
				DerivedDeclarator::Function(params) => {
					let mut shapes = Vec::with_capacity(params.len());
					for ParameterDeclaration { specifier, declarator } in params {
						shapes.push(self.declarator(declarator, PrimitiveType::from(*specifier))?);
					}
					builder.function(shapes)
				}
			};
			shaped.map_err(|kind| self.error(*at, kind))?;
		}
		builder.finish(base).map_err(|kind| self.error(*at, kind))
	}

	fn prototype(&mut self, shape: FunctionShape, at: usize) -> Analysis<String> {
		let entry = FuncEntry {
			name: shape.name.clone(),
			return_type: shape.return_type,
			parameter_types: shape.parameter_types(),
			local_scope: None,
			defined: false,
			builtin: false,
		};
		let signature = entry.signature();
		match self.scopes.insert(Entry::Function(entry)) {
			Ok((true, _)) => Ok(signature),
			Ok((false, Entry::Function(existing))) if existing.return_type == shape.return_type => {
				Ok(signature)
			}
			_ => error!(self, at, ErrorKind::DuplicateDeclaration(signature)),
		}
	}

	// The name is bound before its initializer is analyzed.
	fn object(
		&mut self, shape: ObjectShape, initializer: Option<&Initializer<'_>>, at: usize,
	) -> Analysis<ExprNode> {
		let ObjectShape { name, ty, dimensions } = shape;

		let mut resolved = Vec::with_capacity(dimensions.len());
		for d in dimensions {
			match (d, initializer) {
				(Some(d), _) => resolved.push(d),
				(None, Some(Initializer::ListInit(values, _))) if resolved.is_empty() && !values.is_empty() => {
					resolved.push(Dimension::Fixed(values.len()))
				}
				(None, _) => error!(self, at, malformed!("array '{}' has no size", name)),
			}
		}

		let var = match self.scopes.insert(Entry::Variable(VarEntry::new(name.clone(), ty, resolved))) {
			Ok((true, Entry::Variable(var))) => var,
			Ok(_) => error!(self, at, ErrorKind::DuplicateDeclaration(name)),
			Err(e) => error!(self, at, scope_error(&e)),
		};

		let mut code = Vec::new();
		if var.is_array() {
			code.push(Instruction::Alloc { place: name.clone(), size: var.size });
		}
		let node = identifier_node(&name, ty, var.fixed_dimensions());

		match initializer {
			None => {}

			Some(Initializer::ExpressionInit(e)) => {
				if node.is_array() {
					error!(self, e.at(), mismatch!("array '{}' initialized with a single value", name))
				}
				let v = self.value(e)?;
				self.resolve("=", &[ty, v.ty], e.at())?;
				code.extend(v.code);
				code.push(Instruction::Copy { dst: name, src: v.place.to_string() });
			}

			Some(Initializer::ListInit(values, list_at)) => {
				if !node.is_array() {
					error!(self, *list_at, mismatch!("initializer list for scalar '{}'", name))
				}
				let capacity = node.dimensions.iter().try_fold(1usize, |n, d| n.checked_mul(*d)).unwrap_or(usize::MAX);
				if values.len() > capacity {
					error!(self, *list_at, mismatch!("too many initializers for '{}'", name))
				}
				for (i, e) in values.iter().enumerate() {
					let v = self.value(e)?;
					self.resolve("=", &[ty, v.ty], e.at())?;
					code.extend(v.code);
					code.push(Instruction::SetIndex {
						base: name.clone(),
						index: i.to_string(),
						src: v.place.to_string(),
					});
				}
			}
		}

		Ok(ExprNode { code, ..node })
	}

	fn statement(&mut self, s: &syntax::Statement<'_>) -> Option<Statement> {
		let analysis = self.analyze_statement(s);
		self.recover(analysis)
	}

	// a failed sub-statement has already been reported
	fn nested(&mut self, s: &syntax::Statement<'_>) -> Statement {
		self.statement(s).unwrap_or_else(empty_statement)
	}

	// C11 6.8 Statements and blocks
	fn analyze_statement(&mut self, stmt: &syntax::Statement<'_>) -> Analysis<Statement> {
		use syntax::Statement::*;

		match stmt {
			CompoundStmt(ss, _) => {
				let scope = self.scopes.push_scope(Owner::Block(self.scopes.owning_function()));
				let body: Vec<Statement> = ss.iter().filter_map(|s| self.statement(s)).collect();
				self.scopes.pop_scope();
				let code = concat(body.iter().map(|s| &s.code));
				Ok(statement(StatementKind::Compound { body, scope }, code))
			}

			IfStmt(IfStatement { condition, then_statement, else_statement, .. }) => {
				let condition = self.condition(condition)?;
				let then_branch = self.nested(then_statement);
				let else_branch = else_statement.as_ref().map(|s| self.nested(s));
				let cond = condition.place.to_string();
				let code = match &else_branch {
					Some(e) => translation::if_then_else(
						condition.code.clone(),
						cond,
						then_branch.code.clone(),
						e.code.clone(),
						&mut self.generator,
					),
					None => translation::if_then(
						condition.code.clone(),
						cond,
						then_branch.code.clone(),
						&mut self.generator,
					),
				};
				let kind = StatementKind::If {
					condition,
					then_branch: Box::new(then_branch),
					else_branch: else_branch.map(Box::new),
				};
				Ok(statement(kind, code))
			}

			WhileStmt(WhileStatement { condition, statement: body, .. }) => {
				let begin = self.generator.label();
				let after = self.generator.label();
				let condition = self.condition(condition)?;

				let labels = LoopLabels { begin, after, next: None };
				self.loops.push(LoopFrame { labels: labels.clone(), counted: false });
				let body = self.nested(body);
				self.loops.pop();

				let code = translation::while_loop(
					labels,
					condition.code.clone(),
					condition.place.to_string(),
					body.code.clone(),
				);
				Ok(statement(StatementKind::While { condition, body: Box::new(body) }, code))
			}

			ForStmt(f) => {
				// the init declaration is visible in the whole loop only
				let scope = self.scopes.push_scope(Owner::Block(self.scopes.owning_function()));
				let analysis = self.for_statement(f, scope);
				self.scopes.pop_scope();
				analysis
			}

			BreakStmt(at) => match self.loops.last() {
				Some(LoopFrame { labels, .. }) => {
					let code = vec![Instruction::Goto(labels.after.clone())];
					Ok(statement(StatementKind::Jump(Jump::Break), code))
				}
				None => error!(self, *at, ErrorKind::MisplacedJump("'break' outside a loop".to_owned())),
			},

			ContinueStmt(at) => {
				if let Some(LoopFrame { labels, counted }) = self.loops.last_mut() {
					let target = if *counted {
						let generator = &mut self.generator;
						labels.next.get_or_insert_with(|| generator.label()).clone()
					} else {
						labels.begin.clone()
					};
					return Ok(statement(StatementKind::Jump(Jump::Continue), vec![Instruction::Goto(target)]));
				}
				error!(self, *at, ErrorKind::MisplacedJump("'continue' outside a loop".to_owned()))
			}

			ReturnStmt(value, at) => {
				let ret = match self.function {
					Some(ret) => ret,
					None => error!(self, *at, ErrorKind::MisplacedJump("'return' outside a function".to_owned())),
				};
				match value {
					Some(e) => {
						let v = self.value(e)?;
						if ret.is_void() {
							error!(self, *at, mismatch!("value returned from a function returning 'void'"))
						}
						if self.scopes.lookup_function(&mangle("=", &[ret, v.ty])).is_none() {
							error!(self, *at, mismatch!("cannot return '{}' from a function returning '{}'", v.ty, ret))
						}
						let mut code = v.code.clone();
						code.push(Instruction::StoreRet(v.place.to_string()));
						code.push(Instruction::Return);
						Ok(statement(StatementKind::Jump(Jump::Return(Some(v))), code))
					}
					None if !ret.is_void() => {
						error!(self, *at, mismatch!("missing return value in a function returning '{}'", ret))
					}
					None => Ok(statement(StatementKind::Jump(Jump::Return(None)), vec![Instruction::Return])),
				}
			}

			InputStmt(targets, _) => {
				let mut nodes = Vec::with_capacity(targets.len());
				let mut code = Vec::new();
				for t in targets {
					let target = self.expression(t)?;
					self.assignable(&target, t.at())?;
					self.resolve("in", &[target.ty], t.at())?;
					code.extend(target.code.iter().cloned());
					match &target.place {
						Place::Named(name) => code.push(Instruction::Input(name.clone())),
						place => {
							let tmp = self.temporary(target.ty);
							code.push(Instruction::Input(tmp.clone()));
							code.push(store(place, tmp));
						}
					}
					nodes.push(target);
				}
				Ok(statement(StatementKind::Input { targets: nodes }, code))
			}

			OutputStmt(args, _) => {
				let mut nodes = Vec::with_capacity(args.len());
				let mut code = Vec::new();
				for a in args {
					let v = self.value(a)?;
					self.resolve("out", &[v.ty], a.at())?;
					code.extend(v.code.iter().cloned());
					code.push(Instruction::Output(v.place.to_string()));
					nodes.push(v);
				}
				Ok(statement(StatementKind::Output { args: nodes }, code))
			}

			// declarators report their own failures
			DeclarationStmt(d) => match self.declaration(d) {
				Some(d) => {
					let code = d.code.clone();
					Ok(statement(StatementKind::Declaration(d), code))
				}
				None => Ok(empty_statement()),
			},

			ExpressionStmt(e, _) => match e {
				Some(e) => {
					let e = self.expression(e)?;
					let code = e.code.clone();
					Ok(statement(StatementKind::Expression(Some(e)), code))
				}
				None => Ok(empty_statement()),
			},

			InvalidStmt(at) => {
				let near = self.tokens.get(*at).map_or_else(|| "end of input".to_owned(), |t| format!("'{}'", t.kind));
				error!(self, *at, ErrorKind::Syntax(format!("unexpected {}", near)))
			}
		}
	}

	// C11 6.8.5.3 The for statement
	fn for_statement(&mut self, f: &ForStatement<'_>, scope: ScopeId) -> Analysis<Statement> {
		let ForStatement { initializer, condition, step, statement: body, .. } = f;

		let init = match initializer {
			ForInitializer::DeclarationInit(d) => self.declaration(d).map(|d| {
				let code = d.code.clone();
				statement(StatementKind::Declaration(d), code)
			}),
			ForInitializer::ExpressionInit(Some(e)) => {
				let e = self.expression(e)?;
				let code = e.code.clone();
				Some(statement(StatementKind::Expression(Some(e)), code))
			}
			ForInitializer::ExpressionInit(None) => None,
		};
		let condition = match condition {
			Some(c) => Some(self.condition(c)?),
			None => None,
		};
		let update = match step {
			Some(u) => Some(self.expression(u)?),
			None => None,
		};

		let begin = self.generator.label();
		let after = self.generator.label();
		self.loops.push(LoopFrame {
			labels: LoopLabels { begin: begin.clone(), after: after.clone(), next: None },
			counted: true,
		});
		let body = self.nested(body);
		let next = self.loops.pop().and_then(|frame| frame.labels.next);

		let code = translation::for_loop(
			LoopLabels { begin, after, next },
			init.as_ref().map(|s| s.code.clone()).unwrap_or_default(),
			condition.as_ref().map(|c| (c.code.clone(), c.place.to_string())),
			update.as_ref().map(|u| u.code.clone()).unwrap_or_default(),
			body.code.clone(),
		);
		let kind = StatementKind::For { init: init.map(Box::new), condition, update, body: Box::new(body), scope };
		Ok(statement(kind, code))
	}

	fn condition(&mut self, e: &Expression<'_>) -> Analysis<ExprNode> {
		let c = self.value(e)?;
		if c.ty.is_void() || c.ty.base == PrimitiveType::Undeclared {
			error!(self, e.at(), mismatch!("'{}' value used as a condition", c.ty))
		}
		Ok(c)
	}

	fn resolve(&self, name: &str, types: &[SimpleType], at: usize) -> Analysis<FuncEntry> {
		let signature = mangle(name, types);
		match self.scopes.lookup_function(&signature) {
			Some(f) => Ok(f.clone()),
			None => Err(self.error(at, mismatch!("no operator matching '{}'", signature))),
		}
	}

	// C11 6.3.2.1 Lvalues, arrays, and function designators
	fn assignable(&self, target: &ExprNode, at: usize) -> Analysis<()> {
		match (&target.place, &target.kind) {
			(Place::Named(_), ExprKind::Identifier { .. }) | (Place::Element { .. }, _) | (Place::Deref(_), _)
				if !target.is_array() =>
			{
				Ok(())
			}
			_ => error!(self, at, ErrorKind::NotAssignable(target.place.to_string())),
		}
	}

	// Loads element and pointer accesses into a temporary; a one-dimensional
	// array decays to a pointer to its first element.
	fn rvalue(&mut self, mut node: ExprNode, at: usize) -> Analysis<ExprNode> {
		match node.dimensions.len() {
			0 => {}
			1 if matches!(node.place, Place::Named(_)) => {
				node.ty = node.ty.pointer_to();
				node.dimensions.clear();
				return Ok(node);
			}
			1 => error!(self, at, ErrorKind::Unsupported(format!("array row '{}' used as a value", node.place))),
			_ => error!(self, at, mismatch!("array '{}' used as a value", node.place)),
		}

		let (dst, load) = match &node.place {
			Place::Element { base, index } => {
				let dst = self.temporary(node.ty);
				let load = Instruction::GetIndex { dst: dst.clone(), base: base.clone(), index: index.clone() };
				(dst, load)
			}
			Place::Deref(ptr) => {
				let dst = self.temporary(node.ty);
				(dst.clone(), Instruction::Unary { dst, op: "*", src: ptr.clone() })
			}
			_ => return Ok(node),
		};
		node.code.push(load);
		node.place = Place::Temporary(dst);
		Ok(node)
	}

	fn value(&mut self, e: &Expression<'_>) -> Analysis<ExprNode> {
		let node = self.expression(e)?;
		self.rvalue(node, e.at())
	}

	// C11 6.5 Expressions
	fn expression(&mut self, expr: &Expression<'_>) -> Analysis<ExprNode> {
		use Expression::*;
		match expr {
			ConstantExpr(c, _) => Ok(Self::constant(*c)),
			IdentifierExpr(Identifier(name), at) => self.identifier(name, *at),
			UnaryOperatorExpr(e) => self.unary(e),
			BinaryOperatorExpr(e) if e.operator.is_assignment() => self.assignment(e),
			BinaryOperatorExpr(e) => self.binary(e),
			CallExpr(e) => self.call(e),
			IndexExpr(e) => self.index(e),
		}
	}

	fn constant(c: Constant<'_>) -> ExprNode {
		use Constant::*;
		let (ty, value) = match c {
			IntegerConst(i) => (SimpleType::INT, i.to_string()),
			CharacterConst(c) => (SimpleType::CHAR, c.to_owned()),
			BooleanConst(b) => (SimpleType::BOOL, b.to_string()),
			StringConst(s) => (SimpleType::CHAR.pointer_to(), s.to_owned()),
		};
		ExprNode {
			kind: ExprKind::Constant { value: value.clone() },
			ty,
			dimensions: Vec::new(),
			place: Place::Literal(value),
			code: Vec::new(),
		}
	}

	fn identifier(&self, name: &str, at: usize) -> Analysis<ExprNode> {
		match self.scopes.lookup(name) {
			Some(var) => Ok(identifier_node(name, var.ty, var.fixed_dimensions())),
			None if self.scopes.has_function(name) => error!(self, at, mismatch!("function '{}' used as a value", name)),
			None => error!(self, at, ErrorKind::UndeclaredIdentifier(name.to_owned())),
		}
	}

	fn unary(&mut self, e: &UnaryOperatorExpression<'_>) -> Analysis<ExprNode> {
		use UnaryOperator::*;

		let UnaryOperatorExpression { operator, operand, at } = e;
		match operator {
			Negation | Complement | LogicalNot => {
				let v = self.value(operand)?;
				let f = self.resolve(operator.symbol(), &[v.ty], *at)?;
				let dst = self.temporary(f.return_type);
				let mut code = v.code.clone();
				code.push(Instruction::Unary { dst: dst.clone(), op: operator.symbol(), src: v.place.to_string() });
				Ok(apply(&f, vec![v], Place::Temporary(dst), code))
			}

			PreIncrement | PreDecrement | PostIncrement | PostDecrement => self.step(*operator, operand, *at),

			Address => {
				let target = self.expression(operand)?;
				let name = match (&target.place, &target.kind) {
					(Place::Named(name), ExprKind::Identifier { .. }) if !target.is_array() => name.clone(),
					_ => error!(self, *at, mismatch!("cannot take the address of '{}'", target.place)),
				};
				let dst = self.temporary(target.ty.pointer_to());
				let mut code = target.code.clone();
				code.push(Instruction::Unary { dst: dst.clone(), op: "&", src: name });
				Ok(ExprNode {
					kind: ExprKind::FunctionCall { callee: mangle("&", &[target.ty]), args: Vec::new(), builtin: true },
					ty: target.ty.pointer_to(),
					dimensions: Vec::new(),
					place: Place::Temporary(dst),
					code,
				}
				.with_argument(target))
			}

			Indirection => {
				let v = self.value(operand)?;
				let ty = match v.ty.pointee() {
					Some(ty) => ty,
					None => error!(self, *at, mismatch!("dereference of non-pointer type '{}'", v.ty)),
				};
				Ok(ExprNode {
					kind: ExprKind::FunctionCall { callee: mangle("*", &[v.ty]), args: Vec::new(), builtin: true },
					ty,
					dimensions: Vec::new(),
					place: Place::Deref(v.place.to_string()),
					code: v.code.clone(),
				}
				.with_argument(v))
			}
		}
	}

	// ++ and --, prefix yields the new value and postfix the old one
	fn step(&mut self, operator: UnaryOperator, operand: &Expression<'_>, at: usize) -> Analysis<ExprNode> {
		use UnaryOperator::*;

		let target = self.expression(operand)?;
		self.assignable(&target, operand.at())?;
		let current = self.rvalue(target.clone(), operand.at())?;
		let f = self.resolve(operator.symbol(), &[current.ty], at)?;
		let arithmetic = if matches!(operator, PreIncrement | PostIncrement) { "+" } else { "-" };

		let mut code = current.code.clone();
		let old = if matches!(operator, PostIncrement | PostDecrement) {
			let old = self.temporary(current.ty);
			code.push(Instruction::Copy { dst: old.clone(), src: current.place.to_string() });
			Some(old)
		} else {
			None
		};
		let new = self.temporary(f.return_type);
		code.push(Instruction::Binary {
			dst: new.clone(),
			lhs: current.place.to_string(),
			op: arithmetic,
			rhs: "1".to_owned(),
		});
		code.push(store(&target.place, new.clone()));
		Ok(apply(&f, vec![target], Place::Temporary(old.unwrap_or(new)), code))
	}

	fn binary(&mut self, e: &BinaryOperatorExpression<'_>) -> Analysis<ExprNode> {
		let BinaryOperatorExpression { operator, lhs, rhs, at } = e;

		let lhs = self.value(lhs)?;
		let rhs = self.value(rhs)?;
		let f = self.resolve(operator.symbol(), &[lhs.ty, rhs.ty], *at)?;
		let dst = self.temporary(f.return_type);
		let mut code = concat(vec![&lhs.code, &rhs.code]);
		code.push(Instruction::Binary {
			dst: dst.clone(),
			lhs: lhs.place.to_string(),
			op: operator.symbol(),
			rhs: rhs.place.to_string(),
		});
		Ok(apply(&f, vec![lhs, rhs], Place::Temporary(dst), code))
	}

	// target address first, then the value, then the store
	fn assignment(&mut self, e: &BinaryOperatorExpression<'_>) -> Analysis<ExprNode> {
		let BinaryOperatorExpression { operator, lhs, rhs, at } = e;

		let target = self.expression(lhs)?;
		self.assignable(&target, lhs.at())?;
		let current = match operator.compound() {
			Some(_) => Some(self.rvalue(target.clone(), lhs.at())?),
			None => None,
		};
		let mut code = current.as_ref().map_or_else(|| target.code.clone(), |c| c.code.clone());

		let value = self.value(rhs)?;
		code.extend(value.code.iter().cloned());

		let (source, source_ty) = match (operator.compound(), current) {
			(Some(op), Some(current)) => {
				let f = self.resolve(op.symbol(), &[current.ty, value.ty], *at)?;
				let dst = self.temporary(f.return_type);
				code.push(Instruction::Binary {
					dst: dst.clone(),
					lhs: current.place.to_string(),
					op: op.symbol(),
					rhs: value.place.to_string(),
				});
				(Place::Temporary(dst), f.return_type)
			}
			_ => (value.place.clone(), value.ty),
		};

		let f = self.resolve("=", &[target.ty, source_ty], *at)?;
		code.push(store(&target.place, source.to_string()));
		Ok(apply(&f, vec![target, value], source, code))
	}

	fn call(&mut self, e: &CallExpression<'_>) -> Analysis<ExprNode> {
		let CallExpression { callee: Identifier(name), arguments, at } = e;

		let mut args = Vec::with_capacity(arguments.len());
		for a in arguments {
			args.push(self.value(a)?);
		}
		let types: Vec<SimpleType> = args.iter().map(|a| a.ty).collect();
		let signature = mangle(name, &types);
		let f = match self.scopes.lookup_function(&signature) {
			Some(f) => f.clone(),
			None if self.scopes.has_function(name) => {
				error!(self, *at, mismatch!("no overload of '{}' matching '{}'", name, signature))
			}
			None => error!(self, *at, ErrorKind::UndeclaredIdentifier((*name).to_owned())),
		};

		let result = if f.return_type.is_void() { None } else { Some(self.temporary(f.return_type)) };
		let code = translation::call(
			&signature,
			args.iter().map(|a| (a.code.clone(), a.place.to_string())).collect(),
			result.clone(),
		);
		Ok(apply(&f, args, result.map_or(Place::Void, Place::Temporary), code))
	}

	// Multi-dimensional subscripts are flattened row-major:
	// offset' = offset * dimension + index.
	fn index(&mut self, e: &IndexExpression<'_>) -> Analysis<ExprNode> {
		let IndexExpression { base, index, at } = e;

		let array = self.expression(base)?;
		if array.is_array() {
			let idx = self.value(index)?;
			let f = self.resolve("[]", &[array.ty, idx.ty], *at)?;
			let mut code = concat(vec![&array.code, &idx.code]);
			let place = match &array.place {
				Place::Named(name) => Place::Element { base: name.clone(), index: idx.place.to_string() },
				Place::Element { base, index: offset } => {
					let scaled = self.temporary(SimpleType::INT);
					code.push(Instruction::Binary {
						dst: scaled.clone(),
						lhs: offset.clone(),
						op: "*",
						rhs: array.dimensions[0].to_string(),
					});
					let flat = self.temporary(SimpleType::INT);
					code.push(Instruction::Binary {
						dst: flat.clone(),
						lhs: scaled,
						op: "+",
						rhs: idx.place.to_string(),
					});
					Place::Element { base: base.clone(), index: flat }
				}
				place => error!(self, *at, mismatch!("subscript of '{}'", place)),
			};
			let dimensions = array.dimensions[1..].to_vec();
			Ok(ExprNode { dimensions, ..apply(&f, vec![array, idx], place, code) })
		} else if let Some(element) = array.ty.pointee() {
			let ptr = self.rvalue(array, base.at())?;
			let idx = self.value(index)?;
			let f = self.resolve("[]", &[element, idx.ty], *at)?;
			let code = concat(vec![&ptr.code, &idx.code]);
			let place = Place::Element { base: ptr.place.to_string(), index: idx.place.to_string() };
			Ok(apply(&f, vec![ptr, idx], place, code))
		} else {
			error!(self, *at, mismatch!("subscript of non-array type '{}'", array.ty))
		}
	}
}

impl ExprNode {
	fn with_argument(mut self, arg: ExprNode) -> Self {
		if let ExprKind::FunctionCall { args, .. } = &mut self.kind {
			args.push(arg);
		}
		self
	}
}

#[cfg(test)]
mod tests {
	use crate::{
		backend::ir::listing,
		frontend::{
			ast::{ExprNode, Item, SimpleType, StatementKind},
			compile,
			diagnostic::{Diagnostic, ErrorKind},
			scope::ScopeId,
			Compilation,
		},
	};
	use std::collections::HashSet;

	fn init() { let _ = env_logger::builder().is_test(true).try_init(); }

	fn tac(src: &str) -> Vec<String> {
		init();
		match compile(src) {
			Ok(Compilation { code, .. }) => listing(&code),
			Err(diagnostics) => panic!("unexpected diagnostics: {:?}", diagnostics),
		}
	}

	fn diagnostics(src: &str) -> Vec<Diagnostic> {
		init();
		match compile(src) {
			Ok(Compilation { code, .. }) => panic!("unexpected success: {:?}", listing(&code)),
			Err(diagnostics) => diagnostics,
		}
	}

	fn single_error(src: &str) -> ErrorKind {
		let mut ds = diagnostics(src);
		assert_eq!(ds.len(), 1, "{:?}", ds);
		ds.remove(0).kind
	}

	// every jump target is defined once, every temporary is written before read
	fn assert_well_formed(code: &[String]) {
		let mut labels = HashSet::new();
		for line in code {
			let ts: Vec<&str> = line.split_whitespace().collect();
			if ts.len() == 2 && ts[1] == ":" && ts[0].starts_with('L') {
				assert!(labels.insert(ts[0].to_owned()), "label {} defined twice", ts[0]);
			}
		}
		let mut written = HashSet::new();
		for line in code {
			let ts: Vec<&str> = line.split_whitespace().collect();
			if ts.contains(&"GOTO") {
				let target = ts[ts.len() - 1];
				assert!(labels.contains(target), "undefined label {}", target);
			}
			let reads = if ts.len() > 1 && ts[1] == "=" && ts[0].starts_with("VAR") { &ts[2..] } else { &ts[..] };
			for t in reads.iter().copied().filter(|t| t.starts_with("VAR")) {
				assert!(written.contains(t), "{} read before written in '{}'", t, line);
			}
			if ts.len() > 1 && ts[1] == "=" && ts[0].starts_with("VAR") {
				written.insert(ts[0].to_owned());
			}
		}
	}

	#[test]
	fn constant_sum_assignment() {
		assert_eq!(tac("int x; x = 3 + 4;"), vec!["VAR1 = 3 + 4", "x = VAR1"]);
	}

	#[test]
	fn function_definition_and_call() {
		let code = tac("int f(int n) { return n; }\nint y;\ny = f(5);");
		assert_eq!(code, vec![
			"f(int) :",
			"LOAD_PARAM n",
			"STORE_RET n",
			"RETURN",
			"SAVE_CONTEXT",
			"STORE 5",
			"JAL f(int)",
			"VAR1 = RET_VAL",
			"y = VAR1",
		]);

		init();
		let Compilation { scopes, .. } = compile("int f(int n) { return n; }").unwrap();
		let f = scopes.lookup_function("f(int)").unwrap();
		assert!(f.defined);
		let local = f.local_scope.unwrap();
		assert!(scopes.scope(local).variables.contains_key("n"));
	}

	#[test]
	fn undeclared_identifier_is_reported_once() {
		assert_eq!(
			diagnostics("int y;\ny = z;"),
			vec![Diagnostic::new(2, ErrorKind::UndeclaredIdentifier("z".to_owned()))]
		);
	}

	#[test]
	fn if_else_output() {
		let code = tac("int a; int b; if (a > b) cout << a; else cout << b;");
		assert_eq!(code, vec![
			"VAR1 = a > b",
			"IF VAR1 == 0 GOTO L1",
			"OUT a",
			"GOTO L2",
			"L1 :",
			"OUT b",
			"L2 :",
		]);
	}

	#[test]
	fn while_with_break_and_continue() {
		let code = tac("int i; while (i < 10) { i = i + 1; if (i == 5) continue; if (i == 8) break; }");
		assert_eq!(code, vec![
			"L1 :",
			"VAR1 = i < 10",
			"IF VAR1 == 0 GOTO L2",
			"VAR2 = i + 1",
			"i = VAR2",
			"VAR3 = i == 5",
			"IF VAR3 == 0 GOTO L3",
			"GOTO L1",
			"L3 :",
			"VAR4 = i == 8",
			"IF VAR4 == 0 GOTO L4",
			"GOTO L2",
			"L4 :",
			"GOTO L1",
			"L2 :",
		]);
		assert_well_formed(&code);
	}

	#[test]
	fn for_continue_lands_before_update() {
		let code = tac("int s; for (int i = 0; i < 3; i++) { if (i == 1) continue; s += i; }");
		assert_eq!(code, vec![
			"i = 0",
			"L1 :",
			"VAR1 = i < 3",
			"IF VAR1 == 0 GOTO L2",
			"VAR4 = i == 1",
			"IF VAR4 == 0 GOTO L4",
			"GOTO L3",
			"L4 :",
			"VAR5 = s + i",
			"s = VAR5",
			"L3 :",
			"VAR2 = i",
			"VAR3 = i + 1",
			"i = VAR3",
			"GOTO L1",
			"L2 :",
		]);
		assert_well_formed(&code);
	}

	#[test]
	fn for_init_declaration_is_loop_local() {
		assert_eq!(
			single_error("for (int i = 0; i < 3; ++i) ;\ni = 1;"),
			ErrorKind::UndeclaredIdentifier("i".to_owned())
		);
	}

	#[test]
	fn multi_dimensional_subscripts_flatten() {
		let code = tac("int m[2][3]; int k; k = m[1][2]; m[0][1] = k;");
		assert_eq!(code, vec![
			"ALLOC_MEM m 24",
			"VAR1 = 1 * 3",
			"VAR2 = VAR1 + 2",
			"VAR3 = GETIDX m VAR2",
			"k = VAR3",
			"VAR4 = 0 * 3",
			"VAR5 = VAR4 + 1",
			"SETIDX m VAR5 k",
		]);
	}

	#[test]
	fn initializer_list_sizes_the_array() {
		assert_eq!(tac("int a[] = {1, 2, 3};"), vec![
			"ALLOC_MEM a 12",
			"SETIDX a 0 1",
			"SETIDX a 1 2",
			"SETIDX a 2 3",
		]);
		assert!(matches!(single_error("int a[2] = {1, 2, 3};"), ErrorKind::TypeMismatch(_)));
	}

	#[test]
	fn pointers() {
		let code = tac("int x; int *p; p = &x; *p = 5; x = *p;");
		assert_eq!(code, vec!["VAR1 = & x", "p = VAR1", "STORE_PTR p 5", "VAR2 = * p", "x = VAR2"]);
		assert!(matches!(single_error("int x; *x = 1;"), ErrorKind::TypeMismatch(_)));
	}

	#[test]
	fn array_parameter_decays_to_pointer() {
		let code = tac("int first(int a[]) { return a[0]; }\nint v[4]; int r; r = first(v);");
		assert_eq!(code, vec![
			"first(int*) :",
			"LOAD_PARAM a",
			"VAR1 = GETIDX a 0",
			"STORE_RET VAR1",
			"RETURN",
			"ALLOC_MEM v 16",
			"SAVE_CONTEXT",
			"STORE v",
			"JAL first(int*)",
			"VAR2 = RET_VAL",
			"r = VAR2",
		]);
	}

	#[test]
	fn overloads_resolve_by_signature() {
		let code = tac("int f(int a) { return a; }\nint f(char c) { return c; }\nint r; r = f('a');");
		assert!(code.contains(&"JAL f(char)".to_owned()));
		assert_eq!(
			single_error("int f(int a) { return a; }\nbool b; f(b);"),
			ErrorKind::TypeMismatch("no overload of 'f' matching 'f(bool)'".to_owned())
		);
		assert_eq!(single_error("g(1);"), ErrorKind::UndeclaredIdentifier("g".to_owned()));
	}

	#[test]
	fn void_call_has_no_result() {
		assert_eq!(tac("void g() { cout << 1; }\ng();"), vec![
			"g() :",
			"OUT 1",
			"RETURN",
			"SAVE_CONTEXT",
			"JAL g()",
		]);
		assert!(matches!(single_error("void g() { }\nint x; x = g();"), ErrorKind::TypeMismatch(_)));
	}

	#[test]
	fn operator_resolution() {
		assert_eq!(
			single_error("bool a; bool b; a = a + b;"),
			ErrorKind::TypeMismatch("no operator matching '+(bool,bool)'".to_owned())
		);

		init();
		let Compilation { unit, .. } = compile("int i; char c; i + c;").unwrap();
		match &unit.items[2] {
			Item::Statement(s) => match &s.kind {
				StatementKind::Expression(Some(ExprNode { ty, .. })) => assert_eq!(*ty, SimpleType::CHAR),
				k => panic!("unexpected {:?}", k),
			},
			i => panic!("unexpected {:?}", i),
		}
		assert!(matches!(single_error("bool b; int i; char c; b = i + c;"), ErrorKind::TypeMismatch(_)));
	}

	#[test]
	fn increments_and_compound_assignment() {
		assert_eq!(tac("int i; int j; j = i++;"), vec!["VAR1 = i", "VAR2 = i + 1", "i = VAR2", "j = VAR1"]);
		assert_eq!(tac("int i; int j; j = --i;"), vec!["VAR1 = i - 1", "i = VAR1", "j = VAR1"]);
		assert_eq!(tac("int a[2]; a[1] *= 3;"), vec![
			"ALLOC_MEM a 8",
			"VAR1 = GETIDX a 1",
			"VAR2 = VAR1 * 3",
			"SETIDX a 1 VAR2",
		]);
	}

	#[test]
	fn input_into_elements() {
		assert_eq!(tac("int a[2]; int n; cin >> n >> a[n];"), vec![
			"ALLOC_MEM a 8",
			"INPUT n",
			"INPUT VAR1",
			"SETIDX a n VAR1",
		]);
		assert!(matches!(single_error("bool b; cin >> b;"), ErrorKind::TypeMismatch(_)));
	}

	#[test]
	fn block_scoping_and_shadowing() {
		init();
		let Compilation { scopes, .. } = compile("int x; { char x; x = 'a'; } x = 1;").unwrap();
		assert_eq!(scopes.scope(ScopeId(1)).variables["x"].ty, SimpleType::CHAR);
		assert_eq!(scopes.lookup("x").map(|v| v.ty), Some(SimpleType::INT));
		assert_eq!(single_error("{ int y; }\ny = 1;"), ErrorKind::UndeclaredIdentifier("y".to_owned()));
	}

	#[test]
	fn declaration_errors() {
		assert_eq!(single_error("int x; char x;"), ErrorKind::DuplicateDeclaration("x".to_owned()));
		assert_eq!(
			single_error("int f(int a, int a) { return a; }"),
			ErrorKind::DuplicateDeclaration("a".to_owned())
		);
		assert!(matches!(single_error("int n; int a[n];"), ErrorKind::Unsupported(_)));
		assert_eq!(single_error("int a[m];"), ErrorKind::UndeclaredIdentifier("m".to_owned()));
		assert!(matches!(single_error("bool c; int a[c];"), ErrorKind::MalformedDeclarator(_)));
		assert!(matches!(single_error("int a[0];"), ErrorKind::MalformedDeclarator(_)));
		assert!(matches!(single_error("void v;"), ErrorKind::MalformedDeclarator(_)));
		assert!(matches!(single_error("int f(int)[3];"), ErrorKind::MalformedDeclarator(_)));
	}

	#[test]
	fn prototypes() {
		let code = tac("int f(int);\nint y; y = f(1);\nint f(int n) { return n; }");
		assert_eq!(code[2], "JAL f(int)");
		assert_eq!(
			single_error("int f(int);\nchar f(int n) { return n; }"),
			ErrorKind::DuplicateDeclaration("f(int)".to_owned())
		);
		assert_eq!(
			single_error("int f() { return 1; }\nint f() { return 2; }"),
			ErrorKind::DuplicateDeclaration("f()".to_owned())
		);
	}

	#[test]
	fn misplaced_jumps() {
		assert!(matches!(single_error("break;"), ErrorKind::MisplacedJump(_)));
		assert!(matches!(single_error("continue;"), ErrorKind::MisplacedJump(_)));
		assert!(matches!(single_error("return 1;"), ErrorKind::MisplacedJump(_)));
		assert!(matches!(single_error("void f() { return 1; }"), ErrorKind::TypeMismatch(_)));
	}

	#[test]
	fn not_assignable() {
		assert_eq!(single_error("int x; 3 = x;"), ErrorKind::NotAssignable("3".to_owned()));
		assert_eq!(single_error("int a[3]; int b[3]; a = b;"), ErrorKind::NotAssignable("a".to_owned()));
		assert!(matches!(single_error("int x; (x + 1)++;"), ErrorKind::NotAssignable(_)));
	}

	#[test]
	fn errors_are_collected_in_line_order() {
		let ds = diagnostics("int x = ;\n@\nint y;\ny = z;");
		let lines: Vec<usize> = ds.iter().map(|d| d.line).collect();
		assert_eq!(lines, vec![1, 2, 4]);
		assert!(matches!(ds[0].kind, ErrorKind::Syntax(_)));
		assert_eq!(ds[1].kind, ErrorKind::Lexical('@'));
		assert_eq!(ds[2].kind, ErrorKind::UndeclaredIdentifier("z".to_owned()));
	}

	#[test]
	fn nested_control_flow_is_well_formed() {
		let code = tac(
			"int fact(int n) {\n\
			 \tint r = 1;\n\
			 \twhile (n > 1) { r *= n; n--; }\n\
			 \treturn r;\n\
			 }\n\
			 int i; int t;\n\
			 for (i = 0; i < 5; i++) {\n\
			 \tif (i % 2 == 0) { t = fact(i); cout << t; } else continue;\n\
			 \tif (!(i < 4) && true) break;\n\
			 }",
		);
		assert_well_formed(&code);
		assert_eq!(code[0], "fact(int) :");
	}

	#[test]
	fn reanalysis_is_idempotent() {
		init();
		let src = "int g(char c) { return c + 1; }\nint a[3]; for (int i = 0; i < 3; i++) a[i] = g('x');";
		let first = compile(src).unwrap();
		let second = compile(src).unwrap();
		assert_eq!(first.unit, second.unit);
		assert_eq!(first.code, second.code);
	}

	#[test]
	fn oversized_arrays_are_diagnosed() {
		let too_large = ErrorKind::MalformedDeclarator("array 'a' is too large".to_owned());
		assert_eq!(single_error("int a[4611686018427387904];"), too_large);
		assert_eq!(single_error("int a[100000][100000][100000][100000][100000];"), too_large);
	}

	#[test]
	fn out_of_range_literal_is_one_error() {
		assert_eq!(
			single_error("int x; x = 99999999999999999999;"),
			ErrorKind::IntegerOutOfRange("99999999999999999999".to_owned())
		);
	}

	#[test]
	fn temporaries_are_typed_in_the_report() {
		init();
		let Compilation { scopes, .. } = compile("int x; x = 3 + 4;").unwrap();
		let temporaries = &scopes.scope(ScopeId(0)).temporaries;
		assert_eq!(temporaries.len(), 1);
		assert_eq!((temporaries[0].name.as_str(), temporaries[0].ty), ("VAR1", SimpleType::INT));
		assert!(scopes.to_string().lines().any(|l| l.split_whitespace().take(2).eq(vec!["VAR1", "int"])));
		assert!(scopes.lookup("VAR1").is_none());
	}

	#[test]
	fn nested_blocks_keep_their_function() {
		init();
		let src = "int f(int n) { if (n) { bool k; k = n > 1; } return n; }\n{ bool b; }";
		let Compilation { scopes, .. } = compile(src).unwrap();
		assert_eq!(scopes.scope(ScopeId(2)).owner.to_string(), "BLOCK in f");
		assert_eq!(scopes.scope(ScopeId(3)).owner.to_string(), "BLOCK");
		let temporaries = &scopes.scope(ScopeId(2)).temporaries;
		assert_eq!(temporaries.iter().map(|t| t.ty).collect::<Vec<_>>(), vec![SimpleType::BOOL]);
	}
}
