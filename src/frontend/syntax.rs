// syntax analysis
//
// Nodes record the index of their leading token (`at`) so later phases can
// report source lines.
use super::lexer::TokenKind as Tk;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOperator {
	Negation,
	LogicalNot,
	Complement,
	PreIncrement,
	PreDecrement,
	PostIncrement,
	PostDecrement,
	Address,
	Indirection,
}

impl UnaryOperator {
	pub fn symbol(self) -> &'static str {
		use UnaryOperator::*;
		match self {
			Negation => "-",
			LogicalNot => "!",
			Complement => "~",
			PreIncrement | PostIncrement => "++",
			PreDecrement | PostDecrement => "--",
			Address => "&",
			Indirection => "*",
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOperator {
	Multiplication,
	Division,
	Remainder,
	Addition,
	Subtraction,
	Less,
	LessOrEqual,
	Greater,
	GreaterOrEqual,
	Equal,
	NotEqual,
	BitwiseAnd,
	BitwiseXor,
	BitwiseOr,
	LogicalAnd,
	LogicalOr,
	Assignment,
	AdditionAssignment,
	SubtractionAssignment,
	MultiplicationAssignment,
	DivisionAssignment,
	RemainderAssignment,
	AndAssignment,
	XorAssignment,
	OrAssignment,
}

impl BinaryOperator {
	pub fn symbol(self) -> &'static str {
		use BinaryOperator::*;
		match self {
			Multiplication => "*",
			Division => "/",
			Remainder => "%",
			Addition => "+",
			Subtraction => "-",
			Less => "<",
			LessOrEqual => "<=",
			Greater => ">",
			GreaterOrEqual => ">=",
			Equal => "==",
			NotEqual => "!=",
			BitwiseAnd => "&",
			BitwiseXor => "^",
			BitwiseOr => "|",
			LogicalAnd => "&&",
			LogicalOr => "||",
			Assignment => "=",
			AdditionAssignment => "+=",
			SubtractionAssignment => "-=",
			MultiplicationAssignment => "*=",
			DivisionAssignment => "/=",
			RemainderAssignment => "%=",
			AndAssignment => "&=",
			XorAssignment => "^=",
			OrAssignment => "|=",
		}
	}

	pub fn is_assignment(self) -> bool { self == BinaryOperator::Assignment || self.compound().is_some() }

	// a op= b  ~>  a = a op b
	pub fn compound(self) -> Option<BinaryOperator> {
		use BinaryOperator::*;
		match self {
			AdditionAssignment => Some(Addition),
			SubtractionAssignment => Some(Subtraction),
			MultiplicationAssignment => Some(Multiplication),
			DivisionAssignment => Some(Division),
			RemainderAssignment => Some(Remainder),
			AndAssignment => Some(BitwiseAnd),
			XorAssignment => Some(BitwiseXor),
			OrAssignment => Some(BitwiseOr),
			_ => None,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Constant<'a> {
	IntegerConst(i64),
	CharacterConst(&'a str),
	BooleanConst(bool),
	StringConst(&'a str),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Identifier<'a>(pub &'a str);

#[derive(Clone, Debug)]
pub struct UnaryOperatorExpression<'a> {
	pub operator: UnaryOperator,
	pub operand: Box<Expression<'a>>,
	pub at: usize,
}

#[derive(Clone, Debug)]
pub struct BinaryOperatorExpression<'a> {
	pub operator: BinaryOperator,
	pub lhs: Box<Expression<'a>>,
	pub rhs: Box<Expression<'a>>,
	pub at: usize,
}

#[derive(Clone, Debug)]
pub struct CallExpression<'a> {
	pub callee: Identifier<'a>,
	pub arguments: Vec<Expression<'a>>,
	pub at: usize,
}

#[derive(Clone, Debug)]
pub struct IndexExpression<'a> {
	pub base: Box<Expression<'a>>,
	pub index: Box<Expression<'a>>,
	pub at: usize,
}

#[derive(Clone, Debug)]
pub enum Expression<'a> {
	UnaryOperatorExpr(UnaryOperatorExpression<'a>),
	BinaryOperatorExpr(BinaryOperatorExpression<'a>),
	ConstantExpr(Constant<'a>, usize),
	IdentifierExpr(Identifier<'a>, usize),
	CallExpr(CallExpression<'a>),
	IndexExpr(IndexExpression<'a>),
}

impl Expression<'_> {
	pub fn at(&self) -> usize {
		use Expression::*;
		match self {
			UnaryOperatorExpr(UnaryOperatorExpression { at, .. })
			| BinaryOperatorExpr(BinaryOperatorExpression { at, .. })
			| ConstantExpr(_, at)
			| IdentifierExpr(_, at)
			| CallExpr(CallExpression { at, .. })
			| IndexExpr(IndexExpression { at, .. }) => *at,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeSpecifier {
	VoidTy,
	CharTy,
	IntTy,
	BoolTy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArrayBound<'a> {
	Fixed(i64),
	Named(Identifier<'a>),
	Unspecified,
}

// C11 6.7.6 Declarators, in the order they were written after the name
#[derive(Clone, Debug)]
pub enum DerivedDeclarator<'a> {
	Array(ArrayBound<'a>),
	Function(Vec<ParameterDeclaration<'a>>),
}

#[derive(Clone, Debug)]
pub struct Declarator<'a> {
	pub ident: Identifier<'a>,
	pub pointers: usize,
	pub derived: Vec<DerivedDeclarator<'a>>,
	pub at: usize,
}

#[derive(Clone, Debug)]
pub struct ParameterDeclaration<'a> {
	pub specifier: TypeSpecifier,
	pub declarator: Declarator<'a>,
}

#[derive(Clone, Debug)]
pub enum Initializer<'a> {
	ExpressionInit(Expression<'a>),
	ListInit(Vec<Expression<'a>>, usize),
}

#[derive(Clone, Debug)]
pub struct InitDeclarator<'a> {
	pub declarator: Declarator<'a>,
	pub initializer: Option<Initializer<'a>>,
}

// C11 6.7 Declarations
#[derive(Clone, Debug)]
pub struct Declaration<'a> {
	pub specifier: TypeSpecifier,
	pub declarators: Vec<InitDeclarator<'a>>,
	pub at: usize,
}

#[derive(Clone, Debug)]
pub struct IfStatement<'a> {
	pub condition: Expression<'a>,
	pub then_statement: Box<Statement<'a>>,
	pub else_statement: Option<Box<Statement<'a>>>,
	pub at: usize,
}

#[derive(Clone, Debug)]
pub enum ForInitializer<'a> {
	DeclarationInit(Declaration<'a>),
	ExpressionInit(Option<Expression<'a>>),
}

// C11 6.8.5.3 The for statement
#[derive(Clone, Debug)]
pub struct ForStatement<'a> {
	pub initializer: ForInitializer<'a>,
	pub condition: Option<Expression<'a>>,
	pub step: Option<Expression<'a>>,
	pub statement: Box<Statement<'a>>,
	pub at: usize,
}

// C11 6.8.5.1 The while statement
#[derive(Clone, Debug)]
pub struct WhileStatement<'a> {
	pub condition: Expression<'a>,
	pub statement: Box<Statement<'a>>,
	pub at: usize,
}

#[derive(Clone, Debug)]
pub enum Statement<'a> {
	CompoundStmt(Vec<Statement<'a>>, usize),

	// e.g. return 1 + 2; or just return;
	ReturnStmt(Option<Expression<'a>>, usize),

	BreakStmt(usize),

	ContinueStmt(usize),

	// e.g. int i, a[10];
	DeclarationStmt(Declaration<'a>),

	// e.g. i = 10; or just ; (i.e. null statement)
	ExpressionStmt(Option<Expression<'a>>, usize),

	IfStmt(IfStatement<'a>),

	ForStmt(ForStatement<'a>),

	WhileStmt(WhileStatement<'a>),

	// cin >> a >> b;
	InputStmt(Vec<Expression<'a>>, usize),

	// cout << a << "text";
	OutputStmt(Vec<Expression<'a>>, usize),

	// tokens skipped while resynchronizing after a syntax error
	InvalidStmt(usize),
}

#[derive(Clone, Debug)]
pub struct FunctionDefinition<'a> {
	pub specifier: TypeSpecifier,
	pub declarator: Declarator<'a>,
	pub body: Vec<Statement<'a>>, // statements of the single compound body
	pub at: usize,
}

#[derive(Clone, Debug)]
pub enum ExternalDeclaration<'a> {
	FunctionDefinitionDecl(FunctionDefinition<'a>),
	Decl(Declaration<'a>),
	Stmt(Statement<'a>),
}

#[derive(Clone, Debug)]
pub struct TranslationUnit<'a>(pub Vec<ExternalDeclaration<'a>>);

fn unary<'a>(operator: UnaryOperator, operand: Expression<'a>, at: usize) -> Expression<'a> {
	Expression::UnaryOperatorExpr(UnaryOperatorExpression { operator, operand: Box::new(operand), at })
}

fn binary<'a>(operator: BinaryOperator, lhs: Expression<'a>, rhs: Expression<'a>, at: usize) -> Expression<'a> {
	Expression::BinaryOperatorExpr(BinaryOperatorExpression {
		operator,
		lhs: Box::new(lhs),
		rhs: Box::new(rhs),
		at,
	})
}

peg::parser! {grammar parser<'a>() for [Tk<'a>] {
	rule at() -> usize = p:position!() { p }

	rule identifier() -> Identifier<'a>
		= t:[_] {?
			if let Tk::Ident(i) = t { Ok(Identifier(i)) } else { Err("identifier") }
		}

	rule constant() -> Constant<'a>
		= t:[_] {?
			match t {
				Tk::Integer(i) => Ok(Constant::IntegerConst(i)),
				Tk::Character(c) => Ok(Constant::CharacterConst(c)),
				Tk::Str(s) => Ok(Constant::StringConst(s)),
				Tk::True => Ok(Constant::BooleanConst(true)),
				Tk::False => Ok(Constant::BooleanConst(false)),
				_ => Err("constant"),
			}
		}

	rule type_specifier() -> TypeSpecifier
		= [Tk::Void] { TypeSpecifier::VoidTy }
		/ [Tk::Char] { TypeSpecifier::CharTy }
		/ [Tk::Int] { TypeSpecifier::IntTy }
		/ [Tk::Bool] { TypeSpecifier::BoolTy }

	// https://en.cppreference.com/w/cpp/language/operator_precedence
	pub rule expression() -> Expression<'a> = precedence!{
		a:@ at:at() [Tk::Assign] b:(@) { binary(BinaryOperator::Assignment, a, b, at) }
		a:@ at:at() [Tk::PlusAssign] b:(@) { binary(BinaryOperator::AdditionAssignment, a, b, at) }
		a:@ at:at() [Tk::MinusAssign] b:(@) { binary(BinaryOperator::SubtractionAssignment, a, b, at) }
		a:@ at:at() [Tk::StarAssign] b:(@) { binary(BinaryOperator::MultiplicationAssignment, a, b, at) }
		a:@ at:at() [Tk::SlashAssign] b:(@) { binary(BinaryOperator::DivisionAssignment, a, b, at) }
		a:@ at:at() [Tk::PercentAssign] b:(@) { binary(BinaryOperator::RemainderAssignment, a, b, at) }
		a:@ at:at() [Tk::AmpAssign] b:(@) { binary(BinaryOperator::AndAssignment, a, b, at) }
		a:@ at:at() [Tk::CaretAssign] b:(@) { binary(BinaryOperator::XorAssignment, a, b, at) }
		a:@ at:at() [Tk::PipeAssign] b:(@) { binary(BinaryOperator::OrAssignment, a, b, at) }
		--
		a:(@) at:at() [Tk::PipePipe] b:@ { binary(BinaryOperator::LogicalOr, a, b, at) }
		--
		a:(@) at:at() [Tk::AmpAmp] b:@ { binary(BinaryOperator::LogicalAnd, a, b, at) }
		--
		a:(@) at:at() [Tk::Pipe] b:@ { binary(BinaryOperator::BitwiseOr, a, b, at) }
		--
		a:(@) at:at() [Tk::Caret] b:@ { binary(BinaryOperator::BitwiseXor, a, b, at) }
		--
		a:(@) at:at() [Tk::Amp] b:@ { binary(BinaryOperator::BitwiseAnd, a, b, at) }
		--
		a:(@) at:at() [Tk::EqualEqual] b:@ { binary(BinaryOperator::Equal, a, b, at) }
		a:(@) at:at() [Tk::NotEqual] b:@ { binary(BinaryOperator::NotEqual, a, b, at) }
		--
		a:(@) at:at() [Tk::Less] b:@ { binary(BinaryOperator::Less, a, b, at) }
		a:(@) at:at() [Tk::LessEqual] b:@ { binary(BinaryOperator::LessOrEqual, a, b, at) }
		a:(@) at:at() [Tk::Greater] b:@ { binary(BinaryOperator::Greater, a, b, at) }
		a:(@) at:at() [Tk::GreaterEqual] b:@ { binary(BinaryOperator::GreaterOrEqual, a, b, at) }
		--
		a:(@) at:at() [Tk::Plus] b:@ { binary(BinaryOperator::Addition, a, b, at) }
		a:(@) at:at() [Tk::Minus] b:@ { binary(BinaryOperator::Subtraction, a, b, at) }
		--
		a:(@) at:at() [Tk::Star] b:@ { binary(BinaryOperator::Multiplication, a, b, at) }
		a:(@) at:at() [Tk::Slash] b:@ { binary(BinaryOperator::Division, a, b, at) }
		a:(@) at:at() [Tk::Percent] b:@ { binary(BinaryOperator::Remainder, a, b, at) }
		--
		at:at() [Tk::Minus] a:@ { unary(UnaryOperator::Negation, a, at) }
		at:at() [Tk::Bang] a:@ { unary(UnaryOperator::LogicalNot, a, at) }
		at:at() [Tk::Tilde] a:@ { unary(UnaryOperator::Complement, a, at) }
		at:at() [Tk::PlusPlus] a:@ { unary(UnaryOperator::PreIncrement, a, at) }
		at:at() [Tk::MinusMinus] a:@ { unary(UnaryOperator::PreDecrement, a, at) }
		at:at() [Tk::Amp] a:@ { unary(UnaryOperator::Address, a, at) }
		at:at() [Tk::Star] a:@ { unary(UnaryOperator::Indirection, a, at) }
		--
		a:(@) at:at() [Tk::PlusPlus] { unary(UnaryOperator::PostIncrement, a, at) }
		a:(@) at:at() [Tk::MinusMinus] { unary(UnaryOperator::PostDecrement, a, at) }
		a:(@) at:at() [Tk::LBracket] i:expression() [Tk::RBracket] {
			Expression::IndexExpr(IndexExpression {
				base: Box::new(a),
				index: Box::new(i),
				at,
			})
		}
		--
		at:at() i:identifier() [Tk::LParen] es:(expression() ** [Tk::Comma]) [Tk::RParen] {
			Expression::CallExpr(CallExpression {
				callee: i,
				arguments: es,
				at,
			})
		}
		at:at() i:identifier() { Expression::IdentifierExpr(i, at) }
		at:at() c:constant() { Expression::ConstantExpr(c, at) }
		[Tk::LParen] e:expression() [Tk::RParen] { e }
	}

	rule array_bound() -> ArrayBound<'a>
		= t:[Tk::Integer(_)] {?
			if let Tk::Integer(i) = t { Ok(ArrayBound::Fixed(i)) } else { Err("array bound") }
		}
		/ i:identifier() { ArrayBound::Named(i) }
		/ &[Tk::RBracket] { ArrayBound::Unspecified }

	// unnamed parameters of a prototype, e.g. int f(int, char *);
	rule abstract_declarator() -> Declarator<'a>
		= at:at() ps:[Tk::Star]* ds:derived_declarator()* {
			Declarator {
				ident: Identifier(""),
				pointers: ps.len(),
				derived: ds,
				at,
			}
		}

	rule parameter_declaration() -> ParameterDeclaration<'a>
		= s:type_specifier() d:(declarator() / abstract_declarator()) {
			ParameterDeclaration {
				specifier: s,
				declarator: d,
			}
		}

	rule parameter_list() -> Vec<ParameterDeclaration<'a>>
		= [Tk::Void] &[Tk::RParen] { Vec::new() }
		/ ps:(parameter_declaration() ** [Tk::Comma]) { ps }

	rule derived_declarator() -> DerivedDeclarator<'a>
		= [Tk::LBracket] b:array_bound() [Tk::RBracket] { DerivedDeclarator::Array(b) }
		/ [Tk::LParen] ps:parameter_list() [Tk::RParen] { DerivedDeclarator::Function(ps) }

	rule declarator() -> Declarator<'a>
		= at:at() ps:[Tk::Star]* i:identifier() ds:derived_declarator()* {
			Declarator {
				ident: i,
				pointers: ps.len(),
				derived: ds,
				at,
			}
		}

	rule initializer() -> Initializer<'a>
		= at:at() [Tk::LBrace] es:(expression() ** [Tk::Comma]) [Tk::Comma]? [Tk::RBrace] {
			Initializer::ListInit(es, at)
		}
		/ e:expression() { Initializer::ExpressionInit(e) }

	rule init_declarator() -> InitDeclarator<'a>
		= d:declarator() i:([Tk::Assign] i:initializer() { i })? {
			InitDeclarator {
				declarator: d,
				initializer: i,
			}
		}

	rule declaration() -> Declaration<'a>
		= at:at() s:type_specifier() ds:(init_declarator() ++ [Tk::Comma]) [Tk::Semicolon] {
			Declaration {
				specifier: s,
				declarators: ds,
				at,
			}
		}

	rule compound_stmt() -> Statement<'a>
		= at:at() [Tk::LBrace] ss:statement()* [Tk::RBrace] { Statement::CompoundStmt(ss, at) }

	rule if_stmt() -> Statement<'a>
		= at:at() [Tk::If] [Tk::LParen] e:expression() [Tk::RParen] ts:statement()
			es:([Tk::Else] s:statement() { s })? {
			Statement::IfStmt(IfStatement {
				condition: e,
				then_statement: Box::new(ts),
				else_statement: es.map(Box::new),
				at,
			})
		}

	rule while_stmt() -> Statement<'a>
		= at:at() [Tk::While] [Tk::LParen] c:expression() [Tk::RParen] st:statement() {
			Statement::WhileStmt(WhileStatement {
				condition: c,
				statement: Box::new(st),
				at,
			})
		}

	rule for_initializer() -> ForInitializer<'a>
		= d:declaration() { ForInitializer::DeclarationInit(d) }
		/ e:expression()? [Tk::Semicolon] { ForInitializer::ExpressionInit(e) }

	rule for_stmt() -> Statement<'a>
		= at:at() [Tk::For] [Tk::LParen] i:for_initializer() c:expression()? [Tk::Semicolon]
			s:expression()? [Tk::RParen] st:statement() {
			Statement::ForStmt(ForStatement {
				initializer: i,
				condition: c,
				step: s,
				statement: Box::new(st),
				at,
			})
		}

	rule jump_stmt() -> Statement<'a>
		= at:at() [Tk::Return] e:expression()? [Tk::Semicolon] { Statement::ReturnStmt(e, at) }
		/ at:at() [Tk::Break] [Tk::Semicolon] { Statement::BreakStmt(at) }
		/ at:at() [Tk::Continue] [Tk::Semicolon] { Statement::ContinueStmt(at) }

	rule input_stmt() -> Statement<'a>
		= at:at() [Tk::Cin] ts:([Tk::ShiftRight] e:expression() { e })+ [Tk::Semicolon] {
			Statement::InputStmt(ts, at)
		}

	rule output_stmt() -> Statement<'a>
		= at:at() [Tk::Cout] es:([Tk::ShiftLeft] e:expression() { e })+ [Tk::Semicolon] {
			Statement::OutputStmt(es, at)
		}

	rule expression_stmt() -> Statement<'a>
		= at:at() e:expression()? [Tk::Semicolon] { Statement::ExpressionStmt(e, at) }

	// panic mode: skip to the next ';' (or over a balanced block)
	rule sync() = [Tk::Semicolon | Tk::LBrace | Tk::RBrace]
	rule balanced() = [Tk::LBrace] (balanced() / ![Tk::RBrace] [_])* [Tk::RBrace]
	rule recovery() -> Statement<'a>
		= at:at() (!sync() [_])* ([Tk::Semicolon] / balanced()) { Statement::InvalidStmt(at) }
		/ at:at() (!sync() [_])+ { Statement::InvalidStmt(at) }

	rule statement() -> Statement<'a>
		= compound_stmt()
		/ if_stmt()
		/ while_stmt()
		/ for_stmt()
		/ jump_stmt()
		/ input_stmt()
		/ output_stmt()
		/ d:declaration() { Statement::DeclarationStmt(d) }
		/ expression_stmt()
		/ recovery()

	rule function_definition() -> FunctionDefinition<'a>
		= at:at() t:type_specifier() d:declarator() [Tk::LBrace] b:statement()* [Tk::RBrace] {
			FunctionDefinition {
				specifier: t,
				declarator: d,
				body: b,
				at
			}
		}

	rule external_declaration() -> ExternalDeclaration<'a>
		= f:function_definition() { ExternalDeclaration::FunctionDefinitionDecl(f) }
		/ d:declaration() { ExternalDeclaration::Decl(d) }
		/ s:statement() { ExternalDeclaration::Stmt(s) }
		/ at:at() [Tk::RBrace] { ExternalDeclaration::Stmt(Statement::InvalidStmt(at)) }

	pub rule translation_unit() -> TranslationUnit<'a>
		= eds:external_declaration()* { TranslationUnit(eds) }
}}

pub use peg::error::ParseError;

pub fn parse<'a>(tokens: &'a [Tk<'a>]) -> Result<TranslationUnit<'a>, ParseError<usize>> {
	parser::translation_unit(tokens)
}
