// diagnostics reported by every front-end phase
use thiserror::Error;

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
	#[error("lexical error: unrecognized character '{0}'")]
	Lexical(char),

	#[error("integer literal '{0}' out of range")]
	IntegerOutOfRange(String),

	#[error("syntax error: {0}")]
	Syntax(String),

	#[error("undeclared identifier '{0}'")]
	UndeclaredIdentifier(String),

	#[error("duplicate declaration of '{0}'")]
	DuplicateDeclaration(String),

	#[error("type mismatch: {0}")]
	TypeMismatch(String),

	#[error("malformed declarator: {0}")]
	MalformedDeclarator(String),

	#[error("unsupported: {0}")]
	Unsupported(String),

	#[error("'{0}' is not assignable")]
	NotAssignable(String),

	#[error("misplaced jump: {0}")]
	MisplacedJump(String),
}

/// One located error. A compilation succeeds iff none were recorded.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("line {line}: {kind}")]
pub struct Diagnostic {
	pub line: usize,
	pub kind: ErrorKind,
}

impl Diagnostic {
	pub fn new(line: usize, kind: ErrorKind) -> Self { Diagnostic { line, kind } }
}
