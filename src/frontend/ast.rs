// annotated syntax tree: every node carries its type, storage place and the
// three-address code already synthesized for the subtree
use std::fmt;

use super::{scope::ScopeId, syntax::TypeSpecifier};
use crate::backend::ir::Code;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveType {
	Void,
	Char,
	Int,
	Bool,
	Undeclared,
}

impl PrimitiveType {
	pub fn size(self) -> usize {
		use PrimitiveType::*;
		match self {
			Char | Bool => 1,
			Int => 4,
			Void | Undeclared => 0,
		}
	}

	pub fn name(self) -> &'static str {
		use PrimitiveType::*;
		match self {
			Void => "void",
			Char => "char",
			Int => "int",
			Bool => "bool",
			Undeclared => "undeclared",
		}
	}
}

impl From<TypeSpecifier> for PrimitiveType {
	fn from(ty: TypeSpecifier) -> Self {
		use TypeSpecifier::*;
		match ty {
			VoidTy => PrimitiveType::Void,
			CharTy => PrimitiveType::Char,
			IntTy => PrimitiveType::Int,
			BoolTy => PrimitiveType::Bool,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SimpleType {
	pub base: PrimitiveType,
	pub pointer_level: usize,
}

impl SimpleType {
	pub const VOID: SimpleType = SimpleType::scalar(PrimitiveType::Void);
	pub const CHAR: SimpleType = SimpleType::scalar(PrimitiveType::Char);
	pub const INT: SimpleType = SimpleType::scalar(PrimitiveType::Int);
	pub const BOOL: SimpleType = SimpleType::scalar(PrimitiveType::Bool);

	pub const fn scalar(base: PrimitiveType) -> Self { SimpleType { base, pointer_level: 0 } }

	pub fn pointer_to(self) -> Self { SimpleType { pointer_level: self.pointer_level + 1, ..self } }

	pub fn pointee(self) -> Option<Self> {
		if self.pointer_level > 0 {
			Some(SimpleType { pointer_level: self.pointer_level - 1, ..self })
		} else {
			None
		}
	}

	pub fn is_void(self) -> bool { self == Self::VOID }

	pub fn is_pointer(self) -> bool { self.pointer_level > 0 }

	pub fn size(self) -> usize { if self.is_pointer() { 8 } else { self.base.size() } }

	// value a variable of this type holds before any assignment
	pub fn default_value(self) -> &'static str {
		use PrimitiveType::*;
		if self.is_pointer() {
			return "NULL";
		}
		match self.base {
			Char => "'\\0'",
			Bool => "false",
			Int | Void | Undeclared => "0",
		}
	}
}

impl fmt::Display for SimpleType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}{}", self.base.name(), "*".repeat(self.pointer_level))
	}
}

// where an expression's value lives
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Place {
	Named(String),
	Temporary(String),
	Literal(String),
	// not materialized yet: `base[index]` or `*pointer`
	Element { base: String, index: String },
	Deref(String),
	Void,
}

impl fmt::Display for Place {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		use Place::*;
		match self {
			Named(s) | Temporary(s) | Literal(s) => f.write_str(s),
			Element { base, index } => write!(f, "{}[{}]", base, index),
			Deref(p) => write!(f, "*{}", p),
			Void => f.write_str("_"),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExprKind {
	Identifier { name: String },
	Constant { value: String },
	// operator applications are calls to the operator's mangled signature
	FunctionCall { callee: String, args: Vec<ExprNode>, builtin: bool },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExprNode {
	pub kind: ExprKind,
	pub ty: SimpleType,
	pub dimensions: Vec<usize>, // array dimensions not yet indexed
	pub place: Place,
	pub code: Code,
}

impl ExprNode {
	pub fn is_array(&self) -> bool { !self.dimensions.is_empty() }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Jump {
	Break,
	Continue,
	Return(Option<ExprNode>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StatementKind {
	Compound {
		body: Vec<Statement>,
		scope: ScopeId,
	},
	If {
		condition: ExprNode,
		then_branch: Box<Statement>,
		else_branch: Option<Box<Statement>>,
	},
	While {
		condition: ExprNode,
		body: Box<Statement>,
	},
	For {
		init: Option<Box<Statement>>,
		condition: Option<ExprNode>,
		update: Option<ExprNode>,
		body: Box<Statement>,
		scope: ScopeId,
	},
	Jump(Jump),
	Input {
		targets: Vec<ExprNode>,
	},
	Output {
		args: Vec<ExprNode>,
	},
	Expression(Option<ExprNode>),
	Declaration(DeclarationNode),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Statement {
	pub kind: StatementKind,
	pub code: Code,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeclarationNode {
	pub declared: Vec<ExprNode>,  // identifier nodes, one per object
	pub prototypes: Vec<String>, // mangled signatures
	pub code: Code,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionNode {
	pub name: String,
	pub signature: String,
	pub return_type: SimpleType,
	pub params: Vec<ExprNode>,
	pub body: Vec<Statement>,
	pub scope: ScopeId,
	pub code: Code,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Item {
	Function(FunctionNode),
	Declaration(DeclarationNode),
	Statement(Statement),
}

impl Item {
	pub fn code(&self) -> &Code {
		match self {
			Item::Function(FunctionNode { code, .. })
			| Item::Declaration(DeclarationNode { code, .. })
			| Item::Statement(Statement { code, .. }) => code,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranslationUnitNode {
	pub items: Vec<Item>,
	pub code: Code,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn type_names_and_sizes() {
		let p = SimpleType::CHAR.pointer_to().pointer_to();
		assert_eq!(p.to_string(), "char**");
		assert_eq!(p.size(), 8);
		assert_eq!(p.pointee(), Some(SimpleType::CHAR.pointer_to()));
		assert_eq!(SimpleType::INT.pointee(), None);
		assert_eq!(SimpleType::BOOL.size(), 1);
		assert_eq!(SimpleType::INT.size(), 4);
	}

	#[test]
	fn default_values() {
		assert_eq!(SimpleType::INT.default_value(), "0");
		assert_eq!(SimpleType::CHAR.default_value(), "'\\0'");
		assert_eq!(SimpleType::BOOL.default_value(), "false");
		assert_eq!(SimpleType::INT.pointer_to().default_value(), "NULL");
	}
}
