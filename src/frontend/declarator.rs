// C11 6.7.6 Declarators
//
// A declarator's shape is collected while walking it and frozen once the base
// type is known. Until then its type stays undeclared.
use super::{
	ast::{PrimitiveType, SimpleType},
	diagnostic::ErrorKind,
	scope::Dimension,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectShape {
	pub name: String,
	pub ty: SimpleType,
	pub dimensions: Vec<Option<Dimension>>, // None: size left to the initializer
}

impl ObjectShape {
	// array parameters are passed as pointers to their first element
	fn decay(self) -> Result<Self, ErrorKind> {
		match self.dimensions.len() {
			0 => Ok(self),
			1 => Ok(ObjectShape { ty: self.ty.pointer_to(), dimensions: Vec::new(), ..self }),
			_ => Err(ErrorKind::Unsupported(format!("multi-dimensional array parameter '{}'", self.name))),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionShape {
	pub name: String,
	pub return_type: SimpleType,
	pub params: Vec<ObjectShape>,
}

impl FunctionShape {
	pub fn parameter_types(&self) -> Vec<SimpleType> { self.params.iter().map(|p| p.ty).collect() }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Declared {
	Object(ObjectShape),
	Function(FunctionShape),
}

#[derive(Debug)]
enum Suffix {
	Array(Option<Dimension>),
	Function(Vec<Declared>),
}

#[derive(Debug)]
pub struct DeclaratorBuilder {
	name: String,
	ty: SimpleType,
	suffixes: Vec<Suffix>,
}

impl DeclaratorBuilder {
	pub fn new(name: &str) -> Self {
		DeclaratorBuilder {
			name: name.to_owned(),
			ty: SimpleType::scalar(PrimitiveType::Undeclared),
			suffixes: Vec::new(),
		}
	}

	pub fn pointer(&mut self) { self.ty = self.ty.pointer_to() }

	pub fn array(&mut self, dimension: Option<Dimension>) -> Result<(), ErrorKind> {
		match self.suffixes.last() {
			Some(Suffix::Function(_)) => Err(self.malformed("function returning an array")),
			Some(Suffix::Array(_)) if dimension.is_none() => {
				Err(self.malformed("only the first array dimension may be omitted"))
			}
			_ => {
				self.suffixes.push(Suffix::Array(dimension));
				Ok(())
			}
		}
	}

	pub fn function(&mut self, params: Vec<Declared>) -> Result<(), ErrorKind> {
		match self.suffixes.last() {
			Some(Suffix::Function(_)) => Err(self.malformed("function returning a function")),
			Some(Suffix::Array(_)) => Err(self.malformed("array of functions")),
			None => {
				self.suffixes.push(Suffix::Function(params));
				Ok(())
			}
		}
	}

	fn malformed(&self, what: &str) -> ErrorKind { ErrorKind::MalformedDeclarator(format!("'{}' declared as {}", self.name, what)) }

	pub fn finish(self, base: PrimitiveType) -> Result<Declared, ErrorKind> {
		let ty = SimpleType { base, ..self.ty };
		let mut suffixes = self.suffixes;
		match suffixes.pop() {
			Some(Suffix::Function(params)) => {
				let params = params
					.into_iter()
					.map(|p| match p {
						Declared::Object(o) => o.decay(),
						Declared::Function(f) => Err(ErrorKind::MalformedDeclarator(format!(
							"parameter '{}' declared as a function",
							f.name
						))),
					})
					.collect::<Result<Vec<_>, _>>()?;
				Ok(Declared::Function(FunctionShape { name: self.name, return_type: ty, params }))
			}

			last => {
				if ty.is_void() {
					return Err(ErrorKind::MalformedDeclarator(format!("'{}' declared void", self.name)));
				}
				let dimensions = suffixes
					.into_iter()
					.chain(last)
					.filter_map(|s| if let Suffix::Array(d) = s { Some(d) } else { None })
					.collect();
				Ok(Declared::Object(ObjectShape { name: self.name, ty, dimensions }))
			}
		}
	}
}
