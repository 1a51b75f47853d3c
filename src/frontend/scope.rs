// scope tree and symbol tables
//
// Scopes live in an arena owned by the table; a scope refers to its parent by
// index. Popped scopes stay in the arena (sealed) so they can be reported.
use std::{collections::BTreeMap, fmt};

use thiserror::Error;

use super::{
	ast::{PrimitiveType, SimpleType},
	builtins::BUILTINS,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeId(pub usize);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Owner {
	Global,
	Function(String),
	Block(Option<String>), // enclosing function, if any
}

impl fmt::Display for Owner {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Owner::Global => f.write_str("GLOBAL"),
			Owner::Function(name) => f.write_str(name),
			Owner::Block(None) => f.write_str("BLOCK"),
			Owner::Block(Some(name)) => write!(f, "BLOCK in {}", name),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Dimension {
	Fixed(usize),
	Named(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VarEntry {
	pub name: String,
	pub ty: SimpleType,
	pub dimensions: Vec<Dimension>,
	pub size: usize,
	pub offset: Vec<usize>, // row strides in bytes, the element size for a scalar
	pub default_value: &'static str,
}

impl VarEntry {
	// size, offset and default value are filled in on insertion
	pub fn new(name: impl Into<String>, ty: SimpleType, dimensions: Vec<Dimension>) -> Self {
		VarEntry { name: name.into(), ty, dimensions, size: 0, offset: Vec::new(), default_value: ty.default_value() }
	}

	pub fn is_array(&self) -> bool { !self.dimensions.is_empty() }

	fn offset_text(&self) -> String {
		match self.offset.as_slice() {
			[stride] if !self.is_array() => stride.to_string(),
			strides => {
				let strides: Vec<String> = strides.iter().map(ToString::to_string).collect();
				format!("[{}]", strides.join(","))
			}
		}
	}

	pub fn fixed_dimensions(&self) -> Vec<usize> {
		self.dimensions
			.iter()
			.filter_map(|d| if let Dimension::Fixed(n) = d { Some(*n) } else { None })
			.collect()
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FuncEntry {
	pub name: String,
	pub return_type: SimpleType,
	pub parameter_types: Vec<SimpleType>,
	pub local_scope: Option<ScopeId>,
	pub defined: bool,
	pub builtin: bool,
}

impl FuncEntry {
	pub fn signature(&self) -> String { mangle(&self.name, &self.parameter_types) }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Entry {
	Variable(VarEntry),
	Function(FuncEntry),
}

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum ScopeError {
	#[error("array dimension '{0}' is not declared")]
	UndeclaredDimension(String),

	#[error("array dimension '{0}' is not an integer")]
	NonIntegerDimension(String),

	#[error("variable-length array dimension '{0}'")]
	VariableLengthArray(String),

	#[error("array '{0}' is too large")]
	TooLarge(String),
}

// f(int,char*)
pub fn mangle(name: &str, parameter_types: &[SimpleType]) -> String {
	let params: Vec<String> = parameter_types.iter().map(ToString::to_string).collect();
	format!("{}({})", name, params.join(","))
}

#[derive(Clone, Debug)]
pub struct Scope {
	pub parent: Option<ScopeId>,
	pub table_id: ScopeId,
	pub owner: Owner,
	pub variables: BTreeMap<String, VarEntry>,
	pub functions: BTreeMap<String, FuncEntry>, // keyed by mangled signature
	pub temporaries: Vec<VarEntry>,             // in creation order, never looked up
	pub sealed: bool,
}

impl Scope {
	fn new(table_id: ScopeId, parent: Option<ScopeId>, owner: Owner) -> Self {
		Scope {
			parent,
			table_id,
			owner,
			variables: BTreeMap::new(),
			functions: BTreeMap::new(),
			temporaries: Vec::new(),
			sealed: false,
		}
	}
}

#[derive(Clone, Debug)]
pub struct ScopeTable {
	scopes: Vec<Scope>,
	active: Vec<ScopeId>,
}

impl Default for ScopeTable {
	fn default() -> Self { Self::new() }
}

impl ScopeTable {
	// a fresh table holding only the global scope, preloaded with builtins
	pub fn new() -> Self {
		let mut global = Scope::new(ScopeId(0), None, Owner::Global);
		for f in BUILTINS.iter() {
			global.functions.insert(f.signature(), f.clone());
		}
		ScopeTable { scopes: vec![global], active: vec![ScopeId(0)] }
	}

	pub fn current(&self) -> ScopeId { self.active.last().copied().unwrap_or(ScopeId(0)) }

	pub fn scope(&self, id: ScopeId) -> &Scope { &self.scopes[id.0] }

	pub fn depth(&self) -> usize { self.active.len() }

	pub fn push_scope(&mut self, owner: Owner) -> ScopeId {
		let id = ScopeId(self.scopes.len());
		let parent = self.current();
		self.scopes.push(Scope::new(id, Some(parent), owner));
		self.active.push(id);
		log::debug!("push scope {} (parent {})", id.0, parent.0);
		id
	}

	// the global scope is never popped
	pub fn pop_scope(&mut self) -> ScopeId {
		let id = self.current();
		if self.active.len() > 1 {
			self.active.pop();
			self.scopes[id.0].sealed = true;
			log::debug!("pop scope {}", id.0);
		}
		id
	}

	// Returns whether the entry was inserted, and the entry now in effect for
	// its key in the current scope.
	pub fn insert(&mut self, entry: Entry) -> Result<(bool, Entry), ScopeError> {
		let current = self.current();
		match entry {
			Entry::Variable(mut var) => {
				if let Some(existing) = self.scopes[current.0].variables.get(&var.name) {
					return Ok((false, Entry::Variable(existing.clone())));
				}
				let (size, offset) = self.layout(&var)?;
				var.size = size;
				var.offset = offset;
				var.default_value = var.ty.default_value();
				log::debug!("scope {}: variable {} : {} ({} bytes)", current.0, var.name, var.ty, var.size);
				self.scopes[current.0].variables.insert(var.name.clone(), var.clone());
				Ok((true, Entry::Variable(var)))
			}

			Entry::Function(func) => {
				let signature = func.signature();
				if let Some(existing) = self.scopes[current.0].functions.get(&signature) {
					return Ok((false, Entry::Function(existing.clone())));
				}
				log::debug!("scope {}: function {} -> {}", current.0, signature, func.return_type);
				self.scopes[current.0].functions.insert(signature, func.clone());
				Ok((true, Entry::Function(func)))
			}
		}
	}

	// Temporaries are kept apart from named variables, so they never collide
	// with or shadow a user name.
	pub fn insert_temporary(&mut self, name: String, ty: SimpleType) {
		let current = self.current();
		let mut var = VarEntry::new(name, ty, Vec::new());
		var.size = ty.size();
		var.offset = vec![var.size];
		log::trace!("scope {}: temporary {} : {}", current.0, var.name, var.ty);
		self.scopes[current.0].temporaries.push(var);
	}

	// total size and the byte stride of each dimension
	fn layout(&self, var: &VarEntry) -> Result<(usize, Vec<usize>), ScopeError> {
		let element = var.ty.size();
		let mut extents = Vec::with_capacity(var.dimensions.len());
		for d in &var.dimensions {
			match d {
				Dimension::Fixed(n) => extents.push(*n),
				Dimension::Named(name) => {
					return Err(match self.lookup(name) {
						None => ScopeError::UndeclaredDimension(name.clone()),
						Some(v) if v.ty != SimpleType::scalar(PrimitiveType::Int) || v.is_array() => {
							ScopeError::NonIntegerDimension(name.clone())
						}
						Some(_) => ScopeError::VariableLengthArray(name.clone()),
					});
				}
			}
		}

		let too_large = || ScopeError::TooLarge(var.name.clone());
		let mut strides = vec![element];
		for n in extents.iter().skip(1).rev() {
			let inner = strides.last().copied().unwrap_or(element);
			strides.push(inner.checked_mul(*n).ok_or_else(too_large)?);
		}
		strides.reverse();
		let size = match extents.first() {
			Some(n) => strides[0].checked_mul(*n).ok_or_else(too_large)?,
			None => element,
		};
		Ok((size, strides))
	}

	fn active_scopes(&self) -> impl Iterator<Item = &Scope> + '_ {
		self.active.iter().rev().map(move |id| &self.scopes[id.0])
	}

	pub fn lookup(&self, name: &str) -> Option<&VarEntry> {
		self.active_scopes().find_map(|s| s.variables.get(name))
	}

	pub fn lookup_function(&self, signature: &str) -> Option<&FuncEntry> {
		self.active_scopes().find_map(|s| s.functions.get(signature))
	}

	// the function whose body encloses the innermost active scope
	pub fn owning_function(&self) -> Option<String> {
		self.active_scopes().find_map(|s| match &s.owner {
			Owner::Function(name) => Some(name.clone()),
			Owner::Block(owner) => owner.clone(),
			Owner::Global => None,
		})
	}

	pub fn has_function(&self, name: &str) -> bool {
		self.active_scopes().any(|s| s.functions.values().any(|f| f.name == name))
	}

	fn lookup_function_mut(&mut self, signature: &str) -> Option<&mut FuncEntry> {
		let scopes = &self.scopes;
		let id = self.active.iter().rev().copied().find(|id| scopes[id.0].functions.contains_key(signature))?;
		self.scopes[id.0].functions.get_mut(signature)
	}

	pub fn link_local_scope(&mut self, signature: &str, scope: ScopeId) {
		if let Some(f) = self.lookup_function_mut(signature) {
			f.local_scope = Some(scope);
		}
	}

	pub fn mark_defined(&mut self, signature: &str) {
		if let Some(f) = self.lookup_function_mut(signature) {
			f.defined = true;
		}
	}
}

// symbol-table report; builtin operators are left out
impl fmt::Display for ScopeTable {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for scope in &self.scopes {
			let parent = scope.parent.map_or_else(|| "-".to_owned(), |p| p.0.to_string());
			writeln!(f, "SCOPE {} {} (parent {})", scope.table_id.0, scope.owner, parent)?;
			for v in scope.variables.values().chain(&scope.temporaries) {
				let dims: String = v
					.dimensions
					.iter()
					.map(|d| match d {
						Dimension::Fixed(n) => format!("[{}]", n),
						Dimension::Named(n) => format!("[{}]", n),
					})
					.collect();
				writeln!(
					f,
					"  {:<12} {:<8} {:<8} {:>6} {:<8} {}",
					v.name,
					v.ty.to_string(),
					dims,
					v.size,
					v.offset_text(),
					v.default_value
				)?;
			}
			for func in scope.functions.values().filter(|func| !func.builtin) {
				let local = func.local_scope.map_or_else(|| "-".to_owned(), |s| s.0.to_string());
				let state = if func.defined { "defined" } else { "declared" };
				writeln!(f, "  {:<12} {:<8} {:<8} scope {}", func.signature(), func.return_type.to_string(), state, local)?;
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn var(name: &str, ty: SimpleType) -> Entry { Entry::Variable(VarEntry::new(name, ty, vec![])) }

	#[test]
	fn redeclaration_in_same_scope_returns_existing() {
		let mut table = ScopeTable::new();
		assert!(matches!(table.insert(var("x", SimpleType::INT)), Ok((true, _))));
		match table.insert(var("x", SimpleType::CHAR)) {
			Ok((false, Entry::Variable(v))) => assert_eq!(v.ty, SimpleType::INT),
			r => panic!("unexpected {:?}", r),
		}
	}

	#[test]
	fn shadowing_hides_but_does_not_destroy() {
		let mut table = ScopeTable::new();
		table.insert(var("x", SimpleType::INT)).unwrap();
		let inner = table.push_scope(Owner::Block(None));
		assert!(matches!(table.insert(var("x", SimpleType::CHAR)), Ok((true, _))));
		assert_eq!(table.lookup("x").map(|v| v.ty), Some(SimpleType::CHAR));
		assert_eq!(table.pop_scope(), inner);
		assert!(table.scope(inner).sealed);
		assert_eq!(table.lookup("x").map(|v| v.ty), Some(SimpleType::INT));
		assert_eq!(table.scope(inner).variables.len(), 1);
	}

	#[test]
	fn block_locals_are_invisible_outside() {
		let mut table = ScopeTable::new();
		table.push_scope(Owner::Block(None));
		table.insert(var("y", SimpleType::BOOL)).unwrap();
		table.pop_scope();
		assert!(table.lookup("y").is_none());
		assert_eq!(table.pop_scope(), ScopeId(0));
		assert_eq!(table.depth(), 1);
	}

	#[test]
	fn sizes_and_defaults() {
		let mut table = ScopeTable::new();
		let a = VarEntry::new("a", SimpleType::INT, vec![Dimension::Fixed(3), Dimension::Fixed(4)]);
		match table.insert(Entry::Variable(a)) {
			Ok((true, Entry::Variable(v))) => {
				assert_eq!(v.size, 48);
				assert_eq!(v.default_value, "0");
				assert_eq!(v.fixed_dimensions(), vec![3, 4]);
			}
			r => panic!("unexpected {:?}", r),
		}
		match table.insert(var("p", SimpleType::CHAR.pointer_to())) {
			Ok((true, Entry::Variable(v))) => {
				assert_eq!(v.size, 8);
				assert_eq!(v.default_value, "NULL");
			}
			r => panic!("unexpected {:?}", r),
		}
	}

	#[test]
	fn offsets_record_row_strides() {
		let mut table = ScopeTable::new();
		table.insert(var("a", SimpleType::INT)).unwrap();
		table.insert(var("b", SimpleType::CHAR)).unwrap();
		let m = VarEntry::new("m", SimpleType::INT, vec![Dimension::Fixed(2), Dimension::Fixed(3)]);
		table.insert(Entry::Variable(m)).unwrap();
		let global = table.scope(ScopeId(0));
		assert_eq!(global.variables["a"].offset, vec![4]);
		assert_eq!(global.variables["b"].offset, vec![1]);
		assert_eq!(global.variables["m"].offset, vec![12, 4]);
		assert_eq!(global.variables["m"].size, 24);

		let report = table.to_string();
		let m_line = report.lines().find(|l| l.trim_start().starts_with("m ")).unwrap();
		assert_eq!(m_line.split_whitespace().collect::<Vec<_>>(), vec!["m", "int", "[2][3]", "24", "[12,4]", "0"]);
	}

	#[test]
	fn oversized_arrays_are_rejected() {
		let mut table = ScopeTable::new();
		let huge = VarEntry::new("a", SimpleType::INT, vec![Dimension::Fixed(1 << 62)]);
		assert_eq!(table.insert(Entry::Variable(huge)), Err(ScopeError::TooLarge("a".into())));
		let deep = VarEntry::new("b", SimpleType::INT, vec![Dimension::Fixed(100_000); 5]);
		assert_eq!(table.insert(Entry::Variable(deep)), Err(ScopeError::TooLarge("b".into())));
		assert!(table.lookup("a").is_none());
	}

	#[test]
	fn temporaries_are_reported_but_not_visible() {
		let mut table = ScopeTable::new();
		table.insert(var("x", SimpleType::INT)).unwrap();
		table.insert_temporary("VAR1".into(), SimpleType::BOOL);
		assert!(table.lookup("VAR1").is_none());
		assert!(matches!(table.insert(var("VAR1", SimpleType::INT)), Ok((true, _))));
		assert!(table.to_string().lines().any(|l| l.split_whitespace().take(2).eq(vec!["VAR1", "bool"])));
	}

	#[test]
	fn blocks_remember_their_function() {
		let mut table = ScopeTable::new();
		assert_eq!(table.owning_function(), None);
		table.push_scope(Owner::Function("f".into()));
		let owner = Owner::Block(table.owning_function());
		let block = table.push_scope(owner);
		assert_eq!(table.owning_function(), Some("f".into()));
		assert_eq!(table.scope(block).owner.to_string(), "BLOCK in f");
	}

	#[test]
	fn named_dimensions_are_rejected() {
		let mut table = ScopeTable::new();
		table.insert(var("n", SimpleType::INT)).unwrap();
		table.insert(var("c", SimpleType::BOOL)).unwrap();
		let named = |d: &str| Entry::Variable(VarEntry::new("a", SimpleType::INT, vec![Dimension::Named(d.into())]));
		assert_eq!(table.insert(named("m")), Err(ScopeError::UndeclaredDimension("m".into())));
		assert_eq!(table.insert(named("c")), Err(ScopeError::NonIntegerDimension("c".into())));
		assert_eq!(table.insert(named("n")), Err(ScopeError::VariableLengthArray("n".into())));
		assert!(table.lookup("a").is_none());
	}

	#[test]
	fn functions_resolve_by_signature() {
		let mut table = ScopeTable::new();
		let f = FuncEntry {
			name: "f".into(),
			return_type: SimpleType::INT,
			parameter_types: vec![SimpleType::INT],
			local_scope: None,
			defined: false,
			builtin: false,
		};
		assert_eq!(f.signature(), "f(int)");
		table.insert(Entry::Function(f)).unwrap();
		let local = table.push_scope(Owner::Function("f".into()));
		table.link_local_scope("f(int)", local);
		table.mark_defined("f(int)");
		table.pop_scope();

		let entry = table.lookup_function("f(int)").unwrap();
		assert!(entry.defined);
		assert_eq!(entry.local_scope, Some(local));
		assert!(table.lookup_function("f(char)").is_none());
		assert!(table.has_function("f"));
		assert!(!table.has_function("g"));
	}

	#[test]
	fn builtins_live_in_the_global_scope() {
		let table = ScopeTable::new();
		let plus = table.lookup_function("+(int,char)").unwrap();
		assert_eq!(plus.return_type, SimpleType::CHAR);
		assert!(plus.builtin);
		assert!(table.lookup_function("+(bool,bool)").is_none());
		assert!(table.to_string().starts_with("SCOPE 0 GLOBAL (parent -)"));
		assert!(!table.to_string().contains("+(int,int)"));
	}
}
