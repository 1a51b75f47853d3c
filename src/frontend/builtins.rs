// builtin operator catalogue, preloaded into every global scope
use once_cell::sync::Lazy;

use super::{ast::SimpleType, scope::FuncEntry};

const INT: SimpleType = SimpleType::INT;
const CHAR: SimpleType = SimpleType::CHAR;
const BOOL: SimpleType = SimpleType::BOOL;
const VOID: SimpleType = SimpleType::VOID;

fn operator(name: &str, parameter_types: &[SimpleType], return_type: SimpleType) -> FuncEntry {
	FuncEntry {
		name: name.to_owned(),
		return_type,
		parameter_types: parameter_types.to_vec(),
		local_scope: None,
		defined: true,
		builtin: true,
	}
}

// int op int is int, anything involving char is char
fn arithmetic_result(lhs: SimpleType, rhs: SimpleType) -> SimpleType {
	if lhs == INT && rhs == INT { INT } else { CHAR }
}

pub static BUILTINS: Lazy<Vec<FuncEntry>> = Lazy::new(|| {
	let mut ops = Vec::new();
	let integral = [INT, CHAR];

	for &lhs in &integral {
		for &rhs in &integral {
			for name in &["+", "-", "*", "/", "%", "&", "|", "^"] {
				ops.push(operator(name, &[lhs, rhs], arithmetic_result(lhs, rhs)));
			}
			for name in &["<", ">", "<=", ">=", "==", "!="] {
				ops.push(operator(name, &[lhs, rhs], BOOL));
			}
		}
	}
	for name in &["&", "|", "^"] {
		ops.push(operator(name, &[BOOL, BOOL], BOOL));
	}
	for name in &["==", "!="] {
		ops.push(operator(name, &[BOOL, BOOL], BOOL));
		for &base in &[INT, CHAR, BOOL] {
			for level in 1..=2 {
				let p = SimpleType { pointer_level: level, ..base };
				ops.push(operator(name, &[p, p], BOOL));
			}
		}
	}
	for name in &["&&", "||"] {
		ops.push(operator(name, &[BOOL, BOOL], BOOL));
	}

	for &ty in &integral {
		for name in &["-", "~", "++", "--"] {
			ops.push(operator(name, &[ty], ty));
		}
	}
	for &ty in &[BOOL, INT, CHAR] {
		ops.push(operator("!", &[ty], BOOL));
	}

	for &ty in &[INT, CHAR, BOOL] {
		ops.push(operator("=", &[ty, ty], ty));
	}
	ops.push(operator("=", &[INT, CHAR], INT));
	ops.push(operator("=", &[CHAR, INT], CHAR));
	for &base in &[INT, CHAR, BOOL] {
		for level in 1..=2 {
			let p = SimpleType { pointer_level: level, ..base };
			ops.push(operator("=", &[p, p], p));
		}
	}

	for &ty in &integral {
		ops.push(operator("in", &[ty], VOID));
	}
	for &ty in &[INT, CHAR, BOOL, CHAR.pointer_to()] {
		ops.push(operator("out", &[ty], VOID));
	}

	for &elem in &[INT, CHAR, BOOL] {
		for &index in &integral {
			ops.push(operator("[]", &[elem, index], elem));
		}
	}

	log::trace!("{} builtin operators", ops.len());
	ops
});

#[cfg(test)]
mod tests {
	use super::*;

	fn find(sig: &str) -> Option<&'static FuncEntry> { BUILTINS.iter().find(|f| f.signature() == sig) }

	#[test]
	fn arithmetic_promotes_to_char() {
		assert_eq!(find("+(int,int)").map(|f| f.return_type), Some(INT));
		assert_eq!(find("+(int,char)").map(|f| f.return_type), Some(CHAR));
		assert_eq!(find("%(char,int)").map(|f| f.return_type), Some(CHAR));
		assert!(find("+(bool,bool)").is_none());
		assert_eq!(find("&(bool,bool)").map(|f| f.return_type), Some(BOOL));
	}

	#[test]
	fn comparisons_and_logic() {
		assert_eq!(find("<=(char,int)").map(|f| f.return_type), Some(BOOL));
		assert!(find("<(bool,bool)").is_none());
		assert!(find("==(bool,bool)").is_some());
		assert!(find("==(int*,int*)").is_some());
		assert!(find("==(int*,char*)").is_none());
		assert!(find("&&(bool,bool)").is_some());
		assert!(find("&&(int,int)").is_none());
	}

	#[test]
	fn unary_assignment_and_io() {
		assert_eq!(find("!(int)").map(|f| f.return_type), Some(BOOL));
		assert_eq!(find("~(char)").map(|f| f.return_type), Some(CHAR));
		assert!(find("++(bool)").is_none());
		assert_eq!(find("=(int,char)").map(|f| f.return_type), Some(INT));
		assert!(find("=(int**,int**)").is_some());
		assert!(find("=(int***,int***)").is_none());
		assert!(find("=(bool,int)").is_none());
		assert!(find("in(bool)").is_none());
		assert!(find("out(char*)").is_some());
		assert_eq!(find("[](bool,char)").map(|f| f.return_type), Some(BOOL));
	}

	#[test]
	fn signatures_are_unique() {
		let mut sigs: Vec<String> = BUILTINS.iter().map(FuncEntry::signature).collect();
		let total = sigs.len();
		sigs.sort();
		sigs.dedup();
		assert_eq!(sigs.len(), total);
	}
}
