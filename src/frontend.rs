// Front-end:
//  - lexical analysis
//  - syntax analysis
//  - semantics analysis and three-address code synthesis

pub mod ast;
mod builtins;
mod declarator;
pub mod diagnostic;
pub mod lexer;
pub mod scope;
pub mod semantics;
pub mod syntax;

use crate::backend::ir::Code;
use ast::TranslationUnitNode;
use diagnostic::{Diagnostic, ErrorKind};
use lexer::{Token, TokenKind};
use scope::ScopeTable;
use semantics::CompilationContext;

// result of a compilation without diagnostics
#[derive(Debug)]
pub struct Compilation {
	pub unit: TranslationUnitNode,
	pub scopes: ScopeTable,
	pub code: Code,
}

pub fn tokens(src: &str) -> (Vec<Token<'_>>, Vec<Diagnostic>) { lexer::tokenize(src) }

// Diagnostics from every phase, ordered by line. Errors within a line keep
// the order they were found in.
pub fn compile(src: &str) -> Result<Compilation, Vec<Diagnostic>> {
	let (tokens, mut diagnostics) = lexer::tokenize(src);
	let kinds: Vec<TokenKind<'_>> = tokens.iter().map(|t| t.kind).collect();

	let tu = match syntax::parse(&kinds) {
		Ok(tu) => tu,
		Err(e) => {
			let near = tokens.get(e.location).or_else(|| tokens.last());
			let line = near.map_or(1, |t| t.line);
			let found = tokens.get(e.location).map_or_else(|| "end of input".to_owned(), |t| format!("'{}'", t.kind));
			diagnostics.push(Diagnostic::new(line, ErrorKind::Syntax(format!("unexpected {}, expected {}", found, e.expected))));
			diagnostics.sort_by_key(|d| d.line);
			return Err(diagnostics);
		}
	};

	let mut context = CompilationContext::new(&tokens);
	let unit = context.translation_unit(&tu);
	let (scopes, semantic) = context.finish();
	diagnostics.extend(semantic);

	if diagnostics.is_empty() {
		log::debug!("compiled {} instructions", unit.code.len());
		let code = unit.code.clone();
		Ok(Compilation { unit, scopes, code })
	} else {
		diagnostics.sort_by_key(|d| d.line);
		Err(diagnostics)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unrecoverable_syntax_error() {
		let ds = compile("int main() {\n  x = 1").unwrap_err();
		assert_eq!(ds.len(), 1);
		assert!(matches!(ds[0].kind, ErrorKind::Syntax(_)));
	}

	#[test]
	fn empty_source_compiles_to_nothing() {
		let c = compile("  // nothing here\n").unwrap();
		assert!(c.code.is_empty());
		assert!(c.unit.items.is_empty());
	}

	#[test]
	fn scope_report_lists_user_symbols() {
		let c = compile("int g;\nint f(int n) { char c[4]; return n; }").unwrap();
		let report = c.scopes.to_string();
		assert!(report.contains("SCOPE 0 GLOBAL (parent -)"));
		assert!(report.contains("SCOPE 1 f (parent 0)"));
		assert!(report.contains("f(int)"));
		assert!(report.contains("[4]"));
		assert!(!report.contains("+(int,int)"));
	}
}
