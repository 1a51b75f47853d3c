// lexical analysis
use std::{collections::HashMap, fmt};

use once_cell::sync::Lazy;

use super::diagnostic::{Diagnostic, ErrorKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind<'a> {
	Ident(&'a str),
	Integer(i64),
	Character(&'a str), // 'c', quotes included
	Str(&'a str),       // "...", quotes included

	// keywords
	Break,
	Char,
	Continue,
	Else,
	For,
	If,
	Int,
	Return,
	Struct,
	Void,
	While,
	Bool,
	False,
	Class,
	True,
	Cin,
	Cout,

	// punctuators
	LParen,
	RParen,
	LBracket,
	RBracket,
	LBrace,
	RBrace,
	Dot,
	Arrow,
	Plus,
	Minus,
	Star,
	Slash,
	Percent,
	Bang,
	Tilde,
	Less,
	Greater,
	Amp,
	Pipe,
	Caret,
	Assign,
	Comma,
	Semicolon,
	Colon,
	Question,
	LessEqual,
	GreaterEqual,
	EqualEqual,
	NotEqual,
	AmpAmp,
	PipePipe,
	ShiftLeft,  // cout <<
	ShiftRight, // cin >>
	PlusAssign,
	MinusAssign,
	StarAssign,
	SlashAssign,
	PercentAssign,
	AmpAssign,
	CaretAssign,
	PipeAssign,
	PlusPlus,
	MinusMinus,

	// integer literal that does not fit, reported then read as 0
	OutOfRange(&'a str),

	// anything the scanner does not recognize, reported then dropped
	Unknown(char),
}

static KEYWORDS: Lazy<HashMap<&'static str, TokenKind<'static>>> = Lazy::new(|| {
	use TokenKind::*;
	[
		("break", Break),
		("char", Char),
		("continue", Continue),
		("else", Else),
		("for", For),
		("if", If),
		("int", Int),
		("return", Return),
		("struct", Struct),
		("void", Void),
		("while", While),
		("bool", Bool),
		("false", False),
		("class", Class),
		("true", True),
		("cin", Cin),
		("cout", Cout),
	]
	.iter()
	.copied()
	.collect()
});

fn keyword_or_identifier(word: &str) -> TokenKind<'_> {
	KEYWORDS.get(word).copied().unwrap_or(TokenKind::Ident(word))
}

fn integer<'a>(lexeme: &'a str, digits: &str, radix: u32) -> TokenKind<'a> {
	i64::from_str_radix(digits, radix).map_or(TokenKind::OutOfRange(lexeme), TokenKind::Integer)
}

impl fmt::Display for TokenKind<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		use TokenKind::*;
		let text = match self {
			Ident(s) | Character(s) | Str(s) | OutOfRange(s) => return write!(f, "{}", s),
			Integer(i) => return write!(f, "{}", i),
			Unknown(c) => return write!(f, "{}", c),
			Break => "break",
			Char => "char",
			Continue => "continue",
			Else => "else",
			For => "for",
			If => "if",
			Int => "int",
			Return => "return",
			Struct => "struct",
			Void => "void",
			While => "while",
			Bool => "bool",
			False => "false",
			Class => "class",
			True => "true",
			Cin => "cin",
			Cout => "cout",
			LParen => "(",
			RParen => ")",
			LBracket => "[",
			RBracket => "]",
			LBrace => "{",
			RBrace => "}",
			Dot => ".",
			Arrow => "->",
			Plus => "+",
			Minus => "-",
			Star => "*",
			Slash => "/",
			Percent => "%",
			Bang => "!",
			Tilde => "~",
			Less => "<",
			Greater => ">",
			Amp => "&",
			Pipe => "|",
			Caret => "^",
			Assign => "=",
			Comma => ",",
			Semicolon => ";",
			Colon => ":",
			Question => "?",
			LessEqual => "<=",
			GreaterEqual => ">=",
			EqualEqual => "==",
			NotEqual => "!=",
			AmpAmp => "&&",
			PipePipe => "||",
			ShiftLeft => "<<",
			ShiftRight => ">>",
			PlusAssign => "+=",
			MinusAssign => "-=",
			StarAssign => "*=",
			SlashAssign => "/=",
			PercentAssign => "%=",
			AmpAssign => "&=",
			CaretAssign => "^=",
			PipeAssign => "|=",
			PlusPlus => "++",
			MinusMinus => "--",
		};
		f.write_str(text)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token<'a> {
	pub kind: TokenKind<'a>,
	pub line: usize,
	pub column: usize,
}

peg::parser! {grammar lexer() for str {
	rule blank() = [' ' | '\t' | '\n' | '\r' | '\x0B' | '\x0C']
	rule comment()
		= "//" (!"\n" [_])*
		/ "/*" (!"*/" [_])* "*/"
	rule trivia() = quiet!{ (blank() / comment())* }

	rule digit() = ['0'..='9']
	rule letter() = ['a'..='z' | 'A'..='Z' | '_']

	rule word() -> TokenKind<'input>
		= w:$(letter() (letter() / digit())*) { keyword_or_identifier(w) }

	rule number() -> TokenKind<'input>
		= n:$("0" ['x' | 'X'] ['0'..='9' | 'a'..='f' | 'A'..='F']+) { integer(n, &n[2..], 16) }
		/ n:$("0" ['b' | 'B'] ['0' | '1']+) { integer(n, &n[2..], 2) }
		/ n:$("0" ['0'..='7']+ !digit()) { integer(n, n, 8) }
		/ n:$(digit()+) { integer(n, n, 10) }

	rule character() -> TokenKind<'input>
		= c:$("'" ("\\" [_] / [^ '\'' | '\\' | '\n']) "'") { TokenKind::Character(c) }

	rule string() -> TokenKind<'input>
		= s:$("\"" ("\\" [_] / [^ '"' | '\\' | '\n'])* "\"") { TokenKind::Str(s) }

	// longest punctuators first
	rule punctuator() -> TokenKind<'input>
		= "<<" { TokenKind::ShiftLeft }
		/ ">>" { TokenKind::ShiftRight }
		/ "<=" { TokenKind::LessEqual }
		/ ">=" { TokenKind::GreaterEqual }
		/ "==" { TokenKind::EqualEqual }
		/ "!=" { TokenKind::NotEqual }
		/ "&&" { TokenKind::AmpAmp }
		/ "||" { TokenKind::PipePipe }
		/ "++" { TokenKind::PlusPlus }
		/ "--" { TokenKind::MinusMinus }
		/ "->" { TokenKind::Arrow }
		/ "+=" { TokenKind::PlusAssign }
		/ "-=" { TokenKind::MinusAssign }
		/ "*=" { TokenKind::StarAssign }
		/ "/=" { TokenKind::SlashAssign }
		/ "%=" { TokenKind::PercentAssign }
		/ "&=" { TokenKind::AmpAssign }
		/ "^=" { TokenKind::CaretAssign }
		/ "|=" { TokenKind::PipeAssign }
		/ "(" { TokenKind::LParen }
		/ ")" { TokenKind::RParen }
		/ "[" { TokenKind::LBracket }
		/ "]" { TokenKind::RBracket }
		/ "{" { TokenKind::LBrace }
		/ "}" { TokenKind::RBrace }
		/ "." { TokenKind::Dot }
		/ "+" { TokenKind::Plus }
		/ "-" { TokenKind::Minus }
		/ "*" { TokenKind::Star }
		/ "/" { TokenKind::Slash }
		/ "%" { TokenKind::Percent }
		/ "!" { TokenKind::Bang }
		/ "~" { TokenKind::Tilde }
		/ "<" { TokenKind::Less }
		/ ">" { TokenKind::Greater }
		/ "&" { TokenKind::Amp }
		/ "|" { TokenKind::Pipe }
		/ "^" { TokenKind::Caret }
		/ "=" { TokenKind::Assign }
		/ "," { TokenKind::Comma }
		/ ";" { TokenKind::Semicolon }
		/ ":" { TokenKind::Colon }
		/ "?" { TokenKind::Question }

	rule token() -> (usize, TokenKind<'input>)
		= p:position!() k:(
			word()
			/ number()
			/ character()
			/ string()
			/ punctuator()
			/ c:[_] { TokenKind::Unknown(c) }
		) { (p, k) }

	pub rule tokens() -> Vec<(usize, TokenKind<'input>)>
		= trivia() ts:(t:token() trivia() { t })* { ts }
}}

// byte offset -> (line, column), both 1-based
struct LineMap {
	starts: Vec<usize>,
}

impl LineMap {
	fn new(src: &str) -> Self {
		let starts = std::iter::once(0)
			.chain(src.char_indices().filter(|(_, c)| *c == '\n').map(|(i, _)| i + 1))
			.collect();
		LineMap { starts }
	}

	fn locate(&self, src: &str, offset: usize) -> (usize, usize) {
		let line = match self.starts.binary_search(&offset) {
			Ok(l) => l,
			Err(l) => l - 1,
		};
		let column = src[self.starts[line]..offset].chars().count() + 1;
		(line + 1, column)
	}
}

// Unrecognized characters are dropped from the stream, each with one diagnostic.
// An out-of-range integer literal is reported once and kept as 0.
pub fn tokenize(src: &str) -> (Vec<Token<'_>>, Vec<Diagnostic>) {
	let lines = LineMap::new(src);
	let raw = match lexer::tokens(src) {
		Ok(raw) => raw,
		Err(e) => {
			// the catch-all alternative makes this unreachable for any input
			let (line, _) = lines.locate(src, e.location.offset);
			return (Vec::new(), vec![Diagnostic::new(line, ErrorKind::Syntax(e.expected.to_string()))]);
		}
	};

	let mut tokens = Vec::with_capacity(raw.len());
	let mut diagnostics = Vec::new();
	for (offset, kind) in raw {
		let (line, column) = lines.locate(src, offset);
		match kind {
			TokenKind::Unknown(c) => diagnostics.push(Diagnostic::new(line, ErrorKind::Lexical(c))),
			TokenKind::OutOfRange(literal) => {
				diagnostics.push(Diagnostic::new(line, ErrorKind::IntegerOutOfRange(literal.to_owned())));
				tokens.push(Token { kind: TokenKind::Integer(0), line, column });
			}
			kind => tokens.push(Token { kind, line, column }),
		}
	}
	log::trace!("scanned {} tokens", tokens.len());

	(tokens, diagnostics)
}
