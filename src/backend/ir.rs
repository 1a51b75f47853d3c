// three-address code
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Label {
	Numbered(usize),
	// entry of a function, named by its mangled signature
	Function(String),
}

impl fmt::Display for Label {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Label::Numbered(n) => write!(f, "L{}", n),
			Label::Function(sig) => f.write_str(sig),
		}
	}
}

// Operands are rendered places: variable names, temporaries or literal text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
	Binary { dst: String, lhs: String, op: &'static str, rhs: String },
	Unary { dst: String, op: &'static str, src: String },
	Copy { dst: String, src: String },
	Label(Label),
	IfZeroGoto { cond: String, target: Label },
	Goto(Label),
	SaveContext,
	Store(String),
	Jal(String),
	CaptureReturn { dst: String },
	Input(String),
	Output(String),
	StoreRet(String),
	Return,
	Alloc { place: String, size: usize },
	GetIndex { dst: String, base: String, index: String },
	SetIndex { base: String, index: String, src: String },
	StorePtr { ptr: String, src: String },
	LoadParam(String),
}

impl fmt::Display for Instruction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		use Instruction::*;
		match self {
			Binary { dst, lhs, op, rhs } => write!(f, "{} = {} {} {}", dst, lhs, op, rhs),
			Unary { dst, op, src } => write!(f, "{} = {} {}", dst, op, src),
			Copy { dst, src } => write!(f, "{} = {}", dst, src),
			Label(l) => write!(f, "{} :", l),
			IfZeroGoto { cond, target } => write!(f, "IF {} == 0 GOTO {}", cond, target),
			Goto(l) => write!(f, "GOTO {}", l),
			SaveContext => f.write_str("SAVE_CONTEXT"),
			Store(p) => write!(f, "STORE {}", p),
			Jal(sig) => write!(f, "JAL {}", sig),
			CaptureReturn { dst } => write!(f, "{} = RET_VAL", dst),
			Input(p) => write!(f, "INPUT {}", p),
			Output(p) => write!(f, "OUT {}", p),
			StoreRet(p) => write!(f, "STORE_RET {}", p),
			Return => f.write_str("RETURN"),
			Alloc { place, size } => write!(f, "ALLOC_MEM {} {}", place, size),
			GetIndex { dst, base, index } => write!(f, "{} = GETIDX {} {}", dst, base, index),
			SetIndex { base, index, src } => write!(f, "SETIDX {} {} {}", base, index, src),
			StorePtr { ptr, src } => write!(f, "STORE_PTR {} {}", ptr, src),
			LoadParam(p) => write!(f, "LOAD_PARAM {}", p),
		}
	}
}

pub type Code = Vec<Instruction>;

// fresh names, never reused within one compilation
#[derive(Debug)]
pub struct Generator {
	temporaries: usize,
	labels: usize,
}

impl Default for Generator {
	fn default() -> Self { Generator { temporaries: 1, labels: 1 } }
}

impl Generator {
	pub fn new() -> Self { Self::default() }

	pub fn temporary(&mut self) -> String {
		let t = format!("VAR{}", self.temporaries);
		self.temporaries += 1;
		t
	}

	pub fn label(&mut self) -> Label {
		let l = Label::Numbered(self.labels);
		self.labels += 1;
		l
	}
}

pub fn listing(code: &[Instruction]) -> Vec<String> { code.iter().map(ToString::to_string).collect() }

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn instructions_render_as_whitespace_delimited_tokens() {
		use Instruction::*;
		let code = vec![
			Binary { dst: "VAR3".into(), lhs: "VAR1".into(), op: "+", rhs: "VAR2".into() },
			Unary { dst: "VAR4".into(), op: "-", src: "a".into() },
			Label(super::Label::Numbered(2)),
			IfZeroGoto { cond: "VAR1".into(), target: super::Label::Numbered(2) },
			Jal("f(int)".into()),
			CaptureReturn { dst: "VAR5".into() },
			Alloc { place: "a".into(), size: 40 },
			GetIndex { dst: "VAR6".into(), base: "a".into(), index: "VAR2".into() },
			Label(super::Label::Function("f(int)".into())),
		];
		assert_eq!(listing(&code), vec![
			"VAR3 = VAR1 + VAR2",
			"VAR4 = - a",
			"L2 :",
			"IF VAR1 == 0 GOTO L2",
			"JAL f(int)",
			"VAR5 = RET_VAL",
			"ALLOC_MEM a 40",
			"VAR6 = GETIDX a VAR2",
			"f(int) :",
		]);
	}

	#[test]
	fn generator_counts_from_one() {
		let mut g = Generator::new();
		assert_eq!(g.temporary(), "VAR1");
		assert_eq!(g.temporary(), "VAR2");
		assert_eq!(g.label(), Label::Numbered(1));
		assert_eq!(g.temporary(), "VAR3");
		assert_eq!(g.label().to_string(), "L2");
	}
}
