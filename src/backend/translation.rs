// control-flow layout of three-address code
//
// Each function assembles a construct's code from the code already
// synthesized for its children plus its own labels and jumps.
use super::ir::{Code, Generator, Instruction, Label};

// Labels owned by the innermost enclosing loop.
#[derive(Clone, Debug)]
pub struct LoopLabels {
	pub begin: Label,
	pub after: Label,
	// for loops only: where `continue` lands, ahead of the update
	pub next: Option<Label>,
}

// C; IF c == 0 GOTO Lafter; S1; Lafter :
pub fn if_then(condition: Code, cond: String, then_code: Code, gen: &mut Generator) -> Code {
	let after = gen.label();
	let mut code = condition;
	code.push(Instruction::IfZeroGoto { cond, target: after.clone() });
	code.extend(then_code);
	code.push(Instruction::Label(after));
	code
}

// C; IF c == 0 GOTO Lelse; S1; GOTO Lafter; Lelse :; S2; Lafter :
pub fn if_then_else(
	condition: Code, cond: String, then_code: Code, else_code: Code, gen: &mut Generator,
) -> Code {
	let otherwise = gen.label();
	let after = gen.label();
	let mut code = condition;
	code.push(Instruction::IfZeroGoto { cond, target: otherwise.clone() });
	code.extend(then_code);
	code.push(Instruction::Goto(after.clone()));
	code.push(Instruction::Label(otherwise));
	code.extend(else_code);
	code.push(Instruction::Label(after));
	code
}

// Lbegin :; C; IF c == 0 GOTO Lafter; S; GOTO Lbegin; Lafter :
pub fn while_loop(labels: LoopLabels, condition: Code, cond: String, body: Code) -> Code {
	let LoopLabels { begin, after, .. } = labels;
	let mut code = vec![Instruction::Label(begin.clone())];
	code.extend(condition);
	code.push(Instruction::IfZeroGoto { cond, target: after.clone() });
	code.extend(body);
	code.push(Instruction::Goto(begin));
	code.push(Instruction::Label(after));
	code
}

// I; Lstart :; [C; IF c == 0 GOTO Lafter]; S; [Lnext :]; U; GOTO Lstart; Lafter :
pub fn for_loop(
	labels: LoopLabels, init: Code, condition: Option<(Code, String)>, update: Code, body: Code,
) -> Code {
	let LoopLabels { begin, after, next } = labels;
	let mut code = init;
	code.push(Instruction::Label(begin.clone()));
	if let Some((condition, cond)) = condition {
		code.extend(condition);
		code.push(Instruction::IfZeroGoto { cond, target: after.clone() });
	}
	code.extend(body);
	if let Some(next) = next {
		code.push(Instruction::Label(next));
	}
	code.extend(update);
	code.push(Instruction::Goto(begin));
	code.push(Instruction::Label(after));
	code
}

// SAVE_CONTEXT; argument code; STORE each; JAL f(sig); [dst = RET_VAL]
pub fn call(signature: &str, arguments: Vec<(Code, String)>, result: Option<String>) -> Code {
	let mut code = vec![Instruction::SaveContext];
	let mut stores = Vec::with_capacity(arguments.len());
	for (arg_code, place) in arguments {
		code.extend(arg_code);
		stores.push(Instruction::Store(place));
	}
	code.extend(stores);
	code.push(Instruction::Jal(signature.to_owned()));
	if let Some(dst) = result {
		code.push(Instruction::CaptureReturn { dst });
	}
	code
}

// f(sig) :; LOAD_PARAM each; body; RETURN unless the body already ends with one
pub fn function(signature: &str, params: &[String], body: Code) -> Code {
	let mut code = vec![Instruction::Label(Label::Function(signature.to_owned()))];
	code.extend(params.iter().cloned().map(Instruction::LoadParam));
	let returns = matches!(body.last(), Some(Instruction::Return));
	code.extend(body);
	if !returns {
		code.push(Instruction::Return);
	}
	code
}
