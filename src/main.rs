use std::{fs, process};

use gumdrop::Options;

mod backend;
mod frontend;
mod helper;

#[derive(Debug, Options)]
struct Opt {
	#[options(help = "print help message")]
	help: bool,

	#[options(help = "print the token table")]
	tokens: bool,

	#[options(help = "print the annotated syntax tree")]
	ast: bool,

	#[options(help = "print the symbol tables")]
	symbols: bool,

	#[options(free, help = "source file")]
	input: Vec<String>,
}

fn main() {
	env_logger::init();

	let opt = Opt::parse_args_default_or_exit();
	let src_file = match opt.input.as_slice() {
		[f] => f,
		_ => {
			eprintln!("usage: tacc [--tokens] [--ast] [--symbols] <file>");
			process::exit(2);
		}
	};
	let src = match fs::read_to_string(src_file) {
		Ok(src) => src,
		Err(e) => {
			eprintln!("{}: {}", src_file, e);
			process::exit(2);
		}
	};

	if opt.tokens {
		let (tokens, _) = frontend::tokens(&src);
		for t in tokens {
			println!("{:>4}:{:<4} {:?}", t.line, t.column, t.kind);
		}
	}

	match frontend::compile(&src) {
		Ok(compilation) => {
			if opt.ast {
				println!("{:#?}", compilation.unit);
			}
			if opt.symbols {
				print!("{}", compilation.scopes);
			}
			for line in backend::ir::listing(&compilation.code) {
				println!("{}", line);
			}
		}

		Err(diagnostics) => {
			for d in diagnostics {
				eprintln!("{}", d);
			}
			process::exit(1);
		}
	}
}
