//! The interactive REPL: reads a line, tokenizes it (double-quote groups
//! stay together), dispatches to a [`Filesystem`] method, and prints the
//! result. Loads the image once at startup and saves it once at exit.

use std::io::{self, Write};

use crate::fs::Filesystem;

/// Shows `>> `, flushes it, and reads one line from stdin. Returns `None`
/// on end of input.
fn prompt() -> Option<String> {
	print!(">> ");
	io::stdout().flush().ok()?;

	let mut line = String::new();
	let n = io::stdin().read_line(&mut line).ok()?;
	if n == 0 {
		return None;
	}
	Some(line.trim_end_matches(['\n', '\r']).to_string())
}

/// Splits a line into tokens on whitespace, treating a `"..."`-delimited
/// span as a single token regardless of whitespace inside it. An unbalanced
/// quote is reported to the caller instead of silently swallowing the rest
/// of the line.
fn tokenize(line: &str) -> Result<Vec<String>, &'static str> {
	let mut tokens = Vec::new();
	let mut current = String::new();
	let mut in_quotes = false;
	let mut has_current = false;

	for c in line.chars() {
		match c {
			'"' => {
				in_quotes = !in_quotes;
				has_current = true;
			}
			c if c.is_whitespace() && !in_quotes => {
				if has_current {
					tokens.push(std::mem::take(&mut current));
					has_current = false;
				}
			}
			c => {
				current.push(c);
				has_current = true;
			}
		}
	}

	if in_quotes {
		return Err("Quotes not balanced.");
	}
	if has_current {
		tokens.push(current);
	}
	Ok(tokens)
}

/// Prints the usage summary shown for an unrecognized command.
fn print_usage() {
	println!("extfs: A persistent in-memory fs.");
	println!("commands:");
	println!("\tq: quit extfs.");
	println!("\tread: read from {}.", crate::persist::DATA_FILE);
	println!("\twrite: write to {}.", crate::persist::DATA_FILE);
	println!("\tpwd: print working directory.");
	println!("\tcd: change directory.");
	println!("\tmkdir: make directory.");
	println!("\tls: list directory.");
	println!("\techo: write to file.");
	println!("\tcat: show file.");
	println!("\trm: remove file.");
	println!("\tfmt: format disk.");
	println!("\tdmp: dump internal presentation.");
}

/// Dispatches one already-tokenized command line against `fs`, printing its
/// result. Returns `false` when the shell should stop looping.
fn dispatch(fs: &mut Filesystem, tokens: &[String]) -> bool {
	let Some(cmd) = tokens.first() else {
		return true;
	};
	let arg = |i: usize| tokens.get(i).map(String::as_str);

	match cmd.as_str() {
		"cd" => print_result(fs.cd(arg(1)).map(|()| Vec::new())),
		"ls" => print_result(fs.ls(arg(1))),
		"mkdir" => print_result(fs.mkdir(arg(1)).map(|()| Vec::new())),
		"rmdir" => print_result(fs.rmdir(arg(1))),
		"echo" => print_result(fs.echo(arg(1), arg(2)).map(|()| Vec::new())),
		"cat" => print_result(fs.cat(arg(1)).map(|s| vec![s])),
		"rm" => print_result(fs.rm(arg(1)).map(|()| Vec::new())),
		"pwd" => println!("{}", fs.pwd()),
		"fmt" => {
			for line in fs.format_disk() {
				println!("{line}");
			}
		}
		"dmp" => {
			for line in fs.dmp() {
				println!("{line}");
			}
		}
		"read" => {
			for line in fs.read() {
				println!("{line}");
			}
		}
		"write" => {
			let report = fs.write();
			for line in report.stdout {
				println!("{line}");
			}
			if let Some(err) = report.stderr {
				eprintln!("{err}");
			}
		}
		"q" => {
			println!("Now quitting...");
			return false;
		}
		_ => print_usage(),
	}
	true
}

/// Prints a command's lines on success, or its `ERR: ...` message on
/// failure.
fn print_result(result: crate::error::Result<Vec<String>>) {
	match result {
		Ok(lines) => {
			for line in lines {
				println!("{line}");
			}
		}
		Err(e) => println!("{e}"),
	}
}

/// Runs the REPL until stdin closes or `exit`/`quit` is entered.
pub fn run(fs: &mut Filesystem) {
	while let Some(line) = prompt() {
		let tokens = match tokenize(&line) {
			Ok(tokens) => tokens,
			Err(msg) => {
				println!("ERR: {msg}");
				continue;
			}
		};
		if !dispatch(fs, &tokens) {
			break;
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn tokenize_splits_on_whitespace() {
		assert_eq!(tokenize("cd a/b").unwrap(), vec!["cd", "a/b"]);
	}

	#[test]
	fn tokenize_groups_quoted_spans() {
		assert_eq!(tokenize(r#"echo "hello world" f.txt"#).unwrap(), vec!["echo", "hello world", "f.txt"]);
	}

	#[test]
	fn tokenize_reports_unbalanced_quotes() {
		assert!(tokenize(r#"echo "oops f.txt"#).is_err());
	}

	#[test]
	fn tokenize_ignores_repeated_whitespace() {
		assert_eq!(tokenize("  ls   ").unwrap(), vec!["ls"]);
	}
}
