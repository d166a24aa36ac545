//! The `extfs` shell: loads the disk image, runs the interactive command
//! loop, and saves the image back out on exit.

use extfs::fs::Filesystem;
use extfs::shell;

fn main() {
	let mut fs = Filesystem::new_formatted();

	for line in fs.read() {
		println!("{line}");
	}

	shell::run(&mut fs);

	let report = fs.write();
	for line in report.stdout {
		println!("{line}");
	}
	if let Some(err) = report.stderr {
		eprintln!("{err}");
	}
}
