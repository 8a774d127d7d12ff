use paramtree::param::{Registry, Result};
use serde::Serialize;

use crate::cmd::util::{format_version, print_json};

#[derive(Serialize)]
struct ClassRow {
	name: &'static str,
	version: String,
	checksum: String,
	alignment: usize,
	fields: usize,
}

pub fn run(json: bool) -> Result<()> {
	let registry = Registry::builtin();
	let rows: Vec<ClassRow> = registry
		.iter()
		.map(|class| ClassRow {
			name: class.name(),
			version: format_version(class.version()),
			checksum: class.checksum_hex(),
			alignment: class.alignment(),
			fields: class.fields().len(),
		})
		.collect();

	if json {
		return print_json(&serde_json::json!({ "classes": rows }));
	}

	println!("classes: {}", rows.len());
	for row in &rows {
		println!(
			"  {} version={} checksum={} align={} fields={}",
			row.name, row.version, row.checksum, row.alignment, row.fields
		);
	}
	Ok(())
}
