use std::collections::BTreeMap;

use paramtree::param::{ClassSchema, Registry, Result};
use serde::Serialize;

use crate::cmd::util::{format_version, heap_traits, hint_json, hint_text, print_json};

#[derive(Serialize)]
struct NodeRow {
	id: usize,
	long_name: String,
	#[serde(rename = "type")]
	ty: &'static str,
	parent: Option<usize>,
	children: Vec<usize>,
	included: bool,
	array_size: Option<i64>,
	dynamic_handle_indices: Vec<u8>,
	variants: Vec<&'static str>,
	hints: BTreeMap<&'static str, serde_json::Value>,
	offset: usize,
	size: usize,
	align: usize,
}

/// Print the definition tree of one class with its lookup table offsets.
pub fn run(class_name: String, json: bool) -> Result<()> {
	let registry = Registry::builtin();
	let class = registry.require(&class_name)?;
	let schema = class.definition_tree(&heap_traits());
	let rows = node_rows(&schema);

	if json {
		return print_json(&serde_json::json!({
			"class": class.name(),
			"version": format_version(class.version()),
			"checksum": class.checksum_hex(),
			"inline_size": schema.inline_size(),
			"nodes": rows,
		}));
	}

	println!("class: {}", class.name());
	println!("version: {}", format_version(class.version()));
	println!("checksum: {}", class.checksum_hex());
	println!("inline_size: {}", schema.inline_size());
	println!("nodes: {}", rows.len());
	for (row, node) in rows.iter().zip(schema.tree().nodes()) {
		let name = if row.id == 0 { "<root>" } else { row.long_name.as_str() };
		let mut line = format!("  [{}] {} {} offset={} size={}", row.id, name, row.ty, row.offset, row.size);
		if let Some(size) = row.array_size {
			line.push_str(&format!(" array={}", if size < 0 { "dynamic".to_owned() } else { size.to_string() }));
		}
		if !row.included {
			line.push_str(" excluded");
		}
		if !row.variants.is_empty() {
			line.push_str(&format!(" variants={}", row.variants.join("|")));
		}
		println!("{line}");
		for hint in node.hints {
			println!("      {} = {}", hint.name, hint_text(hint.value));
		}
	}
	Ok(())
}

fn node_rows(schema: &ClassSchema) -> Vec<NodeRow> {
	let lookup = schema.lookup();
	schema
		.tree()
		.nodes()
		.iter()
		.enumerate()
		.map(|(id, node)| {
			let entry = lookup.node(id);
			NodeRow {
				id,
				long_name: node.long_name.to_string(),
				ty: node.ty.as_str(),
				parent: node.parent,
				children: node.children().to_vec(),
				included: node.included,
				array_size: node.array_size.map(|size| size.as_i64()),
				dynamic_handle_indices: node.dynamic_handle_indices.to_vec(),
				variants: node.ref_variants.to_vec(),
				hints: node.hints.iter().map(|hint| (hint.name, hint_json(hint.value))).collect(),
				offset: entry.offset,
				size: entry.size,
				align: entry.align,
			}
		})
		.collect()
}
