use std::collections::BTreeMap;
use std::fmt::Write;

use paramtree::param::Value;

/// Output truncation limits for exported values.
#[derive(Debug, Clone, Copy)]
pub struct PrintOptions {
	/// Maximum number of Unicode scalar values printed for strings.
	pub max_string_len: usize,
	/// Maximum number of elements printed for arrays.
	pub max_array_items: usize,
	/// Maximum recursive print depth for nested arrays/structs.
	pub max_print_depth: u32,
}

impl Default for PrintOptions {
	fn default() -> Self {
		Self {
			max_string_len: 200,
			max_array_items: 16,
			max_print_depth: 8,
		}
	}
}

impl PrintOptions {
	/// Preset that never truncates.
	pub fn unlimited() -> Self {
		Self {
			max_string_len: usize::MAX,
			max_array_items: usize::MAX,
			max_print_depth: u32::MAX,
		}
	}
}

/// Print one exported value tree.
pub fn print_value(value: &Value, indent: usize, options: PrintOptions) {
	print!("{}", render_value(value, indent, options));
}

/// Render one exported value tree, one line per scalar or nested opener.
pub fn render_value(value: &Value, indent: usize, options: PrintOptions) -> String {
	let mut out = String::new();
	write_value(&mut out, value, indent, 0, options);
	out
}

fn write_value(out: &mut String, value: &Value, indent: usize, depth: u32, options: PrintOptions) {
	let pad = " ".repeat(indent);
	match value {
		Value::Struct(fields) => write_struct(out, None, fields, indent, depth, options),
		Value::Ref(image) => match &image.value {
			Value::Struct(fields) => write_struct(out, Some(&image.class), fields, indent, depth, options),
			other => {
				let _ = writeln!(out, "{pad}{}", image.class);
				write_value(out, other, indent + 2, depth + 1, options);
			}
		},
		Value::Array(items) if !is_flat(items) => {
			if depth >= options.max_print_depth {
				let _ = writeln!(out, "{pad}[... {} items]", items.len());
				return;
			}
			let _ = writeln!(out, "{pad}[");
			for item in items.iter().take(options.max_array_items) {
				write_value(out, item, indent + 2, depth + 1, options);
			}
			if items.len() > options.max_array_items {
				let _ = writeln!(out, "{pad}  ... {} more", items.len() - options.max_array_items);
			}
			let _ = writeln!(out, "{pad}]");
		}
		leaf => {
			let _ = writeln!(out, "{pad}{}", inline_text(leaf, options));
		}
	}
}

fn write_struct(out: &mut String, label: Option<&str>, fields: &BTreeMap<String, Value>, indent: usize, depth: u32, options: PrintOptions) {
	let pad = " ".repeat(indent);
	let head = label.map(|class| format!("{class} ")).unwrap_or_default();
	if depth >= options.max_print_depth {
		let _ = writeln!(out, "{pad}{head}{{ ... }}");
		return;
	}

	let _ = writeln!(out, "{pad}{head}{{");
	for (name, field) in fields {
		if is_leaf(field) {
			let _ = writeln!(out, "{pad}  {name} = {}", inline_text(field, options));
		} else {
			let _ = writeln!(out, "{pad}  {name} =");
			write_value(out, field, indent + 4, depth + 1, options);
		}
	}
	let _ = writeln!(out, "{pad}}}");
}

fn is_leaf(value: &Value) -> bool {
	match value {
		Value::Struct(_) | Value::Ref(_) => false,
		Value::Array(items) => is_flat(items),
		_ => true,
	}
}

fn is_flat(items: &[Value]) -> bool {
	items.iter().all(|item| !matches!(item, Value::Struct(_) | Value::Ref(_) | Value::Array(_)))
}

fn inline_text(value: &Value, options: PrintOptions) -> String {
	match value {
		Value::Null => "null".to_owned(),
		Value::Bool(v) => v.to_string(),
		Value::UInt(v) => v.to_string(),
		Value::Int(v) => v.to_string(),
		Value::Float(v) => v.to_string(),
		Value::String(v) => format!("\"{}\"", truncate(v, options.max_string_len)),
		Value::Array(items) => {
			let mut parts: Vec<String> = items.iter().take(options.max_array_items).map(|item| inline_text(item, options)).collect();
			if items.len() > options.max_array_items {
				parts.push(format!("... {} more", items.len() - options.max_array_items));
			}
			format!("[{}]", parts.join(", "))
		}
		Value::Struct(fields) => format!("{{ {} fields }}", fields.len()),
		Value::Ref(image) => image.class.clone(),
	}
}

fn truncate(text: &str, max: usize) -> String {
	match text.char_indices().nth(max) {
		Some((cut, _)) => format!("{}...", &text[..cut]),
		None => text.to_owned(),
	}
}
