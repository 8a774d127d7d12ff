use std::fmt;

use crate::param::{ParamError, Result};

/// One parsed step of a dotted parameter name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
	/// Named struct field.
	Field(String),
	/// Zero-based array index.
	Index(usize),
}

/// Parsed parameter name such as `submeshes[1].indexBuffer[0]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
	/// Ordered steps, always starting with a field.
	pub steps: Vec<PathStep>,
}

impl FieldPath {
	/// Parse `name(.name)*` where every name may carry `[index]` selectors.
	pub fn parse(input: &str) -> Result<Self> {
		let invalid = || ParamError::InvalidFieldPath { path: input.to_owned() };
		if input.is_empty() {
			return Err(invalid());
		}

		let mut steps = Vec::new();
		for segment in input.split('.') {
			let name_end = segment.find('[').unwrap_or(segment.len());
			let (name, mut rest) = segment.split_at(name_end);
			if name.is_empty() || !name.bytes().all(|byte| byte.is_ascii_alphanumeric() || byte == b'_') {
				return Err(invalid());
			}
			steps.push(PathStep::Field(name.to_owned()));

			while !rest.is_empty() {
				let inner = rest.strip_prefix('[').ok_or_else(invalid)?;
				let close = inner.find(']').ok_or_else(invalid)?;
				let digits = &inner[..close];
				if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
					return Err(invalid());
				}
				steps.push(PathStep::Index(digits.parse().map_err(|_| invalid())?));
				rest = &inner[close + 1..];
			}
		}

		Ok(Self { steps })
	}
}

impl fmt::Display for FieldPath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (idx, step) in self.steps.iter().enumerate() {
			match step {
				PathStep::Field(name) if idx == 0 => f.write_str(name)?,
				PathStep::Field(name) => write!(f, ".{name}")?,
				PathStep::Index(index) => write!(f, "[{index}]")?,
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::{FieldPath, PathStep};
	use crate::param::ParamError;

	#[test]
	fn parses_nested_indices() {
		let path = FieldPath::parse("submeshes[1].indexBuffer[0]").expect("path parses");
		assert_eq!(
			path.steps,
			vec![
				PathStep::Field("submeshes".into()),
				PathStep::Index(1),
				PathStep::Field("indexBuffer".into()),
				PathStep::Index(0),
			]
		);
		assert_eq!(path.to_string(), "submeshes[1].indexBuffer[0]");
	}

	#[test]
	fn rejects_malformed_names() {
		for input in ["", ".a", "a.", "a..b", "a[", "a[]", "a[x]", "a[1]b", "[0]", "a-b"] {
			let err = FieldPath::parse(input).expect_err("path should be rejected");
			assert!(matches!(err, ParamError::InvalidFieldPath { .. }), "unexpected error for {input:?}: {err}");
		}
	}
}
