use std::collections::BTreeMap;

use crate::param::{ClassDescriptor, ParamError, Result, classes};

/// Name-keyed set of class descriptors known to readers and tools.
#[derive(Debug, Default, Clone)]
pub struct Registry {
	classes: BTreeMap<&'static str, &'static ClassDescriptor>,
}

impl Registry {
	/// Empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registry holding the built-in asset classes.
	pub fn builtin() -> Self {
		let mut registry = Self::new();
		for class in classes::BUILTIN {
			registry.register(class);
		}
		registry
	}

	/// Add or replace a class under its own name.
	pub fn register(&mut self, class: &'static ClassDescriptor) {
		if self.classes.insert(class.name(), class).is_some() {
			log::debug!("replaced registered class {}", class.name());
		}
	}

	/// Look up a class by name.
	pub fn get(&self, name: &str) -> Option<&'static ClassDescriptor> {
		self.classes.get(name).copied()
	}

	/// Look up a class by name, failing with `UnknownClass`.
	pub fn require(&self, name: &str) -> Result<&'static ClassDescriptor> {
		self.get(name).ok_or_else(|| ParamError::UnknownClass { name: name.to_owned() })
	}

	/// Registered classes ordered by name.
	pub fn iter(&self) -> impl Iterator<Item = &'static ClassDescriptor> + '_ {
		self.classes.values().copied()
	}

	/// Number of registered classes.
	pub fn len(&self) -> usize {
		self.classes.len()
	}

	/// Whether no class is registered.
	pub fn is_empty(&self) -> bool {
		self.classes.is_empty()
	}
}
