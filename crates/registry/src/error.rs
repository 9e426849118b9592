/// Why an entry failed shape validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
	/// The entry's name is empty or only whitespace.
	MissingName,
}

impl std::fmt::Display for InvalidReason {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::MissingName => write!(f, "missing name"),
		}
	}
}

/// Synchronous registration failure.
///
/// Raised before any mutation, so a failed call leaves the registry as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
	/// The entry failed shape validation.
	#[error("invalid {registry} entry: {reason}")]
	InvalidEntry {
		registry: &'static str,
		reason: InvalidReason,
	},
	/// Another entry already holds this name.
	#[error("duplicate name in {registry}: {name:?}")]
	DuplicateName { registry: &'static str, name: String },
	/// A component query named neither a role nor a location.
	#[error("{registry} query needs at least one role or location")]
	EmptyQuery { registry: &'static str },
}

/// Checks that `name` identifies an entry, returning it unchanged.
pub(crate) fn validate_name<'a>(registry: &'static str, name: &'a str) -> Result<&'a str, RegistryError> {
	if name.trim().is_empty() {
		tracing::warn!(registry, "registry.invalid_entry");
		return Err(RegistryError::InvalidEntry {
			registry,
			reason: InvalidReason::MissingName,
		});
	}
	Ok(name)
}
