//! Registry trait for self-registering implementations.

/// Base trait for implementation registries.
///
/// Every pluggable implementation (currently the order feeds) exposes a
/// `Registry` type that declares the name it is configured under and the
/// factory that builds it from its TOML table.
pub trait ImplementationRegistry {
	/// Name used in configuration files, e.g. `file` for `[feed.implementations.file]`.
	const NAME: &'static str;

	/// Factory function type of the implementation family.
	type Factory;

	/// Returns the factory for this implementation.
	fn factory() -> Self::Factory;
}
