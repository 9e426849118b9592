//! Named static assets (sounds, icons) resolved against the resource directory.
//!
//! Values are stored in whatever shape they were registered with and only turned into a
//! location on lookup:
//!
//! | Stored value | Location |
//! |--------------|----------|
//! | `Single("<scheme>://…")` for a configured scheme | [`ResourceLocation::Uri`], unchanged |
//! | `Single(path)` | [`ResourceLocation::File`] at `resource_dir/path` |
//! | `Segments([a, b, …])` | [`ResourceLocation::File`] at `resource_dir/a/b/…` |
//! | `Variants { key: path, … }` | the selected key's path, by the rules above |

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::config::RuntimeSettings;
use crate::observable::{Observable, Subscription};
use crate::report::{CallbackFailure, ErrorReporter};
use crate::runtime::RegistryRuntime;

/// One way of locating an asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourcePath {
	/// A URI, or a path relative to the resource directory.
	Single(String),
	/// Path segments joined in order under the resource directory.
	Segments(Vec<String>),
}

/// Registered value for one resource name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceValue {
	Path(ResourcePath),
	/// Alternatives keyed by variant name (e.g. per theme), in registration order.
	Variants(IndexMap<String, ResourcePath>),
}

impl From<&str> for ResourcePath {
	fn from(value: &str) -> Self {
		Self::Single(value.to_owned())
	}
}

impl From<String> for ResourcePath {
	fn from(value: String) -> Self {
		Self::Single(value)
	}
}

impl<S: Into<String>> From<Vec<S>> for ResourcePath {
	fn from(segments: Vec<S>) -> Self {
		Self::Segments(segments.into_iter().map(Into::into).collect())
	}
}

impl<S: Into<String>, const N: usize> From<[S; N]> for ResourcePath {
	fn from(segments: [S; N]) -> Self {
		Self::Segments(segments.into_iter().map(Into::into).collect())
	}
}

impl From<ResourcePath> for ResourceValue {
	fn from(path: ResourcePath) -> Self {
		Self::Path(path)
	}
}

impl From<&str> for ResourceValue {
	fn from(value: &str) -> Self {
		Self::Path(value.into())
	}
}

impl From<String> for ResourceValue {
	fn from(value: String) -> Self {
		Self::Path(value.into())
	}
}

impl<S: Into<String>> From<Vec<S>> for ResourceValue {
	fn from(segments: Vec<S>) -> Self {
		Self::Path(segments.into())
	}
}

impl<S: Into<String>, const N: usize> From<[S; N]> for ResourceValue {
	fn from(segments: [S; N]) -> Self {
		Self::Path(segments.into())
	}
}

impl ResourceValue {
	/// Builds a [`ResourceValue::Variants`] from `(variant, path)` pairs.
	pub fn variants<K, P>(entries: impl IntoIterator<Item = (K, P)>) -> Self
	where
		K: Into<String>,
		P: Into<ResourcePath>,
	{
		Self::Variants(entries.into_iter().map(|(k, p)| (k.into(), p.into())).collect())
	}
}

/// Where a resource can be loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceLocation {
	/// Opaque URI handed to the host as-is.
	Uri(String),
	File(PathBuf),
}

/// Fully resolved registry value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedResource {
	Single(ResourceLocation),
	Variants(IndexMap<String, ResourceLocation>),
}

/// Host-side consumer of a located resource, such as an audio player.
pub trait ResourceSink {
	fn open(&self, name: &str, location: &ResourceLocation) -> std::io::Result<()>;
}

/// Mutable name to [`ResourceValue`] map. Later registrations overwrite earlier ones.
pub struct ResourceRegistry {
	label: &'static str,
	resource_dir: PathBuf,
	uri_schemes: Vec<String>,
	entries: RwLock<HashMap<String, ResourceValue>>,
	changes: Observable<()>,
	reporter: Arc<dyn ErrorReporter>,
}

impl std::fmt::Debug for ResourceRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ResourceRegistry")
			.field("label", &self.label)
			.field("resource_dir", &self.resource_dir)
			.field("uri_schemes", &self.uri_schemes)
			.field("len", &self.entries.read().len())
			.finish()
	}
}

impl ResourceRegistry {
	/// Creates an empty registry resolving against `settings.resource_dir`.
	pub fn new(label: &'static str, settings: &RuntimeSettings, runtime: &RegistryRuntime) -> Self {
		Self {
			label,
			resource_dir: settings.resource_dir.clone(),
			uri_schemes: settings.uri_schemes.clone(),
			entries: RwLock::new(HashMap::new()),
			changes: runtime.observable(label),
			reporter: Arc::clone(runtime.reporter()),
		}
	}

	/// Sets the value for `name`, replacing any earlier one.
	pub fn register(&self, name: &str, value: impl Into<ResourceValue>) {
		self.entries.write().insert(name.to_owned(), value.into());
		tracing::debug!(registry = self.label, name, "resources.register");
		self.changes.trigger_debounced(());
	}

	/// Sets every `(name, value)` pair, as one change.
	pub fn register_many<K, V>(&self, entries: impl IntoIterator<Item = (K, V)>)
	where
		K: Into<String>,
		V: Into<ResourceValue>,
	{
		let count = {
			let mut map = self.entries.write();
			let mut count = 0usize;
			for (name, value) in entries {
				map.insert(name.into(), value.into());
				count += 1;
			}
			count
		};
		tracing::debug!(registry = self.label, count, "resources.register_many");
		self.changes.trigger_debounced(());
	}

	/// Removes `name`. Returns the removed value; absent names are a no-op.
	pub fn unregister(&self, name: &str) -> Option<ResourceValue> {
		let removed = self.entries.write().remove(name);
		tracing::debug!(registry = self.label, name, removed = removed.is_some(), "resources.unregister");
		self.changes.trigger_debounced(());
		removed
	}

	/// Removes each listed name, ignoring absent ones. Returns how many were present.
	pub fn unregister_many<K: AsRef<str>>(&self, names: impl IntoIterator<Item = K>) -> usize {
		let removed = {
			let mut map = self.entries.write();
			let mut removed = 0usize;
			for name in names {
				let name: &str = name.as_ref();
				if map.remove(name).is_some() {
					removed += 1;
				}
			}
			removed
		};
		tracing::debug!(registry = self.label, removed, "resources.unregister_many");
		self.changes.trigger_debounced(());
		removed
	}

	/// Raw registered value.
	pub fn get(&self, name: &str) -> Option<ResourceValue> {
		self.entries.read().get(name).cloned()
	}

	pub fn contains(&self, name: &str) -> bool {
		self.entries.read().contains_key(name)
	}

	/// Registered names, sorted.
	pub fn names(&self) -> Vec<String> {
		let mut names: Vec<_> = self.entries.read().keys().cloned().collect();
		names.sort();
		names
	}

	/// Resolves every location registered under `name`. Unknown names yield `None`.
	pub fn resolve(&self, name: &str) -> Option<ResolvedResource> {
		let entries = self.entries.read();
		Some(match entries.get(name)? {
			ResourceValue::Path(path) => ResolvedResource::Single(self.locate_path(path)),
			ResourceValue::Variants(variants) => {
				ResolvedResource::Variants(variants.iter().map(|(k, p)| (k.clone(), self.locate_path(p))).collect())
			}
		})
	}

	/// Resolves one location for `name`.
	///
	/// Variant values use `variant`, or their first entry when `variant` is `None`. Plain path
	/// values ignore `variant`.
	pub fn locate(&self, name: &str, variant: Option<&str>) -> Option<ResourceLocation> {
		let entries = self.entries.read();
		let path = match entries.get(name)? {
			ResourceValue::Path(path) => path,
			ResourceValue::Variants(variants) => match variant {
				Some(key) => variants.get(key)?,
				None => variants.first().map(|(_, p)| p)?,
			},
		};
		Some(self.locate_path(path))
	}

	/// Locates `name` and hands it to `sink`. Returns false if nothing could be located.
	///
	/// Sink errors are reported as [`CallbackFailure::ResourceUnavailable`].
	pub fn open(&self, name: &str, variant: Option<&str>, sink: &dyn ResourceSink) -> bool {
		let Some(location) = self.locate(name, variant) else {
			tracing::trace!(registry = self.label, name, "resources.open_unknown");
			return false;
		};
		if let Err(err) = sink.open(name, &location) {
			self.reporter.report(CallbackFailure::ResourceUnavailable {
				name: name.to_owned(),
				message: err.to_string(),
			});
		}
		true
	}

	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn listen(&self, callback: impl Fn(&()) + Send + Sync + 'static) -> Subscription {
		self.changes.listen(callback)
	}

	fn is_uri(&self, value: &str) -> bool {
		self.uri_schemes
			.iter()
			.any(|scheme| value.strip_prefix(scheme.as_str()).is_some_and(|rest| rest.starts_with("://")))
	}

	fn locate_path(&self, path: &ResourcePath) -> ResourceLocation {
		match path {
			ResourcePath::Single(value) if self.is_uri(value) => ResourceLocation::Uri(value.clone()),
			ResourcePath::Single(value) => ResourceLocation::File(self.under_resource_dir([value])),
			ResourcePath::Segments(segments) => ResourceLocation::File(self.under_resource_dir(segments)),
		}
	}

	/// Joins `parts` below the resource directory. Roots, prefixes and `..` are dropped so a
	/// value can never point outside it.
	fn under_resource_dir<'a>(&self, parts: impl IntoIterator<Item = &'a String>) -> PathBuf {
		let mut path = self.resource_dir.clone();
		for part in parts {
			path.extend(Path::new(part).components().filter_map(|c| match c {
				Component::Normal(segment) => Some(segment),
				_ => None,
			}));
		}
		path
	}
}
