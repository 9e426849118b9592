//! Registry and notification core for Courier packages.
//!
//! Packages extend the client by registering things at activation and removing them at
//! deactivation. This crate holds what they register into:
//!
//! - [`KeyedRegistry`]: uniquely named extensions in priority order.
//! - [`ComponentRegistry`]: components placed by role, location, and mode.
//! - [`ServiceLocator`]: services requested before or after they exist.
//! - [`ResourceRegistry`]: sounds and other assets resolved against the resource directory.
//! - [`Observable`]: the change feed every registry exposes, also usable as a store.
//!
//! [`RegistryContext`] ties them to one scheduler and error reporter per process.
//!
//! # Error model
//!
//! - Shape and uniqueness problems are [`RegistryError`]s returned before anything changes.
//! - Failures inside deferred callbacks are [`CallbackFailure`]s sent to the
//!   [`ErrorReporter`], never to the caller.
//! - Looking up something that is not registered returns `None`.

pub mod component;
pub mod config;
pub mod context;
pub mod error;
pub mod keyed;
pub mod observable;
pub mod report;
pub mod resources;
pub mod runtime;
pub mod services;

pub use component::{ComponentDescriptor, ComponentQuery, ComponentRegistry};
pub use config::{ConfigError, RuntimeSettings};
pub use context::RegistryContext;
pub use error::{InvalidReason, RegistryError};
pub use keyed::{Extension, KeyedRegistry, RegisterOptions, Snapshot};
pub use observable::{DEFAULT_DEBOUNCE, Observable, ObservableId, Subscription, SubscriptionSet};
pub use report::{CallbackFailure, ErrorReporter, MemoryReporter, TracingReporter};
pub use resources::{ResolvedResource, ResourceLocation, ResourcePath, ResourceRegistry, ResourceSink, ResourceValue};
pub use runtime::RegistryRuntime;
pub use services::{Provider, ServiceLocator};
