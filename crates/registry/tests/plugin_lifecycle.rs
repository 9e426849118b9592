//! Package activate/deactivate cycle against a full context on the tokio event loop.

use std::sync::Arc;
use std::time::Duration;

use courier_registry::{
	Extension, KeyedRegistry, MemoryReporter, RegisterOptions, RegistryContext, ResourceLocation, RuntimeSettings,
	SubscriptionSet,
};
use courier_worker::EventLoop;
use parking_lot::Mutex;

struct ComposerExtension {
	name: &'static str,
}

impl Extension for ComposerExtension {
	fn name(&self) -> &str {
		self.name
	}
}

struct Translator {
	target: &'static str,
}

/// A package that contributes a composer extension, a service, and a sound.
struct TranslationPackage {
	extension: Arc<ComposerExtension>,
}

impl TranslationPackage {
	fn new() -> Self {
		Self {
			extension: Arc::new(ComposerExtension { name: "translation" }),
		}
	}

	fn activate(&self, ctx: &RegistryContext, composer: &KeyedRegistry<ComposerExtension>) {
		composer
			.register(Arc::clone(&self.extension), RegisterOptions::priority(5))
			.expect("translation extension registers once");
		ctx.services().register_service("translator", Arc::new(Translator { target: "fr" }));
		ctx.sounds().register("translated", ["sounds", "translated.ogg"]);
	}

	fn deactivate(&self, ctx: &RegistryContext, composer: &KeyedRegistry<ComposerExtension>) {
		composer.unregister(&self.extension).expect("valid extension");
		ctx.services().unregister_service("translator");
		ctx.sounds().unregister("translated");
	}
}

fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[tokio::test(start_paused = true)]
async fn package_lifecycle_drives_consumers() {
	init_tracing();
	let (scheduler, event_loop) = EventLoop::start();
	let reporter = MemoryReporter::new();
	let settings = RuntimeSettings::parse("resource-dir = \"/opt/courier\"\ndebounce-ms = 10").unwrap();
	let ctx = RegistryContext::new(settings, Arc::new(scheduler), Arc::new(reporter.clone()));
	let composer: KeyedRegistry<ComposerExtension> = ctx.extension_registry("composer");
	composer
		.register(Arc::new(ComposerExtension { name: "spellcheck" }), RegisterOptions::default())
		.unwrap();

	// A consumer loaded before the producer asks for the service and watches the registry.
	let received = Arc::new(Mutex::new(Vec::new()));
	let sink = Arc::clone(&received);
	ctx.services().with_service("translator", move |t: Arc<Translator>| sink.lock().push(t.target));

	let renders = Arc::new(Mutex::new(Vec::new()));
	let mut subscriptions = SubscriptionSet::new();
	let render_log = Arc::clone(&renders);
	subscriptions.adopt(composer.listen(move |_| render_log.lock().push("render")));

	let package = TranslationPackage::new();
	package.activate(&ctx, &composer);
	assert!(received.lock().is_empty(), "service delivery is deferred");

	tokio::time::sleep(Duration::from_millis(50)).await;
	assert_eq!(*received.lock(), ["fr"]);
	assert_eq!(*renders.lock(), ["render"]);
	assert_eq!(
		composer.extensions().iter().map(|e| e.name).collect::<Vec<_>>(),
		["spellcheck", "translation"]
	);
	assert_eq!(
		ctx.sounds().locate("translated", None),
		Some(ResourceLocation::File("/opt/courier/sounds/translated.ogg".into()))
	);

	package.deactivate(&ctx, &composer);
	tokio::time::sleep(Duration::from_millis(50)).await;
	assert_eq!(*renders.lock(), ["render", "render"]);
	assert!(composer.get("translation").is_none());
	assert!(!ctx.services().has_service("translator"));
	assert!(ctx.sounds().resolve("translated").is_none());

	// Torn-down consumers stop hearing about changes.
	subscriptions.stop_listening_to_all();
	package.activate(&ctx, &composer);
	tokio::time::sleep(Duration::from_millis(50)).await;
	assert_eq!(renders.lock().len(), 2);

	assert!(reporter.failures().is_empty());
	event_loop.shutdown().await;
}
