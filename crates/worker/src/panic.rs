use std::any::Any;

/// Extracts the message carried by a panic payload.
///
/// `panic!` with a literal produces `&'static str`, formatted panics produce `String`. Anything
/// else (`std::panic::panic_any`) has no printable form.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(msg) = payload.downcast_ref::<&'static str>() {
		return (*msg).to_string();
	}
	if let Some(msg) = payload.downcast_ref::<String>() {
		return msg.clone();
	}
	"non-string panic payload".to_string()
}

#[cfg(test)]
mod tests {
	use std::panic::{UnwindSafe, catch_unwind};

	use super::*;

	fn payload_of(f: impl FnOnce() + UnwindSafe) -> Box<dyn Any + Send> {
		catch_unwind(f).expect_err("closure should panic")
	}

	#[test]
	fn extracts_static_str_payload() {
		let payload = payload_of(|| panic!("boom-str"));
		let msg = panic_message(payload.as_ref());
		assert!(msg.contains("boom-str"), "expected 'boom-str', got: {msg}");
	}

	#[test]
	fn extracts_string_payload() {
		let payload = payload_of(|| panic!("{}", String::from("boom-string")));
		let msg = panic_message(payload.as_ref());
		assert!(msg.contains("boom-string"), "expected 'boom-string', got: {msg}");
	}

	#[test]
	fn opaque_payload_has_placeholder() {
		let payload = payload_of(|| std::panic::panic_any(42_u32));
		assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
	}
}
