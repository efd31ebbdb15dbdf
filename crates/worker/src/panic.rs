use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Renders a panic payload as text.
///
/// `panic!` with a literal yields a `&'static str` payload, formatted panics
/// yield a `String`; anything else is reported generically.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(msg) = payload.downcast_ref::<&'static str>() {
		(*msg).to_string()
	} else if let Some(msg) = payload.downcast_ref::<String>() {
		msg.clone()
	} else {
		"panic with non-string payload".to_string()
	}
}

/// Runs `f`, converting a panic into its rendered message.
pub fn catch_panic<F, R>(f: F) -> Result<R, String>
where
	F: FnOnce() -> R,
{
	catch_unwind(AssertUnwindSafe(f)).map_err(|payload| panic_message(payload.as_ref()))
}

#[cfg(test)]
#[path = "panic_tests.rs"]
mod tests;
