use std::thread::JoinHandle;

use crate::TaskClass;
use crate::panic::panic_message;

/// Spawns a dedicated named OS thread with shared worker classification metadata.
pub fn spawn_named_thread<F, R>(class: TaskClass, name: impl Into<String>, f: F) -> std::io::Result<JoinHandle<R>>
where
	F: FnOnce() -> R + Send + 'static,
	R: Send + 'static,
{
	let name = name.into();
	tracing::trace!(worker_class = class.as_str(), thread = %name, "worker.spawn_named_thread");
	std::thread::Builder::new().name(name).spawn(f)
}

/// Joins a thread, rendering a panic that escaped it as text.
pub fn join_thread<R>(handle: JoinHandle<R>) -> Result<R, String> {
	let name = handle.thread().name().unwrap_or("<unnamed>").to_string();
	handle.join().map_err(|payload| {
		let msg = panic_message(payload.as_ref());
		tracing::error!(thread = %name, panic = %msg, "worker.join_thread: thread panicked");
		msg
	})
}
