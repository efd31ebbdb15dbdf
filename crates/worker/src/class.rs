/// Execution classes used to label pipeline work in traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// Work on the single dedicated thread that owns the parsing engine.
	Engine,
	/// Callbacks the host runs on its store-owning thread during idle windows.
	HostIdle,
}

impl TaskClass {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Engine => "engine",
			Self::HostIdle => "host_idle",
		}
	}
}
