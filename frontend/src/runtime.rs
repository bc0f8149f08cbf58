use futures::future::LocalBoxFuture;

/// Clock and task spawner the cache runs on.
pub trait Runtime {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> f64;

    /// Runs `task` to completion on the current thread's event loop.
    fn spawn(&self, task: LocalBoxFuture<'static, ()>);
}

/// The browser event loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserRuntime;

impl Runtime for BrowserRuntime {
    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}
