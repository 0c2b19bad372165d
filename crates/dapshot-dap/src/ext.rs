//! Small helpers for best-effort paths

/// Turn a `Result` into an `Option`, logging the error at debug level.
///
/// For work whose failure must not abort the session: malformed event
/// bodies, encoding a teardown request.
///
/// ```text
/// let Some(body) = event.parse_body::<OutputEventBody>()
///     .debug_ok("Ignoring malformed output event") else { return };
/// ```
pub trait LogErr<T> {
    fn debug_ok(self, context: &str) -> Option<T>;
}

impl<T, E: std::fmt::Display> LogErr<T> for Result<T, E> {
    fn debug_ok(self, context: &str) -> Option<T> {
        self.map_err(|e| tracing::debug!("{}: {}", context, e)).ok()
    }
}
