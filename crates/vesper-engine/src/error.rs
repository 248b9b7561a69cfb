/// Errors surfaced by the engine lifecycle.
///
/// The engine never retries or swallows a fault: an error raised inside a
/// subsystem's lifecycle method aborts the remaining callbacks of the
/// current frame and propagates to whoever drives the loop.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("subsystem '{name}' failed during {phase}: {source}")]
    Subsystem {
        name: String,
        phase: &'static str,
        #[source]
        source: anyhow::Error,
    },
}
