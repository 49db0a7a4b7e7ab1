use thiserror::Error;

/// Errors that can occur when starting a metronome.
///
/// `start` on an already-active instance is not an error; it returns
/// `Ok(false)` and leaves the running schedule untouched. Likewise
/// `pause`/`resume`/`stop` in a state where they do not apply are silent
/// no-ops. Only failures to create the background worker surface here.
#[derive(Debug, Error)]
pub enum StartError {
    /// The interval was zero; a zero-period grid would spin without waiting.
    #[error("interval must be non-zero")]
    ZeroInterval,

    /// No Tokio runtime was reachable from the calling thread, so the
    /// worker task could not be spawned. The instance is left untouched.
    #[error("no Tokio runtime available to host the worker task")]
    NoRuntime,
}
