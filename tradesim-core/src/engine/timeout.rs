//! Engine-enforced deadlines for collaborator calls.
//!
//! With a deadline the call runs on a helper thread; if it has not answered
//! in time the engine stops waiting and reports a timeout. The helper thread
//! is abandoned, not retried. Without a deadline the call runs inline. A
//! panicking collaborator is an error on both paths.

use crate::providers::ProviderError;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

/// Run `call`, giving up after `deadline`. Without a deadline the call runs inline.
pub fn call_with_deadline<T, F>(
    deadline: Option<Duration>,
    provider: &str,
    call: F,
) -> Result<T, ProviderError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ProviderError> + Send + 'static,
{
    let Some(limit) = deadline else {
        return panic::catch_unwind(AssertUnwindSafe(call))
            .unwrap_or_else(|_| Err(ProviderError::Other(format!("{provider} call panicked"))));
    };

    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name(format!("tradesim-{provider}"))
        .spawn(move || {
            // The receiver is gone if the deadline already passed.
            let _ = tx.send(call());
        })
        .map_err(|e| ProviderError::Other(format!("failed to spawn {provider} call: {e}")))?;

    match rx.recv_timeout(limit) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(ProviderError::Timeout {
            provider: provider.to_string(),
            millis: limit.as_millis() as u64,
        }),
        Err(RecvTimeoutError::Disconnected) => Err(ProviderError::Other(format!(
            "{provider} call panicked"
        ))),
    }
}
