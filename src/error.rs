//! Error types.
//!
//! Errors that flow *through* a stream are the stream's own `Err` type
//! parameter. The types here cover failures of the library surface itself:
//! adapting a foreign shape, spawning on a scheduler, and awaiting a stream
//! as a future.

use futures::task::SpawnError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RxError {
  /// `from` found none of the capabilities it knows how to adapt.
  #[error(
    "expected an Observable, a Subscribable, an ObservableProvider, an async sequence or a \
     sequence"
  )]
  NotObservable,

  #[error("failed to spawn a task on the scheduler")]
  Spawn(#[from] SpawnError),
}

/// Why a stream awaited as a future did not produce its value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TerminalError<E> {
  /// The stream signalled `error`.
  #[error("observable terminated with an error")]
  Error(E),

  /// The subscription was torn down before any terminal signal arrived.
  #[error("observable was torn down before it terminated")]
  Cancelled,
}

