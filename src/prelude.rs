//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

pub use std::convert::Infallible;

#[cfg(feature = "tokio-scheduler")]
pub use crate::scheduler::TokioLocalScheduler;
pub use crate::{
  cancellation::CancellationToken,
  error::{RxError, TerminalError},
  observable::*,
  observer::Observer,
  ops, pipe,
  rc::{MutRc, RcDeref, RcDerefMut},
  scheduler::{LocalScheduler, Scheduler},
  subject::{Subject, SubjectSubscription},
  subscriber::SubscriptionObserver,
  subscription::{IntoTeardown, Subscription, SubscriptionGuard, SubscriptionLike, Teardown},
};
