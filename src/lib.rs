//! # rxlite: a small push-based Observable library
//!
//! Single-threaded reactive streams with an explicit subscription kernel,
//! a compact operator set, a multicast [`Subject`] and bridges to and from
//! `futures`.
//!
//! ## Quick Start
//!
//! ```rust
//! use rxlite::prelude::*;
//!
//! let numbers: Observable<i32> = from_iter(0..10);
//! numbers
//!   .filter(|v| v % 2 == 0)
//!   .map(|v| v * 2)
//!   .subscribe_next(|v| println!("Value: {}", v));
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Observable`] | Cold producer; every `subscribe` runs it once |
//! | [`Observer`] | Optional `start`, `next`, `error` and `complete` handlers |
//! | [`SubscriptionObserver`] | What a producer emits into; drops signals once closed |
//! | [`Subscription`] | Handle to cancel an active subscription |
//! | [`Subject`] | Hot multicast producer |
//! | [`LocalScheduler`] | Thread-local task pool the async bridges run on |
//!
//! ## Feature Flags
//!
//! - **`tokio-scheduler`**: [`Scheduler`] implementation on top of
//!   `tokio::task::spawn_local`.
//!
//! [`Observable`]: observable::Observable
//! [`Observer`]: observer::Observer
//! [`SubscriptionObserver`]: subscriber::SubscriptionObserver
//! [`Subscription`]: subscription::Subscription
//! [`Subject`]: subject::Subject
//! [`LocalScheduler`]: scheduler::LocalScheduler
//! [`Scheduler`]: scheduler::Scheduler

extern crate self as rxlite;

pub mod cancellation;
pub mod error;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod rc;
pub mod scheduler;
pub mod subject;
pub mod subscriber;
pub mod subscription;

pub use prelude::*;
