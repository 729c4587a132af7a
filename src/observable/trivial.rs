use crate::observable::Observable;

/// Creates an observable that produces no values.
///
/// Completes immediately. Never emits an error.
pub fn empty<Item: 'static, Err: 'static>() -> Observable<Item, Err> { Observable::new(|o| o.complete()) }

/// Creates an observable that never emits anything.
///
/// Neither emits a value, nor completes, nor emits an error.
pub fn never<Item: 'static, Err: 'static>() -> Observable<Item, Err> { Observable::new(|_| {}) }

/// Creates an observable that emits no items, just terminates with an error.
///
/// A subscriber without an error handler makes `subscribe` panic, like any
/// unhandled setup error.
pub fn throw_err<Item: 'static, Err: Clone + 'static>(err: Err) -> Observable<Item, Err> {
  Observable::new(move |o| o.error(err.clone()))
}
