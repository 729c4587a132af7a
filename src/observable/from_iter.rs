use crate::observable::Observable;

/// Creates an observable that produces values from an iterable.
///
/// Completes when all elements have been emitted. Never emits an error. The
/// iterable is cloned per subscription, so every subscriber iterates from the
/// start.
///
/// ```
/// use rxlite::prelude::*;
///
/// let range: Observable<i32> = from_iter(0..10);
/// range.subscribe_next(|v| println!("{v},"));
/// ```
pub fn from_iter<I, Err>(iter: I) -> Observable<I::Item, Err>
where
  I: IntoIterator + Clone + 'static,
  I::Item: 'static,
  Err: 'static,
{
  Observable::new(move |o| {
    let mut values = iter.clone().into_iter();
    while !o.is_closed() {
      match values.next() {
        Some(v) => o.next(v),
        None => o.complete(),
      }
    }
  })
}
