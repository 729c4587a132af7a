use std::rc::Rc;

use crate::observable::Observable;

/// Creates an observable producing the given values, in order.
///
/// Completes immediately after emitting the values given. Never emits an
/// error. Each subscription receives its own clones of the values.
///
/// # Examples
///
/// ```
/// use rxlite::prelude::*;
///
/// let numbers: Observable<i32> = of([1, 2, 3]);
/// numbers.subscribe_next(|v| println!("{v},"));
///
/// // print log:
/// // 1
/// // 2
/// // 3
/// ```
pub fn of<Item, Err, I>(items: I) -> Observable<Item, Err>
where
  I: IntoIterator<Item = Item>,
  Item: Clone + 'static,
  Err: 'static,
{
  let items: Rc<[Item]> = items.into_iter().collect();
  Observable::new(move |o| {
    for v in items.iter() {
      if o.is_closed() {
        return;
      }
      o.next(v.clone());
    }
    o.complete();
  })
}

/// Creates an observable producing a multiple values.
///
/// ```
/// use rxlite::prelude::*;
///
/// let letters: Observable<char> = rxlite::of!['a', 'b'];
/// letters.subscribe_next(|v| println!("{v}"));
/// ```
#[macro_export]
macro_rules! of {
  ($($item:expr),* $(,)?) => {
    $crate::observable::of([$($item),*])
  };
}

#[cfg(test)]
mod test {
  use std::{cell::RefCell, rc::Rc};

  use crate::prelude::*;

  #[rxlite_macro::test]
  fn values_then_complete() {
    let log = Rc::new(RefCell::new(vec![]));
    let (l_next, l_done) = (log.clone(), log.clone());
    let source: Observable<&str> = of(["a", "b", "c"]);
    source.subscribe_all(
      move |v| l_next.borrow_mut().push(v),
      |_| {},
      move || l_done.borrow_mut().push("done"),
    );
    assert_eq!(*log.borrow(), vec!["a", "b", "c", "done"]);
  }

  #[rxlite_macro::test]
  fn replays_for_each_subscriber() {
    let source: Observable<i32> = crate::of![1, 2];
    let first = Rc::new(RefCell::new(vec![]));
    let second = Rc::new(RefCell::new(vec![]));
    let (c_first, c_second) = (first.clone(), second.clone());
    source.subscribe_next(move |v| c_first.borrow_mut().push(v));
    source.subscribe_next(move |v| c_second.borrow_mut().push(v));
    assert_eq!(*first.borrow(), vec![1, 2]);
    assert_eq!(*first.borrow(), *second.borrow());
  }
}
