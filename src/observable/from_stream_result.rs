use std::{cell::RefCell, ops::ControlFlow};

use futures::stream::{Stream, StreamExt};
use tracing::error;

use super::from_stream::pull_on;
use crate::{
  observable::Observable,
  scheduler::{LocalScheduler, Scheduler},
  subscriber::SubscriptionObserver,
};

/// Returns an `Observable` that emits all the items returned from the source
/// `Stream<Item = Result<Item, Err>>` until it ends or yields an error.
///
/// This is similar to [`from_stream`](crate::observable::from_stream) but
/// errors are routed to the subscriber's error handler.
pub fn from_stream_result<S, Item, Err>(stream: S) -> Observable<Item, Err>
where
  S: Stream<Item = Result<Item, Err>> + 'static,
  Item: 'static,
  Err: 'static,
{
  from_stream_result_on(stream, LocalScheduler)
}

/// [`from_stream_result`] pulling on the given scheduler.
pub fn from_stream_result_on<S, Item, Err, Sch>(stream: S, scheduler: Sch) -> Observable<Item, Err>
where
  S: Stream<Item = Result<Item, Err>> + 'static,
  Item: 'static,
  Err: 'static,
  Sch: Scheduler,
{
  let stream = RefCell::new(Some(stream.boxed_local()));
  pull_on(move || stream.borrow_mut().take(), scheduler, next_or_error)
}

fn next_or_error<Item, Err>(o: &SubscriptionObserver<Item, Err>, v: Result<Item, Err>) -> ControlFlow<()> {
  match v {
    Ok(v) => {
      o.next(v);
      ControlFlow::Continue(())
    }
    Err(e) => {
      if !o.is_closed() && o.error(e).is_err() {
        error!("stream error was not handled by the subscriber");
      }
      ControlFlow::Break(())
    }
  }
}

#[cfg(test)]
mod test {
  use std::{cell::RefCell, rc::Rc};

  use futures::stream;

  use crate::prelude::*;

  #[rxlite_macro::test]
  fn error_ends_the_stream() {
    let log = Rc::new(RefCell::new(vec![]));
    let (l_next, l_err, l_done) = (log.clone(), log.clone(), log.clone());
    let items = stream::iter(vec![Ok(1), Err("broken"), Ok(3)]);
    let source: Observable<i32, &str> = from_stream_result(items);
    source.subscribe_all(
      move |v| l_next.borrow_mut().push(v.to_string()),
      move |e| l_err.borrow_mut().push(e.to_string()),
      move || l_done.borrow_mut().push("done".to_string()),
    );

    LocalScheduler::run();
    assert_eq!(*log.borrow(), vec!["1", "broken"]);
  }

  #[rxlite_macro::test]
  fn ok_stream_completes() {
    let completed = Rc::new(RefCell::new(false));
    let c_completed = completed.clone();
    let source: Observable<i32, String> = from_stream_result(stream::iter(vec![Ok(1), Ok(2)]));
    source.subscribe_all(|_| {}, |_| {}, move || *c_completed.borrow_mut() = true);

    LocalScheduler::run();
    assert!(*completed.borrow());
  }
}
