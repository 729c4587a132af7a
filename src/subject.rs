//! Multicast: one producer, many subscribers.
//!
//! A [`Subject`] is both a producer you push into with `next`/`error`/
//! `complete`, and an observable anyone can subscribe to. Every signal fans
//! out synchronously to the current subscribers in subscription order.

use std::{
  any::Any,
  cell::{Cell, RefCell},
  convert::Infallible,
  fmt::{Debug, Formatter},
  panic::{catch_unwind, resume_unwind, AssertUnwindSafe},
  rc::Rc,
};

use tracing::{error, trace};

use crate::{
  observable::{Observable, ObservableLike, Subscribable},
  observer::Observer,
  rc::{MutRc, RcDeref, RcDerefMut},
  scheduler::LocalScheduler,
  subscriber::SubscriptionObserver,
  subscription::{Subscription, Teardown},
};

mod subject_subscription;
mod subscribers;

pub use subject_subscription::SubjectSubscription;
use subscribers::Subscribers;

#[derive(Clone)]
enum Terminal<Err> {
  Error(Err),
  Complete,
}

struct SubjectState<Item, Err> {
  closed: Cell<bool>,
  terminal: RefCell<Option<Terminal<Err>>>,
  replay: bool,
  last: RefCell<Option<Item>>,
  subscribers: MutRc<Subscribers<Item, Err>>,
}

/// Subject: a hot observable that multicasts values to many observers.
///
/// Once it errored or completed, the subject is closed: `next` does nothing
/// and late subscribers receive the stored terminal signal right away.
///
/// A subscriber that panics, or that has no handler for a delivered error,
/// does not stop delivery to the others. The failure is rethrown from a task
/// on the [`LocalScheduler`], so it surfaces the next time the host drives
/// the pool. A subscriber that panicked is unsubscribed and receives nothing
/// further.
///
/// A subscriber that calls `next` on the subject from its own handler gets
/// that value once the handler returns.
///
/// ```rust
/// use rxlite::prelude::*;
///
/// let subject: Subject<i32> = Subject::new();
/// subject.subscribe(|v: i32| println!("first {v}"));
/// subject.subscribe(|v: i32| println!("second {v}"));
/// subject.next(1);
/// subject.complete();
/// ```
pub struct Subject<Item, Err = Infallible> {
  state: Rc<SubjectState<Item, Err>>,
}

impl<Item, Err> Clone for Subject<Item, Err> {
  #[inline]
  fn clone(&self) -> Self { Subject { state: self.state.clone() } }
}

impl<Item: Clone + 'static, Err: Clone + 'static> Default for Subject<Item, Err> {
  fn default() -> Self { Self::new() }
}

impl<Item: Clone + 'static, Err: Clone + 'static> Subject<Item, Err> {
  /// A plain multicast subject.
  pub fn new() -> Self { Self::with_state(false, None) }

  /// A subject that remembers its latest value and replays it to every new
  /// subscriber before anything else.
  pub fn behavior(initial: Item) -> Self { Self::with_state(true, Some(initial)) }

  fn with_state(replay: bool, last: Option<Item>) -> Self {
    Subject {
      state: Rc::new(SubjectState {
        closed: Cell::new(false),
        terminal: RefCell::new(None),
        replay,
        last: RefCell::new(last),
        subscribers: MutRc::own(Subscribers::default()),
      }),
    }
  }

  pub fn subscribe<O: Into<Observer<Item, Err>>>(&self, observer: O) -> Subscription {
    self.to_observable().subscribe(observer)
  }

  /// An observable view: subscribing to it subscribes to this subject.
  pub fn to_observable(&self) -> Observable<Item, Err> {
    let state = self.state.clone();
    Observable::new(move |o| state.register(o))
  }

  pub fn next(&self, value: Item) {
    let state = &self.state;
    if state.closed.get() {
      return;
    }
    if state.replay {
      *state.last.borrow_mut() = Some(value.clone());
    }
    let members = state.subscribers.rc_deref().snapshot();
    for (id, entry) in members {
      let member = state.subscribers.rc_deref().contains(id);
      if !member {
        continue;
      }
      if entry.busy.get() {
        trace!(subscriber = id, "queueing re-entrant delivery until the handler returns");
        entry.pending.borrow_mut().push_back(value.clone());
        continue;
      }
      entry.busy.set(true);
      let mut value = value.clone();
      loop {
        if isolate(id, || entry.observer.next(value)).is_none() {
          entry.pending.borrow_mut().clear();
          break;
        }
        let queued = entry.pending.borrow_mut().pop_front();
        match queued {
          Some(v) => value = v,
          None => break,
        }
      }
      entry.busy.set(false);
    }
  }

  pub fn error(&self, err: Err) {
    let state = &self.state;
    if state.closed.replace(true) {
      return;
    }
    *state.terminal.borrow_mut() = Some(Terminal::Error(err.clone()));
    let members = state.subscribers.rc_deref_mut().drain();
    for (id, entry) in members {
      if entry.observer.is_closed() {
        continue;
      }
      let err = err.clone();
      let unhandled = isolate(id, || entry.observer.error(err).is_err());
      if unhandled == Some(true) {
        defer_failure(id, Box::new("unhandled error delivered by a subject"));
      }
    }
  }

  pub fn complete(&self) {
    let state = &self.state;
    if state.closed.replace(true) {
      return;
    }
    *state.terminal.borrow_mut() = Some(Terminal::Complete);
    let members = state.subscribers.rc_deref_mut().drain();
    for (id, entry) in members {
      isolate(id, || entry.observer.complete());
    }
  }

  /// The latest value of a [`behavior`](Subject::behavior) subject.
  pub fn last(&self) -> Option<Item> { self.state.last.borrow().clone() }

  #[inline]
  pub fn is_closed(&self) -> bool { self.state.closed.get() }

  pub fn observer_count(&self) -> usize { self.state.subscribers.rc_deref().len() }
}

impl<Item: Clone + 'static, Err: Clone + 'static> SubjectState<Item, Err> {
  fn register(&self, o: SubscriptionObserver<Item, Err>) -> Result<Teardown, Err> {
    if self.replay {
      let last = self.last.borrow().clone();
      if let Some(last) = last {
        o.next(last);
      }
      if o.is_closed() {
        return Ok(Teardown::Nil);
      }
    }

    let terminal = self.terminal.borrow().clone();
    match terminal {
      Some(Terminal::Error(err)) => o.error(err).map(|()| Teardown::Nil),
      Some(Terminal::Complete) => {
        o.complete();
        Ok(Teardown::Nil)
      }
      None => {
        let id = self.subscribers.rc_deref_mut().add(o);
        let subscription = SubjectSubscription { subscribers: self.subscribers.downgrade(), id };
        Ok(Teardown::Subscription(Box::new(subscription)))
      }
    }
  }
}

/// Run one subscriber's handler, keeping a panic away from its siblings.
/// Returns `None` if the handler panicked.
fn isolate<R>(id: usize, handler: impl FnOnce() -> R) -> Option<R> {
  match catch_unwind(AssertUnwindSafe(handler)) {
    Ok(r) => Some(r),
    Err(payload) => {
      defer_failure(id, payload);
      None
    }
  }
}

fn defer_failure(id: usize, payload: Box<dyn Any + Send>) {
  error!(subscriber = id, "subject subscriber failed, rethrowing on the local scheduler");
  LocalScheduler::spawn_detached(async move { resume_unwind(payload) });
}

impl<Item, Err> Debug for Subject<Item, Err> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Subject")
      .field("closed", &self.state.closed.get())
      .field("observers", &self.state.subscribers.rc_deref().len())
      .finish()
  }
}

impl<Item: Clone + 'static, Err: Clone + 'static> From<Subject<Item, Err>> for Observer<Item, Err> {
  fn from(subject: Subject<Item, Err>) -> Self {
    let (next, error) = (subject.clone(), subject.clone());
    Observer::new()
      .on_next(move |v| next.next(v))
      .on_error(move |e| error.error(e))
      .on_complete(move || subject.complete())
  }
}

impl<Item: Clone + 'static, Err: Clone + 'static> Subscribable<Item, Err> for Subject<Item, Err> {
  fn subscribe(&self, observer: SubscriptionObserver<Item, Err>) -> Subscription {
    Subject::subscribe(self, observer)
  }
}

impl<Item: Clone + 'static, Err: Clone + 'static> ObservableLike<Item, Err> for Subject<Item, Err> {
  fn subscribable(&self) -> Option<Rc<dyn Subscribable<Item, Err>>> { Some(Rc::new(self.clone())) }
}

#[cfg(test)]
mod test {
  use std::{
    cell::{Cell, RefCell},
    panic::{catch_unwind, AssertUnwindSafe},
    rc::Rc,
  };

  use crate::prelude::*;

  fn recorder<Err: 'static>(log: &Rc<RefCell<Vec<String>>>, name: &'static str) -> Observer<i32, Err> {
    let (l_next, l_err, l_done) = (log.clone(), log.clone(), log.clone());
    Observer::new()
      .on_next(move |v| l_next.borrow_mut().push(format!("{name} {v}")))
      .on_error(move |_| l_err.borrow_mut().push(format!("{name} error")))
      .on_complete(move || l_done.borrow_mut().push(format!("{name} complete")))
  }

  #[rxlite_macro::test]
  fn base_data_flow() {
    let log = Rc::new(RefCell::new(vec![]));
    let subject: Subject<i32> = Subject::new();
    subject.subscribe(recorder(&log, "a"));
    subject.subscribe(recorder(&log, "b"));
    subject.next(1);
    subject.complete();
    subject.next(2);
    assert_eq!(*log.borrow(), vec!["a 1", "b 1", "a complete", "b complete"]);
    assert!(subject.is_closed());
  }

  #[rxlite_macro::test]
  fn unsubscribe() {
    let i = Rc::new(Cell::new(0));
    let c_i = i.clone();
    let subject: Subject<i32> = Subject::new();
    let subscription = subject.subscribe(move |v: i32| c_i.set(v));
    assert_eq!(subject.observer_count(), 1);
    subscription.unsubscribe();
    assert!(subscription.is_closed());
    assert_eq!(subject.observer_count(), 0);
    subject.next(100);
    assert_eq!(i.get(), 0);
  }

  #[rxlite_macro::test]
  fn late_subscriber_gets_the_terminal() {
    let log = Rc::new(RefCell::new(vec![]));
    let completed: Subject<i32> = Subject::new();
    completed.complete();
    completed.subscribe(recorder(&log, "late"));
    assert_eq!(*log.borrow(), vec!["late complete"]);

    log.borrow_mut().clear();
    let failed: Subject<i32, &str> = Subject::new();
    failed.error("gone");
    failed.subscribe(recorder(&log, "late"));
    assert_eq!(*log.borrow(), vec!["late error"]);
  }

  #[rxlite_macro::test]
  fn behavior_replays_the_latest_value() {
    let log = Rc::new(RefCell::new(vec![]));
    let subject: Subject<i32> = Subject::behavior(0);
    subject.subscribe(recorder(&log, "a"));
    subject.next(1);
    subject.subscribe(recorder(&log, "b"));
    subject.next(2);
    assert_eq!(*log.borrow(), vec!["a 0", "a 1", "b 1", "a 2", "b 2"]);
    assert_eq!(subject.last(), Some(2));

    log.borrow_mut().clear();
    subject.complete();
    subject.subscribe(recorder(&log, "c"));
    assert_eq!(*log.borrow(), vec!["a complete", "b complete", "c 2", "c complete"]);
  }

  #[rxlite_macro::test]
  fn unsubscribe_in_start_skips_replay() {
    let seen = Rc::new(Cell::new(false));
    let c_seen = seen.clone();
    let subject: Subject<i32> = Subject::behavior(5);
    subject.subscribe(
      Observer::new()
        .on_start(|s| s.unsubscribe())
        .on_next(move |_| c_seen.set(true)),
    );
    assert!(!seen.get());
    assert_eq!(subject.observer_count(), 0);
  }

  #[rxlite_macro::test]
  fn panicking_subscriber_does_not_block_siblings() {
    let log = Rc::new(RefCell::new(vec![]));
    let subject: Subject<i32> = Subject::new();
    subject.subscribe(recorder(&log, "a"));
    subject.subscribe(Observer::new().on_next(|_: i32| panic!("subscriber blew up")));
    subject.subscribe(recorder(&log, "c"));

    subject.next(1);
    assert_eq!(*log.borrow(), vec!["a 1", "c 1"]);
    assert_eq!(subject.observer_count(), 2);

    subject.next(2);
    assert_eq!(*log.borrow(), vec!["a 1", "c 1", "a 2", "c 2"]);

    let deferred = catch_unwind(AssertUnwindSafe(LocalScheduler::run_until_stalled));
    assert!(deferred.is_err());
  }

  #[rxlite_macro::test]
  fn unhandled_error_is_deferred() {
    let log = Rc::new(RefCell::new(vec![]));
    let subject: Subject<i32, &str> = Subject::new();
    subject.subscribe(|_: i32| {});
    subject.subscribe(recorder(&log, "b"));
    subject.error("boom");
    assert_eq!(*log.borrow(), vec!["b error"]);

    let deferred = catch_unwind(AssertUnwindSafe(LocalScheduler::run_until_stalled));
    assert!(deferred.is_err());
  }

  #[rxlite_macro::test]
  fn reentrant_next_is_delivered_after_the_handler_returns() {
    let log = Rc::new(RefCell::new(vec![]));
    let subject: Subject<i32> = Subject::new();
    let (c_subject, c_log) = (subject.clone(), log.clone());
    subject.subscribe(move |v: i32| {
      c_log.borrow_mut().push(format!("a {v}"));
      if v < 3 {
        c_subject.next(v + 1);
      }
    });
    subject.subscribe(recorder(&log, "b"));
    subject.next(1);
    assert_eq!(*log.borrow(), vec!["a 1", "b 2", "a 2", "b 3", "a 3", "b 1"]);
  }

  #[rxlite_macro::test]
  fn feedback_subscriber_sees_every_value_in_order() {
    let seen = Rc::new(RefCell::new(vec![]));
    let subject: Subject<i32> = Subject::new();
    let (c_subject, c_seen) = (subject.clone(), seen.clone());
    subject.subscribe(move |v: i32| {
      c_seen.borrow_mut().push(v);
      if v < 3 {
        c_subject.next(v + 1);
      }
    });
    subject.next(1);
    assert_eq!(*seen.borrow(), vec![1, 2, 3]);
  }

  #[rxlite_macro::test]
  fn acts_as_observer_and_source() {
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    let relay: Subject<i32> = Subject::new();
    relay.subscribe(move |v: i32| c_seen.borrow_mut().push(v));

    let source: Observable<i32> = of([1, 2]);
    source.subscribe(relay.clone());
    assert_eq!(*seen.borrow(), vec![1, 2]);
    assert!(relay.is_closed());

    let adapted = from(relay).unwrap();
    let done = Rc::new(Cell::new(false));
    let c_done = done.clone();
    adapted.subscribe_all(|_| {}, |_| {}, move || c_done.set(true));
    assert!(done.get());
  }
}
