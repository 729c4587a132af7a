//! Integration tests for rxlite
//!
//! Exercises the public surface end to end: kernel guarantees, operator
//! chains, subjects and the async bridges.

use std::{
  cell::{Cell, RefCell},
  rc::Rc,
};

use futures::{
  channel::{mpsc, oneshot},
  future::LocalBoxFuture,
  stream,
};
use rxlite::prelude::*;

fn collect<T: 'static, E: 'static>(source: &Observable<T, E>) -> (Rc<RefCell<Vec<T>>>, Rc<Cell<usize>>) {
  let values = Rc::new(RefCell::new(Vec::new()));
  let completions = Rc::new(Cell::new(0));
  let (c_values, c_completions) = (values.clone(), completions.clone());
  source.subscribe(
    Observer::new()
      .on_next(move |v| c_values.borrow_mut().push(v))
      .on_complete(move || c_completions.set(c_completions.get() + 1)),
  );
  (values, completions)
}

#[rxlite_macro::test]
fn test_of_delivers_everything_then_completes() {
  let log = Rc::new(RefCell::new(Vec::new()));
  let (l_next, l_done) = (log.clone(), log.clone());
  let source: Observable<&str> = of(["a", "b", "c"]);
  source.subscribe_all(
    move |v| l_next.borrow_mut().push(v.to_string()),
    |_| {},
    move || l_done.borrow_mut().push("complete".to_string()),
  );
  assert_eq!(*log.borrow(), vec!["a", "b", "c", "complete"]);
}

#[rxlite_macro::test]
fn test_cleanup_runs_once_for_repeated_unsubscribe() {
  let cleanups = Rc::new(Cell::new(0));
  let c_cleanups = cleanups.clone();
  let source = Observable::<i32>::new(move |_| {
    let c_cleanups = c_cleanups.clone();
    move || c_cleanups.set(c_cleanups.get() + 1)
  });

  let subscription = source.subscribe_next(|_| {});
  subscription.unsubscribe();
  subscription.unsubscribe();
  assert_eq!(cleanups.get(), 1);
  assert!(subscription.is_closed());
}

#[rxlite_macro::test]
fn test_unsubscribe_in_start_never_runs_the_producer() {
  let calls = Rc::new(Cell::new(0));
  let cleanups = Rc::new(Cell::new(0));
  let (c_calls, c_cleanups) = (calls.clone(), cleanups.clone());
  let source = Observable::<i32>::new(move |_| {
    c_calls.set(c_calls.get() + 1);
    let c_cleanups = c_cleanups.clone();
    move || c_cleanups.set(c_cleanups.get() + 1)
  });

  source.subscribe(Observer::new().on_start(|s| s.unsubscribe()));
  assert_eq!(calls.get(), 0);
  assert_eq!(cleanups.get(), 0);
}

#[rxlite_macro::test]
fn test_pipe_equals_manual_chaining() {
  let source: Observable<i32> = from_iter(1..=10);

  let (piped, _) = collect(&source.clone().pipe(pipe!(
    ops::map(|v: i32| v * v),
    ops::filter(|v: &i32| v % 3 == 1)
  )));
  let (chained, _) = collect(&ops::filter(|v: &i32| v % 3 == 1)(ops::map(|v: i32| v * v)(source)));

  assert_eq!(*piped.borrow(), vec![1, 4, 16, 25, 49, 64, 100]);
  assert_eq!(*piped.borrow(), *chained.borrow());
}

#[rxlite_macro::test]
fn test_reduce_concatenates_digits() {
  let source: Observable<i32> = of([1, 2, 3]);
  let reduced = source.reduce(|acc: Option<String>, x| match acc {
    None => x.to_string(),
    Some(acc) => format!("{acc}{x}"),
  });
  let (values, completions) = collect(&reduced);
  assert_eq!(*values.borrow(), vec![Some("123".to_string())]);
  assert_eq!(completions.get(), 1);
}

#[rxlite_macro::test]
fn test_race_emits_one_value_and_completes() {
  let second_pulls = Rc::new(Cell::new(0));
  let c_second_pulls = second_pulls.clone();
  let one: Observable<i32> = of([1]);
  let two = Observable::<i32>::new(move |o| {
    for v in [2, 3] {
      if o.is_closed() {
        return;
      }
      c_second_pulls.set(c_second_pulls.get() + 1);
      o.next(v);
    }
  });

  let (values, completions) = collect(&ops::race([one, two]));
  assert_eq!(*values.borrow(), vec![1]);
  assert_eq!(completions.get(), 1);
  assert_eq!(second_pulls.get(), 0);
}

#[rxlite_macro::test]
fn test_concat_never_interleaves() {
  let first: Observable<i32> = of([1, 2]);
  let second: Observable<i32> = of([3, 4]);
  let (values, completions) = collect(&first.concat_with(second));
  assert_eq!(*values.borrow(), vec![1, 2, 3, 4]);
  assert_eq!(completions.get(), 1);
}

#[rxlite_macro::test]
fn test_merge_keeps_per_source_order() {
  let first: Observable<i32> = of([1, 2]);
  let second: Observable<i32> = of([3, 4]);
  let (values, completions) = collect(&ops::merge([first, second]));
  let values = values.borrow();
  assert_eq!(values.len(), 4);
  let position = |v: i32| values.iter().position(|x| *x == v).unwrap();
  assert!(position(1) < position(2));
  assert!(position(3) < position(4));
  assert_eq!(completions.get(), 1);
}

#[rxlite_macro::test]
fn test_combine_waits_for_every_source() {
  let (tx_a, rx_a) = mpsc::unbounded();
  let (tx_b, rx_b) = mpsc::unbounded();
  let a: Observable<i32> = from_stream(rx_a);
  let b: Observable<i32> = from_stream(rx_b);
  let (values, completions) = collect(&ops::combine([a, b]));

  tx_a.unbounded_send(1).unwrap();
  LocalScheduler::run_until_stalled();
  assert!(values.borrow().is_empty());

  tx_b.unbounded_send(2).unwrap();
  LocalScheduler::run_until_stalled();
  assert_eq!(*values.borrow(), vec![vec![1, 2]]);

  drop(tx_a);
  LocalScheduler::run_until_stalled();
  assert_eq!(completions.get(), 0);

  drop(tx_b);
  LocalScheduler::run_until_stalled();
  assert_eq!(completions.get(), 1);
}

#[rxlite_macro::test]
fn test_observe_waits_for_outer_and_inners() {
  let (tx, rx) = mpsc::unbounded::<i32>();
  let inner: Observable<i32> = from_stream(rx);
  let quick: Observable<i32> = of([0]);
  let outer: Observable<Observable<i32>> = of([quick, inner]);
  let (values, completions) = collect(&outer.observe());

  assert_eq!(*values.borrow(), vec![0]);
  assert_eq!(completions.get(), 0);

  tx.unbounded_send(7).unwrap();
  drop(tx);
  LocalScheduler::run_until_stalled();
  assert_eq!(*values.borrow(), vec![0, 7]);
  assert_eq!(completions.get(), 1);
}

#[rxlite_macro::test]
fn test_behavior_subject_replays_and_plain_subject_does_not() {
  let behavior: Subject<i32> = Subject::behavior(10);
  let plain: Subject<i32> = Subject::new();
  plain.next(10);

  let (replayed, _) = collect(&behavior.to_observable());
  let (not_replayed, _) = collect(&plain.to_observable());
  behavior.next(11);
  plain.next(11);

  assert_eq!(*replayed.borrow(), vec![10, 11]);
  assert_eq!(*not_replayed.borrow(), vec![11]);
}

#[rxlite_macro::test]
fn test_subject_ignores_next_after_terminal() {
  let calls = Rc::new(Cell::new(0));
  let c_calls = calls.clone();
  let subject: Subject<i32, String> = Subject::new();
  subject.subscribe((move |_: i32| c_calls.set(c_calls.get() + 1), |_: String| {}));

  subject.next(1);
  subject.error("closed".to_string());
  subject.next(2);
  subject.complete();
  assert_eq!(calls.get(), 1);
}

#[rxlite_macro::test]
fn test_subject_feeds_an_operator_chain() {
  let subject: Subject<i32> = Subject::new();
  let (values, completions) = collect(&subject.to_observable().map(|v| v * 10).filter(|v| *v > 15));
  for v in 1..=3 {
    subject.next(v);
  }
  subject.complete();
  assert_eq!(*values.borrow(), vec![20, 30]);
  assert_eq!(completions.get(), 1);
}

#[rxlite_macro::test]
async fn test_stream_round_trip() {
  let source: Observable<i32> = from_stream(stream::iter(1..=4));
  let total = source
    .flat_map(|v| vec![v; v as usize])
    .reduce(|acc: Option<i32>, v| acc.unwrap_or(0) + v)
    .to_future()
    .await;
  assert_eq!(total, Ok(Some(Some(30))));
}

#[rxlite_macro::test]
fn test_fulfill_forwards_resolutions() {
  type Pending = LocalBoxFuture<'static, Result<i32, String>>;
  let emitter: Rc<RefCell<Option<SubscriptionObserver<Pending, String>>>> = Rc::default();
  let c_emitter = emitter.clone();
  let source = Observable::<Pending, String>::new(move |o| *c_emitter.borrow_mut() = Some(o));
  let (values, completions) = collect(&source.fulfill());
  let o = emitter.borrow().clone().unwrap();

  let (tx, rx) = oneshot::channel::<i32>();
  o.next(Box::pin(async move { rx.await.map_err(|e| e.to_string()) }));
  o.next(Box::pin(async { Ok(1) }));
  LocalScheduler::run_until_stalled();
  assert_eq!(*values.borrow(), vec![1]);

  tx.send(2).unwrap();
  LocalScheduler::run_until_stalled();
  assert_eq!(*values.borrow(), vec![1, 2]);

  o.complete();
  assert_eq!(completions.get(), 1);
}

#[rxlite_macro::test]
async fn test_from_future_resolves_every_subscriber() {
  let answer: Observable<i32, String> = from_future(async { Ok(42) });
  assert_eq!(answer.to_future().await, Ok(Some(42)));
  assert_eq!(answer.to_future().await, Ok(Some(42)));
}

#[rxlite_macro::test]
fn test_from_rejects_opaque_values() {
  struct Opaque;
  impl ObservableLike<i32, Infallible> for Opaque {}

  let err = from(Opaque).unwrap_err();
  assert!(matches!(err, RxError::NotObservable));
  assert!(err.to_string().contains("expected an Observable"));
}
