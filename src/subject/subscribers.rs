use std::{
  cell::{Cell, RefCell},
  collections::VecDeque,
  rc::Rc,
};

use smallvec::SmallVec;

use crate::{subscriber::SubscriptionObserver, subscription::DynamicSubscriptions};

/// One registered subscriber of a subject.
pub(crate) struct Entry<Item, Err> {
  pub(crate) observer: SubscriptionObserver<Item, Err>,
  /// Set while a value is being delivered to this subscriber.
  pub(crate) busy: Cell<bool>,
  /// Values pushed re-entrantly while `busy`, delivered once the handler
  /// returns.
  pub(crate) pending: RefCell<VecDeque<Item>>,
}

pub(crate) type Members<Item, Err> = SmallVec<[(usize, Rc<Entry<Item, Err>>); 2]>;

/// Subscribers container using DynamicSubscriptions for ID-based management.
///
/// Entries are reference counted so a fan-out can work on a snapshot and
/// never keeps the container borrowed while a handler runs.
pub(crate) struct Subscribers<Item, Err> {
  inner: DynamicSubscriptions<Rc<Entry<Item, Err>>>,
}

impl<Item, Err> Default for Subscribers<Item, Err> {
  fn default() -> Self { Self { inner: DynamicSubscriptions::default() } }
}

impl<Item, Err> Subscribers<Item, Err> {
  /// Add an observer and return its unique ID.
  pub(crate) fn add(&mut self, observer: SubscriptionObserver<Item, Err>) -> usize {
    self
      .inner
      .add(Rc::new(Entry { observer, busy: Cell::new(false), pending: RefCell::default() }))
  }

  #[inline]
  pub(crate) fn remove(&mut self, id: usize) -> Option<Rc<Entry<Item, Err>>> { self.inner.remove(id) }

  #[inline]
  pub(crate) fn contains(&self, id: usize) -> bool { self.inner.contains(id) }

  #[inline]
  pub(crate) fn len(&self) -> usize { self.inner.len() }

  /// The current members, in subscription order.
  pub(crate) fn snapshot(&self) -> Members<Item, Err> {
    self
      .inner
      .iter()
      .map(|(id, entry)| (id, entry.clone()))
      .collect()
  }

  /// Remove every member, in subscription order.
  #[inline]
  pub(crate) fn drain(&mut self) -> Members<Item, Err> { self.inner.take_all() }
}
