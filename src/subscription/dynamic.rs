use smallvec::SmallVec;

use super::SubscriptionLike;
use crate::rc::{MutRc, RcDerefMut};

/// Id-keyed storage for a changing set of child subscriptions or observers.
///
/// Combinators and subjects use it to:
/// - add a child and get back an id to remove it by later;
/// - reserve the id first and insert the child once it exists, for the case
///   where the child's own handlers need to know their id;
/// - tear everything down at once.
///
/// ```rust
/// use rxlite::subscription::DynamicSubscriptions;
///
/// let mut subs: DynamicSubscriptions<&str> = DynamicSubscriptions::default();
///
/// let id1 = subs.add("first");
///
/// let id2 = subs.reserve_id();
/// subs.insert(id2, "second");
/// assert_eq!(subs.len(), 2);
///
/// assert_eq!(subs.remove(id1), Some("first"));
/// assert!(subs.contains(id2));
/// ```
pub struct DynamicSubscriptions<U> {
  next_id: usize,
  items: SmallVec<[(usize, U); 2]>,
}

impl<U> Default for DynamicSubscriptions<U> {
  fn default() -> Self { Self { next_id: 0, items: SmallVec::new() } }
}

impl<U> DynamicSubscriptions<U> {
  #[inline]
  pub fn new() -> Self { Self::default() }

  /// Add an item and return its unique ID.
  #[inline]
  pub fn add(&mut self, item: U) -> usize {
    let id = self.reserve_id();
    self.items.push((id, item));
    id
  }

  /// Reserve the next ID without adding an item.
  #[inline]
  pub fn reserve_id(&mut self) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    id
  }

  /// Insert an item under an ID from `reserve_id()`.
  #[inline]
  pub fn insert(&mut self, id: usize, item: U) { self.items.push((id, item)); }

  pub fn remove(&mut self, id: usize) -> Option<U> {
    self
      .items
      .iter()
      .position(|(i, _)| *i == id)
      .map(|pos| self.items.remove(pos).1)
  }

  #[inline]
  pub fn contains(&self, id: usize) -> bool { self.items.iter().any(|(i, _)| *i == id) }

  #[inline]
  pub fn len(&self) -> usize { self.items.len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.items.is_empty() }

  /// Move every item out, in insertion order.
  pub fn take_all(&mut self) -> SmallVec<[(usize, U); 2]> { std::mem::take(&mut self.items) }

  /// Move every item except `keep` out, in insertion order.
  pub fn take_except(&mut self, keep: usize) -> SmallVec<[(usize, U); 2]> {
    let (kept, others) = self.take_all().into_iter().partition(|(id, _)| *id == keep);
    self.items = kept;
    others
  }

  #[inline]
  pub fn iter(&self) -> impl Iterator<Item = (usize, &U)> { self.items.iter().map(|(id, item)| (*id, item)) }
}

/// Unsubscribe every item of a shared container without holding its borrow
/// while the teardowns run.
pub fn unsubscribe_all<U: SubscriptionLike>(subs: &MutRc<DynamicSubscriptions<U>>) {
  let items = subs.rc_deref_mut().take_all();
  for (_, item) in items {
    item.unsubscribe();
  }
}
