use std::fmt::{Debug, Formatter};

use super::subscribers::Subscribers;
use crate::{
  rc::{MutWeak, RcDeref, RcDerefMut},
  subscription::SubscriptionLike,
};

/// Subscription handle for a Subject.
///
/// Removes the observer from the subject's list when unsubscribed. It only
/// holds a weak reference, so it never keeps the subject alive.
pub struct SubjectSubscription<Item, Err> {
  pub(crate) subscribers: MutWeak<Subscribers<Item, Err>>,
  pub(crate) id: usize,
}

impl<Item, Err> SubscriptionLike for SubjectSubscription<Item, Err> {
  fn unsubscribe(&self) {
    let Some(subscribers) = self.subscribers.upgrade() else {
      return;
    };
    let _removed = subscribers.rc_deref_mut().remove(self.id);
  }

  fn is_closed(&self) -> bool {
    let Some(subscribers) = self.subscribers.upgrade() else {
      return true;
    };
    let member = subscribers.rc_deref().contains(self.id);
    !member
  }
}

impl<Item, Err> Debug for SubjectSubscription<Item, Err> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SubjectSubscription")
      .field("id", &self.id)
      .field("is_closed", &self.is_closed())
      .finish()
  }
}
