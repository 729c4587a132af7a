use std::{cell::Cell, rc::Rc};

use crate::{
  observable::Observable,
  observer::Observer,
  rc::{MutRc, RcDerefMut},
  subscriber::SubscriptionObserver,
  subscription::{unsubscribe_all, DynamicSubscriptions, Subscription, SubscriptionLike},
};

/// Subscribe to every source and keep the first value any of them emits.
///
/// The winning value is emitted, every other source is unsubscribed and the
/// stream completes. Until a value arrives, an error or completion from any
/// source ends the race as is.
pub fn race<T, E>(sources: impl IntoIterator<Item = Observable<T, E>>) -> Observable<T, E>
where
  T: 'static,
  E: 'static,
{
  let sources: Rc<[Observable<T, E>]> = sources.into_iter().collect();
  Observable::new(move |downstream: SubscriptionObserver<T, E>| {
    let children: MutRc<DynamicSubscriptions<Subscription>> = MutRc::own(DynamicSubscriptions::new());
    let decided = Rc::new(Cell::new(false));
    if sources.is_empty() {
      downstream.complete();
    }

    for source in sources.iter() {
      if downstream.is_closed() {
        break;
      }
      let id = children.rc_deref_mut().reserve_id();
      let (s_children, n_children) = (children.clone(), children.clone());
      let (n_downstream, e_downstream, c_downstream) = (downstream.clone(), downstream.clone(), downstream.clone());
      let decided = decided.clone();
      let observer = Observer::new()
        .on_start(move |s| s_children.rc_deref_mut().insert(id, s.clone()))
        .on_next(move |v| {
          if decided.replace(true) {
            return;
          }
          let losers = n_children.rc_deref_mut().take_except(id);
          for (_, loser) in losers {
            loser.unsubscribe();
          }
          n_downstream.next(v);
          n_downstream.complete();
          unsubscribe_all(&n_children);
        })
        .on_error_forward(move |e| e_downstream.error(e))
        .on_complete(move || c_downstream.complete());
      source.subscribe(observer);
    }

    move || unsubscribe_all(&children)
  })
}
