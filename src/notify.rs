use std::cell::RefCell;
use std::rc::Rc;

pub(crate) type Subscriber = Rc<dyn Fn()>;

/// Shared change-notification list used by the machines. Subscribing returns
/// a handle; dropping the handle removes the subscriber.
#[derive(Clone, Default)]
pub(crate) struct Subscribers {
    inner: Rc<RefCell<Vec<Subscriber>>>,
}

impl Subscribers {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn subscribe(&self, subscriber: Subscriber) -> SubscriberHandle {
        self.inner.borrow_mut().push(subscriber.clone());
        SubscriberHandle {
            subscriber,
            subscribers: Rc::clone(&self.inner),
        }
    }

    pub(crate) fn notify(&self) {
        let subscribers = self.inner.borrow().clone();
        for subscriber in subscribers {
            (subscriber)();
        }
    }
}

pub(crate) struct SubscriberHandle {
    subscriber: Subscriber,
    subscribers: Rc<RefCell<Vec<Subscriber>>>,
}

impl Drop for SubscriberHandle {
    fn drop(&mut self) {
        let mut subscribers = self.subscribers.borrow_mut();
        subscribers.retain(|item| !Rc::ptr_eq(item, &self.subscriber));
    }
}
