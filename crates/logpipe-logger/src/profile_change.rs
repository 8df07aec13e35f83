use std::sync::{Arc, PoisonError, RwLock};

/// Receives a callback whenever the active logging profile changes.
pub trait ProfileChangeObserver: Send + Sync {
    fn on_profile_changed(&self);
}

/// Subscriber list notified on profile changes.
///
/// Subscribing and unsubscribing take the write lock; [`notify_all`] takes the
/// read lock and calls every observer synchronously on the caller's thread,
/// in registration order. A slow observer delays the ones after it and the
/// notifying caller.
///
/// [`notify_all`]: ProfileChangeSubject::notify_all
#[derive(Default)]
pub struct ProfileChangeSubject {
    observers: RwLock<Vec<Arc<dyn ProfileChangeObserver>>>,
}

impl ProfileChangeSubject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, observer: Arc<dyn ProfileChangeObserver>) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    /// Remove `observer` by identity. Returns whether it was subscribed.
    pub fn unsubscribe(&self, observer: &Arc<dyn ProfileChangeObserver>) -> bool {
        let mut observers = self
            .observers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = observers.len();
        observers.retain(|existing| !std::ptr::addr_eq(Arc::as_ptr(existing), Arc::as_ptr(observer)));
        observers.len() != before
    }

    pub fn notify_all(&self) {
        let observers = self.observers.read().unwrap_or_else(PoisonError::into_inner);
        for observer in observers.iter() {
            observer.on_profile_changed();
        }
    }

    pub fn len(&self) -> usize {
        self.observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ProfileChangeSubject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileChangeSubject")
            .field("observers", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    struct Counter(AtomicUsize);

    impl ProfileChangeObserver for Counter {
        fn on_profile_changed(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Recorder {
        id: usize,
        calls: Arc<Mutex<Vec<usize>>>,
    }

    impl ProfileChangeObserver for Recorder {
        fn on_profile_changed(&self) {
            self.calls.lock().unwrap().push(self.id);
        }
    }

    #[test]
    fn notifies_in_registration_order() {
        let subject = ProfileChangeSubject::new();
        let calls = Arc::new(Mutex::new(Vec::new()));
        for id in 0..3 {
            subject.subscribe(Arc::new(Recorder {
                id,
                calls: Arc::clone(&calls),
            }));
        }

        subject.notify_all();
        subject.notify_all();
        assert_eq!(*calls.lock().unwrap(), vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn unsubscribe_removes_only_that_observer() {
        let subject = ProfileChangeSubject::new();
        let kept = Arc::new(Counter(AtomicUsize::new(0)));
        let removed = Arc::new(Counter(AtomicUsize::new(0)));
        let kept_dyn: Arc<dyn ProfileChangeObserver> = kept.clone();
        let removed_dyn: Arc<dyn ProfileChangeObserver> = removed.clone();
        subject.subscribe(kept_dyn);
        subject.subscribe(Arc::clone(&removed_dyn));

        assert!(subject.unsubscribe(&removed_dyn));
        assert!(!subject.unsubscribe(&removed_dyn));
        assert_eq!(subject.len(), 1);

        subject.notify_all();
        assert_eq!(kept.0.load(Ordering::SeqCst), 1);
        assert_eq!(removed.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn notify_without_subscribers_is_noop() {
        let subject = ProfileChangeSubject::new();
        assert!(subject.is_empty());
        subject.notify_all();
    }
}
