//! Observable state container with derived values.
//!
//! State lives in a `tokio::sync::watch` channel so any number of readers can
//! hold a receiver and await changes. Mutation goes through
//! [`Observable::update`], which re-evaluates every derived value and then
//! publishes exactly once.
//!
//! A read guard returned by [`Observable::get`] holds the channel's read lock;
//! drop it before the next `update`.

mod computed;

pub use computed::Computed;

use serde_json::Value;
use tokio::sync::watch;

/// Hooks the container needs from the state it publishes.
pub trait ObservableState {
    /// Store the latest value of a derived field so readers of the state see it.
    fn store_derived(&mut self, key: &str, value: Value);

    /// Called once per publication.
    fn advance_version(&mut self);
}

type Deriver<S> = Box<dyn Fn(&mut S) -> Value + Send + Sync>;

struct Derived<S> {
    key: String,
    derive: Deriver<S>,
    tx: watch::Sender<Value>,
}

pub struct Observable<S> {
    tx: watch::Sender<S>,
    derived: Vec<Derived<S>>,
    publications: u64,
}

impl<S: ObservableState> Observable<S> {
    pub fn new(initial: S) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self {
            tx,
            derived: Vec::new(),
            publications: 0,
        }
    }

    pub fn get(&self) -> watch::Ref<'_, S> {
        self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<S> {
        self.tx.subscribe()
    }

    /// Number of state snapshots published so far.
    pub fn publications(&self) -> u64 {
        self.publications
    }

    pub fn is_derived(&self, key: &str) -> bool {
        self.derived.iter().any(|d| d.key == key)
    }

    /// Run `mutate` against the state.
    ///
    /// When `mutate` returns `true`, derived values are refreshed and one
    /// publication goes out. When it returns `false`, whatever it changed is
    /// kept but nobody is notified.
    pub fn update<F>(&mut self, mutate: F) -> bool
    where
        F: FnOnce(&mut S) -> bool,
    {
        let derived = &self.derived;
        let published = self.tx.send_if_modified(|state| {
            if !mutate(state) {
                return false;
            }
            refresh(derived, state);
            state.advance_version();
            true
        });

        if published {
            self.publications += 1;
        }
        published
    }

    /// Register a derived field under `key`, or return a receiver for the one
    /// already registered there.
    ///
    /// Registering a new field evaluates it immediately and publishes.
    pub fn compute<F>(&mut self, key: &str, derive: F) -> watch::Receiver<Value>
    where
        F: Fn(&mut S) -> Value + Send + Sync + 'static,
    {
        if let Some(existing) = self.derived.iter().find(|d| d.key == key) {
            return existing.tx.subscribe();
        }

        let (tx, mut rx) = watch::channel(Value::Null);
        self.derived.push(Derived {
            key: key.to_string(),
            derive: Box::new(derive),
            tx,
        });
        self.update(|_| true);

        // The first evaluation is the starting point, not a change.
        let _ = rx.borrow_and_update();
        rx
    }
}

fn refresh<S: ObservableState>(derived: &[Derived<S>], state: &mut S) {
    for d in derived {
        let value = (d.derive)(state);
        d.tx.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value.clone();
                true
            }
        });
        state.store_derived(&d.key, value);
    }
}
