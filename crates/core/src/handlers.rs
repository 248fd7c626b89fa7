//! Multi-subscriber event dispatch.
//!
//! [`EventHandlers<E>`] fans one payload out to every registered handler. Membership
//! is keyed on handler identity ([`Arc`] pointer), so registering the same handler
//! twice delivers once. Handler failures, returned errors and panics alike, are
//! logged and never reach the dispatcher or sibling handlers.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Weak};

use azguard_runtime::Result;
use indexmap::IndexMap;
use parking_lot::Mutex;

/// Identity of a registered handler.
pub type HandlerId = usize;

/// Handler function: `&E` → `Result<()>`.
pub type HandlerFn<E> = Arc<dyn Fn(&E) -> Result<()> + Send + Sync>;

/// Handler storage: [`IndexMap`] for O(1) removal with stable insertion order.
type HandlerMap<E> = Arc<Mutex<IndexMap<HandlerId, HandlerFn<E>>>>;

/// Returns the identity of `handler`.
pub fn handler_id<E>(handler: &HandlerFn<E>) -> HandlerId {
	Arc::as_ptr(handler) as *const () as usize
}

/// Registry of handlers for a single payload type.
pub struct EventHandlers<E> {
	handlers: HandlerMap<E>,
}

impl<E> Default for EventHandlers<E> {
	fn default() -> Self {
		Self::new()
	}
}

impl<E> EventHandlers<E> {
	pub fn new() -> Self {
		Self {
			handlers: Arc::new(Mutex::new(IndexMap::new())),
		}
	}

	/// Registers `handler`. Adding an already registered handler is a no-op.
	pub fn add_handler(&self, handler: HandlerFn<E>) -> HandlerId {
		let id = handler_id(&handler);
		self.handlers.lock().entry(id).or_insert(handler);
		id
	}

	/// Deregisters `handler`, returning whether it was registered.
	pub fn remove_handler(&self, handler: &HandlerFn<E>) -> bool {
		self.handlers
			.lock()
			.shift_remove(&handler_id(handler))
			.is_some()
	}

	pub fn len(&self) -> usize {
		self.handlers.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.handlers.lock().is_empty()
	}

	/// Invokes every registered handler once with `payload`.
	///
	/// Handlers run on the caller's thread against a snapshot of the registry,
	/// so a handler may add or remove handlers without deadlocking.
	pub fn dispatch(&self, payload: &E) {
		let handlers: Vec<(HandlerId, HandlerFn<E>)> = {
			let map = self.handlers.lock();
			map.iter().map(|(id, h)| (*id, Arc::clone(h))).collect()
		};

		for (id, handler) in handlers {
			match catch_unwind(AssertUnwindSafe(|| handler(payload))) {
				Ok(Ok(())) => {}
				Ok(Err(e)) => {
					tracing::warn!(error = %e, handler_id = id, "Event handler error");
				}
				Err(_) => {
					tracing::error!(handler_id = id, "Event handler panicked");
				}
			}
		}
	}
}

impl<E: Send + Sync + 'static> EventHandlers<E> {
	/// Registers `handler` and returns a [`Subscription`] that removes it on drop.
	pub fn subscribe<F>(&self, handler: F) -> Subscription
	where
		F: Fn(&E) -> Result<()> + Send + Sync + 'static,
	{
		let handler: HandlerFn<E> = Arc::new(handler);
		let id = self.add_handler(handler);
		Subscription::from_handler_map(id, &self.handlers)
	}
}

/// RAII handle that unregisters an event handler on drop.
///
/// Holds a weak reference to the handler map, so dropping after the owning
/// client is gone is safe (becomes a no-op).
pub struct Subscription {
	id: HandlerId,
	dropper: Option<Arc<dyn Fn(HandlerId) + Send + Sync>>,
}

impl Subscription {
	/// Creates a subscription with a custom dropper function.
	pub fn new(id: HandlerId, dropper: Arc<dyn Fn(HandlerId) + Send + Sync>) -> Self {
		Self {
			id,
			dropper: Some(dropper),
		}
	}

	fn from_handler_map<E>(id: HandlerId, handlers: &HandlerMap<E>) -> Self
	where
		E: Send + Sync + 'static,
	{
		let weak: Weak<Mutex<IndexMap<HandlerId, HandlerFn<E>>>> = Arc::downgrade(handlers);
		let dropper = Arc::new(move |id: HandlerId| {
			if let Some(map) = weak.upgrade() {
				map.lock().shift_remove(&id);
			}
		});
		Self::new(id, dropper)
	}

	/// Returns this subscription's handler ID.
	pub fn id(&self) -> HandlerId {
		self.id
	}

	/// Explicitly unsubscribes. Equivalent to dropping.
	pub fn unsubscribe(mut self) {
		if let Some(dropper) = self.dropper.take() {
			(dropper)(self.id);
		}
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(dropper) = self.dropper.take() {
			(dropper)(self.id);
		}
	}
}

impl std::fmt::Debug for Subscription {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Subscription")
			.field("id", &self.id)
			.field("active", &self.dropper.is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};

	use azguard_runtime::Error;

	use super::*;

	fn counting_handler(counter: &Arc<AtomicUsize>) -> HandlerFn<u32> {
		let counter = Arc::clone(counter);
		Arc::new(move |_: &u32| {
			counter.fetch_add(1, Ordering::SeqCst);
			Ok(())
		})
	}

	#[test]
	fn test_same_handler_registered_twice_delivers_once() {
		let handlers = EventHandlers::new();
		let calls = Arc::new(AtomicUsize::new(0));
		let handler = counting_handler(&calls);

		let first = handlers.add_handler(Arc::clone(&handler));
		let second = handlers.add_handler(Arc::clone(&handler));
		handlers.dispatch(&1);

		assert_eq!(first, second);
		assert_eq!(handlers.len(), 1);
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn test_distinct_handlers_each_run() {
		let handlers = EventHandlers::new();
		let calls = Arc::new(AtomicUsize::new(0));

		handlers.add_handler(counting_handler(&calls));
		handlers.add_handler(counting_handler(&calls));
		handlers.dispatch(&1);

		assert_eq!(calls.load(Ordering::SeqCst), 2);
	}

	#[test]
	fn test_remove_unregistered_handler_is_noop() {
		let handlers = EventHandlers::new();
		let calls = Arc::new(AtomicUsize::new(0));
		let handler = counting_handler(&calls);

		assert!(!handlers.remove_handler(&handler));

		handlers.add_handler(Arc::clone(&handler));
		assert!(handlers.remove_handler(&handler));
		handlers.dispatch(&1);

		assert_eq!(calls.load(Ordering::SeqCst), 0);
		assert!(handlers.is_empty());
	}

	#[test]
	fn test_failing_handler_does_not_stop_siblings() {
		let handlers = EventHandlers::new();
		let calls = Arc::new(AtomicUsize::new(0));

		handlers.add_handler(Arc::new(|_: &u32| -> Result<()> {
			Err(Error::ProtocolError("boom".into()))
		}));
		handlers.add_handler(counting_handler(&calls));
		handlers.dispatch(&7);

		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn test_panicking_handler_does_not_stop_siblings() {
		let handlers = EventHandlers::new();
		let calls = Arc::new(AtomicUsize::new(0));

		handlers.add_handler(Arc::new(|_: &u32| -> Result<()> { panic!("handler bug") }));
		handlers.add_handler(counting_handler(&calls));
		handlers.dispatch(&7);
		handlers.dispatch(&8);

		assert_eq!(calls.load(Ordering::SeqCst), 2);
	}

	#[test]
	fn test_handler_may_deregister_itself_during_dispatch() {
		let handlers = Arc::new(EventHandlers::<u32>::new());
		let slot: Arc<Mutex<Option<HandlerFn<u32>>>> = Arc::new(Mutex::new(None));

		let registry = Arc::clone(&handlers);
		let own = Arc::clone(&slot);
		let handler: HandlerFn<u32> = Arc::new(move |_: &u32| {
			if let Some(me) = own.lock().take() {
				registry.remove_handler(&me);
			}
			Ok(())
		});
		*slot.lock() = Some(Arc::clone(&handler));
		handlers.add_handler(handler);

		handlers.dispatch(&1);
		assert!(handlers.is_empty());
	}

	#[test]
	fn test_subscription_drop_removes_handler() {
		let handlers = EventHandlers::<u32>::new();
		let calls = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&calls);

		{
			let _sub = handlers.subscribe(move |_| {
				counter.fetch_add(1, Ordering::SeqCst);
				Ok(())
			});
			handlers.dispatch(&1);
		}
		handlers.dispatch(&2);

		assert_eq!(calls.load(Ordering::SeqCst), 1);
		assert!(handlers.is_empty());
	}

	#[test]
	fn test_subscription_outliving_registry_is_safe() {
		let handlers = EventHandlers::<u32>::new();
		let sub = handlers.subscribe(|_| Ok(()));

		drop(handlers);
		sub.unsubscribe();
	}
}
