//! A lightweight actor runtime.
//!
//! An actor owns a piece of state and handles messages sent to it one at
//! a time on its own task, which makes the actor the single place where
//! that state is mutated.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod error;
mod handle;
mod mailbox;
mod scheduler;

pub use error::ActorDeadError;
pub use handle::{Actor, WeakActor};
pub use mailbox::Message;

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use tokio::sync::oneshot;

    use super::*;

    #[derive(Default)]
    struct Counter {
        value: u32,
    }

    #[derive(Debug)]
    struct Add(u32);

    impl Message<Counter> for Add {
        fn handle(self, state: &mut Counter, _handle: &Actor<Counter>) {
            state.value += self.0;
        }
    }

    #[derive(Debug)]
    struct Get(oneshot::Sender<u32>);

    impl Message<Counter> for Get {
        fn handle(self, state: &mut Counter, _handle: &Actor<Counter>) {
            self.0.send(state.value).unwrap();
        }
    }

    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_send_message() {
        let actor = Actor::spawn(Counter::default(), None);
        actor.send(Add(42)).unwrap();

        let (tx, rx) = oneshot::channel();
        actor.send(Get(tx)).unwrap();
        assert_eq!(rx.await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_ask_observes_earlier_messages() {
        let actor = Actor::spawn(Counter::default(), Some("counter"));
        actor.send(Add(1)).unwrap();
        actor.send(Add(2)).unwrap();
        let value = actor.ask(|state, _| state.value).await.unwrap();
        assert_eq!(value, 3);
    }

    #[tokio::test]
    async fn test_killed_actor_rejects_asks() {
        let actor = Actor::spawn(Counter::default(), None);
        actor.try_kill();
        assert_eq!(
            actor.ask(|state, _| state.value).await,
            Err(ActorDeadError)
        );
        assert!(!actor.is_alive());
    }

    #[tokio::test]
    async fn test_weak_handle_does_not_keep_actor_alive() {
        let dropped = Arc::new(AtomicBool::new(false));
        let actor = Actor::spawn(DropFlag(Arc::clone(&dropped)), None);
        let weak = actor.downgrade();
        weak.upgrade().unwrap().ask(|_, _| ()).await.unwrap();

        drop(actor);
        assert!(weak.upgrade().is_none());
        assert_eq!(weak.send(Noop), Err(ActorDeadError));

        for _ in 0..100 {
            if dropped.load(Ordering::SeqCst) {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("state was not dropped");
    }

    #[derive(Debug)]
    struct Noop;

    impl Message<DropFlag> for Noop {
        fn handle(self, _state: &mut DropFlag, _handle: &Actor<DropFlag>) {}
    }
}
