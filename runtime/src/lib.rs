//! # tabtodo runtime
//!
//! Runtime implementation for the tabtodo state container.
//!
//! This crate provides the Store runtime that coordinates reducer execution
//! and effect handling.
//!
//! ## Core Components
//!
//! - **Store**: Owns the state snapshot and serializes every action through the reducer
//! - **Effect Executor**: Executes effect descriptions and feeds actions back to the reducer
//! - **`EffectHandle`**: Lets callers wait until the effects of one action have finished
//!
//! ## Ordering
//!
//! Actions are reduced one at a time under a write lock, in the order `send` is
//! called. Effects run on the tokio runtime after the lock is released, so a slow
//! effect never delays the next action.
//!
//! ## Example
//!
//! ```ignore
//! use tabtodo_runtime::Store;
//!
//! let store = Store::new(initial_state, my_reducer, environment);
//!
//! // Send an action
//! store.send(Action::DoSomething).await?;
//!
//! // Read state
//! let value = store.state(|s| s.some_field).await;
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tabtodo_core::{effect::Effect, reducer::Reducer};
use tokio::sync::{RwLock, watch};

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        ///
        /// This error is returned when `send()` is called after shutdown initiated.
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        ///
        /// Some effects were still running when the timeout elapsed.
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timed out waiting for effects of an action to complete
        #[error("Timeout waiting for effects")]
        Timeout,
    }
}

pub use error::StoreError;

/// Configuration for Store behavior
///
/// # Example
///
/// ```ignore
/// let config = StoreConfig::default()
///     .with_broadcast_capacity(64)
///     .with_shutdown_timeout(Duration::from_secs(5));
///
/// let store = Store::with_config(state, reducer, env, config);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Capacity of the broadcast channel carrying effect-produced actions
    pub broadcast_capacity: usize,
    /// Default timeout for graceful shutdown
    pub default_shutdown_timeout: Duration,
}

impl StoreConfig {
    /// Set the action broadcast capacity
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    /// Set the default shutdown timeout
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.default_shutdown_timeout = timeout;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 16,
            default_shutdown_timeout: Duration::from_secs(5),
        }
    }
}

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`] to allow waiting for the effects spawned by
/// that action to complete. Actions fed back by those effects are reduced
/// before the effect counts as complete; their own effects are not tracked.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send(Action::Start).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    /// Create a new effect handle and its internal tracking context
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };

        let tracking = EffectTracking {
            counter,
            notifier: Arc::new(tx),
        };

        (handle, tracking)
    }

    /// Create a handle that's already complete
    #[must_use]
    pub fn completed() -> Self {
        let (tx, rx) = watch::channel(());
        let _ = tx.send(());

        Self {
            effects: Arc::new(AtomicUsize::new(0)),
            completion: rx,
        }
    }

    /// Number of effects still running
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Wait for all effects to complete
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                // Every sender is gone, so no effect can still be running
                break;
            }
        }
    }

    /// Wait for all effects to complete with a timeout
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the timeout expires before all effects complete.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.effects.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Internal: Effect tracking context passed through effect execution
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    /// Increment the effect counter (effect started)
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    /// Decrement the effect counter (effect completed)
    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            // Counter reached zero, notify waiters
            let _ = self.notifier.send(());
        }
    }
}

/// Internal: RAII guard that decrements the effect counter on drop
///
/// Ensures the effect counter is always decremented, even if the effect panics.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Guard that decrements an atomic counter on drop (for shutdown tracking)
struct AtomicCounterGuard(Arc<AtomicUsize>);

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Store runtime for coordinating reducer execution and effect handling.
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicCounterGuard, AtomicUsize, DecrementGuard, Duration, Effect,
        EffectHandle, EffectTracking, Ordering, Reducer, RwLock, StoreConfig, StoreError,
    };
    use tokio::sync::{broadcast, watch};

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock` for concurrent access)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop)
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        config: StoreConfig,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
        /// Actions produced by effects, for observers that want to react to
        /// feedback (e.g. a storage failure reported back into the store).
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// Create a new store with a custom configuration
        #[must_use]
        pub fn with_config(
            initial_state: S,
            reducer: R,
            environment: E,
            config: StoreConfig,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(config.broadcast_capacity.max(1));

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                config,
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                action_broadcast,
            }
        }

        /// Number of effects currently running across all actions
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.pending_effects.load(Ordering::SeqCst)
        }

        /// Initiate graceful shutdown
        ///
        /// Stops accepting new actions and waits for running effects to finish.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if effects are still running
        /// when `timeout` elapses.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            self.shutdown.store(true, Ordering::Release);

            let deadline = tokio::time::Instant::now() + timeout;
            loop {
                let pending = self.pending_effects.load(Ordering::SeqCst);
                if pending == 0 {
                    tracing::info!("All effects completed, shutdown successful");
                    return Ok(());
                }
                if tokio::time::Instant::now() >= deadline {
                    tracing::error!(pending, "Shutdown timed out with effects still running");
                    return Err(StoreError::ShutdownTimeout(pending));
                }
                tracing::debug!(pending, "Waiting for effects to complete");
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }

        /// Shutdown using the configured default timeout
        ///
        /// # Errors
        ///
        /// See [`Store::shutdown`].
        pub async fn shutdown_default(&self) -> Result<(), StoreError> {
            self.shutdown(self.config.default_shutdown_timeout).await
        }

        /// Send an action to the store
        ///
        /// The action is reduced immediately under the state write lock; its
        /// effects are spawned afterwards. The returned handle can be awaited
        /// to know when those effects are done.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError>
        where
            R: Clone,
            E: Clone,
        {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            tracing::debug!("Processing action");
            metrics::counter!("store.commands.total").increment(1);

            let (handle, tracking) = EffectHandle::new();

            let effects = {
                let mut state = self.state.write().await;
                let span = tracing::debug_span!("reducer_execution");
                let _enter = span.enter();

                let effects = self.reducer.reduce(&mut *state, action, &self.environment);
                tracing::trace!("Reducer completed, returned {} effects", effects.len());
                effects
            };

            for effect in effects {
                self.execute_effect_internal(effect, tracking.clone());
            }

            Ok(handle)
        }

        /// Subscribe to actions produced by effects
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let count = store.state(|s| s.todos.len()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Execute an effect with tracking
        ///
        /// - `None`: No-op
        /// - `Future`: Executes async computation, sends resulting action if `Some`
        /// - `Delay`: Waits for duration, then sends action
        /// - `Parallel`: Executes effects concurrently
        /// - `Sequential`: Executes effects in order, waiting for each to complete
        ///
        /// Effect failures never halt the store; an effect that wants to report
        /// a failure does so by producing an action.
        #[allow(clippy::needless_pass_by_value)] // tracking is cloned into spawned tasks
        fn execute_effect_internal(&self, effect: Effect<A>, tracking: EffectTracking)
        where
            R: Clone,
            E: Clone,
        {
            match effect {
                Effect::None => {
                    tracing::trace!("Executing Effect::None (no-op)");
                },
                Effect::Future(fut) => {
                    tracing::trace!("Executing Effect::Future");
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                    tracking.increment();

                    self.pending_effects.fetch_add(1, Ordering::SeqCst);
                    let pending_guard = AtomicCounterGuard(Arc::clone(&self.pending_effects));
                    let guard = DecrementGuard(tracking);
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guard = guard;
                        let _pending_guard = pending_guard;

                        if let Some(action) = fut.await {
                            tracing::trace!("Effect::Future produced an action, sending to store");
                            let _ = store.action_broadcast.send(action.clone());
                            let _ = store.send(action).await;
                        }
                    });
                },
                Effect::Delay { duration, action } => {
                    tracing::trace!("Executing Effect::Delay (duration: {:?})", duration);
                    metrics::counter!("store.effects.executed", "type" => "delay").increment(1);
                    tracking.increment();

                    self.pending_effects.fetch_add(1, Ordering::SeqCst);
                    let pending_guard = AtomicCounterGuard(Arc::clone(&self.pending_effects));
                    let guard = DecrementGuard(tracking);
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guard = guard;
                        let _pending_guard = pending_guard;

                        tokio::time::sleep(duration).await;
                        let _ = store.action_broadcast.send((*action).clone());
                        let _ = store.send(*action).await;
                    });
                },
                Effect::Parallel(effects) => {
                    tracing::trace!("Executing Effect::Parallel with {} effects", effects.len());
                    for effect in effects {
                        self.execute_effect_internal(effect, tracking.clone());
                    }
                },
                Effect::Sequential(effects) => {
                    let effect_count = effects.len();
                    tracing::trace!("Executing Effect::Sequential with {} effects", effect_count);
                    tracking.increment();

                    self.pending_effects.fetch_add(1, Ordering::SeqCst);
                    let pending_guard = AtomicCounterGuard(Arc::clone(&self.pending_effects));
                    let guard = DecrementGuard(tracking);
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guard = guard;
                        let _pending_guard = pending_guard;

                        for (idx, effect) in effects.into_iter().enumerate() {
                            tracing::trace!(
                                "Executing sequential effect {} of {}",
                                idx + 1,
                                effect_count
                            );

                            let (sub_tx, mut sub_rx) = watch::channel(());
                            let sub_tracking = EffectTracking {
                                counter: Arc::new(AtomicUsize::new(0)),
                                notifier: Arc::new(sub_tx),
                            };

                            store.execute_effect_internal(effect, sub_tracking.clone());

                            while sub_tracking.counter.load(Ordering::SeqCst) > 0 {
                                if sub_rx.changed().await.is_err() {
                                    break;
                                }
                            }
                        }
                        tracing::trace!("Effect::Sequential completed");
                    });
                },
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                config: self.config.clone(),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }
}

// Re-export for convenience
pub use store::Store;

#[cfg(test)]
mod tests {
    use super::*;
    use tabtodo_core::{SmallVec, smallvec};

    #[derive(Clone, Debug, Default)]
    struct LogState {
        entries: Vec<&'static str>,
    }

    #[derive(Clone, Debug)]
    enum LogAction {
        Push(&'static str),
        PushLater(&'static str),
        PushAfter(&'static str, Duration),
        PushBoth(&'static str, &'static str),
        PushEither(&'static str, &'static str),
    }

    #[derive(Clone)]
    struct LogReducer;

    impl Reducer for LogReducer {
        type State = LogState;
        type Action = LogAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut LogState,
            action: LogAction,
            _env: &(),
        ) -> SmallVec<[Effect<LogAction>; 4]> {
            match action {
                LogAction::Push(entry) => {
                    state.entries.push(entry);
                    SmallVec::new()
                },
                LogAction::PushLater(entry) => {
                    smallvec![Effect::future(async move { Some(LogAction::Push(entry)) })]
                },
                LogAction::PushAfter(entry, duration) => smallvec![Effect::Delay {
                    duration,
                    action: Box::new(LogAction::Push(entry)),
                }],
                LogAction::PushBoth(first, second) => smallvec![Effect::chain(vec![
                    Effect::future(async move {
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Some(LogAction::Push(first))
                    }),
                    Effect::future(async move { Some(LogAction::Push(second)) }),
                ])],
                LogAction::PushEither(left, right) => smallvec![Effect::merge(vec![
                    Effect::future(async move { Some(LogAction::Push(left)) }),
                    Effect::None,
                    Effect::future(async move { Some(LogAction::Push(right)) }),
                ])],
            }
        }
    }

    fn store() -> Store<LogState, LogAction, (), LogReducer> {
        Store::new(LogState::default(), LogReducer, ())
    }

    #[tokio::test]
    async fn actions_are_reduced_in_send_order() {
        let store = store();
        for entry in ["a", "b", "c"] {
            let _ = store.send(LogAction::Push(entry)).await;
        }
        let entries = store.state(|s| s.entries.clone()).await;
        assert_eq!(entries, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn future_effect_feeds_action_back() {
        let store = store();
        let mut handle = store.send(LogAction::PushLater("late")).await.unwrap();
        handle
            .wait_with_timeout(Duration::from_secs(1))
            .await
            .unwrap();
        let entries = store.state(|s| s.entries.clone()).await;
        assert_eq!(entries, vec!["late"]);
    }

    #[tokio::test]
    async fn delay_effect_feeds_action_back() {
        let store = store();
        let mut handle = store
            .send(LogAction::PushAfter("delayed", Duration::from_millis(5)))
            .await
            .unwrap();
        handle.wait().await;
        let entries = store.state(|s| s.entries.clone()).await;
        assert_eq!(entries, vec!["delayed"]);
    }

    #[tokio::test]
    async fn sequential_effects_run_in_order() {
        let store = store();
        let mut handle = store.send(LogAction::PushBoth("first", "second")).await.unwrap();
        handle.wait().await;
        let entries = store.state(|s| s.entries.clone()).await;
        assert_eq!(entries, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn parallel_effects_all_feed_back() {
        let store = store();
        let mut handle = store.send(LogAction::PushEither("left", "right")).await.unwrap();
        handle.wait().await;

        let mut entries = store.state(|s| s.entries.clone()).await;
        entries.sort_unstable();
        assert_eq!(entries, vec!["left", "right"]);
        assert_eq!(store.pending_effects(), 0);
    }

    #[tokio::test]
    async fn effect_actions_are_broadcast() {
        let store = store();
        let mut rx = store.subscribe_actions();
        let mut handle = store.send(LogAction::PushLater("seen")).await.unwrap();
        handle.wait().await;
        let action = rx.recv().await.unwrap();
        assert!(matches!(action, LogAction::Push("seen")));
    }

    #[tokio::test]
    async fn send_after_shutdown_is_rejected() {
        let store = store();
        store.shutdown(Duration::from_secs(1)).await.unwrap();
        let result = store.send(LogAction::Push("nope")).await;
        assert!(matches!(result, Err(StoreError::ShutdownInProgress)));
    }

    #[tokio::test]
    async fn completed_handle_does_not_block() {
        let mut handle = EffectHandle::completed();
        assert_eq!(handle.pending(), 0);
        handle
            .wait_with_timeout(Duration::from_millis(10))
            .await
            .unwrap();
    }
}
