//!
//! src/strategy.rs  Andrew Belles  Oct 18th, 2025
//!
//! Ordered fallback over named strategies: try each in turn, skip on
//! error or empty result, stop at the first value
//!

use std::future::Future;

use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, error, info, warn};

use crate::ResolverError;

pub type StrategyFuture<'a, T> = BoxFuture<'a, Result<Option<T>, ResolverError>>;

/// A named, lazily started attempt. Nothing runs until the combinator
/// reaches it, so later strategies cost nothing when an earlier one wins.
pub struct Strategy<'a, T> {
    pub name: &'static str,
    run: Box<dyn FnOnce() -> StrategyFuture<'a, T> + Send + 'a>,
}

impl<'a, T: Send + 'a> Strategy<'a, T> {
    pub fn new<F, Fut>(name: &'static str, f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = Result<Option<T>, ResolverError>> + Send + 'a
    {
        Self { name, run: Box::new(move || f().boxed()) }
    }
}

/// Runs `strategies` sequentially; errors never escape, they are logged
/// under `chain` and the next strategy runs
pub async fn first_success<'a, T>(
    chain: &'static str,
    strategies: Vec<Strategy<'a, T>>
) -> Option<T> {
    for strategy in strategies {
        debug!(chain, strategy = strategy.name, "strategy.try");
        match (strategy.run)().await {
            Ok(Some(value)) => {
                info!(chain, strategy = strategy.name, "strategy.hit");
                return Some(value);
            }
            Ok(None) => {
                debug!(chain, strategy = strategy.name, "strategy.empty");
            }
            Err(e) if e.is_transient() => {
                warn!(chain, strategy = strategy.name, error = %e, "strategy.failed");
            }
            Err(e) => {
                error!(chain, strategy = strategy.name, error = %e, "strategy.failed");
            }
        }
    }
    debug!(chain, "strategy.exhausted");
    None
}
