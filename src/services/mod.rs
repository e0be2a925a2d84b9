//! Business services
//!
//! Each service reads through the shared cache and reaches the data store
//! only via [`GuardedStore`]. Writes invalidate every cached key under the
//! service's prefix once the store has accepted them.

mod fund;
mod investment;
mod investor;

use std::future::Future;

use tracing::debug;

use crate::cache::SharedCache;
use crate::error::Result;
use crate::models::{Fund, Investment, Investor};

pub use fund::{FundService, FUNDS_PREFIX};
pub use investment::{InvestmentService, INVESTMENTS_PREFIX};
pub use investor::{InvestorService, INVESTORS_PREFIX};

// == Cached Value ==
/// Everything the services put in the cache.
#[derive(Debug, Clone)]
pub enum CachedValue {
    Fund(Fund),
    Funds(Vec<Fund>),
    Investors(Vec<Investor>),
    Investments(Vec<Investment>),
}

/// Moves a service result in and out of [`CachedValue`].
pub trait Cacheable: Sized + Clone {
    fn into_cached(self) -> CachedValue;
    fn from_cached(value: CachedValue) -> Option<Self>;
}

macro_rules! cacheable {
    ($ty:ty, $variant:ident) => {
        impl Cacheable for $ty {
            fn into_cached(self) -> CachedValue {
                CachedValue::$variant(self)
            }

            fn from_cached(value: CachedValue) -> Option<Self> {
                match value {
                    CachedValue::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

cacheable!(Fund, Fund);
cacheable!(Vec<Fund>, Funds);
cacheable!(Vec<Investor>, Investors);
cacheable!(Vec<Investment>, Investments);

pub type ServiceCache = SharedCache<CachedValue>;

// == Read Through ==
/// Returns the cached value for `key`, or runs `load` and caches its success.
///
/// Errors are never cached, so a failed load is retried on the next request.
/// A load that overlapped an invalidation is returned but not cached.
pub(crate) async fn read_through<T, Fut>(cache: &ServiceCache, key: String, load: Fut) -> Result<T>
where
    T: Cacheable,
    Fut: Future<Output = Result<T>>,
{
    let (cached, generation) = {
        let mut store = cache.write().await;
        (store.get(&key), store.generation())
    };
    if let Some(value) = cached.and_then(T::from_cached) {
        debug!(key = %key, "cache hit");
        return Ok(value);
    }

    let value = load.await?;
    // A write that invalidated while this load was in flight wins.
    let stored = cache
        .write()
        .await
        .set_if_generation(key.as_str(), value.clone().into_cached(), generation);
    if !stored {
        debug!(key = %key, "skipped caching a load that overlapped a write");
    }
    Ok(value)
}

pub(crate) async fn invalidate(cache: &ServiceCache, prefix: &str) {
    let removed = cache.write().await.invalidate(prefix);
    debug!(prefix, removed, "cache invalidated after write");
}
