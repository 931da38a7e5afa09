/// Read-through caching over a [`Cache`](crate::db::Cache).
///
/// Returns the cached value when present. Otherwise awaits `$block`, queues
/// the result for a background write with `$ttl` seconds, and returns it.
/// A failed cache read is logged and treated as a miss, so an unavailable
/// Redis never fails the request; errors from `$block` propagate with `?`.
///
/// # Example
/// ```rust,ignore
/// async fn fetch_sellers(&self, limit: usize) -> AppResult<Vec<Seller>> {
///     cached!(
///         self.cache,
///         CacheKey::Sellers { limit },
///         self.ttl_secs,
///         self.inner.fetch_sellers(limit)
///     )
/// }
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        let hit = match $cache.get_from_cache(&key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Cache read failed, treating as miss");
                None
            }
        };

        match hit {
            Some(cached) => {
                tracing::debug!(key = %key, "Cache hit");
                Ok(cached)
            }
            None => {
                let value = $block.await?;
                $cache.set_in_background(&key, &value, $ttl);
                Ok(value)
            }
        }
    }};
}
