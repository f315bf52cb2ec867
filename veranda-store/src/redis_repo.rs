use redis::RedisResult;

const RATE_WINDOW_SECONDS: i64 = 60;

/// Thin Redis handle for the per-IP request counters. Settlement dedup and
/// date locks never live here; both must survive a cache flush.
#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    /// Fixed one-minute window per client address. Returns `true` while the
    /// caller is under `limit` for the current window.
    pub async fn check_rate_limit(&self, client_ip: &str, limit: i64) -> RedisResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("ratelimit:{client_ip}");

        let (count,): (i64,) = redis::pipe()
            .atomic()
            .incr(&key, 1)
            .expire(&key, RATE_WINDOW_SECONDS)
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(count <= limit)
    }
}
