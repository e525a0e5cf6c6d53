//! Byte-budgeted body reader.
//!
//! Reads a chunk stream into memory while keeping a running total, and stops
//! at the first chunk that would push the total past the budget. The stream
//! is dropped at that point, which closes the upstream connection, so peak
//! memory never exceeds the budget plus one chunk.

use futures_util::{pin_mut, Stream, StreamExt};

use crate::error::{RelayError, RelayResult};

/// Collect `stream` into a buffer of at most `max_bytes` bytes.
///
/// `size_hint` (usually the upstream `Content-Length`) only sizes the initial
/// allocation; the limit is enforced on the bytes actually received.
pub async fn read_limited<S, B, E>(
    stream: S,
    max_bytes: u64,
    size_hint: Option<u64>,
) -> RelayResult<Vec<u8>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    pin_mut!(stream);

    let initial = size_hint.unwrap_or(0).min(max_bytes);
    let mut buf = Vec::with_capacity(usize::try_from(initial).unwrap_or(0));
    let mut total: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| RelayError::FetchFailed(e.to_string()))?;
        let chunk = chunk.as_ref();

        total = total.saturating_add(chunk.len() as u64);
        if total > max_bytes {
            tracing::debug!(received = total, max_bytes, "Body exceeded byte budget, aborting");
            return Err(RelayError::PayloadTooLarge { limit: max_bytes });
        }
        buf.extend_from_slice(chunk);
    }

    Ok(buf)
}
