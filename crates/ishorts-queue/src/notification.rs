//! `series_created` notification published when a user creates a series.

use serde::{Deserialize, Serialize};
use tracing::info;

use ishorts_models::SeriesId;

use crate::backend::QueueBackend;
use crate::error::QueueResult;
use crate::task::encode;

/// Pub/sub channel carrying [`SeriesCreated`] messages.
pub const SERIES_CREATED_CHANNEL: &str = "series_created";

/// Message asking the scheduler to start daily production for a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesCreated {
    pub series_id: SeriesId,
    pub posts_per_day: i32,
}

/// Broadcast a [`SeriesCreated`] message.
pub async fn publish_series_created(
    backend: &dyn QueueBackend,
    message: &SeriesCreated,
) -> QueueResult<()> {
    backend
        .publish(SERIES_CREATED_CHANNEL, encode(message)?)
        .await?;
    info!(
        series_id = %message.series_id,
        posts_per_day = message.posts_per_day,
        "Published series_created"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::decode;

    #[test]
    fn test_wire_format() {
        let message = SeriesCreated {
            series_id: SeriesId(9),
            posts_per_day: 2,
        };
        let encoded = encode(&message).unwrap();
        assert_eq!(encoded, r#"{"series_id":9,"posts_per_day":2}"#);
        assert_eq!(decode::<SeriesCreated>(&encoded).unwrap(), message);
    }
}
