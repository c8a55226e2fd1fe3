//! Server-Sent Events (SSE) for live views.
//!
//! Streams follow subscribe-and-refetch: a change only says *that* something
//! moved, and the handler re-reads the whole view and pushes it as a
//! `snapshot` event. Bursts of changes collapse into one refetch.

#![allow(missing_docs)]

use std::convert::Infallible;
use std::future::{Future, ready};
use std::time::Duration;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use connect_common::{AppError, AppResult};
use connect_core::{ChangeFilter, Subscription};
use futures::stream::{self, Stream, StreamExt};
use serde::Serialize;
use tracing::warn;

use crate::{
    endpoints::{badges::BadgeResponse, complaints::MessageResponse},
    extractors::AuthUser,
    middleware::AppState,
};

/// Most change notifications folded into one refetch.
const COALESCE: usize = 32;

fn snapshot_event<T: Serialize>(result: AppResult<T>) -> Event {
    match result {
        Ok(snapshot) => Event::default()
            .event("snapshot")
            .json_data(&snapshot)
            .unwrap_or_else(|_| Event::default().event("error").data("INTERNAL_ERROR")),
        Err(e) => {
            warn!(error = %e, "Failed to refresh live view");
            Event::default().event("error").data(e.error_code())
        }
    }
}

/// Push `fetch()` once up front and again after every batch of changes.
///
/// The subscription must already be open so that nothing committed between
/// the initial read and the first wake-up is lost.
pub fn refetch_stream<F, Fut, T>(
    subscription: Subscription,
    fetch: F,
) -> impl Stream<Item = Result<Event, Infallible>> + Send
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = AppResult<T>> + Send + 'static,
    T: Serialize + Send + 'static,
{
    let triggers = stream::once(ready(())).chain(
        subscription
            .into_stream()
            .ready_chunks(COALESCE)
            .map(|_| ()),
    );

    triggers.then(move |()| {
        let refresh = fetch();
        async move { Ok(snapshot_event(refresh.await)) }
    })
}

fn keep_alive(interval: Duration) -> KeepAlive {
    KeepAlive::new().interval(interval).text("ping")
}

/// Live message thread of one complaint.
pub async fn thread_stream(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
    Path(complaint_id): Path<String>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    // Refuse up front rather than stream errors to a stranger.
    state
        .complaint_service
        .get_complaint(&viewer, &complaint_id)
        .await?;

    let subscription = state.change_bus.subscribe(ChangeFilter::Thread {
        complaint_id: complaint_id.clone(),
    });
    let interval = state.keep_alive;

    let stream = refetch_stream(subscription, move || {
        let state = state.clone();
        let viewer = viewer.clone();
        let complaint_id = complaint_id.clone();
        async move {
            let messages = state
                .messaging_service
                .list_messages(&viewer, &complaint_id)
                .await?;
            Ok::<_, AppError>(
                messages
                    .into_iter()
                    .map(MessageResponse::from)
                    .collect::<Vec<_>>(),
            )
        }
    });

    Ok(Sse::new(stream).keep_alive(keep_alive(interval)))
}

/// Live badge counts of the viewer.
pub async fn badges_stream(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.change_bus.subscribe(ChangeFilter::Badges {
        user_id: viewer.id.clone(),
        is_admin: viewer.is_admin(),
    });
    let interval = state.keep_alive;

    let stream = refetch_stream(subscription, move || {
        let state = state.clone();
        let viewer = viewer.clone();
        async move {
            state
                .badge_service
                .get_badge_counts(&viewer)
                .await
                .map(BadgeResponse::from)
        }
    });

    Sse::new(stream).keep_alive(keep_alive(interval))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use connect_core::{ChangeBus, ChangeEvent, EventPublisher};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_stream(
        bus: &ChangeBus,
        calls: &Arc<AtomicUsize>,
    ) -> impl Stream<Item = Result<Event, Infallible>> + Send {
        let subscription = bus.subscribe(ChangeFilter::Thread {
            complaint_id: "c1".to_string(),
        });
        let calls = calls.clone();
        refetch_stream(subscription, move || {
            let calls = calls.clone();
            async move { Ok::<_, AppError>(calls.fetch_add(1, Ordering::SeqCst) + 1) }
        })
    }

    #[tokio::test]
    async fn test_initial_snapshot_is_pushed_without_changes() {
        let bus = ChangeBus::new(16);
        let calls = Arc::new(AtomicUsize::new(0));
        let mut stream = Box::pin(counting_stream(&bus, &calls));

        assert!(stream.next().await.is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_burst_of_changes_coalesces() {
        let bus = ChangeBus::new(16);
        let calls = Arc::new(AtomicUsize::new(0));
        let mut stream = Box::pin(counting_stream(&bus, &calls));
        stream.next().await.unwrap();

        for _ in 0..3 {
            bus.publish(ChangeEvent::thread_read("c1", "s1")).await.unwrap();
        }
        stream.next().await.unwrap();

        // One initial read plus one for the whole burst.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_dropping_stream_unsubscribes() {
        let bus = ChangeBus::new(16);
        let calls = Arc::new(AtomicUsize::new(0));
        let stream = counting_stream(&bus, &calls);
        assert_eq!(bus.active_subscriptions(), 1);

        drop(stream);
        assert_eq!(bus.active_subscriptions(), 0);
    }
}
