use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use propsync::ChangeFeed;
use propsync::FeedError;
use propsync::FeedResult;
use propsync::ObjectUpdate;
use propsync::Selector;
use propsync::UpdateSet;
use propsync::Version;
use propsync::WatchId;

/// Change feed publishing queued batches at consecutive numeric versions
#[derive(Default)]
pub struct QueuedFeed {
    state: Mutex<QueuedState>,
}

#[derive(Default)]
struct QueuedState {
    published: u64,
    pending: VecDeque<Vec<ObjectUpdate>>,
    expire_next_poll: bool,
    watches: Vec<Selector>,
    released: Vec<WatchId>,
}

impl QueuedFeed {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn publish(
        &self,
        updates: Vec<ObjectUpdate>,
    ) {
        self.state.lock().unwrap().pending.push_back(updates);
    }

    /// Reject the next incremental poll as if the server had dropped its history
    pub fn expire_version(&self) {
        self.state.lock().unwrap().expire_next_poll = true;
    }

    pub fn watches(&self) -> Vec<Selector> {
        self.state.lock().unwrap().watches.clone()
    }

    pub fn released(&self) -> Vec<WatchId> {
        self.state.lock().unwrap().released.clone()
    }
}

#[async_trait]
impl ChangeFeed for QueuedFeed {
    async fn create_watch(
        &self,
        selector: &Selector,
    ) -> FeedResult<WatchId> {
        let mut state = self.state.lock().unwrap();
        state.watches.push(selector.clone());
        Ok(WatchId(state.watches.len() as u64))
    }

    async fn poll(
        &self,
        _watch: WatchId,
        version: &Version,
        _max_wait: Duration,
    ) -> FeedResult<Option<UpdateSet>> {
        let mut state = self.state.lock().unwrap();
        if !version.is_initial() && std::mem::take(&mut state.expire_next_poll) {
            return Err(FeedError::InvalidVersion {
                version: version.as_str().to_string(),
            });
        }
        match state.pending.pop_front() {
            Some(updates) => {
                state.published += 1;
                Ok(Some(UpdateSet::new(Version::new(state.published.to_string())).with_objects(updates)))
            }
            None => Ok(None),
        }
    }

    async fn destroy_watch(
        &self,
        watch: WatchId,
    ) -> FeedResult<()> {
        self.state.lock().unwrap().released.push(watch);
        Ok(())
    }
}
