use std::collections::VecDeque;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::feed::ChangeFeed;
use crate::feed::UpdateSet;
use crate::feed::WatchId;
use crate::model::Version;
use crate::selector::Selector;
use crate::FeedError;
use crate::FeedResult;

#[derive(Debug, Clone, PartialEq)]
pub enum FeedCall {
    Create,
    Poll { version: Version, max_wait: Duration },
    Destroy(WatchId),
}

/// Change feed replaying a queue of canned poll responses.
///
/// Once the queue is exhausted every poll reports "no change".
pub struct ScriptedFeed {
    responses: Mutex<VecDeque<FeedResult<Option<UpdateSet>>>>,
    destroy_result: Mutex<FeedResult<()>>,
    calls: Mutex<Vec<FeedCall>>,
    next_watch: AtomicU64,
}

impl ScriptedFeed {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(VecDeque::new()),
            destroy_result: Mutex::new(Ok(())),
            calls: Mutex::new(Vec::new()),
            next_watch: AtomicU64::new(1),
        })
    }

    pub fn push_update(
        &self,
        update: UpdateSet,
    ) {
        self.push(Ok(Some(update)));
    }

    pub fn push_no_change(&self) {
        self.push(Ok(None));
    }

    pub fn push_error(
        &self,
        error: FeedError,
    ) {
        self.push(Err(error));
    }

    pub fn push(
        &self,
        response: FeedResult<Option<UpdateSet>>,
    ) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn set_destroy_result(
        &self,
        result: FeedResult<()>,
    ) {
        *self.destroy_result.lock().unwrap() = result;
    }

    pub fn calls(&self) -> Vec<FeedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn polled_versions(&self) -> Vec<Version> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                FeedCall::Poll { version, .. } => Some(version),
                _ => None,
            })
            .collect()
    }

    pub fn count(
        &self,
        matches: impl Fn(&FeedCall) -> bool,
    ) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| matches(c)).count()
    }
}

#[async_trait]
impl ChangeFeed for ScriptedFeed {
    async fn create_watch(
        &self,
        _selector: &Selector,
    ) -> FeedResult<WatchId> {
        self.calls.lock().unwrap().push(FeedCall::Create);
        Ok(WatchId(self.next_watch.fetch_add(1, Ordering::SeqCst)))
    }

    async fn poll(
        &self,
        _watch: WatchId,
        version: &Version,
        max_wait: Duration,
    ) -> FeedResult<Option<UpdateSet>> {
        self.calls.lock().unwrap().push(FeedCall::Poll {
            version: version.clone(),
            max_wait,
        });
        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or(Ok(None))
    }

    async fn destroy_watch(
        &self,
        watch: WatchId,
    ) -> FeedResult<()> {
        self.calls.lock().unwrap().push(FeedCall::Destroy(watch));
        self.destroy_result.lock().unwrap().clone()
    }
}
