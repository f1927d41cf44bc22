use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::cache::merge_update_set;
use crate::feed::ChangeFeed;
use crate::feed::ObjectUpdate;
use crate::feed::UpdateSet;
use crate::feed::WatchId;
use crate::model::Mirror;
use crate::model::PropertyValue;
use crate::model::Version;
use crate::selector::Selector;
use crate::FeedError;
use crate::FeedResult;

/// Change feed backed by an authoritative object state and a change log.
///
/// - initial version: a full *enter* batch for every object
/// - a retained version: every logged update since, as one batch
/// - a pruned version: `InvalidVersion`
pub struct SimulatedServer {
    state: Mutex<ServerState>,
}

#[derive(Default)]
struct ServerState {
    /// Authoritative state, rebuilt by replaying every update from empty
    objects: Mirror,
    /// (version after the update, updates)
    log: Vec<(u64, Vec<ObjectUpdate>)>,
    current: u64,
    /// Oldest version still answerable incrementally
    oldest_retained: u64,
    watches: u64,
    destroyed: Vec<WatchId>,
}

impl SimulatedServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(ServerState::default()),
        })
    }

    /// Commit `updates` as one new server version
    pub fn commit(
        &self,
        updates: Vec<ObjectUpdate>,
    ) -> Version {
        let mut state = self.state.lock().unwrap();
        let update = UpdateSet::new("").with_objects(updates.clone());
        merge_update_set(&mut state.objects, &update).expect("server-side replay must succeed");
        state.current += 1;
        let version = state.current;
        state.log.push((version, updates));
        Version::new(version.to_string())
    }

    /// Forget the change log; older versions become invalid
    pub fn prune(&self) {
        let mut state = self.state.lock().unwrap();
        state.oldest_retained = state.current;
        state.log.clear();
    }

    pub fn current_state(&self) -> Mirror {
        self.state.lock().unwrap().objects.clone()
    }

    pub fn destroyed(&self) -> Vec<WatchId> {
        self.state.lock().unwrap().destroyed.clone()
    }
}

#[async_trait]
impl ChangeFeed for SimulatedServer {
    async fn create_watch(
        &self,
        _selector: &Selector,
    ) -> FeedResult<WatchId> {
        let mut state = self.state.lock().unwrap();
        state.watches += 1;
        Ok(WatchId(state.watches))
    }

    async fn poll(
        &self,
        _watch: WatchId,
        version: &Version,
        _max_wait: Duration,
    ) -> FeedResult<Option<UpdateSet>> {
        let state = self.state.lock().unwrap();
        let current = Version::new(state.current.to_string());

        if version.is_initial() {
            let enters = state.objects.iter().map(|(obj, bag)| {
                ObjectUpdate::enter(
                    obj.clone(),
                    bag.iter().map(|(k, v)| (k.clone(), v.clone())).collect::<Vec<(String, PropertyValue)>>(),
                )
            });
            return Ok(Some(UpdateSet::new(current).with_objects(enters)));
        }

        let since: u64 = version.as_str().parse().map_err(|_| FeedError::InvalidVersion {
            version: version.as_str().to_string(),
        })?;
        if since < state.oldest_retained || since > state.current {
            return Err(FeedError::InvalidVersion {
                version: version.as_str().to_string(),
            });
        }
        if since == state.current {
            return Ok(None);
        }

        let updates: Vec<ObjectUpdate> = state
            .log
            .iter()
            .filter(|(v, _)| *v > since)
            .flat_map(|(_, updates)| updates.iter().cloned())
            .collect();
        Ok(Some(UpdateSet::new(current).with_objects(updates)))
    }

    async fn destroy_watch(
        &self,
        watch: WatchId,
    ) -> FeedResult<()> {
        self.state.lock().unwrap().destroyed.push(watch);
        Ok(())
    }
}
