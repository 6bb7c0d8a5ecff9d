use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, TransactionId, WaitQueue};

/// Resource ID, assigned in order of definition starting from 0.
#[derive(
    From,
    Into,
    Debug,
    PartialEq,
    PartialOrd,
    Eq,
    Ord,
    Serialize,
    Deserialize,
    Copy,
    Clone,
    Hash,
    Display,
)]
pub struct ResourceId(usize);

impl ResourceId {
    /// The first defined resource, used by [`Model::request`](crate::Model::request) and
    /// [`Model::release`](crate::Model::release).
    pub const PRIMARY: ResourceId = ResourceId(0);
}

/// Outcome of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    /// A server was free and now belongs to the transaction.
    Reserved,
    /// All servers are busy; the transaction waits in the queue.
    Queued,
}

/// Outcome of a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The freed server was handed over to the transaction at the head of the queue.
    /// The caller is responsible for scheduling whatever this transaction does next.
    Admitted(TransactionId),
    /// Nobody was waiting; the server is idle.
    Vacant,
}

/// A service facility with a fixed number of servers and a FIFO queue.
///
/// Servers are numbered from 0; a request takes the lowest-numbered idle server.
/// Invariants: the number of busy servers is between 0 and the capacity, and a transaction
/// waiting in the queue never holds a server at the same time.
#[derive(Debug, Clone)]
pub struct Resource {
    servers: Vec<Option<TransactionId>>,
    busy: usize,
    queue: WaitQueue<TransactionId>,
}

impl Resource {
    /// Constructs a resource with `capacity` idle servers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCapacity`] if `capacity` is 0.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity(capacity));
        }
        Ok(Self {
            servers: vec![None; capacity],
            busy: 0,
            queue: WaitQueue::default(),
        })
    }

    /// Total number of servers.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.servers.len()
    }

    /// Number of busy servers.
    #[must_use]
    pub fn busy(&self) -> usize {
        self.busy
    }

    /// Number of transactions waiting in the queue.
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// The wait queue of this resource.
    #[must_use]
    pub fn queue(&self) -> &WaitQueue<TransactionId> {
        &self.queue
    }

    /// Returns the transaction currently served by `server`, if any.
    #[must_use]
    pub fn holder(&self, server: usize) -> Option<TransactionId> {
        self.servers.get(server).copied().flatten()
    }

    /// Checks if `transaction` holds one of the servers.
    #[must_use]
    pub fn is_holding(&self, transaction: TransactionId) -> bool {
        self.servers.contains(&Some(transaction))
    }

    /// Reserves a server for `transaction` if one is idle; otherwise, appends it to the queue.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateRequest`] if `transaction` already holds a server or waits in
    /// the queue.
    pub fn request(&mut self, transaction: TransactionId) -> Result<Reservation> {
        if self.is_holding(transaction) || self.queue.iter().any(|&t| t == transaction) {
            return Err(Error::DuplicateRequest(transaction));
        }
        let reservation = if let Some(server) = self.servers.iter_mut().find(|s| s.is_none()) {
            *server = Some(transaction);
            self.busy += 1;
            Reservation::Reserved
        } else {
            self.queue.push_back(transaction);
            Reservation::Queued
        };
        self.check_invariants();
        Ok(reservation)
    }

    /// Frees the server held by `transaction`. If anyone is waiting, the head of the queue
    /// takes over the server and is returned as admitted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReleaseWithoutReservation`] if `transaction` does not hold a server,
    /// which includes the case when no server is busy at all.
    pub fn release(&mut self, transaction: TransactionId) -> Result<Admission> {
        let server = self
            .servers
            .iter_mut()
            .find(|s| **s == Some(transaction))
            .ok_or(Error::ReleaseWithoutReservation(transaction))?;
        let admission = if let Some(next) = self.queue.pop_front() {
            *server = Some(next);
            Admission::Admitted(next)
        } else {
            *server = None;
            self.busy -= 1;
            Admission::Vacant
        };
        self.check_invariants();
        Ok(admission)
    }

    fn check_invariants(&self) {
        debug_assert!(self.busy <= self.capacity());
        debug_assert_eq!(self.busy, self.servers.iter().flatten().count());
        debug_assert!(self.queue.is_empty() || self.busy == self.capacity());
    }
}

/// Owns all resources defined in a model.
#[derive(Debug, Clone, Default)]
pub struct ResourceManager {
    resources: Vec<Resource>,
}

impl ResourceManager {
    /// Defines a new resource with `capacity` servers and returns its ID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCapacity`] if `capacity` is 0.
    pub fn define(&mut self, capacity: usize) -> Result<ResourceId> {
        let resource = Resource::new(capacity)?;
        let id = ResourceId(self.resources.len());
        self.resources.push(resource);
        Ok(id)
    }

    /// Returns the resource with the given ID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownResource`] if no such resource was defined.
    pub fn get(&self, id: ResourceId) -> Result<&Resource> {
        self.resources.get(id.0).ok_or(Error::UnknownResource(id))
    }

    fn get_mut(&mut self, id: ResourceId) -> Result<&mut Resource> {
        self.resources.get_mut(id.0).ok_or(Error::UnknownResource(id))
    }

    /// Requests a server of the resource `id`. See [`Resource::request`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownResource`] if no such resource was defined, or
    /// [`Error::DuplicateRequest`] if `transaction` already holds or waits for it.
    pub fn request(&mut self, id: ResourceId, transaction: TransactionId) -> Result<Reservation> {
        self.get_mut(id)?.request(transaction)
    }

    /// Releases a server of the resource `id`. See [`Resource::release`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownResource`] if no such resource was defined, or
    /// [`Error::ReleaseWithoutReservation`] if `transaction` holds no server of it.
    pub fn release(&mut self, id: ResourceId, transaction: TransactionId) -> Result<Admission> {
        self.get_mut(id)?.release(transaction)
    }

    /// Number of defined resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Checks if no resources were defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Iterates over all resources along with their IDs.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, &Resource)> {
        self.resources
            .iter()
            .enumerate()
            .map(|(id, resource)| (ResourceId(id), resource))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    fn tx(id: u64) -> TransactionId {
        TransactionId::from(id)
    }

    #[test]
    fn test_zero_capacity() {
        assert!(matches!(Resource::new(0), Err(Error::InvalidCapacity(0))));
        let mut manager = ResourceManager::default();
        assert_eq!(manager.define(0).unwrap_err(), Error::InvalidCapacity(0));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_single_server_admission() {
        let mut resource = Resource::new(1).unwrap();
        assert_eq!(resource.request(tx(1)), Ok(Reservation::Reserved));
        assert_eq!(resource.request(tx(2)), Ok(Reservation::Queued));
        assert_eq!(resource.request(tx(3)), Ok(Reservation::Queued));
        assert_eq!(resource.request(tx(1)), Err(Error::DuplicateRequest(tx(1))));
        assert_eq!(resource.request(tx(3)), Err(Error::DuplicateRequest(tx(3))));
        assert_eq!(resource.busy(), 1);
        assert_eq!(resource.queue_len(), 2);
        assert!(!resource.is_holding(tx(2)));

        assert_eq!(resource.release(tx(1)), Ok(Admission::Admitted(tx(2))));
        assert_eq!(resource.holder(0), Some(tx(2)));
        assert_eq!(resource.busy(), 1);
        assert_eq!(resource.release(tx(2)), Ok(Admission::Admitted(tx(3))));
        assert_eq!(resource.release(tx(3)), Ok(Admission::Vacant));
        assert_eq!(resource.busy(), 0);

        assert_eq!(resource.request(tx(4)), Ok(Reservation::Reserved));
        assert_eq!(resource.queue().max_len(), 2);
    }

    #[test]
    fn test_release_without_reservation() {
        let mut resource = Resource::new(2).unwrap();
        assert_eq!(
            resource.release(tx(1)),
            Err(Error::ReleaseWithoutReservation(tx(1)))
        );
        resource.request(tx(1)).unwrap();
        assert_eq!(
            resource.release(tx(2)),
            Err(Error::ReleaseWithoutReservation(tx(2)))
        );
        assert_eq!(resource.busy(), 1);
    }

    #[test]
    fn test_lowest_idle_server_is_taken() {
        let mut resource = Resource::new(3).unwrap();
        resource.request(tx(1)).unwrap();
        resource.request(tx(2)).unwrap();
        resource.request(tx(3)).unwrap();
        resource.release(tx(2)).unwrap();
        assert_eq!(resource.holder(1), None);
        resource.request(tx(4)).unwrap();
        assert_eq!(resource.holder(1), Some(tx(4)));
        assert_eq!(resource.holder(7), None);
    }

    #[test]
    fn test_manager() {
        let mut manager = ResourceManager::default();
        let first = manager.define(1).unwrap();
        let second = manager.define(2).unwrap();
        assert_eq!(first, ResourceId::PRIMARY);
        assert_eq!(second, ResourceId::from(1));
        assert_eq!(manager.request(second, tx(1)), Ok(Reservation::Reserved));
        assert_eq!(manager.request(second, tx(2)), Ok(Reservation::Reserved));
        assert_eq!(manager.request(second, tx(3)), Ok(Reservation::Queued));
        assert_eq!(manager.get(first).unwrap().busy(), 0);
        let unknown = ResourceId::from(2);
        assert_eq!(
            manager.request(unknown, tx(1)),
            Err(Error::UnknownResource(unknown))
        );
        assert_eq!(
            manager.iter().map(|(_, r)| r.capacity()).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    proptest! {
        #[test]
        fn test_busy_within_capacity(
            capacity in 1..5_usize,
            operations in proptest::collection::vec((any::<bool>(), 0..8_u64), 0..200)
        ) {
            let mut resource = Resource::new(capacity).unwrap();
            let mut waiting = std::collections::VecDeque::new();
            for (is_request, id) in operations {
                if is_request {
                    let duplicate = resource.is_holding(tx(id)) || waiting.contains(&tx(id));
                    match resource.request(tx(id)) {
                        Ok(Reservation::Reserved) => {
                            prop_assert!(!duplicate);
                            prop_assert!(waiting.is_empty());
                        }
                        Ok(Reservation::Queued) => {
                            prop_assert!(!duplicate);
                            waiting.push_back(tx(id));
                        }
                        Err(err) => {
                            prop_assert!(duplicate);
                            prop_assert_eq!(err, Error::DuplicateRequest(tx(id)));
                        }
                    }
                } else {
                    let busy = resource.busy();
                    match resource.release(tx(id)) {
                        Ok(Admission::Admitted(next)) => {
                            prop_assert_eq!(Some(next), waiting.pop_front());
                            prop_assert_eq!(resource.busy(), busy);
                        }
                        Ok(Admission::Vacant) => {
                            prop_assert!(waiting.is_empty());
                            prop_assert_eq!(resource.busy(), busy - 1);
                        }
                        Err(err) => {
                            prop_assert_eq!(err, Error::ReleaseWithoutReservation(tx(id)));
                            prop_assert_eq!(resource.busy(), busy);
                        }
                    }
                }
                prop_assert!(resource.busy() <= capacity);
                prop_assert_eq!(resource.queue_len(), waiting.len());
                prop_assert!(waiting.iter().all(|&t| !resource.is_holding(t)));
            }
        }
    }
}
