use crate::{CallRequest, FloorIndex};

/// A car's accepted-but-not-started calls.
///
/// The service order depends on where the car is *when it picks its next
/// task*, so the queue keeps plain insertion order and recomputes the nearest
/// pickup on every selection instead of maintaining a heap whose key would go
/// stale as soon as the car moves.
///
/// Ties between equally distant pickups go to the call accepted first.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PendingQueue {
    tasks: Vec<CallRequest>,
}

impl PendingQueue {
    pub const fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    pub fn push(&mut self, request: CallRequest) {
        self.tasks.push(request);
    }

    /// The call whose pickup is closest to `floor`, without removing it.
    pub fn nearest(&self, floor: FloorIndex) -> Option<&CallRequest> {
        self.nearest_index(floor).map(|idx| &self.tasks[idx])
    }

    /// Removes and returns the call whose pickup is closest to `floor`.
    pub fn take_nearest(&mut self, floor: FloorIndex) -> Option<CallRequest> {
        let idx = self.nearest_index(floor)?;
        Some(self.tasks.remove(idx))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Calls in the order they were accepted.
    pub fn iter(&self) -> impl Iterator<Item = &CallRequest> {
        self.tasks.iter()
    }

    // `min_by_key` keeps the first of several equal minima, which gives the
    // accepted-first tie break.
    fn nearest_index(&self, floor: FloorIndex) -> Option<usize> {
        self.tasks
            .iter()
            .enumerate()
            .min_by_key(|(_, task)| task.pickup_distance(floor))
            .map(|(idx, _)| idx)
    }
}

impl Extend<CallRequest> for PendingQueue {
    fn extend<I: IntoIterator<Item = CallRequest>>(&mut self, iter: I) {
        self.tasks.extend(iter);
    }
}

impl FromIterator<CallRequest> for PendingQueue {
    fn from_iter<I: IntoIterator<Item = CallRequest>>(iter: I) -> Self {
        Self {
            tasks: iter.into_iter().collect(),
        }
    }
}
