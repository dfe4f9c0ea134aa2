// biseriation-core/src/order.rs
//! Greedy linear-order engine.
//!
//! Builds a (possibly partial) permutation of `0..n_instances` so that similar
//! instances sit next to each other. The engine knows nothing about matrices:
//! distances and the seed come from a [`Metric`].
//!
//! Two construction heuristics:
//! - cheapest insertion: each instance goes where it adds the least path length
//! - nearest neighbor ("left-right"): a path grown from a seed, extending
//!   whichever end has the closer unplaced neighbor
//!
//! Once placed, an index is never moved or removed. Incremental updates only
//! ever insert, always through the cheapest-insertion rule.

use std::collections::{BTreeSet, HashSet};

use log::{debug, info, trace, warn};

use crate::checkpoint::{Placement, PlacementLog, replay_order};
use crate::error::{CoreError, CoreResult};
use crate::progress::ProgressReporter;

/// Distance capability consumed by the engine.
pub trait Metric {
    fn distance(&self, x: usize, y: usize) -> f64;

    /// Starting element of the nearest-neighbor heuristic.
    fn find_seed(&self, n_instances: usize) -> usize {
        n_instances / 2
    }
}

/// Closest remaining element to one end of the order.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    distance: f64,
    index: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearOrder {
    order: Vec<usize>,
    remaining: BTreeSet<usize>,
    placed: HashSet<usize>,
    n_instances: usize,
}

impl LinearOrder {
    /// Empty order over `n_instances` elements, all of them eligible.
    pub fn new(n_instances: usize) -> Self {
        Self::with_eligible(n_instances, 0..n_instances)
    }

    /// Empty order where only `eligible` elements start in the remaining set.
    pub fn with_eligible(n_instances: usize, eligible: impl IntoIterator<Item = usize>) -> Self {
        Self {
            order: Vec::with_capacity(n_instances),
            remaining: eligible.into_iter().filter(|&i| i < n_instances).collect(),
            placed: HashSet::with_capacity(n_instances),
            n_instances,
        }
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn remaining(&self) -> &BTreeSet<usize> {
        &self.remaining
    }

    pub fn n_instances(&self) -> usize {
        self.n_instances
    }

    pub fn contains(&self, i: usize) -> bool {
        self.placed.contains(&i)
    }

    /// Rebuild the order from logged placements; `remaining` becomes its complement.
    pub fn replay(&mut self, events: &[Placement]) -> CoreResult<()> {
        let replayed = replay_order(events);
        self.set_order(replayed)?;
        debug!(
            "Replayed {} placements, {} remaining",
            self.order.len(),
            self.remaining.len()
        );
        Ok(())
    }

    /// Replace the order wholesale, e.g. to score an identity baseline.
    pub fn set_order(&mut self, order: Vec<usize>) -> CoreResult<()> {
        let mut placed = HashSet::with_capacity(order.len());
        for &i in &order {
            if i >= self.n_instances {
                return Err(CoreError::Invalid(format!(
                    "index {} out of range for {} instances",
                    i, self.n_instances
                )));
            }
            if !placed.insert(i) {
                return Err(CoreError::Invalid(format!("index {} placed twice", i)));
            }
        }
        let mut pool = std::mem::take(&mut self.remaining);
        pool.extend(self.placed.drain());
        self.remaining = pool.into_iter().filter(|i| !placed.contains(i)).collect();
        self.placed = placed;
        self.order = order;
        Ok(())
    }

    /// Raise `n_instances`; the new indices join the remaining set.
    pub fn grow_to(&mut self, n_instances: usize) {
        if n_instances > self.n_instances {
            self.remaining.extend(self.n_instances..n_instances);
            self.n_instances = n_instances;
        }
    }

    fn insert_at(&mut self, slot: usize, x: usize) {
        self.order.insert(slot, x);
        self.placed.insert(x);
        self.remaining.remove(&x);
    }

    /// Position at which inserting `x` adds the least path length.
    ///
    /// Candidates are, in this order: before the first element, after the last
    /// one, then between each adjacent pair `(a, b)` at marginal cost
    /// `d(a, x) + d(x, b) - d(a, b)`. A later candidate must be strictly cheaper
    /// to win.
    pub fn best_slot<M: Metric + ?Sized>(&self, x: usize, metric: &M) -> usize {
        let order = &self.order;
        if order.len() <= 1 {
            return 0;
        }
        let last = order.len() - 1;

        let mut min = metric.distance(x, order[0]);
        let mut slot = 0;
        let d = metric.distance(order[last], x);
        if d < min {
            min = d;
            slot = order.len();
        }
        for i in 0..last {
            let d = metric.distance(order[i], x) + metric.distance(x, order[i + 1])
                - metric.distance(order[i], order[i + 1]);
            if d < min {
                min = d;
                slot = i + 1;
            }
        }
        trace!("best slot for {}: {} (cost {:.6})", x, slot, min);
        slot
    }

    /// Cheapest insertion of every instance, in increasing index order.
    pub fn generate_insert<M: Metric + ?Sized>(
        &mut self,
        metric: &M,
        progress: &mut dyn ProgressReporter,
    ) {
        info!(
            "Generating order by cheapest insertion over {} instances",
            self.n_instances
        );
        for x in 0..self.n_instances {
            if self.contains(x) {
                continue;
            }
            let slot = self.best_slot(x, metric);
            self.insert_at(slot, x);
            progress.placed(self.order.len());
        }
        progress.finished(self.order.len());
    }

    /// Insert `i` at its cheapest slot unless it is already placed.
    ///
    /// Returns whether an insertion happened.
    pub fn update_insert<M: Metric + ?Sized>(&mut self, i: usize, metric: &M) -> bool {
        if self.contains(i) {
            return false;
        }
        self.grow_to(i + 1);
        let slot = self.best_slot(i, metric);
        self.insert_at(slot, i);
        true
    }

    /// Admit one new instance (index `n_instances`) and insert it at its cheapest slot.
    pub fn fold_in_next<M: Metric + ?Sized>(&mut self, metric: &M) -> usize {
        let x = self.n_instances;
        self.grow_to(x + 1);
        let slot = self.best_slot(x, metric);
        self.insert_at(slot, x);
        debug!("Folded in instance {} at position {}", x, slot);
        x
    }

    fn next_candidate<M: Metric + ?Sized>(&self, x: usize, metric: &M) -> Candidate {
        let mut best = Candidate {
            distance: f64::INFINITY,
            index: None,
        };
        for &i in &self.remaining {
            let d = metric.distance(x, i);
            if d < best.distance {
                best = Candidate {
                    distance: d,
                    index: Some(i),
                };
            }
        }
        best
    }

    fn place(&mut self, placement: Placement, log: &mut dyn PlacementLog) -> CoreResult<()> {
        match placement {
            Placement::Left(i) => self.insert_at(0, i),
            Placement::Seed(i) | Placement::Right(i) => self.insert_at(self.order.len(), i),
        }
        log.append(placement)
    }

    /// Nearest-neighbor ("left-right") construction.
    ///
    /// On an empty order the seed is placed, then its nearest remaining
    /// neighbor on the left and the next nearest on the right. Each step then
    /// extends the end whose cached candidate is closer, the left end on ties.
    /// A cache is refreshed only after its end was extended, or for both ends
    /// when they point at the same element. Stops when nothing remains or no
    /// end has a candidate. A non-empty order (e.g. replayed from `log`) is
    /// continued as is.
    pub fn generate_left_right<M: Metric + ?Sized>(
        &mut self,
        metric: &M,
        log: &mut dyn PlacementLog,
        progress: &mut dyn ProgressReporter,
    ) -> CoreResult<()> {
        if self.n_instances == 0 {
            return Ok(());
        }

        if self.order.is_empty() {
            let seed = metric.find_seed(self.n_instances);
            debug!("Seed: {}", seed);
            self.place(Placement::Seed(seed), log)?;
            progress.placed(self.order.len());

            if let Some(left) = self.next_candidate(seed, metric).index {
                debug!("Left seed: {}", left);
                self.place(Placement::Left(left), log)?;
                progress.placed(self.order.len());
            }
            if let Some(right) = self.next_candidate(seed, metric).index {
                debug!("Right seed: {}", right);
                self.place(Placement::Right(right), log)?;
                progress.placed(self.order.len());
            }
        }

        info!(
            "Generating order by nearest neighbor: {} placed, {} remaining",
            self.order.len(),
            self.remaining.len()
        );

        let mut left = self.next_candidate(self.order[0], metric);
        let mut right = self.next_candidate(self.order[self.order.len() - 1], metric);
        let mut refresh_left = false;
        let mut refresh_right = false;

        while !self.remaining.is_empty() {
            if refresh_left {
                left = self.next_candidate(self.order[0], metric);
                refresh_left = false;
            }
            if refresh_right {
                right = self.next_candidate(self.order[self.order.len() - 1], metric);
                refresh_right = false;
            }

            match (left.index, right.index) {
                (Some(l), _) if left.distance <= right.distance => {
                    self.place(Placement::Left(l), log)?;
                    refresh_left = true;
                }
                (_, Some(r)) => {
                    self.place(Placement::Right(r), log)?;
                    refresh_right = true;
                }
                _ => {}
            }
            if left.index == right.index {
                refresh_left = true;
                refresh_right = true;
            }
            progress.placed(self.order.len());

            if left.index.is_none() && right.index.is_none() {
                warn!(
                    "No candidate at either end, stopping with {} elements unplaced",
                    self.remaining.len()
                );
                break;
            }
        }
        progress.finished(self.order.len());
        Ok(())
    }

    /// Distances between successive elements of the order.
    pub fn consecutive_distances<M: Metric + ?Sized>(&self, metric: &M) -> Vec<f64> {
        self.order
            .windows(2)
            .map(|w| metric.distance(w[0], w[1]))
            .collect()
    }

    /// Path length of the order, or of `0..n_instances` when nothing is placed yet.
    pub fn sum_of_distances<M: Metric + ?Sized>(&self, metric: &M) -> f64 {
        if self.order.is_empty() {
            (1..self.n_instances)
                .map(|i| metric.distance(i - 1, i))
                .fold(0.0, |acc, d| acc + d)
        } else {
            self.consecutive_distances(metric)
                .iter()
                .fold(0.0, |acc, &d| acc + d)
        }
    }

    /// Cumulative position of each element along the order, starting at 0.
    pub fn scale<M: Metric + ?Sized>(&self, metric: &M) -> Vec<f64> {
        if self.order.is_empty() {
            return Vec::new();
        }
        let mut scale = Vec::with_capacity(self.order.len());
        let mut acc = 0.0;
        scale.push(acc);
        for d in self.consecutive_distances(metric) {
            acc += d;
            scale.push(acc);
        }
        scale
    }
}
