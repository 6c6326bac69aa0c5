use std::ops::Range;

/// How a trajectory is split into batches.
///
/// `batch_size * number_of_batches + remainder == configurations` always
/// holds, where `configurations` counts the configurations after the offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchPlan {
    batch_size: usize,
    number_of_batches: usize,
    remainder: usize,
    offset: usize,
    configurations: usize,
    row_count: usize,
    system: bool,
    mini_batch: bool,
    atom_batch_size: usize,
    number_of_atom_batches: usize,
    atom_remainder: usize,
}
impl BatchPlan {
    pub(crate) fn new(
        batch_size: usize,
        configurations: usize,
        offset: usize,
        row_count: usize,
        system: bool,
    ) -> Self {
        assert!(
            batch_size >= 1 && batch_size <= configurations,
            "Batch size should be in [1, {}], found {}",
            configurations,
            batch_size
        );
        Self {
            batch_size,
            number_of_batches: configurations / batch_size,
            remainder: configurations % batch_size,
            offset,
            configurations,
            row_count,
            system,
            mini_batch: false,
            atom_batch_size: row_count,
            number_of_atom_batches: 1,
            atom_remainder: 0,
        }
    }

    /// Re-plan with batches of `atom_batch_size` atoms holding `batch_size`
    /// configurations each
    pub(crate) fn with_atom_batches(&self, batch_size: usize, atom_batch_size: usize) -> Self {
        let atom_batch_size = atom_batch_size.clamp(1, self.row_count.max(1));
        Self {
            mini_batch: true,
            atom_batch_size,
            number_of_atom_batches: self.row_count / atom_batch_size,
            atom_remainder: self.row_count % atom_batch_size,
            ..Self::new(
                batch_size,
                self.configurations,
                self.offset,
                self.row_count,
                self.system,
            )
        }
    }

    // Getters
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
    pub fn number_of_batches(&self) -> usize {
        self.number_of_batches
    }
    pub fn remainder(&self) -> usize {
        self.remainder
    }
    pub fn offset(&self) -> usize {
        self.offset
    }
    /// Configurations after the offset
    pub fn configurations(&self) -> usize {
        self.configurations
    }
    /// Largest row count of the planned datasets
    pub fn row_count(&self) -> usize {
        self.row_count
    }
    pub fn system(&self) -> bool {
        self.system
    }
    pub fn mini_batch(&self) -> bool {
        self.mini_batch
    }
    pub fn atom_batch_size(&self) -> usize {
        self.atom_batch_size
    }
    pub fn number_of_atom_batches(&self) -> usize {
        self.number_of_atom_batches
    }
    pub fn atom_remainder(&self) -> usize {
        self.atom_remainder
    }

    /// Batches per pass over the configurations, counting the remainder
    pub fn total_batches(&self) -> usize {
        self.number_of_batches + usize::from(self.remainder > 0)
    }

    /// Absolute configuration ranges of every batch, in trajectory order
    pub fn configuration_ranges(&self) -> Vec<Range<usize>> {
        split_ranges(
            self.offset,
            self.batch_size,
            self.number_of_batches,
            self.remainder,
        )
    }

    /// Atom ranges of every mini-batch; a single range over all atoms when
    /// mini-batching is off
    pub fn atom_ranges(&self) -> Vec<Range<usize>> {
        split_ranges(
            0,
            self.atom_batch_size,
            self.number_of_atom_batches,
            self.atom_remainder,
        )
    }
}

fn split_ranges(start: usize, size: usize, count: usize, remainder: usize) -> Vec<Range<usize>> {
    let mut ranges: Vec<Range<usize>> = (0..count)
        .map(|i| start + i * size..start + (i + 1) * size)
        .collect();
    if remainder > 0 {
        let begin = start + count * size;
        ranges.push(begin..begin + remainder);
    }
    ranges
}

/// Sliding-window partition of one batch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnsembleLoopPlan {
    windows_per_batch: usize,
    requires_minibatch: bool,
    data_range: usize,
    correlation_time: usize,
    batch_plan: BatchPlan,
}
impl EnsembleLoopPlan {
    pub(crate) fn new(
        batch_plan: BatchPlan,
        data_range: usize,
        correlation_time: usize,
        requires_minibatch: bool,
    ) -> Self {
        assert!(
            batch_plan.batch_size() >= data_range,
            "A batch of {} configurations cannot hold a window of {}",
            batch_plan.batch_size(),
            data_range
        );
        let final_window = batch_plan.batch_size() - data_range;
        Self {
            windows_per_batch: (final_window / correlation_time).max(1),
            requires_minibatch,
            data_range,
            correlation_time,
            batch_plan,
        }
    }

    pub fn windows_per_batch(&self) -> usize {
        self.windows_per_batch
    }
    pub fn requires_minibatch(&self) -> bool {
        self.requires_minibatch
    }
    pub fn data_range(&self) -> usize {
        self.data_range
    }
    pub fn correlation_time(&self) -> usize {
        self.correlation_time
    }
    /// The plan batches must follow, mini-batched if required
    pub fn batch_plan(&self) -> &BatchPlan {
        &self.batch_plan
    }

    /// Windows that fit inside a loaded batch of `batch_len` configurations
    pub fn windows_in(&self, batch_len: usize) -> usize {
        if batch_len < self.data_range {
            return 0;
        }
        ((batch_len - self.data_range) / self.correlation_time + 1).min(self.windows_per_batch)
    }

    /// Start indices, relative to the batch, of the windows in a batch
    pub fn window_starts(&self, batch_len: usize) -> impl Iterator<Item = usize> {
        let stride = self.correlation_time;
        (0..self.windows_in(batch_len)).map(move |k| k * stride)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_invariant_with_offset() {
        let plan = BatchPlan::new(300, 1000 - 50, 50, 10, false);
        assert_eq!(plan.number_of_batches(), 3);
        assert_eq!(plan.remainder(), 50);
        assert_eq!(
            plan.batch_size() * plan.number_of_batches() + plan.remainder(),
            plan.configurations()
        );
        let ranges = plan.configuration_ranges();
        assert_eq!(ranges.len(), plan.total_batches());
        assert_eq!(ranges[0], 50..350);
        assert_eq!(ranges[3], 950..1000);
        assert_eq!(plan.atom_ranges(), vec![0..10]);
    }

    #[test]
    fn atom_batches_cover_every_atom() {
        let plan = BatchPlan::new(100, 1000, 0, 10, false).with_atom_batches(500, 4);
        assert!(plan.mini_batch());
        assert_eq!(plan.batch_size(), 500);
        assert_eq!(plan.atom_ranges(), vec![0..4, 4..8, 8..10]);
    }

    #[test]
    fn windows_shrink_at_the_tail() {
        let plan = BatchPlan::new(1000, 2500, 0, 1, true);
        let ensemble = EnsembleLoopPlan::new(plan, 500, 1, false);
        assert_eq!(ensemble.windows_per_batch(), 500);
        assert_eq!(ensemble.windows_in(1000), 500);
        assert_eq!(ensemble.windows_in(600), 101);
        assert_eq!(ensemble.windows_in(499), 0);

        let ensemble = EnsembleLoopPlan::new(plan, 1000, 7, false);
        assert_eq!(ensemble.windows_per_batch(), 1);
        assert_eq!(ensemble.window_starts(1000).collect::<Vec<_>>(), vec![0]);

        let ensemble = EnsembleLoopPlan::new(plan, 100, 300, false);
        assert_eq!(ensemble.windows_per_batch(), 3);
        assert_eq!(
            ensemble.window_starts(1000).collect::<Vec<_>>(),
            vec![0, 300, 600]
        );
    }
}
