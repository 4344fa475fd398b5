//! Order-preserving fan-out of per-record work across scoped threads.
use std::num::NonZeroUsize;

/// Upper bound on the number of worker threads used by batch operations.
///
/// The actual number of threads is also limited by the size of the batch: small batches are
/// processed on the calling thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Parallelism(NonZeroUsize);

impl Parallelism {
    /// Minimum number of records a worker thread is given. Below that, spawning a thread costs
    /// more than scoring the records.
    pub const MIN_CHUNK_LEN: usize = 64;

    /// Use as many threads as the machine reports. Falls back to a single thread if that cannot
    /// be determined.
    pub fn available() -> Parallelism {
        Parallelism(std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN))
    }

    /// Process everything on the calling thread.
    pub fn sequential() -> Parallelism {
        Parallelism(NonZeroUsize::MIN)
    }

    /// Use at most `n` threads. Zero is treated as one.
    pub fn threads(n: usize) -> Parallelism {
        Parallelism(NonZeroUsize::new(n).unwrap_or(NonZeroUsize::MIN))
    }

    pub fn get(self) -> usize {
        self.0.get()
    }

    /// Number of threads to use for a batch of `len` items.
    fn threads_for(self, len: usize) -> usize {
        self.get()
            .min(len.div_ceil(Parallelism::MIN_CHUNK_LEN))
            .max(1)
    }
}

impl Default for Parallelism {
    fn default() -> Parallelism {
        Parallelism::available()
    }
}

/// Split `items` into contiguous chunks, run `f` on every chunk and return chunk outputs in input
/// order.
///
/// Panics in a worker are resumed on the calling thread.
pub(crate) fn map_chunks<T, R, F>(items: &[T], parallelism: Parallelism, f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&[T]) -> R + Sync,
{
    let threads = parallelism.threads_for(items.len());
    if threads <= 1 {
        return vec![f(items)];
    }

    let chunk_len = items.len().div_ceil(threads);
    log::debug!(target: "loyalty",
                records = items.len(),
                threads = threads,
                chunk_len = chunk_len;
                "splitting batch across threads");

    std::thread::scope(|scope| {
        let f = &f;
        let handles = items
            .chunks(chunk_len)
            .map(|chunk| scope.spawn(move || f(chunk)))
            .collect::<Vec<_>>();

        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threads_are_bounded_by_batch_size() {
        let parallelism = Parallelism::threads(8);
        assert_eq!(parallelism.threads_for(0), 1);
        assert_eq!(parallelism.threads_for(10), 1);
        assert_eq!(parallelism.threads_for(Parallelism::MIN_CHUNK_LEN + 1), 2);
        assert_eq!(parallelism.threads_for(10_000), 8);

        assert_eq!(Parallelism::threads(0).get(), 1);
        assert_eq!(Parallelism::sequential().threads_for(10_000), 1);
    }

    #[test]
    fn chunk_outputs_keep_input_order() {
        let items = (0..1000).collect::<Vec<u32>>();

        let chunks = map_chunks(&items, Parallelism::threads(4), |chunk| {
            chunk.iter().map(|x| x * 2).collect::<Vec<_>>()
        });

        assert_eq!(chunks.len(), 4);
        let flattened = chunks.into_iter().flatten().collect::<Vec<_>>();
        assert_eq!(flattened, items.iter().map(|x| x * 2).collect::<Vec<_>>());
    }

    #[test]
    fn empty_input_runs_once() {
        let chunks = map_chunks(&[] as &[u32], Parallelism::threads(4), |chunk| chunk.len());
        assert_eq!(chunks, vec![0]);
    }
}
