//! Chunked execution of elementwise kernels.
//!
//! A kernel is expressed as a function of a canonical linear range
//! `start..end` of the output that returns the values for exactly that range.
//! With the `parallel` feature the range is halved recursively with
//! `rayon::join` and the halves are concatenated in order, so the result is
//! identical to a single sequential call.

#[cfg(feature = "parallel")]
use log::debug;

/// Minimum number of output elements before work is split across threads.
pub const PARALLEL_THRESHOLD: usize = 1 << 15;

/// Evaluate `f` over `0..size`, possibly in parallel.
///
/// Only used for freshly allocated outputs; callers that write into an
/// existing array stay sequential.
pub(crate) fn collect_chunks<O, F>(size: usize, f: F) -> Vec<O>
where
    O: Send,
    F: Fn(usize, usize) -> Vec<O> + Sync,
{
    #[cfg(feature = "parallel")]
    {
        let nthreads = rayon::current_num_threads();
        if nthreads > 1 && size >= PARALLEL_THRESHOLD {
            debug!("parallel kernel over {} elements on {} threads", size, nthreads);
            return split_range(0, size, nthreads, &f);
        }
    }
    f(0, size)
}

/// Recursive halving of `start..end`.
///
/// Mirrors the dimension-splitting recursion: the base case is a single
/// thread or a range at or below [`PARALLEL_THRESHOLD`].
#[cfg(feature = "parallel")]
fn split_range<O, F>(start: usize, end: usize, nthreads: usize, f: &F) -> Vec<O>
where
    O: Send,
    F: Fn(usize, usize) -> Vec<O> + Sync,
{
    let len = end - start;
    if nthreads <= 1 || len <= PARALLEL_THRESHOLD {
        return f(start, end);
    }
    let mid = start + len / 2;
    let nt_left = nthreads / 2;
    let nt_right = nthreads - nt_left;
    let (mut left, right) = rayon::join(
        || split_range(start, mid, nt_left, f),
        || split_range(mid, end, nt_right, f),
    );
    left.extend(right);
    left
}
