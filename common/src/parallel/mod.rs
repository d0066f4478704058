//! Parallel processing utilities.
//!
//! Every helper here hands each rayon task a disjoint `&mut` chunk, so no two
//! threads ever write the same slot and no locking is needed.

use rayon::prelude::*;


/// Multiplier for number of chunks relative to CPU threads.
/// Using 3x threads provides good load balancing when some chunks finish faster.
const CHUNKS_PER_THREAD: usize = 3;

/// Compute optimal chunk size for the given length.
#[inline]
fn auto_chunk_size(len: usize) -> usize {
    let num_chunks = rayon::current_num_threads() * CHUNKS_PER_THREAD;
    (len / num_chunks).max(1)
}

/// Parallel iterator that prepends the starting index of each chunk.
pub struct WithOffset<I, T, F> {
    inner: I,
    multiplier: usize,
    transform: F,
    _phantom: std::marker::PhantomData<T>,
}

impl<I, T, F> WithOffset<I, T, F> {
    fn new(inner: I, multiplier: usize, transform: F) -> Self {
        Self {
            inner,
            multiplier,
            transform,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<I, T, F> ParallelIterator for WithOffset<I, T, F>
where
    I: IndexedParallelIterator,
    T: Send,
    F: Fn(I::Item) -> T + Send + Sync,
{
    type Item = (usize, T);

    fn drive_unindexed<C>(self, consumer: C) -> C::Result
    where
        C: rayon::iter::plumbing::UnindexedConsumer<Self::Item>,
    {
        let multiplier = self.multiplier;
        let transform = self.transform;
        self.inner
            .enumerate()
            .map(move |(idx, item)| (idx * multiplier, transform(item)))
            .drive_unindexed(consumer)
    }
}

impl<I, T, F> IndexedParallelIterator for WithOffset<I, T, F>
where
    I: IndexedParallelIterator,
    T: Send,
    F: Fn(I::Item) -> T + Send + Sync,
{
    fn len(&self) -> usize {
        self.inner.len()
    }

    fn drive<C>(self, consumer: C) -> C::Result
    where
        C: rayon::iter::plumbing::Consumer<Self::Item>,
    {
        let multiplier = self.multiplier;
        let transform = self.transform;
        self.inner
            .enumerate()
            .map(move |(idx, item)| (idx * multiplier, transform(item)))
            .drive(consumer)
    }

    fn with_producer<CB>(self, callback: CB) -> CB::Output
    where
        CB: rayon::iter::plumbing::ProducerCallback<Self::Item>,
    {
        let multiplier = self.multiplier;
        let transform = self.transform;
        self.inner
            .enumerate()
            .map(move |(idx, item)| (idx * multiplier, transform(item)))
            .with_producer(callback)
    }
}

/// Parallel iterator over row-aligned mutable chunks yielding `(first_row, chunk)`.
pub type ParRowsMutWithOffset<'a, T> =
    WithOffset<rayon::slice::ChunksMut<'a, T>, &'a mut [T], fn(&'a mut [T]) -> &'a mut [T]>;

/// Parallel iterator over mutable chunks yielding `(offset, chunk)`.
pub type ParChunksMutWithOffset<'a, T> =
    WithOffset<rayon::slice::ChunksMut<'a, T>, &'a mut [T], fn(&'a mut [T]) -> &'a mut [T]>;

/// Parallel iterator over a mutable row-aligned chunk zipped with a shared one.
pub type ParRowsZipWithOffset<'a, A, B> = WithOffset<
    rayon::iter::Zip<rayon::slice::ChunksMut<'a, A>, rayon::slice::Chunks<'a, B>>,
    (&'a mut [A], &'a [B]),
    fn((&'a mut [A], &'a [B])) -> (&'a mut [A], &'a [B]),
>;

/// Split a row-major buffer into parallel chunks of whole rows.
pub trait ParRowsMutAuto<'a, T: Send + 'a> {
    type Iter: IndexedParallelIterator;

    /// Yields `(chunk_start_row, chunk)` pairs; every chunk holds complete rows of `width`.
    fn par_rows_mut_auto(&'a mut self, width: usize) -> Self::Iter;
}

impl<'a, T: Send + 'a> ParRowsMutAuto<'a, T> for [T] {
    type Iter = ParRowsMutWithOffset<'a, T>;

    fn par_rows_mut_auto(&'a mut self, width: usize) -> ParRowsMutWithOffset<'a, T> {
        let width = width.max(1);
        let height = self.len() / width;
        let chunk_rows = auto_chunk_size(height);
        WithOffset::new(
            self.par_chunks_mut(width * chunk_rows),
            chunk_rows,
            identity as fn(&'a mut [T]) -> &'a mut [T],
        )
    }
}

/// Zip a mutable row-major buffer with a read-only one of the same shape.
pub trait ParRowsZipAuto<'a, A: Send + 'a> {
    /// Yields `(chunk_start_row, (dst_chunk, src_chunk))` with identical row ranges.
    fn par_rows_zip_auto<B: Sync + 'a>(
        &'a mut self,
        other: &'a [B],
        width: usize,
    ) -> ParRowsZipWithOffset<'a, A, B>;
}

impl<'a, A: Send + 'a> ParRowsZipAuto<'a, A> for [A] {
    fn par_rows_zip_auto<B: Sync + 'a>(
        &'a mut self,
        other: &'a [B],
        width: usize,
    ) -> ParRowsZipWithOffset<'a, A, B> {
        assert_eq!(
            self.len(),
            other.len(),
            "Zipped slices must have equal length"
        );
        let width = width.max(1);
        let height = self.len() / width;
        let chunk_rows = auto_chunk_size(height);
        let chunk_size = width * chunk_rows;
        WithOffset::new(
            self.par_chunks_mut(chunk_size)
                .zip(other.par_chunks(chunk_size)),
            chunk_rows,
            identity as fn((&'a mut [A], &'a [B])) -> (&'a mut [A], &'a [B]),
        )
    }
}

/// Split into mutable parallel chunks with automatic sizing.
pub trait ParChunksMutAutoWithOffset<'a, T: Send + 'a> {
    /// Yields `(start_offset, chunk)` pairs.
    fn par_chunks_mut_auto(&'a mut self) -> ParChunksMutWithOffset<'a, T>;
}

impl<'a, T: Send + 'a> ParChunksMutAutoWithOffset<'a, T> for [T] {
    fn par_chunks_mut_auto(&'a mut self) -> ParChunksMutWithOffset<'a, T> {
        let chunk_size = auto_chunk_size(self.len());
        WithOffset::new(
            self.par_chunks_mut(chunk_size),
            chunk_size,
            identity as fn(&'a mut [T]) -> &'a mut [T],
        )
    }
}

/// Fill `data[i] = f(i)` in parallel.
pub fn parallel_chunked<T, F>(data: &mut [T], f: F)
where
    T: Send + Sync,
    F: Fn(usize) -> T + Sync + Send,
{
    if data.is_empty() {
        return;
    }

    data.par_chunks_mut_auto().for_each(|(offset, chunk)| {
        for (i, val) in chunk.iter_mut().enumerate() {
            *val = f(offset + i);
        }
    });
}

fn identity<T>(x: T) -> T {
    x
}
