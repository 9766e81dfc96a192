//! Bounded scoped fan-out for the resolver and the inspector.

use std::num::NonZeroUsize;
use std::thread;

/// Run `task` over every item on at most `available_parallelism` scoped
/// threads and return the results in input order. Zero or one item runs on
/// the calling thread. Items of a batch whose thread panicked get
/// `on_panic(index)`.
pub(crate) fn map_bounded<T, R, F, P>(items: &[T], task: F, on_panic: P) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
    P: Fn(usize) -> R,
{
    if items.len() <= 1 {
        return items.iter().map(&task).collect();
    }
    let workers = thread::available_parallelism()
        .map_or(1, NonZeroUsize::get)
        .min(items.len());
    let chunk = items.len().div_ceil(workers);
    let task = &task;

    thread::scope(|scope| {
        let handles: Vec<_> = items
            .chunks(chunk)
            .map(|batch| scope.spawn(move || batch.iter().map(task).collect::<Vec<R>>()))
            .collect();

        let mut out = Vec::with_capacity(items.len());
        for (n, handle) in handles.into_iter().enumerate() {
            match handle.join() {
                Ok(results) => out.extend(results),
                Err(_) => {
                    let start = n * chunk;
                    let end = (start + chunk).min(items.len());
                    out.extend((start..end).map(&on_panic));
                }
            }
        }
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_keep_input_order() {
        let items: Vec<usize> = (0..37).collect();
        let out = map_bounded(&items, |n| n * 2, |_| usize::MAX);
        assert_eq!(out, items.iter().map(|n| n * 2).collect::<Vec<_>>());
    }

    #[test]
    fn single_item_runs_on_caller() {
        let caller = thread::current().id();
        let out = map_bounded(&[1], |_| thread::current().id(), |_| caller);
        assert_eq!(out, vec![caller]);
    }

    #[test]
    fn panicking_batch_is_reported_per_item() {
        let items = vec![1, 2, 3, 4];
        let out = map_bounded(
            &items,
            |&n| {
                if n == 3 {
                    panic!("boom");
                }
                Ok(n)
            },
            Err,
        );
        assert_eq!(out[2], Err(2));
        for (i, result) in out.iter().enumerate() {
            assert!(*result == Ok(items[i]) || *result == Err(i));
        }
    }
}
