#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
use rayon::prelude::*;

/// Maps `f` over `collection`, keeping the input order.
///
/// Runs on the rayon pool when the `parallel` feature is enabled and the collection is
/// longer than `threshold`, sequentially otherwise.
#[inline]
pub fn map<T, R, F>(collection: &[T], threshold: usize, f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    #[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
    {
        if collection.len() > threshold {
            collection.par_iter().map(f).collect()
        } else {
            collection.iter().map(f).collect()
        }
    }
    #[cfg(any(not(feature = "parallel"), target_arch = "wasm32"))]
    {
        let _ = threshold;
        collection.iter().map(f).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_keeps_order() {
        let input: Vec<u32> = (0..5000).collect();
        let output = map(&input, 10, |v| v * 2);
        assert_eq!(output.len(), input.len());
        assert!(output.iter().enumerate().all(|(i, &v)| v == i as u32 * 2));
    }
}
