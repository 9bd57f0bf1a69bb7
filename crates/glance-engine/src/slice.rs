//! Deterministic sampling and pagination.

use glance_core::Page;

/// Systematic sample of at most `k` items: every `len / k`-th item,
/// starting from index 0. Returns the input unchanged when it already fits.
///
/// The integer step means slightly more than `k` indices can qualify, so
/// the result is truncated to exactly `k`. Identical inputs always produce
/// identical samples.
pub fn sample<T: Clone>(items: &[T], k: usize) -> Vec<T> {
    if k == 0 || items.len() <= k {
        return items.to_vec();
    }
    let step = items.len() / k;
    items
        .iter()
        .enumerate()
        .filter(|(i, _)| i % step == 0)
        .map(|(_, item)| item.clone())
        .take(k)
        .collect()
}

/// One-indexed pagination. `pages` is the ceiling of `len / page_size`.
///
/// Out-of-range pages (0, or past the end) yield an empty data slice with
/// the requested page number echoed back; the caller decides how to react.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let total = items.len();
    let pages = if page_size == 0 {
        0
    } else {
        total.div_ceil(page_size)
    };

    let data = if page == 0 || page_size == 0 {
        Vec::new()
    } else {
        let start = (page - 1) * page_size;
        if start >= total {
            Vec::new()
        } else {
            items[start..total.min(start + page_size)].to_vec()
        }
    };

    Page {
        data,
        total,
        pages,
        current_page: page,
    }
}
