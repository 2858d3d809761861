use crate::model::Category;

/// Header of the synthetic category that collects pinned trackers. User
/// categories may not take this name.
pub const PINNED_HEADER: &str = "Pinned";

pub fn is_reserved_header(header: &str) -> bool {
    header == PINNED_HEADER
}

/// Produces the canonical display hierarchy: a leading "Pinned" category when
/// any tracker is pinned, then the stored categories in order with their
/// pinned trackers removed. Categories left empty by that removal are dropped.
pub fn partition(categories: &[Category]) -> Vec<Category> {
    let pinned: Vec<_> = categories
        .iter()
        .flat_map(|category| category.trackers.iter())
        .filter(|tracker| tracker.is_pinned)
        .cloned()
        .collect();

    let mut out = Vec::with_capacity(categories.len() + 1);
    if !pinned.is_empty() {
        out.push(Category::new(PINNED_HEADER, pinned));
    }

    for category in categories {
        let trackers: Vec<_> = category
            .trackers
            .iter()
            .filter(|tracker| !tracker.is_pinned)
            .cloned()
            .collect();
        if trackers.is_empty() {
            continue;
        }
        out.push(Category {
            header: category.header.clone(),
            trackers,
            is_last_selected: category.is_last_selected,
        });
    }
    out
}
