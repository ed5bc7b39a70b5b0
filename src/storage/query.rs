//! In-process evaluation of a `ModFilter`, mirroring the SQL the database store issues.

use crate::types::{Mod, ModFilter, Paginated, SortBy};
use std::cmp::Ordering;

pub fn matches(m: &Mod, filter: &ModFilter) -> bool {
    if let Some(term) = filter.search_term() {
        if !m.name.to_lowercase().contains(&term) && !m.description.to_lowercase().contains(&term)
        {
            return false;
        }
    }
    if let Some(version) = filter.version_filter() {
        if m.version != version {
            return false;
        }
    }
    if let Some(category) = filter.category_filter() {
        if m.category != category {
            return false;
        }
    }
    if let Some(source) = filter.source_filter() {
        if m.source != source {
            return false;
        }
    }
    true
}

/// Ordering for a sort key; ties fall back to id so results are total and repeatable.
pub fn compare(a: &Mod, b: &Mod, sort_by: Option<SortBy>) -> Ordering {
    match sort_by {
        Some(SortBy::Recent) => b
            .created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id)),
        Some(SortBy::Name) => a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)),
        Some(SortBy::Popular) | Some(SortBy::Downloads) | None => b
            .download_count
            .cmp(&a.download_count)
            .then_with(|| a.id.cmp(&b.id)),
    }
}

/// Filter, sort, then slice out the requested page
pub fn paginate<'a, I>(mods: I, filter: &ModFilter) -> Paginated<Mod>
where
    I: IntoIterator<Item = &'a Mod>,
{
    let mut selected: Vec<&Mod> = mods.into_iter().filter(|m| matches(m, filter)).collect();
    selected.sort_by(|a, b| compare(a, b, filter.sort_by));

    let total = selected.len();
    let data = selected
        .into_iter()
        .skip(filter.offset())
        .take(filter.effective_page_size())
        .cloned()
        .collect();

    Paginated::new(data, total, filter)
}
