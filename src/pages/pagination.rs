/// Entry in the pagination control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(u32),
    Ellipsis,
}

/// Pages within this distance of the current one are always shown.
const NEIGHBOURS: u32 = 2;

/// Feeds this short list every page.
const SHOW_ALL_UP_TO: u32 = 7;

/// Page numbers to show for `current` of `total`: first and last page, the
/// pages within two of `current`, and one ellipsis per hidden run.
pub fn page_window(current: u32, total: u32) -> Vec<PageItem> {
    let total = total.max(1);
    if total <= SHOW_ALL_UP_TO {
        return (1..=total).map(PageItem::Page).collect();
    }

    let current = current.clamp(1, total);
    let low = current.saturating_sub(NEIGHBOURS).max(1);
    let high = current.saturating_add(NEIGHBOURS).min(total);

    let mut items = Vec::with_capacity(2 * NEIGHBOURS as usize + 5);
    let mut last_shown = 0;
    for page in (1..=1).chain(low..=high).chain(total..=total) {
        if page <= last_shown {
            continue;
        }
        if page > last_shown + 1 && last_shown != 0 {
            items.push(PageItem::Ellipsis);
        }
        items.push(PageItem::Page(page));
        last_shown = page;
    }
    items
}
