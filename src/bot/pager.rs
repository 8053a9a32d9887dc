//! Page computation over menus and file bodies.
//!
//! Menus are paged over their *selectable* subset: info lines are skipped
//! both when counting pages and when slicing, so a page always carries up
//! to `menu_page_size` items the user can actually pick. File bodies are
//! paged as literal line ranges.

use crate::config::PagingConfig;
use crate::gopher::{GopherItem, ItemType, Listing};

/// Digit labels run 0-9, so at most this many entries are addressable on a
/// page no matter how large the configured page size is.
pub const MAX_DIGIT_LABELS: usize = 10;

/// One page of a menu: the selectable slice plus its position. The order of
/// `items` is the digit index map (`0` selects `items[0]`, and so on).
#[derive(Debug, Clone)]
pub struct MenuPage {
    pub items: Vec<GopherItem>,
    pub start: usize,
    pub selectable_total: usize,
}

impl MenuPage {
    /// The slice of this page that carries digit labels.
    pub fn labeled(&self) -> &[GopherItem] {
        &self.items[..self.items.len().min(MAX_DIGIT_LABELS)]
    }
}

/// One page of a file body.
#[derive(Debug, Clone)]
pub struct TextPage {
    pub lines: Vec<String>,
    pub start: usize,
    pub total: usize,
}

/// The visible slice for a page of either listing kind.
#[derive(Debug, Clone)]
pub enum PageView {
    Menu(MenuPage),
    Text(TextPage),
}

fn selectable(items: &[GopherItem]) -> impl Iterator<Item = &GopherItem> {
    items.iter().filter(|i| i.item_type != ItemType::Info)
}

/// Number of pages in a listing. A completely empty listing still has one
/// (empty) page, so `page_index` 0 is always valid.
pub fn page_count(listing: &Listing, paging: &PagingConfig) -> usize {
    let count = match listing {
        Listing::Menu(items) => {
            selectable(items).count().div_ceil(paging.menu_page_size.max(1))
        }
        Listing::Text(lines) => lines.len().div_ceil(paging.file_page_size.max(1)),
    };
    count.max(1)
}

/// Clamp a requested page index into the listing's valid range.
pub fn clamp_page(listing: &Listing, requested: usize, paging: &PagingConfig) -> usize {
    requested.min(page_count(listing, paging) - 1)
}

/// The visible slice for `page_index` (clamped to the last page).
pub fn page(listing: &Listing, page_index: usize, paging: &PagingConfig) -> PageView {
    let page_index = clamp_page(listing, page_index, paging);
    match listing {
        Listing::Menu(items) => {
            let size = paging.menu_page_size.max(1);
            let start = page_index * size;
            let picked: Vec<GopherItem> = selectable(items).skip(start).take(size).cloned().collect();
            PageView::Menu(MenuPage {
                items: picked,
                start,
                selectable_total: selectable(items).count(),
            })
        }
        Listing::Text(lines) => {
            let size = paging.file_page_size.max(1);
            let start = page_index * size;
            let slice: Vec<String> = lines.iter().skip(start).take(size).cloned().collect();
            PageView::Text(TextPage {
                lines: slice,
                start,
                total: lines.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(t: ItemType, display: &str) -> GopherItem {
        GopherItem {
            item_type: t,
            display: display.to_string(),
            selector: format!("/{display}"),
            host: "example.org".to_string(),
            port: 70,
        }
    }

    fn menu_with(info: usize, selectable: usize) -> Listing {
        let mut items = Vec::new();
        for i in 0..info {
            items.push(item(ItemType::Info, &format!("info{i}")));
        }
        for i in 0..selectable {
            items.push(item(ItemType::Menu, &format!("entry{i}")));
        }
        Listing::Menu(items)
    }

    fn paging() -> PagingConfig {
        PagingConfig {
            menu_page_size: 10,
            file_page_size: 20,
        }
    }

    #[test]
    fn page_count_ignores_info_lines() {
        // ceil(m/p) over the selectable subset only
        assert_eq!(page_count(&menu_with(3, 20), &paging()), 2);
        assert_eq!(page_count(&menu_with(3, 21), &paging()), 3);
        assert_eq!(page_count(&menu_with(0, 1), &paging()), 1);
        assert_eq!(page_count(&menu_with(7, 0), &paging()), 1);
    }

    #[test]
    fn empty_listing_is_a_single_empty_page() {
        let empty = Listing::Menu(Vec::new());
        assert_eq!(page_count(&empty, &paging()), 1);
        match page(&empty, 0, &paging()) {
            PageView::Menu(p) => {
                assert!(p.items.is_empty());
                assert_eq!(p.selectable_total, 0);
            }
            PageView::Text(_) => panic!("expected menu page"),
        }
    }

    #[test]
    fn info_lines_never_get_digit_labels() {
        let listing = menu_with(3, 12);
        match page(&listing, 0, &paging()) {
            PageView::Menu(p) => {
                assert_eq!(p.items.len(), 10);
                assert!(p.labeled().iter().all(|i| i.item_type != ItemType::Info));
                assert_eq!(p.labeled()[0].display, "entry0");
            }
            PageView::Text(_) => panic!("expected menu page"),
        }
    }

    #[test]
    fn past_the_end_clamps_to_last_page() {
        let listing = menu_with(0, 25);
        match page(&listing, 99, &paging()) {
            PageView::Menu(p) => {
                assert_eq!(p.start, 20);
                assert_eq!(p.items.len(), 5);
            }
            PageView::Text(_) => panic!("expected menu page"),
        }
    }

    #[test]
    fn oversized_page_size_still_caps_digits_at_ten() {
        let listing = menu_with(0, 15);
        let cfg = PagingConfig {
            menu_page_size: 15,
            file_page_size: 20,
        };
        match page(&listing, 0, &cfg) {
            PageView::Menu(p) => {
                assert_eq!(p.items.len(), 15);
                assert_eq!(p.labeled().len(), MAX_DIGIT_LABELS);
            }
            PageView::Text(_) => panic!("expected menu page"),
        }
    }

    #[test]
    fn file_pages_are_literal_line_ranges() {
        let lines: Vec<String> = (0..47).map(|i| format!("line {i}")).collect();
        let listing = Listing::Text(lines);
        assert_eq!(page_count(&listing, &paging()), 3);
        match page(&listing, 2, &paging()) {
            PageView::Text(p) => {
                assert_eq!(p.start, 40);
                assert_eq!(p.lines.len(), 7);
                assert_eq!(p.lines[0], "line 40");
                assert_eq!(p.total, 47);
            }
            PageView::Menu(_) => panic!("expected text page"),
        }
    }
}
