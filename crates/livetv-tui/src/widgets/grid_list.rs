//! Generic filterable list laid out as a grid of fixed-width cells.
//!
//! Selection is an index into the filtered items; the layout (column
//! count) is set by the renderer each frame and drives up/down movement.

pub struct GridList<T> {
    items: Vec<T>,
    filtered_indices: Vec<usize>,
    selected: usize,
    /// First visible row.
    scroll_row: usize,
    columns: usize,
    filter: String,
    filter_fn: Box<dyn Fn(&T, &str) -> bool + Send + Sync>,
}

impl<T> GridList<T> {
    pub fn new(filter_fn: impl Fn(&T, &str) -> bool + Send + Sync + 'static) -> Self {
        Self {
            items: Vec::new(),
            filtered_indices: Vec::new(),
            selected: 0,
            scroll_row: 0,
            columns: 1,
            filter: String::new(),
            filter_fn: Box::new(filter_fn),
        }
    }

    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.selected = 0;
        self.scroll_row = 0;
        self.rebuild_filter();
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn set_filter(&mut self, query: &str) {
        self.filter = query.to_string();
        let old_idx = self.filtered_indices.get(self.selected).copied();
        self.rebuild_filter();
        self.selected = old_idx
            .and_then(|prev| self.filtered_indices.iter().position(|&i| i == prev))
            .unwrap_or(0);
        self.scroll_row = 0;
    }

    fn rebuild_filter(&mut self) {
        self.filtered_indices = if self.filter.trim().is_empty() {
            (0..self.items.len()).collect()
        } else {
            self.items
                .iter()
                .enumerate()
                .filter(|(_, item)| (self.filter_fn)(item, &self.filter))
                .map(|(i, _)| i)
                .collect()
        };
        if self.selected >= self.filtered_indices.len() {
            self.selected = self.filtered_indices.len().saturating_sub(1);
        }
    }

    pub fn set_columns(&mut self, columns: usize) {
        self.columns = columns.max(1);
    }

    pub fn left(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn right(&mut self) {
        if !self.filtered_indices.is_empty() {
            self.selected = (self.selected + 1).min(self.filtered_indices.len() - 1);
        }
    }

    pub fn up(&mut self, rows: usize) {
        self.selected = self.selected.saturating_sub(rows * self.columns);
    }

    pub fn down(&mut self, rows: usize) {
        if self.filtered_indices.is_empty() {
            return;
        }
        let target = self.selected + rows * self.columns;
        // Moving down from the last full row lands on the final cell.
        self.selected = target.min(self.filtered_indices.len() - 1);
    }

    pub fn first(&mut self) {
        self.selected = 0;
        self.scroll_row = 0;
    }

    pub fn last(&mut self) {
        self.selected = self.filtered_indices.len().saturating_sub(1);
    }

    pub fn selected_position(&self) -> usize {
        self.selected
    }

    pub fn selected_item(&self) -> Option<&T> {
        let idx = self.filtered_indices.get(self.selected)?;
        self.items.get(*idx)
    }

    pub fn len(&self) -> usize {
        self.filtered_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filtered_indices.is_empty()
    }

    pub fn total_len(&self) -> usize {
        self.items.len()
    }

    /// Scroll so the selected cell's row is within `visible_rows`.
    pub fn ensure_visible(&mut self, visible_rows: usize) {
        if visible_rows == 0 {
            return;
        }
        let row = self.selected / self.columns;
        if row < self.scroll_row {
            self.scroll_row = row;
        } else if row >= self.scroll_row + visible_rows {
            self.scroll_row = row + 1 - visible_rows;
        }
    }

    /// `(filtered_position, &item)` for every cell in the visible rows.
    pub fn visible_items(&self, visible_rows: usize) -> Vec<(usize, &T)> {
        let start = self.scroll_row * self.columns;
        let end = (start + visible_rows * self.columns).min(self.filtered_indices.len());
        if start >= end {
            return Vec::new();
        }
        (start..end)
            .filter_map(|pos| {
                let idx = *self.filtered_indices.get(pos)?;
                Some((pos, self.items.get(idx)?))
            })
            .collect()
    }

    /// Select the cell at `(row, col)` of the visible grid.
    pub fn click(&mut self, row: usize, col: usize) -> bool {
        if col >= self.columns {
            return false;
        }
        let pos = (self.scroll_row + row) * self.columns + col;
        if pos < self.filtered_indices.len() {
            self.selected = pos;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(n: usize, columns: usize) -> GridList<String> {
        let mut g = GridList::new(|s: &String, q: &str| s.contains(q));
        g.set_items((0..n).map(|i| format!("item{}", i)).collect());
        g.set_columns(columns);
        g
    }

    #[test]
    fn moves_in_two_dimensions() {
        let mut g = grid(10, 3);
        g.right();
        g.down(1);
        assert_eq!(g.selected_position(), 4);
        g.down(5);
        assert_eq!(g.selected_position(), 9);
        g.up(1);
        assert_eq!(g.selected_position(), 6);
        g.left();
        assert_eq!(g.selected_item().map(String::as_str), Some("item5"));
    }

    #[test]
    fn visible_window_follows_selection() {
        let mut g = grid(12, 3);
        g.last();
        g.ensure_visible(2);
        let visible: Vec<usize> = g.visible_items(2).into_iter().map(|(pos, _)| pos).collect();
        assert_eq!(visible, vec![6, 7, 8, 9, 10, 11]);
        g.first();
        g.ensure_visible(2);
        assert_eq!(g.visible_items(2).len(), 6);
        assert_eq!(g.visible_items(2)[0].0, 0);
    }

    #[test]
    fn filter_keeps_selection_when_possible() {
        let mut g = grid(12, 4);
        g.down(2);
        assert_eq!(g.selected_item().map(String::as_str), Some("item8"));
        g.set_filter("item1");
        // item1, item10, item11
        assert_eq!(g.len(), 3);
        assert_eq!(g.selected_position(), 0);
        g.set_filter("");
        assert_eq!(g.len(), 12);
    }

    #[test]
    fn click_selects_visible_cell() {
        let mut g = grid(5, 2);
        assert!(g.click(1, 1));
        assert_eq!(g.selected_position(), 3);
        assert!(!g.click(2, 1));
        assert!(!g.click(0, 2));
    }

    #[test]
    fn empty_grid_is_inert() {
        let mut g = grid(0, 3);
        g.down(1);
        g.right();
        assert!(g.selected_item().is_none());
        assert!(g.visible_items(4).is_empty());
    }
}
