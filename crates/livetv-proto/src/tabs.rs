/// Which category tab is active.
///
/// Selection is synchronous and never debounced; the channel query keyed
/// on [`TabController::active`] takes care of superseded requests.
#[derive(Debug, Clone)]
pub struct TabController {
    categories: Vec<String>,
    active: String,
}

impl TabController {
    pub fn new(default_category: impl Into<String>) -> Self {
        Self {
            categories: Vec::new(),
            active: default_category.into(),
        }
    }

    pub fn active(&self) -> &str {
        &self.active
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Index of the active tab, if the server lists it.
    pub fn active_index(&self) -> Option<usize> {
        self.categories.iter().position(|c| *c == self.active)
    }

    /// Replace the known categories. The active selection is kept even
    /// when the new list no longer contains it.
    pub fn set_categories(&mut self, categories: Vec<String>) {
        self.categories = categories;
    }

    /// Returns `true` if the active category changed.
    pub fn select(&mut self, category: &str) -> bool {
        if self.active == category {
            return false;
        }
        self.active = category.to_string();
        true
    }

    pub fn select_index(&mut self, index: usize) -> bool {
        match self.categories.get(index) {
            Some(category) => {
                let category = category.clone();
                self.select(&category)
            }
            None => false,
        }
    }

    pub fn next(&mut self) -> bool {
        self.step(1)
    }

    pub fn prev(&mut self) -> bool {
        self.step(-1)
    }

    fn step(&mut self, delta: isize) -> bool {
        let len = self.categories.len();
        if len == 0 {
            return false;
        }
        let target = match self.active_index() {
            Some(i) => (i as isize + delta).rem_euclid(len as isize) as usize,
            // Active tab not listed: start from whichever end we move toward.
            None if delta > 0 => 0,
            None => len - 1,
        };
        self.select_index(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tabs() -> TabController {
        let mut t = TabController::new("dangal");
        t.set_categories(vec!["news".into(), "sports".into(), "dangal".into()]);
        t
    }

    #[test]
    fn starts_on_default() {
        let t = TabController::new("dangal");
        assert_eq!(t.active(), "dangal");
        assert_eq!(t.active_index(), None);
    }

    #[test]
    fn select_reports_change() {
        let mut t = tabs();
        assert!(t.select("sports"));
        assert!(!t.select("sports"));
        assert_eq!(t.active(), "sports");
        assert_eq!(t.active_index(), Some(1));
    }

    #[test]
    fn cycles_in_both_directions() {
        let mut t = tabs();
        assert!(t.next());
        assert_eq!(t.active(), "news");
        assert!(t.prev());
        assert_eq!(t.active(), "dangal");
        assert!(t.prev());
        assert_eq!(t.active(), "sports");
    }

    #[test]
    fn keeps_selection_missing_from_new_list() {
        let mut t = tabs();
        t.select("sports");
        t.set_categories(vec!["news".into()]);
        assert_eq!(t.active(), "sports");
        assert!(t.next());
        assert_eq!(t.active(), "news");
    }

    #[test]
    fn no_categories_no_movement() {
        let mut t = TabController::new("dangal");
        assert!(!t.next());
        assert!(!t.select_index(3));
        assert_eq!(t.active(), "dangal");
    }
}
