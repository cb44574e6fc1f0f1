//! Headless state machines behind the infinite-scroll and pull-to-refresh
//! interactions. The view feeds them raw events and acts on what they return.

/// Tracks the end-of-list sentinel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InfiniteScroll {
    is_in_view: bool,
}

impl InfiniteScroll {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_in_view(&self) -> bool {
        self.is_in_view
    }

    /// Returns `true` when the feed should load its next page.
    pub fn on_intersection(
        &mut self,
        is_intersecting: bool,
        has_more: bool,
        loading: bool,
    ) -> bool {
        self.is_in_view = is_intersecting;
        is_intersecting && has_more && !loading
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PullToRefresh {
    threshold: f32,
    max_pull_distance: f32,
    start_y: f32,
    pulling: bool,
    can_pull: bool,
    pull_distance: f32,
    refreshing: bool,
}

impl Default for PullToRefresh {
    fn default() -> Self {
        Self::new(80.0, 120.0)
    }
}

impl PullToRefresh {
    const DAMPING: f32 = 0.5;
    /// Pulls only start this close to the top of the page.
    const TOP_TOLERANCE: f32 = 5.0;

    pub fn new(threshold: f32, max_pull_distance: f32) -> Self {
        Self {
            threshold,
            max_pull_distance,
            start_y: 0.0,
            pulling: false,
            can_pull: true,
            pull_distance: 0.0,
            refreshing: false,
        }
    }

    pub fn pull_distance(&self) -> f32 {
        self.pull_distance
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    pub fn can_pull(&self) -> bool {
        self.can_pull
    }

    pub fn progress(&self) -> f32 {
        (self.pull_distance / self.threshold).min(1.0)
    }

    pub fn touch_start(&mut self, touch_y: f32, scroll_top: f32) {
        if scroll_top <= Self::TOP_TOLERANCE {
            self.start_y = touch_y;
            self.pulling = true;
            self.can_pull = true;
        } else {
            self.can_pull = false;
        }
    }

    /// Returns `true` when the move was consumed as a pull (the view should
    /// suppress native scrolling).
    pub fn touch_move(&mut self, touch_y: f32) -> bool {
        if !self.pulling || !self.can_pull || self.refreshing {
            return false;
        }
        let diff = touch_y - self.start_y;
        if diff <= 0.0 {
            return false;
        }
        self.pull_distance = (diff * Self::DAMPING).min(self.max_pull_distance);
        true
    }

    /// Returns `true` when a refresh should start; call
    /// [`PullToRefresh::finish_refresh`] once it completes.
    pub fn touch_end(&mut self) -> bool {
        if !self.pulling {
            return false;
        }
        self.pulling = false;

        if self.pull_distance >= self.threshold && !self.refreshing {
            self.refreshing = true;
            self.pull_distance = self.threshold;
            true
        } else {
            self.pull_distance = 0.0;
            false
        }
    }

    pub fn finish_refresh(&mut self) {
        self.refreshing = false;
        self.pull_distance = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_triggers_only_when_idle_with_more_pages() {
        let mut scroll = InfiniteScroll::new();
        assert!(scroll.on_intersection(true, true, false));
        assert!(scroll.is_in_view());
        assert!(!scroll.on_intersection(true, true, true));
        assert!(!scroll.on_intersection(true, false, false));
        assert!(!scroll.on_intersection(false, true, false));
        assert!(!scroll.is_in_view());
    }

    #[test]
    fn pull_past_threshold_starts_refresh() {
        let mut pull = PullToRefresh::default();
        pull.touch_start(100.0, 0.0);
        assert!(pull.touch_move(300.0));
        // 200px of finger travel, damped by half and capped at 120
        assert_eq!(pull.pull_distance(), 100.0);
        assert_eq!(pull.progress(), 1.0);

        assert!(pull.touch_end());
        assert!(pull.is_refreshing());
        assert_eq!(pull.pull_distance(), 80.0);
        assert!(!pull.touch_move(400.0));

        pull.finish_refresh();
        assert!(!pull.is_refreshing());
        assert_eq!(pull.pull_distance(), 0.0);
    }

    #[test]
    fn short_pull_springs_back() {
        let mut pull = PullToRefresh::default();
        pull.touch_start(100.0, 2.0);
        pull.touch_move(180.0);
        assert_eq!(pull.pull_distance(), 40.0);
        assert_eq!(pull.progress(), 0.5);
        assert!(!pull.touch_end());
        assert_eq!(pull.pull_distance(), 0.0);
    }

    #[test]
    fn pull_ignored_when_page_is_scrolled() {
        let mut pull = PullToRefresh::default();
        pull.touch_start(100.0, 250.0);
        assert!(!pull.can_pull());
        assert!(!pull.touch_move(400.0));
        assert!(!pull.touch_end());
    }

    #[test]
    fn pull_distance_is_capped() {
        let mut pull = PullToRefresh::default();
        pull.touch_start(0.0, 0.0);
        pull.touch_move(1000.0);
        assert_eq!(pull.pull_distance(), 120.0);
    }
}
