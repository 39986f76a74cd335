//! Side-by-side page comparison with text-difference overlays.
//!
//! [`DualPageComparator`] owns the viewer state (page, zoom, overlay toggles,
//! opacity) and recomputes both panes whenever it changes. Backend calls are
//! blocking and happen inside the triggering action, so a later navigation can
//! never be overwritten by an earlier response.

pub mod document;
pub mod overlay;

use crate::data::{ClientError, DiffQuery, DiffSource};
use crate::domain::{DiffBox, TextDiff};

pub use document::{DocumentLocation, PageSize, PageSource, PdfDocument};
pub use overlay::{CanvasRect, OverlayBox, PixelRect, Rgba, Side, box_color, effective_alpha, place_box};

pub const MIN_SCALE: f64 = 0.25;
pub const MAX_SCALE: f64 = 4.0;
pub const SCALE_STEP: f64 = 0.25;
pub const OPACITY_STEP: f64 = 0.1;

/// Everything the viewer's controls can change.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    /// 1-based, always within `1..=page_count`.
    pub page: u32,
    /// Longer of the two documents (at least 1).
    pub page_count: u32,
    pub scale: f64,
    pub overlay_active: bool,
    pub show_left: bool,
    /// Box opacity slider in `0..=1`.
    pub opacity: f64,
}

impl ViewState {
    pub fn new(page_count: u32) -> Self {
        Self {
            page: 1,
            page_count: page_count.max(1),
            scale: 1.0,
            overlay_active: false,
            show_left: true,
            opacity: 1.0,
        }
    }

    /// Clamp a requested page into range.
    pub fn clamp_page(&self, requested: i64) -> u32 {
        requested.clamp(1, i64::from(self.page_count)) as u32
    }
}

/// What a pane shows for the current page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaneContent {
    /// Page rendered at the current scale.
    Page(PageSize),
    /// Document has no such page; the pane is blank.
    Cleared,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pane {
    pub content: PaneContent,
    pub boxes: Vec<OverlayBox>,
}

impl Pane {
    fn cleared() -> Self {
        Self { content: PaneContent::Cleared, boxes: Vec::new() }
    }
}

/// Viewer input, independent of the terminal library.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewerAction {
    NextPage,
    PrevPage,
    GoTo(i64),
    ZoomIn,
    ZoomOut,
    ToggleOverlay,
    ToggleLeft,
    OpacityUp,
    OpacityDown,
}

pub struct DualPageComparator {
    left: Box<dyn PageSource>,
    right: Box<dyn PageSource>,
    state: ViewState,
    left_pane: Pane,
    right_pane: Pane,
    /// Last successful diff for the current page; re-laid out on zoom.
    diff: Option<TextDiff>,
    last_error: Option<String>,
}

impl DualPageComparator {
    pub fn new(left: Box<dyn PageSource>, right: Box<dyn PageSource>) -> Self {
        let page_count = left.page_count().max(right.page_count());
        let mut cmp = Self {
            left,
            right,
            state: ViewState::new(page_count),
            left_pane: Pane::cleared(),
            right_pane: Pane::cleared(),
            diff: None,
            last_error: None,
        };
        cmp.render_pages();
        cmp
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn pane(&self, side: Side) -> &Pane {
        match side {
            Side::Left => &self.left_pane,
            Side::Right => &self.right_pane,
        }
    }

    pub fn file_name(&self, side: Side) -> &str {
        match side {
            Side::Left => self.left.file_name(),
            Side::Right => self.right.file_name(),
        }
    }

    /// Message from the most recent failed diff request, cleared on success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn apply<D: DiffSource + ?Sized>(&mut self, action: ViewerAction, diffs: &D) {
        match action {
            ViewerAction::NextPage => self.go_to(i64::from(self.state.page) + 1, diffs),
            ViewerAction::PrevPage => self.go_to(i64::from(self.state.page) - 1, diffs),
            ViewerAction::GoTo(page) => self.go_to(page, diffs),
            ViewerAction::ZoomIn => self.set_scale(self.state.scale + SCALE_STEP),
            ViewerAction::ZoomOut => self.set_scale(self.state.scale - SCALE_STEP),
            ViewerAction::ToggleOverlay => self.toggle_overlay(diffs),
            ViewerAction::ToggleLeft => self.set_show_left(!self.state.show_left, diffs),
            ViewerAction::OpacityUp => self.set_opacity(self.state.opacity + OPACITY_STEP, diffs),
            ViewerAction::OpacityDown => self.set_opacity(self.state.opacity - OPACITY_STEP, diffs),
        }
    }

    /// Navigate (clamped) and refresh overlays when they are on.
    pub fn go_to<D: DiffSource + ?Sized>(&mut self, requested: i64, diffs: &D) {
        self.state.page = self.state.clamp_page(requested);
        self.diff = None;
        self.render_pages();
        // Boxes belong to the page they were fetched for.
        self.layout_boxes();
        if self.state.overlay_active {
            self.refresh_overlay(diffs);
        }
    }

    /// Zoom. Boxes are normalized, so the cached diff is just laid out again.
    pub fn set_scale(&mut self, scale: f64) {
        if !scale.is_finite() {
            return;
        }
        self.state.scale = scale.clamp(MIN_SCALE, MAX_SCALE);
        self.render_pages();
        self.layout_boxes();
    }

    pub fn toggle_overlay<D: DiffSource + ?Sized>(&mut self, diffs: &D) {
        self.state.overlay_active = !self.state.overlay_active;
        if self.state.overlay_active {
            self.refresh_overlay(diffs);
        } else {
            self.diff = None;
            self.left_pane.boxes.clear();
            self.right_pane.boxes.clear();
        }
    }

    pub fn set_show_left<D: DiffSource + ?Sized>(&mut self, show: bool, diffs: &D) {
        self.state.show_left = show;
        if self.state.overlay_active {
            self.refresh_overlay(diffs);
        }
    }

    pub fn set_opacity<D: DiffSource + ?Sized>(&mut self, opacity: f64, diffs: &D) {
        if !opacity.is_finite() {
            return;
        }
        // Snap to hundredths so repeated key steps land exactly on 0 and 1.
        self.state.opacity = (opacity.clamp(0.0, 1.0) * 100.0).round() / 100.0;
        if self.state.overlay_active {
            self.refresh_overlay(diffs);
        }
    }

    /// Fetch boxes for the current page. On failure the previous boxes stay up.
    pub fn refresh_overlay<D: DiffSource + ?Sized>(&mut self, diffs: &D) {
        match self.fetch(diffs) {
            Ok(diff) => {
                self.diff = Some(diff);
                self.last_error = None;
                self.layout_boxes();
            }
            Err(err) => {
                tracing::warn!(page = self.state.page, error = %err, "text diff request failed");
                self.last_error = Some(format!("Text diff failed: {err}"));
            }
        }
    }

    fn fetch<D: DiffSource + ?Sized>(&self, diffs: &D) -> Result<TextDiff, ClientError> {
        diffs.fetch_text_diff(&DiffQuery {
            left: self.left.file_name().to_string(),
            right: self.right.file_name().to_string(),
            page: self.state.page,
        })
    }

    fn render_pages(&mut self) {
        let page = self.state.page;
        let scale = self.state.scale;
        let content = |doc: &dyn PageSource| match doc.page_size(page) {
            Some(size) => PaneContent::Page(size.scaled(scale)),
            None => PaneContent::Cleared,
        };
        self.left_pane.content = content(self.left.as_ref());
        self.right_pane.content = content(self.right.as_ref());
    }

    fn layout_boxes(&mut self) {
        let Some(diff) = &self.diff else {
            self.left_pane.boxes.clear();
            self.right_pane.boxes.clear();
            return;
        };
        let opacity = self.state.opacity;

        let left: &[DiffBox] = if self.state.show_left { &diff.left } else { &[] };
        self.left_pane.boxes = layout_side(Side::Left, self.left_pane.content, left, opacity);
        self.right_pane.boxes = layout_side(Side::Right, self.right_pane.content, &diff.right, opacity);
    }
}

fn layout_side(side: Side, content: PaneContent, boxes: &[DiffBox], opacity: f64) -> Vec<OverlayBox> {
    // Nothing to anchor boxes to on a cleared pane.
    let PaneContent::Page(size) = content else {
        return Vec::new();
    };
    let canvas = CanvasRect { left: 0.0, top: 0.0, width: size.width, height: size.height };
    boxes.iter().map(|b| place_box(side, b, canvas, opacity)).collect()
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;

    struct FakeDoc {
        name: &'static str,
        pages: u32,
    }

    impl PageSource for FakeDoc {
        fn file_name(&self) -> &str {
            self.name
        }

        fn page_count(&self) -> u32 {
            self.pages
        }

        fn page_size(&self, page: u32) -> Option<PageSize> {
            (1..=self.pages).contains(&page).then_some(PageSize { width: 100.0, height: 200.0 })
        }
    }

    struct FakeDiffs {
        calls: Cell<usize>,
        queries: RefCell<Vec<DiffQuery>>,
        fail: Cell<bool>,
    }

    impl FakeDiffs {
        fn new() -> Self {
            Self { calls: Cell::new(0), queries: RefCell::new(Vec::new()), fail: Cell::new(false) }
        }
    }

    impl DiffSource for FakeDiffs {
        fn fetch_text_diff(&self, query: &DiffQuery) -> Result<TextDiff, ClientError> {
            self.calls.set(self.calls.get() + 1);
            self.queries.borrow_mut().push(query.clone());
            if self.fail.get() {
                return Err(ClientError::Rejected { status: 404, body: "file not found".into() });
            }
            let b = |dash| DiffBox { rect: [0.1, 0.1, 0.5, 0.2], dash_count: Some(dash), improved: false, text: None };
            Ok(TextDiff { left: vec![b(0.0)], right: vec![b(5.0), b(0.0)] })
        }
    }

    fn comparator(left_pages: u32, right_pages: u32) -> DualPageComparator {
        DualPageComparator::new(
            Box::new(FakeDoc { name: "left.pdf", pages: left_pages }),
            Box::new(FakeDoc { name: "right.pdf", pages: right_pages }),
        )
    }

    #[test]
    fn page_requests_are_clamped() {
        let diffs = FakeDiffs::new();
        let mut cmp = comparator(2, 5);
        assert_eq!(cmp.state().page_count, 5);

        cmp.go_to(0, &diffs);
        assert_eq!(cmp.state().page, 1);
        cmp.go_to(99, &diffs);
        assert_eq!(cmp.state().page, 5);
        cmp.apply(ViewerAction::NextPage, &diffs);
        assert_eq!(cmp.state().page, 5);
        cmp.go_to(1, &diffs);
        cmp.apply(ViewerAction::PrevPage, &diffs);
        assert_eq!(cmp.state().page, 1);
        // overlay is off: nothing fetched
        assert_eq!(diffs.calls.get(), 0);
    }

    #[test]
    fn empty_documents_still_have_one_page() {
        let cmp = comparator(0, 0);
        assert_eq!(cmp.state().page_count, 1);
        assert_eq!(cmp.state().clamp_page(7), 1);
    }

    #[test]
    fn shorter_document_pane_is_cleared() {
        let diffs = FakeDiffs::new();
        let mut cmp = comparator(1, 3);
        cmp.go_to(2, &diffs);
        assert_eq!(cmp.pane(Side::Left).content, PaneContent::Cleared);
        assert_eq!(cmp.pane(Side::Right).content, PaneContent::Page(PageSize { width: 100.0, height: 200.0 }));
    }

    #[test]
    fn overlay_toggle_fetches_and_clears() {
        let diffs = FakeDiffs::new();
        let mut cmp = comparator(3, 3);

        cmp.toggle_overlay(&diffs);
        assert_eq!(diffs.calls.get(), 1);
        assert_eq!(
            diffs.queries.borrow()[0],
            DiffQuery { left: "left.pdf".into(), right: "right.pdf".into(), page: 1 }
        );
        assert_eq!(cmp.pane(Side::Left).boxes.len(), 1);
        assert_eq!(cmp.pane(Side::Right).boxes.len(), 2);
        let hot = cmp.pane(Side::Right).boxes[0].color;
        assert_eq!((hot.r, hot.g, hot.b), (211, 47, 47));

        cmp.apply(ViewerAction::NextPage, &diffs);
        assert_eq!(diffs.calls.get(), 2);
        assert_eq!(diffs.queries.borrow()[1].page, 2);

        cmp.toggle_overlay(&diffs);
        assert!(cmp.pane(Side::Left).boxes.is_empty());
        assert!(cmp.pane(Side::Right).boxes.is_empty());
        assert_eq!(diffs.calls.get(), 2);
    }

    #[test]
    fn hiding_left_refetches_and_drops_left_boxes() {
        let diffs = FakeDiffs::new();
        let mut cmp = comparator(1, 1);
        cmp.toggle_overlay(&diffs);
        cmp.apply(ViewerAction::ToggleLeft, &diffs);

        assert_eq!(diffs.calls.get(), 2);
        assert!(!cmp.state().show_left);
        assert!(cmp.pane(Side::Left).boxes.is_empty());
        assert_eq!(cmp.pane(Side::Right).boxes.len(), 2);
    }

    #[test]
    fn opacity_is_clamped_and_applied() {
        let diffs = FakeDiffs::new();
        let mut cmp = comparator(1, 1);
        cmp.toggle_overlay(&diffs);
        cmp.set_opacity(-1.0, &diffs);
        assert_eq!(cmp.state().opacity, 0.0);
        assert!(cmp.pane(Side::Right).boxes.iter().all(|b| b.color.a == 0.0));
    }

    #[test]
    fn zoom_rescales_pages_and_boxes_without_refetch() {
        let diffs = FakeDiffs::new();
        let mut cmp = comparator(1, 1);
        cmp.toggle_overlay(&diffs);
        cmp.apply(ViewerAction::ZoomIn, &diffs);

        assert_eq!(cmp.state().scale, 1.25);
        assert_eq!(cmp.pane(Side::Left).content, PaneContent::Page(PageSize { width: 125.0, height: 250.0 }));
        // x0 = 0.1 * 125
        assert_eq!(cmp.pane(Side::Left).boxes[0].rect.left, 13);
        assert_eq!(diffs.calls.get(), 1);

        cmp.set_scale(100.0);
        assert_eq!(cmp.state().scale, MAX_SCALE);
    }

    #[test]
    fn failed_refresh_keeps_previous_boxes() {
        let diffs = FakeDiffs::new();
        let mut cmp = comparator(1, 1);
        cmp.toggle_overlay(&diffs);
        diffs.fail.set(true);
        cmp.set_opacity(0.5, &diffs);

        assert_eq!(cmp.pane(Side::Right).boxes.len(), 2);
        assert_eq!(cmp.last_error(), Some("Text diff failed: file not found"));
    }

    #[test]
    fn opacity_steps_reach_exact_bounds() {
        let diffs = FakeDiffs::new();
        let mut cmp = comparator(1, 1);
        cmp.toggle_overlay(&diffs);

        for _ in 0..10 {
            cmp.apply(ViewerAction::OpacityDown, &diffs);
        }
        assert_eq!(cmp.state().opacity, 0.0);
        assert!(cmp.pane(Side::Left).boxes.iter().all(|b| b.color.a == 0.0));
        assert!(cmp.pane(Side::Right).boxes.iter().all(|b| b.color.a == 0.0));

        for _ in 0..10 {
            cmp.apply(ViewerAction::OpacityUp, &diffs);
        }
        assert_eq!(cmp.state().opacity, 1.0);
        assert!(cmp.pane(Side::Right).boxes.iter().all(|b| b.color.a > 0.99));
    }

    #[test]
    fn failed_page_change_drops_previous_page_boxes() {
        let diffs = FakeDiffs::new();
        let mut cmp = comparator(2, 2);
        cmp.toggle_overlay(&diffs);
        assert_eq!(cmp.pane(Side::Right).boxes.len(), 2);

        diffs.fail.set(true);
        cmp.apply(ViewerAction::NextPage, &diffs);
        assert_eq!(cmp.state().page, 2);
        assert!(cmp.pane(Side::Left).boxes.is_empty());
        assert!(cmp.pane(Side::Right).boxes.is_empty());
        assert!(cmp.last_error().is_some());

        // zooming afterwards has nothing stale to re-lay out
        cmp.apply(ViewerAction::ZoomIn, &diffs);
        assert!(cmp.pane(Side::Right).boxes.is_empty());
    }
}
