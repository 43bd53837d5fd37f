//! View state of the gallery screen

use std::collections::HashSet;

use common::Image;
use uuid::Uuid;

use crate::filter::{CategoryFilter, GalleryFilter};

/// Presentation only, the visible set is the same in both modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Grid,
    List,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Grid => ViewMode::List,
            ViewMode::List => ViewMode::Grid,
        }
    }
}

/// Fetched images plus the local state layered over them.
///
/// The preview follows an image id rather than a position, so it survives
/// filter changes as long as the image stays visible.
#[derive(Debug, Clone, Default)]
pub struct Gallery {
    images: Vec<Image>,
    filter: GalleryFilter,
    view_mode: ViewMode,
    selection_mode: bool,
    selected: HashSet<Uuid>,
    preview: Option<Uuid>,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a freshly fetched list, dropping selection and preview entries
    /// that no longer exist
    pub fn replace_images(&mut self, images: Vec<Image>) {
        self.images = images;

        let known: HashSet<Uuid> = self.images.iter().map(|image| image.id).collect();
        self.selected.retain(|id| known.contains(id));
        if self.preview.is_some_and(|id| !known.contains(&id)) {
            self.preview = None;
        }
    }

    pub fn images(&self) -> &[Image] {
        &self.images
    }

    /// Images passing the current filter, in fetch order
    pub fn visible(&self) -> Vec<&Image> {
        self.filter.apply(&self.images)
    }

    pub fn filter(&self) -> &GalleryFilter {
        &self.filter
    }

    pub fn set_category(&mut self, category: CategoryFilter) {
        self.filter.category = category;
        self.sync_preview();
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.filter.query = query.into();
        self.sync_preview();
    }

    pub fn clear_filter(&mut self) {
        self.filter = GalleryFilter::default();
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn set_view_mode(&mut self, view_mode: ViewMode) {
        self.view_mode = view_mode;
    }

    pub fn toggle_view_mode(&mut self) {
        self.view_mode = self.view_mode.toggled();
    }

    pub fn selection_mode(&self) -> bool {
        self.selection_mode
    }

    /// Leaving selection mode clears the selection
    pub fn toggle_selection_mode(&mut self) {
        self.selection_mode = !self.selection_mode;
        if !self.selection_mode {
            self.selected.clear();
        }
    }

    /// Flip one image's selection; ignored outside selection mode or for
    /// unknown ids. Returns whether the image is now selected.
    pub fn toggle_selected(&mut self, id: Uuid) -> bool {
        if !self.selection_mode || !self.images.iter().any(|image| image.id == id) {
            return false;
        }

        if self.selected.remove(&id) {
            false
        } else {
            self.selected.insert(id)
        }
    }

    pub fn is_selected(&self, id: Uuid) -> bool {
        self.selected.contains(&id)
    }

    pub fn select_all_visible(&mut self) {
        if !self.selection_mode {
            return;
        }
        let ids: Vec<Uuid> = self.visible().iter().map(|image| image.id).collect();
        self.selected.extend(ids);
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Selected ids in fetch order
    pub fn selected_ids(&self) -> Vec<Uuid> {
        self.images
            .iter()
            .map(|image| image.id)
            .filter(|id| self.selected.contains(id))
            .collect()
    }

    /// Open the full-screen preview on a visible image
    pub fn open_preview(&mut self, id: Uuid) -> bool {
        let visible = self.visible().iter().any(|image| image.id == id);
        if visible {
            self.preview = Some(id);
        }
        visible
    }

    pub fn close_preview(&mut self) {
        self.preview = None;
    }

    pub fn preview(&self) -> Option<&Image> {
        let id = self.preview?;
        self.images.iter().find(|image| image.id == id)
    }

    /// Position of the previewed image within the visible list
    pub fn preview_index(&self) -> Option<usize> {
        let id = self.preview?;
        self.visible().iter().position(|image| image.id == id)
    }

    /// Step forward, wrapping from the last visible image to the first
    pub fn next_preview(&mut self) -> Option<&Image> {
        self.step_preview(1)
    }

    /// Step back, wrapping from the first visible image to the last
    pub fn previous_preview(&mut self) -> Option<&Image> {
        self.step_preview(-1)
    }

    fn step_preview(&mut self, step: isize) -> Option<&Image> {
        let index = self.preview_index()?;
        let visible = self.visible();
        let len = visible.len() as isize;
        let next = (index as isize + step).rem_euclid(len) as usize;
        let id = visible[next].id;

        self.preview = Some(id);
        self.preview()
    }

    /// A preview whose image got filtered out is closed
    fn sync_preview(&mut self) {
        if self.preview.is_some() && self.preview_index().is_none() {
            self.preview = None;
        }
    }
}
