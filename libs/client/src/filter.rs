//! Category filter and free-text search over the fetched image list

use std::fmt;
use std::str::FromStr;

use common::{Category, Image};

/// Category picker value; `All` disables category filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    /// Picker entries in display order
    pub fn options() -> impl Iterator<Item = CategoryFilter> {
        std::iter::once(CategoryFilter::All)
            .chain(Category::ALL.into_iter().map(CategoryFilter::Only))
    }

    pub fn matches(&self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => *wanted == category,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str("all"),
            CategoryFilter::Only(category) => write!(f, "{}", category),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(CategoryFilter::All)
        } else {
            s.parse::<Category>().map(CategoryFilter::Only)
        }
    }
}

/// Category filter AND search query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GalleryFilter {
    pub category: CategoryFilter,
    pub query: String,
}

impl GalleryFilter {
    pub fn is_active(&self) -> bool {
        self.category != CategoryFilter::All || !self.query.trim().is_empty()
    }

    pub fn matches(&self, image: &Image) -> bool {
        self.category.matches(image.category) && self.matches_query(image)
    }

    /// Case-insensitive substring of the original filename or the category
    fn matches_query(&self, image: &Image) -> bool {
        let query = self.query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }

        image.original_name.to_lowercase().contains(&query)
            || image.category.as_str().contains(&query)
    }

    pub fn apply<'a>(&self, images: &'a [Image]) -> Vec<&'a Image> {
        images.iter().filter(|image| self.matches(image)).collect()
    }
}
