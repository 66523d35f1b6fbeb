//! Optional attribute filters supplied on tile and stats requests.

/// Normalized category/subcategory filters.
///
/// Values come straight from the query string and are untrusted. They are
/// kept verbatim; the only normalization is that an empty or whitespace-only
/// value means "no filter on this attribute".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FilterSet {
    category: Option<String>,
    subcategory: Option<String>,
}

impl FilterSet {
    pub fn new(category: Option<String>, subcategory: Option<String>) -> Self {
        Self {
            category: normalize(category),
            subcategory: normalize(subcategory),
        }
    }

    /// A filter set that matches every feature.
    pub fn unfiltered() -> Self {
        Self::default()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn subcategory(&self) -> Option<&str> {
        self.subcategory.as_deref()
    }

    /// True when neither attribute is filtered.
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.subcategory.is_none()
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
