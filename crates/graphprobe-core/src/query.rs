//! OData system query options.
//!
//! Graph takes projections as `$`-prefixed query options. Only the options the
//! directory client sends are modelled here.

/// Query options for a single Graph read.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ODataQuery {
    select: Option<String>,
}

impl ODataQuery {
    /// An empty query: the server applies its default property set.
    #[must_use]
    pub const fn new() -> Self {
        Self { select: None }
    }

    /// Restricts the response to `fields`. An empty list leaves the query
    /// unchanged.
    #[must_use]
    pub fn select(mut self, fields: &[&str]) -> Self {
        if !fields.is_empty() {
            self.select = Some(fields.join(","));
        }
        self
    }

    /// Returns the `$select` value, if any.
    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.select.as_deref()
    }

    /// True when no option is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.select.is_none()
    }

    /// Converts the options into URL query pairs.
    #[must_use]
    pub fn into_pairs(self) -> Vec<(&'static str, String)> {
        self.select
            .map(|fields| ("$select", fields))
            .into_iter()
            .collect()
    }
}
