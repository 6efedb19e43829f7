//! # Paging and Sorting
//!
//! Request-side types for list queries. Validation happens here so the
//! storage layer only ever sees well-formed values.
//!
//! ## Sort Clauses
//! ```text
//! "price desc, title"  ──► [(Price, Desc), (Title, Asc)]
//! ""                   ──► [(Id, Asc)]
//! "colour"             ──► ValidationError::NotAllowed
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationErrors};

// =============================================================================
// Page Request
// =============================================================================

/// Largest page a list query may ask for.
///
/// With `page` bounded by `u32::MAX`, this keeps `offset()` well inside `i64`.
pub const MAX_PAGE_SIZE: u32 = 1_000;

/// A 1-based page number and a page size of 1 to [`MAX_PAGE_SIZE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: u32,
    size: u32,
}

impl PageRequest {
    /// Checks both bounds and reports each failure.
    pub fn new(page: i64, size: i64) -> Result<Self, ValidationErrors> {
        let mut errors = Vec::new();

        if page < 1 || page > i64::from(u32::MAX) {
            errors.push(ValidationError::OutOfRange {
                field: "page".to_string(),
                min: 1,
                max: i64::from(u32::MAX),
            });
        }
        if size < 1 || size > i64::from(MAX_PAGE_SIZE) {
            errors.push(ValidationError::OutOfRange {
                field: "size".to_string(),
                min: 1,
                max: i64::from(MAX_PAGE_SIZE),
            });
        }

        if !errors.is_empty() {
            return Err(ValidationErrors::new(errors));
        }

        Ok(PageRequest {
            page: page as u32,
            size: size as u32,
        })
    }

    #[inline]
    pub fn page(&self) -> u32 {
        self.page
    }

    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Rows to skip before this page.
    #[inline]
    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.size)
    }

    #[inline]
    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }

    /// Number of pages needed for `total_items` rows.
    pub fn total_pages(&self, total_items: i64) -> i64 {
        let size = i64::from(self.size);
        (total_items.max(0) + size - 1) / size
    }
}

// =============================================================================
// Product Sort
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Product fields a list can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductSortField {
    Id,
    Title,
    Price,
    Description,
    Category,
    Image,
    Rating,
}

impl ProductSortField {
    pub const ALL: [ProductSortField; 7] = [
        ProductSortField::Id,
        ProductSortField::Title,
        ProductSortField::Price,
        ProductSortField::Description,
        ProductSortField::Category,
        ProductSortField::Image,
        ProductSortField::Rating,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ProductSortField::Id => "id",
            ProductSortField::Title => "title",
            ProductSortField::Price => "price",
            ProductSortField::Description => "description",
            ProductSortField::Category => "category",
            ProductSortField::Image => "image",
            ProductSortField::Rating => "rating",
        }
    }

    /// Case-insensitive lookup by field name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for ProductSortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An ordered list of sort keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSort(Vec<(ProductSortField, SortDirection)>);

impl Default for ProductSort {
    fn default() -> Self {
        ProductSort(vec![(ProductSortField::Id, SortDirection::Asc)])
    }
}

impl ProductSort {
    /// Parses a clause like `"price desc, title"`.
    ///
    /// A missing or blank clause sorts by id. Each key is a field name
    /// optionally followed by `asc` or `desc`.
    pub fn parse(clause: Option<&str>) -> Result<Self, ValidationError> {
        let clause = match clause.map(str::trim) {
            Some(c) if !c.is_empty() => c,
            _ => return Ok(ProductSort::default()),
        };

        let mut keys = Vec::new();
        for part in clause.split(',') {
            let mut words = part.split_whitespace();
            let name = words.next().ok_or_else(|| ValidationError::InvalidFormat {
                field: "order".to_string(),
                reason: "empty sort key".to_string(),
            })?;

            let field = ProductSortField::from_name(name).ok_or_else(|| {
                ValidationError::NotAllowed {
                    field: "order".to_string(),
                    allowed: ProductSortField::ALL
                        .iter()
                        .map(|f| f.name().to_string())
                        .collect(),
                }
            })?;

            let direction = match words.next() {
                None => SortDirection::Asc,
                Some(d) if d.eq_ignore_ascii_case("asc") => SortDirection::Asc,
                Some(d) if d.eq_ignore_ascii_case("desc") => SortDirection::Desc,
                Some(d) => {
                    return Err(ValidationError::InvalidFormat {
                        field: "order".to_string(),
                        reason: format!("unknown direction '{}'", d),
                    })
                }
            };

            if words.next().is_some() {
                return Err(ValidationError::InvalidFormat {
                    field: "order".to_string(),
                    reason: format!("unexpected text in '{}'", part.trim()),
                });
            }

            keys.push((field, direction));
        }

        Ok(ProductSort(keys))
    }

    pub fn keys(&self) -> &[(ProductSortField, SortDirection)] {
        &self.0
    }
}
