//! Sort parameter grammar: `"<field>.<direction>"`.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

use super::SearchMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    Title,
    Price,
    Rating,
    Stock,
    /// Only meaningful in semantic mode.
    Similarity,
}

impl SortField {
    /// Name used in the `sort` parameter.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CreatedAt => "createdAt",
            Self::Title => "title",
            Self::Price => "price",
            Self::Rating => "rating",
            Self::Stock => "stock",
            Self::Similarity => "similarity",
        }
    }

    /// SQL column or projected alias to order by.
    #[must_use]
    pub const fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::Title => "title",
            Self::Price => "price",
            Self::Rating => "rating",
            Self::Stock => "stock",
            Self::Similarity => "similarity",
        }
    }
}

impl FromStr for SortField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createdAt" => Ok(Self::CreatedAt),
            "title" => Ok(Self::Title),
            "price" => Ok(Self::Price),
            "rating" => Ok(Self::Rating),
            "stock" => Ok(Self::Stock),
            "similarity" => Ok(Self::Similarity),
            _ => Err(Error::InvalidArgument(format!("Unknown sort field: {s}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(Error::InvalidArgument(format!("Unknown sort direction: {s}"))),
        }
    }
}

/// A parsed sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    /// Browse mode default: highest rated first.
    pub const BROWSE_DEFAULT: Self = Self {
        field: SortField::Rating,
        direction: SortDirection::Desc,
    };

    /// Semantic mode default: most similar first.
    pub const SEMANTIC_DEFAULT: Self = Self {
        field: SortField::Similarity,
        direction: SortDirection::Desc,
    };

    /// Default sort for a mode.
    #[must_use]
    pub const fn default_for(mode: SearchMode) -> Self {
        match mode {
            SearchMode::Browse => Self::BROWSE_DEFAULT,
            SearchMode::Semantic => Self::SEMANTIC_DEFAULT,
        }
    }

    /// Resolve the `sort` parameter for a mode.
    ///
    /// Missing, malformed, or mode-inapplicable values (similarity while
    /// browsing) fall back to the mode default.
    #[must_use]
    pub fn resolve(raw: Option<&str>, mode: SearchMode) -> Self {
        let parsed = raw
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|s| match s.parse::<Self>() {
                Ok(spec) => Some(spec),
                Err(err) => {
                    tracing::debug!(sort = s, error = %err, "ignoring sort parameter");
                    None
                }
            });

        match parsed {
            Some(spec) if spec.field == SortField::Similarity && mode == SearchMode::Browse => {
                Self::default_for(mode)
            }
            Some(spec) => spec,
            None => Self::default_for(mode),
        }
    }
}

impl FromStr for SortSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, direction) = s
            .split_once('.')
            .ok_or_else(|| Error::InvalidArgument(format!("Sort must be <field>.<direction>: {s}")))?;
        Ok(Self {
            field: field.parse()?,
            direction: direction.parse()?,
        })
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.field.as_str(), self.direction.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let spec: SortSpec = "createdAt.asc".parse().unwrap();
        assert_eq!(spec.field, SortField::CreatedAt);
        assert_eq!(spec.direction, SortDirection::Asc);
        assert_eq!(spec.to_string(), "createdAt.asc");
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!("color.asc".parse::<SortSpec>().is_err());
        assert!("price.up".parse::<SortSpec>().is_err());
        assert!("price".parse::<SortSpec>().is_err());
        assert!("price.asc.x".parse::<SortSpec>().is_err());
    }

    #[test]
    fn test_resolve_falls_back_per_mode() {
        assert_eq!(SortSpec::resolve(None, SearchMode::Browse), SortSpec::BROWSE_DEFAULT);
        assert_eq!(SortSpec::resolve(Some("bogus"), SearchMode::Semantic), SortSpec::SEMANTIC_DEFAULT);
        assert_eq!(
            SortSpec::resolve(Some("similarity.asc"), SearchMode::Browse),
            SortSpec::BROWSE_DEFAULT
        );
        assert_eq!(
            SortSpec::resolve(Some("price.asc"), SearchMode::Semantic).field,
            SortField::Price
        );
    }
}
