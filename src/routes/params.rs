use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;
        (page, per_page, offset)
    }
}

/// Catalog and user listings: optional name/username search.
///
/// Paging fields are inlined rather than `#[serde(flatten)]`-ed: flattening
/// makes serde buffer query values as strings, which then fail to
/// deserialize into the numeric fields.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub search: Option<String>,
}

impl SearchQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }

    /// Search text with `ILIKE` metacharacters escaped.
    pub fn search_term(&self) -> Option<String> {
        self.search.as_deref().map(escape_like)
    }
}

/// Title listing filters, all combinable.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TitleListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub category: Option<String>,
    pub genre: Option<String>,
    pub name: Option<String>,
    pub year: Option<i32>,
}

impl TitleListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }

    pub fn name_term(&self) -> Option<String> {
        self.name.as_deref().map(escape_like)
    }
}

/// Escape `%`/`_` (and the escape character itself) so user-supplied search
/// text matches literally inside an `ILIKE` pattern.
pub fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use axum::extract::Query;
    use axum::http::Uri;

    use super::*;

    #[test]
    fn pagination_defaults() {
        let p = Pagination {
            page: None,
            per_page: None,
        };
        assert_eq!(p.normalize(), (1, 20, 0));
    }

    #[test]
    fn pagination_clamps_out_of_range_values() {
        let p = Pagination {
            page: Some(0),
            per_page: Some(1000),
        };
        assert_eq!(p.normalize(), (1, 100, 0));

        let p = Pagination {
            page: Some(3),
            per_page: Some(10),
        };
        assert_eq!(p.normalize(), (3, 10, 20));
    }

    #[test]
    fn search_query_parses_paging_from_uri() {
        let uri: Uri = "/api/v1/categories?page=2&per_page=5&search=dr"
            .parse()
            .unwrap();
        let Query(query) = Query::<SearchQuery>::try_from_uri(&uri).unwrap();
        assert_eq!(query.page, Some(2));
        assert_eq!(query.per_page, Some(5));
        assert_eq!(query.search.as_deref(), Some("dr"));
        assert_eq!(query.pagination().normalize(), (2, 5, 5));
    }

    #[test]
    fn title_query_parses_filters_and_paging_from_uri() {
        let uri: Uri = "/api/v1/titles?category=drama&genre=noir&name=china&year=1974&page=2&per_page=10"
            .parse()
            .unwrap();
        let Query(query) = Query::<TitleListQuery>::try_from_uri(&uri).unwrap();
        assert_eq!(query.category.as_deref(), Some("drama"));
        assert_eq!(query.genre.as_deref(), Some("noir"));
        assert_eq!(query.name.as_deref(), Some("china"));
        assert_eq!(query.year, Some(1974));
        assert_eq!(query.pagination().normalize(), (2, 10, 10));
    }

    #[test]
    fn pagination_parses_directly_from_uri() {
        let uri: Uri = "/api/v1/titles/abc/reviews?page=4&per_page=25".parse().unwrap();
        let Query(p) = Query::<Pagination>::try_from_uri(&uri).unwrap();
        assert_eq!(p.normalize(), (4, 25, 75));
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("%"), "\\%");
        assert_eq!(escape_like("dr_ma"), "dr\\_ma");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }
}
