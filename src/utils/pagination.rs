use crate::repository::Error;
use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json, RequestPartsExt,
};
use base64::engine::general_purpose::URL_SAFE_NO_PAD as BASE64_URL_SAFE;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{fmt, str::FromStr};

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(Error::InvalidArgument(format!(
                "sort must be `asc` or `desc`, got `{}`",
                other
            ))),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated page request.
///
/// The fields are private so a `PageRequest` can only come out of
/// [`PageRequest::new`]; storage code never sees unchecked input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRequest {
    limit: u32,
    offset: i64,
    orderby: &'static str,
    sort: SortOrder,
}

impl PageRequest {
    /// Validates raw listing arguments against the sortable fields of a resource.
    pub fn new(
        limit: i64,
        offset: i64,
        orderby: &str,
        sort: &str,
        sortable_fields: &'static [&'static str],
    ) -> Result<Self, Error> {
        if limit <= 0 {
            return Err(Error::InvalidArgument(format!(
                "limit must be a positive integer, got {}",
                limit
            )));
        }

        if limit > MAX_LIMIT {
            return Err(Error::InvalidArgument(format!(
                "limit must not exceed {}, got {}",
                MAX_LIMIT, limit
            )));
        }

        if offset < 0 {
            return Err(Error::InvalidArgument(format!(
                "offset must not be negative, got {}",
                offset
            )));
        }

        let orderby = sortable_fields
            .iter()
            .copied()
            .find(|field| *field == orderby)
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "cannot order by `{}`, expected one of: {}",
                    orderby,
                    sortable_fields.join(", ")
                ))
            })?;

        Ok(Self {
            limit: limit as u32,
            offset,
            orderby,
            sort: sort.parse()?,
        })
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn orderby(&self) -> &'static str {
        self.orderby
    }

    pub fn sort(&self) -> SortOrder {
        self.sort
    }

    /// Rows to ask storage for: one past the page so the last page is
    /// detectable without a count query.
    pub fn fetch_limit(&self) -> u32 {
        self.limit + 1
    }

    fn next(&self) -> ContinuationToken {
        ContinuationToken {
            offset: self.offset.saturating_add(self.limit as i64),
            orderby: self.orderby.to_string(),
            sort: self.sort,
        }
    }
}

/// Opaque marker for the page after the current one. Encodes the next offset
/// together with the ordering it is only valid under.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ContinuationToken {
    pub offset: i64,
    pub orderby: String,
    pub sort: SortOrder,
}

impl ContinuationToken {
    pub fn encode(&self) -> String {
        BASE64_URL_SAFE.encode(json!(self).to_string())
    }

    pub fn decode(token: &str) -> Result<Self, Error> {
        let invalid = || Error::InvalidArgument(String::from("malformed continuation token"));

        let raw = BASE64_URL_SAFE.decode(token).map_err(|_| invalid())?;
        serde_json::from_slice::<Self>(&raw).map_err(|_| invalid())
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Page<T> {
    pub records: Vec<T>,
    pub continuation_token: String,
}

impl<T> Page<T> {
    /// Builds a page from up to [`PageRequest::fetch_limit`] rows. The extra
    /// row, when present, is dropped and turned into a continuation token.
    pub fn from_overfetch(mut records: Vec<T>, request: &PageRequest) -> Self {
        let limit = request.limit() as usize;

        let continuation_token = if records.len() > limit {
            records.truncate(limit);
            request.next().encode()
        } else {
            String::new()
        };

        Self {
            records,
            continuation_token,
        }
    }

    pub fn is_last(&self) -> bool {
        self.continuation_token.is_empty()
    }
}

/// Pagination options as they arrive on the query string.
#[derive(Deserialize, Clone, Debug)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    pub orderby: Option<String>,
    pub sort: Option<String>,
    pub token: Option<String>,
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
            orderby: None,
            sort: None,
            token: None,
        }
    }
}

impl Pagination {
    /// Resolves the query into a validated request. A continuation token, when
    /// given, takes the place of `offset` and must agree with any explicit
    /// ordering on the same request.
    pub fn into_request(
        self,
        sortable_fields: &'static [&'static str],
        default_orderby: &'static str,
    ) -> Result<PageRequest, Error> {
        let token = match self.token.as_deref().filter(|token| !token.is_empty()) {
            Some(token) => ContinuationToken::decode(token)?,
            None => {
                return PageRequest::new(
                    self.limit,
                    self.offset,
                    self.orderby.as_deref().unwrap_or(default_orderby),
                    self.sort.as_deref().unwrap_or(SortOrder::Asc.as_str()),
                    sortable_fields,
                )
            }
        };

        if let Some(orderby) = &self.orderby {
            if *orderby != token.orderby {
                return Err(Error::InvalidArgument(String::from(
                    "continuation token was issued for a different orderby",
                )));
            }
        }

        if let Some(sort) = &self.sort {
            if sort.parse::<SortOrder>()? != token.sort {
                return Err(Error::InvalidArgument(String::from(
                    "continuation token was issued for a different sort",
                )));
            }
        }

        PageRequest::new(
            self.limit,
            token.offset,
            &token.orderby,
            token.sort.as_str(),
            sortable_fields,
        )
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Pagination {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extract::<Query<Pagination>>().await {
            Ok(Query(pagination)) => Ok(pagination),
            _ => Err((
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid pagination options"})),
            )
                .into_response()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELDS: &[&str] = &["id", "name", "created_at"];

    fn is_invalid(result: Result<PageRequest, Error>) -> bool {
        matches!(result, Err(Error::InvalidArgument(_)))
    }

    #[test]
    fn rejects_non_positive_limit() {
        assert!(is_invalid(PageRequest::new(0, 0, "name", "asc", FIELDS)));
        assert!(is_invalid(PageRequest::new(-3, 0, "name", "asc", FIELDS)));
    }

    #[test]
    fn rejects_limit_above_cap() {
        assert!(is_invalid(PageRequest::new(MAX_LIMIT + 1, 0, "name", "asc", FIELDS)));
        assert!(PageRequest::new(MAX_LIMIT, 0, "name", "asc", FIELDS).is_ok());
    }

    #[test]
    fn rejects_negative_offset() {
        assert!(is_invalid(PageRequest::new(10, -1, "name", "asc", FIELDS)));
    }

    #[test]
    fn accepts_offsets_past_u32() {
        let request = PageRequest::new(10, 5_000_000_000, "name", "asc", FIELDS).unwrap();
        assert_eq!(request.offset(), 5_000_000_000);

        let page = Page::from_overfetch(Vec::<u8>::new(), &request);
        assert!(page.is_last());
    }

    #[test]
    fn negative_token_offset_is_invalid() {
        let token = ContinuationToken {
            offset: -10,
            orderby: String::from("name"),
            sort: SortOrder::Asc,
        };
        let pagination = Pagination {
            token: Some(token.encode()),
            ..Pagination::default()
        };
        assert!(is_invalid(pagination.into_request(FIELDS, "id")));
    }

    #[test]
    fn rejects_unknown_orderby() {
        let err = PageRequest::new(10, 0, "salary", "asc", FIELDS).unwrap_err();
        assert!(err.to_string().contains("salary"));
    }

    #[test]
    fn sort_is_case_insensitive_but_restricted() {
        let request = PageRequest::new(10, 0, "name", "DESC", FIELDS).unwrap();
        assert_eq!(request.sort(), SortOrder::Desc);
        assert!(is_invalid(PageRequest::new(10, 0, "name", "random", FIELDS)));
    }

    #[test]
    fn overfetched_row_becomes_token() {
        let request = PageRequest::new(2, 4, "name", "asc", FIELDS).unwrap();

        let page = Page::from_overfetch(vec![1, 2, 3], &request);
        assert_eq!(page.records, vec![1, 2]);

        let token = ContinuationToken::decode(&page.continuation_token).unwrap();
        assert_eq!(token.offset, 6);
        assert_eq!(token.orderby, "name");
        assert_eq!(token.sort, SortOrder::Asc);

        let last = Page::from_overfetch(vec![1, 2], &request);
        assert!(last.is_last());
    }

    #[test]
    fn token_replaces_offset() {
        let token = ContinuationToken {
            offset: 20,
            orderby: String::from("name"),
            sort: SortOrder::Desc,
        };

        let request = Pagination {
            limit: 5,
            offset: 0,
            orderby: None,
            sort: None,
            token: Some(token.encode()),
        }
        .into_request(FIELDS, "id")
        .unwrap();

        assert_eq!(request.offset(), 20);
        assert_eq!(request.limit(), 5);
        assert_eq!(request.orderby(), "name");
        assert_eq!(request.sort(), SortOrder::Desc);
    }

    #[test]
    fn token_must_match_explicit_ordering() {
        let token = ContinuationToken {
            offset: 10,
            orderby: String::from("name"),
            sort: SortOrder::Asc,
        }
        .encode();

        let mismatched = Pagination {
            orderby: Some(String::from("created_at")),
            token: Some(token.clone()),
            ..Pagination::default()
        };
        assert!(is_invalid(mismatched.into_request(FIELDS, "id")));

        let reversed = Pagination {
            sort: Some(String::from("desc")),
            token: Some(token),
            ..Pagination::default()
        };
        assert!(is_invalid(reversed.into_request(FIELDS, "id")));
    }

    #[test]
    fn garbage_token_is_invalid_argument() {
        let pagination = Pagination {
            token: Some(String::from("not!a!token")),
            ..Pagination::default()
        };
        assert!(is_invalid(pagination.into_request(FIELDS, "id")));
    }

    #[test]
    fn defaults_fill_missing_ordering() {
        let request = Pagination::default().into_request(FIELDS, "id").unwrap();
        assert_eq!(request.limit(), DEFAULT_LIMIT as u32);
        assert_eq!(request.orderby(), "id");
        assert_eq!(request.sort(), SortOrder::Asc);
    }
}
