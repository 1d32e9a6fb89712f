//! Offset pagination for list endpoints.
//!
//! List responses carry a `meta` object with `limit`, `offset`,
//! `total_count` and fully-qualified `next`/`previous` links. Links are
//! rebuilt from the request's raw query string so every other filter
//! parameter survives page turns with its original encoding.

use serde::Serialize;

use crate::problem::ProblemDetails;
use crate::state::ServiceConfig;

/// Parsed `limit`/`offset` parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub limit: usize,
    pub offset: usize,
}

impl PageParams {
    /// Parse pagination parameters from query key/value pairs.
    ///
    /// Missing values fall back to the configured default; a zero,
    /// non-numeric, or over-limit value is a client error.
    pub fn parse<'a, I>(
        params: I,
        config: &ServiceConfig,
        request_id: &str,
    ) -> Result<Self, Box<ProblemDetails>>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut limit = config.default_limit;
        let mut offset = 0usize;

        for (key, value) in params {
            match key {
                "limit" => {
                    limit = value.parse().map_err(|_| {
                        Box::new(ProblemDetails::invalid_filter(
                            format!("limit {:?} is not a whole number", value),
                            request_id,
                        ))
                    })?;
                }
                "offset" => {
                    offset = value.parse().map_err(|_| {
                        Box::new(ProblemDetails::invalid_filter(
                            format!("offset {:?} is not a whole number", value),
                            request_id,
                        ))
                    })?;
                }
                _ => {}
            }
        }

        if limit == 0 {
            return Err(Box::new(ProblemDetails::invalid_filter(
                "limit must be at least 1",
                request_id,
            )));
        }
        if limit > config.max_limit {
            return Err(Box::new(ProblemDetails::invalid_filter(
                format!("limit cannot exceed {}", config.max_limit),
                request_id,
            )));
        }

        Ok(Self { limit, offset })
    }
}

/// Pagination metadata emitted alongside `objects`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PageMeta {
    pub limit: usize,
    pub offset: usize,
    pub total_count: usize,
    pub next: Option<String>,
    pub previous: Option<String>,
}

/// Build pagination metadata with fully-qualified page links.
///
/// `raw_query` is the request's query string as received; its `limit` and
/// `offset` pairs are replaced, everything else is carried through verbatim.
pub fn build_meta(
    site_root: &str,
    path: &str,
    raw_query: Option<&str>,
    page: PageParams,
    total_count: usize,
) -> PageMeta {
    let carried: Vec<&str> = raw_query
        .unwrap_or("")
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| {
            let key = pair.split('=').next().unwrap_or(pair);
            key != "limit" && key != "offset"
        })
        .collect();

    let link = |offset: usize| {
        let mut query = carried.join("&");
        if !query.is_empty() {
            query.push('&');
        }
        format!(
            "{}{}?{}limit={}&offset={}",
            site_root, path, query, page.limit, offset
        )
    };

    let next = if page.offset + page.limit < total_count {
        Some(link(page.offset + page.limit))
    } else {
        None
    };
    let previous = if page.offset > 0 {
        Some(link(page.offset.saturating_sub(page.limit)))
    } else {
        None
    };

    PageMeta {
        limit: page.limit,
        offset: page.offset,
        total_count,
        next,
        previous,
    }
}
