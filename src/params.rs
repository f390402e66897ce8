//! Query and path parameter parsing.
//!
//! Handlers take raw `HashMap<String, String>` queries so every bad value
//! becomes an [`ApiError::Validation`] with the field name attached.

use std::collections::HashMap;
use std::str::FromStr;

use crate::error::ApiError;
use crate::pagination::{PageParams, DEFAULT_LIMIT, MAX_LIMIT};

pub type RawQuery = HashMap<String, String>;

/// Non-empty string parameter. Empty values are treated as absent.
pub fn optional_str<'a>(query: &'a RawQuery, field: &str) -> Option<&'a str> {
    query
        .get(field)
        .map(|v| v.as_str())
        .filter(|v| !v.is_empty())
}

fn parse_int<T: FromStr>(location: &'static str, field: &str, raw: &str) -> Result<T, ApiError> {
    raw.trim().parse().map_err(|_| {
        ApiError::invalid(
            location,
            field,
            "int_parsing",
            "Input should be a valid integer",
        )
    })
}

/// Optional integer parameter. A present but empty value is a parse error.
pub fn optional_int<T: FromStr>(query: &RawQuery, field: &str) -> Result<Option<T>, ApiError> {
    query
        .get(field)
        .map(|raw| parse_int("query", field, raw))
        .transpose()
}

/// Required integer parameter
pub fn required_int<T: FromStr>(query: &RawQuery, field: &str) -> Result<T, ApiError> {
    optional_int(query, field)?.ok_or_else(|| ApiError::missing(field))
}

/// Integer id taken from the URL path
pub fn path_id(field: &str, raw: &str) -> Result<i64, ApiError> {
    parse_int("path", field, raw)
}

/// `limit` (1..=1000, default 100) and `offset` (>= 0, default 0)
pub fn page_params(query: &RawQuery) -> Result<PageParams, ApiError> {
    let limit: i64 = optional_int(query, "limit")?.unwrap_or(i64::from(DEFAULT_LIMIT));
    let offset: i64 = optional_int(query, "offset")?.unwrap_or(0);

    if limit < 1 {
        return Err(ApiError::invalid(
            "query",
            "limit",
            "greater_than_equal",
            "Input should be greater than or equal to 1",
        ));
    }
    if limit > i64::from(MAX_LIMIT) {
        return Err(ApiError::invalid(
            "query",
            "limit",
            "less_than_equal",
            format!("Input should be less than or equal to {}", MAX_LIMIT),
        ));
    }
    let offset = u32::try_from(offset).map_err(|_| {
        ApiError::invalid(
            "query",
            "offset",
            "greater_than_equal",
            "Input should be greater than or equal to 0",
        )
    })?;

    Ok(PageParams {
        limit: limit as u32,
        offset,
    })
}
