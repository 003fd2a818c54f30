//! Utility functions and helpers.

pub mod http;
#[cfg(test)]
pub(crate) mod test_server;

use url::Url;

use crate::error::Result;

/// Append path segments to a base URL, keeping any path the base already has.
pub fn join_path(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
