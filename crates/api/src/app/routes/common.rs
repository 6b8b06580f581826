use core::str::FromStr;

use ledgerly_core::DomainError;

use crate::app::errors::ApiResult;

/// Parse an optional query filter (`?status=draft`), rejecting unknown values with 400.
pub fn parse_filter<T>(raw: Option<&str>) -> ApiResult<Option<T>>
where
    T: FromStr<Err = DomainError>,
{
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => Ok(Some(value.parse()?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerly_core::OrderStatus;

    #[test]
    fn blank_filters_are_ignored() {
        assert_eq!(parse_filter::<OrderStatus>(None).unwrap(), None);
        assert_eq!(parse_filter::<OrderStatus>(Some("  ")).unwrap(), None);
        assert_eq!(parse_filter::<OrderStatus>(Some("draft")).unwrap(), Some(OrderStatus::Draft));
        assert!(parse_filter::<OrderStatus>(Some("shipped")).is_err());
    }
}
