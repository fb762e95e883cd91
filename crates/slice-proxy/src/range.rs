use crate::error::ProxyError;

/// Half-open byte range `[start, end)`.
///
/// The wire form is inclusive on both ends (`"0-100"` names 101 bytes);
/// conversion between the two conventions happens only in this module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Parses the wire form `"<start>-<end>"`: exactly two dash-separated
    /// decimal tokens, quotes trimmed per token, `start <= end`.
    pub fn parse(wire: &str) -> Result<Self, ProxyError> {
        let mut tokens = wire.split('-');
        let (Some(first), Some(second), None) = (tokens.next(), tokens.next(), tokens.next())
        else {
            return Err(ProxyError::InvalidRange);
        };

        let start: u64 = first
            .trim_matches('"')
            .parse()
            .map_err(|_| ProxyError::InvalidRange)?;
        let last: u64 = second
            .trim_matches('"')
            .parse()
            .map_err(|_| ProxyError::InvalidRange)?;
        if start > last {
            return Err(ProxyError::InvalidRange);
        }
        let end = last.checked_add(1).ok_or(ProxyError::InvalidRange)?;

        Ok(Self { start, end })
    }

    /// Value for an origin `Range` header, back in inclusive wire form.
    pub fn header_value(&self) -> String {
        format!("bytes={}-{}", self.start, self.end - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_range() {
        assert_eq!(ByteRange::parse("0-100"), Ok(ByteRange { start: 0, end: 101 }));
        assert_eq!(ByteRange::parse("5-5"), Ok(ByteRange { start: 5, end: 6 }));
    }

    #[test]
    fn parses_quoted_range() {
        assert_eq!(
            ByteRange::parse("\"0-100\""),
            Ok(ByteRange { start: 0, end: 101 })
        );
    }

    #[test]
    fn rejects_malformed_ranges() {
        for wire in ["100-0", "100-", "-100", "-", "", "1-2-3", "a-b", "1.5-2"] {
            assert_eq!(ByteRange::parse(wire), Err(ProxyError::InvalidRange), "{wire:?}");
        }
    }

    #[test]
    fn rejects_overflowing_end() {
        let wire = format!("0-{}", u64::MAX);
        assert_eq!(ByteRange::parse(&wire), Err(ProxyError::InvalidRange));
    }

    #[test]
    fn renders_inclusive_header_value() {
        let range = ByteRange::parse("0-100").unwrap();
        assert_eq!(range.header_value(), "bytes=0-100");
    }
}
