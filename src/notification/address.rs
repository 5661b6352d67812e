//! Cheap syntactic pre-filter for recipient addresses.
//!
//! Not RFC 5322 validation. Exotic but legal addresses may be rejected.

/// Exactly one `@`, non-empty local part, a domain containing a `.`, and no
/// whitespace anywhere.
pub fn is_valid_address(address: &str) -> bool {
    if address.chars().any(char::is_whitespace) {
        return false;
    }

    let mut parts = address.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };

    !local.is_empty() && !domain.is_empty() && domain.contains('.')
}
