//! Input sanitization
//!
//! Runs before any write touches a file. Two classes of rejection:
//! - `ReservedCharacter`: `|` or `_` inside an item would be misread as a
//!   list separator or padding when the field is decoded.
//! - `UnsafeInput`: markup characters in values, path characters in names.

use crate::codec::Value;
use crate::error::{CoreError, Result};

/// Characters that are part of the record format
pub const RESERVED_CHARS: [char; 2] = ['|', '_'];

/// Rejected anywhere in a stored value
const UNSAFE_VALUE_CHARS: &[char] = &['<', '>', '\0'];

/// Rejected in column names, which become file names
const UNSAFE_NAME_CHARS: &[char] = &['<', '>', '\0', '/', '\\', ':', '*', '?', '"'];

/// Reject a search phrase carrying a format character
pub fn check_phrase(phrase: &str) -> Result<()> {
    if phrase.contains(RESERVED_CHARS) {
        return Err(CoreError::ReservedCharacter(phrase.to_string()));
    }
    Ok(())
}

/// Check a single scalar item destined for a value field
pub fn check_item(item: &str) -> Result<()> {
    check_phrase(item)?;
    if item.contains(UNSAFE_VALUE_CHARS) {
        return Err(CoreError::UnsafeInput(item.to_string()));
    }
    Ok(())
}

/// Check every item of a value
pub fn check_value(value: &Value) -> Result<()> {
    value.items().into_iter().try_for_each(check_item)
}

/// Check a column name before it is used as a file name
pub fn check_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed != name
        || name.starts_with('.')
        || name.contains(UNSAFE_NAME_CHARS)
        || name.chars().any(char::is_control)
    {
        return Err(CoreError::UnsafeInput(name.to_string()));
    }
    Ok(())
}
