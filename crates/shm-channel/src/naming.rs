//! Translation of plain channel names into the host shared memory namespace.
//!
//! POSIX requires exactly one leading `/` and bounds the name length (31 bytes
//! on macOS, `NAME_MAX` elsewhere). Win32 file mapping names must not start
//! with `/`. Callers pass the same plain identifier on both sides and get the
//! same OS name back.

use crate::errors::ShmError;

#[cfg(target_os = "macos")]
pub const MAX_NAME_LEN: usize = 31;

#[cfg(all(unix, not(target_os = "macos")))]
pub const MAX_NAME_LEN: usize = 255;

#[cfg(windows)]
pub const MAX_NAME_LEN: usize = 255;

/// Normalize `name` for the current platform.
pub fn normalize(name: &str) -> Result<String, ShmError> {
    if name.contains('\0') {
        return Err(invalid(name, "name contains a NUL byte"));
    }

    let body = name.strip_prefix('/').unwrap_or(name);
    if body.is_empty() {
        return Err(invalid(name, "name is empty"));
    }

    Ok(platform_name(body))
}

#[cfg(unix)]
fn platform_name(body: &str) -> String {
    let mut normalized = String::with_capacity(body.len() + 1);
    normalized.push('/');
    normalized.push_str(body);
    truncate_on_char_boundary(&mut normalized, MAX_NAME_LEN);
    normalized
}

#[cfg(windows)]
fn platform_name(body: &str) -> String {
    let mut normalized = body.to_string();
    truncate_on_char_boundary(&mut normalized, MAX_NAME_LEN);
    normalized
}

fn truncate_on_char_boundary(name: &mut String, max_len: usize) {
    if name.len() <= max_len {
        return;
    }
    let mut end = max_len;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name.truncate(end);
}

fn invalid(name: &str, reason: &'static str) -> ShmError {
    ShmError::InvalidName {
        name: name.to_string(),
        reason,
    }
}
