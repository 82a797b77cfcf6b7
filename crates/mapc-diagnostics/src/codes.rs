// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Backend error codes.

/// Key types the hash-map runtime cannot compare.
pub const UNSUPPORTED_MAP_KEY: &str = "E0700";
/// Internal backend failure surfaced to the user.
pub const BACKEND_FAILURE: &str = "E0900";
