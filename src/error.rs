// Copyright 2026 Radixtx Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error types for radixtx
//!
//! The tree itself is total: lookups on absent keys return `None` and
//! deletes of absent keys report no change. Errors cover the few API entry
//! points that can actually be misused.

use thiserror::Error;

/// Result type alias for radixtx operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for radixtx operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Bulk insert was given key and value slices of different lengths
    #[error("bulk insert length mismatch: {keys} keys, {values} values")]
    BulkLengthMismatch { keys: usize, values: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::BulkLengthMismatch { keys: 3, values: 2 };
        assert_eq!(
            err.to_string(),
            "bulk insert length mismatch: 3 keys, 2 values"
        );
    }
}
