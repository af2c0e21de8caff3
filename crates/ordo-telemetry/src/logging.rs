// Copyright 2025 eraflo
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

//! Logger initialisation for binaries and tests.

use env_logger::{Builder, Env};

/// Installs `env_logger` with `info` as the default filter.
///
/// `RUST_LOG` overrides the default. Returns `false` if a logger was already
/// installed, which makes the call safe to repeat.
pub fn init_logging() -> bool {
    init_logging_with("info")
}

/// Installs `env_logger` with `default_filter` used when `RUST_LOG` is unset.
pub fn init_logging_with(default_filter: &str) -> bool {
    Builder::from_env(Env::default().default_filter_or(default_filter))
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_harmless() {
        init_logging_with("debug");
        assert!(!init_logging(), "A logger is already installed");
        log::debug!("logging initialised");
    }
}
