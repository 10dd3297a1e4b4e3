// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Default fuel level for a single entry point call (100 million instructions)
pub const DEFAULT_FUEL_LEVEL: u64 = 100_000_000;
/// Minimum allowed fuel level (1 million instructions)
pub const MIN_FUEL_LEVEL: u64 = 1_000_000;
/// Maximum allowed fuel level (500 million instructions) - security limit
pub const MAX_FUEL_LEVEL: u64 = 500_000_000;

/// Largest guest binary accepted from a bundle (16 MiB)
pub const DEFAULT_MAX_MODULE_SIZE_BYTES: usize = 16 * 1024 * 1024;

/// Desktop browser agent; catalog sites commonly reject unknown clients
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/88.0.4324.150 Safari/537.36 Edg/88.0.705.63";
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;
/// Upper bound on waiting for a challenge solver to finish
pub const DEFAULT_CHALLENGE_TIMEOUT_SECONDS: u64 = 12;
pub const DEFAULT_CHALLENGE_RETRY_DELAY_MS: u64 = 500;

/// A negative limit disables rate limiting
pub const DEFAULT_RATE_LIMIT: i32 = -1;
pub const DEFAULT_RATE_LIMIT_PERIOD_SECONDS: u64 = 60;
