// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod campaign;
pub mod user;

pub use campaign::Campaign;
pub use user::{GoogleAdsAccount, User};
