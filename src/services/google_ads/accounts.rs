// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Discovery of the Google Ads accounts a user can access.

use super::GoogleAdsService;
use crate::error::AppError;
use crate::models::User;

impl GoogleAdsService {
    /// Link every accessible customer account to `user`.
    ///
    /// Existing (user, customer) pairs are left alone, so repeated logins
    /// never duplicate rows. A failed provider call is logged and treated as
    /// "nothing discovered". Returns the number of newly linked accounts.
    pub async fn discover_accounts(
        &self,
        user: &User,
        access_token: &str,
    ) -> Result<usize, AppError> {
        let resource_names = match self.client.list_accessible_customers(access_token).await {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(
                    user_id = %user.id,
                    error = %e,
                    "Failed to list accessible customers, skipping discovery"
                );
                return Ok(0);
            }
        };

        let mut inserted = 0;
        for resource_name in &resource_names {
            let Some(customer_id) = parse_customer_id(resource_name) else {
                tracing::warn!(
                    user_id = %user.id,
                    resource_name = %resource_name,
                    "Ignoring malformed customer resource name"
                );
                continue;
            };

            if self.db.add_account_if_absent(&user.id, customer_id).await? {
                inserted += 1;
            }
        }

        tracing::info!(
            user_id = %user.id,
            accessible = resource_names.len(),
            inserted,
            "Google Ads accounts discovered"
        );
        Ok(inserted)
    }
}

/// Extract `{id}` from a `customers/{id}` resource name.
pub fn parse_customer_id(resource_name: &str) -> Option<&str> {
    let id = resource_name.strip_prefix("customers/")?;
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(id)
}
