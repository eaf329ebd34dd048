// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Campaign aggregation across a user's linked accounts.

use super::GoogleAdsService;
use crate::models::{Campaign, User};
use futures_util::{stream, StreamExt};

const MAX_CONCURRENT_ACCOUNT_FETCHES: usize = 8;

impl GoogleAdsService {
    /// List the campaigns of every account linked to `user`.
    ///
    /// The access token is resolved once and shared by all account requests.
    /// Failures never reach the caller: a failed refresh yields an empty list,
    /// and a failed account is logged and left out of the result.
    pub async fn list_campaigns(&self, user: &User) -> Vec<Campaign> {
        let access_token = match self.ensure_valid_access_token(user).await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(
                    user_id = %user.id,
                    error = %e,
                    "No usable access token, returning no campaigns"
                );
                return Vec::new();
            }
        };

        let accounts = match self.db.list_accounts(&user.id).await {
            Ok(accounts) => accounts,
            Err(e) => {
                tracing::error!(user_id = %user.id, error = %e, "Failed to load linked accounts");
                return Vec::new();
            }
        };

        let access_token = access_token.as_str();
        let results = stream::iter(accounts)
            .map(|account| async move {
                let result = self
                    .client
                    .list_campaigns(access_token, &account.customer_id)
                    .await;
                (account.customer_id, result)
            })
            // `buffered` keeps request order in the output
            .buffered(MAX_CONCURRENT_ACCOUNT_FETCHES)
            .collect::<Vec<_>>()
            .await;

        let mut campaigns = Vec::new();
        for (customer_id, result) in results {
            match result {
                Ok(batch) => {
                    tracing::debug!(
                        user_id = %user.id,
                        customer_id = %customer_id,
                        count = batch.len(),
                        "Retrieved campaigns"
                    );
                    campaigns.extend(batch.into_iter().map(|mut campaign| {
                        campaign.customer_id = customer_id.clone();
                        campaign
                    }));
                }
                Err(e) => {
                    tracing::error!(
                        user_id = %user.id,
                        customer_id = %customer_id,
                        error = %e,
                        "Failed to retrieve campaigns, skipping account"
                    );
                }
            }
        }

        campaigns
    }
}
