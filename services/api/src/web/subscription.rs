//! services/api/src/web/subscription.rs
//!
//! Plan subscriptions and monthly prompt quotas. Changing a plan updates the
//! subscription and the quota in one database transaction; that is the only
//! multi-row invariant in the system.

use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use askbot_core::credentials::UserClaims;
use askbot_core::domain::{Plan, PromptQuota, Subscription};

use crate::web::error::HttpError;
use crate::web::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SubscribeRequest {
    pub plan: Plan,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeResponse {
    pub subscription: Subscription,
    pub prompt_quota: PromptQuota,
}

fn next_period_end(now: DateTime<Utc>) -> DateTime<Utc> {
    now.checked_add_months(Months::new(1))
        .unwrap_or_else(|| now + Duration::days(30))
}

/// POST /subscription/subscribe - Switch the caller to a plan
pub async fn subscribe_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<UserClaims>,
    Json(req): Json<SubscribeRequest>,
) -> Result<Json<SubscribeResponse>, HttpError> {
    let period_end = next_period_end(Utc::now());
    let (subscription, prompt_quota) = state
        .db
        .update_plan_subscription(user.user_id, req.plan, period_end)
        .await?;
    Ok(Json(SubscribeResponse {
        subscription,
        prompt_quota,
    }))
}

/// GET /subscription/current - Fetch the caller's subscription
pub async fn current_subscription_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<UserClaims>,
) -> Result<Json<Subscription>, HttpError> {
    let subscription = state
        .db
        .get_subscription(user.user_id)
        .await?
        .ok_or_else(|| HttpError::not_found("No subscription found for this user"))?;
    Ok(Json(subscription))
}

/// POST /subscription/claim-free-prompts - Reset the quota once the reset
/// date has passed
pub async fn claim_free_prompts_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<UserClaims>,
) -> Result<Json<PromptQuota>, HttpError> {
    let now = Utc::now();

    // A lapsed subscription falls back to the free tier.
    let active_plan = state
        .db
        .get_subscription(user.user_id)
        .await?
        .filter(|s| s.current_period_end > now)
        .map(|s| s.plan)
        .unwrap_or(Plan::Free);

    let quota = state.db.get_prompt_quota(user.user_id).await?;
    match quota {
        None => {
            let created = state
                .db
                .reset_prompt_quota(
                    user.user_id,
                    active_plan.monthly_quota(),
                    next_period_end(now),
                )
                .await?;
            Ok(Json(created))
        }
        Some(quota) if quota.reset_date <= now => {
            let reset = state
                .db
                .reset_prompt_quota(
                    user.user_id,
                    active_plan.monthly_quota(),
                    next_period_end(now),
                )
                .await?;
            Ok(Json(reset))
        }
        Some(_) => Err(HttpError::bad_request(
            "Cannot claim prompts yet. Please wait until your next reset date.",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_end_is_one_month_out() {
        let now = Utc::now();
        let end = next_period_end(now);
        assert!(end > now);
        assert!(end - now <= Duration::days(31));
        assert!(end - now >= Duration::days(28));
    }
}
