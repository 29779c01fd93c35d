// Questrade account endpoints
// Thin wrappers that decode responses from the authenticated client

use chrono::{DateTime, TimeZone};
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::http_client::QuestradeHttpClient;
use crate::models::{AccountsResponse, ActivitiesResponse, BalancesResponse};

/// List the accounts of the authenticated user
pub async fn get_accounts(client: &QuestradeHttpClient) -> Result<AccountsResponse, ApiError> {
    fetch_json(client, &["v1", "accounts"], &[], "accounts").await
}

/// Current and start-of-day balances for one account
pub async fn get_balances(
    client: &QuestradeHttpClient,
    account_number: &str,
) -> Result<BalancesResponse, ApiError> {
    fetch_json(
        client,
        &["v1", "accounts", account_number, "balances"],
        &[],
        "balances",
    )
    .await
}

/// Account activities between `start` and `end`
pub async fn get_activities<Tz: TimeZone>(
    client: &QuestradeHttpClient,
    account_number: &str,
    start: &DateTime<Tz>,
    end: &DateTime<Tz>,
) -> Result<ActivitiesResponse, ApiError>
where
    Tz::Offset: std::fmt::Display,
{
    fetch_json(
        client,
        &["v1", "accounts", account_number, "activities"],
        &activities_query(start, end),
        "activities",
    )
    .await
}

fn activities_query<Tz: TimeZone>(start: &DateTime<Tz>, end: &DateTime<Tz>) -> [(&'static str, String); 2]
where
    Tz::Offset: std::fmt::Display,
{
    [("startTime", query_time(start)), ("endTime", query_time(end))]
}

/// ISO 8601 with a numeric offset
fn query_time<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    time.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

async fn fetch_json<T: DeserializeOwned>(
    client: &QuestradeHttpClient,
    path: &[&str],
    query: &[(&str, String)],
    what: &'static str,
) -> Result<T, ApiError> {
    let response = client.get(path, query).await?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        let body = response.text().await.unwrap_or_default();
        tracing::error!(status = status.as_u16(), endpoint = what, body = %body, "Unexpected Questrade response");
        return Err(ApiError::UnexpectedStatus {
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|source| ApiError::Decode { what, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn test_activities_query_negative_offset() {
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        let start = tz.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = tz.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap();

        assert_eq!(
            activities_query(&start, &end),
            [
                ("startTime", "2024-01-01T00:00:00-05:00".to_string()),
                ("endTime", "2024-01-31T23:59:59-05:00".to_string()),
            ]
        );
    }

    #[test]
    fn test_activities_query_keeps_positive_offset_raw() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap();

        let [(_, start), (_, end)] = activities_query(&start, &end);
        assert_eq!(start, "2024-03-01T12:00:00+00:00");
        assert_eq!(end, "2024-03-02T12:00:00+00:00");
    }
}
