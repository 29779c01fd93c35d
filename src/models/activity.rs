use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

// ==================================================================================================
// Models for GET v1/accounts/{number}/activities
// ==================================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ActivityType {
    Deposit,
    Dividend,
    Fee,
    Interest,
    Rebate,
    Trade,
    Withdrawal,
    Transfer,
    CorporateAction,
    #[default]
    #[serde(other)]
    Other,
}

/// A single account activity
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Activity {
    pub trade_date: Option<DateTime<FixedOffset>>,
    pub transaction_date: Option<DateTime<FixedOffset>>,
    pub settlement_date: Option<DateTime<FixedOffset>>,
    pub action: String,
    pub symbol: String,
    pub symbol_id: i64,
    pub description: String,
    pub currency: String,
    pub quantity: f64,
    pub price: f64,
    pub gross_amount: f64,
    pub commission: f64,
    pub net_amount: f64,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivitiesResponse {
    pub activities: Vec<Activity>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activities_deserialization() {
        let json = r#"{
            "activities": [
                {
                    "tradeDate": "2011-02-16T00:00:00.000000-05:00",
                    "transactionDate": "2011-02-16T00:00:00.000000-05:00",
                    "settlementDate": "2011-02-16T00:00:00.000000-05:00",
                    "action": "",
                    "symbol": "",
                    "symbolId": 0,
                    "description": "INT FR 02/04 THRU02/15@ 4 3/4%BAL  205,006   AVBAL  204,966",
                    "currency": "USD",
                    "quantity": 0,
                    "price": 0,
                    "grossAmount": 0,
                    "commission": 0,
                    "netAmount": -320.08,
                    "type": "Interest"
                },
                {
                    "description": "Unknown entry",
                    "netAmount": 1.5,
                    "type": "Margin call"
                }
            ]
        }"#;

        let response: ActivitiesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.activities.len(), 2);

        let interest = &response.activities[0];
        assert_eq!(interest.activity_type, ActivityType::Interest);
        assert_eq!(interest.net_amount, -320.08);
        assert_eq!(
            interest.trade_date.unwrap().to_rfc3339(),
            "2011-02-16T00:00:00-05:00"
        );

        let unknown = &response.activities[1];
        assert_eq!(unknown.activity_type, ActivityType::Other);
        assert_eq!(unknown.trade_date, None);
    }
}
