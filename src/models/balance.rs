use serde::{Deserialize, Serialize};

// ==================================================================================================
// Models for GET v1/accounts/{number}/balances
// ==================================================================================================

/// Balance in a single currency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub currency: String,
    #[serde(default)]
    pub cash: f64,
    #[serde(default)]
    pub market_value: f64,
    #[serde(default)]
    pub total_equity: f64,
    #[serde(default)]
    pub buying_power: f64,
    #[serde(default)]
    pub maintenance_excess: f64,
    #[serde(default)]
    pub is_real_time: bool,
}

/// Current and start-of-day balances, per currency and combined
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BalancesResponse {
    pub per_currency_balances: Vec<Balance>,
    pub combined_balances: Vec<Balance>,
    pub sod_per_currency_balances: Vec<Balance>,
    pub sod_combined_balances: Vec<Balance>,
}
