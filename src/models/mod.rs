// Data models for Questrade API responses

pub mod account;
pub mod activity;
pub mod balance;

pub use account::{Account, AccountsResponse};
pub use activity::{ActivitiesResponse, Activity, ActivityType};
pub use balance::{Balance, BalancesResponse};
