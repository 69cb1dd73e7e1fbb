use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserNew {
        pub email: String,
        pub name: String,
        pub mobile_number: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct User {
        pub id: Uuid,
        pub email: String,
        pub name: String,
        pub mobile_number: String,
    }
}

pub mod expense {
    use super::*;

    /// One participant of a new expense.
    ///
    /// Which of `amount` and `percentage` is required depends on the split
    /// method: neither for `equal`, `percentage` for `percentage`, `amount`
    /// for `exact`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ShareInput {
        pub user: Uuid,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub amount: Option<Decimal>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub percentage: Option<Decimal>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub description: String,
        /// Major units, at most two decimals.
        pub total_amount: Decimal,
        /// `equal`, `percentage` or `exact`.
        pub split_method: String,
        #[serde(default)]
        pub shares: Vec<ShareInput>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ShareView {
        pub user: Uuid,
        pub amount: Decimal,
        pub percentage: Decimal,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseView {
        pub id: Uuid,
        pub description: String,
        pub total_amount: Decimal,
        pub split_method: String,
        pub date: NaiveDate,
        pub shares: Vec<ShareView>,
    }

    /// A user's share of one expense.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserShareView {
        pub expense_id: Uuid,
        pub description: String,
        pub split_method: String,
        pub date: NaiveDate,
        pub amount: Decimal,
        pub percentage: Decimal,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserExpenses {
        pub user: Uuid,
        pub shares: Vec<UserShareView>,
        pub total_amount: Decimal,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OverallExpenses {
        pub expenses: Vec<ExpenseView>,
        pub total_amount: Decimal,
    }
}
