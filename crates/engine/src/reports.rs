//! Read-only projections over recorded expenses.
//!
//! Nothing here recomputes amounts or percentages: the values are the ones
//! stored at allocation time.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{Money, SplitMethod};

/// One share seen from the participant's side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserShare {
    pub expense_id: Uuid,
    pub description: String,
    pub split_method: SplitMethod,
    pub date: NaiveDate,
    pub amount: Money,
    pub percentage: Decimal,
}

/// A line of the per-user section of the balance sheet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BalanceSheetRow {
    pub user_name: String,
    pub description: String,
    pub total_amount: Money,
    pub split_method: SplitMethod,
    pub date: NaiveDate,
    pub share_amount: Money,
    pub share_percentage: Decimal,
}

/// A line of the overall section of the balance sheet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpenseSummary {
    pub description: String,
    pub total_amount: Money,
    pub split_method: SplitMethod,
    pub date: NaiveDate,
}

/// Everything owed, grouped by user, plus the list of all expenses.
///
/// `individual` holds one group per user, users ordered by name (users without
/// shares have an empty group). `overall` is ordered by creation time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BalanceSheet {
    pub individual: Vec<Vec<BalanceSheetRow>>,
    pub overall: Vec<ExpenseSummary>,
}
