//! Shared expenses engine.
//!
//! The crate records expenses shared among users and allocates each expense
//! among its participants with one of the [`SplitMethod`]s. [`allocate`] is
//! the pure allocation and validation step; [`Engine`] persists users and
//! expenses in a sea-orm database and exposes the read-only projections.

pub use allocation::{
    FinalizedShare, PERCENT_EPSILON, PERCENT_SCALE, ParticipantInput, allocate,
};
pub use commands::{NewExpenseCmd, NewUserCmd};
pub use error::{EngineError, NON_FIELD_ERRORS, ValidationErrors};
pub use expenses::Expense;
pub use money::Money;
pub use ops::{Engine, EngineBuilder};
pub use reports::{BalanceSheet, BalanceSheetRow, ExpenseSummary, UserShare};
pub use shares::Share;
pub use split::SplitMethod;
pub use users::User;

mod allocation;
mod commands;
mod error;
mod expenses;
mod money;
mod ops;
mod reports;
mod shares;
mod split;
mod users;

type ResultEngine<T> = Result<T, EngineError>;
