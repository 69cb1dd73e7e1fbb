//! Command structs for engine write operations.
//!
//! These types group the parameters of user and expense creation, keeping
//! call sites readable and avoiding long argument lists.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{ParticipantInput, SplitMethod};

/// Register a user in the participant directory.
#[derive(Clone, Debug)]
pub struct NewUserCmd {
    pub email: String,
    pub name: String,
    pub mobile_number: String,
}

impl NewUserCmd {
    #[must_use]
    pub fn new(
        email: impl Into<String>,
        name: impl Into<String>,
        mobile_number: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            mobile_number: mobile_number.into(),
        }
    }
}

/// Record an expense and allocate it among its participants.
#[derive(Clone, Debug)]
pub struct NewExpenseCmd {
    pub description: String,
    pub total_amount: Decimal,
    pub split_method: SplitMethod,
    pub shares: Vec<ParticipantInput>,
}

impl NewExpenseCmd {
    #[must_use]
    pub fn new(
        description: impl Into<String>,
        total_amount: Decimal,
        split_method: SplitMethod,
    ) -> Self {
        Self {
            description: description.into(),
            total_amount,
            split_method,
            shares: Vec::new(),
        }
    }

    /// Adds a participant to an equal split.
    #[must_use]
    pub fn participant(mut self, user_id: Uuid) -> Self {
        self.shares.push(ParticipantInput::new(user_id));
        self
    }

    /// Adds a participant owing `percentage` of the total.
    #[must_use]
    pub fn participant_percentage(mut self, user_id: Uuid, percentage: Decimal) -> Self {
        self.shares
            .push(ParticipantInput::new(user_id).percentage(percentage));
        self
    }

    /// Adds a participant owing exactly `amount`.
    #[must_use]
    pub fn participant_amount(mut self, user_id: Uuid, amount: Decimal) -> Self {
        self.shares.push(ParticipantInput::new(user_id).amount(amount));
        self
    }

    #[must_use]
    pub fn shares(mut self, shares: Vec<ParticipantInput>) -> Self {
        self.shares = shares;
        self
    }
}
