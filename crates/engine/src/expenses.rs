//! Expense primitives.
//!
//! An [`Expense`] owns a non-empty, ordered list of [`Share`]s. The expense
//! and its shares are created together in one database transaction and
//! deleting the expense deletes its shares.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine, SplitMethod};

use super::shares::Share;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub description: String,
    pub total_minor: i64,
    pub split_method: SplitMethod,
    pub created_at: DateTime<Utc>,
    pub shares: Vec<Share>,
}

impl Expense {
    pub(crate) fn new(
        description: String,
        total: Money,
        split_method: SplitMethod,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if !total.is_positive() {
            return Err(EngineError::InvalidAmount(
                "total_amount must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            description,
            total_minor: total.minor(),
            split_method,
            created_at,
            shares: Vec::new(),
        })
    }

    #[must_use]
    pub fn total(&self) -> Money {
        Money::new(self.total_minor)
    }

    /// Creation date; set once when the expense is recorded.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.created_at.date_naive()
    }

    /// The share of `user_id`, if they take part in this expense.
    #[must_use]
    pub fn share_of(&self, user_id: Uuid) -> Option<&Share> {
        self.shares.iter().find(|share| share.user_id == user_id)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub description: String,
    pub total_minor: i64,
    pub split_method: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::shares::Entity")]
    Shares,
}

impl Related<super::shares::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shares.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Expense> for ActiveModel {
    fn from(expense: &Expense) -> Self {
        Self {
            id: ActiveValue::Set(expense.id.to_string()),
            description: ActiveValue::Set(expense.description.clone()),
            total_minor: ActiveValue::Set(expense.total_minor),
            split_method: ActiveValue::Set(expense.split_method.as_str().to_string()),
            created_at: ActiveValue::Set(expense.created_at),
        }
    }
}

impl TryFrom<Model> for Expense {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::InvalidId("invalid expense id".to_string()))?,
            description: model.description,
            total_minor: model.total_minor,
            split_method: SplitMethod::try_from(model.split_method.as_str())?,
            created_at: model.created_at,
            shares: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn rejects_non_positive_total() {
        let created_at = Utc.timestamp_opt(0, 0).unwrap();
        assert_eq!(
            Expense::new("Dinner".to_string(), Money::ZERO, SplitMethod::Equal, created_at),
            Err(EngineError::InvalidAmount(
                "total_amount must be > 0".to_string()
            ))
        );
    }

    #[test]
    fn date_comes_from_creation_time() {
        let created_at = Utc.with_ymd_and_hms(2024, 7, 27, 23, 59, 0).unwrap();
        let expense =
            Expense::new("Dinner".to_string(), Money::new(100), SplitMethod::Exact, created_at)
                .unwrap();
        assert_eq!(expense.date(), NaiveDate::from_ymd_opt(2024, 7, 27).unwrap());
        assert_eq!(expense.total(), Money::new(100));
        assert!(expense.shares.is_empty());
    }

    #[test]
    fn model_round_trip_keeps_split_method() {
        let created_at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let expense =
            Expense::new("Rent".to_string(), Money::new(5000), SplitMethod::Percentage, created_at)
                .unwrap();
        let model = Model {
            id: expense.id.to_string(),
            description: expense.description.clone(),
            total_minor: expense.total_minor,
            split_method: "percentage".to_string(),
            created_at,
        };
        assert_eq!(Expense::try_from(model).unwrap(), expense);
    }
}
