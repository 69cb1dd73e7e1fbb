//! Expense shares.
//!
//! A [`Share`] is one participant's portion of an
//! [`Expense`](crate::Expense), stored both as an amount and as the equivalent
//! percentage. Shares are written together with their expense and never
//! modified afterwards.

use std::str::FromStr;

use rust_decimal::Decimal;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, FinalizedShare, Money};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    pub id: Uuid,
    pub expense_id: Uuid,
    pub user_id: Uuid,
    pub amount_minor: i64,
    pub percentage: Decimal,
}

impl Share {
    pub(crate) fn from_allocation(expense_id: Uuid, allocated: &FinalizedShare) -> Self {
        Self {
            id: Uuid::new_v4(),
            expense_id,
            user_id: allocated.participant_id,
            amount_minor: allocated.amount.minor(),
            percentage: allocated.percentage,
        }
    }

    #[must_use]
    pub fn amount(&self) -> Money {
        Money::new(self.amount_minor)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expense_shares")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub expense_id: String,
    pub user_id: String,
    pub position: i32,
    pub amount_minor: i64,
    pub percentage: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::expenses::Entity",
        from = "Column::ExpenseId",
        to = "super::expenses::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Expenses,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// `position` keeps the input order of the allocation.
pub(crate) fn active_model(share: &Share, position: usize) -> ActiveModel {
    ActiveModel {
        id: ActiveValue::Set(share.id.to_string()),
        expense_id: ActiveValue::Set(share.expense_id.to_string()),
        user_id: ActiveValue::Set(share.user_id.to_string()),
        position: ActiveValue::Set(i32::try_from(position).unwrap_or(i32::MAX)),
        amount_minor: ActiveValue::Set(share.amount_minor),
        percentage: ActiveValue::Set(share.percentage.to_string()),
    }
}

impl TryFrom<Model> for Share {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::InvalidId("invalid share id".to_string()))?,
            expense_id: Uuid::parse_str(&model.expense_id)
                .map_err(|_| EngineError::InvalidId("invalid expense id".to_string()))?,
            user_id: Uuid::parse_str(&model.user_id)
                .map_err(|_| EngineError::InvalidId("invalid user id".to_string()))?,
            amount_minor: model.amount_minor,
            percentage: Decimal::from_str(&model.percentage).map_err(|_| {
                EngineError::InvalidAmount(format!("invalid percentage: {}", model.percentage))
            })?,
        })
    }
}
