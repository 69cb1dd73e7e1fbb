use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, Expense, Money, NewExpenseCmd, ResultEngine, Share, ValidationErrors, allocate,
    expenses, shares,
};

use super::{Engine, normalize_required_text, with_tx};

impl Engine {
    /// Records a new expense and its shares.
    ///
    /// The description, the split and the participants are validated and
    /// every problem is reported in a single [`EngineError::Validation`].
    /// The participant lookup and the writes of the expense and all of its
    /// shares share one database transaction: either all of them are stored
    /// or none is.
    pub async fn new_expense(&self, cmd: NewExpenseCmd) -> ResultEngine<Expense> {
        let created_at = Utc::now();
        let mut errors = ValidationErrors::new();

        let description = normalize_required_text(&cmd.description, "description", &mut errors);
        let allocated = match allocate(cmd.total_amount, cmd.split_method, &cmd.shares) {
            Ok(allocated) => Some(allocated),
            Err(allocation_errors) => {
                errors.merge(allocation_errors);
                None
            }
        };

        with_tx!(self, |db_tx| {
            self.check_participants_exist(&db_tx, &cmd.shares, &mut errors)
                .await?;
            let (description, allocated) = match (description, allocated) {
                (Some(description), Some(allocated)) if errors.is_empty() => {
                    (description, allocated)
                }
                _ => {
                    tracing::debug!(%errors, "expense rejected");
                    return Err(EngineError::Validation(errors));
                }
            };

            let total = Money::try_from(cmd.total_amount)?;
            let mut expense = Expense::new(description, total, cmd.split_method, created_at)?;
            expenses::ActiveModel::from(&expense).insert(&db_tx).await?;

            for (position, finalized) in allocated.iter().enumerate() {
                let share = Share::from_allocation(expense.id, finalized);
                shares::active_model(&share, position).insert(&db_tx).await?;
                expense.shares.push(share);
            }

            tracing::info!(
                expense_id = %expense.id,
                split_method = %expense.split_method,
                shares = expense.shares.len(),
                "expense recorded"
            );
            Ok(expense)
        })
    }

    /// Return an expense with its shares, in allocation order.
    pub async fn expense(&self, expense_id: Uuid) -> ResultEngine<Expense> {
        let model = expenses::Entity::find_by_id(expense_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("expense not exists".to_string()))?;

        let mut expense = Expense::try_from(model)?;
        expense.shares = shares::Entity::find()
            .filter(shares::Column::ExpenseId.eq(expense_id.to_string()))
            .order_by_asc(shares::Column::Position)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Share::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;
        Ok(expense)
    }

    /// Return every expense with its shares, oldest first.
    pub async fn expenses(&self) -> ResultEngine<Vec<Expense>> {
        self.load_expenses(&self.database).await
    }

    /// Deletes an expense together with all of its shares.
    pub async fn delete_expense(&self, expense_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let id = expense_id.to_string();
            let exists = expenses::Entity::find_by_id(id.clone())
                .one(&db_tx)
                .await?
                .is_some();
            if !exists {
                return Err(EngineError::KeyNotFound("expense not exists".to_string()));
            }

            shares::Entity::delete_many()
                .filter(shares::Column::ExpenseId.eq(id.clone()))
                .exec(&db_tx)
                .await?;
            expenses::Entity::delete_by_id(id).exec(&db_tx).await?;

            tracing::info!(%expense_id, "expense deleted");
            Ok(())
        })
    }

    pub(super) async fn load_expenses<C>(&self, db: &C) -> ResultEngine<Vec<Expense>>
    where
        C: ConnectionTrait,
    {
        let models = expenses::Entity::find()
            .order_by_asc(expenses::Column::CreatedAt)
            .order_by_asc(expenses::Column::Id)
            .all(db)
            .await?;

        let mut shares_by_expense: HashMap<Uuid, Vec<Share>> = HashMap::new();
        let share_models = shares::Entity::find()
            .order_by_asc(shares::Column::ExpenseId)
            .order_by_asc(shares::Column::Position)
            .all(db)
            .await?;
        for model in share_models {
            let share = Share::try_from(model)?;
            shares_by_expense
                .entry(share.expense_id)
                .or_default()
                .push(share);
        }

        models
            .into_iter()
            .map(|model| -> ResultEngine<Expense> {
                let mut expense = Expense::try_from(model)?;
                expense.shares = shares_by_expense.remove(&expense.id).unwrap_or_default();
                Ok(expense)
            })
            .collect()
    }
}
