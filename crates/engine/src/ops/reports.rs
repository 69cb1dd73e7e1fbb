use sea_orm::{QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    BalanceSheet, BalanceSheetRow, EngineError, Expense, ExpenseSummary, Money, ResultEngine,
    Share, User, UserShare, expenses, shares, users,
};

use super::{Engine, with_tx};

impl Engine {
    /// Return the shares owed by a user, oldest expense first.
    pub async fn shares_for_user(&self, user_id: Uuid) -> ResultEngine<Vec<UserShare>> {
        self.require_user(&self.database, user_id).await?;

        let rows: Vec<(shares::Model, Option<expenses::Model>)> = shares::Entity::find()
            .filter(shares::Column::UserId.eq(user_id.to_string()))
            .find_also_related(expenses::Entity)
            .order_by_asc(expenses::Column::CreatedAt)
            .order_by_asc(expenses::Column::Id)
            .all(&self.database)
            .await?;

        let mut out = Vec::with_capacity(rows.len());
        for (share_model, expense_model) in rows {
            let Some(expense_model) = expense_model else {
                continue;
            };
            let share = Share::try_from(share_model)?;
            let expense = Expense::try_from(expense_model)?;
            out.push(UserShare {
                expense_id: expense.id,
                date: expense.date(),
                description: expense.description,
                split_method: expense.split_method,
                amount: share.amount(),
                percentage: share.percentage,
            });
        }
        Ok(out)
    }

    /// Sum of the totals of every recorded expense.
    pub async fn total_expenses(&self) -> ResultEngine<Money> {
        let totals: Vec<i64> = expenses::Entity::find()
            .select_only()
            .column(expenses::Column::TotalMinor)
            .into_tuple()
            .all(&self.database)
            .await?;

        Money::checked_sum(totals.into_iter().map(Money::new))
            .ok_or_else(|| EngineError::InvalidAmount("total too large".to_string()))
    }

    /// Builds the balance sheet from one consistent read of users and
    /// expenses.
    pub async fn balance_sheet(&self) -> ResultEngine<BalanceSheet> {
        let (users, expenses) = with_tx!(self, |db_tx| {
            let users = users::Entity::find()
                .order_by_asc(users::Column::Name)
                .order_by_asc(users::Column::Email)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(User::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;
            let expenses = self.load_expenses(&db_tx).await?;
            Ok::<_, EngineError>((users, expenses))
        })?;

        Ok(build_balance_sheet(&users, &expenses))
    }
}

fn build_balance_sheet(users: &[User], expenses: &[Expense]) -> BalanceSheet {
    let individual = users
        .iter()
        .map(|user| {
            expenses
                .iter()
                .filter_map(|expense| {
                    expense.share_of(user.id).map(|share| BalanceSheetRow {
                        user_name: user.name.clone(),
                        description: expense.description.clone(),
                        total_amount: expense.total(),
                        split_method: expense.split_method,
                        date: expense.date(),
                        share_amount: share.amount(),
                        share_percentage: share.percentage,
                    })
                })
                .collect()
        })
        .collect();

    let overall = expenses
        .iter()
        .map(|expense| ExpenseSummary {
            description: expense.description.clone(),
            total_amount: expense.total(),
            split_method: expense.split_method,
            date: expense.date(),
        })
        .collect();

    BalanceSheet {
        individual,
        overall,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::SplitMethod;

    fn user(name: &str) -> User {
        User::new(format!("{name}@example.com"), name.to_string(), "123".to_string())
    }

    fn expense(description: &str, total: i64, shares: &[(&User, i64)]) -> Expense {
        let created_at = Utc.with_ymd_and_hms(2024, 7, 27, 12, 0, 0).unwrap();
        let mut expense = Expense::new(
            description.to_string(),
            Money::new(total),
            SplitMethod::Exact,
            created_at,
        )
        .unwrap();
        for (user, amount) in shares {
            expense.shares.push(Share {
                id: Uuid::new_v4(),
                expense_id: expense.id,
                user_id: user.id,
                amount_minor: *amount,
                percentage: Decimal::from(*amount) * dec!(100) / Decimal::from(total),
            });
        }
        expense
    }

    #[test]
    fn balance_sheet_groups_rows_by_user() {
        let alice = user("alice");
        let bob = user("bob");
        let carol = user("carol");
        let expenses = vec![
            expense("Dinner", 3000, &[(&alice, 1000), (&bob, 2000)]),
            expense("Taxi", 500, &[(&bob, 500)]),
        ];

        let sheet = build_balance_sheet(&[alice, bob, carol], &expenses);

        assert_eq!(sheet.individual.len(), 3);
        assert_eq!(sheet.individual[0].len(), 1);
        assert_eq!(sheet.individual[0][0].user_name, "alice");
        assert_eq!(sheet.individual[0][0].share_amount, Money::new(1000));
        assert_eq!(
            sheet.individual[1]
                .iter()
                .map(|row| row.description.as_str())
                .collect::<Vec<_>>(),
            vec!["Dinner", "Taxi"]
        );
        assert!(sheet.individual[2].is_empty());
        assert_eq!(sheet.overall.len(), 2);
        assert_eq!(
            sheet
                .overall
                .iter()
                .map(|expense| expense.total_amount)
                .collect::<Vec<_>>(),
            vec![Money::new(3000), Money::new(500)]
        );
    }
}
