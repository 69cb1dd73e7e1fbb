//! Expense API endpoints

use api_types::expense::{
    ExpenseNew, ExpenseView, OverallExpenses, ShareView, UserExpenses, UserShareView,
};
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use engine::{Expense, Money, NewExpenseCmd, ParticipantInput, SplitMethod, UserShare};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn expense_view(expense: Expense) -> ExpenseView {
    ExpenseView {
        id: expense.id,
        date: expense.date(),
        total_amount: expense.total().to_decimal(),
        split_method: expense.split_method.to_string(),
        description: expense.description,
        shares: expense
            .shares
            .into_iter()
            .map(|share| ShareView {
                user: share.user_id,
                amount: share.amount().to_decimal(),
                percentage: share.percentage.normalize(),
            })
            .collect(),
    }
}

fn user_share_view(share: UserShare) -> UserShareView {
    UserShareView {
        expense_id: share.expense_id,
        description: share.description,
        split_method: share.split_method.to_string(),
        date: share.date,
        amount: share.amount.to_decimal(),
        percentage: share.percentage.normalize(),
    }
}

/// Handle requests for recording a new expense
pub async fn expense_new(
    State(state): State<ServerState>,
    payload: Result<Json<ExpenseNew>, JsonRejection>,
) -> Result<(StatusCode, Json<ExpenseView>), ServerError> {
    let Json(payload) = payload?;
    let split_method = SplitMethod::try_from(payload.split_method.as_str())?;

    let shares = payload
        .shares
        .into_iter()
        .map(|share| ParticipantInput {
            participant_id: share.user,
            amount: share.amount,
            percentage: share.percentage,
        })
        .collect();
    let cmd = NewExpenseCmd::new(payload.description, payload.total_amount, split_method)
        .shares(shares);

    let expense = state.engine.new_expense(cmd).await?;
    Ok((StatusCode::CREATED, Json(expense_view(expense))))
}

pub async fn get(
    State(state): State<ServerState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ExpenseView>, ServerError> {
    let Path(id) = id?;
    let expense = state.engine.expense(id).await?;
    Ok(Json(expense_view(expense)))
}

pub async fn delete(
    State(state): State<ServerState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ServerError> {
    let Path(id) = id?;
    state.engine.delete_expense(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handle requests for the shares owed by one user
pub async fn for_user(
    State(state): State<ServerState>,
    user_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<UserExpenses>, ServerError> {
    let Path(user_id) = user_id?;
    let shares = state.engine.shares_for_user(user_id).await?;
    let total = Money::checked_sum(shares.iter().map(|share| share.amount))
        .ok_or_else(|| ServerError::Internal("user total overflow".to_string()))?;

    Ok(Json(UserExpenses {
        user: user_id,
        shares: shares.into_iter().map(user_share_view).collect(),
        total_amount: total.to_decimal(),
    }))
}

/// Handle requests for every expense and their aggregate total
pub async fn overall(State(state): State<ServerState>) -> Result<Json<OverallExpenses>, ServerError> {
    let expenses = state.engine.expenses().await?;
    let total = state.engine.total_expenses().await?;

    Ok(Json(OverallExpenses {
        expenses: expenses.into_iter().map(expense_view).collect(),
        total_amount: total.to_decimal(),
    }))
}
