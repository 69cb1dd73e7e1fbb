//! Initial schema migration.
//!
//! - `users`: the participant directory
//! - `expenses`: one row per shared expense
//! - `expense_shares`: the allocated shares, owned by their expense

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Email,
    Name,
    MobileNumber,
}

#[derive(Iden)]
enum Expenses {
    Table,
    Id,
    Description,
    TotalMinor,
    SplitMethod,
    CreatedAt,
}

#[derive(Iden)]
enum ExpenseShares {
    Table,
    Id,
    ExpenseId,
    UserId,
    Position,
    AmountMinor,
    Percentage,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Users::Email).string().not_null())
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(ColumnDef::new(Users::MobileNumber).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-users-email-unique")
                    .table(Users::Table)
                    .col(Users::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Expenses
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Expenses::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Expenses::Description).string().not_null())
                    .col(
                        ColumnDef::new(Expenses::TotalMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Expenses::SplitMethod).string().not_null())
                    .col(ColumnDef::new(Expenses::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Expense shares
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(ExpenseShares::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExpenseShares::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ExpenseShares::ExpenseId).string().not_null())
                    .col(ColumnDef::new(ExpenseShares::UserId).string().not_null())
                    .col(ColumnDef::new(ExpenseShares::Position).integer().not_null())
                    .col(
                        ColumnDef::new(ExpenseShares::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ExpenseShares::Percentage).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expense_shares-expense_id")
                            .from(ExpenseShares::Table, ExpenseShares::ExpenseId)
                            .to(Expenses::Table, Expenses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expense_shares-user_id")
                            .from(ExpenseShares::Table, ExpenseShares::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expense_shares-expense_id-user_id-unique")
                    .table(ExpenseShares::Table)
                    .col(ExpenseShares::ExpenseId)
                    .col(ExpenseShares::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expense_shares-user_id")
                    .table(ExpenseShares::Table)
                    .col(ExpenseShares::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(ExpenseShares::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
