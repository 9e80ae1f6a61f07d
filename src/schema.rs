//! Idempotent schema bootstrap for the `products` and `invoices` tables.

use sea_orm::sea_query::{ColumnDef, ForeignKey, ForeignKeyAction, Table, TableCreateStatement};
use sea_orm::{ConnectionTrait, DbErr, DeriveIden};
use tracing::debug;

#[derive(DeriveIden)]
enum Products {
    Table,
    Id,
    Name,
    Category,
    UnitPrice,
    State,
}

#[derive(DeriveIden)]
enum Invoices {
    Table,
    Id,
    ProductId,
    Quantity,
    InvoiceDate,
    CustomerState,
}

fn products_table() -> TableCreateStatement {
    Table::create()
        .table(Products::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(Products::Id)
                .integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(ColumnDef::new(Products::Name).string_len(100).not_null())
        .col(ColumnDef::new(Products::Category).string_len(50).null())
        .col(ColumnDef::new(Products::UnitPrice).decimal_len(10, 2).not_null())
        .col(ColumnDef::new(Products::State).string_len(50).not_null())
        .to_owned()
}

fn invoices_table() -> TableCreateStatement {
    Table::create()
        .table(Invoices::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(Invoices::Id)
                .integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(ColumnDef::new(Invoices::ProductId).integer().not_null())
        .col(ColumnDef::new(Invoices::Quantity).integer().not_null())
        .col(ColumnDef::new(Invoices::InvoiceDate).date().not_null())
        .col(ColumnDef::new(Invoices::CustomerState).string_len(50).not_null())
        .foreign_key(
            ForeignKey::create()
                .name("fk_invoices_product_id")
                .from(Invoices::Table, Invoices::ProductId)
                .to(Products::Table, Products::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .to_owned()
}

/// Creates both tables when absent. Safe to call before every request: an
/// existing schema is left untouched.
///
/// Products are created first so the invoice foreign key always has a target.
pub async fn ensure_schema<C>(db: &C) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    let backend = db.get_database_backend();
    for stmt in [products_table(), invoices_table()] {
        db.execute(backend.build(&stmt)).await?;
    }
    debug!("schema ready");
    Ok(())
}
