use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product entity
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Store-assigned identity
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    /// One of the generator categories, or none for client-created rows
    pub category: Option<String>,

    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub unit_price: Decimal,

    /// Origin state
    pub state: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::invoice::Entity")]
    Invoices,
}

impl Related<super::invoice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
