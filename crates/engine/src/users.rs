//! Users: the participant directory.
//!
//! The engine only references users by id from an expense share; it never
//! changes a user once created.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub mobile_number: String,
}

impl User {
    pub fn new(email: String, name: String, mobile_number: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            name,
            mobile_number,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub email: String,
    pub name: String,
    pub mobile_number: String,
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

impl From<&User> for ActiveModel {
    fn from(user: &User) -> Self {
        Self {
            id: ActiveValue::Set(user.id.to_string()),
            email: ActiveValue::Set(user.email.clone()),
            name: ActiveValue::Set(user.name.clone()),
            mobile_number: ActiveValue::Set(user.mobile_number.clone()),
        }
    }
}

impl TryFrom<Model> for User {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::InvalidId("invalid user id".to_string()))?,
            email: model.email,
            name: model.name,
            mobile_number: model.mobile_number,
        })
    }
}
