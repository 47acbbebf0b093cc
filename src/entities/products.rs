use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    pub description: Option<String>,

    pub is_active: bool,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product_keys::Entity")]
    ProductKeys,
}

impl Related<super::product_keys::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductKeys.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
