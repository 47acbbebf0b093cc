use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Seeded root operator. The password must be rotated on first login;
/// tests rely on these values matching.
pub const DEFAULT_ROOT_USERNAME: &str = "root";
pub const DEFAULT_ROOT_PASSWORD: &str = "keydeck-change-me";

/// Hash the default root password using Argon2id
fn hash_default_password() -> String {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(DEFAULT_ROOT_PASSWORD.as_bytes(), &salt)
        .expect("Failed to hash default root password")
        .to_string()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        // Parents first so the FK constraints resolve
        manager
            .create_table(
                schema
                    .create_table_from_entity(Operators)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Sessions)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Products)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(ProductKeys)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(BotAdmins)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(PremiumUsers)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(TrustedSellers)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        let conn = manager.get_connection();

        // A key value may repeat across products but never within one
        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_product_keys_product_value ON product_keys(product_id, key_value)",
        )
        .await?;

        // Claim scans filter on (product_id, is_claimed)
        conn.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_product_keys_product_claimed ON product_keys(product_id, is_claimed)",
        )
        .await?;

        // Seed the root operator with a hashed password
        let now = chrono::Utc::now().to_rfc3339();
        let password_hash = hash_default_password();

        let insert = sea_orm_migration::sea_query::Query::insert()
            .into_table(Operators)
            .columns([
                crate::entities::operators::Column::Username,
                crate::entities::operators::Column::PasswordHash,
                crate::entities::operators::Column::Role,
                crate::entities::operators::Column::CreatedAt,
                crate::entities::operators::Column::UpdatedAt,
            ])
            .values_panic([
                DEFAULT_ROOT_USERNAME.into(),
                password_hash.into(),
                "root".into(),
                now.clone().into(),
                now.into(),
            ])
            .to_owned();

        manager.exec_stmt(insert).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TrustedSellers).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PremiumUsers).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BotAdmins).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProductKeys).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Products).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sessions).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Operators).to_owned())
            .await?;

        Ok(())
    }
}
