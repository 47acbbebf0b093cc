pub use super::bot_admins::Entity as BotAdmins;
pub use super::operators::Entity as Operators;
pub use super::premium_users::Entity as PremiumUsers;
pub use super::product_keys::Entity as ProductKeys;
pub use super::products::Entity as Products;
pub use super::sessions::Entity as Sessions;
pub use super::trusted_sellers::Entity as TrustedSellers;
