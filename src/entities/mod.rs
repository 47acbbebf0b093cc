pub mod prelude;

pub mod bot_admins;
pub mod operators;
pub mod premium_users;
pub mod product_keys;
pub mod products;
pub mod sessions;
pub mod trusted_sellers;
