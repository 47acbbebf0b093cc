pub mod bot_admin;
pub mod key;
pub mod operator;
pub mod premium_user;
pub mod product;
pub mod seller;
pub mod session;
