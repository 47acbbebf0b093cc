use serde::{Deserialize, Serialize};

use crate::db::{BotAdmin, KeyRecord, Operator, PremiumUser, Seller};
use crate::parser::RejectedLine;
use crate::services::ProductWithStock;

// ============================================================================
// Auth
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: String,
    pub username: String,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct OperatorDto {
    pub id: i32,
    pub username: String,
    pub role: String,
    pub created_at: String,
}

impl From<Operator> for OperatorDto {
    fn from(op: Operator) -> Self {
        Self {
            id: op.id,
            username: op.username,
            role: op.role.as_str().to_string(),
            created_at: op.created_at,
        }
    }
}

// ============================================================================
// Catalog
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ProductDto {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub available_keys: u64,
    pub used_keys: u64,
    pub created_at: String,
}

impl From<ProductWithStock> for ProductDto {
    fn from(p: ProductWithStock) -> Self {
        Self {
            id: p.product.id,
            name: p.product.name,
            description: p.product.description,
            is_active: p.product.is_active,
            available_keys: p.available_keys,
            used_keys: p.used_keys,
            created_at: p.product.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductsResponse {
    pub products: Vec<ProductDto>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ToggleActiveRequest {
    pub is_active: bool,
}

// ============================================================================
// Key ledger
// ============================================================================

#[derive(Debug, Serialize)]
pub struct KeyDto {
    pub id: i32,
    pub product_id: i32,
    pub product_name: String,
    pub key_value: String,
    pub duration: String,
    pub is_claimed: bool,
    pub created_at: String,
}

impl KeyDto {
    #[must_use]
    pub fn from_record(key: KeyRecord, product_name: String) -> Self {
        Self {
            id: key.id,
            product_id: key.product_id,
            product_name,
            key_value: key.key_value,
            duration: key.duration,
            is_claimed: key.is_claimed,
            created_at: key.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct KeysResponse {
    pub keys: Vec<KeyDto>,
}

#[derive(Debug, Deserialize)]
pub struct ListKeysQuery {
    pub product_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct BulkAddKeysRequest {
    pub product_id: i32,
    /// Raw multi-line `<duration> <value>` text, as pasted by the operator
    pub keys: String,
}

#[derive(Debug, Serialize)]
pub struct BulkAddKeysResponse {
    pub inserted_count: u64,
    pub rejected_lines: Vec<RejectedLine>,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteKeysRequest {
    pub key_ids: Vec<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ClaimKeyRequest {
    pub product_id: i32,
    pub duration: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClaimedKeyDto {
    pub id: i32,
    pub product_id: i32,
    pub key_value: String,
    pub duration: String,
}

impl From<KeyRecord> for ClaimedKeyDto {
    fn from(key: KeyRecord) -> Self {
        Self {
            id: key.id,
            product_id: key.product_id,
            key_value: key.key_value,
            duration: key.duration,
        }
    }
}

/// `key` is null when the product has nothing left to hand out.
#[derive(Debug, Serialize)]
pub struct ClaimKeyResponse {
    pub key: Option<ClaimedKeyDto>,
}

// ============================================================================
// Directory tables
// ============================================================================

#[derive(Debug, Serialize)]
pub struct AdminDto {
    pub id: i32,
    pub telegram_id: i64,
    pub username: Option<String>,
    pub is_root: bool,
    pub created_at: String,
}

impl From<BotAdmin> for AdminDto {
    fn from(a: BotAdmin) -> Self {
        Self {
            id: a.id,
            telegram_id: a.telegram_id,
            username: a.username,
            is_root: a.is_root,
            created_at: a.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AdminsResponse {
    pub admins: Vec<AdminDto>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAdminRequest {
    pub telegram_id: i64,
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PremiumUserDto {
    pub id: i32,
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub created_at: String,
}

impl From<PremiumUser> for PremiumUserDto {
    fn from(u: PremiumUser) -> Self {
        Self {
            id: u.id,
            telegram_id: u.telegram_id,
            username: u.username,
            first_name: u.first_name,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PremiumUsersResponse {
    pub users: Vec<PremiumUserDto>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePremiumUserRequest {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeletePremiumUsersRequest {
    pub user_ids: Vec<i32>,
}

#[derive(Debug, Serialize)]
pub struct SellerDto {
    pub id: i32,
    pub username: String,
    pub name: Option<String>,
    pub country: Option<String>,
    pub platforms: Option<String>,
    pub is_active: bool,
    pub created_at: String,
}

impl From<Seller> for SellerDto {
    fn from(s: Seller) -> Self {
        Self {
            id: s.id,
            username: s.username,
            name: s.name,
            country: s.country,
            platforms: s.platforms,
            is_active: s.is_active,
            created_at: s.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SellersResponse {
    pub sellers: Vec<SellerDto>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSellerRequest {
    pub username: String,
    pub name: Option<String>,
    pub country: Option<String>,
    pub platforms: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WebUsersResponse {
    pub users: Vec<OperatorDto>,
}

#[derive(Debug, Deserialize)]
pub struct CreateWebUserRequest {
    pub username: String,
    pub password: String,
}
