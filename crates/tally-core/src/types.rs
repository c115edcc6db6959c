//! # Domain Types
//!
//! Core domain types used throughout Tally POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    SaleLine     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  sale_id (FK)   │       │
//! │  │  price_cents    │   │  sale_number    │   │  product_id(FK) │       │
//! │  │  stock (>= 0)   │   │  total_cents    │   │  quantity       │       │
//! │  │  is_active      │   │  change_cents   │   │  unit_price ❄   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Role       │   │   SaleStatus    │   │ PaymentMethod   │       │
//! │  │  Admin          │   │  Pending        │   │  Cash           │       │
//! │  │  Cashier        │   │  Completed      │   │  Card           │       │
//! │  └─────────────────┘   │  Cancelled      │   │  Transfer       │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ❄ = snapshot frozen at sale time, independent of later price changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Role
// =============================================================================

/// Role carried by an authenticated identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access, including user administration.
    Admin,
    /// Catalog browsing and sale recording.
    Cashier,
}

impl Role {
    /// Lowercase wire name (`"admin"` / `"cashier"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Cashier => "cashier",
        }
    }

    /// Parses a wire name, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "cashier" => Some(Role::Cashier),
            _ => None,
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
///
/// `stock` is mutated only by the sale processor (conditional decrement) or
/// by catalog updates (direct set). It never goes below zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: i64,

    /// Display name shown to cashier and on receipts.
    pub name: String,

    pub description: Option<String>,

    /// Price in cents (smallest currency unit). Always > 0.
    pub price_cents: i64,

    /// Units on hand. Always >= 0.
    pub stock: i64,

    pub category_id: Option<i64>,

    /// External code (EAN-13, UPC-A, ...), unique when present.
    pub barcode: Option<String>,

    /// Inactive products stay in the catalog but cannot be sold.
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks whether current stock covers `quantity`.
    #[inline]
    pub fn has_stock_for(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }

    /// The reference embedded in sale lines.
    pub fn summary(&self) -> ProductSummary {
        ProductSummary {
            id: self.id,
            name: self.name.clone(),
            barcode: self.barcode.clone(),
            category_id: self.category_id,
        }
    }
}

/// Validated fields for creating or replacing a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInput {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock: i64,
    pub category_id: Option<i64>,
    pub barcode: Option<String>,
    pub is_active: bool,
}

/// Product reference carried by sale lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductSummary {
    pub id: i64,
    pub name: String,
    pub barcode: Option<String>,
    pub category_id: Option<i64>,
}

// =============================================================================
// Category
// =============================================================================

/// Product grouping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// User
// =============================================================================

/// A user account row, including its password hash.
///
/// Deliberately not `Serialize`: handlers expose [`UserProfile`] instead.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Public view of this user.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// User fields safe to return to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
}

/// Fields for creating or updating a user. `password_hash` is already hashed.
#[derive(Debug, Clone)]
pub struct UserInput {
    pub username: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub role: Role,
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale.
///
/// Sales are created `Completed`. Cancellation, if ever added, is a status
/// transition only; amounts never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Pending,
    Completed,
    Cancelled,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Pending => "pending",
            SaleStatus::Completed => "completed",
            SaleStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(SaleStatus::Pending),
            "completed" => Some(SaleStatus::Completed),
            "cancelled" => Some(SaleStatus::Cancelled),
            _ => None,
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer tendered. Recorded only; nothing is charged.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale. Immutable once committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: i64,
    /// Cashier who recorded the sale.
    pub user_id: i64,
    /// Human-readable unique number, e.g. `TRX-20261016-1792137600-a3f9c2`.
    pub sale_number: String,
    /// Σ line subtotals.
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    /// Amount tendered by the customer.
    pub payment_cents: i64,
    /// payment − total, never negative.
    pub change_cents: i64,
    pub status: SaleStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn payment(&self) -> Money {
        Money::from_cents(self.payment_cents)
    }

    #[inline]
    pub fn change(&self) -> Money {
        Money::from_cents(self.change_cents)
    }
}

// =============================================================================
// Sale Line
// =============================================================================

/// A line item in a sale.
/// Uses snapshot pattern to freeze the unit price at time of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleLine {
    pub id: i64,
    pub sale_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// unit_price × quantity.
    pub subtotal_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SaleLine {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

/// A sale line together with the product it refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleLineDetail {
    #[serde(flatten)]
    pub line: SaleLine,
    pub product: ProductSummary,
}

/// A fully hydrated sale: what `process_sale` returns and what read-back
/// returns for the same id.
///
/// `cashier` is the recording user, soft-deleted or not; `None` only when
/// the row is missing altogether.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleDetail {
    #[serde(flatten)]
    pub sale: Sale,
    pub cashier: Option<UserProfile>,
    pub lines: Vec<SaleLineDetail>,
}

// =============================================================================
// Listing & Pagination
// =============================================================================

/// Page/limit query input, clamped to sane bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: i64 = 10;
    pub const MAX_LIMIT: i64 = 100;

    /// Normalizes optional query values: page >= 1, 1 <= limit <= 100.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        PageRequest {
            page: page.unwrap_or(1).max(1),
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
        }
    }

    /// Row offset for SQL `OFFSET`.
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest::new(None, None)
    }
}

/// One page of results plus pagination metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: i64) -> Self {
        Page {
            items,
            page: request.page,
            limit: request.limit,
            total,
            pages: (total + request.limit - 1) / request.limit,
        }
    }

    /// Converts the items, keeping the pagination metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total: self.total,
            pages: self.pages,
        }
    }
}

// =============================================================================
// Dashboard
// =============================================================================

/// Headline counters for the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardStats {
    pub total_products: i64,
    pub total_transactions: i64,
    pub today_transactions: i64,
    pub today_revenue_cents: i64,
    pub monthly_revenue_cents: i64,
    pub low_stock_products: i64,
}

/// Best-selling product over a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TopProduct {
    pub product_name: String,
    pub total_sold: i64,
    pub revenue_cents: i64,
}

/// Revenue for one calendar day (`YYYY-MM-DD`, UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RevenuePoint {
    pub date: String,
    pub revenue_cents: i64,
}

/// Everything the dashboard endpoint returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub top_products: Vec<TopProduct>,
    pub revenue_data: Vec<RevenuePoint>,
    /// Latest completed sales, newest first.
    pub recent_transactions: Vec<Sale>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_product() -> Product {
        let now = Utc::now();
        Product {
            id: 1,
            name: "Coca-Cola 330ml".to_string(),
            description: None,
            price_cents: 999,
            stock: 5,
            category_id: None,
            barcode: Some("5449000000996".to_string()),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_product_stock_check() {
        let product = sample_product();
        assert!(product.has_stock_for(5));
        assert!(!product.has_stock_for(6));
        assert_eq!(product.price(), Money::from_cents(999));
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("Admin"), Some(Role::Admin));
        assert_eq!(Role::parse("cashier"), Some(Role::Cashier));
        assert_eq!(Role::parse("manager"), None);
        assert_eq!(Role::Cashier.as_str(), "cashier");
    }

    #[test]
    fn test_payment_method_wire_names() {
        let json = serde_json::to_string(&PaymentMethod::Transfer).unwrap();
        assert_eq!(json, "\"transfer\"");
        assert!(serde_json::from_str::<PaymentMethod>("\"cheque\"").is_err());
    }

    #[test]
    fn test_page_request_clamps() {
        let req = PageRequest::new(Some(0), Some(1000));
        assert_eq!(req.page, 1);
        assert_eq!(req.limit, 100);

        let req = PageRequest::new(Some(3), None);
        assert_eq!(req.limit, 10);
        assert_eq!(req.offset(), 20);
    }

    #[test]
    fn test_page_count_rounds_up() {
        let page = Page::new(vec![1, 2, 3], PageRequest::new(Some(1), Some(3)), 7);
        assert_eq!(page.pages, 3);

        let empty: Page<i32> = Page::new(vec![], PageRequest::default(), 0);
        assert_eq!(empty.pages, 0);
    }

    #[test]
    fn test_sale_detail_flattens_sale_fields() {
        let now = Utc::now();
        let detail = SaleDetail {
            sale: Sale {
                id: 10,
                user_id: 2,
                sale_number: "TRX-20261016-1792137600-a3f9c2".to_string(),
                total_cents: 1998,
                payment_method: PaymentMethod::Cash,
                payment_cents: 2500,
                change_cents: 502,
                status: SaleStatus::Completed,
                created_at: now,
            },
            cashier: Some(UserProfile {
                id: 2,
                username: "kasir1".to_string(),
                email: "kasir1@tally.local".to_string(),
                role: Role::Cashier,
            }),
            lines: vec![],
        };

        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(value["sale_number"], "TRX-20261016-1792137600-a3f9c2");
        assert_eq!(value["change_cents"], 502);
        assert_eq!(value["status"], "completed");
        assert!(value["lines"].as_array().unwrap().is_empty());
        assert_eq!(value["cashier"]["username"], "kasir1");
        assert!(value["cashier"].get("password_hash").is_none());
    }
}
