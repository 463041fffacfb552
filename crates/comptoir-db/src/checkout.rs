//! # Sale Orchestration
//!
//! The single entry point that composes all three ledgers into one
//! transaction.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_sale(request)                                                   │
//! │                                                                         │
//! │  0. Validate request + resolve PaymentPlan        (no mutation yet)    │
//! │  ── BEGIN TRANSACTION ─────────────────────────────────────────────    │
//! │  1. Fetch customer (when attached)                                      │
//! │  2. Insert sale shell (zeroed totals, so FKs resolve)                  │
//! │  3. Per item: price snapshot + stock ledger entry + sale_items row     │
//! │  4. Apply payment plan; credit sales hit the credit ledger             │
//! │  5. Redeem points (capped) → loyalty discount, final total             │
//! │  6. Earn points on (total + loyalty discount); non-members skipped     │
//! │  7. Write final totals onto the sale row                               │
//! │  ── COMMIT ────────────────────────────────────────────────────────    │
//! │                                                                         │
//! │  Any error between BEGIN and COMMIT rolls everything back: no sale,    │
//! │  no items, no ledger entries, no balance changes. A failed sale        │
//! │  leaves zero rows behind.                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Earning (step 6) is the single tolerated degradation: a walk-in or
//! non-member customer simply earns nothing, and the sale proceeds.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::DbError;
use crate::ledger::credit::CreditLedger;
use crate::ledger::loyalty::{LoyaltyLedger, Redemption};
use crate::ledger::stock::{StockLedger, StockMovement, StockResult};
use crate::repository::customer::CustomerRepository;
use crate::repository::product::ProductRepository;
use crate::repository::sale::SaleRepository;
use comptoir_core::validation::{validate_quantity, validate_sale_items};
use comptoir_core::{
    CreditTransaction, CurrencyProfile, LedgerResult, Money, PaymentMethod, PaymentPlan,
    PaymentStatus, Points, Sale, SaleItem, StockContext, StockEntryType, ValidationError,
};

// =============================================================================
// Requests & Results
// =============================================================================

/// One line of a sale request.
#[derive(Debug, Clone)]
pub struct SaleItemRequest {
    pub product_id: String,
    pub quantity: i64,
    /// Price override; defaults to the product's current selling price.
    pub unit_price: Option<Money>,
}

/// A complete sale request.
#[derive(Debug, Clone)]
pub struct CreateSaleRequest {
    pub items: Vec<SaleItemRequest>,
    pub customer_id: Option<String>,
    pub payment_method: PaymentMethod,
    /// Cash tendered; change is computed against the final total.
    pub amount_given: Option<Money>,
    /// External settlement reference (Sarali).
    pub payment_reference: Option<String>,
    /// Manual discount, applied before loyalty.
    pub discount: Money,
    /// Points the customer asked to redeem (capped at the sale total).
    pub points_to_redeem: Option<Points>,
    pub user_id: String,
}

impl CreateSaleRequest {
    pub fn new(payment_method: PaymentMethod, user_id: impl Into<String>) -> Self {
        CreateSaleRequest {
            items: Vec::new(),
            customer_id: None,
            payment_method,
            amount_given: None,
            payment_reference: None,
            discount: Money::zero(),
            points_to_redeem: None,
            user_id: user_id.into(),
        }
    }

    pub fn item(mut self, product_id: impl Into<String>, quantity: i64) -> Self {
        self.items.push(SaleItemRequest {
            product_id: product_id.into(),
            quantity,
            unit_price: None,
        });
        self
    }

    pub fn customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn amount_given(mut self, given: Money) -> Self {
        self.amount_given = Some(given);
        self
    }

    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.payment_reference = Some(reference.into());
        self
    }

    pub fn discount(mut self, discount: Money) -> Self {
        self.discount = discount;
        self
    }

    pub fn redeem_points(mut self, points: Points) -> Self {
        self.points_to_redeem = Some(points);
        self
    }
}

/// Everything the caller needs to render a receipt.
#[derive(Debug, Clone)]
pub struct SaleReceipt {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    /// Per-line stock outcome, including backorder warnings.
    pub stock: Vec<StockResult>,
    /// The credit ledger entry, for credit sales.
    pub credit_entry: Option<CreditTransaction>,
    /// The redemption that funded the loyalty discount, if any.
    pub redemption: Option<Redemption>,
    pub points_earned: Points,
}

impl SaleReceipt {
    /// Lines that left the product backordered.
    pub fn backorders(&self) -> impl Iterator<Item = &StockResult> {
        self.stock.iter().filter(|r| r.has_backorder)
    }
}

// =============================================================================
// Sale Processor
// =============================================================================

/// Orchestrates sale creation across the three ledgers.
#[derive(Debug, Clone)]
pub struct SaleProcessor {
    pool: SqlitePool,
    tenant_id: String,
    currency: CurrencyProfile,
}

impl SaleProcessor {
    pub fn new(pool: SqlitePool, tenant_id: String, currency: CurrencyProfile) -> Self {
        SaleProcessor {
            pool,
            tenant_id,
            currency,
        }
    }

    /// Creates a sale: one transaction covering the sale row, its items,
    /// every stock entry, the credit entry, and the loyalty entries.
    #[instrument(skip(self, request), fields(tenant_id = %self.tenant_id))]
    pub async fn create_sale(&self, request: CreateSaleRequest) -> LedgerResult<SaleReceipt> {
        // Everything that can be rejected without touching the database
        // is rejected here.
        validate_sale_items(request.items.len())?;
        for item in &request.items {
            validate_quantity(item.quantity)?;
        }
        if request.discount.is_negative() {
            return Err(ValidationError::OutOfRange {
                field: "discount".to_string(),
                min: 0,
                max: i64::MAX,
            }
            .into());
        }
        if request.points_to_redeem.is_some() && request.customer_id.is_none() {
            return Err(ValidationError::Required {
                field: "customer_id".to_string(),
            }
            .into());
        }

        let plan = PaymentPlan::for_request(
            request.payment_method,
            request.customer_id.as_deref(),
            request.amount_given,
            request.payment_reference.clone(),
        )?;

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let now = Utc::now();
        let sale_id = Uuid::new_v4().to_string();

        // Customer must exist before any money moves against it.
        if let Some(customer_id) = &request.customer_id {
            CustomerRepository::fetch(&mut tx, &self.tenant_id, customer_id).await?;
        }

        // Shell row first: stock and ledger entries carry sale_id foreign
        // keys, so the sale must exist before they are written.
        let mut sale = Sale {
            id: sale_id.clone(),
            tenant_id: self.tenant_id.clone(),
            customer_id: request.customer_id.clone(),
            subtotal_minor: 0,
            discount_minor: 0,
            loyalty_discount_minor: 0,
            total_minor: 0,
            loyalty_points_earned_centi: 0,
            loyalty_points_used_centi: 0,
            payment_method: plan.method(),
            payment_status: PaymentStatus::Pending,
            amount_paid_minor: 0,
            amount_given_minor: request.amount_given.map(|m| m.minor()),
            change_minor: None,
            payment_reference: None,
            user_id: request.user_id.clone(),
            created_at: now,
        };
        SaleRepository::insert(&mut tx, &sale).await?;

        // Per item: price snapshot, stock movement, line row.
        let mut subtotal = Money::zero();
        let mut items = Vec::with_capacity(request.items.len());
        let mut stock = Vec::with_capacity(request.items.len());

        for line in &request.items {
            let product =
                ProductRepository::fetch(&mut tx, &self.tenant_id, &line.product_id).await?;
            let unit_price = line.unit_price.unwrap_or_else(|| product.selling_price());
            let line_total = unit_price.multiply_quantity(line.quantity);

            let movement = StockMovement {
                tenant_id: &self.tenant_id,
                product_id: &line.product_id,
                requested_type: None,
                fallback: StockEntryType::Out,
                magnitude: line.quantity,
                context: StockContext::Sale,
                notes: None,
                unit_price: Some(unit_price),
                sale_id: Some(&sale_id),
                user_id: &request.user_id,
            };
            let result = StockLedger::apply(&mut tx, &movement).await?;

            let item = SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale_id.clone(),
                product_id: line.product_id.clone(),
                cug_snapshot: product.cug.clone(),
                name_snapshot: product.name.clone(),
                quantity: line.quantity,
                unit_price_minor: unit_price.minor(),
                purchase_price_minor: product.purchase_price_minor,
                line_total_minor: line_total.minor(),
                created_at: now,
            };
            SaleRepository::insert_item(&mut tx, &item).await?;

            subtotal += line_total;
            items.push(item);
            stock.push(result);
        }

        if request.discount > subtotal {
            return Err(ValidationError::OutOfRange {
                field: "discount".to_string(),
                min: 0,
                max: subtotal.minor(),
            }
            .into());
        }
        let total_before_loyalty = subtotal - request.discount;

        // Settle at the pre-redemption total; credit sales record their
        // ledger entry at the same figure.
        let outcome = plan.apply(total_before_loyalty)?;
        let credit_entry = if let PaymentPlan::Credit { customer_id } = &plan {
            Some(
                CreditLedger::apply_sale_credit(
                    &mut tx,
                    &self.tenant_id,
                    &self.currency,
                    customer_id,
                    &sale_id,
                    total_before_loyalty,
                    &request.user_id,
                )
                .await?,
            )
        } else {
            None
        };

        // Redemption, capped at the current total.
        let redemption = match (&request.points_to_redeem, &request.customer_id) {
            (Some(points), Some(customer_id)) => {
                LoyaltyLedger::redeem_in_tx(
                    &mut tx,
                    &self.tenant_id,
                    &self.currency,
                    customer_id,
                    Some(&sale_id),
                    *points,
                    total_before_loyalty,
                    None,
                )
                .await?
            }
            _ => None,
        };
        let loyalty_discount = redemption
            .as_ref()
            .map(|r| r.discount)
            .unwrap_or(Money::zero());
        let total = (total_before_loyalty - loyalty_discount).clamp_non_negative();

        // Earning base includes the redeemed part: the customer spent it.
        let earned = match &request.customer_id {
            Some(customer_id) => LoyaltyLedger::earn_in_tx(
                &mut tx,
                &self.tenant_id,
                &self.currency,
                customer_id,
                Some(&sale_id),
                total + loyalty_discount,
                None,
            )
            .await?
            .map(|e| Points::from_centi(e.points_centi))
            .unwrap_or(Points::zero()),
            None => Points::zero(),
        };

        // Re-derive settlement against the final total.
        let amount_paid = outcome.amount_paid.min(total);
        let change = match &plan {
            PaymentPlan::Cash { given: Some(given) } => Some(*given - total),
            _ => outcome.change,
        };

        sale.subtotal_minor = subtotal.minor();
        sale.discount_minor = request.discount.minor();
        sale.loyalty_discount_minor = loyalty_discount.minor();
        sale.total_minor = total.minor();
        sale.loyalty_points_earned_centi = earned.centi();
        sale.loyalty_points_used_centi = redemption
            .as_ref()
            .map(|r| r.points_redeemed.centi())
            .unwrap_or(0);
        sale.payment_status = outcome.status;
        sale.amount_paid_minor = amount_paid.minor();
        sale.change_minor = change.map(|c| c.minor());
        sale.payment_reference = outcome.reference.clone();
        SaleRepository::update_totals(&mut tx, &sale).await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            sale_id = %sale.id,
            total = %self.currency.format(total),
            method = ?sale.payment_method,
            items = items.len(),
            "Sale created"
        );

        Ok(SaleReceipt {
            sale,
            items,
            stock,
            credit_entry,
            redemption,
            points_earned: earned,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
