//! Catalog product.

use chrono::{DateTime, Utc};
use common::{Clock, DomainError, DomainResult, IdGenerator, Money, ProductId};
use serde::{Deserialize, Serialize};

/// Input for [`Product::create`].
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub stock: i64,
    pub image_url: String,
}

/// Full stored record of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductProps {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub stock: u32,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A sellable product. Price and stock never go negative.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    id: ProductId,
    name: String,
    description: String,
    price: Money,
    stock: u32,
    image_url: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Product {
    /// Validates the input and creates a product with a fresh id.
    pub fn create(
        new: NewProduct,
        ids: &dyn IdGenerator,
        clock: &dyn Clock,
    ) -> DomainResult<Self> {
        if new.name.trim().is_empty() {
            return Err(DomainError::validation("Product name is required"));
        }
        if new.price.is_negative() {
            return Err(DomainError::validation("Product price must be positive"));
        }
        if new.stock < 0 {
            return Err(DomainError::validation("Stock must be non-negative"));
        }
        let stock = u32::try_from(new.stock)
            .map_err(|_| DomainError::validation("Stock exceeds the supported maximum"))?;

        let now = clock.now();
        Ok(Self {
            id: ProductId::from_uuid(ids.next_uuid()),
            name: new.name,
            description: new.description,
            price: new.price,
            stock,
            image_url: new.image_url,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuilds a product from trusted stored data without validation.
    pub fn reconstitute(props: ProductProps) -> Self {
        Self {
            id: props.id,
            name: props.name,
            description: props.description,
            price: props.price,
            stock: props.stock,
            image_url: props.image_url,
            created_at: props.created_at,
            updated_at: props.updated_at,
        }
    }

    pub fn id(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn stock(&self) -> u32 {
        self.stock
    }

    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns true if at least `quantity` units are in stock.
    pub fn is_available(&self, quantity: u32) -> bool {
        self.stock >= quantity
    }

    /// Removes `quantity` units. Leaves the stock untouched on failure.
    pub fn decrease_stock(&mut self, quantity: u32, now: DateTime<Utc>) -> DomainResult<()> {
        if quantity == 0 {
            return Err(DomainError::validation("Quantity must be positive"));
        }
        if self.stock < quantity {
            return Err(DomainError::insufficient_stock(self.stock));
        }
        self.stock -= quantity;
        self.updated_at = now;
        Ok(())
    }

    pub fn increase_stock(&mut self, quantity: u32, now: DateTime<Utc>) -> DomainResult<()> {
        if quantity == 0 {
            return Err(DomainError::validation("Quantity must be positive"));
        }
        self.stock = self
            .stock
            .checked_add(quantity)
            .ok_or_else(|| DomainError::validation("Stock exceeds the supported maximum"))?;
        self.updated_at = now;
        Ok(())
    }

    pub fn to_props(&self) -> ProductProps {
        ProductProps {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
            stock: self.stock,
            image_url: self.image_url.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
