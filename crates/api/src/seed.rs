//! Demo catalog inserted into an empty store at startup.

use common::{Clock, DomainResult, IdGenerator, Money};
use domain::{NewProduct, Product, ProductRepository};

fn demo_catalog() -> Vec<NewProduct> {
    vec![
        NewProduct {
            name: "Premium Wireless Headphones".to_string(),
            description: "High-quality wireless headphones with noise cancellation, 30-hour \
                          battery life, and premium sound quality."
                .to_string(),
            price: Money::from_major(299000),
            stock: 50,
            image_url: "https://images.unsplash.com/photo-1505740420928-5e560c06d30e?w=800&q=80"
                .to_string(),
        },
        NewProduct {
            name: "Smart Watch Pro".to_string(),
            description: "Fitness tracking, heart rate monitoring, GPS and smartphone \
                          notifications. Water-resistant up to 50m."
                .to_string(),
            price: Money::from_major(450000),
            stock: 30,
            image_url: "https://images.unsplash.com/photo-1523275335684-37898b6baf30?w=800&q=80"
                .to_string(),
        },
        NewProduct {
            name: "Mechanical Gaming Keyboard".to_string(),
            description: "RGB backlit mechanical keyboard with macro support and \
                          ultra-responsive switches."
                .to_string(),
            price: Money::from_major(180000),
            stock: 75,
            image_url: "https://images.unsplash.com/photo-1587829741301-dc798b83add3?w=800&q=80"
                .to_string(),
        },
    ]
}

/// Inserts the demo catalog when no product exists yet. Returns how many
/// products were inserted.
#[tracing::instrument(skip_all)]
pub async fn seed_products(
    products: &dyn ProductRepository,
    ids: &dyn IdGenerator,
    clock: &dyn Clock,
) -> DomainResult<usize> {
    if !products.find_all().await?.is_empty() {
        tracing::info!("catalog already seeded");
        return Ok(0);
    }

    let catalog = demo_catalog();
    let count = catalog.len();
    for new in catalog {
        let product = Product::create(new, ids, clock)?;
        products.save(&product).await?;
    }
    tracing::info!(count, "seeded demo products");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{RandomIds, SystemClock};
    use store::InMemoryStore;

    #[tokio::test]
    async fn test_seeds_empty_catalog_once() {
        let store = InMemoryStore::new();
        assert_eq!(
            seed_products(&store, &RandomIds, &SystemClock).await.unwrap(),
            3
        );
        assert_eq!(
            seed_products(&store, &RandomIds, &SystemClock).await.unwrap(),
            0
        );
        assert_eq!(store.product_count().await, 3);
    }
}
