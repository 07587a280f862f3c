use async_trait::async_trait;
use common::{CustomerId, DeliveryId, Money, ProductId, TransactionId};
use domain::{
    Customer, CustomerProps, CustomerRepository, Delivery, DeliveryProps, DeliveryRepository,
    DeliveryStatus, Product, ProductProps, ProductRepository, RepositoryError, RepositoryResult,
    Transaction, TransactionProps, TransactionRepository, TransactionStatus,
};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

const PRODUCT_COLUMNS: &str =
    "id, name, description, price_cents, stock, image_url, created_at, updated_at";
const CUSTOMER_COLUMNS: &str = "id, email, full_name, phone, created_at";
const TRANSACTION_COLUMNS: &str = "id, transaction_number, product_id, customer_id, \
     product_amount_cents, base_fee_cents, delivery_fee_cents, total_amount_cents, status, \
     gateway_transaction_id, payment_method, payment_data, created_at, updated_at";
const DELIVERY_COLUMNS: &str = "id, transaction_id, address, city, state, zip_code, country, \
     notes, status, estimated_delivery, created_at";

/// PostgreSQL-backed repositories.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a pool to `database_url`.
    pub async fn connect(database_url: &str) -> RepositoryResult<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(db_error)?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_product(row: PgRow) -> RepositoryResult<Product> {
        let stock: i32 = row.try_get("stock").map_err(db_error)?;
        Ok(Product::reconstitute(ProductProps {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id").map_err(db_error)?),
            name: row.try_get("name").map_err(db_error)?,
            description: row.try_get("description").map_err(db_error)?,
            price: Money::from_cents(row.try_get("price_cents").map_err(db_error)?),
            stock: u32::try_from(stock)
                .map_err(|_| RepositoryError::CorruptRecord(format!("negative stock {stock}")))?,
            image_url: row.try_get("image_url").map_err(db_error)?,
            created_at: row.try_get("created_at").map_err(db_error)?,
            updated_at: row.try_get("updated_at").map_err(db_error)?,
        }))
    }

    fn row_to_customer(row: PgRow) -> RepositoryResult<Customer> {
        Ok(Customer::reconstitute(CustomerProps {
            id: CustomerId::from_uuid(row.try_get::<Uuid, _>("id").map_err(db_error)?),
            email: row.try_get("email").map_err(db_error)?,
            full_name: row.try_get("full_name").map_err(db_error)?,
            phone: row.try_get("phone").map_err(db_error)?,
            created_at: row.try_get("created_at").map_err(db_error)?,
        }))
    }

    fn row_to_transaction(row: PgRow) -> RepositoryResult<Transaction> {
        let status: String = row.try_get("status").map_err(db_error)?;
        let payment_data: Option<serde_json::Value> =
            row.try_get("payment_data").map_err(db_error)?;
        let payment_data = match payment_data {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::Object(map)) => Some(map),
            Some(other) => {
                return Err(RepositoryError::CorruptRecord(format!(
                    "payment_data is not an object: {other}"
                )));
            }
        };

        Ok(Transaction::reconstitute(TransactionProps {
            id: TransactionId::from_uuid(row.try_get::<Uuid, _>("id").map_err(db_error)?),
            transaction_number: row.try_get("transaction_number").map_err(db_error)?,
            product_id: ProductId::from_uuid(
                row.try_get::<Uuid, _>("product_id").map_err(db_error)?,
            ),
            customer_id: CustomerId::from_uuid(
                row.try_get::<Uuid, _>("customer_id").map_err(db_error)?,
            ),
            product_amount: Money::from_cents(
                row.try_get("product_amount_cents").map_err(db_error)?,
            ),
            base_fee: Money::from_cents(row.try_get("base_fee_cents").map_err(db_error)?),
            delivery_fee: Money::from_cents(row.try_get("delivery_fee_cents").map_err(db_error)?),
            total_amount: Money::from_cents(row.try_get("total_amount_cents").map_err(db_error)?),
            status: TransactionStatus::parse(&status).ok_or_else(|| {
                RepositoryError::CorruptRecord(format!("unknown transaction status {status}"))
            })?,
            gateway_transaction_id: row.try_get("gateway_transaction_id").map_err(db_error)?,
            payment_method: row.try_get("payment_method").map_err(db_error)?,
            payment_data,
            created_at: row.try_get("created_at").map_err(db_error)?,
            updated_at: row.try_get("updated_at").map_err(db_error)?,
        }))
    }

    fn row_to_delivery(row: PgRow) -> RepositoryResult<Delivery> {
        let status: String = row.try_get("status").map_err(db_error)?;
        Ok(Delivery::reconstitute(DeliveryProps {
            id: DeliveryId::from_uuid(row.try_get::<Uuid, _>("id").map_err(db_error)?),
            transaction_id: TransactionId::from_uuid(
                row.try_get::<Uuid, _>("transaction_id").map_err(db_error)?,
            ),
            address: row.try_get("address").map_err(db_error)?,
            city: row.try_get("city").map_err(db_error)?,
            state: row.try_get("state").map_err(db_error)?,
            zip_code: row.try_get("zip_code").map_err(db_error)?,
            country: row.try_get("country").map_err(db_error)?,
            notes: row.try_get("notes").map_err(db_error)?,
            status: DeliveryStatus::parse(&status).ok_or_else(|| {
                RepositoryError::CorruptRecord(format!("unknown delivery status {status}"))
            })?,
            estimated_delivery: row.try_get("estimated_delivery").map_err(db_error)?,
            created_at: row.try_get("created_at").map_err(db_error)?,
        }))
    }
}

/// Maps driver errors onto repository errors; unique violations become
/// conflicts.
fn db_error(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db) = &err
        && db.is_unique_violation()
    {
        return RepositoryError::Conflict(db.message().to_string());
    }
    RepositoryError::Storage(err.to_string())
}

fn stock_column(stock: u32) -> RepositoryResult<i32> {
    i32::try_from(stock)
        .map_err(|_| RepositoryError::Storage(format!("stock {stock} exceeds column range")))
}

fn payment_data_column(transaction: &Transaction) -> Option<serde_json::Value> {
    transaction
        .payment_data()
        .map(|map| serde_json::Value::Object(map.clone()))
}

#[async_trait]
impl ProductRepository for PostgresStore {
    async fn find_by_id(&self, id: ProductId) -> RepositoryResult<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(Self::row_to_product).transpose()
    }

    async fn find_all(&self) -> RepositoryResult<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    #[tracing::instrument(skip(self, product), fields(product_id = %product.id()))]
    async fn save(&self, product: &Product) -> RepositoryResult<Product> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price_cents, stock, image_url, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(product.id().as_uuid())
        .bind(product.name())
        .bind(product.description())
        .bind(product.price().cents())
        .bind(stock_column(product.stock())?)
        .bind(product.image_url())
        .bind(product.created_at())
        .bind(product.updated_at())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(product.clone())
    }

    async fn update(&self, product: &Product) -> RepositoryResult<Product> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $2, description = $3, price_cents = $4, stock = $5, image_url = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(product.id().as_uuid())
        .bind(product.name())
        .bind(product.description())
        .bind(product.price().cents())
        .bind(stock_column(product.stock())?)
        .bind(product.image_url())
        .bind(product.updated_at())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Product",
                id: product.id().to_string(),
            });
        }
        Ok(product.clone())
    }

    #[tracing::instrument(skip(self), fields(product_id = %id))]
    async fn decrement_stock(&self, id: ProductId, quantity: u32) -> RepositoryResult<Product> {
        let quantity = stock_column(quantity)?;
        let row = sqlx::query(&format!(
            r#"
            UPDATE products
            SET stock = stock - $2, updated_at = NOW()
            WHERE id = $1 AND stock >= $2
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        if let Some(row) = row {
            return Self::row_to_product(row);
        }

        // No row matched: either the product is gone or it ran out.
        match ProductRepository::find_by_id(self, id).await? {
            Some(product) => {
                tracing::warn!(available = product.stock(), "conditional stock decrement matched no row");
                Err(RepositoryError::InsufficientStock {
                    available: product.stock(),
                })
            }
            None => Err(RepositoryError::NotFound {
                entity: "Product",
                id: id.to_string(),
            }),
        }
    }

    async fn delete(&self, id: ProductId) -> RepositoryResult<()> {
        sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }
}

#[async_trait]
impl CustomerRepository for PostgresStore {
    async fn find_by_id(&self, id: CustomerId) -> RepositoryResult<Option<Customer>> {
        let row = sqlx::query(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(Self::row_to_customer).transpose()
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<Customer>> {
        let row = sqlx::query(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(Self::row_to_customer).transpose()
    }

    async fn save(&self, customer: &Customer) -> RepositoryResult<Customer> {
        sqlx::query(
            r#"
            INSERT INTO customers (id, email, full_name, phone, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(customer.id().as_uuid())
        .bind(customer.email())
        .bind(customer.full_name())
        .bind(customer.phone())
        .bind(customer.created_at())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(customer.clone())
    }

    async fn update(&self, customer: &Customer) -> RepositoryResult<Customer> {
        let result = sqlx::query(
            "UPDATE customers SET email = $2, full_name = $3, phone = $4 WHERE id = $1",
        )
        .bind(customer.id().as_uuid())
        .bind(customer.email())
        .bind(customer.full_name())
        .bind(customer.phone())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Customer",
                id: customer.id().to_string(),
            });
        }
        Ok(customer.clone())
    }
}

#[async_trait]
impl TransactionRepository for PostgresStore {
    async fn find_by_id(&self, id: TransactionId) -> RepositoryResult<Option<Transaction>> {
        let row = sqlx::query(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(Self::row_to_transaction).transpose()
    }

    async fn find_by_number(&self, number: &str) -> RepositoryResult<Option<Transaction>> {
        let row = sqlx::query(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE transaction_number = $1"
        ))
        .bind(number)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(Self::row_to_transaction).transpose()
    }

    async fn find_by_customer_id(&self, id: CustomerId) -> RepositoryResult<Vec<Transaction>> {
        let rows = sqlx::query(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE customer_id = $1 ORDER BY created_at DESC"
        ))
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(Self::row_to_transaction).collect()
    }

    #[tracing::instrument(skip(self, transaction), fields(transaction_number = %transaction.transaction_number()))]
    async fn save(&self, transaction: &Transaction) -> RepositoryResult<Transaction> {
        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, transaction_number, product_id, customer_id,
                product_amount_cents, base_fee_cents, delivery_fee_cents, total_amount_cents,
                status, gateway_transaction_id, payment_method, payment_data, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(transaction.id().as_uuid())
        .bind(transaction.transaction_number())
        .bind(transaction.product_id().as_uuid())
        .bind(transaction.customer_id().as_uuid())
        .bind(transaction.product_amount().cents())
        .bind(transaction.base_fee().cents())
        .bind(transaction.delivery_fee().cents())
        .bind(transaction.total_amount().cents())
        .bind(transaction.status().as_str())
        .bind(transaction.gateway_transaction_id())
        .bind(transaction.payment_method())
        .bind(payment_data_column(transaction))
        .bind(transaction.created_at())
        .bind(transaction.updated_at())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(transaction.clone())
    }

    #[tracing::instrument(skip(self, transaction), fields(transaction_number = %transaction.transaction_number()))]
    async fn update(&self, transaction: &Transaction) -> RepositoryResult<Transaction> {
        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET status = $2, gateway_transaction_id = $3, payment_data = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(transaction.id().as_uuid())
        .bind(transaction.status().as_str())
        .bind(transaction.gateway_transaction_id())
        .bind(payment_data_column(transaction))
        .bind(transaction.updated_at())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Transaction",
                id: transaction.id().to_string(),
            });
        }
        Ok(transaction.clone())
    }
}

#[async_trait]
impl DeliveryRepository for PostgresStore {
    async fn find_by_id(&self, id: DeliveryId) -> RepositoryResult<Option<Delivery>> {
        let row = sqlx::query(&format!(
            "SELECT {DELIVERY_COLUMNS} FROM deliveries WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(Self::row_to_delivery).transpose()
    }

    async fn find_by_transaction_id(
        &self,
        id: TransactionId,
    ) -> RepositoryResult<Option<Delivery>> {
        let row = sqlx::query(&format!(
            "SELECT {DELIVERY_COLUMNS} FROM deliveries WHERE transaction_id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(Self::row_to_delivery).transpose()
    }

    async fn save(&self, delivery: &Delivery) -> RepositoryResult<Delivery> {
        sqlx::query(
            r#"
            INSERT INTO deliveries (
                id, transaction_id, address, city, state, zip_code, country,
                notes, status, estimated_delivery, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(delivery.id().as_uuid())
        .bind(delivery.transaction_id().as_uuid())
        .bind(delivery.address())
        .bind(delivery.city())
        .bind(delivery.state())
        .bind(delivery.zip_code())
        .bind(delivery.country())
        .bind(delivery.notes())
        .bind(delivery.status().as_str())
        .bind(delivery.estimated_delivery())
        .bind(delivery.created_at())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(delivery.clone())
    }

    async fn update(&self, delivery: &Delivery) -> RepositoryResult<Delivery> {
        let result = sqlx::query("UPDATE deliveries SET status = $2, notes = $3 WHERE id = $1")
            .bind(delivery.id().as_uuid())
            .bind(delivery.status().as_str())
            .bind(delivery.notes())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Delivery",
                id: delivery.id().to_string(),
            });
        }
        Ok(delivery.clone())
    }
}
