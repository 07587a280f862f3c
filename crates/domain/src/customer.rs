//! Customer entity.

use chrono::{DateTime, Utc};
use common::{Clock, CustomerId, DomainResult, IdGenerator, combine};
use serde::{Deserialize, Serialize};

use crate::validation::{EMAIL_PATTERN, PHONE_PATTERN, matches, min_trimmed_len};

#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub email: String,
    pub full_name: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProps {
    pub id: CustomerId,
    pub email: String,
    pub full_name: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

/// A buyer, identified for lookup purposes by email. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    id: CustomerId,
    email: String,
    full_name: String,
    phone: String,
    created_at: DateTime<Utc>,
}

impl Customer {
    pub fn create(
        new: NewCustomer,
        ids: &dyn IdGenerator,
        clock: &dyn Clock,
    ) -> DomainResult<Self> {
        combine([
            matches(&EMAIL_PATTERN, &new.email, "Invalid email format"),
            min_trimmed_len(
                &new.full_name,
                3,
                "Full name must be at least 3 characters",
            ),
            matches(&PHONE_PATTERN, &new.phone, "Invalid phone format"),
        ])?;

        Ok(Self {
            id: CustomerId::from_uuid(ids.next_uuid()),
            email: new.email,
            full_name: new.full_name,
            phone: new.phone,
            created_at: clock.now(),
        })
    }

    pub fn reconstitute(props: CustomerProps) -> Self {
        Self {
            id: props.id,
            email: props.email,
            full_name: props.full_name,
            phone: props.phone,
            created_at: props.created_at,
        }
    }

    pub fn id(&self) -> CustomerId {
        self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn to_props(&self) -> CustomerProps {
        CustomerProps {
            id: self.id,
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            phone: self.phone.clone(),
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{ErrorCode, FixedClock, SequentialIds};

    fn jane() -> NewCustomer {
        NewCustomer {
            email: "jane@example.com".to_string(),
            full_name: "Jane Doe".to_string(),
            phone: "+57 300 123 4567".to_string(),
        }
    }

    fn create(new: NewCustomer) -> DomainResult<Customer> {
        Customer::create(new, &SequentialIds::new(), &FixedClock::new(Utc::now()))
    }

    #[test]
    fn test_create_valid_customer() {
        let customer = create(jane()).unwrap();
        assert_eq!(customer.email(), "jane@example.com");
        assert_eq!(customer.full_name(), "Jane Doe");
    }

    #[test]
    fn test_each_invalid_field_is_named() {
        let mut bad_email = jane();
        bad_email.email = "jane.example.com".to_string();
        let err = create(bad_email).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert!(err.message().contains("email"));

        let mut bad_name = jane();
        bad_name.full_name = " Jo ".to_string();
        assert!(create(bad_name).unwrap_err().message().contains("name"));

        let mut bad_phone = jane();
        bad_phone.phone = "555".to_string();
        assert!(create(bad_phone).unwrap_err().message().contains("phone"));
    }

    #[test]
    fn test_first_failing_field_wins() {
        let new = NewCustomer {
            email: "nope".to_string(),
            full_name: "x".to_string(),
            phone: "1".to_string(),
        };
        assert_eq!(create(new).unwrap_err().message(), "Invalid email format");
    }

    #[test]
    fn test_props_roundtrip() {
        let customer = create(jane()).unwrap();
        assert_eq!(Customer::reconstitute(customer.to_props()), customer);
    }
}
