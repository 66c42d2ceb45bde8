use std::sync::Arc;

use validator::Validate;

use crate::address::{Address, AddressRepository, NewAddress};
use crate::error::Result;
use crate::student::StudentRepository;

/// Business rules around student addresses.
#[derive(Clone)]
pub struct AddressService {
    students: Arc<dyn StudentRepository>,
    addresses: Arc<dyn AddressRepository>,
}

impl AddressService {
    /// Create a new [`AddressService`].
    pub fn new(
        students: Arc<dyn StudentRepository>,
        addresses: Arc<dyn AddressRepository>,
    ) -> Self {
        Self {
            students,
            addresses,
        }
    }

    /// Set the address of a student, replacing any previous one.
    pub async fn save(&self, student_id: i64, address: NewAddress) -> Result<Address> {
        self.students.ensure_exists(student_id).await?;

        let address = address.sanitized();
        address.validate()?;

        let address = self.addresses.upsert(student_id, &address).await?;
        tracing::info!(student_id, address_id = address.id, "address saved");

        Ok(address)
    }
}
