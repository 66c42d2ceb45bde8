//! Handle database requests.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::address::{Address, NewAddress};
use crate::error::Result;

const COLUMNS: &str = "id, student_id, street, village, district, city, province, \
    postal_code, phone, lives_with, distance_km, transport";

/// Storage of student addresses.
#[async_trait]
pub trait AddressRepository: Send + Sync {
    /// Insert the address of a student, or replace the existing one.
    async fn upsert(&self, student_id: i64, address: &NewAddress) -> Result<Address>;
    async fn find_by_student(&self, student_id: i64) -> Result<Option<Address>>;
}

#[derive(Clone)]
pub struct PgAddressRepository {
    pool: PgPool,
}

impl PgAddressRepository {
    /// Create a new [`PgAddressRepository`].
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AddressRepository for PgAddressRepository {
    async fn upsert(&self, student_id: i64, address: &NewAddress) -> Result<Address> {
        let query = format!(
            r#"INSERT INTO student_addresses (student_id, street, village, district, city,
                province, postal_code, phone, lives_with, distance_km, transport)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                ON CONFLICT (student_id) DO UPDATE SET street = EXCLUDED.street,
                village = EXCLUDED.village, district = EXCLUDED.district,
                city = EXCLUDED.city, province = EXCLUDED.province,
                postal_code = EXCLUDED.postal_code, phone = EXCLUDED.phone,
                lives_with = EXCLUDED.lives_with, distance_km = EXCLUDED.distance_km,
                transport = EXCLUDED.transport
                RETURNING {COLUMNS}"#
        );

        Ok(sqlx::query_as::<_, Address>(&query)
            .bind(student_id)
            .bind(&address.street)
            .bind(&address.village)
            .bind(&address.district)
            .bind(&address.city)
            .bind(&address.province)
            .bind(&address.postal_code)
            .bind(&address.phone)
            .bind(&address.lives_with)
            .bind(address.distance_km)
            .bind(&address.transport)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn find_by_student(&self, student_id: i64) -> Result<Option<Address>> {
        let query = format!("SELECT {COLUMNS} FROM student_addresses WHERE student_id = $1");

        Ok(sqlx::query_as::<_, Address>(&query)
            .bind(student_id)
            .fetch_optional(&self.pool)
            .await?)
    }
}
