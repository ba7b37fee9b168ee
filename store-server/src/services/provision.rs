//! Provisioning hook for UNLIMITED stock products
//!
//! Keys/links/accounts for unlimited products are synthesized by an external
//! provisioning system. The default implementation mints opaque references;
//! a real deployment plugs its vendor integration in behind this trait.

use async_trait::async_trait;
use shared::models::Product;

#[async_trait]
pub trait Provisioner: Send + Sync {
    async fn provision(&self, product: &Product) -> Result<String, String>;
}

/// Default provisioner: opaque UUID-based content
pub struct UuidProvisioner;

#[async_trait]
impl Provisioner for UuidProvisioner {
    async fn provision(&self, product: &Product) -> Result<String, String> {
        Ok(format!(
            "LPK-{}-{}",
            product.id,
            uuid::Uuid::new_v4().simple()
        ))
    }
}
