//! Catalogs
//!
//! Lookup strategies that turn a typed code into a product. The till holds a
//! single [`CatalogResolver`] and neither knows nor cares whether answers come
//! from the built-in table or a remote endpoint.

use async_trait::async_trait;
use mockall::automock;

use crate::products::Product;

pub mod fixed;
pub mod remote;

/// Resolves raw, user-typed codes to products.
///
/// Resolution never fails from the till's point of view: lookup problems of
/// any kind (missing entry, transport failure, unusable payload) collapse to
/// `None`, which the till treats as "code not found".
#[automock]
#[async_trait]
pub trait CatalogResolver: Send + Sync {
    /// Looks up `raw` exactly as submitted at the prompt.
    ///
    /// Each strategy applies its own input normalization before the lookup.
    async fn resolve(&self, raw: &str) -> Option<Product>;
}
