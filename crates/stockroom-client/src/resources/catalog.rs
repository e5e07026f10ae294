//! Catalog: categories and products.

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, Utc};
use http::{Request, Response};
use serde::{Deserialize, Serialize};
use tower::Service;

use super::{PageQuery, PaginatedResponse, amount, member};
use crate::body::ApiBody;
use crate::client::AdminClient;
use crate::endpoints;
use crate::error::{ClientError, Result};

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(alias = "id")]
    pub sku_id: String,
    pub name: String,
    /// Category id; `None` once the category is deleted.
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(deserialize_with = "amount")]
    pub price: f64,
    #[serde(default)]
    pub supplier_id: Option<String>,
    #[serde(default)]
    pub batch_number: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Filters for the product list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub page: PageQuery,
}

impl ProductQuery {
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = self.page.params();
        if let Some(category) = &self.category {
            params.push(("category", category.clone()));
        }
        params
    }
}

impl<S> AdminClient<S>
where
    S: Service<Request<ApiBody>, Response = Response<Bytes>, Error = ClientError>
        + Clone
        + Send
        + 'static,
    S::Future: Send,
{
    /// `GET /catalog/categories/`
    pub async fn categories(&self, page: &PageQuery) -> Result<PaginatedResponse<Category>> {
        self.get_json_query(endpoints::CATEGORIES, &page.params())
            .await
    }

    /// `GET /catalog/categories/{id}/`
    pub async fn category(&self, id: &str) -> Result<Category> {
        self.get_json(&member(endpoints::CATEGORIES, id, None)?)
            .await
    }

    /// `GET /catalog/products/` with optional category and search filters.
    pub async fn products(&self, query: &ProductQuery) -> Result<PaginatedResponse<Product>> {
        self.get_json_query(endpoints::PRODUCTS, &query.params())
            .await
    }

    /// `GET /catalog/products/{id}/`
    pub async fn product(&self, id: &str) -> Result<Product> {
        self.get_json(&member(endpoints::PRODUCTS, id, None)?)
            .await
    }

    /// Products in one category.
    pub async fn products_by_category(
        &self,
        category_id: &str,
    ) -> Result<PaginatedResponse<Product>> {
        self.products(&ProductQuery {
            category: Some(category_id.to_string()),
            ..ProductQuery::default()
        })
        .await
    }

    /// Products matching a free-text search.
    pub async fn search_products(&self, query: &str) -> Result<PaginatedResponse<Product>> {
        self.products(&ProductQuery {
            category: None,
            page: PageQuery::default().search(query),
        })
        .await
    }
}
