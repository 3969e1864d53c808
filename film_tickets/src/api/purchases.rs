//! Purchase endpoints.

use reqwest::Method;

use super::{
    client::ApiClient,
    errors::ApiResult,
    models::{CreatePurchaseRequest, Page, Purchase, PurchaseId},
};
use crate::auth::UserId;

impl ApiClient {
    /// GET /purchase
    pub async fn list_purchases(&self, page: u32, size: u32) -> ApiResult<Page<Purchase>> {
        self.get_page(self.url("/purchase"), page, size).await
    }

    /// GET /purchase/user/{id}
    pub async fn purchases_by_user(
        &self,
        user_id: UserId,
        page: u32,
        size: u32,
    ) -> ApiResult<Page<Purchase>> {
        self.get_page(self.url(&format!("/purchase/user/{user_id}")), page, size)
            .await
    }

    /// GET /purchase/{id}
    pub async fn get_purchase(&self, id: PurchaseId) -> ApiResult<Purchase> {
        self.get(&format!("/purchase/{id}")).await
    }

    /// POST /purchase
    pub async fn create_purchase(&self, purchase: &CreatePurchaseRequest) -> ApiResult<Purchase> {
        self.send_json(Method::POST, "/purchase", purchase).await
    }

    /// DELETE /purchase/{id}
    pub async fn delete_purchase(&self, id: PurchaseId) -> ApiResult<()> {
        let builder = self.request(Method::DELETE, self.url(&format!("/purchase/{id}")));
        self.send_empty(builder).await
    }
}
