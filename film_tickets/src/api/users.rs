//! User administration endpoints.

use reqwest::Method;

use super::{
    client::ApiClient,
    errors::ApiResult,
    models::{Page, UpdateUserRequest},
};
use crate::auth::{Principal, SignUpRequest, UserId};

impl ApiClient {
    /// GET /user
    pub async fn list_users(&self, page: u32, size: u32) -> ApiResult<Page<Principal>> {
        self.get_page(self.url("/user"), page, size).await
    }

    /// GET /user/enabled
    pub async fn list_enabled_users(&self, page: u32, size: u32) -> ApiResult<Page<Principal>> {
        self.get_page(self.url("/user/enabled"), page, size).await
    }

    /// GET /user/{id}
    pub async fn get_user(&self, id: UserId) -> ApiResult<Principal> {
        self.get(&format!("/user/{id}")).await
    }

    /// GET /user/email/{email}
    pub async fn get_user_by_email(&self, email: &str) -> ApiResult<Principal> {
        let url = self.segment_url("/user/email", email)?;
        self.send(self.request(Method::GET, url)).await
    }

    /// POST /user
    pub async fn create_user(&self, user: &SignUpRequest) -> ApiResult<Principal> {
        self.send_json(Method::POST, "/user", user).await
    }

    /// PUT /user
    pub async fn update_user(&self, user: &UpdateUserRequest) -> ApiResult<Principal> {
        self.send_json(Method::PUT, "/user", user).await
    }

    /// PUT /user/admin/{id}, flips the enabled flag
    pub async fn toggle_user_status(&self, id: UserId) -> ApiResult<Principal> {
        let builder = self.request(Method::PUT, self.url(&format!("/user/admin/{id}")));
        self.send(builder).await
    }

    /// DELETE /user/admin/{id}
    pub async fn delete_user(&self, id: UserId) -> ApiResult<()> {
        let builder = self.request(Method::DELETE, self.url(&format!("/user/admin/{id}")));
        self.send_empty(builder).await
    }
}
