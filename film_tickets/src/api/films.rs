//! Film catalog endpoints.

use reqwest::{
    Method,
    multipart::{Form, Part},
};

use super::{
    client::ApiClient,
    errors::{ApiError, ApiResult},
    models::{CreateFilmRequest, Film, FilmId, ImageUpload, Page, UpdateFilmRequest},
};

impl ApiClient {
    /// GET /film, every film including disabled ones
    pub async fn list_films(&self, page: u32, size: u32) -> ApiResult<Page<Film>> {
        self.get_page(self.url("/film"), page, size).await
    }

    /// GET /film/enabled
    pub async fn list_enabled_films(&self, page: u32, size: u32) -> ApiResult<Page<Film>> {
        self.get_page(self.url("/film/enabled"), page, size).await
    }

    /// GET /film/{id}
    pub async fn get_film(&self, id: FilmId) -> ApiResult<Film> {
        self.get(&format!("/film/{id}")).await
    }

    /// GET /film/title/{title}
    pub async fn search_films(&self, title: &str, page: u32, size: u32) -> ApiResult<Page<Film>> {
        let url = self.segment_url("/film/title", title)?;
        self.get_page(url, page, size).await
    }

    /// POST /film/admin as multipart: a `filmData` JSON part, the `image`
    /// file and an optional storage `folder`.
    pub async fn create_film(
        &self,
        film: &CreateFilmRequest,
        image: ImageUpload,
        folder: Option<&str>,
    ) -> ApiResult<Film> {
        let film_json =
            serde_json::to_string(film).map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        let film_part = Part::text(film_json).mime_str("application/json")?;
        let image_part = Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.content_type)?;

        let mut form = Form::new()
            .part("filmData", film_part)
            .part("image", image_part);
        if let Some(folder) = folder {
            form = form.text("folder", folder.to_string());
        }

        let builder = self
            .request(Method::POST, self.url("/film/admin"))
            .multipart(form);
        self.send(builder).await
    }

    /// PUT /film/admin
    pub async fn update_film(&self, film: &UpdateFilmRequest) -> ApiResult<Film> {
        self.send_json(Method::PUT, "/film/admin", film).await
    }

    /// PUT /film/admin/{id}, flips the enabled flag
    pub async fn toggle_film_status(&self, id: FilmId) -> ApiResult<Film> {
        let builder = self.request(Method::PUT, self.url(&format!("/film/admin/{id}")));
        self.send(builder).await
    }

    /// DELETE /film/admin/{id}
    pub async fn delete_film(&self, id: FilmId) -> ApiResult<()> {
        let builder = self.request(Method::DELETE, self.url(&format!("/film/admin/{id}")));
        self.send_empty(builder).await
    }
}
