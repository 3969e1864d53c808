//! Paged film browsing.
//!
//! [`CatalogView`] is plain state: it hands out a [`CatalogQuery`] for each
//! page change or search and later applies the matching result. Queries
//! are fenced, so when the user pages twice quickly the slower first
//! response cannot overwrite the second.

use crate::{
    api::{ApiClient, ApiResult, FenceToken, Film, Page, RequestFence},
    auth::Role,
};

/// Which films a viewer may see.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CatalogScope {
    /// Customers only see films that are on sale.
    EnabledOnly,
    /// Admins manage the full catalog.
    All,
}

impl CatalogScope {
    #[must_use]
    pub fn for_role(role: Option<Role>) -> Self {
        match role {
            Some(Role::Admin) => CatalogScope::All,
            _ => CatalogScope::EnabledOnly,
        }
    }
}

/// One catalog fetch, tied to the view state that issued it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CatalogQuery {
    pub token: FenceToken,
    pub scope: CatalogScope,
    pub title: Option<String>,
    pub page: u32,
    pub size: u32,
}

#[derive(Debug)]
pub struct CatalogView {
    scope: CatalogScope,
    page_size: u32,
    fence: RequestFence,
    search: Option<String>,
    page_index: u32,
    films: Option<Page<Film>>,
    error: Option<String>,
    loading: bool,
}

impl CatalogView {
    #[must_use]
    pub fn new(scope: CatalogScope, page_size: u32) -> Self {
        Self {
            scope,
            page_size: page_size.max(1),
            fence: RequestFence::new(),
            search: None,
            page_index: 0,
            films: None,
            error: None,
            loading: false,
        }
    }

    pub fn request_page(&mut self, page: u32) -> CatalogQuery {
        self.page_index = page;
        self.issue()
    }

    /// Search by title from the first page. A blank title clears the search.
    pub fn request_search(&mut self, title: &str) -> CatalogQuery {
        let title = title.trim();
        self.search = (!title.is_empty()).then(|| title.to_string());
        self.page_index = 0;
        self.issue()
    }

    pub fn clear_search(&mut self) -> CatalogQuery {
        self.search = None;
        self.page_index = 0;
        self.issue()
    }

    /// Query for the next page, if the current page says there is one.
    pub fn next_page(&mut self) -> Option<CatalogQuery> {
        let has_next = self.films.as_ref().is_some_and(Page::has_next);
        has_next.then(|| self.request_page(self.page_index + 1))
    }

    pub fn previous_page(&mut self) -> Option<CatalogQuery> {
        (self.page_index > 0).then(|| self.request_page(self.page_index - 1))
    }

    /// Apply a fetch result. Returns `false` and changes nothing if a newer
    /// query has been issued since.
    pub fn apply(&mut self, query: &CatalogQuery, result: ApiResult<Page<Film>>) -> bool {
        let Some(result) = self.fence.accept(query.token, result) else {
            return false;
        };

        self.loading = false;
        match result {
            Ok(page) => {
                self.films = Some(page);
                self.error = None;
            }
            Err(e) => {
                self.error = Some(e.to_string());
            }
        }
        true
    }

    /// Issue the query for the current page and apply its result.
    pub async fn refresh(&mut self, client: &ApiClient) -> bool {
        let query = self.issue();
        let result = client.fetch_catalog(&query).await;
        self.apply(&query, result)
    }

    #[must_use]
    pub fn films(&self) -> &[Film] {
        self.films.as_ref().map_or(&[], |p| p.content.as_slice())
    }

    #[must_use]
    pub fn page(&self) -> Option<&Page<Film>> {
        self.films.as_ref()
    }

    #[must_use]
    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    #[must_use]
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn scope(&self) -> CatalogScope {
        self.scope
    }

    pub fn set_scope(&mut self, scope: CatalogScope) {
        self.scope = scope;
    }

    /// Find a film on the current page.
    #[must_use]
    pub fn film(&self, id: i64) -> Option<&Film> {
        self.films().iter().find(|f| f.id == id)
    }

    fn issue(&mut self) -> CatalogQuery {
        self.loading = true;
        CatalogQuery {
            token: self.fence.begin(),
            scope: self.scope,
            title: self.search.clone(),
            page: self.page_index,
            size: self.page_size,
        }
    }
}

impl ApiClient {
    /// Run a catalog query against the matching endpoint.
    pub async fn fetch_catalog(&self, query: &CatalogQuery) -> ApiResult<Page<Film>> {
        match (&query.title, query.scope) {
            (Some(title), _) => self.search_films(title, query.page, query.size).await,
            (None, CatalogScope::All) => self.list_films(query.page, query.size).await,
            (None, CatalogScope::EnabledOnly) => {
                self.list_enabled_films(query.page, query.size).await
            }
        }
    }
}
