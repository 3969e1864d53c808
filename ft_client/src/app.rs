//! Interactive session: reads commands, drives the library, prints results.

use anyhow::{Context, Result, bail};
use film_tickets::{
    AccessDecision, ApiClient, AuthManager, Gate, PurchaseController, PurchaseState, SessionStore,
    api::{CreateFilmRequest, Film, ImageUpload, Page, Purchase, UpdateUserRequest},
    auth::{AuthError, Principal, RegistrationForm},
    catalog::{CatalogQuery, CatalogScope, CatalogView},
    purchase::{Completion, Draft},
    router::{Navigation, Route, resolve},
};
use std::io::{BufRead, Write};

use crate::{
    commands::{AdminCommand, Command, HELP, ProfileField, parse_command},
    config::ClientConfig,
};

/// Whether the loop keeps reading after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App {
    page_size: u32,
    client: ApiClient,
    auth: AuthManager,
    gate: Gate,
    catalog: CatalogView,
    purchases: PurchaseController<ApiClient>,
}

impl App {
    /// Build the client from configuration, persisting the session to the
    /// configured file.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let store = match &config.session_file {
            Some(path) => SessionStore::file(path),
            None => SessionStore::in_memory(),
        };
        Self::with_store(config, store)
    }

    pub fn with_store(config: &ClientConfig, store: SessionStore) -> Result<Self> {
        let mut client = ApiClient::new(config.api_url.clone(), store.clone());
        if let Some(timeout) = config.request_timeout {
            client = client
                .with_timeout(timeout)
                .context("Failed to build HTTP client")?;
        }

        let gate = Gate::new(store.clone());
        Ok(Self {
            page_size: config.page_size,
            auth: AuthManager::new(client.clone(), store.clone()),
            catalog: CatalogView::new(CatalogScope::for_role(gate.role()), config.page_size),
            purchases: PurchaseController::new(client.clone(), store),
            gate,
            client,
        })
    }

    /// Read commands until `quit` or end of input.
    ///
    /// Command failures are printed as `Error: ...` and never end the loop.
    pub async fn run<R: BufRead, W: Write>(&mut self, mut input: R, mut out: W) -> Result<()> {
        writeln!(out, "Film tickets. Type 'help' for commands.")?;
        if let Some(user) = self.auth.current_user() {
            writeln!(out, "Signed in as {} ({})", user.email, user.role)?;
        }

        loop {
            write!(out, "{}", self.prompt())?;
            out.flush()?;
            let Some(line) = read_line(&mut input)? else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            let command = match parse_command(&line) {
                Ok(command) => command,
                Err(e) => {
                    writeln!(out, "Error: {e}")?;
                    continue;
                }
            };

            match self.execute(command, &mut input, &mut out).await {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                Err(e) => writeln!(out, "Error: {e}")?,
            }
        }

        Ok(())
    }

    /// Run one command.
    pub async fn execute<R: BufRead, W: Write>(
        &mut self,
        command: Command,
        input: &mut R,
        out: &mut W,
    ) -> Result<Flow> {
        match command {
            Command::Help => write!(out, "{HELP}")?,
            Command::Quit => return Ok(Flow::Quit),
            Command::Login { email, password } => {
                let password = match password {
                    Some(password) => password,
                    None => ask(input, out, "Password: ")?,
                };
                let principal = self.auth.login(&email, &password).await?;
                self.session_changed();
                writeln!(out, "Welcome, {} ({})", principal.full_name(), principal.role)?;
            }
            Command::Register => self.register(input, out).await?,
            Command::Logout => {
                self.purchases.cancel();
                self.auth.logout();
                self.session_changed();
                writeln!(out, "Signed out")?;
            }
            Command::WhoAmI => match self.auth.current_user() {
                Some(user) => {
                    writeln!(out, "{} <{}> ({})", user.full_name(), user.email, user.role)?
                }
                None => writeln!(out, "Not signed in")?,
            },
            Command::Profile => {
                self.require(&Route::Profile)?;
                self.show_profile(out)?;
            }
            Command::ProfileSet { field, value } => self.update_profile(field, value, out).await?,
            Command::Go(path) => match resolve(&self.gate, &path) {
                Navigation::Render(route) => {
                    writeln!(out, "Now at {route}")?;
                    self.render_route(&route, out).await?;
                }
                Navigation::Redirect(target) => writeln!(out, "Redirected to {target}")?,
            },
            Command::Films(page) => {
                self.require(&Route::Movies)?;
                self.catalog.set_scope(CatalogScope::for_role(self.gate.role()));
                let query = self.catalog.request_page(page.unwrap_or(0));
                self.load_catalog(query, out).await?;
            }
            Command::Next => {
                self.require(&Route::Movies)?;
                match self.catalog.next_page() {
                    Some(query) => self.load_catalog(query, out).await?,
                    None => writeln!(out, "No more pages")?,
                }
            }
            Command::Prev => {
                self.require(&Route::Movies)?;
                match self.catalog.previous_page() {
                    Some(query) => self.load_catalog(query, out).await?,
                    None => writeln!(out, "Already on the first page")?,
                }
            }
            Command::Search(title) => {
                self.require(&Route::Movies)?;
                let query = self.catalog.request_search(&title);
                self.load_catalog(query, out).await?;
            }
            Command::ClearSearch => {
                self.require(&Route::Movies)?;
                let query = self.catalog.clear_search();
                self.load_catalog(query, out).await?;
            }
            Command::Buy(film_id) => {
                self.require(&Route::Movies)?;
                let film = match self.catalog.film(film_id).cloned() {
                    Some(film) => film,
                    None => self.client.get_film(film_id).await?,
                };
                self.purchases.select(&film)?;
                self.show_purchase(out)?;
            }
            Command::Quantity(raw) => {
                self.purchases.set_quantity_input(&raw)?;
                self.show_purchase(out)?;
            }
            Command::More => {
                self.purchases.increment()?;
                self.show_purchase(out)?;
            }
            Command::Less => {
                self.purchases.decrement()?;
                self.show_purchase(out)?;
            }
            Command::Pay(method) => {
                self.purchases.set_payment_method(method)?;
                self.show_purchase(out)?;
            }
            Command::Confirm => {
                let completion = self.purchases.submit().await?;
                show_completion(&completion, out)?;
            }
            Command::Cancel => {
                self.purchases.cancel();
                writeln!(out, "Purchase closed")?;
            }
            Command::History => {
                self.require(&Route::Tickets)?;
                self.show_history(out).await?;
            }
            Command::Admin(command) => self.admin(command, out).await?,
        }

        Ok(Flow::Continue)
    }

    fn prompt(&self) -> String {
        let who = self
            .auth
            .current_user()
            .map_or_else(|| "guest".to_string(), |u| u.email);
        if self.purchases.is_open() {
            format!("{who} [purchase]> ")
        } else {
            format!("{who}> ")
        }
    }

    /// Role-dependent state is rebuilt whenever the principal changes.
    fn session_changed(&mut self) {
        self.catalog = CatalogView::new(CatalogScope::for_role(self.gate.role()), self.page_size);
    }

    fn require(&self, route: &Route) -> Result<()> {
        match self.gate.check_route(route) {
            AccessDecision::Allow => Ok(()),
            AccessDecision::RedirectLogin => bail!("Please log in first"),
            AccessDecision::RedirectUnauthorized => {
                bail!("You are not authorized to open {route}")
            }
        }
    }

    async fn render_route<W: Write>(&mut self, route: &Route, out: &mut W) -> Result<()> {
        match route {
            Route::Dashboard | Route::Movies => {
                let query = self.catalog.request_page(self.catalog.page_index());
                self.load_catalog(query, out).await
            }
            Route::Tickets => self.show_history(out).await,
            Route::Profile => self.show_profile(out),
            Route::AdminFilms => self.admin(AdminCommand::Films(None), out).await,
            Route::AdminUsers => self.admin(AdminCommand::Users(None), out).await,
            Route::AdminPurchases => self.admin(AdminCommand::Purchases(None), out).await,
            Route::NotFound(path) => {
                writeln!(out, "Page not found: {path}")?;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    async fn register<R: BufRead, W: Write>(&mut self, input: &mut R, out: &mut W) -> Result<()> {
        let form = RegistrationForm {
            name: ask(input, out, "Name: ")?,
            last_name: ask(input, out, "Last name: ")?,
            phone: ask(input, out, "Phone: ")?,
            email: ask(input, out, "Email: ")?,
            password: ask(input, out, "Password: ")?,
            confirm_password: ask(input, out, "Confirm password: ")?,
        };

        match self.auth.register(&form).await {
            Ok(principal) => {
                self.session_changed();
                writeln!(out, "Welcome, {}", principal.full_name())?;
                Ok(())
            }
            Err(AuthError::Validation(fields)) => {
                writeln!(out, "Please fix the following:")?;
                for (field, message) in fields.iter() {
                    writeln!(out, "  {field}: {message}")?;
                }
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn show_profile<W: Write>(&self, out: &mut W) -> Result<()> {
        let user = self.auth.current_user().context("Profile is not available")?;
        writeln!(out, "Name:   {}", user.full_name())?;
        writeln!(out, "Email:  {}", user.email)?;
        writeln!(out, "Phone:  {}", user.phone)?;
        writeln!(out, "Role:   {}", user.role)?;
        Ok(())
    }

    async fn update_profile<W: Write>(
        &mut self,
        field: ProfileField,
        value: String,
        out: &mut W,
    ) -> Result<()> {
        self.require(&Route::Profile)?;
        let user = self.auth.current_user().context("Profile is not available")?;

        let mut request = UpdateUserRequest {
            id: user.id,
            name: user.name,
            last_name: user.last_name,
            phone: user.phone,
            email: user.email,
            password: None,
        };
        match field {
            ProfileField::Name => request.name = value,
            ProfileField::LastName => request.last_name = value,
            ProfileField::Phone => request.phone = value,
            ProfileField::Email => request.email = value,
            ProfileField::Password => request.password = Some(value),
        }

        let updated = self.auth.update_profile(&request).await?;
        writeln!(out, "Profile updated for {}", updated.full_name())?;
        Ok(())
    }

    async fn load_catalog<W: Write>(&mut self, query: CatalogQuery, out: &mut W) -> Result<()> {
        let result = self.client.fetch_catalog(&query).await;
        if !self.catalog.apply(&query, result) {
            return Ok(());
        }
        if let Some(error) = self.catalog.error() {
            bail!("{error}");
        }

        if let Some(title) = self.catalog.search() {
            writeln!(out, "Films matching '{title}':")?;
        }
        match self.catalog.page() {
            Some(page) if !page.content.is_empty() => {
                let show_status = self.catalog.scope() == CatalogScope::All;
                for film in &page.content {
                    writeln!(out, "{}", film_line(film, show_status))?;
                }
                writeln!(out, "{}", page_footer(page))?;
            }
            _ => writeln!(out, "No films found")?,
        }
        Ok(())
    }

    fn show_purchase<W: Write>(&self, out: &mut W) -> Result<()> {
        match self.purchases.state() {
            PurchaseState::Idle => writeln!(out, "No purchase in progress")?,
            PurchaseState::ItemSelected(draft) | PurchaseState::Configuring(draft) => {
                write_draft(&draft, out)?;
                writeln!(out, "Type 'confirm' to buy or 'cancel' to close")?;
            }
            PurchaseState::Submitting { .. } => writeln!(out, "Submitting purchase...")?,
            PurchaseState::Succeeded { purchase, .. } => {
                writeln!(out, "Purchase #{} confirmed", purchase.id)?;
            }
            PurchaseState::Failed { draft, message } => {
                write_draft(&draft, out)?;
                writeln!(out, "Last attempt failed: {message}")?;
            }
        }
        Ok(())
    }

    async fn show_history<W: Write>(&self, out: &mut W) -> Result<()> {
        self.purchases.refresh_history().await?;
        let history = self.purchases.history();
        if let Some(error) = history.error() {
            bail!("{error}");
        }
        if history.purchases().is_empty() {
            writeln!(out, "You have no purchases yet")?;
            return Ok(());
        }
        for purchase in history.purchases() {
            writeln!(out, "{}", purchase_line(purchase))?;
        }
        if history.total() > history.purchases().len() as u64 {
            writeln!(
                out,
                "Showing {} of {} purchases",
                history.purchases().len(),
                history.total()
            )?;
        }
        Ok(())
    }

    async fn admin<W: Write>(&mut self, command: AdminCommand, out: &mut W) -> Result<()> {
        match command {
            AdminCommand::Films(page) => {
                self.require(&Route::AdminFilms)?;
                let films = self
                    .client
                    .list_films(page.unwrap_or(0), self.page_size)
                    .await?;
                for film in &films.content {
                    writeln!(out, "{}", film_line(film, true))?;
                }
                writeln!(out, "{}", page_footer(&films))?;
            }
            AdminCommand::FilmCreate {
                film_json,
                image,
                folder,
            } => {
                self.require(&Route::AdminFilmCreate)?;
                let raw = std::fs::read_to_string(&film_json)
                    .with_context(|| format!("Failed to read {}", film_json.display()))?;
                let request: CreateFilmRequest =
                    serde_json::from_str(&raw).context("Invalid film JSON")?;
                let image = ImageUpload::from_path(&image)
                    .with_context(|| format!("Failed to read {}", image.display()))?;
                let film = self
                    .client
                    .create_film(&request, image, folder.as_deref())
                    .await?;
                writeln!(out, "Created film #{} {}", film.id, film.title)?;
            }
            AdminCommand::FilmToggle(id) => {
                self.require(&Route::AdminFilms)?;
                let film = self.client.toggle_film_status(id).await?;
                writeln!(out, "Film #{} is now {}", film.id, status(film.enabled))?;
            }
            AdminCommand::FilmDelete(id) => {
                self.require(&Route::AdminFilms)?;
                self.client.delete_film(id).await?;
                writeln!(out, "Deleted film #{id}")?;
            }
            AdminCommand::Users(page) => {
                self.require(&Route::AdminUsers)?;
                let users = self
                    .client
                    .list_users(page.unwrap_or(0), self.page_size)
                    .await?;
                for user in &users.content {
                    writeln!(out, "{}", user_line(user))?;
                }
                writeln!(out, "{}", page_footer(&users))?;
            }
            AdminCommand::UserToggle(id) => {
                self.require(&Route::AdminUsers)?;
                let user = self.client.toggle_user_status(id).await?;
                writeln!(out, "User #{} is now {}", user.id, status(user.enabled))?;
            }
            AdminCommand::UserDelete(id) => {
                self.require(&Route::AdminUsers)?;
                self.client.delete_user(id).await?;
                writeln!(out, "Deleted user #{id}")?;
            }
            AdminCommand::Purchases(page) => {
                self.require(&Route::AdminPurchases)?;
                let purchases = self
                    .client
                    .list_purchases(page.unwrap_or(0), self.page_size)
                    .await?;
                for purchase in &purchases.content {
                    writeln!(out, "{}  user #{}", purchase_line(purchase), purchase.user_id)?;
                }
                writeln!(out, "{}", page_footer(&purchases))?;
            }
            AdminCommand::PurchaseDelete(id) => {
                self.require(&Route::AdminPurchases)?;
                self.client.delete_purchase(id).await?;
                writeln!(out, "Deleted purchase #{id}")?;
            }
        }
        Ok(())
    }
}

fn show_completion<W: Write>(completion: &Completion, out: &mut W) -> Result<()> {
    match completion {
        Completion::Succeeded {
            purchase,
            reconciliation,
        } => {
            writeln!(
                out,
                "Purchase #{} confirmed. Total charged: {}",
                purchase.id,
                reconciliation.shown_total()
            )?;
            if reconciliation.is_mismatch() {
                writeln!(
                    out,
                    "Note: the estimate was {}; the amount above is what the service recorded",
                    reconciliation.estimated
                )?;
            }
        }
        Completion::Failed { message } => {
            writeln!(out, "Purchase failed: {message}")?;
            writeln!(out, "Type 'confirm' to retry or 'cancel' to close")?;
        }
        Completion::Stale { .. } => {
            writeln!(out, "The purchase was closed before the service answered")?;
        }
    }
    Ok(())
}

fn write_draft<W: Write>(draft: &Draft, out: &mut W) -> Result<()> {
    let quote = draft.quote();
    writeln!(out, "{}", draft.item.title)?;
    writeln!(
        out,
        "  {} x {} = {}",
        quote.quantity, quote.unit_price, quote.subtotal
    )?;
    writeln!(out, "  Service fee:  {}", quote.fee)?;
    writeln!(out, "  Total:        {}", quote.total)?;
    writeln!(out, "  Payment:      {}", draft.payment_method)?;
    Ok(())
}

fn film_line(film: &Film, show_status: bool) -> String {
    let price = film
        .ticket_price
        .map_or_else(|| "no price".to_string(), |p| p.to_string());
    let mut line = format!(
        "#{:<4} {}  [{}]  {} min  {}",
        film.id, film.title, film.classification, film.duration, price
    );
    if show_status && !film.enabled {
        line.push_str("  (disabled)");
    }
    line
}

fn user_line(user: &Principal) -> String {
    let mut line = format!(
        "#{:<4} {}  <{}>  {}",
        user.id,
        user.full_name(),
        user.email,
        user.role
    );
    if !user.enabled {
        line.push_str("  (disabled)");
    }
    line
}

fn purchase_line(purchase: &Purchase) -> String {
    let items = purchase
        .details
        .iter()
        .map(|d| d.describe())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "#{:<4} {}  {}  {}  {}  {}",
        purchase.id,
        purchase.purchase_date.format("%d/%m/%Y %H:%M"),
        items,
        purchase.total_amount,
        purchase.payment_method,
        purchase.payment_status
    )
}

fn page_footer<T>(page: &Page<T>) -> String {
    format!(
        "Page {} of {} ({} total)",
        page.number + 1,
        page.total_pages.max(1),
        page.total_elements
    )
}

fn status(enabled: bool) -> &'static str {
    if enabled { "enabled" } else { "disabled" }
}

fn read_line<R: BufRead>(input: &mut R) -> std::io::Result<Option<String>> {
    let mut buf = String::new();
    if input.read_line(&mut buf)? == 0 {
        return Ok(None);
    }
    Ok(Some(buf.trim_end_matches(['\r', '\n']).to_string()))
}

fn ask<R: BufRead, W: Write>(input: &mut R, out: &mut W, label: &str) -> Result<String> {
    write!(out, "{label}")?;
    out.flush()?;
    let line = read_line(input)?.context("Input closed")?;
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use film_tickets::{Money, api::FilmClassification};

    #[test]
    fn film_line_shows_price_and_status() {
        let mut film = Film {
            id: 4,
            title: "Dune".to_string(),
            description: String::new(),
            image_url: None,
            genre: "SCI_FI".to_string(),
            classification: FilmClassification::TwelveYears,
            duration: 155,
            ticket_price: Some(Money::from_major(10_000)),
            enabled: false,
        };
        assert_eq!(
            film_line(&film, true),
            "#4    Dune  [12+ years]  155 min  $10,000.00  (disabled)"
        );
        film.ticket_price = None;
        assert!(film_line(&film, false).ends_with("no price"));
    }

    #[test]
    fn read_line_strips_line_endings() {
        let mut input = std::io::Cursor::new("buy 4\r\nqty 2\n");
        assert_eq!(read_line(&mut input).unwrap().as_deref(), Some("buy 4"));
        assert_eq!(read_line(&mut input).unwrap().as_deref(), Some("qty 2"));
        assert_eq!(read_line(&mut input).unwrap(), None);
    }
}
