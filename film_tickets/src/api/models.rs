//! Wire models for the film, user and purchase endpoints.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{auth::UserId, money::Money};

pub type FilmId = i64;
pub type PurchaseId = i64;

/// Page envelope returned by every list endpoint.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_pages: u32,
    pub total_elements: u64,
    pub number: u32,
    pub size: u32,
    #[serde(default)]
    pub first: bool,
    #[serde(default)]
    pub last: bool,
    #[serde(default)]
    pub empty: bool,
    #[serde(default)]
    pub number_of_elements: u32,
}

impl<T> Page<T> {
    #[must_use]
    pub fn has_next(&self) -> bool {
        !self.last && self.number + 1 < self.total_pages
    }

    #[must_use]
    pub fn has_previous(&self) -> bool {
        !self.first && self.number > 0
    }
}

/// Age classification of a film.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilmClassification {
    AllAudiences,
    SevenYears,
    TwelveYears,
    FifteenYears,
    EighteenYears,
    #[serde(other)]
    Unrated,
}

impl FilmClassification {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            FilmClassification::AllAudiences => "All audiences",
            FilmClassification::SevenYears => "7+ years",
            FilmClassification::TwelveYears => "12+ years",
            FilmClassification::FifteenYears => "15+ years",
            FilmClassification::EighteenYears => "18+ years",
            FilmClassification::Unrated => "Unrated",
        }
    }
}

impl fmt::Display for FilmClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Catalog entry.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Film {
    pub id: FilmId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub genre: String,
    #[serde(default = "unrated")]
    pub classification: FilmClassification,
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub ticket_price: Option<Money>,
    #[serde(default)]
    pub enabled: bool,
}

fn unrated() -> FilmClassification {
    FilmClassification::Unrated
}

/// Film fields sent on creation (as the `filmData` multipart part).
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFilmRequest {
    pub title: String,
    pub description: String,
    pub genre: String,
    pub classification: FilmClassification,
    pub duration: u32,
    pub ticket_price: Money,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFilmRequest {
    pub id: FilmId,
    pub title: String,
    pub description: String,
    pub genre: String,
    pub classification: FilmClassification,
    pub duration: u32,
    pub ticket_price: Money,
}

/// Poster image uploaded with a new film.
#[derive(Clone, Debug)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Read an image from disk, guessing its content type from the extension.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be read.
    pub fn from_path(path: &std::path::Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map_or_else(|| "image".to_string(), |n| n.to_string_lossy().into_owned());
        let content_type = match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("png") => "image/png",
            Some("jpg" | "jpeg") => "image/jpeg",
            Some("gif") => "image/gif",
            Some("webp") => "image/webp",
            _ => "application/octet-stream",
        }
        .to_string();

        Ok(Self {
            file_name,
            content_type,
            bytes,
        })
    }
}

/// Admin update of a user. `password` is only sent when changing it.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub id: UserId,
    pub name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Payment method tag. The client attaches no semantics to it.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    CreditCard,
    Pse,
    Cash,
    #[serde(other)]
    Other,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::CreditCard,
        PaymentMethod::Pse,
        PaymentMethod::Cash,
        PaymentMethod::Other,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "Credit Card",
            PaymentMethod::Pse => "PSE",
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Other => "Other",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "credit_card" | "card" => Ok(PaymentMethod::CreditCard),
            "pse" => Ok(PaymentMethod::Pse),
            "cash" => Ok(PaymentMethod::Cash),
            "other" => Ok(PaymentMethod::Other),
            other => Err(format!(
                "unknown payment method '{other}' (expected credit_card, pse, cash or other)"
            )),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePurchaseDetail {
    pub film_id: FilmId,
    pub quantity: u32,
    pub unit_price: Money,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePurchaseRequest {
    pub user_id: UserId,
    pub payment_method: PaymentMethod,
    pub details: Vec<CreatePurchaseDetail>,
}

/// One line of a purchase. The service sends either the film id or the
/// full film.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseDetail {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub film_id: Option<FilmId>,
    #[serde(default)]
    pub film: Option<Film>,
    pub quantity: u32,
    pub unit_price: Money,
}

impl PurchaseDetail {
    #[must_use]
    pub fn film_id(&self) -> Option<FilmId> {
        self.film_id.or_else(|| self.film.as_ref().map(|f| f.id))
    }

    /// Film title when the service embedded the film, else `#id`.
    #[must_use]
    pub fn describe(&self) -> String {
        match (&self.film, self.film_id()) {
            (Some(film), _) => format!("{} ({}x)", film.title, self.quantity),
            (None, Some(id)) => format!("#{id} ({}x)", self.quantity),
            (None, None) => format!("unknown film ({}x)", self.quantity),
        }
    }
}

/// Purchase record. Created by the service; read-only on the client.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: PurchaseId,
    pub user_id: UserId,
    #[serde(with = "purchase_date")]
    pub purchase_date: NaiveDateTime,
    #[serde(default)]
    pub details: Vec<PurchaseDetail>,
    pub total_amount: Money,
    #[serde(default)]
    pub payment_status: String,
    pub payment_method: PaymentMethod,
}

/// `purchaseDate` arrives either as ISO-8601 or as `dd/MM/yyyy HH:mm`.
mod purchase_date {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%d/%m/%Y %H:%M"];

    pub fn serialize<S: Serializer>(
        date: &NaiveDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format("%Y-%m-%dT%H:%M:%S"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(&raw, fmt).ok())
            .ok_or_else(|| serde::de::Error::custom(format!("unrecognized purchase date '{raw}'")))
    }
}
