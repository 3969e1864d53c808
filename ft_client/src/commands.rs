use film_tickets::api::{FilmId, PaymentMethod, PurchaseId};
use film_tickets::auth::UserId;
use std::{fmt, path::PathBuf};

/// A line typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    Login {
        email: String,
        password: Option<String>,
    },
    Register,
    Logout,
    WhoAmI,
    Profile,
    ProfileSet {
        field: ProfileField,
        value: String,
    },
    Go(String),
    Films(Option<u32>),
    Next,
    Prev,
    Search(String),
    ClearSearch,
    Buy(FilmId),
    /// Raw quantity input; the purchase flow normalizes it.
    Quantity(String),
    More,
    Less,
    Pay(PaymentMethod),
    Confirm,
    Cancel,
    History,
    Admin(AdminCommand),
}

/// Profile fields a user may change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Name,
    LastName,
    Phone,
    Email,
    Password,
}

/// Management commands, available to admins only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    Films(Option<u32>),
    FilmCreate {
        film_json: PathBuf,
        image: PathBuf,
        folder: Option<String>,
    },
    FilmToggle(FilmId),
    FilmDelete(FilmId),
    Users(Option<u32>),
    UserToggle(UserId),
    UserDelete(UserId),
    Purchases(Option<u32>),
    PurchaseDelete(PurchaseId),
}

/// Errors that can occur during command parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A numeric argument was not a valid number.
    InvalidNumber { what: &'static str, value: String },
    /// A required argument is missing.
    MissingArgument { usage: &'static str },
    /// Unknown payment method.
    InvalidPaymentMethod(String),
    /// Unknown profile field.
    InvalidProfileField(String),
    /// Unrecognized command.
    UnrecognizedCommand(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidNumber { what, value } => {
                write!(f, "Invalid {what} '{value}'. Must be a whole number")
            }
            Self::MissingArgument { usage } => write!(f, "Missing argument. Usage: {usage}"),
            Self::InvalidPaymentMethod(value) => write!(
                f,
                "Unknown payment method '{value}'. Use credit_card, pse, cash or other"
            ),
            Self::InvalidProfileField(value) => write!(
                f,
                "Unknown profile field '{value}'. Use name, lastName, phone, email or password"
            ),
            Self::UnrecognizedCommand(cmd) => write!(
                f,
                "Unrecognized command '{cmd}'. Type 'help' to see available commands"
            ),
        }
    }
}

impl std::error::Error for ParseError {}

pub const HELP: &str = "\
Account:
  login EMAIL [PASSWORD]      Sign in (asks for the password if omitted)
  register                    Create an account and sign in
  logout                      Sign out
  whoami                      Show the signed-in user
  profile                     Show your profile
  profile set FIELD VALUE     Change name, lastName, phone, email or password
  go PATH                     Navigate to a page, e.g. 'go /admin/films'

Films:
  films [PAGE]                List films (pages start at 1)
  next | prev                 Next or previous page
  search TITLE                Search films by title
  clear                       Clear the search

Tickets:
  buy FILM_ID                 Start buying tickets for a film
  qty N | more | less         Set, raise or lower the ticket count
  pay METHOD                  credit_card, pse, cash or other
  confirm                     Place the order (again after a failure to retry)
  cancel                      Close the purchase
  history                     Your purchases

Admin:
  admin films [PAGE]          All films, including disabled ones
  admin film-create JSON IMAGE [FOLDER]
  admin film-toggle ID        Enable or disable a film
  admin film-delete ID
  admin users [PAGE]
  admin user-toggle ID
  admin user-delete ID
  admin purchases [PAGE]
  admin purchase-delete ID

  help                        This text
  quit                        Exit
";

/// Parse a command line.
///
/// # Examples
///
/// ```
/// use ft_client::commands::{Command, parse_command};
///
/// assert_eq!(parse_command("buy 4"), Ok(Command::Buy(4)));
/// // Pages are typed one-based and stored zero-based.
/// assert_eq!(parse_command("films 2"), Ok(Command::Films(Some(1))));
/// assert!(parse_command("dance").is_err());
/// ```
pub fn parse_command(input: &str) -> Result<Command, ParseError> {
    let trimmed = input.trim();

    match trimmed {
        "help" | "?" => return Ok(Command::Help),
        "quit" | "exit" => return Ok(Command::Quit),
        "register" => return Ok(Command::Register),
        "logout" => return Ok(Command::Logout),
        "whoami" => return Ok(Command::WhoAmI),
        "profile" => return Ok(Command::Profile),
        "next" => return Ok(Command::Next),
        "prev" => return Ok(Command::Prev),
        "clear" => return Ok(Command::ClearSearch),
        "more" | "+" => return Ok(Command::More),
        "less" | "-" => return Ok(Command::Less),
        "confirm" => return Ok(Command::Confirm),
        "cancel" => return Ok(Command::Cancel),
        "history" | "tickets" => return Ok(Command::History),
        _ => {}
    }

    let parts: Vec<&str> = trimmed.split_ascii_whitespace().collect();
    match parts.first() {
        Some(&"login") => parse_login(trimmed, &parts),
        Some(&"profile") => parse_profile(trimmed, &parts),
        Some(&"go") => parts
            .get(1)
            .map(|path| Command::Go((*path).to_string()))
            .ok_or(ParseError::MissingArgument { usage: "go PATH" }),
        Some(&"films") => Ok(Command::Films(parse_page(parts.get(1))?)),
        Some(&"search") => {
            let title = rest(trimmed, "search");
            if title.is_empty() {
                return Err(ParseError::MissingArgument {
                    usage: "search TITLE",
                });
            }
            Ok(Command::Search(title.to_string()))
        }
        Some(&"buy") => Ok(Command::Buy(parse_id(parts.get(1), "film id", "buy FILM_ID")?)),
        Some(&"qty") => Ok(Command::Quantity(rest(trimmed, "qty").to_string())),
        Some(&"pay") => {
            let method = parts
                .get(1)
                .ok_or(ParseError::MissingArgument { usage: "pay METHOD" })?;
            method
                .parse()
                .map(Command::Pay)
                .map_err(|_| ParseError::InvalidPaymentMethod((*method).to_string()))
        }
        Some(&"admin") => parse_admin(&parts).map(Command::Admin),
        _ => Err(ParseError::UnrecognizedCommand(trimmed.to_string())),
    }
}

/// Parse "login EMAIL [PASSWORD]"
fn parse_login(line: &str, parts: &[&str]) -> Result<Command, ParseError> {
    let email = parts.get(1).ok_or(ParseError::MissingArgument {
        usage: "login EMAIL [PASSWORD]",
    })?;
    let password = after_words(line, 2);
    Ok(Command::Login {
        email: (*email).to_string(),
        password: (!password.is_empty()).then(|| password.to_string()),
    })
}

/// Parse "profile set FIELD VALUE..."
fn parse_profile(line: &str, parts: &[&str]) -> Result<Command, ParseError> {
    const USAGE: &str = "profile set FIELD VALUE";
    match (parts.get(1), parts.get(2)) {
        (Some(&"set"), Some(field)) => {
            let field = match field.to_ascii_lowercase().as_str() {
                "name" => ProfileField::Name,
                "lastname" | "last_name" => ProfileField::LastName,
                "phone" => ProfileField::Phone,
                "email" => ProfileField::Email,
                "password" => ProfileField::Password,
                _ => return Err(ParseError::InvalidProfileField((*field).to_string())),
            };
            if parts.len() < 4 {
                return Err(ParseError::MissingArgument { usage: USAGE });
            }
            Ok(Command::ProfileSet {
                field,
                value: after_words(line, 3).to_string(),
            })
        }
        _ => Err(ParseError::MissingArgument { usage: USAGE }),
    }
}

/// Parse "admin SUBCOMMAND ..."
fn parse_admin(parts: &[&str]) -> Result<AdminCommand, ParseError> {
    match parts.get(1) {
        Some(&"films") => Ok(AdminCommand::Films(parse_page(parts.get(2))?)),
        Some(&"film-create") => match (parts.get(2), parts.get(3)) {
            (Some(json), Some(image)) => Ok(AdminCommand::FilmCreate {
                film_json: PathBuf::from(json),
                image: PathBuf::from(image),
                folder: parts.get(4).map(|f| (*f).to_string()),
            }),
            _ => Err(ParseError::MissingArgument {
                usage: "admin film-create JSON IMAGE [FOLDER]",
            }),
        },
        Some(&"film-toggle") => Ok(AdminCommand::FilmToggle(parse_id(
            parts.get(2),
            "film id",
            "admin film-toggle ID",
        )?)),
        Some(&"film-delete") => Ok(AdminCommand::FilmDelete(parse_id(
            parts.get(2),
            "film id",
            "admin film-delete ID",
        )?)),
        Some(&"users") => Ok(AdminCommand::Users(parse_page(parts.get(2))?)),
        Some(&"user-toggle") => Ok(AdminCommand::UserToggle(parse_id(
            parts.get(2),
            "user id",
            "admin user-toggle ID",
        )?)),
        Some(&"user-delete") => Ok(AdminCommand::UserDelete(parse_id(
            parts.get(2),
            "user id",
            "admin user-delete ID",
        )?)),
        Some(&"purchases") => Ok(AdminCommand::Purchases(parse_page(parts.get(2))?)),
        Some(&"purchase-delete") => Ok(AdminCommand::PurchaseDelete(parse_id(
            parts.get(2),
            "purchase id",
            "admin purchase-delete ID",
        )?)),
        Some(other) => Err(ParseError::UnrecognizedCommand(format!("admin {other}"))),
        None => Err(ParseError::MissingArgument {
            usage: "admin films|users|purchases ...",
        }),
    }
}

/// One-based page number as typed, converted to the zero-based index the
/// service expects.
fn parse_page(value: Option<&&str>) -> Result<Option<u32>, ParseError> {
    let Some(value) = value else {
        return Ok(None);
    };
    match value.parse::<u32>() {
        Ok(page) if page >= 1 => Ok(Some(page - 1)),
        _ => Err(ParseError::InvalidNumber {
            what: "page",
            value: (*value).to_string(),
        }),
    }
}

fn parse_id(
    value: Option<&&str>,
    what: &'static str,
    usage: &'static str,
) -> Result<i64, ParseError> {
    let value = value.ok_or(ParseError::MissingArgument { usage })?;
    value
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ParseError::InvalidNumber {
            what,
            value: (*value).to_string(),
        })
}

/// Everything after the leading keyword, trimmed.
fn rest<'a>(line: &'a str, keyword: &str) -> &'a str {
    line.strip_prefix(keyword).unwrap_or_default().trim()
}

/// The line after its first `n` words, inner spacing kept as typed.
fn after_words(line: &str, n: usize) -> &str {
    let mut tail = line;
    for _ in 0..n {
        tail = tail.trim_start_matches(|c: char| c.is_ascii_whitespace());
        let end = tail
            .find(|c: char| c.is_ascii_whitespace())
            .unwrap_or(tail.len());
        tail = &tail[end..];
    }
    tail.trim_start_matches(|c: char| c.is_ascii_whitespace())
}
