//! Scripted sessions through the interactive client.
//!
//! The API points at a port nothing listens on, so every command that
//! reaches the network fails with a transport error.

use film_tickets::{Principal, Role, SessionStore};
use ft_client::{app::App, config::ClientConfig};
use std::io::Cursor;

const UNREACHABLE: &str = "http://127.0.0.1:9/api";

fn config() -> ClientConfig {
    ClientConfig {
        api_url: UNREACHABLE.to_string(),
        session_file: None,
        ..ClientConfig::default()
    }
}

fn signed_in(role: Role) -> SessionStore {
    let store = SessionStore::in_memory();
    let principal = Principal {
        id: 9,
        name: "Ana".to_string(),
        last_name: "Gomez".to_string(),
        phone: "3001234567".to_string(),
        email: "ana@example.com".to_string(),
        role,
        enabled: true,
    };
    store.save_session("user-token", &principal).unwrap();
    store
}

async fn run_script(store: SessionStore, script: &str) -> String {
    let mut app = App::with_store(&config(), store).unwrap();
    let mut out = Vec::new();
    app.run(Cursor::new(script.to_string()), &mut out)
        .await
        .unwrap();
    String::from_utf8(out).unwrap()
}

#[tokio::test]
async fn guest_is_sent_to_login() {
    let out = run_script(
        SessionStore::in_memory(),
        "films\nbuy 4\nhistory\ngo /movies\ngo /\nwhoami\nquit\n",
    )
    .await;

    assert_eq!(out.matches("Error: Please log in first").count(), 3);
    assert_eq!(out.matches("Redirected to /login").count(), 2);
    assert!(out.contains("Not signed in"));
}

#[tokio::test]
async fn user_cannot_open_admin_pages() {
    let out = run_script(
        signed_in(Role::User),
        "admin users\ngo /admin/films\nwhoami\nquit\n",
    )
    .await;

    assert!(out.contains("Signed in as ana@example.com (USER)"));
    assert!(out.contains("Error: You are not authorized to open /admin/users"));
    assert!(out.contains("Redirected to /unauthorized"));
    assert!(out.contains("Ana Gomez <ana@example.com> (USER)"));
}

#[tokio::test]
async fn purchase_commands_need_an_open_purchase() {
    let out = run_script(signed_in(Role::User), "qty 3\nconfirm\nquit\n").await;

    assert!(out.contains("Error: Cannot change the quantity while idle"));
    assert!(out.contains("Error: Cannot confirm while idle"));
}

#[tokio::test]
async fn parse_errors_do_not_end_the_session() {
    let out = run_script(
        SessionStore::in_memory(),
        "dance\nbuy four\npay bitcoin\nhelp\nquit\n",
    )
    .await;

    assert!(out.contains("Error: Unrecognized command 'dance'"));
    assert!(out.contains("Error: Invalid film id 'four'"));
    assert!(out.contains("Error: Unknown payment method 'bitcoin'"));
    assert!(out.contains("admin film-create JSON IMAGE [FOLDER]"));
}

#[tokio::test]
async fn transport_failure_is_reported() {
    let out = run_script(signed_in(Role::User), "films\nsearch dune\nquit\n").await;

    assert_eq!(out.matches("Error: Request failed").count(), 2);
}

#[tokio::test]
async fn invalid_registration_lists_every_field() {
    let out = run_script(
        SessionStore::in_memory(),
        "register\nAna1\nGomez\n123\nnot-an-email\nshort\nother\nwhoami\nquit\n",
    )
    .await;

    assert!(out.contains("Please fix the following:"));
    assert!(out.contains("  name: The name can only contain letters"));
    assert!(out.contains("  phone: The phone number must be 10 digits long"));
    assert!(out.contains("  email: The email is not valid"));
    assert!(out.contains("  password: The password must be at least 8 characters long"));
    assert!(out.contains("  confirmPassword: The passwords do not match"));
    assert!(out.contains("Not signed in"));
}

#[tokio::test]
async fn logout_clears_the_session() {
    let store = signed_in(Role::Admin);
    let out = run_script(store.clone(), "logout\nwhoami\nlogout\nquit\n").await;

    assert_eq!(out.matches("Signed out").count(), 2);
    assert!(out.contains("Not signed in"));
    assert!(!store.is_authenticated());
}

#[tokio::test]
async fn end_of_input_ends_the_session() {
    let out = run_script(SessionStore::in_memory(), "whoami\n").await;
    assert!(out.contains("Not signed in"));
    assert!(out.ends_with("guest> "));
}

#[tokio::test]
async fn session_file_survives_restarts() {
    let id: u32 = rand::random();
    let path = std::env::temp_dir()
        .join(format!("ft_client_session_{id}"))
        .join("session.json");
    signed_in_file(&path);

    let config = ClientConfig {
        session_file: Some(path.clone()),
        ..config()
    };
    let mut app = App::new(&config).unwrap();
    let mut out = Vec::new();
    app.run(Cursor::new("whoami\nlogout\nquit\n"), &mut out)
        .await
        .unwrap();
    let out = String::from_utf8(out).unwrap();

    assert!(out.contains("Ana Gomez <ana@example.com> (ADMIN)"));
    assert!(!SessionStore::file(&path).is_authenticated());
    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

fn signed_in_file(path: &std::path::Path) {
    let store = SessionStore::file(path);
    let admin = signed_in(Role::Admin).user().unwrap();
    store.save_session("admin-token", &admin).unwrap();
}
