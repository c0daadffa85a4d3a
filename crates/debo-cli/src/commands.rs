//! Command handlers.

use std::future::Future;

use anyhow::{Context as _, Result};
use debo_core::auth::AuthService;
use debo_core::models::Page;
use debo_core::{services, ApiError, Config, HttpClient, RequestConfig};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Environment variable consulted before prompting for a password
const PASSWORD_ENV: &str = "DEBO_PASSWORD";

pub struct Context {
    pub public: HttpClient,
    pub authed: HttpClient,
    pub cancel: CancellationToken,
}

/// Sign-in details, read before any request goes out.
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Context {
    fn request_config(&self, page: Option<u32>) -> RequestConfig {
        let config = RequestConfig::new().cancel_with(self.cancel.clone());
        match page {
            Some(page) => config.param("page", page),
            None => config,
        }
    }

    fn auth(&self) -> Result<AuthService> {
        Ok(AuthService::new(self.authed.clone())?)
    }
}

/// Run a command until it completes or `cancel` fires.
///
/// Returns `None` when interrupted. Dropping the command future aborts any
/// request it has in flight.
pub async fn until_interrupted<T>(
    cancel: &CancellationToken,
    command: impl Future<Output = Result<T>>,
) -> Result<Option<T>> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            info!("Interrupted");
            Ok(None)
        }
        result = command => result.map(Some),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Cancellation is a quiet exit; everything else is reported.
fn finish<T>(result: Result<T, ApiError>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_canceled() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn print_page<T: Serialize>(page: &Page<T>) -> Result<()> {
    for item in &page.results {
        print_json(item)?;
    }
    Ok(())
}

pub async fn list_projects(ctx: &Context, page: Option<u32>, all: bool) -> Result<()> {
    let projects = services::projects(&ctx.public);

    let Some(mut current) = finish(projects.list_all(Some(ctx.request_config(page))).await)? else {
        return Ok(());
    };
    print_page(&current)?;

    while all && current.has_next() {
        match finish(projects.next_page(&current).await)? {
            Some(Some(next)) => {
                print_page(&next)?;
                current = next;
            }
            _ => break,
        }
    }

    eprintln!("{} project(s) total", current.count);
    Ok(())
}

pub async fn get_project(ctx: &Context, id: &str) -> Result<()> {
    if let Some(project) = finish(services::projects(&ctx.public).get(id).await)? {
        print_json(&project)?;
    }
    Ok(())
}

pub async fn list_users(ctx: &Context, page: Option<u32>) -> Result<()> {
    let users = services::users(&ctx.authed);
    if let Some(page) = finish(users.list_all(Some(ctx.request_config(page))).await)? {
        print_page(&page)?;
        eprintln!("{} user(s) total", page.count);
    }
    Ok(())
}

pub async fn get_user(ctx: &Context, id: &str) -> Result<()> {
    if let Some(user) = finish(services::users(&ctx.authed).get(id).await)? {
        print_json(&user)?;
    }
    Ok(())
}

/// Email from the flag, the last session or a prompt; password from the
/// environment or a hidden prompt.
pub fn read_credentials(settings: &Config, email: Option<String>) -> Result<Credentials> {
    let email = match email.or_else(|| settings.last_email.clone()) {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    let password = match std::env::var(PASSWORD_ENV) {
        Ok(password) => password,
        Err(_) => rpassword::prompt_password("Password: ").context("Failed to read password")?,
    };
    Ok(Credentials { email, password })
}

pub async fn login(ctx: &Context, credentials: &Credentials) -> Result<()> {
    let response = ctx
        .auth()?
        .login(&credentials.email, &credentials.password)
        .await?;
    if response.access.is_none() {
        anyhow::bail!("Server accepted the login but returned no access token");
    }

    eprintln!("Signed in as {}", credentials.email);
    Ok(())
}

/// Interrupting only abandons the server call; the token is still cleared.
pub async fn logout(ctx: &Context) {
    match ctx.auth() {
        Ok(auth) => {
            auth.logout_with(Some(RequestConfig::new().cancel_with(ctx.cancel.clone())))
                .await;
            eprintln!("Signed out");
        }
        Err(e) => warn!(error = %e, "Logout unavailable"),
    }
}

pub fn status(ctx: &Context) {
    let signed_in = ctx.auth().map(|auth| auth.is_authenticated()).unwrap_or(false);
    if signed_in {
        println!("signed in");
    } else {
        println!("signed out");
    }
}

fn prompt(label: &str) -> Result<String> {
    use std::io::Write;

    eprint!("{}", label);
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    let value = line.trim().to_string();
    if value.is_empty() {
        anyhow::bail!("No value entered");
    }
    Ok(value)
}
