//! CLI commands

use anyhow::{Context as _, Result, bail};
use clap::Subcommand;
use classdesk_application::auth::AuthService;
use classdesk_domain::auth::{Credentials, RegisterRequest};
use classdesk_domain::request::{ApiRequest, HttpMethod};
use classdesk_domain::session::token_preview;
use serde_json::Value;

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store the session
    Login {
        /// Account email
        email: String,

        /// Account password
        #[arg(long, env = "CLASSDESK_PASSWORD", hide_env_values = true)]
        password: String,

        /// School slug, when the email belongs to several schools
        #[arg(long)]
        school: Option<String>,
    },

    /// Register a new school and its first admin
    Register {
        /// Display name of the school
        #[arg(long)]
        school_name: String,

        /// Unique URL-safe school identifier
        #[arg(long)]
        school_slug: String,

        /// Admin email
        #[arg(long)]
        email: String,

        /// Admin password
        #[arg(long, env = "CLASSDESK_PASSWORD", hide_env_values = true)]
        password: String,

        /// Admin given name
        #[arg(long)]
        first_name: String,

        /// Admin family name
        #[arg(long)]
        last_name: String,

        /// Contact phone
        #[arg(long)]
        phone: Option<String>,

        /// Street address
        #[arg(long)]
        address: String,

        /// City
        #[arg(long)]
        city: String,

        /// Country
        #[arg(long)]
        country: String,
    },

    /// Forget the stored session
    Logout,

    /// Fetch the logged-in user from the backend
    Whoami,

    /// Show the stored session without contacting the backend
    Status,

    /// Change the password of the logged-in user
    ChangePassword {
        /// Password currently in use
        #[arg(long)]
        current: String,

        /// Replacement password
        #[arg(long)]
        new: String,
    },

    /// Email a password reset link
    ResetPassword {
        /// Account email
        email: String,
    },

    /// Set a new password with a reset token
    ConfirmReset {
        /// Token from the reset email
        #[arg(long)]
        token: String,

        /// Replacement password
        #[arg(long)]
        new_password: String,
    },

    /// Send an authenticated request and print the response body
    Request {
        /// HTTP method
        method: HttpMethod,

        /// Path relative to the base URL, e.g. /schools/1/classes
        path: String,

        /// JSON body
        #[arg(long)]
        body: Option<String>,

        /// Query parameter as key=value; repeatable
        #[arg(short, long = "query", value_parser = parse_query)]
        query: Vec<(String, String)>,
    },
}

fn parse_query(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {raw}"))
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

impl Commands {
    /// Runs the command.
    pub async fn execute(self, auth: &AuthService) -> Result<()> {
        match self {
            Self::Login {
                email,
                password,
                school,
            } => {
                let mut credentials = Credentials::new(email, password);
                if let Some(slug) = school {
                    credentials = credentials.with_school(slug);
                }
                let user = auth.login(&credentials).await?;
                println!("Logged in as {}", user.display_name());
            }

            Self::Register {
                school_name,
                school_slug,
                email,
                password,
                first_name,
                last_name,
                phone,
                address,
                city,
                country,
            } => {
                let registration = RegisterRequest {
                    school_name,
                    school_slug,
                    email,
                    password,
                    first_name,
                    last_name,
                    phone,
                    address,
                    city,
                    country,
                };
                let registered = auth.register(&registration).await?;
                println!("{}", registered.message);
                println!(
                    "School {} ({}) is {}",
                    registered.school.name, registered.school.slug, registered.school.status
                );
            }

            Self::Logout => auth.logout().await,

            Self::Whoami => {
                let user = auth.current_user().await?;
                print_json(&serde_json::to_value(&user)?)?;
            }

            Self::Status => {
                let session = auth.client().store().snapshot().await;
                match session.user() {
                    Some(user) if session.is_authenticated() => {
                        println!("Logged in as {} <{}>", user.display_name(), user.email);
                        if let Some(token) = session.access_token() {
                            println!("Access token: {}", token_preview(token));
                        }
                    }
                    _ => println!("Not logged in"),
                }
                println!("Backend: {}", auth.client().base_url());
            }

            Self::ChangePassword { current, new } => {
                auth.change_password(&current, &new).await?;
                println!("Password changed");
            }

            Self::ResetPassword { email } => {
                auth.reset_password(&email).await?;
                println!("If {email} has an account, a reset link is on its way");
            }

            Self::ConfirmReset {
                token,
                new_password,
            } => {
                auth.confirm_reset(&token, &new_password).await?;
                println!("Password reset; log in with the new password");
            }

            Self::Request {
                method,
                path,
                body,
                query,
            } => {
                let mut request = ApiRequest::new(method, path);
                for (name, value) in query {
                    request = request.with_query(name, value);
                }
                if let Some(raw) = body {
                    if !method.has_body() {
                        bail!("{method} requests take no body");
                    }
                    let value: Value = serde_json::from_str(&raw).context("parsing --body")?;
                    request = request.with_body(value);
                }

                let response = auth.client().send(&request).await?;
                match response.json::<Value>() {
                    Ok(value) => print_json(&value)?,
                    Err(_) => println!("{}", response.text()),
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    #[derive(Parser)]
    struct Harness {
        #[command(subcommand)]
        command: Commands,
    }

    #[test]
    fn test_parse_request_command() {
        let parsed = Harness::try_parse_from([
            "classdesk",
            "request",
            "post",
            "/schools/1/classes",
            "--body",
            r#"{"name": "P6 A"}"#,
            "-q",
            "page=2",
        ])
        .unwrap();

        match parsed.command {
            Commands::Request {
                method,
                path,
                body,
                query,
            } => {
                assert_eq!(method, HttpMethod::Post);
                assert_eq!(path, "/schools/1/classes");
                assert!(body.is_some());
                assert_eq!(query, vec![("page".to_string(), "2".to_string())]);
            }
            _ => panic!("expected request command"),
        }
    }

    #[test]
    fn test_parse_query_rejects_missing_separator() {
        assert!(parse_query("page").is_err());
        assert_eq!(
            parse_query("q=a=b").unwrap(),
            ("q".to_string(), "a=b".to_string())
        );
    }

    #[test]
    fn test_unknown_method_is_rejected() {
        assert!(Harness::try_parse_from(["classdesk", "request", "TRACE", "/"]).is_err());
    }
}
