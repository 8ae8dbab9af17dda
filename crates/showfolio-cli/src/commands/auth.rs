//! Account command handlers

use anyhow::{bail, Result};

use showfolio_core::{AuthProvider, LocalAuth, Session};

use crate::output::{Output, OutputFormat};

/// Create an account and sign in
pub fn signup(
    auth: &mut LocalAuth,
    email: String,
    password: String,
    name: Option<String>,
    output: &Output,
) -> Result<()> {
    let identity = auth.sign_up(&email, &password, name.as_deref().unwrap_or_default())?;

    output.success(&format!("Welcome, {}!", identity.display_name));
    output.print_identity(Some(&identity));
    Ok(())
}

/// Sign in
pub fn login(auth: &mut LocalAuth, email: String, password: String, output: &Output) -> Result<()> {
    let identity = auth.sign_in(&email, &password)?;

    output.success(&format!("Signed in as {}", identity.email));
    Ok(())
}

/// Sign out
pub fn logout(auth: &mut LocalAuth, output: &Output) -> Result<()> {
    if auth.current().is_none() {
        output.message("Not signed in.");
        return Ok(());
    }
    auth.sign_out()?;

    output.success("Signed out");
    Ok(())
}

/// Request a reset token, or spend one
pub fn reset_password(
    auth: &mut LocalAuth,
    email: Option<String>,
    token: Option<String>,
    new_password: Option<String>,
    output: &Output,
) -> Result<()> {
    match (email, token, new_password) {
        (_, Some(token), Some(new_password)) => {
            auth.complete_password_reset(&token, &new_password)?;
            output.success("Password updated. You can sign in with your new password.");
        }
        (_, Some(_), None) => bail!("--new-password is required with --token"),
        (_, None, Some(_)) => bail!(
            "--new-password needs the --token from a reset request. \
             Request one with: showfolio auth reset-password <EMAIL>"
        ),
        (Some(email), None, None) => {
            let token = auth.request_password_reset(&email)?;
            match output.format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::json!({"status": "success", "email": email, "token": token})
                ),
                OutputFormat::Quiet => println!("{}", token),
                OutputFormat::Human => {
                    println!("✓ Password reset requested for {}", email);
                    println!();
                    println!("Reset token: {}", token);
                    println!("Finish with:");
                    println!(
                        "  showfolio auth reset-password --token {} --new-password <PASSWORD>",
                        token
                    );
                }
            }
        }
        (None, None, _) => bail!("Provide an email to request a reset, or --token to finish one"),
    }
    Ok(())
}

/// Show the signed-in identity
pub fn whoami(session: &Session, output: &Output) -> Result<()> {
    output.print_identity(session.current().as_ref());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet() -> Output {
        Output::new(OutputFormat::Quiet)
    }

    #[test]
    fn test_new_password_without_token_is_refused() {
        let mut auth = LocalAuth::open_in_memory(5).unwrap();

        let err = reset_password(
            &mut auth,
            Some("ben@example.com".into()),
            None,
            Some("hunter22".into()),
            &quiet(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("--token"));
    }

    #[test]
    fn test_token_without_new_password_is_refused() {
        let mut auth = LocalAuth::open_in_memory(5).unwrap();

        let err =
            reset_password(&mut auth, None, Some("abc".into()), None, &quiet()).unwrap_err();
        assert!(err.to_string().contains("--new-password"));
    }

    #[test]
    fn test_reset_request_for_unknown_email() {
        let mut auth = LocalAuth::open_in_memory(5).unwrap();

        let err = reset_password(
            &mut auth,
            Some("nobody@example.com".into()),
            None,
            None,
            &quiet(),
        )
        .unwrap_err();
        assert_eq!(
            err.downcast_ref::<showfolio_core::AuthError>(),
            Some(&showfolio_core::AuthError::UserNotFound)
        );
    }
}
