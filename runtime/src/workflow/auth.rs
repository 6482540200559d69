//! Sign in to the app with email and password.

use crate::error::{ExportError, PageError};
use crate::page::{selectors, PageDriver};
use tracing::{info, warn};

/// Fill the login form, press "Sign In" and wait for the app to navigate.
///
/// The password is never logged.
pub async fn login(page: &dyn PageDriver, email: &str, password: &str) -> Result<(), ExportError> {
    info!(step = "login", "signing in as {email}");

    let result = async {
        page.fill(selectors::EMAIL_FIELD, email, selectors::ACTION_TIMEOUT)
            .await?;
        page.fill(selectors::PASSWORD_FIELD, password, selectors::ACTION_TIMEOUT)
            .await?;

        info!(step = "login", "waiting for login to complete");
        tokio::try_join!(
            page.click_matching(
                selectors::APP_BUTTONS,
                selectors::SIGN_IN_TEXT,
                selectors::ACTION_TIMEOUT,
            ),
            page.wait_for_navigation(selectors::NAVIGATION_TIMEOUT),
        )?;
        Ok::<(), PageError>(())
    }
    .await
    .map_err(ExportError::Login);

    if let Err(e) = &result {
        warn!(step = "login", "{e}");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::mock::MockPage;
    use crate::workflow::log_capture;

    #[tokio::test]
    async fn test_login_fills_then_submits() {
        let page = MockPage::new();
        login(&page, "me@example.com", "hunter2").await.unwrap();

        let calls = page.calls();
        assert_eq!(calls[0], "fill:[name='email']");
        assert_eq!(calls[1], "fill:[name='password']");
        assert!(calls.contains(&"click_matching:#app button:Sign In".to_string()));
        assert!(calls.contains(&"wait_for_navigation".to_string()));
    }

    #[tokio::test]
    async fn test_missing_sign_in_button_is_reported() {
        let page = MockPage::new().missing(selectors::SIGN_IN_TEXT);
        let err = login(&page, "me@example.com", "hunter2").await.unwrap_err();

        assert!(matches!(err, ExportError::Login(_)));
        assert_eq!(err.step(), "login");
        assert!(err.to_string().contains("Sign In"));
    }

    #[tokio::test]
    async fn test_login_failure_is_logged_without_password() {
        let (_guard, logs) = log_capture::capture();
        let page = MockPage::new().missing(selectors::PASSWORD_FIELD);
        login(&page, "me@example.com", "hunter2").await.unwrap_err();

        let warnings = logs.warnings_for("login");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("[name='password']"));
        assert!(!logs.contents().contains("hunter2"));
    }

    #[tokio::test]
    async fn test_missing_email_field_stops_before_submit() {
        let page = MockPage::new().missing(selectors::EMAIL_FIELD);
        assert!(login(&page, "a@b.c", "pw").await.is_err());
        assert!(page.position("fill:[name='password']").is_none());
    }
}
