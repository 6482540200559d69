//! Locations of UI affordances in the Roam Research web app.

use std::time::Duration;

/// Sign-in page the session starts from.
pub const LOGIN_URL: &str = "https://roamresearch.com/#/signin";

pub const EMAIL_FIELD: &str = "[name='email']";
pub const PASSWORD_FIELD: &str = "[name='password']";
/// Candidate buttons for the sign-in control.
pub const APP_BUTTONS: &str = "#app button";
pub const SIGN_IN_TEXT: &str = "Sign In";

/// Overflow ("more") menu in the top bar.
pub const MORE_MENU: &str = ".bp3-icon-more";
/// Both the menu entry and the dialog's confirm button carry this text.
pub const EXPORT_ALL_TEXT: &str = "Export All";

/// Label of the format currently chosen in the export dialog.
pub const CURRENT_FORMAT: &str = ".bp3-dialog .bp3-popover-target .bp3-button-text";
/// Caret that opens the format dropdown.
pub const FORMAT_DROPDOWN: &str = ".bp3-dialog .bp3-popover-target .bp3-icon-caret-down";

pub const MENU_TIMEOUT: Duration = Duration::from_secs(1);
pub const FORMAT_LABEL_TIMEOUT: Duration = Duration::from_secs(10);
pub const ACTION_TIMEOUT: Duration = Duration::from_secs(30);
pub const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(10 * 60);
