// Google Drive access: OAuth2 credentials plus the files API.
//
// The core layer only sees `DriveSource`; everything Google-specific lives here.

pub mod drive_client;
pub mod google_auth;

pub use drive_client::GoogleDriveClient;
pub use google_auth::{CredentialSource, GoogleAuth};
