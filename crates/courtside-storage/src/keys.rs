//! Storage key names.

/// Keys under which credentials are stored.
///
/// These names are shared with every other client build that reads the
/// same profile, so they must not change.
pub struct StorageKeys;

impl StorageKeys {
    pub const ACCESS_TOKEN: &'static str = "accessToken";
    pub const REFRESH_TOKEN: &'static str = "refreshToken";
    pub const USER_DATA: &'static str = "userData";

    /// Every key the vault owns, in the order they are cleared.
    pub const ALL: [&'static str; 3] =
        [Self::ACCESS_TOKEN, Self::REFRESH_TOKEN, Self::USER_DATA];
}
