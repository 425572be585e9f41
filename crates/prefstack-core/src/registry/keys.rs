//! Configuration key names and their owning backends.

use std::fmt;
use std::str::FromStr;

use super::InvalidValue;

/// Deprecated local-store key that held the biometric toggle before it moved
/// to the settings store as [`Key::SuBiometric`].
pub const LEGACY_SU_FINGERPRINT: &str = "su_fingerprint";

/// The backend that owns a key for the lifetime of a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Fast local file-backed preference store.
    Preferences,
    /// Structured settings store (the SQLite database on the host).
    Settings,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Preferences => "prefs",
            Self::Settings => "settings",
        })
    }
}

/// How a key's logical value is represented in its backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Int,
    /// Logical integer stored as its decimal string.
    StrInt,
    Str,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bool => "boolean",
            Self::Int => "integer",
            Self::StrInt => "integer (string-encoded)",
            Self::Str => "string",
        })
    }
}

/// Every live configuration key.
///
/// The string returned by [`Key::as_str`] is what is written to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    // ── settings store ────────────────────────────────────────────────────────
    RootAccess,
    SuMultiuserMode,
    SuMntNs,
    SuBiometric,
    Zygisk,
    Bootloop,
    SuManager,
    Keystore,

    // ── local preference store ────────────────────────────────────────────────
    SuRequestTimeout,
    SuAutoResponse,
    SuNotification,
    SuReauth,
    SuTapjack,
    CheckUpdates,
    UpdateChannel,
    CustomChannel,
    Locale,
    DarkTheme,
    DownloadDir,
    Safety,
    ThemeOrdinal,
    AskedHome,
    Doh,
    RandName,
}

impl Key {
    /// All keys, settings-store keys first.
    pub const ALL: [Key; 24] = [
        Key::RootAccess,
        Key::SuMultiuserMode,
        Key::SuMntNs,
        Key::SuBiometric,
        Key::Zygisk,
        Key::Bootloop,
        Key::SuManager,
        Key::Keystore,
        Key::SuRequestTimeout,
        Key::SuAutoResponse,
        Key::SuNotification,
        Key::SuReauth,
        Key::SuTapjack,
        Key::CheckUpdates,
        Key::UpdateChannel,
        Key::CustomChannel,
        Key::Locale,
        Key::DarkTheme,
        Key::DownloadDir,
        Key::Safety,
        Key::ThemeOrdinal,
        Key::AskedHome,
        Key::Doh,
        Key::RandName,
    ];

    /// The stored key name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Key::RootAccess => "root_access",
            Key::SuMultiuserMode => "multiuser_mode",
            Key::SuMntNs => "mnt_ns",
            Key::SuBiometric => "su_biometric",
            Key::Zygisk => "zygisk",
            Key::Bootloop => "bootloop",
            Key::SuManager => "requester",
            Key::Keystore => "keystore",
            Key::SuRequestTimeout => "su_request_timeout",
            Key::SuAutoResponse => "su_auto_response",
            Key::SuNotification => "su_notification",
            Key::SuReauth => "su_reauth",
            Key::SuTapjack => "su_tapjack",
            Key::CheckUpdates => "check_update",
            Key::UpdateChannel => "update_channel",
            Key::CustomChannel => "custom_channel",
            Key::Locale => "locale",
            Key::DarkTheme => "dark_theme_extended",
            Key::DownloadDir => "download_dir",
            Key::Safety => "safety_notice",
            Key::ThemeOrdinal => "theme_ordinal",
            Key::AskedHome => "asked_home",
            Key::Doh => "doh",
            Key::RandName => "rand_name",
        }
    }

    /// The backend that owns this key.
    pub const fn backend(self) -> Backend {
        match self {
            Key::RootAccess
            | Key::SuMultiuserMode
            | Key::SuMntNs
            | Key::SuBiometric
            | Key::Zygisk
            | Key::Bootloop
            | Key::SuManager
            | Key::Keystore => Backend::Settings,
            _ => Backend::Preferences,
        }
    }

    /// The representation used for this key in its backend.
    pub const fn kind(self) -> ValueKind {
        match self {
            Key::SuBiometric
            | Key::Zygisk
            | Key::SuReauth
            | Key::SuTapjack
            | Key::CheckUpdates
            | Key::Safety
            | Key::AskedHome
            | Key::Doh
            | Key::RandName => ValueKind::Bool,
            Key::RootAccess
            | Key::SuMultiuserMode
            | Key::SuMntNs
            | Key::Bootloop
            | Key::DarkTheme
            | Key::ThemeOrdinal => ValueKind::Int,
            Key::SuRequestTimeout
            | Key::SuAutoResponse
            | Key::SuNotification
            | Key::UpdateChannel => ValueKind::StrInt,
            Key::SuManager
            | Key::Keystore
            | Key::CustomChannel
            | Key::Locale
            | Key::DownloadDir => ValueKind::Str,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Key {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Key::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| InvalidValue::UnknownKey(s.to_string()))
    }
}
