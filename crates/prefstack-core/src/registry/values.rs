//! Closed enumerations of legal stored values.
//!
//! Backends only ever hold raw integers.  Each enumeration here is the typed
//! view of one such integer, and [`Enumerated::from_raw`] is the only way to
//! turn a raw value into it, so an out-of-range number read from disk is
//! rejected at the boundary instead of flowing into the rest of the system.

use serde::{Deserialize, Serialize};

use super::InvalidValue;

/// A closed integer enumeration stored under a configuration key.
pub trait Enumerated: Copy + PartialEq + std::fmt::Debug + Send + Sync + 'static {
    /// Human-readable name used in errors and logs.
    const NAME: &'static str;
    /// Every legal value, in declaration order.
    const ALL: &'static [Self];

    /// The integer written to the backend.
    fn raw(self) -> i32;

    /// Validated conversion from a stored integer.
    fn from_raw(raw: i32) -> Result<Self, InvalidValue> {
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.raw() == raw)
            .ok_or(InvalidValue::OutOfRange {
                kind: Self::NAME,
                value: raw,
            })
    }
}

/// Implements [`Enumerated`] for a fieldless `#[repr(i32)]` enum.
macro_rules! closed_enum {
    ($ty:ident, $name:literal, [$($variant:ident),+ $(,)?]) => {
        impl Enumerated for $ty {
            const NAME: &'static str = $name;
            const ALL: &'static [Self] = &[$($ty::$variant),+];

            fn raw(self) -> i32 {
                self as i32
            }
        }

        impl TryFrom<i32> for $ty {
            type Error = InvalidValue;

            fn try_from(raw: i32) -> Result<Self, Self::Error> {
                <Self as Enumerated>::from_raw(raw)
            }
        }

        impl From<$ty> for i32 {
            fn from(value: $ty) -> i32 {
                value as i32
            }
        }
    };
}

// ── Update channel ────────────────────────────────────────────────────────────

/// Where update metadata is fetched from.
///
/// The legal raw range is contiguous: `Default` (-1) through `Debug` (4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum UpdateChannel {
    Default = -1,
    Stable = 0,
    Beta = 1,
    Custom = 2,
    Canary = 3,
    Debug = 4,
}

closed_enum!(
    UpdateChannel,
    "update channel",
    [Default, Stable, Beta, Custom, Canary, Debug]
);

impl UpdateChannel {
    /// Smallest legal raw value.
    pub const MIN: i32 = UpdateChannel::Default as i32;
    /// Largest legal raw value.
    pub const MAX: i32 = UpdateChannel::Debug as i32;
}

// ── Superuser policy ──────────────────────────────────────────────────────────

/// Which requesters may obtain root access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum RootAccess {
    Disabled = 0,
    AppsOnly = 1,
    AdbOnly = 2,
    AppsAndAdb = 3,
}

closed_enum!(RootAccess, "root access mode", [Disabled, AppsOnly, AdbOnly, AppsAndAdb]);

/// How root access is granted to secondary users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum MultiuserMode {
    OwnerOnly = 0,
    OwnerManaged = 1,
    User = 2,
}

closed_enum!(MultiuserMode, "multiuser mode", [OwnerOnly, OwnerManaged, User]);

/// Which mount namespace a root shell is placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum MountNamespaceMode {
    Global = 0,
    Requester = 1,
    Isolate = 2,
}

closed_enum!(MountNamespaceMode, "mount namespace mode", [Global, Requester, Isolate]);

/// How a superuser grant is announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum SuNotification {
    Silent = 0,
    Toast = 1,
}

closed_enum!(SuNotification, "superuser notification", [Silent, Toast]);

/// What happens to a superuser request without user interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum SuAutoResponse {
    Prompt = 0,
    Deny = 1,
    Allow = 2,
}

closed_enum!(SuAutoResponse, "superuser auto response", [Prompt, Deny, Allow]);

/// Superuser request timeout in seconds, restricted to a fixed whitelist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SuTimeout(i32);

impl SuTimeout {
    /// The whitelist, in the order it is presented to users.
    pub const LIST: [i32; 6] = [0, -1, 10, 20, 30, 60];

    /// Ten seconds.
    pub const DEFAULT: SuTimeout = SuTimeout(10);

    /// The timeout in seconds as stored.
    pub fn seconds(self) -> i32 {
        self.0
    }
}

impl Enumerated for SuTimeout {
    const NAME: &'static str = "superuser timeout";
    const ALL: &'static [Self] = &[
        SuTimeout(0),
        SuTimeout(-1),
        SuTimeout(10),
        SuTimeout(20),
        SuTimeout(30),
        SuTimeout(60),
    ];

    fn raw(self) -> i32 {
        self.0
    }
}

// ── Appearance ────────────────────────────────────────────────────────────────

/// Night-mode selection.
///
/// Raw `0` (switch by time of day) is retired.  An older install that still
/// stores it reads back as the default, [`DarkThemeMode::FollowSystem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum DarkThemeMode {
    FollowSystem = -1,
    Light = 1,
    Dark = 2,
    AutoBattery = 3,
}

closed_enum!(DarkThemeMode, "dark theme mode", [FollowSystem, Light, Dark, AutoBattery]);

// ── Build variant ─────────────────────────────────────────────────────────────

/// The flavour of the running build; decides the default update channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildVariant {
    #[default]
    Release,
    Canary,
    Debug,
}

impl BuildVariant {
    /// Channel used when none is stored or the stored one is invalid.
    ///
    /// Debug takes precedence over canary.
    pub fn default_channel(self) -> UpdateChannel {
        match self {
            BuildVariant::Debug => UpdateChannel::Debug,
            BuildVariant::Canary => UpdateChannel::Canary,
            BuildVariant::Release => UpdateChannel::Default,
        }
    }
}

impl std::str::FromStr for BuildVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "release" => Ok(Self::Release),
            "canary" => Ok(Self::Canary),
            "debug" => Ok(Self::Debug),
            other => Err(format!("unknown build variant `{other}`")),
        }
    }
}
