//! The configuration facade: every property of the system, bound to its
//! owning backend.
//!
//! Callers read and write typed fields directly:
//!
//! ```ignore
//! let cfg: &Config = prefstack_host::application::global::config()?;
//! if cfg.check_update.get()? {
//!     cfg.update_channel.set(UpdateChannel::Beta)?;
//! }
//! ```
//!
//! Each field is a delegate from `prefstack-core` holding a shared handle to
//! one backend.  Nothing is cached here.  The only state the facade owns is the
//! process-lifetime [`RuntimeFlags`].
//!
//! [`Config::read`] and [`Config::write`] address the same fields by
//! [`Key`], for callers such as the CLI that only have a key name.

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use prefstack_core::{
    parse_bool, parse_int, Accessor, BuildVariant, Condition, DarkThemeMode, Enumerated,
    EnumProperty, Gated, InvalidValue, Key, MountNamespaceMode, MultiuserMode, Property, Reactive,
    RootAccess, ScalarValue, Store, StoreError, StrIntProperty, SuAutoResponse, SuNotification,
    SuTimeout, UpdateChannel,
};
use thiserror::Error;
use tracing::info;

use crate::infrastructure::prefs_file::PrefsFile;
use crate::infrastructure::settings_db::SettingsDb;
use crate::infrastructure::storage::config::{HostConfig, HostConfigError};

/// Errors surfaced by the configuration facade.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A backend failed catastrophically.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A dynamically supplied key or value is not legal.
    #[error(transparent)]
    Invalid(#[from] InvalidValue),

    /// The host configuration could not be resolved.
    #[error(transparent)]
    Host(#[from] HostConfigError),

    /// The process-wide configuration was used before `install`.
    #[error("configuration accessed before it was loaded")]
    NotInitialized,

    /// `install` was called a second time.
    #[error("configuration already loaded")]
    AlreadyInitialized,
}

// ── Collaborators ─────────────────────────────────────────────────────────────

/// Side effects triggered by change-reaction properties.
///
/// Both run synchronously on the thread that performed the write, after the
/// write is readable.
pub trait ConfigHooks: Send + Sync {
    /// Re-evaluate the background update check schedule.
    fn schedule_update_check(&self);

    /// Apply `locale` (empty means "follow the system").
    fn refresh_locale(&self, locale: &str);
}

/// Hooks that only log, used when no UI or scheduler is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHooks;

impl ConfigHooks for LoggingHooks {
    fn schedule_update_check(&self) {
        info!("update check schedule re-evaluated");
    }

    fn refresh_locale(&self, locale: &str) {
        info!(locale, "locale refreshed");
    }
}

/// Everything the facade needs from the outside world besides its backends.
#[derive(Clone)]
pub struct Environment {
    pub variant: BuildVariant,
    device_secure: Arc<dyn Condition>,
    hooks: Arc<dyn ConfigHooks>,
}

impl Environment {
    /// An environment with no secure lock screen and logging-only hooks.
    pub fn new(variant: BuildVariant) -> Self {
        Self {
            variant,
            device_secure: Arc::new(|| false),
            hooks: Arc::new(LoggingHooks),
        }
    }

    /// Sets the live "device has a secure lock screen" check.
    pub fn with_device_secure(mut self, condition: impl Condition + 'static) -> Self {
        self.device_secure = Arc::new(condition);
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ConfigHooks>) -> Self {
        self.hooks = hooks;
        self
    }
}

/// Flags that live only as long as the process and are never persisted.
#[derive(Debug, Default)]
pub struct RuntimeFlags {
    pub keep_verity: AtomicBool,
    pub keep_enc: AtomicBool,
    pub recovery: AtomicBool,
    pub deny_list: AtomicBool,
}

// ── Facade ────────────────────────────────────────────────────────────────────

type StrEnum<E> = EnumProperty<E, StrIntProperty>;
type IntEnum<E> = EnumProperty<E, Property<i32>>;

/// Typed configuration over the preference file and the settings database.
pub struct Config {
    prefs: Arc<PrefsFile>,
    settings: Arc<SettingsDb>,
    variant: BuildVariant,
    pub runtime: RuntimeFlags,

    // Local preference store.
    pub asked_home: Property<bool>,
    pub safety_notice: Property<bool>,
    pub dark_theme: IntEnum<DarkThemeMode>,
    pub theme_ordinal: Property<i32>,
    pub check_update: Reactive<Property<bool>, bool>,
    pub locale: Reactive<Property<String>, String>,
    pub doh: Property<bool>,
    pub update_channel: StrEnum<UpdateChannel>,
    pub custom_channel_url: Property<String>,
    pub download_dir: Property<String>,
    pub rand_name: Property<bool>,
    pub su_default_timeout: StrEnum<SuTimeout>,
    pub su_auto_response: StrEnum<SuAutoResponse>,
    pub su_notification: StrEnum<SuNotification>,
    pub su_reauth: Property<bool>,
    pub su_tapjack: Property<bool>,

    // Structured settings store.
    pub bootloop: Property<i32>,
    pub zygisk: Property<bool>,
    pub su_manager: Property<String>,
    pub keystore_raw: Property<String>,
    pub root_mode: IntEnum<RootAccess>,
    pub su_mnt_namespace_mode: IntEnum<MountNamespaceMode>,
    pub su_multiuser_mode: IntEnum<MultiuserMode>,
    /// Biometric confirmation for superuser requests; only visible while the
    /// device has a secure lock screen.
    pub su_auth: Gated<Property<bool>>,
}

impl Config {
    /// Binds every property to `prefs` or `settings`.
    pub fn new(prefs: Arc<PrefsFile>, settings: Arc<SettingsDb>, env: Environment) -> Self {
        let p: Arc<dyn Store> = prefs.clone();
        let s: Arc<dyn Store> = settings.clone();
        let Environment {
            variant,
            device_secure,
            hooks,
        } = env;

        let bool_pref = |key: Key, default: bool| Property::new(key.as_str(), default, p.clone());
        let str_pref = |key: Key| Property::new(key.as_str(), String::new(), p.clone());
        let str_int_pref =
            |key: Key, default: i32| StrIntProperty::new(key.as_str(), default, p.clone());
        let int_setting = |key: Key, default: i32| Property::new(key.as_str(), default, s.clone());
        let str_setting = |key: Key| Property::new(key.as_str(), String::new(), s.clone());

        let update_hooks = hooks.clone();
        let locale_hooks = hooks;

        Self {
            asked_home: bool_pref(Key::AskedHome, false),
            safety_notice: bool_pref(Key::Safety, true),
            dark_theme: EnumProperty::new(
                Property::new(Key::DarkTheme.as_str(), DarkThemeMode::FollowSystem.raw(), p.clone()),
                DarkThemeMode::FollowSystem,
            ),
            theme_ordinal: Property::new(Key::ThemeOrdinal.as_str(), 0, p.clone()),
            check_update: Reactive::new(bool_pref(Key::CheckUpdates, true), move |_: &bool| {
                update_hooks.schedule_update_check()
            }),
            locale: Reactive::new(str_pref(Key::Locale), move |locale: &String| {
                locale_hooks.refresh_locale(locale)
            }),
            doh: bool_pref(Key::Doh, false),
            update_channel: EnumProperty::new(
                str_int_pref(Key::UpdateChannel, variant.default_channel().raw()),
                variant.default_channel(),
            ),
            custom_channel_url: str_pref(Key::CustomChannel),
            download_dir: str_pref(Key::DownloadDir),
            rand_name: bool_pref(Key::RandName, true),
            su_default_timeout: EnumProperty::new(
                str_int_pref(Key::SuRequestTimeout, SuTimeout::DEFAULT.raw()),
                SuTimeout::DEFAULT,
            ),
            su_auto_response: EnumProperty::new(
                str_int_pref(Key::SuAutoResponse, SuAutoResponse::Prompt.raw()),
                SuAutoResponse::Prompt,
            ),
            su_notification: EnumProperty::new(
                str_int_pref(Key::SuNotification, SuNotification::Toast.raw()),
                SuNotification::Toast,
            ),
            su_reauth: bool_pref(Key::SuReauth, false),
            su_tapjack: bool_pref(Key::SuTapjack, true),

            bootloop: int_setting(Key::Bootloop, 0),
            zygisk: Property::new(Key::Zygisk.as_str(), false, s.clone()),
            su_manager: str_setting(Key::SuManager),
            keystore_raw: str_setting(Key::Keystore),
            root_mode: EnumProperty::new(
                int_setting(Key::RootAccess, RootAccess::AppsAndAdb.raw()),
                RootAccess::AppsAndAdb,
            ),
            su_mnt_namespace_mode: EnumProperty::new(
                int_setting(Key::SuMntNs, MountNamespaceMode::Requester.raw()),
                MountNamespaceMode::Requester,
            ),
            su_multiuser_mode: EnumProperty::new(
                int_setting(Key::SuMultiuserMode, MultiuserMode::OwnerOnly.raw()),
                MultiuserMode::OwnerOnly,
            ),
            su_auth: Gated::new(
                Property::new(Key::SuBiometric.as_str(), false, s.clone()),
                move || device_secure.holds(),
            ),

            prefs,
            settings,
            variant,
            runtime: RuntimeFlags::default(),
        }
    }

    /// Opens both backends at the locations named by `host`.
    pub fn open(host: &HostConfig, env: Environment) -> Result<Self, ConfigError> {
        let prefs = PrefsFile::open(&host.data_dir()?, &host.package);
        let settings = SettingsDb::open(&host.settings_db_path()?)?;
        info!(
            prefs = %prefs.path().display(),
            variant = ?env.variant,
            "configuration backends opened"
        );
        Ok(Self::new(Arc::new(prefs), Arc::new(settings), env))
    }

    pub fn prefs(&self) -> &PrefsFile {
        &self.prefs
    }

    pub fn settings(&self) -> &SettingsDb {
        &self.settings
    }

    pub fn variant(&self) -> BuildVariant {
        self.variant
    }

    /// Current value of `key` as its callers see it.
    ///
    /// Enumerated keys yield the raw integer of the validated value, and
    /// `su_biometric` yields the gated value, not the stored flag.
    pub fn read(&self, key: Key) -> Result<ScalarValue, ConfigError> {
        use ScalarValue::{Bool, Int, Str};

        Ok(match key {
            Key::RootAccess => Int(self.root_mode.get()?.raw()),
            Key::SuMultiuserMode => Int(self.su_multiuser_mode.get()?.raw()),
            Key::SuMntNs => Int(self.su_mnt_namespace_mode.get()?.raw()),
            Key::SuBiometric => Bool(self.su_auth.get()?),
            Key::Zygisk => Bool(self.zygisk.get()?),
            Key::Bootloop => Int(self.bootloop.get()?),
            Key::SuManager => Str(self.su_manager.get()?),
            Key::Keystore => Str(self.keystore_raw.get()?),
            Key::SuRequestTimeout => Int(self.su_default_timeout.get()?.raw()),
            Key::SuAutoResponse => Int(self.su_auto_response.get()?.raw()),
            Key::SuNotification => Int(self.su_notification.get()?.raw()),
            Key::SuReauth => Bool(self.su_reauth.get()?),
            Key::SuTapjack => Bool(self.su_tapjack.get()?),
            Key::CheckUpdates => Bool(self.check_update.get()?),
            Key::UpdateChannel => Int(self.update_channel.get()?.raw()),
            Key::CustomChannel => Str(self.custom_channel_url.get()?),
            Key::Locale => Str(self.locale.get()?),
            Key::DarkTheme => Int(self.dark_theme.get()?.raw()),
            Key::DownloadDir => Str(self.download_dir.get()?),
            Key::Safety => Bool(self.safety_notice.get()?),
            Key::ThemeOrdinal => Int(self.theme_ordinal.get()?),
            Key::AskedHome => Bool(self.asked_home.get()?),
            Key::Doh => Bool(self.doh.get()?),
            Key::RandName => Bool(self.rand_name.get()?),
        })
    }

    /// Parses `text` as the kind `key` holds and writes it through the same
    /// property typed callers use, so reactions fire identically.
    pub fn write(&self, key: Key, text: &str) -> Result<(), ConfigError> {
        match key {
            Key::RootAccess => self.root_mode.set(RootAccess::from_raw(parse_int(text)?)?)?,
            Key::SuMultiuserMode => self
                .su_multiuser_mode
                .set(MultiuserMode::from_raw(parse_int(text)?)?)?,
            Key::SuMntNs => self
                .su_mnt_namespace_mode
                .set(MountNamespaceMode::from_raw(parse_int(text)?)?)?,
            Key::SuBiometric => self.su_auth.set(parse_bool(text)?)?,
            Key::Zygisk => self.zygisk.set(parse_bool(text)?)?,
            Key::Bootloop => self.bootloop.set(parse_int(text)?)?,
            Key::SuManager => self.su_manager.set(text.to_string())?,
            Key::Keystore => self.keystore_raw.set(text.to_string())?,
            Key::SuRequestTimeout => self
                .su_default_timeout
                .set(SuTimeout::from_raw(parse_int(text)?)?)?,
            Key::SuAutoResponse => self
                .su_auto_response
                .set(SuAutoResponse::from_raw(parse_int(text)?)?)?,
            Key::SuNotification => self
                .su_notification
                .set(SuNotification::from_raw(parse_int(text)?)?)?,
            Key::SuReauth => self.su_reauth.set(parse_bool(text)?)?,
            Key::SuTapjack => self.su_tapjack.set(parse_bool(text)?)?,
            Key::CheckUpdates => self.check_update.set(parse_bool(text)?)?,
            Key::UpdateChannel => self
                .update_channel
                .set(UpdateChannel::from_raw(parse_int(text)?)?)?,
            Key::CustomChannel => self.custom_channel_url.set(text.to_string())?,
            Key::Locale => self.locale.set(text.to_string())?,
            Key::DarkTheme => self
                .dark_theme
                .set(DarkThemeMode::from_raw(parse_int(text)?)?)?,
            Key::DownloadDir => self.download_dir.set(text.to_string())?,
            Key::Safety => self.safety_notice.set(parse_bool(text)?)?,
            Key::ThemeOrdinal => self.theme_ordinal.set(parse_int(text)?)?,
            Key::AskedHome => self.asked_home.set(parse_bool(text)?)?,
            Key::Doh => self.doh.set(parse_bool(text)?)?,
            Key::RandName => self.rand_name.set(parse_bool(text)?)?,
        }
        Ok(())
    }

    /// Prepares the preference file for hand-off to a future installation and
    /// returns its path.
    ///
    /// `asked_home` is removed first so the next installation asks again.
    pub fn export_prefs_file(&self) -> Result<&Path, ConfigError> {
        self.prefs.remove(Key::AskedHome.as_str())?;
        info!(path = %self.prefs.path().display(), "preference file exported");
        Ok(self.prefs.path())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
