//! Self-registration pipeline.
//!
//! Requests pass a fixed sequence of checks, each of which ends processing
//! on failure:
//! 1. storage mode must be server backed
//! 2. the registration feature flag must be on
//! 3. the body must parse
//! 4. trimmed username and password must be non-empty
//! 5. the username must not be the site owner's
//! 6. the username must not already be in the admin config
//!
//! A passing request creates the credential in the user store, then appends
//! a user record to the admin config and saves it. The two writes are not
//! linked: if the save fails, the credential stays and the config mirror
//! lags behind until it is reconciled from the user store.

use crate::api::RegisterRequest;
use crate::config::RegistrationSettings;
use crate::error::RegisterError;
use account_store::{ConfigProvider, Stores, UserRecord, UserStore};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tokio::sync::Mutex;
use serde_json::Value;
use tracing::{debug, error, info};

/// Applies registration requests against the account store.
pub struct Registrar {
    settings: RegistrationSettings,
    config: Arc<dyn ConfigProvider>,
    users: Arc<dyn UserStore>,
    /// Held across lookup and creation when serialization is enabled
    serial: Option<Mutex<()>>,
}

impl Registrar {
    pub fn new(settings: RegistrationSettings, stores: Stores) -> Self {
        let serial = settings.serialize.then(|| Mutex::new(()));
        if serial.is_none() {
            debug!("Registrations are not serialized; concurrent duplicates are possible");
        }

        Self {
            settings,
            config: stores.config,
            users: stores.users,
            serial,
        }
    }

    pub fn settings(&self) -> &RegistrationSettings {
        &self.settings
    }

    /// Handle a raw registration request body.
    pub async fn handle(&self, body: &[u8]) -> Result<(), RegisterError> {
        self.ensure_open()?;

        let result = match parse_request(body) {
            Ok(request) => self.register(request).await,
            Err(e) => Err(e),
        };

        if let Err(RegisterError::Internal(details)) = &result {
            error!(%details, "Registration failed");
        }

        result
    }

    fn ensure_open(&self) -> Result<(), RegisterError> {
        if !self.settings.storage_mode.is_server_backed() {
            debug!("Registration refused in localstorage mode");
            return Err(RegisterError::StorageModeUnsupported);
        }

        if !self.settings.registration_enabled {
            debug!("Registration refused, feature disabled");
            return Err(RegisterError::RegistrationDisabled);
        }

        Ok(())
    }

    async fn register(&self, request: RegisterRequest) -> Result<(), RegisterError> {
        let username = request.username.as_deref().unwrap_or_default().trim();
        let password = request
            .password
            .as_ref()
            .map(|p| p.expose_secret().trim())
            .unwrap_or_default();

        if username.is_empty() || password.is_empty() {
            return Err(RegisterError::MissingCredentials);
        }

        if self.settings.owner_username.as_deref() == Some(username) {
            info!(username = %username, "Registration refused, owner username");
            return Err(RegisterError::ReservedUsername);
        }

        let _guard = match &self.serial {
            Some(lock) => Some(lock.lock().await),
            None => None,
        };

        let mut admin_config = self.config.get().await?;
        if admin_config.find_user(username).is_some() {
            info!(username = %username, "Registration refused, user exists");
            return Err(RegisterError::UserExists);
        }

        self.users
            .register(username, &SecretString::new(password.to_string()))
            .await?;

        admin_config.push_user(UserRecord::new_user(username));
        self.config.save(&admin_config).await?;

        info!(username = %username, "User registered");
        Ok(())
    }
}

/// Decode a request body.
///
/// Only a JSON object supplies fields. Arrays and scalars decode as an empty
/// request and fail validation; `null` and malformed JSON are internal errors.
fn parse_request(body: &[u8]) -> Result<RegisterRequest, RegisterError> {
    match serde_json::from_slice::<Value>(body)? {
        Value::Object(fields) => Ok(serde_json::from_value(Value::Object(fields))?),
        Value::Null => Err(RegisterError::Internal(
            "invalid request body: null".to_string(),
        )),
        _ => Ok(RegisterRequest::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageMode;
    use account_store::{AdminConfig, Role, StoreError};
    use async_trait::async_trait;
    use mockall::{mock, Sequence};

    mock! {
        pub Config {}

        #[async_trait]
        impl ConfigProvider for Config {
            async fn get(&self) -> Result<AdminConfig, StoreError>;
            async fn save(&self, config: &AdminConfig) -> Result<(), StoreError>;
        }
    }

    mock! {
        pub Users {}

        #[async_trait]
        impl UserStore for Users {
            async fn register(&self, username: &str, password: &SecretString) -> Result<(), StoreError>;
        }
    }

    fn open_settings() -> RegistrationSettings {
        RegistrationSettings {
            storage_mode: StorageMode::Server("redis".into()),
            registration_enabled: true,
            owner_username: Some("admin".into()),
            serialize: false,
        }
    }

    fn registrar(settings: RegistrationSettings, config: MockConfig, users: MockUsers) -> Registrar {
        Registrar::new(
            settings,
            Stores {
                config: Arc::new(config),
                users: Arc::new(users),
            },
        )
    }

    fn config_with(usernames: &[&str]) -> AdminConfig {
        let mut config = AdminConfig::default();
        for name in usernames {
            config.push_user(UserRecord::new_user(*name));
        }
        config
    }

    #[tokio::test]
    async fn test_localstorage_refused_before_parsing() {
        let settings = RegistrationSettings {
            storage_mode: StorageMode::LocalStorage,
            ..open_settings()
        };
        let registrar = registrar(settings, MockConfig::new(), MockUsers::new());

        let result = registrar.handle(b"not json at all").await;
        assert!(matches!(result, Err(RegisterError::StorageModeUnsupported)));
    }

    #[tokio::test]
    async fn test_disabled_refused_before_parsing() {
        let settings = RegistrationSettings {
            registration_enabled: false,
            ..open_settings()
        };
        let registrar = registrar(settings, MockConfig::new(), MockUsers::new());

        let result = registrar
            .handle(br#"{"username":"alice","password":"secret"}"#)
            .await;
        assert!(matches!(result, Err(RegisterError::RegistrationDisabled)));

        let result = registrar.handle(b"{{{").await;
        assert!(matches!(result, Err(RegisterError::RegistrationDisabled)));
    }

    #[tokio::test]
    async fn test_unparseable_body_is_internal() {
        let registrar = registrar(open_settings(), MockConfig::new(), MockUsers::new());

        let result = registrar.handle(b"username=alice").await;
        assert!(matches!(result, Err(RegisterError::Internal(_))));

        // Wrong JSON type for a field
        let result = registrar.handle(br#"{"username":42,"password":"x"}"#).await;
        assert!(matches!(result, Err(RegisterError::Internal(_))));
    }

    #[tokio::test]
    async fn test_null_body_is_internal() {
        let registrar = registrar(open_settings(), MockConfig::new(), MockUsers::new());

        let result = registrar.handle(b"null").await;
        assert!(matches!(result, Err(RegisterError::Internal(_))));
    }

    #[tokio::test]
    async fn test_non_object_body_has_no_fields() {
        let mut config = MockConfig::new();
        config.expect_get().never();
        let mut users = MockUsers::new();
        users.expect_register().never();

        let registrar = registrar(open_settings(), config, users);

        for body in [
            r#"["alice","secret"]"#,
            r#"[]"#,
            r#""alice""#,
            "42",
            "true",
        ] {
            let result = registrar.handle(body.as_bytes()).await;
            assert!(
                matches!(result, Err(RegisterError::MissingCredentials)),
                "body {body} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_missing_or_blank_fields() {
        let registrar = registrar(open_settings(), MockConfig::new(), MockUsers::new());

        for body in [
            r#"{}"#,
            r#"{"username":"alice"}"#,
            r#"{"password":"secret"}"#,
            r#"{"username":null,"password":"secret"}"#,
            r#"{"username":"   ","password":"secret"}"#,
            r#"{"username":"alice","password":" \t\n"}"#,
        ] {
            let result = registrar.handle(body.as_bytes()).await;
            assert!(
                matches!(result, Err(RegisterError::MissingCredentials)),
                "body {body} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_owner_username_reserved() {
        let mut config = MockConfig::new();
        config.expect_get().never();
        let mut users = MockUsers::new();
        users.expect_register().never();

        let registrar = registrar(open_settings(), config, users);

        let result = registrar
            .handle(br#"{"username":"  admin ","password":"secret"}"#)
            .await;
        assert!(matches!(result, Err(RegisterError::ReservedUsername)));
    }

    #[tokio::test]
    async fn test_no_owner_configured() {
        let settings = RegistrationSettings {
            owner_username: None,
            ..open_settings()
        };
        let mut config = MockConfig::new();
        config.expect_get().returning(|| Ok(AdminConfig::default()));
        config.expect_save().returning(|_| Ok(()));
        let mut users = MockUsers::new();
        users.expect_register().times(1).returning(|_, _| Ok(()));

        let registrar = registrar(settings, config, users);
        registrar
            .handle(br#"{"username":"admin","password":"secret"}"#)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_existing_user_rejected() {
        let mut config = MockConfig::new();
        config
            .expect_get()
            .times(1)
            .returning(|| Ok(config_with(&["alice"])));
        config.expect_save().never();
        let mut users = MockUsers::new();
        users.expect_register().never();

        let registrar = registrar(open_settings(), config, users);

        let result = registrar
            .handle(br#"{"username":"alice","password":"secret"}"#)
            .await;
        assert!(matches!(result, Err(RegisterError::UserExists)));
    }

    #[tokio::test]
    async fn test_username_match_is_case_sensitive() {
        let mut config = MockConfig::new();
        config.expect_get().returning(|| Ok(config_with(&["Alice"])));
        config.expect_save().returning(|_| Ok(()));
        let mut users = MockUsers::new();
        users.expect_register().times(1).returning(|_, _| Ok(()));

        let registrar = registrar(open_settings(), config, users);
        registrar
            .handle(br#"{"username":"alice","password":"secret"}"#)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_happy_path_registers_then_saves() {
        let mut seq = Sequence::new();
        let mut config = MockConfig::new();
        let mut users = MockUsers::new();

        config
            .expect_get()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(config_with(&["bob"])));
        users
            .expect_register()
            .withf(|username, password| {
                username.to_string() == "alice" && password.expose_secret().as_str() == "secret"
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        config
            .expect_save()
            .withf(|saved| {
                saved.users().len() == 2
                    && saved.users()[1]
                        == UserRecord {
                            username: "alice".into(),
                            role: Role::User,
                            banned: false,
                        }
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let registrar = registrar(open_settings(), config, users);

        registrar
            .handle(br#"{"username":"  alice  ","password":" secret ","extra":1}"#)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_user_store_failure_skips_save() {
        let mut config = MockConfig::new();
        config.expect_get().returning(|| Ok(AdminConfig::default()));
        config.expect_save().never();
        let mut users = MockUsers::new();
        users
            .expect_register()
            .returning(|_, _| Err(StoreError::Unavailable("connection refused".into())));

        let registrar = registrar(open_settings(), config, users);

        let result = registrar
            .handle(br#"{"username":"alice","password":"secret"}"#)
            .await;
        match result {
            Err(RegisterError::Internal(details)) => assert!(details.contains("connection refused")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_config_get_failure_is_internal() {
        let mut config = MockConfig::new();
        config
            .expect_get()
            .returning(|| Err(StoreError::Unavailable("cache offline".into())));
        let mut users = MockUsers::new();
        users.expect_register().never();

        let registrar = registrar(open_settings(), config, users);

        let result = registrar
            .handle(br#"{"username":"alice","password":"secret"}"#)
            .await;
        assert!(matches!(result, Err(RegisterError::Internal(_))));
    }

    #[tokio::test]
    async fn test_save_failure_after_register_is_internal() {
        let mut config = MockConfig::new();
        config.expect_get().returning(|| Ok(AdminConfig::default()));
        config
            .expect_save()
            .times(1)
            .returning(|_| Err(StoreError::Unavailable("disk full".into())));
        let mut users = MockUsers::new();
        users.expect_register().times(1).returning(|_, _| Ok(()));

        let registrar = registrar(open_settings(), config, users);

        let result = registrar
            .handle(br#"{"username":"alice","password":"secret"}"#)
            .await;
        match result {
            Err(RegisterError::Internal(details)) => assert!(details.contains("disk full")),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
