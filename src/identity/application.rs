use super::provider::AuthProvider;

/// Process-wide application handle every request context points back to.
#[derive(Debug, Clone, Default)]
pub struct Application {
    pub name: String,
    pub auth_provider: AuthProvider,
}

impl Application {
    pub fn new(name: impl Into<String>, auth_provider: AuthProvider) -> Self {
        Self { name: name.into(), auth_provider }
    }
}
