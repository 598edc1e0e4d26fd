use git2::{Config, Signature};

/// Author and committer used for publish commits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Read `user.name` and `user.email` from the global, XDG and system
    /// git configuration files.
    pub fn from_git_config() -> Result<Self, git2::Error> {
        let config = Config::open_default()?;
        Self::from_config(&config)
    }

    pub fn from_config(config: &Config) -> Result<Self, git2::Error> {
        let name = config.get_string("user.name")?;
        let email = config.get_string("user.email")?;
        Ok(Self::new(name, email))
    }

    /// Signature stamped with the current time
    pub fn signature(&self) -> Result<Signature<'static>, git2::Error> {
        Signature::now(&self.name, &self.email)
    }
}
