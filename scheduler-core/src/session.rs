//! Session/identity context
//!
//! A [`Session`] is an explicit value owned by one caller (a REPL
//! loop, a connection handler), not a process-wide static: each caller
//! gets its own, which is what makes concurrent multi-session use
//! possible. At most one identity is held at a time; login while
//! logged in is an error, never a silent replacement.

use crate::{
    error::{Error, Result},
    types::{Role, Username},
};

/// At most one authenticated identity
#[derive(Debug, Default)]
pub struct Session {
    identity: Option<(Role, Username)>,
}

impl Session {
    /// Fresh, unauthenticated session
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an identity to this session
    pub fn login(&mut self, role: Role, username: Username) -> Result<()> {
        if self.identity.is_some() {
            return Err(Error::AlreadyLoggedIn);
        }
        self.identity = Some((role, username));
        Ok(())
    }

    /// Clear the session
    pub fn logout(&mut self) -> Result<()> {
        if self.identity.is_none() {
            return Err(Error::NotLoggedIn);
        }
        self.identity = None;
        Ok(())
    }

    /// Currently authenticated identity, if any
    pub fn identity(&self) -> Option<(Role, &Username)> {
        self.identity.as_ref().map(|(role, name)| (*role, name))
    }

    /// Require any authenticated identity
    pub fn require_any(&self) -> Result<(Role, &Username)> {
        self.identity().ok_or(Error::NotLoggedIn)
    }

    /// Require a specific role
    pub fn require_role(&self, required: Role) -> Result<&Username> {
        let (role, username) = self.require_any()?;
        if role != required {
            return Err(Error::WrongRole { required });
        }
        Ok(username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_logout() {
        let mut session = Session::new();
        assert!(session.identity().is_none());

        session.login(Role::Patient, Username::new("pat")).unwrap();
        let (role, name) = session.identity().unwrap();
        assert_eq!(role, Role::Patient);
        assert_eq!(name.as_str(), "pat");

        session.logout().unwrap();
        assert!(session.identity().is_none());
    }

    #[test]
    fn test_second_login_rejected() {
        let mut session = Session::new();
        session.login(Role::Patient, Username::new("pat")).unwrap();

        let err = session.login(Role::Caregiver, Username::new("cara")).unwrap_err();
        assert!(matches!(err, Error::AlreadyLoggedIn));

        // Original identity untouched
        assert_eq!(session.identity().unwrap().1.as_str(), "pat");
    }

    #[test]
    fn test_logout_without_login() {
        let mut session = Session::new();
        assert!(matches!(session.logout().unwrap_err(), Error::NotLoggedIn));
    }

    #[test]
    fn test_role_gating() {
        let mut session = Session::new();
        assert!(matches!(
            session.require_role(Role::Patient).unwrap_err(),
            Error::NotLoggedIn
        ));

        session.login(Role::Caregiver, Username::new("cara")).unwrap();
        assert!(session.require_role(Role::Caregiver).is_ok());
        assert!(matches!(
            session.require_role(Role::Patient).unwrap_err(),
            Error::WrongRole { required: Role::Patient }
        ));
    }
}
