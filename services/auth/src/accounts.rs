//! User management for administrators

use std::sync::Arc;
use tracing::info;

use crate::error::{AuthError, AuthResult};
use crate::models::{Department, Host, NewHost, Role};
use crate::provider::IdentityProvider;
use crate::repositories::{DepartmentsRepository, HostsRepository};
use crate::validation::{NewUserForm, validate_new_user};

pub struct UserManagement {
    identity: Arc<dyn IdentityProvider>,
    hosts: Arc<dyn HostsRepository>,
    departments: Arc<dyn DepartmentsRepository>,
}

impl UserManagement {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        hosts: Arc<dyn HostsRepository>,
        departments: Arc<dyn DepartmentsRepository>,
    ) -> Self {
        Self {
            identity,
            hosts,
            departments,
        }
    }

    pub async fn list_users(&self) -> AuthResult<Vec<Host>> {
        Ok(self.hosts.list().await?)
    }

    pub async fn list_departments(&self) -> AuthResult<Vec<Department>> {
        Ok(self.departments.list().await?)
    }

    /// Create an identity and its host row with the chosen role
    ///
    /// Only administrators may create users. The new account is not signed in,
    /// so the caller's session is untouched.
    pub async fn create_user(&self, actor: &Host, form: &NewUserForm) -> AuthResult<Host> {
        if actor.role != Role::Admin {
            return Err(AuthError::Forbidden(
                "Only administrators can add users".to_string(),
            ));
        }
        validate_new_user(form).map_err(AuthError::Validation)?;

        let email = form.email.trim();
        let identity = self.identity.sign_up(email, &form.password).await?;
        let host = self
            .hosts
            .create(&NewHost {
                auth_id: identity.id,
                name: form.name.trim().to_string(),
                email: email.to_string(),
                department_id: form.department_id,
                role: form.role,
            })
            .await?;

        info!("User {} created with role {}", host.email, host.role);
        Ok(host)
    }
}

/// Users whose name or email contains `term`, ignoring case
pub fn search_users<'a>(users: &'a [Host], term: &str) -> Vec<&'a Host> {
    let term = term.trim().to_lowercase();
    users
        .iter()
        .filter(|user| {
            term.is_empty()
                || user.name.to_lowercase().contains(&term)
                || user.email.to_lowercase().contains(&term)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockIdentityProvider;
    use crate::repositories::{MockDepartmentsRepository, MockHostsRepository};
    use chrono::Utc;
    use common::identity::AuthUser;
    use tokio_test::{assert_err, assert_ok};
    use uuid::Uuid;

    fn host(name: &str, email: &str, role: Role) -> Host {
        Host {
            id: Uuid::new_v4(),
            auth_id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            department_id: None,
            role,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn form(role: Role) -> NewUserForm {
        NewUserForm {
            name: "Grace".to_string(),
            email: "grace@example.com".to_string(),
            password: "secret1".to_string(),
            password_confirm: "secret1".to_string(),
            role,
            department_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_search_users_is_case_insensitive() {
        let users = vec![
            host("Ada Lovelace", "ada@example.com", Role::Admin),
            host("Grace Hopper", "grace@navy.example", Role::Guard),
        ];

        let by_name = search_users(&users, "LOVE");
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].name, "Ada Lovelace");

        assert_eq!(search_users(&users, "navy").len(), 1);
        assert_eq!(search_users(&users, "").len(), 2);
    }

    #[tokio::test]
    async fn test_admin_creates_user_with_role() {
        let mut identity = MockIdentityProvider::new();
        identity.expect_sign_up().times(1).returning(|email, _| {
            Ok(AuthUser {
                id: Uuid::new_v4(),
                email: email.to_string(),
            })
        });

        let mut hosts = MockHostsRepository::new();
        hosts
            .expect_create()
            .withf(|new| new.role == Role::Guard && new.email == "grace@example.com")
            .times(1)
            .returning(|new| Ok(host(&new.name, &new.email, new.role)));

        let users = UserManagement::new(
            Arc::new(identity),
            Arc::new(hosts),
            Arc::new(MockDepartmentsRepository::new()),
        );

        let admin = host("Ada", "ada@example.com", Role::Admin);
        let created = assert_ok!(users.create_user(&admin, &form(Role::Guard)).await);
        assert_eq!(created.role, Role::Guard);
    }

    #[tokio::test]
    async fn test_non_admin_cannot_create_user() {
        let mut identity = MockIdentityProvider::new();
        identity.expect_sign_up().never();

        let users = UserManagement::new(
            Arc::new(identity),
            Arc::new(MockHostsRepository::new()),
            Arc::new(MockDepartmentsRepository::new()),
        );

        let guard = host("Bob", "bob@example.com", Role::Guard);
        let err = assert_err!(users.create_user(&guard, &form(Role::Host)).await);
        assert!(matches!(err, AuthError::Forbidden(_)));
    }
}
