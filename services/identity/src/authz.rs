//! Authorization rules for account administration
//!
//! Pure decisions over the acting role, the target role and the attempted
//! operation. No I/O happens here; callers load the accounts involved and
//! enforce the verdict.

use crate::models::Role;

/// Administrative operations a decision can be asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountOperation {
    /// Soft-delete the target account
    Delete,
    /// Edit the target's profile fields
    Update,
    /// Replace the target's role with the given one
    ChangeRole(Role),
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Denied, with the reason handed back to the caller
    Deny(&'static str),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// The denial reason, if any.
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            Decision::Allow => None,
            Decision::Deny(reason) => Some(reason),
        }
    }
}

/// Decide whether an account holding `actor_role` may perform `operation`
/// on an account holding `target_role`.
///
/// Self rules are checked first and win over rank rules: everyone may
/// update themselves, everyone but a super administrator may delete
/// themselves, and nobody changes their own role. Acting on others takes
/// a privileged actor who strictly outranks the target, and
/// administrators may only hand out unprivileged roles.
pub fn authorize(
    actor_role: Role,
    target_role: Role,
    operation: AccountOperation,
    is_self: bool,
) -> Decision {
    if is_self {
        return match operation {
            AccountOperation::Update => Decision::Allow,
            AccountOperation::Delete if actor_role == Role::SuperAdmin => {
                Decision::Deny("super administrators cannot delete their own account")
            }
            AccountOperation::Delete => Decision::Allow,
            AccountOperation::ChangeRole(_) => {
                Decision::Deny("accounts cannot change their own role")
            }
        };
    }

    if !actor_role.is_privileged() {
        return Decision::Deny("readers and writers can only manage their own account");
    }
    if target_role.rank() >= actor_role.rank() {
        return Decision::Deny("cannot act on an account of equal or higher rank");
    }
    if let AccountOperation::ChangeRole(new_role) = operation {
        if actor_role == Role::Admin && new_role.is_privileged() {
            return Decision::Deny("administrators may only grant reader or writer roles");
        }
    }
    Decision::Allow
}

/// Gate role grants at registration time.
///
/// Unprivileged roles are open to anyone, signed in or not. Privileged
/// roles take a super administrator as the acting account; anonymous
/// registration can never produce one.
pub fn authorize_grant_at_registration(actor_role: Option<Role>, requested: Role) -> Decision {
    if !requested.is_privileged() {
        return Decision::Allow;
    }
    match actor_role {
        Some(Role::SuperAdmin) => Decision::Allow,
        Some(_) => Decision::Deny("only a super administrator can create privileged accounts"),
        None => Decision::Deny("privileged accounts cannot be self-registered"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ROLES: [Role; 4] = [Role::Reader, Role::Writer, Role::Admin, Role::SuperAdmin];

    #[test]
    fn everyone_updates_their_own_profile() {
        for role in ALL_ROLES {
            assert!(authorize(role, role, AccountOperation::Update, true).is_allowed());
        }
    }

    #[test]
    fn self_deletion_is_open_to_all_but_super_admins() {
        for role in [Role::Reader, Role::Writer, Role::Admin] {
            assert!(authorize(role, role, AccountOperation::Delete, true).is_allowed());
        }
        let verdict = authorize(
            Role::SuperAdmin,
            Role::SuperAdmin,
            AccountOperation::Delete,
            true,
        );
        assert!(!verdict.is_allowed());
    }

    #[test]
    fn nobody_changes_their_own_role() {
        for role in ALL_ROLES {
            for requested in ALL_ROLES {
                let verdict =
                    authorize(role, role, AccountOperation::ChangeRole(requested), true);
                assert!(!verdict.is_allowed(), "{role} granted itself {requested}");
            }
        }
    }

    #[test]
    fn unprivileged_actors_cannot_touch_other_accounts() {
        for actor in [Role::Reader, Role::Writer] {
            for target in ALL_ROLES {
                for operation in [
                    AccountOperation::Update,
                    AccountOperation::Delete,
                    AccountOperation::ChangeRole(Role::Writer),
                ] {
                    assert!(
                        !authorize(actor, target, operation, false).is_allowed(),
                        "{actor} acted on {target}"
                    );
                }
            }
        }
    }

    #[test]
    fn admins_manage_unprivileged_accounts_only() {
        for target in [Role::Reader, Role::Writer] {
            assert!(authorize(Role::Admin, target, AccountOperation::Update, false).is_allowed());
            assert!(authorize(Role::Admin, target, AccountOperation::Delete, false).is_allowed());
        }
        for target in [Role::Admin, Role::SuperAdmin] {
            assert!(!authorize(Role::Admin, target, AccountOperation::Update, false).is_allowed());
            assert!(!authorize(Role::Admin, target, AccountOperation::Delete, false).is_allowed());
        }
    }

    #[test]
    fn admins_only_grant_unprivileged_roles() {
        let allowed = authorize(
            Role::Admin,
            Role::Reader,
            AccountOperation::ChangeRole(Role::Writer),
            false,
        );
        assert!(allowed.is_allowed());

        for requested in [Role::Admin, Role::SuperAdmin] {
            let verdict = authorize(
                Role::Admin,
                Role::Reader,
                AccountOperation::ChangeRole(requested),
                false,
            );
            assert_eq!(
                verdict.reason(),
                Some("administrators may only grant reader or writer roles")
            );
        }
    }

    #[test]
    fn super_admins_outrank_everyone_but_their_peers() {
        for target in [Role::Reader, Role::Writer, Role::Admin] {
            for operation in [
                AccountOperation::Update,
                AccountOperation::Delete,
                AccountOperation::ChangeRole(Role::SuperAdmin),
            ] {
                assert!(
                    authorize(Role::SuperAdmin, target, operation, false).is_allowed(),
                    "super admin blocked on {target}"
                );
            }
        }
        let verdict = authorize(
            Role::SuperAdmin,
            Role::SuperAdmin,
            AccountOperation::Delete,
            false,
        );
        assert_eq!(
            verdict.reason(),
            Some("cannot act on an account of equal or higher rank")
        );
    }

    #[test]
    fn writer_peers_do_not_outrank_each_other() {
        // Reader and Writer share a rank, so neither outranks the other
        let verdict = authorize(Role::Writer, Role::Reader, AccountOperation::Delete, false);
        assert!(!verdict.is_allowed());
    }

    #[test]
    fn open_roles_register_without_an_actor() {
        for requested in [Role::Reader, Role::Writer] {
            assert!(authorize_grant_at_registration(None, requested).is_allowed());
            assert!(authorize_grant_at_registration(Some(Role::Reader), requested).is_allowed());
        }
    }

    #[test]
    fn privileged_registration_takes_a_super_admin() {
        for requested in [Role::Admin, Role::SuperAdmin] {
            assert!(
                authorize_grant_at_registration(Some(Role::SuperAdmin), requested).is_allowed()
            );
            assert!(!authorize_grant_at_registration(Some(Role::Admin), requested).is_allowed());
            assert!(!authorize_grant_at_registration(None, requested).is_allowed());
        }
    }
}
