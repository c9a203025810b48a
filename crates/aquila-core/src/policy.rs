//! The single policy-evaluation point for every fetcher and endpoint.
//!
//! Handlers never compare roles inline; they describe what they are about to
//! do as an [`Action`] and ask [`authorize`]. Denials fail closed — callers
//! must surface the error, never fall back to filtered data.

use thiserror::Error;
use uuid::Uuid;

use crate::profile::{Profile, Role};

/// A scoped read or write a caller wants to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
  /// Read one user's profile or report rows. `group_id` is the target
  /// user's group, used to decide leader visibility.
  ReadUser { user_id: Uuid, group_id: Option<Uuid> },
  /// Read aggregated rows scoped to one group.
  ReadGroup { group_id: Uuid },
  /// Read across all profiles, reports, and groups.
  ReadAll,
  /// Attach a free-text note to a youth in the given group.
  WriteNote { youth_group: Option<Uuid> },
  /// Export report rows; `None` means all groups.
  Export { group_id: Option<Uuid> },
  /// Read the audit trail.
  ReadAuditLog,
  /// Any administrative mutation (user/group lifecycle, password resets).
  Administer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("not authorized")]
pub struct Denied;

/// Decide whether `caller` may perform `action`.
pub fn authorize(caller: &Profile, action: Action) -> Result<(), Denied> {
  match caller.role {
    Role::Admin => Ok(()),

    Role::Leader => match action {
      Action::ReadUser { user_id, group_id } => {
        if user_id == caller.id {
          return Ok(());
        }
        allow_if_own_group(caller, group_id)
      }
      Action::ReadGroup { group_id } => {
        allow_if_own_group(caller, Some(group_id))
      }
      Action::WriteNote { youth_group } => allow_if_own_group(caller, youth_group),
      Action::Export { group_id } => allow_if_own_group(caller, group_id),
      Action::ReadAll | Action::ReadAuditLog | Action::Administer => Err(Denied),
    },

    Role::Youth => match action {
      Action::ReadUser { user_id, .. } if user_id == caller.id => Ok(()),
      _ => Err(Denied),
    },
  }
}

/// Resolve the group scope an export or group-wide fetch actually runs with.
///
/// Admins get whatever they asked for; leaders are always forced to their
/// own group regardless of the request; youth are denied outright.
pub fn effective_group_scope(
  caller: &Profile,
  requested: Option<Uuid>,
) -> Result<Option<Uuid>, Denied> {
  match caller.role {
    Role::Admin  => Ok(requested),
    Role::Leader => match caller.group_id {
      Some(own) => Ok(Some(own)),
      None      => Err(Denied),
    },
    Role::Youth => Err(Denied),
  }
}

fn allow_if_own_group(caller: &Profile, target: Option<Uuid>) -> Result<(), Denied> {
  match (caller.group_id, target) {
    (Some(own), Some(theirs)) if own == theirs => Ok(()),
    _ => Err(Denied),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn profile(role: Role, group: Option<Uuid>) -> Profile {
    Profile {
      id: Uuid::new_v4(),
      name: "Test".to_string(),
      role,
      group_id: group,
    }
  }

  #[test]
  fn admin_is_unrestricted() {
    let admin = profile(Role::Admin, None);
    for action in [
      Action::ReadAll,
      Action::ReadAuditLog,
      Action::Administer,
      Action::Export { group_id: None },
      Action::ReadGroup { group_id: Uuid::new_v4() },
    ] {
      assert!(authorize(&admin, action).is_ok(), "{action:?}");
    }
  }

  #[test]
  fn youth_reads_only_self() {
    let youth = profile(Role::Youth, Some(Uuid::new_v4()));
    let own = Action::ReadUser { user_id: youth.id, group_id: youth.group_id };
    assert!(authorize(&youth, own).is_ok());

    let other = Action::ReadUser {
      user_id:  Uuid::new_v4(),
      group_id: youth.group_id,
    };
    assert_eq!(authorize(&youth, other), Err(Denied));
    assert_eq!(authorize(&youth, Action::Export { group_id: None }), Err(Denied));
  }

  #[test]
  fn leader_sees_own_group_only() {
    let group = Uuid::new_v4();
    let leader = profile(Role::Leader, Some(group));

    let in_group = Action::ReadUser {
      user_id:  Uuid::new_v4(),
      group_id: Some(group),
    };
    assert!(authorize(&leader, in_group).is_ok());

    let out_of_group = Action::ReadUser {
      user_id:  Uuid::new_v4(),
      group_id: Some(Uuid::new_v4()),
    };
    assert_eq!(authorize(&leader, out_of_group), Err(Denied));

    let ungrouped_target = Action::ReadUser {
      user_id:  Uuid::new_v4(),
      group_id: None,
    };
    assert_eq!(authorize(&leader, ungrouped_target), Err(Denied));
  }

  #[test]
  fn leader_never_administers_or_reads_audit() {
    let leader = profile(Role::Leader, Some(Uuid::new_v4()));
    assert_eq!(authorize(&leader, Action::Administer), Err(Denied));
    assert_eq!(authorize(&leader, Action::ReadAuditLog), Err(Denied));
    assert_eq!(authorize(&leader, Action::ReadAll), Err(Denied));
  }

  #[test]
  fn leader_writes_notes_only_in_own_group() {
    let group = Uuid::new_v4();
    let leader = profile(Role::Leader, Some(group));
    assert!(authorize(&leader, Action::WriteNote { youth_group: Some(group) }).is_ok());
    assert_eq!(
      authorize(&leader, Action::WriteNote { youth_group: None }),
      Err(Denied)
    );
  }

  #[test]
  fn export_scope_is_forced_for_leaders() {
    let group = Uuid::new_v4();
    let leader = profile(Role::Leader, Some(group));
    // A leader asking for another group still gets their own.
    assert_eq!(
      effective_group_scope(&leader, Some(Uuid::new_v4())),
      Ok(Some(group))
    );

    let admin = profile(Role::Admin, None);
    assert_eq!(effective_group_scope(&admin, None), Ok(None));
    let wanted = Some(Uuid::new_v4());
    assert_eq!(effective_group_scope(&admin, wanted), Ok(wanted));

    let youth = profile(Role::Youth, Some(group));
    assert_eq!(effective_group_scope(&youth, None), Err(Denied));
  }
}
