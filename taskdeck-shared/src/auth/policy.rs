/// Authorization policy
///
/// Every mutation in the system is gated here, in one place, instead of
/// re-deriving role checks per handler. Rules are resource × action ×
/// role/ownership predicate; a failed check returns [`PolicyError`] (HTTP
/// 403) before any state is touched.
///
/// # Rules
///
/// | Resource | Action                          | Allowed for |
/// |----------|---------------------------------|-------------|
/// | Project  | Create / Delete / Reassign      | admin, team_leader |
/// | Project  | Update / ViewHistory            | owner, admin, team_leader |
/// | Task     | Create / Assign / Archive / Restore | admin, team_leader |
/// | Task     | Update / ViewHistory            | assignee, admin, team_leader |
/// | User     | Delete                          | admin, team_leader, self |
/// | User     | CreateTeammate / EditAccount / ChangePassword | admin, team_leader |
/// | Analytics| Team view                       | admin, team_leader |
///
/// Ownership alone never substitutes for a privileged role where the table
/// requires one: a plain user who owns nothing and assigns nothing gets
/// 403, full stop. The regression tests at the bottom pin this down.

use uuid::Uuid;

use crate::models::user::{User, UserRole};

/// Error type for failed policy checks
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// Action is restricted to admin/team_leader
    #[error("Only an admin or team leader may {0}")]
    PrivilegedOnly(&'static str),

    /// Actor is neither privileged nor the resource's owner/assignee
    #[error("Not authorized to {0}")]
    Denied(&'static str),
}

/// The authenticated principal a policy check runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// User ID
    pub id: Uuid,

    /// Account role
    pub role: UserRole,
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Actor {
            id: user.id,
            role: user.role,
        }
    }
}

/// Actions on projects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectAction {
    Create,
    Update,
    Delete,
    Reassign,
    ViewHistory,
}

impl ProjectAction {
    fn describe(&self) -> &'static str {
        match self {
            ProjectAction::Create => "create projects",
            ProjectAction::Update => "update this project",
            ProjectAction::Delete => "delete projects",
            ProjectAction::Reassign => "reassign projects",
            ProjectAction::ViewHistory => "view this project's history",
        }
    }
}

/// Actions on tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    Create,
    Update,
    Assign,
    Archive,
    Restore,
    ViewHistory,
}

impl TaskAction {
    fn describe(&self) -> &'static str {
        match self {
            TaskAction::Create => "create tasks",
            TaskAction::Update => "update this task",
            TaskAction::Assign => "assign tasks",
            TaskAction::Archive => "archive tasks",
            TaskAction::Restore => "restore tasks",
            TaskAction::ViewHistory => "view this task's history",
        }
    }
}

/// Actions on user accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    CreateTeammate,
    Delete,
    EditAccount,
    ChangePassword,
}

impl UserAction {
    fn describe(&self) -> &'static str {
        match self {
            UserAction::CreateTeammate => "create team members",
            UserAction::Delete => "delete this user",
            UserAction::EditAccount => "edit other accounts",
            UserAction::ChangePassword => "change other users' passwords",
        }
    }
}

/// Whether the role carries blanket mutation rights
pub fn is_privileged(actor: &Actor) -> bool {
    matches!(actor.role, UserRole::Admin | UserRole::TeamLeader)
}

/// Whether `actor` may perform `action` on a project owned by `owner_id`
pub fn allows_project(actor: &Actor, action: ProjectAction, owner_id: Option<Uuid>) -> bool {
    match action {
        ProjectAction::Create | ProjectAction::Delete | ProjectAction::Reassign => {
            is_privileged(actor)
        }
        ProjectAction::Update | ProjectAction::ViewHistory => {
            is_privileged(actor) || owner_id == Some(actor.id)
        }
    }
}

/// Policy check for projects; `Err` maps to HTTP 403
pub fn require_project(
    actor: &Actor,
    action: ProjectAction,
    owner_id: Option<Uuid>,
) -> Result<(), PolicyError> {
    if allows_project(actor, action, owner_id) {
        return Ok(());
    }

    match action {
        ProjectAction::Update | ProjectAction::ViewHistory => {
            Err(PolicyError::Denied(action.describe()))
        }
        _ => Err(PolicyError::PrivilegedOnly(action.describe())),
    }
}

/// Whether `actor` may perform `action` on a task assigned to `assignee`
pub fn allows_task(actor: &Actor, action: TaskAction, assignee: Option<Uuid>) -> bool {
    match action {
        TaskAction::Create | TaskAction::Assign | TaskAction::Archive | TaskAction::Restore => {
            is_privileged(actor)
        }
        TaskAction::Update | TaskAction::ViewHistory => {
            is_privileged(actor) || assignee == Some(actor.id)
        }
    }
}

/// Policy check for tasks; `Err` maps to HTTP 403
pub fn require_task(
    actor: &Actor,
    action: TaskAction,
    assignee: Option<Uuid>,
) -> Result<(), PolicyError> {
    if allows_task(actor, action, assignee) {
        return Ok(());
    }

    match action {
        TaskAction::Update | TaskAction::ViewHistory => {
            Err(PolicyError::Denied(action.describe()))
        }
        _ => Err(PolicyError::PrivilegedOnly(action.describe())),
    }
}

/// Whether `actor` may perform `action` on the account `subject_id`
pub fn allows_user(actor: &Actor, action: UserAction, subject_id: Uuid) -> bool {
    match action {
        UserAction::Delete => is_privileged(actor) || actor.id == subject_id,
        UserAction::CreateTeammate | UserAction::EditAccount | UserAction::ChangePassword => {
            is_privileged(actor)
        }
    }
}

/// Policy check for user accounts; `Err` maps to HTTP 403
pub fn require_user(
    actor: &Actor,
    action: UserAction,
    subject_id: Uuid,
) -> Result<(), PolicyError> {
    if allows_user(actor, action, subject_id) {
        return Ok(());
    }

    match action {
        UserAction::Delete => Err(PolicyError::Denied(action.describe())),
        _ => Err(PolicyError::PrivilegedOnly(action.describe())),
    }
}

/// Policy check for the team-wide analytics view
pub fn require_team_view(actor: &Actor) -> Result<(), PolicyError> {
    if is_privileged(actor) {
        Ok(())
    } else {
        Err(PolicyError::PrivilegedOnly("view team analytics"))
    }
}

/// Listing scope a role is entitled to
///
/// Applied by the task and archive listing endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    /// Every row (admin)
    All,

    /// Rows inside projects owned by the actor (team_leader)
    ProjectsOwnedBy(Uuid),

    /// Rows assigned to the actor (user)
    AssignedTo(Uuid),
}

/// Resolves the listing scope for an actor
pub fn list_scope(actor: &Actor) -> ListScope {
    match actor.role {
        UserRole::Admin => ListScope::All,
        UserRole::TeamLeader => ListScope::ProjectsOwnedBy(actor.id),
        UserRole::User => ListScope::AssignedTo(actor.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: UserRole) -> Actor {
        Actor {
            id: Uuid::new_v4(),
            role,
        }
    }

    #[test]
    fn test_privileged_roles() {
        assert!(is_privileged(&actor(UserRole::Admin)));
        assert!(is_privileged(&actor(UserRole::TeamLeader)));
        assert!(!is_privileged(&actor(UserRole::User)));
    }

    #[test]
    fn test_project_create_is_privileged_only() {
        assert!(allows_project(&actor(UserRole::Admin), ProjectAction::Create, None));
        assert!(allows_project(&actor(UserRole::TeamLeader), ProjectAction::Create, None));
        assert!(!allows_project(&actor(UserRole::User), ProjectAction::Create, None));
    }

    #[test]
    fn test_project_update_allows_owner() {
        let owner = actor(UserRole::User);
        assert!(allows_project(&owner, ProjectAction::Update, Some(owner.id)));
    }

    // Regression for the source's `user or condition` defect: merely being
    // authenticated must never satisfy an ownership check.
    #[test]
    fn test_project_update_rejects_authenticated_non_owner() {
        let someone = actor(UserRole::User);
        let other_owner = Uuid::new_v4();
        assert!(!allows_project(&someone, ProjectAction::Update, Some(other_owner)));
        assert!(require_project(&someone, ProjectAction::Update, Some(other_owner)).is_err());
    }

    #[test]
    fn test_project_delete_rejects_plain_owner() {
        // Even the owner needs a privileged role to delete.
        let owner = actor(UserRole::User);
        assert!(!allows_project(&owner, ProjectAction::Delete, Some(owner.id)));
    }

    #[test]
    fn test_task_mutations_privileged_only() {
        let user = actor(UserRole::User);
        for action in [TaskAction::Create, TaskAction::Assign, TaskAction::Archive, TaskAction::Restore] {
            assert!(
                !allows_task(&user, action, Some(user.id)),
                "plain user must not {:?}",
                action
            );
            assert!(allows_task(&actor(UserRole::TeamLeader), action, None));
            assert!(allows_task(&actor(UserRole::Admin), action, None));
        }
    }

    #[test]
    fn test_task_update_allows_assignee() {
        let assignee = actor(UserRole::User);
        assert!(allows_task(&assignee, TaskAction::Update, Some(assignee.id)));
        assert!(allows_task(&assignee, TaskAction::ViewHistory, Some(assignee.id)));
    }

    #[test]
    fn test_task_update_rejects_authenticated_non_assignee() {
        let someone = actor(UserRole::User);
        assert!(!allows_task(&someone, TaskAction::Update, Some(Uuid::new_v4())));
        assert!(!allows_task(&someone, TaskAction::Update, None));
    }

    #[test]
    fn test_user_delete_allows_self_and_privileged() {
        let user = actor(UserRole::User);
        assert!(allows_user(&user, UserAction::Delete, user.id));
        assert!(allows_user(&actor(UserRole::Admin), UserAction::Delete, user.id));
        assert!(allows_user(&actor(UserRole::TeamLeader), UserAction::Delete, user.id));
        assert!(!allows_user(&user, UserAction::Delete, Uuid::new_v4()));
    }

    #[test]
    fn test_account_management_privileged_only() {
        let user = actor(UserRole::User);
        for action in [UserAction::CreateTeammate, UserAction::EditAccount, UserAction::ChangePassword] {
            assert!(!allows_user(&user, action, Uuid::new_v4()));
            assert!(allows_user(&actor(UserRole::Admin), action, Uuid::new_v4()));
        }
    }

    #[test]
    fn test_team_view_gated() {
        assert!(require_team_view(&actor(UserRole::Admin)).is_ok());
        assert!(require_team_view(&actor(UserRole::TeamLeader)).is_ok());
        assert!(require_team_view(&actor(UserRole::User)).is_err());
    }

    #[test]
    fn test_list_scope_per_role() {
        let admin = actor(UserRole::Admin);
        let lead = actor(UserRole::TeamLeader);
        let user = actor(UserRole::User);

        assert_eq!(list_scope(&admin), ListScope::All);
        assert_eq!(list_scope(&lead), ListScope::ProjectsOwnedBy(lead.id));
        assert_eq!(list_scope(&user), ListScope::AssignedTo(user.id));
    }

    #[test]
    fn test_policy_error_messages() {
        let err = require_task(&actor(UserRole::User), TaskAction::Archive, None).unwrap_err();
        assert!(err.to_string().contains("admin or team leader"));

        let err = require_task(&actor(UserRole::User), TaskAction::Update, None).unwrap_err();
        assert!(err.to_string().contains("Not authorized"));
    }
}
