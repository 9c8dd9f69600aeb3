//! Request-level authorization guards.
//!
//! Thin wrappers over `folio_auth` policy that speak `ApiError`, so handlers
//! can gate with `?` before touching storage.

use folio_auth::{authorize, require_role as role_gate, AuthzError, Permission, Role};
use folio_blog::{Comment, Post};

use crate::app::errors::ApiError;
use crate::context::PrincipalContext;

pub const ACCESS_DENIED: &str = "Access Denied: You do not have permission to view this page.";

pub fn require_permission(principal: &PrincipalContext, permission: &Permission) -> Result<(), ApiError> {
    authorize(principal.principal(), permission)?;
    Ok(())
}

/// Role-gated views answer with the access-denied message.
pub fn require_role(principal: &PrincipalContext, role: Role) -> Result<(), ApiError> {
    role_gate(principal.principal(), role).map_err(|e| {
        tracing::debug!(user = principal.username(), error = %e, "role gate refused");
        ApiError::forbidden(ACCESS_DENIED)
    })
}

pub fn require_post_author(principal: &PrincipalContext, post: &Post) -> Result<(), ApiError> {
    if post.is_author(principal.user_id()) {
        Ok(())
    } else {
        Err(AuthzError::NotOwner.into())
    }
}

pub fn require_comment_editor(principal: &PrincipalContext, comment: &Comment) -> Result<(), ApiError> {
    if comment.can_edit(principal.user_id(), principal.is_staff()) {
        Ok(())
    } else {
        Err(ApiError::forbidden("You do not have permission to edit this comment."))
    }
}

pub fn require_comment_remover(principal: &PrincipalContext, comment: &Comment) -> Result<(), ApiError> {
    if comment.can_delete(principal.user_id(), principal.is_staff()) {
        Ok(())
    } else {
        Err(ApiError::forbidden("You do not have permission to delete this comment."))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use folio_auth::Principal;
    use folio_core::{CommentId, PostId, UserId};

    use super::*;

    fn ctx(role: Role) -> PrincipalContext {
        PrincipalContext::new(Principal::new(UserId::new(), "someone", role))
    }

    fn comment_by(author: UserId) -> Comment {
        Comment::new(CommentId::new(), PostId::new(), author, "hello there".to_string(), Utc::now())
    }

    #[test]
    fn role_gate_uses_access_denied_message() {
        let err = require_role(&ctx(Role::Member), Role::Admin).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(ref m) if m == ACCESS_DENIED));
        assert!(require_role(&ctx(Role::Admin), Role::Admin).is_ok());
    }

    #[test]
    fn librarians_may_create_books_members_may_not() {
        assert!(require_permission(&ctx(Role::Librarian), &Permission::BOOKS_CREATE).is_ok());
        assert!(require_permission(&ctx(Role::Member), &Permission::BOOKS_CREATE).is_err());
    }

    #[test]
    fn staff_may_moderate_any_comment() {
        let comment = comment_by(UserId::new());
        assert!(require_comment_editor(&ctx(Role::Admin), &comment).is_ok());
        assert!(require_comment_remover(&ctx(Role::Librarian), &comment).is_err());
    }

    #[test]
    fn authors_may_moderate_their_own_comments() {
        let me = ctx(Role::Member);
        let comment = comment_by(me.user_id());
        assert!(require_comment_editor(&me, &comment).is_ok());
        assert!(require_comment_remover(&me, &comment).is_ok());
    }
}
